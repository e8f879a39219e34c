//! Market-cap ranking used to front-load the scan universe

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

const COINGECKO_BASE_URL: &str = "https://api.coingecko.com";
const RANKING_PAGES: u32 = 2;
const RANKING_PER_PAGE: u32 = 250;
const RANKING_TIMEOUT: Duration = Duration::from_secs(12);

/// Source of coin symbols ordered by market capitalization.
#[async_trait]
pub trait PopularitySource: Send + Sync {
    /// Best effort: failures yield a shorter, possibly empty, ranking.
    async fn ranked_symbols(&self) -> Vec<String>;
}

/// Fixed ranking for tests and offline runs.
pub struct StaticRanking(pub Vec<String>);

#[async_trait]
impl PopularitySource for StaticRanking {
    async fn ranked_symbols(&self) -> Vec<String> {
        self.0.clone()
    }
}

#[derive(Debug, Deserialize)]
struct MarketCapEntry {
    symbol: String,
}

/// CoinGecko `coins/markets` pages, top of the market first.
pub struct CoinGeckoSource {
    http: reqwest::Client,
    base_url: String,
}

impl CoinGeckoSource {
    pub fn new(http: reqwest::Client) -> Self {
        Self::with_base_url(http, COINGECKO_BASE_URL)
    }

    pub fn with_base_url(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn fetch_page(&self, url: &str) -> Result<Vec<MarketCapEntry>, reqwest::Error> {
        let response = self
            .http
            .get(url)
            .timeout(RANKING_TIMEOUT)
            .send()
            .await?
            .error_for_status()?;
        response.json().await
    }
}

#[async_trait]
impl PopularitySource for CoinGeckoSource {
    async fn ranked_symbols(&self) -> Vec<String> {
        let mut ranked: Vec<String> = Vec::new();
        for page in 1..=RANKING_PAGES {
            let url = format!(
                "{}/api/v3/coins/markets?vs_currency=usd&order=market_cap_desc&per_page={}&page={}&sparkline=false",
                self.base_url, RANKING_PER_PAGE, page
            );
            let entries = match self.fetch_page(&url).await {
                Ok(entries) => entries,
                Err(err) => {
                    warn!(page, error = %err, "market cap ranking fetch failed");
                    break;
                }
            };
            let count = entries.len();
            ranked.extend(entries.into_iter().map(|e| e.symbol.to_uppercase()));
            // A short page means the listing ran out.
            if count < RANKING_PER_PAGE as usize {
                break;
            }
        }
        debug!(coins = ranked.len(), "market cap ranking fetched");
        ranked
    }
}
