//! OKX spot REST client
//!
//! Public v5 market-data endpoints. OKX wraps every payload in a
//! `{code, msg, data}` envelope; a non-zero code is an invalid response
//! even when HTTP succeeds.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;

use crate::exchanges::errors::{ExchangeError, ExchangeResult};
use crate::exchanges::traits::ExchangeClient;
use crate::exchanges::types::{parse_opt_f64, Currency, Market, Ticker};

const OKX_BASE_URL: &str = "https://www.okx.com";

#[derive(Debug)]
pub struct OkxClient {
    base_url: String,
    http: reqwest::Client,
}

impl OkxClient {
    pub fn new(http: reqwest::Client) -> Self {
        Self {
            base_url: OKX_BASE_URL.to_string(),
            http,
        }
    }

    /// Constructor pointing at a local mock server
    pub fn with_base_url(base_url: impl Into<String>, http: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into(),
            http,
        }
    }

    /// `BTC/USDT` → `BTC-USDT`
    fn native_symbol(symbol: &str) -> String {
        symbol.replace('/', "-")
    }

    async fn get_data<T: serde::de::DeserializeOwned>(&self, path: &str) -> ExchangeResult<Vec<T>> {
        let url = format!("{}{}", self.base_url, path);
        let response = self.http.get(&url).send().await?.error_for_status()?;
        let envelope: OkxEnvelope<T> = response.json().await?;
        if envelope.code != "0" {
            return Err(ExchangeError::InvalidResponse(format!(
                "okx code {}: {}",
                envelope.code, envelope.msg
            )));
        }
        Ok(envelope.data)
    }
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Deserialize)]
struct OkxEnvelope<T> {
    code: String,
    #[serde(default)]
    msg: String,
    #[serde(default = "Vec::new")]
    data: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OkxInstrument {
    base_ccy: String,
    quote_ccy: String,
    #[serde(default)]
    state: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OkxTicker {
    inst_id: String,
    #[serde(default)]
    last: String,
    #[serde(default)]
    bid_px: String,
    /// 24h volume in base currency for spot instruments
    #[serde(default)]
    vol24h: String,
    /// 24h volume in quote currency for spot instruments
    #[serde(default)]
    vol_ccy24h: String,
}

impl OkxTicker {
    fn into_ticker(self, unified: &str) -> Ticker {
        Ticker {
            symbol: unified.to_string(),
            last: parse_opt_f64(&self.last),
            close: None,
            bid: parse_opt_f64(&self.bid_px),
            base_volume: parse_opt_f64(&self.vol24h),
            quote_volume: parse_opt_f64(&self.vol_ccy24h),
        }
    }
}

#[async_trait]
impl ExchangeClient for OkxClient {
    fn venue(&self) -> &str {
        "okx"
    }

    fn has_batch_tickers(&self) -> bool {
        true
    }

    async fn load_markets(&self) -> ExchangeResult<Vec<Market>> {
        let instruments: Vec<OkxInstrument> = self
            .get_data("/api/v5/public/instruments?instType=SPOT")
            .await?;
        let markets = instruments
            .into_iter()
            .map(|inst| {
                let spot = inst.state == "live";
                Market {
                    symbol: format!("{}/{}", inst.base_ccy, inst.quote_ccy),
                    base: inst.base_ccy,
                    quote: inst.quote_ccy,
                    spot,
                }
            })
            .collect();
        Ok(markets)
    }

    async fn fetch_ticker(&self, symbol: &str) -> ExchangeResult<Ticker> {
        let path = format!("/api/v5/market/ticker?instId={}", Self::native_symbol(symbol));
        let mut data: Vec<OkxTicker> = self.get_data(&path).await?;
        match data.pop() {
            Some(raw) => Ok(raw.into_ticker(symbol)),
            None => Err(ExchangeError::InvalidResponse(format!(
                "okx returned no ticker for {}",
                symbol
            ))),
        }
    }

    async fn fetch_tickers(&self, symbols: &[String]) -> ExchangeResult<HashMap<String, Ticker>> {
        let wanted: HashMap<String, &String> = symbols
            .iter()
            .map(|s| (Self::native_symbol(s), s))
            .collect();
        let data: Vec<OkxTicker> = self.get_data("/api/v5/market/tickers?instType=SPOT").await?;
        let mut out = HashMap::with_capacity(symbols.len());
        for ticker in data {
            if let Some(unified) = wanted.get(&ticker.inst_id) {
                let unified = (*unified).clone();
                let mapped = ticker.into_ticker(&unified);
                out.insert(unified, mapped);
            }
        }
        Ok(out)
    }

    async fn fetch_currencies(&self) -> ExchangeResult<Vec<Currency>> {
        // Currency/network metadata sits behind authenticated asset endpoints.
        Ok(Vec::new())
    }
}
