//! Gate.io spot REST client
//!
//! Public v4 endpoints. Gate.io is one of the venues whose currency
//! metadata (per-chain deposit/withdraw flags) is public, so its assets
//! get real network info for route verification.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;

use crate::exchanges::errors::ExchangeResult;
use crate::exchanges::traits::ExchangeClient;
use crate::exchanges::types::{parse_opt_f64, Currency, CurrencyNetwork, Market, Ticker};

const GATEIO_BASE_URL: &str = "https://api.gateio.ws";

#[derive(Debug)]
pub struct GateioClient {
    base_url: String,
    http: reqwest::Client,
}

impl GateioClient {
    pub fn new(http: reqwest::Client) -> Self {
        Self {
            base_url: GATEIO_BASE_URL.to_string(),
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

    /// `BTC/USDT` → `BTC_USDT`
    fn native_symbol(symbol: &str) -> String {
        symbol.replace('/', "_")
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> ExchangeResult<T> {
        let url = format!("{}{}", self.base_url, path);
        let response = self.http.get(&url).send().await?.error_for_status()?;
        Ok(response.json::<T>().await?)
    }
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Deserialize)]
struct GatePair {
    base: String,
    quote: String,
    #[serde(default)]
    trade_status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GateTicker {
    currency_pair: String,
    #[serde(default)]
    last: Option<String>,
    #[serde(default)]
    highest_bid: Option<String>,
    #[serde(default)]
    base_volume: Option<String>,
    #[serde(default)]
    quote_volume: Option<String>,
}

impl GateTicker {
    fn into_ticker(self, unified: &str) -> Ticker {
        Ticker {
            symbol: unified.to_string(),
            last: self.last.as_deref().and_then(parse_opt_f64),
            close: None,
            bid: self.highest_bid.as_deref().and_then(parse_opt_f64),
            base_volume: self.base_volume.as_deref().and_then(parse_opt_f64),
            quote_volume: self.quote_volume.as_deref().and_then(parse_opt_f64),
        }
    }
}

/// Newer listings carry a `chains` array; currencies predating it report a
/// single `chain` name with the flags on the currency itself.
#[derive(Debug, Deserialize)]
struct GateCurrency {
    currency: String,
    #[serde(default)]
    delisted: bool,
    #[serde(default)]
    deposit_disabled: bool,
    #[serde(default)]
    withdraw_disabled: bool,
    #[serde(default)]
    chain: Option<String>,
    #[serde(default)]
    chains: Option<Vec<GateChain>>,
}

#[derive(Debug, Deserialize)]
struct GateChain {
    name: String,
    #[serde(default)]
    deposit_disabled: bool,
    #[serde(default)]
    withdraw_disabled: bool,
}

impl GateCurrency {
    fn into_currency(self) -> Currency {
        let active = Some(!self.delisted);
        let networks = match self.chains {
            Some(chains) if !chains.is_empty() => chains
                .into_iter()
                .map(|c| CurrencyNetwork {
                    id: c.name,
                    deposit: Some(!c.deposit_disabled),
                    withdraw: Some(!c.withdraw_disabled),
                    active,
                })
                .collect(),
            _ => self
                .chain
                .into_iter()
                .map(|name| CurrencyNetwork {
                    id: name,
                    deposit: Some(!self.deposit_disabled),
                    withdraw: Some(!self.withdraw_disabled),
                    active,
                })
                .collect(),
        };
        Currency {
            code: self.currency,
            networks,
        }
    }
}

#[async_trait]
impl ExchangeClient for GateioClient {
    fn venue(&self) -> &str {
        "gateio"
    }

    fn has_batch_tickers(&self) -> bool {
        true
    }

    async fn load_markets(&self) -> ExchangeResult<Vec<Market>> {
        let pairs: Vec<GatePair> = self.get_json("/api/v4/spot/currency_pairs").await?;
        let markets = pairs
            .into_iter()
            .map(|p| {
                let spot = match p.trade_status.as_deref() {
                    Some(s) => s == "tradable",
                    None => true,
                };
                Market {
                    symbol: format!("{}/{}", p.base, p.quote),
                    base: p.base,
                    quote: p.quote,
                    spot,
                }
            })
            .collect();
        Ok(markets)
    }

    async fn fetch_ticker(&self, symbol: &str) -> ExchangeResult<Ticker> {
        let path = format!(
            "/api/v4/spot/tickers?currency_pair={}",
            Self::native_symbol(symbol)
        );
        let mut data: Vec<GateTicker> = self.get_json(&path).await?;
        match data.pop() {
            Some(raw) => Ok(raw.into_ticker(symbol)),
            None => Err(crate::exchanges::errors::ExchangeError::InvalidResponse(
                format!("gateio returned no ticker for {}", symbol),
            )),
        }
    }

    async fn fetch_tickers(&self, symbols: &[String]) -> ExchangeResult<HashMap<String, Ticker>> {
        let wanted: HashMap<String, &String> = symbols
            .iter()
            .map(|s| (Self::native_symbol(s), s))
            .collect();
        let data: Vec<GateTicker> = self.get_json("/api/v4/spot/tickers").await?;
        let mut out = HashMap::with_capacity(symbols.len());
        for ticker in data {
            if let Some(unified) = wanted.get(&ticker.currency_pair) {
                let unified = (*unified).clone();
                let mapped = ticker.into_ticker(&unified);
                out.insert(unified, mapped);
            }
        }
        Ok(out)
    }

    async fn fetch_currencies(&self) -> ExchangeResult<Vec<Currency>> {
        let raw: Vec<GateCurrency> = self.get_json("/api/v4/spot/currencies").await?;
        Ok(raw.into_iter().map(GateCurrency::into_currency).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CURRENCIES: &str = r#"[
        {"currency": "USDT", "delisted": false, "deposit_disabled": false,
         "withdraw_disabled": false,
         "chains": [
            {"name": "ETH", "deposit_disabled": false, "withdraw_disabled": false},
            {"name": "TRX", "deposit_disabled": false, "withdraw_disabled": true}
         ]},
        {"currency": "OLDCOIN", "delisted": true, "deposit_disabled": true,
         "withdraw_disabled": true, "chain": "ETH"}
    ]"#;

    fn client(url: &str) -> GateioClient {
        GateioClient::with_base_url(url.to_string(), reqwest::Client::new())
    }

    #[tokio::test]
    async fn test_currencies_expand_chain_list() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/api/v4/spot/currencies")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(CURRENCIES)
            .create_async()
            .await;

        let currencies = client(&server.url()).fetch_currencies().await.unwrap();
        assert_eq!(currencies.len(), 2);

        let usdt = &currencies[0];
        assert_eq!(usdt.code, "USDT");
        assert_eq!(usdt.networks.len(), 2);
        assert_eq!(usdt.networks[0].id, "ETH");
        assert_eq!(usdt.networks[0].withdraw, Some(true));
        assert_eq!(usdt.networks[1].withdraw, Some(false));

        let old = &currencies[1];
        assert_eq!(old.networks.len(), 1, "single-chain fallback");
        assert_eq!(old.networks[0].active, Some(false));
        assert_eq!(old.networks[0].deposit, Some(false));
    }

    #[tokio::test]
    async fn test_load_markets_and_trade_status() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/api/v4/spot/currency_pairs")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"[
                    {"id": "BTC_USDT", "base": "BTC", "quote": "USDT", "trade_status": "tradable"},
                    {"id": "ABC_USDT", "base": "ABC", "quote": "USDT", "trade_status": "untradable"}
                ]"#,
            )
            .create_async()
            .await;

        let markets = client(&server.url()).load_markets().await.unwrap();
        assert!(markets[0].spot);
        assert!(!markets[1].spot);
    }

    #[tokio::test]
    async fn test_single_ticker_uses_filtered_endpoint() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/api/v4/spot/tickers?currency_pair=BTC_USDT")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"[{"currency_pair": "BTC_USDT", "last": "42000", "highest_bid": "41999",
                     "base_volume": "10", "quote_volume": "420000"}]"#,
            )
            .create_async()
            .await;

        let ticker = client(&server.url()).fetch_ticker("BTC/USDT").await.unwrap();
        assert_eq!(ticker.last, Some(42000.0));
        assert_eq!(ticker.quote_volume, Some(420000.0));
    }
}
