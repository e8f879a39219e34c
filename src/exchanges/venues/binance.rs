//! Binance-family spot REST client
//!
//! Binance and MEXC expose the same wire shape on their public market-data
//! endpoints, so one client covers both with a different host and venue id.
//! Only unauthenticated endpoints are used; wallet/network metadata is
//! behind signed endpoints on this family and stays empty.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;

use crate::exchanges::errors::ExchangeResult;
use crate::exchanges::traits::ExchangeClient;
use crate::exchanges::types::{parse_opt_f64, Currency, Market, Ticker};

const BINANCE_BASE_URL: &str = "https://api.binance.com";
const MEXC_BASE_URL: &str = "https://api.mexc.com";

#[derive(Debug)]
pub struct BinanceClient {
    venue: &'static str,
    base_url: String,
    http: reqwest::Client,
}

impl BinanceClient {
    pub fn binance(http: reqwest::Client) -> Self {
        Self {
            venue: "binance",
            base_url: BINANCE_BASE_URL.to_string(),
            http,
        }
    }

    pub fn mexc(http: reqwest::Client) -> Self {
        Self {
            venue: "mexc",
            base_url: MEXC_BASE_URL.to_string(),
            http,
        }
    }

    /// Constructor pointing at a local mock server
    pub fn with_base_url(
        venue: &'static str,
        base_url: impl Into<String>,
        http: reqwest::Client,
    ) -> Self {
        Self {
            venue,
            base_url: base_url.into(),
            http,
        }
    }

    /// `BTC/USDT` → `BTCUSDT`
    fn native_symbol(symbol: &str) -> String {
        symbol.replace('/', "")
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
struct ExchangeInfoResponse {
    symbols: Vec<SymbolInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SymbolInfo {
    symbol: String,
    base_asset: String,
    quote_asset: String,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    is_spot_trading_allowed: Option<bool>,
}

impl SymbolInfo {
    // Binance reports "TRADING", MEXC has used "ENABLED" and "1"
    fn is_enabled_spot(&self) -> bool {
        let status_ok = match self.status.as_deref() {
            Some(s) => matches!(s, "TRADING" | "ENABLED" | "1"),
            None => true,
        };
        status_ok && self.is_spot_trading_allowed.unwrap_or(true)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Ticker24h {
    symbol: String,
    #[serde(default)]
    last_price: Option<String>,
    #[serde(default)]
    prev_close_price: Option<String>,
    #[serde(default)]
    bid_price: Option<String>,
    #[serde(default)]
    volume: Option<String>,
    #[serde(default)]
    quote_volume: Option<String>,
}

impl Ticker24h {
    fn into_ticker(self, unified: &str) -> Ticker {
        Ticker {
            symbol: unified.to_string(),
            last: self.last_price.as_deref().and_then(parse_opt_f64),
            close: self.prev_close_price.as_deref().and_then(parse_opt_f64),
            bid: self.bid_price.as_deref().and_then(parse_opt_f64),
            base_volume: self.volume.as_deref().and_then(parse_opt_f64),
            quote_volume: self.quote_volume.as_deref().and_then(parse_opt_f64),
        }
    }
}

#[async_trait]
impl ExchangeClient for BinanceClient {
    fn venue(&self) -> &str {
        self.venue
    }

    fn has_batch_tickers(&self) -> bool {
        true
    }

    async fn load_markets(&self) -> ExchangeResult<Vec<Market>> {
        let info: ExchangeInfoResponse = self.get_json("/api/v3/exchangeInfo").await?;
        let markets = info
            .symbols
            .into_iter()
            .map(|s| {
                let spot = s.is_enabled_spot();
                Market {
                    symbol: format!("{}/{}", s.base_asset, s.quote_asset),
                    base: s.base_asset,
                    quote: s.quote_asset,
                    spot,
                }
            })
            .collect();
        Ok(markets)
    }

    async fn fetch_ticker(&self, symbol: &str) -> ExchangeResult<Ticker> {
        let path = format!("/api/v3/ticker/24hr?symbol={}", Self::native_symbol(symbol));
        let raw: Ticker24h = self.get_json(&path).await?;
        Ok(raw.into_ticker(symbol))
    }

    async fn fetch_tickers(&self, symbols: &[String]) -> ExchangeResult<HashMap<String, Ticker>> {
        let wanted: HashMap<String, &String> = symbols
            .iter()
            .map(|s| (Self::native_symbol(s), s))
            .collect();
        let raw: Vec<Ticker24h> = self.get_json("/api/v3/ticker/24hr").await?;
        let mut out = HashMap::with_capacity(symbols.len());
        for ticker in raw {
            if let Some(unified) = wanted.get(&ticker.symbol) {
                let unified = (*unified).clone();
                let mapped = ticker.into_ticker(&unified);
                out.insert(unified, mapped);
            }
        }
        Ok(out)
    }

    async fn fetch_currencies(&self) -> ExchangeResult<Vec<Currency>> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXCHANGE_INFO: &str = r#"{
        "symbols": [
            {"symbol": "BTCUSDT", "baseAsset": "BTC", "quoteAsset": "USDT",
             "status": "TRADING", "isSpotTradingAllowed": true},
            {"symbol": "OLDUSDT", "baseAsset": "OLD", "quoteAsset": "USDT",
             "status": "BREAK", "isSpotTradingAllowed": true}
        ]
    }"#;

    const ALL_TICKERS: &str = r#"[
        {"symbol": "BTCUSDT", "lastPrice": "42000.5", "prevClosePrice": "41000.0",
         "bidPrice": "41999.0", "volume": "1200.5", "quoteVolume": "50000000"},
        {"symbol": "ETHUSDT", "lastPrice": "2200.0", "prevClosePrice": "2100.0",
         "bidPrice": "2199.5", "volume": "9000", "quoteVolume": "19800000"}
    ]"#;

    fn client(url: &str) -> BinanceClient {
        BinanceClient::with_base_url("binance", url.to_string(), reqwest::Client::new())
    }

    #[tokio::test]
    async fn test_load_markets_flags_disabled_pairs() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/api/v3/exchangeInfo")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(EXCHANGE_INFO)
            .create_async()
            .await;

        let markets = client(&server.url()).load_markets().await.unwrap();
        assert_eq!(markets.len(), 2);
        assert_eq!(markets[0].symbol, "BTC/USDT");
        assert!(markets[0].spot);
        assert!(!markets[1].spot, "BREAK status should not count as spot");
    }

    #[tokio::test]
    async fn test_fetch_tickers_keeps_only_requested_symbols() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/api/v3/ticker/24hr")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(ALL_TICKERS)
            .create_async()
            .await;

        let symbols = vec!["BTC/USDT".to_string()];
        let tickers = client(&server.url()).fetch_tickers(&symbols).await.unwrap();
        assert_eq!(tickers.len(), 1);
        let btc = &tickers["BTC/USDT"];
        assert_eq!(btc.last, Some(42000.5));
        assert_eq!(btc.close, Some(41000.0));
        assert_eq!(btc.quote_volume, Some(50_000_000.0));
    }

    #[tokio::test]
    async fn test_fetch_single_ticker() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/api/v3/ticker/24hr?symbol=ETHUSDT")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"symbol": "ETHUSDT", "lastPrice": "2200.0", "bidPrice": "2199.5",
                    "volume": "9000", "quoteVolume": "19800000"}"#,
            )
            .create_async()
            .await;

        let ticker = client(&server.url()).fetch_ticker("ETH/USDT").await.unwrap();
        assert_eq!(ticker.symbol, "ETH/USDT");
        assert_eq!(ticker.last, Some(2200.0));
        assert_eq!(ticker.close, None);
    }

    #[tokio::test]
    async fn test_http_error_maps_to_exchange_error() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/api/v3/exchangeInfo")
            .with_status(500)
            .create_async()
            .await;

        let err = client(&server.url()).load_markets().await.unwrap_err();
        assert!(err.to_string().contains("HTTP error"), "Got: {}", err);
    }

    #[tokio::test]
    async fn test_currencies_are_empty_for_this_family() {
        let client = BinanceClient::mexc(reqwest::Client::new());
        assert_eq!(client.venue(), "mexc");
        let currencies = client.fetch_currencies().await.unwrap();
        assert!(currencies.is_empty());
    }
}
