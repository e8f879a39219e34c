//! KuCoin spot REST client
//!
//! Public endpoints behind the `{code, data}` envelope; success code is
//! "200000". Currency metadata (v3) is public and chain-level, so KuCoin
//! assets carry real network info for route verification.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;

use crate::exchanges::errors::{ExchangeError, ExchangeResult};
use crate::exchanges::traits::ExchangeClient;
use crate::exchanges::types::{parse_opt_f64, Currency, CurrencyNetwork, Market, Ticker};

const KUCOIN_BASE_URL: &str = "https://api.kucoin.com";
const KUCOIN_OK: &str = "200000";

#[derive(Debug)]
pub struct KucoinClient {
    base_url: String,
    http: reqwest::Client,
}

impl KucoinClient {
    pub fn new(http: reqwest::Client) -> Self {
        Self {
            base_url: KUCOIN_BASE_URL.to_string(),
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

    async fn get_data<T: serde::de::DeserializeOwned>(&self, path: &str) -> ExchangeResult<T> {
        let url = format!("{}{}", self.base_url, path);
        let response = self.http.get(&url).send().await?.error_for_status()?;
        let envelope: KucoinEnvelope<T> = response.json().await?;
        if envelope.code != KUCOIN_OK {
            return Err(ExchangeError::InvalidResponse(format!(
                "kucoin code {}: {}",
                envelope.code,
                envelope.msg.unwrap_or_default()
            )));
        }
        envelope
            .data
            .ok_or_else(|| ExchangeError::InvalidResponse("kucoin envelope missing data".into()))
    }
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Deserialize)]
struct KucoinEnvelope<T> {
    code: String,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default = "Option::default")]
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KucoinSymbol {
    base_currency: String,
    quote_currency: String,
    #[serde(default)]
    enable_trading: bool,
}

#[derive(Debug, Deserialize)]
struct KucoinAllTickers {
    #[serde(default = "Vec::new")]
    ticker: Vec<KucoinTicker>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KucoinTicker {
    #[serde(default)]
    symbol: Option<String>,
    #[serde(default)]
    last: Option<String>,
    /// Best bid
    #[serde(default)]
    buy: Option<String>,
    /// 24h volume in base currency
    #[serde(default)]
    vol: Option<String>,
    /// 24h volume in quote currency
    #[serde(default)]
    vol_value: Option<String>,
}

impl KucoinTicker {
    fn into_ticker(self, unified: &str) -> Ticker {
        Ticker {
            symbol: unified.to_string(),
            last: self.last.as_deref().and_then(parse_opt_f64),
            close: None,
            bid: self.buy.as_deref().and_then(parse_opt_f64),
            base_volume: self.vol.as_deref().and_then(parse_opt_f64),
            quote_volume: self.vol_value.as_deref().and_then(parse_opt_f64),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KucoinCurrency {
    currency: String,
    #[serde(default)]
    chains: Option<Vec<KucoinChain>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KucoinChain {
    #[serde(default)]
    chain_name: Option<String>,
    #[serde(default)]
    chain_id: Option<String>,
    #[serde(default)]
    is_deposit_enabled: Option<bool>,
    #[serde(default)]
    is_withdraw_enabled: Option<bool>,
}

impl KucoinCurrency {
    fn into_currency(self) -> Currency {
        let networks = self
            .chains
            .unwrap_or_default()
            .into_iter()
            .map(|c| CurrencyNetwork {
                id: c.chain_name.or(c.chain_id).unwrap_or_default(),
                deposit: c.is_deposit_enabled,
                withdraw: c.is_withdraw_enabled,
                active: None,
            })
            .collect();
        Currency {
            code: self.currency,
            networks,
        }
    }
}

#[async_trait]
impl ExchangeClient for KucoinClient {
    fn venue(&self) -> &str {
        "kucoin"
    }

    fn has_batch_tickers(&self) -> bool {
        true
    }

    async fn load_markets(&self) -> ExchangeResult<Vec<Market>> {
        let symbols: Vec<KucoinSymbol> = self.get_data("/api/v2/symbols").await?;
        let markets = symbols
            .into_iter()
            .map(|s| Market {
                symbol: format!("{}/{}", s.base_currency, s.quote_currency),
                base: s.base_currency,
                quote: s.quote_currency,
                spot: s.enable_trading,
            })
            .collect();
        Ok(markets)
    }

    async fn fetch_ticker(&self, symbol: &str) -> ExchangeResult<Ticker> {
        let path = format!("/api/v1/market/stats?symbol={}", Self::native_symbol(symbol));
        let raw: KucoinTicker = self.get_data(&path).await?;
        Ok(raw.into_ticker(symbol))
    }

    async fn fetch_tickers(&self, symbols: &[String]) -> ExchangeResult<HashMap<String, Ticker>> {
        let wanted: HashMap<String, &String> = symbols
            .iter()
            .map(|s| (Self::native_symbol(s), s))
            .collect();
        let all: KucoinAllTickers = self.get_data("/api/v1/market/allTickers").await?;
        let mut out = HashMap::with_capacity(symbols.len());
        for ticker in all.ticker {
            let Some(native) = ticker.symbol.clone() else {
                continue;
            };
            if let Some(unified) = wanted.get(&native) {
                let unified = (*unified).clone();
                let mapped = ticker.into_ticker(&unified);
                out.insert(unified, mapped);
            }
        }
        Ok(out)
    }

    async fn fetch_currencies(&self) -> ExchangeResult<Vec<Currency>> {
        let raw: Vec<KucoinCurrency> = self.get_data("/api/v3/currencies").await?;
        Ok(raw.into_iter().map(KucoinCurrency::into_currency).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(url: &str) -> KucoinClient {
        KucoinClient::with_base_url(url.to_string(), reqwest::Client::new())
    }

    #[tokio::test]
    async fn test_all_tickers_nested_payload() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/api/v1/market/allTickers")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"code": "200000", "data": {"time": 1700000000000, "ticker": [
                    {"symbol": "BTC-USDT", "last": "42002", "buy": "42001",
                     "vol": "900", "volValue": "37800000"}
                ]}}"#,
            )
            .create_async()
            .await;

        let symbols = vec!["BTC/USDT".to_string()];
        let tickers = client(&server.url()).fetch_tickers(&symbols).await.unwrap();
        let btc = &tickers["BTC/USDT"];
        assert_eq!(btc.last, Some(42002.0));
        assert_eq!(btc.bid, Some(42001.0));
        assert_eq!(btc.quote_volume, Some(37_800_000.0));
    }

    #[tokio::test]
    async fn test_currencies_map_chain_flags() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/api/v3/currencies")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"code": "200000", "data": [
                    {"currency": "USDT", "chains": [
                        {"chainName": "TRC20", "isDepositEnabled": true, "isWithdrawEnabled": true},
                        {"chainName": "ERC20", "isDepositEnabled": true, "isWithdrawEnabled": false}
                    ]},
                    {"currency": "NOCHAINS"}
                ]}"#,
            )
            .create_async()
            .await;

        let currencies = client(&server.url()).fetch_currencies().await.unwrap();
        assert_eq!(currencies.len(), 2);
        assert_eq!(currencies[0].networks[0].id, "TRC20");
        assert_eq!(currencies[0].networks[1].withdraw, Some(false));
        assert!(currencies[1].networks.is_empty());
    }

    #[tokio::test]
    async fn test_error_code_is_invalid_response() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/api/v2/symbols")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"code": "400100", "msg": "param error"}"#)
            .create_async()
            .await;

        let err = client(&server.url()).load_markets().await.unwrap_err();
        assert!(matches!(err, ExchangeError::InvalidResponse(_)));
        assert!(err.to_string().contains("param error"), "Got: {}", err);
    }

    #[tokio::test]
    async fn test_load_markets_respects_enable_trading() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/api/v2/symbols")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"code": "200000", "data": [
                    {"symbol": "BTC-USDT", "baseCurrency": "BTC", "quoteCurrency": "USDT",
                     "enableTrading": true},
                    {"symbol": "DEAD-USDT", "baseCurrency": "DEAD", "quoteCurrency": "USDT",
                     "enableTrading": false}
                ]}"#,
            )
            .create_async()
            .await;

        let markets = client(&server.url()).load_markets().await.unwrap();
        assert!(markets[0].spot);
        assert!(!markets[1].spot);
    }
}
