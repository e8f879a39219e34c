//! Client factory for dynamic venue selection
//!
//! Creates `ExchangeClient` instances from venue id strings.
//! Uses an enum-based dispatch pattern (no `Box<dyn>`) to preserve monomorphization.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::exchanges::errors::{ExchangeError, ExchangeResult};
use crate::exchanges::registry::{Exchange, ExchangeRegistry};
use crate::exchanges::test_utils::MockExchange;
use crate::exchanges::traits::ExchangeClient;
use crate::exchanges::types::{Currency, Market, Ticker};
use crate::exchanges::venues::{BinanceClient, GateioClient, KucoinClient, OkxClient};

/// One row of the supported-venue table
#[derive(Debug, Clone, Copy)]
pub struct VenueSpec {
    pub id: &'static str,
    pub display_name: &'static str,
}

/// Supported venues in registry order. The order is user-visible: it is the
/// column order of rendered rows and the tie-break order for min/max picks.
pub const SUPPORTED_VENUES: &[VenueSpec] = &[
    VenueSpec {
        id: "binance",
        display_name: "Binance",
    },
    VenueSpec {
        id: "okx",
        display_name: "OKX",
    },
    VenueSpec {
        id: "gateio",
        display_name: "Gate.io",
    },
    VenueSpec {
        id: "mexc",
        display_name: "MEXC",
    },
    VenueSpec {
        id: "kucoin",
        display_name: "KuCoin",
    },
];

/// Display name for a supported venue id
pub fn display_name(venue: &str) -> Option<&'static str> {
    SUPPORTED_VENUES
        .iter()
        .find(|spec| spec.id == venue)
        .map(|spec| spec.display_name)
}

// =============================================================================
// AnyClient: enum-based dispatch for dynamic venue selection
// =============================================================================

/// Enum wrapping all concrete client types for runtime dispatch.
#[derive(Debug)]
pub enum AnyClient {
    Binance(BinanceClient),
    Okx(OkxClient),
    Gateio(GateioClient),
    Kucoin(KucoinClient),
    Mock(MockExchange),
}

/// Macro to reduce boilerplate for delegating trait methods
macro_rules! delegate {
    ($self:expr, $method:ident ( $($arg:expr),* )) => {
        match $self {
            AnyClient::Binance(c) => c.$method($($arg),*),
            AnyClient::Okx(c) => c.$method($($arg),*),
            AnyClient::Gateio(c) => c.$method($($arg),*),
            AnyClient::Kucoin(c) => c.$method($($arg),*),
            AnyClient::Mock(c) => c.$method($($arg),*),
        }
    };
    (await $self:expr, $method:ident ( $($arg:expr),* )) => {
        match $self {
            AnyClient::Binance(c) => c.$method($($arg),*).await,
            AnyClient::Okx(c) => c.$method($($arg),*).await,
            AnyClient::Gateio(c) => c.$method($($arg),*).await,
            AnyClient::Kucoin(c) => c.$method($($arg),*).await,
            AnyClient::Mock(c) => c.$method($($arg),*).await,
        }
    };
}

#[async_trait]
impl ExchangeClient for AnyClient {
    fn venue(&self) -> &str {
        delegate!(self, venue())
    }

    fn has_batch_tickers(&self) -> bool {
        delegate!(self, has_batch_tickers())
    }

    async fn load_markets(&self) -> ExchangeResult<Vec<Market>> {
        delegate!(await self, load_markets())
    }

    async fn fetch_ticker(&self, symbol: &str) -> ExchangeResult<Ticker> {
        delegate!(await self, fetch_ticker(symbol))
    }

    async fn fetch_tickers(&self, symbols: &[String]) -> ExchangeResult<HashMap<String, Ticker>> {
        delegate!(await self, fetch_tickers(symbols))
    }

    async fn fetch_currencies(&self) -> ExchangeResult<Vec<Currency>> {
        delegate!(await self, fetch_currencies())
    }
}

/// Create a venue client from its id string.
///
/// The shared reqwest client is cloned into each venue client; reqwest
/// clones share the underlying connection pool.
pub fn create_client(venue: &str, http: reqwest::Client) -> ExchangeResult<AnyClient> {
    match venue {
        "binance" => Ok(AnyClient::Binance(BinanceClient::binance(http))),
        "mexc" => Ok(AnyClient::Binance(BinanceClient::mexc(http))),
        "okx" => Ok(AnyClient::Okx(OkxClient::new(http))),
        "gateio" => Ok(AnyClient::Gateio(GateioClient::new(http))),
        "kucoin" => Ok(AnyClient::Kucoin(KucoinClient::new(http))),
        other => Err(ExchangeError::UnknownExchange(other.to_string())),
    }
}

/// Build the full registry from the supported-venue table.
pub fn build_registry(http: &reqwest::Client) -> ExchangeRegistry {
    let mut exchanges = Vec::with_capacity(SUPPORTED_VENUES.len());
    for spec in SUPPORTED_VENUES {
        match create_client(spec.id, http.clone()) {
            Ok(client) => {
                exchanges.push(Arc::new(Exchange::new(spec.id, spec.display_name, client)));
            }
            Err(e) => {
                tracing::warn!(venue = spec.id, error = %e, "Venue client construction failed");
            }
        }
    }
    tracing::info!(
        clients = exchanges.len(),
        supported = SUPPORTED_VENUES.len(),
        "Exchange clients ready"
    );
    ExchangeRegistry::new(exchanges)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_client_for_every_supported_venue() {
        let http = reqwest::Client::new();
        for spec in SUPPORTED_VENUES {
            let client = create_client(spec.id, http.clone())
                .unwrap_or_else(|e| panic!("{} should construct: {}", spec.id, e));
            assert_eq!(client.venue(), spec.id);
        }
    }

    #[test]
    fn test_unknown_venue_is_rejected() {
        let err = create_client("ftx", reqwest::Client::new()).unwrap_err();
        assert!(matches!(err, ExchangeError::UnknownExchange(_)));
        assert!(err.to_string().contains("ftx"));
    }

    #[test]
    fn test_mexc_shares_binance_wire_shape() {
        let client = create_client("mexc", reqwest::Client::new()).unwrap();
        assert!(matches!(client, AnyClient::Binance(_)));
        assert_eq!(client.venue(), "mexc");
    }

    #[test]
    fn test_display_names() {
        assert_eq!(display_name("gateio"), Some("Gate.io"));
        assert_eq!(display_name("kucoin"), Some("KuCoin"));
        assert_eq!(display_name("ftx"), None);
    }

    #[test]
    fn test_build_registry_covers_supported_table() {
        let registry = build_registry(&reqwest::Client::new());
        assert_eq!(registry.len(), SUPPORTED_VENUES.len());
        assert_eq!(registry.all()[0].id().as_ref(), "binance");
        assert!(registry.get("kucoin").is_some());
        assert!(registry.get("ftx").is_none());
    }
}
