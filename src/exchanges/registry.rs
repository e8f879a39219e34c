//! Exchange records and the process-wide registry
//!
//! Each `Exchange` owns its client plus the per-venue state the scan loop
//! relies on: the lazily loaded market catalog, an availability flag that
//! latches off after a failed load, and two mutexes. The call mutex
//! serializes outbound data calls (venue rate limits assume one caller at a
//! time); the load mutex only guards the one-time catalog load so a slow
//! load never blocks price calls once loaded.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio::sync::Mutex;

use crate::exchanges::errors::{ExchangeError, ExchangeResult};
use crate::exchanges::factory::AnyClient;
use crate::exchanges::networks::{build_network_index, NetworkInfo};
use crate::exchanges::traits::ExchangeClient;
use crate::exchanges::types::Ticker;

#[derive(Default)]
struct Catalog {
    symbols: HashSet<String>,
    spot_bases: HashSet<String>,
    networks: HashMap<String, Vec<NetworkInfo>>,
}

pub struct Exchange {
    id: Arc<str>,
    display_name: String,
    client: AnyClient,
    available: AtomicBool,
    loaded: AtomicBool,
    call_lock: Mutex<()>,
    load_lock: Mutex<()>,
    catalog: RwLock<Catalog>,
}

impl Exchange {
    pub fn new(id: &str, display_name: &str, client: AnyClient) -> Self {
        Self {
            id: Arc::from(id),
            display_name: display_name.to_string(),
            client,
            available: AtomicBool::new(true),
            loaded: AtomicBool::new(false),
            call_lock: Mutex::new(()),
            load_lock: Mutex::new(()),
            catalog: RwLock::new(Catalog::default()),
        }
    }

    pub fn id(&self) -> &Arc<str> {
        &self.id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::Acquire)
    }

    pub fn has_batch_tickers(&self) -> bool {
        self.client.has_batch_tickers()
    }

    fn catalog_read(&self) -> RwLockReadGuard<'_, Catalog> {
        self.catalog.read().unwrap_or_else(|e| e.into_inner())
    }

    fn catalog_write(&self) -> RwLockWriteGuard<'_, Catalog> {
        self.catalog.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Load the symbol set and currency metadata exactly once.
    ///
    /// Concurrent callers queue on the load mutex; whoever enters second
    /// observes the loaded flag and returns without touching the venue.
    /// A failed load latches the exchange unavailable for the rest of the
    /// process; later calls return false immediately.
    pub async fn ensure_markets(&self) -> bool {
        if self.loaded.load(Ordering::Acquire) {
            return true;
        }
        if !self.available.load(Ordering::Acquire) {
            return false;
        }

        let _guard = self.load_lock.lock().await;
        if self.loaded.load(Ordering::Acquire) {
            return true;
        }
        if !self.available.load(Ordering::Acquire) {
            return false;
        }

        let loaded: ExchangeResult<_> = async {
            let markets = self.client.load_markets().await?;
            let currencies = self.client.fetch_currencies().await?;
            Ok((markets, currencies))
        }
        .await;

        let (markets, currencies) = match loaded {
            Ok(pair) => pair,
            Err(e) => {
                tracing::warn!(
                    exchange = %self.id,
                    error = %e,
                    "Market load failed; marking exchange unavailable"
                );
                self.available.store(false, Ordering::Release);
                return false;
            }
        };

        let mut catalog = Catalog::default();
        for market in &markets {
            catalog.symbols.insert(market.symbol.clone());
            if market.spot {
                catalog.spot_bases.insert(market.base.to_uppercase());
            }
        }
        catalog.networks = build_network_index(&currencies);

        let symbols = catalog.symbols.len();
        let spot_bases = catalog.spot_bases.len();
        let currencies_indexed = catalog.networks.len();
        *self.catalog_write() = catalog;
        self.loaded.store(true, Ordering::Release);

        tracing::info!(
            exchange = %self.id,
            symbols,
            spot_bases,
            currencies = currencies_indexed,
            "Market catalog loaded"
        );
        true
    }

    /// Whether the loaded catalog lists a unified symbol
    pub fn has_symbol(&self, symbol: &str) -> bool {
        self.catalog_read().symbols.contains(symbol)
    }

    /// Spot base currencies, cloned out of the catalog
    pub fn spot_bases(&self) -> Vec<String> {
        self.catalog_read().spot_bases.iter().cloned().collect()
    }

    /// Funding networks for a base code, when the venue declared any
    pub fn networks_for(&self, code: &str) -> Option<Vec<NetworkInfo>> {
        self.catalog_read()
            .networks
            .get(&code.to_uppercase())
            .cloned()
    }

    /// Batch ticker fetch under the call mutex
    pub async fn batch_tickers(
        &self,
        symbols: &[String],
    ) -> ExchangeResult<HashMap<String, Ticker>> {
        if !self.is_available() {
            return Err(ExchangeError::Unavailable(self.id.to_string()));
        }
        let _guard = self.call_lock.lock().await;
        self.client.fetch_tickers(symbols).await
    }

    /// Single ticker fetch under the call mutex
    pub async fn single_ticker(&self, symbol: &str) -> ExchangeResult<Ticker> {
        if !self.is_available() {
            return Err(ExchangeError::Unavailable(self.id.to_string()));
        }
        let _guard = self.call_lock.lock().await;
        self.client.fetch_ticker(symbol).await
    }
}

/// Ordered collection of exchanges, built once at startup.
///
/// Replaces id-keyed global registries: everything that needs venue state
/// receives this value (or a selected slice of it) explicitly.
pub struct ExchangeRegistry {
    exchanges: Vec<Arc<Exchange>>,
}

impl ExchangeRegistry {
    pub fn new(exchanges: Vec<Arc<Exchange>>) -> Self {
        Self { exchanges }
    }

    pub fn all(&self) -> &[Arc<Exchange>] {
        &self.exchanges
    }

    pub fn len(&self) -> usize {
        self.exchanges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exchanges.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Arc<Exchange>> {
        self.exchanges.iter().find(|ex| ex.id.as_ref() == id)
    }

    /// Resolve selected ids to handles, preserving the given order and
    /// dropping unknown ids.
    pub fn select(&self, ids: &[String]) -> Vec<Arc<Exchange>> {
        ids.iter().filter_map(|id| self.get(id).cloned()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchanges::test_utils::MockExchange;

    fn mock_exchange(venue: &str) -> (Arc<Exchange>, Arc<crate::exchanges::test_utils::MockControl>)
    {
        let mock = MockExchange::new(venue)
            .with_market("BTC", "USDT")
            .with_disabled_market("DEAD", "USDT")
            .with_currency("BTC", &[("BTC", true, true), ("ERC20", true, false)]);
        let control = mock.control();
        let exchange = Arc::new(Exchange::new(venue, venue, AnyClient::Mock(mock)));
        (exchange, control)
    }

    #[tokio::test]
    async fn test_ensure_markets_loads_once() {
        let (exchange, control) = mock_exchange("alpha");
        assert!(exchange.ensure_markets().await);
        assert!(exchange.ensure_markets().await);
        assert_eq!(control.load_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_ensure_markets_is_single_load() {
        let (exchange, control) = mock_exchange("alpha");
        let (a, b) = tokio::join!(exchange.ensure_markets(), exchange.ensure_markets());
        assert!(a && b);
        assert_eq!(control.load_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_load_latches_unavailable() {
        let mock = MockExchange::new("alpha").failing_markets();
        let control = mock.control();
        let exchange = Exchange::new("alpha", "Alpha", AnyClient::Mock(mock));

        assert!(!exchange.ensure_markets().await);
        assert!(!exchange.is_available());
        // No retry on subsequent calls
        assert!(!exchange.ensure_markets().await);
        assert_eq!(control.load_calls.load(Ordering::SeqCst), 1);

        let err = exchange.single_ticker("BTC/USDT").await.unwrap_err();
        assert!(matches!(err, ExchangeError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_catalog_lookups() {
        let (exchange, _control) = mock_exchange("alpha");
        exchange.ensure_markets().await;

        assert!(exchange.has_symbol("BTC/USDT"));
        assert!(!exchange.has_symbol("ETH/USDT"));

        let bases = exchange.spot_bases();
        assert_eq!(bases, vec!["BTC".to_string()], "disabled market excluded");

        let networks = exchange.networks_for("btc").unwrap();
        assert_eq!(networks.len(), 2);
        assert_eq!(networks[1].key.as_deref(), Some("ETHEREUM"));
        assert_eq!(networks[1].withdraw, Some(false));
        assert!(exchange.networks_for("XRP").is_none());
    }

    #[tokio::test]
    async fn test_select_preserves_order_and_drops_unknown() {
        let (a, _) = mock_exchange("alpha");
        let (b, _) = mock_exchange("beta");
        let registry = ExchangeRegistry::new(vec![a, b]);

        let picked = registry.select(&[
            "beta".to_string(),
            "ghost".to_string(),
            "alpha".to_string(),
        ]);
        let ids: Vec<&str> = picked.iter().map(|ex| ex.id().as_ref()).collect();
        assert_eq!(ids, vec!["beta", "alpha"]);
    }
}
