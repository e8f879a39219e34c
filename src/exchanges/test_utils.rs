//! Shared mock venue client for tests
//!
//! A configurable in-memory `ExchangeClient` used by unit tests, integration
//! tests and benches. Markets and currencies are preset at build time;
//! tickers and failure toggles live behind an `Arc<MockControl>` handle so
//! tests can keep driving the venue after the client has been moved into an
//! `Exchange` record.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use crate::exchanges::errors::{ExchangeError, ExchangeResult};
use crate::exchanges::traits::ExchangeClient;
use crate::exchanges::types::{Currency, CurrencyNetwork, Market, Ticker};

/// Shared mutable side of a mock venue: tickers, failure toggles, counters.
#[derive(Debug, Default)]
pub struct MockControl {
    pub load_calls: AtomicUsize,
    pub batch_calls: AtomicUsize,
    pub single_calls: AtomicUsize,
    tickers: Mutex<HashMap<String, Ticker>>,
    failing_symbols: Mutex<HashSet<String>>,
}

impl MockControl {
    fn tickers(&self) -> MutexGuard<'_, HashMap<String, Ticker>> {
        self.tickers.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn failing(&self) -> MutexGuard<'_, HashSet<String>> {
        self.failing_symbols.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Insert or replace a full ticker
    pub fn set_ticker(&self, ticker: Ticker) {
        self.tickers().insert(ticker.symbol.clone(), ticker);
    }

    /// Replace just the last price, keeping any stored volumes
    pub fn set_last_price(&self, symbol: &str, last: f64) {
        let mut map = self.tickers();
        let entry = map.entry(symbol.to_string()).or_insert_with(|| Ticker {
            symbol: symbol.to_string(),
            ..Ticker::default()
        });
        entry.last = Some(last);
    }

    /// Remove the ticker entirely; subsequent fetches fail
    pub fn clear_ticker(&self, symbol: &str) {
        self.tickers().remove(symbol);
        self.failing().insert(symbol.to_string());
    }

    /// Make per-symbol fetches for this symbol fail
    pub fn fail_symbol(&self, symbol: &str) {
        self.failing().insert(symbol.to_string());
    }
}

#[derive(Debug)]
pub struct MockExchange {
    venue: String,
    batch: bool,
    fail_markets: bool,
    fail_batch: bool,
    markets: Vec<Market>,
    currencies: Vec<Currency>,
    control: Arc<MockControl>,
}

impl MockExchange {
    pub fn new(venue: &str) -> Self {
        Self {
            venue: venue.to_string(),
            batch: true,
            fail_markets: false,
            fail_batch: false,
            markets: Vec::new(),
            currencies: Vec::new(),
            control: Arc::new(MockControl::default()),
        }
    }

    /// Handle to the shared mutable side; grab it before the client is moved
    pub fn control(&self) -> Arc<MockControl> {
        self.control.clone()
    }

    pub fn without_batch(mut self) -> Self {
        self.batch = false;
        self
    }

    pub fn failing_markets(mut self) -> Self {
        self.fail_markets = true;
        self
    }

    pub fn failing_batch(mut self) -> Self {
        self.fail_batch = true;
        self
    }

    pub fn with_market(mut self, base: &str, quote: &str) -> Self {
        self.markets.push(Market::spot_pair(base, quote));
        self
    }

    pub fn with_disabled_market(mut self, base: &str, quote: &str) -> Self {
        let mut market = Market::spot_pair(base, quote);
        market.spot = false;
        self.markets.push(market);
        self
    }

    /// Market plus a basic ticker in one step
    pub fn with_priced_market(self, base: &str, quote: &str, last: f64, quote_volume: f64) -> Self {
        let with_market = self.with_market(base, quote);
        with_market.control.set_ticker(Ticker {
            symbol: format!("{}/{}", base, quote),
            last: Some(last),
            close: None,
            bid: None,
            base_volume: None,
            quote_volume: Some(quote_volume),
        });
        with_market
    }

    pub fn with_ticker(self, ticker: Ticker) -> Self {
        self.control.set_ticker(ticker);
        self
    }

    /// Currency metadata: `(network id, deposit enabled, withdraw enabled)`
    pub fn with_currency(mut self, code: &str, networks: &[(&str, bool, bool)]) -> Self {
        self.currencies.push(Currency {
            code: code.to_string(),
            networks: networks
                .iter()
                .map(|(id, deposit, withdraw)| CurrencyNetwork {
                    id: (*id).to_string(),
                    deposit: Some(*deposit),
                    withdraw: Some(*withdraw),
                    active: Some(true),
                })
                .collect(),
        });
        self
    }
}

#[async_trait]
impl ExchangeClient for MockExchange {
    fn venue(&self) -> &str {
        &self.venue
    }

    fn has_batch_tickers(&self) -> bool {
        self.batch
    }

    async fn load_markets(&self) -> ExchangeResult<Vec<Market>> {
        self.control.load_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_markets {
            return Err(ExchangeError::Unavailable(self.venue.clone()));
        }
        Ok(self.markets.clone())
    }

    async fn fetch_ticker(&self, symbol: &str) -> ExchangeResult<Ticker> {
        self.control.single_calls.fetch_add(1, Ordering::SeqCst);
        if self.control.failing().contains(symbol) {
            return Err(ExchangeError::InvalidResponse(format!(
                "mock failure for {}",
                symbol
            )));
        }
        self.control
            .tickers()
            .get(symbol)
            .cloned()
            .ok_or_else(|| ExchangeError::InvalidResponse(format!("no ticker for {}", symbol)))
    }

    async fn fetch_tickers(&self, symbols: &[String]) -> ExchangeResult<HashMap<String, Ticker>> {
        self.control.batch_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_batch {
            return Err(ExchangeError::InvalidResponse("mock batch failure".into()));
        }
        let failing = self.control.failing().clone();
        let map = self.control.tickers();
        Ok(symbols
            .iter()
            .filter(|s| !failing.contains(s.as_str()))
            .filter_map(|s| map.get(s).map(|t| (s.clone(), t.clone())))
            .collect())
    }

    async fn fetch_currencies(&self) -> ExchangeResult<Vec<Currency>> {
        Ok(self.currencies.clone())
    }
}
