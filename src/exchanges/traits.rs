//! Exchange client trait definition
//!
//! The ExchangeClient trait defines the common read-only interface that all
//! venue REST clients must implement for consistent behavior.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::exchanges::errors::ExchangeResult;
use crate::exchanges::types::{Currency, Market, Ticker};

/// Common trait for all venue clients
///
/// Implementations wrap one venue's public market-data REST API behind
/// unified `BASE/QUOTE` symbols. Nothing here mutates venue state.
#[async_trait]
pub trait ExchangeClient: Send + Sync {
    /// Venue identifier, e.g. "binance"
    fn venue(&self) -> &str;

    /// Whether the venue can serve all tickers in a single call
    ///
    /// When false, callers go straight to per-symbol fetches.
    fn has_batch_tickers(&self) -> bool;

    /// Load the full tradable market list
    async fn load_markets(&self) -> ExchangeResult<Vec<Market>>;

    /// Fetch a single ticker by unified symbol
    async fn fetch_ticker(&self, symbol: &str) -> ExchangeResult<Ticker>;

    /// Fetch tickers for many symbols at once, keyed by unified symbol
    ///
    /// Symbols absent from the result are retried individually by the
    /// caller; returning fewer entries than requested is not an error.
    async fn fetch_tickers(&self, symbols: &[String]) -> ExchangeResult<HashMap<String, Ticker>>;

    /// Fetch currency/network metadata
    ///
    /// Venues without a public endpoint return an empty list, which
    /// downgrades their transfer routes to "unverified".
    async fn fetch_currencies(&self) -> ExchangeResult<Vec<Currency>>;
}
