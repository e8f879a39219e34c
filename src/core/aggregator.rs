//! Concurrent price and volume collection for a coin batch
//!
//! One task per selected exchange, bounded by a semaphore. An exchange that
//! is unavailable or fails mid-fetch contributes empty cells; it never fails
//! the batch.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::exchanges::links::trade_link;
use crate::exchanges::registry::Exchange;
use crate::exchanges::types::{split_symbol, Ticker};

use super::types::{AssetMeta, PriceRow, VenueQuote};

// ==================== Constants ====================

/// Upper bound on concurrent per-exchange fetch tasks
pub const MAX_REFRESH_WORKERS: usize = 24;

/// Quote currencies tried for symbol resolution, after the preferred one
pub const FALLBACK_QUOTES: [&str; 4] = ["USDT", "USD", "USDC", "BTC"];

/// Quotes treated as 1:1 with USD for volume conversion
const USD_LIKE_QUOTES: [&str; 7] = ["USD", "USDT", "USDC", "FDUSD", "TUSD", "USDE", "DAI"];

/// Quote tickers tried when converting a non-USD quote volume to USD
const USD_CONVERSION_QUOTES: [&str; 3] = ["USDT", "USD", "USDC"];

// ==================== Batch collection ====================

/// Collect prices and volumes for `coins` across `exchanges`.
///
/// Every batch coin appears in the output; cells stay empty where an
/// exchange resolved nothing.
pub async fn collect_batch(
    exchanges: &[Arc<Exchange>],
    coins: &[Arc<str>],
    preferred_quote: &str,
) -> HashMap<Arc<str>, PriceRow> {
    let selected: Vec<Arc<str>> = exchanges.iter().map(|ex| ex.id().clone()).collect();
    let mut rows: HashMap<Arc<str>, PriceRow> = coins
        .iter()
        .map(|coin| (coin.clone(), PriceRow::empty(&selected)))
        .collect();
    if coins.is_empty() || exchanges.is_empty() {
        return rows;
    }

    let permits = Arc::new(Semaphore::new(
        MAX_REFRESH_WORKERS.min(exchanges.len()).max(1),
    ));
    let mut tasks: JoinSet<(Arc<str>, HashMap<Arc<str>, VenueQuote>)> = JoinSet::new();
    for exchange in exchanges {
        let exchange = exchange.clone();
        let coins: Vec<Arc<str>> = coins.to_vec();
        let preferred = preferred_quote.to_string();
        let permits = permits.clone();
        tasks.spawn(async move {
            let _permit = match permits.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => return (exchange.id().clone(), HashMap::new()),
            };
            let cells = fetch_venue_quotes(&exchange, &coins, &preferred).await;
            (exchange.id().clone(), cells)
        });
    }

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((venue, cells)) => {
                for (coin, cell) in cells {
                    if let Some(row) = rows.get_mut(&coin) {
                        row.venues.insert(venue.clone(), cell);
                    }
                }
            }
            Err(err) => warn!(error = %err, "price collection task failed"),
        }
    }

    // Pair label comes from the first exchange (configured order) that
    // resolved a symbol, independent of task completion order.
    for row in rows.values_mut() {
        row.pair = exchanges.iter().find_map(|ex| {
            row.venues
                .get(ex.id().as_ref())
                .and_then(|cell| cell.symbol.clone())
        });
    }

    rows
}

/// Fetch one exchange's cells for the batch. Never errors: an unavailable
/// exchange or a failed fetch simply leaves cells empty.
async fn fetch_venue_quotes(
    exchange: &Exchange,
    coins: &[Arc<str>],
    preferred_quote: &str,
) -> HashMap<Arc<str>, VenueQuote> {
    let mut cells: HashMap<Arc<str>, VenueQuote> = coins
        .iter()
        .map(|coin| (coin.clone(), VenueQuote::default()))
        .collect();

    if !exchange.ensure_markets().await {
        return cells;
    }

    let mut resolved: Vec<(Arc<str>, String)> = Vec::new();
    for coin in coins {
        if let Some(symbol) = resolve_symbol(exchange, coin, preferred_quote) {
            resolved.push((coin.clone(), symbol));
        }
    }
    if resolved.is_empty() {
        return cells;
    }

    let symbols: Vec<String> = resolved.iter().map(|(_, symbol)| symbol.clone()).collect();
    let mut tickers: HashMap<String, Ticker> = HashMap::new();
    if exchange.has_batch_tickers() {
        match exchange.batch_tickers(&symbols).await {
            Ok(batch) => tickers = batch,
            Err(err) => debug!(
                exchange = %exchange.id(),
                error = %err,
                "batch ticker fetch failed, retrying per symbol"
            ),
        }
    }
    for symbol in &symbols {
        if tickers.contains_key(symbol) {
            continue;
        }
        match exchange.single_ticker(symbol).await {
            Ok(ticker) => {
                tickers.insert(symbol.clone(), ticker);
            }
            Err(err) => debug!(
                exchange = %exchange.id(),
                symbol = %symbol,
                error = %err,
                "ticker fetch failed"
            ),
        }
    }

    for (coin, symbol) in resolved {
        let meta = AssetMeta::new(
            coin.as_ref(),
            exchange.networks_for(coin.as_ref()).unwrap_or_default(),
        );
        let (price, reported_quote_volume, base_volume) = match tickers.get(&symbol) {
            Some(ticker) => (
                extract_price(ticker),
                ticker.quote_volume,
                ticker.base_volume,
            ),
            None => (None, None, None),
        };
        let quote_volume = reported_quote_volume
            .filter(|v| *v > 0.0)
            .or_else(|| match (base_volume, price) {
                (Some(base), Some(px)) if base > 0.0 => Some(base * px),
                _ => None,
            });
        let volume_usd = match quote_volume {
            Some(volume) => {
                let (_, quote) = split_symbol(&symbol);
                let quote = quote.to_string();
                quote_usd_multiplier(exchange, &quote, &mut tickers)
                    .await
                    .map(|rate| volume * rate)
            }
            None => None,
        };

        cells.insert(
            coin,
            VenueQuote {
                price,
                symbol: Some(Arc::from(symbol.as_str())),
                link: trade_link(exchange.id().as_ref(), &symbol),
                meta: Some(meta),
                volume_usd,
            },
        );
    }

    cells
}

// ==================== Symbol and price helpers ====================

/// Resolve a coin to the first listed `COIN/QUOTE` candidate, preferred
/// quote first, then the fixed fallback sequence.
pub fn resolve_symbol(exchange: &Exchange, coin: &str, preferred_quote: &str) -> Option<String> {
    let preferred = preferred_quote.trim().to_uppercase();
    let mut candidates: Vec<&str> = Vec::with_capacity(1 + FALLBACK_QUOTES.len());
    if !preferred.is_empty() {
        candidates.push(preferred.as_str());
    }
    for quote in FALLBACK_QUOTES {
        if quote != preferred {
            candidates.push(quote);
        }
    }
    for quote in candidates {
        let symbol = format!("{}/{}", coin, quote);
        if exchange.has_symbol(&symbol) {
            return Some(symbol);
        }
    }
    None
}

/// First strictly positive of last, close, bid.
pub fn extract_price(ticker: &Ticker) -> Option<f64> {
    [ticker.last, ticker.close, ticker.bid]
        .into_iter()
        .flatten()
        .find(|value| *value > 0.0)
}

/// Quote-to-USD conversion rate. USD-like quotes convert 1:1; anything else
/// is priced through its own ticker against USDT, USD then USDC, reusing
/// tickers already fetched this cycle and caching on-demand fetches.
async fn quote_usd_multiplier(
    exchange: &Exchange,
    quote: &str,
    tickers: &mut HashMap<String, Ticker>,
) -> Option<f64> {
    let quote = quote.trim().to_uppercase();
    if USD_LIKE_QUOTES.contains(&quote.as_str()) {
        return Some(1.0);
    }
    for stable in USD_CONVERSION_QUOTES {
        let candidate = format!("{}/{}", quote, stable);
        if !tickers.contains_key(&candidate) {
            if !exchange.has_symbol(&candidate) {
                continue;
            }
            match exchange.single_ticker(&candidate).await {
                Ok(ticker) => {
                    tickers.insert(candidate.clone(), ticker);
                }
                Err(err) => {
                    debug!(
                        exchange = %exchange.id(),
                        symbol = %candidate,
                        error = %err,
                        "quote conversion fetch failed"
                    );
                    continue;
                }
            }
        }
        if let Some(rate) = tickers.get(&candidate).and_then(extract_price) {
            return Some(rate);
        }
    }
    None
}
