//! Global coin universe: construction and round-robin batch selection

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::exchanges::registry::ExchangeRegistry;

use super::popularity::PopularitySource;

// ==================== Constants ====================

/// Hard cap on the universe size
pub const LONG_SCAN_LIMIT: usize = 10_000;

/// How many externally-ranked coins lead the universe
pub const POPULAR_START_COUNT: usize = 500;

/// Default number of coins per refresh cycle
pub const SCAN_BATCH_SIZE: usize = 50;

/// Concurrent market loads during universe construction
pub const BOOTSTRAP_WORKERS: usize = 10;

// ==================== Round-robin state ====================

/// Cursor over the coin universe. `advance` is a pure transition so cycle
/// arithmetic stays testable without any scanner plumbing around it.
#[derive(Debug, Clone, Default)]
pub struct UniverseState {
    coins: Vec<Arc<str>>,
    cursor: usize,
    cycle: u64,
}

impl UniverseState {
    pub fn new(coins: Vec<Arc<str>>) -> Self {
        Self {
            coins,
            cursor: 0,
            cycle: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.coins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coins.is_empty()
    }

    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Next batch and the state after taking it. Blacklisted coins are
    /// skipped in place; the walk gives up after 2x universe length
    /// attempts so a fully blacklisted universe cannot spin forever.
    pub fn advance(&self, batch_size: usize, blacklist: &HashSet<String>) -> (Vec<Arc<str>>, Self) {
        let mut next = self.clone();
        if self.coins.is_empty() || batch_size == 0 {
            return (Vec::new(), next);
        }

        let target = batch_size.min(self.coins.len());
        let ceiling = self.coins.len() * 2;
        let mut batch: Vec<Arc<str>> = Vec::with_capacity(target);
        let mut attempts = 0usize;
        while batch.len() < target && attempts < ceiling {
            attempts += 1;
            let coin = next.coins[next.cursor].clone();
            next.cursor = (next.cursor + 1) % next.coins.len();
            if next.cursor == 0 {
                next.cycle += 1;
                debug!(cycle = next.cycle, "universe cursor wrapped");
            }
            if blacklist.contains(coin.as_ref()) {
                continue;
            }
            if batch.iter().any(|picked| picked.as_ref() == coin.as_ref()) {
                continue;
            }
            batch.push(coin);
        }
        (batch, next)
    }
}

// ==================== Construction ====================

/// Union of spot base currencies across every exchange, sorted, blacklist
/// removed, capped, and reordered so ranked popular coins come first.
/// Exchanges whose market load fails are skipped.
pub async fn build_universe(
    registry: &ExchangeRegistry,
    popularity: &dyn PopularitySource,
    blacklist: &HashSet<String>,
) -> Vec<Arc<str>> {
    let permits = Arc::new(Semaphore::new(BOOTSTRAP_WORKERS));
    let mut tasks: JoinSet<Vec<String>> = JoinSet::new();
    for exchange in registry.all() {
        let exchange = exchange.clone();
        let permits = permits.clone();
        tasks.spawn(async move {
            let _permit = match permits.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => return Vec::new(),
            };
            if exchange.ensure_markets().await {
                exchange.spot_bases()
            } else {
                Vec::new()
            }
        });
    }

    let mut union: BTreeSet<String> = BTreeSet::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(bases) => union.extend(bases),
            Err(err) => warn!(error = %err, "universe load task failed"),
        }
    }

    let available: Vec<String> = union
        .into_iter()
        .filter(|coin| !blacklist.contains(coin))
        .take(LONG_SCAN_LIMIT)
        .collect();
    if available.is_empty() {
        return Vec::new();
    }

    let ranked = popularity.ranked_symbols().await;
    let ordered = seed_popular(&ranked, &available);
    info!(coins = ordered.len(), "coin universe built");
    ordered
}

/// Move ranked coins that exist in `available` to the front, keeping the
/// remainder in sorted order behind them.
fn seed_popular(ranked: &[String], available: &[String]) -> Vec<Arc<str>> {
    let listed: HashSet<&str> = available.iter().map(String::as_str).collect();
    let mut popular: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    for symbol in ranked {
        if popular.len() >= POPULAR_START_COUNT {
            break;
        }
        let coin = symbol.trim().to_uppercase();
        if coin.is_empty() || !listed.contains(coin.as_str()) || !seen.insert(coin.clone()) {
            continue;
        }
        popular.push(coin);
    }

    let mut ordered: Vec<Arc<str>> = popular.iter().map(|c| Arc::from(c.as_str())).collect();
    for coin in available {
        if !seen.contains(coin) {
            ordered.push(Arc::from(coin.as_str()));
        }
    }
    ordered
}
