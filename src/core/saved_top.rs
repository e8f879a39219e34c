//! Sticky cache of the best spreads seen across cycles
//!
//! The scan batch rotates, so a good spread found in one cycle would vanish
//! from view a cycle later. The cache keeps the strongest rows around and a
//! separate refresh pass re-prices them independently of the active batch.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use super::spread::sort_by_spread_desc;
use super::types::PriceRow;

/// Rows shown in the saved-top view
pub const SAVED_TOP_LIMIT: usize = 10;

/// Reserve beyond the displayed rows, kept for replacement churn
pub const SAVED_TOP_RESERVE: usize = 5;

/// Total pool size
pub const SAVED_TOP_POOL_LIMIT: usize = SAVED_TOP_LIMIT + SAVED_TOP_RESERVE;

/// How many leading rows of a cycle's output are considered for admission
pub const SAVED_BATCH_ADD: usize = 5;

#[derive(Default)]
pub struct SavedTopCache {
    entries: HashMap<Arc<str>, PriceRow>,
    /// Session-only manual exclusions, independent of the blacklist
    excluded: HashSet<Arc<str>>,
}

impl SavedTopCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Offer a cycle's filtered rows. Excluded coins are invisible here;
    /// blacklisted ones still occupy their admission slot. A stored row is
    /// only displaced by a strictly better spread.
    pub fn update_from_items(
        &mut self,
        items: &[(Arc<str>, PriceRow)],
        blacklist: &HashSet<String>,
    ) {
        let candidates = items
            .iter()
            .filter(|(coin, _)| !self.excluded.contains(coin))
            .take(SAVED_BATCH_ADD);
        for (coin, row) in candidates {
            if blacklist.contains(coin.as_ref()) {
                continue;
            }
            match self.entries.get(coin) {
                None => {
                    self.entries.insert(coin.clone(), row.clone());
                }
                Some(stored) => {
                    let better = match (row.spread, stored.spread) {
                        (Some(new), Some(old)) => new > old,
                        (Some(_), None) => true,
                        (None, _) => false,
                    };
                    if better {
                        self.entries.insert(coin.clone(), row.clone());
                    }
                }
            }
        }
        self.shrink();
    }

    /// Replace pool rows with freshly fetched ones; entries whose re-fetch
    /// produced no spread are dropped.
    pub fn apply_refreshed(
        &mut self,
        attempted: &[Arc<str>],
        refreshed: &HashMap<Arc<str>, PriceRow>,
    ) {
        for coin in attempted {
            if !self.entries.contains_key(coin) {
                continue;
            }
            match refreshed.get(coin) {
                Some(row) if row.spread.is_some() => {
                    self.entries.insert(coin.clone(), row.clone());
                }
                _ => {
                    self.entries.remove(coin);
                }
            }
        }
    }

    /// Remove a coin for the rest of the session.
    pub fn exclude(&mut self, coin: &str) {
        let coin: Arc<str> = Arc::from(coin.trim().to_uppercase().as_str());
        self.entries.remove(&coin);
        self.excluded.insert(coin);
    }

    pub fn is_excluded(&self, coin: &str) -> bool {
        self.excluded.contains(coin)
    }

    /// Coins to re-price in the saved refresh pass.
    pub fn pool_coins(&self) -> Vec<Arc<str>> {
        let mut items = self.sorted_entries();
        items.truncate(SAVED_TOP_POOL_LIMIT);
        items.into_iter().map(|(coin, _)| coin).collect()
    }

    /// Pool minus exclusions, best spread first, capped to the display size.
    pub fn displayed(&self) -> Vec<(Arc<str>, PriceRow)> {
        let mut items: Vec<(Arc<str>, PriceRow)> = self
            .entries
            .iter()
            .filter(|(coin, _)| !self.excluded.contains(*coin))
            .map(|(coin, row)| (coin.clone(), row.clone()))
            .collect();
        sort_by_spread_desc(&mut items);
        items.truncate(SAVED_TOP_LIMIT);
        items
    }

    fn sorted_entries(&self) -> Vec<(Arc<str>, PriceRow)> {
        let mut items: Vec<(Arc<str>, PriceRow)> = self
            .entries
            .iter()
            .map(|(coin, row)| (coin.clone(), row.clone()))
            .collect();
        sort_by_spread_desc(&mut items);
        items
    }

    fn shrink(&mut self) {
        if self.entries.len() <= SAVED_TOP_POOL_LIMIT {
            return;
        }
        let mut items = self.sorted_entries();
        items.truncate(SAVED_TOP_POOL_LIMIT);
        self.entries = items.into_iter().collect();
    }
}
