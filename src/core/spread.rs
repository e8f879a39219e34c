//! Spread computation and the row filtering pipeline

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use super::routes::{resolve_route, RoutePolicy};
use super::types::{PriceRow, TransferRoute, VerifyTag};

/// Spreads above this are treated as bad data, not arbitrage
const MAX_PLAUSIBLE_SPREAD: f64 = 99.0;

/// Row cap applied after sorting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TopN {
    #[default]
    All,
    Limit(usize),
}

impl TopN {
    /// `"ALL"`, a positive integer, or anything unparsable (keeps all).
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case("all") {
            return TopN::All;
        }
        match trimmed.parse::<usize>() {
            Ok(n) if n > 0 => TopN::Limit(n),
            _ => TopN::All,
        }
    }
}

/// User-tunable filters applied to finalized rows
#[derive(Debug, Clone)]
pub struct FilterOptions {
    pub min_spread: f64,
    pub sort_by_spread: bool,
    pub top_n: TopN,
    pub verified_only: bool,
    pub good_volume_only: bool,
    /// Floor for both sides' USD volume when `good_volume_only` is set
    pub min_volume_usd: f64,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self {
            min_spread: 0.0,
            sort_by_spread: true,
            top_n: TopN::All,
            verified_only: false,
            good_volume_only: false,
            min_volume_usd: 1000.0,
        }
    }
}

/// Compute spread, pick min/max sides and attach a transfer route for every
/// row with at least two priced venues. Venues are scanned in `selected`
/// order so price ties resolve to the earlier exchange. Rows without a
/// permitted route keep an empty spread and fall out in filtering.
pub fn finalize_rows(
    rows: &mut HashMap<Arc<str>, PriceRow>,
    selected: &[Arc<str>],
    policy: RoutePolicy,
) {
    for row in rows.values_mut() {
        let mut priced: Vec<(&Arc<str>, f64)> = Vec::new();
        for venue in selected {
            if let Some(price) = row.venues.get(venue.as_ref()).and_then(|cell| cell.price) {
                priced.push((venue, price));
            }
        }
        if priced.len() < 2 {
            continue;
        }

        let (mut min_venue, mut min_price) = priced[0];
        let (mut max_venue, mut max_price) = priced[0];
        for &(venue, price) in &priced[1..] {
            if price < min_price {
                min_venue = venue;
                min_price = price;
            }
            if price > max_price {
                max_venue = venue;
                max_price = price;
            }
        }
        if max_price <= min_price {
            continue;
        }

        let src_meta = row
            .venues
            .get(min_venue.as_ref())
            .and_then(|cell| cell.meta.clone())
            .unwrap_or_default();
        let dst_meta = row
            .venues
            .get(max_venue.as_ref())
            .and_then(|cell| cell.meta.clone())
            .unwrap_or_default();
        let Some(route) = resolve_route(&src_meta, &dst_meta) else {
            continue;
        };
        if !policy.permits(&route) {
            continue;
        }

        row.spread = Some((max_price - min_price) / min_price * 100.0);
        row.min_exchange = Some(min_venue.clone());
        row.max_exchange = Some(max_venue.clone());
        row.verify = match route {
            TransferRoute::Network(_) => VerifyTag::Confirmed,
            TransferRoute::Unverified => VerifyTag::SameAsset,
            TransferRoute::Unknown => VerifyTag::No,
        };
        row.min_volume_usd = row
            .venues
            .get(min_venue.as_ref())
            .and_then(|cell| cell.volume_usd);
        row.max_volume_usd = row
            .venues
            .get(max_venue.as_ref())
            .and_then(|cell| cell.volume_usd);
        row.route = route;
    }
}

/// Filter finalized rows in batch order, then sort and truncate.
pub fn apply_filters(
    batch_order: &[Arc<str>],
    rows: &HashMap<Arc<str>, PriceRow>,
    options: &FilterOptions,
    blacklist: &HashSet<String>,
) -> Vec<(Arc<str>, PriceRow)> {
    let mut items: Vec<(Arc<str>, PriceRow)> = Vec::new();
    for coin in batch_order {
        if blacklist.contains(coin.as_ref()) {
            continue;
        }
        let Some(row) = rows.get(coin) else {
            continue;
        };
        let Some(spread) = row.spread else {
            continue;
        };
        if spread > MAX_PLAUSIBLE_SPREAD || spread < options.min_spread {
            continue;
        }
        if options.verified_only && !row.verify.is_verified() {
            continue;
        }
        if options.good_volume_only {
            let floor = options.min_volume_usd;
            let liquid = matches!(row.min_volume_usd, Some(v) if v >= floor)
                && matches!(row.max_volume_usd, Some(v) if v >= floor);
            if !liquid {
                continue;
            }
        }
        items.push((coin.clone(), row.clone()));
    }

    if options.sort_by_spread {
        sort_by_spread_desc(&mut items);
    }
    if let TopN::Limit(limit) = options.top_n {
        items.truncate(limit);
    }
    items
}

/// Stable descending sort; rows without a spread go last.
pub fn sort_by_spread_desc(items: &mut [(Arc<str>, PriceRow)]) {
    items.sort_by(|a, b| {
        let lhs = a.1.spread.unwrap_or(-1.0);
        let rhs = b.1.spread.unwrap_or(-1.0);
        rhs.partial_cmp(&lhs).unwrap_or(Ordering::Equal)
    });
}
