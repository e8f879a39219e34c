//! Core domain types for the scan pipeline
//!
//! A refresh cycle produces one `PriceRow` per coin; rows are fixed records
//! (tagged fields, not open maps) so every stage and every test names the
//! same shape.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::exchanges::networks::NetworkInfo;

/// Funding metadata attached to one venue cell, consumed by route checks
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssetMeta {
    /// Base currency code, upper-case
    pub base_code: String,
    pub networks: Vec<NetworkInfo>,
}

impl AssetMeta {
    pub fn new(base_code: &str, networks: Vec<NetworkInfo>) -> Self {
        Self {
            base_code: base_code.to_uppercase(),
            networks,
        }
    }
}

/// One venue's contribution to a coin row. Everything is optional: a venue
/// that lists the coin but returned no ticker still contributes its symbol,
/// link and metadata.
#[derive(Debug, Clone, Default)]
pub struct VenueQuote {
    pub price: Option<f64>,
    pub symbol: Option<Arc<str>>,
    pub link: Option<String>,
    pub meta: Option<AssetMeta>,
    pub volume_usd: Option<f64>,
}

/// Transfer route attached to a row
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferRoute {
    /// Nothing determined, either no spread yet or no permitted route
    Unknown,
    /// Same asset on both venues, no network metadata to confirm transfer
    Unverified,
    /// Confirmed shared network, by source-side display label
    Network(String),
}

impl TransferRoute {
    pub fn label(&self) -> &str {
        match self {
            TransferRoute::Unknown => "N/A",
            TransferRoute::Unverified => "UNVERIFIED",
            TransferRoute::Network(name) => name,
        }
    }
}

/// Row-level verification tag shown next to the route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyTag {
    /// No route established
    No,
    /// Same asset, transferability unconfirmed
    SameAsset,
    /// Confirmed network match
    Confirmed,
}

impl VerifyTag {
    pub fn label(self) -> &'static str {
        match self {
            VerifyTag::No => "NO",
            VerifyTag::SameAsset => "YES",
            VerifyTag::Confirmed => "GOOO",
        }
    }

    /// Both route tags count as verified for the verified-only filter
    pub fn is_verified(self) -> bool {
        !matches!(self, VerifyTag::No)
    }
}

/// One coin's snapshot in a refresh cycle
#[derive(Debug, Clone)]
pub struct PriceRow {
    /// First resolved trading pair, e.g. `BTC/USDT`
    pub pair: Option<Arc<str>>,
    /// Per-venue cells, pre-seeded for every selected exchange
    pub venues: HashMap<Arc<str>, VenueQuote>,
    /// Percentage gap between max and min price
    pub spread: Option<f64>,
    pub min_exchange: Option<Arc<str>>,
    pub max_exchange: Option<Arc<str>>,
    pub route: TransferRoute,
    pub verify: VerifyTag,
    /// USD volume on the buy (min price) side
    pub min_volume_usd: Option<f64>,
    /// USD volume on the sell (max price) side
    pub max_volume_usd: Option<f64>,
    pub as_of: DateTime<Utc>,
}

impl PriceRow {
    /// Fresh row with empty cells for every selected exchange
    pub fn empty(selected: &[Arc<str>]) -> Self {
        Self {
            pair: None,
            venues: selected
                .iter()
                .map(|id| (id.clone(), VenueQuote::default()))
                .collect(),
            spread: None,
            min_exchange: None,
            max_exchange: None,
            route: TransferRoute::Unknown,
            verify: VerifyTag::No,
            min_volume_usd: None,
            max_volume_usd: None,
            as_of: Utc::now(),
        }
    }
}

/// Display formatting: thousands separators, precision scaled to magnitude.
pub fn format_price(value: Option<f64>) -> String {
    let Some(v) = value else {
        return "N/A".to_string();
    };
    if v >= 1000.0 {
        group_thousands(v, 2)
    } else if v >= 1.0 {
        group_thousands(v, 4)
    } else {
        group_thousands(v, 8)
    }
}

fn group_thousands(value: f64, decimals: usize) -> String {
    let raw = format!("{:.*}", decimals, value);
    let (int_part, frac_part) = match raw.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (raw.as_str(), None),
    };
    let (sign, digits) = match int_part.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", int_part),
    };

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    match frac_part {
        Some(frac) => format!("{}{}.{}", sign, grouped, frac),
        None => format!("{}{}", sign, grouped),
    }
}
