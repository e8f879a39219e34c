//! Scanner settings
//!
//! Settings persist as a JSON snapshot and are tolerant of hand edits:
//! numeric fields stay strings and fall back to defaults when unparsable,
//! whitelist fields snap back to a known value in `sanitize`.

use serde::{Deserialize, Serialize};

use crate::exchanges::factory::SUPPORTED_VENUES;

// ============================================================================
// Choice lists
// ============================================================================

/// Quote currencies offered for the preferred-quote setting
pub const SUPPORTED_QUOTES: [&str; 5] = ["USDT", "USD", "USDC", "BTC", "ETH"];

/// Offered top-N row caps
pub const TOP_N_CHOICES: [&str; 5] = ["ALL", "10", "20", "50", "100"];

/// Smallest allowed auto-refresh interval, seconds
pub const MIN_REFRESH_INTERVAL_SECS: u64 = 5;

// ============================================================================
// Enums
// ============================================================================

/// Where the scan batch comes from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum ScanMode {
    /// Rotate through the global coin universe
    #[default]
    Auto,
    /// Scan only the user-entered coin list
    Manual,
}

// ============================================================================
// Settings
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScanSettings {
    /// Manual-mode coin list, comma separated
    #[serde(default)]
    pub coins: String,
    #[serde(default)]
    pub scan_mode: ScanMode,
    /// Preferred quote currency for symbol resolution
    #[serde(default = "default_quote")]
    pub quote: String,
    /// Auto-refresh interval in seconds, as entered
    #[serde(default = "default_interval")]
    pub interval: String,
    #[serde(default = "default_true")]
    pub sort_by_spread: bool,
    /// Keep only rows with a verified transfer route
    #[serde(default)]
    pub verified_only: bool,
    /// Require both sides of a spread to clear the volume floor
    #[serde(default)]
    pub good_volume_only: bool,
    /// Volume floor in thousands of USD, as entered
    #[serde(default = "default_min_volume_k")]
    pub min_volume_k: String,
    /// Minimum spread percentage, as entered
    #[serde(default = "default_min_spread")]
    pub min_spread: String,
    /// Row cap after sorting, `"ALL"` or a number
    #[serde(default = "default_top_n")]
    pub top_n: String,
    /// Exchange ids taking part in scans
    #[serde(default = "default_exchanges")]
    pub selected_exchanges: Vec<String>,
    /// Reject routes that cannot be confirmed by network metadata
    #[serde(default)]
    pub strict_routes: bool,
}

fn default_quote() -> String {
    "USDT".to_string()
}

fn default_interval() -> String {
    "20".to_string()
}

fn default_true() -> bool {
    true
}

fn default_min_volume_k() -> String {
    "1".to_string()
}

fn default_min_spread() -> String {
    "0".to_string()
}

fn default_top_n() -> String {
    "50".to_string()
}

fn default_exchanges() -> Vec<String> {
    SUPPORTED_VENUES.iter().map(|v| v.id.to_string()).collect()
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            coins: String::new(),
            scan_mode: ScanMode::default(),
            quote: default_quote(),
            interval: default_interval(),
            sort_by_spread: true,
            verified_only: false,
            good_volume_only: false,
            min_volume_k: default_min_volume_k(),
            min_spread: default_min_spread(),
            top_n: default_top_n(),
            selected_exchanges: default_exchanges(),
            strict_routes: false,
        }
    }
}

impl ScanSettings {
    /// Snap whitelist fields back to known values and drop unknown
    /// exchange ids. Free-text fields are left alone; their accessors
    /// apply fallbacks at read time.
    pub fn sanitize(&mut self) {
        let quote = self.quote.trim().to_uppercase();
        self.quote = if SUPPORTED_QUOTES.contains(&quote.as_str()) {
            quote
        } else {
            default_quote()
        };

        let top_n = self.top_n.trim().to_uppercase();
        self.top_n = if TOP_N_CHOICES.contains(&top_n.as_str()) {
            top_n
        } else {
            default_top_n()
        };

        self.selected_exchanges
            .retain(|id| SUPPORTED_VENUES.iter().any(|v| v.id == id));
    }

    /// Preferred quote, upper-cased; empty falls back to USDT.
    pub fn preferred_quote(&self) -> String {
        let quote = self.quote.trim().to_uppercase();
        if quote.is_empty() {
            default_quote()
        } else {
            quote
        }
    }

    /// Minimum spread percentage; unparsable input means no minimum.
    pub fn min_spread_value(&self) -> f64 {
        self.min_spread.trim().parse::<f64>().unwrap_or(0.0)
    }

    /// Volume floor in USD. Unparsable input falls back to $1000,
    /// negative input clamps to zero.
    pub fn min_volume_usd(&self) -> f64 {
        let floor = self
            .min_volume_k
            .trim()
            .parse::<f64>()
            .map(|k| k * 1000.0)
            .unwrap_or(1000.0);
        floor.max(0.0)
    }

    /// Auto-refresh interval when valid (integer, at least 5 seconds).
    pub fn interval_secs(&self) -> Option<u64> {
        match self.interval.trim().parse::<u64>() {
            Ok(secs) if secs >= MIN_REFRESH_INTERVAL_SECS => Some(secs),
            _ => None,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
