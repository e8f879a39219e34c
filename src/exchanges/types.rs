//! Unified market data types
//!
//! Every venue client converts its wire payloads into these records so the
//! scan pipeline never sees venue-specific shapes. Symbols are unified as
//! `BASE/QUOTE` (e.g. `BTC/USDT`) regardless of the venue's native format.

/// A trading pair listed on a venue
#[derive(Debug, Clone, PartialEq)]
pub struct Market {
    /// Unified symbol, e.g. `BTC/USDT`
    pub symbol: String,
    /// Base currency code, upper-case
    pub base: String,
    /// Quote currency code, upper-case
    pub quote: String,
    /// Whether the pair is an enabled spot market
    pub spot: bool,
}

impl Market {
    pub fn spot_pair(base: &str, quote: &str) -> Self {
        Self {
            symbol: format!("{}/{}", base, quote),
            base: base.to_uppercase(),
            quote: quote.to_uppercase(),
            spot: true,
        }
    }
}

/// A 24h ticker snapshot for one symbol
///
/// Fields a venue does not report stay `None`; price extraction falls
/// through last → close → bid downstream.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ticker {
    /// Unified symbol this snapshot belongs to
    pub symbol: String,
    pub last: Option<f64>,
    pub close: Option<f64>,
    pub bid: Option<f64>,
    /// 24h volume in base currency units
    pub base_volume: Option<f64>,
    /// 24h volume in quote currency units
    pub quote_volume: Option<f64>,
}

/// One funding network declared by a venue for a currency, raw form
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CurrencyNetwork {
    /// Venue-reported network name, e.g. `ERC20`, `Arbitrum One`
    pub id: String,
    pub deposit: Option<bool>,
    pub withdraw: Option<bool>,
    pub active: Option<bool>,
}

/// A currency with its declared funding networks
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Currency {
    /// Currency code, upper-case
    pub code: String,
    pub networks: Vec<CurrencyNetwork>,
}

/// Lenient string-to-f64 parse used on venue payloads.
///
/// Venues report numbers as strings; an empty or unparsable field means the
/// value is simply absent, not that the payload is broken.
pub(crate) fn parse_opt_f64(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok()
}

/// Split a unified symbol into (base, quote). Quote is empty when the
/// separator is missing.
pub fn split_symbol(symbol: &str) -> (&str, &str) {
    match symbol.split_once('/') {
        Some((base, quote)) => (base, quote),
        None => (symbol, ""),
    }
}
