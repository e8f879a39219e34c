//! Spreadscan: cross-exchange spread scanner core
//!
//! Periodic multi-exchange price collection and spread detection:
//! - Venue clients (Binance, MEXC, OKX, Gate.io, KuCoin) over public REST
//! - Price aggregation, route verification and spread filtering pipeline
//! - Rotating coin-universe scanner with a sticky saved-top cache

pub mod config;
pub mod core;
pub mod error;
pub mod exchanges;

pub use error::AppError;
