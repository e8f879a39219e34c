//! Venue REST clients
//!
//! One module per venue family. All clients share the process-wide
//! reqwest client and speak unified symbols at their boundary.

pub mod binance;
pub mod gateio;
pub mod kucoin;
pub mod okx;

pub use binance::BinanceClient;
pub use gateio::GateioClient;
pub use kucoin::KucoinClient;
pub use okx::OkxClient;
