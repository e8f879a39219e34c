//! Venue access layer
//!
//! Everything that talks to an exchange lives here: the client trait and
//! its REST implementations, the registry with per-venue catalogs and
//! locks, network-key normalization and trade-link templates.

pub mod errors;
pub mod factory;
pub mod links;
pub mod networks;
pub mod registry;
pub mod test_utils;
pub mod traits;
pub mod types;
pub mod venues;

// Re-export commonly used types for convenience
pub use errors::{ExchangeError, ExchangeResult};
pub use factory::{build_registry, create_client, AnyClient, SUPPORTED_VENUES};
pub use links::trade_link;
pub use networks::{normalize_network_key, NetworkInfo};
pub use registry::{Exchange, ExchangeRegistry};
pub use traits::ExchangeClient;
pub use types::{Currency, CurrencyNetwork, Market, Ticker};
