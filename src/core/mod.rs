//! Core scan pipeline
//!
//! This module provides:
//! - Row and route domain types (`PriceRow`, `TransferRoute`, `VerifyTag`)
//! - Concurrent price collection (`collect_batch`)
//! - Spread computation and filtering (`finalize_rows`, `apply_filters`)
//! - Universe construction and rotation (`build_universe`, `UniverseState`)
//! - The saved-top cache and the `Scanner` orchestrator

pub mod aggregator;
pub mod popularity;
pub mod render;
pub mod routes;
pub mod runtime;
pub mod saved_top;
pub mod spread;
pub mod types;
pub mod universe;

// Re-export commonly used types for convenience
pub use aggregator::{collect_batch, extract_price, resolve_symbol};
pub use popularity::{CoinGeckoSource, PopularitySource, StaticRanking};
pub use render::{LogSink, RecordingSink, RenderSink};
pub use routes::{resolve_route, RoutePolicy};
pub use runtime::{filter_options, parse_manual_coins, route_policy, Scanner};
pub use saved_top::SavedTopCache;
pub use spread::{apply_filters, finalize_rows, FilterOptions, TopN};
pub use types::{format_price, AssetMeta, PriceRow, TransferRoute, VenueQuote, VerifyTag};
pub use universe::{build_universe, UniverseState, SCAN_BATCH_SIZE};
