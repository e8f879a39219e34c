//! Configuration module for scanner settings and persistence
//!
//! This module provides:
//! - Settings types (`ScanSettings`, `ScanMode`)
//! - JSON snapshot stores (`SettingsStore`, `BlacklistStore`)
//! - Logging configuration (`init_logging`)

pub mod logging;
pub mod store;
pub mod types;

// Re-export types
pub use types::{ScanMode, ScanSettings, SUPPORTED_QUOTES, TOP_N_CHOICES};

// Re-export stores
pub use store::{
    BlacklistStore, SettingsStore, BLACKLIST_FILE, BLACKLIST_PATH_ENV, SETTINGS_FILE,
    SETTINGS_PATH_ENV,
};

// Re-export logging functions
pub use logging::init_logging;
