//! JSON snapshot persistence for settings and the coin blacklist
//!
//! Both stores are forgiving on load: a missing file means defaults, a
//! corrupt file is logged and replaced by defaults on the next save. Load
//! never fails the program.

use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::Result;

use super::types::ScanSettings;

/// Default settings snapshot path
pub const SETTINGS_FILE: &str = "user_settings.json";

/// Default blacklist snapshot path
pub const BLACKLIST_FILE: &str = "coin_blacklist.json";

/// Environment variable overriding the settings snapshot path
pub const SETTINGS_PATH_ENV: &str = "SPREADSCAN_SETTINGS";

/// Environment variable overriding the blacklist snapshot path
pub const BLACKLIST_PATH_ENV: &str = "SPREADSCAN_BLACKLIST";

// ============================================================================
// Settings store
// ============================================================================

pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Store at the path from `SPREADSCAN_SETTINGS`, defaulting to
    /// `user_settings.json` in the working directory.
    pub fn from_env() -> Self {
        let path =
            std::env::var(SETTINGS_PATH_ENV).unwrap_or_else(|_| SETTINGS_FILE.to_string());
        Self::new(path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the snapshot, falling back to defaults when the file is missing
    /// or unreadable. The result is always sanitized.
    pub fn load(&self) -> ScanSettings {
        let mut settings = match fs::read_to_string(&self.path) {
            Ok(raw) => match serde_json::from_str::<ScanSettings>(&raw) {
                Ok(settings) => settings,
                Err(err) => {
                    warn!(path = %self.path.display(), error = %err, "settings snapshot unreadable, using defaults");
                    ScanSettings::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no settings snapshot, using defaults");
                ScanSettings::default()
            }
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "settings snapshot unreadable, using defaults");
                ScanSettings::default()
            }
        };
        settings.sanitize();
        settings
    }

    pub fn save(&self, settings: &ScanSettings) -> Result<()> {
        let raw = serde_json::to_string_pretty(settings)?;
        fs::write(&self.path, raw)?;
        debug!(path = %self.path.display(), "settings snapshot written");
        Ok(())
    }
}

// ============================================================================
// Blacklist store
// ============================================================================

pub struct BlacklistStore {
    path: PathBuf,
}

impl BlacklistStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Store at the path from `SPREADSCAN_BLACKLIST`, defaulting to
    /// `coin_blacklist.json` in the working directory.
    pub fn from_env() -> Self {
        let path =
            std::env::var(BLACKLIST_PATH_ENV).unwrap_or_else(|_| BLACKLIST_FILE.to_string());
        Self::new(path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the blacklist as an upper-cased set. Missing or corrupt files
    /// yield an empty set.
    pub fn load(&self) -> HashSet<String> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) => {
                if err.kind() != ErrorKind::NotFound {
                    warn!(path = %self.path.display(), error = %err, "blacklist snapshot unreadable, starting empty");
                }
                return HashSet::new();
            }
        };
        match serde_json::from_str::<Vec<String>>(&raw) {
            Ok(entries) => entries
                .into_iter()
                .map(|coin| coin.trim().to_uppercase())
                .filter(|coin| !coin.is_empty())
                .collect(),
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "blacklist snapshot unreadable, starting empty");
                HashSet::new()
            }
        }
    }

    /// Write the set as a sorted JSON array so snapshots diff cleanly.
    pub fn save(&self, blacklist: &HashSet<String>) -> Result<()> {
        let mut entries: Vec<&String> = blacklist.iter().collect();
        entries.sort();
        let raw = serde_json::to_string_pretty(&entries)?;
        fs::write(&self.path, raw)?;
        debug!(path = %self.path.display(), coins = entries.len(), "blacklist snapshot written");
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
