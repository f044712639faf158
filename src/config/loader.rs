use super::types::{ApartmentOptions, GuardError, ReleaseLogLevel, Result};
/// Configuration loading from rawguard.json
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::atomic::{AtomicU8, Ordering};

/// File looked up by [`GuardConfig::load_default`]
pub const DEFAULT_CONFIG_FILE: &str = "rawguard.json";

/// Process-wide release-failure log level, read at the backend boundary
static RELEASE_FAILURE_LEVEL: AtomicU8 = AtomicU8::new(2);

/// Full rawguard.json structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GuardConfig {
    pub release_failure_log: ReleaseLogLevel,
    pub apartment: ApartmentOptions,
}

impl GuardConfig {
    /// Load configuration from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            GuardError::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;

        Self::from_json_str(&content)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        serde_json::from_str(content)
            .map_err(|e| GuardError::Config(format!("Failed to parse config JSON: {}", e)))
    }

    /// Load ./rawguard.json if present, defaults otherwise
    pub fn load_default() -> Result<Self> {
        let path = std::env::current_dir()
            .map_err(|e| GuardError::Config(format!("Failed to get current directory: {}", e)))?
            .join(DEFAULT_CONFIG_FILE);

        if path.exists() {
            Self::load_from_file(path)
        } else {
            log::debug!("No {} found, using default configuration", DEFAULT_CONFIG_FILE);
            Ok(Self::default())
        }
    }

    /// Install the process-wide settings carried by this config
    pub fn apply(&self) {
        set_release_failure_level(self.release_failure_log);
        log::info!(
            "rawguard config applied: release_failure_log={:?}, apartment={:?}",
            self.release_failure_log,
            self.apartment
        );
    }
}

pub fn set_release_failure_level(level: ReleaseLogLevel) {
    RELEASE_FAILURE_LEVEL.store(level.as_u8(), Ordering::Relaxed);
}

pub fn release_failure_level() -> ReleaseLogLevel {
    ReleaseLogLevel::from_u8(RELEASE_FAILURE_LEVEL.load(Ordering::Relaxed))
}
