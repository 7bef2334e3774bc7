//! Engine timing configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Storage key of the global enable flag.
pub const ENABLED_KEY: &str = "autoFillEnabled";
/// Storage key of the rule list.
pub const RULES_KEY: &str = "rules";

pub const DEFAULT_CACHE_TTL_MS: u64 = 5000;
pub const DEFAULT_LOCATE_TIMEOUT_MS: u64 = 3000;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;
pub const DEFAULT_VISIBILITY_RETRY_MS: u64 = 200;
pub const DEFAULT_DEBOUNCE_MS: u64 = 500;

/// Timing knobs for one engine instance.
///
/// Every field is optional on the wire; missing fields take the defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    pub cache_ttl_ms: u64,
    pub locate_timeout_ms: u64,
    pub poll_interval_ms: u64,
    pub visibility_retry_ms: u64,
    pub debounce_ms: u64,
    /// Console log threshold, only honored by the browser bindings
    pub log_level: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_ttl_ms: DEFAULT_CACHE_TTL_MS,
            locate_timeout_ms: DEFAULT_LOCATE_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            visibility_retry_ms: DEFAULT_VISIBILITY_RETRY_MS,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            log_level: "info".to_string(),
        }
    }
}

impl EngineConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_millis(self.cache_ttl_ms)
    }

    pub fn locate_timeout(&self) -> Duration {
        Duration::from_millis(self.locate_timeout_ms)
    }

    /// Poll interval, never zero so the locator cannot spin.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn visibility_retry(&self) -> Duration {
        Duration::from_millis(self.visibility_retry_ms)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn log_level_filter(&self) -> log::LevelFilter {
        self.log_level.parse().unwrap_or(log::LevelFilter::Info)
    }
}
