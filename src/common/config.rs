//! Configuration for rollcoord

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Rollover service configuration.
///
/// Request-level timeouts override these defaults per call; the counter
/// width governs generated container names (`logs-000003` → `logs-000004`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RolloverConfig {
    /// Default bound on the commit submission path (resolve → decide → commit)
    #[serde(default = "default_commit_timeout_ms")]
    pub commit_timeout_ms: u64,

    /// Default bound on the post-commit shard readiness wait
    #[serde(default = "default_ack_timeout_ms")]
    pub ack_timeout_ms: u64,

    /// Minimum zero-padded width of the generated name counter
    #[serde(default = "default_counter_width")]
    pub counter_width: usize,

    /// Logging level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_commit_timeout_ms() -> u64 {
    30_000
}
fn default_ack_timeout_ms() -> u64 {
    30_000
}
fn default_counter_width() -> usize {
    6
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for RolloverConfig {
    fn default() -> Self {
        Self {
            commit_timeout_ms: default_commit_timeout_ms(),
            ack_timeout_ms: default_ack_timeout_ms(),
            counter_width: default_counter_width(),
            log_level: default_log_level(),
        }
    }
}

impl RolloverConfig {
    /// Load config from a JSON file
    pub fn load(path: impl AsRef<Path>) -> crate::Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&data)
            .map_err(|e| crate::Error::InvalidConfig(format!("parse error: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> crate::Result<()> {
        if self.counter_width == 0 || self.counter_width > 18 {
            return Err(crate::Error::InvalidConfig(format!(
                "counter_width must be in 1..=18, got {}",
                self.counter_width
            )));
        }
        Ok(())
    }

    pub fn commit_timeout(&self) -> Duration {
        Duration::from_millis(self.commit_timeout_ms)
    }

    pub fn ack_timeout(&self) -> Duration {
        Duration::from_millis(self.ack_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RolloverConfig::default();
        assert_eq!(config.commit_timeout(), Duration::from_secs(30));
        assert_eq!(config.ack_timeout(), Duration::from_secs(30));
        assert_eq!(config.counter_width, 6);
        config.validate().unwrap();
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: RolloverConfig = serde_json::from_str(r#"{"ack_timeout_ms": 5000}"#).unwrap();
        assert_eq!(config.ack_timeout(), Duration::from_secs(5));
        assert_eq!(config.commit_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_validate_rejects_zero_width() {
        let config = RolloverConfig {
            counter_width: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
