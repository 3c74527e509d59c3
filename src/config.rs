//! Runtime configuration
//!
//! Read from an optional JSON file; every field has a default.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Reconciliation period
    pub poll_interval_ms: u64,
    /// Wait before replaying a track in loop-single mode
    pub loop_single_delay_ms: u64,
    /// How long a media type switch stays "transitioning"
    pub media_switch_settle_ms: u64,
    pub log_dir: PathBuf,
    pub store_path: PathBuf,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1000,
            loop_single_delay_ms: 100,
            media_switch_settle_ms: 300,
            log_dir: PathBuf::from(".logs"),
            store_path: PathBuf::from(".cache/preferences.json"),
        }
    }
}

impl SyncConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config = serde_json::from_str(&content)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn loop_single_delay(&self) -> Duration {
        Duration::from_millis(self.loop_single_delay_ms)
    }

    pub fn media_switch_settle(&self) -> Duration {
        Duration::from_millis(self.media_switch_settle_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: SyncConfig = serde_json::from_str(r#"{ "poll_interval_ms": 250 }"#).unwrap();
        assert_eq!(config.poll_interval(), Duration::from_millis(250));
        assert_eq!(config.loop_single_delay(), Duration::from_millis(100));
        assert_eq!(config.media_switch_settle(), Duration::from_millis(300));
    }

    #[test]
    fn test_load_reports_missing_file() {
        let err = SyncConfig::load(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(err.to_string().contains("reading config"));
    }
}
