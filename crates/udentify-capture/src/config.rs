//! Bridge-wide configuration, loaded once when the bridge is built.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Tunables shared by every modality module.
///
/// All fields have defaults, so a missing or partial file still yields a
/// usable configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BridgeConfig {
    /// Buffered progress events per subscriber before the oldest are
    /// dropped for that subscriber.
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,

    /// Upper bound on the await step, in seconds. `None` waits until the
    /// vendor reports or the caller cancels.
    #[serde(default)]
    pub await_timeout_secs: Option<u64>,

    /// Where per-modality UI settings and localization are persisted.
    /// `None` keeps them in memory only.
    #[serde(default)]
    pub settings_dir: Option<PathBuf>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            event_capacity: default_event_capacity(),
            await_timeout_secs: None,
            settings_dir: None,
        }
    }
}

const fn default_event_capacity() -> usize {
    256
}

impl BridgeConfig {
    /// Load from a JSON file.
    ///
    /// Returns [`Default::default()`] when the file is missing or does not
    /// parse.
    #[must_use]
    pub fn load(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), "bridge config is corrupt, using defaults: {e}");
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Await timeout as a [`Duration`]. Zero disables it.
    #[must_use]
    pub fn await_timeout(&self) -> Option<Duration> {
        self.await_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    /// Channel capacity, never zero.
    #[must_use]
    pub fn event_capacity(&self) -> usize {
        self.event_capacity.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults() {
        let config = BridgeConfig::default();
        assert_eq!(config.event_capacity, 256);
        assert!(config.await_timeout().is_none());
        assert!(config.settings_dir.is_none());
    }

    #[test]
    fn load_missing_and_corrupt_fall_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bridge.json");
        assert_eq!(BridgeConfig::load(&path), BridgeConfig::default());

        fs::write(&path, "{ not json").unwrap();
        assert_eq!(BridgeConfig::load(&path), BridgeConfig::default());
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bridge.json");
        fs::write(&path, r#"{ "awaitTimeoutSecs": 90 }"#).unwrap();
        let config = BridgeConfig::load(&path);
        assert_eq!(config.await_timeout(), Some(Duration::from_secs(90)));
        assert_eq!(config.event_capacity, 256);
    }

    #[test]
    fn zero_values_are_clamped() {
        let config = BridgeConfig {
            event_capacity: 0,
            await_timeout_secs: Some(0),
            settings_dir: None,
        };
        assert_eq!(config.event_capacity(), 1);
        assert!(config.await_timeout().is_none());
    }
}
