//! Per-modality UI settings and localization.
//!
//! Settings apply to sessions admitted after the change. Each session gets
//! a snapshot at admission, so a running capture never observes an update.
//! When a directory is configured the settings survive restarts as
//! `{dir}/{modality}.settings.json`.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use udentify_core::config::ConfigReader;
use udentify_core::{BridgeError, KeyValueMap, Modality};

use crate::lock;

/// Language selection plus per-key string overrides.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Localization {
    /// BCP 47 style code, e.g. `en`, `tr`, `pt-BR`.
    pub language_code: String,
    #[serde(default)]
    pub overrides: KeyValueMap,
}

impl Localization {
    /// # Errors
    ///
    /// `InvalidConfig` if the language code is malformed or an override is
    /// not a string.
    pub fn new(language_code: &str, overrides: Option<KeyValueMap>) -> Result<Self, BridgeError> {
        let code = language_code.trim();
        if !is_language_code(code) {
            return Err(BridgeError::InvalidConfig(format!(
                "`languageCode` must look like `en` or `pt-BR`, got `{language_code}`"
            )));
        }
        let overrides = overrides.unwrap_or_default();
        let reader = ConfigReader::new(&overrides);
        for key in overrides.keys() {
            reader.optional_str(key)?;
        }
        Ok(Self {
            language_code: code.to_owned(),
            overrides,
        })
    }
}

fn is_language_code(code: &str) -> bool {
    let mut parts = code.split(['-', '_']);
    let primary_ok = parts
        .next()
        .is_some_and(|p| (2..=3).contains(&p.len()) && p.chars().all(|c| c.is_ascii_alphabetic()));
    primary_ok
        && parts.all(|p| (2..=8).contains(&p.len()) && p.chars().all(|c| c.is_ascii_alphanumeric()))
}

/// Everything a vendor launch receives besides the request itself.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ModalitySettings {
    #[serde(default)]
    pub ui: KeyValueMap,
    #[serde(default)]
    pub localization: Option<Localization>,
}

/// Errors persisting settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("settings serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Current settings of one modality, optionally file-backed.
#[derive(Debug)]
pub struct SettingsStore {
    modality: Modality,
    path: Option<PathBuf>,
    current: Mutex<ModalitySettings>,
}

impl SettingsStore {
    /// In-memory store.
    #[must_use]
    pub fn in_memory(modality: Modality) -> Self {
        Self {
            modality,
            path: None,
            current: Mutex::new(ModalitySettings::default()),
        }
    }

    /// File-backed store. A missing or corrupt file starts from defaults.
    #[must_use]
    pub fn open(dir: &Path, modality: Modality) -> Self {
        let path = dir.join(format!("{}.settings.json", modality.as_str()));
        let current = fs::read_to_string(&path).map_or_else(
            |_| ModalitySettings::default(),
            |contents| {
                serde_json::from_str(&contents).unwrap_or_else(|e| {
                    tracing::warn!(%modality, "stored settings are corrupt, using defaults: {e}");
                    ModalitySettings::default()
                })
            },
        );
        Self {
            modality,
            path: Some(path),
            current: Mutex::new(current),
        }
    }

    /// Copy of the current settings, taken at session admission.
    #[must_use]
    pub fn snapshot(&self) -> ModalitySettings {
        lock(&self.current).clone()
    }

    /// Merge UI keys over the current ones.
    pub fn merge_ui(&self, ui: KeyValueMap) {
        self.update(|settings| settings.ui.extend(ui));
    }

    pub fn set_localization(&self, localization: Localization) {
        self.update(|settings| settings.localization = Some(localization));
    }

    fn update(&self, apply: impl FnOnce(&mut ModalitySettings)) {
        let snapshot = {
            let mut current = lock(&self.current);
            apply(&mut current);
            current.clone()
        };
        if let Some(path) = &self.path {
            // In-memory settings stay authoritative if the disk write fails.
            if let Err(e) = save(path, &snapshot) {
                tracing::warn!(modality = %self.modality, "failed to persist settings: {e}");
            }
        }
    }
}

/// Write to a sibling `.tmp` file, then rename over the target.
fn save(path: &Path, settings: &ModalitySettings) -> Result<(), SettingsError> {
    let json = serde_json::to_string_pretty(settings)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&tmp, fs::Permissions::from_mode(0o600))?;
    }

    fs::rename(&tmp, path)?;
    Ok(())
}
