//! Commands shared by every modality: permissions, UI settings, localization.
//!
//! The modality is passed by name (`"liveness"`, `"mrz"`, `"nfc"`, `"ocr"`,
//! `"videoCall"`).

use serde::{Deserialize, Serialize};
use tauri::State;
use udentify_core::{KeyValueMap, Modality, PermissionReport, PermissionState};

use super::bridge_error;
use crate::state::ManagedBridge;

// ---------------------------------------------------------------------------
// DTOs
// ---------------------------------------------------------------------------

/// Permission status of one modality.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionStatusResponse {
    /// Least-granted state across the modality's capabilities.
    pub overall: PermissionState,
    /// State per capability, keyed by capability name.
    pub capabilities: PermissionReport,
}

impl From<PermissionReport> for PermissionStatusResponse {
    fn from(report: PermissionReport) -> Self {
        Self {
            overall: report.overall(),
            capabilities: report,
        }
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// Query the capabilities `modality` needs without prompting.
///
/// # Errors
///
/// JSON error with `SDK_UNAVAILABLE` if a capability does not exist on
/// this device.
#[tauri::command]
pub async fn check_permissions(
    modality: Modality,
    bridge: State<'_, ManagedBridge>,
) -> Result<PermissionStatusResponse, String> {
    bridge
        .check_permissions(modality)
        .await
        .map(PermissionStatusResponse::from)
        .map_err(|e| bridge_error(&e))
}

/// Prompt for the capabilities `modality` needs.
///
/// # Errors
///
/// JSON error with `ALREADY_IN_PROGRESS` while a capture of `modality` is
/// running.
#[tauri::command]
pub async fn request_permissions(
    modality: Modality,
    bridge: State<'_, ManagedBridge>,
) -> Result<PermissionStatusResponse, String> {
    let report = bridge
        .request_permissions(modality)
        .await
        .map_err(|e| bridge_error(&e))?;
    tracing::info!(%modality, overall = ?report.overall(), "permission request answered");
    Ok(report.into())
}

/// Merge UI settings for `modality`. Applies to the next session.
///
/// # Errors
///
/// JSON error with `INVALID_CONFIG` for settings the modality rejects.
#[allow(clippy::needless_pass_by_value)]
#[tauri::command]
pub fn configure_ui_settings(
    modality: Modality,
    settings: KeyValueMap,
    bridge: State<'_, ManagedBridge>,
) -> Result<(), String> {
    bridge
        .configure_ui_settings(modality, settings)
        .map_err(|e| bridge_error(&e))
}

/// Set the language and string overrides for `modality`.
///
/// # Errors
///
/// JSON error with `INVALID_CONFIG` for a malformed language code.
#[allow(clippy::needless_pass_by_value)]
#[tauri::command]
pub fn set_localization(
    modality: Modality,
    language_code: String,
    overrides: Option<KeyValueMap>,
    bridge: State<'_, ManagedBridge>,
) -> Result<(), String> {
    bridge
        .set_localization(modality, &language_code, overrides)
        .map_err(|e| bridge_error(&e))
}
