//! MRZ scanning commands.

use tauri::State;
use udentify_core::mrz::MrzPayload;
use udentify_core::{CaptureResult, KeyValueMap};

use super::settle;
use crate::state::ManagedBridge;

type MrzResponse = Result<CaptureResult<MrzPayload>, String>;

/// Open the MRZ camera. `customization` is merged over the stored UI
/// settings for this session only.
///
/// # Errors
///
/// JSON error for invalid customization, missing camera permission, a
/// busy MRZ slot, or a vendor failure.
#[tauri::command]
pub async fn start_mrz_camera(
    customization: Option<KeyValueMap>,
    bridge: State<'_, ManagedBridge>,
) -> MrzResponse {
    settle(bridge.mrz.start_mrz_camera(customization.as_ref()).await)
}

/// Recognise the MRZ in a still image. No camera permission needed.
///
/// # Errors
///
/// JSON error with `INVALID_CONFIG` for empty or undecodable image data,
/// or the vendor failure.
#[tauri::command]
pub async fn process_mrz_image(
    image_base64: String,
    bridge: State<'_, ManagedBridge>,
) -> MrzResponse {
    settle(bridge.mrz.process_mrz_image(&image_base64).await)
}

#[allow(clippy::needless_pass_by_value)]
#[tauri::command]
pub fn cancel_mrz_scanning(bridge: State<'_, ManagedBridge>) -> bool {
    bridge.mrz.cancel_mrz_scanning()
}

#[allow(clippy::needless_pass_by_value)]
#[tauri::command]
pub fn is_mrz_scanning_in_progress(bridge: State<'_, ManagedBridge>) -> bool {
    bridge.mrz.is_mrz_scanning_in_progress()
}
