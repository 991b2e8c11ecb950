//! NFC chip reading commands.

use tauri::State;
use udentify_core::mrz::BacCredentials;
use udentify_core::nfc::NfcPayload;
use udentify_core::{CaptureResult, KeyValueMap};

use super::settle;
use crate::state::ManagedBridge;

type NfcResponse = Result<CaptureResult<NfcPayload>, String>;

/// Whether the device has an NFC reader and the vendor SDK is linked.
#[tauri::command]
pub async fn is_nfc_available(bridge: State<'_, ManagedBridge>) -> Result<bool, String> {
    Ok(bridge.nfc.is_nfc_available().await)
}

/// Whether NFC is switched on.
#[tauri::command]
pub async fn is_nfc_enabled(bridge: State<'_, ManagedBridge>) -> Result<bool, String> {
    Ok(bridge.nfc.is_nfc_enabled().await)
}

/// Read the chip with BAC keys taken from `credentials`.
///
/// # Errors
///
/// JSON error for missing BAC fields, NFC not granted, a busy NFC slot,
/// or a vendor failure.
#[tauri::command]
pub async fn start_nfc_reading(
    credentials: KeyValueMap,
    bridge: State<'_, ManagedBridge>,
) -> NfcResponse {
    settle(bridge.nfc.start_nfc_reading(&credentials).await)
}

/// Read the chip with BAC keys from an earlier MRZ scan.
///
/// # Errors
///
/// Same as [`start_nfc_reading`].
#[tauri::command]
pub async fn start_nfc_reading_with_bac(
    bac: BacCredentials,
    server_url: String,
    transaction_id: String,
    bridge: State<'_, ManagedBridge>,
) -> NfcResponse {
    settle(
        bridge
            .nfc
            .start_nfc_reading_with_bac(&bac, &server_url, &transaction_id)
            .await,
    )
}

/// Look up where the antenna sits on this device model.
///
/// # Errors
///
/// JSON error for a malformed server URL or a vendor failure.
#[tauri::command]
pub async fn get_nfc_location(
    server_url: String,
    bridge: State<'_, ManagedBridge>,
) -> NfcResponse {
    settle(bridge.nfc.get_nfc_location(&server_url).await)
}

#[allow(clippy::needless_pass_by_value)]
#[tauri::command]
pub fn cancel_nfc_reading(bridge: State<'_, ManagedBridge>) -> bool {
    bridge.nfc.cancel_nfc_reading()
}

#[allow(clippy::needless_pass_by_value)]
#[tauri::command]
pub fn is_nfc_reading_in_progress(bridge: State<'_, ManagedBridge>) -> bool {
    bridge.nfc.is_nfc_reading_in_progress()
}
