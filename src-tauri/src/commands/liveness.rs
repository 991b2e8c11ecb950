//! Face recognition and liveness commands.
//!
//! Credential maps carry `serverURL`, `transactionID` and `userID`, plus
//! optional vendor tuning keys.

use tauri::State;
use udentify_core::liveness::LivenessPayload;
use udentify_core::{CaptureResult, KeyValueMap};

use super::settle;
use crate::state::ManagedBridge;

type LivenessResponse = Result<CaptureResult<LivenessPayload>, String>;

/// Camera face registration.
///
/// # Errors
///
/// JSON error for invalid credentials, missing camera permission, a busy
/// liveness slot, or a vendor failure.
#[tauri::command]
pub async fn start_face_recognition_registration(
    credentials: KeyValueMap,
    bridge: State<'_, ManagedBridge>,
) -> LivenessResponse {
    settle(
        bridge
            .liveness
            .start_face_recognition_registration(&credentials)
            .await,
    )
}

/// Camera face authentication.
///
/// # Errors
///
/// Same as [`start_face_recognition_registration`].
#[tauri::command]
pub async fn start_face_recognition_authentication(
    credentials: KeyValueMap,
    bridge: State<'_, ManagedBridge>,
) -> LivenessResponse {
    settle(
        bridge
            .liveness
            .start_face_recognition_authentication(&credentials)
            .await,
    )
}

/// Gesture-based active liveness.
///
/// # Errors
///
/// Same as [`start_face_recognition_registration`].
#[tauri::command]
pub async fn start_active_liveness(
    credentials: KeyValueMap,
    is_authentication: bool,
    bridge: State<'_, ManagedBridge>,
) -> LivenessResponse {
    settle(
        bridge
            .liveness
            .start_active_liveness(&credentials, is_authentication)
            .await,
    )
}

/// Passive plus active liveness in one session.
///
/// # Errors
///
/// Same as [`start_face_recognition_registration`].
#[tauri::command]
pub async fn start_hybrid_liveness(
    credentials: KeyValueMap,
    is_authentication: bool,
    bridge: State<'_, ManagedBridge>,
) -> LivenessResponse {
    settle(
        bridge
            .liveness
            .start_hybrid_liveness(&credentials, is_authentication)
            .await,
    )
}

/// Capture a selfie without submitting it.
///
/// # Errors
///
/// Same as [`start_face_recognition_registration`].
#[tauri::command]
pub async fn start_selfie_capture(
    credentials: KeyValueMap,
    bridge: State<'_, ManagedBridge>,
) -> LivenessResponse {
    settle(bridge.liveness.start_selfie_capture(&credentials).await)
}

/// Submit a previously captured selfie.
///
/// # Errors
///
/// JSON error with `INVALID_CONFIG` for undecodable image data, or the
/// vendor failure.
#[tauri::command]
pub async fn perform_face_recognition_with_selfie(
    credentials: KeyValueMap,
    base64_image: String,
    is_authentication: bool,
    bridge: State<'_, ManagedBridge>,
) -> LivenessResponse {
    settle(
        bridge
            .liveness
            .perform_face_recognition_with_selfie(&credentials, &base64_image, is_authentication)
            .await,
    )
}

/// Register a user from a still photo.
///
/// # Errors
///
/// Same as [`perform_face_recognition_with_selfie`].
#[tauri::command]
pub async fn register_user_with_photo(
    credentials: KeyValueMap,
    base64_image: String,
    bridge: State<'_, ManagedBridge>,
) -> LivenessResponse {
    settle(
        bridge
            .liveness
            .register_user_with_photo(&credentials, &base64_image)
            .await,
    )
}

/// Authenticate a user from a still photo.
///
/// # Errors
///
/// Same as [`perform_face_recognition_with_selfie`].
#[tauri::command]
pub async fn authenticate_user_with_photo(
    credentials: KeyValueMap,
    base64_image: String,
    bridge: State<'_, ManagedBridge>,
) -> LivenessResponse {
    settle(
        bridge
            .liveness
            .authenticate_user_with_photo(&credentials, &base64_image)
            .await,
    )
}

/// 1:N identification against a server-side list.
///
/// # Errors
///
/// Same as [`start_face_recognition_registration`].
#[tauri::command]
pub async fn start_face_recognition_identification(
    server_url: String,
    transaction_id: String,
    list_name: String,
    log_level: Option<String>,
    bridge: State<'_, ManagedBridge>,
) -> LivenessResponse {
    settle(
        bridge
            .liveness
            .start_face_recognition_identification(
                &server_url,
                &transaction_id,
                &list_name,
                log_level.as_deref(),
            )
            .await,
    )
}

/// Add the transaction's user to a list.
///
/// # Errors
///
/// JSON error for a malformed target or a server failure.
#[tauri::command]
pub async fn add_user_to_list(
    server_url: String,
    transaction_id: String,
    status: String,
    metadata: Option<KeyValueMap>,
    bridge: State<'_, ManagedBridge>,
) -> LivenessResponse {
    settle(
        bridge
            .liveness
            .add_user_to_list(&server_url, &transaction_id, &status, metadata)
            .await,
    )
}

/// Remove a user from a list by photo.
///
/// # Errors
///
/// JSON error for a malformed target or photo, or a server failure.
#[tauri::command]
pub async fn delete_user_from_list(
    server_url: String,
    transaction_id: String,
    list_name: String,
    photo_base64: String,
    bridge: State<'_, ManagedBridge>,
) -> LivenessResponse {
    settle(
        bridge
            .liveness
            .delete_user_from_list(&server_url, &transaction_id, &list_name, &photo_base64)
            .await,
    )
}

/// Cancel the active liveness session. Returns whether one was running.
#[allow(clippy::needless_pass_by_value)]
#[tauri::command]
pub fn cancel_face_recognition(bridge: State<'_, ManagedBridge>) -> bool {
    bridge.liveness.cancel_face_recognition()
}

#[allow(clippy::needless_pass_by_value)]
#[tauri::command]
pub fn is_face_recognition_in_progress(bridge: State<'_, ManagedBridge>) -> bool {
    bridge.liveness.is_face_recognition_in_progress()
}
