//! Video call commands.
//!
//! Call state changes arrive as `userStateChanged` events on the
//! video call channel. `get_video_call_status` is a polling fallback.

use tauri::State;
use udentify_core::video_call::{CallStatus, VideoCallPayload};
use udentify_core::{CaptureResult, KeyValueMap};

use super::{bridge_error, settle, vendor_error};
use crate::state::ManagedBridge;

/// Join a call. Resolves when the call ends.
///
/// # Errors
///
/// JSON error for invalid credentials, missing camera or microphone
/// permission, a call already running, or a vendor failure.
#[tauri::command]
pub async fn start_video_call(
    credentials: KeyValueMap,
    bridge: State<'_, ManagedBridge>,
) -> Result<CaptureResult<VideoCallPayload>, String> {
    settle(bridge.video_call.start_video_call(&credentials).await)
}

/// Hang up. The pending `start_video_call` resolves as cancelled.
#[allow(clippy::needless_pass_by_value)]
#[tauri::command]
pub fn end_video_call(bridge: State<'_, ManagedBridge>) -> bool {
    bridge.video_call.end_video_call()
}

/// Close the call UI.
#[allow(clippy::needless_pass_by_value)]
#[tauri::command]
pub fn dismiss_video_call(bridge: State<'_, ManagedBridge>) -> bool {
    bridge.video_call.dismiss_video_call()
}

#[allow(clippy::needless_pass_by_value)]
#[tauri::command]
pub fn get_video_call_status(bridge: State<'_, ManagedBridge>) -> CallStatus {
    bridge.video_call.get_video_call_status()
}

/// Returns whether the camera is on afterwards, or `false` with no call.
///
/// # Errors
///
/// JSON error when the vendor refuses.
#[allow(clippy::needless_pass_by_value)]
#[tauri::command]
pub fn toggle_camera(bridge: State<'_, ManagedBridge>) -> Result<bool, String> {
    bridge.video_call.toggle_camera().map_err(|e| vendor_error(&e))
}

/// Switch between front and back cameras.
///
/// # Errors
///
/// Same as [`toggle_camera`].
#[allow(clippy::needless_pass_by_value)]
#[tauri::command]
pub fn switch_camera(bridge: State<'_, ManagedBridge>) -> Result<bool, String> {
    bridge.video_call.switch_camera().map_err(|e| vendor_error(&e))
}

/// Returns whether the microphone is on afterwards.
///
/// # Errors
///
/// Same as [`toggle_camera`].
#[allow(clippy::needless_pass_by_value)]
#[tauri::command]
pub fn toggle_microphone(bridge: State<'_, ManagedBridge>) -> Result<bool, String> {
    bridge
        .video_call
        .toggle_microphone()
        .map_err(|e| vendor_error(&e))
}

/// Store call UI settings for the next call.
///
/// # Errors
///
/// JSON error with `INVALID_CONFIG` for settings the call UI rejects.
#[allow(clippy::needless_pass_by_value)]
#[tauri::command]
pub fn set_video_call_config(
    config: KeyValueMap,
    bridge: State<'_, ManagedBridge>,
) -> Result<(), String> {
    bridge
        .video_call
        .set_video_call_config(config)
        .map_err(|e| bridge_error(&e))
}

#[allow(clippy::needless_pass_by_value)]
#[tauri::command]
pub fn is_video_call_in_progress(bridge: State<'_, ManagedBridge>) -> bool {
    bridge.video_call.is_video_call_in_progress()
}
