//! Document OCR, document liveness and hologram commands.
//!
//! `perform_*` commands accept explicit images; when both are omitted the
//! images kept from the last `start_ocr_scanning` of the same transaction
//! are used.

use tauri::State;
use udentify_core::ocr::OcrPayload;
use udentify_core::CaptureResult;

use super::settle;
use crate::state::ManagedBridge;

type OcrResponse = Result<CaptureResult<OcrPayload>, String>;

/// Open the document camera for one side.
///
/// # Errors
///
/// JSON error for an unknown document type or side, missing camera
/// permission, a busy OCR slot, or a vendor failure.
#[tauri::command]
pub async fn start_ocr_scanning(
    server_url: String,
    transaction_id: String,
    document_type: String,
    document_side: String,
    bridge: State<'_, ManagedBridge>,
) -> OcrResponse {
    settle(
        bridge
            .ocr
            .start_ocr_scanning(&server_url, &transaction_id, &document_type, &document_side)
            .await,
    )
}

/// Record a hologram video with the camera.
///
/// # Errors
///
/// Same as [`start_ocr_scanning`].
#[tauri::command]
pub async fn start_hologram_camera(
    server_url: String,
    transaction_id: String,
    bridge: State<'_, ManagedBridge>,
) -> OcrResponse {
    settle(
        bridge
            .ocr
            .start_hologram_camera(&server_url, &transaction_id)
            .await,
    )
}

/// Server-side OCR.
///
/// # Errors
///
/// JSON error with `INVALID_CONFIG` when no images are supplied or
/// stored, or the vendor failure.
#[tauri::command]
pub async fn perform_ocr(
    server_url: String,
    transaction_id: String,
    document_type: String,
    front_side_image: Option<String>,
    back_side_image: Option<String>,
    bridge: State<'_, ManagedBridge>,
) -> OcrResponse {
    settle(
        bridge
            .ocr
            .perform_ocr(
                &server_url,
                &transaction_id,
                &document_type,
                front_side_image.as_deref(),
                back_side_image.as_deref(),
            )
            .await,
    )
}

/// Server-side document liveness.
///
/// # Errors
///
/// Same as [`perform_ocr`].
#[tauri::command]
pub async fn perform_document_liveness(
    server_url: String,
    transaction_id: String,
    front_side_image: Option<String>,
    back_side_image: Option<String>,
    bridge: State<'_, ManagedBridge>,
) -> OcrResponse {
    settle(
        bridge
            .ocr
            .perform_document_liveness(
                &server_url,
                &transaction_id,
                front_side_image.as_deref(),
                back_side_image.as_deref(),
            )
            .await,
    )
}

/// OCR and document liveness in one request.
///
/// # Errors
///
/// Same as [`perform_ocr`].
#[tauri::command]
pub async fn perform_ocr_and_document_liveness(
    server_url: String,
    transaction_id: String,
    front_side_image: Option<String>,
    back_side_image: Option<String>,
    document_type: String,
    bridge: State<'_, ManagedBridge>,
) -> OcrResponse {
    settle(
        bridge
            .ocr
            .perform_ocr_and_document_liveness(
                &server_url,
                &transaction_id,
                front_side_image.as_deref(),
                back_side_image.as_deref(),
                &document_type,
            )
            .await,
    )
}

/// Verify previously uploaded hologram videos.
///
/// # Errors
///
/// JSON error for an empty or malformed URL list, or the vendor failure.
#[tauri::command]
pub async fn perform_hologram_check(
    server_url: String,
    transaction_id: String,
    video_urls: Vec<String>,
    bridge: State<'_, ManagedBridge>,
) -> OcrResponse {
    settle(
        bridge
            .ocr
            .perform_hologram_check(&server_url, &transaction_id, &video_urls)
            .await,
    )
}

#[allow(clippy::needless_pass_by_value)]
#[tauri::command]
pub fn cancel_ocr(bridge: State<'_, ManagedBridge>) -> bool {
    bridge.ocr.cancel_ocr()
}

#[allow(clippy::needless_pass_by_value)]
#[tauri::command]
pub fn is_ocr_in_progress(bridge: State<'_, ManagedBridge>) -> bool {
    bridge.ocr.is_ocr_in_progress()
}
