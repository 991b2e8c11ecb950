//! IPC command handlers for the capture bridge.
//!
//! Each submodule defines Tauri `#[command]` functions for one modality.
//! A capture command resolves with the [`CaptureResult`] on success or
//! cancellation and rejects with a JSON-encoded [`CaptureErrorResponse`]
//! for everything else, so the webview sees one error shape everywhere.

pub mod liveness;
pub mod mrz;
pub mod nfc;
pub mod ocr;
pub mod permissions;
pub mod video_call;

use serde::{Deserialize, Serialize};
use udentify_core::result::error_info;
use udentify_core::{BridgeError, CaptureResult, ErrorInfo, ErrorKind, VendorError};

// ---------------------------------------------------------------------------
// DTOs
// ---------------------------------------------------------------------------

/// Rejection payload for every command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureErrorResponse {
    /// Stable error kind, e.g. `PERMISSION_DENIED`.
    pub code: ErrorKind,
    pub message: String,
    /// Vendor error code, verbatim.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub native_code: Option<String>,
}

impl From<&ErrorInfo> for CaptureErrorResponse {
    fn from(info: &ErrorInfo) -> Self {
        Self {
            code: info.kind,
            message: info.message.clone(),
            native_code: info.native_code.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Serialize an error envelope for the IPC rejection path.
pub(crate) fn make_error(info: &ErrorInfo) -> String {
    serde_json::to_string(&CaptureErrorResponse::from(info))
        .unwrap_or_else(|_| info.message.clone())
}

/// Rejection for a failure raised before the vendor was invoked.
pub(crate) fn bridge_error(err: &BridgeError) -> String {
    tracing::debug!(kind = %err.kind(), "command rejected: {err}");
    make_error(&err.to_error_info())
}

/// Rejection for a failed vendor control call.
pub(crate) fn vendor_error(err: &VendorError) -> String {
    make_error(&error_info(err))
}

/// Map a capture outcome onto the IPC result.
///
/// Success and cancellation resolve; any other terminal failure rejects.
pub(crate) fn settle<P>(
    outcome: Result<CaptureResult<P>, BridgeError>,
) -> Result<CaptureResult<P>, String> {
    let result = outcome.map_err(|e| bridge_error(&e))?;
    match &result.error {
        Some(info) if info.kind != ErrorKind::UserCancelled => Err(make_error(info)),
        _ => Ok(result),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use udentify_core::Modality;

    #[test]
    fn error_response_is_camel_case() {
        let info =
            ErrorInfo::new(ErrorKind::NetworkError, "offline").with_native_code("-1009");
        let json: serde_json::Value = serde_json::from_str(&make_error(&info)).unwrap();
        insta::assert_json_snapshot!(json, @r#"
        {
          "code": "NETWORK_ERROR",
          "message": "offline",
          "nativeCode": "-1009"
        }
        "#);
    }

    #[test]
    fn settle_resolves_success_and_cancellation() {
        let done = settle(Ok(CaptureResult::completed(7))).unwrap();
        assert_eq!(done.payload, Some(7));

        let cancelled = settle(Ok(CaptureResult::<u8>::cancelled())).unwrap();
        assert!(cancelled.is_cancelled());
    }

    #[test]
    fn settle_rejects_vendor_failure() {
        let failed = CaptureResult::<u8>::failed(
            ErrorInfo::new(ErrorKind::SdkInternalError, "glare").with_native_code("E42"),
        );
        let err: CaptureErrorResponse = serde_json::from_str(&settle(Ok(failed)).unwrap_err()).unwrap();
        assert_eq!(err.code, ErrorKind::SdkInternalError);
        assert_eq!(err.native_code.as_deref(), Some("E42"));
    }

    #[test]
    fn settle_rejects_admission_errors() {
        let err = settle::<u8>(Err(BridgeError::AlreadyInProgress(Modality::Mrz))).unwrap_err();
        let err: CaptureErrorResponse = serde_json::from_str(&err).unwrap();
        assert_eq!(err.code, ErrorKind::AlreadyInProgress);
        assert!(err.native_code.is_none());
    }

    #[test]
    fn vendor_control_errors_keep_native_code() {
        let err = vendor_error(&VendorError::new("no camera").with_code("CAMERA_IN_USE"));
        let err: CaptureErrorResponse = serde_json::from_str(&err).unwrap();
        assert_eq!(err.code, ErrorKind::SdkInternalError);
        assert_eq!(err.native_code.as_deref(), Some("CAMERA_IN_USE"));
    }
}
