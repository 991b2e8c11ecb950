//! Error taxonomy shared by every modality.
//!
//! Two layers:
//! - [`ErrorKind`] / [`ErrorInfo`]: the stable, serialisable envelope that
//!   callers branch on. Vendor failures are normalised into it.
//! - [`BridgeError`]: failures raised locally before a session is admitted
//!   (validation, availability, permissions, admission).

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::modality::Modality;
use crate::permission::{Capability, PermissionQueryError};

/// Stable, cross-modality error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Local validation failure. The vendor SDK was never invoked.
    InvalidConfig,
    /// A required device capability is not granted.
    PermissionDenied,
    /// Another session is active for the same modality instance.
    AlreadyInProgress,
    /// The vendor framework is missing or misconfigured.
    SdkUnavailable,
    /// Transport failure reported by the vendor SDK.
    NetworkError,
    /// Any other vendor-reported failure.
    SdkInternalError,
    /// The capture was cancelled by the user or by `cancel()`.
    UserCancelled,
    /// The capture did not complete in time.
    Timeout,
}

impl ErrorKind {
    /// Wire code (matches the serde representation).
    #[must_use]
    pub const fn as_code(&self) -> &'static str {
        match self {
            Self::InvalidConfig => "INVALID_CONFIG",
            Self::PermissionDenied => "PERMISSION_DENIED",
            Self::AlreadyInProgress => "ALREADY_IN_PROGRESS",
            Self::SdkUnavailable => "SDK_UNAVAILABLE",
            Self::NetworkError => "NETWORK_ERROR",
            Self::SdkInternalError => "SDK_INTERNAL_ERROR",
            Self::UserCancelled => "USER_CANCELLED",
            Self::Timeout => "TIMEOUT",
        }
    }

    /// Whether the caller can retry after addressing the cause.
    ///
    /// `SdkUnavailable` stays fatal for the modality until the application
    /// is reconfigured or rebuilt.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        !matches!(self, Self::SdkUnavailable)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_code())
    }
}

/// Structured error attached to every non-success outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorInfo {
    /// Stable classification.
    pub kind: ErrorKind,
    /// Human-readable description.
    pub message: String,
    /// Machine-readable vendor code, preserved verbatim when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub native_code: Option<String>,
}

impl ErrorInfo {
    /// Create an error envelope without a vendor code.
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            native_code: None,
        }
    }

    /// Attach the vendor's native error code.
    #[must_use]
    pub fn with_native_code(mut self, code: impl Into<String>) -> Self {
        self.native_code = Some(code.into());
        self
    }
}

impl fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.native_code {
            Some(code) => write!(f, "{}: {} ({code})", self.kind, self.message),
            None => write!(f, "{}: {}", self.kind, self.message),
        }
    }
}

/// Failures raised by the bridge itself, before any vendor call.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// A required config key is missing or a value is malformed.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// The vendor SDK for this modality is not linked or not usable.
    #[error("{0} SDK is not available")]
    SdkUnavailable(Modality),

    /// Required capabilities are not granted.
    #[error("{modality} permissions not granted: {}", format_capabilities(.missing))]
    PermissionDenied {
        /// Modality that asked for the capabilities.
        modality: Modality,
        /// Capabilities that are not in the `Granted` state.
        missing: Vec<Capability>,
    },

    /// The capability itself is unsupported on this device.
    #[error(transparent)]
    PermissionQuery(#[from] PermissionQueryError),

    /// A session is already active for this modality instance.
    #[error("a {0} capture is already in progress")]
    AlreadyInProgress(Modality),

    /// Permission prompts are refused while a session is running.
    #[error("cannot request {0} permissions while a capture is in progress")]
    PermissionRequestWhileBusy(Modality),
}

impl BridgeError {
    /// Build an `InvalidConfig` error for a missing key.
    #[must_use]
    pub fn missing_key(key: &str) -> Self {
        Self::InvalidConfig(format!("missing required key `{key}`"))
    }

    /// Stable classification of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidConfig(_) => ErrorKind::InvalidConfig,
            Self::SdkUnavailable(_) | Self::PermissionQuery(PermissionQueryError::Unsupported(_)) => {
                ErrorKind::SdkUnavailable
            }
            Self::PermissionDenied { .. } | Self::PermissionQuery(_) => ErrorKind::PermissionDenied,
            Self::AlreadyInProgress(_) | Self::PermissionRequestWhileBusy(_) => {
                ErrorKind::AlreadyInProgress
            }
        }
    }

    /// Convert into the serialisable envelope.
    #[must_use]
    pub fn to_error_info(&self) -> ErrorInfo {
        ErrorInfo::new(self.kind(), self.to_string())
    }
}

impl From<&BridgeError> for ErrorInfo {
    fn from(err: &BridgeError) -> Self {
        err.to_error_info()
    }
}

fn format_capabilities(caps: &[Capability]) -> String {
    caps.iter()
        .map(Capability::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
