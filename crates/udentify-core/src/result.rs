//! Terminal outcomes and their normalization into [`CaptureResult`].
//!
//! Vendor SDKs report failures as a loose `(domain, code, message)` triple.
//! [`classify`] maps that triple onto the stable [`ErrorKind`] taxonomy and
//! [`normalize`] turns any [`Terminal`] into the envelope callers receive.
//! The vendor code is always kept verbatim in `nativeCode`.

use serde::{Deserialize, Serialize};

use crate::error::{ErrorInfo, ErrorKind};

/// NSURLErrorDomain and its well-known codes.
const URL_ERROR_DOMAIN: &str = "NSURLErrorDomain";
const URL_ERROR_TIMED_OUT: &str = "-1001";
const URL_ERROR_CANCELLED: &str = "-999";

/// Failure as reported by a vendor SDK.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorError {
    /// Error domain (iOS `NSError.domain`, Java exception class, ...).
    pub domain: Option<String>,
    /// Machine-readable vendor code.
    pub code: Option<String>,
    pub message: String,
}

impl VendorError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            domain: None,
            code: None,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    #[must_use]
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }
}

/// How a session ended, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum Terminal<P> {
    Completed(P),
    Failed(VendorError),
    /// Cancelled by the user in the vendor UI or by `cancel()`.
    Cancelled,
    /// The bridge await timeout elapsed.
    TimedOut,
    /// The vendor released its callback sink without reporting an outcome.
    Abandoned,
}

/// The single terminal value delivered to a capture operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureResult<P> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<P>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

impl<P> CaptureResult<P> {
    #[must_use]
    pub const fn completed(payload: P) -> Self {
        Self {
            success: true,
            payload: Some(payload),
            error: None,
        }
    }

    #[must_use]
    pub const fn failed(error: ErrorInfo) -> Self {
        Self {
            success: false,
            payload: None,
            error: Some(error),
        }
    }

    #[must_use]
    pub fn cancelled() -> Self {
        Self::failed(ErrorInfo::new(
            ErrorKind::UserCancelled,
            "capture was cancelled",
        ))
    }

    /// Kind of the attached error, if any.
    #[must_use]
    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error.as_ref().map(|e| e.kind)
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.error_kind() == Some(ErrorKind::UserCancelled)
    }

    /// Transform the payload, keeping success and error untouched.
    #[must_use]
    pub fn map<Q>(self, f: impl FnOnce(P) -> Q) -> CaptureResult<Q> {
        CaptureResult {
            success: self.success,
            payload: self.payload.map(f),
            error: self.error,
        }
    }
}

/// Phrases that identify a kind in a vendor code or message. Each phrase
/// matches a run of consecutive words; the last word matches as a prefix
/// (`CANCEL` covers `CANCELLED`).
const SDK_UNAVAILABLE_PHRASES: &[&[&str]] = &[
    &["SDK", "NOT", "AVAILABLE"],
    &["FRAMEWORK", "NOT", "AVAILABLE"],
];
const TIMEOUT_PHRASES: &[&[&str]] = &[&["TIMEOUT"], &["TIMED", "OUT"]];
const CANCEL_PHRASES: &[&[&str]] = &[&["CANCEL"]];
const PERMISSION_PHRASES: &[&[&str]] = &[&["PERMISSION"]];
const NETWORK_PHRASES: &[&[&str]] = &[
    &["NETWORK"],
    &["CONNECTION"],
    &["OFFLINE"],
    &["UNREACHABLE"],
    &["SSL"],
];

/// Assign a stable kind to a vendor failure.
#[must_use]
pub fn classify(error: &VendorError) -> ErrorKind {
    if error.domain.as_deref() == Some(URL_ERROR_DOMAIN) {
        return match error.code.as_deref() {
            Some(URL_ERROR_TIMED_OUT) => ErrorKind::Timeout,
            Some(URL_ERROR_CANCELLED) => ErrorKind::UserCancelled,
            _ => ErrorKind::NetworkError,
        };
    }

    let code = words(error.code.as_deref().unwrap_or_default());
    let message = words(&error.message);
    let mentions = |phrases: &[&[&str]]| {
        phrases
            .iter()
            .any(|phrase| contains_phrase(&code, phrase) || contains_phrase(&message, phrase))
    };

    if mentions(SDK_UNAVAILABLE_PHRASES) {
        ErrorKind::SdkUnavailable
    } else if mentions(TIMEOUT_PHRASES) {
        ErrorKind::Timeout
    } else if mentions(CANCEL_PHRASES) {
        ErrorKind::UserCancelled
    } else if mentions(PERMISSION_PHRASES) {
        ErrorKind::PermissionDenied
    } else if mentions(NETWORK_PHRASES) {
        ErrorKind::NetworkError
    } else {
        ErrorKind::SdkInternalError
    }
}

/// Split on anything that is not an ASCII letter or digit, and on
/// lower-to-upper camel case boundaries. Words come back upper-cased.
fn words(text: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;
    for c in text.chars() {
        if !c.is_ascii_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }
        if c.is_ascii_uppercase() && prev_lower {
            words.push(std::mem::take(&mut current));
        }
        prev_lower = c.is_ascii_lowercase();
        current.push(c.to_ascii_uppercase());
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

fn contains_phrase(words: &[String], phrase: &[&str]) -> bool {
    let Some((last, head)) = phrase.split_last() else {
        return false;
    };
    words.windows(phrase.len()).any(|window| {
        window.iter().zip(head).all(|(word, expected)| word == expected)
            && window.last().is_some_and(|word| word.starts_with(last))
    })
}

/// Build the caller-facing envelope for a vendor failure.
#[must_use]
pub fn error_info(error: &VendorError) -> ErrorInfo {
    let kind = classify(error);
    tracing::debug!(
        %kind,
        domain = error.domain.as_deref().unwrap_or("-"),
        code = error.code.as_deref().unwrap_or("-"),
        "vendor failure classified"
    );
    let info = ErrorInfo::new(kind, error.message.clone());
    match &error.code {
        Some(code) => info.with_native_code(code.clone()),
        None => info,
    }
}

/// Convert a terminal outcome into the result delivered to the caller.
#[must_use]
pub fn normalize<P>(terminal: Terminal<P>) -> CaptureResult<P> {
    match terminal {
        Terminal::Completed(payload) => CaptureResult::completed(payload),
        Terminal::Failed(error) => CaptureResult::failed(error_info(&error)),
        Terminal::Cancelled => CaptureResult::cancelled(),
        Terminal::TimedOut => CaptureResult::failed(ErrorInfo::new(
            ErrorKind::Timeout,
            "capture did not complete before the await timeout",
        )),
        Terminal::Abandoned => CaptureResult::failed(ErrorInfo::new(
            ErrorKind::SdkInternalError,
            "vendor SDK abandoned the session without a result",
        )),
    }
}
