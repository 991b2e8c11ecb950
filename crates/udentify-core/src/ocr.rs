//! Document OCR, document liveness and hologram verification.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::{validate_server_url, SessionTarget};
use crate::error::BridgeError;
use crate::image::ImageData;

/// Supported identity document families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentType {
    IdCard,
    Passport,
    DriverLicense,
}

impl DocumentType {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::IdCard => "ID_CARD",
            Self::Passport => "PASSPORT",
            Self::DriverLicense => "DRIVER_LICENSE",
        }
    }
}

impl FromStr for DocumentType {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ID_CARD" | "IDCARD" | "ID" => Ok(Self::IdCard),
            "PASSPORT" => Ok(Self::Passport),
            "DRIVE_LICENCE" | "DRIVER_LICENSE" | "DRIVERLICENSE" => Ok(Self::DriverLicense),
            "" => Err(BridgeError::missing_key("documentType")),
            other => Err(BridgeError::InvalidConfig(format!(
                "unsupported documentType `{other}`"
            ))),
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which side(s) of the document the camera captures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DocumentSide {
    Front,
    Back,
    Both,
}

impl FromStr for DocumentSide {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "FRONT" | "FRONTSIDE" => Ok(Self::Front),
            "BACK" | "BACKSIDE" => Ok(Self::Back),
            "BOTH" | "BOTHSIDES" => Ok(Self::Both),
            "" => Err(BridgeError::missing_key("documentSide")),
            other => Err(BridgeError::InvalidConfig(format!(
                "unsupported documentSide `{other}`"
            ))),
        }
    }
}

/// Front and/or back photos of a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentImages {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub front: Option<ImageData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub back: Option<ImageData>,
}

impl DocumentImages {
    /// Parse optional base64 arguments; blank strings count as absent.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` if a non-blank argument is not valid base64.
    pub fn from_base64(front: Option<&str>, back: Option<&str>) -> Result<Self, BridgeError> {
        let parse = |value: Option<&str>| {
            value
                .filter(|v| !v.trim().is_empty())
                .map(ImageData::from_base64)
                .transpose()
        };
        Ok(Self {
            front: parse(front)?,
            back: parse(back)?,
        })
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.front.is_none() && self.back.is_none()
    }
}

/// Validate hologram video locations: at least one absolute URL.
///
/// # Errors
///
/// `InvalidConfig` if the list is empty or every entry is unusable.
pub fn parse_video_urls(urls: &[String]) -> Result<Vec<String>, BridgeError> {
    let valid: Vec<String> = urls
        .iter()
        .map(|u| u.trim())
        .filter(|u| {
            u.starts_with("file://") || validate_server_url("videoUrls", u).is_ok()
        })
        .map(str::to_owned)
        .collect();
    if valid.is_empty() {
        return Err(BridgeError::InvalidConfig(
            "no valid video URLs provided for hologram check".into(),
        ));
    }
    Ok(valid)
}

/// What the OCR vendor SDK is asked to do.
#[derive(Debug, Clone)]
pub enum OcrRequest {
    /// Camera capture of the document, API call disabled.
    Scan {
        target: SessionTarget,
        document_type: DocumentType,
        side: DocumentSide,
    },
    /// Server-side field extraction from captured photos.
    Recognize {
        target: SessionTarget,
        document_type: DocumentType,
        images: DocumentImages,
    },
    /// Server-side document liveness from captured photos.
    DocumentLiveness {
        target: SessionTarget,
        images: DocumentImages,
    },
    /// Field extraction and document liveness in one call.
    RecognizeWithLiveness {
        target: SessionTarget,
        document_type: DocumentType,
        images: DocumentImages,
    },
    /// Camera recording of hologram video clips.
    HologramCamera { target: SessionTarget },
    /// Server-side hologram verdict from recorded clips.
    HologramCheck {
        target: SessionTarget,
        video_urls: Vec<String>,
    },
}

impl OcrRequest {
    #[must_use]
    pub const fn uses_camera(&self) -> bool {
        matches!(self, Self::Scan { .. } | Self::HologramCamera { .. })
    }

    #[must_use]
    pub const fn target(&self) -> &SessionTarget {
        match self {
            Self::Scan { target, .. }
            | Self::Recognize { target, .. }
            | Self::DocumentLiveness { target, .. }
            | Self::RecognizeWithLiveness { target, .. }
            | Self::HologramCamera { target }
            | Self::HologramCheck { target, .. } => target,
        }
    }
}

/// Extracted document fields, keyed by vendor field name
/// (`firstName`, `documentNumber`, `isDocumentExpired`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OcrFields {
    pub document_type: DocumentType,
    pub fields: BTreeMap<String, serde_json::Value>,
}

impl OcrFields {
    /// A text field, if present.
    #[must_use]
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(serde_json::Value::as_str)
    }
}

/// One document liveness pipeline step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LivenessPipelineResult {
    pub name: String,
    pub probability: f64,
    pub calibration: String,
}

/// Document liveness per side.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentLivenessReport {
    pub is_failed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub front_side_probability: Option<f64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub front_side_results: Vec<LivenessPipelineResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub back_side_probability: Option<f64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub back_side_results: Vec<LivenessPipelineResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ocr: Option<OcrFields>,
}

/// Hologram verification verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HologramVerdict {
    pub id_number: String,
    pub hologram_exists: bool,
    pub ocr_id_and_hologram_id_match: bool,
    pub ocr_face_and_hologram_face_match: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hologram_face_image: Option<ImageData>,
}

/// Terminal payload of an OCR session.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum OcrPayload {
    /// Camera scan finished; images are kept for a follow-up call.
    Scanned(DocumentImages),
    Recognized(OcrFields),
    DocumentLiveness(DocumentLivenessReport),
    HologramVideos { video_urls: Vec<String> },
    Hologram(HologramVerdict),
}

/// OCR and hologram camera notifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum OcrEvent {
    DocumentScanned { side: DocumentSide },
    VideoRecordFinished { video_count: usize },
    BackButtonPressed,
    WillDismiss,
    DidDismiss,
}
