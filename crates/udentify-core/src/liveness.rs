//! Face recognition and liveness: credentials, vendor requests, payloads
//! and progress events.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::{require_arg, ConfigReader, KeyValueMap, SessionTarget};
use crate::error::BridgeError;
use crate::image::ImageData;

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

/// Face recognizer configuration passed to every liveness session.
///
/// `request_timeout` is handed to the vendor SDK untouched; the bridge
/// does not enforce it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FaceRecognizerCredentials {
    #[serde(flatten)]
    pub target: SessionTarget,
    #[serde(rename = "userID")]
    pub user_id: String,
    pub auto_take: Option<bool>,
    pub error_delay: Option<f64>,
    pub success_delay: Option<f64>,
    pub run_in_background: Option<bool>,
    pub blink_detection_enabled: Option<bool>,
    pub request_timeout: Option<f64>,
    pub eyes_open_threshold: Option<f64>,
    pub mask_confidence: Option<f64>,
    pub inverted_animation: Option<bool>,
    pub active_liveness_auto_next_enabled: Option<bool>,
}

impl FaceRecognizerCredentials {
    /// Parse credentials from the caller's map.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` if `serverURL`, `transactionID` or `userID` is
    /// missing, or an optional key has the wrong type or range.
    pub fn from_map(map: &KeyValueMap) -> Result<Self, BridgeError> {
        let reader = ConfigReader::new(map);
        let target = SessionTarget::from_map(map)?;
        let user_id = reader.required_str("userID")?;

        let creds = Self {
            target,
            user_id,
            auto_take: reader.optional_bool("autoTake")?,
            error_delay: reader.optional_f64("errorDelay")?,
            success_delay: reader.optional_f64("successDelay")?,
            run_in_background: reader.optional_bool("runInBackground")?,
            blink_detection_enabled: reader.optional_bool("blinkDetectionEnabled")?,
            request_timeout: reader.optional_f64("requestTimeout")?,
            eyes_open_threshold: reader.optional_f64("eyesOpenThreshold")?,
            mask_confidence: reader.optional_f64("maskConfidence")?,
            inverted_animation: reader.optional_bool("invertedAnimation")?,
            active_liveness_auto_next_enabled: reader
                .optional_bool("activeLivenessAutoNextEnabled")?,
        };
        creds.validate()?;
        Ok(creds)
    }

    fn validate(&self) -> Result<(), BridgeError> {
        for (key, value) in [
            ("eyesOpenThreshold", self.eyes_open_threshold),
            ("maskConfidence", self.mask_confidence),
        ] {
            if let Some(v) = value {
                if !(0.0..=1.0).contains(&v) {
                    return Err(BridgeError::InvalidConfig(format!(
                        "`{key}` must be between 0 and 1, got {v}"
                    )));
                }
            }
        }
        for (key, value) in [
            ("errorDelay", self.error_delay),
            ("successDelay", self.success_delay),
            ("requestTimeout", self.request_timeout),
        ] {
            if let Some(v) = value {
                if !v.is_finite() || v < 0.0 {
                    return Err(BridgeError::InvalidConfig(format!(
                        "`{key}` must be a non-negative number, got {v}"
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Whether a face flow enrolls a new user or verifies an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FaceMethod {
    Registration,
    Authentication,
}

impl FaceMethod {
    #[must_use]
    pub const fn from_authentication_flag(is_authentication: bool) -> Self {
        if is_authentication {
            Self::Authentication
        } else {
            Self::Registration
        }
    }
}

/// Membership status when adding a user to an identification list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListEnrollment {
    #[serde(flatten)]
    pub target: SessionTarget,
    pub status: String,
    pub metadata: Option<KeyValueMap>,
}

impl ListEnrollment {
    /// # Errors
    ///
    /// `InvalidConfig` for a blank target or status.
    pub fn new(
        server_url: &str,
        transaction_id: &str,
        status: &str,
        metadata: Option<KeyValueMap>,
    ) -> Result<Self, BridgeError> {
        Ok(Self {
            target: SessionTarget::new(server_url, transaction_id)?,
            status: require_arg("status", status)?,
            metadata,
        })
    }
}

/// Named server-side list a face is identified against or removed from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTarget {
    #[serde(flatten)]
    pub target: SessionTarget,
    pub list_name: String,
}

impl ListTarget {
    /// # Errors
    ///
    /// `InvalidConfig` for a blank target or list name.
    pub fn new(server_url: &str, transaction_id: &str, list_name: &str) -> Result<Self, BridgeError> {
        Ok(Self {
            target: SessionTarget::new(server_url, transaction_id)?,
            list_name: require_arg("listName", list_name)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Vendor requests
// ---------------------------------------------------------------------------

/// What the liveness vendor SDK is asked to do for one session.
#[derive(Debug, Clone)]
pub enum LivenessRequest {
    /// Camera-driven passive face recognition.
    FaceCamera {
        credentials: FaceRecognizerCredentials,
        method: FaceMethod,
    },
    /// Camera-driven gesture liveness.
    ActiveLiveness {
        credentials: FaceRecognizerCredentials,
        method: FaceMethod,
    },
    /// Passive + active liveness in one flow.
    HybridLiveness {
        credentials: FaceRecognizerCredentials,
        method: FaceMethod,
    },
    /// Camera capture only; recognition happens later with the selfie.
    SelfieCapture { credentials: FaceRecognizerCredentials },
    /// Recognition from a selfie captured earlier.
    SelfieRecognition {
        credentials: FaceRecognizerCredentials,
        image: ImageData,
        method: FaceMethod,
    },
    /// Recognition from an uploaded photo, no camera.
    PhotoRecognition {
        credentials: FaceRecognizerCredentials,
        image: ImageData,
        method: FaceMethod,
    },
    /// Camera-driven 1:N identification against a list.
    Identification {
        list: ListTarget,
        log_level: Option<String>,
    },
    AddToList(ListEnrollment),
    DeleteFromList { list: ListTarget, photo: ImageData },
}

impl LivenessRequest {
    /// Whether this request opens the camera.
    #[must_use]
    pub const fn uses_camera(&self) -> bool {
        matches!(
            self,
            Self::FaceCamera { .. }
                | Self::ActiveLiveness { .. }
                | Self::HybridLiveness { .. }
                | Self::SelfieCapture { .. }
                | Self::Identification { .. }
        )
    }

    /// Server endpoint and transaction of this request.
    #[must_use]
    pub const fn target(&self) -> &SessionTarget {
        match self {
            Self::FaceCamera { credentials, .. }
            | Self::ActiveLiveness { credentials, .. }
            | Self::HybridLiveness { credentials, .. }
            | Self::SelfieCapture { credentials }
            | Self::SelfieRecognition { credentials, .. }
            | Self::PhotoRecognition { credentials, .. } => &credentials.target,
            Self::Identification { list, .. } | Self::DeleteFromList { list, .. } => &list.target,
            Self::AddToList(enrollment) => &enrollment.target,
        }
    }
}

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

/// Server verdict for a face recognition attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaceIdResult {
    pub verified: bool,
    pub match_score: f64,
    pub description: String,
    #[serde(rename = "transactionID", skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    #[serde(rename = "userID", skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<FaceMethod>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list_names: Option<String>,
    #[serde(rename = "registrationTransactionID", skip_serializing_if = "Option::is_none")]
    pub registration_transaction_id: Option<String>,
}

/// Passive liveness assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LivenessScore {
    pub assessment_value: f64,
    pub assessment_description: String,
    pub probability: f64,
    pub quality: f64,
    pub liveness_score: f64,
}

/// Per-gesture outcome of an active liveness run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveLivenessResult {
    pub gesture_result: BTreeMap<String, bool>,
}

impl ActiveLivenessResult {
    /// Every requested gesture was performed.
    #[must_use]
    pub fn all_passed(&self) -> bool {
        !self.gesture_result.is_empty() && self.gesture_result.values().all(|ok| *ok)
    }
}

/// Combined face recognition message; hybrid flows fill several parts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaceIdMessage {
    #[serde(rename = "faceIDResult", skip_serializing_if = "Option::is_none")]
    pub face_id: Option<FaceIdResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub liveness: Option<LivenessScore>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_liveness: Option<ActiveLivenessResult>,
}

/// List entry created by `add_user_to_list`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListMembership {
    pub id: Option<i64>,
    pub user_id: Option<i64>,
    pub list_name: Option<String>,
    pub list_role: Option<String>,
}

/// Outcome of `delete_user_from_list`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListRemoval {
    pub message: String,
    #[serde(rename = "userID", skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub list_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_score: Option<f64>,
}

/// Terminal payload of a liveness session.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum LivenessPayload {
    Recognition(FaceIdMessage),
    Selfie { image: ImageData },
    ListMembership(ListMembership),
    ListRemoval(ListRemoval),
}

// ---------------------------------------------------------------------------
// Progress events
// ---------------------------------------------------------------------------

/// Out-of-band notifications from the liveness camera UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum LivenessEvent {
    PhotoTaken,
    /// The selfie itself travels only in the terminal payload.
    SelfieTaken,
    VideoTaken,
    BackButtonPressed,
    WillDismiss,
    DidDismiss,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn creds_map(value: serde_json::Value) -> KeyValueMap {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn parses_full_credentials() {
        let creds = FaceRecognizerCredentials::from_map(&creds_map(json!({
            "serverURL": "https://face.example.com",
            "transactionID": "TX-9",
            "userID": "user-1",
            "autoTake": true,
            "maskConfidence": 0.95,
            "requestTimeout": 15,
            "unknownKey": "ignored",
        })))
        .unwrap();
        assert_eq!(creds.user_id, "user-1");
        assert_eq!(creds.auto_take, Some(true));
        assert_eq!(creds.request_timeout, Some(15.0));
    }

    #[test]
    fn missing_user_id_is_invalid_config() {
        let err = FaceRecognizerCredentials::from_map(&creds_map(json!({
            "serverURL": "https://face.example.com",
            "transactionID": "TX-9",
        })))
        .unwrap_err();
        assert!(err.to_string().contains("userID"));
    }

    #[test]
    fn out_of_range_threshold_rejected() {
        let err = FaceRecognizerCredentials::from_map(&creds_map(json!({
            "serverURL": "https://face.example.com",
            "transactionID": "TX-9",
            "userID": "u",
            "eyesOpenThreshold": 1.5,
        })))
        .unwrap_err();
        assert!(err.to_string().contains("eyesOpenThreshold"));
    }

    #[test]
    fn camera_usage_by_request() {
        let list = ListTarget::new("https://face.example.com", "TX", "vip").unwrap();
        assert!(LivenessRequest::Identification {
            list: list.clone(),
            log_level: None
        }
        .uses_camera());
        assert!(!LivenessRequest::DeleteFromList {
            list,
            photo: ImageData::from_bytes(b"x"),
        }
        .uses_camera());
    }

    #[test]
    fn active_liveness_requires_every_gesture() {
        let mut result = ActiveLivenessResult::default();
        assert!(!result.all_passed());
        result.gesture_result.insert("blinkOnce".into(), true);
        result.gesture_result.insert("smile".into(), false);
        assert!(!result.all_passed());
        result.gesture_result.insert("smile".into(), true);
        assert!(result.all_passed());
    }

    #[test]
    fn payload_is_tagged() {
        let payload = LivenessPayload::Recognition(FaceIdMessage {
            face_id: Some(FaceIdResult {
                verified: true,
                match_score: 0.98,
                description: "match".into(),
                transaction_id: Some("TX".into()),
                user_id: None,
                method: Some(FaceMethod::Authentication),
                list_names: None,
                registration_transaction_id: None,
            }),
            ..FaceIdMessage::default()
        });
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["type"], "recognition");
        assert_eq!(json["faceIDResult"]["method"], "authentication");
        assert!(json.get("liveness").is_none());
    }
}
