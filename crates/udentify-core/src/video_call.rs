//! Agent-assisted video call: credentials, call status and participant
//! notifications.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::{validate_server_url, ConfigReader, KeyValueMap, SessionTarget};
use crate::error::BridgeError;
use crate::mrz::validate_hex_color;

const DEFAULT_IDLE_TIMEOUT: &str = "30";

/// Connection parameters for one call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoCallCredentials {
    #[serde(flatten)]
    pub target: SessionTarget,
    #[serde(rename = "wssURL")]
    pub wss_url: String,
    #[serde(rename = "userID")]
    pub user_id: String,
    pub client_name: String,
    /// Seconds, as the vendor expects it.
    pub idle_timeout: String,
}

impl VideoCallCredentials {
    /// # Errors
    ///
    /// `InvalidConfig` for a missing key, a non-websocket `wssURL`, or a
    /// non-numeric `idleTimeout`.
    pub fn from_map(map: &KeyValueMap) -> Result<Self, BridgeError> {
        let reader = ConfigReader::new(map);
        let target = SessionTarget::from_map(map)?;
        let wss_url = reader.required_str("wssURL")?;
        if !(wss_url.starts_with("wss://") || wss_url.starts_with("ws://")) {
            return Err(BridgeError::InvalidConfig(format!(
                "`wssURL` must be a ws(s) URL, got `{wss_url}`"
            )));
        }
        let idle_timeout = reader
            .optional_str("idleTimeout")?
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_IDLE_TIMEOUT.to_owned());
        if idle_timeout.trim().parse::<u32>().is_err() {
            return Err(BridgeError::InvalidConfig(format!(
                "`idleTimeout` must be a whole number of seconds, got `{idle_timeout}`"
            )));
        }

        Ok(Self {
            target,
            wss_url,
            user_id: reader.required_str("userID")?,
            client_name: reader.required_str("clientName")?,
            idle_timeout,
        })
    }
}

/// Validate a call UI configuration map in place.
///
/// # Errors
///
/// `InvalidConfig` for malformed colors or a non-positive `requestTimeout`.
pub fn validate_ui_config(map: &KeyValueMap) -> Result<(), BridgeError> {
    let reader = ConfigReader::new(map);
    for key in ["backgroundColor", "textColor", "pipViewBorderColor"] {
        if let Some(color) = reader.optional_str(key)? {
            validate_hex_color(key, &color)?;
        }
    }
    for key in [
        "notificationLabelDefault",
        "notificationLabelCountdown",
        "notificationLabelTokenFetch",
        "tableName",
    ] {
        reader.optional_str(key)?;
    }
    if let Some(timeout) = reader.optional_f64("requestTimeout")? {
        if timeout <= 0.0 {
            return Err(BridgeError::InvalidConfig(format!(
                "`requestTimeout` must be positive, got {timeout}"
            )));
        }
    }
    if let Some(url) = reader.optional_str("serverURL")? {
        validate_server_url("serverURL", &url)?;
    }
    Ok(())
}

/// What the video call vendor SDK is asked to do.
#[derive(Debug, Clone)]
pub enum VideoCallRequest {
    Start(VideoCallCredentials),
}

/// Coarse call status reported by `get_video_call_status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallStatus {
    Idle,
    Connecting,
    Connected,
    Disconnected,
    Failed,
    Completed,
}

impl CallStatus {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Disconnected => "disconnected",
            Self::Failed => "failed",
            Self::Completed => "completed",
        }
    }

    /// Status implied by a vendor user-state string. Unknown states map to
    /// `None` so the last known status is kept.
    #[must_use]
    pub fn from_user_state(state: &str) -> Option<Self> {
        match state.to_ascii_lowercase().as_str() {
            "initiating" | "tokenfetching" | "tokenfetched" | "connecting" | "reconnecting" => {
                Some(Self::Connecting)
            }
            "connected" => Some(Self::Connected),
            "disconnected" => Some(Self::Disconnected),
            "failed" => Some(Self::Failed),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }
}

impl fmt::Display for CallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a call reached its successful terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CallEnd {
    /// The agent completed the call.
    Completed,
    /// The call UI was dismissed after the call ended.
    Dismissed,
}

/// Terminal payload of a video call session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoCallPayload {
    #[serde(rename = "transactionID")]
    pub transaction_id: String,
    pub end: CallEnd,
    pub status: CallStatus,
}

/// Remote participant roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ParticipantType {
    Agent,
    Supervisor,
    Unknown,
}

impl ParticipantType {
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "agent" => Self::Agent,
            "supervisor" => Self::Supervisor,
            _ => Self::Unknown,
        }
    }
}

/// Call notifications. States are forwarded as the vendor names them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum VideoCallEvent {
    UserStateChanged {
        state: String,
    },
    ParticipantStateChanged {
        participant: ParticipantType,
        state: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn base() -> serde_json::Value {
        json!({
            "serverURL": "https://call.example.com",
            "wssURL": "wss://call.example.com/ws",
            "userID": "user-1",
            "transactionID": "TX-VC",
            "clientName": "bridge-demo",
        })
    }

    #[test]
    fn idle_timeout_defaults() {
        let creds = VideoCallCredentials::from_map(base().as_object().unwrap()).unwrap();
        assert_eq!(creds.idle_timeout, "30");
        assert_eq!(creds.target.transaction_id, "TX-VC");
    }

    #[test]
    fn rejects_http_websocket_url() {
        let mut value = base();
        value["wssURL"] = json!("https://call.example.com/ws");
        let err = VideoCallCredentials::from_map(value.as_object().unwrap()).unwrap_err();
        assert!(err.to_string().contains("wssURL"));
    }

    #[test]
    fn client_name_required() {
        let mut value = base();
        value.as_object_mut().unwrap().remove("clientName");
        assert!(VideoCallCredentials::from_map(value.as_object().unwrap()).is_err());
    }

    #[test]
    fn user_states_map_to_status() {
        assert_eq!(CallStatus::from_user_state("tokenFetching"), Some(CallStatus::Connecting));
        assert_eq!(CallStatus::from_user_state("CONNECTED"), Some(CallStatus::Connected));
        assert_eq!(CallStatus::from_user_state("wobbling"), None);
    }

    #[test]
    fn ui_config_validation() {
        let ok = json!({ "backgroundColor": "#000000", "requestTimeout": 30 });
        assert!(validate_ui_config(ok.as_object().unwrap()).is_ok());
        let bad = json!({ "textColor": "white" });
        assert!(validate_ui_config(bad.as_object().unwrap()).is_err());
    }

    #[test]
    fn participant_event_shape() {
        let event = VideoCallEvent::ParticipantStateChanged {
            participant: ParticipantType::parse("Agent"),
            state: "videoTrackActivated".into(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(
            json,
            json!({
                "type": "participantStateChanged",
                "participant": "agent",
                "state": "videoTrackActivated",
            })
        );
    }
}
