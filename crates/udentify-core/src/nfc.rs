//! NFC passport chip reading: credentials, payloads, session events.

use serde::{Deserialize, Serialize};

use crate::config::{ConfigReader, KeyValueMap, SessionTarget};
use crate::error::BridgeError;
use crate::image::ImageData;
use crate::mrz::BacCredentials;

const DEFAULT_REQUEST_TIMEOUT_SECS: f64 = 10.0;
const DEFAULT_LOG_LEVEL: &str = "warning";
const LOG_LEVELS: [&str; 4] = ["debug", "info", "warning", "error"];

/// Chip access configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NfcCredentials {
    pub document_number: String,
    /// YYMMDD.
    pub date_of_birth: String,
    /// YYMMDD.
    pub expiry_date: String,
    #[serde(flatten)]
    pub target: SessionTarget,
    /// Seconds, passed through to the vendor SDK.
    pub request_timeout: f64,
    pub is_active_authentication_enabled: bool,
    pub is_passive_authentication_enabled: bool,
    pub enable_auto_triggering: bool,
    pub log_level: String,
}

impl NfcCredentials {
    /// Parse credentials from the caller's map.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` if a required key is missing, a date is not YYMMDD,
    /// or the log level is unknown.
    pub fn from_map(map: &KeyValueMap) -> Result<Self, BridgeError> {
        let reader = ConfigReader::new(map);
        let bac = BacCredentials {
            document_number: reader.required_str("documentNumber")?,
            date_of_birth: reader.required_str("dateOfBirth")?,
            date_of_expiration: reader.required_str("expiryDate")?,
        };
        let target = SessionTarget::from_map(map)?;

        let mut creds = Self::from_bac(&bac, target)?;
        if let Some(timeout) = reader.optional_f64("requestTimeout")? {
            if !timeout.is_finite() || timeout <= 0.0 {
                return Err(BridgeError::InvalidConfig(format!(
                    "`requestTimeout` must be positive, got {timeout}"
                )));
            }
            creds.request_timeout = timeout;
        }
        if let Some(v) = reader.optional_bool("isActiveAuthenticationEnabled")? {
            creds.is_active_authentication_enabled = v;
        }
        if let Some(v) = reader.optional_bool("isPassiveAuthenticationEnabled")? {
            creds.is_passive_authentication_enabled = v;
        }
        if let Some(v) = reader.optional_bool("enableAutoTriggering")? {
            creds.enable_auto_triggering = v;
        }
        if let Some(level) = reader.optional_str("logLevel")? {
            let level = level.to_ascii_lowercase();
            if !LOG_LEVELS.contains(&level.as_str()) {
                return Err(BridgeError::InvalidConfig(format!(
                    "`logLevel` must be one of {}, got `{level}`",
                    LOG_LEVELS.join(", ")
                )));
            }
            creds.log_level = level;
        }
        Ok(creds)
    }

    /// Build credentials from an MRZ scan, with default options.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` if the document number is blank or a date is not
    /// YYMMDD.
    pub fn from_bac(bac: &BacCredentials, target: SessionTarget) -> Result<Self, BridgeError> {
        if bac.document_number.trim().is_empty() {
            return Err(BridgeError::missing_key("documentNumber"));
        }
        validate_yymmdd("dateOfBirth", &bac.date_of_birth)?;
        validate_yymmdd("expiryDate", &bac.date_of_expiration)?;
        Ok(Self {
            document_number: bac.document_number.clone(),
            date_of_birth: bac.date_of_birth.clone(),
            expiry_date: bac.date_of_expiration.clone(),
            target,
            request_timeout: DEFAULT_REQUEST_TIMEOUT_SECS,
            is_active_authentication_enabled: true,
            is_passive_authentication_enabled: true,
            enable_auto_triggering: true,
            log_level: DEFAULT_LOG_LEVEL.into(),
        })
    }
}

/// Check a six-digit YYMMDD date with a plausible month and day.
fn validate_yymmdd(key: &str, value: &str) -> Result<(), BridgeError> {
    let invalid = || BridgeError::InvalidConfig(format!("`{key}` must be YYMMDD, got `{value}`"));
    if value.len() != 6 || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let month: u8 = value[2..4].parse().map_err(|_| invalid())?;
    let day: u8 = value[4..6].parse().map_err(|_| invalid())?;
    if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        return Err(invalid());
    }
    Ok(())
}

/// What the NFC vendor SDK is asked to do.
#[derive(Debug, Clone)]
pub enum NfcRequest {
    /// Read the passport chip.
    ReadPassport(NfcCredentials),
    /// Ask the server where this device model's antenna is.
    LocateAntenna { server_url: String },
}

impl NfcRequest {
    /// Whether this request drives the NFC radio.
    #[must_use]
    pub const fn uses_radio(&self) -> bool {
        matches!(self, Self::ReadPassport(_))
    }
}

/// Verdict of passive or active chip authentication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChipAuthentication {
    Disabled,
    Passed,
    Failed,
    NotSupported,
    Unknown,
}

/// Data read from the passport chip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PassportData {
    #[serde(rename = "transactionID")]
    pub transaction_id: String,
    pub first_name: String,
    pub last_name: String,
    pub document_number: String,
    pub nationality: String,
    pub date_of_birth: String,
    pub gender: String,
    pub personal_number: String,
    #[serde(rename = "passedPA")]
    pub passive_authentication: ChipAuthentication,
    #[serde(rename = "passedAA")]
    pub active_authentication: ChipAuthentication,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub face_image: Option<ImageData>,
}

/// Where the NFC antenna sits on the device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AntennaLocation {
    /// Vendor location code.
    pub location: i64,
    pub description: String,
}

/// Terminal payload of an NFC session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum NfcPayload {
    Passport(PassportData),
    AntennaLocation(AntennaLocation),
}

/// NFC reader session notifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum NfcEvent {
    SessionBegan,
    Progress { percent: u8 },
    SessionEnded { message: Option<String> },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn base() -> serde_json::Value {
        json!({
            "documentNumber": "U12345678",
            "dateOfBirth": "900101",
            "expiryDate": "300101",
            "serverURL": "https://nfc.example.com",
            "transactionID": "TX-NFC",
        })
    }

    #[test]
    fn defaults_applied() {
        let creds = NfcCredentials::from_map(base().as_object().unwrap()).unwrap();
        assert!((creds.request_timeout - 10.0).abs() < f64::EPSILON);
        assert!(creds.is_active_authentication_enabled);
        assert!(creds.is_passive_authentication_enabled);
        assert!(creds.enable_auto_triggering);
        assert_eq!(creds.log_level, "warning");
    }

    #[test]
    fn overrides_applied() {
        let mut value = base();
        value["requestTimeout"] = json!(30);
        value["isActiveAuthenticationEnabled"] = json!(false);
        value["logLevel"] = json!("DEBUG");
        let creds = NfcCredentials::from_map(value.as_object().unwrap()).unwrap();
        assert!((creds.request_timeout - 30.0).abs() < f64::EPSILON);
        assert!(!creds.is_active_authentication_enabled);
        assert_eq!(creds.log_level, "debug");
    }

    #[test]
    fn malformed_dates_rejected() {
        for bad in ["9001", "901301", "900100", "90010A"] {
            let mut value = base();
            value["dateOfBirth"] = json!(bad);
            let err = NfcCredentials::from_map(value.as_object().unwrap()).unwrap_err();
            assert!(err.to_string().contains("dateOfBirth"), "{bad}");
        }
    }

    #[test]
    fn missing_expiry_rejected() {
        let mut value = base();
        value.as_object_mut().unwrap().remove("expiryDate");
        let err = NfcCredentials::from_map(value.as_object().unwrap()).unwrap_err();
        assert!(err.to_string().contains("expiryDate"));
    }

    #[test]
    fn built_from_mrz() {
        let bac = BacCredentials {
            document_number: "U1".into(),
            date_of_birth: "900101".into(),
            date_of_expiration: "300101".into(),
        };
        let target = SessionTarget::new("https://nfc.example.com", "TX").unwrap();
        let creds = NfcCredentials::from_bac(&bac, target).unwrap();
        assert_eq!(creds.expiry_date, "300101");
    }
}
