//! Machine-readable zone scanning: requests, decoded fields, progress.

use serde::{Deserialize, Serialize};

use crate::config::{ConfigReader, KeyValueMap};
use crate::error::BridgeError;
use crate::image::ImageData;

/// Camera overlay customization for the MRZ scanner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MrzUiCustomization {
    pub focus_view_border_color: Option<String>,
    pub focus_view_stroke_width: Option<u8>,
    pub instruction_text: Option<String>,
    pub instruction_text_color: Option<String>,
    pub show_cancel_button: Option<bool>,
    pub cancel_button_text: Option<String>,
    pub cancel_button_color: Option<String>,
}

impl MrzUiCustomization {
    /// Parse from the caller's map. Unknown keys are ignored.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` for malformed colors or a stroke width outside 1–10.
    pub fn from_map(map: &KeyValueMap) -> Result<Self, BridgeError> {
        let reader = ConfigReader::new(map);
        let stroke = match reader.optional_f64("focusViewStrokeWidth")? {
            None => None,
            Some(w) if (1.0..=10.0).contains(&w) && w.fract() == 0.0 => {
                u8::try_from(w as i64).ok()
            }
            Some(w) => {
                return Err(BridgeError::InvalidConfig(format!(
                    "`focusViewStrokeWidth` must be an integer between 1 and 10, got {w}"
                )))
            }
        };

        let custom = Self {
            focus_view_border_color: reader.optional_str("focusViewBorderColor")?,
            focus_view_stroke_width: stroke,
            instruction_text: reader.optional_str("instructionText")?,
            instruction_text_color: reader.optional_str("instructionTextColor")?,
            show_cancel_button: reader.optional_bool("showCancelButton")?,
            cancel_button_text: reader.optional_str("cancelButtonText")?,
            cancel_button_color: reader.optional_str("cancelButtonColor")?,
        };
        for (key, color) in [
            ("focusViewBorderColor", &custom.focus_view_border_color),
            ("instructionTextColor", &custom.instruction_text_color),
            ("cancelButtonColor", &custom.cancel_button_color),
        ] {
            if let Some(color) = color {
                validate_hex_color(key, color)?;
            }
        }
        Ok(custom)
    }
}

/// Accept `#RGB`, `#RRGGBB` and `#AARRGGBB`.
///
/// # Errors
///
/// `InvalidConfig` naming `key`.
pub fn validate_hex_color(key: &str, color: &str) -> Result<(), BridgeError> {
    let valid = color
        .strip_prefix('#')
        .filter(|hex| matches!(hex.len(), 3 | 6 | 8))
        .is_some_and(|hex| hex.chars().all(|c| c.is_ascii_hexdigit()));
    if valid {
        Ok(())
    } else {
        Err(BridgeError::InvalidConfig(format!(
            "`{key}` must be a hex color like #007AFF, got `{color}`"
        )))
    }
}

/// What the MRZ vendor SDK is asked to do.
#[derive(Debug, Clone)]
pub enum MrzRequest {
    /// Live camera scan.
    Camera(MrzUiCustomization),
    /// Single still image, no camera.
    Image(ImageData),
}

impl MrzRequest {
    #[must_use]
    pub const fn uses_camera(&self) -> bool {
        matches!(self, Self::Camera(_))
    }
}

/// Fields decoded from the machine-readable zone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MrzData {
    pub document_type: String,
    pub issuing_country: String,
    pub document_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optional_data1: Option<String>,
    /// YYMMDD.
    pub date_of_birth: String,
    pub gender: String,
    /// YYMMDD.
    pub date_of_expiration: String,
    pub nationality: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optional_data2: Option<String>,
    pub surname: String,
    pub given_names: String,
}

impl MrzData {
    /// Basic Access Control credentials for reading the document chip.
    #[must_use]
    pub fn bac_credentials(&self) -> BacCredentials {
        BacCredentials {
            document_number: self.document_number.clone(),
            date_of_birth: self.date_of_birth.clone(),
            date_of_expiration: self.date_of_expiration.clone(),
        }
    }
}

/// The three MRZ fields an NFC chip read needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BacCredentials {
    pub document_number: String,
    pub date_of_birth: String,
    pub date_of_expiration: String,
}

/// Terminal payload of an MRZ session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MrzPayload {
    pub mrz_data: MrzData,
    pub bac_credentials: BacCredentials,
}

impl From<MrzData> for MrzPayload {
    fn from(mrz_data: MrzData) -> Self {
        let bac_credentials = mrz_data.bac_credentials();
        Self {
            mrz_data,
            bac_credentials,
        }
    }
}

/// Progress from the MRZ camera.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum MrzEvent {
    /// Recognition confidence, 0–100.
    Progress { percent: f32 },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn customization_parses_and_validates() {
        let map = json!({
            "focusViewBorderColor": "#007AFF",
            "focusViewStrokeWidth": 3,
            "showCancelButton": false,
        });
        let custom = MrzUiCustomization::from_map(map.as_object().unwrap()).unwrap();
        assert_eq!(custom.focus_view_stroke_width, Some(3));
        assert_eq!(custom.show_cancel_button, Some(false));

        let bad = json!({ "cancelButtonColor": "blue" });
        assert!(MrzUiCustomization::from_map(bad.as_object().unwrap()).is_err());

        let wide = json!({ "focusViewStrokeWidth": 12 });
        assert!(MrzUiCustomization::from_map(wide.as_object().unwrap()).is_err());
    }

    #[test]
    fn payload_derives_bac_credentials() {
        let data = MrzData {
            document_type: "P".into(),
            issuing_country: "TUR".into(),
            document_number: "U12345678".into(),
            date_of_birth: "900101".into(),
            gender: "F".into(),
            date_of_expiration: "300101".into(),
            nationality: "TUR".into(),
            surname: "DOE".into(),
            given_names: "JANE".into(),
            ..MrzData::default()
        };
        let payload = MrzPayload::from(data);
        assert_eq!(payload.bac_credentials.document_number, "U12345678");
        assert_eq!(payload.bac_credentials.date_of_expiration, "300101");
    }

    #[test]
    fn hex_colors() {
        assert!(validate_hex_color("c", "#fff").is_ok());
        assert!(validate_hex_color("c", "#80FFFFFF").is_ok());
        assert!(validate_hex_color("c", "#12345").is_err());
        assert!(validate_hex_color("c", "007AFF").is_err());
    }
}
