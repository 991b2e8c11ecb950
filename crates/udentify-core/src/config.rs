//! Key-value configuration parsing shared by every modality.
//!
//! Operations receive loosely typed maps from the application layer.
//! Unrecognized keys are ignored; missing required keys and wrongly typed
//! values fail with [`BridgeError::InvalidConfig`] before anything else
//! happens.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::BridgeError;

/// Loosely typed configuration map received from the caller.
pub type KeyValueMap = serde_json::Map<String, Value>;

/// Typed accessors over a [`KeyValueMap`].
#[derive(Debug, Clone, Copy)]
pub struct ConfigReader<'a> {
    map: &'a KeyValueMap,
}

impl<'a> ConfigReader<'a> {
    #[must_use]
    pub const fn new(map: &'a KeyValueMap) -> Self {
        Self { map }
    }

    /// A present, non-blank string.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` if the key is missing, blank, or not a string.
    pub fn required_str(&self, key: &str) -> Result<String, BridgeError> {
        self.optional_str(key)?
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| BridgeError::missing_key(key))
    }

    /// An optional string. `null` counts as absent.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` if the value is present but not a string.
    pub fn optional_str(&self, key: &str) -> Result<Option<String>, BridgeError> {
        match self.map.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(other) => Err(wrong_type(key, "a string", other)),
        }
    }

    /// An optional boolean.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` if the value is present but not a boolean.
    pub fn optional_bool(&self, key: &str) -> Result<Option<bool>, BridgeError> {
        match self.map.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(other) => Err(wrong_type(key, "a boolean", other)),
        }
    }

    /// An optional number.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` if the value is present but not a number.
    pub fn optional_f64(&self, key: &str) -> Result<Option<f64>, BridgeError> {
        match self.map.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => n
                .as_f64()
                .map(Some)
                .ok_or_else(|| wrong_type(key, "a finite number", &Value::Number(n.clone()))),
            Some(other) => Err(wrong_type(key, "a number", other)),
        }
    }

    /// An optional nested map.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` if the value is present but not an object.
    pub fn optional_map(&self, key: &str) -> Result<Option<KeyValueMap>, BridgeError> {
        match self.map.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Object(m)) => Ok(Some(m.clone())),
            Some(other) => Err(wrong_type(key, "an object", other)),
        }
    }
}

fn wrong_type(key: &str, expected: &str, found: &Value) -> BridgeError {
    let found = match found {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    };
    BridgeError::InvalidConfig(format!("`{key}` must be {expected}, found {found}"))
}

/// Check that a server URL is an absolute http(s) URL with a host.
///
/// # Errors
///
/// `InvalidConfig` naming the offending key.
pub fn validate_server_url(key: &str, url: &str) -> Result<(), BridgeError> {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .ok_or_else(|| {
            BridgeError::InvalidConfig(format!("`{key}` must be an http(s) URL, got `{url}`"))
        })?;
    let host = rest.split(['/', '?', '#']).next().unwrap_or_default();
    if host.is_empty() || host.contains(char::is_whitespace) {
        return Err(BridgeError::InvalidConfig(format!(
            "`{key}` has no valid host: `{url}`"
        )));
    }
    Ok(())
}

/// Server endpoint and transaction a session runs against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionTarget {
    #[serde(rename = "serverURL")]
    pub server_url: String,
    #[serde(rename = "transactionID")]
    pub transaction_id: String,
}

impl SessionTarget {
    /// Validate and build a target from positional arguments.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` if either value is blank or the URL is malformed.
    pub fn new(server_url: &str, transaction_id: &str) -> Result<Self, BridgeError> {
        if server_url.trim().is_empty() {
            return Err(BridgeError::missing_key("serverURL"));
        }
        if transaction_id.trim().is_empty() {
            return Err(BridgeError::missing_key("transactionID"));
        }
        validate_server_url("serverURL", server_url)?;
        Ok(Self {
            server_url: server_url.to_owned(),
            transaction_id: transaction_id.to_owned(),
        })
    }

    /// Read `serverURL` and `transactionID` from a config map.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` if either key is missing or malformed.
    pub fn from_map(map: &KeyValueMap) -> Result<Self, BridgeError> {
        let reader = ConfigReader::new(map);
        let server_url = reader.required_str("serverURL")?;
        let transaction_id = reader.required_str("transactionID")?;
        Self::new(&server_url, &transaction_id)
    }
}

/// Require a non-blank positional argument.
///
/// # Errors
///
/// `InvalidConfig` naming `key` if the value is blank.
pub fn require_arg(key: &str, value: &str) -> Result<String, BridgeError> {
    if value.trim().is_empty() {
        Err(BridgeError::missing_key(key))
    } else {
        Ok(value.to_owned())
    }
}
