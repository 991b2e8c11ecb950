//! Device capability permissions checked before every capture.
//!
//! A denial is a normal, resolved state ([`PermissionState::Denied`]).
//! [`PermissionQueryError`] is reserved for capabilities the device does
//! not support at all (e.g. no NFC antenna).
//!
//! # Architecture
//!
//! ```text
//! PermissionGate (trait)
//! ├── FixedPermissionGate  (answers from a static table: tests, kiosks)
//! ├── NullPermissionGate   (every capability unsupported: fallback)
//! └── platform gates       (provided by the transport adapter)
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A device capability a capture flow may need.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Capability {
    Camera,
    Microphone,
    Nfc,
    PhoneState,
    Internet,
    BluetoothConnect,
}

impl Capability {
    /// String representation for logs and IPC.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Camera => "camera",
            Self::Microphone => "microphone",
            Self::Nfc => "nfc",
            Self::PhoneState => "phoneState",
            Self::Internet => "internet",
            Self::BluetoothConnect => "bluetoothConnect",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authorization state of one capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PermissionState {
    Granted,
    Denied,
    /// Denied and the OS will no longer show a prompt.
    PermanentlyDenied,
    /// Never asked, or the platform cannot tell.
    Unknown,
}

impl PermissionState {
    #[must_use]
    pub const fn is_granted(&self) -> bool {
        matches!(self, Self::Granted)
    }
}

/// Errors from permission queries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PermissionQueryError {
    /// The capability does not exist on this device.
    #[error("{0} is not supported on this device")]
    Unsupported(Capability),
    /// The platform permission API failed.
    #[error("permission query failed: {0}")]
    Platform(String),
}

/// Per-capability permission states returned by a gate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionReport {
    states: BTreeMap<Capability, PermissionState>,
}

impl PermissionReport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the state of one capability.
    pub fn insert(&mut self, capability: Capability, state: PermissionState) {
        self.states.insert(capability, state);
    }

    /// State of one capability (`Unknown` if it was not queried).
    #[must_use]
    pub fn state(&self, capability: Capability) -> PermissionState {
        self.states
            .get(&capability)
            .copied()
            .unwrap_or(PermissionState::Unknown)
    }

    /// Capabilities from `required` that are not granted.
    #[must_use]
    pub fn missing(&self, required: &[Capability]) -> Vec<Capability> {
        required
            .iter()
            .copied()
            .filter(|cap| !self.state(*cap).is_granted())
            .collect()
    }

    /// Aggregate state: `Granted` only if every entry is granted; a
    /// permanent denial dominates a plain denial.
    #[must_use]
    pub fn overall(&self) -> PermissionState {
        if self.states.is_empty() {
            return PermissionState::Unknown;
        }
        let mut overall = PermissionState::Granted;
        for state in self.states.values() {
            overall = match (overall, state) {
                (PermissionState::PermanentlyDenied, _) | (_, PermissionState::PermanentlyDenied) => {
                    PermissionState::PermanentlyDenied
                }
                (PermissionState::Denied, _) | (_, PermissionState::Denied) => {
                    PermissionState::Denied
                }
                (PermissionState::Unknown, _) | (_, PermissionState::Unknown) => {
                    PermissionState::Unknown
                }
                (PermissionState::Granted, PermissionState::Granted) => PermissionState::Granted,
            };
        }
        overall
    }

    /// Iterate over `(capability, state)` pairs in a stable order.
    pub fn iter(&self) -> impl Iterator<Item = (Capability, PermissionState)> + '_ {
        self.states.iter().map(|(cap, state)| (*cap, *state))
    }
}

impl FromIterator<(Capability, PermissionState)> for PermissionReport {
    fn from_iter<I: IntoIterator<Item = (Capability, PermissionState)>>(iter: I) -> Self {
        Self {
            states: iter.into_iter().collect(),
        }
    }
}

/// Platform permission provider.
///
/// Implementations are blocking: `request` may show an OS prompt and wait
/// for the user. Async callers run it on a blocking thread.
pub trait PermissionGate: Send + Sync {
    /// Read the current state of each capability. Never prompts.
    ///
    /// # Errors
    ///
    /// Returns [`PermissionQueryError::Unsupported`] if a capability does
    /// not exist on this device.
    fn check(&self, capabilities: &[Capability]) -> Result<PermissionReport, PermissionQueryError>;

    /// Ask the OS for each capability that is not yet granted.
    ///
    /// # Errors
    ///
    /// Same as [`PermissionGate::check`].
    fn request(
        &self,
        capabilities: &[Capability],
    ) -> Result<PermissionReport, PermissionQueryError>;
}

// ---------------------------------------------------------------------------
// Null gate (fallback)
// ---------------------------------------------------------------------------

/// Fallback gate when the platform exposes no permission API.
pub struct NullPermissionGate;

impl PermissionGate for NullPermissionGate {
    fn check(&self, capabilities: &[Capability]) -> Result<PermissionReport, PermissionQueryError> {
        match capabilities.first() {
            Some(cap) => Err(PermissionQueryError::Unsupported(*cap)),
            None => Ok(PermissionReport::new()),
        }
    }

    fn request(
        &self,
        capabilities: &[Capability],
    ) -> Result<PermissionReport, PermissionQueryError> {
        self.check(capabilities)
    }
}

// ---------------------------------------------------------------------------
// Fixed gate
// ---------------------------------------------------------------------------

/// Gate answering from an in-memory table.
///
/// Capabilities absent from the table are unsupported. `request` promotes
/// `Unknown` entries to the configured prompt answer, mimicking a user
/// responding to the OS dialog.
pub struct FixedPermissionGate {
    states: Mutex<BTreeMap<Capability, PermissionState>>,
    prompt_answer: PermissionState,
}

impl FixedPermissionGate {
    /// Create a gate where every listed capability has the given state.
    #[must_use]
    pub fn new(states: impl IntoIterator<Item = (Capability, PermissionState)>) -> Self {
        Self {
            states: Mutex::new(states.into_iter().collect()),
            prompt_answer: PermissionState::Granted,
        }
    }

    /// Gate granting all of `capabilities`.
    #[must_use]
    pub fn granting(capabilities: &[Capability]) -> Self {
        Self::new(
            capabilities
                .iter()
                .map(|cap| (*cap, PermissionState::Granted)),
        )
    }

    /// Answer given when `request` prompts for an `Unknown` capability.
    #[must_use]
    pub const fn with_prompt_answer(mut self, answer: PermissionState) -> Self {
        self.prompt_answer = answer;
        self
    }

    /// Overwrite the state of one capability.
    pub fn set(&self, capability: Capability, state: PermissionState) {
        if let Ok(mut states) = self.states.lock() {
            states.insert(capability, state);
        }
    }
}

impl PermissionGate for FixedPermissionGate {
    fn check(&self, capabilities: &[Capability]) -> Result<PermissionReport, PermissionQueryError> {
        let states = self
            .states
            .lock()
            .map_err(|_| PermissionQueryError::Platform("permission table poisoned".into()))?;
        capabilities
            .iter()
            .map(|cap| {
                states
                    .get(cap)
                    .map(|state| (*cap, *state))
                    .ok_or(PermissionQueryError::Unsupported(*cap))
            })
            .collect()
    }

    fn request(
        &self,
        capabilities: &[Capability],
    ) -> Result<PermissionReport, PermissionQueryError> {
        {
            let mut states = self
                .states
                .lock()
                .map_err(|_| PermissionQueryError::Platform("permission table poisoned".into()))?;
            for cap in capabilities {
                match states.get_mut(cap) {
                    Some(state) if *state == PermissionState::Unknown => {
                        *state = self.prompt_answer;
                    }
                    Some(_) => {}
                    None => return Err(PermissionQueryError::Unsupported(*cap)),
                }
            }
        }
        self.check(capabilities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_gate_reports_unsupported() {
        let gate = NullPermissionGate;
        let err = gate.check(&[Capability::Nfc]).unwrap_err();
        assert_eq!(err, PermissionQueryError::Unsupported(Capability::Nfc));
        assert!(gate.check(&[]).unwrap().iter().next().is_none());
    }

    #[test]
    fn fixed_gate_denial_is_not_an_error() {
        let gate = FixedPermissionGate::new([(Capability::Camera, PermissionState::Denied)]);
        let report = gate.check(&[Capability::Camera]).unwrap();
        assert_eq!(report.state(Capability::Camera), PermissionState::Denied);
        assert_eq!(report.missing(&[Capability::Camera]), vec![Capability::Camera]);
    }

    #[test]
    fn fixed_gate_request_answers_unknown_only() {
        let gate = FixedPermissionGate::new([
            (Capability::Camera, PermissionState::Unknown),
            (Capability::Microphone, PermissionState::PermanentlyDenied),
        ]);
        let report = gate
            .request(&[Capability::Camera, Capability::Microphone])
            .unwrap();
        assert_eq!(report.state(Capability::Camera), PermissionState::Granted);
        assert_eq!(
            report.state(Capability::Microphone),
            PermissionState::PermanentlyDenied
        );
        assert_eq!(report.overall(), PermissionState::PermanentlyDenied);
    }

    #[test]
    fn check_never_prompts() {
        let gate = FixedPermissionGate::new([(Capability::Camera, PermissionState::Unknown)]);
        let report = gate.check(&[Capability::Camera]).unwrap();
        assert_eq!(report.state(Capability::Camera), PermissionState::Unknown);
        let again = gate.check(&[Capability::Camera]).unwrap();
        assert_eq!(again.state(Capability::Camera), PermissionState::Unknown);
    }

    #[test]
    fn overall_aggregation() {
        let granted: PermissionReport = [
            (Capability::Camera, PermissionState::Granted),
            (Capability::Microphone, PermissionState::Granted),
        ]
        .into_iter()
        .collect();
        assert_eq!(granted.overall(), PermissionState::Granted);

        let mixed: PermissionReport = [
            (Capability::Camera, PermissionState::Granted),
            (Capability::Microphone, PermissionState::Denied),
        ]
        .into_iter()
        .collect();
        assert_eq!(mixed.overall(), PermissionState::Denied);
        assert_eq!(PermissionReport::new().overall(), PermissionState::Unknown);
    }

    #[test]
    fn report_serializes_as_map() {
        let report: PermissionReport = [(Capability::Camera, PermissionState::Granted)]
            .into_iter()
            .collect();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json, serde_json::json!({ "camera": "granted" }));
    }
}
