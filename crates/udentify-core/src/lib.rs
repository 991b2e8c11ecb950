#![cfg_attr(test, allow(clippy::unwrap_used, clippy::arithmetic_side_effects))]
//! Transport-agnostic types for the Udentify capture bridge.
//!
//! This crate holds everything that is pure data: modalities, the error
//! taxonomy, configuration parsing, per-modality requests, payloads and
//! events, the permission contract and the result normalizer. It has no
//! async runtime and no UI dependency.

pub mod config;
pub mod error;
pub mod events;
pub mod image;
pub mod liveness;
pub mod modality;
pub mod mrz;
pub mod nfc;
pub mod ocr;
pub mod permission;
pub mod result;
pub mod video_call;

pub use config::{KeyValueMap, SessionTarget};
pub use error::{BridgeError, ErrorInfo, ErrorKind};
pub use events::{EventPayload, ProgressEvent, SessionId};
pub use image::ImageData;
pub use modality::Modality;
pub use permission::{
    Capability, PermissionGate, PermissionQueryError, PermissionReport, PermissionState,
};
pub use result::{normalize, CaptureResult, Terminal, VendorError};
