//! One module per capture modality, each wrapping a [`CaptureShell`].
//!
//! [`CaptureShell`]: crate::shell::CaptureShell

pub mod liveness;
pub mod mrz;
pub mod nfc;
pub mod ocr;
pub mod video_call;

pub use liveness::LivenessModule;
pub use mrz::MrzModule;
pub use nfc::NfcModule;
pub use ocr::OcrModule;
pub use video_call::VideoCallModule;
