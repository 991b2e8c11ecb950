//! Capture modalities, one per bridged vendor SDK.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A capture domain backed by one vendor SDK.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Modality {
    /// Face recognition and liveness detection.
    Liveness,
    /// Machine-readable zone scanning.
    Mrz,
    /// NFC passport chip reading.
    Nfc,
    /// Document OCR, document liveness and hologram checks.
    Ocr,
    /// Agent-assisted video call.
    VideoCall,
}

impl Modality {
    /// All modalities, in a stable order.
    pub const ALL: [Self; 5] = [
        Self::Liveness,
        Self::Mrz,
        Self::Nfc,
        Self::Ocr,
        Self::VideoCall,
    ];

    /// String representation used in logs, file names and IPC payloads.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Liveness => "liveness",
            Self::Mrz => "mrz",
            Self::Nfc => "nfc",
            Self::Ocr => "ocr",
            Self::VideoCall => "videoCall",
        }
    }

    /// Name of the outbound event channel for this modality.
    #[must_use]
    pub const fn event_channel(&self) -> &'static str {
        match self {
            Self::Liveness => "udentify://liveness",
            Self::Mrz => "udentify://mrz",
            Self::Nfc => "udentify://nfc",
            Self::Ocr => "udentify://ocr",
            Self::VideoCall => "udentify://video-call",
        }
    }
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
