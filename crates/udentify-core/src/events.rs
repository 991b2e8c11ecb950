//! Progress events delivered out of band, tagged by modality and session.

use serde::Serialize;

use crate::liveness::LivenessEvent;
use crate::modality::Modality;
use crate::mrz::MrzEvent;
use crate::nfc::NfcEvent;
use crate::ocr::OcrEvent;
use crate::video_call::VideoCallEvent;

/// Identifier assigned to each admitted session.
pub type SessionId = u64;

/// Modality-specific event body. Serializes as `{ "type": ..., ... }`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EventPayload {
    Liveness(LivenessEvent),
    Mrz(MrzEvent),
    Nfc(NfcEvent),
    Ocr(OcrEvent),
    VideoCall(VideoCallEvent),
}

impl EventPayload {
    /// The modality this body belongs to.
    #[must_use]
    pub const fn modality(&self) -> Modality {
        match self {
            Self::Liveness(_) => Modality::Liveness,
            Self::Mrz(_) => Modality::Mrz,
            Self::Nfc(_) => Modality::Nfc,
            Self::Ocr(_) => Modality::Ocr,
            Self::VideoCall(_) => Modality::VideoCall,
        }
    }
}

impl From<LivenessEvent> for EventPayload {
    fn from(event: LivenessEvent) -> Self {
        Self::Liveness(event)
    }
}

impl From<MrzEvent> for EventPayload {
    fn from(event: MrzEvent) -> Self {
        Self::Mrz(event)
    }
}

impl From<NfcEvent> for EventPayload {
    fn from(event: NfcEvent) -> Self {
        Self::Nfc(event)
    }
}

impl From<OcrEvent> for EventPayload {
    fn from(event: OcrEvent) -> Self {
        Self::Ocr(event)
    }
}

impl From<VideoCallEvent> for EventPayload {
    fn from(event: VideoCallEvent) -> Self {
        Self::VideoCall(event)
    }
}

/// One notification emitted during a session, before its terminal result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    pub modality: Modality,
    pub session_id: SessionId,
    #[serde(flatten)]
    pub payload: EventPayload,
}

impl ProgressEvent {
    #[must_use]
    pub fn new(session_id: SessionId, payload: impl Into<EventPayload>) -> Self {
        let payload = payload.into();
        Self {
            modality: payload.modality(),
            session_id,
            payload,
        }
    }
}
