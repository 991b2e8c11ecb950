//! Vendor SDK abstraction.
//!
//! ```text
//! VendorSdk (trait)
//! ├── VideoCallSdk (adds in-call camera and microphone controls)
//! ├── UnavailableSdk (framework not linked, always reports unavailable)
//! └── real SDK adapters (injected by the embedding application)
//! ```
//!
//! `launch` only starts the vendor flow. Results arrive later, possibly on
//! another thread, through the [`CaptureSink`].

use std::fmt;
use std::marker::PhantomData;

use udentify_core::liveness::{LivenessEvent, LivenessPayload, LivenessRequest};
use udentify_core::mrz::{MrzEvent, MrzPayload, MrzRequest};
use udentify_core::nfc::{NfcEvent, NfcPayload, NfcRequest};
use udentify_core::ocr::{OcrEvent, OcrPayload, OcrRequest};
use udentify_core::video_call::{VideoCallEvent, VideoCallPayload, VideoCallRequest};
use udentify_core::{EventPayload, Modality, SessionId, VendorError};

use crate::settings::ModalitySettings;
use crate::sink::CaptureSink;

/// Per-session context given to the vendor at launch.
#[derive(Debug, Clone)]
pub struct LaunchContext {
    pub session_id: SessionId,
    pub modality: Modality,
    /// Settings as they were at admission.
    pub settings: ModalitySettings,
}

/// A vendor capture SDK for one modality.
pub trait VendorSdk: Send + Sync + 'static {
    type Request: Send + 'static;
    type Payload: Send + 'static;
    type Event: Into<EventPayload> + Send + 'static;

    /// Whether the vendor framework is linked and usable.
    fn is_available(&self) -> bool;

    /// Start the capture flow and return without waiting for it.
    ///
    /// Runs while the modality's session slot is locked: it may report
    /// through `sink` but must not call back into the bridge.
    ///
    /// # Errors
    ///
    /// A [`VendorError`] if the flow could not be started at all. The sink
    /// is then discarded and the session fails with that error.
    fn launch(
        &self,
        ctx: LaunchContext,
        request: Self::Request,
        sink: CaptureSink<Self::Payload, Self::Event>,
    ) -> Result<(), VendorError>;

    /// Release camera, radio or call resources and dismiss any vendor UI.
    /// Must be safe to call when nothing is running.
    fn teardown(&self);
}

/// Video call SDKs additionally expose live media controls.
pub trait VideoCallSdk:
    VendorSdk<Request = VideoCallRequest, Payload = VideoCallPayload, Event = VideoCallEvent>
{
    /// Turn the local camera on or off. Returns the new enabled state.
    ///
    /// # Errors
    ///
    /// Vendor failure.
    fn toggle_camera(&self) -> Result<bool, VendorError>;

    /// Swap front and back cameras. Returns whether the swap happened.
    ///
    /// # Errors
    ///
    /// Vendor failure.
    fn switch_camera(&self) -> Result<bool, VendorError>;

    /// Mute or unmute. Returns the new enabled state.
    ///
    /// # Errors
    ///
    /// Vendor failure.
    fn toggle_microphone(&self) -> Result<bool, VendorError>;
}

pub type LivenessSdk =
    dyn VendorSdk<Request = LivenessRequest, Payload = LivenessPayload, Event = LivenessEvent>;
pub type MrzSdk = dyn VendorSdk<Request = MrzRequest, Payload = MrzPayload, Event = MrzEvent>;
pub type NfcSdk = dyn VendorSdk<Request = NfcRequest, Payload = NfcPayload, Event = NfcEvent>;
pub type OcrSdk = dyn VendorSdk<Request = OcrRequest, Payload = OcrPayload, Event = OcrEvent>;
pub type DynVideoCallSdk = dyn VideoCallSdk<
    Request = VideoCallRequest,
    Payload = VideoCallPayload,
    Event = VideoCallEvent,
>;

// ── Unavailable fallback ───────────────────────────────────────────

/// Stand-in when the vendor framework is not linked into the build.
pub struct UnavailableSdk<R, P, E> {
    modality: Modality,
    _types: PhantomData<fn(R) -> (P, E)>,
}

impl<R, P, E> UnavailableSdk<R, P, E> {
    #[must_use]
    pub const fn new(modality: Modality) -> Self {
        Self {
            modality,
            _types: PhantomData,
        }
    }

    fn error(&self) -> VendorError {
        VendorError::new(format!("{} framework is not available", self.modality))
            .with_code("FRAMEWORK_NOT_AVAILABLE")
    }
}

impl<R, P, E> fmt::Debug for UnavailableSdk<R, P, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("UnavailableSdk").field(&self.modality).finish()
    }
}

impl<R, P, E> VendorSdk for UnavailableSdk<R, P, E>
where
    R: Send + 'static,
    P: Send + 'static,
    E: Into<EventPayload> + Send + 'static,
{
    type Request = R;
    type Payload = P;
    type Event = E;

    fn is_available(&self) -> bool {
        false
    }

    fn launch(
        &self,
        _ctx: LaunchContext,
        _request: R,
        _sink: CaptureSink<P, E>,
    ) -> Result<(), VendorError> {
        Err(self.error())
    }

    fn teardown(&self) {}
}

impl VideoCallSdk for UnavailableSdk<VideoCallRequest, VideoCallPayload, VideoCallEvent> {
    fn toggle_camera(&self) -> Result<bool, VendorError> {
        Err(self.error())
    }

    fn switch_camera(&self) -> Result<bool, VendorError> {
        Err(self.error())
    }

    fn toggle_microphone(&self) -> Result<bool, VendorError> {
        Err(self.error())
    }
}
