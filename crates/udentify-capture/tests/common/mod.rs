#![allow(dead_code, clippy::unwrap_used, clippy::arithmetic_side_effects)]

//! Scripted vendor SDK and bridge builders shared by the integration tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::Value;
use tokio::sync::Notify;
use udentify_capture::vendor::LaunchContext;
use udentify_capture::{BridgeConfig, CaptureSink, UdentifyBridge, VendorSdk, VendorSet, VideoCallSdk};
use udentify_core::liveness::{LivenessEvent, LivenessPayload, LivenessRequest};
use udentify_core::mrz::{MrzData, MrzEvent, MrzPayload, MrzRequest};
use udentify_core::nfc::{NfcEvent, NfcPayload, NfcRequest};
use udentify_core::ocr::{OcrEvent, OcrPayload, OcrRequest};
use udentify_core::permission::FixedPermissionGate;
use udentify_core::video_call::{VideoCallEvent, VideoCallPayload, VideoCallRequest};
use udentify_core::{Capability, EventPayload, KeyValueMap, Modality, VendorError};

pub const SERVER: &str = "https://kyc.example.com";
/// "hello", base64.
pub const IMAGE: &str = "aGVsbG8=";

/// Fake vendor SDK driven by the test.
///
/// `launch` parks the sink in a queue; the test takes it with
/// [`ScriptedSdk::next_sink`] and plays the vendor's part.
pub struct ScriptedSdk<R, P, E> {
    modality: Modality,
    available: AtomicBool,
    launch_error: Mutex<Option<VendorError>>,
    drop_sinks: AtomicBool,
    requests: Mutex<Vec<R>>,
    contexts: Mutex<Vec<LaunchContext>>,
    sinks: Mutex<VecDeque<CaptureSink<P, E>>>,
    launched: Notify,
    teardowns: AtomicUsize,
    camera_on: AtomicBool,
    microphone_on: AtomicBool,
}

impl<R, P, E> ScriptedSdk<R, P, E> {
    pub fn new(modality: Modality) -> Arc<Self> {
        Arc::new(Self {
            modality,
            available: AtomicBool::new(true),
            launch_error: Mutex::new(None),
            drop_sinks: AtomicBool::new(false),
            requests: Mutex::new(Vec::new()),
            contexts: Mutex::new(Vec::new()),
            sinks: Mutex::new(VecDeque::new()),
            launched: Notify::new(),
            teardowns: AtomicUsize::new(0),
            camera_on: AtomicBool::new(true),
            microphone_on: AtomicBool::new(true),
        })
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Make the next launch fail synchronously.
    pub fn fail_next_launch(&self, error: VendorError) {
        *self.launch_error.lock().unwrap() = Some(error);
    }

    /// Release every sink at launch without reporting.
    pub fn drop_sinks(&self) {
        self.drop_sinks.store(true, Ordering::SeqCst);
    }

    pub fn launches(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn teardowns(&self) -> usize {
        self.teardowns.load(Ordering::SeqCst)
    }

    pub fn last_context(&self) -> LaunchContext {
        self.contexts.lock().unwrap().last().cloned().unwrap()
    }

    /// Wait for the next launched session and take its sink.
    pub async fn next_sink(&self) -> CaptureSink<P, E> {
        loop {
            let notified = self.launched.notified();
            if let Some(sink) = self.sinks.lock().unwrap().pop_front() {
                return sink;
            }
            notified.await;
        }
    }
}

impl<R: Clone, P, E> ScriptedSdk<R, P, E> {
    pub fn last_request(&self) -> R {
        self.requests.lock().unwrap().last().cloned().unwrap()
    }
}

impl<R, P, E> VendorSdk for ScriptedSdk<R, P, E>
where
    R: Send + 'static,
    P: Send + 'static,
    E: Into<EventPayload> + Send + 'static,
{
    type Request = R;
    type Payload = P;
    type Event = E;

    fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    fn launch(
        &self,
        ctx: LaunchContext,
        request: R,
        sink: CaptureSink<P, E>,
    ) -> Result<(), VendorError> {
        self.requests.lock().unwrap().push(request);
        self.contexts.lock().unwrap().push(ctx);
        if let Some(error) = self.launch_error.lock().unwrap().take() {
            return Err(error);
        }
        if !self.drop_sinks.load(Ordering::SeqCst) {
            self.sinks.lock().unwrap().push_back(sink);
            self.launched.notify_one();
        }
        Ok(())
    }

    fn teardown(&self) {
        self.teardowns.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(modality = %self.modality, "scripted teardown");
    }
}

impl VideoCallSdk for ScriptedSdk<VideoCallRequest, VideoCallPayload, VideoCallEvent> {
    fn toggle_camera(&self) -> Result<bool, VendorError> {
        Ok(!self.camera_on.fetch_xor(true, Ordering::SeqCst))
    }

    fn switch_camera(&self) -> Result<bool, VendorError> {
        Ok(true)
    }

    fn toggle_microphone(&self) -> Result<bool, VendorError> {
        Ok(!self.microphone_on.fetch_xor(true, Ordering::SeqCst))
    }
}

pub type LivenessVendor = ScriptedSdk<LivenessRequest, LivenessPayload, LivenessEvent>;
pub type MrzVendor = ScriptedSdk<MrzRequest, MrzPayload, MrzEvent>;
pub type NfcVendor = ScriptedSdk<NfcRequest, NfcPayload, NfcEvent>;
pub type OcrVendor = ScriptedSdk<OcrRequest, OcrPayload, OcrEvent>;
pub type VideoCallVendor = ScriptedSdk<VideoCallRequest, VideoCallPayload, VideoCallEvent>;

/// A bridge wired to scripted vendors, with handles to each vendor.
pub struct Harness {
    pub bridge: Arc<UdentifyBridge>,
    pub gate: Arc<FixedPermissionGate>,
    pub liveness: Arc<LivenessVendor>,
    pub mrz: Arc<MrzVendor>,
    pub nfc: Arc<NfcVendor>,
    pub ocr: Arc<OcrVendor>,
    pub video_call: Arc<VideoCallVendor>,
}

impl Harness {
    /// Every capability granted, default configuration.
    pub fn new() -> Self {
        Self::with_config(&BridgeConfig::default())
    }

    pub fn with_config(config: &BridgeConfig) -> Self {
        let gate = Arc::new(FixedPermissionGate::granting(&[
            Capability::Camera,
            Capability::Microphone,
            Capability::Nfc,
        ]));
        let liveness = LivenessVendor::new(Modality::Liveness);
        let mrz = MrzVendor::new(Modality::Mrz);
        let nfc = NfcVendor::new(Modality::Nfc);
        let ocr = OcrVendor::new(Modality::Ocr);
        let video_call = VideoCallVendor::new(Modality::VideoCall);
        let vendors = VendorSet {
            liveness: liveness.clone(),
            mrz: mrz.clone(),
            nfc: nfc.clone(),
            ocr: ocr.clone(),
            video_call: video_call.clone(),
        };
        let bridge = Arc::new(UdentifyBridge::new(config, gate.clone(), vendors));
        Self {
            bridge,
            gate,
            liveness,
            mrz,
            nfc,
            ocr,
            video_call,
        }
    }
}

pub fn map(value: Value) -> KeyValueMap {
    value.as_object().cloned().unwrap()
}

pub fn face_creds(transaction_id: &str) -> KeyValueMap {
    map(serde_json::json!({
        "serverURL": SERVER,
        "transactionID": transaction_id,
        "userID": "user-1",
    }))
}

pub fn sample_mrz() -> MrzData {
    MrzData {
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
    }
}
