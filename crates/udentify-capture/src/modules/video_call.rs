//! Agent-assisted video call with live media controls.

use std::sync::{Arc, Mutex};

use udentify_core::video_call::{
    validate_ui_config, CallStatus, VideoCallCredentials, VideoCallEvent, VideoCallPayload,
    VideoCallRequest,
};
use udentify_core::{
    BridgeError, Capability, CaptureResult, EventPayload, KeyValueMap, Modality, SessionId,
    VendorError,
};

use crate::lock;
use crate::settings::SettingsStore;
use crate::shell::{CaptureShell, Launch, ShellContext};
use crate::sink::EventObserver;
use crate::vendor::DynVideoCallSdk;

const CALL: &[Capability] = &[Capability::Camera, Capability::Microphone];

type VideoCallResult = Result<CaptureResult<VideoCallPayload>, BridgeError>;

/// Last user state reported, tagged with the session that reported it.
type StatusCell = Arc<Mutex<Option<(SessionId, CallStatus)>>>;

/// Video call modality instance.
pub struct VideoCallModule {
    shell: CaptureShell<DynVideoCallSdk>,
    status: StatusCell,
}

impl VideoCallModule {
    #[must_use]
    pub fn new(vendor: Arc<DynVideoCallSdk>, ctx: ShellContext, settings: SettingsStore) -> Self {
        let status: StatusCell = Arc::new(Mutex::new(None));
        let observer: EventObserver = {
            let status = Arc::clone(&status);
            Arc::new(move |session_id: SessionId, payload: &EventPayload| {
                if let EventPayload::VideoCall(VideoCallEvent::UserStateChanged { state }) =
                    payload
                {
                    if let Some(next) = CallStatus::from_user_state(state) {
                        *lock(&status) = Some((session_id, next));
                    }
                }
            })
        };
        Self {
            shell: CaptureShell::new(Modality::VideoCall, vendor, ctx, settings, CALL)
                .with_ui_validator(validate_ui_config)
                .with_observer(observer),
            status,
        }
    }

    #[must_use]
    pub const fn shell(&self) -> &CaptureShell<DynVideoCallSdk> {
        &self.shell
    }

    /// Join the call. Resolves when the call ends or is dismissed.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` for missing credentials, `PermissionDenied` without
    /// camera and microphone, `AlreadyInProgress` during another call.
    pub async fn start_video_call(&self, creds: &KeyValueMap) -> VideoCallResult {
        let credentials = VideoCallCredentials::from_map(creds)?;
        tracing::debug!(
            transaction_id = %credentials.target.transaction_id,
            client = %credentials.client_name,
            "starting video call"
        );
        self.shell
            .run(Launch {
                operation: "videoCall",
                target: Some(credentials.target.clone()),
                capabilities: CALL,
                request: VideoCallRequest::Start(credentials),
            })
            .await
    }

    /// Hang up from the application side.
    pub fn end_video_call(&self) -> bool {
        self.shell.cancel()
    }

    /// Dismiss the call UI.
    pub fn dismiss_video_call(&self) -> bool {
        self.shell.cancel()
    }

    /// `idle` outside a call, otherwise the last reported state.
    #[must_use]
    pub fn get_video_call_status(&self) -> CallStatus {
        let Some(active) = self.shell.active_session() else {
            return CallStatus::Idle;
        };
        match *lock(&self.status) {
            Some((session_id, status)) if session_id == active.id => status,
            _ => CallStatus::Connecting,
        }
    }

    /// # Errors
    ///
    /// Vendor failure while a call is active.
    pub fn toggle_camera(&self) -> Result<bool, VendorError> {
        self.control("toggleCamera", |sdk| sdk.toggle_camera())
    }

    /// # Errors
    ///
    /// Vendor failure while a call is active.
    pub fn switch_camera(&self) -> Result<bool, VendorError> {
        self.control("switchCamera", |sdk| sdk.switch_camera())
    }

    /// # Errors
    ///
    /// Vendor failure while a call is active.
    pub fn toggle_microphone(&self) -> Result<bool, VendorError> {
        self.control("toggleMicrophone", |sdk| sdk.toggle_microphone())
    }

    /// Controls are no-ops answering `false` when no call is running.
    fn control(
        &self,
        name: &str,
        op: fn(&DynVideoCallSdk) -> Result<bool, VendorError>,
    ) -> Result<bool, VendorError> {
        if !self.shell.is_in_progress() {
            tracing::debug!(control = name, "ignored, no active call");
            return Ok(false);
        }
        op(self.shell.vendor())
    }

    /// Alias of UI settings configuration for the call screen.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` for malformed colors or timeouts.
    pub fn set_video_call_config(&self, config: KeyValueMap) -> Result<(), BridgeError> {
        self.shell.configure_ui_settings(config)
    }

    #[must_use]
    pub fn is_video_call_in_progress(&self) -> bool {
        self.shell.is_in_progress()
    }
}
