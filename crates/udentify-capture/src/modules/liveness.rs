//! Face recognition, liveness and identification-list operations.

use std::sync::Arc;

use udentify_core::liveness::{
    FaceMethod, FaceRecognizerCredentials, LivenessPayload, LivenessRequest, ListEnrollment,
    ListTarget,
};
use udentify_core::{BridgeError, Capability, CaptureResult, ImageData, KeyValueMap, Modality};

use crate::settings::SettingsStore;
use crate::shell::{CaptureShell, Launch, ShellContext};
use crate::vendor::LivenessSdk;

const CAMERA: &[Capability] = &[Capability::Camera];
const NONE: &[Capability] = &[];

type LivenessResult = Result<CaptureResult<LivenessPayload>, BridgeError>;

/// Liveness modality instance.
pub struct LivenessModule {
    shell: CaptureShell<LivenessSdk>,
}

impl LivenessModule {
    #[must_use]
    pub fn new(vendor: Arc<LivenessSdk>, ctx: ShellContext, settings: SettingsStore) -> Self {
        Self {
            shell: CaptureShell::new(Modality::Liveness, vendor, ctx, settings, CAMERA),
        }
    }

    #[must_use]
    pub const fn shell(&self) -> &CaptureShell<LivenessSdk> {
        &self.shell
    }

    // ── Camera flows ───────────────────────────────────────────────

    /// # Errors
    ///
    /// Pre-admission failures; see [`CaptureShell::run`].
    pub async fn start_face_recognition_registration(
        &self,
        creds: &KeyValueMap,
    ) -> LivenessResult {
        self.face_camera("faceRegistration", creds, FaceMethod::Registration)
            .await
    }

    /// # Errors
    ///
    /// Pre-admission failures; see [`CaptureShell::run`].
    pub async fn start_face_recognition_authentication(
        &self,
        creds: &KeyValueMap,
    ) -> LivenessResult {
        self.face_camera("faceAuthentication", creds, FaceMethod::Authentication)
            .await
    }

    async fn face_camera(
        &self,
        operation: &'static str,
        creds: &KeyValueMap,
        method: FaceMethod,
    ) -> LivenessResult {
        let credentials = FaceRecognizerCredentials::from_map(creds)?;
        self.launch(
            operation,
            CAMERA,
            LivenessRequest::FaceCamera {
                credentials,
                method,
            },
        )
        .await
    }

    /// # Errors
    ///
    /// Pre-admission failures; see [`CaptureShell::run`].
    pub async fn start_active_liveness(
        &self,
        creds: &KeyValueMap,
        is_authentication: bool,
    ) -> LivenessResult {
        let credentials = FaceRecognizerCredentials::from_map(creds)?;
        let method = FaceMethod::from_authentication_flag(is_authentication);
        self.launch(
            "activeLiveness",
            CAMERA,
            LivenessRequest::ActiveLiveness {
                credentials,
                method,
            },
        )
        .await
    }

    /// # Errors
    ///
    /// Pre-admission failures; see [`CaptureShell::run`].
    pub async fn start_hybrid_liveness(
        &self,
        creds: &KeyValueMap,
        is_authentication: bool,
    ) -> LivenessResult {
        let credentials = FaceRecognizerCredentials::from_map(creds)?;
        let method = FaceMethod::from_authentication_flag(is_authentication);
        self.launch(
            "hybridLiveness",
            CAMERA,
            LivenessRequest::HybridLiveness {
                credentials,
                method,
            },
        )
        .await
    }

    /// Capture a selfie without running recognition.
    ///
    /// # Errors
    ///
    /// Pre-admission failures; see [`CaptureShell::run`].
    pub async fn start_selfie_capture(&self, creds: &KeyValueMap) -> LivenessResult {
        let credentials = FaceRecognizerCredentials::from_map(creds)?;
        self.launch(
            "selfieCapture",
            CAMERA,
            LivenessRequest::SelfieCapture { credentials },
        )
        .await
    }

    /// 1:N identification against a server-side list.
    ///
    /// # Errors
    ///
    /// Pre-admission failures; see [`CaptureShell::run`].
    pub async fn start_face_recognition_identification(
        &self,
        server_url: &str,
        transaction_id: &str,
        list_name: &str,
        log_level: Option<&str>,
    ) -> LivenessResult {
        let list = ListTarget::new(server_url, transaction_id, list_name)?;
        let log_level = log_level
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_owned);
        self.launch(
            "faceIdentification",
            CAMERA,
            LivenessRequest::Identification { list, log_level },
        )
        .await
    }

    // ── Image flows ────────────────────────────────────────────────

    /// Recognize a selfie captured earlier.
    ///
    /// # Errors
    ///
    /// Pre-admission failures; see [`CaptureShell::run`].
    pub async fn perform_face_recognition_with_selfie(
        &self,
        creds: &KeyValueMap,
        image_base64: &str,
        is_authentication: bool,
    ) -> LivenessResult {
        let credentials = FaceRecognizerCredentials::from_map(creds)?;
        let image = load_image(image_base64)?;
        let method = FaceMethod::from_authentication_flag(is_authentication);
        self.launch(
            "selfieRecognition",
            NONE,
            LivenessRequest::SelfieRecognition {
                credentials,
                image,
                method,
            },
        )
        .await
    }

    /// # Errors
    ///
    /// Pre-admission failures; see [`CaptureShell::run`].
    pub async fn register_user_with_photo(
        &self,
        creds: &KeyValueMap,
        image_base64: &str,
    ) -> LivenessResult {
        self.photo("photoRegistration", creds, image_base64, FaceMethod::Registration)
            .await
    }

    /// # Errors
    ///
    /// Pre-admission failures; see [`CaptureShell::run`].
    pub async fn authenticate_user_with_photo(
        &self,
        creds: &KeyValueMap,
        image_base64: &str,
    ) -> LivenessResult {
        self.photo(
            "photoAuthentication",
            creds,
            image_base64,
            FaceMethod::Authentication,
        )
        .await
    }

    async fn photo(
        &self,
        operation: &'static str,
        creds: &KeyValueMap,
        image_base64: &str,
        method: FaceMethod,
    ) -> LivenessResult {
        let credentials = FaceRecognizerCredentials::from_map(creds)?;
        let image = load_image(image_base64)?;
        self.launch(
            operation,
            NONE,
            LivenessRequest::PhotoRecognition {
                credentials,
                image,
                method,
            },
        )
        .await
    }

    // ── List management ────────────────────────────────────────────

    /// # Errors
    ///
    /// Pre-admission failures; see [`CaptureShell::run`].
    pub async fn add_user_to_list(
        &self,
        server_url: &str,
        transaction_id: &str,
        status: &str,
        metadata: Option<KeyValueMap>,
    ) -> LivenessResult {
        let enrollment = ListEnrollment::new(server_url, transaction_id, status, metadata)?;
        self.launch("addUserToList", NONE, LivenessRequest::AddToList(enrollment))
            .await
    }

    /// # Errors
    ///
    /// Pre-admission failures; see [`CaptureShell::run`].
    pub async fn delete_user_from_list(
        &self,
        server_url: &str,
        transaction_id: &str,
        list_name: &str,
        photo_base64: &str,
    ) -> LivenessResult {
        let list = ListTarget::new(server_url, transaction_id, list_name)?;
        let photo = load_image(photo_base64)?;
        self.launch(
            "deleteUserFromList",
            NONE,
            LivenessRequest::DeleteFromList { list, photo },
        )
        .await
    }

    // ── Control ────────────────────────────────────────────────────

    /// Cancel the running face flow, if any.
    pub fn cancel_face_recognition(&self) -> bool {
        self.shell.cancel()
    }

    #[must_use]
    pub fn is_face_recognition_in_progress(&self) -> bool {
        self.shell.is_in_progress()
    }

    async fn launch(
        &self,
        operation: &'static str,
        capabilities: &'static [Capability],
        request: LivenessRequest,
    ) -> LivenessResult {
        let target = Some(request.target().clone());
        self.shell
            .run(Launch {
                operation,
                target,
                capabilities,
                request,
            })
            .await
    }
}

fn load_image(image_base64: &str) -> Result<ImageData, BridgeError> {
    if image_base64.trim().is_empty() {
        return Err(BridgeError::missing_key("image"));
    }
    let image = ImageData::from_base64(image_base64)?;
    tracing::debug!(
        image = %image.fingerprint(),
        encoded_len = image.encoded_len(),
        "face image supplied"
    );
    Ok(image)
}
