//! MRZ scanning from the camera or a still image.

use std::sync::Arc;

use udentify_core::mrz::{MrzPayload, MrzRequest, MrzUiCustomization};
use udentify_core::{BridgeError, Capability, CaptureResult, ImageData, KeyValueMap, Modality};

use crate::settings::SettingsStore;
use crate::shell::{CaptureShell, Launch, ShellContext};
use crate::vendor::MrzSdk;

const CAMERA: &[Capability] = &[Capability::Camera];

type MrzResult = Result<CaptureResult<MrzPayload>, BridgeError>;

fn validate_ui(map: &KeyValueMap) -> Result<(), BridgeError> {
    MrzUiCustomization::from_map(map).map(drop)
}

/// MRZ modality instance.
pub struct MrzModule {
    shell: CaptureShell<MrzSdk>,
}

impl MrzModule {
    #[must_use]
    pub fn new(vendor: Arc<MrzSdk>, ctx: ShellContext, settings: SettingsStore) -> Self {
        Self {
            shell: CaptureShell::new(Modality::Mrz, vendor, ctx, settings, CAMERA)
                .with_ui_validator(validate_ui),
        }
    }

    #[must_use]
    pub const fn shell(&self) -> &CaptureShell<MrzSdk> {
        &self.shell
    }

    /// Scan with the camera. Customization given here overrides the stored
    /// UI settings for this session only.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` for a malformed customization, then the usual
    /// pre-admission failures.
    pub async fn start_mrz_camera(&self, customization: Option<&KeyValueMap>) -> MrzResult {
        let mut merged = self.shell.settings().snapshot().ui;
        if let Some(custom) = customization {
            merged.extend(custom.clone());
        }
        let customization = MrzUiCustomization::from_map(&merged)?;
        self.shell
            .run(Launch {
                operation: "mrzCamera",
                target: None,
                capabilities: CAMERA,
                request: MrzRequest::Camera(customization),
            })
            .await
    }

    /// Decode the MRZ from one image. No camera permission is needed.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` for missing or malformed image data.
    pub async fn process_mrz_image(&self, image_base64: &str) -> MrzResult {
        if image_base64.trim().is_empty() {
            return Err(BridgeError::missing_key("imageBase64"));
        }
        let image = ImageData::from_base64(image_base64)?;
        tracing::debug!(image = %image.fingerprint(), "MRZ image supplied");
        self.shell
            .run(Launch {
                operation: "mrzImage",
                target: None,
                capabilities: &[],
                request: MrzRequest::Image(image),
            })
            .await
    }

    pub fn cancel_mrz_scanning(&self) -> bool {
        self.shell.cancel()
    }

    #[must_use]
    pub fn is_mrz_scanning_in_progress(&self) -> bool {
        self.shell.is_in_progress()
    }
}
