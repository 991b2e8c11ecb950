//! Document scanning, OCR, document liveness and hologram verification.
//!
//! A successful camera scan keeps the captured photos for its transaction
//! so a follow-up OCR or liveness call can omit them. The stored scan is
//! only reused when the transaction id matches.

use std::sync::{Arc, Mutex};

use udentify_core::ocr::{
    parse_video_urls, DocumentImages, DocumentSide, DocumentType, OcrPayload, OcrRequest,
};
use udentify_core::{BridgeError, Capability, CaptureResult, ImageData, Modality, SessionTarget};

use crate::lock;
use crate::settings::SettingsStore;
use crate::shell::{CaptureShell, Launch, ShellContext};
use crate::vendor::OcrSdk;

const CAMERA: &[Capability] = &[Capability::Camera];

type OcrResult = Result<CaptureResult<OcrPayload>, BridgeError>;

#[derive(Debug, Clone)]
struct StoredScan {
    transaction_id: String,
    document_type: DocumentType,
    images: DocumentImages,
}

/// OCR modality instance.
pub struct OcrModule {
    shell: CaptureShell<OcrSdk>,
    last_scan: Mutex<Option<StoredScan>>,
}

impl OcrModule {
    #[must_use]
    pub fn new(vendor: Arc<OcrSdk>, ctx: ShellContext, settings: SettingsStore) -> Self {
        Self {
            shell: CaptureShell::new(Modality::Ocr, vendor, ctx, settings, CAMERA),
            last_scan: Mutex::new(None),
        }
    }

    #[must_use]
    pub const fn shell(&self) -> &CaptureShell<OcrSdk> {
        &self.shell
    }

    // ── Camera ─────────────────────────────────────────────────────

    /// Photograph the document. OCR itself runs in a later call.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` for an unknown document type or side, then the usual
    /// pre-admission failures.
    pub async fn start_ocr_scanning(
        &self,
        server_url: &str,
        transaction_id: &str,
        document_type: &str,
        document_side: &str,
    ) -> OcrResult {
        let target = SessionTarget::new(server_url, transaction_id)?;
        let document_type: DocumentType = document_type.parse()?;
        let side: DocumentSide = document_side.parse()?;

        let result = self
            .launch(
                "ocrScan",
                CAMERA,
                OcrRequest::Scan {
                    target: target.clone(),
                    document_type,
                    side,
                },
            )
            .await?;

        if let Some(OcrPayload::Scanned(images)) = &result.payload {
            tracing::debug!(
                transaction_id = %target.transaction_id,
                front = ?images.front.as_ref().map(ImageData::fingerprint),
                back = ?images.back.as_ref().map(ImageData::fingerprint),
                "document scan stored"
            );
            *lock(&self.last_scan) = Some(StoredScan {
                transaction_id: target.transaction_id,
                document_type,
                images: images.clone(),
            });
        }
        Ok(result)
    }

    /// Record hologram video clips.
    ///
    /// # Errors
    ///
    /// Pre-admission failures.
    pub async fn start_hologram_camera(&self, server_url: &str, transaction_id: &str) -> OcrResult {
        let target = SessionTarget::new(server_url, transaction_id)?;
        self.launch("hologramCamera", CAMERA, OcrRequest::HologramCamera { target })
            .await
    }

    // ── Server-side checks ─────────────────────────────────────────

    /// Extract document fields. Omitted images fall back to the stored
    /// scan of the same transaction.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` if no images are given and no scan is stored for
    /// this transaction.
    pub async fn perform_ocr(
        &self,
        server_url: &str,
        transaction_id: &str,
        document_type: &str,
        front_base64: Option<&str>,
        back_base64: Option<&str>,
    ) -> OcrResult {
        let target = SessionTarget::new(server_url, transaction_id)?;
        let images = self.resolve_images(&target, front_base64, back_base64)?;
        let document_type = self.resolve_document_type(&target, document_type)?;
        self.launch(
            "ocr",
            &[],
            OcrRequest::Recognize {
                target,
                document_type,
                images,
            },
        )
        .await
    }

    /// # Errors
    ///
    /// Same as [`Self::perform_ocr`].
    pub async fn perform_document_liveness(
        &self,
        server_url: &str,
        transaction_id: &str,
        front_base64: Option<&str>,
        back_base64: Option<&str>,
    ) -> OcrResult {
        let target = SessionTarget::new(server_url, transaction_id)?;
        let images = self.resolve_images(&target, front_base64, back_base64)?;
        self.launch(
            "documentLiveness",
            &[],
            OcrRequest::DocumentLiveness { target, images },
        )
        .await
    }

    /// # Errors
    ///
    /// Same as [`Self::perform_ocr`].
    pub async fn perform_ocr_and_document_liveness(
        &self,
        server_url: &str,
        transaction_id: &str,
        front_base64: Option<&str>,
        back_base64: Option<&str>,
        document_type: &str,
    ) -> OcrResult {
        let target = SessionTarget::new(server_url, transaction_id)?;
        let images = self.resolve_images(&target, front_base64, back_base64)?;
        let document_type = self.resolve_document_type(&target, document_type)?;
        self.launch(
            "ocrAndDocumentLiveness",
            &[],
            OcrRequest::RecognizeWithLiveness {
                target,
                document_type,
                images,
            },
        )
        .await
    }

    /// Verify the hologram from recorded clips.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` unless at least one clip URL parses.
    pub async fn perform_hologram_check(
        &self,
        server_url: &str,
        transaction_id: &str,
        video_urls: &[String],
    ) -> OcrResult {
        let target = SessionTarget::new(server_url, transaction_id)?;
        let video_urls = parse_video_urls(video_urls)?;
        self.launch(
            "hologramCheck",
            &[],
            OcrRequest::HologramCheck { target, video_urls },
        )
        .await
    }

    // ── Control ────────────────────────────────────────────────────

    pub fn cancel_ocr(&self) -> bool {
        self.shell.cancel()
    }

    #[must_use]
    pub fn is_ocr_in_progress(&self) -> bool {
        self.shell.is_in_progress()
    }

    fn resolve_images(
        &self,
        target: &SessionTarget,
        front_base64: Option<&str>,
        back_base64: Option<&str>,
    ) -> Result<DocumentImages, BridgeError> {
        let given = DocumentImages::from_base64(front_base64, back_base64)?;
        if !given.is_empty() {
            return Ok(given);
        }
        self.stored_scan(target)
            .map(|scan| scan.images)
            .ok_or_else(|| {
                BridgeError::InvalidConfig(format!(
                    "no document images given and no scan stored for transaction `{}`",
                    target.transaction_id
                ))
            })
    }

    /// A blank document type falls back to the stored scan's type.
    fn resolve_document_type(
        &self,
        target: &SessionTarget,
        document_type: &str,
    ) -> Result<DocumentType, BridgeError> {
        if document_type.trim().is_empty() {
            if let Some(scan) = self.stored_scan(target) {
                return Ok(scan.document_type);
            }
        }
        document_type.parse()
    }

    fn stored_scan(&self, target: &SessionTarget) -> Option<StoredScan> {
        lock(&self.last_scan)
            .as_ref()
            .filter(|scan| scan.transaction_id == target.transaction_id)
            .cloned()
    }

    async fn launch(
        &self,
        operation: &'static str,
        capabilities: &'static [Capability],
        request: OcrRequest,
    ) -> OcrResult {
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
