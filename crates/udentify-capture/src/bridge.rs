//! Root object tying the five modality modules together.

use std::sync::Arc;

use udentify_core::liveness::{LivenessEvent, LivenessPayload, LivenessRequest};
use udentify_core::mrz::{MrzEvent, MrzPayload, MrzRequest};
use udentify_core::nfc::{NfcEvent, NfcPayload, NfcRequest};
use udentify_core::ocr::{OcrEvent, OcrPayload, OcrRequest};
use udentify_core::video_call::{VideoCallEvent, VideoCallPayload, VideoCallRequest};
use udentify_core::{BridgeError, KeyValueMap, Modality, PermissionGate, PermissionReport};

use crate::bus::{EventBus, EventSubscription};
use crate::config::BridgeConfig;
use crate::modules::{LivenessModule, MrzModule, NfcModule, OcrModule, VideoCallModule};
use crate::settings::SettingsStore;
use crate::shell::ShellContext;
use crate::vendor::{DynVideoCallSdk, LivenessSdk, MrzSdk, NfcSdk, OcrSdk, UnavailableSdk};

/// Run `$body` with `$shell` bound to the capture shell of `$modality`.
macro_rules! with_shell {
    ($bridge:expr, $modality:expr, $shell:ident => $body:expr) => {
        match $modality {
            Modality::Liveness => {
                let $shell = $bridge.liveness.shell();
                $body
            }
            Modality::Mrz => {
                let $shell = $bridge.mrz.shell();
                $body
            }
            Modality::Nfc => {
                let $shell = $bridge.nfc.shell();
                $body
            }
            Modality::Ocr => {
                let $shell = $bridge.ocr.shell();
                $body
            }
            Modality::VideoCall => {
                let $shell = $bridge.video_call.shell();
                $body
            }
        }
    };
}

/// Vendor SDK adapters, one per modality.
#[derive(Clone)]
pub struct VendorSet {
    pub liveness: Arc<LivenessSdk>,
    pub mrz: Arc<MrzSdk>,
    pub nfc: Arc<NfcSdk>,
    pub ocr: Arc<OcrSdk>,
    pub video_call: Arc<DynVideoCallSdk>,
}

impl VendorSet {
    /// Every modality backed by [`UnavailableSdk`].
    #[must_use]
    pub fn unavailable() -> Self {
        Self {
            liveness: Arc::new(
                UnavailableSdk::<LivenessRequest, LivenessPayload, LivenessEvent>::new(
                    Modality::Liveness,
                ),
            ),
            mrz: Arc::new(UnavailableSdk::<MrzRequest, MrzPayload, MrzEvent>::new(
                Modality::Mrz,
            )),
            nfc: Arc::new(UnavailableSdk::<NfcRequest, NfcPayload, NfcEvent>::new(
                Modality::Nfc,
            )),
            ocr: Arc::new(UnavailableSdk::<OcrRequest, OcrPayload, OcrEvent>::new(
                Modality::Ocr,
            )),
            video_call: Arc::new(
                UnavailableSdk::<VideoCallRequest, VideoCallPayload, VideoCallEvent>::new(
                    Modality::VideoCall,
                ),
            ),
        }
    }
}

/// The capture bridge. Owned by the embedding application and shared
/// behind an `Arc`.
pub struct UdentifyBridge {
    pub liveness: LivenessModule,
    pub mrz: MrzModule,
    pub nfc: NfcModule,
    pub ocr: OcrModule,
    pub video_call: VideoCallModule,
    bus: EventBus,
}

impl UdentifyBridge {
    #[must_use]
    pub fn new(config: &BridgeConfig, gate: Arc<dyn PermissionGate>, vendors: VendorSet) -> Self {
        let bus = EventBus::new(config.event_capacity());
        let ctx = ShellContext {
            gate,
            bus: bus.clone(),
            await_timeout: config.await_timeout(),
        };
        let store = |modality| match &config.settings_dir {
            Some(dir) => SettingsStore::open(dir, modality),
            None => SettingsStore::in_memory(modality),
        };
        tracing::info!(
            persisted = config.settings_dir.is_some(),
            await_timeout_secs = ?config.await_timeout().map(|d| d.as_secs()),
            "capture bridge ready"
        );

        Self {
            liveness: LivenessModule::new(vendors.liveness, ctx.clone(), store(Modality::Liveness)),
            mrz: MrzModule::new(vendors.mrz, ctx.clone(), store(Modality::Mrz)),
            nfc: NfcModule::new(vendors.nfc, ctx.clone(), store(Modality::Nfc)),
            ocr: OcrModule::new(vendors.ocr, ctx.clone(), store(Modality::Ocr)),
            video_call: VideoCallModule::new(vendors.video_call, ctx, store(Modality::VideoCall)),
            bus,
        }
    }

    /// Subscribe to progress events, optionally for one modality only.
    #[must_use]
    pub fn subscribe(&self, modality: Option<Modality>) -> EventSubscription {
        self.bus.subscribe(modality)
    }

    #[must_use]
    pub const fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Whether a session of `modality` is active.
    #[must_use]
    pub fn is_in_progress(&self, modality: Modality) -> bool {
        with_shell!(self, modality, shell => shell.is_in_progress())
    }

    /// # Errors
    ///
    /// `PermissionQuery` if a capability of `modality` is unsupported.
    pub async fn check_permissions(
        &self,
        modality: Modality,
    ) -> Result<PermissionReport, BridgeError> {
        with_shell!(self, modality, shell => shell.check_permissions().await)
    }

    /// # Errors
    ///
    /// `PermissionRequestWhileBusy` during a session of `modality`, or
    /// `PermissionQuery` if a capability is unsupported.
    pub async fn request_permissions(
        &self,
        modality: Modality,
    ) -> Result<PermissionReport, BridgeError> {
        with_shell!(self, modality, shell => shell.request_permissions().await)
    }

    /// # Errors
    ///
    /// `InvalidConfig` if the modality rejects the settings.
    pub fn configure_ui_settings(
        &self,
        modality: Modality,
        settings: KeyValueMap,
    ) -> Result<(), BridgeError> {
        with_shell!(self, modality, shell => shell.configure_ui_settings(settings))
    }

    /// # Errors
    ///
    /// `InvalidConfig` for a malformed language code or override.
    pub fn set_localization(
        &self,
        modality: Modality,
        language_code: &str,
        overrides: Option<KeyValueMap>,
    ) -> Result<(), BridgeError> {
        with_shell!(self, modality, shell => shell.set_localization(language_code, overrides))
    }

    /// Cancel the session of one modality, if any.
    pub fn cancel(&self, modality: Modality) -> bool {
        with_shell!(self, modality, shell => shell.cancel())
    }

    /// Cancel every active session. Used when the host window closes.
    pub fn cancel_all(&self) -> usize {
        Modality::ALL
            .into_iter()
            .filter(|modality| self.cancel(*modality))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use udentify_core::permission::FixedPermissionGate;
    use udentify_core::{BridgeError, Capability};

    fn bridge(config: &BridgeConfig) -> UdentifyBridge {
        UdentifyBridge::new(
            config,
            Arc::new(FixedPermissionGate::granting(&[
                Capability::Camera,
                Capability::Microphone,
                Capability::Nfc,
            ])),
            VendorSet::unavailable(),
        )
    }

    #[tokio::test]
    async fn unavailable_vendors_fail_before_admission() {
        let bridge = bridge(&BridgeConfig::default());
        let err = bridge.mrz.start_mrz_camera(None).await.unwrap_err();
        assert!(matches!(err, BridgeError::SdkUnavailable(Modality::Mrz)));
        assert!(!bridge.is_in_progress(Modality::Mrz));
        assert_eq!(bridge.cancel_all(), 0);
    }

    #[tokio::test]
    async fn permissions_are_scoped_per_modality() {
        let bridge = bridge(&BridgeConfig::default());
        let report = bridge.check_permissions(Modality::VideoCall).await.unwrap();
        assert!(report.state(Capability::Camera).is_granted());
        assert!(report.state(Capability::Microphone).is_granted());
        assert!(!report.iter().any(|(cap, _)| cap == Capability::Nfc));

        let report = bridge.request_permissions(Modality::Nfc).await.unwrap();
        assert_eq!(report.iter().count(), 1);
    }

    #[test]
    fn settings_dir_persists_per_modality() {
        let dir = TempDir::new().unwrap();
        let config = BridgeConfig {
            settings_dir: Some(dir.path().to_path_buf()),
            ..BridgeConfig::default()
        };
        bridge(&config)
            .set_localization(Modality::Ocr, "tr", None)
            .unwrap();

        assert!(dir.path().join("ocr.settings.json").exists());
        let reopened = bridge(&config);
        let snapshot = reopened.ocr.shell().settings().snapshot();
        assert_eq!(snapshot.localization.unwrap().language_code, "tr");
        assert!(reopened.mrz.shell().settings().snapshot().localization.is_none());
    }
}
