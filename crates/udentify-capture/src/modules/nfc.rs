//! NFC passport chip reading and antenna location assist.

use std::sync::Arc;

use udentify_core::config::{validate_server_url, SessionTarget};
use udentify_core::mrz::BacCredentials;
use udentify_core::nfc::{NfcCredentials, NfcPayload, NfcRequest};
use udentify_core::{
    BridgeError, Capability, CaptureResult, KeyValueMap, Modality, PermissionQueryError,
};

use crate::settings::SettingsStore;
use crate::shell::{CaptureShell, Launch, ShellContext};
use crate::vendor::NfcSdk;

const RADIO: &[Capability] = &[Capability::Nfc];

type NfcResult = Result<CaptureResult<NfcPayload>, BridgeError>;

/// NFC modality instance.
pub struct NfcModule {
    shell: CaptureShell<NfcSdk>,
}

impl NfcModule {
    #[must_use]
    pub fn new(vendor: Arc<NfcSdk>, ctx: ShellContext, settings: SettingsStore) -> Self {
        Self {
            shell: CaptureShell::new(Modality::Nfc, vendor, ctx, settings, RADIO),
        }
    }

    #[must_use]
    pub const fn shell(&self) -> &CaptureShell<NfcSdk> {
        &self.shell
    }

    /// Whether the device has an NFC reader and the vendor SDK is linked.
    pub async fn is_nfc_available(&self) -> bool {
        if !self.shell.vendor().is_available() {
            return false;
        }
        match self.shell.check_permissions().await {
            Ok(_) => true,
            Err(BridgeError::PermissionQuery(PermissionQueryError::Unsupported(_))) => false,
            Err(e) => {
                tracing::warn!("NFC availability query failed: {e}");
                false
            }
        }
    }

    /// Whether the reader is present and switched on.
    pub async fn is_nfc_enabled(&self) -> bool {
        self.shell
            .check_permissions()
            .await
            .is_ok_and(|report| report.state(Capability::Nfc).is_granted())
    }

    /// Read the passport chip.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` for missing or malformed credentials, then the usual
    /// pre-admission failures.
    pub async fn start_nfc_reading(&self, creds: &KeyValueMap) -> NfcResult {
        let credentials = NfcCredentials::from_map(creds)?;
        self.read(credentials).await
    }

    /// Read the chip with access keys taken from an MRZ scan.
    ///
    /// # Errors
    ///
    /// Same as [`Self::start_nfc_reading`].
    pub async fn start_nfc_reading_with_bac(
        &self,
        bac: &BacCredentials,
        server_url: &str,
        transaction_id: &str,
    ) -> NfcResult {
        let target = SessionTarget::new(server_url, transaction_id)?;
        let credentials = NfcCredentials::from_bac(bac, target)?;
        self.read(credentials).await
    }

    async fn read(&self, credentials: NfcCredentials) -> NfcResult {
        tracing::debug!(
            transaction_id = %credentials.target.transaction_id,
            request_timeout = credentials.request_timeout,
            "starting chip read"
        );
        self.shell
            .run(Launch {
                operation: "nfcRead",
                target: Some(credentials.target.clone()),
                capabilities: RADIO,
                request: NfcRequest::ReadPassport(credentials),
            })
            .await
    }

    /// Ask the server where the antenna sits on this device model.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` for a malformed server URL.
    pub async fn get_nfc_location(&self, server_url: &str) -> NfcResult {
        if server_url.trim().is_empty() {
            return Err(BridgeError::missing_key("serverURL"));
        }
        validate_server_url("serverURL", server_url)?;
        self.shell
            .run(Launch {
                operation: "nfcLocation",
                target: None,
                capabilities: &[],
                request: NfcRequest::LocateAntenna {
                    server_url: server_url.to_owned(),
                },
            })
            .await
    }

    pub fn cancel_nfc_reading(&self) -> bool {
        self.shell.cancel()
    }

    #[must_use]
    pub fn is_nfc_reading_in_progress(&self) -> bool {
        self.shell.is_in_progress()
    }
}
