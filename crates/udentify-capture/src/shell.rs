//! The capture lifecycle shared by every modality.
//!
//! ```text
//! configure ─▶ vendor available? ─▶ permissions granted? ─▶ admit
//!     │               │                     │                 │
//!  InvalidConfig  SdkUnavailable     PermissionDenied   AlreadyInProgress
//!                                                             │
//!                 finalize ◀─ await (sink | cancel | timeout) ◀─ launch
//! ```
//!
//! Everything left of admission is an `Err`; once admitted, the operation
//! always resolves with exactly one [`CaptureResult`] and the slot is free
//! by the time it does.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use udentify_core::{
    normalize, BridgeError, Capability, CaptureResult, KeyValueMap, Modality,
    PermissionQueryError, PermissionReport, SessionTarget, Terminal,
};

use crate::bus::EventBus;
use crate::registry::{CancelHook, SessionInfo, SessionRegistry, SessionSpec};
use crate::settings::{Localization, SettingsStore};
use crate::sink::{self, EventObserver, SinkController};
use crate::vendor::{LaunchContext, VendorSdk};

/// Validates a UI settings map before it is stored.
pub type UiValidator = fn(&KeyValueMap) -> Result<(), BridgeError>;

fn accept_any(_: &KeyValueMap) -> Result<(), BridgeError> {
    Ok(())
}

/// One capture request, already validated by its module.
#[derive(Debug)]
pub struct Launch<R> {
    pub operation: &'static str,
    pub target: Option<SessionTarget>,
    /// Capabilities that must be granted before admission.
    pub capabilities: &'static [Capability],
    pub request: R,
}

/// Dependencies every shell shares.
#[derive(Clone)]
pub struct ShellContext {
    pub gate: Arc<dyn udentify_core::PermissionGate>,
    pub bus: EventBus,
    pub await_timeout: Option<Duration>,
}

/// Orchestrator for one modality instance.
pub struct CaptureShell<S: ?Sized + VendorSdk> {
    modality: Modality,
    vendor: Arc<S>,
    ctx: ShellContext,
    registry: Arc<SessionRegistry>,
    settings: SettingsStore,
    permissions: &'static [Capability],
    ui_validator: UiValidator,
    observer: Option<EventObserver>,
}

impl<S: ?Sized + VendorSdk> CaptureShell<S> {
    #[must_use]
    pub fn new(
        modality: Modality,
        vendor: Arc<S>,
        ctx: ShellContext,
        settings: SettingsStore,
        permissions: &'static [Capability],
    ) -> Self {
        Self {
            modality,
            vendor,
            ctx,
            registry: Arc::new(SessionRegistry::new(modality)),
            settings,
            permissions,
            ui_validator: accept_any,
            observer: None,
        }
    }

    #[must_use]
    pub fn with_ui_validator(mut self, validator: UiValidator) -> Self {
        self.ui_validator = validator;
        self
    }

    #[must_use]
    pub fn with_observer(mut self, observer: EventObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    #[must_use]
    pub const fn modality(&self) -> Modality {
        self.modality
    }

    #[must_use]
    pub fn vendor(&self) -> &S {
        &self.vendor
    }

    #[must_use]
    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    // ── Lifecycle ──────────────────────────────────────────────────

    /// Run one capture from availability check to finalize.
    ///
    /// # Errors
    ///
    /// `SdkUnavailable`, `PermissionDenied` or `AlreadyInProgress` before
    /// admission. After admission every outcome is an `Ok`.
    pub async fn run(
        &self,
        launch: Launch<S::Request>,
    ) -> Result<CaptureResult<S::Payload>, BridgeError> {
        let Launch {
            operation,
            target,
            capabilities,
            request,
        } = launch;

        if !self.vendor.is_available() {
            tracing::warn!(modality = %self.modality, operation, "vendor SDK unavailable");
            return Err(BridgeError::SdkUnavailable(self.modality));
        }
        self.ensure_granted(capabilities).await?;

        let id = self.registry.allocate_id();
        let (sink, controller, rx) =
            sink::channel(id, self.modality, self.ctx.bus.clone(), self.observer.clone());
        let cancel: CancelHook = {
            let controller = controller.clone();
            let vendor = Arc::clone(&self.vendor);
            Arc::new(move || {
                controller.close(Terminal::Cancelled);
                vendor.teardown();
            })
        };
        let handle = self
            .registry
            .try_admit(id, SessionSpec { operation, target }, cancel)?;
        tracing::info!(modality = %self.modality, session_id = id, operation, "session admitted");

        let launch_ctx = LaunchContext {
            session_id: id,
            modality: self.modality,
            settings: self.settings.snapshot(),
        };
        let launched = self
            .registry
            .launch_with(id, || self.vendor.launch(launch_ctx, request, sink));
        let terminal = match launched {
            Some(Ok(())) => self.await_terminal(rx, &controller).await,
            Some(Err(error)) => {
                tracing::warn!(
                    modality = %self.modality,
                    session_id = id,
                    code = error.code.as_deref().unwrap_or("-"),
                    "vendor launch failed: {}",
                    error.message
                );
                Terminal::Failed(error)
            }
            None => {
                // Cancelled between admission and launch; the vendor was
                // never started and the latch already holds the outcome.
                tracing::debug!(modality = %self.modality, session_id = id, "launch skipped");
                rx.await.unwrap_or(Terminal::Cancelled)
            }
        };

        let result = normalize(terminal);
        handle.finish();
        tracing::info!(
            modality = %self.modality,
            session_id = id,
            operation,
            success = result.success,
            kind = result.error.as_ref().map_or("-", |e| e.kind.as_code()),
            "session finalized"
        );
        Ok(result)
    }

    async fn await_terminal(
        &self,
        mut rx: oneshot::Receiver<Terminal<S::Payload>>,
        controller: &SinkController<S::Payload>,
    ) -> Terminal<S::Payload> {
        let Some(limit) = self.ctx.await_timeout else {
            return rx.await.unwrap_or(Terminal::Abandoned);
        };
        if let Ok(received) = tokio::time::timeout(limit, &mut rx).await {
            return received.unwrap_or(Terminal::Abandoned);
        }
        let terminal = expire(controller, &mut rx);
        if matches!(terminal, Terminal::TimedOut) {
            tracing::warn!(
                modality = %self.modality,
                timeout_secs = limit.as_secs(),
                "await timeout elapsed, tearing down"
            );
            self.vendor.teardown();
        }
        terminal
    }

    /// Cancel the active session, if any. Safe to call unconditionally.
    /// Returns whether a session was cancelled.
    pub fn cancel(&self) -> bool {
        let cancelled = self.registry.cancel_active();
        if !cancelled {
            tracing::debug!(modality = %self.modality, "cancel with no active session");
        }
        cancelled
    }

    #[must_use]
    pub fn is_in_progress(&self) -> bool {
        self.registry.is_in_progress()
    }

    #[must_use]
    pub fn active_session(&self) -> Option<SessionInfo> {
        self.registry.snapshot()
    }

    // ── Permissions ────────────────────────────────────────────────

    /// Current state of this modality's capabilities. Never prompts.
    ///
    /// # Errors
    ///
    /// `PermissionQuery` if a capability is unsupported on this device.
    pub async fn check_permissions(&self) -> Result<PermissionReport, BridgeError> {
        self.query(self.permissions, false).await
    }

    /// Prompt for any capability that is not yet granted.
    ///
    /// # Errors
    ///
    /// `PermissionRequestWhileBusy` during an active session, or
    /// `PermissionQuery` if a capability is unsupported.
    pub async fn request_permissions(&self) -> Result<PermissionReport, BridgeError> {
        if self.registry.is_in_progress() {
            return Err(BridgeError::PermissionRequestWhileBusy(self.modality));
        }
        self.query(self.permissions, true).await
    }

    async fn ensure_granted(&self, capabilities: &'static [Capability]) -> Result<(), BridgeError> {
        if capabilities.is_empty() {
            return Ok(());
        }
        let report = self.query(capabilities, false).await?;
        let missing = report.missing(capabilities);
        if missing.is_empty() {
            Ok(())
        } else {
            tracing::warn!(modality = %self.modality, ?missing, "capture blocked by permissions");
            Err(BridgeError::PermissionDenied {
                modality: self.modality,
                missing,
            })
        }
    }

    /// Gates may block on OS dialogs, so they run off the async threads.
    async fn query(
        &self,
        capabilities: &'static [Capability],
        prompt: bool,
    ) -> Result<PermissionReport, BridgeError> {
        let gate = Arc::clone(&self.ctx.gate);
        let report = tokio::task::spawn_blocking(move || {
            if prompt {
                gate.request(capabilities)
            } else {
                gate.check(capabilities)
            }
        })
        .await
        .map_err(|e| PermissionQueryError::Platform(format!("permission task failed: {e}")))??;
        Ok(report)
    }

    // ── Settings ───────────────────────────────────────────────────

    /// Merge UI settings for sessions admitted from now on.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` if the module rejects the settings.
    pub fn configure_ui_settings(&self, settings: KeyValueMap) -> Result<(), BridgeError> {
        (self.ui_validator)(&settings)?;
        tracing::debug!(modality = %self.modality, keys = settings.len(), "UI settings updated");
        self.settings.merge_ui(settings);
        Ok(())
    }

    /// Set the language for sessions admitted from now on.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` for a malformed language code or override.
    pub fn set_localization(
        &self,
        language_code: &str,
        overrides: Option<KeyValueMap>,
    ) -> Result<(), BridgeError> {
        let localization = Localization::new(language_code, overrides)?;
        tracing::debug!(
            modality = %self.modality,
            language = %localization.language_code,
            "localization updated"
        );
        self.settings.set_localization(localization);
        Ok(())
    }

    #[must_use]
    pub fn settings(&self) -> &SettingsStore {
        &self.settings
    }
}

/// Close the latch with `TimedOut` unless a vendor terminal got there
/// first, and return whichever outcome the latch holds.
fn expire<P>(
    controller: &SinkController<P>,
    rx: &mut oneshot::Receiver<Terminal<P>>,
) -> Terminal<P> {
    controller.close(Terminal::TimedOut);
    rx.try_recv().unwrap_or(Terminal::Abandoned)
}
