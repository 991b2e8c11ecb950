//! Single-flight session registry, one per modality instance.
//!
//! The registry owns exactly one slot. [`SessionRegistry::try_admit`] fills
//! it atomically or fails with `AlreadyInProgress`; there is no queue and
//! the running session is never disturbed by a rejected admission.
//!
//! Release is reachable from every exit path:
//! - the orchestrator finishes the [`SessionHandle`] after finalizing,
//! - [`SessionRegistry::cancel_active`] releases after tearing down,
//! - dropping an unfinished handle tears down and releases.
//!
//! Releasing is keyed by session id, so a stale release can never free a
//! newer session's slot.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use serde::Serialize;
use udentify_core::{BridgeError, Modality, SessionId, SessionTarget};

use crate::lock;

/// Tears down the vendor and closes the session's latch.
pub type CancelHook = Arc<dyn Fn() + Send + Sync>;

/// Lifecycle of the occupying session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionState {
    Launching,
    Awaiting,
    Cancelling,
}

/// What the caller asked for, recorded at admission.
#[derive(Debug, Clone)]
pub struct SessionSpec {
    pub operation: &'static str,
    pub target: Option<SessionTarget>,
}

/// Read-only view of the active session.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub id: SessionId,
    pub modality: Modality,
    pub operation: &'static str,
    #[serde(rename = "transactionID", skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    #[serde(rename = "serverURL", skip_serializing_if = "Option::is_none")]
    pub server_url: Option<String>,
    pub state: SessionState,
    pub started_at: SystemTime,
}

struct ActiveSession {
    info: SessionInfo,
    cancel: CancelHook,
}

/// The slot for one modality instance.
pub struct SessionRegistry {
    modality: Modality,
    next_id: AtomicU64,
    slot: Mutex<Option<ActiveSession>>,
}

impl SessionRegistry {
    #[must_use]
    pub fn new(modality: Modality) -> Self {
        Self {
            modality,
            next_id: AtomicU64::new(1),
            slot: Mutex::new(None),
        }
    }

    #[must_use]
    pub const fn modality(&self) -> Modality {
        self.modality
    }

    /// Reserve an id for a session about to be admitted. Ids are never
    /// reused, even when admission is then rejected.
    pub fn allocate_id(&self) -> SessionId {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Occupy the slot.
    ///
    /// # Errors
    ///
    /// `AlreadyInProgress` if another session holds the slot. The existing
    /// session is left untouched.
    pub fn try_admit(
        self: &Arc<Self>,
        id: SessionId,
        spec: SessionSpec,
        cancel: CancelHook,
    ) -> Result<SessionHandle, BridgeError> {
        let mut slot = lock(&self.slot);
        if let Some(active) = slot.as_ref() {
            tracing::warn!(
                modality = %self.modality,
                active_session = active.info.id,
                rejected_operation = spec.operation,
                "admission rejected, session already in progress"
            );
            return Err(BridgeError::AlreadyInProgress(self.modality));
        }
        let (transaction_id, server_url) = spec
            .target
            .map(|t| (t.transaction_id, t.server_url))
            .unzip();
        *slot = Some(ActiveSession {
            info: SessionInfo {
                id,
                modality: self.modality,
                operation: spec.operation,
                transaction_id,
                server_url,
                state: SessionState::Launching,
                started_at: SystemTime::now(),
            },
            cancel,
        });
        drop(slot);
        Ok(SessionHandle {
            registry: Arc::clone(self),
            id,
            finished: false,
        })
    }

    #[must_use]
    pub fn is_in_progress(&self) -> bool {
        lock(&self.slot).is_some()
    }

    #[must_use]
    pub fn snapshot(&self) -> Option<SessionInfo> {
        lock(&self.slot).as_ref().map(|active| active.info.clone())
    }

    /// Run `launch` if `id` still holds the slot and was not cancelled
    /// while launching, moving it to `Awaiting`.
    ///
    /// The slot stays locked for the duration of `launch`, so a concurrent
    /// [`cancel_active`](Self::cancel_active) lands either before it (and
    /// `launch` is skipped) or after it (and tears down what was launched).
    pub(crate) fn launch_with<T>(&self, id: SessionId, launch: impl FnOnce() -> T) -> Option<T> {
        let mut slot = lock(&self.slot);
        let active = slot
            .as_mut()
            .filter(|a| a.info.id == id && a.info.state == SessionState::Launching)?;
        active.info.state = SessionState::Awaiting;
        let launched = launch();
        drop(slot);
        Some(launched)
    }

    /// Cancel whatever occupies the slot, then release it.
    ///
    /// Returns `false` when the slot was empty.
    pub fn cancel_active(&self) -> bool {
        let target = {
            let mut slot = lock(&self.slot);
            slot.as_mut().map(|active| {
                active.info.state = SessionState::Cancelling;
                (active.info.id, Arc::clone(&active.cancel))
            })
        };
        let Some((id, cancel)) = target else {
            return false;
        };
        tracing::info!(modality = %self.modality, session_id = id, "cancelling session");
        // Run outside the lock: vendor teardown may call back into the sink.
        cancel();
        self.release(id);
        true
    }

    /// Free the slot if `id` still holds it. Idempotent.
    pub fn release(&self, id: SessionId) -> bool {
        let mut slot = lock(&self.slot);
        if slot.as_ref().is_some_and(|active| active.info.id == id) {
            *slot = None;
            drop(slot);
            tracing::debug!(modality = %self.modality, session_id = id, "session slot released");
            true
        } else {
            false
        }
    }

    fn cancel_hook(&self, id: SessionId) -> Option<CancelHook> {
        lock(&self.slot)
            .as_ref()
            .filter(|active| active.info.id == id)
            .map(|active| Arc::clone(&active.cancel))
    }
}

/// Proof of admission. Must be finished after finalizing; dropping it
/// unfinished tears the session down.
pub struct SessionHandle {
    registry: Arc<SessionRegistry>,
    id: SessionId,
    finished: bool,
}

impl SessionHandle {
    #[must_use]
    pub const fn id(&self) -> SessionId {
        self.id
    }

    /// Release the slot after the terminal outcome was produced.
    pub fn finish(mut self) {
        self.finished = true;
        self.registry.release(self.id);
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        if let Some(cancel) = self.registry.cancel_hook(self.id) {
            tracing::warn!(
                modality = %self.registry.modality,
                session_id = self.id,
                "session dropped before finalizing, tearing down"
            );
            cancel();
        }
        self.registry.release(self.id);
    }
}
