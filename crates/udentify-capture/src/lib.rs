#![cfg_attr(test, allow(clippy::unwrap_used, clippy::arithmetic_side_effects))]
//! Session orchestration for the Udentify capture bridge.
//!
//! Each modality module owns a [`CaptureShell`]: one single-flight
//! [`SessionRegistry`] slot, a settings store, and the vendor SDK behind
//! [`VendorSdk`]. Progress from every module flows into one shared
//! [`EventBus`]. The [`UdentifyBridge`] root ties the five modules together
//! and is constructed and owned by the embedding application.

use std::sync::{Mutex, MutexGuard, PoisonError};

pub mod bridge;
pub mod bus;
pub mod config;
pub mod modules;
pub mod registry;
pub mod settings;
pub mod shell;
pub mod sink;
pub mod vendor;

pub use bridge::{UdentifyBridge, VendorSet};
pub use bus::{EventBus, EventHook, EventSubscription};
pub use config::BridgeConfig;
pub use registry::{SessionHandle, SessionInfo, SessionRegistry, SessionState};
pub use settings::{Localization, ModalitySettings, SettingsStore};
pub use shell::{CaptureShell, Launch, ShellContext};
pub use sink::CaptureSink;
pub use vendor::{LaunchContext, UnavailableSdk, VendorSdk, VideoCallSdk};

/// Lock a mutex, recovering the data if a previous holder panicked.
///
/// The registry slot must stay releasable even after a panic elsewhere.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
