//! Tauri plugin exposing the Udentify capture bridge.
//!
//! Registers the IPC commands of every modality, builds one
//! [`UdentifyBridge`] per app in plugin setup, and forwards progress events
//! to the webview on `udentify://<modality>` channels.
//!
//! ```ignore
//! tauri::Builder::default()
//!     .plugin(tauri_plugin_udentify::init())
//!     .run(tauri::generate_context!())
//!     .expect("error while running tauri application");
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::arithmetic_side_effects))]

pub mod commands;
pub mod platform;
pub mod state;

use std::sync::Arc;

use tauri::plugin::{Builder as PluginBuilder, TauriPlugin};
use tauri::{AppHandle, Emitter, Manager, RunEvent, Runtime};
use udentify_capture::{BridgeConfig, EventBus, UdentifyBridge, VendorSet};
use udentify_core::{PermissionGate, ProgressEvent};

use state::{ManagedBridge, CONFIG_FILE, SETTINGS_DIR};

/// Plugin with the desktop permission gate and no vendor SDKs linked.
#[must_use]
pub fn init<R: Runtime>() -> TauriPlugin<R> {
    Builder::new().build()
}

/// Configures the plugin before it is registered.
#[derive(Default)]
pub struct Builder {
    config: Option<BridgeConfig>,
    gate: Option<Arc<dyn PermissionGate>>,
    vendors: Option<VendorSet>,
}

impl Builder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `config` instead of reading `udentify.json` from the app config
    /// directory.
    #[must_use]
    pub fn config(mut self, config: BridgeConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Replace the platform permission gate.
    #[must_use]
    pub fn permission_gate(mut self, gate: Arc<dyn PermissionGate>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Vendor SDK adapters linked into this build.
    #[must_use]
    pub fn vendors(mut self, vendors: VendorSet) -> Self {
        self.vendors = Some(vendors);
        self
    }

    #[must_use]
    pub fn build<R: Runtime>(self) -> TauriPlugin<R> {
        let Self {
            config,
            gate,
            vendors,
        } = self;

        PluginBuilder::new("udentify")
            .invoke_handler(tauri::generate_handler![
                commands::permissions::check_permissions,
                commands::permissions::request_permissions,
                commands::permissions::configure_ui_settings,
                commands::permissions::set_localization,
                commands::liveness::start_face_recognition_registration,
                commands::liveness::start_face_recognition_authentication,
                commands::liveness::start_active_liveness,
                commands::liveness::start_hybrid_liveness,
                commands::liveness::start_selfie_capture,
                commands::liveness::perform_face_recognition_with_selfie,
                commands::liveness::register_user_with_photo,
                commands::liveness::authenticate_user_with_photo,
                commands::liveness::start_face_recognition_identification,
                commands::liveness::add_user_to_list,
                commands::liveness::delete_user_from_list,
                commands::liveness::cancel_face_recognition,
                commands::liveness::is_face_recognition_in_progress,
                commands::mrz::start_mrz_camera,
                commands::mrz::process_mrz_image,
                commands::mrz::cancel_mrz_scanning,
                commands::mrz::is_mrz_scanning_in_progress,
                commands::nfc::is_nfc_available,
                commands::nfc::is_nfc_enabled,
                commands::nfc::start_nfc_reading,
                commands::nfc::start_nfc_reading_with_bac,
                commands::nfc::get_nfc_location,
                commands::nfc::cancel_nfc_reading,
                commands::nfc::is_nfc_reading_in_progress,
                commands::ocr::start_ocr_scanning,
                commands::ocr::start_hologram_camera,
                commands::ocr::perform_ocr,
                commands::ocr::perform_document_liveness,
                commands::ocr::perform_ocr_and_document_liveness,
                commands::ocr::perform_hologram_check,
                commands::ocr::cancel_ocr,
                commands::ocr::is_ocr_in_progress,
                commands::video_call::start_video_call,
                commands::video_call::end_video_call,
                commands::video_call::dismiss_video_call,
                commands::video_call::get_video_call_status,
                commands::video_call::toggle_camera,
                commands::video_call::switch_camera,
                commands::video_call::toggle_microphone,
                commands::video_call::set_video_call_config,
                commands::video_call::is_video_call_in_progress,
            ])
            .setup(move |app, _api| {
                let config = match config {
                    Some(config) => config,
                    None => load_config(app)?,
                };
                let gate = gate.unwrap_or_else(platform::create_permission_gate);
                let vendors = vendors.unwrap_or_else(|| {
                    tracing::warn!("no vendor SDKs registered, every capture will be unavailable");
                    VendorSet::unavailable()
                });

                let bridge: ManagedBridge = Arc::new(UdentifyBridge::new(&config, gate, vendors));
                forward_events(app.clone(), bridge.bus());
                app.manage(bridge);
                Ok(())
            })
            .on_event(|app, event| {
                if let RunEvent::Exit = event {
                    if let Some(bridge) = app.try_state::<ManagedBridge>() {
                        let cancelled = bridge.cancel_all();
                        if cancelled > 0 {
                            tracing::info!(cancelled, "capture sessions cancelled on exit");
                        }
                    }
                }
            })
            .build()
    }
}

/// Read the bridge config and default the settings directory into the
/// app data directory.
fn load_config<R: Runtime>(
    app: &AppHandle<R>,
) -> Result<BridgeConfig, Box<dyn std::error::Error>> {
    let mut config = BridgeConfig::load(&app.path().app_config_dir()?.join(CONFIG_FILE));
    if config.settings_dir.is_none() {
        let dir = app.path().app_data_dir()?.join(SETTINGS_DIR);
        std::fs::create_dir_all(&dir)?;
        config.settings_dir = Some(dir);
    }
    Ok(config)
}

/// Re-emit bus events to the webview from inside `publish`, so every event
/// of a session reaches the webview before its command resolves.
fn forward_events<R: Runtime>(app: AppHandle<R>, bus: &EventBus) {
    bus.add_hook(Arc::new(move |event: &ProgressEvent| {
        if let Err(e) = app.emit(event.modality.event_channel(), event) {
            tracing::warn!(modality = %event.modality, "failed to forward capture event: {e}");
        }
    }));
}
