//! Managed state of the plugin.
//!
//! The bridge is built once in plugin setup and shared by every command.
//! It carries its own locking, so no outer `Mutex` is needed.

use std::sync::Arc;

use udentify_capture::UdentifyBridge;

/// Managed Tauri state.
pub type ManagedBridge = Arc<UdentifyBridge>;

/// File name of the bridge config, looked up in the app config directory.
pub const CONFIG_FILE: &str = "udentify.json";

/// Subdirectory of the app data directory holding per-modality settings.
pub const SETTINGS_DIR: &str = "udentify";
