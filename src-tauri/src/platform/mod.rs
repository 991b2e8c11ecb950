//! Platform-specific integrations: OS detection and the desktop permission gate.

pub mod permissions;

use std::fmt;
use std::sync::Arc;

use udentify_core::PermissionGate;

pub use permissions::DesktopPermissionGate;

// ---------------------------------------------------------------------------
// OsType
// ---------------------------------------------------------------------------

/// Detected operating system type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OsType {
    MacOS,
    Windows,
    Linux,
    Unknown,
}

impl OsType {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::MacOS => "macos",
            Self::Windows => "windows",
            Self::Linux => "linux",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for OsType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Detect the current OS type at compile time.
#[must_use]
pub const fn detect_os_type() -> OsType {
    #[cfg(target_os = "macos")]
    {
        OsType::MacOS
    }
    #[cfg(target_os = "windows")]
    {
        OsType::Windows
    }
    #[cfg(target_os = "linux")]
    {
        OsType::Linux
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows", target_os = "linux")))]
    {
        OsType::Unknown
    }
}

// ---------------------------------------------------------------------------
// Factory
// ---------------------------------------------------------------------------

/// Permission gate for the current desktop platform.
#[must_use]
pub fn create_permission_gate() -> Arc<dyn PermissionGate> {
    let os = detect_os_type();
    tracing::info!(%os, "using desktop permission gate");
    Arc::new(DesktopPermissionGate::new(os))
}
