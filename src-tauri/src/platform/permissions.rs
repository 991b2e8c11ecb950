//! Desktop permission gate.
//!
//! - **macOS**: camera and microphone consent read from
//!   `AVCaptureDevice.authorizationStatusForMediaType:` via `objc2`, and
//!   prompted for with `requestAccessForMediaType:completionHandler:`.
//! - **Windows / Linux**: no per-app consent query; camera and microphone
//!   report `Granted` and the device open fails if the OS blocks it.
//!
//! Desktop machines have no NFC reader, phone state or Bluetooth pairing
//! prompt, so those capabilities are unsupported.

use udentify_core::{
    Capability, PermissionGate, PermissionQueryError, PermissionReport, PermissionState,
};

use super::OsType;

/// `AVMediaTypeVideo` / `AVMediaTypeAudio` four-char codes.
const MEDIA_VIDEO: &str = "vide";
const MEDIA_AUDIO: &str = "soun";

/// Permission gate for macOS, Windows and Linux hosts.
pub struct DesktopPermissionGate {
    os: OsType,
}

impl DesktopPermissionGate {
    #[must_use]
    pub const fn new(os: OsType) -> Self {
        Self { os }
    }

    fn state(&self, capability: Capability) -> Result<PermissionState, PermissionQueryError> {
        match capability {
            Capability::Camera => Ok(self.media_state(MEDIA_VIDEO)),
            Capability::Microphone => Ok(self.media_state(MEDIA_AUDIO)),
            Capability::Internet => Ok(PermissionState::Granted),
            Capability::Nfc | Capability::PhoneState | Capability::BluetoothConnect => {
                Err(PermissionQueryError::Unsupported(capability))
            }
        }
    }

    fn media_type(capability: Capability) -> Option<&'static str> {
        match capability {
            Capability::Camera => Some(MEDIA_VIDEO),
            Capability::Microphone => Some(MEDIA_AUDIO),
            _ => None,
        }
    }

    fn media_state(&self, media_type: &str) -> PermissionState {
        match self.os {
            OsType::MacOS => macos_media_state(media_type),
            OsType::Windows | OsType::Linux => PermissionState::Granted,
            OsType::Unknown => PermissionState::Unknown,
        }
    }
}

impl PermissionGate for DesktopPermissionGate {
    fn check(&self, capabilities: &[Capability]) -> Result<PermissionReport, PermissionQueryError> {
        capabilities
            .iter()
            .map(|cap| Ok((*cap, self.state(*cap)?)))
            .collect()
    }

    /// On macOS, prompts for each undetermined media device and blocks until
    /// the user answers. Other hosts have nothing to prompt for.
    fn request(
        &self,
        capabilities: &[Capability],
    ) -> Result<PermissionReport, PermissionQueryError> {
        if self.os == OsType::MacOS {
            for media_type in capabilities.iter().filter_map(|cap| Self::media_type(*cap)) {
                macos_prompt(media_type);
            }
        }
        self.check(capabilities)
    }
}

/// Map an `AVAuthorizationStatus` raw value.
const fn authorization_state(status: isize) -> PermissionState {
    match status {
        // Authorized
        3 => PermissionState::Granted,
        // Denied
        2 => PermissionState::Denied,
        // Restricted by device policy; the user cannot change it.
        1 => PermissionState::PermanentlyDenied,
        // NotDetermined
        _ => PermissionState::Unknown,
    }
}

/// Only `NotDetermined` can still be changed by a prompt.
#[cfg_attr(not(target_os = "macos"), allow(dead_code))]
const fn needs_prompt(status: isize) -> bool {
    status == 0
}

#[cfg(target_os = "macos")]
fn macos_prompt(media_type: &str) {
    let prompted = std::panic::catch_unwind(|| {
        if macos::authorization_status(media_type).is_some_and(needs_prompt) {
            macos::request_access(media_type)
        } else {
            None
        }
    });
    match prompted {
        Ok(Some(granted)) => tracing::info!(media_type, granted, "media access prompt answered"),
        Ok(None) => {}
        Err(_) => tracing::warn!(media_type, "AVCaptureDevice prompt panicked"),
    }
}

#[cfg(not(target_os = "macos"))]
const fn macos_prompt(_media_type: &str) {}

#[cfg(target_os = "macos")]
fn macos_media_state(media_type: &str) -> PermissionState {
    std::panic::catch_unwind(|| macos::authorization_status(media_type))
        .unwrap_or_else(|_| {
            tracing::warn!(media_type, "AVCaptureDevice query panicked, treating as unknown");
            None
        })
        .map_or(PermissionState::Unknown, authorization_state)
}

#[cfg(not(target_os = "macos"))]
const fn macos_media_state(_media_type: &str) -> PermissionState {
    PermissionState::Unknown
}

#[cfg(target_os = "macos")]
mod macos {
    use objc2_foundation::NSString;

    #[link(name = "AVFoundation", kind = "framework")]
    extern "C" {}

    /// Raw `AVAuthorizationStatus`, or `None` if AVFoundation is missing.
    pub fn authorization_status(media_type: &str) -> Option<isize> {
        let cls = objc2::runtime::AnyClass::get(c"AVCaptureDevice")?;
        let media = NSString::from_str(media_type);
        // SAFETY: `authorizationStatusForMediaType:` is a class method taking
        // an NSString and returning NSInteger.
        let status: isize =
            unsafe { objc2::msg_send![cls, authorizationStatusForMediaType: &*media] };
        Some(status)
    }

    /// Show the consent prompt and wait for the answer. `None` if
    /// AVFoundation is missing or the handler was never called.
    pub fn request_access(media_type: &str) -> Option<bool> {
        let cls = objc2::runtime::AnyClass::get(c"AVCaptureDevice")?;
        let media = NSString::from_str(media_type);
        let (tx, rx) = std::sync::mpsc::channel();
        let handler = block2::RcBlock::new(move |granted: objc2::runtime::Bool| {
            let _ = tx.send(granted.as_bool());
        });
        // SAFETY: `requestAccessForMediaType:completionHandler:` is a class
        // method taking an NSString and a `void (^)(BOOL)` block. The block
        // is copied by AVFoundation and called once on an arbitrary queue.
        let () = unsafe {
            objc2::msg_send![
                cls,
                requestAccessForMediaType: &*media,
                completionHandler: &*handler
            ]
        };
        rx.recv().ok()
    }
}
