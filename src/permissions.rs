/// Camera authorization status
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum PermissionStatus {
    /// Access authorized
    Authorized,
    /// Access denied by the user
    Denied,
    /// User hasn't been asked yet
    NotDetermined,
    /// Access restricted by system policy (parental controls, MDM)
    Restricted,
}

impl PermissionStatus {
    /// Denied and restricted both stay terminal until the user changes system settings
    pub fn is_terminal_denial(&self) -> bool {
        matches!(self, PermissionStatus::Denied | PermissionStatus::Restricted)
    }
}

impl std::fmt::Display for PermissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PermissionStatus::Authorized => write!(f, "authorized"),
            PermissionStatus::Denied => write!(f, "denied"),
            PermissionStatus::NotDetermined => write!(f, "not_determined"),
            PermissionStatus::Restricted => write!(f, "restricted"),
        }
    }
}

/// Source of camera authorization decisions
pub trait PermissionProvider: Send + Sync {
    fn current_authorization(&self) -> PermissionStatus;

    /// Prompt the user if the status is not determined. Returns whether access
    /// is authorized afterwards.
    fn request_authorization(&self) -> bool;
}

/// Detailed permission information
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PermissionInfo {
    pub status: PermissionStatus,
    pub message: String,
    pub can_request: bool,
}

/// Host operating system permission checks
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemPermissions;

impl PermissionProvider for SystemPermissions {
    fn current_authorization(&self) -> PermissionStatus {
        check_permission()
    }

    fn request_authorization(&self) -> bool {
        let info = check_permission_detailed();
        if info.status == PermissionStatus::Authorized {
            return true;
        }
        if !info.can_request {
            log::warn!("Cannot request camera permission: {}", info.message);
            return false;
        }
        request_permission()
    }
}

/// Check camera permission status for the current platform
pub fn check_permission() -> PermissionStatus {
    check_permission_detailed().status
}

/// Check camera permission status with detailed information
pub fn check_permission_detailed() -> PermissionInfo {
    #[cfg(target_os = "macos")]
    {
        check_permission_macos()
    }

    #[cfg(target_os = "linux")]
    {
        check_permission_linux()
    }

    #[cfg(not(any(target_os = "macos", target_os = "linux")))]
    {
        PermissionInfo {
            status: PermissionStatus::NotDetermined,
            message: "Platform not supported".to_string(),
            can_request: false,
        }
    }
}

#[cfg(target_os = "macos")]
fn av_media_type_video() -> *mut objc::runtime::Object {
    use objc::runtime::{Class, Object};
    use objc::{msg_send, sel, sel_impl};

    // "vide" is AVMediaTypeVideo's four-character code
    let media_type = b"vide\0";
    match Class::get("NSString") {
        Some(ns_string) => unsafe {
            let value: *mut Object =
                msg_send![ns_string, stringWithUTF8String: media_type.as_ptr()];
            value
        },
        None => std::ptr::null_mut(),
    }
}

#[cfg(target_os = "macos")]
fn check_permission_macos() -> PermissionInfo {
    use objc::runtime::Class;
    use objc::{msg_send, sel, sel_impl};

    let Some(av_capture_device_class) = Class::get("AVCaptureDevice") else {
        return PermissionInfo {
            status: PermissionStatus::NotDetermined,
            message: "AVFoundation not available".to_string(),
            can_request: false,
        };
    };

    let media_type = av_media_type_video();
    // AVAuthorizationStatus: 0 NotDetermined, 1 Restricted, 2 Denied, 3 Authorized
    let auth_status: i64 =
        unsafe { msg_send![av_capture_device_class, authorizationStatusForMediaType: media_type] };

    match auth_status {
        3 => PermissionInfo {
            status: PermissionStatus::Authorized,
            message: "Camera access authorized".to_string(),
            can_request: false,
        },
        2 => PermissionInfo {
            status: PermissionStatus::Denied,
            message: "Camera access denied - enable in System Settings > Privacy & Security > Camera".to_string(),
            can_request: false,
        },
        1 => PermissionInfo {
            status: PermissionStatus::Restricted,
            message: "Camera access restricted by system policy".to_string(),
            can_request: false,
        },
        _ => PermissionInfo {
            status: PermissionStatus::NotDetermined,
            message: "Camera permission not yet requested".to_string(),
            can_request: true,
        },
    }
}

#[cfg(target_os = "macos")]
fn request_permission() -> bool {
    use block::ConcreteBlock;
    use objc::runtime::Class;
    use objc::{msg_send, sel, sel_impl};
    use std::sync::mpsc;
    use std::time::Duration;

    let Some(av_capture_device_class) = Class::get("AVCaptureDevice") else {
        log::error!("AVFoundation not available");
        return false;
    };
    let media_type = av_media_type_video();

    let (tx, rx) = mpsc::channel();
    let handler = ConcreteBlock::new(move |granted: bool| {
        let _ = tx.send(granted);
    });
    // Heap copy so the block outlives this frame
    let handler = handler.copy();

    log::info!("Requesting macOS camera permission");
    unsafe {
        let _: () = msg_send![av_capture_device_class, requestAccessForMediaType: media_type completionHandler: &*handler];
    }

    match rx.recv_timeout(Duration::from_secs(60)) {
        Ok(granted) => {
            if granted {
                log::info!("Camera permission granted");
            } else {
                log::warn!("Camera permission denied");
            }
            granted
        }
        Err(_) => {
            log::error!("Permission request timed out");
            false
        }
    }
}

#[cfg(target_os = "linux")]
fn check_permission_linux() -> PermissionInfo {
    use std::fs;
    use std::path::Path;

    let video_devices: Vec<_> = (0..10)
        .map(|i| format!("/dev/video{}", i))
        .filter(|path| Path::new(path).exists())
        .collect();

    let Some(first_device) = video_devices.first() else {
        return PermissionInfo {
            status: PermissionStatus::NotDetermined,
            message: "No video devices found at /dev/video*".to_string(),
            can_request: false,
        };
    };

    match fs::metadata(first_device) {
        Ok(_) if check_linux_group_membership() => PermissionInfo {
            status: PermissionStatus::Authorized,
            message: format!(
                "Camera access granted (user in video group, {} found)",
                first_device
            ),
            can_request: false,
        },
        Ok(_) => PermissionInfo {
            status: PermissionStatus::Denied,
            message: format!(
                "Camera device {} exists but user not in video group - run: sudo usermod -a -G video $USER",
                first_device
            ),
            can_request: false,
        },
        Err(e) => PermissionInfo {
            status: PermissionStatus::Denied,
            message: format!("Cannot access {}: {}", first_device, e),
            can_request: false,
        },
    }
}

#[cfg(target_os = "linux")]
fn check_linux_group_membership() -> bool {
    use std::process::Command;

    let output = Command::new("groups").output().ok();

    if let Some(output) = output {
        if let Ok(groups) = String::from_utf8(output.stdout) {
            return has_camera_group(&groups);
        }
    }

    false
}

/// Whether a `groups` listing names a group with camera device access
#[cfg(any(target_os = "linux", test))]
fn has_camera_group(groups: &str) -> bool {
    groups
        .split_whitespace()
        .any(|group| group == "video" || group == "plugdev")
}

// Group membership cannot be granted from inside the process
#[cfg(not(target_os = "macos"))]
fn request_permission() -> bool {
    log::warn!("Camera permission cannot be requested programmatically on this platform");
    false
}
