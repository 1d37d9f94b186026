//! hdrcam: extended color-space capture mode negotiation
//!
//! Binds a camera to a live capture session and switches it between its
//! factory-default format and an extended (log) color space while the
//! preview keeps running.
//!
//! # Features
//! - Priority-ordered device discovery
//! - Transactional format and color-space negotiation with scoped device locks
//! - Revert to the factory-default configuration on demand
//! - Non-blocking session start/stop
//! - Presentation model with permission handling for UI layers
//! - Optional host camera enumeration (`native`) and Tauri plugin (`plugin`)
//!
//! # Usage
//! ```rust
//! use std::sync::Arc;
//! use hdrcam::testing::{log_format, standard_format, SimulatedDevice, SimulatedRegistry};
//! use hdrcam::{HdrCamConfig, ModeController};
//!
//! let device = SimulatedDevice::builder("back")
//!     .formats(vec![standard_format(), log_format()])
//!     .build_arc();
//! let registry = Arc::new(SimulatedRegistry::single(device));
//!
//! let mut controller = ModeController::new(HdrCamConfig::default(), registry);
//! controller.configure_once().unwrap();
//! controller.activate_extended_mode().unwrap();
//! assert!(controller.is_extended_mode_active());
//! controller.deactivate_extended_mode().unwrap();
//! ```
pub mod config;
pub mod controller;
pub mod device;
pub mod discovery;
pub mod errors;
pub mod invariants;
pub mod permissions;
pub mod presentation;
pub mod session;
pub mod testing;
pub mod types;

#[cfg(feature = "native")]
pub mod platform;

#[cfg(feature = "plugin")]
pub mod commands;

pub use config::HdrCamConfig;
pub use controller::{ModeController, NegotiationState, PreviewState};
pub use device::{CaptureDevice, ConfigurationLock, DeviceInput};
pub use discovery::{DeviceRegistry, DiscoveryQuery};
pub use errors::{CameraError, ConfigError, DeviceError, ModeError};
pub use permissions::{PermissionProvider, PermissionStatus, SystemPermissions};
pub use presentation::{AlertState, PreviewModel, PreviewSnapshot};
pub use session::CaptureSession;
pub use types::{
    ColorSpace, DevicePosition, DeviceType, FormatDescriptor, FrameDuration, FrameRateRange,
    PixelEncoding,
};

/// Initialize the hdrcam plugin with all commands
#[cfg(feature = "plugin")]
pub fn init<R: tauri::Runtime>() -> tauri::plugin::TauriPlugin<R> {
    tauri::plugin::Builder::new("hdrcam")
        .invoke_handler(tauri::generate_handler![
            commands::preview::initialize_preview,
            commands::preview::get_preview_state,
            commands::preview::toggle_extended_mode,
            commands::preview::acknowledge_denied,
            commands::preview::start_preview,
            commands::preview::stop_preview,
        ])
        .build()
}

/// Initialize logging for hdrcam
pub fn init_logging() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "hdrcam=info");
    }
    let _ = env_logger::try_init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Get crate information
pub fn get_info() -> CrateInfo {
    CrateInfo {
        name: NAME.to_string(),
        version: VERSION.to_string(),
        description: DESCRIPTION.to_string(),
    }
}

/// Crate information structure
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CrateInfo {
    pub name: String,
    pub version: String,
    pub description: String,
}
