use crate::types::{ColorSpace, FrameDuration};
use thiserror::Error;

/// Errors reported by a capture device backend
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeviceError {
    #[error("device is busy")]
    Busy,
    #[error("access to the device is not authorized")]
    Unauthorized,
    #[error("device configuration changed without holding the configuration lock")]
    NotLocked,
    #[error("format not supported by device: {0}")]
    UnsupportedFormat(String),
    #[error("color space {0} not supported by the active format")]
    UnsupportedColorSpace(ColorSpace),
    #[error("frame duration {0} outside the active format's range")]
    UnsupportedFrameDuration(FrameDuration),
    #[error("device backend error: {0}")]
    Backend(String),
}

/// Session Configurator failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("no compatible capture device available: {0}")]
    DeviceUnavailable(String),
}

/// Mode Negotiator / Mode Reverter failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModeError {
    #[error("no capture device is bound")]
    NoDevice,
    #[error("device has no format supporting the extended color space")]
    Unsupported,
    #[error("failed to lock device for configuration: {0}")]
    LockFailed(String),
    #[error("device rejected configuration: {0}")]
    Rejected(#[from] DeviceError),
}

/// Crate-level error
#[derive(Debug, Error)]
pub enum CameraError {
    #[error("Camera initialization error: {0}")]
    InitializationError(String),
    #[error("Configuration file error: {0}")]
    ConfigFileError(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Mode(#[from] ModeError),
    #[error(transparent)]
    Device(#[from] DeviceError),
}
