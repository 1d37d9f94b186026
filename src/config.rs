//! Configuration management for hdrcam
//!
//! Device discovery priorities, negotiation targets and session behavior,
//! loaded from and saved to TOML.

use crate::errors::CameraError;
use crate::types::{ColorSpace, DevicePosition, DeviceType, FrameDuration, PixelEncoding};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HdrCamConfig {
    pub discovery: DiscoveryConfig,
    pub negotiation: NegotiationConfig,
    pub session: SessionConfig,
}

/// Which device the Session Configurator binds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Device types in priority order, first match wins
    pub device_types: Vec<DeviceType>,
    /// Required position; `unspecified` accepts any
    pub position: DevicePosition,
}

/// Extended mode negotiation targets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NegotiationConfig {
    /// Color space the extended mode switches to
    pub extended_color_space: ColorSpace,
    /// Color space restored on deactivation
    pub standard_color_space: ColorSpace,
    /// Only formats with this pixel encoding are selected
    pub preferred_encoding: PixelEncoding,
    /// Fixed frame rate pinned while extended mode is active
    pub frame_rate: u32,
}

/// Capture session behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Turn off automatic wide-color selection before configuring the device
    pub disable_automatic_wide_color: bool,
    /// Simulated hardware spin-up/down time in milliseconds
    pub startup_delay_ms: u64,
}

impl NegotiationConfig {
    pub fn frame_duration(&self) -> FrameDuration {
        FrameDuration::from_fps(self.frame_rate)
    }
}

impl SessionConfig {
    pub fn startup_delay(&self) -> Duration {
        Duration::from_millis(self.startup_delay_ms)
    }
}

impl Default for HdrCamConfig {
    fn default() -> Self {
        Self {
            discovery: DiscoveryConfig {
                device_types: DeviceType::default_priority(),
                position: DevicePosition::Back,
            },
            negotiation: NegotiationConfig {
                extended_color_space: ColorSpace::AppleLog,
                standard_color_space: ColorSpace::Srgb,
                preferred_encoding: PixelEncoding::X422,
                frame_rate: 30,
            },
            session: SessionConfig {
                disable_automatic_wide_color: true,
                startup_delay_ms: 0,
            },
        }
    }
}

impl HdrCamConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, CameraError> {
        let path = path.as_ref();

        if !path.exists() {
            log::info!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path).map_err(|e| {
            CameraError::ConfigFileError(format!("Failed to read config file: {}", e))
        })?;

        let config: HdrCamConfig = toml::from_str(&contents).map_err(|e| {
            CameraError::ConfigFileError(format!("Failed to parse config file: {}", e))
        })?;

        config.validate().map_err(CameraError::ConfigFileError)?;

        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), CameraError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                CameraError::ConfigFileError(format!("Failed to create config directory: {}", e))
            })?;
        }

        let toml_string = toml::to_string_pretty(self).map_err(|e| {
            CameraError::ConfigFileError(format!("Failed to serialize config: {}", e))
        })?;

        fs::write(path, toml_string).map_err(|e| {
            CameraError::ConfigFileError(format!("Failed to write config file: {}", e))
        })?;

        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Get default config file path
    pub fn default_path() -> PathBuf {
        PathBuf::from("hdrcam.toml")
    }

    /// Load from default location or fall back to defaults
    pub fn load_or_default() -> Self {
        Self::load_from_file(Self::default_path()).unwrap_or_else(|e| {
            log::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        if self.discovery.device_types.is_empty() {
            return Err("Device priority list must not be empty".to_string());
        }
        if self.negotiation.frame_rate == 0 || self.negotiation.frame_rate > 240 {
            return Err("Frame rate must be between 1 and 240".to_string());
        }
        if self.negotiation.extended_color_space == self.negotiation.standard_color_space {
            return Err("Extended and standard color spaces must differ".to_string());
        }
        if self.session.startup_delay_ms > 10_000 {
            return Err("Startup delay must not exceed 10000 ms".to_string());
        }
        Ok(())
    }
}
