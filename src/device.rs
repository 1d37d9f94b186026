//! Capture device abstraction.
//!
//! A [`CaptureDevice`] is owned by a device registry (the platform, or a
//! simulated one in tests). All mutation goes through a [`ConfigurationLock`],
//! which releases the device's configuration lock when dropped.

use crate::errors::DeviceError;
use crate::types::{
    ColorSpace, DevicePosition, DeviceSummary, DeviceType, FormatDescriptor, FrameDuration,
};
use std::fmt;
use std::sync::Arc;

/// A physical camera unit.
///
/// Setters are only valid between [`CaptureDevice::lock_for_configuration`] and
/// [`CaptureDevice::unlock_for_configuration`]; use [`ConfigurationLock`] rather
/// than calling them directly.
pub trait CaptureDevice: Send + Sync {
    fn unique_id(&self) -> &str;

    fn localized_name(&self) -> &str;

    fn device_type(&self) -> DeviceType;

    fn position(&self) -> DevicePosition;

    /// Every format the device can be configured with. Fixed for the device's lifetime.
    fn formats(&self) -> &[FormatDescriptor];

    fn active_format(&self) -> FormatDescriptor;

    fn active_color_space(&self) -> ColorSpace;

    fn active_min_frame_duration(&self) -> FrameDuration;

    fn active_max_frame_duration(&self) -> FrameDuration;

    /// Take the device's exclusive configuration lock. Fails with
    /// [`DeviceError::Busy`] if another holder has it.
    fn lock_for_configuration(&self) -> Result<(), DeviceError>;

    fn unlock_for_configuration(&self);

    fn set_active_format(&self, format: &FormatDescriptor) -> Result<(), DeviceError>;

    fn set_active_color_space(&self, color_space: ColorSpace) -> Result<(), DeviceError>;

    fn set_active_frame_durations(
        &self,
        min: FrameDuration,
        max: FrameDuration,
    ) -> Result<(), DeviceError>;

    /// Open the device as a session input. Fails when the device is busy
    /// elsewhere or access is not authorized.
    fn open_input(&self) -> Result<(), DeviceError>;

    fn summary(&self) -> DeviceSummary {
        DeviceSummary {
            id: self.unique_id().to_string(),
            name: self.localized_name().to_string(),
            device_type: self.device_type(),
            position: self.position(),
            active_format: self.active_format(),
            active_color_space: self.active_color_space(),
            format_count: self.formats().len(),
        }
    }
}

impl fmt::Debug for dyn CaptureDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaptureDevice")
            .field("id", &self.unique_id())
            .field("type", &self.device_type())
            .field("position", &self.position())
            .finish()
    }
}

/// Scoped exclusive configuration window on a device.
///
/// The lock is released on drop, including early returns and `?` exits.
pub struct ConfigurationLock<'a> {
    device: &'a dyn CaptureDevice,
}

impl<'a> ConfigurationLock<'a> {
    pub fn acquire(device: &'a dyn CaptureDevice) -> Result<Self, DeviceError> {
        device.lock_for_configuration()?;
        log::debug!("Locked {} for configuration", device.unique_id());
        Ok(Self { device })
    }

    pub fn set_active_format(&self, format: &FormatDescriptor) -> Result<(), DeviceError> {
        self.device.set_active_format(format)
    }

    pub fn set_active_color_space(&self, color_space: ColorSpace) -> Result<(), DeviceError> {
        self.device.set_active_color_space(color_space)
    }

    pub fn set_active_frame_durations(
        &self,
        min: FrameDuration,
        max: FrameDuration,
    ) -> Result<(), DeviceError> {
        self.device.set_active_frame_durations(min, max)
    }
}

impl Drop for ConfigurationLock<'_> {
    fn drop(&mut self) {
        self.device.unlock_for_configuration();
        log::debug!("Unlocked {}", self.device.unique_id());
    }
}

/// A device opened as a capture session input
#[derive(Clone)]
pub struct DeviceInput {
    device: Arc<dyn CaptureDevice>,
}

impl DeviceInput {
    pub fn new(device: &Arc<dyn CaptureDevice>) -> Result<Self, DeviceError> {
        device.open_input()?;
        Ok(Self {
            device: Arc::clone(device),
        })
    }

    pub fn device(&self) -> &Arc<dyn CaptureDevice> {
        &self.device
    }
}

impl fmt::Debug for DeviceInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceInput")
            .field("device", &self.device.unique_id())
            .finish()
    }
}
