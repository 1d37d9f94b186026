//! Device discovery.
//!
//! The priority order of device types is data handed to a [`DiscoveryQuery`];
//! the first device matching the highest-ranked type wins.

use crate::device::CaptureDevice;
use crate::types::{DevicePosition, DeviceType};
use std::sync::Arc;

/// Owner of the capture devices present on the system
pub trait DeviceRegistry: Send + Sync {
    fn devices(&self) -> Vec<Arc<dyn CaptureDevice>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryQuery {
    pub device_types: Vec<DeviceType>,
    pub position: DevicePosition,
}

impl DiscoveryQuery {
    pub fn new(device_types: Vec<DeviceType>, position: DevicePosition) -> Self {
        Self {
            device_types,
            position,
        }
    }

    // Devices that cannot report a position (external cameras) are never excluded
    fn matches_position(&self, device: &dyn CaptureDevice) -> bool {
        self.position == DevicePosition::Unspecified
            || device.position() == DevicePosition::Unspecified
            || device.position() == self.position
    }

    /// Matching devices, ordered by the rank of their type in `device_types`
    pub fn devices(&self, registry: &dyn DeviceRegistry) -> Vec<Arc<dyn CaptureDevice>> {
        let available = registry.devices();
        self.device_types
            .iter()
            .flat_map(|device_type| {
                available
                    .iter()
                    .filter(|d| d.device_type() == *device_type && self.matches_position(&***d))
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    pub fn best_device(&self, registry: &dyn DeviceRegistry) -> Option<Arc<dyn CaptureDevice>> {
        let device = self.devices(registry).into_iter().next();
        match &device {
            Some(d) => log::info!(
                "Discovered {} ({:?}, {:?})",
                d.localized_name(),
                d.device_type(),
                d.position()
            ),
            None => log::warn!(
                "No {:?} device matching {:?}",
                self.position,
                self.device_types
            ),
        }
        device
    }
}

impl Default for DiscoveryQuery {
    fn default() -> Self {
        Self::new(DeviceType::default_priority(), DevicePosition::Back)
    }
}
