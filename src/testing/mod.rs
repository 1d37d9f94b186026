//! Testing utilities for hdrcam
//!
//! Simulated devices, registries and permission collaborators so the
//! controller and presentation model can be exercised without hardware.

pub mod fixtures;
pub mod simulated;

pub use fixtures::{hlg_format, log_format, log_format_with_encoding, standard_format};
pub use simulated::{
    SimulatedDevice, SimulatedDeviceBuilder, SimulatedRegistry, StaticPermissions,
};
