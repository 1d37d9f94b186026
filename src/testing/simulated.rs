//! In-memory capture devices and collaborators.

use crate::device::CaptureDevice;
use crate::discovery::DeviceRegistry;
use crate::errors::DeviceError;
use crate::permissions::{PermissionProvider, PermissionStatus};
use crate::testing::fixtures::standard_format;
use crate::types::{ColorSpace, DevicePosition, DeviceType, FormatDescriptor, FrameDuration};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

struct DeviceState {
    active_format: FormatDescriptor,
    active_color_space: ColorSpace,
    min_frame_duration: FrameDuration,
    max_frame_duration: FrameDuration,
    locked: bool,
    lock_error: Option<DeviceError>,
}

/// Simulated camera enforcing the same rules a real device does: mutation only
/// under the configuration lock, formats must come from the device's own list,
/// and the color space must be supported by the active format.
pub struct SimulatedDevice {
    id: String,
    name: String,
    device_type: DeviceType,
    position: DevicePosition,
    formats: Vec<FormatDescriptor>,
    input_error: Option<DeviceError>,
    state: Mutex<DeviceState>,
    input_opens: AtomicUsize,
    lock_acquisitions: AtomicUsize,
}

impl SimulatedDevice {
    pub fn builder(id: impl Into<String>) -> SimulatedDeviceBuilder {
        SimulatedDeviceBuilder::new(id)
    }

    fn state(&self) -> MutexGuard<'_, DeviceState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn is_locked(&self) -> bool {
        self.state().locked
    }

    /// Make subsequent configuration lock attempts fail (or succeed again with `None`)
    pub fn set_lock_error(&self, error: Option<DeviceError>) {
        self.state().lock_error = error;
    }

    /// Number of times the device was opened as a session input
    pub fn input_open_count(&self) -> usize {
        self.input_opens.load(Ordering::SeqCst)
    }

    pub fn lock_count(&self) -> usize {
        self.lock_acquisitions.load(Ordering::SeqCst)
    }

    fn ensure_locked(state: &DeviceState) -> Result<(), DeviceError> {
        if state.locked {
            Ok(())
        } else {
            Err(DeviceError::NotLocked)
        }
    }
}

impl CaptureDevice for SimulatedDevice {
    fn unique_id(&self) -> &str {
        &self.id
    }

    fn localized_name(&self) -> &str {
        &self.name
    }

    fn device_type(&self) -> DeviceType {
        self.device_type
    }

    fn position(&self) -> DevicePosition {
        self.position
    }

    fn formats(&self) -> &[FormatDescriptor] {
        &self.formats
    }

    fn active_format(&self) -> FormatDescriptor {
        self.state().active_format.clone()
    }

    fn active_color_space(&self) -> ColorSpace {
        self.state().active_color_space
    }

    fn active_min_frame_duration(&self) -> FrameDuration {
        self.state().min_frame_duration
    }

    fn active_max_frame_duration(&self) -> FrameDuration {
        self.state().max_frame_duration
    }

    fn lock_for_configuration(&self) -> Result<(), DeviceError> {
        let mut state = self.state();
        if let Some(error) = &state.lock_error {
            return Err(error.clone());
        }
        if state.locked {
            return Err(DeviceError::Busy);
        }
        state.locked = true;
        self.lock_acquisitions.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn unlock_for_configuration(&self) {
        self.state().locked = false;
    }

    fn set_active_format(&self, format: &FormatDescriptor) -> Result<(), DeviceError> {
        let mut state = self.state();
        Self::ensure_locked(&state)?;
        if !self.formats.contains(format) {
            return Err(DeviceError::UnsupportedFormat(format.to_string()));
        }
        state.active_format = format.clone();
        // Switching format drops a color space the new format cannot carry
        if !format.supports_color_space(state.active_color_space) {
            state.active_color_space = initial_color_space(format);
        }
        Ok(())
    }

    fn set_active_color_space(&self, color_space: ColorSpace) -> Result<(), DeviceError> {
        let mut state = self.state();
        Self::ensure_locked(&state)?;
        if !state.active_format.supports_color_space(color_space) {
            return Err(DeviceError::UnsupportedColorSpace(color_space));
        }
        state.active_color_space = color_space;
        Ok(())
    }

    fn set_active_frame_durations(
        &self,
        min: FrameDuration,
        max: FrameDuration,
    ) -> Result<(), DeviceError> {
        let mut state = self.state();
        Self::ensure_locked(&state)?;
        for duration in [min, max] {
            if !state.active_format.supports_frame_duration(duration) {
                return Err(DeviceError::UnsupportedFrameDuration(duration));
            }
        }
        state.min_frame_duration = min;
        state.max_frame_duration = max;
        Ok(())
    }

    fn open_input(&self) -> Result<(), DeviceError> {
        self.input_opens.fetch_add(1, Ordering::SeqCst);
        match &self.input_error {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

fn initial_color_space(format: &FormatDescriptor) -> ColorSpace {
    if format.supports_color_space(ColorSpace::Srgb) {
        ColorSpace::Srgb
    } else {
        format.color_spaces.first().copied().unwrap_or(ColorSpace::Srgb)
    }
}

pub struct SimulatedDeviceBuilder {
    id: String,
    name: Option<String>,
    device_type: DeviceType,
    position: DevicePosition,
    formats: Vec<FormatDescriptor>,
    active_index: usize,
    input_error: Option<DeviceError>,
    lock_error: Option<DeviceError>,
    min_frame_duration: FrameDuration,
    max_frame_duration: FrameDuration,
}

impl SimulatedDeviceBuilder {
    fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            device_type: DeviceType::WideAngleCamera,
            position: DevicePosition::Back,
            formats: Vec::new(),
            active_index: 0,
            input_error: None,
            lock_error: None,
            min_frame_duration: FrameDuration::from_fps(30),
            max_frame_duration: FrameDuration::from_fps(15),
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn device_type(mut self, device_type: DeviceType) -> Self {
        self.device_type = device_type;
        self
    }

    pub fn position(mut self, position: DevicePosition) -> Self {
        self.position = position;
        self
    }

    pub fn formats(mut self, formats: Vec<FormatDescriptor>) -> Self {
        self.formats = formats;
        self
    }

    /// Index into `formats` of the factory-default active format
    pub fn active_format_index(mut self, index: usize) -> Self {
        self.active_index = index;
        self
    }

    pub fn input_error(mut self, error: DeviceError) -> Self {
        self.input_error = Some(error);
        self
    }

    pub fn lock_error(mut self, error: DeviceError) -> Self {
        self.lock_error = Some(error);
        self
    }

    pub fn frame_durations(mut self, min: FrameDuration, max: FrameDuration) -> Self {
        self.min_frame_duration = min;
        self.max_frame_duration = max;
        self
    }

    pub fn build(self) -> SimulatedDevice {
        let formats = if self.formats.is_empty() {
            vec![standard_format()]
        } else {
            self.formats
        };
        let active_format = formats
            .get(self.active_index)
            .or_else(|| formats.first())
            .cloned()
            .unwrap_or_else(standard_format);
        let active_color_space = initial_color_space(&active_format);

        SimulatedDevice {
            name: self.name.unwrap_or_else(|| format!("Simulated Camera {}", self.id)),
            id: self.id,
            device_type: self.device_type,
            position: self.position,
            formats,
            input_error: self.input_error,
            state: Mutex::new(DeviceState {
                active_format,
                active_color_space,
                min_frame_duration: self.min_frame_duration,
                max_frame_duration: self.max_frame_duration,
                locked: false,
                lock_error: self.lock_error,
            }),
            input_opens: AtomicUsize::new(0),
            lock_acquisitions: AtomicUsize::new(0),
        }
    }

    pub fn build_arc(self) -> Arc<SimulatedDevice> {
        Arc::new(self.build())
    }
}

/// Registry owning a fixed set of simulated devices
#[derive(Default)]
pub struct SimulatedRegistry {
    devices: Vec<Arc<SimulatedDevice>>,
}

impl SimulatedRegistry {
    pub fn new(devices: Vec<Arc<SimulatedDevice>>) -> Self {
        Self { devices }
    }

    pub fn single(device: Arc<SimulatedDevice>) -> Self {
        Self::new(vec![device])
    }

    pub fn device(&self, id: &str) -> Option<Arc<SimulatedDevice>> {
        self.devices.iter().find(|d| d.unique_id() == id).cloned()
    }
}

impl DeviceRegistry for SimulatedRegistry {
    fn devices(&self) -> Vec<Arc<dyn CaptureDevice>> {
        self.devices
            .iter()
            .map(|d| Arc::clone(d) as Arc<dyn CaptureDevice>)
            .collect()
    }
}

/// Scripted permission collaborator
pub struct StaticPermissions {
    status: Mutex<PermissionStatus>,
    grant_on_request: bool,
    requests: AtomicUsize,
}

impl StaticPermissions {
    pub fn new(status: PermissionStatus) -> Self {
        Self {
            status: Mutex::new(status),
            grant_on_request: false,
            requests: AtomicUsize::new(0),
        }
    }

    pub fn authorized() -> Self {
        Self::new(PermissionStatus::Authorized)
    }

    pub fn denied() -> Self {
        Self::new(PermissionStatus::Denied)
    }

    /// Not yet determined; the prompt answers with `grant`
    pub fn prompting(grant: bool) -> Self {
        Self {
            grant_on_request: grant,
            ..Self::new(PermissionStatus::NotDetermined)
        }
    }

    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

impl PermissionProvider for StaticPermissions {
    fn current_authorization(&self) -> PermissionStatus {
        *self.status.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn request_authorization(&self) -> bool {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let mut status = self.status.lock().unwrap_or_else(|e| e.into_inner());
        if *status == PermissionStatus::NotDetermined {
            *status = if self.grant_on_request {
                PermissionStatus::Authorized
            } else {
                PermissionStatus::Denied
            };
        }
        *status == PermissionStatus::Authorized
    }
}
