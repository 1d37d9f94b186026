use crate::device::CaptureDevice;
use crate::discovery::DeviceRegistry;
use crate::errors::{CameraError, DeviceError};
use crate::permissions::check_permission;
use crate::types::{
    ColorSpace, DevicePosition, DeviceType, FormatDescriptor, FrameDuration, FrameRateRange,
    PixelEncoding,
};
use nokhwa::{
    pixel_format::RgbFormat,
    query,
    utils::{ApiBackend, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType},
    Camera,
};
use std::sync::{Arc, Mutex, MutexGuard};

struct NativeState {
    active_format: FormatDescriptor,
    active_color_space: ColorSpace,
    min_frame_duration: FrameDuration,
    max_frame_duration: FrameDuration,
    locked: bool,
}

/// A host camera as reported by nokhwa.
///
/// Generic capture backends expose no color-space control, so every format
/// carries only sRGB and extended mode reports as unsupported. Format and
/// frame-rate choices are recorded for the stream that opens the device.
pub struct NativeDevice {
    index: CameraIndex,
    id: String,
    name: String,
    formats: Vec<FormatDescriptor>,
    state: Mutex<NativeState>,
}

impl NativeDevice {
    fn new(index: CameraIndex, name: String) -> Self {
        let formats = probe_formats(&index);
        let active_format = formats.first().cloned().unwrap_or_else(|| {
            FormatDescriptor::new(PixelEncoding::YUYV, 640, 480)
        });

        Self {
            id: index.to_string(),
            index,
            name,
            formats,
            state: Mutex::new(NativeState {
                active_format,
                active_color_space: ColorSpace::Srgb,
                min_frame_duration: FrameDuration::from_fps(30),
                max_frame_duration: FrameDuration::from_fps(30),
                locked: false,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, NativeState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn open_camera(&self) -> Result<Camera, DeviceError> {
        let requested = RequestedFormat::new::<RgbFormat>(RequestedFormatType::None);
        Camera::new(self.index.clone(), requested)
            .map_err(|e| DeviceError::Backend(format!("Failed to open camera: {}", e)))
    }
}

fn encoding_for(frame_format: FrameFormat) -> PixelEncoding {
    match frame_format {
        FrameFormat::MJPEG => PixelEncoding::MJPG,
        FrameFormat::YUYV => PixelEncoding::YUYV,
        FrameFormat::NV12 => PixelEncoding::NV12,
        FrameFormat::GRAY => PixelEncoding::new(b"GREY"),
        _ => PixelEncoding::new(b"RGB3"),
    }
}

fn fallback_formats() -> Vec<FormatDescriptor> {
    [
        (PixelEncoding::YUYV, 1920, 1080, 30.0),
        (PixelEncoding::YUYV, 1280, 720, 30.0),
        (PixelEncoding::YUYV, 640, 480, 30.0),
        (PixelEncoding::MJPG, 1920, 1080, 30.0),
        (PixelEncoding::MJPG, 1280, 720, 30.0),
    ]
    .into_iter()
    .map(|(encoding, width, height, fps)| {
        FormatDescriptor::new(encoding, width, height)
            .with_frame_rate_ranges(vec![FrameRateRange::new(1.0, fps)])
    })
    .collect()
}

fn probe_formats(index: &CameraIndex) -> Vec<FormatDescriptor> {
    let requested = RequestedFormat::new::<RgbFormat>(RequestedFormatType::None);
    let probed = Camera::new(index.clone(), requested).and_then(|mut camera| {
        camera.compatible_camera_formats()
    });

    match probed {
        Ok(formats) if !formats.is_empty() => formats
            .into_iter()
            .map(|f| {
                let resolution = f.resolution();
                FormatDescriptor::new(
                    encoding_for(f.format()),
                    resolution.width_x,
                    resolution.height_y,
                )
                .with_frame_rate_ranges(vec![FrameRateRange::new(
                    1.0,
                    f64::from(f.frame_rate()),
                )])
            })
            .collect(),
        Ok(_) => fallback_formats(),
        Err(e) => {
            log::warn!("Could not probe formats of camera {}: {}", index, e);
            fallback_formats()
        }
    }
}

impl CaptureDevice for NativeDevice {
    fn unique_id(&self) -> &str {
        &self.id
    }

    fn localized_name(&self) -> &str {
        &self.name
    }

    fn device_type(&self) -> DeviceType {
        DeviceType::External
    }

    fn position(&self) -> DevicePosition {
        DevicePosition::Unspecified
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
        if state.locked {
            return Err(DeviceError::Busy);
        }
        state.locked = true;
        Ok(())
    }

    fn unlock_for_configuration(&self) {
        self.state().locked = false;
    }

    fn set_active_format(&self, format: &FormatDescriptor) -> Result<(), DeviceError> {
        let mut state = self.state();
        if !state.locked {
            return Err(DeviceError::NotLocked);
        }
        if !self.formats.contains(format) {
            return Err(DeviceError::UnsupportedFormat(format.to_string()));
        }
        state.active_format = format.clone();
        Ok(())
    }

    fn set_active_color_space(&self, color_space: ColorSpace) -> Result<(), DeviceError> {
        let mut state = self.state();
        if !state.locked {
            return Err(DeviceError::NotLocked);
        }
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
        if !state.locked {
            return Err(DeviceError::NotLocked);
        }
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
        let status = check_permission();
        if status.is_terminal_denial() {
            log::warn!("Camera {} not accessible: authorization {}", self.id, status);
            return Err(DeviceError::Unauthorized);
        }
        // Opening and dropping the camera proves it is neither busy nor blocked
        self.open_camera().map(|_| ()).map_err(|e| {
            log::warn!("Camera {} unavailable: {}", self.id, e);
            DeviceError::Busy
        })
    }
}

/// Cameras visible to nokhwa's native backend
pub struct NativeRegistry {
    devices: Vec<Arc<NativeDevice>>,
}

impl NativeRegistry {
    pub fn query() -> Result<Self, CameraError> {
        let cameras = query(ApiBackend::Auto).map_err(|e| {
            CameraError::InitializationError(format!("Failed to query cameras: {}", e))
        })?;

        let devices: Vec<_> = cameras
            .into_iter()
            .map(|info| Arc::new(NativeDevice::new(info.index().clone(), info.human_name())))
            .collect();

        log::info!("Found {} cameras", devices.len());
        Ok(Self { devices })
    }
}

impl DeviceRegistry for NativeRegistry {
    fn devices(&self) -> Vec<Arc<dyn CaptureDevice>> {
        self.devices
            .iter()
            .map(|d| Arc::clone(d) as Arc<dyn CaptureDevice>)
            .collect()
    }
}
