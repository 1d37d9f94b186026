//! Capture device mode controller.
//!
//! Binds a discovered device to the capture session once, then switches it
//! between its factory-default configuration and the extended color space
//! while the session keeps running. Each switch is a scoped
//! [`ConfigurationLock`] transaction on the device.

use crate::assert_invariant;
use crate::config::HdrCamConfig;
use crate::device::{CaptureDevice, ConfigurationLock, DeviceInput};
use crate::discovery::{DeviceRegistry, DiscoveryQuery};
use crate::errors::{ConfigError, ModeError};
use crate::invariants::{
    BOUND_DEVICE_HAS_DEFAULT, DEFAULT_FORMAT_CAPTURED_ONCE, EXTENDED_FLAG_MATCHES_DEVICE,
};
use crate::session::CaptureSession;
use crate::types::{ColorSpace, FormatDescriptor, PixelEncoding};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Weak};
use std::thread::JoinHandle;

/// Controller-owned negotiation state
#[derive(Debug, Default)]
pub struct NegotiationState {
    bound_device: Option<Weak<dyn CaptureDevice>>,
    default_format: Option<FormatDescriptor>,
    extended_mode_active: bool,
    session_configured: bool,
}

impl NegotiationState {
    /// Active format of the device when it was bound
    pub fn default_format(&self) -> Option<&FormatDescriptor> {
        self.default_format.as_ref()
    }

    pub fn is_extended_mode_active(&self) -> bool {
        self.extended_mode_active
    }

    pub fn is_session_configured(&self) -> bool {
        self.session_configured
    }

    pub fn has_bound_device(&self) -> bool {
        self.bound_device.is_some()
    }
}

/// Observable lifecycle of the preview
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PreviewState {
    Idle,
    RunningDefault,
    RunningExtended,
}

/// First format supporting `color_space` whose encoding is `encoding`.
///
/// No fallback to other encodings: a device offering the color space only in
/// other encodings yields `None`.
pub fn select_extended_format(
    formats: &[FormatDescriptor],
    color_space: ColorSpace,
    encoding: PixelEncoding,
) -> Option<&FormatDescriptor> {
    formats
        .iter()
        .filter(|f| f.supports_color_space(color_space))
        .find(|f| f.encoding == encoding)
}

pub struct ModeController {
    config: HdrCamConfig,
    registry: Arc<dyn DeviceRegistry>,
    session: Arc<CaptureSession>,
    state: NegotiationState,
}

impl ModeController {
    pub fn new(config: HdrCamConfig, registry: Arc<dyn DeviceRegistry>) -> Self {
        let session = Arc::new(CaptureSession::with_startup_delay(
            config.session.startup_delay(),
        ));
        Self::with_session(config, registry, session)
    }

    pub fn with_session(
        config: HdrCamConfig,
        registry: Arc<dyn DeviceRegistry>,
        session: Arc<CaptureSession>,
    ) -> Self {
        Self {
            config,
            registry,
            session,
            state: NegotiationState::default(),
        }
    }

    pub fn config(&self) -> &HdrCamConfig {
        &self.config
    }

    pub fn session(&self) -> &Arc<CaptureSession> {
        &self.session
    }

    pub fn state(&self) -> &NegotiationState {
        &self.state
    }

    /// The bound device, if it is still present in its registry
    pub fn bound_device(&self) -> Option<Arc<dyn CaptureDevice>> {
        self.state.bound_device.as_ref().and_then(Weak::upgrade)
    }

    pub fn is_extended_mode_active(&self) -> bool {
        self.state.extended_mode_active
    }

    /// Whether the bound device offers any format carrying the extended color space
    pub fn supports_extended_mode(&self) -> bool {
        let extended = self.config.negotiation.extended_color_space;
        self.bound_device().is_some_and(|device| {
            device
                .formats()
                .iter()
                .any(|f| f.supports_color_space(extended))
        })
    }

    pub fn preview_state(&self) -> PreviewState {
        if !self.session.is_running() {
            PreviewState::Idle
        } else if self.state.extended_mode_active {
            PreviewState::RunningExtended
        } else {
            PreviewState::RunningDefault
        }
    }

    /// Discover the best device and bind it as the session's video input.
    ///
    /// Runs at most once per controller; later calls return `Ok(())` without
    /// touching the session. A failure leaves the controller unconfigured so
    /// the call can be retried.
    pub fn configure_once(&mut self) -> Result<(), ConfigError> {
        if self.state.session_configured {
            log::debug!("Session {} already configured", self.session.id());
            return Ok(());
        }

        let query = DiscoveryQuery::new(
            self.config.discovery.device_types.clone(),
            self.config.discovery.position,
        );

        let mut transaction = self.session.begin_configuration();
        if self.config.session.disable_automatic_wide_color {
            transaction.set_automatically_configures_wide_color(false);
        }

        let device = query
            .best_device(self.registry.as_ref())
            .ok_or_else(|| {
                ConfigError::DeviceUnavailable(format!(
                    "no {:?} device among {:?}",
                    query.position, query.device_types
                ))
            })?;

        let input = DeviceInput::new(&device).map_err(|e| {
            log::error!("Failed to open {} as input: {}", device.unique_id(), e);
            ConfigError::DeviceUnavailable(format!("{}: {}", device.unique_id(), e))
        })?;

        if !transaction.add_input(input) {
            return Err(ConfigError::DeviceUnavailable(format!(
                "session rejected input {}",
                device.unique_id()
            )));
        }

        assert_invariant!(
            self.state.default_format.is_none(),
            DEFAULT_FORMAT_CAPTURED_ONCE,
            "configure_once"
        );
        self.state.default_format = Some(device.active_format());
        self.state.bound_device = Some(Arc::downgrade(&device));
        self.state.session_configured = true;
        drop(transaction);

        log::info!(
            "Bound {} with default format {}",
            device.localized_name(),
            device.active_format()
        );
        Ok(())
    }

    /// Switch the bound device to the extended color space.
    ///
    /// Returns `Ok(())` even when no format or color space change was
    /// possible, or the frame rate could not be pinned;
    /// [`Self::is_extended_mode_active`] reports whether the color space was
    /// actually applied.
    pub fn activate_extended_mode(&mut self) -> Result<(), ModeError> {
        let device = self.bound_device().ok_or(ModeError::NoDevice)?;
        let negotiation = &self.config.negotiation;
        let extended = negotiation.extended_color_space;

        if !device
            .formats()
            .iter()
            .any(|f| f.supports_color_space(extended))
        {
            log::warn!("{} has no format supporting {}", device.localized_name(), extended);
            return Err(ModeError::Unsupported);
        }

        let lock = ConfigurationLock::acquire(&*device).map_err(|e| {
            log::warn!("Could not lock {}: {}", device.unique_id(), e);
            ModeError::LockFailed(e.to_string())
        })?;

        match select_extended_format(device.formats(), extended, negotiation.preferred_encoding) {
            Some(format) => {
                log::info!("Selected {} for {}", format, extended);
                lock.set_active_format(format)?;
            }
            None => log::warn!(
                "No {} format supports {}, keeping {}",
                negotiation.preferred_encoding,
                extended,
                device.active_format()
            ),
        }

        // Checked against whatever format is active now, which may not be the selected one
        let applied = device.active_format().supports_color_space(extended);
        if applied {
            lock.set_active_color_space(extended)?;
        } else {
            log::warn!("Active format {} cannot carry {}", device.active_format(), extended);
        }
        self.state.extended_mode_active = applied;
        assert_invariant!(
            !applied || device.active_color_space() == extended,
            EXTENDED_FLAG_MATCHES_DEVICE,
            "activate_extended_mode"
        );

        // A rejected pin leaves the device's own frame rate; the mode change stands
        let duration = negotiation.frame_duration();
        if let Err(e) = lock.set_active_frame_durations(duration, duration) {
            log::warn!(
                "{} kept its frame rate, {} fps rejected: {}",
                device.unique_id(),
                negotiation.frame_rate,
                e
            );
        }

        log::info!(
            "Extended mode {} on {} ({} fps)",
            if applied { "active" } else { "not applied" },
            device.unique_id(),
            negotiation.frame_rate
        );
        Ok(())
    }

    /// Restore the default format and the standard color space.
    ///
    /// Frame durations pinned by activation are left as they are.
    pub fn deactivate_extended_mode(&mut self) -> Result<(), ModeError> {
        let device = self.bound_device().ok_or(ModeError::NoDevice)?;
        assert_invariant!(
            self.state.default_format.is_some(),
            BOUND_DEVICE_HAS_DEFAULT,
            "deactivate_extended_mode"
        );

        let lock = ConfigurationLock::acquire(&*device).map_err(|e| {
            log::warn!("Could not lock {}: {}", device.unique_id(), e);
            ModeError::LockFailed(e.to_string())
        })?;

        if let Some(default_format) = &self.state.default_format {
            lock.set_active_format(default_format)?;
        }
        lock.set_active_color_space(self.config.negotiation.standard_color_space)?;
        self.state.extended_mode_active = false;

        log::info!(
            "Restored {} on {}",
            self.config.negotiation.standard_color_space,
            device.unique_id()
        );
        Ok(())
    }

    /// Start the session in the background. `None` if it is already running.
    pub fn start(&self) -> Option<JoinHandle<()>> {
        if self.session.is_running() {
            log::debug!("Session {} already running", self.session.id());
            return None;
        }
        let session = Arc::clone(&self.session);
        spawn_session_task("hdrcam-session-start", move || session.start_running())
    }

    /// Stop the session in the background. `None` if it is not running.
    pub fn stop(&self) -> Option<JoinHandle<()>> {
        if !self.session.is_running() {
            log::debug!("Session {} not running", self.session.id());
            return None;
        }
        let session = Arc::clone(&self.session);
        spawn_session_task("hdrcam-session-stop", move || session.stop_running())
    }
}

fn spawn_session_task<F>(name: &str, task: F) -> Option<JoinHandle<()>>
where
    F: FnOnce() + Send + 'static,
{
    match std::thread::Builder::new().name(name.to_string()).spawn(task) {
        Ok(handle) => Some(handle),
        Err(e) => {
            log::error!("Failed to spawn {}: {}", name, e);
            None
        }
    }
}
