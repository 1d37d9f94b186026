use crate::device::DeviceInput;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use uuid::Uuid;

struct SessionInner {
    inputs: Vec<DeviceInput>,
    automatically_configures_wide_color: bool,
}

/// Live capture session feeding the preview.
///
/// Topology changes happen inside a [`SessionConfiguration`]; observers
/// reading the session block until the transaction commits.
pub struct CaptureSession {
    id: Uuid,
    inner: Mutex<SessionInner>,
    running: AtomicBool,
    transition: Mutex<()>,
    startup_delay: Duration,
    starts: AtomicUsize,
    stops: AtomicUsize,
}

impl CaptureSession {
    pub fn new() -> Self {
        Self::with_startup_delay(Duration::ZERO)
    }

    /// `startup_delay` models the time hardware takes to spin up or down
    pub fn with_startup_delay(startup_delay: Duration) -> Self {
        Self {
            id: Uuid::new_v4(),
            inner: Mutex::new(SessionInner {
                inputs: Vec::new(),
                automatically_configures_wide_color: true,
            }),
            running: AtomicBool::new(false),
            transition: Mutex::new(()),
            startup_delay,
            starts: AtomicUsize::new(0),
            stops: AtomicUsize::new(0),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    fn inner(&self) -> MutexGuard<'_, SessionInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Open a configuration transaction; it commits when the guard drops
    pub fn begin_configuration(&self) -> SessionConfiguration<'_> {
        log::debug!("Session {} begin configuration", self.id);
        SessionConfiguration {
            session_id: self.id,
            inner: self.inner(),
        }
    }

    pub fn inputs(&self) -> Vec<DeviceInput> {
        self.inner().inputs.clone()
    }

    pub fn has_video_input(&self) -> bool {
        !self.inner().inputs.is_empty()
    }

    pub fn automatically_configures_wide_color(&self) -> bool {
        self.inner().automatically_configures_wide_color
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Blocking start; returns once the pipeline is running
    pub fn start_running(&self) {
        let _transition = self.transition.lock().unwrap_or_else(|e| e.into_inner());
        if self.is_running() {
            return;
        }
        if !self.startup_delay.is_zero() {
            std::thread::sleep(self.startup_delay);
        }
        self.running.store(true, Ordering::SeqCst);
        self.starts.fetch_add(1, Ordering::SeqCst);
        log::info!("Session {} running", self.id);
    }

    /// Blocking stop
    pub fn stop_running(&self) {
        let _transition = self.transition.lock().unwrap_or_else(|e| e.into_inner());
        if !self.is_running() {
            return;
        }
        if !self.startup_delay.is_zero() {
            std::thread::sleep(self.startup_delay);
        }
        self.running.store(false, Ordering::SeqCst);
        self.stops.fetch_add(1, Ordering::SeqCst);
        log::info!("Session {} stopped", self.id);
    }

    pub fn start_count(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn stop_count(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

impl Default for CaptureSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Open configuration transaction on a [`CaptureSession`]
pub struct SessionConfiguration<'a> {
    session_id: Uuid,
    inner: MutexGuard<'a, SessionInner>,
}

impl SessionConfiguration<'_> {
    /// Automatic wide-color selection overrides a manually chosen color
    /// space, so it must be off before the device is configured by hand.
    pub fn set_automatically_configures_wide_color(&mut self, enabled: bool) {
        self.inner.automatically_configures_wide_color = enabled;
    }

    /// A session carries a single video input
    pub fn can_add_input(&self, _input: &DeviceInput) -> bool {
        self.inner.inputs.is_empty()
    }

    /// Add `input`, returning false if the session rejects it
    pub fn add_input(&mut self, input: DeviceInput) -> bool {
        if !self.can_add_input(&input) {
            log::warn!(
                "Session {} rejected input {}",
                self.session_id,
                input.device().unique_id()
            );
            return false;
        }
        self.inner.inputs.push(input);
        true
    }
}

impl Drop for SessionConfiguration<'_> {
    fn drop(&mut self) {
        log::debug!("Session {} commit configuration", self.session_id);
    }
}
