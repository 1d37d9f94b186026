//! Presentation model for a live preview with an extended-mode toggle.
//!
//! UI layers observe [`PreviewSnapshot`] and send two commands,
//! [`PreviewModel::toggle_extended_mode`] and [`PreviewModel::acknowledge_denied`].
//! State changes that matter (permission, running flag, mode flag) each have
//! an explicit handler; nothing re-runs the whole configuration sequence.

use crate::controller::{ModeController, PreviewState};
use crate::errors::ModeError;
use crate::permissions::{PermissionProvider, PermissionStatus};
use crate::types::DeviceSummary;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::thread::JoinHandle;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertAction {
    pub label: String,
    /// Dismisses the alert without further effect
    pub cancels: bool,
}

/// Blocking alert shown to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertState {
    pub title: String,
    pub message: String,
    pub actions: Vec<AlertAction>,
}

impl AlertState {
    /// Camera access denied; the only way out is system settings
    pub fn permission_denied() -> Self {
        Self {
            title: "Camera Access Denied".to_string(),
            message: "Allow camera access in system settings to use the preview.".to_string(),
            actions: vec![AlertAction {
                label: "OK".to_string(),
                cancels: true,
            }],
        }
    }
}

/// Enabled state and label of the extended-mode toggle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToggleAffordance {
    pub enabled: bool,
    pub label: String,
}

/// Everything a UI needs to render the preview controls
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewSnapshot {
    pub is_session_running: bool,
    pub is_extended_mode_activated: bool,
    pub is_permission_authorized: bool,
    pub format_unavailable: bool,
    pub preview_state: PreviewState,
    pub toggle: ToggleAffordance,
    pub alert: Option<AlertState>,
    pub device: Option<DeviceSummary>,
}

pub struct PreviewModel {
    controller: ModeController,
    permissions: Arc<dyn PermissionProvider>,
    is_permission_authorized: bool,
    is_extended_mode_activated: bool,
    format_unavailable: bool,
    alert: Option<AlertState>,
    pending: Option<JoinHandle<()>>,
}

impl PreviewModel {
    pub fn new(controller: ModeController, permissions: Arc<dyn PermissionProvider>) -> Self {
        Self {
            controller,
            permissions,
            is_permission_authorized: false,
            is_extended_mode_activated: false,
            format_unavailable: false,
            alert: None,
            pending: None,
        }
    }

    pub fn controller(&self) -> &ModeController {
        &self.controller
    }

    pub fn alert(&self) -> Option<&AlertState> {
        self.alert.as_ref()
    }

    /// Read the current authorization, prompting when it is not yet determined,
    /// and dispatch the outcome to [`Self::on_permission_changed`].
    pub fn evaluate_permission(&mut self) -> PermissionStatus {
        let mut status = self.permissions.current_authorization();
        if status == PermissionStatus::NotDetermined {
            log::info!("Requesting camera authorization");
            status = if self.permissions.request_authorization() {
                PermissionStatus::Authorized
            } else {
                self.permissions.current_authorization()
            };
        }
        self.on_permission_changed(status);
        status
    }

    pub fn on_permission_changed(&mut self, status: PermissionStatus) {
        match status {
            PermissionStatus::Authorized => {
                self.is_permission_authorized = true;
                self.alert = None;
                if let Err(e) = self.controller.configure_once() {
                    log::error!("Session configuration failed: {}", e);
                }
                self.refresh_availability();
                self.on_running_changed(true);
            }
            status if status.is_terminal_denial() => {
                log::warn!("Camera authorization {}", status);
                self.is_permission_authorized = false;
                self.alert = Some(AlertState::permission_denied());
            }
            _ => {
                log::debug!("Camera authorization not determined");
            }
        }
    }

    /// Start or stop the session in the background once the previous
    /// transition has finished
    pub fn on_running_changed(&mut self, running: bool) {
        if running && !self.is_permission_authorized {
            log::warn!("Not starting preview without camera authorization");
            return;
        }
        // The running flag is only meaningful once the previous transition landed
        self.wait_for_session();
        self.pending = if running {
            self.controller.start()
        } else {
            self.controller.stop()
        };
    }

    pub fn toggle_extended_mode(&mut self) {
        let desired = !self.is_extended_mode_activated;
        self.on_mode_changed(desired);
    }

    pub fn on_mode_changed(&mut self, activated: bool) {
        if activated && self.format_unavailable {
            log::info!("Extended mode unavailable on this device");
            return;
        }

        let result = if activated {
            self.controller.activate_extended_mode()
        } else {
            self.controller.deactivate_extended_mode()
        };

        match result {
            Ok(()) => {}
            Err(ModeError::Unsupported) => {
                self.format_unavailable = true;
            }
            Err(ModeError::NoDevice) => {
                log::debug!("Mode change ignored, no device bound");
            }
            Err(e) => {
                log::warn!("Mode change failed: {}", e);
            }
        }
        self.is_extended_mode_activated = self.controller.is_extended_mode_active();
    }

    /// Dismiss the permission alert
    pub fn acknowledge_denied(&mut self) {
        self.alert = None;
    }

    /// Block until the last background start/stop finished
    pub fn wait_for_session(&mut self) {
        if let Some(handle) = self.pending.take() {
            if handle.join().is_err() {
                log::error!("Session transition thread panicked");
            }
        }
    }

    // Capability is a property of the bound device; without one nothing is known yet
    fn refresh_availability(&mut self) {
        self.format_unavailable = self.controller.state().has_bound_device()
            && !self.controller.supports_extended_mode();
    }

    pub fn toggle_affordance(&self) -> ToggleAffordance {
        let name = self
            .controller
            .config()
            .negotiation
            .extended_color_space
            .display_name();

        if self.format_unavailable {
            ToggleAffordance {
                enabled: false,
                label: format!("{} not supported by this camera", name),
            }
        } else if !self.is_permission_authorized {
            ToggleAffordance {
                enabled: false,
                label: format!("{} Off", name),
            }
        } else if !self.controller.state().has_bound_device() {
            ToggleAffordance {
                enabled: false,
                label: format!("{} unavailable, no camera found", name),
            }
        } else if self.is_extended_mode_activated {
            ToggleAffordance {
                enabled: true,
                label: format!("{} On", name),
            }
        } else {
            ToggleAffordance {
                enabled: true,
                label: format!("{} Off", name),
            }
        }
    }

    pub fn snapshot(&self) -> PreviewSnapshot {
        PreviewSnapshot {
            is_session_running: self.controller.session().is_running(),
            is_extended_mode_activated: self.is_extended_mode_activated,
            is_permission_authorized: self.is_permission_authorized,
            format_unavailable: self.format_unavailable,
            preview_state: self.controller.preview_state(),
            toggle: self.toggle_affordance(),
            alert: self.alert.clone(),
            device: self.controller.bound_device().map(|d| d.summary()),
        }
    }
}
