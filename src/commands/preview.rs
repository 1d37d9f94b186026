use crate::config::HdrCamConfig;
use crate::controller::ModeController;
use crate::permissions::SystemPermissions;
use crate::platform::NativeRegistry;
use crate::presentation::{PreviewModel, PreviewSnapshot};
use crate::types::DeviceType;
use std::sync::{Arc, Mutex};
use tauri::command;

lazy_static::lazy_static! {
    static ref PREVIEW_MODEL: Arc<Mutex<Option<PreviewModel>>> = Arc::new(Mutex::new(None));
}

/// Run `f` against the global preview model on the blocking pool
async fn with_model<T, F>(f: F) -> Result<T, String>
where
    T: Send + 'static,
    F: FnOnce(&mut PreviewModel) -> T + Send + 'static,
{
    tokio::task::spawn_blocking(move || -> Result<T, String> {
        let mut guard = PREVIEW_MODEL
            .lock()
            .map_err(|e| format!("Preview model lock poisoned: {}", e))?;
        let model = guard
            .as_mut()
            .ok_or_else(|| "Preview not initialized".to_string())?;
        Ok(f(model))
    })
    .await
    .map_err(|e| format!("Preview task failed: {}", e))?
}

/// Build the preview model against the host cameras and evaluate permission
#[command]
pub async fn initialize_preview() -> Result<PreviewSnapshot, String> {
    log::info!("Initializing preview");

    tokio::task::spawn_blocking(|| -> Result<PreviewSnapshot, String> {
        let registry = NativeRegistry::query().map_err(|e| {
            log::error!("Failed to query cameras: {}", e);
            e.to_string()
        })?;
        let mut config = HdrCamConfig::load_or_default();
        if !config.discovery.device_types.contains(&DeviceType::External) {
            config.discovery.device_types.push(DeviceType::External);
        }
        let controller = ModeController::new(config, Arc::new(registry));
        let mut model = PreviewModel::new(controller, Arc::new(SystemPermissions));
        model.evaluate_permission();
        let snapshot = model.snapshot();

        let mut guard = PREVIEW_MODEL
            .lock()
            .map_err(|e| format!("Preview model lock poisoned: {}", e))?;
        if let Some(previous) = guard.as_mut() {
            previous.on_running_changed(false);
            previous.wait_for_session();
        }
        *guard = Some(model);
        Ok(snapshot)
    })
    .await
    .map_err(|e| format!("Preview task failed: {}", e))?
}

#[command]
pub async fn get_preview_state() -> Result<PreviewSnapshot, String> {
    with_model(|model| model.snapshot()).await
}

#[command]
pub async fn toggle_extended_mode() -> Result<PreviewSnapshot, String> {
    with_model(|model| {
        model.toggle_extended_mode();
        model.snapshot()
    })
    .await
}

#[command]
pub async fn acknowledge_denied() -> Result<PreviewSnapshot, String> {
    with_model(|model| {
        model.acknowledge_denied();
        model.snapshot()
    })
    .await
}

#[command]
pub async fn start_preview() -> Result<PreviewSnapshot, String> {
    with_model(|model| {
        model.on_running_changed(true);
        model.snapshot()
    })
    .await
}

#[command]
pub async fn stop_preview() -> Result<PreviewSnapshot, String> {
    with_model(|model| {
        model.on_running_changed(false);
        model.snapshot()
    })
    .await
}
