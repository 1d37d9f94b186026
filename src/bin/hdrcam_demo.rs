// hdrcam demo
// Drives the preview model against a simulated back triple camera and toggles
// the extended color space on and off while the session runs.

use hdrcam::testing::{
    hlg_format, log_format, standard_format, SimulatedDevice, SimulatedRegistry, StaticPermissions,
};
use hdrcam::{DeviceType, HdrCamConfig, ModeController, PermissionStatus, PreviewModel};
use std::env;
use std::sync::Arc;

struct Options {
    toggles: u32,
    json: bool,
    without_log: bool,
    permission: PermissionStatus,
    config_path: Option<String>,
}

fn parse_args(args: &[String]) -> Result<Options, String> {
    let mut options = Options {
        toggles: 2,
        json: false,
        without_log: false,
        permission: PermissionStatus::Authorized,
        config_path: None,
    };

    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--toggles" => {
                let value = iter.next().ok_or("--toggles needs a value")?;
                options.toggles = value
                    .parse()
                    .map_err(|_| format!("Invalid toggle count: {}", value))?;
            }
            "--json" => options.json = true,
            "--without-log" => options.without_log = true,
            "--deny" => options.permission = PermissionStatus::Denied,
            "--config" => {
                let value = iter.next().ok_or("--config needs a path")?;
                options.config_path = Some(value.clone());
            }
            other => return Err(format!("Unknown argument: {}", other)),
        }
    }
    Ok(options)
}

fn print_snapshot(model: &PreviewModel, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let snapshot = model.snapshot();
    if json {
        println!("{}", serde_json::to_string(&snapshot)?);
    } else {
        let color_space = snapshot
            .device
            .as_ref()
            .map(|d| d.active_color_space.display_name())
            .unwrap_or("-");
        println!(
            "  state={:?} running={} color_space={} toggle=\"{}\"{}",
            snapshot.preview_state,
            snapshot.is_session_running,
            color_space,
            snapshot.toggle.label,
            if snapshot.toggle.enabled { "" } else { " (disabled)" }
        );
        if let Some(alert) = &snapshot.alert {
            println!("  alert: {} - {}", alert.title, alert.message);
        }
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    hdrcam::init_logging();

    let args: Vec<String> = env::args().collect();
    let options = match parse_args(&args) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("{}", e);
            eprintln!(
                "Usage: hdrcam-demo [--toggles <n>] [--json] [--without-log] [--deny] [--config <path>]"
            );
            std::process::exit(1);
        }
    };

    let config = match &options.config_path {
        Some(path) => HdrCamConfig::load_from_file(path)?,
        None => HdrCamConfig::default(),
    };

    let mut formats = vec![standard_format(), hlg_format()];
    if !options.without_log {
        formats.push(log_format());
    }
    let device = SimulatedDevice::builder("back-triple")
        .name("Back Triple Camera")
        .device_type(DeviceType::TripleCamera)
        .formats(formats)
        .build_arc();
    let registry = Arc::new(SimulatedRegistry::single(device));

    let controller = ModeController::new(config, registry);
    let permissions = Arc::new(StaticPermissions::new(options.permission));
    let mut model = PreviewModel::new(controller, permissions);

    println!("hdrcam {} demo", hdrcam::VERSION);
    let status = model.evaluate_permission();
    model.wait_for_session();
    println!("Permission: {}", status);
    print_snapshot(&model, options.json)?;

    if model.alert().is_some() {
        model.acknowledge_denied();
        println!("Alert dismissed");
        print_snapshot(&model, options.json)?;
        return Ok(());
    }

    for i in 1..=options.toggles {
        model.toggle_extended_mode();
        println!("Toggle {}", i);
        print_snapshot(&model, options.json)?;
    }

    model.on_running_changed(false);
    model.wait_for_session();
    println!("Stopped");
    print_snapshot(&model, options.json)?;
    Ok(())
}
