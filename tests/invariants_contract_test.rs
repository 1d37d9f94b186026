//! Contract tests: the negotiation paths must check their runtime invariants

use hdrcam::invariants::{
    clear_invariant_log, contract_test, BOUND_DEVICE_HAS_DEFAULT, DEFAULT_FORMAT_CAPTURED_ONCE,
    EXTENDED_FLAG_MATCHES_DEVICE,
};
use hdrcam::testing::{log_format, standard_format, SimulatedDevice, SimulatedRegistry};
use hdrcam::{HdrCamConfig, ModeController};
use std::sync::Arc;

fn controller() -> ModeController {
    let device = SimulatedDevice::builder("back")
        .formats(vec![standard_format(), log_format()])
        .build_arc();
    let registry = Arc::new(SimulatedRegistry::single(device));
    ModeController::new(HdrCamConfig::default(), registry)
}

#[test]
fn contract_configure_once() {
    clear_invariant_log();
    let mut controller = controller();
    controller.configure_once().unwrap();
    contract_test("configure_once", &[DEFAULT_FORMAT_CAPTURED_ONCE]);
}

#[test]
fn contract_activate_extended_mode() {
    clear_invariant_log();
    let mut controller = controller();
    controller.configure_once().unwrap();
    controller.activate_extended_mode().unwrap();
    contract_test("activate_extended_mode", &[EXTENDED_FLAG_MATCHES_DEVICE]);
}

#[test]
fn contract_deactivate_extended_mode() {
    clear_invariant_log();
    let mut controller = controller();
    controller.configure_once().unwrap();
    controller.activate_extended_mode().unwrap();
    controller.deactivate_extended_mode().unwrap();
    contract_test(
        "deactivate_extended_mode",
        &[
            DEFAULT_FORMAT_CAPTURED_ONCE,
            EXTENDED_FLAG_MATCHES_DEVICE,
            BOUND_DEVICE_HAS_DEFAULT,
        ],
    );
}

#[test]
#[should_panic(expected = "CONTRACT FAILURE")]
fn contract_unbound_controller_checks_nothing() {
    clear_invariant_log();
    let mut controller = controller();
    let _ = controller.deactivate_extended_mode();
    contract_test("unbound", &[BOUND_DEVICE_HAS_DEFAULT]);
}
