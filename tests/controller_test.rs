//! Session configuration, negotiation and reversion against simulated devices

use hdrcam::testing::{
    hlg_format, log_format, log_format_with_encoding, standard_format, SimulatedDevice,
    SimulatedRegistry,
};
use hdrcam::{
    CaptureDevice, ColorSpace, ConfigError, ConfigurationLock, DeviceError, DevicePosition,
    DeviceType, FormatDescriptor, FrameDuration, HdrCamConfig, ModeController, ModeError,
    PixelEncoding, PreviewState,
};
use std::sync::Arc;

fn controller_for(device: &Arc<SimulatedDevice>) -> ModeController {
    let registry = Arc::new(SimulatedRegistry::single(Arc::clone(device)));
    ModeController::new(HdrCamConfig::default(), registry)
}

fn log_capable_device() -> Arc<SimulatedDevice> {
    SimulatedDevice::builder("back")
        .device_type(DeviceType::TripleCamera)
        .formats(vec![standard_format(), hlg_format(), log_format()])
        .build_arc()
}

fn plain_srgb() -> FormatDescriptor {
    FormatDescriptor::new(PixelEncoding::NV12, 1920, 1080)
        .with_frame_rate_ranges(vec![hdrcam::FrameRateRange::new(1.0, 60.0)])
}

mod configure_once {
    use super::*;

    #[test]
    fn test_binds_device_and_captures_default_format() {
        let device = log_capable_device();
        let mut controller = controller_for(&device);

        controller.configure_once().unwrap();

        let state = controller.state();
        assert!(state.is_session_configured());
        assert!(state.has_bound_device());
        assert_eq!(state.default_format(), Some(&standard_format()));
        assert_eq!(controller.bound_device().unwrap().unique_id(), "back");
        assert!(controller.session().has_video_input());
    }

    #[test]
    fn test_disables_automatic_wide_color() {
        let device = log_capable_device();
        let mut controller = controller_for(&device);
        assert!(controller.session().automatically_configures_wide_color());

        controller.configure_once().unwrap();
        assert!(!controller.session().automatically_configures_wide_color());
    }

    #[test]
    fn test_second_call_does_no_binding_work() {
        let device = log_capable_device();
        let mut controller = controller_for(&device);

        controller.configure_once().unwrap();
        controller.configure_once().unwrap();

        assert_eq!(device.input_open_count(), 1);
        assert_eq!(controller.session().inputs().len(), 1);
    }

    #[test]
    fn test_default_format_not_overwritten_after_negotiation() {
        let device = log_capable_device();
        let mut controller = controller_for(&device);
        controller.configure_once().unwrap();
        controller.activate_extended_mode().unwrap();

        controller.configure_once().unwrap();
        assert_eq!(controller.state().default_format(), Some(&standard_format()));
    }

    #[test]
    fn test_no_matching_device_is_unavailable() {
        let front = SimulatedDevice::builder("front")
            .position(DevicePosition::Front)
            .build_arc();
        let mut controller = controller_for(&front);

        let result = controller.configure_once();
        assert!(matches!(result, Err(ConfigError::DeviceUnavailable(_))));
        assert!(!controller.state().is_session_configured());
        assert!(!controller.session().has_video_input());
    }

    #[test]
    fn test_busy_device_allows_retry() {
        let device = SimulatedDevice::builder("back")
            .input_error(DeviceError::Busy)
            .build_arc();
        let mut controller = controller_for(&device);

        for attempt in 1..=2 {
            let result = controller.configure_once();
            assert!(matches!(result, Err(ConfigError::DeviceUnavailable(_))));
            assert!(!controller.state().is_session_configured());
            assert!(controller.state().default_format().is_none());
            assert_eq!(device.input_open_count(), attempt);
        }
        // The transaction was closed, so the session is still usable
        assert!(!controller.session().automatically_configures_wide_color());
        assert!(!controller.session().has_video_input());
    }

    #[test]
    fn test_unauthorized_device_is_unavailable() {
        let device = SimulatedDevice::builder("back")
            .input_error(DeviceError::Unauthorized)
            .build_arc();
        let mut controller = controller_for(&device);

        match controller.configure_once() {
            Err(ConfigError::DeviceUnavailable(reason)) => {
                assert!(reason.contains(&DeviceError::Unauthorized.to_string()));
            }
            other => panic!("expected DeviceUnavailable, got {:?}", other),
        }
        assert!(controller.bound_device().is_none());
    }

    #[test]
    fn test_picks_highest_priority_device_type() {
        let wide = SimulatedDevice::builder("wide")
            .device_type(DeviceType::WideAngleCamera)
            .build_arc();
        let dual = SimulatedDevice::builder("dual")
            .device_type(DeviceType::DualCamera)
            .build_arc();
        let registry = Arc::new(SimulatedRegistry::new(vec![wide, dual]));
        let mut controller = ModeController::new(HdrCamConfig::default(), registry);

        controller.configure_once().unwrap();
        assert_eq!(controller.bound_device().unwrap().unique_id(), "dual");
    }

    #[test]
    fn test_priority_list_comes_from_config() {
        let wide = SimulatedDevice::builder("wide")
            .device_type(DeviceType::WideAngleCamera)
            .build_arc();
        let dual = SimulatedDevice::builder("dual")
            .device_type(DeviceType::DualCamera)
            .build_arc();
        let registry = Arc::new(SimulatedRegistry::new(vec![wide, dual]));
        let mut config = HdrCamConfig::default();
        config.discovery.device_types = vec![DeviceType::WideAngleCamera, DeviceType::DualCamera];
        let mut controller = ModeController::new(config, registry);

        controller.configure_once().unwrap();
        assert_eq!(controller.bound_device().unwrap().unique_id(), "wide");
    }
}

mod activate {
    use super::*;

    #[test]
    fn test_without_device_is_no_device() {
        let device = log_capable_device();
        let mut controller = controller_for(&device);

        assert_eq!(controller.activate_extended_mode(), Err(ModeError::NoDevice));
        assert_eq!(device.lock_count(), 0);
    }

    #[test]
    fn test_selects_log_format_with_target_encoding() {
        // [A: {sRGB}, B: {sRGB, extended, x422}]
        let b = log_format();
        let device = SimulatedDevice::builder("back")
            .formats(vec![plain_srgb(), b.clone()])
            .build_arc();
        let mut controller = controller_for(&device);
        controller.configure_once().unwrap();

        controller.activate_extended_mode().unwrap();

        assert_eq!(device.active_format(), b);
        assert_eq!(device.active_color_space(), ColorSpace::AppleLog);
        assert!(controller.is_extended_mode_active());
        assert!(!device.is_locked());
    }

    #[test]
    fn test_unsupported_device_is_left_untouched() {
        let device = SimulatedDevice::builder("back")
            .formats(vec![standard_format(), hlg_format()])
            .build_arc();
        let mut controller = controller_for(&device);
        controller.configure_once().unwrap();

        assert_eq!(controller.activate_extended_mode(), Err(ModeError::Unsupported));
        assert!(!controller.is_extended_mode_active());
        assert_eq!(device.active_format(), standard_format());
        assert_eq!(device.lock_count(), 0);
        assert!(!controller.supports_extended_mode());
    }

    #[test]
    fn test_other_encoding_from_standard_format_changes_nothing() {
        // [A: {sRGB}, B: {sRGB, extended, other}] with A active: no format is
        // selected and A cannot carry the extended color space.
        let b = log_format_with_encoding(PixelEncoding::X420);
        let device = SimulatedDevice::builder("back")
            .formats(vec![plain_srgb(), b])
            .build_arc();
        let mut controller = controller_for(&device);
        controller.configure_once().unwrap();

        assert_eq!(controller.activate_extended_mode(), Ok(()));

        assert_eq!(device.active_format(), plain_srgb());
        assert_eq!(device.active_color_space(), ColorSpace::Srgb);
        assert!(!controller.is_extended_mode_active());
    }

    #[test]
    fn test_other_encoding_already_active_still_gets_color_space() {
        // Same formats but B is already active: no format is selected, yet the
        // color-space step sees B and applies the extended color space.
        let b = log_format_with_encoding(PixelEncoding::X420);
        let device = SimulatedDevice::builder("back")
            .formats(vec![plain_srgb(), b.clone()])
            .active_format_index(1)
            .build_arc();
        let mut controller = controller_for(&device);
        controller.configure_once().unwrap();

        assert_eq!(controller.activate_extended_mode(), Ok(()));

        assert_eq!(device.active_format(), b);
        assert_eq!(device.active_color_space(), ColorSpace::AppleLog);
        assert!(controller.is_extended_mode_active());
    }

    #[test]
    fn test_pins_frame_rate_to_thirty() {
        let device = SimulatedDevice::builder("back")
            .formats(vec![standard_format(), log_format()])
            .frame_durations(FrameDuration::from_fps(60), FrameDuration::from_fps(15))
            .build_arc();
        let mut controller = controller_for(&device);
        controller.configure_once().unwrap();

        controller.activate_extended_mode().unwrap();

        assert_eq!(device.active_min_frame_duration(), FrameDuration::new(1, 30));
        assert_eq!(device.active_max_frame_duration(), FrameDuration::new(1, 30));
    }

    #[test]
    fn test_lock_failure_leaves_state_unchanged() {
        let device = SimulatedDevice::builder("back")
            .device_type(DeviceType::TripleCamera)
            .formats(vec![standard_format(), hlg_format(), log_format()])
            .lock_error(DeviceError::Backend("contention".to_string()))
            .build_arc();
        let mut controller = controller_for(&device);
        controller.configure_once().unwrap();

        let result = controller.activate_extended_mode();

        assert!(matches!(result, Err(ModeError::LockFailed(_))));
        assert!(!controller.is_extended_mode_active());
        assert_eq!(device.active_format(), standard_format());
        assert_eq!(device.active_color_space(), ColorSpace::Srgb);
        assert_eq!(controller.state().default_format(), Some(&standard_format()));

        device.set_lock_error(None);
        controller.activate_extended_mode().unwrap();
        assert!(controller.is_extended_mode_active());
    }

    #[test]
    fn test_refuses_second_concurrent_transaction() {
        let device = log_capable_device();
        let mut controller = controller_for(&device);
        controller.configure_once().unwrap();

        let held = ConfigurationLock::acquire(&*device).unwrap();
        let result = controller.activate_extended_mode();
        drop(held);

        assert_eq!(
            result,
            Err(ModeError::LockFailed(DeviceError::Busy.to_string()))
        );
        assert_eq!(device.active_format(), standard_format());
    }

    #[test]
    fn test_rejected_frame_rate_keeps_extended_mode() {
        let slow_log = log_format()
            .with_frame_rate_ranges(vec![hdrcam::FrameRateRange::new(1.0, 24.0)]);
        let device = SimulatedDevice::builder("back")
            .formats(vec![plain_srgb(), slow_log.clone()])
            .frame_durations(FrameDuration::from_fps(24), FrameDuration::from_fps(24))
            .build_arc();
        let mut controller = controller_for(&device);
        controller.configure_once().unwrap();

        assert_eq!(controller.activate_extended_mode(), Ok(()));

        assert!(controller.is_extended_mode_active());
        assert_eq!(device.active_format(), slow_log);
        assert_eq!(device.active_color_space(), ColorSpace::AppleLog);
        assert_eq!(device.active_min_frame_duration(), FrameDuration::from_fps(24));
        assert_eq!(device.active_max_frame_duration(), FrameDuration::from_fps(24));
        assert!(!device.is_locked());
    }

    #[test]
    fn test_custom_frame_rate_and_encoding() {
        let x420_log = log_format_with_encoding(PixelEncoding::X420);
        let device = SimulatedDevice::builder("back")
            .formats(vec![standard_format(), x420_log.clone()])
            .build_arc();
        let registry = Arc::new(SimulatedRegistry::single(Arc::clone(&device)));
        let mut config = HdrCamConfig::default();
        config.negotiation.preferred_encoding = PixelEncoding::X420;
        config.negotiation.frame_rate = 24;
        let mut controller = ModeController::new(config, registry);
        controller.configure_once().unwrap();

        controller.activate_extended_mode().unwrap();

        assert_eq!(device.active_format(), x420_log);
        assert_eq!(device.active_min_frame_duration(), FrameDuration::new(1, 24));
    }
}

mod deactivate {
    use super::*;

    #[test]
    fn test_without_device_is_no_op() {
        let device = log_capable_device();
        let mut controller = controller_for(&device);

        assert_eq!(controller.deactivate_extended_mode(), Err(ModeError::NoDevice));
        assert_eq!(device.lock_count(), 0);
    }

    #[test]
    fn test_round_trip_restores_default_format() {
        let device = log_capable_device();
        let mut controller = controller_for(&device);
        controller.configure_once().unwrap();
        let before = device.active_format();

        controller.activate_extended_mode().unwrap();
        assert_ne!(device.active_format(), before);
        controller.deactivate_extended_mode().unwrap();

        assert_eq!(device.active_format(), before);
        assert_eq!(
            Some(&device.active_format()),
            controller.state().default_format()
        );
        assert_eq!(device.active_color_space(), ColorSpace::Srgb);
        assert!(!controller.is_extended_mode_active());
        assert!(!device.is_locked());
    }

    #[test]
    fn test_keeps_pinned_frame_rate() {
        let device = SimulatedDevice::builder("back")
            .formats(vec![standard_format(), log_format()])
            .frame_durations(FrameDuration::from_fps(60), FrameDuration::from_fps(15))
            .build_arc();
        let mut controller = controller_for(&device);
        controller.configure_once().unwrap();

        controller.activate_extended_mode().unwrap();
        controller.deactivate_extended_mode().unwrap();

        assert_eq!(device.active_min_frame_duration(), FrameDuration::from_fps(30));
        assert_eq!(device.active_max_frame_duration(), FrameDuration::from_fps(30));
    }

    #[test]
    fn test_sets_standard_color_space_when_default_carries_log() {
        // The factory default is itself log-capable, so restoring it keeps
        // the color space until the standard one is set explicitly.
        let device = SimulatedDevice::builder("back")
            .formats(vec![log_format()])
            .build_arc();
        let mut controller = controller_for(&device);
        controller.configure_once().unwrap();

        controller.activate_extended_mode().unwrap();
        assert_eq!(device.active_color_space(), ColorSpace::AppleLog);

        controller.deactivate_extended_mode().unwrap();
        assert_eq!(device.active_format(), log_format());
        assert_eq!(device.active_color_space(), ColorSpace::Srgb);
    }

    #[test]
    fn test_lock_failure_keeps_extended_flag() {
        let device = log_capable_device();
        let mut controller = controller_for(&device);
        controller.configure_once().unwrap();
        controller.activate_extended_mode().unwrap();

        device.set_lock_error(Some(DeviceError::Busy));
        let result = controller.deactivate_extended_mode();

        assert!(matches!(result, Err(ModeError::LockFailed(_))));
        assert!(controller.is_extended_mode_active());
        assert_eq!(device.active_color_space(), ColorSpace::AppleLog);
    }
}

mod orchestration {
    use super::*;

    #[test]
    fn test_state_machine_transitions() {
        let device = log_capable_device();
        let mut controller = controller_for(&device);
        controller.configure_once().unwrap();
        assert_eq!(controller.preview_state(), PreviewState::Idle);

        controller.start().unwrap().join().unwrap();
        assert_eq!(controller.preview_state(), PreviewState::RunningDefault);

        controller.activate_extended_mode().unwrap();
        assert_eq!(controller.preview_state(), PreviewState::RunningExtended);

        controller.deactivate_extended_mode().unwrap();
        assert_eq!(controller.preview_state(), PreviewState::RunningDefault);

        controller.activate_extended_mode().unwrap();
        controller.stop().unwrap().join().unwrap();
        assert_eq!(controller.preview_state(), PreviewState::Idle);
    }

    #[test]
    fn test_redundant_start_and_stop_are_skipped() {
        let device = log_capable_device();
        let controller = controller_for(&device);

        assert!(controller.stop().is_none());
        controller.start().unwrap().join().unwrap();
        assert!(controller.start().is_none());
        assert_eq!(controller.session().start_count(), 1);

        controller.stop().unwrap().join().unwrap();
        assert!(controller.stop().is_none());
        assert_eq!(controller.session().stop_count(), 1);
    }

    #[test]
    fn test_negotiation_while_session_starts() {
        let device = log_capable_device();
        let registry = Arc::new(SimulatedRegistry::single(Arc::clone(&device)));
        let mut config = HdrCamConfig::default();
        config.session.startup_delay_ms = 50;
        let mut controller = ModeController::new(config, registry);
        controller.configure_once().unwrap();

        let starting = controller.start().unwrap();
        controller.activate_extended_mode().unwrap();
        starting.join().unwrap();

        assert_eq!(controller.preview_state(), PreviewState::RunningExtended);
        assert_eq!(device.active_color_space(), ColorSpace::AppleLog);
    }
}
