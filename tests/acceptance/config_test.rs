//! Configuration file acceptance tests.
//!
//! # Acceptance Criteria
//!
//! - A complete file configures every section
//! - Missing sections and fields fall back to defaults
//! - Zero ramp steps are rejected at load time
//! - Backwards bounds are normalized for the chosen profile
//! - A loaded configuration drives the emulator unchanged

use super::common::{silent_operator, write_config, Bench};
use plemu_common::config::{ConfigError, EmulatorConfig, PulseBackend, WaveformProfile};
use plemu_common::error::EmuError;
use plemu_runtime::RunOutcome;
use std::path::Path;
use std::time::Duration;

#[test]
fn test_load_complete_file() {
    let (_dir, path) = write_config(
        r#"
        [workload]
        start_period_us = 2000
        end_period_us = 8000
        ramp_period_ms = 250
        ramp_steps = 6
        workload_length_s = 12
        profile = "sine"

        [scheduler]
        poll_interval = "1ms"

        [pulse]
        output = "null"
        "#,
    );

    let config = EmulatorConfig::from_file(&path).unwrap();

    assert_eq!(config.workload.start_period_us, 2_000);
    assert_eq!(config.workload.end_period_us, 8_000);
    assert_eq!(config.workload.ramp_period_ms, 250);
    assert_eq!(config.workload.ramp_steps, 6);
    assert_eq!(config.workload.workload_length_s, 12);
    assert_eq!(config.workload.profile, WaveformProfile::Sine);
    assert_eq!(config.scheduler.poll_interval, Duration::from_millis(1));
    assert_eq!(config.pulse.output, PulseBackend::Null);
}

#[test]
fn test_empty_file_uses_defaults() {
    let (_dir, path) = write_config("");
    let config = EmulatorConfig::from_file(&path).unwrap();
    assert_eq!(config, EmulatorConfig::default());
}

#[test]
fn test_zero_steps_file_rejected() {
    let (_dir, path) = write_config(
        r#"
        [workload]
        ramp_steps = 0
        "#,
    );

    let err = EmulatorConfig::from_file(&path).unwrap_err();
    assert!(matches!(
        err,
        ConfigError::Invalid(EmuError::ZeroRampSteps)
    ));
}

#[test]
fn test_backwards_bounds_normalized_on_load() {
    let (_dir, path) = write_config(
        r#"
        [workload]
        start_period_us = 9000
        end_period_us = 1000
        profile = "sawtooth-up"
        "#,
    );

    let config = EmulatorConfig::from_file(&path).unwrap();
    assert_eq!(config.workload.start_period_us, 1_000);
    assert_eq!(config.workload.end_period_us, 9_000);
}

#[test]
fn test_unknown_profile_rejected() {
    let (_dir, path) = write_config(
        r#"
        [workload]
        profile = "triangle"
        "#,
    );
    assert!(matches!(
        EmulatorConfig::from_file(&path),
        Err(ConfigError::Parse(_))
    ));
}

#[test]
fn test_missing_file() {
    let err = EmulatorConfig::from_file(Path::new("/nonexistent/plemu.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
    assert!(err.to_string().contains("/nonexistent/plemu.toml"));
}

#[test]
fn test_written_config_reloads() {
    let mut config = EmulatorConfig::default();
    config.workload.profile = WaveformProfile::Square;
    config.scheduler.poll_interval = Duration::from_micros(500);

    let (_dir, path) = write_config(&config.to_toml().unwrap());
    assert_eq!(EmulatorConfig::from_file(&path).unwrap(), config);
}

#[test]
fn test_loaded_config_drives_run() {
    let (_dir, path) = write_config(
        r#"
        [workload]
        start_period_us = 10000
        end_period_us = 5000
        ramp_period_ms = 1000
        ramp_steps = 20
        workload_length_s = 5
        profile = "sawtooth-down"
        "#,
    );
    let config = EmulatorConfig::from_file(&path).unwrap();

    let mut bench = Bench::new(config.workload);
    let mut op = silent_operator();
    assert!(bench.emulator.run_workload(&mut op).is_success());

    let report = bench.emulator.last_report().unwrap();
    assert_eq!(report.outcome, RunOutcome::Completed);
    assert_eq!(
        bench.pulse.armed_periods(),
        vec![10_000, 9_750, 9_500, 9_250, 9_000, 8_750]
    );
}
