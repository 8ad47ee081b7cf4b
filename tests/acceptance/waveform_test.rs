//! Waveform shape acceptance tests.
//!
//! Each test runs a complete workload on simulated hardware and checks the
//! sequence of periods programmed into the pulse output.
//!
//! # Acceptance Criteria
//!
//! - Sawtooth-up is non-decreasing between wraps and stays in `[start, end]`
//! - Sawtooth-down is non-increasing between wraps and stays in `[end, start]`
//! - Sine repeats every `ramp_steps` and stays in `[start + Δ/2, start + 1.5Δ]`
//! - Square alternates strictly between the two bounds

use super::common::{silent_operator, workload, Bench};
use plemu_common::config::WaveformProfile;
use plemu_runtime::PulseOutput;

/// Run `bench` to completion and return the armed periods.
fn run(bench: &mut Bench) -> Vec<u32> {
    let mut op = silent_operator();
    assert!(bench.emulator.run_workload(&mut op).is_success());
    assert!(!bench.pulse.is_armed());
    bench.pulse.armed_periods()
}

#[test]
fn test_sawtooth_up_shape() {
    let mut bench = Bench::new(workload(WaveformProfile::SawtoothUp, 1_000, 4_333, 7, 5));
    let periods = run(&mut bench);

    assert_eq!(periods.len(), 51);
    assert!(periods.iter().all(|p| (1_000..=4_333).contains(p)));

    let mut wraps = 0;
    for pair in periods.windows(2) {
        if pair[1] < pair[0] {
            assert_eq!(pair[1], 1_000, "sawtooth-up may only drop back to start");
            wraps += 1;
        }
    }
    assert!(wraps > 0);
}

#[test]
fn test_sawtooth_down_shape() {
    let mut bench = Bench::new(workload(WaveformProfile::SawtoothDown, 6_000, 1_500, 9, 5));
    let periods = run(&mut bench);

    assert_eq!(bench.emulator.config().ramp_step_size(), Some(500));
    assert!(periods.iter().all(|p| (1_500..=6_000).contains(p)));

    let mut wraps = 0;
    for pair in periods.windows(2) {
        if pair[1] > pair[0] {
            assert_eq!(pair[1], 6_000, "sawtooth-down may only jump back to start");
            wraps += 1;
        }
    }
    assert_eq!(wraps, 5);
}

#[test]
fn test_sine_shape() {
    let steps = 8;
    let mut bench = Bench::new(workload(WaveformProfile::Sine, 1_000, 3_000, steps, 4));
    let periods = run(&mut bench);

    let steps = steps as usize;
    assert_eq!(periods.len(), 41);
    for i in 0..periods.len() - steps {
        assert_eq!(periods[i], periods[i + steps], "period at {i} not repeated");
    }
    assert!(periods.iter().all(|p| (2_000..=4_000).contains(p)));
    assert_ne!(periods[0], 1_000);
}

#[test]
fn test_square_shape() {
    let mut bench = Bench::new(workload(WaveformProfile::Square, 200, 800, 5, 2));
    let periods = run(&mut bench);

    assert_eq!(periods.len(), 21);
    for (i, period) in periods.iter().enumerate() {
        let expected = if i % 2 == 0 { 200 } else { 800 };
        assert_eq!(*period, expected);
    }
}

#[test]
fn test_square_equal_bounds() {
    let mut bench = Bench::new(workload(WaveformProfile::Square, 100, 100, 3, 2));
    let periods = run(&mut bench);

    assert_eq!(periods.len(), 21);
    assert!(periods.iter().all(|&p| p == 100));
}
