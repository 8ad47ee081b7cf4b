//! Workload lifecycle acceptance tests.
//!
//! # Acceptance Criteria
//!
//! - The 10000 -> 5000 us sawtooth-down example ramps by 250 us per second
//!   and halts at 60 s
//! - Runs terminate within the workload length plus one poll
//! - Operator cancellation ends the run promptly
//! - Every exit path leaves the pulse output disarmed
//! - Backwards or zero period bounds never disarm the output mid-run
//! - Setup swaps backwards bounds and reports it

use super::common::{silent_operator, workload, Bench, TICK_US};
use plemu_common::config::{WaveformProfile, WorkloadConfig};
use plemu_common::state::WorkloadState;
use plemu_runtime::{
    Command, CommandStatus, PulseEvent, PulseOutput, RunOutcome, ScriptedOperator, SimulatedClock,
    SimulatedPulseOutput, WorkloadScheduler,
};
use std::time::Duration;

#[test]
fn test_sawtooth_down_sixty_second_example() {
    let config = WorkloadConfig {
        start_period_us: 10_000,
        end_period_us: 5_000,
        ramp_period_ms: 1_000,
        ramp_steps: 20,
        workload_length_s: 60,
        profile: WaveformProfile::SawtoothDown,
    };
    let mut bench = Bench::new(config);
    let mut op = silent_operator();

    assert_eq!(
        bench.emulator.dispatch(Command::RunWorkload, &mut op),
        CommandStatus::Success
    );

    let report = *bench.emulator.last_report().unwrap();
    assert_eq!(report.outcome, RunOutcome::Completed);
    assert_eq!(report.elapsed(), Duration::from_secs(60));
    assert_eq!(report.metrics.min_period_us, Some(5_000));
    assert_eq!(report.metrics.max_period_us, Some(10_000));

    let periods = bench.pulse.armed_periods();
    assert_eq!(periods[1], 9_750);
    assert_eq!(periods[20], 5_000);
    assert_eq!(periods[21], 10_000);

    let transcript = op.transcript();
    assert!(transcript.starts_with("Workload will pulse the output, running...\n"));
    assert_eq!(transcript.matches('.').count(), 3 + 60 + 1);
    assert!(transcript.contains("Workload exiting!"));
}

#[test]
fn test_terminates_within_one_poll_of_length() {
    // A coarse tick that does not divide one second
    let tick_us = 7_000;
    let mut bench = Bench::with_clock(
        workload(WaveformProfile::Sine, 500, 900, 5, 3),
        SimulatedClock::with_tick(tick_us),
    );

    bench.emulator.run_workload(&mut silent_operator());

    let elapsed_ms = bench.emulator.last_report().unwrap().elapsed_ms;
    assert!(elapsed_ms >= 3_000);
    assert!(elapsed_ms < 3_000 + u64::from(tick_us / 1_000));
}

#[test]
fn test_terminates_across_clock_wrap() {
    let clock = SimulatedClock::with_tick(TICK_US).starting_at(u32::MAX - 1_500_000);
    let mut bench = Bench::with_clock(
        workload(WaveformProfile::SawtoothUp, 100, 500, 4, 4),
        clock,
    );

    bench.emulator.run_workload(&mut silent_operator());

    let report = bench.emulator.last_report().unwrap();
    assert_eq!(report.outcome, RunOutcome::Completed);
    assert_eq!(report.elapsed(), Duration::from_secs(4));
    assert_eq!(report.metrics.steps, 40);
}

#[test]
fn test_cancel_ends_run_and_disarms() {
    let mut bench = Bench::new(workload(WaveformProfile::Square, 100, 900, 2, 600));
    let mut op = ScriptedOperator::new().cancel_after(2_500);

    assert!(bench.emulator.run_workload(&mut op).is_success());

    let report = bench.emulator.last_report().unwrap();
    assert_eq!(report.outcome, RunOutcome::Cancelled);
    assert_eq!(report.elapsed(), Duration::from_millis(2_500));
    assert_eq!(bench.emulator.scheduler().state(), WorkloadState::Cancelled);
    assert_eq!(bench.pulse.last_event(), Some(PulseEvent::Disarmed));
}

#[test]
fn test_rejected_configuration_never_arms() {
    let mut bench = Bench::new(WorkloadConfig {
        ramp_steps: 0,
        ..Default::default()
    });
    let mut op = silent_operator();

    assert_eq!(bench.emulator.run_workload(&mut op), CommandStatus::Failure);
    assert!(bench.pulse.armed_periods().is_empty());
    assert!(!bench.pulse.is_armed());
    assert_eq!(bench.emulator.scheduler().state(), WorkloadState::Idle);
    assert!(op.transcript().contains("Workload not run"));
}

#[test]
fn test_zero_period_never_arms() {
    let mut bench = Bench::new(workload(WaveformProfile::SawtoothUp, 0, 500, 4, 1));
    let mut op = silent_operator();

    assert_eq!(bench.emulator.run_workload(&mut op), CommandStatus::Failure);
    assert!(bench.pulse.armed_periods().is_empty());
    assert!(!bench.pulse.is_armed());
    assert_eq!(bench.emulator.scheduler().state(), WorkloadState::Idle);
    assert!(op.transcript().contains("periods must be non-zero"));
}

#[test]
fn test_backwards_sine_runs_armed_to_completion() {
    let mut bench = Bench::new(workload(WaveformProfile::Sine, 1_000, 100, 4, 1));
    let mut op = silent_operator();

    assert!(bench.emulator.run_workload(&mut op).is_success());

    let events = bench.pulse.events();
    let disarms = events
        .iter()
        .filter(|event| **event == PulseEvent::Disarmed)
        .count();
    assert_eq!(disarms, 1, "{events:?}");
    assert_eq!(events.last(), Some(&PulseEvent::Disarmed));

    let periods = bench.pulse.armed_periods();
    assert_eq!(periods.len(), 11);
    assert!(periods.iter().all(|p| (550..=1_450).contains(p)));
}

#[test]
fn test_setup_swap_then_run() {
    let mut bench = Bench::new(WorkloadConfig::default());
    let mut op = ScriptedOperator::with_inputs([9_000, 1_000, 100, 8, 1, 0]);

    assert!(bench.emulator.dispatch(Command::Setup, &mut op).is_success());
    assert!(op
        .transcript()
        .contains("Start and end periods swapped to suit the sawtooth-up profile."));
    assert_eq!(bench.emulator.config().start_period_us, 1_000);
    assert_eq!(bench.emulator.config().end_period_us, 9_000);

    assert!(bench.emulator.dispatch(Command::RunWorkload, &mut op).is_success());
    let periods = bench.pulse.armed_periods();
    assert_eq!(&periods[..3], &[1_000, 2_000, 3_000]);
}

#[test]
fn test_drop_mid_run_disarms() {
    let clock = SimulatedClock::new();
    let pulse = SimulatedPulseOutput::new();
    let mut scheduler = WorkloadScheduler::new(clock.clone(), pulse.clone());

    // Start a run and abandon it before it completes
    scheduler.start(&WorkloadConfig::default()).unwrap();
    clock.advance(1_500_000);
    assert_eq!(scheduler.poll(&mut silent_operator()).unwrap(), None);
    assert!(pulse.is_armed());

    drop(scheduler);

    assert!(!pulse.is_armed());
    assert_eq!(pulse.last_event(), Some(PulseEvent::Disarmed));
}

#[test]
fn test_back_to_back_runs() {
    let mut bench = Bench::new(workload(WaveformProfile::SawtoothDown, 800, 200, 3, 1));
    let mut op = ScriptedOperator::new();

    for _ in 0..3 {
        assert!(bench.emulator.run_workload(&mut op).is_success());
        assert_eq!(bench.emulator.scheduler().state(), WorkloadState::Completed);
        assert!(!bench.pulse.is_armed());
    }
    assert_eq!(op.transcript().matches("Workload exiting!").count(), 3);
}
