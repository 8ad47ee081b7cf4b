//! Common utilities for integration tests.
//!
//! Provides a simulated bench (clock, pulse output, emulator) and helpers
//! for writing configuration files.

#![allow(dead_code)]

use plemu_common::config::{WaveformProfile, WorkloadConfig};
use plemu_runtime::{Emulator, ScriptedOperator, SimulatedClock, SimulatedPulseOutput};
use std::io::Write;
use std::path::PathBuf;
use tempfile::TempDir;

/// Simulated clock advance per scheduler poll.
pub const TICK_US: u32 = 1_000;

/// Emulator wired to simulated hardware, with observer handles.
pub struct Bench {
    pub emulator: Emulator<SimulatedClock, SimulatedPulseOutput>,
    pub clock: SimulatedClock,
    pub pulse: SimulatedPulseOutput,
}

impl Bench {
    /// Bench whose clock advances `TICK_US` per poll.
    pub fn new(config: WorkloadConfig) -> Self {
        Self::with_clock(config, SimulatedClock::with_tick(TICK_US))
    }

    /// Bench using `clock`.
    pub fn with_clock(config: WorkloadConfig, clock: SimulatedClock) -> Self {
        let pulse = SimulatedPulseOutput::new();
        Self {
            emulator: Emulator::new(config, clock.clone(), pulse.clone()),
            clock,
            pulse,
        }
    }
}

/// Workload with the given shape, stepping every 100 ms for `length_s`.
pub fn workload(
    profile: WaveformProfile,
    start_period_us: u32,
    end_period_us: u32,
    ramp_steps: u32,
    length_s: u32,
) -> WorkloadConfig {
    WorkloadConfig {
        start_period_us,
        end_period_us,
        ramp_period_ms: 100,
        ramp_steps,
        workload_length_s: length_s,
        profile,
    }
}

/// Operator that never answers prompts and never cancels.
pub fn silent_operator() -> ScriptedOperator {
    ScriptedOperator::new()
}

/// Write `contents` to a configuration file in a fresh temp directory.
///
/// The directory is returned so it lives as long as the test needs it.
pub fn write_config(contents: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("plemu.toml");
    let mut file = std::fs::File::create(&path).expect("create config file");
    file.write_all(contents.as_bytes())
        .expect("write config file");
    (dir, path)
}
