//! Operator-facing settings: the current-settings report and interactive setup.

use crate::operator::Operator;
use plemu_common::config::{WaveformProfile, WorkloadConfig};
use plemu_common::error::{EmuError, EmuResult};
use std::fmt;
use tracing::{info, warn};

/// Human-readable snapshot of a workload configuration.
#[derive(Debug, Clone, Copy)]
pub struct SettingsReport<'a> {
    config: &'a WorkloadConfig,
}

impl<'a> SettingsReport<'a> {
    /// Build the report for `config`.
    pub fn new(config: &'a WorkloadConfig) -> Self {
        Self { config }
    }
}

impl fmt::Display for SettingsReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = self.config;
        writeln!(f, "Current power loss emulation settings:")?;
        writeln!(
            f,
            "Start period:    {:6} us (0x{:04x})",
            c.start_period_us, c.start_period_us
        )?;
        writeln!(
            f,
            "End period:      {:6} us (0x{:04x})",
            c.end_period_us, c.end_period_us
        )?;
        writeln!(
            f,
            "Ramp period:     {:6} ms (0x{:04x})",
            c.ramp_period_ms, c.ramp_period_ms
        )?;
        writeln!(f, "Ramp steps:      {:6}", c.ramp_steps)?;
        match c.ramp_step_size() {
            Some(size) if c.profile.uses_step_size() => {
                writeln!(f, "Ramp step size:  {size:6} us")?;
            }
            _ => writeln!(f, "Ramp step size:     n/a")?,
        }
        writeln!(f, "Workload length: {:6} s", c.workload_length_s)?;
        write!(
            f,
            "Workload type:   {:>6} ({})",
            c.profile.index(),
            c.profile.name()
        )
    }
}

/// Report every field of `config` to the operator.
pub fn current_settings<O: Operator>(operator: &mut O, config: &WorkloadConfig) {
    for line in SettingsReport::new(config).to_string().lines() {
        operator.report(line);
    }
}

/// Result of a successful setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetupOutcome {
    /// Replacement configuration.
    pub config: WorkloadConfig,
    /// Whether the period bounds were swapped to suit the profile.
    pub swapped: bool,
}

/// Prompt the operator for a complete replacement configuration.
///
/// Prompts run in a fixed order: start period, end period, ramp period, ramp
/// steps, workload length, workload type. Values that do not fit a field, and
/// workload types outside 0-3, are re-prompted.
///
/// # Errors
///
/// Returns [`EmuError::ZeroRampSteps`] or [`EmuError::ZeroPeriod`] if the
/// operator entered zero ramp steps or a zero period, or an I/O error if
/// operator input closed. `current` is never
/// modified; the caller keeps it on error.
pub fn setup<O: Operator>(operator: &mut O, current: &WorkloadConfig) -> EmuResult<SetupOutcome> {
    current_settings(operator, current);

    let mut config = WorkloadConfig {
        start_period_us: prompt_u32(operator, "Enter starting period (us): ")?,
        end_period_us: prompt_u32(operator, "Enter ending period (us): ")?,
        ramp_period_ms: prompt_u32(operator, "Enter ramp period (ms): ")?,
        ramp_steps: prompt_u32(operator, "Enter number of ramp steps: ")?,
        workload_length_s: prompt_u32(operator, "Enter length of workload (s): ")?,
        profile: prompt_profile(operator)?,
    };

    if let Err(e) = config.validate() {
        warn!(error = %e, "Setup rejected");
        operator.report(&format!("Settings rejected: {e}. Previous settings kept."));
        return Err(e);
    }

    let swapped = config.normalize_bounds();
    if swapped {
        warn!(profile = %config.profile, "Swapped start and end periods");
        operator.report(&format!(
            "Start and end periods swapped to suit the {} profile.",
            config.profile
        ));
    }

    current_settings(operator, &config);
    info!(?config, "Settings updated");

    Ok(SetupOutcome { config, swapped })
}

fn prompt_u32<O: Operator>(operator: &mut O, label: &str) -> EmuResult<u32> {
    loop {
        let value = operator.prompt_int(label)?;
        match u32::try_from(value) {
            Ok(v) => return Ok(v),
            Err(_) => operator.report(&format!(
                "Value {value} out of range (0-{}), try again.",
                u32::MAX
            )),
        }
    }
}

fn prompt_profile<O: Operator>(operator: &mut O) -> EmuResult<WaveformProfile> {
    let choices = WaveformProfile::ALL
        .iter()
        .map(|p| format!("{}={}", p.index(), p.name()))
        .collect::<Vec<_>>()
        .join(", ");
    let label = format!("Enter workload type ({choices}): ");

    loop {
        let value = operator.prompt_int(&label)?;
        match WaveformProfile::from_index(value) {
            Ok(profile) => return Ok(profile),
            Err(e @ EmuError::UnknownProfile(_)) => operator.report(&format!("{e}, try again.")),
            Err(e) => return Err(e),
        }
    }
}
