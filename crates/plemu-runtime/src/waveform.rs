//! Waveform profile stepping.
//!
//! A [`Ramp`] captures the period bounds and step geometry of a workload and
//! computes the pulse period for each step of the active profile:
//!
//! | Profile | Rule | Wrap |
//! |---|---|---|
//! | sawtooth-up | `period + step_size` | past `end` → `start` |
//! | sawtooth-down | `period - step_size` | below `end` → `start` |
//! | sine | `start + (end - start) * (1 + 0.5 * sin(2π * step / steps))` | periodic |
//! | square | toggle `start` / `end` | none |

use plemu_common::config::{WaveformProfile, WorkloadConfig};
use plemu_common::error::{EmuError, EmuResult};
use std::f64::consts::TAU;
use tracing::warn;

/// Step geometry for one workload run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ramp {
    profile: WaveformProfile,
    start_period_us: u32,
    end_period_us: u32,
    steps: u32,
    step_size_us: u32,
}

impl Ramp {
    /// Build the ramp for `config`, swapping bounds that are backwards for
    /// its profile.
    ///
    /// # Errors
    ///
    /// Returns [`EmuError::ZeroRampSteps`] if the ramp has no steps, or
    /// [`EmuError::ZeroPeriod`] if either bound is zero.
    pub fn new(config: &WorkloadConfig) -> EmuResult<Self> {
        config.validate()?;
        let mut config = *config;
        if config.normalize_bounds() {
            warn!(
                profile = %config.profile,
                start_period_us = config.start_period_us,
                end_period_us = config.end_period_us,
                "Ramp bounds were backwards for profile, swapped"
            );
        }
        let step_size_us = config.ramp_step_size().ok_or(EmuError::ZeroRampSteps)?;

        Ok(Self {
            profile: config.profile,
            start_period_us: config.start_period_us,
            end_period_us: config.end_period_us,
            steps: config.ramp_steps,
            step_size_us,
        })
    }

    /// Active profile.
    pub fn profile(&self) -> WaveformProfile {
        self.profile
    }

    /// Period the ramp starts from.
    pub fn start_period_us(&self) -> u32 {
        self.start_period_us
    }

    /// Period the ramp heads towards.
    pub fn end_period_us(&self) -> u32 {
        self.end_period_us
    }

    /// Number of steps in one ramp.
    pub fn steps(&self) -> u32 {
        self.steps
    }

    /// Derived step size in microseconds.
    pub fn step_size_us(&self) -> u32 {
        self.step_size_us
    }

    /// Period armed before the first step.
    ///
    /// The sine profile is already offset by the waveform at step 1.
    pub fn initial_period(&self) -> u32 {
        match self.profile {
            WaveformProfile::Sine => self.sine_period(1),
            _ => self.start_period_us,
        }
    }

    /// Step counter value following `step`, wrapping to 1 after the last step.
    pub fn next_step(&self, step: u32) -> u32 {
        if step >= self.steps {
            1
        } else {
            step + 1
        }
    }

    /// Period for the step after `current_us`, with `step` being the step
    /// that is now starting.
    pub fn next_period(&self, current_us: u32, step: u32) -> u32 {
        match self.profile {
            WaveformProfile::SawtoothUp => {
                let next = current_us.saturating_add(self.step_size_us);
                if next > self.end_period_us {
                    self.start_period_us
                } else {
                    next
                }
            }
            WaveformProfile::SawtoothDown => match current_us.checked_sub(self.step_size_us) {
                Some(next) if next >= self.end_period_us => next,
                _ => self.start_period_us,
            },
            WaveformProfile::Sine => self.sine_period(step),
            WaveformProfile::Square => {
                if current_us == self.start_period_us {
                    self.end_period_us
                } else {
                    self.start_period_us
                }
            }
        }
    }

    /// Sine profile period at `step`.
    pub fn sine_period(&self, step: u32) -> u32 {
        let start = f64::from(self.start_period_us);
        let span = f64::from(self.end_period_us) - start;
        let phase = TAU * f64::from(step) / f64::from(self.steps);
        let period = start + span * (1.0 + 0.5 * phase.sin());
        period.round().clamp(0.0, f64::from(u32::MAX)) as u32
    }
}
