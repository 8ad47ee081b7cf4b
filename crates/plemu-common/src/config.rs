//! Configuration structures for the power loss emulator.
//!
//! The [`WorkloadConfig`] record holds the ramp parameters the scheduler
//! reads during a run. [`EmulatorConfig`] wraps it together with host-side
//! settings and supports TOML deserialization with the firmware defaults.

use crate::error::{EmuError, EmuResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

/// Waveform profile governing how the pulse period evolves across steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum WaveformProfile {
    /// Period grows by one step size per step, wrapping back to the start.
    #[default]
    SawtoothUp,
    /// Period shrinks by one step size per step, wrapping back to the start.
    SawtoothDown,
    /// Period follows a sine offset from the start period.
    Sine,
    /// Period toggles between the start and end periods.
    Square,
}

impl WaveformProfile {
    /// All profiles in operator menu order.
    pub const ALL: [WaveformProfile; 4] = [
        WaveformProfile::SawtoothUp,
        WaveformProfile::SawtoothDown,
        WaveformProfile::Sine,
        WaveformProfile::Square,
    ];

    /// Look up a profile by its operator menu index.
    ///
    /// Out-of-range indices are rejected rather than masked into range.
    pub fn from_index(index: i64) -> EmuResult<Self> {
        usize::try_from(index)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
            .ok_or(EmuError::UnknownProfile(index))
    }

    /// Operator menu index of this profile.
    #[must_use]
    pub fn index(self) -> u8 {
        match self {
            Self::SawtoothUp => 0,
            Self::SawtoothDown => 1,
            Self::Sine => 2,
            Self::Square => 3,
        }
    }

    /// Textual profile name as shown to the operator.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::SawtoothUp => "sawtooth-up",
            Self::SawtoothDown => "sawtooth-down",
            Self::Sine => "sine",
            Self::Square => "square",
        }
    }

    /// Returns true if the derived ramp step size drives this profile.
    #[must_use]
    pub fn uses_step_size(self) -> bool {
        matches!(self, Self::SawtoothUp | Self::SawtoothDown)
    }

    /// Check whether `start`/`end` are ordered the way this profile requires.
    #[must_use]
    pub fn accepts_bounds(self, start_us: u32, end_us: u32) -> bool {
        match self {
            Self::SawtoothUp | Self::Sine => start_us <= end_us,
            Self::SawtoothDown => start_us >= end_us,
            Self::Square => true,
        }
    }
}

impl fmt::Display for WaveformProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Ramp and workload parameters read by the scheduler during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkloadConfig {
    /// Period the ramp starts from, in microseconds.
    pub start_period_us: u32,

    /// Period the ramp heads towards, in microseconds.
    pub end_period_us: u32,

    /// Dwell time at each step before advancing, in milliseconds (0 = never step).
    pub ramp_period_ms: u32,

    /// Number of discrete steps across the ramp. Must be non-zero.
    pub ramp_steps: u32,

    /// Total session duration in seconds.
    pub workload_length_s: u32,

    /// Waveform profile.
    pub profile: WaveformProfile,
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            start_period_us: 100,
            end_period_us: 500,
            ramp_period_ms: 1000,
            ramp_steps: 10,
            workload_length_s: 30,
            profile: WaveformProfile::SawtoothUp,
        }
    }
}

impl WorkloadConfig {
    /// Derived step size `|end - start| / ramp_steps` in microseconds.
    ///
    /// Returns `None` when `ramp_steps` is zero.
    #[must_use]
    pub fn ramp_step_size(&self) -> Option<u32> {
        self.start_period_us
            .abs_diff(self.end_period_us)
            .checked_div(self.ramp_steps)
    }

    /// Reject configurations the scheduler cannot run.
    ///
    /// Zero ramp steps leave no step size, and a zero bound would be armed
    /// as a disarm.
    pub fn validate(&self) -> EmuResult<()> {
        if self.ramp_steps == 0 {
            return Err(EmuError::ZeroRampSteps);
        }
        if self.start_period_us == 0 || self.end_period_us == 0 {
            return Err(EmuError::ZeroPeriod);
        }
        Ok(())
    }

    /// Returns true if the period bounds are ordered the way the profile requires.
    #[must_use]
    pub fn bounds_ordered(&self) -> bool {
        self.profile
            .accepts_bounds(self.start_period_us, self.end_period_us)
    }

    /// Swap the period bounds if they are backwards for the profile.
    ///
    /// Returns true if a swap happened.
    pub fn normalize_bounds(&mut self) -> bool {
        if self.bounds_ordered() {
            return false;
        }
        std::mem::swap(&mut self.start_period_us, &mut self.end_period_us);
        true
    }
}

/// Top-level emulator configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmulatorConfig {
    /// Workload ramp parameters used at startup.
    pub workload: WorkloadConfig,

    /// Scheduler polling configuration.
    pub scheduler: SchedulerConfig,

    /// Pulse output configuration.
    pub pulse: PulseConfig,
}

/// Scheduler polling configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Idle time between scheduler polls (0 = busy-poll).
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::ZERO,
        }
    }
}

/// Host backend driving the pulse output line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PulseBackend {
    /// Log every arm/disarm through `tracing`.
    #[default]
    Trace,
    /// Discard pulse programming.
    Null,
}

/// Pulse output configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PulseConfig {
    /// Backend used when no hardware output is attached.
    pub output: PulseBackend,
}

impl EmulatorConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or validated.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// The workload section is validated and its bounds are normalized for
    /// the chosen profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid or the workload is rejected.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validated()
    }

    /// Validate the workload section and normalize its bounds.
    ///
    /// # Errors
    ///
    /// Returns an error if the workload cannot be run.
    pub fn validated(mut self) -> Result<Self, ConfigError> {
        self.workload.validate()?;
        if self.workload.normalize_bounds() {
            warn!(
                profile = %self.workload.profile,
                start_period_us = self.workload.start_period_us,
                end_period_us = self.workload.end_period_us,
                "Period bounds were backwards for profile, swapped"
            );
        }
        Ok(self)
    }

    /// Serialize configuration to TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File I/O error.
    #[error("failed to read config file {path}: {source}")]
    Io {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// TOML parsing error.
    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// TOML serialization error.
    #[error("failed to serialize TOML: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// Parsed values cannot be run.
    #[error("invalid workload: {0}")]
    Invalid(#[from] EmuError),
}

/// Serde helper module for `Duration` using humantime format.
mod humantime_serde {
    use serde::{self, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let s = humantime::format_duration(*duration).to_string();
        serializer.serialize_str(&s)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}
