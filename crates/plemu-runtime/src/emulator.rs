//! Command facade invoked by the menu dispatcher.
//!
//! [`Emulator`] owns the active workload configuration and the scheduler.
//! Its commands take no arguments beyond the operator, report their own
//! errors, and hand a [`CommandStatus`] back to the dispatcher.

use crate::hal::{Clock, PulseOutput};
use crate::operator::Operator;
use crate::scheduler::{RunReport, WorkloadScheduler};
use crate::settings;
use plemu_common::config::WorkloadConfig;
use plemu_common::error::EmuResult;
use std::fmt;
use tracing::{error, info, warn};

/// Result of a dispatched command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandStatus {
    /// The command did what was asked.
    Success,
    /// The command failed and reported why.
    Failure,
}

impl CommandStatus {
    /// Returns true for [`CommandStatus::Success`].
    pub fn is_success(self) -> bool {
        self == Self::Success
    }
}

/// Commands exposed to the menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Prompt for a new configuration.
    Setup,
    /// Show the active configuration.
    CurrentSettings,
    /// Run the active configuration.
    RunWorkload,
}

impl Command {
    /// All commands in menu order.
    pub const ALL: [Self; 3] = [Self::Setup, Self::CurrentSettings, Self::RunWorkload];

    /// Short menu name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Setup => "Setup",
            Self::CurrentSettings => "Current settings",
            Self::RunWorkload => "Run workload",
        }
    }

    /// One-line menu description.
    pub fn description(self) -> &'static str {
        match self {
            Self::Setup => "Configure the power loss emulation workload",
            Self::CurrentSettings => "Show the current workload settings",
            Self::RunWorkload => "Pulse the output with the configured waveform",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Power-loss emulator: active configuration plus workload scheduler.
pub struct Emulator<C: Clock, P: PulseOutput> {
    config: WorkloadConfig,
    scheduler: WorkloadScheduler<C, P>,
    last_report: Option<RunReport>,
}

impl<C: Clock, P: PulseOutput> Emulator<C, P> {
    /// Create an emulator with `config` active.
    ///
    /// Bounds backwards for the profile are swapped here as in
    /// [`Emulator::replace_config`]. Validation is left to the run, so a
    /// configuration that cannot run is reported when the workload starts.
    pub fn new(mut config: WorkloadConfig, clock: C, pulse: P) -> Self {
        if config.normalize_bounds() {
            warn!(profile = %config.profile, "Swapped start and end periods");
        }
        Self {
            config,
            scheduler: WorkloadScheduler::new(clock, pulse),
            last_report: None,
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &WorkloadConfig {
        &self.config
    }

    /// Replace the active configuration, e.g. after a configuration reload.
    ///
    /// The replacement is validated and its bounds normalized first; on error
    /// the active configuration is kept.
    pub fn replace_config(&mut self, mut config: WorkloadConfig) -> EmuResult<()> {
        config.validate()?;
        config.normalize_bounds();
        info!(?config, "Workload configuration replaced");
        self.config = config;
        Ok(())
    }

    /// Scheduler, for inspection.
    pub fn scheduler(&self) -> &WorkloadScheduler<C, P> {
        &self.scheduler
    }

    /// Report of the most recent run.
    pub fn last_report(&self) -> Option<&RunReport> {
        self.last_report.as_ref()
    }

    /// Interactively replace the active configuration.
    ///
    /// A rejected configuration leaves the active one unchanged and the
    /// pulse output disarmed.
    pub fn setup<O: Operator>(&mut self, operator: &mut O) -> CommandStatus {
        match settings::setup(operator, &self.config) {
            Ok(outcome) => {
                self.config = outcome.config;
                CommandStatus::Success
            }
            Err(e) => {
                error!(error = %e, "Setup failed");
                self.scheduler.ensure_disarmed();
                CommandStatus::Failure
            }
        }
    }

    /// Report the active configuration.
    pub fn current_settings<O: Operator>(&mut self, operator: &mut O) -> CommandStatus {
        settings::current_settings(operator, &self.config);
        CommandStatus::Success
    }

    /// Run the active configuration until it completes or is cancelled.
    pub fn run_workload<O: Operator>(&mut self, operator: &mut O) -> CommandStatus {
        let config = self.config;
        match self.scheduler.run(&config, operator) {
            Ok(report) => {
                self.last_report = Some(report);
                CommandStatus::Success
            }
            Err(e) => {
                error!(error = %e, "Workload failed");
                operator.report(&format!("Workload not run: {e}."));
                self.scheduler.ensure_disarmed();
                CommandStatus::Failure
            }
        }
    }

    /// Execute `command`.
    pub fn dispatch<O: Operator>(
        &mut self,
        command: Command,
        operator: &mut O,
    ) -> CommandStatus {
        info!(%command, "Dispatching command");
        match command {
            Command::Setup => self.setup(operator),
            Command::CurrentSettings => self.current_settings(operator),
            Command::RunWorkload => self.run_workload(operator),
        }
    }
}
