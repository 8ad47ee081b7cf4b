//! Waveform-modulated pulse scheduler.
//!
//! The scheduler runs one emulation session as a timestamp-driven polling
//! loop. Each iteration:
//! 1. Samples the monotonic clock and feeds the delta to three independent
//!    elapsed clocks (step, progress, workload)
//! 2. Advances the ramp step and re-arms the pulse output when the step
//!    clock reaches the ramp period
//! 3. Emits a progress mark once per second
//! 4. Completes when the workload clock reaches the workload length
//! 5. Cancels when the operator presses the cancel key
//!
//! The pulse output free-runs between polls; the scheduler only reprograms
//! its period. It is disarmed on every exit path, including unwinding.

use crate::hal::{Clock, PulseOutput};
use crate::operator::Operator;
use crate::waveform::Ramp;
use plemu_common::config::{WaveformProfile, WorkloadConfig};
use plemu_common::error::{EmuError, EmuResult};
use plemu_common::metrics::{MetricsSnapshot, WorkloadMetrics};
use plemu_common::state::{StateMachine, WorkloadState};
use plemu_common::time::{ElapsedTimer, Timestamp};
use serde::Serialize;
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, trace, warn};

/// How a workload run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunOutcome {
    /// The workload length elapsed.
    Completed,
    /// The operator cancelled the run.
    Cancelled,
}

impl RunOutcome {
    fn state(self) -> WorkloadState {
        match self {
            Self::Completed => WorkloadState::Completed,
            Self::Cancelled => WorkloadState::Cancelled,
        }
    }
}

/// Completion report for one workload run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// How the run ended.
    pub outcome: RunOutcome,
    /// Profile that was run.
    pub profile: WaveformProfile,
    /// Workload clock at the end of the run, in milliseconds.
    pub elapsed_ms: u64,
    /// Step, poll, and period statistics.
    pub metrics: MetricsSnapshot,
}

impl RunReport {
    /// Workload clock at the end of the run.
    pub fn elapsed(&self) -> Duration {
        Duration::from_millis(self.elapsed_ms)
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self.outcome {
            RunOutcome::Completed => "Workload exiting! Completed",
            RunOutcome::Cancelled => "Workload cancelled",
        };
        write!(
            f,
            "{verb} after {} ({} steps",
            humantime::format_duration(self.elapsed()),
            self.metrics.steps
        )?;
        if let Some(period) = self.metrics.last_period_us {
            write!(f, ", last period {period} us")?;
        }
        write!(f, ").")
    }
}

/// Run state that exists only while a workload is running.
#[derive(Debug)]
struct RunState {
    ramp: Ramp,
    ramp_period_ms: u32,
    workload_length_s: u32,
    current_period_us: u32,
    current_step: u32,
    last_sample: Timestamp,
    workload_timer: ElapsedTimer,
    step_timer: ElapsedTimer,
    progress_timer: ElapsedTimer,
}

impl RunState {
    /// Feed the clock delta since the previous sample to all three clocks.
    fn sample(&mut self, now: Timestamp) {
        let delta = now.wrapping_since(self.last_sample);
        self.last_sample = now;
        self.workload_timer.advance(delta);
        self.step_timer.advance(delta);
        self.progress_timer.advance(delta);
    }

    fn step_due(&self) -> bool {
        self.ramp_period_ms != 0 && self.step_timer.elapsed_ms() >= u64::from(self.ramp_period_ms)
    }

    /// Move to the next ramp step and return its period.
    fn advance_step(&mut self) -> u32 {
        self.current_step = self.ramp.next_step(self.current_step);
        self.current_period_us = self
            .ramp
            .next_period(self.current_period_us, self.current_step);
        self.step_timer.restart();
        self.current_period_us
    }

    fn progress_due(&self) -> bool {
        self.progress_timer.elapsed_secs() >= 1
    }

    fn workload_done(&self) -> bool {
        self.workload_timer.elapsed_secs() >= u64::from(self.workload_length_s)
    }
}

/// Workload scheduler owning the clock and pulse output.
pub struct WorkloadScheduler<C: Clock, P: PulseOutput> {
    clock: C,
    pulse: P,
    /// Run state machine.
    state: StateMachine,
    /// Present only while running.
    run: Option<RunState>,
    /// Metrics for the current or most recent run.
    metrics: WorkloadMetrics,
}

impl<C: Clock, P: PulseOutput> WorkloadScheduler<C, P> {
    /// Create an idle scheduler.
    pub fn new(clock: C, pulse: P) -> Self {
        Self {
            clock,
            pulse,
            state: StateMachine::new(),
            run: None,
            metrics: WorkloadMetrics::new(),
        }
    }

    /// Get the current run state.
    pub fn state(&self) -> WorkloadState {
        self.state.state()
    }

    /// Get metrics for the current or most recent run.
    pub fn metrics(&self) -> &WorkloadMetrics {
        &self.metrics
    }

    /// Get the clock.
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Get the pulse output.
    pub fn pulse(&self) -> &P {
        &self.pulse
    }

    /// Period currently armed by the running workload.
    pub fn current_period_us(&self) -> Option<u32> {
        self.run.as_ref().map(|run| run.current_period_us)
    }

    /// Ramp step the running workload is on (1-based).
    pub fn current_step(&self) -> Option<u32> {
        self.run.as_ref().map(|run| run.current_step)
    }

    /// Disarm the output outside a run. A running workload is left alone.
    pub fn ensure_disarmed(&mut self) {
        if !self.state.state().is_running() {
            self.pulse.disarm();
        }
    }

    /// Enter RUNNING: compute the initial period, arm the output, and sample
    /// the clock into all three elapsed clocks.
    ///
    /// A configuration the ramp cannot be built from is rejected before the
    /// output is armed, and the output is left disarmed.
    pub fn start(&mut self, config: &WorkloadConfig) -> EmuResult<()> {
        let current = self.state.state();
        if !current.can_transition_to(WorkloadState::Running) {
            return Err(EmuError::InvalidStateTransition {
                from: current.to_string(),
                to: WorkloadState::Running.to_string(),
            });
        }

        let ramp = match Ramp::new(config) {
            Ok(ramp) => ramp,
            Err(e) => {
                warn!(error = %e, "Workload rejected");
                self.pulse.disarm();
                return Err(e);
            }
        };

        self.state.transition(WorkloadState::Running)?;
        self.metrics.reset();

        let period = ramp.initial_period();
        self.pulse.arm(period);
        self.metrics.record_armed(period);

        info!(
            profile = %config.profile,
            start_period_us = ramp.start_period_us(),
            end_period_us = ramp.end_period_us(),
            ramp_period_ms = config.ramp_period_ms,
            ramp_steps = config.ramp_steps,
            step_size_us = ramp.step_size_us(),
            workload_length_s = config.workload_length_s,
            initial_period_us = period,
            "Starting workload"
        );

        self.run = Some(RunState {
            ramp,
            ramp_period_ms: config.ramp_period_ms,
            workload_length_s: config.workload_length_s,
            current_period_us: period,
            current_step: 1,
            last_sample: self.clock.now(),
            workload_timer: ElapsedTimer::new(),
            step_timer: ElapsedTimer::new(),
            progress_timer: ElapsedTimer::new(),
        });

        Ok(())
    }

    /// Execute one polling iteration.
    ///
    /// Returns the completion report once the run reaches a terminal state.
    pub fn poll<O: Operator>(&mut self, operator: &mut O) -> EmuResult<Option<RunReport>> {
        let Some(run) = self.run.as_mut() else {
            return Err(EmuError::NotRunning);
        };
        self.metrics.record_poll();

        run.sample(self.clock.now());

        if run.step_due() {
            // Step before period: the sine is evaluated at the step now starting.
            let period = run.advance_step();
            self.pulse.arm(period);
            self.metrics.record_step(period);
            trace!(step = run.current_step, period_us = period, "Ramp step");
        }

        if run.progress_due() {
            run.progress_timer.restart();
            operator.report_inline(".");
            self.metrics.record_progress_mark();
        }

        let outcome = if run.workload_done() {
            Some(RunOutcome::Completed)
        } else if operator.poll_cancel() {
            Some(RunOutcome::Cancelled)
        } else {
            None
        };

        match outcome {
            Some(outcome) => self.finish(outcome, operator).map(Some),
            None => Ok(None),
        }
    }

    /// Run a complete workload: start, poll until a terminal state, report.
    ///
    /// This blocks the current thread.
    pub fn run<O: Operator>(
        &mut self,
        config: &WorkloadConfig,
        operator: &mut O,
    ) -> EmuResult<RunReport> {
        self.start(config)?;
        operator.report("Workload will pulse the output, running...");

        loop {
            if let Some(report) = self.poll(operator)? {
                return Ok(report);
            }
            self.clock.relax();
        }
    }

    /// Disarm the output, enter the terminal state, and emit the report.
    fn finish<O: Operator>(
        &mut self,
        outcome: RunOutcome,
        operator: &mut O,
    ) -> EmuResult<RunReport> {
        self.pulse.disarm();
        let run = self.run.take().ok_or(EmuError::NotRunning)?;
        self.state.transition(outcome.state())?;

        let report = RunReport {
            outcome,
            profile: run.ramp.profile(),
            elapsed_ms: run.workload_timer.elapsed_ms(),
            metrics: self.metrics.snapshot(),
        };

        // Ends the line of progress marks.
        operator.report("");
        operator.report(&report.to_string());

        info!(
            outcome = ?outcome,
            elapsed_ms = report.elapsed_ms,
            steps = report.metrics.steps,
            polls = report.metrics.polls,
            "Workload finished"
        );
        debug!(
            min_period_us = ?report.metrics.min_period_us,
            max_period_us = ?report.metrics.max_period_us,
            "Armed period range"
        );

        Ok(report)
    }
}

impl<C: Clock, P: PulseOutput> Drop for WorkloadScheduler<C, P> {
    fn drop(&mut self) {
        if self.state.state().is_running() {
            warn!("Scheduler dropped while running, disarming pulse output");
            self.pulse.disarm();
        }
    }
}
