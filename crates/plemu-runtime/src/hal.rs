//! Hardware ports for the pulse scheduler.
//!
//! The scheduler never touches timer or GPIO registers directly. It talks to
//! two narrow interfaces:
//!
//! - [`Clock`]: a free-running 32-bit microsecond counter
//! - [`PulseOutput`]: periodic triggering of the power-loss pulse line
//!
//! Host implementations live here; simulated ones for tests are behind the
//! `simulated` feature.

use plemu_common::config::PulseBackend;
use plemu_common::time::Timestamp;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Monotonic microsecond clock.
///
/// Readings wrap at the 32-bit counter width; callers must compare samples
/// with [`Timestamp::wrapping_since`].
pub trait Clock {
    /// Sample the counter.
    fn now(&self) -> Timestamp;

    /// Idle between two scheduler polls.
    ///
    /// The default is a spin-loop hint, which keeps the loop a pure busy-poll.
    fn relax(&self) {
        std::hint::spin_loop();
    }
}

/// Periodic pulse output control.
///
/// While armed, the output fires one pulse every `period_us` microseconds on
/// its own; the scheduler only reprograms the period.
pub trait PulseOutput {
    /// Program periodic triggering at `period_us`. `arm(0)` disarms.
    fn arm(&mut self, period_us: u32);

    /// Stop periodic triggering.
    fn disarm(&mut self) {
        self.arm(0);
    }

    /// Currently programmed period, or `None` when disarmed.
    fn armed_period(&self) -> Option<u32>;

    /// Check if the output is currently triggering.
    fn is_armed(&self) -> bool {
        self.armed_period().is_some()
    }
}

impl<P: PulseOutput + ?Sized> PulseOutput for Box<P> {
    fn arm(&mut self, period_us: u32) {
        (**self).arm(period_us);
    }

    fn disarm(&mut self) {
        (**self).disarm();
    }

    fn armed_period(&self) -> Option<u32> {
        (**self).armed_period()
    }
}

/// Host clock backed by `std::time::Instant`.
#[derive(Debug, Clone)]
pub struct MonotonicClock {
    origin: Instant,
    poll_interval: Duration,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock {
    /// Create a busy-polling clock starting at zero.
    pub fn new() -> Self {
        Self::with_poll_interval(Duration::ZERO)
    }

    /// Create a clock that sleeps `poll_interval` between scheduler polls.
    pub fn with_poll_interval(poll_interval: Duration) -> Self {
        Self {
            origin: Instant::now(),
            poll_interval,
        }
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Timestamp {
        // Truncation to the counter width is the wrap.
        Timestamp(self.origin.elapsed().as_micros() as u32)
    }

    fn relax(&self) {
        if self.poll_interval.is_zero() {
            std::hint::spin_loop();
        } else {
            std::thread::sleep(self.poll_interval);
        }
    }
}

/// Pulse output that records programming through `tracing`.
///
/// Used on hosts without a pulse line attached.
#[derive(Debug, Default)]
pub struct TracingPulseOutput {
    period_us: Option<u32>,
}

impl TracingPulseOutput {
    /// Create a disarmed output.
    pub fn new() -> Self {
        Self::default()
    }
}

impl PulseOutput for TracingPulseOutput {
    fn arm(&mut self, period_us: u32) {
        if period_us == 0 {
            if self.period_us.take().is_some() {
                info!("Pulse output disarmed");
            }
            return;
        }
        self.period_us = Some(period_us);
        debug!(period_us, "Pulse output armed");
    }

    fn armed_period(&self) -> Option<u32> {
        self.period_us
    }
}

/// Pulse output that only tracks its programmed period.
#[derive(Debug, Default)]
pub struct NullPulseOutput {
    period_us: Option<u32>,
}

impl PulseOutput for NullPulseOutput {
    fn arm(&mut self, period_us: u32) {
        self.period_us = (period_us != 0).then_some(period_us);
    }

    fn armed_period(&self) -> Option<u32> {
        self.period_us
    }
}

/// Create the host pulse output selected by configuration.
pub fn create_pulse_output(backend: PulseBackend) -> Box<dyn PulseOutput + Send> {
    match backend {
        PulseBackend::Trace => {
            info!("Using tracing pulse output");
            Box::new(TracingPulseOutput::new())
        }
        PulseBackend::Null => {
            info!("Using null pulse output");
            Box::new(NullPulseOutput::default())
        }
    }
}

#[cfg(feature = "simulated")]
pub use simulated::{PulseEvent, SimulatedClock, SimulatedPulseOutput};

#[cfg(feature = "simulated")]
mod simulated {
    use super::{Clock, PulseOutput};
    use plemu_common::time::Timestamp;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex, MutexGuard};

    /// Controllable clock for testing.
    ///
    /// Clones share the same counter, so a test can keep a handle and
    /// advance time while the scheduler owns another. With a non-zero tick
    /// the clock advances by that amount on every [`Clock::relax`], which
    /// lets a whole run execute deterministically.
    #[derive(Debug, Clone, Default)]
    pub struct SimulatedClock {
        now_us: Arc<AtomicU32>,
        tick_us: u32,
    }

    impl SimulatedClock {
        /// Create a manually advanced clock at zero.
        pub fn new() -> Self {
            Self::default()
        }

        /// Create a clock that advances `tick_us` per scheduler poll.
        pub fn with_tick(tick_us: u32) -> Self {
            Self {
                now_us: Arc::new(AtomicU32::new(0)),
                tick_us,
            }
        }

        /// Start the counter at `now_us` (e.g. just below the wrap).
        #[must_use]
        pub fn starting_at(self, now_us: u32) -> Self {
            self.now_us.store(now_us, Ordering::Relaxed);
            self
        }

        /// Move the counter forward, wrapping at the counter width.
        pub fn advance(&self, micros: u32) {
            self.now_us.fetch_add(micros, Ordering::Relaxed);
        }
    }

    impl Clock for SimulatedClock {
        fn now(&self) -> Timestamp {
            Timestamp(self.now_us.load(Ordering::Relaxed))
        }

        fn relax(&self) {
            if self.tick_us > 0 {
                self.advance(self.tick_us);
            }
        }
    }

    /// Pulse programming event recorded by [`SimulatedPulseOutput`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum PulseEvent {
        /// Armed at the given period.
        Armed(u32),
        /// Disarmed.
        Disarmed,
    }

    #[derive(Debug, Default)]
    struct PulseLog {
        period_us: Option<u32>,
        events: Vec<PulseEvent>,
    }

    /// Pulse output that records every programming request.
    ///
    /// Clones share the same log, so it stays inspectable after the owning
    /// scheduler is dropped.
    #[derive(Debug, Clone, Default)]
    pub struct SimulatedPulseOutput {
        log: Arc<Mutex<PulseLog>>,
    }

    impl SimulatedPulseOutput {
        /// Create a disarmed output with an empty log.
        pub fn new() -> Self {
            Self::default()
        }

        fn lock(&self) -> MutexGuard<'_, PulseLog> {
            // A panicking test thread must not hide the log from the others.
            self.log.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
        }

        /// All programming events so far.
        pub fn events(&self) -> Vec<PulseEvent> {
            self.lock().events.clone()
        }

        /// Periods armed so far, in order.
        pub fn armed_periods(&self) -> Vec<u32> {
            self.lock()
                .events
                .iter()
                .filter_map(|event| match event {
                    PulseEvent::Armed(period) => Some(*period),
                    PulseEvent::Disarmed => None,
                })
                .collect()
        }

        /// Most recent event, if any.
        pub fn last_event(&self) -> Option<PulseEvent> {
            self.lock().events.last().copied()
        }
    }

    impl PulseOutput for SimulatedPulseOutput {
        fn arm(&mut self, period_us: u32) {
            let mut log = self.lock();
            if period_us == 0 {
                log.period_us = None;
                log.events.push(PulseEvent::Disarmed);
            } else {
                log.period_us = Some(period_us);
                log.events.push(PulseEvent::Armed(period_us));
            }
        }

        fn armed_period(&self) -> Option<u32> {
            self.lock().period_us
        }
    }
}
