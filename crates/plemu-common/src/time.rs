//! Monotonic time helpers.
//!
//! The emulator's clock is a free-running 32-bit microsecond counter that
//! wraps roughly every 71 minutes. All differences go through wrapping
//! subtraction so a wrap between two samples is never mistaken for time
//! running backwards.

use serde::{Deserialize, Serialize};

/// Microseconds per millisecond.
pub const MICROS_PER_MILLI: u64 = 1_000;

/// Microseconds per second.
pub const MICROS_PER_SECOND: u64 = 1_000_000;

/// A sample of the free-running microsecond clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Timestamp(pub u32);

impl Timestamp {
    /// Microseconds elapsed since `earlier`, tolerant of one counter wrap.
    #[inline]
    #[must_use]
    pub fn wrapping_since(self, earlier: Timestamp) -> u32 {
        self.0.wrapping_sub(earlier.0)
    }

    /// Timestamp `micros` after this one, wrapping at the counter width.
    #[inline]
    #[must_use]
    pub fn wrapping_add(self, micros: u32) -> Timestamp {
        Timestamp(self.0.wrapping_add(micros))
    }
}

/// Accumulates elapsed time from successive clock deltas.
///
/// Each timer counts in 64 bits, so it keeps measuring correctly across any
/// number of 32-bit counter wraps as long as it is fed at least once per wrap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ElapsedTimer {
    elapsed_us: u64,
}

impl ElapsedTimer {
    /// Create a timer at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a clock delta.
    #[inline]
    pub fn advance(&mut self, delta_us: u32) {
        self.elapsed_us = self.elapsed_us.saturating_add(u64::from(delta_us));
    }

    /// Restart counting from zero.
    #[inline]
    pub fn restart(&mut self) {
        self.elapsed_us = 0;
    }

    /// Elapsed whole milliseconds.
    #[must_use]
    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_us / MICROS_PER_MILLI
    }

    /// Elapsed whole seconds.
    #[must_use]
    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed_us / MICROS_PER_SECOND
    }
}
