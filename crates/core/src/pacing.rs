//! Fixed-period frame pacing driven by an idle callback.
//!
//! The event loop polls [`FramePacer`] with the time elapsed since start.
//! A tick fires once the next deadline has passed; the deadline then moves
//! to the first period boundary after the polled time, so a slow idle
//! callback skips frames instead of firing several in a row, and a fast
//! one never fires twice within the same period.

use std::time::Duration;

use crate::error::HarnessError;

/// One firing of the pacer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTick {
    /// Time since start at which the tick was observed.
    pub elapsed: Duration,
    /// Whole periods that passed without a tick before this one.
    pub skipped: u64,
}

impl FrameTick {
    /// Elapsed time in milliseconds, as uploaded to the `time` uniform.
    pub fn time_ms(&self) -> f32 {
        self.elapsed.as_secs_f32() * 1000.0
    }
}

/// Deadline-based frame scheduler.
#[derive(Debug, Clone)]
pub struct FramePacer {
    period: Duration,
    next_due: Duration,
}

impl FramePacer {
    /// Creates a pacer with an explicit period. The first tick is due
    /// immediately.
    ///
    /// # Errors
    ///
    /// Returns `HarnessError::Config` for a zero period.
    pub fn new(period: Duration) -> Result<Self, HarnessError> {
        if period.is_zero() {
            return Err(HarnessError::Config("frame period must be non-zero".into()));
        }
        Ok(Self {
            period,
            next_due: Duration::ZERO,
        })
    }

    /// Creates a pacer firing `hz` times per second.
    ///
    /// # Errors
    ///
    /// Returns `HarnessError::Config` if `hz` is zero.
    pub fn from_rate(hz: u32) -> Result<Self, HarnessError> {
        if hz == 0 {
            return Err(HarnessError::Config("frame rate must be positive".into()));
        }
        Self::new(Duration::from_secs(1) / hz)
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Time since start at which the next tick becomes due.
    pub fn next_deadline(&self) -> Duration {
        self.next_due
    }

    /// Returns a tick if the deadline has been reached at `elapsed`.
    pub fn poll(&mut self, elapsed: Duration) -> Option<FrameTick> {
        if elapsed < self.next_due {
            return None;
        }
        let late = elapsed - self.next_due;
        let skipped = (late.as_nanos() / self.period.as_nanos()) as u64;
        let advance = self.period.as_nanos() * (u128::from(skipped) + 1);
        self.next_due += Duration::from_nanos(advance as u64);
        Some(FrameTick { elapsed, skipped })
    }
}
