//! Tick timer and wall clock capability
//!
//! The simulator never reads time directly. It asks a [`TickTimer`] how many
//! tick periods have elapsed and what the wall clock says, so the tick loop
//! can be driven by real time, by a test, or not at all.
//!
//! - [`MonotonicTimer`]: real time from `std::time::Instant`
//! - [`ManualTimer`]: virtual time advanced through a [`ManualClock`]
//! - [`NoTimer`]: a host without timers; arming always fails

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use crate::error::TimerError;

/// Repeating timer plus wall clock, injected into the simulator.
pub trait TickTimer: Send {
    /// Start a repeating schedule with the given period. The first tick is
    /// due one full period after arming.
    ///
    /// # Errors
    ///
    /// Returns [`TimerError::Unsupported`] if the host cannot schedule ticks.
    fn arm(&mut self, interval: Duration) -> Result<(), TimerError>;

    /// Cancel the schedule. No tick is due afterwards until re-armed.
    fn disarm(&mut self);

    /// Consume and return the number of ticks due since the last call.
    fn take_due(&mut self) -> u64;

    /// Time until the next tick is due, or `None` when disarmed.
    fn until_next(&self) -> Option<Duration>;

    /// Wall clock in milliseconds since the Unix epoch.
    fn now_ms(&self) -> u64;
}

fn system_now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

// ============================================================================
// Monotonic Timer
// ============================================================================

#[derive(Clone, Copy, Debug)]
struct RealSchedule {
    interval: Duration,
    next_deadline: Instant,
}

/// Real-time timer backed by [`Instant`].
///
/// When the caller falls behind, overdue periods collapse into a single due
/// tick and the schedule realigns to the original phase. Ticks are never
/// queued up for catch-up.
#[derive(Debug, Default)]
pub struct MonotonicTimer {
    schedule: Option<RealSchedule>,
}

impl MonotonicTimer {
    /// Create a disarmed timer
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl TickTimer for MonotonicTimer {
    fn arm(&mut self, interval: Duration) -> Result<(), TimerError> {
        self.schedule = Some(RealSchedule {
            interval,
            next_deadline: Instant::now() + interval,
        });
        Ok(())
    }

    fn disarm(&mut self) {
        self.schedule = None;
    }

    fn take_due(&mut self) -> u64 {
        let Some(schedule) = self.schedule.as_mut() else {
            return 0;
        };

        let now = Instant::now();
        if now < schedule.next_deadline {
            return 0;
        }

        let late = now - schedule.next_deadline;
        let period = schedule.interval.as_nanos().max(1);
        let skipped = u64::try_from(late.as_nanos() / period).unwrap_or(u64::MAX);
        if skipped > 0 {
            tracing::debug!(skipped, "Coalescing overdue tick periods");
        }
        let phase = Duration::from_nanos(u64::try_from(late.as_nanos() % period).unwrap_or(0));
        schedule.next_deadline = now + schedule.interval - phase;
        1
    }

    fn until_next(&self) -> Option<Duration> {
        self.schedule
            .map(|s| s.next_deadline.saturating_duration_since(Instant::now()))
    }

    fn now_ms(&self) -> u64 {
        system_now_ms()
    }
}

// ============================================================================
// Manual Timer
// ============================================================================

/// Handle that advances a [`ManualTimer`]'s virtual time.
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    elapsed_ns: Arc<AtomicU64>,
}

impl ManualClock {
    /// Create a clock at virtual time zero
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Move virtual time forward
    pub fn advance(&self, by: Duration) {
        let nanos = u64::try_from(by.as_nanos()).unwrap_or(u64::MAX);
        self.elapsed_ns.fetch_add(nanos, Ordering::SeqCst);
    }

    /// Move virtual time forward by whole milliseconds
    pub fn advance_ms(&self, ms: u64) {
        self.advance(Duration::from_millis(ms));
    }

    /// Virtual time elapsed since creation
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        Duration::from_nanos(self.elapsed_ns.load(Ordering::SeqCst))
    }
}

/// Deterministic timer driven by a [`ManualClock`].
///
/// Every whole period that has elapsed yields one due tick, so advancing by
/// five intervals produces exactly five ticks.
#[derive(Debug)]
pub struct ManualTimer {
    clock: ManualClock,
    epoch_ms: u64,
    schedule: Option<(Duration, Duration)>,
}

impl ManualTimer {
    /// Create a timer and the clock that drives it. Wall clock readings start
    /// at `epoch_ms`.
    #[must_use]
    pub fn new(epoch_ms: u64) -> (Self, ManualClock) {
        let clock = ManualClock::new();
        let timer = Self {
            clock: clock.clone(),
            epoch_ms,
            schedule: None,
        };
        (timer, clock)
    }
}

impl TickTimer for ManualTimer {
    fn arm(&mut self, interval: Duration) -> Result<(), TimerError> {
        self.schedule = Some((interval, self.clock.elapsed() + interval));
        Ok(())
    }

    fn disarm(&mut self) {
        self.schedule = None;
    }

    fn take_due(&mut self) -> u64 {
        let Some((interval, next_deadline)) = self.schedule.as_mut() else {
            return 0;
        };

        let now = self.clock.elapsed();
        if now < *next_deadline {
            return 0;
        }

        let period = interval.as_nanos().max(1);
        let due = (now - *next_deadline).as_nanos() / period + 1;
        let due = u64::try_from(due).unwrap_or(u64::MAX);
        let advance = u32::try_from(due).unwrap_or(u32::MAX);
        *next_deadline += interval.saturating_mul(advance);
        due
    }

    fn until_next(&self) -> Option<Duration> {
        self.schedule
            .map(|(_, next)| next.saturating_sub(self.clock.elapsed()))
    }

    fn now_ms(&self) -> u64 {
        let elapsed = u64::try_from(self.clock.elapsed().as_millis()).unwrap_or(u64::MAX);
        self.epoch_ms.saturating_add(elapsed)
    }
}

// ============================================================================
// No Timer
// ============================================================================

/// Timer for hosts without scheduling support. Arming always fails.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoTimer;

impl TickTimer for NoTimer {
    fn arm(&mut self, _interval: Duration) -> Result<(), TimerError> {
        Err(TimerError::Unsupported)
    }

    fn disarm(&mut self) {}

    fn take_due(&mut self) -> u64 {
        0
    }

    fn until_next(&self) -> Option<Duration> {
        None
    }

    fn now_ms(&self) -> u64 {
        system_now_ms()
    }
}

// ============================================================================
// Tests
// ============================================================================
