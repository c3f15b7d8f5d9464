//! Monotonic Timing
//!
//! Tick-based wall-clock measurement around a child process lifetime.
//! Ticks come from `CLOCK_MONOTONIC`, so the measurement is unaffected by
//! wall-clock adjustments while the child runs.

use thiserror::Error;

/// Tick rate of [`MonotonicClock`] (nanosecond resolution).
pub const NANOS_PER_SECOND: u64 = 1_000_000_000;

/// Ticks-per-second divisor that turns a tick frequency into ticks per millisecond.
const MILLIS_PER_SECOND: u64 = 1_000;

/// Errors raised by the clock. Every variant means the execution environment
/// cannot be timed at all.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClockError {
    /// The tick frequency could not be queried
    #[error("high-resolution clock unavailable: {0}")]
    Unavailable(String),

    /// The clock answered with a frequency of zero
    #[error("high-resolution clock reported a zero tick frequency")]
    ZeroFrequency,
}

// ─── Clock ───────────────────────────────────────────────────────────────────

/// Source of monotonic ticks.
pub trait Clock {
    /// Ticks per second, or `None` when the clock cannot be queried.
    fn frequency(&self) -> Option<u64>;

    /// Current tick count.
    fn now(&self) -> u64;
}

/// `CLOCK_MONOTONIC` read through libc.
#[derive(Debug, Clone, Copy, Default)]
pub struct MonotonicClock;

impl MonotonicClock {
    /// Create a clock handle
    pub fn new() -> Self {
        Self
    }
}

impl Clock for MonotonicClock {
    fn frequency(&self) -> Option<u64> {
        let mut res = libc::timespec {
            tv_sec: 0,
            tv_nsec: 0,
        };
        // SAFETY: `res` is a valid, writable timespec for the duration of the call.
        let ret = unsafe { libc::clock_getres(libc::CLOCK_MONOTONIC, &mut res) };
        if ret != 0 {
            return None;
        }
        Some(NANOS_PER_SECOND)
    }

    #[inline(always)]
    fn now(&self) -> u64 {
        let mut ts = libc::timespec {
            tv_sec: 0,
            tv_nsec: 0,
        };
        // SAFETY: `ts` is a valid, writable timespec. CLOCK_MONOTONIC is
        // mandatory on every supported Unix, and `frequency()` has already
        // been checked before any sample reads ticks.
        unsafe {
            libc::clock_gettime(libc::CLOCK_MONOTONIC, &mut ts);
        }
        (ts.tv_sec as u64)
            .saturating_mul(NANOS_PER_SECOND)
            .saturating_add(ts.tv_nsec as u64)
    }
}

// ─── PerformanceSample ───────────────────────────────────────────────────────

/// One wall-clock (and CPU-time) measurement of a child process.
///
/// Created zeroed, started right before the child is spawned and stopped
/// right after it is reaped. CPU fields are filled in afterwards from the
/// child's resource accounting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PerformanceSample {
    start_tick: u64,
    end_tick: u64,
    tick_frequency: u64,
    running: bool,
    has_finished: bool,
    kernel_millis: u64,
    user_millis: u64,
}

impl PerformanceSample {
    /// Create a zeroed sample
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the tick frequency and record the start tick.
    ///
    /// Fails when the clock frequency cannot be queried or is zero.
    pub fn start(&mut self, clock: &impl Clock) -> Result<(), ClockError> {
        let frequency = clock
            .frequency()
            .ok_or_else(|| ClockError::Unavailable(std::io::Error::last_os_error().to_string()))?;
        if frequency == 0 {
            return Err(ClockError::ZeroFrequency);
        }

        self.tick_frequency = frequency;
        self.has_finished = false;
        self.running = true;
        self.start_tick = clock.now();
        Ok(())
    }

    /// Record the end tick. Does nothing unless the sample is running, so a
    /// second call never moves the end tick.
    pub fn stop(&mut self, clock: &impl Clock) {
        if self.running {
            self.end_tick = clock.now();
            self.running = false;
            self.has_finished = true;
        }
    }

    /// Attach the child's CPU accounting
    pub fn set_cpu_times(&mut self, user_millis: u64, kernel_millis: u64) {
        self.user_millis = user_millis;
        self.kernel_millis = kernel_millis;
    }

    /// Whether `start` has run and `stop` has not
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Whether a complete start/stop pair has been recorded
    pub fn has_finished(&self) -> bool {
        self.has_finished
    }

    /// Raw start tick
    pub fn start_tick(&self) -> u64 {
        self.start_tick
    }

    /// Raw end tick (meaningless until [`has_finished`](Self::has_finished))
    pub fn end_tick(&self) -> u64 {
        self.end_tick
    }

    /// Ticks per second captured at start
    pub fn tick_frequency(&self) -> u64 {
        self.tick_frequency
    }

    /// Elapsed ticks, zero until finished
    pub fn elapsed_ticks(&self) -> u64 {
        if !self.has_finished {
            return 0;
        }
        self.end_tick.saturating_sub(self.start_tick)
    }

    /// Elapsed wall time in whole milliseconds:
    /// `ticks / (frequency / 1000)`.
    pub fn elapsed_millis(&self) -> u64 {
        let ticks_per_milli = self.tick_frequency / MILLIS_PER_SECOND;
        if ticks_per_milli == 0 {
            // Clocks slower than 1 kHz: scale up first instead.
            return self
                .elapsed_ticks()
                .saturating_mul(MILLIS_PER_SECOND)
                .checked_div(self.tick_frequency)
                .unwrap_or(0);
        }
        self.elapsed_ticks() / ticks_per_milli
    }

    /// User-mode CPU time of the child in milliseconds
    pub fn user_millis(&self) -> u64 {
        self.user_millis
    }

    /// Kernel-mode CPU time of the child in milliseconds
    pub fn kernel_millis(&self) -> u64 {
        self.kernel_millis
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::time::Duration;

    /// Clock that advances by a fixed step on every read
    struct SteppingClock {
        frequency: Option<u64>,
        tick: Cell<u64>,
        step: u64,
    }

    impl SteppingClock {
        fn new(frequency: Option<u64>, step: u64) -> Self {
            Self {
                frequency,
                tick: Cell::new(0),
                step,
            }
        }
    }

    impl Clock for SteppingClock {
        fn frequency(&self) -> Option<u64> {
            self.frequency
        }

        fn now(&self) -> u64 {
            let t = self.tick.get() + self.step;
            self.tick.set(t);
            t
        }
    }

    #[test]
    fn test_monotonic_clock_available() {
        let clock = MonotonicClock::new();
        assert_eq!(clock.frequency(), Some(NANOS_PER_SECOND));
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a, "monotonic clock went backwards");
    }

    #[test]
    fn test_sample_measures_sleep() {
        let clock = MonotonicClock::new();
        let mut sample = PerformanceSample::new();
        sample.start(&clock).unwrap();
        std::thread::sleep(Duration::from_millis(10));
        sample.stop(&clock);

        assert!(sample.has_finished());
        // Should be at least 10ms
        assert!(sample.elapsed_millis() >= 10);
        // Should be less than 1s (accounting for scheduling)
        assert!(sample.elapsed_millis() < 1_000);
    }

    #[test]
    fn test_stop_twice_keeps_end_tick() {
        let clock = SteppingClock::new(Some(1_000), 5);
        let mut sample = PerformanceSample::new();
        sample.start(&clock).unwrap();
        sample.stop(&clock);
        let first = sample.end_tick();

        sample.stop(&clock);
        assert_eq!(sample.end_tick(), first);
        assert!(!sample.is_running());
    }

    #[test]
    fn test_stop_without_start_is_noop() {
        let clock = SteppingClock::new(Some(1_000), 5);
        let mut sample = PerformanceSample::new();
        sample.stop(&clock);
        assert!(!sample.has_finished());
        assert_eq!(sample.end_tick(), 0);
        assert_eq!(sample.elapsed_millis(), 0);
    }

    #[test]
    fn test_unavailable_clock_fails_start() {
        let clock = SteppingClock::new(None, 1);
        let mut sample = PerformanceSample::new();
        assert!(matches!(
            sample.start(&clock),
            Err(ClockError::Unavailable(_))
        ));
        assert!(!sample.is_running());
    }

    #[test]
    fn test_zero_frequency_fails_start() {
        let clock = SteppingClock::new(Some(0), 1);
        let mut sample = PerformanceSample::new();
        assert_eq!(sample.start(&clock), Err(ClockError::ZeroFrequency));
    }

    #[test]
    fn test_elapsed_millis_from_ticks() {
        // 10 MHz clock, one read = 70.5ms worth of ticks
        let clock = SteppingClock::new(Some(10_000_000), 705_000);
        let mut sample = PerformanceSample::new();
        sample.start(&clock).unwrap();
        sample.stop(&clock);
        assert_eq!(sample.elapsed_ticks(), 705_000);
        assert_eq!(sample.elapsed_millis(), 70);
        assert_eq!(sample.tick_frequency(), 10_000_000);
        assert_eq!(sample.end_tick() - sample.start_tick(), 705_000);
    }

    #[test]
    fn test_low_frequency_clock() {
        // 100 Hz: one tick = 10ms
        let clock = SteppingClock::new(Some(100), 3);
        let mut sample = PerformanceSample::new();
        sample.start(&clock).unwrap();
        sample.stop(&clock);
        assert_eq!(sample.elapsed_millis(), 30);
    }
}
