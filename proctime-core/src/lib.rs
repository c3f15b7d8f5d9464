#![warn(missing_docs)]
//! proctime Core - Timing Primitives
//!
//! This crate provides the measurement side of the harness:
//! - `Clock` / `MonotonicClock` tick sources
//! - `PerformanceSample` start/stop bookkeeping around a child process
//! - Child reaping with CPU accounting through `wait4`
//! - `DurationParts` minute/second/millisecond breakdown

mod duration;
mod measure;
mod usage;

pub use duration::DurationParts;
pub use measure::{Clock, ClockError, MonotonicClock, NANOS_PER_SECOND, PerformanceSample};
pub use usage::{ChildExit, CpuTimes, UsageError, timeval_to_millis, wait_for_exit};
