//! Report Data Structures

use chrono::{DateTime, Utc};
use proctime_core::{DurationParts, PerformanceSample};
use serde::{Deserialize, Serialize};

/// Measurement of one timed child process
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingReport {
    /// Rendered (quoted) command line that was launched
    pub command: String,
    /// Child exit code, or `None` when it was terminated by a signal
    pub exit_code: Option<i32>,
    /// Terminating signal, if any
    pub signal: Option<i32>,
    /// Wall-clock duration in milliseconds
    pub wall_ms: u64,
    /// User-mode CPU time in milliseconds
    pub user_ms: u64,
    /// Kernel-mode CPU time in milliseconds
    pub kernel_ms: u64,
    /// When the child was launched
    pub started_at: DateTime<Utc>,
}

impl TimingReport {
    /// Build a report from a finished sample
    pub fn from_sample(
        command: impl Into<String>,
        sample: &PerformanceSample,
        exit_code: Option<i32>,
        signal: Option<i32>,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            command: command.into(),
            exit_code,
            signal,
            wall_ms: sample.elapsed_millis(),
            user_ms: sample.user_millis(),
            kernel_ms: sample.kernel_millis(),
            started_at,
        }
    }

    /// Labeled durations in print order: wall, user, kernel
    pub fn durations(&self) -> [(&'static str, DurationParts); 3] {
        [
            ("wall", DurationParts::from_millis(self.wall_ms)),
            ("user", DurationParts::from_millis(self.user_ms)),
            ("kernel", DurationParts::from_millis(self.kernel_ms)),
        ]
    }
}
