//! Minute/second/millisecond breakdown of a raw millisecond count.

use serde::{Deserialize, Serialize};

const MILLIS_PER_SECOND: u64 = 1_000;
const MILLIS_PER_MINUTE: u64 = 60 * MILLIS_PER_SECOND;

/// Duration split into display components. Always derived, never stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationParts {
    /// Whole minutes
    pub minutes: u64,
    /// Remaining whole seconds (0..60)
    pub seconds: u64,
    /// Remaining milliseconds (0..1000)
    pub milliseconds: u64,
}

impl DurationParts {
    /// Split `ms` into minutes, seconds and milliseconds
    pub fn from_millis(ms: u64) -> Self {
        Self {
            minutes: ms / MILLIS_PER_MINUTE,
            seconds: (ms % MILLIS_PER_MINUTE) / MILLIS_PER_SECOND,
            milliseconds: ms % MILLIS_PER_SECOND,
        }
    }
}
