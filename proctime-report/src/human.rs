//! Human-readable output
//!
//! One line per duration: `label:\t[MMm:][SSs:]mmmms`.
//! Minutes are printed only when non-zero; seconds when non-zero or when
//! minutes are printed; milliseconds always.

use crate::report::TimingReport;
use proctime_core::DurationParts;
use std::fmt::Write as _;

/// Format a single labeled duration line (without trailing newline)
pub fn format_duration_line(label: &str, duration: &DurationParts) -> String {
    let mut line = format!("{}:\t", label);

    if duration.minutes > 0 {
        let _ = write!(line, "{:02}m:", duration.minutes);
    }

    if duration.seconds > 0 || duration.minutes > 0 {
        let _ = write!(line, "{:02}s:", duration.seconds);
    }

    let _ = write!(line, "{:03}ms", duration.milliseconds);
    line
}

/// Format the full report for terminal display
///
/// # Returns
/// Three newline-terminated lines: wall, user, kernel
pub fn format_human_output(report: &TimingReport) -> String {
    let mut output = String::new();
    for (label, duration) in report.durations() {
        output.push_str(&format_duration_line(label, &duration));
        output.push('\n');
    }
    output
}
