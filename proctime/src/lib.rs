#![warn(missing_docs)]
//! # proctime
//!
//! Times a child command and reports how long it took:
//! - **Wall clock**: monotonic ticks from just before spawn to just after reaping
//! - **CPU time**: user and kernel time of the child, from the OS accounting
//! - **Quiet by default**: the child's stdout/stderr go to `/dev/null` unless
//!   `-s`/`--show-output` is given
//! - **Exit status**: the child's exit code becomes proctime's own
//!
//! ## Command line
//!
//! ```text
//! proctime [-v | --version] [-h | --help] [-s | --show-output] <command> [<args>]
//! ```
//!
//! ```text
//! $ proctime -s sleep 1.2
//! wall:	01s:203ms
//! user:	000ms
//! kernel:	001ms
//! ```
//!
//! ## Library use
//!
//! ```ignore
//! use proctime::{CommandLine, Harness, HarnessOptions, DEFAULT_MAX_COMMAND_LINE};
//!
//! let command = CommandLine::build(&["make", "-j8"], 0, DEFAULT_MAX_COMMAND_LINE)?;
//! let summary = Harness::new(HarnessOptions::default()).execute(&command)?;
//! println!("{}", proctime::format_human_output(&summary.report));
//! ```

// Re-export core types
pub use proctime_core::{
    ChildExit, Clock, ClockError, CpuTimes, DurationParts, MonotonicClock, PerformanceSample,
    UsageError, wait_for_exit,
};

// Re-export report types
pub use proctime_report::{
    OutputFormat, TimingReport, format_duration_line, format_human_output, generate_json_report,
};

// Re-export harness types
pub use proctime_cli::{
    ChildOutcome, CommandLine, CommandLineError, DEFAULT_MAX_COMMAND_LINE, FatalError, Harness,
    HarnessError, HarnessOptions, IoState, IoStateError, LaunchError, Launcher, ProctimeConfig,
    ReportStream, RunSummary,
};

/// Run the proctime command-line tool.
///
/// ```ignore
/// fn main() -> std::process::ExitCode {
///     proctime::run()
/// }
/// ```
pub use proctime_cli::run;
