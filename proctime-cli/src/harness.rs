//! Timing Harness
//!
//! Sequences one timed run:
//! disable output → start clock → spawn and wait → stop clock → enable output.
//!
//! Errors are split in two kinds. [`HarnessError`] is reported on stderr and
//! turns into a failure exit code. [`FatalError`] means the environment is
//! unusable (no clock, no process accounting, streams that cannot be
//! restored); the caller logs what it can and aborts.

use crate::cmdline::{CommandLine, CommandLineError};
use crate::config::ReportStream;
use crate::io_state::{IoState, IoStateError};
use crate::launcher::{ChildOutcome, LaunchError, Launcher};
use chrono::Utc;
use proctime_core::{Clock, MonotonicClock};
use proctime_report::{OutputFormat, TimingReport};
use std::io::Write;
use thiserror::Error;

/// Failures that leave the harness unable to measure or to talk to the console
#[derive(Debug, Error)]
pub enum FatalError {
    #[error("clock failure: {0}")]
    Clock(#[source] LaunchError),

    #[error("process accounting failure: {0}")]
    Accounting(#[source] LaunchError),

    #[error("could not restore standard streams: {0}")]
    Restore(#[source] IoStateError),
}

impl FatalError {
    /// Whether stdout/stderr are known to be attached to the console again.
    /// When false nothing may be printed before aborting.
    pub fn output_restored(&self) -> bool {
        !matches!(self, FatalError::Restore(_))
    }
}

/// Failures reported to the user
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("{0}")]
    Config(anyhow::Error),

    #[error(transparent)]
    CommandLine(#[from] CommandLineError),

    #[error("{0}")]
    Launch(#[source] LaunchError),

    #[error("could not suppress output: {0}")]
    Suppress(#[source] IoStateError),

    #[error("failed to render report: {0}")]
    Render(#[from] serde_json::Error),

    #[error("failed to write report: {0}")]
    Report(#[source] std::io::Error),

    #[error(transparent)]
    Fatal(#[from] FatalError),
}

impl From<LaunchError> for HarnessError {
    fn from(e: LaunchError) -> Self {
        if !e.is_fatal() {
            return HarnessError::Launch(e);
        }
        match e {
            LaunchError::Clock(_) => HarnessError::Fatal(FatalError::Clock(e)),
            _ => HarnessError::Fatal(FatalError::Accounting(e)),
        }
    }
}

/// Settings for one run, after config and flags are merged
#[derive(Debug, Clone)]
pub struct HarnessOptions {
    /// Leave the child's output on the console
    pub show_output: bool,
    /// Report format
    pub format: OutputFormat,
    /// Report destination
    pub stream: ReportStream,
}

impl Default for HarnessOptions {
    fn default() -> Self {
        Self {
            show_output: false,
            format: OutputFormat::Human,
            stream: ReportStream::Stdout,
        }
    }
}

/// Result of a completed run
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// How the child exited
    pub outcome: ChildOutcome,
    /// Report built from the measurement
    pub report: TimingReport,
}

/// Orchestrates suppression, launch and measurement
pub struct Harness<C: Clock = MonotonicClock> {
    options: HarnessOptions,
    launcher: Launcher<C>,
}

impl Harness<MonotonicClock> {
    /// Harness using the system monotonic clock
    pub fn new(options: HarnessOptions) -> Self {
        Self::with_clock(options, MonotonicClock::new())
    }
}

impl<C: Clock> Harness<C> {
    /// Harness using a specific clock
    pub fn with_clock(options: HarnessOptions, clock: C) -> Self {
        Self {
            options,
            launcher: Launcher::new(clock),
        }
    }

    /// Run and measure `command` against the process's own stdout/stderr
    pub fn execute(&self, command: &CommandLine) -> Result<RunSummary, HarnessError> {
        self.execute_with(&mut IoState::new(), command)
    }

    /// Run and measure `command`, suppressing the descriptors held by `io`.
    ///
    /// Returns only once those descriptors are restored, except for
    /// [`FatalError::Restore`].
    pub fn execute_with(
        &self,
        io: &mut IoState,
        command: &CommandLine,
    ) -> Result<RunSummary, HarnessError> {
        if !self.options.show_output {
            if let Err(e) = io.disable() {
                io.enable().map_err(FatalError::Restore)?;
                return Err(HarnessError::Suppress(e));
            }
        }

        let started_at = Utc::now();
        let launched = self.launcher.run(command);

        // Streams come back before anything from the window is reported.
        io.enable().map_err(FatalError::Restore)?;

        let outcome = launched?;
        let report = TimingReport::from_sample(
            command.as_str(),
            &outcome.sample,
            outcome.exit_code(),
            outcome.signal(),
            started_at,
        );

        Ok(RunSummary { outcome, report })
    }

    /// Write `report` to the configured stream in the configured format
    pub fn print_report(&self, report: &TimingReport) -> Result<(), HarnessError> {
        let rendered = self.options.format.render(report)?;
        let written = match self.options.stream {
            ReportStream::Stdout => {
                let mut out = std::io::stdout().lock();
                out.write_all(rendered.as_bytes()).and_then(|_| out.flush())
            }
            ReportStream::Stderr => std::io::stderr().lock().write_all(rendered.as_bytes()),
        };
        written.map_err(HarnessError::Report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmdline::DEFAULT_MAX_COMMAND_LINE;
    use proctime_core::UsageError;
    use std::fs::File;
    use std::io::{Read, Seek, SeekFrom};
    use std::os::fd::AsRawFd;

    struct BrokenClock;

    impl Clock for BrokenClock {
        fn frequency(&self) -> Option<u64> {
            None
        }

        fn now(&self) -> u64 {
            0
        }
    }

    fn shown() -> HarnessOptions {
        HarnessOptions {
            show_output: true,
            ..HarnessOptions::default()
        }
    }

    fn write_fd(file: &File, text: &str) {
        // SAFETY: writing a valid buffer to an open descriptor.
        let n = unsafe { libc::write(file.as_raw_fd(), text.as_ptr().cast(), text.len()) };
        assert_eq!(n, text.len() as isize);
    }

    fn contents(file: &mut File) -> String {
        let mut s = String::new();
        file.seek(SeekFrom::Start(0)).unwrap();
        file.read_to_string(&mut s).unwrap();
        s
    }

    fn command(argv: &[&str]) -> CommandLine {
        CommandLine::build(argv, 0, DEFAULT_MAX_COMMAND_LINE).unwrap()
    }

    #[test]
    fn test_execute_builds_report() {
        let harness = Harness::new(shown());
        let summary = harness.execute(&command(&["sh", "-c", "exit 4"])).unwrap();
        assert_eq!(summary.outcome.harness_exit_code(), 4);
        assert_eq!(summary.report.exit_code, Some(4));
        assert_eq!(summary.report.command, r#""sh" "-c" "exit 4""#);
        assert_eq!(summary.report.wall_ms, summary.outcome.sample.elapsed_millis());
    }

    #[test]
    fn test_spawn_failure_is_reportable() {
        let harness = Harness::new(shown());
        let err = harness
            .execute(&command(&["proctime-missing-binary-abc"]))
            .unwrap_err();
        assert!(matches!(err, HarnessError::Launch(_)));
    }

    #[test]
    fn test_clock_failure_is_fatal_with_output_restored() {
        let harness = Harness::with_clock(shown(), BrokenClock);
        match harness.execute(&command(&["true"])) {
            Err(HarnessError::Fatal(fatal)) => {
                assert!(matches!(fatal, FatalError::Clock(_)));
                assert!(fatal.output_restored());
            }
            other => panic!("expected fatal clock error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_suppressed_run_restores_descriptors() {
        let mut out = tempfile::tempfile().unwrap();
        let mut err = tempfile::tempfile().unwrap();
        let mut io = IoState::for_fds(out.as_raw_fd(), err.as_raw_fd());

        let harness = Harness::new(HarnessOptions::default());
        write_fd(&out, "before|");
        let summary = harness.execute_with(&mut io, &command(&["true"])).unwrap();
        assert_eq!(summary.outcome.harness_exit_code(), 0);
        assert!(!io.is_saved());

        write_fd(&out, "after");
        write_fd(&err, "after");
        assert_eq!(contents(&mut out), "before|after");
        assert_eq!(contents(&mut err), "after");
    }

    #[test]
    fn test_clock_failure_restores_before_returning() {
        let mut out = tempfile::tempfile().unwrap();
        let err = tempfile::tempfile().unwrap();
        let mut io = IoState::for_fds(out.as_raw_fd(), err.as_raw_fd());

        let harness = Harness::with_clock(HarnessOptions::default(), BrokenClock);
        match harness.execute_with(&mut io, &command(&["true"])) {
            Err(HarnessError::Fatal(fatal)) => {
                assert!(matches!(fatal, FatalError::Clock(_)));
                assert!(fatal.output_restored());
            }
            other => panic!("expected fatal clock error, got {:?}", other.map(|_| ())),
        }

        assert!(!io.is_saved());
        write_fd(&out, "visible");
        assert_eq!(contents(&mut out), "visible");
    }

    #[test]
    fn test_suppress_failure_is_reportable() {
        let mut io = IoState::for_fds(-1, -1);
        let harness = Harness::new(HarnessOptions::default());
        let err = harness
            .execute_with(&mut io, &command(&["true"]))
            .unwrap_err();
        assert!(matches!(err, HarnessError::Suppress(_)));
        assert!(!io.is_saved());
    }

    #[test]
    fn test_restore_failure_is_silent() {
        let fatal = FatalError::Restore(IoStateError::NullDevice(std::io::Error::other("gone")));
        assert!(!fatal.output_restored());
        assert!(matches!(HarnessError::from(fatal), HarnessError::Fatal(_)));
    }

    #[test]
    fn test_launch_error_classes() {
        let spawn = LaunchError::Spawn {
            program: "missing".into(),
            source: std::io::Error::other("not found"),
        };
        assert!(matches!(HarnessError::from(spawn), HarnessError::Launch(_)));

        let clock = LaunchError::Clock(proctime_core::ClockError::ZeroFrequency);
        assert!(matches!(
            HarnessError::from(clock),
            HarnessError::Fatal(FatalError::Clock(_))
        ));

        let usage = LaunchError::Usage(UsageError {
            pid: 42,
            source: std::io::Error::from_raw_os_error(libc::ECHILD),
        });
        assert!(matches!(
            HarnessError::from(usage),
            HarnessError::Fatal(FatalError::Accounting(_))
        ));
    }
}
