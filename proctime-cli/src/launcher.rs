//! Child Process Launcher
//!
//! Spawns the timed command, blocks until it exits and collects its exit
//! status and CPU accounting. There is no timeout and no signal forwarding.

use crate::cmdline::CommandLine;
use proctime_core::{
    Clock, ClockError, MonotonicClock, PerformanceSample, UsageError, wait_for_exit,
};
use std::ffi::OsString;
use std::os::unix::process::ExitStatusExt;
use std::process::{Command, ExitStatus};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("failed to execute child process {program:?}: {source}")]
    Spawn {
        program: OsString,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Clock(#[from] ClockError),

    #[error(transparent)]
    Usage(#[from] UsageError),
}

impl LaunchError {
    /// Whether this error leaves the environment unusable (clock or process
    /// accounting gone). Such errors are not worth reporting through normal
    /// channels and terminate the harness.
    pub fn is_fatal(&self) -> bool {
        matches!(self, LaunchError::Clock(_) | LaunchError::Usage(_))
    }
}

/// How the child finished
#[derive(Debug, Clone, Copy)]
pub struct ChildOutcome {
    /// Decoded wait status
    pub status: ExitStatus,
    /// Wall-clock and CPU measurement
    pub sample: PerformanceSample,
}

impl ChildOutcome {
    /// Exit code, `None` if the child was killed by a signal
    pub fn exit_code(&self) -> Option<i32> {
        self.status.code()
    }

    /// Terminating signal, if any
    pub fn signal(&self) -> Option<i32> {
        self.status.signal()
    }

    /// Exit code the harness should return: the child's own code, or
    /// `128 + signal` when it was killed.
    pub fn harness_exit_code(&self) -> i32 {
        match (self.exit_code(), self.signal()) {
            (Some(code), _) => code,
            (None, Some(signal)) => 128 + signal,
            (None, None) => 1,
        }
    }
}

/// Runs one command under a clock
pub struct Launcher<C: Clock = MonotonicClock> {
    clock: C,
}

impl Default for Launcher<MonotonicClock> {
    fn default() -> Self {
        Self::new(MonotonicClock::new())
    }
}

impl<C: Clock> Launcher<C> {
    /// Create a launcher reading ticks from `clock`
    pub fn new(clock: C) -> Self {
        Self { clock }
    }

    /// Spawn `command`, wait for it and measure it.
    ///
    /// The child inherits the current stdin/stdout/stderr, whatever they
    /// point to at this moment.
    pub fn run(&self, command: &CommandLine) -> Result<ChildOutcome, LaunchError> {
        let mut sample = PerformanceSample::new();
        sample.start(&self.clock)?;

        let child = Command::new(command.program())
            .args(command.args())
            .spawn()
            .map_err(|source| LaunchError::Spawn {
                program: command.program().clone(),
                source,
            })?;
        let pid = child.id();
        tracing::debug!(pid, command = %command, "child spawned");

        // `child` is kept alive until after reaping so its handles are
        // released on every path below, including the error return.
        let exit = wait_for_exit(pid);
        sample.stop(&self.clock);
        drop(child);
        let exit = exit?;

        sample.set_cpu_times(exit.cpu.user_millis, exit.cpu.kernel_millis);
        tracing::trace!(
            start_tick = sample.start_tick(),
            end_tick = sample.end_tick(),
            frequency = sample.tick_frequency(),
            "sample ticks"
        );
        let status = ExitStatus::from_raw(exit.raw_status);
        tracing::debug!(
            pid,
            status = %status,
            wall_ms = sample.elapsed_millis(),
            user_ms = sample.user_millis(),
            kernel_ms = sample.kernel_millis(),
            "child exited"
        );

        Ok(ChildOutcome { status, sample })
    }
}
