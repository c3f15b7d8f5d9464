//! Output Suppression
//!
//! Saves, silences and restores the process's stdout/stderr descriptors.
//! The child inherits whatever fd 1 and fd 2 point to at spawn time, so
//! redirecting them to the null device silences the child as well.
//!
//! Nothing can be reported while output is disabled: stderr itself points at
//! the null device. Callers must `enable` before printing any error that
//! happened inside the window.

use std::fs::OpenOptions;
use std::io::Write;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd, RawFd};
use thiserror::Error;

const STDOUT_FD: RawFd = 1;
const STDERR_FD: RawFd = 2;
const NULL_DEVICE: &str = "/dev/null";

#[derive(Debug, Error)]
pub enum IoStateError {
    #[error("failed to duplicate descriptor {fd}: {source}")]
    Duplicate {
        fd: RawFd,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to open /dev/null: {0}")]
    NullDevice(#[source] std::io::Error),

    #[error("failed to redirect descriptor {fd}: {source}")]
    Redirect {
        fd: RawFd,
        #[source]
        source: std::io::Error,
    },
}

/// Saved copies of the output descriptors.
///
/// Owned by the caller and threaded through `save`/`disable`/`enable`;
/// the duplicates are closed when the state is dropped or restored.
#[derive(Debug)]
pub struct IoState {
    stdout_fd: RawFd,
    stderr_fd: RawFd,
    saved_stdout: Option<OwnedFd>,
    saved_stderr: Option<OwnedFd>,
    is_saved: bool,
}

impl Default for IoState {
    fn default() -> Self {
        Self::new()
    }
}

impl IoState {
    /// State for the process's real stdout (fd 1) and stderr (fd 2)
    pub fn new() -> Self {
        Self::for_fds(STDOUT_FD, STDERR_FD)
    }

    /// State for an arbitrary pair of descriptors
    pub fn for_fds(stdout_fd: RawFd, stderr_fd: RawFd) -> Self {
        Self {
            stdout_fd,
            stderr_fd,
            saved_stdout: None,
            saved_stderr: None,
            is_saved: false,
        }
    }

    /// Whether descriptors are currently saved (and `enable` will restore them)
    pub fn is_saved(&self) -> bool {
        self.is_saved
    }

    /// Duplicate both descriptors so they can be restored later.
    pub fn save(&mut self) -> Result<(), IoStateError> {
        let stdout = duplicate(self.stdout_fd)?;
        let stderr = duplicate(self.stderr_fd)?;
        self.saved_stdout = Some(stdout);
        self.saved_stderr = Some(stderr);
        self.is_saved = true;
        Ok(())
    }

    /// Save both descriptors, then point them at the null device.
    pub fn disable(&mut self) -> Result<(), IoStateError> {
        flush_std_streams();
        self.save()?;

        let null = OpenOptions::new()
            .write(true)
            .open(NULL_DEVICE)
            .map_err(IoStateError::NullDevice)?;
        redirect(null.as_raw_fd(), self.stdout_fd)?;
        redirect(null.as_raw_fd(), self.stderr_fd)?;

        tracing::trace!(stdout = self.stdout_fd, stderr = self.stderr_fd, "output disabled");
        Ok(())
    }

    /// Put the saved descriptors back. No-op if nothing was saved.
    pub fn enable(&mut self) -> Result<(), IoStateError> {
        if !self.is_saved {
            return Ok(());
        }

        flush_std_streams();
        if let Some(saved) = &self.saved_stdout {
            redirect(saved.as_raw_fd(), self.stdout_fd)?;
        }
        if let Some(saved) = &self.saved_stderr {
            redirect(saved.as_raw_fd(), self.stderr_fd)?;
        }

        self.saved_stdout = None;
        self.saved_stderr = None;
        self.is_saved = false;

        tracing::trace!(stdout = self.stdout_fd, stderr = self.stderr_fd, "output restored");
        Ok(())
    }
}

/// Duplicate `fd` into a new close-on-exec descriptor, so the child never
/// inherits the saved copy.
fn duplicate(fd: RawFd) -> Result<OwnedFd, IoStateError> {
    // SAFETY: fcntl only inspects the descriptor table; an invalid `fd`
    // fails with EBADF.
    let dup = unsafe { libc::fcntl(fd, libc::F_DUPFD_CLOEXEC, 0) };
    if dup == -1 {
        return Err(IoStateError::Duplicate {
            fd,
            source: std::io::Error::last_os_error(),
        });
    }
    // SAFETY: `dup` is a freshly created descriptor owned by nobody else.
    Ok(unsafe { OwnedFd::from_raw_fd(dup) })
}

fn redirect(from: RawFd, to: RawFd) -> Result<(), IoStateError> {
    // SAFETY: dup2 only manipulates the descriptor table; both values are
    // plain integers and failure is reported through errno.
    let ret = unsafe { libc::dup2(from, to) };
    if ret == -1 {
        return Err(IoStateError::Redirect {
            fd: to,
            source: std::io::Error::last_os_error(),
        });
    }
    Ok(())
}

fn flush_std_streams() {
    let _ = std::io::stdout().flush();
    let _ = std::io::stderr().flush();
}
