//! Child CPU Accounting
//!
//! Reaps a specific child with `wait4`, which returns its exit status and
//! its own resource usage in one call. Unlike `getrusage(RUSAGE_CHILDREN)`
//! this is not polluted by other children of the same process.

use thiserror::Error;

/// Failure to reap the child or read its accounting
#[derive(Debug, Error)]
#[error("failed to query child process {pid} times: {source}")]
pub struct UsageError {
    /// Child that could not be reaped
    pub pid: u32,
    /// Underlying OS error
    #[source]
    pub source: std::io::Error,
}

/// CPU time consumed by a child, in milliseconds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuTimes {
    /// Time spent in user mode
    pub user_millis: u64,
    /// Time spent in kernel mode
    pub kernel_millis: u64,
}

/// Exit information of a reaped child
#[derive(Debug, Clone, Copy)]
pub struct ChildExit {
    /// Raw wait status, decode with `ExitStatusExt::from_raw`
    pub raw_status: i32,
    /// CPU accounting of the child
    pub cpu: CpuTimes,
}

/// Convert a `timeval` to whole milliseconds
pub fn timeval_to_millis(tv: libc::timeval) -> u64 {
    let secs = tv.tv_sec.max(0) as u64;
    let micros = tv.tv_usec.max(0) as u64;
    secs.saturating_mul(1_000).saturating_add(micros / 1_000)
}

/// Block until child `pid` exits and collect its status and CPU times.
///
/// The child must not have been reaped already (do not call
/// `Child::wait` on it first).
pub fn wait_for_exit(pid: u32) -> Result<ChildExit, UsageError> {
    let mut status: libc::c_int = 0;
    // SAFETY: zeroed rusage is a valid value for the out-parameter.
    let mut usage: libc::rusage = unsafe { std::mem::zeroed() };

    loop {
        // SAFETY: `status` and `usage` are valid, writable out-parameters.
        let ret = unsafe { libc::wait4(pid as libc::pid_t, &mut status, 0, &mut usage) };
        if ret == pid as libc::pid_t {
            break;
        }

        let err = std::io::Error::last_os_error();
        if err.kind() == std::io::ErrorKind::Interrupted {
            continue;
        }
        return Err(UsageError { pid, source: err });
    }

    Ok(ChildExit {
        raw_status: status,
        cpu: CpuTimes {
            user_millis: timeval_to_millis(usage.ru_utime),
            kernel_millis: timeval_to_millis(usage.ru_stime),
        },
    })
}
