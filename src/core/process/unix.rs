// procwatch: Managed subprocess execution
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Unix signal delivery.
//!
//! ```text
//! send_signal(pid, sig)   --> kill(pid, sig)
//! terminate_group(pid)    --> kill(pid, SIGKILL) + killpg(pid, SIGKILL)
//! ESRCH (already gone)    --> Ok
//! ```
//!
//! Children are spawned with `process_group(0)`, so the group id equals the
//! child's pid.

use nix::errno::Errno;
use nix::sys::signal::{Signal, kill, killpg};
use nix::unistd::Pid;
use tracing::debug;

use crate::error::{ProcessError, ProcessResult};

fn to_pid(pid: u32) -> ProcessResult<Pid> {
    i32::try_from(pid)
        .map(Pid::from_raw)
        .map_err(|_| ProcessError::Signal {
            pid: -1,
            message: format!("pid {pid} out of range"),
        })
}

/// Sends `signal` to a single process. A vanished process is not an error.
pub(super) fn send_signal(pid: u32, signal: Signal) -> ProcessResult<()> {
    let target = to_pid(pid)?;
    match kill(target, signal) {
        Ok(()) | Err(Errno::ESRCH) => Ok(()),
        Err(errno) => Err(ProcessError::Signal {
            pid: target.as_raw(),
            message: errno.desc().to_string(),
        }),
    }
}

/// Force-kills the process and every member of its process group.
///
/// Failures are logged and swallowed: the process may already be gone.
pub(super) fn terminate_group(pid: u32) {
    let Ok(target) = to_pid(pid) else {
        return;
    };

    if let Err(errno) = kill(target, Signal::SIGKILL)
        && errno != Errno::ESRCH
    {
        debug!(pid = pid, error = %errno, "SIGKILL failed");
    }
    if let Err(errno) = killpg(target, Signal::SIGKILL)
        && errno != Errno::ESRCH
    {
        debug!(pgid = pid, error = %errno, "group SIGKILL failed");
    }
}
