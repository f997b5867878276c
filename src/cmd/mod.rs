// procwatch: Managed subprocess execution
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Command implementations.
//!
//! ```text
//! CLI args --> cmd::run_* handlers --> child exit code
//!   run, stream, exists
//!
//! Ctrl-C while waiting --> ProcessHandle::stop()
//! ```

pub mod exists;
pub mod run;
pub mod stream;


use std::time::Duration;

use tracing::{debug, warn};

use crate::core::process::{ProcessHandle, Status};
use crate::error::{ProcessError, ProcessResult};

/// Exit code after a timeout, as reported by coreutils `timeout`.
pub const TIMEOUT_EXIT_CODE: u8 = 124;

/// Exit code after an interrupt.
pub const CANCELLED_EXIT_CODE: u8 = 130;

/// Waits for the process, stopping it on Ctrl-C.
pub(crate) async fn wait_or_interrupt(handle: &ProcessHandle) -> ProcessResult<()> {
    tokio::select! {
        result = handle.wait() => return result,
        signal = tokio::signal::ctrl_c() => match signal {
            Ok(()) => {
                warn!("interrupted, stopping process");
                handle.stop();
            }
            Err(e) => debug!(error = %e, "failed to listen for ctrl-c"),
        },
    }
    handle.wait().await
}

/// Maps a frozen status onto the exit code of procwatch itself.
#[must_use]
pub fn exit_code_for(status: &Status) -> u8 {
    match status.error() {
        None => 0,
        Some(ProcessError::Timeout { .. }) => TIMEOUT_EXIT_CODE,
        Some(ProcessError::Cancelled) => CANCELLED_EXIT_CODE,
        Some(ProcessError::SpawnFailed { source, .. })
            if source.kind() == std::io::ErrorKind::NotFound =>
        {
            127
        }
        Some(ProcessError::SpawnFailed { .. }) => 126,
        Some(err) => err
            .exit_code_hint()
            .and_then(|code| u8::try_from(code).ok())
            .filter(|code| *code != 0)
            .unwrap_or(1),
    }
}

/// Resolves a `--timeout` flag against the configured default.
pub(crate) fn effective_timeout(flag: Option<u64>, default: Option<Duration>) -> Option<Duration> {
    match flag {
        Some(0) => None,
        Some(secs) => Some(Duration::from_secs(secs)),
        None => default,
    }
}
