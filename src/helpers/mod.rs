// procwatch: Managed subprocess execution
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! One-shot helpers built on [`ProcessHandle`].
//!
//! ```text
//! run_command(cmd)              --> CommandOutput { output, exit_code, error }
//! run_command_in_dir(cmd, dir)  --> SplitOutput { stdout, stderr, exit_code, error }
//! stream_lines(cmd, tx)         --> lines to tx, queue closes on exit
//! command_contains(cmd, subs)   --> success && all substrings present
//! run_script(bytes)             --> temp file + <shell> <file>
//! command_exists(name)          --> PATH lookup (which)
//! is_process_running(name)      --> ps listing contains name
//! ```

use std::io::Write;
use std::path::Path;

use tracing::debug;

use crate::core::process::{
    DEFAULT_SHELL, ProcessConfig, ProcessHandle, Status, UNKNOWN_EXIT_CODE,
};
use crate::error::{ProcessError, ProcessResult};

/// Exit code reported when a helper fails before a process runs.
pub const DEFAULT_EXIT_CODE: i32 = 2;

/// Combined output of a finished command.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub output: String,
    pub exit_code: i32,
    pub error: Option<ProcessError>,
}

impl CommandOutput {
    fn from_handle(handle: &ProcessHandle, started: ProcessResult<()>) -> Self {
        match handle.status() {
            Some(status) => Self {
                output: status.output().to_string(),
                exit_code: status.exit_code(),
                error: status.error().cloned(),
            },
            None => Self {
                output: String::new(),
                exit_code: UNKNOWN_EXIT_CODE,
                error: started.err(),
            },
        }
    }

    #[must_use]
    pub const fn success(&self) -> bool {
        self.error.is_none()
    }
}

/// Split output of a finished command.
#[derive(Debug, Clone)]
pub struct SplitOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub error: Option<ProcessError>,
}

impl SplitOutput {
    fn from_status(status: Option<&Status>, started: ProcessResult<()>) -> Self {
        match status {
            Some(status) => Self {
                stdout: status.stdout().to_string(),
                stderr: status.stderr().to_string(),
                exit_code: status.exit_code(),
                error: status.error().cloned(),
            },
            None => Self {
                stdout: String::new(),
                stderr: String::new(),
                exit_code: UNKNOWN_EXIT_CODE,
                error: started.err(),
            },
        }
    }

    #[must_use]
    pub const fn success(&self) -> bool {
        self.error.is_none()
    }
}

/// Runs a shell command to completion and returns its combined output.
pub async fn run_command(command: &str) -> CommandOutput {
    let handle = ProcessHandle::shell(command);
    let result = handle.run().await;
    CommandOutput::from_handle(&handle, result)
}

/// Runs a shell command in `dir` and returns stdout and stderr separately.
pub async fn run_command_in_dir(command: &str, dir: impl AsRef<Path>) -> SplitOutput {
    let config = ProcessConfig::builder()
        .command(command)
        .cwd(dir.as_ref())
        .build();
    let handle = ProcessHandle::new(config);
    let result = handle.run().await;
    SplitOutput::from_status(handle.status(), result)
}

/// Runs a shell command and forwards each output line to `tx`.
///
/// Lines from stdout and stderr share the queue. `tx` is dropped when the
/// process exits, which closes the queue unless the caller kept a clone.
///
/// # Errors
///
/// Returns the terminal error of the process.
pub async fn stream_lines(command: &str, tx: flume::Sender<String>) -> ProcessResult<()> {
    let handle = ProcessHandle::shell(command).with_line_queue(tx);
    handle.run().await
}

/// Returns true if the command succeeds and its output contains every
/// substring in `needles`.
pub async fn command_contains(command: &str, needles: &[&str]) -> bool {
    let result = run_command(command).await;
    result.success() && needles.iter().all(|needle| result.output.contains(needle))
}

/// Writes `script` to a temporary file and runs it with the default shell.
///
/// The file is removed once the process has finished.
pub async fn run_script(script: &[u8]) -> CommandOutput {
    let file = match write_script(script) {
        Ok(file) => file,
        Err(e) => {
            debug!(error = %e, "failed to write script");
            return CommandOutput {
                output: String::new(),
                exit_code: DEFAULT_EXIT_CODE,
                error: Some(e.into()),
            };
        }
    };

    let config = ProcessConfig::argv(DEFAULT_SHELL, [file.path().display().to_string()]);
    let handle = ProcessHandle::new(config);
    let result = handle.run().await;
    CommandOutput::from_handle(&handle, result)
}

fn write_script(script: &[u8]) -> std::io::Result<tempfile::NamedTempFile> {
    let mut file = tempfile::Builder::new()
        .prefix("procwatch-")
        .suffix(".sh")
        .tempfile()?;
    file.write_all(script)?;
    file.flush()?;
    Ok(file)
}

/// Returns true if `program` resolves through PATH.
#[must_use]
pub fn command_exists(program: &str) -> bool {
    which::which(program).is_ok()
}

/// Returns true if the command line of some other process mentions `name`.
pub async fn is_process_running(name: &str) -> bool {
    let handle = ProcessHandle::new(ProcessConfig::argv("ps", ["-eo", "pid=,args="]));
    if handle.run().await.is_err() {
        return false;
    }
    handle
        .status()
        .is_some_and(|status| listing_mentions(status.stdout(), handle.pid(), name))
}

/// Scans `pid args` lines, skipping the listing process itself.
fn listing_mentions(listing: &str, own_pid: Option<u32>, name: &str) -> bool {
    listing.lines().any(|line| {
        let line = line.trim_start();
        let (pid, args) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        own_pid.is_none_or(|own| pid.parse::<u32>().ok() != Some(own)) && args.contains(name)
    })
}
