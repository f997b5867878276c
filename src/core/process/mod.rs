// procwatch: Managed subprocess execution
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Async process spawning and lifecycle management.
//!
//! ```text
//! ProcessConfig::builder()
//!   .command() .mode() .timeout() .cwd() .env()
//!   .build() --> ProcessHandle::new(config)
//!       start()  --> tokio::process::Command (own process group)
//!                    pumps: stdout/stderr --> combined + split buffers
//!                    watcher: exit | timeout | stop --> finalize once
//!       wait()   --> Status { pid, exit_code, error, cost, output, stdout, stderr }
//! ```

mod builder;
mod handle;
mod io;
mod lifecycle;
mod status;
#[cfg(test)]
mod tests;
#[cfg(unix)]
mod unix;

pub use builder::{DEFAULT_SHELL, ExecMode, ProcessConfig};
pub use handle::ProcessHandle;
pub use status::{Status, UNKNOWN_EXIT_CODE};

#[cfg(unix)]
pub use nix::sys::signal::Signal;
