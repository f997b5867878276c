// procwatch: Managed subprocess execution
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Caller-facing process handle.
//!
//! ```text
//! start()  spawn --> pumps + watcher task, returns immediately
//! wait()   park on completion signal --> terminal error
//! run()    start() + wait()
//! stop()   verdict Cancelled + SIGKILL group, status after bounded drain
//! kill()   raw signal to pid, status untouched
//! ```

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use tracing::{debug, trace};

use super::builder::ProcessConfig;
use super::io;
use super::lifecycle::{Lifecycle, Outcome, Phase};
use super::status::Status;
use crate::error::{ProcessError, ProcessResult};

/// One OS process and its terminal status.
///
/// All methods take `&self`; share the handle through an `Arc` to stop it
/// from another task. A handle spawns at most one process and cannot be
/// restarted; use [`fresh`](Self::fresh) for another run of the same
/// configuration.
///
/// # Example
///
/// ```no_run
/// use procwatch::core::process::ProcessHandle;
///
/// # async fn demo() -> procwatch::error::ProcessResult<()> {
/// let handle = ProcessHandle::shell("echo -n 123123");
/// handle.run().await?;
/// assert_eq!(handle.status().map(|s| s.stdout()), Some("123123"));
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ProcessHandle {
    config: ProcessConfig,
    lifecycle: Arc<Lifecycle>,
    queue: Mutex<Option<flume::Sender<String>>>,
}

impl ProcessHandle {
    #[must_use]
    pub fn new(config: ProcessConfig) -> Self {
        Self {
            config,
            lifecycle: Arc::new(Lifecycle::new()),
            queue: Mutex::new(None),
        }
    }

    /// Handle for a shell-mode command with default settings.
    pub fn shell(command: impl Into<String>) -> Self {
        Self::new(ProcessConfig::shell_command(command))
    }

    /// Also forwards every output line to `tx` while the process runs.
    ///
    /// The handle keeps no sender of its own after `start`, whether or not
    /// the spawn succeeds, so the queue disconnects once both streams reach
    /// end of file and the caller's clones are gone.
    #[must_use]
    pub fn with_line_queue(self, tx: flume::Sender<String>) -> Self {
        *self.queue.lock().unwrap_or_else(PoisonError::into_inner) = Some(tx);
        self
    }

    #[must_use]
    pub const fn config(&self) -> &ProcessConfig {
        &self.config
    }

    /// Spawns the process and returns without waiting for it.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// - [`ProcessError::AlreadyStarted`] / [`ProcessError::AlreadyFinished`]
    ///   when the handle was used before.
    /// - [`ProcessError::NoRuntime`] outside a tokio runtime.
    /// - [`ProcessError::SpawnFailed`] or [`ProcessError::InvalidCommand`];
    ///   the handle is finalized with the same error.
    pub fn start(&self) -> ProcessResult<()> {
        if tokio::runtime::Handle::try_current().is_err() {
            return Err(ProcessError::NoRuntime);
        }

        let mut phase = self.lifecycle.lock_phase();
        match *phase {
            Phase::Created => {}
            Phase::Finalized => return Err(ProcessError::AlreadyFinished),
            Phase::Running { .. } | Phase::Exited { .. } | Phase::Terminating => {
                return Err(ProcessError::AlreadyStarted);
            }
        }

        // Owned by this call from here on, so every exit path drops it.
        let queue = self
            .queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        let cmd_line = self.config.command_line();
        if let Some(cwd) = self.config.cwd() {
            debug!(cwd = %cwd.display(), "cd");
        }
        debug!(cmd = %cmd_line, "exec");

        let started = Instant::now();
        let spawned = self.config.build_command().and_then(|mut command| {
            command
                .spawn()
                .map_err(|e| ProcessError::spawn_failed(&cmd_line, e))
        });
        let mut child = match spawned {
            Ok(child) => child,
            Err(err) => {
                debug!(cmd = %cmd_line, error = %err, "spawn failed");
                self.lifecycle
                    .freeze(&mut phase, started.elapsed(), Outcome::Failed(err.clone()));
                return Err(err);
            }
        };

        let pid = child.id();
        if let Some(pid) = pid {
            self.lifecycle.set_pid(pid);
        }
        *phase = Phase::Running { started };
        drop(phase);
        trace!(pid = ?pid, "spawned");

        let pumps = io::spawn_pumps(
            &mut child,
            self.lifecycle.buffers(),
            queue.as_ref().map(|tx| (tx, self.config.line_capacity())),
        );
        drop(queue);

        let lifecycle = Arc::clone(&self.lifecycle);
        let timeout = self.config.timeout();
        tokio::spawn(async move {
            lifecycle.watch(child, pumps, started, timeout).await;
        });

        Ok(())
    }

    /// Parks until the process is finalized and returns its terminal error.
    ///
    /// # Errors
    ///
    /// Returns the error recorded in [`Status::error`].
    pub async fn wait(&self) -> ProcessResult<()> {
        self.lifecycle.finished().await;
        match self.status().and_then(Status::error) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    /// Starts the process and waits for it.
    ///
    /// # Errors
    ///
    /// Returns the error from [`start`](Self::start) or [`wait`](Self::wait).
    pub async fn run(&self) -> ProcessResult<()> {
        self.start()?;
        self.wait().await
    }

    /// Terminates the process early.
    ///
    /// Fixes the verdict as [`ProcessError::Cancelled`] and SIGKILLs the
    /// process and its process group. The status is published once the
    /// pipes have drained, bounded by a short grace period, so `wait`
    /// returns promptly. A no-op before `start` and after finalize.
    pub fn stop(&self) {
        self.lifecycle.request_stop();
    }

    /// Sends `signal` to the process without touching its status.
    ///
    /// Does nothing unless the process is running.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError::Signal`] when delivery fails for a reason
    /// other than the process being gone.
    #[cfg(unix)]
    pub fn kill(&self, signal: super::Signal) -> ProcessResult<()> {
        match self.lifecycle.running_pid() {
            Some(pid) => super::unix::send_signal(pid, signal),
            None => {
                debug!(signal = ?signal, "kill ignored, process not running");
                Ok(())
            }
        }
    }

    /// The frozen status, once finalized.
    #[must_use]
    pub fn status(&self) -> Option<&Status> {
        self.lifecycle.status()
    }

    /// Pid of the spawned process.
    #[must_use]
    pub fn pid(&self) -> Option<u32> {
        self.lifecycle.pid()
    }

    /// Time from start to finalize, once finalized.
    #[must_use]
    pub fn cost(&self) -> Option<Duration> {
        self.status().map(Status::cost)
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.lifecycle.is_finished()
    }

    /// Unstarted handle with a copy of this handle's configuration.
    ///
    /// A line queue attached with [`with_line_queue`](Self::with_line_queue)
    /// is not carried over.
    #[must_use]
    pub fn fresh(&self) -> Self {
        Self::new(self.config.clone())
    }
}
