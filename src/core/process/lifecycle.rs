// procwatch: Managed subprocess execution
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Exactly-once finalization under the exit / timeout / stop race.
//!
//! ```text
//! Created --start()--> Running --child.wait()--> Exited --pumps drained--+
//!    |                    |                        |                      |
//!    | spawn error        | timeout / stop()       | stop() / deadline    |
//!    |                    v                        v (stop draining)      |
//!    |               Terminating                                          |
//!    |      verdict + cost fixed, SIGKILL pid + group                     |
//!    |                    | reap, bounded drain                           |
//!    v                    v                                               v
//!  Finalized <------- freeze(): Status + done.cancel() under phase lock --+
//!
//! the first of timeout / stop() to leave Running owns the verdict;
//! later arrivals observe Terminating or Finalized and return
//! ```

use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};
use std::time::{Duration, Instant};

use tokio::process::Child;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use super::io::{Buffers, Pumps};
use super::status::{Captured, Status, UNKNOWN_EXIT_CODE};
use crate::error::ProcessError;

/// Monotonic lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Phase {
    Created,
    Running { started: Instant },
    /// Reaped on its own; output still draining.
    Exited { started: Instant },
    /// Timeout or stop won; the verdict waits for the output to drain.
    Terminating,
    Finalized,
}

/// The event that won the race.
#[derive(Debug)]
pub(super) enum Outcome {
    /// Exit code, or `None` for a signal death.
    Exited(Option<i32>),
    TimedOut(Duration),
    Cancelled,
    Failed(ProcessError),
}

impl Outcome {
    fn classify(self) -> (i32, Option<ProcessError>) {
        match self {
            Self::Exited(Some(code)) => (code, ProcessError::from_exit_code(code)),
            Self::Exited(None) => (
                UNKNOWN_EXIT_CODE,
                Some(ProcessError::NonZeroExit {
                    code: UNKNOWN_EXIT_CODE,
                }),
            ),
            Self::TimedOut(timeout) => (UNKNOWN_EXIT_CODE, Some(ProcessError::Timeout { timeout })),
            Self::Cancelled => (UNKNOWN_EXIT_CODE, Some(ProcessError::Cancelled)),
            Self::Failed(err) => (UNKNOWN_EXIT_CODE, Some(err)),
        }
    }
}

/// Outcome and cost fixed when a forced termination won the race.
#[derive(Debug)]
struct Verdict {
    cost: Duration,
    outcome: Outcome,
}

/// Grace period for pipes to drain after a forced termination.
const TERMINATION_DRAIN: Duration = Duration::from_millis(250);

/// State shared between a handle, its watcher task and `stop()` callers.
#[derive(Debug)]
pub(super) struct Lifecycle {
    phase: Mutex<Phase>,
    pid: OnceLock<u32>,
    status: OnceLock<Status>,
    /// Set on entering `Terminating`; only touched under the phase lock.
    verdict: Mutex<Option<Verdict>>,
    /// Explicit stop request.
    stop: CancellationToken,
    /// Completion broadcast; cancelled exactly once, inside `freeze`.
    done: CancellationToken,
    buffers: Buffers,
}

impl Lifecycle {
    pub(super) fn new() -> Self {
        Self {
            phase: Mutex::new(Phase::Created),
            pid: OnceLock::new(),
            status: OnceLock::new(),
            verdict: Mutex::new(None),
            stop: CancellationToken::new(),
            done: CancellationToken::new(),
            buffers: Buffers::default(),
        }
    }

    pub(super) fn lock_phase(&self) -> MutexGuard<'_, Phase> {
        self.phase.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(super) const fn buffers(&self) -> &Buffers {
        &self.buffers
    }

    pub(super) fn set_pid(&self, pid: u32) {
        let _ = self.pid.set(pid);
    }

    pub(super) fn pid(&self) -> Option<u32> {
        self.pid.get().copied()
    }

    pub(super) fn status(&self) -> Option<&Status> {
        self.status.get()
    }

    pub(super) fn is_finished(&self) -> bool {
        self.done.is_cancelled()
    }

    /// Parks until the status is frozen.
    pub(super) async fn finished(&self) {
        self.done.cancelled().await;
    }

    /// Freezes the status. The caller holds the phase lock.
    pub(super) fn freeze(&self, phase: &mut Phase, cost: Duration, outcome: Outcome) {
        let (exit_code, error) = outcome.classify();
        let captured = Captured {
            output: self.buffers.combined.to_string_lossy(),
            stdout: self.buffers.stdout.to_string_lossy(),
            stderr: self.buffers.stderr.to_string_lossy(),
        };

        let status = Status::new(self.pid(), exit_code, error, cost, captured);
        if self.status.set(status).is_err() {
            // Unreachable while every caller goes through the phase check.
            return;
        }
        *phase = Phase::Finalized;
        self.done.cancel();
    }

    /// Finalizes a started process. A pending termination verdict takes
    /// precedence over `outcome`. Returns false if already finalized.
    pub(super) fn finalize(&self, outcome: Outcome) -> bool {
        let mut phase = self.lock_phase();
        match *phase {
            Phase::Running { started } | Phase::Exited { started } => {
                self.freeze(&mut phase, started.elapsed(), outcome);
                true
            }
            Phase::Terminating => {
                let verdict = self
                    .verdict
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .take();
                let Some(Verdict { cost, outcome }) = verdict else {
                    return false;
                };
                self.freeze(&mut phase, cost, outcome);
                true
            }
            Phase::Created | Phase::Finalized => false,
        }
    }

    /// Moves a running process to `Terminating` with `outcome` as verdict.
    /// Returns false if the process is no longer running.
    fn begin_termination(&self, outcome: Outcome) -> bool {
        let mut phase = self.lock_phase();
        let Phase::Running { started } = *phase else {
            return false;
        };
        *self.verdict.lock().unwrap_or_else(PoisonError::into_inner) = Some(Verdict {
            cost: started.elapsed(),
            outcome,
        });
        *phase = Phase::Terminating;
        true
    }

    /// Returns false if a forced termination already owns the verdict.
    fn mark_exited(&self) -> bool {
        let mut phase = self.lock_phase();
        match *phase {
            Phase::Running { started } => {
                *phase = Phase::Exited { started };
                true
            }
            _ => false,
        }
    }

    /// Handles an explicit stop request.
    ///
    /// Only a still-running process is signalled: once the child has been
    /// reaped its pid may be reused, so a stop that arrives while output is
    /// draining just cuts the drain short.
    pub(super) fn request_stop(&self) {
        let won = self.begin_termination(Outcome::Cancelled);
        if !won && !matches!(*self.lock_phase(), Phase::Exited { .. }) {
            return;
        }

        self.stop.cancel();
        if won {
            warn!(pid = ?self.pid(), "stop requested, terminating process group");
            self.terminate();
        }
    }

    /// Returns the pid only while the process has not been reaped.
    pub(super) fn running_pid(&self) -> Option<u32> {
        let phase = self.lock_phase();
        match *phase {
            Phase::Running { .. } => self.pid(),
            _ => None,
        }
    }

    fn terminate(&self) {
        #[cfg(unix)]
        if let Some(pid) = self.pid() {
            super::unix::terminate_group(pid);
        }
    }

    /// Watcher task: races natural exit against the deadline and `stop()`.
    pub(super) async fn watch(
        &self,
        mut child: Child,
        mut pumps: Pumps,
        started: Instant,
        timeout: Option<Duration>,
    ) {
        let deadline = timeout.map(|t| (t, tokio::time::Instant::from_std(started + t)));

        let race = tokio::select! {
            status = child.wait() => Race::Exited(status),
            () = self.stop.cancelled() => Race::Stopped,
            () = sleep_until(deadline) => Race::TimedOut,
        };

        match race {
            Race::Exited(Ok(_)) if !self.mark_exited() => {
                self.settle_terminated(&mut child, pumps).await;
            }
            Race::Exited(Ok(status)) => {
                tokio::select! {
                    () = pumps.join() => {}
                    () = self.stop.cancelled() => debug!("stop while draining output"),
                    () = sleep_until(deadline) => debug!("deadline while draining output"),
                }
                pumps.abort();
                if self.finalize(Outcome::Exited(status.code())) {
                    trace!(pid = ?self.pid(), exit_code = ?status.code(), "completed");
                }
            }
            Race::Exited(Err(e)) => {
                self.finalize(Outcome::Failed(e.into()));
                pumps.abort();
            }
            Race::Stopped => self.settle_terminated(&mut child, pumps).await,
            Race::TimedOut => {
                if let Some((timeout, _)) = deadline
                    && self.begin_termination(Outcome::TimedOut(timeout))
                {
                    warn!(pid = ?self.pid(), timeout = ?timeout, "process timed out");
                    self.terminate();
                }
                self.settle_terminated(&mut child, pumps).await;
            }
        }
    }

    /// Reaps a force-killed child, lets the pipes drain briefly so output
    /// written before the kill is kept, then publishes the verdict.
    async fn settle_terminated(&self, child: &mut Child, mut pumps: Pumps) {
        reap(child).await;
        if tokio::time::timeout(TERMINATION_DRAIN, pumps.join())
            .await
            .is_err()
        {
            debug!("output still open after termination");
        }
        pumps.abort();
        self.finalize(Outcome::Cancelled);
    }
}

enum Race {
    Exited(std::io::Result<std::process::ExitStatus>),
    Stopped,
    TimedOut,
}

async fn sleep_until(deadline: Option<(Duration, tokio::time::Instant)>) {
    match deadline {
        Some((_, at)) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

/// Kills the direct child if it survived the group signal, then reaps it.
async fn reap(child: &mut Child) {
    let _ = child.start_kill();
    if let Err(e) = child.wait().await {
        debug!(error = %e, "failed to reap child");
    }
}
