// procwatch: Managed subprocess execution
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Frozen terminal status of a process.

use serde::{Serialize, Serializer};
use std::time::Duration;

use crate::error::ProcessError;

/// Exit code recorded when the process never exited on its own.
pub const UNKNOWN_EXIT_CODE: i32 = -1;

/// Snapshot produced exactly once, when the process is finalized.
///
/// Never mutated afterwards; handles expose it only through a shared
/// reference obtained after the completion signal fired.
#[derive(Debug, Clone, Serialize)]
pub struct Status {
    pid: Option<u32>,
    finished: bool,
    exit_code: i32,
    #[serde(serialize_with = "serialize_error")]
    error: Option<ProcessError>,
    #[serde(rename = "cost_secs", serialize_with = "serialize_secs")]
    cost: Duration,
    output: String,
    stdout: String,
    stderr: String,
}

/// Captured output at the moment of finalize.
#[derive(Debug, Default)]
pub(super) struct Captured {
    pub(super) output: String,
    pub(super) stdout: String,
    pub(super) stderr: String,
}

impl Status {
    pub(super) fn new(
        pid: Option<u32>,
        exit_code: i32,
        error: Option<ProcessError>,
        cost: Duration,
        captured: Captured,
    ) -> Self {
        Self {
            pid,
            finished: true,
            exit_code,
            error,
            cost,
            output: captured.output,
            stdout: captured.stdout,
            stderr: captured.stderr,
        }
    }

    /// Process id; `None` when the spawn failed.
    #[must_use]
    pub const fn pid(&self) -> Option<u32> {
        self.pid
    }

    #[must_use]
    pub const fn finished(&self) -> bool {
        self.finished
    }

    /// Exit code; [`UNKNOWN_EXIT_CODE`] after a spawn failure, a signal
    /// death, a timeout or a stop.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        self.exit_code
    }

    #[must_use]
    pub const fn error(&self) -> Option<&ProcessError> {
        self.error.as_ref()
    }

    #[must_use]
    pub const fn success(&self) -> bool {
        self.error.is_none()
    }

    /// Time from start to finalize.
    #[must_use]
    pub const fn cost(&self) -> Duration {
        self.cost
    }

    /// Combined stdout and stderr, in arrival order.
    #[must_use]
    pub fn output(&self) -> &str {
        &self.output
    }

    #[must_use]
    pub fn stdout(&self) -> &str {
        &self.stdout
    }

    #[must_use]
    pub fn stderr(&self) -> &str {
        &self.stderr
    }
}

#[allow(clippy::ref_option)]
fn serialize_error<S: Serializer>(
    error: &Option<ProcessError>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    match error {
        Some(err) => serializer.serialize_some(&err.to_string()),
        None => serializer.serialize_none(),
    }
}

fn serialize_secs<S: Serializer>(
    cost: &Duration,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_f64(cost.as_secs_f64())
}
