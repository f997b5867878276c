// procwatch: Managed subprocess execution
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Stream command implementation.

use tracing::debug;

use super::{effective_timeout, exit_code_for, wait_or_interrupt};
use crate::cli::args::{StreamArgs, command_line};
use crate::config::Settings;
use crate::core::process::{ProcessConfig, ProcessHandle};
use crate::error::Result;

/// Main handler for stream command.
///
/// Lines from both streams are printed to stdout in arrival order.
///
/// # Errors
///
/// Returns an error if the handle refuses to start.
pub async fn run_stream_command(args: &StreamArgs, settings: &Settings) -> Result<u8> {
    let process = &settings.process;
    let config = ProcessConfig::builder()
        .command(command_line(&args.command))
        .shell(process.shell.clone())
        .maybe_timeout(effective_timeout(args.timeout, process.timeout()))
        .line_capacity(process.line_buffer_size)
        .build();

    let (tx, rx) = flume::bounded::<String>(process.queue_capacity);
    let handle = ProcessHandle::new(config).with_line_queue(tx);

    let printer = tokio::spawn(async move {
        while let Ok(line) = rx.recv_async().await {
            println!("{line}");
        }
    });

    let outcome = match handle.start() {
        Ok(()) => wait_or_interrupt(&handle).await,
        Err(e) => Err(e),
    };
    if let Err(e) = printer.await {
        debug!(error = %e, "line printer failed");
    }

    match handle.status() {
        Some(status) => {
            if let Some(err) = status.error()
                && err.exit_code_hint().is_none()
            {
                eprintln!("procwatch: {err}");
            }
            Ok(exit_code_for(status))
        }
        None => Err(outcome.err().map_or_else(
            || anyhow::anyhow!("process finished without a status"),
            Into::into,
        )),
    }
}
