// procwatch: Managed subprocess execution
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Run command implementation.

use std::io::Write;

use anyhow::Context;

use super::{effective_timeout, exit_code_for, wait_or_interrupt};
use crate::cli::args::{RunArgs, command_line};
use crate::config::Settings;
use crate::core::process::{ExecMode, ProcessConfig, ProcessHandle, Status};
use crate::error::Result;

/// Main handler for run command.
///
/// Returns the exit code procwatch should exit with.
///
/// # Errors
///
/// Returns an error if the arguments do not form a valid configuration,
/// if the handle refuses to start, or if the report cannot be written.
pub async fn run_process_command(args: &RunArgs, settings: &Settings) -> Result<u8> {
    let config = build_process_config(args, settings)?;
    let handle = ProcessHandle::new(config);

    let outcome = match handle.start() {
        Ok(()) => wait_or_interrupt(&handle).await,
        Err(e) => Err(e),
    };

    let Some(status) = handle.status() else {
        return Err(outcome.err().map_or_else(
            || anyhow::anyhow!("process finished without a status"),
            Into::into,
        ));
    };

    report(status, args.json)?;
    Ok(exit_code_for(status))
}

/// Builds the process configuration from flags layered over settings.
///
/// # Errors
///
/// Returns an error for a malformed `--env` entry.
pub fn build_process_config(args: &RunArgs, settings: &Settings) -> Result<ProcessConfig> {
    let process = &settings.process;
    let builder = ProcessConfig::builder()
        .shell(process.shell.clone())
        .maybe_timeout(effective_timeout(args.timeout, process.timeout()))
        .maybe_cwd(args.cwd.clone())
        .line_capacity(process.line_buffer_size);

    let config = match (args.exec, args.command.split_first()) {
        (true, Some((program, rest))) if !rest.is_empty() => builder
            .command(program.clone())
            .args(rest.to_vec())
            .mode(ExecMode::Exec)
            .build(),
        (true, _) => builder
            .command(command_line(&args.command))
            .mode(ExecMode::Exec)
            .build(),
        (false, _) => builder.command(command_line(&args.command)).build(),
    };

    Ok(config.with_env_list(&args.env)?)
}

fn report(status: &Status, json: bool) -> Result<()> {
    if json {
        let rendered = serde_json::to_string_pretty(status).context("failed to encode status")?;
        println!("{rendered}");
        return Ok(());
    }

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(status.stdout().as_bytes())?;
    stdout.flush()?;
    let mut stderr = std::io::stderr().lock();
    stderr.write_all(status.stderr().as_bytes())?;

    if let Some(err) = status.error()
        && err.exit_code_hint().is_none()
    {
        writeln!(stderr, "procwatch: {err}")?;
    }
    Ok(())
}
