// procwatch: Managed subprocess execution
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Entry point.
//!
//! ```text
//! cli::parse() --> Settings --> Logging --> Command Dispatch
//!   Run | Stream | Exists | Version
//! ```

use std::process::ExitCode;

use procwatch::cli::global::GlobalOptions;
use procwatch::cli::{self, Command};
use procwatch::cmd::exists::run_exists_command;
use procwatch::cmd::run::run_process_command;
use procwatch::cmd::stream::run_stream_command;
use procwatch::config::Settings;
use procwatch::config::loader::ConfigLoader;
use procwatch::logging::init_logging;
use procwatch::logging::{LogConfig, LogLevel};

use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = cli::parse();

    let settings = match load_settings(&cli.global) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Failed to load config: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    let log_config = build_log_config(&settings);
    let _log_guard = match init_logging(&log_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            return ExitCode::FAILURE;
        }
    };

    dispatch_command(&cli, &settings).await
}

fn build_log_config(settings: &Settings) -> LogConfig {
    LogConfig::builder()
        .with_console_level(settings.log.level)
        .with_file_level(LogLevel::TRACE)
        .maybe_with_log_file(settings.log.file.as_ref().map(|p| p.display().to_string()))
        .build()
}

async fn dispatch_command(cli: &cli::Cli, settings: &Settings) -> ExitCode {
    let result = match &cli.command {
        Some(Command::Version) => {
            handle_version_command();
            Ok(0)
        }
        Some(Command::Run(args)) => run_process_command(args, settings).await,
        Some(Command::Stream(args)) => run_stream_command(args, settings).await,
        Some(Command::Exists(args)) => Ok(run_exists_command(args)),
        None => {
            eprintln!("No command specified. Use --help for usage information.");
            Err(anyhow::anyhow!("No command specified"))
        }
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn handle_version_command() {
    println!("{}", env!("CARGO_PKG_VERSION"));
}

fn build_config_loader(global: &GlobalOptions) -> procwatch::error::Result<ConfigLoader> {
    let mut loader = ConfigLoader::new().add_toml_file_optional("procwatch.toml");
    for path in &global.configs {
        loader = loader.add_toml_file(path);
    }
    global.apply_overrides(loader.with_env_prefix("PROCWATCH"))
}

fn load_settings(global: &GlobalOptions) -> procwatch::error::Result<Settings> {
    build_config_loader(global)?.build()
}
