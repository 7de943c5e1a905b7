//! `clockwall`: a wall of analog clocks drawing the time in a terminal.

mod cli;
mod commands;
mod display;
mod error_fmt;
mod run;

use std::path::Path;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

use clockwall_config::{Config, Logging};
use clockwall_core::ClockError;

use crate::cli::{Cli, Commands, FILE_GUARD, JSON_MODE};
use crate::error_fmt::{exit_code_for_error, format_error_json, humanize};
use crate::run::RunOptions;

fn main() {
    let _ = color_eyre::install();
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    if let Err(err) = real_main(cli) {
        if JSON_MODE.get().copied().unwrap_or(false) {
            eprintln!("{}", format_error_json(&err));
        } else {
            eprintln!("{}", humanize(&err));
        }
        std::process::exit(exit_code_for_error(&err));
    }
}

fn real_main(cli: Cli) -> eyre::Result<()> {
    let cfg = load_config(cli.config.as_deref())?;
    init_tracing(cli.json, cli.log_level.as_deref(), &cfg.logging)?;
    tracing::debug!(config = ?cli.config, "configuration loaded");

    let settings_path = cli.settings.as_ref();
    match cli.cmd {
        Commands::Run {
            display,
            offline,
            max_ticks,
            no_persist,
            no_input,
        } => run::run_clock(
            &cfg,
            settings_path,
            cli.json,
            &RunOptions {
                display,
                offline,
                max_ticks,
                no_persist,
                no_input,
            },
        ),
        Commands::Calibrate { offline } => run::run_calibrate(&cfg, offline, cli.json),
        Commands::Digits { at, grid, display } => {
            run::run_digits(&cfg, settings_path, cli.json, at.as_deref(), grid, &display)
        }
        Commands::Share { base, display } => {
            run::run_share(&cfg, settings_path, cli.json, base.as_deref(), &display)
        }
    }
}

/// Read, parse and validate the config. Every failure is a config error.
fn load_config(path: Option<&Path>) -> eyre::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let text = std::fs::read_to_string(path).map_err(|e| {
        ClockError::Config(format!("cannot read {}: {e}", path.display()))
    })?;
    let cfg: Config = toml::from_str(&text)
        .map_err(|e| ClockError::Config(format!("{}: {e}", path.display())))?;
    cfg.validate()
        .map_err(|e| ClockError::Config(format!("{}: {e}", path.display())))?;
    Ok(cfg)
}

/// Console logs on stderr, plus an optional JSON file sink from `[logging]`.
///
/// `RUST_LOG` wins over `--log-level`, which wins over `logging.level`.
fn init_tracing(json: bool, cli_level: Option<&str>, logging: &Logging) -> eyre::Result<()> {
    let level = cli_level.or(logging.level.as_deref()).unwrap_or("info");
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let console = if json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .boxed()
    };

    let file_layer = match logging.file.as_deref() {
        Some(file) => {
            let path = Path::new(file);
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let name = path.file_name().ok_or_else(|| {
                ClockError::Config(format!("logging.file has no file name: {file}"))
            })?;
            let appender = match logging.rotation.as_deref().unwrap_or("never") {
                "daily" => tracing_appender::rolling::daily(dir, name),
                "hourly" => tracing_appender::rolling::hourly(dir, name),
                _ => tracing_appender::rolling::never(dir, name),
            };
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let _ = FILE_GUARD.set(guard);
            Some(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_ansi(false)
                    .with_writer(writer)
                    .boxed(),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file_layer)
        .try_init()
        .map_err(|e| eyre::eyre!("tracing init failed: {e}"))?;
    Ok(())
}
