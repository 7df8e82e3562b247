mod cli;
mod error_fmt;
mod logging;
mod replay;

use clap::Parser;
use cli::{Cli, Commands, JSON_MODE};
use std::process::ExitCode;

fn load_config(cli: &Cli) -> eyre::Result<cgmcal_config::Config> {
    match cli.config.as_deref() {
        Some(path) => cgmcal_config::load_config_file(path),
        None => Ok(cgmcal_config::Config::default()),
    }
}

fn run(cli: Cli) -> eyre::Result<()> {
    let cfg = load_config(&cli)?;
    let level = cli
        .log_level
        .as_deref()
        .or(cfg.logging.level.as_deref())
        .unwrap_or("info")
        .to_string();
    logging::init_tracing(cli.json, &level, &cfg.logging)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match cli.cmd {
        Commands::Live {
            readings,
            sensor_insert,
        } => {
            replay::run_live(&cfg, &readings, &sensor_insert, cli.json, &mut out)?;
        }
        Commands::Expired {
            checks,
            readings,
            sensor_insert,
        } => {
            replay::run_expired(
                &cfg,
                &checks,
                readings.as_deref(),
                &sensor_insert,
                cli.json,
                &mut out,
            )?;
        }
        Commands::Estimate {
            raw,
            slope,
            intercept,
        } => {
            replay::run_estimate(raw, slope, intercept, cli.json, &mut out)?;
        }
        Commands::Interpolate { readings, at } => {
            replay::run_interpolate(&cfg, &readings, at, cli.json, &mut out)?;
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);
    if !cli.json {
        let _ = color_eyre::install();
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            if JSON_MODE.get().copied().unwrap_or(false) {
                eprintln!("{}", error_fmt::format_error_json(&e));
            } else {
                eprintln!("{}", error_fmt::humanize(&e));
            }
            ExitCode::FAILURE
        }
    }
}
