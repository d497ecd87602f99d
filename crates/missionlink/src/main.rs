//! `mlink` - CLI for missionlink
//!
//! This binary runs the interactive mission-control dashboard and a few
//! supporting commands for checking the telemetry link and configuration.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::io::{IsTerminal, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::BufReader;
use tracing::info;

use missionlink::cli::{Cli, Command, ConfigCommand, FetchCommand, MonitorCommand};
use missionlink::console::{Console, ConsoleOptions};
use missionlink::render::RenderOptions;
use missionlink::source::{HttpTelemetrySource, TelemetrySource};
use missionlink::{init_logging, Config, Dashboard};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    match cli.command {
        Command::Monitor(cmd) => {
            let config = load_config(cli.config)?;
            run_async(handle_monitor(&config, &cmd))
        }
        Command::Fetch(cmd) => {
            let config = load_config(cli.config)?;
            run_async(handle_fetch(&config, &cmd))
        }
        Command::Config(cmd) => handle_config(cli.config, cmd),
    }
}

fn load_config(path: Option<PathBuf>) -> Result<Config> {
    Config::load_from(path).context("failed to load configuration")
}

/// Drive `future` to completion on a single-threaded runtime.
fn run_async<F>(future: F) -> Result<()>
where
    F: std::future::Future<Output = Result<()>>,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    let result = runtime.block_on(future);
    // A blocking stdin read may still be parked on the blocking pool.
    runtime.shutdown_background();
    result
}

fn http_source(config: &Config) -> Result<HttpTelemetrySource> {
    HttpTelemetrySource::from_config(config).context("failed to set up telemetry source")
}

async fn handle_monitor(config: &Config, cmd: &MonitorCommand) -> Result<()> {
    let source: Arc<dyn TelemetrySource> = Arc::new(http_source(config)?);
    let mut dashboard = Dashboard::from_config(source, config);
    if cmd.launch {
        dashboard.launch();
    }

    let interactive = std::io::stdout().is_terminal();
    let options = ConsoleOptions {
        json: cmd.json,
        clear_screen: interactive,
        log_lines: config.display.log_lines,
        render: RenderOptions {
            color: config.display.color && interactive && !cmd.no_color,
            ..RenderOptions::default()
        },
    };

    let mut console = Console::new(dashboard, std::io::stdout(), options);
    console
        .run(BufReader::new(tokio::io::stdin()))
        .await
        .context("dashboard console failed")?;

    info!("Mission control closed");
    Ok(())
}

async fn handle_fetch(config: &Config, cmd: &FetchCommand) -> Result<()> {
    let source = http_source(config)?;
    let mut batch = source
        .fetch_latest()
        .await
        .with_context(|| format!("failed to fetch telemetry from {}", source.url()))?;
    batch.reverse();

    let mut out = std::io::stdout().lock();
    if cmd.json {
        writeln!(out, "{}", serde_json::to_string_pretty(&batch)?)?;
        return Ok(());
    }

    if batch.is_empty() {
        writeln!(out, "No telemetry available from {}", source.url())?;
        return Ok(());
    }

    writeln!(
        out,
        "{:<20} {:<10} {:>10} {:>12} {:>10} {:>10} {:>8}",
        "TIME", "STATUS", "ALT km", "VEL km/h", "TEMP °C", "FUEL Bar", "ROLL"
    )?;
    for sample in &batch {
        writeln!(
            out,
            "{:<20} {:<10} {:>10.2} {:>12.2} {:>10.2} {:>10.2} {:>8.2}",
            sample.timestamp.format("%Y-%m-%d %H:%M:%S"),
            sample.status_code,
            sample.altitude_km,
            sample.velocity_kmh,
            sample.engine_temp,
            sample.pressure_fuel,
            sample.attitude_roll
        )?;
    }
    Ok(())
}

fn handle_config(config_path: Option<PathBuf>, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            let config = load_config(config_path)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                let timeout = config
                    .request_timeout()
                    .map_or_else(|| "none".to_string(), |t| format!("{} ms", t.as_millis()));
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Telemetry]");
                println!("  Base URL:           {}", config.telemetry.base_url);
                println!("  Endpoint:           {}", config.telemetry.endpoint);
                println!("  Poll interval:      {} ms", config.telemetry.poll_interval_ms);
                println!("  Request timeout:    {timeout}");
                println!();
                println!("[History]");
                println!("  Capacity:           {}", config.history.capacity);
                println!();
                println!("[Display]");
                println!("  Log lines:          {}", config.display.log_lines);
                println!("  Color:              {}", config.display.color);
            }
        }
        ConfigCommand::Path => {
            let path = config_path.unwrap_or_else(Config::default_config_path);
            println!("{}", path.display());
        }
        ConfigCommand::Validate { file } => {
            let path = file
                .or(config_path)
                .unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            let config = load_config(Some(path)).context("configuration is invalid")?;
            println!("Configuration is valid.");
            println!("Telemetry endpoint: {}", config.telemetry_url()?);
        }
    }
    Ok(())
}
