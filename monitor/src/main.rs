use anyhow::Context;
use clap::Parser;
use config::MonitorConfig;
use controls::{ControlCommand, HELP};
use log::info;
use meshcore::{RefreshConfig, RefreshScheduler, ViewshedLimits};
use render::ConsoleRenderer;
use source::HttpTelemetrySource;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;

mod config;
mod controls;
mod render;
mod source;

#[derive(Parser)]
#[command(author, version, about = "Polls a mesh telemetry endpoint and prints node cards")]
struct Args {
    /// Base URL of the telemetry service
    #[arg(long)]
    endpoint: Option<String>,
    /// Load a monitor config from YAML
    #[arg(long)]
    config: Option<PathBuf>,
    /// Refresh period in seconds; 0 means manual refresh only
    #[arg(long, default_value_t = 60)]
    interval: u64,
    #[arg(long, default_value_t = 24)]
    hours: u32,
    #[arg(long, default_value_t = 20)]
    max_nodes: u32,
    /// Viewshed overlay limit in km (1-100)
    #[arg(long, default_value_t = 100.0)]
    viewshed_limit: f64,
    /// Fetch once, render, and exit
    #[arg(long, default_value_t = false)]
    once: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = if let Some(path) = args.config {
        MonitorConfig::load(path)?
    } else {
        let refresh = RefreshConfig::new(args.interval, args.hours, args.max_nodes)
            .context("validating refresh arguments")?;
        MonitorConfig::from_args(args.endpoint, refresh, args.viewshed_limit)
    };

    let runtime = TokioBuilder::new_current_thread()
        .enable_all()
        .build()
        .context("creating runtime for the refresh scheduler")?;
    runtime.block_on(run(config, args.once))
}

async fn run(config: MonitorConfig, once: bool) -> anyhow::Result<()> {
    let source = HttpTelemetrySource::new(config.endpoint.clone());
    let renderer = ConsoleRenderer::new(config.title.clone());
    let limits = ViewshedLimits::with_user_limit(config.viewshed_limit_km);
    let mut scheduler = RefreshScheduler::new(source, renderer, limits);

    let first = scheduler.start(config.refresh);
    if once {
        first.settled().await;
        scheduler.destroy();
        return Ok(());
    }

    println!("{}", scheduler.sink().banner());
    println!("{HELP}");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            line = lines.next_line(), if stdin_open => {
                match line.context("reading control input")? {
                    Some(line) if line.trim().is_empty() => {}
                    Some(line) => {
                        if !apply_command(&mut scheduler, &line) {
                            break;
                        }
                    }
                    None => {
                        info!("control input closed; running until Ctrl+C");
                        stdin_open = false;
                    }
                }
            }
            result = signal::ctrl_c() => {
                result.context("awaiting Ctrl+C to exit")?;
                break;
            }
        }
    }

    scheduler.destroy();
    Ok(())
}

/// Applies one control line; returns `false` when the user asked to quit.
fn apply_command(
    scheduler: &mut RefreshScheduler<HttpTelemetrySource, ConsoleRenderer>,
    line: &str,
) -> bool {
    let command = match ControlCommand::parse(line) {
        Ok(command) => command,
        Err(err) => {
            println!("{err:#}");
            return true;
        }
    };

    if let Some(next) = command.reconfigured(scheduler.config()) {
        let _ = scheduler.reconfigure(next);
        return true;
    }

    if let Some((hours, limit)) = command.query_window(scheduler.config()) {
        match scheduler.set_query_window(hours, limit) {
            Ok(_) => {
                let _ = scheduler.refresh();
            }
            Err(err) => println!("rejected refresh settings: {err}"),
        }
        return true;
    }

    match command {
        ControlCommand::Viewshed(km) => {
            let limits = scheduler.set_viewshed_limit(km);
            println!(
                "viewshed limit {:.0} km (applies from the next refresh)",
                limits.user_limit_km
            );
        }
        ControlCommand::Endpoint(url) => {
            if scheduler.source().set_base_url(Some(url)) {
                let _ = scheduler.refresh();
            } else {
                println!("endpoint cleared");
            }
        }
        ControlCommand::Refresh => {
            let _ = scheduler.refresh();
        }
        ControlCommand::Status => {
            let cfg = scheduler.config();
            let metrics = scheduler.metrics();
            println!(
                "{} | interval {}s, {} h, {} nodes | fetches {} ok / {} failed, {} ticks skipped",
                scheduler.status(),
                cfg.interval_seconds,
                cfg.time_range_hours,
                cfg.max_nodes,
                metrics.succeeded,
                metrics.failed,
                metrics.skipped_ticks
            );
        }
        ControlCommand::Help => println!("{HELP}"),
        ControlCommand::Quit => return false,
        ControlCommand::Interval(_) | ControlCommand::Hours(_) | ControlCommand::Limit(_) => {}
    }
    true
}
