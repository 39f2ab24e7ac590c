use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use endpoint::bridge::TelemetryBridge;
use generator::fleet::FleetGenerator;
use meshcore::FetchQuery;
use std::fs;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;
use workflow::config::SimulatorConfig;

mod endpoint;
mod generator;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Synthetic mesh telemetry endpoint")]
struct Args {
    /// Emit a single telemetry snapshot as JSON and exit
    #[arg(long, default_value_t = false)]
    offline: bool,
    /// Write the offline snapshot here instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
    /// Load a simulator config from YAML
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, default_value = "127.0.0.1:8787")]
    bind: SocketAddr,
    #[arg(long, default_value_t = 12)]
    nodes: usize,
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Fraction of requests answered with HTTP 503
    #[arg(long, default_value_t = 0.0)]
    failure_rate: f64,
    #[arg(long, default_value_t = 24)]
    hours: u32,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = if let Some(path) = args.config {
        SimulatorConfig::load(path)?
    } else {
        let config = SimulatorConfig::from_args(args.bind, args.nodes, args.seed, args.failure_rate);
        config.validate()?;
        config
    };

    let fleet = FleetGenerator::new(&config);

    if args.offline {
        let query = FetchQuery {
            hours: args.hours.max(1),
            limit: u32::try_from(config.node_count).unwrap_or(u32::MAX),
        };
        let payload = fleet
            .respond(query, Utc::now())
            .context("simulated outage on offline snapshot")?;
        let body = serde_json::to_string_pretty(&payload).context("encoding snapshot")?;
        match args.output {
            Some(path) => {
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::write(&path, body)
                    .with_context(|| format!("writing snapshot {}", path.display()))?;
                println!("Offline snapshot -> {} nodes in {}", payload.node_count(), path.display());
            }
            None => println!("{body}"),
        }
        return Ok(());
    }

    let bridge = TelemetryBridge::new(fleet);
    let runtime = TokioBuilder::new_multi_thread()
        .enable_all()
        .build()
        .context("creating runtime for telemetry endpoint")?;
    runtime.block_on(async move {
        tokio::select! {
            _ = bridge.serve(config.bind) => Ok(()),
            result = signal::ctrl_c() => result.context("awaiting Ctrl+C to exit"),
        }
    })?;

    Ok(())
}
