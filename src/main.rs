use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing::info;

use agent_atlas::{EngineConfig, LayoutEngine, Topology};

/// Headless driver: load a topology, run the simulation until it settles,
/// write the resulting layout as JSON.
#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Topology JSON file ({"nodes": [...], "links": [...]}).
    topology: PathBuf,

    /// Where to write the layout JSON; stdout when omitted.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Seed for deterministic initial placement.
    #[arg(short = 'S', long, default_value_t = 42)]
    seed: u64,

    /// Safety bound on the number of ticks.
    #[arg(long, default_value_t = 1000)]
    max_ticks: u32,

    /// Pretty-print the output JSON.
    #[arg(long)]
    pretty: bool,
}

#[derive(Serialize)]
struct Point {
    x: f32,
    y: f32,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("agent_atlas=info".parse().unwrap()),
        )
        .init();

    let args = Args::parse();

    let raw = fs::read_to_string(&args.topology)
        .with_context(|| format!("failed to read {}", args.topology.display()))?;
    let topology: Topology = serde_json::from_str(&raw)
        .with_context(|| format!("invalid topology JSON in {}", args.topology.display()))?;

    let config = EngineConfig {
        seed: args.seed,
        ..EngineConfig::default()
    };
    let mut engine =
        LayoutEngine::with_topology(config, &topology).context("failed to load topology")?;
    info!(
        nodes = engine.node_count(),
        edges = engine.edge_count(),
        seed = args.seed,
        "topology loaded"
    );

    let mut ticks = 0u32;
    while ticks < args.max_ticks && engine.step() {
        ticks += 1;
    }
    info!(ticks, settled = engine.is_settled(), "simulation finished");

    let layout = engine
        .snapshot()
        .positions
        .into_iter()
        .map(|(id, position)| {
            (
                id,
                Point {
                    x: position.x,
                    y: position.y,
                },
            )
        })
        .collect::<BTreeMap<_, _>>();

    let json = if args.pretty {
        serde_json::to_string_pretty(&layout)?
    } else {
        serde_json::to_string(&layout)?
    };

    match &args.output {
        Some(path) => {
            fs::write(path, &json)
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(path = %path.display(), "layout written");
        }
        None => println!("{json}"),
    }

    Ok(())
}
