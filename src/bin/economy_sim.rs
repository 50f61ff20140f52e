//! Headless Economy Runner
//!
//! Runs a colony for a number of in-game days at a fixed frame rate and
//! prints a summary, or the final world snapshot as JSON.

use std::path::PathBuf;

use clap::Parser;
use colony_economy::resources::ResourceKind;
use colony_economy::unit::UnitCatalog;
use colony_economy::{Simulation, SimulationConfig};
use serde::Serialize;

/// Headless Economy Runner - simulate a colony without a display
#[derive(Parser, Debug)]
#[command(name = "economy_sim")]
#[command(about = "Run the colony economy headless and report what it produced")]
struct Args {
    /// In-game days to simulate
    #[arg(long, default_value_t = 10)]
    days: u64,

    /// Random seed for the planet (random if omitted)
    #[arg(long)]
    seed: Option<u64>,

    /// Simulated frames per second of wall time
    #[arg(long, default_value_t = 30.0)]
    fps: f64,

    /// Time-scale multiplier
    #[arg(long, default_value_t = 1.0)]
    time_scale: f64,

    /// Simulation config TOML (defaults if omitted)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Unit catalog TOML (built-in profiles if omitted)
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Start every unit in the first sect, not just the core
    #[arg(long)]
    start_all: bool,

    /// Output format: json or text
    #[arg(long, default_value = "text")]
    format: String,
}

/// JSON output structure
#[derive(Serialize)]
struct RunSummary {
    seed: u64,
    days: u64,
    ticks: u64,
    frames: u64,
    starved_unit_ticks: usize,
    collections: usize,
    collected: Vec<(ResourceKind, f32)>,
    world: colony_economy::simulation::WorldSnapshot,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("colony_economy=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => match SimulationConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error loading config {}: {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => SimulationConfig::default(),
    };

    let catalog = match &args.catalog {
        Some(path) => match UnitCatalog::load(path) {
            Ok(catalog) => catalog,
            Err(e) => {
                eprintln!("Error loading unit catalog {}: {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => UnitCatalog::with_defaults(),
    };

    if !(args.fps > 0.0) {
        eprintln!("--fps must be positive");
        std::process::exit(1);
    }

    let seed = args.seed.unwrap_or_else(rand::random);
    let mut sim = match Simulation::new(config, catalog, seed) {
        Ok(sim) => sim,
        Err(e) => {
            eprintln!("Invalid simulation setup: {}", e);
            std::process::exit(1);
        }
    };
    sim.set_time_scale(args.time_scale);

    if args.start_all {
        let units = sim.colony().sects().first().map(|s| s.units().len()).unwrap_or(0);
        for unit in 0..units {
            if let Err(e) = sim.start_unit(0, unit) {
                eprintln!("Could not start unit {}: {}", unit, e);
            }
        }
    }

    let frame = 1.0 / args.fps;
    let target_tick = args.days * sim.scheduler().ticks_per_day();
    let mut frames = 0u64;
    let mut ticks = 0u64;
    let mut starved = 0usize;
    let mut collections = 0usize;
    let mut collected: std::collections::BTreeMap<ResourceKind, f32> = Default::default();

    while sim.scheduler().current_tick() < target_tick {
        let report = sim.advance(frame);
        frames += 1;
        ticks += report.ticks;
        starved += report.starved;
        for (_, collection) in &report.collections {
            collections += 1;
            for (kind, amount) in &collection.collected {
                *collected.entry(*kind).or_insert(0.0) += amount;
            }
        }
    }

    let summary = RunSummary {
        seed,
        days: sim.current_day(),
        ticks,
        frames,
        starved_unit_ticks: starved,
        collections,
        collected: collected.into_iter().collect(),
        world: sim.snapshot(),
    };

    if args.format == "json" {
        match serde_json::to_string_pretty(&summary) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error serializing summary: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        print_text(&summary);
    }
}

fn print_text(summary: &RunSummary) {
    println!("=== COLONY ECONOMY ===");
    println!("Seed: {}", summary.seed);
    println!(
        "Ran {} ticks over {} frames, reached day {}",
        summary.ticks, summary.frames, summary.days
    );
    println!("Collections: {}", summary.collections);
    println!("Starved unit-ticks: {}", summary.starved_unit_ticks);

    println!("\nCollected:");
    for (kind, amount) in &summary.collected {
        println!("  {:<10} {:>10.2}", kind.display_name(), amount);
    }

    for (i, sect) in summary.world.colony.sects.iter().enumerate() {
        println!("\nSect {} at ({:.0}, {:.0})", i, sect.position.x, sect.position.y);
        for unit in &sect.units {
            let module = unit
                .active_module
                .and_then(|m| unit.modules.get(m))
                .map(|m| format!("{} L{}", m.name, m.level))
                .unwrap_or_else(|| "-".into());
            println!(
                "  {:<14} {:<8} {}",
                unit.kind.name(),
                if unit.running { "running" } else { "stopped" },
                module
            );
        }
    }

    println!("\nField remaining:");
    for (kind, total) in &summary.world.field_totals {
        println!("  {:<10} {:>10.2}", kind.display_name(), total);
    }
}
