use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

use signal_sim::simulation::{self, MetricsSummary, SignalConfig, SimWorld, TrafficGenerator};

#[derive(Parser)]
#[command(name = "signal_sim")]
#[command(about = "Adaptive traffic signal simulation for a four-way intersection")]
struct Cli {
    /// JSON file with signal configuration; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of ticks to simulate
    #[arg(long)]
    ticks: Option<u64>,

    /// Seed for the traffic generator
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Chance per tick that a vehicle arrives
    #[arg(long, default_value_t = simulation::DEFAULT_SPAWN_RATE)]
    spawn_rate: f64,

    /// Chance that an arriving vehicle is an emergency vehicle
    #[arg(long, default_value_t = simulation::DEFAULT_EMERGENCY_RATE)]
    emergency_rate: f64,

    #[arg(long)]
    min_green: Option<u32>,

    #[arg(long)]
    max_green: Option<u32>,

    #[arg(long)]
    yellow: Option<u32>,

    /// Print the intersection status every N ticks (0 disables)
    #[arg(long, default_value = "0")]
    summary_every: u64,

    /// Write the metrics summary as JSON to this file
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("warn,signal_sim=info"),
    )
    .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    run_headless(&cli, config)
}

fn load_config(cli: &Cli) -> Result<SignalConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("Failed to parse config file {}", path.display()))?
        }
        None => SignalConfig::default(),
    };

    if let Some(ticks) = cli.ticks {
        config.duration_ticks = ticks;
    }
    if let Some(min_green) = cli.min_green {
        config.min_green = min_green;
    }
    if let Some(max_green) = cli.max_green {
        config.max_green = max_green;
    }
    if let Some(yellow) = cli.yellow {
        config.yellow_duration = yellow;
    }
    Ok(config)
}

/// Run the simulation in headless mode (no graphics)
fn run_headless(cli: &Cli, config: SignalConfig) -> Result<()> {
    println!("Running signal simulation in headless mode...");
    println!(
        "Ticks: {}, Seed: {}, Spawn rate: {}, Emergency rate: {}",
        config.duration_ticks, cli.seed, cli.spawn_rate, cli.emergency_rate
    );
    println!();

    let mut world = SimWorld::new(config).context("Invalid signal configuration")?;
    let mut generator = TrafficGenerator::new(cli.seed, cli.spawn_rate, cli.emergency_rate);

    while !world.is_closed() {
        if let Some(event) = generator.next_event() {
            world.spawn_event(event);
        }
        world.tick();

        if cli.summary_every > 0 && world.current_tick() % cli.summary_every == 0 {
            world.print_summary();
            println!();
        }
    }

    println!("=== Final State ===");
    world.print_summary();

    let summary = world.finish();
    info!("=== SIMULATION COMPLETE ===");
    info!("Total ticks: {}", summary.total_ticks);
    info!("Total vehicles passed: {}", summary.total_vehicles_passed);
    info!("Vehicles per tick: {:.2}", summary.vehicles_per_tick);
    match (summary.average_wait, summary.max_wait) {
        (Some(average), Some(max)) => {
            info!("Average waiting time: {:.2} ticks", average);
            info!("Max waiting time: {} ticks", max);
        }
        _ => info!("No vehicles crossed, so no waiting time data"),
    }
    info!("Emergency preemptions: {}", summary.preemptions);
    info!("Still waiting: {}", summary.still_waiting);
    for lane in &summary.lanes {
        info!(
            "Lane {}: passed={} idle_green={}/{}",
            lane.lane, lane.passed, lane.idle_green_ticks, lane.green_ticks
        );
    }

    if let Some(path) = &cli.output {
        write_summary(path, &summary)?;
        info!("Metrics written to {}", path.display());
    }
    Ok(())
}

fn write_summary(path: &Path, summary: &MetricsSummary) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(summary).context("Failed to serialize metrics")?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
}
