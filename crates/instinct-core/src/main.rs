//! Headless behavior-architecture simulation runner.

use std::path::PathBuf;
use std::process::ExitCode;

use bevy_ecs::prelude::*;
use clap::Parser;
use glam::Vec2;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use tracing::warn;

use instinct_core::config::SimConfig;
use instinct_core::output::{sample_world, TelemetryWriter};
use instinct_core::setup::{self, Scenario};
use instinct_core::systems::{
    add_all_proxies, apply_actuators, capture_snapshot, refresh_proxies, reset_brains,
    sense_brains, update_brains, SpatialIndex, WorldSnapshot,
};
use instinct_core::SimRng;
use instinct_spatial::UniformGrid;

/// Command line arguments for the simulation
#[derive(Parser, Debug)]
#[command(name = "instinct_sim")]
#[command(about = "Headless behavior-based agent simulation")]
struct Args {
    /// Random seed for reproducibility
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Number of ticks to simulate
    #[arg(long, default_value_t = 1000)]
    ticks: u64,

    /// Which population to spawn
    #[arg(long, value_enum, default_value = "seek-and-avoid")]
    scenario: Scenario,

    /// Optional TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write JSONL telemetry rows to this path
    #[arg(long)]
    telemetry: Option<PathBuf>,

    /// Ticks between telemetry samples
    #[arg(long, default_value_t = 10)]
    telemetry_interval: u64,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => match SimConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error: {}", e);
                return ExitCode::FAILURE;
            }
        },
        None => SimConfig::default(),
    };

    println!("Instinct Simulation");
    println!("===================");
    println!("Seed: {}", args.seed);
    println!("Ticks: {}", args.ticks);
    println!("Scenario: {:?}", args.scenario);
    println!();

    let grid = match UniformGrid::new(
        Vec2::ZERO,
        Vec2::new(config.world_width, config.world_height),
        config.grid_cols,
        config.grid_rows,
    ) {
        Ok(grid) => grid,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // Initialize the ECS world
    let mut world = World::new();
    world.insert_resource(config);
    world.insert_resource(SpatialIndex(grid));
    world.insert_resource(WorldSnapshot::default());
    world.insert_resource(SimRng(SmallRng::seed_from_u64(args.seed)));

    // Spawn the scenario population
    {
        // Take the RNG out to avoid borrow conflicts
        let mut sim_rng = match world.remove_resource::<SimRng>() {
            Some(rng) => rng,
            None => {
                eprintln!("Error: simulation RNG missing");
                return ExitCode::FAILURE;
            }
        };
        if let Err(e) = setup::spawn_scenario(&mut world, args.scenario, &mut sim_rng.0) {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
        world.insert_resource(sim_rng);
    }
    add_all_proxies(&mut world);

    let agents = world.resource::<SpatialIndex>().0.len();
    println!("Spawned {} entities", agents);

    let mut telemetry = match &args.telemetry {
        Some(path) => match TelemetryWriter::new(path) {
            Ok(writer) => writer,
            Err(e) => {
                eprintln!("Error: could not open telemetry file: {}", e);
                return ExitCode::FAILURE;
            }
        },
        None => TelemetryWriter::null(),
    };

    // Create the per-tick schedule. Order is the evaluation protocol:
    // snapshot -> reset -> sense -> update -> actuate -> reindex.
    let mut schedule = Schedule::default();
    schedule.add_systems(
        (
            capture_snapshot,
            reset_brains,
            sense_brains,
            update_brains,
            apply_actuators,
            refresh_proxies,
        )
            .chain(),
    );

    println!();
    println!("Starting simulation...");

    for tick in 0..args.ticks {
        schedule.run(&mut world);

        if args.telemetry.is_some() && tick % args.telemetry_interval.max(1) == 0 {
            for row in sample_world(&mut world, tick) {
                if let Err(e) = telemetry.log(&row) {
                    warn!("telemetry write failed: {}", e);
                }
            }
        }
    }

    if let Err(e) = telemetry.flush() {
        warn!("telemetry flush failed: {}", e);
    }

    println!();
    println!("Done: {} ticks, {} telemetry rows", args.ticks, telemetry.rows());
    ExitCode::SUCCESS
}
