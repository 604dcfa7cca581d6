//! Headless driver for the Kine worm simulation.
//!
//! Window management and live input stay out of scope; this shell
//! bootstraps a world from a procedural map, runs a fixed number of
//! frames at a chosen pacing level, and can write the final frame as a
//! PNG snapshot.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use kine_core::{ControlCommand, KineConfig, World, apply_control_command};
use kine_mapgen::{MapMode, ProceduralSource};
use kine_render::FrameBuffer;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "kine", version, about = "Worms foraging a food field")]
struct Cli {
    /// Field width in cells.
    #[arg(long, default_value_t = 640)]
    width: u32,

    /// Field height in cells.
    #[arg(long, default_value_t = 360)]
    height: u32,

    /// Map mode: split, noise, linear, radial, or cellular.
    #[arg(long, default_value = "noise")]
    mode: MapMode,

    /// Invert the generated field before the run starts.
    #[arg(long, default_value_t = false)]
    invert: bool,

    /// RNG seed for the world and the map generator.
    #[arg(long, default_value_t = 0xFACA_DE)]
    seed: u64,

    /// Number of worms.
    #[arg(long, default_value_t = kine_core::DEFAULT_POPULATION)]
    population: usize,

    /// Rendered frames to simulate.
    #[arg(long, default_value_t = 300)]
    frames: u64,

    /// Frame time in seconds fed to each sub-step.
    #[arg(long, default_value_t = 0.02)]
    dt: f32,

    /// Initial speed-multiplier level (0..=6; out of range resets to 0).
    #[arg(long, default_value_t = 0)]
    speed_level: i32,

    /// Write the final frame to this PNG path.
    #[arg(long)]
    snapshot: Option<PathBuf>,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = KineConfig {
        population: cli.population,
        rng_seed: Some(cli.seed),
        ..KineConfig::default()
    };

    let mut source = ProceduralSource::new(cli.mode, cli.seed);
    let mut world = World::from_source(config, &mut source, cli.width, cli.height)
        .context("failed to bootstrap world")?;
    if cli.invert {
        apply_control_command(&mut world, ControlCommand::InvertField);
    }
    apply_control_command(&mut world, ControlCommand::SetSpeedLevel(cli.speed_level));

    info!(
        mode = %cli.mode,
        width = cli.width,
        height = cli.height,
        population = cli.population,
        iterations = world.pacing().iterations(),
        "world ready"
    );

    for frame in 0..cli.frames {
        let events = world.step_frame(cli.dt);
        if frame.is_multiple_of(60) || frame + 1 == cli.frames {
            if let Some(summary) = world.history().last() {
                info!(
                    tick = summary.tick.0,
                    depletions = events.depletions,
                    avg_comfort = summary.average_comfort,
                    food_remaining = summary.food_remaining,
                    "frame"
                );
            }
        }
    }

    if let Some(path) = cli.snapshot {
        let mut frame = FrameBuffer::new(cli.width, cli.height);
        world.render(&mut frame);
        frame
            .save_png(&path)
            .with_context(|| format!("failed to write snapshot to {}", path.display()))?;
        info!(path = %path.display(), "snapshot written");
    }

    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}
