//! # Lantern Headless Runner
//!
//! Loads a world snapshot, runs it for a number of fixed-step frames without
//! a window, and exports the resulting world.
//!
//! ```bash
//! # Run 120 frames and print the result
//! lantern-headless level.json --frames 120
//!
//! # Feed input events first, write the result to a file
//! lantern-headless level.json --events input.json --output after.json
//! ```
//!
//! The events file is a JSON array of engine events, all delivered before
//! the first frame.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use lantern::core::WorldManager;
use lantern::{
    builtin_catalog, builtin_registry_with_sink, read_snapshot, write_snapshot, DrawSink,
    EngineConfig, EngineEvent, EngineResult, GameLoop, RecordingSink,
};

/// Run a Lantern world snapshot without rendering
#[derive(Parser, Debug)]
#[command(name = "lantern-headless", version)]
#[command(about = "Run a Lantern world snapshot without rendering", long_about = None)]
struct Args {
    /// Snapshot JSON to load
    snapshot: PathBuf,

    /// Engine configuration (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of frames to run
    #[arg(short, long, default_value_t = 60)]
    frames: u64,

    /// Fixed delta time per frame, in seconds
    #[arg(long, default_value_t = 1.0 / 60.0)]
    dt: f32,

    /// JSON array of events to deliver before the first frame
    #[arg(short, long)]
    events: Option<PathBuf>,

    /// Write the exported snapshot here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print frame statistics to stderr
    #[arg(long)]
    stats: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => match EngineConfig::load(path) {
            Ok(config) => config,
            Err(err) => {
                eprintln!("failed to load config {}: {err}", path.display());
                return ExitCode::FAILURE;
            }
        },
        None => EngineConfig::default(),
    };

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log.filter)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(&args, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(%err, "headless run failed");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args, config: &EngineConfig) -> EngineResult<()> {
    let snapshot = read_snapshot(&args.snapshot)?;

    let sink = RecordingSink::new();
    let shared = sink.clone();
    let mut registry = builtin_registry_with_sink(move || Box::new(shared.clone()) as Box<dyn DrawSink>);
    let world: WorldManager<EngineEvent> = WorldManager::from_snapshot(
        &snapshot,
        &mut registry,
        &builtin_catalog(),
        config.world.clone(),
    )?;
    registry.clear();

    let mut game_loop = GameLoop::new(world, config.frame.clone());

    if let Some(path) = &args.events {
        let events: Vec<EngineEvent> = serde_json::from_str(&std::fs::read_to_string(path)?)
            .map_err(lantern::core::EcsError::from)?;
        let input = game_loop.input();
        let queued = events.into_iter().map(|e| input.send(e)).filter(|sent| *sent).count();
        info!(queued, "input events queued");
    }

    game_loop.run_frames(args.frames, args.dt);

    let output = game_loop.output().drain();
    info!(
        frames = game_loop.frame_count(),
        emitted = output.len(),
        draws = sink.last_frame().len(),
        "run finished"
    );
    if args.stats {
        eprintln!("{}", game_loop.stats());
    }

    let exported = game_loop.world().export_state()?;
    match &args.output {
        Some(path) => write_snapshot(path, &exported)?,
        None => println!("{}", exported.to_json()?),
    }
    Ok(())
}
