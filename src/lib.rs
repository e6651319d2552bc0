#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::invalid_rust_codeblocks)]

//! # Voxel Streaming
//!
//! A chunk-streaming voxel world driven by a bounded cooperative task scheduler.
//!
//! The world is split into cubic chunks that are built around a moving observer,
//! drawn through a renderer collaborator, and persisted to a chunk store when they
//! fall out of range. Liquid flow and falling blocks are simulated as cooperative
//! tasks on the same scheduler.
//!
//! ## Key Modules
//!
//! * `core` - Configuration, error types and the cancellation token
//! * `engine_state` - The streaming controller, the scheduler, the voxel data model
//!   and the store and renderer collaborators
//!
//! ## Usage
//!
//! ```no_run
//! // Native application initialization
//! fn main() {
//!     if let Err(error) = voxel_streaming::run() {
//!         eprintln!("{error}");
//!     }
//! }
//! ```
//!
//! ## Performance Considerations
//!
//! * The scheduler caps the number of active tasks, so a wide build or a large flood
//!   spreads its cost over many frames
//! * Recursive builds share a visited map and stay bounded by their radius
//! * Only chunks within the retention radius stay in memory

use std::{path::PathBuf, time::Duration};

use cgmath::Point3;
use log::{info, warn};
use web_time::Instant;

pub mod core;
pub mod engine_state;

pub use crate::core::{CancellationToken, VoxelError, WorldConfig};
pub use engine_state::EngineState;

use engine_state::{
    persistence::FileChunkStore,
    rendering::RecordingRenderer,
    voxels::{
        block::{
            block_side::BlockSide,
            block_type::{BlockOpacity, BlockType},
        },
        chunk::chunk_key,
        terrain::PerlinTerrain,
    },
};

/// Configuration file read by `run()` when no path is given on the command line.
pub const DEFAULT_CONFIG_PATH: &str = "world.json";

/// Target duration of one demo frame.
const FRAME_TIME: Duration = Duration::from_millis(16);
/// Blocks the demo observer walks per frame.
const OBSERVER_SPEED: f32 = 0.25;
/// Height above the terrain surface the observer spawns at.
const SPAWN_HEIGHT: f32 = 15.0;

type DemoState = EngineState<FileChunkStore, RecordingRenderer>;

/// Runs the native demo: walks an observer across a Perlin world, pours water and
/// drops sand on the way, and saves every changed chunk before returning.
pub fn run() -> Result<(), VoxelError> {
    let mut log_builder = env_logger::Builder::new();
    log_builder
        .target(env_logger::Target::Stdout)
        .parse_env("RUST_LOG")
        .init();

    info!("Logger initialized");

    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let config = WorldConfig::from_json_file(&config_path)?;
    info!("Using configuration from {}", config_path.display());

    let store = FileChunkStore::open(&config.save_directory)?;
    let terrain = PerlinTerrain::new(config.terrain_seed);
    let mut observer = Point3::new(0.5, terrain.surface_height(0, 0) as f32 + SPAWN_HEIGHT, 0.5);
    let demo_frames = config.demo_frames;

    let mut engine_state = EngineState::new(
        config,
        Box::new(terrain),
        store,
        RecordingRenderer::new(),
        observer,
    )?;

    let mut rng = fastrand::Rng::new();
    let mut last_frame = Instant::now();
    for frame in 0..demo_frames {
        let frame_start = Instant::now();
        let elapsed = frame_start.duration_since(last_frame);
        last_frame = frame_start;

        observer.x += OBSERVER_SPEED;
        observer.z += rng.f32() * 0.2 - 0.1;
        engine_state.update(observer, elapsed);

        if frame == demo_frames / 4 {
            pour_water(&mut engine_state, observer);
        }
        if frame == demo_frames / 2 {
            drop_sand(&mut engine_state, observer);
        }

        let spent = frame_start.elapsed();
        if spent < FRAME_TIME {
            std::thread::sleep(FRAME_TIME - spent);
        }
    }

    info!(
        "Demo finished: {} chunks loaded, {} draws, peak of {} active tasks",
        engine_state.world.len(),
        engine_state.renderer().total_draws(),
        engine_state.task_manager.peak_active()
    );

    let report = engine_state.shutdown();
    for (key, error) in &report.failed {
        warn!("Chunk {} was not saved: {}", key, error);
    }
    Ok(())
}

/// The first non-solid cell on top of the ground below `observer`.
fn ground_below(engine_state: &DemoState, observer: Point3<f32>) -> Option<Point3<i32>> {
    let mut position = chunk_key::block_position_of(observer);
    while let Some(block) = engine_state.world.block_at(position) {
        if block.opacity() == BlockOpacity::Solid {
            return Some(position + BlockSide::TOP.offset());
        }
        position.y -= 1;
    }
    None
}

fn pour_water(engine_state: &mut DemoState, observer: Point3<f32>) {
    match ground_below(engine_state, observer) {
        Some(position) => engine_state.start_flow(position, BlockType::WATER, 4, 32),
        None => warn!("No ground loaded below the observer to pour water on"),
    }
}

fn drop_sand(engine_state: &mut DemoState, observer: Point3<f32>) {
    let Some(ground) = ground_below(engine_state, observer) else {
        warn!("No ground loaded below the observer to drop sand on");
        return;
    };
    let start = Point3::new(ground.x, ground.y + 6, ground.z);
    for position in [start, start + BlockSide::TOP.offset()] {
        if engine_state
            .world
            .modify_block(position, |block| block.set_type(BlockType::SAND))
            .is_none()
        {
            warn!("Cannot place sand at {:?}, its chunk is not loaded", position);
            return;
        }
    }
    engine_state.start_fall(start, BlockType::SAND);
}
