//! # Engine State Module
//!
//! The streaming controller of the voxel world.
//!
//! ## Key Components
//!
//! * `EngineState` - Owns the world session and drives it once per frame
//! * `persistence` - The chunk store collaborator and its implementations
//! * `rendering` - The renderer collaborator
//! * `task_management` - The bounded cooperative task scheduler
//! * `voxels` - Blocks, chunks, the world registry and the tasks that mutate them
//!
//! ## Architecture
//!
//! `EngineState` is the single owner of the `World`. Everything that touches chunks
//! (builds, draw and removal passes, liquid flow, falling blocks) runs as a task on
//! the `TaskManager`, which lends the world, the store and the renderer to one task
//! step at a time. The controller itself only decides *when* work is published:
//!
//! * A recursive build is issued whenever the observer moves more than one chunk edge
//!   away from where the last build was issued; the previous build is cancelled
//! * A draw pass is kept in flight at all times; it also queues distant chunks
//! * A removal pass is published whenever chunks are queued and none is running
//! * Changed chunks are saved on a fixed interval and at shutdown

use std::time::Duration;

use cgmath::{MetricSpace, Point3};

use crate::core::{CancellationToken, ConfigError, WorldConfig};
use persistence::{AutosaveReport, ChunkStore};
use rendering::ChunkRenderer;
use task_management::TaskManager;
use voxels::{
    block::block_type::BlockType,
    chunk::{chunk_key, ChunkCoordinate},
    tasks::{BuildWorldTask, DrawChunksTask, FallTask, FlowTask, RemoveChunksTask},
    terrain::TerrainGenerator,
    world::World,
};

pub mod persistence;
pub mod rendering;
pub mod task_management;
pub mod voxels;

/// The streaming world session.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use cgmath::Point3;
/// use voxel_streaming::core::WorldConfig;
/// use voxel_streaming::engine_state::{
///     persistence::MemoryChunkStore,
///     rendering::RecordingRenderer,
///     voxels::{block::block_type::BlockType, terrain::FlatTerrain},
///     EngineState,
/// };
///
/// let config = WorldConfig {
///     chunk_edge: 8,
///     retention_radius: 2,
///     ..WorldConfig::default()
/// };
/// let mut engine_state = EngineState::new(
///     config,
///     Box::new(FlatTerrain::new(4, BlockType::STONE)),
///     MemoryChunkStore::new(),
///     RecordingRenderer::new(),
///     Point3::new(4.0, 12.0, 4.0),
/// )
/// .unwrap();
///
/// // Main loop
/// for _ in 0..10 {
///     engine_state.update(Point3::new(4.0, 12.0, 4.0), Duration::from_millis(16));
/// }
/// assert!(engine_state.world.contains_chunk(Point3::new(0, 1, 0)));
///
/// let report = engine_state.shutdown();
/// assert!(report.is_complete());
/// ```
pub struct EngineState<S: ChunkStore, R: ChunkRenderer> {
    config: WorldConfig,
    /// The registry of loaded chunks
    pub world: World,
    /// Runs builds, passes and simulations
    pub task_manager: TaskManager,
    store: S,
    renderer: R,
    /// Observer position as of the last update
    observer_position: Point3<f32>,
    /// Observer position the current build was issued from
    last_build_position: Point3<f32>,
    /// Cancels the current build tree
    build_cancellation: CancellationToken,
    /// Time since the last autosave
    since_autosave: Duration,
}

impl<S: ChunkStore, R: ChunkRenderer> EngineState<S, R> {
    /// Creates a session and issues the first build around the observer.
    ///
    /// # Arguments
    ///
    /// * `config` - Validated before anything is built
    /// * `terrain` - Generates chunks the store has no snapshot for
    /// * `store` - Receives evicted and autosaved chunks
    /// * `renderer` - Draws chunks with pending work
    /// * `observer` - Initial observer position in world units
    pub fn new(
        config: WorldConfig,
        terrain: Box<dyn TerrainGenerator>,
        store: S,
        renderer: R,
        observer: Point3<f32>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut world = World::new(&config, terrain);
        world.set_observer(observer);
        let task_manager = TaskManager::new(config.scheduler_capacity);

        let mut engine_state = EngineState {
            config,
            world,
            task_manager,
            store,
            renderer,
            observer_position: observer,
            last_build_position: observer,
            build_cancellation: CancellationToken::new(),
            since_autosave: Duration::ZERO,
        };

        // The observer's own chunk is built right away so it never stands in a hole.
        let origin = engine_state.observer_chunk();
        if (0..engine_state.world.vertical_limit()).contains(&origin.y) {
            engine_state.world.build_chunk_at(origin, &mut engine_state.store);
        }
        engine_state.build_cancellation =
            engine_state.build_world_recursively(origin, engine_state.retention_radius());

        Ok(engine_state)
    }

    /// Runs one controller tick: reacts to observer movement, keeps the streaming
    /// passes in flight, steps the scheduler and autosaves when the interval elapsed.
    ///
    /// # Arguments
    ///
    /// * `observer` - The observer's current position
    /// * `elapsed` - Time since the previous update
    ///
    /// # Returns
    ///
    /// The number of task steps executed.
    pub fn update(&mut self, observer: Point3<f32>, elapsed: Duration) -> usize {
        self.process_observer(observer);
        self.schedule_streaming_passes();
        let steps = self.process_tasks(elapsed);

        self.since_autosave += elapsed;
        if self.since_autosave >= self.config.autosave_interval() {
            self.since_autosave = Duration::ZERO;
            let report = self.save_changed_chunks();
            if !report.is_complete() {
                log::warn!("Autosave left {} chunks unsaved", report.failed.len());
            }
        }

        steps
    }

    /// Records the observer position and re-issues the build once the observer is more
    /// than one chunk edge away from where the current build was issued.
    ///
    /// # Returns
    ///
    /// `true` if a new build was issued.
    pub fn process_observer(&mut self, observer: Point3<f32>) -> bool {
        self.observer_position = observer;
        self.world.set_observer(observer);
        if self.last_build_position.distance(observer) <= self.config.edge() as f32 {
            return false;
        }

        self.last_build_position = observer;
        self.build_cancellation.cancel();
        let origin = self.observer_chunk();
        self.build_cancellation = self.build_world_recursively(origin, self.retention_radius());
        true
    }

    /// Publishes a recursive build of every chunk within Manhattan distance
    /// `radius - 1` of `coordinate`.
    ///
    /// # Returns
    ///
    /// The token that cancels the whole build tree.
    pub fn build_world_recursively(&mut self, coordinate: ChunkCoordinate, radius: i32) -> CancellationToken {
        let cancellation = CancellationToken::new();
        log::info!(
            "Building world around chunk ({}, {}, {}) with radius {}",
            coordinate.x,
            coordinate.y,
            coordinate.z,
            radius
        );
        self.task_manager.publish_task(Box::new(BuildWorldTask::new(
            coordinate,
            radius,
            cancellation.clone(),
        )));
        cancellation
    }

    /// Keeps one draw pass in flight, and publishes a removal pass when chunks wait
    /// for eviction and none is running.
    pub fn schedule_streaming_passes(&mut self) {
        if !self.world.draw_pass_running {
            self.world.draw_pass_running = true;
            self.task_manager.publish_task(Box::new(DrawChunksTask::new(
                self.config.eviction_distance(),
            )));
        }
        if !self.world.removal_pass_running && self.world.removal_queue_len() > 0 {
            self.world.removal_pass_running = true;
            self.task_manager
                .publish_task(Box::new(RemoveChunksTask::new()));
        }
    }

    /// Advances the scheduler by one tick.
    pub fn process_tasks(&mut self, elapsed: Duration) -> usize {
        self.task_manager
            .process_tasks(&mut self.world, &mut self.store, &mut self.renderer, elapsed)
    }

    /// Ticks the scheduler until no task is left, jumping the clock over sleeps.
    /// Streaming passes are not re-published meanwhile.
    ///
    /// # Returns
    ///
    /// The number of ticks taken, or `None` if work remained after `max_ticks`.
    pub fn run_until_idle(&mut self, max_ticks: usize) -> Option<usize> {
        self.task_manager
            .run_until_idle(&mut self.world, &mut self.store, &mut self.renderer, max_ticks)
    }

    /// Pours `liquid` into the air cell at `position`.
    ///
    /// # Arguments
    ///
    /// * `strength` - Lateral reach of the liquid
    /// * `budget` - Maximum number of propagations along any path
    pub fn start_flow(&mut self, position: Point3<i32>, liquid: BlockType, strength: i32, budget: i32) {
        log::debug!("Starting {:?} flow at {:?}", liquid, position);
        self.task_manager.publish_task(Box::new(FlowTask::new(
            position,
            liquid,
            strength,
            budget,
            self.config.flow_step_delay(),
        )));
    }

    /// Drops `falling_type` from the cell at `position` until it rests on a solid block.
    pub fn start_fall(&mut self, position: Point3<i32>, falling_type: BlockType) {
        log::debug!("Starting {:?} fall at {:?}", falling_type, position);
        self.task_manager.publish_task(Box::new(FallTask::new(
            position,
            falling_type,
            self.config.fall_step_delay(),
        )));
    }

    /// Persists every changed chunk. A failed save is reported and the chunk stays
    /// marked as changed; the remaining chunks are still saved.
    pub fn save_changed_chunks(&mut self) -> AutosaveReport {
        let mut report = AutosaveReport::default();
        for chunk in self.world.chunks_mut().filter(|chunk| chunk.is_changed()) {
            match self.store.save(&chunk.snapshot()) {
                Ok(()) => {
                    chunk.mark_saved();
                    report.saved.push(chunk.key().to_string());
                }
                Err(error) => {
                    log::error!("Failed to save chunk {}: {}", chunk.key(), error);
                    report.failed.push((chunk.key().to_string(), error));
                }
            }
        }
        log::info!(
            "Saved {} changed chunks ({} failed)",
            report.saved.len(),
            report.failed.len()
        );
        report
    }

    /// Cancels the running build and saves every changed chunk.
    pub fn shutdown(&mut self) -> AutosaveReport {
        log::info!("Shutting down with {} chunks loaded", self.world.len());
        self.build_cancellation.cancel();
        self.save_changed_chunks()
    }

    /// The chunk containing the observer.
    pub fn observer_chunk(&self) -> ChunkCoordinate {
        chunk_key::chunk_coordinate_of_world(self.observer_position, self.config.edge())
    }

    fn retention_radius(&self) -> i32 {
        i32::try_from(self.config.retention_radius).unwrap_or(i32::MAX)
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn observer_position(&self) -> Point3<f32> {
        self.observer_position
    }

    pub fn last_build_position(&self) -> Point3<f32> {
        self.last_build_position
    }

    /// The token of the build issued last.
    pub fn build_cancellation(&self) -> &CancellationToken {
        &self.build_cancellation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::{
        persistence::MemoryChunkStore, rendering::RecordingRenderer, voxels::terrain::FlatTerrain,
    };

    const FRAME: Duration = Duration::from_millis(16);

    fn engine_state(observer: Point3<f32>) -> EngineState<MemoryChunkStore, RecordingRenderer> {
        let config = WorldConfig {
            chunk_edge: 4,
            retention_radius: 2,
            autosave_interval_seconds: 1.0,
            ..WorldConfig::default()
        };
        EngineState::new(
            config,
            Box::new(FlatTerrain::new(2, BlockType::STONE)),
            MemoryChunkStore::new(),
            RecordingRenderer::new(),
            observer,
        )
        .unwrap()
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = WorldConfig {
            chunk_edge: 0,
            ..WorldConfig::default()
        };
        let result = EngineState::new(
            config,
            Box::new(FlatTerrain::empty()),
            MemoryChunkStore::new(),
            RecordingRenderer::new(),
            Point3::new(0.0, 0.0, 0.0),
        );
        assert!(matches!(result, Err(ConfigError::Invalid { field: "chunk_edge", .. })));
    }

    #[test]
    fn observer_chunk_is_built_immediately() {
        let state = engine_state(Point3::new(-1.0, 5.0, 2.0));
        assert_eq!(state.observer_chunk(), Point3::new(-1, 1, 0));
        assert!(state.world.contains_chunk(Point3::new(-1, 1, 0)));
        assert_eq!(state.world.len(), 1);
    }

    #[test]
    fn small_moves_do_not_rebuild() {
        let mut state = engine_state(Point3::new(2.0, 6.0, 2.0));
        assert!(!state.process_observer(Point3::new(5.0, 6.0, 2.0)));
        assert_eq!(state.last_build_position(), Point3::new(2.0, 6.0, 2.0));
        assert!(state.process_observer(Point3::new(6.5, 6.0, 2.0)));
        assert_eq!(state.last_build_position(), Point3::new(6.5, 6.0, 2.0));
    }

    #[test]
    fn moving_cancels_the_previous_build() {
        let mut state = engine_state(Point3::new(2.0, 6.0, 2.0));
        let first = state.build_cancellation().clone();
        state.process_observer(Point3::new(20.0, 6.0, 2.0));
        assert!(first.is_cancelled());
        assert!(!state.build_cancellation().is_cancelled());
    }

    #[test]
    fn draw_pass_is_never_published_twice() {
        let mut state = engine_state(Point3::new(2.0, 6.0, 2.0));
        state.schedule_streaming_passes();
        let pending = state.task_manager.active_count() + state.task_manager.queued_count();
        state.schedule_streaming_passes();
        assert_eq!(
            state.task_manager.active_count() + state.task_manager.queued_count(),
            pending
        );
    }

    #[test]
    fn autosave_runs_on_its_interval() {
        let mut state = engine_state(Point3::new(2.0, 6.0, 2.0));
        state.world.modify_block(Point3::new(1, 5, 1), |block| block.set_type(BlockType::PLANKS));

        for _ in 0..10 {
            state.update(Point3::new(2.0, 6.0, 2.0), FRAME);
        }
        assert_eq!(state.store().total_saves(), 0);

        state.update(Point3::new(2.0, 6.0, 2.0), Duration::from_secs(1));
        assert_eq!(state.store().save_count("0_4_0"), 1);
        assert!(!state.world.chunk(Point3::new(0, 1, 0)).unwrap().is_changed());
    }

    #[test]
    fn shutdown_saves_only_changed_chunks() {
        let mut state = engine_state(Point3::new(2.0, 6.0, 2.0));
        for _ in 0..20 {
            state.update(Point3::new(2.0, 6.0, 2.0), FRAME);
        }
        state.world.modify_block(Point3::new(1, 1, 1), |block| block.set_type(BlockType::AIR));

        let report = state.shutdown();
        assert_eq!(report.saved, vec!["0_0_0".to_string()]);
        assert!(report.is_complete());
        assert_eq!(state.store().total_saves(), 1);
        assert!(state.build_cancellation().is_cancelled());
    }
}
