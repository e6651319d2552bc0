use std::{collections::HashSet, io, path::PathBuf, time::Duration};

use cgmath::Point3;
use voxel_streaming::core::{PersistenceError, WorldConfig};
use voxel_streaming::engine_state::{
    persistence::{ChunkSnapshot, ChunkStore, MemoryChunkStore},
    rendering::RecordingRenderer,
    voxels::{block::block_type::BlockType, terrain::FlatTerrain},
    EngineState,
};

const FRAME: Duration = Duration::from_millis(16);

/// A memory store that rejects saves for selected keys.
#[derive(Default)]
struct FlakyStore {
    inner: MemoryChunkStore,
    rejected: HashSet<String>,
}

impl ChunkStore for FlakyStore {
    fn save(&mut self, snapshot: &ChunkSnapshot) -> Result<(), PersistenceError> {
        if self.rejected.contains(&snapshot.key) {
            return Err(PersistenceError::Io {
                path: PathBuf::from(format!("{}.json", snapshot.key)),
                source: io::Error::new(io::ErrorKind::Other, "disk full"),
            });
        }
        self.inner.save(snapshot)
    }

    fn load(&mut self, key: &str) -> Result<Option<ChunkSnapshot>, PersistenceError> {
        self.inner.load(key)
    }
}

fn config() -> WorldConfig {
    WorldConfig {
        chunk_edge: 4,
        retention_radius: 2,
        autosave_interval_seconds: 600.0,
        ..WorldConfig::default()
    }
}

fn engine_state<S: ChunkStore>(store: S, observer: Point3<f32>) -> EngineState<S, RecordingRenderer> {
    EngineState::new(
        config(),
        Box::new(FlatTerrain::new(2, BlockType::STONE)),
        store,
        RecordingRenderer::new(),
        observer,
    )
    .unwrap()
}

fn run_frames<S: ChunkStore>(state: &mut EngineState<S, RecordingRenderer>, observer: Point3<f32>, frames: usize) {
    for _ in 0..frames {
        state.update(observer, FRAME);
    }
}

const HOME: Point3<f32> = Point3 { x: 2.0, y: 6.0, z: 2.0 };
const AWAY: Point3<f32> = Point3 { x: 60.0, y: 6.0, z: 2.0 };

/// Chunks within Manhattan distance 1 of chunk (0, 1, 0), by key.
const HOME_KEYS: [&str; 7] = ["0_4_0", "0_0_0", "0_8_0", "-4_4_0", "4_4_0", "0_4_-4", "0_4_4"];

#[test]
fn observer_neighborhood_is_built_and_drawn() {
    let mut state = engine_state(MemoryChunkStore::new(), HOME);
    run_frames(&mut state, HOME, 50);

    assert_eq!(state.world.len(), 7);
    for key in HOME_KEYS {
        assert!(state.world.chunk_by_key(key).is_some(), "missing chunk {key}");
        assert_eq!(state.renderer().record(key).map(|record| record.draws), Some(1));
    }
    assert_eq!(state.store().total_saves(), 0);
}

#[test]
fn building_the_same_area_twice_keeps_one_chunk_per_coordinate() {
    let mut state = engine_state(MemoryChunkStore::new(), HOME);
    state.build_world_recursively(Point3::new(0, 1, 0), 3);
    state.build_world_recursively(Point3::new(0, 1, 0), 3);
    state.run_until_idle(10_000).unwrap();

    let mut keys = state.world.chunk_keys();
    let loaded = keys.len();
    keys.sort();
    keys.dedup();
    assert_eq!(keys.len(), loaded);
    // Radius 3 reaches Manhattan distance 2; only (0, -1, 0) is below the world.
    assert_eq!(loaded, 24);
}

#[test]
fn distant_chunks_are_persisted_once_and_removed() {
    let mut state = engine_state(MemoryChunkStore::new(), HOME);
    run_frames(&mut state, HOME, 50);

    run_frames(&mut state, AWAY, 200);

    for key in HOME_KEYS {
        assert!(state.world.chunk_by_key(key).is_none(), "chunk {key} still loaded");
        assert_eq!(state.store().save_count(key), 1, "chunk {key}");
        assert!(state.renderer().released().iter().any(|released| released == key));
    }
    assert_eq!(state.store().total_saves(), 7);
    assert_eq!(state.world.len(), 7);
    assert!(state.world.contains_chunk(Point3::new(15, 1, 0)));

    run_frames(&mut state, AWAY, 100);
    assert_eq!(state.store().total_saves(), 7);
}

#[test]
fn returning_reloads_persisted_changes() {
    let mut state = engine_state(MemoryChunkStore::new(), HOME);
    run_frames(&mut state, HOME, 50);
    state
        .world
        .modify_block(Point3::new(1, 5, 1), |block| block.set_type(BlockType::BRICK))
        .unwrap();

    run_frames(&mut state, AWAY, 200);
    assert!(state.world.block_at(Point3::new(1, 5, 1)).is_none());

    run_frames(&mut state, HOME, 200);
    assert_eq!(
        state.world.block_at(Point3::new(1, 5, 1)).map(|block| block.block_type()),
        Some(BlockType::BRICK)
    );
}

#[test]
fn moving_away_cancels_the_build_in_flight() {
    let mut state = engine_state(MemoryChunkStore::new(), HOME);
    let first_build = state.build_cancellation().clone();

    state.update(AWAY, FRAME);
    assert!(first_build.is_cancelled());
    assert_eq!(state.last_build_position(), AWAY);

    run_frames(&mut state, AWAY, 50);
    // Only the observer's first chunk was built at home before the move.
    assert!(state.world.chunk_by_key("0_0_0").is_none());
    assert!(state.world.chunk_by_key("4_4_0").is_none());
}

#[test]
fn autosave_continues_past_failed_chunks() {
    let mut store = FlakyStore::default();
    store.rejected.insert("0_4_0".to_string());
    let mut state = engine_state(store, HOME);
    run_frames(&mut state, HOME, 50);

    for position in [Point3::new(1, 5, 1), Point3::new(1, 1, 1), Point3::new(5, 5, 1)] {
        state
            .world
            .modify_block(position, |block| block.set_type(BlockType::WOOD))
            .unwrap();
    }

    let report = state.save_changed_chunks();
    let mut saved = report.saved.clone();
    saved.sort();
    assert_eq!(saved, vec!["0_0_0".to_string(), "4_4_0".to_string()]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, "0_4_0");
    assert!(matches!(report.failed[0].1, PersistenceError::Io { .. }));
    assert!(state.world.chunk_by_key("0_4_0").unwrap().is_changed());

    state.store_mut().rejected.clear();
    let report = state.shutdown();
    assert_eq!(report.saved, vec!["0_4_0".to_string()]);
    assert_eq!(state.store().inner.save_count("0_4_0"), 1);
}

#[test]
fn failed_eviction_keeps_the_chunk_loaded() {
    let mut store = FlakyStore::default();
    store.rejected.insert("4_4_0".to_string());
    let mut state = engine_state(store, HOME);
    run_frames(&mut state, HOME, 50);

    run_frames(&mut state, AWAY, 200);
    assert!(state.world.chunk_by_key("4_4_0").is_some());
    assert!(state.world.chunk_by_key("0_4_0").is_none());
    assert_eq!(state.store().inner.save_count("4_4_0"), 0);

    state.store_mut().rejected.clear();
    run_frames(&mut state, AWAY, 200);
    assert!(state.world.chunk_by_key("4_4_0").is_none());
    assert_eq!(state.store().inner.save_count("4_4_0"), 1);
}

#[test]
fn scheduler_capacity_bounds_active_tasks() {
    let config = WorldConfig {
        scheduler_capacity: 3,
        ..config()
    };
    let mut state = EngineState::new(
        config,
        Box::new(FlatTerrain::new(2, BlockType::STONE)),
        MemoryChunkStore::new(),
        RecordingRenderer::new(),
        HOME,
    )
    .unwrap();
    state.build_world_recursively(Point3::new(0, 3, 0), 4);

    for _ in 0..300 {
        state.update(HOME, FRAME);
        assert!(state.task_manager.active_count() <= 3);
    }
    assert_eq!(state.task_manager.peak_active(), 3);
}
