//! # World Module
//!
//! This module provides the `World` struct which owns every loaded chunk. It serves as
//! the registry all tasks mutate: chunk building, block lookup across chunk borders,
//! and the queue of chunks waiting to be evicted.
//!
//! ## Architecture
//!
//! Chunks are keyed by their string key (`"{x}_{y}_{z}"` of the world-unit origin).
//! Only chunks around the observer are kept in memory; the rest live in the
//! `ChunkStore` and are loaded back when the streaming controller rebuilds them.
//!
//! ## Concurrency
//!
//! The world is owned by one `EngineState` and lent to one task step at a time, so
//! the check-then-insert in `build_chunk_at` can never race with another build.

use std::collections::{hash_map::Entry, HashMap, VecDeque};

use cgmath::Point3;

use super::{
    block::Block,
    chunk::{chunk_key, Chunk, ChunkCoordinate, ChunkLease},
    terrain::TerrainGenerator,
};
use crate::core::WorldConfig;
use crate::engine_state::persistence::ChunkStore;

/// The registry of all loaded chunks.
pub struct World {
    chunks: HashMap<String, Chunk>,
    edge: i32,
    vertical_limit: i32,
    terrain: Box<dyn TerrainGenerator>,
    removal_queue: VecDeque<String>,
    /// Observer position as of the latest controller tick
    observer: Point3<f32>,
    /// Set while a draw/scan pass is in flight on the task manager.
    pub(crate) draw_pass_running: bool,
    /// Set while a removal pass is in flight on the task manager.
    pub(crate) removal_pass_running: bool,
}

impl World {
    /// Creates a new, empty world.
    ///
    /// # Arguments
    /// * `config` - Supplies the chunk edge and the vertical chunk limit
    /// * `terrain` - Generates chunks that have no persisted snapshot
    pub fn new(config: &WorldConfig, terrain: Box<dyn TerrainGenerator>) -> Self {
        World {
            chunks: HashMap::new(),
            edge: config.edge(),
            vertical_limit: config.vertical_limit,
            terrain,
            removal_queue: VecDeque::new(),
            observer: Point3::new(0.0, 0.0, 0.0),
            draw_pass_running: false,
            removal_pass_running: false,
        }
    }

    pub fn edge(&self) -> i32 {
        self.edge
    }

    pub fn vertical_limit(&self) -> i32 {
        self.vertical_limit
    }

    pub fn observer(&self) -> Point3<f32> {
        self.observer
    }

    pub fn set_observer(&mut self, observer: Point3<f32>) {
        self.observer = observer;
    }

    /// Builds the chunk at `coordinate` if it is not loaded yet.
    ///
    /// A chunk with a persisted snapshot is loaded from `store`; otherwise it is
    /// generated from the terrain. The new chunk gets its two visual containers and is
    /// flagged for drawing.
    ///
    /// # Returns
    /// `true` if a chunk was created, `false` if one already existed.
    pub fn build_chunk_at(&mut self, coordinate: ChunkCoordinate, store: &mut dyn ChunkStore) -> bool {
        let key = chunk_key::chunk_key(coordinate, self.edge);
        let entry = match self.chunks.entry(key) {
            Entry::Occupied(_) => return false,
            Entry::Vacant(entry) => entry,
        };

        let loaded = match store.load(entry.key()) {
            Ok(Some(snapshot)) => match Chunk::from_snapshot(coordinate, self.edge, &snapshot) {
                Ok(chunk) => Some(chunk),
                Err(error) => {
                    log::warn!("Discarding snapshot of chunk {}: {}", entry.key(), error);
                    None
                }
            },
            Ok(None) => None,
            Err(error) => {
                log::warn!("Could not load chunk {}: {}", entry.key(), error);
                None
            }
        };
        let from_store = loaded.is_some();
        let mut chunk =
            loaded.unwrap_or_else(|| Chunk::generate(coordinate, self.edge, self.terrain.as_ref()));

        chunk.attach_visuals();
        chunk.request_redraw();
        log::debug!(
            "Built chunk {} ({})",
            entry.key(),
            if from_store { "loaded" } else { "generated" }
        );
        entry.insert(chunk);
        true
    }

    /// Number of loaded chunks.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn contains_chunk(&self, coordinate: ChunkCoordinate) -> bool {
        self.chunks.contains_key(&chunk_key::chunk_key(coordinate, self.edge))
    }

    pub fn chunk(&self, coordinate: ChunkCoordinate) -> Option<&Chunk> {
        self.chunks.get(&chunk_key::chunk_key(coordinate, self.edge))
    }

    pub fn chunk_mut(&mut self, coordinate: ChunkCoordinate) -> Option<&mut Chunk> {
        self.chunks.get_mut(&chunk_key::chunk_key(coordinate, self.edge))
    }

    pub fn chunk_by_key(&self, key: &str) -> Option<&Chunk> {
        self.chunks.get(key)
    }

    pub fn chunk_by_key_mut(&mut self, key: &str) -> Option<&mut Chunk> {
        self.chunks.get_mut(key)
    }

    /// A snapshot of the keys of all loaded chunks, in no particular order.
    pub fn chunk_keys(&self) -> Vec<String> {
        self.chunks.keys().cloned().collect()
    }

    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.chunks.values()
    }

    pub fn chunks_mut(&mut self) -> impl Iterator<Item = &mut Chunk> {
        self.chunks.values_mut()
    }

    /// Resolves a world block position to its chunk coordinate and local position.
    pub fn locate(&self, position: Point3<i32>) -> (ChunkCoordinate, Point3<i32>) {
        let coordinate = chunk_key::chunk_coordinate_of(position, self.edge);
        let local = chunk_key::local_position_of(position, self.edge);
        debug_assert!(
            (0..self.edge).contains(&local.x)
                && (0..self.edge).contains(&local.y)
                && (0..self.edge).contains(&local.z),
            "local position {:?} out of range for edge {}",
            local,
            self.edge
        );
        (coordinate, local)
    }

    /// Gets the block at a world block position.
    ///
    /// # Returns
    /// `None` if the chunk containing `position` is not loaded.
    pub fn block_at(&self, position: Point3<i32>) -> Option<&Block> {
        let (coordinate, local) = self.locate(position);
        self.chunk(coordinate)?.block(local)
    }

    /// Gets the block containing a continuous world position.
    pub fn block_at_world(&self, position: Point3<f32>) -> Option<&Block> {
        self.block_at(chunk_key::block_position_of(position))
    }

    /// Applies `modify` to the block at `position` and marks its chunk as changed.
    ///
    /// # Returns
    /// `None` (and `modify` is not called) if the chunk is not loaded.
    pub fn modify_block<R>(&mut self, position: Point3<i32>, modify: impl FnOnce(&mut Block) -> R) -> Option<R> {
        let (coordinate, local) = self.locate(position);
        let block = self.chunk_mut(coordinate)?.block_mut(local)?;
        Some(modify(block))
    }

    /// Flags the chunk containing `position` for redrawing.
    pub fn request_redraw_at(&mut self, position: Point3<i32>) {
        let (coordinate, _) = self.locate(position);
        if let Some(chunk) = self.chunk_mut(coordinate) {
            chunk.request_redraw();
        }
    }

    /// Takes a lease on the chunk containing `position`, if it is loaded.
    pub fn lease_at(&self, position: Point3<i32>) -> Option<ChunkLease> {
        let (coordinate, _) = self.locate(position);
        self.chunk(coordinate).map(Chunk::lease)
    }

    /// Queues a chunk for eviction.
    ///
    /// # Returns
    /// `false` if the chunk was already queued.
    pub fn queue_removal(&mut self, key: &str) -> bool {
        if self.removal_queue.iter().any(|queued| queued == key) {
            return false;
        }
        self.removal_queue.push_back(key.to_string());
        true
    }

    pub(crate) fn pop_removal(&mut self) -> Option<String> {
        self.removal_queue.pop_front()
    }

    pub fn is_queued_for_removal(&self, key: &str) -> bool {
        self.removal_queue.iter().any(|queued| queued == key)
    }

    pub fn removal_queue_len(&self) -> usize {
        self.removal_queue.len()
    }

    /// Removes a chunk from the registry without persisting it.
    pub fn remove_chunk(&mut self, key: &str) -> Option<Chunk> {
        self.chunks.remove(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::persistence::MemoryChunkStore;
    use crate::engine_state::voxels::{block::block_type::BlockType, terrain::FlatTerrain};

    const EDGE: i32 = 4;

    fn world() -> World {
        let config = WorldConfig {
            chunk_edge: EDGE as u32,
            ..WorldConfig::default()
        };
        World::new(&config, Box::new(FlatTerrain::new(0, BlockType::STONE)))
    }

    #[test]
    fn building_twice_keeps_one_chunk() {
        let mut world = world();
        let mut store = MemoryChunkStore::new();
        assert!(world.build_chunk_at(Point3::new(1, 0, -1), &mut store));
        assert!(!world.build_chunk_at(Point3::new(1, 0, -1), &mut store));
        assert_eq!(world.len(), 1);
        assert_eq!(
            world.chunks().filter(|chunk| chunk.coordinate() == Point3::new(1, 0, -1)).count(),
            1
        );
    }

    #[test]
    fn second_build_does_not_replace_mutated_chunk() {
        let mut world = world();
        let mut store = MemoryChunkStore::new();
        world.build_chunk_at(Point3::new(0, 0, 0), &mut store);
        world.modify_block(Point3::new(1, 1, 1), |block| block.set_type(BlockType::SAND));
        world.build_chunk_at(Point3::new(0, 0, 0), &mut store);
        assert_eq!(
            world.block_at(Point3::new(1, 1, 1)).map(Block::block_type),
            Some(BlockType::SAND)
        );
    }

    #[test]
    fn built_chunks_have_visuals_and_pending_draw() {
        let mut world = world();
        let mut store = MemoryChunkStore::new();
        world.build_chunk_at(Point3::new(0, 0, 0), &mut store);
        let chunk = world.chunk(Point3::new(0, 0, 0)).unwrap();
        assert!(chunk.has_visuals());
        assert_eq!(chunk.state, crate::engine_state::voxels::chunk::ChunkState::Draw);
    }

    #[test]
    fn building_prefers_persisted_snapshot() {
        let mut world = world();
        let mut store = MemoryChunkStore::new();
        let mut saved = Chunk::empty(Point3::new(2, 0, 0), EDGE);
        if let Some(block) = saved.block_mut(Point3::new(0, 0, 0)) {
            block.set_type(BlockType::BRICK);
        }
        store.save(&saved.snapshot()).unwrap();

        world.build_chunk_at(Point3::new(2, 0, 0), &mut store);
        assert_eq!(
            world.block_at(Point3::new(8, 0, 0)).map(Block::block_type),
            Some(BlockType::BRICK)
        );
        assert_eq!(
            world.block_at(Point3::new(9, 0, 0)).map(Block::block_type),
            Some(BlockType::AIR)
        );
    }

    #[test]
    fn lookup_across_zero_boundary_in_every_axis() {
        let mut world = world();
        let mut store = MemoryChunkStore::new();
        for x in -1..=0 {
            for y in -1..=0 {
                for z in -1..=0 {
                    world.build_chunk_at(Point3::new(x, y, z), &mut store);
                }
            }
        }

        for x in -EDGE..EDGE {
            for y in -EDGE..EDGE {
                for z in -EDGE..EDGE {
                    let position = Point3::new(x, y, z);
                    let block = world.block_at(position).unwrap();
                    assert_eq!(block.global_position, position);
                    let expected_owner = Point3::new(
                        if x < 0 { -1 } else { 0 },
                        if y < 0 { -1 } else { 0 },
                        if z < 0 { -1 } else { 0 },
                    );
                    assert_eq!(block.owner, expected_owner);
                }
            }
        }
    }

    #[test]
    fn continuous_lookup_floors_negative_positions() {
        let mut world = world();
        let mut store = MemoryChunkStore::new();
        world.build_chunk_at(Point3::new(-1, -1, -1), &mut store);
        let block = world.block_at_world(Point3::new(-0.5, -0.1, -3.9)).unwrap();
        assert_eq!(block.global_position, Point3::new(-1, -1, -4));
        assert_eq!(block.local_position, Point3::new(3, 3, 0));
        assert!(world.block_at_world(Point3::new(0.5, -0.1, -3.9)).is_none());
    }

    #[test]
    fn missing_chunks_are_not_errors() {
        let mut world = world();
        assert!(world.block_at(Point3::new(100, 0, 0)).is_none());
        assert!(world.modify_block(Point3::new(100, 0, 0), |_| ()).is_none());
        assert!(world.lease_at(Point3::new(100, 0, 0)).is_none());
    }

    #[test]
    fn modify_block_marks_chunk_changed() {
        let mut world = world();
        let mut store = MemoryChunkStore::new();
        world.build_chunk_at(Point3::new(0, 0, 0), &mut store);
        assert!(!world.chunk(Point3::new(0, 0, 0)).unwrap().is_changed());
        world.modify_block(Point3::new(0, 0, 0), |block| block.set_type(BlockType::AIR));
        assert!(world.chunk(Point3::new(0, 0, 0)).unwrap().is_changed());
    }

    #[test]
    fn removal_queue_deduplicates() {
        let mut world = world();
        assert!(world.queue_removal("0_0_0"));
        assert!(!world.queue_removal("0_0_0"));
        assert!(world.queue_removal("4_0_0"));
        assert_eq!(world.removal_queue_len(), 2);
        assert_eq!(world.pop_removal().as_deref(), Some("0_0_0"));
    }
}
