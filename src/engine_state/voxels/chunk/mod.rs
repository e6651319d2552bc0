//! # Chunk Module
//!
//! This module provides the `Chunk` struct: a fixed-size cubic array of blocks plus
//! the chunk-level state the streaming controller and the renderer care about.
//!
//! ## Lifecycle
//!
//! A chunk is created `Idle`, switches to `Draw` whenever mesh work is pending (it was
//! just built, or a block changed), and settles in `Keep` once the renderer reports
//! the draw as complete. Eviction destroys its visual containers, persists it and
//! removes it from the `World`.
//!
//! ## Storage
//!
//! Blocks are stored densely, `chunk_edge³` of them, indexed by
//! `x + edge * (y + edge * z)`.

use std::sync::Arc;

use cgmath::Point3;
use chunk_creation::ChunkCreationIterator;

use super::block::{block_type::BlockType, Block, ContainerKind};
use super::terrain::TerrainGenerator;
use crate::core::PersistenceError;
use crate::engine_state::persistence::ChunkSnapshot;

pub mod chunk_creation;
pub mod chunk_iteration;
pub mod chunk_key;

/// A chunk's position in chunk-grid units (not world units).
pub type ChunkCoordinate = Point3<i32>;

/// Pending-work state of a chunk, consumed by the rendering collaborator.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ChunkState {
    /// Freshly created, no pending work.
    Idle,
    /// Loaded and stable.
    Keep,
    /// Mesh or visual work pending.
    Draw,
}

/// One of the two opaque visual containers a chunk owns.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VisualContainer {
    pub kind: ContainerKind,
    /// Key of the chunk this container belongs to, used as its name under the world root.
    pub name: String,
}

/// The solid and fluid geometry containers of a chunk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChunkVisuals {
    pub solid: VisualContainer,
    pub fluid: VisualContainer,
}

impl ChunkVisuals {
    fn for_chunk(key: &str) -> Self {
        ChunkVisuals {
            solid: VisualContainer {
                kind: ContainerKind::Solid,
                name: key.to_string(),
            },
            fluid: VisualContainer {
                kind: ContainerKind::Fluid,
                name: format!("{}_fluid", key),
            },
        }
    }
}

/// A handle held by a task that is working inside a chunk.
///
/// While any lease is alive the removal pass leaves the chunk loaded. Leases are
/// dropped with the task that holds them, so a cancelled task releases its chunk.
#[derive(Clone, Debug)]
pub struct ChunkLease {
    coordinate: ChunkCoordinate,
    _token: Arc<()>,
}

impl ChunkLease {
    pub fn coordinate(&self) -> ChunkCoordinate {
        self.coordinate
    }
}

/// Represents an `edge³` collection of voxel blocks in the world.
pub struct Chunk {
    coordinate: ChunkCoordinate,
    edge: i32,
    key: String,
    blocks: Vec<Block>,
    /// Pending-work state, see `ChunkState`.
    pub state: ChunkState,
    changed: bool,
    visuals: Option<ChunkVisuals>,
    lease_token: Arc<()>,
}

impl Chunk {
    pub(crate) fn from_blocks(coordinate: ChunkCoordinate, edge: i32, blocks: Vec<Block>) -> Self {
        debug_assert_eq!(blocks.len(), (edge * edge * edge) as usize);
        Chunk {
            coordinate,
            edge,
            key: chunk_key::chunk_key(coordinate, edge),
            blocks,
            state: ChunkState::Idle,
            changed: false,
            visuals: None,
            lease_token: Arc::new(()),
        }
    }

    /// Creates a new chunk filled with air.
    pub fn empty(coordinate: ChunkCoordinate, edge: i32) -> Self {
        ChunkCreationIterator::new(coordinate, edge).return_chunk()
    }

    /// Generates a chunk by sampling the terrain collaborator at every cell.
    pub fn generate(coordinate: ChunkCoordinate, edge: i32, terrain: &dyn TerrainGenerator) -> Self {
        let mut cci = ChunkCreationIterator::new(coordinate, edge);
        while !cci.is_complete() {
            let block_type = terrain.block_type_at(cci.next_global_position());
            cci.push_block_type(block_type);
        }
        cci.return_chunk()
    }

    /// Rebuilds a chunk from a persisted snapshot.
    ///
    /// # Errors
    /// `PersistenceError::Corrupted` if the snapshot was written for another chunk edge
    /// or contains an unknown block type.
    pub fn from_snapshot(
        coordinate: ChunkCoordinate,
        edge: i32,
        snapshot: &ChunkSnapshot,
    ) -> Result<Self, PersistenceError> {
        let volume = (edge * edge * edge) as usize;
        if snapshot.edge as i32 != edge || snapshot.blocks.len() != volume {
            return Err(PersistenceError::Corrupted {
                key: snapshot.key.clone(),
                reason: format!(
                    "expected {} blocks of edge {}, found {} blocks of edge {}",
                    volume,
                    edge,
                    snapshot.blocks.len(),
                    snapshot.edge
                ),
            });
        }

        let mut cci = ChunkCreationIterator::new(coordinate, edge);
        for &raw in &snapshot.blocks {
            let block_type = BlockType::from_int(raw).ok_or_else(|| PersistenceError::Corrupted {
                key: snapshot.key.clone(),
                reason: format!("unknown block type {}", raw),
            })?;
            cci.push_block_type(block_type);
        }
        Ok(cci.return_chunk())
    }

    /// Captures the block types of this chunk for persistence.
    pub fn snapshot(&self) -> ChunkSnapshot {
        ChunkSnapshot {
            key: self.key.clone(),
            edge: self.edge as u32,
            blocks: self.blocks.iter().map(|block| block.block_type().as_int()).collect(),
        }
    }

    pub fn coordinate(&self) -> ChunkCoordinate {
        self.coordinate
    }

    pub fn edge(&self) -> i32 {
        self.edge
    }

    /// The registry and persistence key of this chunk.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The world-unit position of the chunk's (0, 0, 0) corner.
    pub fn origin(&self) -> Point3<i32> {
        chunk_key::chunk_origin(self.coordinate, self.edge)
    }

    fn local_index(&self, local: Point3<i32>) -> Option<usize> {
        let range = 0..self.edge;
        if !(range.contains(&local.x) && range.contains(&local.y) && range.contains(&local.z)) {
            return None;
        }
        Some((local.x + self.edge * (local.y + self.edge * local.z)) as usize)
    }

    /// Gets the block at a local position, or `None` outside `[0, edge)`.
    pub fn block(&self, local: Point3<i32>) -> Option<&Block> {
        self.local_index(local).map(|index| &self.blocks[index])
    }

    /// Gets the block at a local position for mutation and marks the chunk as changed.
    pub fn block_mut(&mut self, local: Point3<i32>) -> Option<&mut Block> {
        let index = self.local_index(local)?;
        self.changed = true;
        Some(&mut self.blocks[index])
    }

    /// Every block of the chunk in storage order.
    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.blocks.iter()
    }

    /// Flags pending visual work.
    pub fn request_redraw(&mut self) {
        self.state = ChunkState::Draw;
    }

    /// Called once the renderer reports that pending work is done.
    pub fn mark_drawn(&mut self) {
        if self.state == ChunkState::Draw {
            self.state = ChunkState::Keep;
        }
    }

    pub fn is_changed(&self) -> bool {
        self.changed
    }

    /// Clears the dirty flag after a successful save.
    pub fn mark_saved(&mut self) {
        self.changed = false;
    }

    /// Creates the chunk's two visual containers under the world root.
    pub fn attach_visuals(&mut self) {
        if self.visuals.is_none() {
            self.visuals = Some(ChunkVisuals::for_chunk(&self.key));
        }
    }

    /// Destroys both visual containers.
    pub fn destroy_visuals(&mut self) -> Option<ChunkVisuals> {
        self.visuals.take()
    }

    pub fn visuals(&self) -> Option<&ChunkVisuals> {
        self.visuals.as_ref()
    }

    pub fn has_visuals(&self) -> bool {
        self.visuals.is_some()
    }

    /// Takes a lease that keeps this chunk from being evicted while it is held.
    pub fn lease(&self) -> ChunkLease {
        ChunkLease {
            coordinate: self.coordinate,
            _token: Arc::clone(&self.lease_token),
        }
    }

    /// Returns `true` while any task holds a lease on this chunk.
    pub fn is_leased(&self) -> bool {
        Arc::strong_count(&self.lease_token) > 1
    }
}
