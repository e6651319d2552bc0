//! Rendering collaborator for the streaming world.
//!
//! Mesh generation and materials live outside this crate. What the world needs from a
//! renderer is narrow: it hands over chunks in the `Draw` state and reads back whether
//! the work is complete, and it tells the renderer when a chunk's visuals go away.

use std::collections::HashMap;

use super::voxels::{
    block::ContainerKind,
    chunk::{chunk_iteration::ChunkBlockIterator, Chunk},
};

/// Consumes chunk state transitions and block data.
pub trait ChunkRenderer {
    /// Draws (or rebuilds the mesh of) a chunk in the `Draw` state.
    ///
    /// # Returns
    /// `true` once the chunk's pending work is complete and it may move to `Keep`.
    fn draw(&mut self, chunk: &Chunk) -> bool;

    /// Releases everything held for the chunk with `key`; its visuals were destroyed.
    fn release(&mut self, key: &str);
}

/// Per-chunk statistics of the last draw.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DrawRecord {
    pub draws: usize,
    pub solid_blocks: usize,
    pub fluid_blocks: usize,
}

/// A renderer that records what it was asked to draw instead of building meshes.
#[derive(Default)]
pub struct RecordingRenderer {
    records: HashMap<String, DrawRecord>,
    released: Vec<String>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, key: &str) -> Option<DrawRecord> {
        self.records.get(key).copied()
    }

    /// Total number of draw calls across all chunks.
    pub fn total_draws(&self) -> usize {
        self.records.values().map(|record| record.draws).sum()
    }

    /// Keys of chunks released so far, in release order.
    pub fn released(&self) -> &[String] {
        &self.released
    }
}

impl ChunkRenderer for RecordingRenderer {
    fn draw(&mut self, chunk: &Chunk) -> bool {
        let record = self.records.entry(chunk.key().to_string()).or_default();
        record.draws += 1;
        record.solid_blocks = ChunkBlockIterator::new(chunk, ContainerKind::Solid).count();
        record.fluid_blocks = ChunkBlockIterator::new(chunk, ContainerKind::Fluid).count();
        log::trace!(
            "Drew chunk {} ({} solid, {} fluid)",
            chunk.key(),
            record.solid_blocks,
            record.fluid_blocks
        );
        true
    }

    fn release(&mut self, key: &str) {
        self.records.remove(key);
        self.released.push(key.to_string());
    }
}
