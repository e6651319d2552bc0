//! # Chunk Creation Module
//!
//! A builder that fills a chunk's dense block array one block at a time, in storage
//! order (x fastest, then y, then z). Both terrain generation and snapshot loading
//! push their block types through it so the two paths always agree on layout.

use cgmath::Point3;

use crate::engine_state::voxels::block::{block_type::BlockType, Block};

use super::{Chunk, ChunkCoordinate};

/// Builds a `Chunk` by pushing block types in storage order.
pub struct ChunkCreationIterator {
    /// The coordinate of the chunk being created
    coordinate: ChunkCoordinate,
    /// Edge length of the chunk
    edge: i32,
    blocks: Vec<Block>,
    /// Current position within the chunk
    local_x: i32,
    local_y: i32,
    local_z: i32,
}

impl ChunkCreationIterator {
    /// Creates a new builder for a chunk at the given coordinate.
    pub fn new(coordinate: ChunkCoordinate, edge: i32) -> Self {
        let volume = (edge * edge * edge) as usize;
        ChunkCreationIterator {
            coordinate,
            edge,
            blocks: Vec::with_capacity(volume),
            local_x: 0,
            local_y: 0,
            local_z: 0,
        }
    }

    /// The local position the next pushed block will occupy.
    pub fn next_local_position(&self) -> Point3<i32> {
        Point3::new(self.local_x, self.local_y, self.local_z)
    }

    /// The world position the next pushed block will occupy.
    pub fn next_global_position(&self) -> Point3<i32> {
        Point3::new(
            self.coordinate.x * self.edge + self.local_x,
            self.coordinate.y * self.edge + self.local_y,
            self.coordinate.z * self.edge + self.local_z,
        )
    }

    /// Returns `true` once every cell of the chunk has been pushed.
    pub fn is_complete(&self) -> bool {
        self.blocks.len() == (self.edge * self.edge * self.edge) as usize
    }

    /// Adds a block at the current position and advances the position.
    pub fn push_block_type(&mut self, block_type: BlockType) {
        debug_assert!(!self.is_complete(), "chunk {:?} is already full", self.coordinate);
        self.blocks.push(Block::new(
            block_type,
            self.coordinate,
            self.next_local_position(),
            self.edge,
        ));

        self.local_x += 1;
        if self.local_x == self.edge {
            self.local_x = 0;
            self.local_y += 1;
            if self.local_y == self.edge {
                self.local_y = 0;
                self.local_z += 1;
            }
        }
    }

    /// Finalizes the chunk. Cells never pushed are filled with air.
    pub fn return_chunk(mut self) -> Chunk {
        while !self.is_complete() {
            self.push_block_type(BlockType::AIR);
        }
        Chunk::from_blocks(self.coordinate, self.edge, self.blocks)
    }
}
