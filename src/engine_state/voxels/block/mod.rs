//! # Block Module
//!
//! This module provides the core block-related functionality for the voxel engine.
//! It includes block type definitions, neighbor directions, and the block cell itself.

use block_type::{BlockOpacity, BlockType};
use cgmath::Point3;

use super::chunk::ChunkCoordinate;

pub mod block_side;
pub mod block_type;

/// The underlying integer type used to represent block types in memory.
/// This is used for efficient storage and serialization of block data.
pub type BlockTypeSize = u8;

/// Which of its chunk's two visual containers a block is drawn under.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    /// The chunk's solid geometry.
    Solid,
    /// The chunk's fluid geometry.
    Fluid,
}

/// Represents a single voxel cell in the world.
///
/// A block never exists outside of its chunk's dense block array and is mutated in
/// place for its whole lifetime. The `owner` field is a lookup handle (the chunk
/// coordinate), not a reference: resolving it goes through the `World` registry, so
/// a chunk can be evicted while a task still remembers one of its blocks.
#[derive(Clone, Debug, PartialEq)]
pub struct Block {
    /// Coordinate of the owning chunk, in chunk-grid units.
    pub owner: ChunkCoordinate,
    /// Position inside the owning chunk, each axis in `[0, chunk_edge)`.
    pub local_position: Point3<i32>,
    /// Position in world block units.
    pub global_position: Point3<i32>,
    block_type: BlockType,
    container: ContainerKind,
    /// Remaining spread strength of a liquid cell; only meaningful while a flow is active.
    pub health: i32,
    /// Marks a block that collapses when a fall below it resolves.
    pub is_falling: bool,
}

impl Block {
    /// Creates a new block of the specified type at a local position of its chunk.
    ///
    /// # Arguments
    /// * `block_type` - The type of block to create
    /// * `owner` - The coordinate of the chunk that owns the block
    /// * `local_position` - Position inside the chunk
    /// * `chunk_edge` - Edge length of the chunk, used to derive the world position
    pub fn new(
        block_type: BlockType,
        owner: ChunkCoordinate,
        local_position: Point3<i32>,
        chunk_edge: i32,
    ) -> Self {
        let global_position = Point3::new(
            owner.x * chunk_edge + local_position.x,
            owner.y * chunk_edge + local_position.y,
            owner.z * chunk_edge + local_position.z,
        );
        Block {
            owner,
            local_position,
            global_position,
            block_type,
            container: Self::default_container(block_type),
            health: 0,
            is_falling: block_type.is_affected_by_gravity(),
        }
    }

    fn default_container(block_type: BlockType) -> ContainerKind {
        if block_type.is_liquid() {
            ContainerKind::Fluid
        } else {
            ContainerKind::Solid
        }
    }

    pub fn block_type(&self) -> BlockType {
        self.block_type
    }

    pub fn opacity(&self) -> BlockOpacity {
        self.block_type.opacity()
    }

    pub fn container(&self) -> ContainerKind {
        self.container
    }

    /// Changes the type of this block; the falling marker follows the new type.
    pub fn set_type(&mut self, block_type: BlockType) {
        self.block_type = block_type;
        self.is_falling = block_type.is_affected_by_gravity();
    }

    /// Moves this block under one of its chunk's visual containers.
    pub fn set_container(&mut self, container: ContainerKind) {
        self.container = container;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_position_follows_owner() {
        let block = Block::new(
            BlockType::STONE,
            Point3::new(-1, 2, 0),
            Point3::new(3, 0, 15),
            16,
        );
        assert_eq!(block.global_position, Point3::new(-13, 32, 15));
    }

    #[test]
    fn set_type_updates_falling_marker() {
        let mut block = Block::new(BlockType::AIR, Point3::new(0, 0, 0), Point3::new(0, 0, 0), 16);
        assert!(!block.is_falling);
        block.set_type(BlockType::SAND);
        assert!(block.is_falling);
        block.set_type(BlockType::AIR);
        assert!(!block.is_falling);
    }

    #[test]
    fn liquids_start_in_fluid_container() {
        let block = Block::new(BlockType::WATER, Point3::new(0, 0, 0), Point3::new(1, 1, 1), 4);
        assert_eq!(block.container(), ContainerKind::Fluid);
        assert_eq!(block.opacity(), BlockOpacity::Liquid);
    }
}
