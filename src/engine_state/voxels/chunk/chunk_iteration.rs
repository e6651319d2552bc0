//! # Chunk Iteration Module
//!
//! An iterator over the visible (non-air) blocks of a chunk, grouped by the visual
//! container they are drawn under. The rendering collaborator walks chunks with it.

use crate::engine_state::voxels::block::{block_type::BlockType, Block, ContainerKind};

use super::Chunk;

/// Iterates the non-air blocks of one visual container of a chunk.
pub struct ChunkBlockIterator<'a> {
    /// Reference to the chunk being iterated over
    chunk_ref: &'a Chunk,
    container: ContainerKind,
    /// Current index into the chunk's block storage
    current_block_offset: usize,
}

impl<'a> ChunkBlockIterator<'a> {
    /// Creates an iterator over the non-air blocks drawn under `container`.
    pub fn new(chunk_ref: &'a Chunk, container: ContainerKind) -> Self {
        ChunkBlockIterator {
            chunk_ref,
            container,
            current_block_offset: 0,
        }
    }
}

impl<'a> Iterator for ChunkBlockIterator<'a> {
    type Item = &'a Block;

    fn next(&mut self) -> Option<Self::Item> {
        let blocks = &self.chunk_ref.blocks;
        while self.current_block_offset < blocks.len() {
            let block = &blocks[self.current_block_offset];
            self.current_block_offset += 1;
            if block.block_type() != BlockType::AIR && block.container() == self.container {
                return Some(block);
            }
        }
        None
    }
}
