//! # Block Type Module
//!
//! This module defines the different types of blocks in the voxel world and the
//! opacity class each one belongs to. The opacity class is what the flow and fall
//! simulations look at when deciding whether they may pass through a cell.

use num_derive::FromPrimitive;
use serde::{Deserialize, Serialize};

use super::BlockTypeSize;

/// Enumerates all possible block types in the voxel world.
///
/// The `FromPrimitive` derive allows conversion from the compact `BlockTypeSize`
/// representation used by persisted chunk snapshots.
#[allow(non_camel_case_types)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, FromPrimitive, Serialize, Deserialize)]
pub enum BlockType {
    /// Empty space. Liquids may only flow into air.
    AIR,
    GRASS,
    DIRT,
    STONE,
    PLANKS,
    BRICK,
    WOOD,
    /// The bottom layer of the world; never moves.
    BEDROCK,
    COAL_ORE,
    IRON_ORE,
    GOLD_ORE,
    REDSTONE_ORE,
    /// A loose block that falls when nothing supports it.
    SAND,
    /// A loose block that falls when nothing supports it.
    GRAVEL,
    WATER,
    LAVA,
}

/// How a block type interacts with the flow and fall simulations.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BlockOpacity {
    /// Stops both liquids and falling blocks.
    Solid,
    /// Empty or see-through; liquids and falling blocks pass.
    Transparent,
    /// A liquid cell; liquids fall through it and falling blocks sink into it.
    Liquid,
}

impl BlockType {
    /// Converts a `BlockTypeSize` to a `BlockType`.
    ///
    /// # Returns
    /// `None` if the value does not name a known block type, e.g. in a snapshot
    /// written by a newer build.
    pub fn from_int(btype: BlockTypeSize) -> Option<Self> {
        num::FromPrimitive::from_u8(btype)
    }

    /// The compact representation stored in snapshots.
    pub fn as_int(self) -> BlockTypeSize {
        self as BlockTypeSize
    }

    pub fn opacity(self) -> BlockOpacity {
        match self {
            BlockType::AIR => BlockOpacity::Transparent,
            BlockType::WATER | BlockType::LAVA => BlockOpacity::Liquid,
            _ => BlockOpacity::Solid,
        }
    }

    pub fn is_liquid(self) -> bool {
        self.opacity() == BlockOpacity::Liquid
    }

    /// Whether blocks of this type collapse when unsupported.
    pub fn is_affected_by_gravity(self) -> bool {
        matches!(self, BlockType::SAND | BlockType::GRAVEL)
    }

    /// Picks an ore for a stone cell, or `STONE`, from a uniform roll in `0..1000`.
    pub fn ore_for_roll(roll: u32) -> Self {
        match roll {
            0..=1 => BlockType::GOLD_ORE,
            2..=5 => BlockType::REDSTONE_ORE,
            6..=14 => BlockType::IRON_ORE,
            15..=34 => BlockType::COAL_ORE,
            _ => BlockType::STONE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opacity_classes() {
        assert_eq!(BlockType::AIR.opacity(), BlockOpacity::Transparent);
        assert_eq!(BlockType::WATER.opacity(), BlockOpacity::Liquid);
        assert_eq!(BlockType::LAVA.opacity(), BlockOpacity::Liquid);
        assert_eq!(BlockType::SAND.opacity(), BlockOpacity::Solid);
        assert_eq!(BlockType::BEDROCK.opacity(), BlockOpacity::Solid);
    }

    #[test]
    fn unknown_int_is_rejected() {
        assert_eq!(BlockType::from_int(BlockType::LAVA.as_int()), Some(BlockType::LAVA));
        assert_eq!(BlockType::from_int(200), None);
    }

    #[test]
    fn only_loose_blocks_fall() {
        assert!(BlockType::SAND.is_affected_by_gravity());
        assert!(BlockType::GRAVEL.is_affected_by_gravity());
        assert!(!BlockType::DIRT.is_affected_by_gravity());
        assert!(!BlockType::WATER.is_affected_by_gravity());
    }
}
