//! # Block Side Module
//!
//! The six axis-aligned neighbors of a cell. Both the chunk build flood and the
//! liquid flow walk neighbors in a fixed order, so the orders live here.

use cgmath::Vector3;

/// One of the six axis-aligned directions out of a cell (or out of a chunk).
#[derive(PartialEq, Eq, Hash, Copy, Clone, Debug)]
pub enum BlockSide {
    /// Negative X
    WEST,
    /// Positive X
    EAST,
    /// Negative Z
    NORTH,
    /// Positive Z
    SOUTH,
    /// Positive Y
    TOP,
    /// Negative Y
    BOTTOM,
}

impl BlockSide {
    /// All six sides in the order the world build flood visits neighbors:
    /// z-1, z+1, y-1, y+1, x-1, x+1.
    pub fn all() -> [BlockSide; 6] {
        [
            BlockSide::NORTH,
            BlockSide::SOUTH,
            BlockSide::BOTTOM,
            BlockSide::TOP,
            BlockSide::WEST,
            BlockSide::EAST,
        ]
    }

    /// The four horizontal sides in the order liquid spreads: west, east, north, south.
    pub fn lateral() -> [BlockSide; 4] {
        [
            BlockSide::WEST,
            BlockSide::EAST,
            BlockSide::NORTH,
            BlockSide::SOUTH,
        ]
    }

    /// Unit offset towards this side.
    pub fn offset(self) -> Vector3<i32> {
        match self {
            BlockSide::WEST => Vector3::new(-1, 0, 0),
            BlockSide::EAST => Vector3::new(1, 0, 0),
            BlockSide::NORTH => Vector3::new(0, 0, -1),
            BlockSide::SOUTH => Vector3::new(0, 0, 1),
            BlockSide::TOP => Vector3::new(0, 1, 0),
            BlockSide::BOTTOM => Vector3::new(0, -1, 0),
        }
    }
}
