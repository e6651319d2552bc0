//! # Terrain Module
//!
//! The procedural terrain is a collaborator of the streaming world: a chunk asks it for
//! the block type of every cell it is built with, unless a persisted snapshot exists.

use cgmath::Point3;
use noise::{NoiseFn, Perlin};

use super::block::block_type::BlockType;

/// Supplies the initial block type of every world cell.
pub trait TerrainGenerator {
    fn block_type_at(&self, position: Point3<i32>) -> BlockType;
}

/// A flat world: every cell below `ground_level` is `block_type`, the rest is air.
pub struct FlatTerrain {
    pub ground_level: i32,
    pub block_type: BlockType,
}

impl FlatTerrain {
    pub fn new(ground_level: i32, block_type: BlockType) -> Self {
        FlatTerrain {
            ground_level,
            block_type,
        }
    }

    /// A world of air everywhere.
    pub fn empty() -> Self {
        FlatTerrain::new(i32::MIN, BlockType::AIR)
    }
}

impl TerrainGenerator for FlatTerrain {
    fn block_type_at(&self, position: Point3<i32>) -> BlockType {
        if position.y < self.ground_level {
            self.block_type
        } else {
            BlockType::AIR
        }
    }
}

/// Scaling factor applied to world coordinates when sampling Perlin noise.
pub const PERLIN_SCALE_FACTOR: f64 = 0.02;
/// Height of the terrain surface where the noise samples zero.
pub const BASE_HEIGHT: f64 = 40.0;
/// Maximum deviation of the surface from `BASE_HEIGHT`.
pub const HEIGHT_AMPLITUDE: f64 = 24.0;
/// Depth of the dirt layer below the grass cap.
pub const DIRT_DEPTH: i32 = 3;

/// Rolling hills from a 2D Perlin height map, with bedrock at y = 0, stone with ore
/// veins underneath a dirt layer, and a grass cap.
pub struct PerlinTerrain {
    perlin: Perlin,
    seed: u32,
}

impl PerlinTerrain {
    pub fn new(seed: u32) -> Self {
        PerlinTerrain {
            perlin: Perlin::new(seed),
            seed,
        }
    }

    /// The y of the topmost solid cell of the column at (x, z).
    pub fn surface_height(&self, x: i32, z: i32) -> i32 {
        let sample = self
            .perlin
            .get([x as f64 * PERLIN_SCALE_FACTOR, z as f64 * PERLIN_SCALE_FACTOR]);
        (BASE_HEIGHT + sample * HEIGHT_AMPLITUDE).floor() as i32
    }

    /// A per-cell roll in `0..1000` that only depends on the seed and the position,
    /// so regenerated chunks get the same ores.
    fn ore_roll(&self, position: Point3<i32>) -> u32 {
        let hash = (position.x as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
            ^ (position.y as u64).wrapping_mul(0xC2B2_AE3D_27D4_EB4F)
            ^ (position.z as u64).wrapping_mul(0x1656_67B1_9E37_79F9)
            ^ self.seed as u64;
        fastrand::Rng::with_seed(hash).u32(0..1000)
    }
}

impl TerrainGenerator for PerlinTerrain {
    fn block_type_at(&self, position: Point3<i32>) -> BlockType {
        if position.y < 0 {
            return BlockType::AIR;
        }
        if position.y == 0 {
            return BlockType::BEDROCK;
        }

        let surface = self.surface_height(position.x, position.z);
        if position.y > surface {
            BlockType::AIR
        } else if position.y == surface {
            BlockType::GRASS
        } else if position.y > surface - DIRT_DEPTH {
            BlockType::DIRT
        } else {
            BlockType::ore_for_roll(self.ore_roll(position))
        }
    }
}
