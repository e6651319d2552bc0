//! # Chunk Key Module
//!
//! Coordinate arithmetic between world positions, chunk coordinates and local block
//! indices, and the string key a chunk is registered and persisted under.
//!
//! ## Conventions
//! - A *chunk coordinate* is in chunk-grid units: world position divided by the chunk
//!   edge, floored toward negative infinity (so block `-1` lives in chunk `-1`, not `0`).
//! - A *chunk key* is the chunk's origin in world units, each axis truncated to an
//!   integer and joined as `"{x}_{y}_{z}"`.

use cgmath::Point3;

use super::ChunkCoordinate;

/// Encodes a chunk origin (world units) as a registry key.
pub fn encode_key(origin: Point3<i32>) -> String {
    format!("{}_{}_{}", origin.x, origin.y, origin.z)
}

/// Encodes a floating point chunk origin, truncating each axis toward zero.
pub fn encode_world_key(origin: Point3<f32>) -> String {
    encode_key(Point3::new(origin.x as i32, origin.y as i32, origin.z as i32))
}

/// Decodes a key produced by `encode_key`.
///
/// # Returns
/// `None` if the key does not consist of exactly three `_`-separated integers.
pub fn decode_key(key: &str) -> Option<Point3<i32>> {
    // Negative axes contain '-', never '_', so splitting on '_' is unambiguous.
    let mut parts = key.split('_');
    let x = parts.next()?.parse().ok()?;
    let y = parts.next()?.parse().ok()?;
    let z = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some(Point3::new(x, y, z))
}

/// The world-unit origin of a chunk.
pub fn chunk_origin(coordinate: ChunkCoordinate, edge: i32) -> Point3<i32> {
    Point3::new(coordinate.x * edge, coordinate.y * edge, coordinate.z * edge)
}

/// The registry key of the chunk at `coordinate`.
pub fn chunk_key(coordinate: ChunkCoordinate, edge: i32) -> String {
    encode_key(chunk_origin(coordinate, edge))
}

/// Recovers the chunk coordinate from a registry key.
pub fn coordinate_from_key(key: &str, edge: i32) -> Option<ChunkCoordinate> {
    let origin = decode_key(key)?;
    Some(chunk_coordinate_of(origin, edge))
}

/// The chunk containing the block at `position` (world block units).
pub fn chunk_coordinate_of(position: Point3<i32>, edge: i32) -> ChunkCoordinate {
    Point3::new(
        position.x.div_euclid(edge),
        position.y.div_euclid(edge),
        position.z.div_euclid(edge),
    )
}

/// The position of `position` inside its chunk, each axis in `[0, edge)`.
pub fn local_position_of(position: Point3<i32>, edge: i32) -> Point3<i32> {
    Point3::new(
        position.x.rem_euclid(edge),
        position.y.rem_euclid(edge),
        position.z.rem_euclid(edge),
    )
}

/// The block cell containing a continuous world position.
pub fn block_position_of(position: Point3<f32>) -> Point3<i32> {
    Point3::new(
        position.x.floor() as i32,
        position.y.floor() as i32,
        position.z.floor() as i32,
    )
}

/// The chunk containing a continuous world position.
pub fn chunk_coordinate_of_world(position: Point3<f32>, edge: i32) -> ChunkCoordinate {
    chunk_coordinate_of(block_position_of(position), edge)
}
