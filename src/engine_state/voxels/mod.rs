//! # Voxel World
//!
//! This module contains the voxel data model and the tasks that stream and simulate it.
//!
//! ## Architecture
//!
//! * **Block**: Block types, their opacity classes, and the six neighbor directions
//! * **Chunk**: Fixed-size cubes of blocks, their keys and pending-work state
//! * **World**: The registry of loaded chunks and cross-chunk block lookup
//! * **Terrain**: Generators for chunks that have never been persisted
//! * **Tasks**: Cooperative tasks for the build flood, draw and removal passes,
//!   liquid flow and falling blocks
//!
//! ## Data Flow
//!
//! 1. The streaming controller publishes a build around the observer
//! 2. Build tasks load chunks from the store or generate them from the terrain
//! 3. Draw passes hand pending chunks to the renderer and queue distant chunks
//! 4. Removal passes persist queued chunks and drop them from the world
//!
//! Simulations mutate blocks through the `World` and flag the affected chunks for
//! redrawing, so the next draw pass picks their changes up.

pub mod block;
pub mod chunk;
pub mod tasks;
pub mod terrain;
pub mod world;
