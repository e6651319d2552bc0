//! # Voxel Task System
//!
//! This module contains the cooperative tasks that stream and simulate the world.
//! Every recursive algorithm (the chunk build flood, the liquid flood fill, the fall
//! chain) is expressed as tasks that spawn continuations through the `TaskManager`, so
//! radius and budget bounds, not call-stack depth, govern how far the work goes.

pub mod build_world_task;
pub mod draw_chunks_task;
pub mod fall_task;
pub mod flow_task;
pub mod remove_chunks_task;

pub use build_world_task::BuildWorldTask;
pub use draw_chunks_task::DrawChunksTask;
pub use fall_task::FallTask;
pub use flow_task::FlowTask;
pub use remove_chunks_task::RemoveChunksTask;
