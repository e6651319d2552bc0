//! # Draw Chunks Task
//!
//! One pass of the streaming controller over every loaded chunk. For each chunk it
//! hands pending draw work to the renderer, and queues the chunk for eviction once
//! its origin is farther than the eviction distance from where the observer stands
//! at that step.

use cgmath::{MetricSpace, Point3};

use crate::engine_state::{
    task_management::task::{Task, TaskContext, TaskStatus},
    voxels::chunk::ChunkState,
};

/// A task that visits one chunk per step.
///
/// The set of chunks is snapshotted on the first step; chunks built during the pass are
/// picked up by the next one, chunks removed during the pass are skipped.
pub struct DrawChunksTask {
    eviction_distance: f32,
    pending: Option<Vec<String>>,
}

impl DrawChunksTask {
    pub fn new(eviction_distance: f32) -> Self {
        DrawChunksTask {
            eviction_distance,
            pending: None,
        }
    }
}

impl Task for DrawChunksTask {
    fn step(&mut self, context: &mut TaskContext<'_>) -> TaskStatus {
        let pending = self
            .pending
            .get_or_insert_with(|| context.world.chunk_keys());

        let Some(key) = pending.pop() else {
            context.world.draw_pass_running = false;
            return TaskStatus::Complete;
        };

        let observer = context.world.observer();
        let far = match context.world.chunk_by_key_mut(&key) {
            Some(chunk) => {
                if chunk.state == ChunkState::Draw && context.renderer.draw(chunk) {
                    chunk.mark_drawn();
                }
                let origin = chunk.origin();
                let origin = Point3::new(origin.x as f32, origin.y as f32, origin.z as f32);
                chunk.has_visuals() && observer.distance(origin) > self.eviction_distance
            }
            None => false,
        };

        if far && context.world.queue_removal(&key) {
            log::trace!("Queued chunk {} for removal", key);
        }

        TaskStatus::Yield
    }

    fn name(&self) -> &'static str {
        "draw_chunks"
    }
}
