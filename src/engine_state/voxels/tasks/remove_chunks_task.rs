//! # Remove Chunks Task
//!
//! Drains the world's removal queue one chunk per step. Every evicted chunk is
//! persisted before it leaves memory; a chunk whose save fails, or that a running
//! simulation still holds a lease on, stays loaded and is queued again for the next
//! pass.

use crate::engine_state::task_management::task::{Task, TaskContext, TaskStatus};

#[derive(Default)]
pub struct RemoveChunksTask {
    /// Chunks to retry in the next pass
    deferred: Vec<String>,
    removed: usize,
}

impl RemoveChunksTask {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Task for RemoveChunksTask {
    fn step(&mut self, context: &mut TaskContext<'_>) -> TaskStatus {
        let Some(key) = context.world.pop_removal() else {
            for key in self.deferred.drain(..) {
                context.world.queue_removal(&key);
            }
            if self.removed > 0 {
                log::debug!(
                    "Removal pass evicted {} chunks, {} loaded",
                    self.removed,
                    context.world.len()
                );
            }
            context.world.removal_pass_running = false;
            return TaskStatus::Complete;
        };

        let Some(chunk) = context.world.chunk_by_key_mut(&key) else {
            return TaskStatus::Yield;
        };
        if chunk.is_leased() {
            log::trace!("Chunk {} is leased, deferring removal", key);
            self.deferred.push(key);
            return TaskStatus::Yield;
        }

        match context.store.save(&chunk.snapshot()) {
            Ok(()) => {
                chunk.mark_saved();
                chunk.destroy_visuals();
                context.renderer.release(&key);
                context.world.remove_chunk(&key);
                self.removed += 1;
            }
            Err(error) => {
                log::error!("Failed to persist chunk {}, keeping it loaded: {}", key, error);
                self.deferred.push(key);
            }
        }

        TaskStatus::Yield
    }

    fn name(&self) -> &'static str {
        "remove_chunks"
    }
}
