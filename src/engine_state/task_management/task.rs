//! # Task System Core Traits
//!
//! This module defines the fundamental building blocks of the cooperative task system.
//!
//! ## Core Components
//! - `Task`: A unit of work made of steps separated by suspension points
//! - `TaskStatus`: What a task wants after a step (run again, sleep, or finish)
//! - `TaskContext`: Everything a step may touch, plus a place to spawn follow-up tasks
//!
//! ## Task Lifecycle
//! 1. A `Task` is published via `TaskManager::publish_task()`
//! 2. It waits in FIFO order until one of the manager's slots is free
//! 3. While active, `step()` is called at most once per tick
//! 4. A step may spawn new tasks through its context; they are published after the tick
//! 5. Returning `TaskStatus::Complete` frees the slot for the next queued task

use std::time::Duration;

use crate::core::CancellationToken;
use crate::engine_state::{
    persistence::ChunkStore, rendering::ChunkRenderer, voxels::world::World,
};

/// What a task wants to happen after a step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskStatus {
    /// Suspend until the next tick.
    Yield,
    /// Suspend for at least the given time.
    Sleep(Duration),
    /// The task is done and frees its slot.
    Complete,
}

/// The state a task step runs against.
///
/// Only one step of one task runs at a time, so a step has exclusive access to the
/// world for its whole duration.
pub struct TaskContext<'a> {
    pub world: &'a mut World,
    pub store: &'a mut dyn ChunkStore,
    pub renderer: &'a mut dyn ChunkRenderer,
    spawned: &'a mut Vec<Box<dyn Task>>,
}

impl<'a> TaskContext<'a> {
    pub fn new(
        world: &'a mut World,
        store: &'a mut dyn ChunkStore,
        renderer: &'a mut dyn ChunkRenderer,
        spawned: &'a mut Vec<Box<dyn Task>>,
    ) -> Self {
        TaskContext {
            world,
            store,
            renderer,
            spawned,
        }
    }

    /// Submits a follow-up task. It is queued behind everything already waiting and
    /// never preempts a currently active task.
    pub fn spawn(&mut self, task: Box<dyn Task>) {
        self.spawned.push(task);
    }
}

/// A cooperative unit of work.
///
/// # Implementation Guidelines
/// - A step must not run unbounded work: return `Yield` or `Sleep` to let other tasks in
/// - A step must leave every chunk it touched in a consistent state before returning
/// - Long-lived references into the world are not allowed; remember positions instead
pub trait Task {
    /// Runs one step of the task.
    fn step(&mut self, context: &mut TaskContext<'_>) -> TaskStatus;

    /// The token that cancels this task, if it belongs to a cancellable operation.
    fn cancellation(&self) -> Option<&CancellationToken> {
        None
    }

    /// A short name for logs.
    fn name(&self) -> &'static str;

    fn is_cancelled(&self) -> bool {
        self.cancellation().is_some_and(CancellationToken::is_cancelled)
    }
}
