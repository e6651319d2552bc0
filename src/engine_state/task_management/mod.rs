//! # Task Management System
//!
//! This module provides a bounded, cooperative task manager. Every piece of
//! long-running world work (recursive builds, draw and removal passes, liquid flow,
//! falling blocks) is expressed as a `Task` and interleaved here, so its cost is spread
//! across many ticks instead of blocking the world.
//!
//! ## Execution Model
//!
//! - At most `capacity` tasks are *active* at once; the rest wait in a FIFO queue
//! - Each tick advances every active task that is not sleeping by exactly one step,
//!   in the order the tasks became active
//! - A completed task frees its slot and the oldest queued task is promoted
//! - Tasks spawned during a tick are published after the tick, behind the queue
//! - Sleeping tasks keep their slot
//!
//! Everything runs on the caller's thread: "active" describes interleaving, not
//! parallel execution.
//!
//! ## Example Usage
//! ```rust,ignore
//! let mut task_manager = TaskManager::new(config.scheduler_capacity);
//! task_manager.publish_task(Box::new(BuildWorldTask::new(origin, radius, token)));
//!
//! // In the main loop:
//! task_manager.process_tasks(&mut world, &mut store, &mut renderer, frame_time);
//! ```

pub mod task;

use std::{collections::VecDeque, time::Duration};

use task::{Task, TaskContext, TaskStatus};

use super::{persistence::ChunkStore, rendering::ChunkRenderer, voxels::world::World};

/// An active task and the logical time it may run again.
struct ActiveTask {
    task: Box<dyn Task>,
    wake_at: Duration,
}

/// Runs cooperative tasks with a cap on how many are active at once.
pub struct TaskManager {
    capacity: usize,
    active_tasks: Vec<ActiveTask>,
    queued_tasks: VecDeque<Box<dyn Task>>,
    /// Logical time, advanced by each call to `process_tasks`.
    clock: Duration,
    peak_active: usize,
    steps_executed: u64,
}

impl TaskManager {
    /// Creates a new `TaskManager` that keeps at most `capacity` tasks active.
    ///
    /// A capacity of zero is raised to one so that published work can always run.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        TaskManager {
            capacity,
            active_tasks: Vec::with_capacity(capacity),
            queued_tasks: VecDeque::new(),
            clock: Duration::ZERO,
            peak_active: 0,
            steps_executed: 0,
        }
    }

    /// Publishes a new task for execution.
    ///
    /// # Returns
    /// - `true` if the task became active immediately
    /// - `false` if it was queued because all slots are taken (or others are waiting)
    pub fn publish_task(&mut self, task: Box<dyn Task>) -> bool {
        if self.active_tasks.len() < self.capacity && self.queued_tasks.is_empty() {
            self.activate(task);
            true
        } else {
            self.queued_tasks.push_back(task);
            false
        }
    }

    fn activate(&mut self, task: Box<dyn Task>) {
        debug_assert!(self.active_tasks.len() < self.capacity);
        self.active_tasks.push(ActiveTask {
            task,
            wake_at: self.clock,
        });
        self.peak_active = self.peak_active.max(self.active_tasks.len());
    }

    /// Promotes queued tasks, oldest first, into free slots.
    ///
    /// Cancelled tasks are dropped on the way instead of taking a slot.
    pub fn process_queued_tasks(&mut self) {
        while self.active_tasks.len() < self.capacity {
            let Some(task) = self.queued_tasks.pop_front() else {
                break;
            };
            if task.is_cancelled() {
                log::trace!("Dropping cancelled {} before it started", task.name());
                continue;
            }
            self.activate(task);
        }
    }

    /// Advances the logical clock by `elapsed` and runs one scheduling tick.
    ///
    /// # Returns
    /// The number of task steps executed during this tick.
    pub fn process_tasks(
        &mut self,
        world: &mut World,
        store: &mut dyn ChunkStore,
        renderer: &mut dyn ChunkRenderer,
        elapsed: Duration,
    ) -> usize {
        self.clock += elapsed;
        let clock = self.clock;

        let mut spawned: Vec<Box<dyn Task>> = Vec::new();
        let mut steps = 0;
        let mut still_active = Vec::with_capacity(self.capacity);

        for mut entry in std::mem::take(&mut self.active_tasks) {
            if entry.task.is_cancelled() {
                log::trace!("Dropping cancelled {}", entry.task.name());
                continue;
            }
            if entry.wake_at > clock {
                still_active.push(entry);
                continue;
            }

            let mut context = TaskContext::new(world, store, renderer, &mut spawned);
            steps += 1;
            match entry.task.step(&mut context) {
                TaskStatus::Yield => {
                    entry.wake_at = clock;
                    still_active.push(entry);
                }
                TaskStatus::Sleep(duration) => {
                    entry.wake_at = clock + duration;
                    still_active.push(entry);
                }
                TaskStatus::Complete => {}
            }
        }

        self.active_tasks = still_active;
        self.steps_executed += steps as u64;

        self.process_queued_tasks();
        for task in spawned {
            self.publish_task(task);
        }
        steps
    }

    /// Runs ticks until no task is left, advancing the clock to the next wake-up each time.
    ///
    /// # Returns
    /// The number of ticks run, or `None` if `max_ticks` was reached first.
    pub fn run_until_idle(
        &mut self,
        world: &mut World,
        store: &mut dyn ChunkStore,
        renderer: &mut dyn ChunkRenderer,
        max_ticks: usize,
    ) -> Option<usize> {
        for tick in 0..max_ticks {
            if self.is_idle() {
                return Some(tick);
            }
            let elapsed = self.time_until_next_wake();
            self.process_tasks(world, store, renderer, elapsed);
        }
        self.is_idle().then_some(max_ticks)
    }

    /// Time until the earliest sleeping active task wakes up, or zero if one is ready.
    pub fn time_until_next_wake(&self) -> Duration {
        self.active_tasks
            .iter()
            .map(|entry| entry.wake_at.saturating_sub(self.clock))
            .min()
            .unwrap_or(Duration::ZERO)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn active_count(&self) -> usize {
        self.active_tasks.len()
    }

    pub fn queued_count(&self) -> usize {
        self.queued_tasks.len()
    }

    /// The highest number of simultaneously active tasks seen so far.
    pub fn peak_active(&self) -> usize {
        self.peak_active
    }

    pub fn steps_executed(&self) -> u64 {
        self.steps_executed
    }

    pub fn is_idle(&self) -> bool {
        self.active_tasks.is_empty() && self.queued_tasks.is_empty()
    }

    /// The current logical time.
    pub fn clock(&self) -> Duration {
        self.clock
    }
}
