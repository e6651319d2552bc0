//! # Flow Task
//!
//! Liquid propagation as a bounded flood fill. A flow places liquid into an air cell,
//! then either falls straight down (keeping its strength) or, when the cell below is
//! blocked, spreads to the four lateral neighbors with one less strength.
//!
//! Two counters bound the fill:
//! - `strength` is the liquid's reach, it drops by one per lateral spread
//! - `budget` is the remaining number of propagations along any path, it drops by one
//!   per propagation in either direction

use std::time::Duration;

use cgmath::Point3;

use crate::engine_state::{
    task_management::task::{Task, TaskContext, TaskStatus},
    voxels::{
        block::{
            block_side::BlockSide,
            block_type::{BlockOpacity, BlockType},
            ContainerKind,
        },
        chunk::ChunkLease,
    },
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FlowPhase {
    /// Fill the target cell
    Place,
    /// Decide between falling and spreading
    Spread,
    /// Spawning the lateral continuation with this index
    Lateral(usize),
}

/// One cell of a liquid flood fill.
pub struct FlowTask {
    position: Point3<i32>,
    liquid: BlockType,
    strength: i32,
    budget: i32,
    delay: Duration,
    phase: FlowPhase,
    /// Keeps the chunk loaded while liquid is being placed in it
    _lease: Option<ChunkLease>,
}

impl FlowTask {
    /// Creates a flow into the cell at `position`.
    ///
    /// # Arguments
    /// * `position` - World block position of the target cell
    /// * `liquid` - The block type to place
    /// * `strength` - Lateral reach; stored as the placed block's health
    /// * `budget` - Maximum number of propagations along any path
    /// * `delay` - Pause between placing and spreading, and between lateral spawns
    pub fn new(position: Point3<i32>, liquid: BlockType, strength: i32, budget: i32, delay: Duration) -> Self {
        FlowTask {
            position,
            liquid,
            strength,
            budget,
            delay,
            phase: FlowPhase::Place,
            _lease: None,
        }
    }

    fn continuation(&self, position: Point3<i32>, strength: i32, budget: i32) -> Box<FlowTask> {
        Box::new(FlowTask::new(position, self.liquid, strength, budget, self.delay))
    }

    fn place(&mut self, context: &mut TaskContext<'_>) -> TaskStatus {
        if self.budget <= 0 || self.strength <= 0 {
            return TaskStatus::Complete;
        }
        let is_air = context
            .world
            .block_at(self.position)
            .is_some_and(|block| block.block_type() == BlockType::AIR);
        if !is_air {
            return TaskStatus::Complete;
        }

        let (liquid, strength) = (self.liquid, self.strength);
        context.world.modify_block(self.position, |block| {
            block.set_container(ContainerKind::Fluid);
            block.set_type(liquid);
            block.health = strength;
        });
        context.world.request_redraw_at(self.position);
        self._lease = context.world.lease_at(self.position);

        self.phase = FlowPhase::Spread;
        TaskStatus::Sleep(self.delay)
    }

    fn spread(&mut self, context: &mut TaskContext<'_>) -> TaskStatus {
        let below = self.position + BlockSide::BOTTOM.offset();
        let open_below = context.world.block_at(below).is_some_and(|block| {
            matches!(block.opacity(), BlockOpacity::Transparent | BlockOpacity::Liquid)
        });

        if open_below {
            context.spawn(self.continuation(below, self.strength, self.budget - 1));
            return TaskStatus::Complete;
        }

        self.strength -= 1;
        self.budget -= 1;
        self.phase = FlowPhase::Lateral(0);
        self.lateral(context, 0)
    }

    fn lateral(&mut self, context: &mut TaskContext<'_>, index: usize) -> TaskStatus {
        let sides = BlockSide::lateral();
        let Some(side) = sides.get(index) else {
            return TaskStatus::Complete;
        };
        let neighbor = self.position + side.offset();
        context.spawn(self.continuation(neighbor, self.strength, self.budget));

        self.phase = FlowPhase::Lateral(index + 1);
        if index + 1 == sides.len() {
            TaskStatus::Complete
        } else {
            TaskStatus::Sleep(self.delay)
        }
    }
}

impl Task for FlowTask {
    fn step(&mut self, context: &mut TaskContext<'_>) -> TaskStatus {
        match self.phase {
            FlowPhase::Place => self.place(context),
            FlowPhase::Spread => self.spread(context),
            FlowPhase::Lateral(index) => self.lateral(context, index),
        }
    }

    fn name(&self) -> &'static str {
        "flow"
    }
}
