//! # Fall Task
//!
//! Gravity for sand-like blocks. A fall moves its block type one cell down per step,
//! restoring whatever the cell above held before, until the cell below the block is
//! solid. When the fall started under another gravity-bound block, that block starts
//! its own fall once this one has landed, so stacks collapse one link at a time.

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
        world::World,
    },
};

/// A falling block.
pub struct FallTask {
    start: Point3<i32>,
    /// The cell the block moves into next
    position: Point3<i32>,
    falling_type: BlockType,
    delay: Duration,
    /// The cell the block occupies, and the type to restore there once it moves on
    previous: Option<Point3<i32>>,
    /// Whether a gravity-bound block sat directly above the start cell
    chained: Option<bool>,
    moves: u32,
    /// Keeps the chunks of the occupied cell and of the next cell loaded
    _leases: [Option<ChunkLease>; 2],
}

impl FallTask {
    /// Creates a fall of `falling_type` starting at the cell at `position`.
    pub fn new(position: Point3<i32>, falling_type: BlockType, delay: Duration) -> Self {
        FallTask {
            start: position,
            position,
            falling_type,
            delay,
            previous: None,
            chained: None,
            moves: 0,
            _leases: [None, None],
        }
    }

    fn above(position: Point3<i32>) -> Point3<i32> {
        position + BlockSide::TOP.offset()
    }

    fn container_for(block_type: BlockType) -> ContainerKind {
        if block_type.is_liquid() {
            ContainerKind::Fluid
        } else {
            ContainerKind::Solid
        }
    }

    /// Spawns the fall of the block above the start cell, if it is still gravity-bound.
    fn land(&self, context: &mut TaskContext<'_>) {
        let above = Self::above(self.start);
        let falling_above = context
            .world
            .block_at(above)
            .filter(|block| block.is_falling)
            .map(|block| block.block_type());
        if let Some(block_type) = falling_above {
            context.spawn(Box::new(FallTask::new(above, block_type, self.delay)));
        }
    }

    /// Moves the block into `self.position`.
    ///
    /// # Returns
    /// `false` if the target chunk is not loaded.
    fn advance(&mut self, world: &mut World) -> bool {
        let falling_type = self.falling_type;
        let Some(displaced) = world.modify_block(self.position, |block| {
            let displaced = block.block_type();
            block.set_container(ContainerKind::Solid);
            block.set_type(falling_type);
            displaced
        }) else {
            return false;
        };
        world.request_redraw_at(self.position);

        if let Some(previous) = self.previous {
            world.modify_block(previous, |block| {
                block.set_container(Self::container_for(displaced));
                block.set_type(displaced);
            });
            world.request_redraw_at(previous);
            self.moves += 1;
        }

        let occupied = self.position;
        self.previous = Some(occupied);
        self.position = occupied + BlockSide::BOTTOM.offset();
        self._leases = [world.lease_at(occupied), world.lease_at(self.position)];
        true
    }
}

impl Task for FallTask {
    fn step(&mut self, context: &mut TaskContext<'_>) -> TaskStatus {
        match self.chained {
            None => {
                let above = Self::above(self.position);
                let chained = context.world.block_at(above).is_some_and(|block| block.is_falling);
                self.chained = Some(chained);
            }
            Some(chained) => match context.world.block_at(self.position).map(|block| block.opacity()) {
                None => return TaskStatus::Complete,
                Some(BlockOpacity::Solid) => {
                    log::trace!("{:?} landed after {} moves", self.falling_type, self.moves);
                    if chained {
                        self.land(context);
                    }
                    return TaskStatus::Complete;
                }
                Some(_) => {}
            },
        }

        if !self.advance(context.world) {
            return TaskStatus::Complete;
        }
        TaskStatus::Sleep(self.delay)
    }

    fn name(&self) -> &'static str {
        "fall"
    }
}
