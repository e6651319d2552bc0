//! # Build World Task
//!
//! This module defines the `BuildWorldTask`, one node of the recursive flood that
//! loads chunks around the observer. Each node builds its chunk and spawns a
//! continuation for each of the six neighboring chunks with the radius decremented.
//! The reached set is every chunk within Manhattan distance `radius - 1` of the start
//! that lies inside the vertical bounds.

use std::{cell::RefCell, collections::HashMap, rc::Rc};

use crate::core::CancellationToken;
use crate::engine_state::{
    task_management::task::{Task, TaskContext, TaskStatus},
    voxels::{block::block_side::BlockSide, chunk::ChunkCoordinate},
};

/// Best radius each coordinate was scheduled with during one build.
type VisitedRadii = Rc<RefCell<HashMap<ChunkCoordinate, i32>>>;

/// A task that builds one chunk and fans out to its neighbors.
///
/// All continuations of a build share its `CancellationToken`, so cancelling the token
/// stops the whole tree, including nodes still waiting in the queue.
pub struct BuildWorldTask {
    /// The chunk to build (in chunk coordinates)
    coordinate: ChunkCoordinate,
    /// Remaining reach; a node with radius 1 builds its chunk but spawns nothing
    radius: i32,
    cancellation: CancellationToken,
    /// Shared by the whole tree to skip neighbors already scheduled with equal or
    /// greater reach
    visited: VisitedRadii,
}

impl BuildWorldTask {
    /// Creates the root node of a build.
    ///
    /// # Arguments
    /// * `origin` - The chunk the build starts at
    /// * `radius` - How far the build reaches; `0` or less builds nothing
    /// * `cancellation` - Token shared by every node of this build
    pub fn new(origin: ChunkCoordinate, radius: i32, cancellation: CancellationToken) -> Self {
        let visited = Rc::new(RefCell::new(HashMap::from([(origin, radius)])));
        BuildWorldTask {
            coordinate: origin,
            radius,
            cancellation,
            visited,
        }
    }

    fn continuation(&self, coordinate: ChunkCoordinate, radius: i32) -> Self {
        BuildWorldTask {
            coordinate,
            radius,
            cancellation: self.cancellation.clone(),
            visited: Rc::clone(&self.visited),
        }
    }

    fn within_vertical_bounds(coordinate: ChunkCoordinate, vertical_limit: i32) -> bool {
        (0..vertical_limit).contains(&coordinate.y)
    }
}

impl Task for BuildWorldTask {
    fn step(&mut self, context: &mut TaskContext<'_>) -> TaskStatus {
        if self.cancellation.is_cancelled() || self.radius <= 0 {
            return TaskStatus::Complete;
        }
        let vertical_limit = context.world.vertical_limit();
        if !Self::within_vertical_bounds(self.coordinate, vertical_limit) {
            return TaskStatus::Complete;
        }

        context.world.build_chunk_at(self.coordinate, context.store);

        let next_radius = self.radius - 1;
        if next_radius == 0 {
            return TaskStatus::Complete;
        }

        for side in BlockSide::all() {
            let neighbor = self.coordinate + side.offset();
            if !Self::within_vertical_bounds(neighbor, vertical_limit) {
                continue;
            }
            {
                let mut visited = self.visited.borrow_mut();
                if visited.get(&neighbor).is_some_and(|&best| best >= next_radius) {
                    continue;
                }
                visited.insert(neighbor, next_radius);
            }
            context.spawn(Box::new(self.continuation(neighbor, next_radius)));
        }

        TaskStatus::Complete
    }

    fn cancellation(&self) -> Option<&CancellationToken> {
        Some(&self.cancellation)
    }

    fn name(&self) -> &'static str {
        "build_world"
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use cgmath::Point3;

    use super::*;
    use crate::engine_state::voxels::{
        block::block_type::BlockType, tasks::test_support::Harness, terrain::FlatTerrain,
    };

    fn manhattan(a: ChunkCoordinate, b: ChunkCoordinate) -> i32 {
        (a.x - b.x).abs() + (a.y - b.y).abs() + (a.z - b.z).abs()
    }

    #[test]
    fn builds_every_chunk_within_reach() {
        let mut harness = Harness::new(4, FlatTerrain::new(8, BlockType::STONE), 0..0);
        let origin = Point3::new(0, 2, 0);
        harness
            .manager
            .publish_task(Box::new(BuildWorldTask::new(origin, 3, CancellationToken::new())));
        harness.run_until_idle();

        assert_eq!(harness.world.len(), 25);
        for chunk in harness.world.chunks() {
            assert!(manhattan(chunk.coordinate(), origin) <= 2);
        }
        assert!(harness.world.contains_chunk(Point3::new(0, 4, 0)));
        assert!(harness.world.contains_chunk(Point3::new(1, 2, -1)));
    }

    #[test]
    fn radius_one_builds_only_the_origin() {
        let mut harness = Harness::new(4, FlatTerrain::empty(), 0..0);
        harness.manager.publish_task(Box::new(BuildWorldTask::new(
            Point3::new(3, 1, 3),
            1,
            CancellationToken::new(),
        )));
        harness.run_until_idle();
        assert_eq!(harness.world.len(), 1);
        assert_eq!(harness.manager.steps_executed(), 1);
    }

    #[test]
    fn non_positive_radius_builds_nothing() {
        let mut harness = Harness::new(4, FlatTerrain::empty(), 0..0);
        harness.manager.publish_task(Box::new(BuildWorldTask::new(
            Point3::new(0, 0, 0),
            0,
            CancellationToken::new(),
        )));
        harness.run_until_idle();
        assert!(harness.world.is_empty());
    }

    #[test]
    fn build_is_clipped_to_vertical_bounds() {
        let mut harness = Harness::new(4, FlatTerrain::empty(), 0..0);
        harness.manager.publish_task(Box::new(BuildWorldTask::new(
            Point3::new(0, 0, 0),
            2,
            CancellationToken::new(),
        )));
        harness.run_until_idle();

        assert_eq!(harness.world.len(), 6);
        assert!(!harness.world.contains_chunk(Point3::new(0, -1, 0)));
        assert!(harness.world.chunks().all(|chunk| chunk.coordinate().y >= 0));
    }

    #[test]
    fn overlapping_builds_create_each_chunk_once() {
        let mut harness = Harness::new(4, FlatTerrain::empty(), 0..0);
        for origin in [Point3::new(0, 3, 0), Point3::new(1, 3, 0)] {
            harness
                .manager
                .publish_task(Box::new(BuildWorldTask::new(origin, 3, CancellationToken::new())));
        }
        harness.run_until_idle();

        let mut keys = harness.world.chunk_keys();
        let total = keys.len();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), total);
        assert!(harness.world.contains_chunk(Point3::new(-2, 3, 0)));
        assert!(harness.world.contains_chunk(Point3::new(3, 3, 0)));
    }

    #[test]
    fn cancellation_stops_the_whole_tree() {
        let mut harness = Harness::new(4, FlatTerrain::empty(), 0..0);
        let token = CancellationToken::new();
        harness.manager.publish_task(Box::new(BuildWorldTask::new(
            Point3::new(0, 5, 0),
            4,
            token.clone(),
        )));

        harness.tick(Duration::ZERO);
        assert_eq!(harness.world.len(), 1);
        assert_eq!(harness.manager.active_count() + harness.manager.queued_count(), 6);

        token.cancel();
        harness.run_until_idle();
        assert_eq!(harness.world.len(), 1);
    }
}
