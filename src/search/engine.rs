//! Best-first search over the motion-primitive lattice.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::{Duration, Instant};

use log::{debug, trace};

use crate::collision::GridCollisionChecker;
use crate::config::SearchConfig;
use crate::core::Pose2D;
use crate::costmap::{costs, Costmap};
use crate::error::{PlannerError, Result};
use crate::heuristic::HeuristicTable;
use crate::lattice::{Curvature, Direction, MotionTable};

use super::dubins;
use super::node::{LatticeState, NodeArena};

/// Spacing of collision samples along primitives and analytic arcs, cells.
const COLLISION_SAMPLE_STEP: f32 = 0.5;

/// Result of a successful search.
#[derive(Clone, Debug)]
pub struct SearchOutcome {
    /// Poses in cell units, ordered goal → start; the caller reverses.
    pub path: Vec<Pose2D>,
    /// Accumulated cost of the path, in cells.
    pub cost: f32,
    /// Expansions performed.
    pub iterations: usize,
}

/// Open-set entry. Orders by lowest f, then lowest h, then insertion
/// order, so pop order is fully deterministic.
#[derive(Debug)]
struct OpenEntry {
    f: f32,
    h: f32,
    g: f32,
    order: u64,
    idx: usize,
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenEntry {}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap behavior
        other
            .f
            .partial_cmp(&self.f)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.h.partial_cmp(&self.h).unwrap_or(Ordering::Equal))
            .then_with(|| other.order.cmp(&self.order))
    }
}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Lattice-constrained best-first search engine.
///
/// One instance corresponds to one configuration snapshot; reconfiguration
/// builds a replacement instead of mutating a live engine. The node arena
/// and heuristic window persist across planning calls.
pub struct LatticeAStar {
    config: SearchConfig,
    table: MotionTable,
    heuristic: HeuristicTable,
    arena: NodeArena,
    max_iterations: usize,
}

impl LatticeAStar {
    /// Create an engine from a configuration snapshot and a loaded motion
    /// table.
    ///
    /// Fails with `InvalidConfiguration` when the configuration selects a
    /// motion model this engine does not implement.
    pub fn new(config: SearchConfig, table: MotionTable, lookup_table_dim: usize) -> Result<Self> {
        config.validate()?;
        let heuristic = HeuristicTable::new(lookup_table_dim, config.cache_obstacle_heuristic);
        let max_iterations = config.effective_max_iterations();
        Ok(Self {
            config,
            table,
            heuristic,
            arena: NodeArena::new(),
            max_iterations,
        })
    }

    /// The motion table backing this engine.
    #[inline]
    pub fn motion_table(&self) -> &MotionTable {
        &self.table
    }

    /// Realized heuristic window dimension.
    #[inline]
    pub fn heuristic_dim(&self) -> usize {
        self.heuristic.dim()
    }

    /// Search for a path between two lattice states.
    ///
    /// `tolerance` is a goal radius in cells; zero demands the exact goal
    /// state. The returned path runs goal → start.
    pub fn create_path(
        &mut self,
        costmap: &Costmap,
        checker: &GridCollisionChecker,
        start: LatticeState,
        goal: LatticeState,
        tolerance: f32,
    ) -> Result<SearchOutcome> {
        let deadline =
            Instant::now() + Duration::from_secs_f32(self.config.max_planning_time.max(0.0));
        let Self {
            config,
            table,
            heuristic,
            arena,
            max_iterations,
        } = self;

        if !endpoint_valid(costmap, checker, table, start, config.allow_unknown) {
            return Err(PlannerError::InvalidStart);
        }
        if !endpoint_valid(costmap, checker, table, goal, config.allow_unknown) {
            return Err(PlannerError::InvalidGoal);
        }

        heuristic.recompute(costmap, checker, goal.coord(), config.allow_unknown);
        arena.begin_search();

        let width = costmap.width();
        let num_headings = table.num_headings();

        let mut open = BinaryHeap::new();
        let mut order: u64 = 0;

        let start_idx = arena.get_or_insert(start, width, num_headings);
        {
            let node = arena.node_mut(start_idx);
            node.g = 0.0;
            node.h = heuristic.estimate(start.coord(), goal.coord());
            open.push(OpenEntry {
                f: node.h,
                h: node.h,
                g: 0.0,
                order,
                idx: start_idx,
            });
            order += 1;
        }

        let mut iterations: usize = 0;
        let mut analytic_countdown: f32 = 0.0;

        while let Some(entry) = open.pop() {
            // Stale entries: improved or already expanded since pushed
            {
                let node = arena.node(entry.idx);
                if node.closed || node.g != entry.g {
                    continue;
                }
            }

            if iterations >= *max_iterations {
                debug!("[LatticeAStar] FAILED: iteration budget {} spent", max_iterations);
                return Err(PlannerError::IterationsExceeded(iterations));
            }
            if Instant::now() >= deadline {
                debug!(
                    "[LatticeAStar] FAILED: planning deadline {:.3}s passed after {} expansions",
                    config.max_planning_time, iterations
                );
                return Err(PlannerError::TimeExceeded(config.max_planning_time));
            }
            iterations += 1;

            let (state, g, h, arrival) = {
                let node = arena.node(entry.idx);
                (node.state, node.g, node.h, node.direction)
            };

            if state == goal
                || (tolerance > 0.0 && state.coord().distance(&goal.coord()) <= tolerance)
            {
                trace!(
                    "[LatticeAStar] SUCCESS: goal reached, cost={:.2}, {} expansions",
                    g, iterations
                );
                return Ok(SearchOutcome {
                    path: reconstruct(arena, table, entry.idx),
                    cost: g,
                    iterations,
                });
            }

            // Analytic expansion: the closer the frontier is, the more
            // often a direct connection is attempted
            if config.analytic_expansion_ratio > 0.0 {
                analytic_countdown -= 1.0;
                if analytic_countdown <= 0.0 {
                    analytic_countdown = (h / config.analytic_expansion_ratio).max(1.0);
                    if let Some((samples, length)) =
                        try_analytic(costmap, checker, table, config, state, goal)
                    {
                        trace!(
                            "[LatticeAStar] SUCCESS: analytic connection of {:.2} cells after {} expansions",
                            length, iterations
                        );
                        let mut path: Vec<Pose2D> = samples.into_iter().rev().collect();
                        path.extend(reconstruct(arena, table, entry.idx));
                        return Ok(SearchOutcome {
                            path,
                            cost: g + length,
                            iterations,
                        });
                    }
                }
            }

            arena.node_mut(entry.idx).closed = true;

            let from_pose = Pose2D::new(
                state.x as f32,
                state.y as f32,
                table.bin_angle(state.heading),
            );

            for prim in table.primitives_from(state.heading) {
                let (dx, dy) = prim.cell_offset();
                let next = LatticeState::new(state.x + dx, state.y + dy, prim.end_heading);
                if !costmap.is_valid_coord(next.coord()) {
                    continue;
                }

                let child_idx = arena.get_or_insert(next, width, num_headings);
                if arena.node(child_idx).closed {
                    continue;
                }

                // Sweep the footprint along the primitive, accumulating
                // traversed-cell cost for edge pricing
                let samples = prim.sample_poses(from_pose, COLLISION_SAMPLE_STEP);
                let mut cell_cost_sum = 0.0;
                let mut blocked = false;
                for pose in &samples {
                    match checker.footprint_cost(
                        costmap,
                        pose.x,
                        pose.y,
                        checker.angle_bin(pose.theta),
                        config.allow_unknown,
                    ) {
                        Some(cost) => cell_cost_sum += cost,
                        None => {
                            blocked = true;
                            break;
                        }
                    }
                }
                if blocked {
                    continue;
                }
                let avg_cell_cost = cell_cost_sum / samples.len() as f32;

                let mut edge = prim.arc_length
                    * (1.0 + config.cost_penalty * avg_cell_cost / costs::MAX_NON_OBSTACLE as f32);
                if prim.curvature != Curvature::Straight {
                    edge *= config.non_straight_penalty;
                }
                if prim.direction == Direction::Reverse {
                    edge *= config.reverse_penalty;
                }
                if prim.direction != arrival {
                    edge += config.change_penalty * prim.arc_length;
                }

                let new_g = g + edge;
                let child = arena.node_mut(child_idx);
                if new_g < child.g {
                    child.g = new_g;
                    child.parent = Some(entry.idx);
                    child.direction = prim.direction;
                    child.h = heuristic.estimate(next.coord(), goal.coord());
                    open.push(OpenEntry {
                        f: new_g + child.h,
                        h: child.h,
                        g: new_g,
                        order,
                        idx: child_idx,
                    });
                    order += 1;
                }
            }
        }

        debug!("[LatticeAStar] FAILED: open set exhausted after {} expansions", iterations);
        Err(PlannerError::NoPathFound)
    }
}

/// Whether an endpoint lies on the grid and clear of collision.
fn endpoint_valid(
    costmap: &Costmap,
    checker: &GridCollisionChecker,
    table: &MotionTable,
    state: LatticeState,
    traverse_unknown: bool,
) -> bool {
    if !costmap.is_valid_coord(state.coord()) {
        return false;
    }
    let bin = checker.angle_bin(table.bin_angle(state.heading));
    !checker.in_collision(costmap, state.x as f32, state.y as f32, bin, traverse_unknown)
}

/// Walk parent links from a node back to the start. Output runs from the
/// given node toward the start; with the node at the goal this is the
/// goal → start ordering the engine reports.
fn reconstruct(arena: &NodeArena, table: &MotionTable, idx: usize) -> Vec<Pose2D> {
    let mut path = Vec::new();
    let mut current = Some(idx);
    while let Some(i) = current {
        let node = arena.node(i);
        path.push(Pose2D::new(
            node.state.x as f32,
            node.state.y as f32,
            table.bin_angle(node.state.heading),
        ));
        current = node.parent;
    }
    path
}

/// Attempt a collision-checked Dubins connection to the goal.
fn try_analytic(
    costmap: &Costmap,
    checker: &GridCollisionChecker,
    table: &MotionTable,
    config: &SearchConfig,
    from: LatticeState,
    goal: LatticeState,
) -> Option<(Vec<Pose2D>, f32)> {
    let start_pose = Pose2D::new(from.x as f32, from.y as f32, table.bin_angle(from.heading));
    let goal_pose = Pose2D::new(goal.x as f32, goal.y as f32, table.bin_angle(goal.heading));
    let radius = table.min_turning_radius_cells().max(1e-3);

    let path = dubins::shortest_path(start_pose, goal_pose, radius)?;
    let samples = path.sample(COLLISION_SAMPLE_STEP);
    for pose in &samples {
        if checker.in_collision(
            costmap,
            pose.x,
            pose.y,
            checker.angle_bin(pose.theta),
            config.allow_unknown,
        ) {
            return None;
        }
    }
    Some((samples, path.length()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::Footprint;
    use crate::core::{GridCoord, WorldPoint};

    use crate::test_fixtures::lattice_json_4;

    fn build_engine(config: SearchConfig) -> LatticeAStar {
        let table = MotionTable::from_json_str(
            &lattice_json_4(),
            "test",
            1.0,
            config.allow_reverse_expansion,
        )
        .unwrap();
        LatticeAStar::new(config, table, 21).unwrap()
    }

    fn open_map(size: usize) -> Costmap {
        Costmap::new(size, size, 1.0, WorldPoint::ZERO)
    }

    fn checker() -> GridCollisionChecker {
        GridCollisionChecker::new(1.0, Footprint::circular(0.3, 0))
    }

    #[test]
    fn test_straight_corridor() {
        let mut engine = build_engine(SearchConfig::default());
        let map = open_map(20);
        let outcome = engine
            .create_path(
                &map,
                &checker(),
                LatticeState::new(2, 10, 0),
                LatticeState::new(15, 10, 0),
                0.0,
            )
            .unwrap();
        assert!(!outcome.path.is_empty());
        // Goal first, start last
        let first = outcome.path.first().unwrap();
        let last = outcome.path.last().unwrap();
        assert!((first.x - 15.0).abs() < 1.0 && (first.y - 10.0).abs() < 1.0);
        assert!((last.x - 2.0).abs() < 1e-3 && (last.y - 10.0).abs() < 1e-3);
        // A straight corridor costs about its length
        assert!(outcome.cost >= 12.9);
    }

    #[test]
    fn test_wall_blocks_path() {
        let mut engine = build_engine(SearchConfig::default());
        let mut map = open_map(12);
        for y in 0..12 {
            map.set_cost(GridCoord::new(6, y), costs::LETHAL);
        }
        let err = engine
            .create_path(
                &map,
                &checker(),
                LatticeState::new(2, 6, 0),
                LatticeState::new(10, 6, 0),
                0.0,
            )
            .unwrap_err();
        assert_eq!(err, PlannerError::NoPathFound);
    }

    #[test]
    fn test_iteration_budget() {
        let mut config = SearchConfig::default();
        config.max_iterations = 3;
        config.analytic_expansion_ratio = 0.0;
        let mut engine = build_engine(config);
        let map = open_map(100);
        let err = engine
            .create_path(
                &map,
                &checker(),
                LatticeState::new(2, 2, 0),
                LatticeState::new(95, 95, 0),
                0.0,
            )
            .unwrap_err();
        assert_eq!(err, PlannerError::IterationsExceeded(3));
    }

    #[test]
    fn test_time_budget() {
        let mut config = SearchConfig::default();
        config.max_planning_time = 0.0;
        config.analytic_expansion_ratio = 0.0;
        let mut engine = build_engine(config);
        let map = open_map(200);
        let err = engine
            .create_path(
                &map,
                &checker(),
                LatticeState::new(2, 2, 0),
                LatticeState::new(190, 190, 0),
                0.0,
            )
            .unwrap_err();
        assert!(matches!(err, PlannerError::TimeExceeded(_)));
    }

    #[test]
    fn test_invalid_endpoints() {
        let mut engine = build_engine(SearchConfig::default());
        let mut map = open_map(10);
        map.set_cost(GridCoord::new(8, 8), costs::LETHAL);

        let err = engine
            .create_path(
                &map,
                &checker(),
                LatticeState::new(-1, 2, 0),
                LatticeState::new(5, 5, 0),
                0.0,
            )
            .unwrap_err();
        assert_eq!(err, PlannerError::InvalidStart);

        let err = engine
            .create_path(
                &map,
                &checker(),
                LatticeState::new(2, 2, 0),
                LatticeState::new(8, 8, 0),
                0.0,
            )
            .unwrap_err();
        assert_eq!(err, PlannerError::InvalidGoal);
    }

    #[test]
    fn test_unknown_goal_respects_flag() {
        let mut map = open_map(10);
        map.set_cost(GridCoord::new(8, 8), costs::UNKNOWN);

        let mut config = SearchConfig::default();
        config.allow_unknown = false;
        let mut engine = build_engine(config);
        let err = engine
            .create_path(
                &map,
                &checker(),
                LatticeState::new(2, 2, 0),
                LatticeState::new(8, 8, 0),
                0.0,
            )
            .unwrap_err();
        assert_eq!(err, PlannerError::InvalidGoal);

        let mut engine = build_engine(SearchConfig::default());
        assert!(engine
            .create_path(
                &map,
                &checker(),
                LatticeState::new(2, 2, 0),
                LatticeState::new(8, 8, 0),
                0.0,
            )
            .is_ok());
    }

    #[test]
    fn test_search_reusable_after_failure() {
        let mut config = SearchConfig::default();
        config.max_iterations = 2;
        config.analytic_expansion_ratio = 0.0;
        let mut engine = build_engine(config);
        let map = open_map(50);

        let err = engine
            .create_path(
                &map,
                &checker(),
                LatticeState::new(2, 2, 0),
                LatticeState::new(45, 45, 0),
                0.0,
            )
            .unwrap_err();
        assert_eq!(err, PlannerError::IterationsExceeded(2));

        // Same engine plans a trivial request fine afterwards
        let outcome = engine
            .create_path(
                &map,
                &checker(),
                LatticeState::new(2, 2, 0),
                LatticeState::new(3, 2, 0),
                0.0,
            )
            .unwrap();
        assert!(!outcome.path.is_empty());
    }

    #[test]
    fn test_analytic_expansion_shortcuts() {
        // With shortcuts enabled the corner goal resolves in far fewer
        // expansions than the stepwise-only search
        let map = open_map(30);
        let start = LatticeState::new(2, 2, 0);
        let goal = LatticeState::new(27, 27, 0);

        let mut with = build_engine(SearchConfig::default());
        let with_outcome = with
            .create_path(&map, &checker(), start, goal, 0.0)
            .unwrap();

        let mut config = SearchConfig::default();
        config.analytic_expansion_ratio = 0.0;
        let mut without = build_engine(config);
        let without_outcome = without
            .create_path(&map, &checker(), start, goal, 0.0)
            .unwrap();

        assert!(with_outcome.iterations <= without_outcome.iterations);
    }

    #[test]
    fn test_determinism() {
        let mut map = open_map(25);
        for y in 5..20 {
            map.set_cost(GridCoord::new(12, y), costs::LETHAL);
        }
        let start = LatticeState::new(3, 12, 0);
        let goal = LatticeState::new(21, 12, 0);

        let mut engine = build_engine(SearchConfig::default());
        let a = engine
            .create_path(&map, &checker(), start, goal, 0.0)
            .unwrap();
        let b = engine
            .create_path(&map, &checker(), start, goal, 0.0)
            .unwrap();
        assert_eq!(a.path, b.path);
        assert_eq!(a.cost, b.cost);
        assert_eq!(a.iterations, b.iterations);
    }

    #[test]
    fn test_heuristic_admissible_against_search_cost() {
        // The engine returns optimal paths for this config, so the start
        // estimate must not exceed the realized cost
        let mut map = open_map(25);
        for y in 0..20 {
            map.set_cost(GridCoord::new(12, y), costs::LETHAL);
        }
        let start = LatticeState::new(3, 10, 0);
        let goal = LatticeState::new(21, 10, 0);

        let mut config = SearchConfig::default();
        config.analytic_expansion_ratio = 0.0;
        let mut engine = build_engine(config);
        let outcome = engine
            .create_path(&map, &checker(), start, goal, 0.0)
            .unwrap();

        let estimate = engine.heuristic.estimate(start.coord(), goal.coord());
        assert!(
            estimate <= outcome.cost + 1e-3,
            "estimate {} exceeds optimal cost {}",
            estimate,
            outcome.cost
        );
    }

    #[test]
    fn test_reverse_expansion_reaches_goal_behind() {
        // Goal directly behind the start with matching heading: with
        // reverse expansion a short backing maneuver suffices
        let mut config = SearchConfig::default();
        config.allow_reverse_expansion = true;
        config.analytic_expansion_ratio = 0.0;
        let mut engine = build_engine(config);
        let map = open_map(20);

        let outcome = engine
            .create_path(
                &map,
                &checker(),
                LatticeState::new(10, 10, 0),
                LatticeState::new(7, 10, 0),
                0.0,
            )
            .unwrap();
        // Backing up costs 3 cells times the reverse penalty plus the
        // direction change; any forward loop is much longer
        assert!(outcome.cost <= 3.0 * 2.0 + 0.2);
    }
}
