//! Planner facade: serialized planning calls and safe reconfiguration.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use log::{debug, info};

use crate::collision::{Footprint, GridCollisionChecker};
use crate::config::{ParamValue, SearchConfig};
use crate::core::Pose2D;
use crate::costmap::{Costmap, SharedCostmap};
use crate::error::Result;
use crate::lattice::{LatticeMetadata, MotionTable};
use crate::search::{LatticeAStar, LatticeState};
use crate::smoothing::{SimplifySmoother, Smoother};

/// A completed plan.
#[derive(Clone, Debug)]
pub struct PlannedPath {
    /// World-frame poses from start to goal.
    pub poses: Vec<Pose2D>,
    /// Path cost in cells, as priced by the search.
    pub cost: f32,
    /// Search expansions spent.
    pub iterations: usize,
    /// Wall-clock time of search plus smoothing.
    pub planning_time: Duration,
}

struct PlannerInner {
    config: SearchConfig,
    engine: LatticeAStar,
    checker: GridCollisionChecker,
    smoother: Box<dyn Smoother>,
}

/// State-lattice planner with runtime reconfiguration.
///
/// One mutex serializes planning against reconfiguration: a planning call
/// holds it for the whole search plus the smoothing handoff, and a
/// reconfiguration call holds it while rebuilding and swapping the engine,
/// collision checker, and heuristic. No call can observe a half-updated
/// configuration.
pub struct LatticePlanner {
    costmap: SharedCostmap,
    inner: Mutex<PlannerInner>,
}

impl std::fmt::Debug for LatticePlanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LatticePlanner").finish_non_exhaustive()
    }
}

impl LatticePlanner {
    /// Build a planner for a shared costmap.
    ///
    /// Loads the lattice file named by the configuration; a bad file fails
    /// construction with `LoadError`.
    pub fn new(costmap: SharedCostmap, config: SearchConfig, footprint: Footprint) -> Result<Self> {
        let resolution = costmap.read().unwrap().resolution();
        let engine = build_engine(&config, resolution)?;
        let checker = GridCollisionChecker::new(resolution, footprint);

        let metadata = engine.motion_table().metadata();
        info!(
            "[LatticePlanner] configured: {} headings, {:.2}m turning radius, \
             max_iterations={}, {} unknown traversal, lattice '{}'",
            metadata.number_of_headings,
            metadata.min_turning_radius,
            config.max_iterations,
            if config.allow_unknown { "allowing" } else { "not allowing" },
            config.lattice_filepath.display()
        );

        Ok(Self {
            costmap,
            inner: Mutex::new(PlannerInner {
                config,
                engine,
                checker,
                smoother: Box::new(SimplifySmoother::default()),
            }),
        })
    }

    /// Replace the downstream smoother.
    pub fn set_smoother(&self, smoother: Box<dyn Smoother>) {
        self.inner.lock().unwrap().smoother = smoother;
    }

    /// Replace the robot footprint used for collision checking.
    pub fn set_footprint(&self, footprint: Footprint) {
        self.inner.lock().unwrap().checker.set_footprint(footprint);
    }

    /// Snapshot of the active configuration.
    pub fn config(&self) -> SearchConfig {
        self.inner.lock().unwrap().config.clone()
    }

    /// Metadata of the loaded lattice.
    pub fn lattice_metadata(&self) -> LatticeMetadata {
        self.inner
            .lock()
            .unwrap()
            .engine
            .motion_table()
            .metadata()
            .clone()
    }

    /// Realized heuristic window dimension in cells.
    pub fn lookup_table_dim(&self) -> usize {
        self.inner.lock().unwrap().engine.heuristic_dim()
    }

    /// Plan a path between two world-frame poses.
    ///
    /// Holds the planner lock for the full search plus smoothing, and the
    /// costmap read lock for the same span so the grid cannot change under
    /// an in-flight search.
    pub fn plan(&self, start: Pose2D, goal: Pose2D) -> Result<PlannedPath> {
        let mut inner = self.inner.lock().unwrap();
        let inner = &mut *inner;
        let started = Instant::now();
        let grid = self.costmap.read().unwrap();

        let table = inner.engine.motion_table();
        let start_cell = grid.world_to_grid(start.position());
        let goal_cell = grid.world_to_grid(goal.position());
        let start_state = LatticeState::new(
            start_cell.x,
            start_cell.y,
            table.closest_angular_bin(start.theta),
        );
        let goal_state = LatticeState::new(
            goal_cell.x,
            goal_cell.y,
            table.closest_angular_bin(goal.theta),
        );

        let outcome = inner.engine.create_path(
            &grid,
            &inner.checker,
            start_state,
            goal_state,
            0.0, // no tolerance
        )?;

        // Engine paths run goal → start in cell units
        let mut poses: Vec<Pose2D> = outcome
            .path
            .iter()
            .rev()
            .map(|p| cell_pose_to_world(&grid, p))
            .collect();

        let budget = Duration::from_secs_f32(inner.config.max_planning_time.max(0.0))
            .saturating_sub(started.elapsed());
        if poses.len() > 2 {
            inner.smoother.smooth(&grid, &mut poses, budget);
        }

        let planning_time = started.elapsed();
        debug!(
            "[LatticePlanner] planned {} poses, cost {:.2}, {} iterations in {:.1}ms",
            poses.len(),
            outcome.cost,
            outcome.iterations,
            planning_time.as_secs_f32() * 1000.0
        );

        Ok(PlannedPath {
            poses,
            cost: outcome.cost,
            iterations: outcome.iterations,
            planning_time,
        })
    }

    /// Apply runtime parameter updates.
    ///
    /// Updates land on a copy of the configuration; dependent objects are
    /// rebuilt from the copy and swapped in only when everything succeeded.
    /// A failed lattice reload aborts the whole update and the previous
    /// configuration stays active.
    pub fn update_parameters(&self, updates: &[(&str, ParamValue)]) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();

        let mut config = inner.config.clone();
        let mut changed = false;
        for (name, value) in updates {
            changed |= config.apply_update(name, value);
        }
        if !changed {
            return Ok(());
        }

        let resolution = self.costmap.read().unwrap().resolution();
        let engine = build_engine(&config, resolution)?;
        let checker =
            GridCollisionChecker::new(resolution, inner.checker.footprint().clone());

        info!(
            "[LatticePlanner] reconfigured: lattice '{}', max_iterations={}",
            config.lattice_filepath.display(),
            config.max_iterations
        );

        inner.config = config;
        inner.engine = engine;
        inner.checker = checker;
        Ok(())
    }
}

/// Build a search engine from a configuration snapshot.
fn build_engine(config: &SearchConfig, resolution: f32) -> Result<LatticeAStar> {
    config.validate()?;

    let table = MotionTable::from_file(
        &config.lattice_filepath,
        resolution,
        config.allow_reverse_expansion,
    )?;

    if config.max_iterations <= 0 {
        info!("maximum iterations selected as <= 0, disabling the iteration limit");
    }

    let raw_dim = (config.lookup_table_size / resolution) as usize;
    let dim = config.lookup_table_dim(resolution);
    if raw_dim % 2 == 0 {
        info!(
            "even heuristic window of {} cells widened to {} so a center cell exists",
            raw_dim, dim
        );
    }

    LatticeAStar::new(config.clone(), table, dim)
}

/// Continuous cell coordinates → world pose (cell centers at integers).
fn cell_pose_to_world(grid: &Costmap, pose: &Pose2D) -> Pose2D {
    let origin = grid.origin();
    let resolution = grid.resolution();
    Pose2D::new(
        origin.x + (pose.x + 0.5) * resolution,
        origin.y + (pose.y + 0.5) * resolution,
        pose.theta,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{GridCoord, WorldPoint};
    use crate::costmap::costs;
    use crate::error::PlannerError;
    use crate::test_fixtures::write_temp_lattice;

    fn planner_on(map: Costmap, tag: &str) -> LatticePlanner {
        let mut config = SearchConfig::default();
        config.lattice_filepath = write_temp_lattice(tag);
        LatticePlanner::new(map.into_shared(), config, Footprint::circular(0.3, 0)).unwrap()
    }

    #[test]
    fn test_plan_end_to_end() {
        let map = Costmap::new(10, 10, 1.0, WorldPoint::ZERO);
        let planner = planner_on(map, "plan_end_to_end");

        let start = Pose2D::new(0.5, 0.5, 0.0);
        let goal = Pose2D::new(9.5, 9.5, 0.0);
        let path = planner.plan(start, goal).unwrap();

        assert!(!path.poses.is_empty());
        let first = path.poses.first().unwrap();
        let last = path.poses.last().unwrap();
        assert!(first.position().distance(&start.position()) <= 1.0);
        assert!(last.position().distance(&goal.position()) <= 1.0);
    }

    #[test]
    fn test_missing_lattice_file_fails_construction() {
        let map = Costmap::new(10, 10, 1.0, WorldPoint::ZERO);
        let mut config = SearchConfig::default();
        config.lattice_filepath = "/nonexistent/model.json".into();
        let err = LatticePlanner::new(map.into_shared(), config, Footprint::default())
            .unwrap_err();
        assert!(matches!(err, PlannerError::LoadError { .. }));
    }

    #[test]
    fn test_failed_reconfiguration_keeps_old_config() {
        let map = Costmap::new(10, 10, 1.0, WorldPoint::ZERO);
        let planner = planner_on(map, "keep_old_config");
        let before = planner.config();

        let err = planner
            .update_parameters(&[
                ("reverse_penalty", ParamValue::Float(9.0)),
                ("lattice_filepath", ParamValue::Str("/nonexistent.json".into())),
            ])
            .unwrap_err();
        assert!(matches!(err, PlannerError::LoadError { .. }));

        // Nothing from the failed batch landed
        let after = planner.config();
        assert_eq!(after.reverse_penalty, before.reverse_penalty);
        assert_eq!(after.lattice_filepath, before.lattice_filepath);

        // And planning still works on the old configuration
        assert!(planner
            .plan(Pose2D::new(1.5, 1.5, 0.0), Pose2D::new(5.5, 1.5, 0.0))
            .is_ok());
    }

    #[test]
    fn test_update_parameters_applies() {
        let map = Costmap::new(10, 10, 1.0, WorldPoint::ZERO);
        let planner = planner_on(map, "update_applies");

        planner
            .update_parameters(&[
                ("cost_penalty", ParamValue::Float(3.0)),
                ("allow_unknown", ParamValue::Bool(false)),
                ("max_iterations", ParamValue::Int(0)),
            ])
            .unwrap();

        let config = planner.config();
        assert_eq!(config.cost_penalty, 3.0);
        assert!(!config.allow_unknown);
        assert_eq!(config.effective_max_iterations(), usize::MAX);
    }

    #[test]
    fn test_lookup_table_dim_realized_odd() {
        let map = Costmap::new(10, 10, 1.0, WorldPoint::ZERO);
        let planner = planner_on(map, "odd_dim");
        // 20m window at 1m resolution: 20 cells, realized as 21
        assert_eq!(planner.lookup_table_dim(), 21);
    }

    #[test]
    fn test_occupied_goal_rejected() {
        let mut map = Costmap::new(10, 10, 1.0, WorldPoint::ZERO);
        map.set_cost(GridCoord::new(7, 7), costs::LETHAL);
        let planner = planner_on(map, "occupied_goal");

        let err = planner
            .plan(Pose2D::new(1.5, 1.5, 0.0), Pose2D::new(7.5, 7.5, 0.0))
            .unwrap_err();
        assert_eq!(err, PlannerError::InvalidGoal);
    }
}
