//! Smoothing handoff for raw planner paths.
//!
//! The planner hands the downstream smoother a raw path, the read-locked
//! grid, and whatever is left of the planning time budget; the smoother
//! returns the path possibly unchanged when the margin is insufficient.

use std::time::{Duration, Instant};

use crate::core::{Pose2D, WorldPoint};
use crate::costmap::Costmap;

/// Downstream path smoother.
pub trait Smoother: Send {
    /// Smooth a world-frame path in place within the remaining budget.
    ///
    /// Returns whether the path was modified. Implementations must leave
    /// the path untouched when the budget does not allow finishing.
    fn smooth(&self, costmap: &Costmap, path: &mut Vec<Pose2D>, budget: Duration) -> bool;
}

/// Waypoint reducer dropping near-collinear interior poses.
///
/// Removing collinear waypoints cannot bend the path off the primitives it
/// was built from, so the result stays kinematically feasible; anything
/// stronger belongs in an external smoother implementation.
#[derive(Clone, Debug)]
pub struct SimplifySmoother {
    /// Maximum perpendicular deviation for a dropped waypoint, meters.
    pub tolerance: f32,
}

impl Default for SimplifySmoother {
    fn default() -> Self {
        Self { tolerance: 0.01 }
    }
}

/// Minimum budget worth starting a smoothing pass.
const MIN_BUDGET: Duration = Duration::from_micros(500);

impl Smoother for SimplifySmoother {
    fn smooth(&self, _costmap: &Costmap, path: &mut Vec<Pose2D>, budget: Duration) -> bool {
        if budget < MIN_BUDGET || path.len() <= 2 {
            return false;
        }
        let started = Instant::now();

        let mut result = vec![path[0]];
        for i in 1..path.len() - 1 {
            if started.elapsed() >= budget {
                // Out of time mid-pass: report the path unchanged
                return false;
            }
            let prev = result.last().unwrap().position();
            let next = path[i + 1].position();
            if point_to_line_distance(path[i].position(), prev, next) > self.tolerance {
                result.push(path[i]);
            }
        }
        result.push(*path.last().unwrap());

        let changed = result.len() != path.len();
        if changed {
            *path = result;
        }
        changed
    }
}

/// Perpendicular distance from a point to a segment.
fn point_to_line_distance(point: WorldPoint, line_start: WorldPoint, line_end: WorldPoint) -> f32 {
    let dx = line_end.x - line_start.x;
    let dy = line_end.y - line_start.y;
    let length_sq = dx * dx + dy * dy;

    if length_sq < 1e-8 {
        return point.distance(&line_start);
    }

    let t = ((point.x - line_start.x) * dx + (point.y - line_start.y) * dy) / length_sq;
    let t = t.clamp(0.0, 1.0);
    let proj = WorldPoint::new(line_start.x + t * dx, line_start.y + t * dy);
    point.distance(&proj)
}

/// Total path length in meters.
pub fn path_length(path: &[Pose2D]) -> f32 {
    if path.len() < 2 {
        return 0.0;
    }
    path.windows(2)
        .map(|w| w[0].position().distance(&w[1].position()))
        .sum()
}
