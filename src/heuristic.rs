//! Windowed cost-to-go table centered on the goal.
//!
//! Precomputes obstacle-aware distances over a square neighborhood of the
//! goal cell; outside the window (or where the window is unreachable) the
//! estimate falls back to straight-line distance. Either way the estimate
//! never exceeds the true remaining cost, which best-first ordering
//! depends on.

use std::collections::VecDeque;

use log::debug;

use crate::collision::GridCollisionChecker;
use crate::core::GridCoord;
use crate::costmap::Costmap;

/// 8-connected distances overestimate a straight free-space path by up to
/// 1/cos(π/8); scaling by cos(π/8) keeps the table admissible.
const GRID_TO_EUCLIDEAN: f32 = 0.923_879_5;

const SQRT2: f32 = std::f32::consts::SQRT_2;

/// Precomputed cost-to-go window around the goal.
#[derive(Clone, Debug)]
pub struct HeuristicTable {
    dim: usize,
    cache_enabled: bool,
    values: Vec<f32>,
    computed_goal: Option<GridCoord>,
}

impl HeuristicTable {
    /// Create a table of the given window dimension (cells).
    ///
    /// The dimension is forced odd so a center cell exists for the goal.
    pub fn new(dim: usize, cache_enabled: bool) -> Self {
        let dim = if dim % 2 == 0 { dim + 1 } else { dim };
        Self {
            dim,
            cache_enabled,
            values: Vec::new(),
            computed_goal: None,
        }
    }

    /// Realized window dimension (always odd).
    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Recompute the window for a goal cell.
    ///
    /// With caching enabled, a window already computed for the same goal
    /// cell is reused — a performance trade that assumes the map region has
    /// not changed between consecutive plans.
    pub fn recompute(
        &mut self,
        costmap: &Costmap,
        checker: &GridCollisionChecker,
        goal: GridCoord,
        traverse_unknown: bool,
    ) {
        if self.cache_enabled
            && self.computed_goal == Some(goal)
            && self.values.len() == self.dim * self.dim
        {
            debug!("[HeuristicTable] reusing cached window for goal ({}, {})", goal.x, goal.y);
            return;
        }

        let dim = self.dim;
        let half = (dim / 2) as i32;
        self.values.clear();
        self.values.resize(dim * dim, f32::INFINITY);

        let center = (dim / 2) * dim + dim / 2;
        self.values[center] = 0.0;

        // Queue relaxation from the goal outward; blocked cells stay
        // unreachable so estimates route around walls inside the window.
        let neighbors: [(i32, i32, f32); 8] = [
            (-1, 0, 1.0),
            (1, 0, 1.0),
            (0, -1, 1.0),
            (0, 1, 1.0),
            (-1, -1, SQRT2),
            (1, -1, SQRT2),
            (-1, 1, SQRT2),
            (1, 1, SQRT2),
        ];
        let mut queue = VecDeque::new();
        queue.push_back((half, half));

        while let Some((wx, wy)) = queue.pop_front() {
            let current = self.values[wy as usize * dim + wx as usize];
            for &(dx, dy, step) in &neighbors {
                let nx = wx + dx;
                let ny = wy + dy;
                if nx < 0 || ny < 0 || nx >= dim as i32 || ny >= dim as i32 {
                    continue;
                }
                let idx = ny as usize * dim + nx as usize;
                let new_dist = current + step;
                if new_dist >= self.values[idx] {
                    continue;
                }
                let map_x = goal.x + nx - half;
                let map_y = goal.y + ny - half;
                if checker.in_collision_fast(
                    costmap,
                    map_x as f32,
                    map_y as f32,
                    traverse_unknown,
                ) {
                    continue;
                }
                self.values[idx] = new_dist;
                queue.push_back((nx, ny));
            }
        }

        for value in &mut self.values {
            if value.is_finite() {
                *value *= GRID_TO_EUCLIDEAN;
            }
        }
        self.computed_goal = Some(goal);
    }

    /// Admissible cost-to-go estimate from a cell, in cells.
    pub fn estimate(&self, from: GridCoord, goal: GridCoord) -> f32 {
        let euclidean = from.distance(&goal);
        let half = (self.dim / 2) as i32;
        let wx = from.x - goal.x + half;
        let wy = from.y - goal.y + half;
        if wx >= 0 && wy >= 0 && (wx as usize) < self.dim && (wy as usize) < self.dim {
            if let Some(&value) = self.values.get(wy as usize * self.dim + wx as usize) {
                if value.is_finite() {
                    return euclidean.max(value);
                }
            }
        }
        euclidean
    }
}
