//! Occupancy cost grid consumed by the planner.
//!
//! The planner only reads the grid: per-cell traversal cost, resolution,
//! and world↔grid conversion. Map maintenance (sensor fusion, inflation)
//! happens upstream; whoever owns the map shares it as a [`SharedCostmap`]
//! and the planner holds the read lock for the duration of a search.

use std::sync::{Arc, RwLock};

use crate::core::{GridCoord, WorldPoint};

/// Cost bands for path planning.
pub mod costs {
    /// Safe to traverse, no penalty.
    pub const FREE: u8 = 0;
    /// Highest cost that is still not an obstacle.
    pub const MAX_NON_OBSTACLE: u8 = 252;
    /// Within the robot's inscribed radius of an obstacle, blocked.
    pub const INSCRIBED: u8 = 253;
    /// Obstacle cell, blocked.
    pub const LETHAL: u8 = 254;
    /// Not yet observed; traversable only when the caller allows it.
    pub const UNKNOWN: u8 = 255;
}

/// Occupancy cost grid.
///
/// Cell (x, y) covers the square from `origin + (x, y) * resolution` to
/// `origin + (x + 1, y + 1) * resolution`; conversions return cell centers.
#[derive(Clone, Debug)]
pub struct Costmap {
    costs: Vec<u8>,
    width: usize,
    height: usize,
    resolution: f32,
    origin: WorldPoint,
}

/// Shared handle guarding the grid against mutation during a search.
pub type SharedCostmap = Arc<RwLock<Costmap>>;

impl Costmap {
    /// Create a grid with every cell free.
    pub fn new(width: usize, height: usize, resolution: f32, origin: WorldPoint) -> Self {
        Self {
            costs: vec![costs::FREE; width * height],
            width,
            height,
            resolution,
            origin,
        }
    }

    /// Wrap a costmap in a shared read-write handle.
    pub fn into_shared(self) -> SharedCostmap {
        Arc::new(RwLock::new(self))
    }

    /// Grid width in cells.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Grid height in cells.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Resolution in meters per cell.
    #[inline]
    pub fn resolution(&self) -> f32 {
        self.resolution
    }

    /// World coordinates of the grid corner.
    #[inline]
    pub fn origin(&self) -> WorldPoint {
        self.origin
    }

    /// Whether a coordinate lies on the grid.
    #[inline]
    pub fn is_valid_coord(&self, coord: GridCoord) -> bool {
        coord.x >= 0
            && coord.y >= 0
            && (coord.x as usize) < self.width
            && (coord.y as usize) < self.height
    }

    /// Cost at a coordinate. Out-of-bounds cells read as lethal.
    #[inline]
    pub fn cost(&self, coord: GridCoord) -> u8 {
        if !self.is_valid_coord(coord) {
            return costs::LETHAL;
        }
        self.costs[coord.y as usize * self.width + coord.x as usize]
    }

    /// Set the cost of a cell. Out-of-bounds writes are ignored.
    pub fn set_cost(&mut self, coord: GridCoord, cost: u8) {
        if self.is_valid_coord(coord) {
            self.costs[coord.y as usize * self.width + coord.x as usize] = cost;
        }
    }

    /// Convert world coordinates to the containing cell.
    #[inline]
    pub fn world_to_grid(&self, point: WorldPoint) -> GridCoord {
        let x = ((point.x - self.origin.x) / self.resolution).floor() as i32;
        let y = ((point.y - self.origin.y) / self.resolution).floor() as i32;
        GridCoord::new(x, y)
    }

    /// Convert a cell to world coordinates (cell center).
    #[inline]
    pub fn grid_to_world(&self, coord: GridCoord) -> WorldPoint {
        WorldPoint::new(
            self.origin.x + (coord.x as f32 + 0.5) * self.resolution,
            self.origin.y + (coord.y as f32 + 0.5) * self.resolution,
        )
    }
}
