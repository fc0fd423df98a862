//! Footprint collision checking against the cost grid.

use std::f32::consts::PI;

use crate::core::math::mod2pi;
use crate::core::GridCoord;
use crate::costmap::{costs, Costmap};

use super::footprint::Footprint;

/// Number of orientation bins used for collision sampling.
///
/// 72 bins give 5° steps — finer than any practical lattice heading count,
/// so intermediate poses along a primitive keep near-continuous heading
/// fidelity no matter how coarse the lattice is.
pub const NUM_ORIENTATION_BINS: usize = 72;

/// Collision checker sampling the robot footprint on the cost grid.
///
/// Positions are in continuous cell units (integer values are cell
/// centers); orientations are one of [`NUM_ORIENTATION_BINS`] fine bins.
#[derive(Clone, Debug)]
pub struct GridCollisionChecker {
    resolution: f32,
    bin_size: f32,
    footprint: Footprint,
    /// Rotated polygon outline per orientation bin, in cell units.
    oriented_outlines: Vec<Vec<(f32, f32)>>,
}

impl GridCollisionChecker {
    /// Create a checker for a grid of the given resolution.
    pub fn new(resolution: f32, footprint: Footprint) -> Self {
        let mut checker = Self {
            resolution,
            bin_size: 2.0 * PI / NUM_ORIENTATION_BINS as f32,
            footprint: Footprint::default(),
            oriented_outlines: Vec::new(),
        };
        checker.set_footprint(footprint);
        checker
    }

    /// Replace the footprint, precomputing its outline for every
    /// orientation bin.
    pub fn set_footprint(&mut self, footprint: Footprint) {
        self.oriented_outlines.clear();
        if !footprint.use_radius() {
            self.oriented_outlines.reserve(NUM_ORIENTATION_BINS);
            for bin in 0..NUM_ORIENTATION_BINS {
                let angle = bin as f32 * self.bin_size;
                let (sin, cos) = angle.sin_cos();
                let outline = footprint
                    .points()
                    .iter()
                    .map(|p| {
                        (
                            (p.x * cos - p.y * sin) / self.resolution,
                            (p.x * sin + p.y * cos) / self.resolution,
                        )
                    })
                    .collect();
                self.oriented_outlines.push(outline);
            }
        }
        self.footprint = footprint;
    }

    /// The active footprint.
    #[inline]
    pub fn footprint(&self) -> &Footprint {
        &self.footprint
    }

    /// Nearest orientation bin for a continuous angle.
    #[inline]
    pub fn angle_bin(&self, angle: f32) -> usize {
        let scaled = mod2pi(angle) / self.bin_size;
        let lower = scaled.floor();
        let bin = if scaled - lower > 0.5 { lower + 1.0 } else { lower };
        bin as usize % NUM_ORIENTATION_BINS
    }

    /// Center angle of an orientation bin.
    #[inline]
    pub fn bin_angle(&self, bin: usize) -> f32 {
        bin as f32 * self.bin_size
    }

    /// Whether a pose collides. See [`Self::footprint_cost`].
    #[inline]
    pub fn in_collision(
        &self,
        costmap: &Costmap,
        x: f32,
        y: f32,
        bin: usize,
        traverse_unknown: bool,
    ) -> bool {
        self.footprint_cost(costmap, x, y, bin, traverse_unknown)
            .is_none()
    }

    /// Full footprint check at a pose in cell units.
    ///
    /// Returns `None` on collision, otherwise the center-cell cost (unknown
    /// cells traversed as free read as zero). A center cost below the
    /// circumscribed cost proves the footprint clear without the sweep;
    /// otherwise the polygon outline is rasterized cell by cell. Only the
    /// outline is walked — obstacles strictly inside the footprint are the
    /// inflation layer's job to surface as inscribed center costs.
    pub fn footprint_cost(
        &self,
        costmap: &Costmap,
        x: f32,
        y: f32,
        bin: usize,
        traverse_unknown: bool,
    ) -> Option<f32> {
        let cell = GridCoord::new(x.round() as i32, y.round() as i32);
        if !costmap.is_valid_coord(cell) {
            return None;
        }

        let center = costmap.cost(cell);
        if center == costs::UNKNOWN && !traverse_unknown {
            return None;
        }
        if center >= costs::INSCRIBED && center != costs::UNKNOWN {
            return None;
        }
        let center_cost = if center == costs::UNKNOWN {
            0.0
        } else {
            center as f32
        };

        // Radius robots rely on the inflation layer: a center below the
        // inscribed band means the circle fits.
        if self.footprint.use_radius() {
            return Some(center_cost);
        }

        // Circumscribed pre-check: cheap accept before the outline sweep.
        if center != costs::UNKNOWN && center < self.footprint.circumscribed_cost() {
            return Some(center_cost);
        }

        let outline = &self.oriented_outlines[bin];
        if outline.len() < 2 {
            return Some(center_cost);
        }
        for i in 0..outline.len() {
            let (ax, ay) = outline[i];
            let (bx, by) = outline[(i + 1) % outline.len()];
            let from = GridCoord::new((x + ax).round() as i32, (y + ay).round() as i32);
            let to = GridCoord::new((x + bx).round() as i32, (y + by).round() as i32);
            if self.edge_blocked(costmap, from, to, traverse_unknown) {
                return None;
            }
        }
        Some(center_cost)
    }

    /// Center-cost pre-check only: rejects impossible cells without the
    /// footprint sweep. `true` means definitely in collision; `false` is
    /// not a guarantee for polygon footprints near obstacles.
    #[inline]
    pub fn in_collision_fast(
        &self,
        costmap: &Costmap,
        x: f32,
        y: f32,
        traverse_unknown: bool,
    ) -> bool {
        let cell = GridCoord::new(x.round() as i32, y.round() as i32);
        if !costmap.is_valid_coord(cell) {
            return true;
        }
        let cost = costmap.cost(cell);
        if cost == costs::UNKNOWN {
            return !traverse_unknown;
        }
        cost >= costs::INSCRIBED
    }

    /// Walk the cells of one outline edge with Bresenham's algorithm.
    fn edge_blocked(
        &self,
        costmap: &Costmap,
        from: GridCoord,
        to: GridCoord,
        traverse_unknown: bool,
    ) -> bool {
        let mut x0 = from.x;
        let mut y0 = from.y;
        let dx = (to.x - x0).abs();
        let dy = (to.y - y0).abs();
        let sx = if x0 < to.x { 1 } else { -1 };
        let sy = if y0 < to.y { 1 } else { -1 };
        let mut err = dx - dy;

        loop {
            let cost = costmap.cost(GridCoord::new(x0, y0));
            if cost >= costs::LETHAL && !(cost == costs::UNKNOWN && traverse_unknown) {
                return true;
            }

            if x0 == to.x && y0 == to.y {
                break;
            }

            let e2 = 2 * err;
            if e2 > -dy {
                err -= dy;
                x0 += sx;
            }
            if e2 < dx {
                err += dx;
                y0 += sy;
            }
        }

        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::WorldPoint;

    fn open_map() -> Costmap {
        Costmap::new(20, 20, 1.0, WorldPoint::ZERO)
    }

    fn square_footprint() -> Footprint {
        Footprint::polygon(
            vec![
                WorldPoint::new(1.5, 1.5),
                WorldPoint::new(1.5, -1.5),
                WorldPoint::new(-1.5, -1.5),
                WorldPoint::new(-1.5, 1.5),
            ],
            0,
        )
    }

    #[test]
    fn test_free_pose_is_clear() {
        let map = open_map();
        let checker = GridCollisionChecker::new(1.0, Footprint::circular(0.5, 0));
        assert_eq!(checker.footprint_cost(&map, 10.0, 10.0, 0, false), Some(0.0));
    }

    #[test]
    fn test_lethal_center_collides() {
        let mut map = open_map();
        map.set_cost(GridCoord::new(10, 10), costs::LETHAL);
        let checker = GridCollisionChecker::new(1.0, Footprint::circular(0.5, 0));
        assert!(checker.in_collision(&map, 10.0, 10.0, 0, false));
    }

    #[test]
    fn test_unknown_follows_flag() {
        let mut map = open_map();
        map.set_cost(GridCoord::new(5, 5), costs::UNKNOWN);
        let checker = GridCollisionChecker::new(1.0, Footprint::circular(0.5, 0));
        assert!(checker.in_collision(&map, 5.0, 5.0, 0, false));
        assert_eq!(checker.footprint_cost(&map, 5.0, 5.0, 0, true), Some(0.0));
    }

    #[test]
    fn test_polygon_sweep_catches_outline_obstacle() {
        let mut map = open_map();
        // Obstacle under the footprint outline but away from the center cell
        map.set_cost(GridCoord::new(12, 10), costs::LETHAL);
        let checker = GridCollisionChecker::new(1.0, square_footprint());
        assert!(checker.in_collision(&map, 10.0, 10.0, 0, false));
        // Far enough away the footprint no longer reaches it
        assert!(!checker.in_collision(&map, 7.0, 10.0, 0, false));
    }

    #[test]
    fn test_orientation_matters_for_asymmetric_footprint() {
        let mut map = open_map();
        map.set_cost(GridCoord::new(13, 10), costs::LETHAL);
        // Long thin footprint reaching 3 cells forward, 0.4 sideways
        let fp = Footprint::polygon(
            vec![
                WorldPoint::new(3.2, 0.4),
                WorldPoint::new(3.2, -0.4),
                WorldPoint::new(-0.4, -0.4),
                WorldPoint::new(-0.4, 0.4),
            ],
            0,
        );
        let checker = GridCollisionChecker::new(1.0, fp);
        // Facing the obstacle: the nose reaches it
        let bin_forward = checker.angle_bin(0.0);
        assert!(checker.in_collision(&map, 10.0, 10.0, bin_forward, false));
        // Facing away: clear
        let bin_back = checker.angle_bin(std::f32::consts::PI);
        assert!(!checker.in_collision(&map, 10.0, 10.0, bin_back, false));
    }

    #[test]
    fn test_circumscribed_pre_check_accepts_low_cost() {
        let mut map = open_map();
        for y in 0..20 {
            for x in 0..20 {
                map.set_cost(GridCoord::new(x, y), 10);
            }
        }
        let mut fp = square_footprint();
        fp = Footprint::polygon(fp.points().to_vec(), 50);
        let checker = GridCollisionChecker::new(1.0, fp);
        // Center cost 10 < circumscribed 50: accepted without sweep
        assert_eq!(checker.footprint_cost(&map, 10.0, 10.0, 0, false), Some(10.0));
    }

    #[test]
    fn test_fast_check_center_only() {
        let mut map = open_map();
        map.set_cost(GridCoord::new(11, 10), costs::LETHAL);
        let checker = GridCollisionChecker::new(1.0, square_footprint());
        // Center-only check cannot see the offset obstacle
        assert!(!checker.in_collision_fast(&map, 10.0, 10.0, false));
        assert!(checker.in_collision_fast(&map, 11.0, 10.0, false));
        assert!(checker.in_collision_fast(&map, -1.0, 0.0, false));
    }

    #[test]
    fn test_angle_bin_wraps() {
        let checker = GridCollisionChecker::new(1.0, Footprint::default());
        assert_eq!(checker.angle_bin(0.0), 0);
        assert_eq!(checker.angle_bin(2.0 * std::f32::consts::PI - 0.01), 0);
        let quarter = checker.angle_bin(std::f32::consts::FRAC_PI_2);
        assert_eq!(quarter, NUM_ORIENTATION_BINS / 4);
    }
}
