//! Robot footprint definition for collision checking.

use serde::{Deserialize, Serialize};

use crate::core::WorldPoint;

/// Robot footprint: either a radius or a polygon outline, plus the
/// circumscribed cost used as the cheap conservative pre-check.
///
/// The circumscribed cost is the occupancy cost found at the footprint's
/// circumscribed radius from an obstacle; the map's inflation layer defines
/// it, so the caller supplies it. A value of zero disables the fast-accept
/// path and every pose gets the full sweep.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Footprint {
    /// Polygon vertices in the robot frame, meters. Empty for radius robots.
    points: Vec<WorldPoint>,
    /// Robot radius in meters, used when `use_radius` is set.
    radius: f32,
    /// Whether to treat the robot as a circle of `radius`.
    use_radius: bool,
    /// Cost at the circumscribed radius, for the fast pre-check.
    circumscribed_cost: u8,
}

impl Default for Footprint {
    fn default() -> Self {
        Self::circular(0.17, 0) // CRL-200S robot radius
    }
}

impl Footprint {
    /// Circular footprint.
    pub fn circular(radius: f32, circumscribed_cost: u8) -> Self {
        Self {
            points: Vec::new(),
            radius,
            use_radius: true,
            circumscribed_cost,
        }
    }

    /// Polygon footprint from robot-frame vertices.
    pub fn polygon(points: Vec<WorldPoint>, circumscribed_cost: u8) -> Self {
        Self {
            points,
            radius: 0.0,
            use_radius: false,
            circumscribed_cost,
        }
    }

    /// Whether the footprint is a circle.
    #[inline]
    pub fn use_radius(&self) -> bool {
        self.use_radius
    }

    /// Polygon vertices (empty for circular footprints).
    #[inline]
    pub fn points(&self) -> &[WorldPoint] {
        &self.points
    }

    /// Cost at the circumscribed radius.
    #[inline]
    pub fn circumscribed_cost(&self) -> u8 {
        self.circumscribed_cost
    }

    /// Radius of the smallest circle containing the footprint, meters.
    pub fn circumscribed_radius(&self) -> f32 {
        if self.use_radius {
            self.radius
        } else {
            self.points
                .iter()
                .map(|p| (p.x * p.x + p.y * p.y).sqrt())
                .fold(0.0, f32::max)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circular() {
        let fp = Footprint::circular(0.3, 120);
        assert!(fp.use_radius());
        assert_eq!(fp.circumscribed_cost(), 120);
        assert!((fp.circumscribed_radius() - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_polygon_circumscribed_radius() {
        let fp = Footprint::polygon(
            vec![
                WorldPoint::new(0.4, 0.2),
                WorldPoint::new(0.4, -0.2),
                WorldPoint::new(-0.4, -0.2),
                WorldPoint::new(-0.4, 0.2),
            ],
            60,
        );
        assert!(!fp.use_radius());
        let expected = (0.4f32 * 0.4 + 0.2 * 0.2).sqrt();
        assert!((fp.circumscribed_radius() - expected).abs() < 1e-6);
    }
}
