//! Motion primitive type and pose sampling along a primitive.

use serde::{Deserialize, Serialize};

use crate::core::math::normalize_angle;
use crate::core::Pose2D;

/// Travel direction of a primitive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Driving forward.
    Forward,
    /// Driving in reverse.
    Reverse,
}

/// Curvature class of a primitive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Curvature {
    /// No heading change.
    Straight,
    /// Turning left (CCW).
    Left,
    /// Turning right (CW).
    Right,
}

/// A single precomputed motion, scaled into cell units.
///
/// Deltas are along the world axes for the primitive's start heading, the
/// way lattice files express them; the collection is keyed by start heading
/// in [`super::MotionTable`].
#[derive(Clone, Debug)]
pub struct MotionPrimitive {
    /// Heading bin the motion departs from.
    pub start_heading: usize,
    /// Heading bin the motion arrives at.
    pub end_heading: usize,
    /// X displacement in cells.
    pub delta_x: f32,
    /// Y displacement in cells.
    pub delta_y: f32,
    /// Heading change in radians.
    pub delta_yaw: f32,
    /// Path length in cells.
    pub arc_length: f32,
    /// Travel direction.
    pub direction: Direction,
    /// Curvature class.
    pub curvature: Curvature,
}

impl MotionPrimitive {
    /// Cell offset of the destination lattice vertex.
    #[inline]
    pub fn cell_offset(&self) -> (i32, i32) {
        (self.delta_x.round() as i32, self.delta_y.round() as i32)
    }

    /// Sample poses along the primitive starting from `from` (cell units).
    ///
    /// Positions interpolate the chord while the heading sweeps linearly
    /// from the start heading to `start + delta_yaw`; the last sample lands
    /// exactly on the destination. The start pose itself is not emitted —
    /// it was already validated when its node was expanded.
    pub fn sample_poses(&self, from: Pose2D, step: f32) -> Vec<Pose2D> {
        let samples = (self.arc_length / step).ceil().max(1.0) as usize;
        let mut poses = Vec::with_capacity(samples);
        for i in 1..=samples {
            let t = i as f32 / samples as f32;
            poses.push(Pose2D::new(
                from.x + t * self.delta_x,
                from.y + t * self.delta_y,
                normalize_angle(from.theta + t * self.delta_yaw),
            ));
        }
        poses
    }
}
