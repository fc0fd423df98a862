//! Dubins shortest paths for analytic goal expansion.
//!
//! A Dubins path is the shortest route for a forward-only vehicle with a
//! minimum turning radius: at most three segments, each a left arc (L), a
//! right arc (R), or a straight line (S). All six words are evaluated and
//! the shortest feasible one wins.

use crate::core::math::mod2pi;
use crate::core::Pose2D;

/// Segment kind within a Dubins word.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Segment {
    Left,
    Straight,
    Right,
}

use Segment::{Left, Right, Straight};

/// A computed Dubins connection.
#[derive(Clone, Debug)]
pub struct DubinsPath {
    start: Pose2D,
    radius: f32,
    segments: [Segment; 3],
    /// Segment lengths normalized by the radius.
    lengths: [f32; 3],
}

impl DubinsPath {
    /// Total path length (same units as the radius).
    #[inline]
    pub fn length(&self) -> f32 {
        (self.lengths[0] + self.lengths[1] + self.lengths[2]) * self.radius
    }

    /// Sample poses along the path at roughly `step` spacing.
    ///
    /// The start pose is excluded; the final sample lands on the goal.
    pub fn sample(&self, step: f32) -> Vec<Pose2D> {
        let mut poses = Vec::new();
        let mut x = self.start.x;
        let mut y = self.start.y;
        let mut theta = self.start.theta;

        for (segment, &normalized) in self.segments.iter().zip(&self.lengths) {
            let length = normalized * self.radius;
            if length < 1e-6 {
                continue;
            }
            let steps = (length / step).ceil().max(1.0) as usize;
            let ds = length / steps as f32;
            for _ in 0..steps {
                match segment {
                    Straight => {
                        x += ds * theta.cos();
                        y += ds * theta.sin();
                    }
                    Left => {
                        let next = theta + ds / self.radius;
                        x += self.radius * (next.sin() - theta.sin());
                        y -= self.radius * (next.cos() - theta.cos());
                        theta = next;
                    }
                    Right => {
                        let next = theta - ds / self.radius;
                        x -= self.radius * (next.sin() - theta.sin());
                        y += self.radius * (next.cos() - theta.cos());
                        theta = next;
                    }
                }
                poses.push(Pose2D::new(x, y, theta));
            }
        }
        poses
    }
}

/// Shortest Dubins path between two poses, or `None` when the poses
/// coincide too closely to need one.
pub fn shortest_path(start: Pose2D, goal: Pose2D, radius: f32) -> Option<DubinsPath> {
    let dx = goal.x - start.x;
    let dy = goal.y - start.y;
    let dist = (dx * dx + dy * dy).sqrt();

    let d = dist / radius;
    let phi = dy.atan2(dx);
    let alpha = mod2pi(start.theta - phi);
    let beta = mod2pi(goal.theta - phi);

    let words: [(fn(f32, f32, f32) -> Option<[f32; 3]>, [Segment; 3]); 6] = [
        (lsl, [Left, Straight, Left]),
        (rsr, [Right, Straight, Right]),
        (lsr, [Left, Straight, Right]),
        (rsl, [Right, Straight, Left]),
        (rlr, [Right, Left, Right]),
        (lrl, [Left, Right, Left]),
    ];

    let mut best: Option<DubinsPath> = None;
    for (word, segments) in words {
        if let Some(lengths) = word(d, alpha, beta) {
            let total = lengths[0] + lengths[1] + lengths[2];
            if best
                .as_ref()
                .map(|b| total * radius < b.length())
                .unwrap_or(true)
            {
                best = Some(DubinsPath {
                    start,
                    radius,
                    segments,
                    lengths,
                });
            }
        }
    }
    best
}

fn lsl(d: f32, alpha: f32, beta: f32) -> Option<[f32; 3]> {
    let (sa, ca) = alpha.sin_cos();
    let (sb, cb) = beta.sin_cos();
    let p_sq = 2.0 + d * d - 2.0 * (ca * cb + sa * sb - d * (sa - sb));
    if p_sq < 0.0 {
        return None;
    }
    let theta = (cb - ca).atan2(d + sa - sb);
    Some([mod2pi(-alpha + theta), p_sq.sqrt(), mod2pi(beta - theta)])
}

fn rsr(d: f32, alpha: f32, beta: f32) -> Option<[f32; 3]> {
    let (sa, ca) = alpha.sin_cos();
    let (sb, cb) = beta.sin_cos();
    let p_sq = 2.0 + d * d - 2.0 * (ca * cb + sa * sb - d * (sb - sa));
    if p_sq < 0.0 {
        return None;
    }
    let theta = (ca - cb).atan2(d - sa + sb);
    Some([mod2pi(alpha - theta), p_sq.sqrt(), mod2pi(-beta + theta)])
}

fn lsr(d: f32, alpha: f32, beta: f32) -> Option<[f32; 3]> {
    let (sa, ca) = alpha.sin_cos();
    let (sb, cb) = beta.sin_cos();
    let p_sq = -2.0 + d * d + 2.0 * (ca * cb + sa * sb + d * (sa + sb));
    if p_sq < 0.0 {
        return None;
    }
    let p = p_sq.sqrt();
    let theta = (-ca - cb).atan2(d + sa + sb) - (-2.0f32).atan2(p);
    Some([mod2pi(-alpha + theta), p, mod2pi(-beta + theta)])
}

fn rsl(d: f32, alpha: f32, beta: f32) -> Option<[f32; 3]> {
    let (sa, ca) = alpha.sin_cos();
    let (sb, cb) = beta.sin_cos();
    let p_sq = -2.0 + d * d + 2.0 * (ca * cb + sa * sb - d * (sa + sb));
    if p_sq < 0.0 {
        return None;
    }
    let p = p_sq.sqrt();
    let theta = (ca + cb).atan2(d - sa - sb) - 2.0f32.atan2(p);
    Some([mod2pi(alpha - theta), p, mod2pi(beta - theta)])
}

fn rlr(d: f32, alpha: f32, beta: f32) -> Option<[f32; 3]> {
    let (sa, ca) = alpha.sin_cos();
    let (sb, cb) = beta.sin_cos();
    let tmp = (6.0 - d * d + 2.0 * (ca * cb + sa * sb + d * (sa - sb))) / 8.0;
    if tmp.abs() > 1.0 {
        return None;
    }
    let p = mod2pi(2.0 * std::f32::consts::PI - tmp.acos());
    let theta = (ca - cb).atan2(d - sa + sb);
    let t = mod2pi(alpha - theta + p / 2.0);
    Some([t, p, mod2pi(alpha - beta - t + p)])
}

fn lrl(d: f32, alpha: f32, beta: f32) -> Option<[f32; 3]> {
    let (sa, ca) = alpha.sin_cos();
    let (sb, cb) = beta.sin_cos();
    let tmp = (6.0 - d * d + 2.0 * (ca * cb + sa * sb - d * (sa - sb))) / 8.0;
    if tmp.abs() > 1.0 {
        return None;
    }
    let p = mod2pi(2.0 * std::f32::consts::PI - tmp.acos());
    let theta = (cb - ca).atan2(d + sa - sb);
    let t = mod2pi(-alpha + theta + p / 2.0);
    Some([t, p, mod2pi(mod2pi(beta) - alpha - t + mod2pi(p))])
}
