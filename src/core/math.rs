//! Angle helpers shared by the lattice, collision, and analytic modules.

use std::f32::consts::PI;

const TWO_PI: f32 = 2.0 * PI;

/// Normalize an angle to [-π, π).
#[inline]
pub fn normalize_angle(a: f32) -> f32 {
    let mut a = a % TWO_PI;
    if a >= PI {
        a -= TWO_PI;
    } else if a < -PI {
        a += TWO_PI;
    }
    a
}

/// Wrap an angle to [0, 2π).
#[inline]
pub fn mod2pi(a: f32) -> f32 {
    let mut a = a % TWO_PI;
    if a < 0.0 {
        a += TWO_PI;
    }
    a
}
