//! Angular math primitives.

use std::f32::consts::PI;

/// Wrap an angle into `[-π, π]`.
///
/// Heading accumulates raw radians across steering steps; wrap before
/// comparing two headings or the comparison can be off by a full turn.
///
/// # Example
/// ```
/// use stellar_nav::core::math::normalize_angle;
/// use std::f32::consts::PI;
///
/// assert!((normalize_angle(3.0 * PI) - PI).abs() < 1e-6);
/// assert!((normalize_angle(-3.0 * PI) - (-PI)).abs() < 1e-6);
/// ```
#[inline]
pub fn normalize_angle(angle: f32) -> f32 {
    let mut a = angle % (2.0 * PI);
    if a > PI {
        a -= 2.0 * PI;
    } else if a < -PI {
        a += 2.0 * PI;
    }
    a
}

/// Signed offset that rotates angle `a` onto angle `b` the short way
/// around the circle. Always in `[-π, π]`.
#[inline]
pub fn angle_diff(a: f32, b: f32) -> f32 {
    normalize_angle(b - a)
}
