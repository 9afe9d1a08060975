use crate::{Interval, Vec3};

/// A ray in 3D space with origin, direction and a valid parameter range.
///
/// Points along the ray are `origin + t * direction` for `t` in `bounds`.
/// The direction is not required to be normalized.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
    pub bounds: Interval,
}

impl Ray {
    /// Create a ray covering `[0, +inf)`.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction,
            bounds: Interval::FORWARD,
        }
    }

    /// Create a ray restricted to `[bounds.min, bounds.max]`.
    pub fn with_bounds(origin: Vec3, direction: Vec3, bounds: Interval) -> Self {
        Self {
            origin,
            direction,
            bounds,
        }
    }

    /// Get the point along the ray at parameter t.
    ///
    /// Returns: origin + t * direction
    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}
