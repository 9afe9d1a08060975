//! Warps from the unit square to sampling domains.

use crate::{Vec2, Vec3};
use std::f32::consts::{FRAC_PI_2, FRAC_PI_4};

/// Shirley-Chiu concentric map from `[0,1]^2` to the unit disk.
pub fn square_to_uniform_disk_concentric(sample: Vec2) -> Vec2 {
    let r1 = 2.0 * sample.x - 1.0;
    let r2 = 2.0 * sample.y - 1.0;

    if r1 == 0.0 && r2 == 0.0 {
        return Vec2::ZERO;
    }

    let (r, phi) = if r1 * r1 > r2 * r2 {
        (r1, FRAC_PI_4 * (r2 / r1))
    } else {
        (r2, FRAC_PI_2 - (r1 / r2) * FRAC_PI_4)
    };

    Vec2::new(r * phi.cos(), r * phi.sin())
}

/// Cosine-weighted direction on the +Z hemisphere (Malley's method).
pub fn square_to_cosine_hemisphere(sample: Vec2) -> Vec3 {
    let p = square_to_uniform_disk_concentric(sample);
    let z = (1.0 - p.x * p.x - p.y * p.y).max(0.0).sqrt();
    Vec3::new(p.x, p.y, z)
}
