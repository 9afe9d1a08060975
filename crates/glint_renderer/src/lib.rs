//! Glint Renderer - progressive direct illumination
//!
//! One primary ray per pixel per frame, one Monte Carlo sample per light,
//! averaged over successive frames until the camera moves.

pub mod backend;
mod bsdf;
mod builder;
mod camera;
mod display;
mod light;
mod renderer;

pub use backend::{
    BackendError, BvhBackend, BvhScene, CommittedScene, GeometryId, IntersectionBackend,
    SurfaceHit,
};
#[cfg(feature = "embree")]
pub use backend::{EmbreeBackend, EmbreeScene};
pub use bsdf::{Bsdf, BsdfQuery, Lambertian, Microfacet};
pub use builder::{MaterialTable, Scene, SceneAndCamera, SceneBuilder};
pub use camera::Camera;
pub use display::{encode_srgb8, to_srgb, DisplayBuffer};
pub use light::{Light, LightSet, ShadowTest};
pub use renderer::{CameraDelta, FrameReport, RenderConfig, Renderer, SceneShadowTest};

/// Re-export Vec3 and common math types from glint_math
pub use glint_math::{Aabb, Interval, Ray, Vec3};

use rand::RngCore;

/// Linear RGB radiance or reflectance
pub type Color = Vec3;

/// Uniform `f32` in `[0, 1)` from a type-erased RNG.
#[inline]
pub fn gen_f32(rng: &mut dyn RngCore) -> f32 {
    (rng.next_u32() >> 8) as f32 * (1.0 / (1u32 << 24) as f32)
}

#[cfg(test)]
pub(crate) mod test_util {
    use rand::RngCore;

    /// RNG that always yields the same word; `0x8000_0000` makes
    /// `gen_f32` return exactly 0.5.
    pub struct FixedRng(pub u32);

    impl RngCore for FixedRng {
        fn next_u32(&mut self) -> u32 {
            self.0
        }

        fn next_u64(&mut self) -> u64 {
            ((self.0 as u64) << 32) | self.0 as u64
        }

        fn fill_bytes(&mut self, dest: &mut [u8]) {
            for chunk in dest.chunks_mut(4) {
                let bytes = self.0.to_le_bytes();
                chunk.copy_from_slice(&bytes[..chunk.len()]);
            }
        }

        fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
            self.fill_bytes(dest);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_gen_f32_range() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1000 {
            let x = gen_f32(&mut rng);
            assert!((0.0..1.0).contains(&x));
        }
    }

    #[test]
    fn test_gen_f32_fixed_midpoint() {
        let mut rng = test_util::FixedRng(0x8000_0000);
        assert_eq!(gen_f32(&mut rng), 0.5);

        let mut rng = test_util::FixedRng(u32::MAX);
        assert!(gen_f32(&mut rng) < 1.0);
    }
}
