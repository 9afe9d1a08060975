//! Light sources and their single-sample direct lighting estimators.

use std::f32::consts::PI;

use glint_math::{warp, Frame, Mat4, Mat4Ext, Vec2, Vec3};
use rand::RngCore;

use crate::bsdf::{Bsdf, BsdfQuery};
use crate::{gen_f32, Color};

/// Distance from the shading point to the ambient occlusion probe target.
const AMBIENT_PROBE_DISTANCE: f32 = 4.0;

/// Visibility query from a shading point.
///
/// `unoccluded(target, max_range)` is true when nothing blocks the segment
/// from the shading point towards `target`, up to `max_range`. An infinite
/// range means "up to the target".
pub trait ShadowTest {
    fn unoccluded(&self, target: Vec3, max_range: f32) -> bool;

    /// Largest distance an unbounded ambient probe needs to cover.
    fn scene_extent(&self) -> f32 {
        f32::INFINITY
    }
}

impl<F> ShadowTest for F
where
    F: Fn(Vec3, f32) -> bool,
{
    fn unoccluded(&self, target: Vec3, max_range: f32) -> bool {
        self(target, max_range)
    }
}

/// A light source in world space.
#[derive(Debug, Clone, PartialEq)]
pub enum Light {
    /// Occluded sky light; `range` is infinite when unbounded.
    Ambient { radiance: Color, range: f32 },

    Point { position: Vec3, power: Color },

    /// Rectangle spanned from `corner` (bottom-left) by `up * height` and
    /// `right * width`, emitting on the side `normal` points to.
    Area {
        corner: Vec3,
        up: Vec3,
        right: Vec3,
        width: f32,
        height: f32,
        normal: Vec3,
        power: Color,
    },
}

impl Light {
    /// Ambient light; a missing or zero range is unbounded.
    pub fn ambient(radiance: Color, range: Option<f32>) -> Self {
        let range = match range {
            Some(r) if r != 0.0 => r,
            _ => f32::INFINITY,
        };
        Light::Ambient { radiance, range }
    }

    /// Point light at `position` in the local space of `world`.
    pub fn point(position: Vec3, power: Color, world: &Mat4) -> Self {
        Light::Point {
            position: world.transform_point3(position),
            power,
        }
    }

    /// Rectangular light centered on `position` in the local space of
    /// `world`, facing along `normal`.
    pub fn area(
        position: Vec3,
        normal: Vec3,
        up: Vec3,
        size: Vec2,
        power: Color,
        world: &Mat4,
    ) -> Self {
        let p_up = up.normalize();
        let p_right = p_up.cross(normal).normalize();
        let half_w = size.x / 2.0;
        let half_h = size.y / 2.0;

        let bl = world.transform_point3(position - p_right * half_w - p_up * half_h);
        let tl = world.transform_point3(position - p_right * half_w + p_up * half_h);
        let tr = world.transform_point3(position + p_right * half_w + p_up * half_h);

        Light::Area {
            corner: bl,
            up: (tl - bl).normalize(),
            height: (tl - bl).length(),
            right: (tr - tl).normalize(),
            width: (tr - tl).length(),
            normal: (world.linear() * normal).normalize(),
            power,
        }
    }

    /// Single-sample estimate of the radiance this light reflects towards
    /// the viewer at `point`.
    ///
    /// `incoming` is the (normalized) direction of the viewing ray and
    /// `normal` the shading normal facing the viewer.
    pub fn contribution(
        &self,
        incoming: Vec3,
        point: Vec3,
        normal: Vec3,
        material: &dyn Bsdf,
        shadow: &dyn ShadowTest,
        rng: &mut dyn RngCore,
    ) -> Color {
        match self {
            Light::Ambient { radiance, range } => {
                let sample = Vec2::new(gen_f32(rng), gen_f32(rng));
                let local = warp::square_to_cosine_hemisphere(sample);
                let dir = Frame::from_normal(normal).to_world(local);

                let range = if range.is_infinite() {
                    shadow.scene_extent()
                } else {
                    *range
                };

                if shadow.unoccluded(point + dir * AMBIENT_PROBE_DISTANCE, range) {
                    *radiance * material.diffuse_reflectance()
                } else {
                    Color::ZERO
                }
            }

            Light::Point { position, power } => {
                if !shadow.unoccluded(*position, f32::INFINITY) {
                    return Color::ZERO;
                }

                let to_light = *position - point;
                let dist2 = to_light.length_squared();
                let light_dir = to_light / dist2.sqrt();

                let query = BsdfQuery::from_world(normal, incoming, light_dir);
                let cos_theta = light_dir.dot(normal);

                cos_theta / dist2 * material.eval(&query) * *power / (4.0 * PI)
            }

            Light::Area {
                corner,
                up,
                right,
                width,
                height,
                normal: light_normal,
                power,
            } => {
                let rx = gen_f32(rng) * width;
                let ry = gen_f32(rng) * height;
                let sample = *corner + *up * ry + *right * rx;
                let outgoing = sample - point;

                // Back-facing samples skip the shadow ray
                if light_normal.dot(outgoing) >= 0.0 || !shadow.unoccluded(sample, f32::INFINITY) {
                    return Color::ZERO;
                }

                let dist = outgoing.length();
                let light_dir = outgoing / dist;
                let query = BsdfQuery::from_world(normal, incoming, light_dir);

                let cosines = light_dir.dot(normal) * light_dir.dot(*light_normal);
                let geometric = (width * height * cosines).abs() / (dist * dist);

                geometric * material.eval(&query) * *power / (2.0 * PI * width * height)
            }
        }
    }
}

/// Ordered list of the scene's lights.
#[derive(Debug, Clone, Default)]
pub struct LightSet {
    lights: Vec<Light>,
}

impl LightSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, light: Light) {
        self.lights.push(light);
    }

    pub fn len(&self) -> usize {
        self.lights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lights.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Light> {
        self.lights.iter()
    }

    /// Sum of every light's contribution at `point`.
    pub fn contribution(
        &self,
        incoming: Vec3,
        point: Vec3,
        normal: Vec3,
        material: &dyn Bsdf,
        shadow: &dyn ShadowTest,
        rng: &mut dyn RngCore,
    ) -> Color {
        let mut total = Color::ZERO;
        for light in &self.lights {
            total += light.contribution(incoming, point, normal, material, shadow, rng);
        }
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bsdf::Lambertian;
    use crate::test_util::FixedRng;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::cell::{Cell, RefCell};
    use std::f32::consts::FRAC_1_PI;

    fn always_visible(_target: Vec3, _range: f32) -> bool {
        true
    }

    fn never_visible(_target: Vec3, _range: f32) -> bool {
        false
    }

    fn white() -> Lambertian {
        Lambertian::new(Color::ONE)
    }

    #[test]
    fn test_ambient_range_defaults() {
        let range_of = |range: Option<f32>| match Light::ambient(Color::ONE, range) {
            Light::Ambient { range, .. } => range,
            other => panic!("expected ambient light, got {other:?}"),
        };
        assert!(range_of(None).is_infinite());
        assert!(range_of(Some(0.0)).is_infinite());
        assert_eq!(range_of(Some(3.0)), 3.0);
    }

    #[test]
    fn test_ambient_visible_and_occluded() {
        let light = Light::ambient(Color::new(0.5, 1.0, 2.0), None);
        let material = Lambertian::new(Color::new(0.5, 0.5, 0.25));
        let mut rng = StdRng::seed_from_u64(1);

        let lit = light.contribution(
            Vec3::NEG_Y,
            Vec3::ZERO,
            Vec3::Y,
            &material,
            &always_visible,
            &mut rng,
        );
        assert_eq!(lit, Color::new(0.25, 0.5, 0.5));

        let dark = light.contribution(
            Vec3::NEG_Y,
            Vec3::ZERO,
            Vec3::Y,
            &material,
            &never_visible,
            &mut rng,
        );
        assert_eq!(dark, Color::ZERO);
    }

    #[test]
    fn test_ambient_probe_offset_and_range() {
        let point = Vec3::new(1.0, 2.0, 3.0);
        let normal = Vec3::new(0.0, 0.0, 1.0);
        let seen = RefCell::new(Vec::new());
        let recorder = |target: Vec3, range: f32| {
            seen.borrow_mut().push((target, range));
            true
        };
        let mut rng = StdRng::seed_from_u64(9);

        for range in [None, Some(2.5)] {
            let light = Light::ambient(Color::ONE, range);
            for _ in 0..16 {
                light.contribution(Vec3::NEG_Z, point, normal, &white(), &recorder, &mut rng);
            }
        }

        let seen = seen.into_inner();
        assert_eq!(seen.len(), 32);
        for (i, (target, range)) in seen.iter().enumerate() {
            let offset = *target - point;
            assert!((offset.length() - 4.0).abs() < 1e-4);
            // Probes stay in the hemisphere around the normal
            assert!(offset.dot(normal) >= 0.0);
            if i < 16 {
                assert!(range.is_infinite());
            } else {
                assert_eq!(*range, 2.5);
            }
        }
    }

    #[test]
    fn test_ambient_uses_scene_extent_when_unbounded() {
        struct Bounded(Cell<f32>);
        impl ShadowTest for Bounded {
            fn unoccluded(&self, _target: Vec3, max_range: f32) -> bool {
                self.0.set(max_range);
                true
            }
            fn scene_extent(&self) -> f32 {
                12.0
            }
        }

        let shadow = Bounded(Cell::new(0.0));
        let mut rng = StdRng::seed_from_u64(3);
        Light::ambient(Color::ONE, None).contribution(
            Vec3::NEG_Y,
            Vec3::ZERO,
            Vec3::Y,
            &white(),
            &shadow,
            &mut rng,
        );
        assert_eq!(shadow.0.get(), 12.0);
    }

    #[test]
    fn test_point_light_world_position() {
        let world = Mat4::from_translation(Vec3::new(0.0, 3.0, 0.0));
        let light = Light::point(Vec3::new(1.0, 0.0, 0.0), Color::ONE, &world);

        assert!(
            matches!(light, Light::Point { position, .. } if position == Vec3::new(1.0, 3.0, 0.0))
        );
    }

    #[test]
    fn test_point_light_inverse_square() {
        let power = Color::splat(4.0 * PI);
        let mut rng = StdRng::seed_from_u64(0);
        let material = white();

        let at = |height: f32, rng: &mut StdRng| {
            let light = Light::point(Vec3::new(0.0, height, 0.0), power, &Mat4::IDENTITY);
            light.contribution(Vec3::NEG_Y, Vec3::ZERO, Vec3::Y, &material, &always_visible, rng)
        };

        let near = at(1.0, &mut rng);
        let far = at(2.0, &mut rng);

        // Directly overhead: cos = 1, bsdf = 1/pi, power/(4pi) = 1
        assert!((near.x - FRAC_1_PI).abs() < 1e-6);
        assert!((near.x / far.x - 4.0).abs() < 1e-4);
    }

    #[test]
    fn test_point_light_shadowed_or_behind() {
        let light = Light::point(Vec3::new(0.0, 1.0, 0.0), Color::ONE, &Mat4::IDENTITY);
        let mut rng = StdRng::seed_from_u64(0);

        let shadowed = light.contribution(
            Vec3::NEG_Y,
            Vec3::ZERO,
            Vec3::Y,
            &white(),
            &never_visible,
            &mut rng,
        );
        assert_eq!(shadowed, Color::ZERO);

        let behind = light.contribution(
            Vec3::Y,
            Vec3::ZERO,
            Vec3::NEG_Y,
            &white(),
            &always_visible,
            &mut rng,
        );
        assert_eq!(behind, Color::ZERO);
    }

    #[test]
    fn test_area_light_frame() {
        let world = Mat4::from_translation(Vec3::new(0.0, 1.0, 0.0));
        let light = Light::area(
            Vec3::ZERO,
            Vec3::NEG_Y,
            Vec3::Z,
            Vec2::new(2.0, 4.0),
            Color::ONE,
            &world,
        );

        match light {
            Light::Area {
                corner,
                up,
                right,
                width,
                height,
                normal,
                ..
            } => {
                // right = up x normal = Z x -Y = X
                assert!((right - Vec3::X).length() < 1e-6);
                assert!((up - Vec3::Z).length() < 1e-6);
                assert!((corner - Vec3::new(-1.0, 1.0, -2.0)).length() < 1e-6);
                assert!((width - 2.0).abs() < 1e-6);
                assert!((height - 4.0).abs() < 1e-6);
                assert!((normal - Vec3::NEG_Y).length() < 1e-6);
            }
            other => panic!("expected area light, got {other:?}"),
        }
    }

    #[test]
    fn test_area_light_closed_form() {
        // 2x2 panel one unit above the point, facing down, sampled at its center
        let light = Light::area(
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::NEG_Y,
            Vec3::Z,
            Vec2::new(2.0, 2.0),
            Color::splat(6.0),
            &Mat4::IDENTITY,
        );
        let mut rng = FixedRng(0x8000_0000);

        let c = light.contribution(
            Vec3::NEG_Y,
            Vec3::ZERO,
            Vec3::Y,
            &white(),
            &always_visible,
            &mut rng,
        );
        let expected = 6.0 / (2.0 * PI) * FRAC_1_PI;
        assert!((c.x - expected).abs() < 1e-6, "{} != {}", c.x, expected);
    }

    #[test]
    fn test_area_light_back_face_is_dark() {
        // Panel facing up, shading point below it
        let light = Light::area(
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::Y,
            Vec3::Z,
            Vec2::new(2.0, 2.0),
            Color::splat(6.0),
            &Mat4::IDENTITY,
        );
        let calls = Cell::new(0);
        let counting = |_t: Vec3, _r: f32| {
            calls.set(calls.get() + 1);
            true
        };
        let mut rng = StdRng::seed_from_u64(5);

        let c = light.contribution(Vec3::NEG_Y, Vec3::ZERO, Vec3::Y, &white(), &counting, &mut rng);
        assert_eq!(c, Color::ZERO);
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_light_set_sums() {
        let mut lights = LightSet::new();
        assert!(lights.is_empty());

        lights.push(Light::ambient(Color::splat(0.25), None));
        lights.push(Light::ambient(Color::splat(0.5), None));
        assert_eq!(lights.len(), 2);

        let mut rng = StdRng::seed_from_u64(2);
        let total = lights.contribution(
            Vec3::NEG_Y,
            Vec3::ZERO,
            Vec3::Y,
            &white(),
            &always_visible,
            &mut rng,
        );
        assert_eq!(total, Color::splat(0.75));
    }
}
