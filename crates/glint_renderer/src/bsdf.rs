//! Reflectance models evaluated in the local shading frame.

use std::f32::consts::{FRAC_1_PI, PI};
use std::fmt::Debug;
use std::sync::Arc;

use glint_core::BsdfInfo;
use glint_math::{Frame, Vec3};

use crate::Color;

/// Pair of directions for a BSDF evaluation, both in the local frame
/// (normal on +Z) and pointing away from the surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BsdfQuery {
    /// Towards the viewer
    pub wi: Vec3,
    /// Towards the light
    pub wo: Vec3,
}

impl BsdfQuery {
    /// Build a query from world-space directions around `normal`.
    ///
    /// `incoming` is the direction the viewing ray travels, so the viewer
    /// side is `-incoming`.
    pub fn from_world(normal: Vec3, incoming: Vec3, to_light: Vec3) -> Self {
        let frame = Frame::from_normal(normal);
        Self {
            wi: frame.to_local(-incoming).normalize(),
            wo: frame.to_local(to_light).normalize(),
        }
    }
}

/// Trait for surface reflectance models.
pub trait Bsdf: Send + Sync + Debug {
    /// Reflected radiance per unit incident irradiance for `query`.
    fn eval(&self, query: &BsdfQuery) -> Color;

    /// Albedo of the diffuse lobe, used by ambient lighting.
    fn diffuse_reflectance(&self) -> Color;
}

/// Lambertian (diffuse) reflectance.
#[derive(Debug, Clone)]
pub struct Lambertian {
    albedo: Color,
}

impl Lambertian {
    pub fn new(albedo: Color) -> Self {
        Self { albedo }
    }
}

impl Bsdf for Lambertian {
    fn eval(&self, query: &BsdfQuery) -> Color {
        if Frame::cos_theta(query.wi) <= 0.0 || Frame::cos_theta(query.wo) <= 0.0 {
            return Color::ZERO;
        }
        self.albedo * FRAC_1_PI
    }

    fn diffuse_reflectance(&self) -> Color {
        self.albedo
    }
}

/// Diffuse base plus a Beckmann microfacet specular lobe over a
/// dielectric interface.
///
/// The specular weight is `1 - max(kd)` so the two lobes never exceed
/// unit albedo.
#[derive(Debug, Clone)]
pub struct Microfacet {
    alpha: f32,
    int_ior: f32,
    ext_ior: f32,
    kd: Color,
    ks: f32,
}

impl Microfacet {
    pub fn new(alpha: f32, int_ior: f32, ext_ior: f32, kd: Color) -> Self {
        Self {
            alpha,
            int_ior,
            ext_ior,
            kd,
            ks: 1.0 - kd.max_element(),
        }
    }

    pub fn specular_weight(&self) -> f32 {
        self.ks
    }

    /// Beckmann normal distribution for half vector `wh`.
    fn distribution(&self, wh: Vec3) -> f32 {
        let cos_theta = Frame::cos_theta(wh);
        if cos_theta <= 0.0 {
            return 0.0;
        }
        let cos2 = cos_theta * cos_theta;
        let tan2 = (1.0 - cos2) / cos2;
        let alpha2 = self.alpha * self.alpha;

        (-tan2 / alpha2).exp() / (PI * alpha2 * cos2 * cos2)
    }

    /// Smith shadowing term for one direction (rational approximation).
    fn smith_g1(&self, v: Vec3, wh: Vec3) -> f32 {
        let cos_v = Frame::cos_theta(v);
        if v.dot(wh) / cos_v <= 0.0 {
            return 0.0;
        }

        let tan_theta = (1.0 - cos_v * cos_v).max(0.0).sqrt() / cos_v;
        if tan_theta == 0.0 {
            return 1.0;
        }

        let b = 1.0 / (self.alpha * tan_theta);
        if b >= 1.6 {
            return 1.0;
        }
        let b2 = b * b;
        (3.535 * b + 2.181 * b2) / (1.0 + 2.276 * b + 2.577 * b2)
    }
}

impl Bsdf for Microfacet {
    fn eval(&self, query: &BsdfQuery) -> Color {
        let cos_i = Frame::cos_theta(query.wi);
        let cos_o = Frame::cos_theta(query.wo);
        if cos_i <= 0.0 || cos_o <= 0.0 {
            return Color::ZERO;
        }

        let wh = (query.wi + query.wo).normalize();
        let d = self.distribution(wh);
        let f = fresnel_dielectric(wh.dot(query.wi), self.ext_ior, self.int_ior);
        let g = self.smith_g1(query.wi, wh) * self.smith_g1(query.wo, wh);

        self.kd * FRAC_1_PI + Color::splat(self.ks * d * f * g / (4.0 * cos_i * cos_o))
    }

    fn diffuse_reflectance(&self) -> Color {
        self.kd
    }
}

/// Unpolarized Fresnel reflectance of a dielectric interface.
///
/// `cos_theta_i` is measured on the exterior side; negative values mean the
/// ray arrives from the interior.
pub fn fresnel_dielectric(cos_theta_i: f32, ext_ior: f32, int_ior: f32) -> f32 {
    if ext_ior == int_ior {
        return 0.0;
    }

    let (mut eta_i, mut eta_t) = (ext_ior, int_ior);
    let mut cos_i = cos_theta_i;
    if cos_i < 0.0 {
        std::mem::swap(&mut eta_i, &mut eta_t);
        cos_i = -cos_i;
    }

    let eta = eta_i / eta_t;
    let sin_t2 = eta * eta * (1.0 - cos_i * cos_i).max(0.0);
    if sin_t2 > 1.0 {
        // Total internal reflection
        return 1.0;
    }
    let cos_t = (1.0 - sin_t2).sqrt();

    let rs = (eta_i * cos_i - eta_t * cos_t) / (eta_i * cos_i + eta_t * cos_t);
    let rp = (eta_t * cos_i - eta_i * cos_t) / (eta_t * cos_i + eta_i * cos_t);

    (rs * rs + rp * rp) / 2.0
}

/// Instantiate the reflectance model a scene info entry describes.
pub fn from_info(info: &BsdfInfo) -> Arc<dyn Bsdf> {
    match info {
        BsdfInfo::Lambertian { albedo } => Arc::new(Lambertian::new(Vec3::from(*albedo))),
        BsdfInfo::Microfacet {
            alpha,
            int_ior,
            ext_ior,
            kd,
        } => Arc::new(Microfacet::new(*alpha, *int_ior, *ext_ior, Vec3::from(*kd))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(wi: Vec3, wo: Vec3) -> BsdfQuery {
        BsdfQuery {
            wi: wi.normalize(),
            wo: wo.normalize(),
        }
    }

    #[test]
    fn test_lambertian_eval() {
        let bsdf = Lambertian::new(Color::new(0.5, 0.25, 1.0));

        let above = bsdf.eval(&query(Vec3::new(0.3, 0.0, 1.0), Vec3::new(-0.2, 0.4, 1.0)));
        assert!((above - Color::new(0.5, 0.25, 1.0) / PI).length() < 1e-6);

        let below = bsdf.eval(&query(Vec3::Z, Vec3::new(0.0, 1.0, -0.1)));
        assert_eq!(below, Color::ZERO);
        assert_eq!(bsdf.diffuse_reflectance(), Color::new(0.5, 0.25, 1.0));
    }

    #[test]
    fn test_query_from_world() {
        let normal = Vec3::Y;
        // Ray travelling straight down onto the surface, light straight up
        let q = BsdfQuery::from_world(normal, Vec3::NEG_Y, Vec3::Y);

        assert!((q.wi - Vec3::Z).length() < 1e-5);
        assert!((q.wo - Vec3::Z).length() < 1e-5);
    }

    #[test]
    fn test_fresnel_normal_incidence() {
        let f = fresnel_dielectric(1.0, 1.0, 1.5);
        assert!((f - 0.04).abs() < 1e-5);

        // Matched indices reflect nothing
        assert_eq!(fresnel_dielectric(0.7, 1.3, 1.3), 0.0);

        // Grazing exit from the dense side is totally reflected
        assert_eq!(fresnel_dielectric(-0.1, 1.0, 1.5), 1.0);
    }

    #[test]
    fn test_microfacet_weights_and_lobes() {
        let bsdf = Microfacet::new(0.2, 1.5046, 1.000277, Color::new(0.3, 0.6, 0.1));
        assert!((bsdf.specular_weight() - 0.4).abs() < 1e-6);
        assert_eq!(bsdf.diffuse_reflectance(), Color::new(0.3, 0.6, 0.1));

        // Mirror configuration peaks above the diffuse floor
        let specular = bsdf.eval(&query(Vec3::new(0.3, 0.0, 1.0), Vec3::new(-0.3, 0.0, 1.0)));
        let diffuse_floor = Color::new(0.3, 0.6, 0.1) / PI;
        assert!(specular.x > diffuse_floor.x + 0.01);

        assert_eq!(bsdf.eval(&query(Vec3::Z, Vec3::new(1.0, 0.0, -0.5))), Color::ZERO);
    }

    #[test]
    fn test_microfacet_is_reciprocal() {
        let bsdf = Microfacet::new(0.3, 1.5, 1.0, Color::splat(0.4));
        let a = Vec3::new(0.5, 0.1, 0.8);
        let b = Vec3::new(-0.2, 0.6, 0.7);

        let ab = bsdf.eval(&query(a, b));
        let ba = bsdf.eval(&query(b, a));
        assert!((ab - ba).length() < 1e-5);
    }

    #[test]
    fn test_from_info() {
        let lambertian = from_info(&BsdfInfo::Lambertian { albedo: [0.2; 3] });
        assert_eq!(lambertian.diffuse_reflectance(), Color::splat(0.2));

        let microfacet = from_info(&BsdfInfo::Microfacet {
            alpha: 0.1,
            int_ior: 1.5,
            ext_ior: 1.0,
            kd: [0.1, 0.2, 0.3],
        });
        assert_eq!(microfacet.diffuse_reflectance(), Color::new(0.1, 0.2, 0.3));
    }
}
