//! Pinhole camera for ray generation.

use glint_math::{Quat, Ray, Vec3};

/// Pinhole camera with an orthonormal basis.
///
/// `vw` points backwards (away from the view direction), `vu` right and
/// `vv` up. The basis is orthonormalised from the up hint at construction
/// and only ever rotated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    eye: Vec3,
    up: Vec3,

    vu: Vec3,
    vv: Vec3,
    vw: Vec3,

    // Horizontal field of view in radians
    hfov: f32,
    aspect: f32,
    near: f32,
    far: f32,
}

impl Camera {
    /// Create a camera at `position` looking along `look_dir`.
    pub fn new(
        position: Vec3,
        look_dir: Vec3,
        up: Vec3,
        hfov: f32,
        aspect: f32,
        near: f32,
        far: f32,
    ) -> Self {
        let vw = (-look_dir).normalize();
        let vu = up.cross(vw).normalize();
        let vv = vw.cross(vu);

        Self {
            eye: position,
            up,
            vu,
            vv,
            vw,
            hfov,
            aspect,
            near,
            far,
        }
    }

    /// Create a camera at `eye` looking at the point `target`.
    pub fn look_at(
        eye: Vec3,
        target: Vec3,
        up: Vec3,
        hfov: f32,
        aspect: f32,
        near: f32,
        far: f32,
    ) -> Self {
        Self::new(eye, target - eye, up, hfov, aspect, near, far)
    }

    /// Generate the view ray through normalized image coordinates `(u, v)`.
    ///
    /// `(0, 0)` is the bottom-left corner of the image plane, `(1, 1)` the
    /// top-right. The direction is not normalized.
    pub fn generate_ray(&self, u: f32, v: f32) -> Ray {
        let width = (2.0 * (self.hfov / 2.0).tan()).abs();
        let height = width / self.aspect;

        let cu = width * u - width / 2.0;
        let cv = height * v - height / 2.0;

        let direction = -self.vw + self.vu * cu + self.vv * cv;
        Ray::new(self.eye, direction)
    }

    /// Rotate the camera about the world origin: `theta` around world +Y,
    /// then `phi` around the (rotated) right axis.
    pub fn orbit(&mut self, theta: f32, phi: f32) {
        let yaw = Quat::from_axis_angle(Vec3::Y, theta);
        self.eye = yaw * self.eye;
        self.vw = yaw * self.vw;
        self.vu = yaw * self.vu;
        self.vv = yaw * self.vv;

        let pitch = Quat::from_axis_angle(self.vu.normalize(), phi);
        self.eye = pitch * self.eye;
        self.vw = pitch * self.vw;
        self.vv = pitch * self.vv;
    }

    /// Move the eye along the backward axis; negative values move closer.
    pub fn zoom(&mut self, z: f32) {
        self.eye += self.vw * z;
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    /// The backward axis `vw` (the view direction is `-forward()`).
    pub fn forward(&self) -> Vec3 {
        self.vw
    }

    pub fn eye(&self) -> Vec3 {
        self.eye
    }

    /// The up hint the camera was constructed with.
    pub fn up_hint(&self) -> Vec3 {
        self.up
    }

    /// Basis vectors `(vu, vv, vw)`.
    pub fn basis(&self) -> (Vec3, Vec3, Vec3) {
        (self.vu, self.vv, self.vw)
    }

    pub fn hfov(&self) -> f32 {
        self.hfov
    }

    pub fn near(&self) -> f32 {
        self.near
    }

    pub fn far(&self) -> f32 {
        self.far
    }
}

impl Default for Camera {
    /// Eye at (3, 4, 5) looking at the origin with a 30 degree field of view.
    fn default() -> Self {
        Self::look_at(
            Vec3::new(3.0, 4.0, 5.0),
            Vec3::ZERO,
            Vec3::Y,
            30f32.to_radians(),
            1.0,
            0.0,
            f32::INFINITY,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn assert_close(a: Vec3, b: Vec3) {
        assert!((a - b).length() < 1e-4, "{a:?} != {b:?}");
    }

    fn assert_orthonormal(camera: &Camera) {
        let (vu, vv, vw) = camera.basis();
        for v in [vu, vv, vw] {
            assert!((v.length() - 1.0).abs() < 1e-4);
        }
        assert!(vu.dot(vv).abs() < 1e-4);
        assert!(vu.dot(vw).abs() < 1e-4);
        assert!(vv.dot(vw).abs() < 1e-4);
    }

    #[test]
    fn test_default_camera() {
        let camera = Camera::default();

        assert_eq!(camera.eye(), Vec3::new(3.0, 4.0, 5.0));
        assert_close(camera.forward(), Vec3::new(3.0, 4.0, 5.0).normalize());
        assert_eq!(camera.aspect(), 1.0);
        assert!(camera.far().is_infinite());
        assert_orthonormal(&camera);
    }

    #[test]
    fn test_look_direction_constructor() {
        let camera = Camera::new(Vec3::ZERO, Vec3::NEG_Z, Vec3::Y, FRAC_PI_2, 2.0, 0.0, 100.0);
        let (vu, vv, vw) = camera.basis();

        assert_close(vw, Vec3::Z);
        assert_close(vu, Vec3::X);
        assert_close(vv, Vec3::Y);
    }

    #[test]
    fn test_up_hint_is_orthonormalized() {
        // Up hint tilted towards the view direction
        let camera = Camera::new(
            Vec3::ZERO,
            Vec3::NEG_Z,
            Vec3::new(0.0, 1.0, -0.5),
            1.0,
            1.0,
            0.0,
            10.0,
        );
        assert_orthonormal(&camera);
        assert_close(camera.basis().1, Vec3::Y);
    }

    #[test]
    fn test_center_ray_is_view_direction() {
        let camera = Camera::default();
        let ray = camera.generate_ray(0.5, 0.5);

        assert_close(ray.direction, -camera.forward());
        assert_eq!(ray.origin, camera.eye());
        assert_eq!(ray.bounds.min, 0.0);
        assert!(ray.bounds.max.is_infinite());
    }

    #[test]
    fn test_ray_spans_field_of_view() {
        // 90 degree field of view: half-width tan(45) = 1
        let camera = Camera::new(Vec3::ZERO, Vec3::NEG_Z, Vec3::Y, FRAC_PI_2, 2.0, 0.0, 100.0);

        assert_close(camera.generate_ray(1.0, 0.5).direction, Vec3::new(1.0, 0.0, -1.0));
        assert_close(camera.generate_ray(0.0, 0.5).direction, Vec3::new(-1.0, 0.0, -1.0));
        // Height is width / aspect
        assert_close(camera.generate_ray(0.5, 1.0).direction, Vec3::new(0.0, 0.5, -1.0));
    }

    #[test]
    fn test_orbit_inverse_restores_camera() {
        let original = Camera::default();

        let mut camera = original.clone();
        camera.orbit(0.7, 0.0);
        camera.orbit(-0.7, 0.0);
        assert_close(camera.eye(), original.eye());
        assert_close(camera.basis().0, original.basis().0);
        assert_close(camera.basis().1, original.basis().1);
        assert_close(camera.basis().2, original.basis().2);

        let mut camera = original.clone();
        camera.orbit(0.0, 0.3);
        camera.orbit(0.0, -0.3);
        assert_close(camera.eye(), original.eye());
        assert_close(camera.basis().1, original.basis().1);
    }

    #[test]
    fn test_orbit_yaw_quarter_turn() {
        let mut camera = Camera::look_at(
            Vec3::new(0.0, 0.0, 5.0),
            Vec3::ZERO,
            Vec3::Y,
            1.0,
            1.0,
            0.0,
            100.0,
        );
        camera.orbit(FRAC_PI_2, 0.0);

        assert_close(camera.eye(), Vec3::new(5.0, 0.0, 0.0));
        assert_close(camera.forward(), Vec3::X);
        assert_orthonormal(&camera);
    }

    #[test]
    fn test_orbit_keeps_basis_orthonormal() {
        let mut camera = Camera::default();
        for i in 0..100 {
            camera.orbit(0.05 * i as f32, -0.02);
        }
        assert_orthonormal(&camera);
    }

    #[test]
    fn test_zoom_is_additive() {
        let mut a = Camera::default();
        let mut b = Camera::default();

        a.zoom(-1.5);
        a.zoom(0.5);
        b.zoom(-1.0);

        assert_close(a.eye(), b.eye());
        assert_eq!(a.forward(), Camera::default().forward());
    }
}
