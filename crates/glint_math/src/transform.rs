// Transform utilities for Mat4
//
// Extends glam::Mat4 with the affine helpers the scene builder needs.
// Note: glam::Mat4 already provides transform_point3() and transform_vector3()

use glam::{Mat3, Mat4, Vec3};

/// Extension trait for affine `Mat4` transforms.
pub trait Mat4Ext {
    /// The upper-left 3x3 block (rotation and scale, no translation).
    fn linear(&self) -> Mat3;

    /// Transform every point of a slice into a new buffer.
    fn transform_points(&self, points: &[Vec3]) -> Vec<Vec3>;
}

impl Mat4Ext for Mat4 {
    fn linear(&self) -> Mat3 {
        Mat3::from_mat4(*self)
    }

    fn transform_points(&self, points: &[Vec3]) -> Vec<Vec3> {
        points.iter().map(|&p| self.transform_point3(p)).collect()
    }
}
