use crate::Vec3;

/// Orthonormal shading frame around a surface normal.
///
/// Local coordinates put the normal on +Z, so `cos_theta(v) == v.z`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub s: Vec3,
    pub t: Vec3,
    pub n: Vec3,
}

impl Frame {
    /// Build a frame from a unit normal.
    pub fn from_normal(n: Vec3) -> Self {
        let (s, t) = n.any_orthonormal_pair();
        Self { s, t, n }
    }

    /// World-space vector to local coordinates.
    #[inline]
    pub fn to_local(&self, v: Vec3) -> Vec3 {
        Vec3::new(v.dot(self.s), v.dot(self.t), v.dot(self.n))
    }

    /// Local coordinates back to world space.
    #[inline]
    pub fn to_world(&self, v: Vec3) -> Vec3 {
        self.s * v.x + self.t * v.y + self.n * v.z
    }

    #[inline]
    pub fn cos_theta(v: Vec3) -> f32 {
        v.z
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_is_orthonormal() {
        for n in [Vec3::X, Vec3::NEG_Y, Vec3::new(1.0, 2.0, -3.0).normalize()] {
            let frame = Frame::from_normal(n);

            assert!((frame.s.length() - 1.0).abs() < 1e-5);
            assert!((frame.t.length() - 1.0).abs() < 1e-5);
            assert!(frame.s.dot(frame.t).abs() < 1e-5);
            assert!(frame.s.dot(frame.n).abs() < 1e-5);
            assert!(frame.t.dot(frame.n).abs() < 1e-5);
        }
    }

    #[test]
    fn test_frame_local_roundtrip() {
        let frame = Frame::from_normal(Vec3::new(0.3, -0.5, 0.8).normalize());
        let v = Vec3::new(0.2, 0.7, -0.1);

        assert!((frame.to_world(frame.to_local(v)) - v).length() < 1e-5);
        assert!((frame.to_local(frame.n) - Vec3::Z).length() < 1e-5);
    }
}
