//! Ray intersection backends.
//!
//! A backend is filled with world-space triangle meshes and then committed.
//! Committing consumes the builder side, so a committed scene can only be
//! queried.

mod bvh;
#[cfg(feature = "embree")]
mod embree;

pub use bvh::{BvhBackend, BvhScene};
#[cfg(feature = "embree")]
pub use embree::{EmbreeBackend, EmbreeScene};

use glint_math::{Aabb, Ray, Vec3};
use thiserror::Error;

/// Identifier of one attached mesh, assigned in attach order from 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GeometryId(pub u32);

impl GeometryId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Nearest intersection along a ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceHit {
    pub geometry_id: GeometryId,
    /// Ray parameter of the hit
    pub t: f32,
    /// Geometric normal, not necessarily unit length or facing the ray
    pub normal: Vec3,
}

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("failed to create intersection device: {0}")]
    DeviceCreation(String),

    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("Embree error {code} ({})", embree_error_name(*.code))]
    Embree { code: i32 },
}

/// Name of an `RTCError` code.
pub fn embree_error_name(code: i32) -> &'static str {
    match code {
        0 => "RTC_ERROR_NONE",
        1 => "RTC_ERROR_UNKNOWN",
        2 => "RTC_ERROR_INVALID_ARGUMENT",
        3 => "RTC_ERROR_INVALID_OPERATION",
        4 => "RTC_ERROR_OUT_OF_MEMORY",
        5 => "RTC_ERROR_UNSUPPORTED_CPU",
        6 => "RTC_ERROR_CANCELLED",
        _ => "UNKNOWN_ERROR",
    }
}

/// Builder side of an intersection backend.
pub trait IntersectionBackend {
    type Committed: CommittedScene;

    /// Register a world-space triangle mesh.
    fn attach_triangles(
        &mut self,
        positions: &[Vec3],
        triangles: &[[u32; 3]],
    ) -> Result<GeometryId, BackendError>;

    /// Finish construction and build acceleration structures.
    fn commit(self) -> Result<Self::Committed, BackendError>;
}

/// Query side of an intersection backend, shared across render threads.
pub trait CommittedScene: Send + Sync {
    /// Nearest hit within `ray.bounds`.
    fn intersect(&self, ray: &Ray) -> Option<SurfaceHit>;

    /// Whether anything is hit within `ray.bounds`.
    fn occluded(&self, ray: &Ray) -> bool;

    /// World-space bounds of all attached geometry.
    fn bounds(&self) -> Aabb;
}

/// Reject index triplets that point past the vertex buffer.
pub(crate) fn validate_triangles(
    positions: &[Vec3],
    triangles: &[[u32; 3]],
) -> Result<(), BackendError> {
    if let Some(tri) = triangles
        .iter()
        .find(|tri| tri.iter().any(|&i| i as usize >= positions.len()))
    {
        return Err(BackendError::InvalidGeometry(format!(
            "triangle {:?} references a vertex past {}",
            tri,
            positions.len()
        )));
    }
    Ok(())
}
