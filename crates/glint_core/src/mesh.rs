//! Mesh geometry representation for the Glint scene graph.
//!
//! Meshes are stored in their own object space; the scene builder moves
//! them into world space with the owning node's accumulated transform.

use glint_math::{Aabb, Vec3};

/// A triangle mesh as delivered by the importer.
#[derive(Clone, Debug)]
pub struct Mesh {
    /// Mesh name (OBJ object/group name)
    pub name: String,

    /// Vertex positions (one Vec3 per vertex)
    pub positions: Vec<Vec3>,

    /// Triangle indices (every 3 indices form a triangle)
    pub indices: Vec<u32>,

    /// Name of the material the file assigns to this mesh, empty when none
    pub material: String,

    /// Object-space bounding box
    pub bounds: Aabb,
}

impl Mesh {
    /// Create a new mesh from positions and indices.
    pub fn new(
        name: impl Into<String>,
        positions: Vec<Vec3>,
        indices: Vec<u32>,
        material: impl Into<String>,
    ) -> Self {
        let bounds = Aabb::from_point_cloud(&positions);
        Self {
            name: name.into(),
            positions,
            indices,
            material: material.into(),
            bounds,
        }
    }

    /// Get the number of triangles in the mesh.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Get the number of vertices in the mesh.
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Triangles as index triplets, skipping any that reference missing vertices.
    pub fn triangles(&self) -> Vec<[u32; 3]> {
        let mut triangles = Vec::with_capacity(self.triangle_count());

        for chunk in self.indices.chunks_exact(3) {
            let tri = [chunk[0], chunk[1], chunk[2]];
            if tri.iter().any(|&i| i as usize >= self.positions.len()) {
                log::warn!(
                    "Mesh '{}': invalid triangle indices {:?}, vertex count: {}",
                    self.name,
                    tri,
                    self.positions.len()
                );
                continue;
            }
            triangles.push(tri);
        }

        triangles
    }
}
