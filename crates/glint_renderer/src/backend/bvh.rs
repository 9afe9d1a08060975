//! Built-in backend: a median-split BVH over world-space triangles.
//!
//! Triangles are tested with the Möller-Trumbore algorithm.

use glint_math::{Aabb, Interval, Ray, Vec3};

use super::{
    validate_triangles, BackendError, CommittedScene, GeometryId, IntersectionBackend, SurfaceHit,
};

/// Maximum primitives per leaf node before splitting.
const LEAF_MAX_SIZE: usize = 4;

/// Determinant threshold below which a ray counts as parallel.
const PARALLEL_EPSILON: f32 = 1e-8;

/// A world-space triangle tagged with the mesh it came from.
#[derive(Debug, Clone)]
struct Triangle {
    v0: Vec3,
    edge1: Vec3,
    edge2: Vec3,
    geometry_id: GeometryId,
    bbox: Aabb,
}

impl Triangle {
    fn new(v0: Vec3, v1: Vec3, v2: Vec3, geometry_id: GeometryId) -> Self {
        let min = v0.min(v1).min(v2);
        let max = v0.max(v1).max(v2);

        Self {
            v0,
            edge1: v1 - v0,
            edge2: v2 - v0,
            geometry_id,
            // from_points pads thin dimensions
            bbox: Aabb::from_points(min, max),
        }
    }

    /// Unnormalized face normal from the winding order.
    fn normal(&self) -> Vec3 {
        self.edge1.cross(self.edge2)
    }

    /// Möller-Trumbore ray-triangle intersection; returns the ray parameter.
    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<f32> {
        let h = ray.direction.cross(self.edge2);
        let a = self.edge1.dot(h);

        // Ray is parallel to triangle
        if a.abs() < PARALLEL_EPSILON {
            return None;
        }

        let f = 1.0 / a;
        let s = ray.origin - self.v0;
        let u = f * s.dot(h);
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(self.edge1);
        let v = f * ray.direction.dot(q);
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = f * self.edge2.dot(q);
        ray_t.contains(t).then_some(t)
    }
}

/// BVH node - either a branch with two children or a leaf with triangles.
enum BvhNode {
    Branch {
        left: Box<BvhNode>,
        right: Box<BvhNode>,
        bbox: Aabb,
    },
    Leaf {
        triangles: Vec<Triangle>,
        bbox: Aabb,
    },
    Empty,
}

impl BvhNode {
    fn new(triangles: Vec<Triangle>) -> Self {
        if triangles.is_empty() {
            return BvhNode::Empty;
        }
        Self::build(triangles)
    }

    /// Simple median-split approach: sort triangles by centroid on the
    /// longest centroid axis, split in half, recurse.
    fn build(mut triangles: Vec<Triangle>) -> Self {
        let bounds = triangles
            .iter()
            .fold(Aabb::EMPTY, |acc, tri| Aabb::surrounding(&acc, &tri.bbox));

        if triangles.len() <= LEAF_MAX_SIZE {
            return BvhNode::Leaf {
                triangles,
                bbox: bounds,
            };
        }

        let centroid_bounds = triangles.iter().fold(Aabb::EMPTY, |acc, tri| {
            let c = tri.bbox.centroid();
            Aabb::surrounding(&acc, &Aabb::from_points(c, c))
        });
        let axis = centroid_bounds.longest_axis();

        triangles.sort_unstable_by(|a, b| {
            let a_val = a.bbox.centroid()[axis];
            let b_val = b.bbox.centroid()[axis];
            a_val.partial_cmp(&b_val).unwrap_or(std::cmp::Ordering::Equal)
        });

        let mid = triangles.len() / 2;
        let right = triangles.split_off(mid);

        BvhNode::Branch {
            left: Box::new(Self::build(triangles)),
            right: Box::new(Self::build(right)),
            bbox: bounds,
        }
    }

    fn bbox(&self) -> Aabb {
        match self {
            BvhNode::Empty => Aabb::EMPTY,
            BvhNode::Leaf { bbox, .. } | BvhNode::Branch { bbox, .. } => *bbox,
        }
    }

    /// Closest hit within `ray_t` as `(t, triangle)`.
    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<(f32, &Triangle)> {
        match self {
            BvhNode::Empty => None,

            BvhNode::Leaf { triangles, bbox } => {
                if !bbox.hit(ray, ray_t) {
                    return None;
                }

                let mut closest = None;
                let mut limit = ray_t;
                for tri in triangles {
                    if let Some(t) = tri.hit(ray, limit) {
                        limit = limit.with_max(t);
                        closest = Some((t, tri));
                    }
                }
                closest
            }

            BvhNode::Branch { left, right, bbox } => {
                if !bbox.hit(ray, ray_t) {
                    return None;
                }

                let hit_left = left.hit(ray, ray_t);

                // Only check right up to closest hit
                let right_t = match hit_left {
                    Some((t, _)) => ray_t.with_max(t),
                    None => ray_t,
                };
                right.hit(ray, right_t).or(hit_left)
            }
        }
    }

    /// Any hit within `ray_t`.
    fn any_hit(&self, ray: &Ray, ray_t: Interval) -> bool {
        match self {
            BvhNode::Empty => false,
            BvhNode::Leaf { triangles, bbox } => {
                bbox.hit(ray, ray_t) && triangles.iter().any(|tri| tri.hit(ray, ray_t).is_some())
            }
            BvhNode::Branch { left, right, bbox } => {
                bbox.hit(ray, ray_t) && (left.any_hit(ray, ray_t) || right.any_hit(ray, ray_t))
            }
        }
    }
}

/// Collects triangles until commit.
#[derive(Default)]
pub struct BvhBackend {
    triangles: Vec<Triangle>,
    geometry_count: u32,
}

impl BvhBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IntersectionBackend for BvhBackend {
    type Committed = BvhScene;

    fn attach_triangles(
        &mut self,
        positions: &[Vec3],
        triangles: &[[u32; 3]],
    ) -> Result<GeometryId, BackendError> {
        validate_triangles(positions, triangles)?;

        let id = GeometryId(self.geometry_count);
        self.geometry_count += 1;

        self.triangles.extend(triangles.iter().map(|&[a, b, c]| {
            Triangle::new(
                positions[a as usize],
                positions[b as usize],
                positions[c as usize],
                id,
            )
        }));

        Ok(id)
    }

    fn commit(self) -> Result<BvhScene, BackendError> {
        let triangle_count = self.triangles.len();
        let root = BvhNode::new(self.triangles);

        log::info!(
            "BVH committed: {} geometries, {} triangles",
            self.geometry_count,
            triangle_count
        );

        Ok(BvhScene {
            root,
            geometry_count: self.geometry_count,
            triangle_count,
        })
    }
}

/// Committed BVH; read-only.
pub struct BvhScene {
    root: BvhNode,
    geometry_count: u32,
    triangle_count: usize,
}

impl BvhScene {
    pub fn geometry_count(&self) -> u32 {
        self.geometry_count
    }

    pub fn triangle_count(&self) -> usize {
        self.triangle_count
    }
}

impl CommittedScene for BvhScene {
    fn intersect(&self, ray: &Ray) -> Option<SurfaceHit> {
        self.root.hit(ray, ray.bounds).map(|(t, tri)| SurfaceHit {
            geometry_id: tri.geometry_id,
            t,
            normal: tri.normal(),
        })
    }

    fn occluded(&self, ray: &Ray) -> bool {
        self.root.any_hit(ray, ray.bounds)
    }

    fn bounds(&self) -> Aabb {
        self.root.bbox()
    }
}
