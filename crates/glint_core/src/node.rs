//! Node hierarchy for imported scenes.
//!
//! Parents own their children. Nodes reference meshes by index into the
//! imported mesh list; geometry lives there, not in the tree.

use glint_math::{Mat4, Quat, Vec3};

/// A named node with a local transform, child nodes and mesh references.
#[derive(Clone, Debug)]
pub struct SceneNode {
    pub name: String,

    /// Local-to-parent transform
    pub transform: Mat4,

    pub children: Vec<SceneNode>,

    /// Indices into `ImportedScene::meshes`
    pub meshes: Vec<usize>,
}

impl SceneNode {
    /// Create an empty node with an identity transform.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transform: Mat4::IDENTITY,
            children: Vec::new(),
            meshes: Vec::new(),
        }
    }

    pub fn with_transform(mut self, transform: Mat4) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_mesh(mut self, mesh: usize) -> Self {
        self.meshes.push(mesh);
        self
    }

    pub fn with_child(mut self, child: SceneNode) -> Self {
        self.children.push(child);
        self
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(SceneNode::node_count).sum::<usize>()
    }

    /// Path from `self` down to the first node named `name` (depth-first).
    pub fn find_path(&self, name: &str) -> Option<Vec<&SceneNode>> {
        if self.name == name {
            return Some(vec![self]);
        }
        self.children.iter().find_map(|child| {
            child.find_path(name).map(|mut path| {
                path.insert(0, self);
                path
            })
        })
    }

    /// World transform of the node named `name`: every ancestor's local
    /// transform composed up to (and including) this root.
    pub fn world_transform_of(&self, name: &str) -> Option<Mat4> {
        let path = self.find_path(name)?;
        Some(
            path.iter()
                .rev()
                .fold(Mat4::IDENTITY, |acc, node| node.transform * acc),
        )
    }
}

/// Transform components that can be composed into a matrix.
#[derive(Clone, Debug, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    /// Convert to a 4x4 transformation matrix.
    ///
    /// Order: Scale -> Rotate -> Translate (SRT)
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> SceneNode {
        SceneNode::new("root")
            .with_transform(Mat4::from_translation(Vec3::new(1.0, 0.0, 0.0)))
            .with_child(
                SceneNode::new("arm")
                    .with_transform(Mat4::from_scale(Vec3::splat(2.0)))
                    .with_child(
                        SceneNode::new("hand")
                            .with_transform(Mat4::from_translation(Vec3::new(0.0, 1.0, 0.0))),
                    ),
            )
            .with_child(SceneNode::new("leg").with_mesh(0))
    }

    #[test]
    fn test_node_count() {
        assert_eq!(sample_tree().node_count(), 4);
    }

    #[test]
    fn test_find_path() {
        let tree = sample_tree();
        let path = tree.find_path("hand").unwrap();
        let names: Vec<&str> = path.iter().map(|n| n.name.as_str()).collect();

        assert_eq!(names, vec!["root", "arm", "hand"]);
        assert!(tree.find_path("missing").is_none());
    }

    #[test]
    fn test_world_transform_composes_ancestors() {
        let tree = sample_tree();
        let world = tree.world_transform_of("hand").unwrap();

        // root translate * arm scale * hand translate
        let p = world.transform_point3(Vec3::ZERO);
        assert!((p - Vec3::new(1.0, 2.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_transform_to_matrix() {
        let transform = Transform {
            translation: Vec3::new(1.0, 2.0, 3.0),
            rotation: Quat::from_rotation_y(std::f32::consts::FRAC_PI_2),
            scale: Vec3::splat(2.0),
        };
        let p = transform.to_matrix().transform_point3(Vec3::X);

        assert!((p - Vec3::new(1.0, 2.0, 1.0)).length() < 1e-5);
    }
}
