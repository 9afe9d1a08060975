//! Scene import: resolves the companion files of a scene, loads OBJ
//! geometry with tobj and assembles the node hierarchy.

use std::path::{Path, PathBuf};

use glint_math::{Aabb, Vec3};
use thiserror::Error;

use crate::info::{NodeInfo, SceneInfo};
use crate::mesh::Mesh;
use crate::node::SceneNode;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid scene info {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to load OBJ {path}: {source}")]
    Obj {
        path: PathBuf,
        #[source]
        source: tobj::LoadError,
    },
}

/// Where scene files live and how their companions are named.
#[derive(Clone, Debug)]
pub struct ResourceLayout {
    pub resource_dir: PathBuf,
    pub info_suffix: String,
    pub mesh_extension: String,
    pub output_dir: PathBuf,
}

impl Default for ResourceLayout {
    fn default() -> Self {
        Self {
            resource_dir: PathBuf::from("resources/scenes"),
            info_suffix: "_info.json".to_string(),
            mesh_extension: "obj".to_string(),
            output_dir: PathBuf::from("output"),
        }
    }
}

impl ResourceLayout {
    /// Resolve the companion files of `scene_file`.
    ///
    /// Only the file stem matters: `bunny`, `bunny.obj` and `bunny.dae`
    /// all resolve to `<resource_dir>/bunny.obj` and
    /// `<resource_dir>/bunny_info.json`.
    pub fn scene_files(&self, scene_file: &str) -> SceneFiles {
        let base = Path::new(scene_file)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| scene_file.to_string());

        SceneFiles {
            mesh: self
                .resource_dir
                .join(format!("{}.{}", base, self.mesh_extension)),
            info: self
                .resource_dir
                .join(format!("{}{}", base, self.info_suffix)),
            base,
        }
    }

    /// Path of the snapshot written after `samples` accumulated frames.
    pub fn snapshot_path(&self, base: &str, samples: u32) -> PathBuf {
        self.output_dir
            .join(format!("render_{}_{:06}.png", base, samples))
    }
}

/// Resolved companion files of one scene.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneFiles {
    pub base: String,
    pub mesh: PathBuf,
    pub info: PathBuf,
}

/// Meshes plus the node tree that places them.
#[derive(Clone, Debug)]
pub struct ImportedScene {
    pub root: SceneNode,
    pub meshes: Vec<Mesh>,
}

impl ImportedScene {
    /// A scene with a bare root node and no geometry.
    pub fn empty() -> Self {
        Self {
            root: SceneNode::new("root"),
            meshes: Vec::new(),
        }
    }

    /// Union of the mesh bounds in object space, empty without geometry.
    pub fn bounds(&self) -> Aabb {
        self.meshes
            .iter()
            .fold(Aabb::EMPTY, |acc, mesh| Aabb::surrounding(&acc, &mesh.bounds))
    }
}

impl SceneInfo {
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text).map_err(|source| LoadError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load the info file, falling back to defaults when it is missing or
    /// invalid.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(info) => {
                log::info!(
                    "Loaded scene info {}: {} lights, {} materials",
                    path.display(),
                    info.lights.len(),
                    info.materials.len()
                );
                info
            }
            Err(e) => {
                log::warn!("{}; using default scene info", e);
                Self::default()
            }
        }
    }
}

/// Load every model of an OBJ file as a triangulated mesh.
pub fn load_obj(path: &Path) -> Result<Vec<Mesh>, LoadError> {
    let options = tobj::LoadOptions {
        triangulate: true,
        single_index: true,
        ..Default::default()
    };

    let (models, materials) = tobj::load_obj(path, &options).map_err(|source| LoadError::Obj {
        path: path.to_path_buf(),
        source,
    })?;

    let materials = materials.unwrap_or_else(|e| {
        log::warn!(
            "No materials for {} ({}); meshes keep no material name",
            path.display(),
            e
        );
        Vec::new()
    });

    let meshes: Vec<Mesh> = models
        .into_iter()
        .map(|model| {
            let positions = model
                .mesh
                .positions
                .chunks_exact(3)
                .map(|p| Vec3::new(p[0], p[1], p[2]))
                .collect();
            let material = model
                .mesh
                .material_id
                .and_then(|id| materials.get(id))
                .map(|m| m.name.clone())
                .unwrap_or_default();

            log::debug!(
                "OBJ model '{}': {} indices, material '{}'",
                model.name,
                model.mesh.indices.len(),
                material
            );
            Mesh::new(model.name, positions, model.mesh.indices, material)
        })
        .collect();

    log::info!("Loaded {} meshes from {}", meshes.len(), path.display());
    Ok(meshes)
}

/// Load the geometry of a scene and build its node tree.
///
/// The info file's `nodes` hierarchy is used when present; otherwise every
/// mesh hangs off a `root` node under an identity child named after it.
pub fn import_scene(files: &SceneFiles, info: &SceneInfo) -> Result<ImportedScene, LoadError> {
    let meshes = load_obj(&files.mesh)?;

    let root = match &info.nodes {
        Some(nodes) => build_node(nodes, &meshes),
        None => default_hierarchy(&meshes),
    };

    let scene = ImportedScene { root, meshes };
    log::info!(
        "Imported scene '{}': {} nodes, {} meshes, object-space diagonal {:.3}",
        files.base,
        scene.root.node_count(),
        scene.meshes.len(),
        scene.bounds().diagonal_length()
    );
    Ok(scene)
}

fn default_hierarchy(meshes: &[Mesh]) -> SceneNode {
    meshes
        .iter()
        .enumerate()
        .fold(SceneNode::new("root"), |root, (i, mesh)| {
            root.with_child(SceneNode::new(mesh.name.clone()).with_mesh(i))
        })
}

/// Build a node and its children, skipping mesh references the OBJ does
/// not contain.
fn build_node(info: &NodeInfo, meshes: &[Mesh]) -> SceneNode {
    let mut node = SceneNode::new(info.name.clone()).with_transform(info.local_transform());

    for mesh_name in &info.meshes {
        match meshes.iter().position(|m| &m.name == mesh_name) {
            Some(index) => node.meshes.push(index),
            None => log::warn!(
                "Node '{}' references unknown mesh '{}'; skipped",
                info.name,
                mesh_name
            ),
        }
    }

    for child in &info.children {
        node.children.push(build_node(child, meshes));
    }

    node
}
