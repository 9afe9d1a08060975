//! Scene building: flattens the imported node tree into world-space
//! geometry, resolves materials, places lights and the camera.

use std::collections::HashMap;
use std::sync::Arc;

use glint_core::{CameraInfo, ImportedScene, LightInfo, SceneInfo, SceneNode};
use glint_math::{Mat4, Mat4Ext, Vec2, Vec3};

use crate::backend::{BackendError, CommittedScene, GeometryId, IntersectionBackend};
use crate::bsdf::{self, Bsdf};
use crate::camera::Camera;
use crate::light::{Light, LightSet};
use crate::Color;

/// Material lookup by mesh material name, then by node name, then default.
#[derive(Debug, Clone)]
pub struct MaterialTable {
    named: HashMap<String, Arc<dyn Bsdf>>,
    by_node: HashMap<String, Arc<dyn Bsdf>>,
    default: Arc<dyn Bsdf>,
}

impl MaterialTable {
    pub fn new(default: Arc<dyn Bsdf>) -> Self {
        Self {
            named: HashMap::new(),
            by_node: HashMap::new(),
            default,
        }
    }

    /// Build the table from scene info. An entry with both keys is
    /// registered under each.
    pub fn from_info(info: &SceneInfo) -> Self {
        let mut table = Self::new(bsdf::from_info(&info.default_material));

        for entry in &info.materials {
            let material = bsdf::from_info(&entry.bsdf);
            if let Some(name) = &entry.name {
                table.insert_named(name.clone(), material.clone());
            }
            if let Some(node) = &entry.node {
                table.insert_node(node.clone(), material.clone());
            }
            if entry.name.is_none() && entry.node.is_none() {
                log::warn!("Material entry without name or node ignored: {:?}", entry.bsdf);
            }
        }

        table
    }

    pub fn insert_named(&mut self, name: impl Into<String>, material: Arc<dyn Bsdf>) {
        self.named.insert(name.into(), material);
    }

    pub fn insert_node(&mut self, node: impl Into<String>, material: Arc<dyn Bsdf>) {
        self.by_node.insert(node.into(), material);
    }

    pub fn default_material(&self) -> &Arc<dyn Bsdf> {
        &self.default
    }

    /// First match wins: the mesh's own material name, then the owning
    /// node's name, then the default.
    pub fn resolve(&self, mesh_material: &str, node_name: &str) -> Arc<dyn Bsdf> {
        self.named
            .get(mesh_material)
            .or_else(|| self.by_node.get(node_name))
            .unwrap_or(&self.default)
            .clone()
    }
}

/// Committed geometry plus everything needed to shade a hit.
pub struct Scene<S> {
    geometry: S,
    materials: Vec<Arc<dyn Bsdf>>,
    default_material: Arc<dyn Bsdf>,
    lights: LightSet,
    background: Color,
}

impl<S: CommittedScene> Scene<S> {
    /// Scene with geometry but no lights, every primitive on the default
    /// material.
    pub fn new(geometry: S, default_material: Arc<dyn Bsdf>, background: Color) -> Self {
        Self {
            geometry,
            materials: Vec::new(),
            default_material,
            lights: LightSet::new(),
            background,
        }
    }

    pub fn with_lights(mut self, lights: LightSet) -> Self {
        self.lights = lights;
        self
    }

    pub fn geometry(&self) -> &S {
        &self.geometry
    }

    pub fn lights(&self) -> &LightSet {
        &self.lights
    }

    pub fn background(&self) -> Color {
        self.background
    }

    /// Material assigned to `id` at build time.
    pub fn material(&self, id: GeometryId) -> &dyn Bsdf {
        self.materials
            .get(id.index())
            .unwrap_or(&self.default_material)
            .as_ref()
    }

    /// Diagonal of the geometry bounds; bounds unbounded ambient probes.
    pub fn extent(&self) -> f32 {
        self.geometry.bounds().diagonal_length()
    }
}

/// Output of [`SceneBuilder::build`].
pub struct SceneAndCamera<S> {
    pub scene: Scene<S>,
    pub camera: Camera,
}

/// Turns an imported node tree and its scene info into a renderable scene.
pub struct SceneBuilder<'a> {
    info: &'a SceneInfo,
    materials: MaterialTable,
}

impl<'a> SceneBuilder<'a> {
    pub fn new(info: &'a SceneInfo) -> Self {
        Self {
            info,
            materials: MaterialTable::from_info(info),
        }
    }

    /// Replace the material table derived from the scene info.
    pub fn with_materials(mut self, materials: MaterialTable) -> Self {
        self.materials = materials;
        self
    }

    /// Register every mesh with `backend`, commit it and place lights and
    /// the camera.
    pub fn build<B: IntersectionBackend>(
        self,
        imported: &ImportedScene,
        mut backend: B,
    ) -> Result<SceneAndCamera<B::Committed>, BackendError> {
        let mut state = BuildState::default();

        for light in &self.info.lights {
            if let LightInfo::Ambient { radiance, range } = light {
                state.lights.push(Light::ambient(Vec3::from(*radiance), *range));
            }
        }

        self.visit(&imported.root, Mat4::IDENTITY, imported, &mut backend, &mut state)?;

        let geometry = backend.commit()?;
        let camera = place_camera(self.info.camera.as_ref(), &imported.root);

        log::info!(
            "Scene built: {} primitives, {} lights",
            state.materials.len(),
            state.lights.len()
        );

        let scene = Scene {
            geometry,
            materials: state.materials,
            default_material: self.materials.default_material().clone(),
            lights: state.lights,
            background: self.info.background(),
        };

        Ok(SceneAndCamera { scene, camera })
    }

    fn visit<B: IntersectionBackend>(
        &self,
        node: &SceneNode,
        parent: Mat4,
        imported: &ImportedScene,
        backend: &mut B,
        state: &mut BuildState,
    ) -> Result<(), BackendError> {
        let world = parent * node.transform;

        for &mesh_index in &node.meshes {
            let Some(mesh) = imported.meshes.get(mesh_index) else {
                log::warn!("Node '{}' references missing mesh {}", node.name, mesh_index);
                continue;
            };

            let positions = world.transform_points(&mesh.positions);
            let id = backend.attach_triangles(&positions, &mesh.triangles())?;
            let material = self.materials.resolve(&mesh.material, &node.name);

            log::debug!(
                "Mesh '{}' under '{}' -> geometry {} ({:?})",
                mesh.name,
                node.name,
                id.0,
                material
            );
            state.assign(id, material, self.materials.default_material());
        }

        for light in &self.info.lights {
            if light.node() != Some(node.name.as_str()) {
                continue;
            }
            match light {
                LightInfo::Point {
                    position, power, ..
                } => {
                    state.lights.push(Light::point(
                        Vec3::from(*position),
                        Vec3::from(*power),
                        &world,
                    ));
                    log::debug!("Point light under '{}'", node.name);
                }
                LightInfo::Area {
                    position,
                    normal,
                    up,
                    size,
                    power,
                    ..
                } => {
                    state.lights.push(Light::area(
                        Vec3::from(*position),
                        Vec3::from(*normal),
                        Vec3::from(*up),
                        Vec2::from(*size),
                        Vec3::from(*power),
                        &world,
                    ));
                    log::debug!("Area light under '{}'", node.name);
                }
                LightInfo::Ambient { .. } => {}
            }
        }

        for child in &node.children {
            self.visit(child, world, imported, backend, state)?;
        }

        Ok(())
    }
}

#[derive(Default)]
struct BuildState {
    materials: Vec<Arc<dyn Bsdf>>,
    lights: LightSet,
}

impl BuildState {
    fn assign(&mut self, id: GeometryId, material: Arc<dyn Bsdf>, default: &Arc<dyn Bsdf>) {
        if self.materials.len() <= id.index() {
            self.materials.resize(id.index() + 1, default.clone());
        }
        self.materials[id.index()] = material;
    }
}

/// Camera in world space: position, look direction and up composed with
/// every ancestor of the camera node.
fn place_camera(info: Option<&CameraInfo>, root: &SceneNode) -> Camera {
    let Some(info) = info else {
        log::info!("No camera in scene; using default camera");
        return Camera::default();
    };

    let world = match root.world_transform_of(&info.node) {
        Some(m) => m,
        None => {
            if !info.node.is_empty() {
                log::warn!(
                    "Camera node '{}' not found; using its description untransformed",
                    info.node
                );
            }
            Mat4::IDENTITY
        }
    };
    let linear = world.linear();

    Camera::new(
        world.transform_point3(Vec3::from(info.position)),
        linear * Vec3::from(info.look),
        linear * Vec3::from(info.up),
        info.hfov.to_radians(),
        info.aspect,
        info.near,
        info.far.unwrap_or(f32::INFINITY),
    )
}
