//! Scene info: the JSON companion file that carries lights, materials,
//! the camera and (optionally) the node hierarchy for a scene.
//!
//! Keys are camelCase; every top-level field has a default so a partial
//! file is valid.

use glint_math::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::node::Transform;

/// Top-level contents of `<base>_info.json`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SceneInfo {
    pub lights: Vec<LightInfo>,
    pub materials: Vec<MaterialInfo>,
    pub default_material: BsdfInfo,
    pub background_radiance: [f32; 3],
    pub camera: Option<CameraInfo>,
    pub nodes: Option<NodeInfo>,
}

impl Default for SceneInfo {
    fn default() -> Self {
        Self {
            lights: Vec::new(),
            materials: Vec::new(),
            default_material: BsdfInfo::default(),
            background_radiance: [0.0; 3],
            camera: None,
            nodes: None,
        }
    }
}

impl SceneInfo {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn background(&self) -> Vec3 {
        Vec3::from(self.background_radiance)
    }
}

/// Reflectance model parameters, tagged by `type`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BsdfInfo {
    Lambertian {
        #[serde(default = "default_albedo")]
        albedo: [f32; 3],
    },
    #[serde(rename_all = "camelCase")]
    Microfacet {
        #[serde(default = "default_alpha")]
        alpha: f32,
        #[serde(default = "default_int_ior")]
        int_ior: f32,
        #[serde(default = "default_ext_ior")]
        ext_ior: f32,
        #[serde(default = "default_albedo")]
        kd: [f32; 3],
    },
}

impl Default for BsdfInfo {
    fn default() -> Self {
        BsdfInfo::Lambertian {
            albedo: default_albedo(),
        }
    }
}

fn default_albedo() -> [f32; 3] {
    [0.5; 3]
}

fn default_alpha() -> f32 {
    0.1
}

// Borosilicate glass
fn default_int_ior() -> f32 {
    1.5046
}

// Air
fn default_ext_ior() -> f32 {
    1.000277
}

/// A material entry keyed by mesh material `name` and/or by `node` name.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MaterialInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node: Option<String>,
    #[serde(flatten)]
    pub bsdf: BsdfInfo,
}

/// Light descriptions, tagged by `type`.
///
/// Point and area lights are positioned relative to the node they name;
/// ambient lights are global.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LightInfo {
    Ambient {
        radiance: [f32; 3],
        /// Occlusion range; missing or zero means unbounded.
        #[serde(default)]
        range: Option<f32>,
    },
    Point {
        node: String,
        #[serde(default)]
        position: [f32; 3],
        power: [f32; 3],
    },
    Area {
        node: String,
        #[serde(default)]
        position: [f32; 3],
        normal: [f32; 3],
        up: [f32; 3],
        /// Width and height of the rectangle
        size: [f32; 2],
        power: [f32; 3],
    },
}

impl LightInfo {
    /// Node the light is attached to, `None` for ambient lights.
    pub fn node(&self) -> Option<&str> {
        match self {
            LightInfo::Ambient { .. } => None,
            LightInfo::Point { node, .. } | LightInfo::Area { node, .. } => Some(node),
        }
    }
}

/// Camera description in the local space of `node`.
///
/// `look` is a view direction, not a target point. `hfov` is in degrees;
/// a missing `far` means unbounded.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraInfo {
    pub node: String,
    pub position: [f32; 3],
    pub look: [f32; 3],
    pub up: [f32; 3],
    pub hfov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: Option<f32>,
}

impl Default for CameraInfo {
    fn default() -> Self {
        Self {
            node: String::new(),
            position: [0.0; 3],
            look: [0.0, 0.0, -1.0],
            up: [0.0, 1.0, 0.0],
            hfov: 30.0,
            aspect: 1.0,
            near: 0.0,
            far: None,
        }
    }
}

/// One node of an explicit hierarchy.
///
/// `matrix` (column-major) takes precedence over the
/// translation/rotation/scale components.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeInfo {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matrix: Option<[f32; 16]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translation: Option<[f32; 3]>,
    /// Quaternion as `[x, y, z, w]`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation: Option<[f32; 4]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<[f32; 3]>,
    /// OBJ model names placed under this node
    pub meshes: Vec<String>,
    pub children: Vec<NodeInfo>,
}

impl NodeInfo {
    pub fn local_transform(&self) -> Mat4 {
        if let Some(m) = self.matrix {
            return Mat4::from_cols_array(&m);
        }
        Transform {
            translation: self.translation.map(Vec3::from).unwrap_or(Vec3::ZERO),
            rotation: self
                .rotation
                .map(|q| Quat::from_array(q).normalize())
                .unwrap_or(Quat::IDENTITY),
            scale: self.scale.map(Vec3::from).unwrap_or(Vec3::ONE),
        }
        .to_matrix()
    }
}
