//! Glint Core - Scene description and asset import.
//!
//! This crate provides:
//!
//! - **Scene types**: `SceneNode`, `Mesh`, `Transform`
//! - **Scene info**: the JSON companion file (lights, materials, camera)
//! - **Import**: OBJ loading and node hierarchy assembly
//!
//! # Example
//!
//! ```ignore
//! use glint_core::{import_scene, ResourceLayout, SceneInfo};
//!
//! let files = ResourceLayout::default().scene_files("bunnyscene.dae");
//! let info = SceneInfo::load_or_default(&files.info);
//! let scene = import_scene(&files, &info)?;
//! println!("Loaded {} meshes", scene.meshes.len());
//! ```

pub mod import;
pub mod info;
pub mod mesh;
pub mod node;

// Re-export commonly used types
pub use import::{import_scene, load_obj, ImportedScene, LoadError, ResourceLayout, SceneFiles};
pub use info::{BsdfInfo, CameraInfo, LightInfo, MaterialInfo, NodeInfo, SceneInfo};
pub use mesh::Mesh;
pub use node::{SceneNode, Transform};
