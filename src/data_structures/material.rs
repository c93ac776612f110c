//! Surface materials.
//!
//! Materials live in the material table of a [`super::scene_graph::SceneGraph`]
//! and are shared by every node that points at the same [`MaterialId`]. Anything
//! that wants a single part to look different has to clone first; see
//! [`crate::binder`].

use super::texture::TextureId;

/// Stable handle of a material inside a scene graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialId(pub(crate) usize);

/// PBR metallic-roughness parameters plus an optional color map.
#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    pub name: String,
    pub base_color: [f32; 4],
    pub color_map: Option<TextureId>,
    pub metallic: f32,
    pub roughness: f32,
    pub transparent: bool,
    pub opacity: f32,
}

impl Material {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_base_color(mut self, base_color: [f32; 4]) -> Self {
        self.base_color = base_color;
        self
    }

    pub fn with_color_map(mut self, color_map: TextureId) -> Self {
        self.color_map = Some(color_map);
        self
    }

    /// Glass-like material as used by transparent door variants.
    pub fn glass(name: impl Into<String>, opacity: f32) -> Self {
        Self {
            name: name.into(),
            transparent: true,
            opacity,
            roughness: 0.05,
            ..Default::default()
        }
    }
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: String::from("default"),
            base_color: [1.0, 1.0, 1.0, 1.0],
            color_map: None,
            metallic: 0.0,
            roughness: 1.0,
            transparent: false,
            opacity: 1.0,
        }
    }
}
