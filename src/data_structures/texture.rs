//! CPU-side textures and the texture store.
//!
//! This module provides [`Texture`], a decoded image together with the UV
//! configuration it should be sampled with, and [`TextureStore`], the slot
//! table that owns every texture of a scene. Renderers upload what they find
//! here; the engine itself never touches a GPU.

use std::sync::Arc;

use cgmath::{Deg, Matrix3, Rad, Vector3};
use image::RgbaImage;
use serde::{Deserialize, Serialize};

/// How UV coordinates outside of `0..1` are resolved.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WrapMode {
    Repeat,
    #[default]
    ClampToEdge,
    MirroredRepeat,
}

/// UV transform of a dynamically bound texture.
///
/// The fields mirror what product designers author per texturable surface:
/// an offset, a repeat count, a rotation (degrees) around a pivot, the wrap
/// mode and whether rows are flipped on upload.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UvTransform {
    pub offset_x: f32,
    pub offset_y: f32,
    pub center_x: f32,
    pub center_y: f32,
    pub rotation: f32,
    pub repeat_x: f32,
    pub repeat_y: f32,
    pub flip_y: bool,
    pub wrap_mode: WrapMode,
}

impl Default for UvTransform {
    fn default() -> Self {
        Self {
            offset_x: 0.0,
            offset_y: 0.0,
            center_x: 0.0,
            center_y: 0.0,
            rotation: 0.0,
            repeat_x: 1.0,
            repeat_y: 1.0,
            flip_y: true,
            wrap_mode: WrapMode::ClampToEdge,
        }
    }
}

impl UvTransform {
    /**
     * The 3x3 matrix that maps mesh UVs to texture UVs.
     *
     * Scale and rotation happen around (`center_x`, `center_y`), the offset is
     * applied last:
     *
     * | rx*c   rx*s   -rx*(c*cx + s*cy) + cx + ox |
     * | -ry*s  ry*c   -ry*(-s*cx + c*cy) + cy + oy |
     * | 0      0      1                            |
     */
    pub fn matrix(&self) -> Matrix3<f32> {
        let Rad(angle) = Rad::from(Deg(self.rotation));
        let (s, c) = angle.sin_cos();
        let (rx, ry) = (self.repeat_x, self.repeat_y);
        let (cx, cy) = (self.center_x, self.center_y);
        // cgmath takes columns
        Matrix3::from_cols(
            Vector3::new(rx * c, -ry * s, 0.0),
            Vector3::new(rx * s, ry * c, 0.0),
            Vector3::new(
                -rx * (c * cx + s * cy) + cx + self.offset_x,
                -ry * (-s * cx + c * cy) + cy + self.offset_y,
                1.0,
            ),
        )
    }

    pub fn apply(&self, uv: [f32; 2]) -> [f32; 2] {
        let mapped = self.matrix() * Vector3::new(uv[0], uv[1], 1.0);
        [mapped.x, mapped.y]
    }
}

/// Stable handle of a texture inside a [`TextureStore`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub(crate) usize);

/// A decoded texture and the way it has to be sampled.
///
/// The pixel data sits behind an [`Arc`] so that one uploaded image can back
/// the textures of many parts, each with its own UV configuration.
#[derive(Clone, Debug)]
pub struct Texture {
    pub label: String,
    pub image: Arc<RgbaImage>,
    pub uv: UvTransform,
}

impl Texture {
    pub fn new(label: impl Into<String>, image: Arc<RgbaImage>, uv: UvTransform) -> Self {
        Self {
            label: label.into(),
            image,
            uv,
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}

/**
 * Owner of all textures of a scene.
 *
 * Disposed slots stay empty so that handles are never reused within one
 * store; a handle that was disposed once can not accidentally point at a
 * newer texture.
 */
#[derive(Debug, Default)]
pub struct TextureStore {
    slots: Vec<Option<Texture>>,
}

impl TextureStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, texture: Texture) -> TextureId {
        self.slots.push(Some(texture));
        TextureId(self.slots.len() - 1)
    }

    pub fn get(&self, id: TextureId) -> Option<&Texture> {
        self.slots.get(id.0).and_then(Option::as_ref)
    }

    /// Release a texture. Returns `false` (and logs) if it was already gone.
    pub fn dispose(&mut self, id: TextureId) -> bool {
        match self.slots.get_mut(id.0).and_then(Option::take) {
            Some(texture) => {
                log::debug!("Disposed texture {:?} ({})", id, texture.label);
                true
            }
            None => {
                log::warn!("Texture {:?} was disposed twice or never existed.", id);
                false
            }
        }
    }

    /// Release every texture, returning how many were still alive.
    pub fn dispose_all(&mut self) -> usize {
        let live = self.live();
        self.slots.iter_mut().for_each(|slot| *slot = None);
        live
    }

    /// Number of textures that are currently alive.
    pub fn live(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /**
     * Moves every slot of `other` into `self`.
     *
     * Returns the id offset the caller has to add to handles that pointed into `other`.
     */
    pub(crate) fn append(&mut self, other: TextureStore) -> usize {
        let offset = self.slots.len();
        self.slots.extend(other.slots);
        offset
    }
}
