//! The per-model configuration document.
//!
//! A [`ModelConfig`] describes one product variant completely: which asset
//! fragments make up the scene, what is hidden on load, which parts open and
//! how, which door/panel combinations exist, the camera, the lights and the
//! surfaces that accept user textures. The engine has no per-product code;
//! everything product specific lives in these JSON documents (see
//! `assets/configs/`).

use std::collections::BTreeMap;

use cgmath::Deg;
use instant::Duration;
use serde::{Deserialize, Serialize};

use crate::{
    data_structures::{instance::Axis, texture::UvTransform},
    error::ConfiguratorError,
    resources,
};

/// Default opening angle of doors that do not configure one.
pub const DEFAULT_DOOR_ANGLE: f32 = 90.0;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModelConfig {
    pub name: String,
    pub asset_sources: Vec<String>,
    pub hidden_initially: Vec<String>,
    pub interaction_groups: Vec<InteractionGroup>,
    pub presets: Presets,
    pub camera: Option<CameraPose>,
    pub lights: Vec<LightConfig>,
    pub texture_targets: Vec<TextureTarget>,
    pub animation: AnimationSettings,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartKind {
    Door,
    Drawer,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionGroup {
    pub kind: PartKind,
    #[serde(default)]
    pub parts: Vec<PartConfig>,
}

/// One clickable door or drawer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartConfig {
    pub name: String,
    pub axis: Axis,
    /// Degrees added to the rest rotation on `axis` when a door opens.
    #[serde(default)]
    pub open_angle: Option<f32>,
    /// Distance a drawer slides along `axis` when it opens.
    #[serde(default)]
    pub open_offset: Option<f32>,
    /// Authored closed position on `axis`, overrides the asset's rest position.
    #[serde(default)]
    pub closed_position: Option<f32>,
    #[serde(default)]
    pub initial_state: Option<InitialState>,
    /// Secondary parts that move in lockstep with this one.
    #[serde(default)]
    pub linked: Vec<LinkedPart>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkedPart {
    pub name: String,
    pub axis: Axis,
    #[serde(default)]
    pub open_angle: Option<f32>,
    #[serde(default)]
    pub open_offset: Option<f32>,
}

/// How a part moves from its rest pose to its open pose.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Motion {
    Rotate { axis: Axis, angle: Deg<f32> },
    Slide { axis: Axis, offset: f32 },
}

impl PartConfig {
    pub fn motion(&self, kind: PartKind) -> Option<Motion> {
        match kind {
            PartKind::Door => Some(Motion::Rotate {
                axis: self.axis,
                angle: Deg(self.open_angle.unwrap_or(DEFAULT_DOOR_ANGLE)),
            }),
            PartKind::Drawer => self.open_offset.map(|offset| Motion::Slide {
                axis: self.axis,
                offset,
            }),
        }
    }
}

impl LinkedPart {
    pub fn motion(&self) -> Option<Motion> {
        match (self.open_angle, self.open_offset) {
            (Some(angle), _) => Some(Motion::Rotate {
                axis: self.axis,
                angle: Deg(angle),
            }),
            (None, Some(offset)) => Some(Motion::Slide {
                axis: self.axis,
                offset,
            }),
            (None, None) => None,
        }
    }
}

/// Authored overrides applied once on load; rotation is in degrees.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InitialState {
    pub visible: Option<bool>,
    pub position: Option<[f32; 3]>,
    pub rotation: Option<[f32; 3]>,
    pub scale: Option<[f32; 3]>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Presets {
    /// `doorCount -> position -> selection`
    pub door_selections: BTreeMap<u32, BTreeMap<u32, DoorSelection>>,
    /// Solid part name to its transparent counterpart.
    pub variant_map: BTreeMap<String, String>,
}

impl Presets {
    pub fn selection(&self, door_count: u32, position: u32) -> Option<&DoorSelection> {
        self.door_selections.get(&door_count)?.get(&position)
    }

    /// Transparent counterpart of a solid name.
    pub fn transparent_of(&self, name: &str) -> Option<&str> {
        self.variant_map.get(name).map(String::as_str)
    }

    /// Solid counterpart of a transparent name.
    pub fn solid_of(&self, name: &str) -> Option<&str> {
        self.variant_map
            .iter()
            .find(|(_, transparent)| transparent.as_str() == name)
            .map(|(solid, _)| solid.as_str())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DoorSelection {
    pub show: ShowSet,
    pub hide: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShowSet {
    pub doors: Vec<String>,
    pub panels: Vec<String>,
}

/// Initial camera pose, `fov` is the vertical field of view in degrees.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraPose {
    pub position: [f32; 3],
    pub target: [f32; 3],
    #[serde(default = "default_fov")]
    pub fov: f32,
}

fn default_fov() -> f32 {
    45.0
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LightState {
    #[default]
    On,
    Off,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LightConfig {
    pub name: String,
    #[serde(default)]
    pub default_state: LightState,
    #[serde(default = "default_intensity")]
    pub intensity: f32,
}

fn default_intensity() -> f32 {
    1.0
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextureTarget {
    pub name: String,
    #[serde(default)]
    pub uv: Option<UvTransform>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnimationSettings {
    pub duration_ms: u64,
}

impl Default for AnimationSettings {
    fn default() -> Self {
        Self { duration_ms: 1000 }
    }
}

impl ModelConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfiguratorError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a configuration document through the asset loader.
    pub async fn load(file_name: &str) -> Result<Self, ConfiguratorError> {
        let json = resources::load_string(file_name)
            .await
            .map_err(|error| ConfiguratorError::AssetLoadFailed {
                asset: file_name.to_string(),
                error,
            })?;
        Self::from_json(&json)
    }

    pub fn animation_duration(&self) -> Duration {
        Duration::from_millis(self.animation.duration_ms)
    }

    /// Every interactive part together with the kind of its group.
    pub fn parts(&self) -> impl Iterator<Item = (PartKind, &PartConfig)> {
        self.interaction_groups
            .iter()
            .flat_map(|group| group.parts.iter().map(move |part| (group.kind, part)))
    }

    pub fn part(&self, name: &str) -> Option<(PartKind, &PartConfig)> {
        self.parts().find(|(_, part)| part.name == name)
    }

    pub fn drawers(&self) -> impl Iterator<Item = &str> {
        self.parts()
            .filter(|(kind, _)| *kind == PartKind::Drawer)
            .map(|(_, part)| part.name.as_str())
    }

    pub fn doors(&self) -> impl Iterator<Item = &str> {
        self.parts()
            .filter(|(kind, _)| *kind == PartKind::Door)
            .map(|(_, part)| part.name.as_str())
    }

    pub fn texture_target(&self, name: &str) -> Option<&TextureTarget> {
        self.texture_targets.iter().find(|target| target.name == name)
    }

    /**
     * Every part name the document mentions, tagged with the section it
     * appears in. Used to report references that the loaded assets do not
     * provide.
     */
    pub fn referenced_names(&self) -> Vec<(&'static str, &str)> {
        let mut names: Vec<(&'static str, &str)> = Vec::new();
        names.extend(self.hidden_initially.iter().map(|n| ("hiddenInitially", n.as_str())));
        for (_, part) in self.parts() {
            names.push(("interactionGroups", part.name.as_str()));
            names.extend(part.linked.iter().map(|l| ("interactionGroups", l.name.as_str())));
        }
        for selection in self.presets.door_selections.values().flat_map(BTreeMap::values) {
            names.extend(selection.show.doors.iter().map(|n| ("presets", n.as_str())));
            names.extend(selection.show.panels.iter().map(|n| ("presets", n.as_str())));
            names.extend(selection.hide.iter().map(|n| ("presets", n.as_str())));
        }
        names.extend(self.lights.iter().map(|l| ("lights", l.name.as_str())));
        names.extend(self.texture_targets.iter().map(|t| ("textureTargets", t.name.as_str())));
        names.sort_unstable();
        names.dedup();
        names
    }
}
