//! Binding of user-supplied textures to configured parts.
//!
//! Parts usually share materials with their siblings (every door of a
//! cabinet uses the same "door" material). Before the first texture is
//! bound to a part, the binder gives that part private copies of all its
//! materials, so a texture on one door never leaks onto another. The copies
//! live as long as the model; resetting only restores their parameters.
//!
//! Targets may be nested (a whole carcass and its top panel). Every node
//! shows the copy of at most one binding, the one of its closest bound
//! target, and copies are always taken from the node's shared material.
//!
//! Loading is split from binding. A [`TextureRequest`] carries everything
//! needed to fetch and decode the image and can be awaited anywhere; the
//! resulting [`TextureLoad`] is handed back to [`TextureBinder::finish`],
//! which drops it if the model changed in the meantime.

use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use image::RgbaImage;

use crate::{
    config::ModelConfig,
    data_structures::{
        material::{Material, MaterialId},
        scene_graph::{NodeId, SceneGraph},
        texture::{Texture, TextureId, UvTransform},
    },
    error::ConfiguratorError,
    registry::ObjectRegistry,
    resources::texture::{TextureSource, load_image},
};

/// A pending texture load for one or more parts.
#[derive(Clone, Debug)]
pub struct TextureRequest {
    pub generation: u64,
    pub targets: Vec<(String, UvTransform)>,
    pub source: TextureSource,
}

impl TextureRequest {
    /// Fetch and decode the image. Never touches the scene.
    pub async fn load(self) -> TextureLoad {
        let result = load_image(&self.source).await.map(Arc::new);
        if let Err(e) = &result {
            log::warn!("Texture {} failed to load: {:#}", self.source.label(), e);
        }
        TextureLoad {
            generation: self.generation,
            label: self.source.label(),
            targets: self.targets,
            result,
        }
    }
}

/// A finished texture load, ready to be bound.
#[derive(Debug)]
pub struct TextureLoad {
    pub generation: u64,
    pub label: String,
    pub targets: Vec<(String, UvTransform)>,
    pub result: anyhow::Result<Arc<RgbaImage>>,
}

#[derive(Debug, Default)]
struct Binding {
    texture: Option<TextureId>,
    owns_material_copy: bool,
    /// Private material copies of the part and the parameters they started with.
    copies: Vec<(MaterialId, Material)>,
}

/// The binding whose private copy a node currently shows.
#[derive(Clone, Copy, Debug)]
struct CopyOwner {
    target: NodeId,
    shared: MaterialId,
}

#[derive(Debug, Default)]
pub struct TextureBinder {
    bindings: HashMap<String, Binding>,
    owners: HashMap<NodeId, CopyOwner>,
}

impl TextureBinder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_texture(&self, part: &str) -> Option<TextureId> {
        self.bindings.get(part).and_then(|binding| binding.texture)
    }

    pub fn owns_material_copy(&self, part: &str) -> bool {
        self.bindings
            .get(part)
            .is_some_and(|binding| binding.owns_material_copy)
    }

    /// Parts that currently show a user texture, sorted.
    pub fn bound_parts(&self) -> Vec<&str> {
        let mut parts: Vec<&str> = self
            .bindings
            .iter()
            .filter(|(_, binding)| binding.texture.is_some())
            .map(|(name, _)| name.as_str())
            .collect();
        parts.sort_unstable();
        parts
    }

    /// UV configuration for `part`: explicit, else the configured one, else the default.
    fn uv_for(config: &ModelConfig, part: &str, uv: Option<UvTransform>) -> UvTransform {
        uv.or_else(|| config.texture_target(part).and_then(|target| target.uv))
            .unwrap_or_default()
    }

    /// Prepare a load for a single part.
    pub fn request(
        config: &ModelConfig,
        registry: &ObjectRegistry,
        part: &str,
        source: TextureSource,
        uv: Option<UvTransform>,
        generation: u64,
    ) -> Result<TextureRequest, ConfiguratorError> {
        if !registry.contains(part) {
            log::warn!("textureTargets references unknown object {}", part);
            return Err(ConfiguratorError::missing(part, "textureTargets"));
        }
        Ok(TextureRequest {
            generation,
            targets: vec![(part.to_string(), Self::uv_for(config, part, uv))],
            source,
        })
    }

    /**
     * Prepare a load of one image for every configured texture target.
     *
     * Targets named in `exclude` are skipped, targets missing from the
     * registry are reported and skipped. Each target keeps its own UV
     * configuration.
     */
    pub fn request_global(
        config: &ModelConfig,
        registry: &ObjectRegistry,
        source: TextureSource,
        exclude: &[String],
        generation: u64,
    ) -> (TextureRequest, Vec<ConfiguratorError>) {
        let mut errors = Vec::new();
        let mut targets = Vec::new();
        for target in &config.texture_targets {
            if exclude.contains(&target.name) {
                continue;
            }
            if !registry.contains(&target.name) {
                log::warn!("textureTargets references unknown object {}", target.name);
                errors.push(ConfiguratorError::missing(&target.name, "textureTargets"));
                continue;
            }
            targets.push((target.name.clone(), target.uv.unwrap_or_default()));
        }
        let request = TextureRequest {
            generation,
            targets,
            source,
        };
        (request, errors)
    }

    /**
     * Bind a finished load.
     *
     * Loads of another generation are discarded without touching anything.
     * A failed load leaves every existing binding as it is.
     */
    pub fn finish(
        &mut self,
        load: TextureLoad,
        registry: &mut ObjectRegistry,
        generation: u64,
    ) -> Vec<ConfiguratorError> {
        if load.generation != generation {
            log::info!(
                "Dropping texture {} of generation {} (current {})",
                load.label,
                load.generation,
                generation
            );
            return vec![ConfiguratorError::StaleResultDiscarded {
                requested: load.generation,
                current: generation,
            }];
        }
        let image = match load.result {
            Ok(image) => image,
            Err(error) => {
                let target = load
                    .targets
                    .iter()
                    .map(|(name, _)| name.as_str())
                    .collect::<Vec<_>>()
                    .join(", ");
                return vec![ConfiguratorError::TextureLoadFailed { target, error }];
            }
        };
        load.targets
            .into_iter()
            .filter_map(|(part, uv)| {
                self.bind(registry, &part, image.clone(), uv, &load.label)
                    .err()
            })
            .collect()
    }

    /**
     * Show `image` on `part`.
     *
     * Order matters: the new texture is created and assigned first, the
     * previous one is disposed only afterwards.
     */
    pub fn bind(
        &mut self,
        registry: &mut ObjectRegistry,
        part: &str,
        image: Arc<RgbaImage>,
        uv: UvTransform,
        label: &str,
    ) -> Result<TextureId, ConfiguratorError> {
        let Some(node) = registry.get(part) else {
            log::warn!("textureTargets references unknown object {}", part);
            return Err(ConfiguratorError::missing(part, "textureTargets"));
        };
        let binding = self.bindings.entry(part.to_string()).or_default();
        let scene = registry.scene_mut();

        if !binding.owns_material_copy {
            binding.copies = copy_on_write(scene, &mut self.owners, node);
            binding.owns_material_copy = true;
            log::debug!("{} got {} private materials", part, binding.copies.len());
        }

        let texture = scene
            .textures_mut()
            .insert(Texture::new(format!("{part}:{label}"), image, uv));
        for (material, _) in &binding.copies {
            if let Some(m) = scene.material_mut(*material) {
                m.color_map = Some(texture);
            }
            scene.mark_material_dirty(*material);
        }
        if let Some(previous) = binding.texture.replace(texture) {
            scene.textures_mut().dispose(previous);
        }
        log::info!("Bound texture {} to {}", label, part);
        Ok(texture)
    }

    /// Remove the user texture of `part` and restore its original material parameters.
    pub fn reset(&mut self, registry: &mut ObjectRegistry, part: &str) -> bool {
        let Some(binding) = self.bindings.get_mut(part) else {
            return false;
        };
        let scene = registry.scene_mut();
        if let Some(texture) = binding.texture.take() {
            scene.textures_mut().dispose(texture);
        }
        for (material, original) in &binding.copies {
            if let Some(m) = scene.material_mut(*material) {
                *m = original.clone();
            }
            scene.mark_material_dirty(*material);
        }
        true
    }

    /// Forget every binding. The textures themselves go with the registry.
    pub fn clear(&mut self) {
        self.bindings.clear();
        self.owners.clear();
    }
}

/// `node` and its descendants that carry a material, in traversal order.
fn node_materials(scene: &SceneGraph, node: NodeId) -> Vec<(NodeId, MaterialId)> {
    scene
        .descendants(node)
        .into_iter()
        .filter_map(|id| Some((id, scene.node(id)?.material?)))
        .collect()
}

/**
 * Give the material users below `target` private copies.
 *
 * Nodes already showing the copy of a binding further down the hierarchy are
 * left to it. Nodes showing the copy of an enclosing target are taken over,
 * their new copy starts again from the shared material.
 */
fn copy_on_write(
    scene: &mut SceneGraph,
    owners: &mut HashMap<NodeId, CopyOwner>,
    target: NodeId,
) -> Vec<(MaterialId, Material)> {
    let mut copies: BTreeMap<MaterialId, MaterialId> = BTreeMap::new();
    let mut captured = Vec::new();
    for (node, current) in node_materials(scene, target) {
        let shared = match owners.get(&node) {
            None => current,
            Some(owner) if owner.target != target && scene.ancestors(owner.target).any(|id| id == target) => {
                continue;
            }
            Some(owner) => owner.shared,
        };
        let copy = match copies.get(&shared) {
            Some(copy) => *copy,
            None => {
                let Some(original) = scene.material(shared).cloned() else {
                    continue;
                };
                let copy = scene.add_material(original.clone());
                copies.insert(shared, copy);
                captured.push((copy, original));
                copy
            }
        };
        if let Some(n) = scene.node_mut(node) {
            n.material = Some(copy);
        }
        owners.insert(node, CopyOwner { target, shared });
    }
    captured
}
