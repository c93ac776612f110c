//! Object registry: the merged scene of one model plus a name index.
//!
//! A model is usually split into several independently loaded fragments
//! (base structure, solid doors, glass doors, drawers). The registry moves all
//! of them into one [`SceneGraph`] and indexes every named node so that the
//! configuration can address parts by the names authored in the assets.

use std::collections::HashMap;

use crate::{
    data_structures::scene_graph::{NodeId, SceneGraph, SceneNode},
    error::ConfiguratorError,
};

/// One entry of the fragment list: what was requested and what arrived.
pub struct FragmentSlot {
    pub source: String,
    pub fragment: anyhow::Result<SceneGraph>,
}

impl FragmentSlot {
    pub fn loaded(source: impl Into<String>, fragment: SceneGraph) -> Self {
        Self {
            source: source.into(),
            fragment: Ok(fragment),
        }
    }

    pub fn failed(source: impl Into<String>, error: anyhow::Error) -> Self {
        Self {
            source: source.into(),
            fragment: Err(error),
        }
    }
}

#[derive(Debug, Default)]
pub struct ObjectRegistry {
    scene: SceneGraph,
    names: HashMap<String, NodeId>,
    /// Root nodes per fragment, `None` for slots that failed to load.
    fragment_roots: Vec<Option<Vec<NodeId>>>,
}

impl ObjectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /**
     * Merge `slots` in order and index every named node.
     *
     * Failed slots stay empty and are reported as `AssetLoadFailed`; the
     * remaining fragments are merged regardless. Unnamed nodes are kept in the
     * scene but are not addressable. If a name appears twice the later node
     * wins and the clash is logged.
     */
    pub fn build(slots: Vec<FragmentSlot>) -> (Self, Vec<ConfiguratorError>) {
        let mut registry = Self::new();
        let mut errors = Vec::new();
        for slot in slots {
            match slot.fragment {
                Ok(fragment) => {
                    let roots = registry.scene.append(fragment);
                    registry.index(&roots, &slot.source);
                    registry.fragment_roots.push(Some(roots));
                }
                Err(error) => {
                    log::error!("Fragment {} failed to load: {:#}", slot.source, error);
                    registry.fragment_roots.push(None);
                    errors.push(ConfiguratorError::AssetLoadFailed {
                        asset: slot.source,
                        error,
                    });
                }
            }
        }
        log::info!(
            "Registered {} named objects from {} fragments",
            registry.names.len(),
            registry.fragment_roots.len()
        );
        (registry, errors)
    }

    fn index(&mut self, roots: &[NodeId], source: &str) {
        for root in roots {
            for id in self.scene.descendants(*root) {
                let Some(name) = self.scene.node(id).and_then(SceneNode::name) else {
                    continue;
                };
                if let Some(previous) = self.names.insert(name.to_string(), id) {
                    log::warn!(
                        "Duplicate object name {} in {} ({:?} replaced by {:?}).",
                        name,
                        source,
                        previous,
                        id
                    );
                }
            }
        }
    }

    /**
     * Drop everything this registry owns.
     *
     * Returns the number of textures that were still alive and have now been
     * released.
     */
    pub fn release(&mut self) -> usize {
        let released = self.scene.textures_mut().dispose_all();
        if released > 0 {
            log::info!("Released {} textures of the previous model", released);
        }
        *self = Self::new();
        released
    }

    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut SceneGraph {
        &mut self.scene
    }

    pub fn get(&self, name: &str) -> Option<NodeId> {
        self.names.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    pub fn node(&self, name: &str) -> Option<&SceneNode> {
        self.get(name).and_then(|id| self.scene.node(id))
    }

    pub fn node_mut(&mut self, name: &str) -> Option<&mut SceneNode> {
        let id = self.get(name)?;
        self.scene.node_mut(id)
    }

    /// All addressable names, sorted, for building host controls.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.names.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn fragment_roots(&self) -> &[Option<Vec<NodeId>>] {
        &self.fragment_roots
    }

    /// Set the visibility of a named part. Missing names are logged and reported.
    pub fn set_visible(
        &mut self,
        name: &str,
        visible: bool,
        section: &'static str,
    ) -> Result<(), ConfiguratorError> {
        match self.node_mut(name) {
            Some(node) => {
                node.visible = visible;
                Ok(())
            }
            None => {
                log::warn!("{} references unknown object {}", section, name);
                Err(ConfiguratorError::missing(name, section))
            }
        }
    }

    pub fn is_visible(&self, name: &str) -> Option<bool> {
        self.node(name).map(|node| node.visible)
    }
}
