//! Door/panel preset resolution.
//!
//! A preset is addressed by the number of doors and the position of the
//! door block. Resolving one is a pure computation over the configuration and
//! the registry; [`PresetResolver::apply`] then writes the result into the
//! scene. Every resolution starts from the same baseline (all doors and
//! panels of every variant hidden, drawers at their load-time visibility) so
//! that switching between presets never leaves parts of the previous one
//! behind.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::{
    config::ModelConfig,
    error::ConfiguratorError,
    interaction::InteractionStateMachine,
    registry::ObjectRegistry,
};

/// Which flavour of door a preset shows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DoorVariant {
    #[default]
    Solid,
    Transparent,
}

/// Outcome of resolving one preset. `to_show` and `to_hide` never overlap.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PresetResolution {
    pub to_show: BTreeSet<String>,
    pub to_hide: BTreeSet<String>,
    /// Drawers that are snapped back to their closed pose.
    pub reset: Vec<String>,
    /// Names of the selection that the registry does not know.
    pub missing: Vec<String>,
}

impl PresetResolution {
    pub fn is_visible(&self, name: &str) -> Option<bool> {
        if self.to_show.contains(name) {
            Some(true)
        } else if self.to_hide.contains(name) {
            Some(false)
        } else {
            None
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct PresetResolver {
    drawer_defaults: BTreeMap<String, bool>,
}

impl PresetResolver {
    /// Remember the visibility of every drawer. Call after the initial state was applied.
    pub fn capture(config: &ModelConfig, registry: &ObjectRegistry) -> Self {
        let drawer_defaults = config
            .drawers()
            .filter_map(|name| Some((name.to_string(), registry.is_visible(name)?)))
            .collect();
        Self { drawer_defaults }
    }

    pub fn drawer_default(&self, name: &str) -> Option<bool> {
        self.drawer_defaults.get(name).copied()
    }

    /**
     * Every registered door and panel name of every variant.
     *
     * Collected from all selections of all presets and from both sides of
     * the variant map. Drawers are excluded, they have their own baseline.
     */
    pub fn door_universe(&self, config: &ModelConfig, registry: &ObjectRegistry) -> BTreeSet<String> {
        let presets = &config.presets;
        let from_selections = presets
            .door_selections
            .values()
            .flat_map(BTreeMap::values)
            .flat_map(|selection| selection.show.doors.iter().chain(&selection.show.panels));
        let from_variants = presets
            .variant_map
            .iter()
            .flat_map(|(solid, transparent)| [solid, transparent]);
        from_selections
            .chain(from_variants)
            .filter(|name| registry.contains(name) && !self.drawer_defaults.contains_key(*name))
            .cloned()
            .collect()
    }

    /**
     * Compute which parts are shown and hidden for a preset.
     *
     * Returns `None` if no selection exists for `door_count`/`position`.
     * The rules are applied in a fixed order on one name -> visible map, so a
     * later rule overrides an earlier one: baseline, doors (with variant
     * substitution), panels and finally the hide list. Hide therefore always
     * wins over show.
     */
    pub fn resolve(
        &self,
        config: &ModelConfig,
        registry: &ObjectRegistry,
        door_count: u32,
        position: u32,
        variant: DoorVariant,
    ) -> Option<PresetResolution> {
        let Some(selection) = config.presets.selection(door_count, position) else {
            log::warn!("No preset for {} doors at position {}", door_count, position);
            return None;
        };

        let mut visibility: BTreeMap<String, bool> = self
            .door_universe(config, registry)
            .into_iter()
            .map(|name| (name, false))
            .collect();
        visibility.extend(
            self.drawer_defaults
                .iter()
                .map(|(name, visible)| (name.clone(), *visible)),
        );

        let mut missing = Vec::new();
        let mut set = |name: &str, visible: bool| {
            if registry.contains(name) {
                visibility.insert(name.to_string(), visible);
            } else {
                log::warn!("presets references unknown object {}", name);
                missing.push(name.to_string());
            }
        };

        for door in &selection.show.doors {
            let substitute = match variant {
                DoorVariant::Transparent => config.presets.transparent_of(door),
                DoorVariant::Solid => config.presets.solid_of(door),
            };
            match substitute.filter(|name| registry.contains(name)) {
                Some(name) => set(name, true),
                None => set(door, true),
            }
        }
        for panel in &selection.show.panels {
            set(panel, true);
        }
        for hidden in &selection.hide {
            set(hidden, false);
        }

        let (shown, hidden): (Vec<_>, Vec<_>) =
            visibility.into_iter().partition(|(_, visible)| *visible);
        missing.sort_unstable();
        missing.dedup();
        Some(PresetResolution {
            to_show: shown.into_iter().map(|(name, _)| name).collect(),
            to_hide: hidden.into_iter().map(|(name, _)| name).collect(),
            reset: self.drawer_defaults.keys().cloned().collect(),
            missing,
        })
    }

    /// Write a resolution into the scene and close the reset drawers.
    pub fn apply(
        &self,
        resolution: &PresetResolution,
        registry: &mut ObjectRegistry,
        interactions: &mut InteractionStateMachine,
    ) -> Vec<ConfiguratorError> {
        let mut errors: Vec<ConfiguratorError> = resolution
            .missing
            .iter()
            .map(|name| ConfiguratorError::missing(name, "presets"))
            .collect();
        let updates = resolution
            .to_hide
            .iter()
            .map(|name| (name, false))
            .chain(resolution.to_show.iter().map(|name| (name, true)));
        for (name, visible) in updates {
            if let Err(e) = registry.set_visible(name, visible, "presets") {
                errors.push(e);
            }
        }
        for drawer in &resolution.reset {
            interactions.reset(drawer, registry.scene_mut());
        }
        log::info!(
            "Applied preset: {} shown, {} hidden",
            resolution.to_show.len(),
            resolution.to_hide.len()
        );
        errors
    }
}
