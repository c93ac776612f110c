//! Switchable lights.
//!
//! Configured lights are scene nodes (punctual lights or emissive panels)
//! that the user can switch on and off. Off means intensity 0 and hidden.

use std::collections::BTreeMap;

use crate::{
    config::{LightState, ModelConfig},
    data_structures::scene_graph::Light,
    error::ConfiguratorError,
    registry::ObjectRegistry,
};

#[derive(Clone, Debug)]
struct LightEntry {
    intensity: f32,
    on: bool,
}

#[derive(Clone, Debug, Default)]
pub struct LightToggleRegistry {
    lights: BTreeMap<String, LightEntry>,
}

impl LightToggleRegistry {
    pub fn new(config: &ModelConfig) -> Self {
        let lights = config
            .lights
            .iter()
            .map(|light| {
                let entry = LightEntry {
                    intensity: light.intensity,
                    on: light.default_state == LightState::On,
                };
                (light.name.clone(), entry)
            })
            .collect();
        Self { lights }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.lights.keys().map(String::as_str)
    }

    pub fn is_on(&self, name: &str) -> Option<bool> {
        self.lights.get(name).map(|entry| entry.on)
    }

    /// Put every light into its configured default state.
    pub fn apply_defaults(&mut self, config: &ModelConfig, registry: &mut ObjectRegistry) -> Vec<ConfiguratorError> {
        config
            .lights
            .iter()
            .filter_map(|light| {
                self.toggle_light(&light.name, light.default_state == LightState::On, registry)
                    .err()
            })
            .collect()
    }

    pub fn toggle_light(
        &mut self,
        name: &str,
        on: bool,
        registry: &mut ObjectRegistry,
    ) -> Result<(), ConfiguratorError> {
        let Some(entry) = self.lights.get_mut(name) else {
            log::warn!("{} is not a configured light", name);
            return Err(ConfiguratorError::missing(name, "lights"));
        };
        let Some(node) = registry.node_mut(name) else {
            log::warn!("lights references unknown object {}", name);
            return Err(ConfiguratorError::missing(name, "lights"));
        };
        node.light.get_or_insert_with(Light::default).intensity =
            if on { entry.intensity } else { 0.0 };
        node.visible = on;
        entry.on = on;
        log::debug!("Light {} {}", name, if on { "on" } else { "off" });
        Ok(())
    }

    pub fn toggle_all(&mut self, on: bool, registry: &mut ObjectRegistry) -> Vec<ConfiguratorError> {
        let names: Vec<String> = self.lights.keys().cloned().collect();
        names
            .iter()
            .filter_map(|name| self.toggle_light(name, on, registry).err())
            .collect()
    }
}
