//! Applies the declarative initial state of a model.

use cgmath::Vector3;

use crate::{
    camera::Camera,
    config::ModelConfig,
    data_structures::instance::euler_from_degrees,
    error::ConfiguratorError,
    registry::ObjectRegistry,
};

/**
 * Apply `hiddenInitially`, per-part `initialState` overrides and the camera
 * pose, in that order.
 *
 * The blanket hide list runs first so that an explicit `initialState` can show
 * a part again. Applying twice yields the same scene. Unknown names are
 * skipped and returned.
 */
pub fn apply_initial_state(
    config: &ModelConfig,
    registry: &mut ObjectRegistry,
    camera: &mut Camera,
) -> Vec<ConfiguratorError> {
    let mut errors = Vec::new();

    for name in &config.hidden_initially {
        if let Err(e) = registry.set_visible(name, false, "hiddenInitially") {
            errors.push(e);
        }
    }

    for (_, part) in config.parts() {
        let Some(initial) = &part.initial_state else {
            continue;
        };
        let Some(node) = registry.node_mut(&part.name) else {
            log::warn!("interactionGroups references unknown object {}", part.name);
            errors.push(ConfiguratorError::missing(&part.name, "interactionGroups"));
            continue;
        };
        if let Some(visible) = initial.visible {
            node.visible = visible;
        }
        if let Some(position) = initial.position {
            node.transform.position = Vector3::from(position);
        }
        if let Some(rotation) = initial.rotation {
            node.transform.rotation = euler_from_degrees(rotation);
        }
        if let Some(scale) = initial.scale {
            node.transform.scale = Vector3::from(scale);
        }
    }

    if let Some(pose) = &config.camera {
        camera.set_pose(pose);
    }

    errors
}
