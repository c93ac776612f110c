//! The host-facing entry point.
//!
//! A [`Viewer`] owns the active model and every component that works on it.
//! Hosts drive it from their event loop: forward window events, call
//! [`Viewer::update`] once per frame and render whatever the scene graph
//! says. All mutation happens through `&mut Viewer` on the caller's thread;
//! the only asynchronous pieces are fragment and texture loads, which are
//! awaited by the host and handed back afterwards.
//!
//! Each model load bumps a generation counter. Results that were requested
//! for an older generation are dropped, so a slow texture download can never
//! land on the next model.

use instant::Duration;
use winit::{
    dpi::{PhysicalPosition, PhysicalSize},
    event::WindowEvent,
};

use crate::{
    binder::{TextureBinder, TextureLoad, TextureRequest},
    camera::Camera,
    config::{ModelConfig, PartKind},
    data_structures::{scene_graph::SceneGraph, texture::UvTransform},
    error::ConfiguratorError,
    input::PointerState,
    interaction::{InteractionStateMachine, Phase},
    lights::LightToggleRegistry,
    pick::pick_part,
    preset::{DoorVariant, PresetResolution, PresetResolver},
    registry::{FragmentSlot, ObjectRegistry},
    resources::{self, texture::TextureSource},
    state::apply_initial_state,
};

/// The fragments of one model, waiting to be loaded.
#[derive(Clone, Debug)]
pub struct FragmentRequest {
    pub generation: u64,
    pub sources: Vec<String>,
}

impl FragmentRequest {
    pub async fn load(self) -> LoadedFragments {
        let fragments = resources::load_fragments(&self.sources).await;
        let slots = self
            .sources
            .into_iter()
            .zip(fragments)
            .map(|(source, fragment)| FragmentSlot { source, fragment })
            .collect();
        LoadedFragments {
            generation: self.generation,
            slots,
        }
    }
}

pub struct LoadedFragments {
    pub generation: u64,
    pub slots: Vec<FragmentSlot>,
}

#[derive(Debug, Default)]
pub struct Viewer {
    config: ModelConfig,
    generation: u64,
    registry: ObjectRegistry,
    interactions: InteractionStateMachine,
    presets: PresetResolver,
    binder: TextureBinder,
    lights: LightToggleRegistry,
    camera: Camera,
    pointer: PointerState,
    errors: Vec<ConfiguratorError>,
}

impl Viewer {
    pub fn new(viewport: PhysicalSize<u32>) -> Self {
        Self {
            pointer: PointerState::new(viewport),
            ..Default::default()
        }
    }

    fn report(&mut self, errors: impl IntoIterator<Item = ConfiguratorError>) {
        for error in errors {
            log::debug!("Queued error: {}", error);
            self.errors.push(error);
        }
    }

    /// Errors collected since the last call, oldest first.
    pub fn take_errors(&mut self) -> Vec<ConfiguratorError> {
        std::mem::take(&mut self.errors)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn registry(&self) -> &ObjectRegistry {
        &self.registry
    }

    pub fn scene(&self) -> &SceneGraph {
        self.registry.scene()
    }

    /// Mutable scene access for renderers that consume dirty materials.
    pub fn scene_mut(&mut self) -> &mut SceneGraph {
        self.registry.scene_mut()
    }

    pub fn interactions(&self) -> &InteractionStateMachine {
        &self.interactions
    }

    pub fn binder(&self) -> &TextureBinder {
        &self.binder
    }

    pub fn lights(&self) -> &LightToggleRegistry {
        &self.lights
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn pointer(&self) -> &PointerState {
        &self.pointer
    }

    pub fn set_viewport(&mut self, viewport: PhysicalSize<u32>) {
        self.pointer.viewport = viewport;
    }

    /**
     * Start switching to `config`.
     *
     * Runs synchronously before anything of the new model is loaded: all
     * tweens stop, the textures and material copies of the old model are
     * released and every pending load of the old generation becomes stale.
     */
    pub fn switch_model(&mut self, config: ModelConfig) -> FragmentRequest {
        let cancelled = self.interactions.cancel_all();
        self.registry.release();
        self.binder.clear();
        self.interactions = InteractionStateMachine::default();
        self.presets = PresetResolver::default();
        self.lights = LightToggleRegistry::default();
        self.generation += 1;
        log::info!(
            "Switching to model {} (generation {}, {} tweens cancelled)",
            config.name,
            self.generation,
            cancelled
        );
        let sources = config.asset_sources.clone();
        self.config = config;
        FragmentRequest {
            generation: self.generation,
            sources,
        }
    }

    /// Install loaded fragments unless another model was requested meanwhile.
    pub fn finish_model_load(&mut self, loaded: LoadedFragments) -> bool {
        if loaded.generation != self.generation {
            log::info!(
                "Dropping fragments of generation {} (current {})",
                loaded.generation,
                self.generation
            );
            self.report([ConfiguratorError::StaleResultDiscarded {
                requested: loaded.generation,
                current: self.generation,
            }]);
            return false;
        }
        self.install_fragments(loaded.slots);
        true
    }

    /**
     * Build the model of the current generation from fragments already in memory.
     *
     * Order: registry, initial state, interaction baselines, preset drawer
     * defaults, light defaults. Names the configuration references but the
     * scene lacks are reported once each.
     */
    pub fn install_fragments(&mut self, slots: Vec<FragmentSlot>) {
        self.registry.release();
        self.binder.clear();
        let (registry, mut errors) = ObjectRegistry::build(slots);
        self.registry = registry;

        let mut component_errors = apply_initial_state(&self.config, &mut self.registry, &mut self.camera);
        let (interactions, register_errors) = InteractionStateMachine::register(&self.config, &mut self.registry);
        self.interactions = interactions;
        component_errors.extend(register_errors);
        self.presets = PresetResolver::capture(&self.config, &self.registry);
        self.lights = LightToggleRegistry::new(&self.config);
        component_errors.extend(self.lights.apply_defaults(&self.config, &mut self.registry));

        errors.extend(
            component_errors
                .into_iter()
                .filter(|e| !matches!(e, ConfiguratorError::ConfigReferenceMissing { .. })),
        );
        errors.extend(self.missing_references());
        log::info!(
            "Model {} ready: {} objects, {} interactive parts",
            self.config.name,
            self.registry.len(),
            self.interactions.names().len()
        );
        self.report(errors);
    }

    /// Every configured name that the loaded scene does not contain.
    pub fn missing_references(&self) -> Vec<ConfiguratorError> {
        self.config
            .referenced_names()
            .into_iter()
            .filter(|(_, name)| !self.registry.contains(name))
            .map(|(section, name)| ConfiguratorError::missing(name, section))
            .collect()
    }

    /// Every addressable object name, sorted.
    pub fn object_names(&self) -> Vec<&str> {
        self.registry.names()
    }

    pub fn toggle_part(&mut self, name: &str) -> Option<Phase> {
        self.interactions.toggle(name, self.registry.scene())
    }

    /// Open every part of `kind`.
    pub fn open_all(&mut self, kind: PartKind) -> usize {
        self.interactions.set_all(kind, Phase::Open, self.registry.scene())
    }

    pub fn close_all(&mut self, kind: PartKind) -> usize {
        self.interactions.set_all(kind, Phase::Closed, self.registry.scene())
    }

    /// Resolve and apply a door preset. Unknown presets change nothing.
    pub fn resolve_preset(
        &mut self,
        door_count: u32,
        position: u32,
        variant: DoorVariant,
    ) -> Option<PresetResolution> {
        let resolution =
            self.presets
                .resolve(&self.config, &self.registry, door_count, position, variant)?;
        let errors = self
            .presets
            .apply(&resolution, &mut self.registry, &mut self.interactions);
        self.report(errors);
        Some(resolution)
    }

    /// Prepare a texture load for `part`. `None` if the part does not exist.
    pub fn apply_texture(
        &mut self,
        part: &str,
        source: TextureSource,
        uv: Option<UvTransform>,
    ) -> Option<TextureRequest> {
        match TextureBinder::request(&self.config, &self.registry, part, source, uv, self.generation) {
            Ok(request) => Some(request),
            Err(e) => {
                self.report([e]);
                None
            }
        }
    }

    /// Prepare a load of one image for every texture target not in `exclude`.
    pub fn apply_global_texture(&mut self, source: TextureSource, exclude: &[String]) -> TextureRequest {
        let (request, errors) =
            TextureBinder::request_global(&self.config, &self.registry, source, exclude, self.generation);
        self.report(errors);
        request
    }

    /// Bind a finished texture load. Returns whether anything was bound.
    pub fn finish_texture_load(&mut self, load: TextureLoad) -> bool {
        let targets = load.targets.len();
        let errors = self.binder.finish(load, &mut self.registry, self.generation);
        let bound = errors.is_empty() && targets > 0;
        self.report(errors);
        bound
    }

    pub fn reset_texture(&mut self, part: &str) -> bool {
        self.binder.reset(&mut self.registry, part)
    }

    pub fn toggle_light(&mut self, name: &str, on: bool) -> bool {
        match self.lights.toggle_light(name, on, &mut self.registry) {
            Ok(()) => true,
            Err(e) => {
                self.report([e]);
                false
            }
        }
    }

    pub fn toggle_all_lights(&mut self, on: bool) {
        let errors = self.lights.toggle_all(on, &mut self.registry);
        self.report(errors);
    }

    /// Name of the interactive part under `position`, if any.
    pub fn pick(&self, position: PhysicalPosition<f64>) -> Option<String> {
        let ray = self.camera.screen_to_ray(position, self.pointer.viewport)?;
        pick_part(self.registry.scene(), &ray, |name| {
            self.interactions.is_registered(name)
        })
    }

    /// Advance all running animations.
    pub fn update(&mut self, dt: Duration) {
        self.interactions.update(dt, self.registry.scene_mut());
    }

    /**
     * Feed a window event.
     *
     * A completed left click toggles the part under the cursor and returns
     * its name and new phase.
     */
    pub fn on_window_event(&mut self, event: &WindowEvent) -> Option<(String, Phase)> {
        let click = self.pointer.handle_window_event(event)?;
        let part = self.pick(click)?;
        let phase = self.toggle_part(&part)?;
        Some((part, phase))
    }
}
