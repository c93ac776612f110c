//! configurator-ngin
//!
//! A configuration-driven scene interaction engine for 3D product
//! configurators, focused on native and WASM compatibility. One generic
//! engine serves every product: a JSON model configuration names the scene
//! fragments to load, what starts hidden, which doors and drawers open and
//! how, the door/panel presets, the lights and the surfaces that accept user
//! textures. Rendering is left to the host, which reads the device-free scene
//! graph this crate maintains.
//!
//! High-level modules
//! - `config`: the per-model configuration document
//! - `data_structures`: scene graph, transforms, materials and textures
//! - `resources`: async loading of glTF fragments, images and documents
//! - `registry`: merged scene of a model and its name index
//! - `state`: applies the declarative initial state
//! - `preset`: door/panel preset resolution
//! - `interaction`: open/closed state machine with tweened transitions
//! - `animation`: transform tweens and easing
//! - `camera`, `pick`, `input`: pointer to world ray to part name
//! - `binder`: copy-on-write texture binding
//! - `lights`: switchable lights
//! - `viewer`: the facade hosts drive from their event loop
//!

pub mod animation;
pub mod binder;
pub mod camera;
pub mod config;
pub mod data_structures;
pub mod error;
pub mod input;
pub mod interaction;
pub mod lights;
pub mod pick;
pub mod preset;
pub mod registry;
pub mod resources;
pub mod state;
pub mod viewer;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath;
pub use error::{ConfiguratorError, Result};
pub use instant::Duration;
pub use viewer::Viewer;
pub use winit::dpi::{PhysicalPosition, PhysicalSize};
pub use winit::event::WindowEvent;
