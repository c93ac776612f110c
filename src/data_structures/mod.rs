//! Engine data structures: scene graphs, transforms, materials and textures.
//!
//! This module contains the device-free data types of a configured scene:
//!
//! - `geometry` keeps triangle lists for hit testing
//! - `instance` holds the local transformation of a node
//! - `material` contains surface parameters shared between nodes
//! - `scene_graph` enables hierarchical scene organization
//! - `texture` contains decoded textures, their UV setup and the texture store

pub mod geometry;
pub mod instance;
pub mod material;
pub mod scene_graph;
pub mod texture;
