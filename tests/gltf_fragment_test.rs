use cgmath::Vector3;
use configurator_ngin::{
    pick::{Ray, pick_node},
    registry::{FragmentSlot, ObjectRegistry},
    resources::{fragment_from_slice, load_fragments},
};

use crate::common::test_utils::{assert_close, init_logger};

mod common;

// Two boxes (door panel, top) and a 1x1 texture, all embedded as data URIs.
const CABINET_GLTF: &str = r#"{
  "asset": { "version": "2.0" },
  "extensionsUsed": ["KHR_lights_punctual"],
  "extensions": {
    "KHR_lights_punctual": {
      "lights": [{ "type": "point", "color": [1.0, 0.9, 0.8], "intensity": 3.0 }]
    }
  },
  "scene": 0,
  "scenes": [{ "nodes": [0] }],
  "nodes": [
    { "name": "Cabinet", "children": [1, 2, 3] },
    { "name": "Door_01", "translation": [-1.0, 0.8, 0.31], "children": [4] },
    { "mesh": 1, "translation": [0.0, 1.62, 0.0] },
    { "name": "Light-Top", "translation": [0.0, 1.5, 0.0], "extensions": { "KHR_lights_punctual": { "light": 0 } } },
    { "name": "Door_01_mesh", "mesh": 0, "translation": [0.5, 0.0, 0.0] }
  ],
  "meshes": [
    { "name": "door", "primitives": [{ "attributes": { "POSITION": 0 }, "indices": 2, "material": 0 }] },
    { "name": "top", "primitives": [{ "attributes": { "POSITION": 1 }, "indices": 2 }] }
  ],
  "materials": [
    {
      "name": "door_paint",
      "pbrMetallicRoughness": {
        "baseColorFactor": [0.9, 0.9, 0.85, 1.0],
        "baseColorTexture": { "index": 0 },
        "metallicFactor": 0.0,
        "roughnessFactor": 0.7
      }
    }
  ],
  "textures": [{ "source": 0 }],
  "images": [{ "uri": "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAABnRFWHRjAHh4eHjV+NEIAAAADUlEQVR4nGM4YWT0HwAFHgIsJUf5cAAAAABJRU5ErkJggg==" }],
  "buffers": [{
    "byteLength": 264,
    "uri": "data:application/octet-stream;base64,AAAAv83MTL8K1yO8AAAAP83MTL8K1yO8AAAAP83MTD8K1yO8AAAAv83MTD8K1yO8AAAAv83MTL8K1yM8AAAAP83MTL8K1yM8AAAAP83MTD8K1yM8AAAAv83MTD8K1yM8AACAvwrXo7yamZm+AACAPwrXo7yamZm+AACAPwrXozyamZm+AACAvwrXozyamZm+AACAvwrXo7yamZk+AACAPwrXo7yamZk+AACAPwrXozyamZk+AACAvwrXozyamZk+AAACAAEAAAADAAIABAAFAAYABAAGAAcAAAABAAUAAAAFAAQAAwAHAAYAAwAGAAIAAAAEAAcAAAAHAAMAAQACAAYAAQAGAAUA"
  }],
  "bufferViews": [
    { "buffer": 0, "byteOffset": 0, "byteLength": 192, "target": 34962 },
    { "buffer": 0, "byteOffset": 192, "byteLength": 72, "target": 34963 }
  ],
  "accessors": [
    { "bufferView": 0, "byteOffset": 0, "componentType": 5126, "count": 8, "type": "VEC3", "min": [-0.5, -0.8, -0.01], "max": [0.5, 0.8, 0.01] },
    { "bufferView": 0, "byteOffset": 96, "componentType": 5126, "count": 8, "type": "VEC3", "min": [-1.0, -0.02, -0.3], "max": [1.0, 0.02, 0.3] },
    { "bufferView": 1, "byteOffset": 0, "componentType": 5123, "count": 36, "type": "SCALAR" }
  ]
}"#;

#[test]
fn should_convert_gltf_nodes_into_a_fragment() {
    init_logger();
    let fragment = fragment_from_slice(CABINET_GLTF.as_bytes()).unwrap();
    let (registry, errors) = ObjectRegistry::build(vec![FragmentSlot::loaded("cabinet.gltf", fragment)]);

    assert!(errors.is_empty());
    assert_eq!(registry.names(), vec!["Cabinet", "Door_01", "Door_01_mesh", "Light-Top"]);
    assert_eq!(registry.scene().len(), 5);

    let door = registry.node("Door_01").unwrap();
    assert_close(door.transform.position.x, -1.0);
    assert_close(door.transform.position.z, 0.31);
    assert!(!door.is_mesh());

    let mesh = registry.node("Door_01_mesh").unwrap();
    let bounds = mesh.bounds.unwrap();
    assert_close(bounds.min.y, -0.8);
    assert_close(bounds.max.x, 0.5);
    let material = registry.scene().material(mesh.material.unwrap()).unwrap();
    assert_eq!(material.name, "door_paint");
    assert_close(material.roughness, 0.7);
    let texture = registry.scene().textures().get(material.color_map.unwrap()).unwrap();
    assert_eq!(texture.dimensions(), (1, 1));
    assert_eq!(texture.image.get_pixel(0, 0).0, [200, 50, 50, 255]);

    let geometry = mesh.geometry.as_ref().unwrap();
    assert_eq!(geometry.triangle_count(), 12);
    assert_eq!(geometry.positions.len(), 8);

    let light = registry.node("Light-Top").unwrap().light.clone().unwrap();
    assert_close(light.intensity, 3.0);
    assert_close(light.color[2], 0.8);
}

#[test]
fn should_give_unassigned_primitives_a_default_material() {
    let fragment = fragment_from_slice(CABINET_GLTF.as_bytes()).unwrap();
    let (top, node) = fragment
        .iter()
        .find(|(_, node)| node.is_mesh() && node.name().is_none())
        .unwrap();

    let material = fragment.material(node.material.unwrap()).unwrap();
    assert_eq!(material.name, "default");
    assert_eq!(fragment.node(top).unwrap().parent(), Some(fragment.roots()[0]));
}

#[test]
fn should_pick_imported_geometry_by_its_triangles() {
    let (registry, _) = ObjectRegistry::build(vec![FragmentSlot::loaded(
        "cabinet.gltf",
        fragment_from_slice(CABINET_GLTF.as_bytes()).unwrap(),
    )]);
    let ray = Ray::new(Vector3::new(-0.5, 0.8, 5.0), Vector3::new(0.0, 0.0, -1.0));

    let hit = pick_node(registry.scene(), &ray).unwrap();

    assert_eq!(hit.node, registry.get("Door_01_mesh").unwrap());
    // front face of the panel sits at z = 0.31 + 0.01
    assert_close(hit.distance, 5.0 - 0.32);
}

#[test]
fn should_reject_invalid_gltf() {
    assert!(fragment_from_slice(b"not a gltf").is_err());
}

#[test]
fn should_reject_external_buffers_without_a_file() {
    let external = r#"{
      "asset": { "version": "2.0" },
      "buffers": [{ "byteLength": 4, "uri": "cabinet.bin" }]
    }"#;

    assert!(fragment_from_slice(external.as_bytes()).is_err());
}

#[test]
fn should_reject_buffers_shorter_than_declared() {
    let short = CABINET_GLTF.replace(r#""byteLength": 264,"#, r#""byteLength": 400,"#);

    assert!(fragment_from_slice(short.as_bytes()).is_err());
}

#[tokio::test]
async fn should_report_missing_fragment_files_per_slot() {
    init_logger();
    let sources = vec!["models/missing_a.glb".to_string(), "models/missing_b.glb".to_string()];

    let fragments = load_fragments(&sources).await;

    assert_eq!(fragments.len(), 2);
    assert!(fragments.iter().all(Result::is_err));
}

#[tokio::test]
async fn should_load_model_fragments_from_asset_root() {
    init_logger();
    let mut viewer = configurator_ngin::Viewer::new(crate::common::test_utils::VIEWPORT);
    let request = viewer.switch_model(crate::common::test_utils::sideboard_config());

    let loaded = request.load().await;
    assert!(viewer.finish_model_load(loaded));

    assert!(viewer.take_errors().is_empty());
    assert_eq!(viewer.object_names(), vec!["Body", "Door_01", "Door_01_mesh", "Sideboard"]);
    let body = viewer.registry().node("Body").unwrap();
    assert_eq!(body.geometry.as_ref().unwrap().triangle_count(), 12);
    assert_close(body.bounds.unwrap().max.y, 1.0);
    assert!(viewer.interactions().is_registered("Door_01"));
}
