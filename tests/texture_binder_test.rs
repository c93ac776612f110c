use std::sync::Arc;

use configurator_ngin::{
    ConfiguratorError,
    binder::{TextureBinder, TextureLoad},
    data_structures::{material::Material, texture::WrapMode},
    registry::ObjectRegistry,
    resources::texture::TextureSource,
};
use futures::executor::block_on;
use image::RgbaImage;

use crate::common::test_utils::{
    cabinet_config, cabinet_fragments, cabinet_registry, cabinet_viewer, init_logger, png_bytes, sideboard_config,
};

mod common;

fn material_of(registry: &ObjectRegistry, name: &str) -> Material {
    let node = registry.node(name).unwrap();
    registry.scene().material(node.material.unwrap()).unwrap().clone()
}

fn red() -> Arc<RgbaImage> {
    Arc::new(RgbaImage::from_pixel(2, 2, image::Rgba([255, 0, 0, 255])))
}

#[test]
fn should_restore_bit_identical_material_after_reset() {
    init_logger();
    let mut registry = cabinet_registry();
    let mut binder = TextureBinder::new();
    let original = material_of(&registry, "Door_01_mesh");

    binder
        .bind(&mut registry, "Door_01", red(), Default::default(), "red.png")
        .unwrap();
    assert_ne!(material_of(&registry, "Door_01_mesh"), original);
    assert!(binder.reset(&mut registry, "Door_01"));

    assert_eq!(material_of(&registry, "Door_01_mesh"), original);
    assert!(binder.active_texture("Door_01").is_none());
    assert!(binder.owns_material_copy("Door_01"));
    assert_eq!(registry.scene().textures().live(), 0);
}

#[test]
fn should_not_leak_texture_onto_siblings_sharing_the_material() {
    let mut registry = cabinet_registry();
    let mut binder = TextureBinder::new();
    let shared = registry.node("Door_02_mesh").unwrap().material;
    assert_eq!(registry.node("Door_01_mesh").unwrap().material, shared);

    let texture = binder
        .bind(&mut registry, "Door_01", red(), Default::default(), "red.png")
        .unwrap();

    assert_eq!(material_of(&registry, "Door_01_mesh").color_map, Some(texture));
    assert_eq!(material_of(&registry, "Door_02_mesh").color_map, None);
    assert_eq!(registry.node("Door_02_mesh").unwrap().material, shared);
    assert!(!binder.owns_material_copy("Door_02"));
}

#[test]
fn should_copy_materials_once_per_part() {
    let mut registry = cabinet_registry();
    let mut binder = TextureBinder::new();

    binder.bind(&mut registry, "Door_01", red(), Default::default(), "a").unwrap();
    let copy = registry.node("Door_01_mesh").unwrap().material;
    binder.bind(&mut registry, "Door_01", red(), Default::default(), "b").unwrap();

    assert_eq!(registry.node("Door_01_mesh").unwrap().material, copy);
}

#[test]
fn should_dispose_previous_texture_after_binding_the_next() {
    let mut registry = cabinet_registry();
    let mut binder = TextureBinder::new();

    let first = binder.bind(&mut registry, "Door_01", red(), Default::default(), "a").unwrap();
    let second = binder.bind(&mut registry, "Door_01", red(), Default::default(), "b").unwrap();

    let textures = registry.scene().textures();
    assert!(textures.get(first).is_none());
    assert!(textures.get(second).is_some());
    assert_eq!(textures.live(), 1);
    assert_eq!(binder.active_texture("Door_01"), Some(second));
}

fn assert_no_disposed_maps(registry: &ObjectRegistry) {
    let scene = registry.scene();
    for (id, node) in scene.iter() {
        let Some(material) = node.material else { continue };
        if let Some(texture) = scene.material(material).unwrap().color_map {
            assert!(scene.textures().get(texture).is_some(), "{id:?} shows disposed {texture:?}");
        }
    }
}

#[test]
fn should_keep_nested_targets_independent() {
    init_logger();
    let mut registry = cabinet_registry();
    let mut binder = TextureBinder::new();
    let shared = material_of(&registry, "Top");

    let top = binder.bind(&mut registry, "Top", red(), Default::default(), "top-a").unwrap();
    let carcass = binder.bind(&mut registry, "Cabinet", red(), Default::default(), "carcass").unwrap();
    assert_eq!(material_of(&registry, "Top").color_map, Some(top));
    assert_eq!(material_of(&registry, "Body").color_map, Some(carcass));

    assert!(binder.reset(&mut registry, "Cabinet"));
    assert_eq!(material_of(&registry, "Body"), shared);
    assert_eq!(material_of(&registry, "Top").color_map, Some(top));

    let again = binder.bind(&mut registry, "Top", red(), Default::default(), "top-b").unwrap();
    assert_eq!(material_of(&registry, "Top").color_map, Some(again));
    assert!(registry.scene().textures().get(top).is_none());
    assert_no_disposed_maps(&registry);

    assert!(binder.reset(&mut registry, "Top"));
    assert_eq!(material_of(&registry, "Top"), shared);
    assert_no_disposed_maps(&registry);
}

#[test]
fn should_let_inner_target_take_over_from_enclosing_one() {
    let mut registry = cabinet_registry();
    let mut binder = TextureBinder::new();
    let shared = material_of(&registry, "Top");

    let carcass = binder.bind(&mut registry, "Cabinet", red(), Default::default(), "carcass").unwrap();
    assert_eq!(material_of(&registry, "Top").color_map, Some(carcass));
    let top = binder.bind(&mut registry, "Top", red(), Default::default(), "top").unwrap();

    assert_eq!(material_of(&registry, "Top").color_map, Some(top));
    assert_eq!(material_of(&registry, "Body").color_map, Some(carcass));
    assert!(binder.reset(&mut registry, "Top"));
    // the inner copy starts from the shared material, not from the carcass texture
    assert_eq!(material_of(&registry, "Top"), shared);
    assert_eq!(material_of(&registry, "Body").color_map, Some(carcass));

    binder.bind(&mut registry, "Cabinet", red(), Default::default(), "carcass-b").unwrap();
    assert_eq!(material_of(&registry, "Top"), shared);
    assert_no_disposed_maps(&registry);
}

#[test]
fn should_mark_changed_materials_dirty() {
    let mut registry = cabinet_registry();
    let mut binder = TextureBinder::new();
    registry.scene_mut().take_dirty_materials();

    binder.bind(&mut registry, "Door_01", red(), Default::default(), "a").unwrap();
    let dirty = registry.scene_mut().take_dirty_materials();

    assert_eq!(dirty, vec![registry.node("Door_01_mesh").unwrap().material.unwrap()]);
}

#[test]
fn should_keep_binding_when_load_fails() {
    init_logger();
    let config = cabinet_config();
    let mut registry = cabinet_registry();
    let mut binder = TextureBinder::new();
    let texture = binder.bind(&mut registry, "Door_01", red(), Default::default(), "a").unwrap();

    let request = TextureBinder::request(
        &config,
        &registry,
        "Door_01",
        TextureSource::bytes("broken.png", b"definitely not a png".to_vec()),
        None,
        1,
    )
    .unwrap();
    let load = block_on(request.load());
    let errors = binder.finish(load, &mut registry, 1);

    assert!(matches!(&errors[..], [ConfiguratorError::TextureLoadFailed { target, .. }] if target == "Door_01"));
    assert_eq!(binder.active_texture("Door_01"), Some(texture));
    assert_eq!(material_of(&registry, "Door_01_mesh").color_map, Some(texture));
}

#[test]
fn should_use_configured_uv_transform() {
    let config = cabinet_config();
    let mut registry = cabinet_registry();
    let mut binder = TextureBinder::new();

    let request = TextureBinder::request(
        &config,
        &registry,
        "Door_01",
        TextureSource::bytes("red.png", png_bytes(4, 4, [255, 0, 0, 255])),
        None,
        7,
    )
    .unwrap();
    let errors = binder.finish(block_on(request.load()), &mut registry, 7);

    assert!(errors.is_empty());
    let texture = registry
        .scene()
        .textures()
        .get(binder.active_texture("Door_01").unwrap())
        .unwrap();
    assert_eq!(texture.uv.repeat_x, 2.0);
    assert_eq!(texture.uv.wrap_mode, WrapMode::Repeat);
    assert_eq!(texture.dimensions(), (4, 4));
}

#[test]
fn should_apply_global_texture_except_excluded_targets() {
    let config = cabinet_config();
    let mut registry = cabinet_registry();
    let mut binder = TextureBinder::new();

    let (request, errors) = TextureBinder::request_global(
        &config,
        &registry,
        TextureSource::bytes("oak.png", png_bytes(2, 2, [120, 80, 40, 255])),
        &["Door_02".to_string()],
        1,
    );
    assert!(errors.is_empty());
    let errors = binder.finish(block_on(request.load()), &mut registry, 1);

    assert!(errors.is_empty());
    assert_eq!(binder.bound_parts(), vec!["Door_01", "Top"]);
    let door = binder.active_texture("Door_01").unwrap();
    let top = binder.active_texture("Top").unwrap();
    assert_ne!(door, top);
    let textures = registry.scene().textures();
    assert!(Arc::ptr_eq(&textures.get(door).unwrap().image, &textures.get(top).unwrap().image));
    assert_eq!(textures.get(top).unwrap().uv.rotation, 90.0);
    // Top shares its material with the body, which must stay untouched
    assert_eq!(material_of(&registry, "Body").color_map, None);
}

#[test]
fn should_ignore_unregistered_parts() {
    let config = cabinet_config();
    let mut registry = cabinet_registry();
    let mut binder = TextureBinder::new();

    let request = TextureBinder::request(
        &config,
        &registry,
        "Ghost",
        TextureSource::bytes("red.png", png_bytes(1, 1, [255, 0, 0, 255])),
        None,
        1,
    );

    assert!(matches!(request, Err(ConfiguratorError::ConfigReferenceMissing { .. })));
    assert!(binder.bind(&mut registry, "Ghost", red(), Default::default(), "a").is_err());
    assert!(!binder.reset(&mut registry, "Ghost"));
}

#[test]
fn should_discard_texture_loaded_for_previous_model() {
    let mut viewer = cabinet_viewer();
    let request = viewer
        .apply_texture(
            "Door_01",
            TextureSource::bytes("red.png", png_bytes(2, 2, [255, 0, 0, 255])),
            None,
        )
        .unwrap();

    // the user switches models while the image is still loading
    viewer.switch_model(sideboard_config());
    viewer.install_fragments(cabinet_fragments());
    viewer.take_errors();
    let before = material_of(viewer.registry(), "Door_01_mesh");

    let load: TextureLoad = block_on(request.load());
    assert!(!viewer.finish_texture_load(load));

    assert_eq!(material_of(viewer.registry(), "Door_01_mesh"), before);
    assert_eq!(viewer.scene().textures().live(), 0);
    assert!(viewer.binder().active_texture("Door_01").is_none());
    let errors = viewer.take_errors();
    assert!(matches!(
        &errors[..],
        [ConfiguratorError::StaleResultDiscarded { requested: 1, current: 2 }]
    ));
    assert!(!errors[0].is_user_visible());
}
