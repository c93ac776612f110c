#![allow(dead_code)]

use std::io::Cursor;

use cgmath::{Vector3, Vector4};
use configurator_ngin::{
    Viewer,
    camera::Camera,
    config::ModelConfig,
    data_structures::{
        geometry::Geometry,
        instance::Instance,
        material::Material,
        scene_graph::{Light, SceneGraph},
    },
    pick::Aabb,
    registry::{FragmentSlot, ObjectRegistry},
};
use image::{ImageFormat, Rgba, RgbaImage};
use instant::Duration;
use winit::dpi::{PhysicalPosition, PhysicalSize};

pub const CABINET_JSON: &str = include_str!("../../assets/configs/cabinet.json");
pub const SIDEBOARD_JSON: &str = include_str!("../../assets/configs/sideboard.json");

pub const VIEWPORT: PhysicalSize<u32> = PhysicalSize {
    width: 800,
    height: 600,
};

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn cabinet_config() -> ModelConfig {
    ModelConfig::from_json(CABINET_JSON).expect("cabinet.json is valid")
}

pub fn sideboard_config() -> ModelConfig {
    ModelConfig::from_json(SIDEBOARD_JSON).expect("sideboard.json is valid")
}

fn aabb(min: [f32; 3], max: [f32; 3]) -> Aabb {
    Aabb::new(min.into(), max.into())
}

/// Triangles of axis-aligned boxes, one after the other.
pub fn cuboids(boxes: &[([f32; 3], [f32; 3])]) -> Geometry {
    const FACES: [u32; 36] = [
        0, 2, 1, 0, 3, 2, 4, 5, 6, 4, 6, 7, 0, 1, 5, 0, 5, 4, 3, 7, 6, 3, 6, 2, 0, 4, 7, 0, 7, 3, 1, 2, 6, 1, 6, 5,
    ];
    let mut geometry = Geometry::default();
    for ([x0, y0, z0], [x1, y1, z1]) in boxes.iter().copied() {
        let corners = [
            [x0, y0, z0],
            [x1, y0, z0],
            [x1, y1, z0],
            [x0, y1, z0],
            [x0, y0, z1],
            [x1, y0, z1],
            [x1, y1, z1],
            [x0, y1, z1],
        ];
        geometry.extend(corners.map(Vector3::from), FACES);
    }
    geometry
}

/// Open-fronted carcass: back, sides, bottom and lid around an empty interior.
pub fn carcass() -> Geometry {
    cuboids(&[
        ([-1.0, 0.0, -0.3], [1.0, 1.6, -0.28]),
        ([-1.0, 0.0, -0.3], [-0.98, 1.6, 0.3]),
        ([0.98, 0.0, -0.3], [1.0, 1.6, 0.3]),
        ([-1.0, 0.0, -0.3], [1.0, 0.02, 0.3]),
        ([-1.0, 1.58, -0.3], [1.0, 1.6, 0.3]),
    ])
}

fn at(x: f32, y: f32, z: f32) -> Instance {
    Instance::from(Vector3::new(x, y, z))
}

/// Hollow body, top, side panels and two lights.
pub fn base_fragment() -> SceneGraph {
    let mut scene = SceneGraph::new();
    let body_material = scene.add_material(Material::new("oak").with_base_color([0.6, 0.4, 0.2, 1.0]));
    let cabinet = scene.add_node(None, Some("Cabinet"), Instance::new());

    let body = scene.add_node(Some(cabinet), Some("Body"), Instance::new());
    scene.set_geometry(body, carcass(), Some(body_material));
    let top = scene.add_node(Some(cabinet), Some("Top"), at(0.0, 1.62, 0.0));
    scene.set_mesh(top, aabb([-1.0, -0.02, -0.3], [1.0, 0.02, 0.3]), Some(body_material));
    for (name, x) in [("Panel-Left", -1.02), ("Panel-Right", 1.02)] {
        let panel = scene.add_node(Some(cabinet), Some(name), at(x, 0.8, 0.0));
        scene.set_mesh(panel, aabb([-0.02, -0.8, -0.3], [0.02, 0.8, 0.3]), Some(body_material));
    }
    for name in ["Light-Top", "Light-Inner"] {
        let light = scene.add_node(Some(cabinet), Some(name), at(0.0, 1.5, 0.0));
        scene.set_light(light, Light::default());
    }
    scene
}

/// Two hinged doors sharing one material. The hinge group is named, the
/// geometry sits one level below.
pub fn door_fragment(prefix: &str, z: f32, material: Material) -> SceneGraph {
    let mut scene = SceneGraph::new();
    let shared = scene.add_material(material);
    for (idx, hinge_x, mesh_x) in [(1, -1.0, 0.5), (2, 1.0, -0.5)] {
        let door = scene.add_node(None, Some(&format!("{prefix}{idx}")), at(hinge_x, 0.8, z));
        let mesh = scene.add_node(Some(door), Some(&format!("{prefix}{idx}_mesh")), at(mesh_x, 0.0, 0.0));
        scene.set_mesh(mesh, aabb([-0.5, -0.8, -0.01], [0.5, 0.8, 0.01]), Some(shared));
        let knob = scene.add_node(Some(mesh), None, at(0.0, 0.0, 0.02));
        scene.set_mesh(knob, aabb([-0.02, -0.02, -0.02], [0.02, 0.02, 0.02]), Some(shared));
    }
    scene
}

pub fn drawer_fragment() -> SceneGraph {
    let mut scene = SceneGraph::new();
    let front = scene.add_material(Material::new("lacquer"));
    // authored slightly pulled out, the configured closed position pushes it back
    let drawer = scene.add_node(None, Some("Drawer-01"), at(0.0, 0.2, 0.05));
    scene.set_mesh(drawer, aabb([-0.9, -0.15, -0.3], [0.9, 0.15, 0.32]), Some(front));
    let logo = scene.add_node(None, Some("Logo-01"), at(0.0, 0.2, 0.33));
    scene.set_mesh(logo, aabb([-0.05, -0.02, -0.005], [0.05, 0.02, 0.005]), Some(front));
    scene
}

pub fn cabinet_fragments() -> Vec<FragmentSlot> {
    vec![
        FragmentSlot::loaded("models/cabinet/base.glb", base_fragment()),
        FragmentSlot::loaded(
            "models/cabinet/doors.glb",
            door_fragment("Door_0", 0.31, Material::new("door").with_base_color([0.9, 0.9, 0.85, 1.0])),
        ),
        FragmentSlot::loaded(
            "models/cabinet/glass_doors.glb",
            // behind the solid doors
            door_fragment("GlassDoor-0", 0.29, Material::glass("glass", 0.3)),
        ),
        FragmentSlot::loaded("models/cabinet/drawers.glb", drawer_fragment()),
    ]
}

pub fn cabinet_registry() -> ObjectRegistry {
    let (registry, errors) = ObjectRegistry::build(cabinet_fragments());
    assert!(errors.is_empty(), "unexpected errors: {errors:?}");
    registry
}

/// A viewer with the cabinet installed and its load errors drained.
pub fn cabinet_viewer() -> Viewer {
    init_logger();
    let mut viewer = Viewer::new(VIEWPORT);
    viewer.switch_model(cabinet_config());
    viewer.install_fragments(cabinet_fragments());
    viewer.take_errors();
    viewer
}

/// Run the viewer until every tween is done.
pub fn settle(viewer: &mut Viewer) {
    for _ in 0..10 {
        viewer.update(Duration::from_millis(100));
    }
}

pub fn png_bytes(width: u32, height: u32, color: [u8; 4]) -> Vec<u8> {
    let image = RgbaImage::from_pixel(width, height, Rgba(color));
    let mut bytes = Cursor::new(Vec::new());
    image
        .write_to(&mut bytes, ImageFormat::Png)
        .expect("failed to encode png");
    bytes.into_inner()
}

/// Pixel position of a world point as seen by `camera`.
pub fn project(camera: &Camera, viewport: PhysicalSize<u32>, point: Vector3<f32>) -> PhysicalPosition<f64> {
    let aspect = viewport.width as f32 / viewport.height as f32;
    let clip = camera.projection_matrix(aspect) * camera.view_matrix() * Vector4::new(point.x, point.y, point.z, 1.0);
    let (ndc_x, ndc_y) = (clip.x / clip.w, clip.y / clip.w);
    PhysicalPosition::new(
        ((ndc_x + 1.0) / 2.0 * viewport.width as f32) as f64,
        ((1.0 - ndc_y) / 2.0 * viewport.height as f32) as f64,
    )
}

pub fn assert_close(actual: f32, expected: f32) {
    assert!(
        (actual - expected).abs() < 1e-4,
        "expected {expected}, got {actual}"
    );
}
