use std::{collections::HashMap, sync::Arc};

use cgmath::Vector3;
use image::RgbaImage;

use crate::{
    data_structures::{
        geometry::Geometry,
        instance::Instance,
        material::{Material, MaterialId},
        scene_graph::{Light, NodeId, SceneGraph},
        texture::{Texture, UvTransform},
    },
    pick::Aabb,
};

/**
 * This module contains all logic for loading scene fragments, textures and
 * configuration documents from external files.
 */
pub mod texture;

#[cfg(target_arch = "wasm32")]
fn format_url(file_name: &str) -> anyhow::Result<reqwest::Url> {
    if file_name.starts_with("http://") || file_name.starts_with("https://") {
        return Ok(reqwest::Url::parse(file_name)?);
    }
    let window = web_sys::window().ok_or_else(|| anyhow::anyhow!("no browser window"))?;
    let origin = window
        .location()
        .origin()
        .map_err(|_| anyhow::anyhow!("window has no origin"))?;
    let base = reqwest::Url::parse(&format!("{}/assets/", origin))?;
    Ok(base.join(file_name)?)
}

#[cfg(not(target_arch = "wasm32"))]
fn asset_path(file_name: &str) -> anyhow::Result<std::path::PathBuf> {
    if file_name.starts_with("http://") || file_name.starts_with("https://") {
        anyhow::bail!("{file_name}: remote sources are fetched by the host on native targets");
    }
    let file_name = file_name.strip_prefix("file://").unwrap_or(file_name);
    let path = std::path::Path::new(file_name);
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::path::Path::new("./").join("assets").join(path))
    }
}

pub async fn load_string(file_name: &str) -> anyhow::Result<String> {
    #[cfg(target_arch = "wasm32")]
    let txt = {
        let url = format_url(file_name)?;
        reqwest::get(url).await?.error_for_status()?.text().await?
    };
    #[cfg(not(target_arch = "wasm32"))]
    let txt = tokio::fs::read_to_string(asset_path(file_name)?).await?;

    Ok(txt)
}

pub async fn load_binary(file_name: &str) -> anyhow::Result<Vec<u8>> {
    #[cfg(target_arch = "wasm32")]
    let data = {
        let url = format_url(file_name)?;
        reqwest::get(url)
            .await?
            .error_for_status()?
            .bytes()
            .await?
            .to_vec()
    };
    #[cfg(not(target_arch = "wasm32"))]
    let data = tokio::fs::read(asset_path(file_name)?).await?;

    Ok(data)
}

/// Load every fragment concurrently. The result keeps the order of `sources`.
pub async fn load_fragments(sources: &[String]) -> Vec<anyhow::Result<SceneGraph>> {
    futures::future::join_all(sources.iter().map(|source| load_fragment(source))).await
}

/// Load a `.gltf`/`.glb` file and convert its default scene into a [`SceneGraph`].
pub async fn load_fragment(file_name: &str) -> anyhow::Result<SceneGraph> {
    let data = load_binary(file_name).await?;
    let gltf = gltf::Gltf::from_slice(&data)?;

    // Load buffers
    let mut buffer_data = Vec::new();
    for buffer in gltf.buffers() {
        match buffer.source() {
            gltf::buffer::Source::Bin => {
                buffer_data.push(gltf.blob.clone().unwrap_or_default());
            }
            gltf::buffer::Source::Uri(uri) if uri.starts_with("data:") => {
                buffer_data.push(decode_data_uri(uri)?);
            }
            gltf::buffer::Source::Uri(uri) => {
                let bin = load_binary(&relative_to(file_name, uri)).await?;
                buffer_data.push(bin);
            }
        }
    }
    check_buffer_lengths(&gltf, &buffer_data)?;

    // Load images, a broken image costs the material its map but not the fragment
    let mut images = Vec::new();
    for image in gltf.images() {
        let decoded = match image.source() {
            gltf::image::Source::View { view, mime_type } => {
                image_from_view(&buffer_data, &view, Some(mime_type))
            }
            gltf::image::Source::Uri { uri, mime_type } if uri.starts_with("data:") => {
                decode_data_uri(uri)
                    .and_then(|bytes| texture::decode_image(&bytes, mime_type.and_then(mime_extension)))
            }
            gltf::image::Source::Uri { uri, mime_type } => {
                match load_binary(&relative_to(file_name, uri)).await {
                    Ok(bytes) => texture::decode_image(&bytes, mime_type.and_then(mime_extension)),
                    Err(e) => Err(e),
                }
            }
        };
        images.push(match decoded {
            Ok(img) => Some(Arc::new(img)),
            Err(e) => {
                log::warn!("Image {} of {} could not be loaded: {}", image.index(), file_name, e);
                None
            }
        });
    }

    Ok(build_fragment(&gltf, &buffer_data, &images))
}

/**
 * Convert a self-contained glTF document (GLB blob or `data:` URIs) into a
 * [`SceneGraph`] without any IO. External references are an error.
 */
pub fn fragment_from_slice(data: &[u8]) -> anyhow::Result<SceneGraph> {
    let gltf = gltf::Gltf::from_slice(data)?;
    let buffer_data = gltf
        .buffers()
        .map(|buffer| match buffer.source() {
            gltf::buffer::Source::Bin => gltf
                .blob
                .clone()
                .ok_or_else(|| anyhow::anyhow!("buffer {} refers to a missing GLB blob", buffer.index())),
            gltf::buffer::Source::Uri(uri) => decode_data_uri(uri),
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    check_buffer_lengths(&gltf, &buffer_data)?;
    let images: Vec<Option<Arc<RgbaImage>>> = gltf
        .images()
        .map(|image| {
            let decoded = match image.source() {
                gltf::image::Source::View { view, mime_type } => image_from_view(&buffer_data, &view, Some(mime_type)),
                gltf::image::Source::Uri { uri, mime_type } => decode_data_uri(uri)
                    .and_then(|bytes| texture::decode_image(&bytes, mime_type.and_then(mime_extension))),
            };
            decoded
                .inspect_err(|e| log::warn!("Image {} could not be decoded: {}", image.index(), e))
                .ok()
                .map(Arc::new)
        })
        .collect();
    Ok(build_fragment(&gltf, &buffer_data, &images))
}

/// Bytes of a base64 `data:` URI. Anything else is rejected.
fn decode_data_uri(uri: &str) -> anyhow::Result<Vec<u8>> {
    if !uri.starts_with("data:") {
        anyhow::bail!("{uri}: external references need a file to resolve against");
    }
    let data = gltf::buffer::Data::from_source(gltf::buffer::Source::Uri(uri), None)?;
    Ok(data.0)
}

/// Accessors index into the buffers unchecked, so short buffers are refused up front.
fn check_buffer_lengths(document: &gltf::Document, buffer_data: &[Vec<u8>]) -> anyhow::Result<()> {
    for (buffer, data) in document.buffers().zip(buffer_data) {
        if data.len() < buffer.length() {
            anyhow::bail!(
                "buffer {} holds {} bytes, {} declared",
                buffer.index(),
                data.len(),
                buffer.length()
            );
        }
    }
    Ok(())
}

fn relative_to(file_name: &str, uri: &str) -> String {
    match file_name.rsplit_once('/') {
        Some((dir, _)) => format!("{dir}/{uri}"),
        None => uri.to_string(),
    }
}

fn mime_extension(mime_type: &str) -> Option<&str> {
    mime_type.split('/').last()
}

fn image_from_view(
    buffer_data: &[Vec<u8>],
    view: &gltf::buffer::View,
    mime_type: Option<&str>,
) -> anyhow::Result<RgbaImage> {
    let buffer = buffer_data
        .get(view.buffer().index())
        .ok_or_else(|| anyhow::anyhow!("buffer {} is missing", view.buffer().index()))?;
    let bytes = buffer
        .get(view.offset()..view.offset() + view.length())
        .ok_or_else(|| anyhow::anyhow!("buffer view {} is out of bounds", view.index()))?;
    texture::decode_image(bytes, mime_type.and_then(mime_extension))
}

fn build_fragment(
    document: &gltf::Document,
    buffer_data: &[Vec<u8>],
    images: &[Option<Arc<RgbaImage>>],
) -> SceneGraph {
    let mut fragment = SceneGraph::new();

    // Load materials
    let mut materials: HashMap<usize, MaterialId> = HashMap::new();
    for material in document.materials() {
        let pbr = material.pbr_metallic_roughness();
        let name = material.name().unwrap_or("unnamed_material");
        let mut converted = Material::new(name).with_base_color(pbr.base_color_factor());
        converted.metallic = pbr.metallic_factor();
        converted.roughness = pbr.roughness_factor();
        converted.transparent = material.alpha_mode() == gltf::material::AlphaMode::Blend;
        converted.opacity = pbr.base_color_factor()[3];
        let image = pbr
            .base_color_texture()
            .and_then(|info| images.get(info.texture().source().index()).cloned().flatten());
        if let Some(image) = image {
            // glTF UVs already have their origin top-left
            let uv = UvTransform {
                flip_y: false,
                wrap_mode: crate::data_structures::texture::WrapMode::Repeat,
                ..Default::default()
            };
            let texture = fragment.textures_mut().insert(Texture::new(name, image, uv));
            converted.color_map = Some(texture);
        }
        if let Some(idx) = material.index() {
            materials.insert(idx, fragment.add_material(converted));
        }
    }

    let scene = document.default_scene().or_else(|| document.scenes().next());
    match scene {
        Some(scene) => {
            for node in scene.nodes() {
                add_gltf_node(&mut fragment, None, &node, buffer_data, &mut materials);
            }
        }
        None => log::warn!("glTF document contains no scene."),
    }
    fragment
}

fn add_gltf_node(
    fragment: &mut SceneGraph,
    parent: Option<NodeId>,
    node: &gltf::Node,
    buffer_data: &[Vec<u8>],
    materials: &mut HashMap<usize, MaterialId>,
) {
    let (position, rotation, scale) = node.transform().decomposed();
    let id = fragment.add_node(
        parent,
        node.name(),
        Instance::from_decomposed(position, rotation, scale),
    );

    if let Some(mesh) = node.mesh() {
        let bounds = mesh
            .primitives()
            .filter(|primitive| primitive.get(&gltf::Semantic::Positions).is_some())
            .map(|primitive| {
                let bb = primitive.bounding_box();
                Aabb::new(bb.min.into(), bb.max.into())
            })
            .reduce(|a, b| a.merge(&b));
        let material = mesh
            .primitives()
            .next()
            .map(|primitive| match primitive.material().index() {
                Some(idx) => materials
                    .get(&idx)
                    .copied()
                    .unwrap_or_else(|| fragment.add_material(Material::default())),
                None => *materials
                    .entry(usize::MAX)
                    .or_insert_with(|| fragment.add_material(Material::default())),
            });
        match (read_geometry(&mesh, buffer_data), bounds) {
            (Some(geometry), _) => fragment.set_geometry(id, geometry, material),
            (None, Some(bounds)) => fragment.set_mesh(id, bounds, material),
            (None, None) => {}
        }
    }

    if let Some(light) = node.light() {
        fragment.set_light(
            id,
            Light {
                color: light.color(),
                intensity: light.intensity(),
            },
        );
    }

    for child in node.children() {
        add_gltf_node(fragment, Some(id), &child, buffer_data, materials);
    }
}

/// Triangle list primitives of `mesh` merged into one geometry.
fn read_geometry(mesh: &gltf::Mesh, buffer_data: &[Vec<u8>]) -> Option<Geometry> {
    let mut geometry = Geometry::default();
    for primitive in mesh.primitives() {
        if primitive.mode() != gltf::mesh::Mode::Triangles {
            log::debug!("Skipping {:?} primitive of mesh {:?}", primitive.mode(), mesh.name());
            continue;
        }
        let reader = primitive.reader(|buffer| buffer_data.get(buffer.index()).map(Vec::as_slice));
        let Some(positions) = reader.read_positions() else {
            continue;
        };
        let positions: Vec<Vector3<f32>> = positions.map(Vector3::from).collect();
        let indices: Vec<u32> = match reader.read_indices() {
            Some(indices) => indices.into_u32().collect(),
            None => (0..positions.len() as u32).collect(),
        };
        geometry.extend(positions, indices);
    }
    (!geometry.is_empty()).then_some(geometry)
}
