use std::path::PathBuf;

use anyhow::Context;
use image::{ImageFormat, RgbaImage, load_from_memory_with_format};

use crate::resources::load_binary;

/// Where the pixels of a user texture come from.
///
/// Uploads arrive from the host as raw bytes (file inputs, blobs), stored
/// textures as paths below the asset root or as URLs.
#[derive(Clone, Debug)]
pub enum TextureSource {
    Bytes { label: String, bytes: Vec<u8> },
    Path(PathBuf),
    Url(String),
}

impl TextureSource {
    pub fn bytes(label: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self::Bytes {
            label: label.into(),
            bytes,
        }
    }

    pub fn label(&self) -> String {
        match self {
            Self::Bytes { label, .. } => label.clone(),
            Self::Path(path) => path.display().to_string(),
            Self::Url(url) => url.clone(),
        }
    }

    /// File extension hint for the decoder, if the source has one.
    fn extension(&self) -> Option<String> {
        let name = match self {
            Self::Bytes { label, .. } => label.as_str(),
            Self::Path(path) => return path.extension().map(|e| e.to_string_lossy().to_lowercase()),
            Self::Url(url) => url.split(|c: char| c == '?' || c == '#').next().unwrap_or(url),
        };
        name.rsplit_once('.').map(|(_, ext)| ext.to_lowercase())
    }
}

/// Fetch and decode a texture source into RGBA8 pixels.
pub async fn load_image(source: &TextureSource) -> anyhow::Result<RgbaImage> {
    let format = source.extension();
    match source {
        TextureSource::Bytes { label, bytes } => decode_image(bytes, format.as_deref())
            .with_context(|| format!("decoding uploaded image {label}")),
        TextureSource::Path(path) => {
            let file_name = path.to_string_lossy();
            let data = load_binary(&file_name).await?;
            decode_image(&data, format.as_deref())
                .with_context(|| format!("decoding image {file_name}"))
        }
        TextureSource::Url(url) => {
            let data = load_binary(url).await?;
            decode_image(&data, format.as_deref()).with_context(|| format!("decoding image {url}"))
        }
    }
}

/**
 * Decode image bytes, preferring the format the extension suggests.
 *
 * Uploaded files regularly carry the wrong extension, so a failed hinted
 * decode falls back to sniffing the content.
 */
pub fn decode_image(bytes: &[u8], format: Option<&str>) -> anyhow::Result<RgbaImage> {
    if let Some(format) = format.and_then(ImageFormat::from_extension) {
        match load_from_memory_with_format(bytes, format) {
            Ok(img) => return Ok(img.to_rgba8()),
            Err(e) => log::debug!("Decoding as {:?} failed ({}), guessing the format.", format, e),
        }
    }
    Ok(image::load_from_memory(bytes)?.to_rgba8())
}
