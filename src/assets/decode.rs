use std::sync::Arc;

use crate::assets::fonts::FontBook;
use crate::assets::resolver::AssetError;
use crate::foundation::math::premultiply_rgba8_in_place;

/// Largest natural edge accepted for a decoded asset.
const MAX_ASSET_DIM: u32 = 16_384;

/// Decoded raster asset in premultiplied RGBA8 form, with its natural size.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedImage {
    /// Natural width in pixels.
    pub width: u32,
    /// Natural height in pixels.
    pub height: u32,
    /// Pixel bytes in row-major premultiplied RGBA8.
    pub rgba8_premul: Arc<Vec<u8>>,
}

impl DecodedImage {
    /// Build from premultiplied RGBA8 bytes, checking the buffer length.
    pub fn from_premul_rgba8(width: u32, height: u32, bytes: Vec<u8>) -> Result<Self, AssetError> {
        if width == 0 || height == 0 {
            return Err(AssetError::Decode(format!(
                "image has empty natural size {width}x{height}"
            )));
        }
        let expected = (width as usize)
            .saturating_mul(height as usize)
            .saturating_mul(4);
        if bytes.len() != expected {
            return Err(AssetError::Decode(format!(
                "pixel buffer is {} bytes, expected {expected}",
                bytes.len()
            )));
        }
        Ok(Self {
            width,
            height,
            rgba8_premul: Arc::new(bytes),
        })
    }

    /// Build from straight-alpha RGBA8 bytes.
    pub fn from_straight_rgba8(
        width: u32,
        height: u32,
        mut bytes: Vec<u8>,
    ) -> Result<Self, AssetError> {
        premultiply_rgba8_in_place(&mut bytes);
        Self::from_premul_rgba8(width, height, bytes)
    }
}

/// Decode encoded image bytes (PNG, JPEG, GIF, WebP, ... or an SVG document).
///
/// Bitmaps keep their pixel size; SVG documents are rasterized at their intrinsic size.
pub fn decode_image(bytes: &[u8]) -> Result<DecodedImage, AssetError> {
    if looks_like_svg(bytes) {
        return decode_svg(bytes);
    }

    let dyn_img = image::load_from_memory(bytes)
        .map_err(|e| AssetError::Decode(format!("decode image from memory: {e}")))?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();
    check_natural_size(width, height)?;
    DecodedImage::from_straight_rgba8(width, height, rgba.into_raw())
}

fn decode_svg(bytes: &[u8]) -> Result<DecodedImage, AssetError> {
    let opts = usvg::Options {
        fontdb: FontBook::shared().database(),
        ..Default::default()
    };
    let tree = usvg::Tree::from_data(bytes, &opts)
        .map_err(|e| AssetError::Decode(format!("parse svg tree: {e}")))?;

    let size = tree.size();
    let (w, h) = (size.width(), size.height());
    if !w.is_finite() || !h.is_finite() || w <= 0.0 || h <= 0.0 {
        return Err(AssetError::Decode("svg has invalid width/height".to_owned()));
    }
    let width = (w.ceil() as u32).max(1);
    let height = (h.ceil() as u32).max(1);
    check_natural_size(width, height)?;

    let rgba = rasterize_svg_to_premul_rgba8(&tree, width, height)?;
    DecodedImage::from_premul_rgba8(width, height, rgba)
}

fn rasterize_svg_to_premul_rgba8(
    tree: &usvg::Tree,
    width: u32,
    height: u32,
) -> Result<Vec<u8>, AssetError> {
    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| AssetError::Decode("failed to allocate svg pixmap".to_owned()))?;

    let sx = (width as f32) / tree.size().width();
    let sy = (height as f32) / tree.size().height();
    let xform = resvg::tiny_skia::Transform::from_scale(sx, sy);

    resvg::render(tree, xform, &mut pixmap.as_mut());
    Ok(pixmap.data().to_vec())
}

fn check_natural_size(width: u32, height: u32) -> Result<(), AssetError> {
    if width > MAX_ASSET_DIM || height > MAX_ASSET_DIM {
        return Err(AssetError::Decode(format!(
            "image too large: {width}x{height} (max {MAX_ASSET_DIM}x{MAX_ASSET_DIM})"
        )));
    }
    Ok(())
}

fn looks_like_svg(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(512)];
    let text = String::from_utf8_lossy(head);
    let text = text.trim_start_matches('\u{feff}').trim_start();
    text.starts_with("<svg") || (text.starts_with("<?xml") && text.contains("<svg"))
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
