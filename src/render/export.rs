use std::io::Cursor;

use base64::Engine as _;
use image::ImageEncoder as _;

use crate::assets::fonts::FontBook;
use crate::foundation::error::{CanvasError, CanvasResult};
use crate::foundation::math::unpremultiply_rgba8_in_place;
use crate::render::cpu::{CpuRasterizer, FrameRGBA};
use crate::scene::model::Scene;

/// Default resolution multiplier.
pub const DEFAULT_MULTIPLIER: f64 = 3.0;

/// Output encoding.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExportFormat {
    /// Lossless PNG at maximum compression.
    #[default]
    Png,
    /// Baseline JPEG. Alpha is dropped.
    Jpeg {
        /// Quality in `1..=100`.
        quality: u8,
    },
}

impl ExportFormat {
    /// MIME type of the encoded bytes.
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg { .. } => "image/jpeg",
        }
    }
}

/// Export options.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExportOpts {
    /// Uniform scale applied to canvas width and height.
    pub multiplier: f64,
    /// Output encoding.
    pub format: ExportFormat,
}

impl Default for ExportOpts {
    fn default() -> Self {
        Self {
            multiplier: DEFAULT_MULTIPLIER,
            format: ExportFormat::Png,
        }
    }
}

/// Rasterizes ready scenes and encodes them.
///
/// Keeps its rasterizer (render context, font and layout caches) between calls, so one exporter
/// can be reused for many scenes.
pub struct Exporter {
    rasterizer: CpuRasterizer,
    opts: ExportOpts,
}

impl Exporter {
    /// Exporter using the shared system font book.
    pub fn new(opts: ExportOpts) -> Self {
        Self::with_fonts(FontBook::shared(), opts)
    }

    /// Exporter drawing text with `fonts`.
    pub fn with_fonts(fonts: FontBook, opts: ExportOpts) -> Self {
        Self {
            rasterizer: CpuRasterizer::new(fonts),
            opts,
        }
    }

    /// Options in use.
    pub fn opts(&self) -> &ExportOpts {
        &self.opts
    }

    /// Rasterize `scene` without encoding it.
    pub fn rasterize(&mut self, scene: &Scene) -> CanvasResult<FrameRGBA> {
        self.rasterizer.rasterize(scene, self.opts.multiplier)
    }

    /// Rasterize and encode `scene`.
    ///
    /// Fails with [`CanvasError::Precondition`] when the scene is not ready.
    #[tracing::instrument(skip_all, fields(multiplier = self.opts.multiplier, format = ?self.opts.format))]
    pub fn export(&mut self, scene: &Scene) -> CanvasResult<Vec<u8>> {
        let frame = self.rasterize(scene)?;
        let bytes = encode_frame(frame, self.opts.format)?;
        tracing::debug!(bytes = bytes.len(), "encoded raster");
        Ok(bytes)
    }

    /// Rasterize and encode `scene` as a `data:` URI.
    pub fn export_data_uri(&mut self, scene: &Scene) -> CanvasResult<String> {
        let bytes = self.export(scene)?;
        Ok(format!(
            "data:{};base64,{}",
            self.opts.format.mime_type(),
            base64::engine::general_purpose::STANDARD.encode(bytes)
        ))
    }
}

/// Encode a ready scene with `opts`, drawing text with the shared system font book.
pub fn export_raster(scene: &Scene, opts: &ExportOpts) -> CanvasResult<Vec<u8>> {
    Exporter::new(*opts).export(scene)
}

/// Same as [`export_raster`], returned as a `data:image/...;base64,` URI.
pub fn export_data_uri(scene: &Scene, opts: &ExportOpts) -> CanvasResult<String> {
    Exporter::new(*opts).export_data_uri(scene)
}

fn encode_frame(mut frame: FrameRGBA, format: ExportFormat) -> CanvasResult<Vec<u8>> {
    if frame.premultiplied {
        unpremultiply_rgba8_in_place(&mut frame.data);
        frame.premultiplied = false;
    }

    let mut out = Vec::new();
    match format {
        ExportFormat::Png => {
            image::codecs::png::PngEncoder::new_with_quality(
                Cursor::new(&mut out),
                image::codecs::png::CompressionType::Best,
                image::codecs::png::FilterType::Adaptive,
            )
            .write_image(
                &frame.data,
                frame.width,
                frame.height,
                image::ExtendedColorType::Rgba8,
            )
            .map_err(|e| CanvasError::export(format!("encode png: {e}")))?;
        }
        ExportFormat::Jpeg { quality } => {
            let rgb: Vec<u8> = frame
                .data
                .chunks_exact(4)
                .flat_map(|px| [px[0], px[1], px[2]])
                .collect();
            image::codecs::jpeg::JpegEncoder::new_with_quality(
                Cursor::new(&mut out),
                quality.clamp(1, 100),
            )
            .write_image(
                &rgb,
                frame.width,
                frame.height,
                image::ExtendedColorType::Rgb8,
            )
            .map_err(|e| CanvasError::export(format!("encode jpeg: {e}")))?;
        }
    }
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/render/export.rs"]
mod tests;
