use crate::foundation::error::{CanvasError, CanvasResult};

pub use kurbo::{Affine, BezPath, Point, Rect, Vec2};

/// Largest surface edge the CPU rasterizer can allocate.
pub const MAX_SURFACE_DIM: u32 = u16::MAX as u32;

/// Canvas dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Canvas {
    /// Create a validated canvas with non-zero edges.
    pub fn new(width: u32, height: u32) -> CanvasResult<Self> {
        if width == 0 || height == 0 {
            return Err(CanvasError::scene(format!(
                "canvas must be non-empty, got {width}x{height}"
            )));
        }
        Ok(Self { width, height })
    }

    /// Output pixel size for a resolution multiplier, rounded to the nearest pixel.
    ///
    /// Fails when the scaled surface is empty or exceeds [`MAX_SURFACE_DIM`].
    pub fn scaled(self, multiplier: f64) -> CanvasResult<(u32, u32)> {
        if !multiplier.is_finite() || multiplier <= 0.0 {
            return Err(CanvasError::export(format!(
                "multiplier must be finite and > 0, got {multiplier}"
            )));
        }
        let w = (f64::from(self.width) * multiplier).round();
        let h = (f64::from(self.height) * multiplier).round();
        let max = f64::from(MAX_SURFACE_DIM);
        if w < 1.0 || h < 1.0 || w > max || h > max {
            return Err(CanvasError::export(format!(
                "raster size {w}x{h} out of range (1..={MAX_SURFACE_DIM} per edge)"
            )));
        }
        Ok((w as u32, h as u32))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
