//! Per-variant default cascades.
//!
//! Each function is pure: it reads one primitive and returns a fully resolved node, with
//! defaults built fresh on every call.

use crate::assets::color::Color;
use crate::assets::decode::DecodedImage;
use crate::scene::model::{CircleNode, ImageNode, RectNode, TextNode};
use crate::spec::model::{
    CirclePrimitive, ImagePrimitive, OriginY, RectPrimitive, TextPrimitive,
};

/// Font size used when `fontSize` is absent.
pub const DEFAULT_FONT_SIZE: f64 = 16.0;
/// Font family used when `fontFamily` is absent.
pub const DEFAULT_FONT_FAMILY: &str = "Arial";
/// Outline width used when `strokeWidth` is absent.
pub const DEFAULT_STROKE_WIDTH: f64 = 1.0;
/// Outline width of an image placeholder.
pub const PLACEHOLDER_STROKE_WIDTH: f64 = 2.0;

const DEFAULT_OPACITY: f64 = 1.0;

/// Resolve a `text` primitive.
pub fn resolve_text(p: &TextPrimitive) -> TextNode {
    let origin_y = match p.origin_y.unwrap_or_default() {
        OriginY::Baseline => OriginY::Top,
        other => other,
    };
    TextNode {
        text: p.text.clone(),
        left: p.left,
        top: p.top,
        font_size: p.font_size.unwrap_or(DEFAULT_FONT_SIZE),
        font_family: p
            .font_family
            .clone()
            .unwrap_or_else(|| DEFAULT_FONT_FAMILY.to_owned()),
        font_weight: p.font_weight.unwrap_or_default(),
        fill: p.fill.unwrap_or(Color::BLACK),
        text_align: p.text_align.unwrap_or_default(),
        origin_x: p.origin_x.unwrap_or_default(),
        origin_y,
        opacity: p.opacity.unwrap_or(DEFAULT_OPACITY),
    }
}

/// Resolve a `rect` primitive. An absent `fill` is transparent, not black.
pub fn resolve_rect(p: &RectPrimitive) -> RectNode {
    RectNode {
        left: p.left,
        top: p.top,
        width: p.width,
        height: p.height,
        fill: p.fill.unwrap_or(Color::TRANSPARENT),
        stroke: p.stroke,
        stroke_width: p.stroke_width.unwrap_or(DEFAULT_STROKE_WIDTH),
        rx: p.rx.unwrap_or(0.0),
        ry: p.ry.unwrap_or(0.0),
        opacity: p.opacity.unwrap_or(DEFAULT_OPACITY),
    }
}

/// Resolve a `circle` primitive. The anchor is always the center.
pub fn resolve_circle(p: &CirclePrimitive) -> CircleNode {
    CircleNode {
        left: p.left,
        top: p.top,
        radius: p.radius,
        fill: p.fill.unwrap_or(Color::TRANSPARENT),
        stroke: p.stroke,
        stroke_width: p.stroke_width.unwrap_or(DEFAULT_STROKE_WIDTH),
        opacity: p.opacity.unwrap_or(DEFAULT_OPACITY),
    }
}

/// Build the image node for a resolved asset, scaling natural size to the requested box.
///
/// Aspect ratio is not preserved.
pub fn image_node(p: &ImagePrimitive, image: DecodedImage) -> ImageNode {
    ImageNode {
        src: p.src.clone(),
        left: p.left,
        top: p.top,
        scale_x: p.width / f64::from(image.width),
        scale_y: p.height / f64::from(image.height),
        image,
        opacity: p.opacity.unwrap_or(DEFAULT_OPACITY),
    }
}

/// Build the fallback rectangle for an image whose asset failed to resolve.
pub fn placeholder_node(p: &ImagePrimitive) -> RectNode {
    RectNode {
        left: p.left,
        top: p.top,
        width: p.width,
        height: p.height,
        fill: Color::PLACEHOLDER_FILL,
        stroke: Some(Color::PLACEHOLDER_STROKE),
        stroke_width: PLACEHOLDER_STROKE_WIDTH,
        rx: 0.0,
        ry: 0.0,
        opacity: p.opacity.unwrap_or(DEFAULT_OPACITY),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/normalize.rs"]
mod tests;
