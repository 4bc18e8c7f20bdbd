use std::fmt;

use crate::assets::color::Color;
use crate::assets::decode::DecodedImage;
use crate::assets::resolver::AssetError;
use crate::foundation::core::Canvas;
use crate::foundation::error::{CanvasError, CanvasResult};
use crate::foundation::math::Fnv1a64;
use crate::spec::model::{FontWeight, OriginX, OriginY, Specification, TextAlign};

/// Lifecycle of a [`Scene`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SceneState {
    /// Freshly created or being filled by the compositor. Not exportable.
    Building,
    /// Every primitive has been processed and every image resolution has settled.
    Ready,
}

/// Ordered collection of resolved drawables for one canvas.
///
/// Layers are stored back to front. A scene is filled exactly once by
/// [`crate::render_specification`] and is read-only afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    canvas: Canvas,
    background: Color,
    layers: Vec<Layer>,
    diagnostics: Vec<Diagnostic>,
    state: SceneState,
}

impl Scene {
    /// Create an empty scene with a white background.
    pub fn new(width: u32, height: u32) -> CanvasResult<Self> {
        Ok(Self {
            canvas: Canvas::new(width, height)?,
            background: Color::WHITE,
            layers: Vec::new(),
            diagnostics: Vec::new(),
            state: SceneState::Building,
        })
    }

    /// Create an empty scene sized for `spec`.
    pub fn for_specification(spec: &Specification) -> Self {
        Self {
            canvas: spec.canvas(),
            background: Color::WHITE,
            layers: Vec::new(),
            diagnostics: Vec::new(),
            state: SceneState::Building,
        }
    }

    /// Canvas dimensions in pixels.
    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// Background color painted under every layer.
    pub fn background(&self) -> Color {
        self.background
    }

    /// Layers in paint order (back to front).
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Recoverable problems recorded while composing (skipped primitives, placeholder fallbacks).
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SceneState {
        self.state
    }

    /// Return `true` once the scene may be exported.
    pub fn is_ready(&self) -> bool {
        self.state == SceneState::Ready
    }

    /// Stable 64-bit hash over canvas, background and every layer's geometry and style.
    ///
    /// Two renders of the same specification with the same asset outcomes yield equal
    /// fingerprints.
    pub fn fingerprint(&self) -> u64 {
        let mut h = Fnv1a64::new_default();
        h.write_u32(self.canvas.width);
        h.write_u32(self.canvas.height);
        write_color(&mut h, self.background);
        h.write_u64(self.layers.len() as u64);
        for layer in &self.layers {
            layer.write_fingerprint(&mut h);
        }
        h.finish()
    }

    pub(crate) fn begin(&mut self, spec: &Specification) -> CanvasResult<()> {
        if self.state != SceneState::Building || !self.layers.is_empty() {
            return Err(CanvasError::scene(
                "scene was already rendered; create a new scene per render pass",
            ));
        }
        if self.canvas != spec.canvas() {
            return Err(CanvasError::scene(format!(
                "scene is {}x{} but the specification is {}x{}",
                self.canvas.width,
                self.canvas.height,
                spec.width(),
                spec.height()
            )));
        }
        self.background = spec.resolved_background();
        Ok(())
    }

    pub(crate) fn finish(&mut self, layers: Vec<Layer>, diagnostics: Vec<Diagnostic>) {
        self.layers = layers;
        self.diagnostics = diagnostics;
        self.state = SceneState::Ready;
    }
}

/// One drawable in the scene, tagged with the index of the primitive it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    /// Index of the source primitive in `Specification::objects`.
    pub source_index: usize,
    /// What to draw.
    pub drawable: Drawable,
    /// `true` when this layer stands in for an image that failed to resolve.
    pub placeholder: bool,
}

impl Layer {
    fn write_fingerprint(&self, h: &mut Fnv1a64) {
        h.write_u64(self.source_index as u64);
        h.write_u8(u8::from(self.placeholder));
        match &self.drawable {
            Drawable::Text(t) => {
                h.write_u8(0);
                h.write_str(&t.text);
                h.write_f64(t.left);
                h.write_f64(t.top);
                h.write_f64(t.font_size);
                h.write_str(&t.font_family);
                h.write_u32(u32::from(t.font_weight.0));
                write_color(h, t.fill);
                h.write_u8(t.text_align as u8);
                h.write_u8(t.origin_x as u8);
                h.write_u8(t.origin_y as u8);
                h.write_f64(t.opacity);
            }
            Drawable::Rect(r) => {
                h.write_u8(1);
                h.write_f64(r.left);
                h.write_f64(r.top);
                h.write_f64(r.width);
                h.write_f64(r.height);
                write_color(h, r.fill);
                write_stroke(h, r.stroke, r.stroke_width);
                h.write_f64(r.rx);
                h.write_f64(r.ry);
                h.write_f64(r.opacity);
            }
            Drawable::Circle(c) => {
                h.write_u8(2);
                h.write_f64(c.left);
                h.write_f64(c.top);
                h.write_f64(c.radius);
                write_color(h, c.fill);
                write_stroke(h, c.stroke, c.stroke_width);
                h.write_f64(c.opacity);
            }
            Drawable::Image(i) => {
                h.write_u8(3);
                h.write_str(&i.src);
                h.write_f64(i.left);
                h.write_f64(i.top);
                h.write_f64(i.scale_x);
                h.write_f64(i.scale_y);
                h.write_u32(i.image.width);
                h.write_u32(i.image.height);
                h.write_bytes(&i.image.rgba8_premul);
                h.write_f64(i.opacity);
            }
        }
    }
}

fn write_color(h: &mut Fnv1a64, c: Color) {
    h.write_bytes(&[c.r, c.g, c.b, c.a]);
}

fn write_stroke(h: &mut Fnv1a64, stroke: Option<Color>, width: f64) {
    match stroke {
        Some(c) => {
            h.write_u8(1);
            write_color(h, c);
            h.write_f64(width);
        }
        None => h.write_u8(0),
    }
}

/// Fully resolved drawable. Every style field carries a concrete value.
#[derive(Debug, Clone, PartialEq)]
pub enum Drawable {
    /// Text run.
    Text(TextNode),
    /// Rectangle (also used for image placeholders).
    Rect(RectNode),
    /// Circle.
    Circle(CircleNode),
    /// Scaled bitmap.
    Image(ImageNode),
}

/// Resolved `text` primitive.
#[derive(Debug, Clone, PartialEq)]
pub struct TextNode {
    /// Text content.
    pub text: String,
    /// Anchor x in canvas pixels.
    pub left: f64,
    /// Anchor y in canvas pixels.
    pub top: f64,
    /// Font size in pixels.
    pub font_size: f64,
    /// Requested font family.
    pub font_family: String,
    /// Numeric font weight.
    pub font_weight: FontWeight,
    /// Glyph color.
    pub fill: Color,
    /// Line alignment inside the text box.
    pub text_align: TextAlign,
    /// Horizontal anchor.
    pub origin_x: OriginX,
    /// Vertical anchor. Never [`OriginY::Baseline`], which is normalized to [`OriginY::Top`].
    pub origin_y: OriginY,
    /// Opacity in `[0, 1]`.
    pub opacity: f64,
}

/// Resolved `rect` primitive or image placeholder.
#[derive(Debug, Clone, PartialEq)]
pub struct RectNode {
    /// Left edge in canvas pixels.
    pub left: f64,
    /// Top edge in canvas pixels.
    pub top: f64,
    /// Width in canvas pixels.
    pub width: f64,
    /// Height in canvas pixels.
    pub height: f64,
    /// Interior color.
    pub fill: Color,
    /// Outline color, if outlined.
    pub stroke: Option<Color>,
    /// Outline width in canvas pixels.
    pub stroke_width: f64,
    /// Horizontal corner radius.
    pub rx: f64,
    /// Vertical corner radius.
    pub ry: f64,
    /// Opacity in `[0, 1]`.
    pub opacity: f64,
}

/// Resolved `circle` primitive. `left`/`top` is the center.
#[derive(Debug, Clone, PartialEq)]
pub struct CircleNode {
    /// Center x in canvas pixels.
    pub left: f64,
    /// Center y in canvas pixels.
    pub top: f64,
    /// Radius in canvas pixels.
    pub radius: f64,
    /// Interior color.
    pub fill: Color,
    /// Outline color, if outlined.
    pub stroke: Option<Color>,
    /// Outline width in canvas pixels.
    pub stroke_width: f64,
    /// Opacity in `[0, 1]`.
    pub opacity: f64,
}

/// Resolved `image` primitive.
///
/// The decoded image is drawn at its natural size, scaled by (`scale_x`, `scale_y`) and
/// translated to (`left`, `top`).
#[derive(Debug, Clone, PartialEq)]
pub struct ImageNode {
    /// Asset URI the pixels came from.
    pub src: String,
    /// Left edge in canvas pixels.
    pub left: f64,
    /// Top edge in canvas pixels.
    pub top: f64,
    /// Requested width over natural width.
    pub scale_x: f64,
    /// Requested height over natural height.
    pub scale_y: f64,
    /// Decoded pixels at natural size.
    pub image: DecodedImage,
    /// Opacity in `[0, 1]`.
    pub opacity: f64,
}

impl ImageNode {
    /// Drawn width in canvas pixels.
    pub fn width(&self) -> f64 {
        f64::from(self.image.width) * self.scale_x
    }

    /// Drawn height in canvas pixels.
    pub fn height(&self) -> f64 {
        f64::from(self.image.height) * self.scale_y
    }
}

/// A recoverable per-primitive problem. Rendering continued past it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// The primitive's `type` is not one of the supported kinds; it was skipped.
    UnsupportedPrimitive {
        /// Primitive index.
        index: usize,
        /// The `type` as written.
        kind: String,
    },
    /// The image asset failed to resolve; a placeholder was drawn instead.
    AssetFallback {
        /// Primitive index.
        index: usize,
        /// Asset URI.
        src: String,
        /// Why resolution failed.
        error: AssetError,
    },
}

impl Diagnostic {
    /// Index of the primitive this diagnostic refers to.
    pub fn index(&self) -> usize {
        match self {
            Self::UnsupportedPrimitive { index, .. } | Self::AssetFallback { index, .. } => *index,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedPrimitive { index, kind } => {
                write!(f, "objects[{index}]: unsupported primitive type '{kind}', skipped")
            }
            Self::AssetFallback { index, src, error } => {
                write!(
                    f,
                    "objects[{index}]: image '{src}' failed ({error}), drew placeholder"
                )
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/model.rs"]
mod tests;
