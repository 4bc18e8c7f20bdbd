use crate::assets::color::Color;
use crate::foundation::core::Canvas;
use crate::foundation::error::{CanvasError, CanvasResult};
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::str::FromStr;

/// Root declarative document: a canvas size, a background and an ordered primitive list.
///
/// A `Specification` is only obtainable through validation (see [`Specification::from_value`])
/// and is immutable afterwards. The index of a primitive in [`Specification::objects`] is its
/// paint order: earlier primitives are painted first (further back).
#[derive(Debug, Clone, PartialEq)]
pub struct Specification {
    pub(crate) canvas: Canvas,
    pub(crate) background: Option<Color>,
    pub(crate) objects: Vec<Primitive>,
}

impl Specification {
    /// Parse and validate a specification from a JSON string.
    pub fn from_json_str(json: &str) -> CanvasResult<Self> {
        let value: serde_json::Value = serde_json::from_str(json)
            .map_err(|e| CanvasError::serde(format!("parse specification JSON: {e}")))?;
        Self::from_value(&value)
    }

    /// Parse and validate a specification from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> CanvasResult<Self> {
        let value: serde_json::Value = serde_json::from_reader(r)
            .map_err(|e| CanvasError::serde(format!("parse specification JSON: {e}")))?;
        Self::from_value(&value)
    }

    /// Parse and validate a specification from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> CanvasResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            CanvasError::serde(format!("open specification JSON '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Canvas dimensions.
    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// Canvas width in pixels.
    pub fn width(&self) -> u32 {
        self.canvas.width
    }

    /// Canvas height in pixels.
    pub fn height(&self) -> u32 {
        self.canvas.height
    }

    /// Background color as written in the document, if any.
    pub fn background(&self) -> Option<Color> {
        self.background
    }

    /// Background color with the opaque-white default applied.
    pub fn resolved_background(&self) -> Color {
        self.background.unwrap_or(Color::WHITE)
    }

    /// Primitives in paint order (back to front).
    pub fn objects(&self) -> &[Primitive] {
        &self.objects
    }
}

/// One drawable instruction.
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    /// A run of text.
    Text(TextPrimitive),
    /// An axis-aligned, optionally rounded rectangle.
    Rect(RectPrimitive),
    /// A circle anchored at its center.
    Circle(CirclePrimitive),
    /// An external bitmap or SVG scaled into a box.
    Image(ImagePrimitive),
    /// A primitive whose `type` is outside the supported set. Never rendered.
    Unsupported {
        /// The `type` discriminant as written in the document.
        kind: String,
    },
}

impl Primitive {
    /// The `type` discriminant of this primitive.
    pub fn kind(&self) -> &str {
        match self {
            Self::Text(_) => "text",
            Self::Rect(_) => "rect",
            Self::Circle(_) => "circle",
            Self::Image(_) => "image",
            Self::Unsupported { kind } => kind,
        }
    }
}

/// `text` primitive. Optional fields keep their absence; defaults are applied when the
/// primitive is turned into a scene node.
#[derive(Debug, Clone, PartialEq)]
pub struct TextPrimitive {
    /// Text content; `\n` starts a new line.
    pub text: String,
    /// Horizontal position in canvas pixels.
    pub left: f64,
    /// Vertical position in canvas pixels.
    pub top: f64,
    /// Font size in pixels (default 16).
    pub font_size: Option<f64>,
    /// Font family name (default "Arial").
    pub font_family: Option<String>,
    /// Font weight (default normal).
    pub font_weight: Option<FontWeight>,
    /// Fill color.
    pub fill: Option<Color>,
    /// Line alignment (default left).
    pub text_align: Option<TextAlign>,
    /// Horizontal anchor (default left).
    pub origin_x: Option<OriginX>,
    /// Vertical anchor (default top).
    pub origin_y: Option<OriginY>,
    /// Opacity in `[0, 1]` (default 1).
    pub opacity: Option<f64>,
}

/// `rect` primitive.
#[derive(Debug, Clone, PartialEq)]
pub struct RectPrimitive {
    /// Horizontal position in canvas pixels.
    pub left: f64,
    /// Vertical position in canvas pixels.
    pub top: f64,
    /// Width in canvas pixels.
    pub width: f64,
    /// Height in canvas pixels.
    pub height: f64,
    /// Fill color.
    pub fill: Option<Color>,
    /// Outline color; no outline when absent.
    pub stroke: Option<Color>,
    /// Outline width (default 1).
    pub stroke_width: Option<f64>,
    /// Horizontal corner radius (default 0).
    pub rx: Option<f64>,
    /// Vertical corner radius (default 0).
    pub ry: Option<f64>,
    /// Opacity in `[0, 1]` (default 1).
    pub opacity: Option<f64>,
}

/// `circle` primitive. `left`/`top` name the center.
#[derive(Debug, Clone, PartialEq)]
pub struct CirclePrimitive {
    /// Horizontal position in canvas pixels.
    pub left: f64,
    /// Vertical position in canvas pixels.
    pub top: f64,
    /// Radius in canvas pixels.
    pub radius: f64,
    /// Fill color.
    pub fill: Option<Color>,
    /// Outline color; no outline when absent.
    pub stroke: Option<Color>,
    /// Outline width (default 1).
    pub stroke_width: Option<f64>,
    /// Opacity in `[0, 1]` (default 1).
    pub opacity: Option<f64>,
}

/// `image` primitive. The asset is stretched to exactly `width` x `height`.
#[derive(Debug, Clone, PartialEq)]
pub struct ImagePrimitive {
    /// Horizontal position in canvas pixels.
    pub left: f64,
    /// Vertical position in canvas pixels.
    pub top: f64,
    /// Width in canvas pixels.
    pub width: f64,
    /// Height in canvas pixels.
    pub height: f64,
    /// Asset URI.
    pub src: String,
    /// Opacity in `[0, 1]` (default 1).
    pub opacity: Option<f64>,
}

/// Horizontal anchor of a text box relative to `left`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OriginX {
    /// `left` is the left edge.
    #[default]
    Left,
    /// `left` is the horizontal center.
    Center,
    /// `left` is the right edge.
    Right,
}

impl OriginX {
    /// Fraction of the box width subtracted from `left`.
    pub fn factor(self) -> f64 {
        match self {
            Self::Left => 0.0,
            Self::Center => 0.5,
            Self::Right => 1.0,
        }
    }
}

impl FromStr for OriginX {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "left" => Ok(Self::Left),
            "center" => Ok(Self::Center),
            "right" => Ok(Self::Right),
            _ => Err(()),
        }
    }
}

/// Vertical anchor of a text box relative to `top`.
///
/// `Baseline` is accepted on input but approximated as `Top` when rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OriginY {
    /// `top` is the top edge.
    #[default]
    Top,
    /// `top` is the vertical center.
    Center,
    /// `top` is the bottom edge.
    Bottom,
    /// `top` is the first baseline (rendered as `Top`).
    Baseline,
}

impl OriginY {
    /// Fraction of the box height subtracted from `top`.
    pub fn factor(self) -> f64 {
        match self {
            Self::Top | Self::Baseline => 0.0,
            Self::Center => 0.5,
            Self::Bottom => 1.0,
        }
    }
}

impl FromStr for OriginY {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "top" => Ok(Self::Top),
            "center" => Ok(Self::Center),
            "bottom" => Ok(Self::Bottom),
            "baseline" => Ok(Self::Baseline),
            _ => Err(()),
        }
    }
}

/// Alignment of lines inside a multi-line text box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextAlign {
    /// Flush left.
    #[default]
    Left,
    /// Centered.
    Center,
    /// Flush right.
    Right,
    /// Stretched to the widest line.
    Justify,
}

impl FromStr for TextAlign {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "left" => Ok(Self::Left),
            "center" => Ok(Self::Center),
            "right" => Ok(Self::Right),
            "justify" => Ok(Self::Justify),
            _ => Err(()),
        }
    }
}

/// Numeric CSS font weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FontWeight(pub u16);

impl FontWeight {
    /// `normal` (400).
    pub const NORMAL: Self = Self(400);
    /// `bold` (700).
    pub const BOLD: Self = Self(700);

    /// Parse a CSS keyword or numeric weight in `1..=1000`.
    ///
    /// `bolder`/`lighter` resolve against a `normal` parent.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "normal" => Some(Self::NORMAL),
            "bold" | "bolder" => Some(Self::BOLD),
            "lighter" => Some(Self(100)),
            other => other.parse::<f64>().ok().and_then(Self::from_number),
        }
    }

    /// Accept a numeric weight in `1..=1000`, rounded to an integer.
    pub fn from_number(n: f64) -> Option<Self> {
        if n.is_finite() && (1.0..=1000.0).contains(&n) {
            Some(Self(n.round() as u16))
        } else {
            None
        }
    }
}

impl Default for FontWeight {
    fn default() -> Self {
        Self::NORMAL
    }
}

impl fmt::Display for FontWeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/spec/model.rs"]
mod tests;
