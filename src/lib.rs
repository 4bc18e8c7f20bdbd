//! adcanvas renders declarative ad specifications into raster images.
//!
//! A specification is a canvas size, a background color and an ordered list of text, rect,
//! circle and image primitives. Rendering happens in three steps:
//!
//! - Validate untrusted JSON into a [`Specification`] (every violated field path is reported)
//! - Compose it into a [`Scene`] with [`render_specification`], resolving image assets through an
//!   [`AssetResolver`]; failed assets become placeholders and unknown primitives are skipped with a
//!   [`Diagnostic`]
//! - Export the ready scene with [`export_raster`] at a resolution multiplier (3x PNG by default)
//!
//! ```no_run
//! # async fn demo() -> adcanvas::CanvasResult<()> {
//! let spec = adcanvas::Specification::from_json_str(
//!     r#"{"width": 1080, "height": 1080, "objects": [
//!         {"type": "text", "text": "Hello", "left": 10, "top": 10}]}"#,
//! )?;
//! let resolver = adcanvas::UriResolver::new(adcanvas::UriResolverOpts::default())?;
//! let mut scene = adcanvas::Scene::for_specification(&spec);
//! adcanvas::render_specification(&mut scene, &spec, resolver).await?;
//! let png = adcanvas::export_raster(&scene, &adcanvas::ExportOpts::default())?;
//! # let _ = png;
//! # Ok(())
//! # }
//! ```
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod assets;
mod foundation;
mod render;
mod scene;
mod spec;

pub use crate::foundation::core::{
    Affine, BezPath, Canvas, MAX_SURFACE_DIM, Point, Rect, Vec2,
};
pub use crate::foundation::error::{CanvasError, CanvasResult};

pub use crate::spec::model::{
    CirclePrimitive, FontWeight, ImagePrimitive, OriginX, OriginY, Primitive, RectPrimitive,
    Specification, TextAlign, TextPrimitive,
};
pub use crate::spec::validate::{FieldError, FieldPath, PathElem, ValidationErrors};

pub use crate::assets::color::Color;
pub use crate::assets::decode::{DecodedImage, decode_image};
pub use crate::assets::fetch::{UriResolver, UriResolverOpts};
pub use crate::assets::fonts::FontBook;
pub use crate::assets::resolver::{
    AssetError, AssetResolver, FailingResolver, Retry, StaticResolver,
};

pub use crate::scene::compositor::{Compositor, CompositorOpts, render_specification};
pub use crate::scene::model::{
    CircleNode, Diagnostic, Drawable, ImageNode, Layer, RectNode, Scene, SceneState, TextNode,
};
pub use crate::scene::normalize::{
    DEFAULT_FONT_FAMILY, DEFAULT_FONT_SIZE, DEFAULT_STROKE_WIDTH, PLACEHOLDER_STROKE_WIDTH,
    image_node, placeholder_node, resolve_circle, resolve_rect, resolve_text,
};

pub use crate::render::cpu::{CpuRasterizer, FrameRGBA};
pub use crate::render::export::{
    DEFAULT_MULTIPLIER, ExportFormat, ExportOpts, Exporter, export_data_uri, export_raster,
};
