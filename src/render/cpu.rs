use std::collections::HashMap;
use std::sync::Arc;

use vello_cpu::kurbo::{
    Affine, BezPath, Circle, CubicBez, ParamCurve, PathEl, Point, QuadBez, Rect, Shape, Stroke,
};

use crate::assets::color::Color;
use crate::assets::decode::DecodedImage;
use crate::assets::fonts::{FontBook, FontFace, TextBrushRgba8, TextLayoutEngine};
use crate::foundation::error::{CanvasError, CanvasResult};
use crate::scene::model::{CircleNode, Drawable, ImageNode, RectNode, Scene, TextNode};

/// Path flattening tolerance in device pixels.
const TOLERANCE: f64 = 0.1;

/// Cubic Bézier handle length for a quarter ellipse, relative to the radius.
const KAPPA: f64 = 0.552_284_749_830_793_4;

/// Subdivision depth at which a curve piece is emitted as a line regardless of flatness.
const MAX_SUBDIVISIONS: u32 = 48;

/// Rasterized frame.
///
/// Frames produced by [`CpuRasterizer`] are premultiplied alpha; `premultiplied` makes that
/// explicit at API boundaries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRGBA {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
    /// Whether the `data` is premultiplied alpha.
    pub premultiplied: bool,
}

struct CachedFont {
    face: FontFace,
    font: vello_cpu::peniko::FontData,
}

/// CPU rasterizer powered by `vello_cpu`.
///
/// Paints the background and then every layer back to front, scaled uniformly by the export
/// multiplier. Rendering is single-threaded and deterministic: the same scene and multiplier
/// always produce the same bytes.
pub struct CpuRasterizer {
    fonts: FontBook,
    text_engine: TextLayoutEngine,
    font_cache: HashMap<(String, u16), Option<Arc<CachedFont>>>,
    ctx: Option<vello_cpu::RenderContext>,
}

impl Default for CpuRasterizer {
    fn default() -> Self {
        Self::new(FontBook::shared())
    }
}

impl CpuRasterizer {
    /// Rasterizer drawing text with faces from `fonts`.
    pub fn new(fonts: FontBook) -> Self {
        Self {
            fonts,
            text_engine: TextLayoutEngine::new(),
            font_cache: HashMap::new(),
            ctx: None,
        }
    }

    /// Fonts available to text layers.
    pub fn fonts(&self) -> &FontBook {
        &self.fonts
    }

    /// Rasterize a ready scene at `multiplier` times its canvas size.
    #[tracing::instrument(skip(self, scene), fields(layers = scene.layers().len()))]
    pub fn rasterize(&mut self, scene: &Scene, multiplier: f64) -> CanvasResult<FrameRGBA> {
        if !scene.is_ready() {
            return Err(CanvasError::precondition(
                "scene is not ready; await render_specification before exporting",
            ));
        }
        let (width, height) = scene.canvas().scaled(multiplier)?;
        let (w16, h16) = (u16_dim(width)?, u16_dim(height)?);

        let mut ctx = match self.ctx.take() {
            Some(ctx) if ctx.width() == w16 && ctx.height() == h16 => ctx,
            _ => vello_cpu::RenderContext::new(w16, h16),
        };
        ctx.reset();
        let drawn = self.draw_scene(&mut ctx, scene, multiplier);
        let mut pixmap = vello_cpu::Pixmap::new(w16, h16);
        if drawn.is_ok() {
            ctx.flush();
            ctx.render_to_pixmap(&mut pixmap);
        }
        self.ctx = Some(ctx);
        drawn?;

        Ok(FrameRGBA {
            width,
            height,
            data: pixmap.data_as_u8_slice().to_vec(),
            premultiplied: true,
        })
    }

    fn draw_scene(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        scene: &Scene,
        multiplier: f64,
    ) -> CanvasResult<()> {
        let view = Viewport::new(scene.canvas().width, scene.canvas().height, multiplier);
        let base = view.base;
        ctx.set_blend_mode(vello_cpu::peniko::BlendMode::default());
        ctx.set_paint_transform(Affine::IDENTITY);

        let bg = scene.background();
        if !bg.is_transparent() {
            let canvas = scene.canvas();
            ctx.set_transform(base);
            ctx.set_paint(bg.to_peniko());
            ctx.fill_rect(&Rect::new(
                0.0,
                0.0,
                f64::from(canvas.width),
                f64::from(canvas.height),
            ));
        }

        for layer in scene.layers() {
            match &layer.drawable {
                Drawable::Text(t) => self.draw_text(ctx, base, t)?,
                Drawable::Rect(r) => draw_rect(ctx, &view, r),
                Drawable::Circle(c) => draw_circle(ctx, &view, c),
                Drawable::Image(i) => draw_image(ctx, base, i)?,
            }
        }
        Ok(())
    }

    fn font_for(&mut self, family: &str, weight: u16) -> Option<Arc<CachedFont>> {
        let key = (family.to_owned(), weight);
        if let Some(cached) = self.font_cache.get(&key) {
            return cached.clone();
        }
        let found = self
            .fonts
            .lookup(family, crate::spec::model::FontWeight(weight))
            .map(|face| {
                let font = vello_cpu::peniko::FontData::new(
                    vello_cpu::peniko::Blob::from(face.data.as_ref().clone()),
                    face.index,
                );
                Arc::new(CachedFont { face, font })
            });
        if found.is_none() {
            tracing::warn!(family, weight, "no font face available, text will not be drawn");
        }
        self.font_cache.insert(key, found.clone());
        found
    }

    fn draw_text(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        base: Affine,
        t: &TextNode,
    ) -> CanvasResult<()> {
        if t.opacity <= 0.0 || t.text.is_empty() {
            return Ok(());
        }
        let Some(font) = self.font_for(&t.font_family, t.font_weight.0) else {
            return Ok(());
        };
        let layout = self.text_engine.layout(
            &t.text,
            &font.face,
            t.font_size as f32,
            t.font_weight,
            t.text_align,
            TextBrushRgba8::from(t.fill),
        )?;

        let x = t.left - t.origin_x.factor() * f64::from(layout.width());
        let y = t.top - t.origin_y.factor() * f64::from(layout.height());
        ctx.set_transform(base * Affine::translate((x, y)));

        with_opacity(ctx, t.opacity, |ctx| {
            for line in layout.lines() {
                for item in line.items() {
                    let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                        continue;
                    };
                    let brush = run.style().brush;
                    ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                        brush.r, brush.g, brush.b, brush.a,
                    ));
                    let glyphs = run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                        id: g.id,
                        x: g.x,
                        y: g.y,
                    });
                    ctx.glyph_run(&font.font)
                        .font_size(run.run().font_size())
                        .fill_glyphs(glyphs);
                }
            }
        });
        Ok(())
    }
}

fn draw_rect(ctx: &mut vello_cpu::RenderContext, view: &Viewport, r: &RectNode) {
    let shape = if r.rx > 0.0 && r.ry > 0.0 && r.width > 0.0 && r.height > 0.0 {
        rounded_rect_path(r.left, r.top, r.width, r.height, r.rx, r.ry)
    } else {
        Rect::new(r.left, r.top, r.left + r.width, r.top + r.height).to_path(view.tolerance)
    };
    let path = view.clip_flatten(&shape, stroke_margin(r.stroke, r.stroke_width));
    ctx.set_transform(view.base);
    with_opacity(ctx, r.opacity, |ctx| {
        fill_and_stroke(ctx, &path, r.fill, r.stroke, r.stroke_width);
    });
}

fn draw_circle(ctx: &mut vello_cpu::RenderContext, view: &Viewport, c: &CircleNode) {
    let shape = Circle::new((c.left, c.top), c.radius).to_path(view.tolerance);
    let path = view.clip_flatten(&shape, stroke_margin(c.stroke, c.stroke_width));
    ctx.set_transform(view.base);
    with_opacity(ctx, c.opacity, |ctx| {
        fill_and_stroke(ctx, &path, c.fill, c.stroke, c.stroke_width);
    });
}

fn draw_image(
    ctx: &mut vello_cpu::RenderContext,
    base: Affine,
    i: &ImageNode,
) -> CanvasResult<()> {
    if i.scale_x == 0.0 || i.scale_y == 0.0 {
        return Ok(());
    }
    let paint = image_paint(&i.image)?;
    ctx.set_transform(
        base * Affine::translate((i.left, i.top)) * Affine::scale_non_uniform(i.scale_x, i.scale_y),
    );
    ctx.set_paint(paint);
    with_opacity(ctx, i.opacity, |ctx| {
        ctx.fill_rect(&Rect::new(
            0.0,
            0.0,
            f64::from(i.image.width),
            f64::from(i.image.height),
        ));
    });
    Ok(())
}

fn fill_and_stroke(
    ctx: &mut vello_cpu::RenderContext,
    path: &BezPath,
    fill: Color,
    stroke: Option<Color>,
    stroke_width: f64,
) {
    if !fill.is_transparent() {
        ctx.set_paint(fill.to_peniko());
        ctx.fill_path(path);
    }
    if let Some(stroke) = stroke.filter(|s| !s.is_transparent() && stroke_width > 0.0) {
        ctx.set_paint(stroke.to_peniko());
        ctx.set_stroke(Stroke::new(stroke_width));
        ctx.stroke_path(path);
    }
}

/// Run `draw` inside an opacity layer when `opacity < 1`. Fully transparent content is skipped.
fn with_opacity(
    ctx: &mut vello_cpu::RenderContext,
    opacity: f64,
    draw: impl FnOnce(&mut vello_cpu::RenderContext),
) {
    if opacity <= 0.0 {
        return;
    }
    if opacity < 1.0 {
        ctx.push_opacity_layer(opacity as f32);
        draw(ctx);
        ctx.pop_layer();
    } else {
        draw(ctx);
    }
}

/// Canvas-space view of one rasterization pass.
struct Viewport {
    base: Affine,
    /// Canvas rectangle in canvas pixels.
    bounds: Rect,
    /// Flattening tolerance in canvas pixels.
    tolerance: f64,
}

impl Viewport {
    fn new(width: u32, height: u32, multiplier: f64) -> Self {
        Self {
            base: Affine::scale(multiplier),
            bounds: Rect::new(0.0, 0.0, f64::from(width), f64::from(height)),
            tolerance: TOLERANCE / multiplier,
        }
    }

    /// Flatten `path` into lines, refining only curve pieces that can reach the canvas.
    ///
    /// A piece whose control hull misses the canvas (grown by `margin`) is replaced by its chord.
    /// The chord lies inside the hull, so winding on the canvas is unchanged and the line count
    /// stays bounded however large the geometry is.
    fn clip_flatten(&self, path: &BezPath, margin: f64) -> BezPath {
        let clip = self.bounds.inflate(margin, margin);
        let mut out = BezPath::new();
        let (mut start, mut last) = (Point::ZERO, Point::ZERO);
        for el in path.elements() {
            match *el {
                PathEl::MoveTo(p) => {
                    out.move_to(p);
                    (start, last) = (p, p);
                }
                PathEl::LineTo(p) => {
                    out.line_to(p);
                    last = p;
                }
                PathEl::QuadTo(p1, p2) => {
                    self.flatten_cubic(&mut out, QuadBez::new(last, p1, p2).raise(), clip, 0);
                    last = p2;
                }
                PathEl::CurveTo(p1, p2, p3) => {
                    self.flatten_cubic(&mut out, CubicBez::new(last, p1, p2, p3), clip, 0);
                    last = p3;
                }
                PathEl::ClosePath => {
                    out.close_path();
                    last = start;
                }
            }
        }
        out
    }

    fn flatten_cubic(&self, out: &mut BezPath, c: CubicBez, clip: Rect, depth: u32) {
        if depth >= MAX_SUBDIVISIONS
            || !overlaps(hull_bounds(&c), clip)
            || is_flat(&c, self.tolerance)
        {
            out.line_to(c.p3);
            return;
        }
        let (a, b) = c.subdivide();
        self.flatten_cubic(out, a, clip, depth + 1);
        self.flatten_cubic(out, b, clip, depth + 1);
    }
}

/// Extra room around the canvas so stroke outlines and miter joins are kept.
fn stroke_margin(stroke: Option<Color>, stroke_width: f64) -> f64 {
    1.0 + stroke.map_or(0.0, |_| 2.0 * stroke_width.max(0.0))
}

fn hull_bounds(c: &CubicBez) -> Rect {
    Rect::from_points(c.p0, c.p1).union_pt(c.p2).union_pt(c.p3)
}

fn overlaps(a: Rect, b: Rect) -> bool {
    a.x0 <= b.x1 && b.x0 <= a.x1 && a.y0 <= b.y1 && b.y0 <= a.y1
}

/// Both control points lie within `tolerance` of the chord.
fn is_flat(c: &CubicBez, tolerance: f64) -> bool {
    let chord = c.p3 - c.p0;
    let len = chord.hypot();
    let dist = |p: Point| {
        let v = p - c.p0;
        if len <= f64::EPSILON {
            v.hypot()
        } else {
            chord.cross(v).abs() / len
        }
    };
    dist(c.p1).max(dist(c.p2)) <= tolerance
}

/// Rectangle with elliptical corners; radii are clamped to half the box.
fn rounded_rect_path(x: f64, y: f64, w: f64, h: f64, rx: f64, ry: f64) -> BezPath {
    let rx = rx.min(w / 2.0);
    let ry = ry.min(h / 2.0);
    let (kx, ky) = (rx * KAPPA, ry * KAPPA);
    let (x1, y1) = (x + w, y + h);

    let mut p = BezPath::new();
    p.move_to((x + rx, y));
    p.line_to((x1 - rx, y));
    p.curve_to((x1 - rx + kx, y), (x1, y + ry - ky), (x1, y + ry));
    p.line_to((x1, y1 - ry));
    p.curve_to((x1, y1 - ry + ky), (x1 - rx + kx, y1), (x1 - rx, y1));
    p.line_to((x + rx, y1));
    p.curve_to((x + rx - kx, y1), (x, y1 - ry + ky), (x, y1 - ry));
    p.line_to((x, y + ry));
    p.curve_to((x, y + ry - ky), (x + rx - kx, y), (x + rx, y));
    p.close_path();
    p
}

fn image_paint(image: &DecodedImage) -> CanvasResult<vello_cpu::Image> {
    let pixmap = pixmap_from_premul_bytes(&image.rgba8_premul, image.width, image.height)?;
    Ok(vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    })
}

fn pixmap_from_premul_bytes(
    bytes: &[u8],
    width: u32,
    height: u32,
) -> CanvasResult<vello_cpu::Pixmap> {
    let w = u16_dim(width)?;
    let h = u16_dim(height)?;
    if bytes.len()
        != (width as usize)
            .saturating_mul(height as usize)
            .saturating_mul(4)
    {
        return Err(CanvasError::export("pixmap byte len mismatch"));
    }
    let pixels = bytes
        .chunks_exact(4)
        .map(|px| vello_cpu::peniko::color::PremulRgba8::from_u8_array([px[0], px[1], px[2], px[3]]))
        .collect::<Vec<_>>();
    Ok(vello_cpu::Pixmap::from_parts_with_opacity(pixels, w, h, true))
}

fn u16_dim(v: u32) -> CanvasResult<u16> {
    u16::try_from(v).map_err(|_| CanvasError::export(format!("surface dimension {v} exceeds u16")))
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
