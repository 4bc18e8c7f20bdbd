use super::*;
use crate::scene::model::Layer;
use crate::spec::model::{FontWeight, OriginX, OriginY, TextAlign};

const RED: Color = Color::rgba(255, 0, 0, 255);
const BLUE: Color = Color::rgba(0, 0, 255, 255);

fn px(frame: &FrameRGBA, x: u32, y: u32) -> [u8; 4] {
    let i = ((y * frame.width + x) * 4) as usize;
    [
        frame.data[i],
        frame.data[i + 1],
        frame.data[i + 2],
        frame.data[i + 3],
    ]
}

fn ready_scene(w: u32, h: u32, background: Color, drawables: Vec<Drawable>) -> Scene {
    let spec = crate::spec::model::Specification::from_json_str(&format!(
        r#"{{"width": {w}, "height": {h}, "background": "{background}", "objects": []}}"#
    ))
    .unwrap();
    let mut scene = Scene::for_specification(&spec);
    scene.begin(&spec).unwrap();
    let layers = drawables
        .into_iter()
        .enumerate()
        .map(|(source_index, drawable)| Layer {
            source_index,
            drawable,
            placeholder: false,
        })
        .collect();
    scene.finish(layers, Vec::new());
    scene
}

fn rect(left: f64, top: f64, width: f64, height: f64, fill: Color) -> RectNode {
    RectNode {
        left,
        top,
        width,
        height,
        fill,
        stroke: None,
        stroke_width: 1.0,
        rx: 0.0,
        ry: 0.0,
        opacity: 1.0,
    }
}

fn rasterizer() -> CpuRasterizer {
    CpuRasterizer::new(FontBook::empty())
}

#[test]
fn unready_scene_is_a_precondition_error() {
    let scene = Scene::new(4, 4).unwrap();
    let err = rasterizer().rasterize(&scene, 1.0).unwrap_err();
    assert!(matches!(err, CanvasError::Precondition(_)));
}

#[test]
fn background_fills_the_scaled_surface() {
    let scene = ready_scene(4, 3, RED, Vec::new());
    let frame = rasterizer().rasterize(&scene, 2.0).unwrap();
    assert_eq!((frame.width, frame.height), (8, 6));
    assert!(frame.premultiplied);
    assert_eq!(frame.data.len(), 8 * 6 * 4);
    assert!(frame.data.chunks_exact(4).all(|p| p == [255, 0, 0, 255]));
}

#[test]
fn rect_fill_and_transparent_default() {
    let scene = ready_scene(
        20,
        20,
        Color::WHITE,
        vec![
            Drawable::Rect(rect(0.0, 0.0, 10.0, 10.0, BLUE)),
            Drawable::Rect(rect(10.0, 10.0, 10.0, 10.0, Color::TRANSPARENT)),
        ],
    );
    let frame = rasterizer().rasterize(&scene, 1.0).unwrap();
    assert_eq!(px(&frame, 5, 5), [0, 0, 255, 255]);
    assert_eq!(px(&frame, 15, 15), [255, 255, 255, 255]);
}

#[test]
fn later_layers_paint_over_earlier_ones() {
    let scene = ready_scene(
        10,
        10,
        Color::WHITE,
        vec![
            Drawable::Rect(rect(0.0, 0.0, 10.0, 10.0, BLUE)),
            Drawable::Rect(rect(0.0, 0.0, 10.0, 10.0, RED)),
        ],
    );
    let frame = rasterizer().rasterize(&scene, 1.0).unwrap();
    assert_eq!(px(&frame, 5, 5), [255, 0, 0, 255]);
}

#[test]
fn opacity_blends_and_zero_hides() {
    let mut half = rect(0.0, 0.0, 10.0, 10.0, Color::BLACK);
    half.opacity = 0.5;
    let mut hidden = rect(10.0, 0.0, 10.0, 10.0, Color::BLACK);
    hidden.opacity = 0.0;
    let scene = ready_scene(
        20,
        10,
        Color::WHITE,
        vec![Drawable::Rect(half), Drawable::Rect(hidden)],
    );
    let frame = rasterizer().rasterize(&scene, 1.0).unwrap();
    let [r, g, b, a] = px(&frame, 5, 5);
    assert_eq!(a, 255);
    assert!((120..=135).contains(&r), "r = {r}");
    assert_eq!((r, g), (g, b));
    assert_eq!(px(&frame, 15, 5), [255, 255, 255, 255]);
}

#[test]
fn circle_is_centered_on_its_anchor() {
    let scene = ready_scene(
        40,
        40,
        Color::WHITE,
        vec![Drawable::Circle(CircleNode {
            left: 20.0,
            top: 20.0,
            radius: 10.0,
            fill: BLUE,
            stroke: None,
            stroke_width: 1.0,
            opacity: 1.0,
        })],
    );
    let frame = rasterizer().rasterize(&scene, 1.0).unwrap();
    assert_eq!(px(&frame, 20, 20), [0, 0, 255, 255]);
    assert_eq!(px(&frame, 2, 2), [255, 255, 255, 255]);
    assert_eq!(px(&frame, 20, 5), [255, 255, 255, 255]);
}

#[test]
fn stroke_is_drawn_around_the_outline() {
    let mut outlined = rect(5.0, 5.0, 20.0, 20.0, Color::TRANSPARENT);
    outlined.stroke = Some(RED);
    outlined.stroke_width = 4.0;
    let scene = ready_scene(30, 30, Color::WHITE, vec![Drawable::Rect(outlined)]);
    let frame = rasterizer().rasterize(&scene, 1.0).unwrap();
    assert_eq!(px(&frame, 15, 5), [255, 0, 0, 255]);
    assert_eq!(px(&frame, 15, 15), [255, 255, 255, 255]);
}

#[test]
fn rounded_corners_leave_the_corner_empty() {
    let mut rounded = rect(0.0, 0.0, 40.0, 40.0, BLUE);
    rounded.rx = 20.0;
    rounded.ry = 20.0;
    let scene = ready_scene(40, 40, Color::WHITE, vec![Drawable::Rect(rounded)]);
    let frame = rasterizer().rasterize(&scene, 1.0).unwrap();
    assert_eq!(px(&frame, 1, 1), [255, 255, 255, 255]);
    assert_eq!(px(&frame, 20, 20), [0, 0, 255, 255]);
}

#[test]
fn elliptical_corner_radii_are_clamped() {
    let path = rounded_rect_path(0.0, 0.0, 10.0, 4.0, 100.0, 100.0);
    let bbox = path.bounding_box();
    assert!((bbox.x1 - 10.0).abs() < 1e-9);
    assert!((bbox.y1 - 4.0).abs() < 1e-9);
}

#[test]
fn image_is_stretched_into_its_box() {
    let green = DecodedImage::from_premul_rgba8(2, 2, [0, 255, 0, 255].repeat(4)).unwrap();
    let scene = ready_scene(
        20,
        20,
        Color::WHITE,
        vec![Drawable::Image(ImageNode {
            src: "mem://green".into(),
            left: 5.0,
            top: 5.0,
            scale_x: 5.0,
            scale_y: 5.0,
            image: green,
            opacity: 1.0,
        })],
    );
    let frame = rasterizer().rasterize(&scene, 1.0).unwrap();
    assert_eq!(px(&frame, 10, 10), [0, 255, 0, 255]);
    assert_eq!(px(&frame, 2, 2), [255, 255, 255, 255]);
    assert_eq!(px(&frame, 17, 17), [255, 255, 255, 255]);
}

#[test]
fn text_without_fonts_is_skipped() {
    let scene = ready_scene(
        20,
        20,
        Color::WHITE,
        vec![Drawable::Text(TextNode {
            text: "Hello".into(),
            left: 0.0,
            top: 0.0,
            font_size: 16.0,
            font_family: "Arial".into(),
            font_weight: FontWeight::NORMAL,
            fill: Color::BLACK,
            text_align: TextAlign::Left,
            origin_x: OriginX::Left,
            origin_y: OriginY::Top,
            opacity: 1.0,
        })],
    );
    let frame = rasterizer().rasterize(&scene, 1.0).unwrap();
    assert!(frame.data.chunks_exact(4).all(|p| p == [255, 255, 255, 255]));
}

#[test]
fn rasterizing_twice_is_byte_identical() {
    let scene = ready_scene(
        16,
        16,
        Color::WHITE,
        vec![Drawable::Circle(CircleNode {
            left: 8.0,
            top: 8.0,
            radius: 5.5,
            fill: RED,
            stroke: Some(Color::BLACK),
            stroke_width: 1.0,
            opacity: 0.7,
        })],
    );
    let mut r = rasterizer();
    let a = r.rasterize(&scene, 3.0).unwrap();
    let b = r.rasterize(&scene, 3.0).unwrap();
    assert_eq!(a, b);
}

#[test]
fn oversized_surfaces_are_rejected() {
    let scene = ready_scene(40_000, 1, Color::WHITE, Vec::new());
    let err = rasterizer().rasterize(&scene, 2.0).unwrap_err();
    assert!(matches!(err, CanvasError::Export(_)));
}

fn circle(left: f64, top: f64, radius: f64, fill: Color) -> Drawable {
    Drawable::Circle(CircleNode {
        left,
        top,
        radius,
        fill,
        stroke: None,
        stroke_width: 1.0,
        opacity: 1.0,
    })
}

#[test]
fn huge_circles_render_in_bounded_time() {
    let scene = ready_scene(
        100,
        100,
        Color::WHITE,
        vec![
            circle(50.0, 50.0, 1e12, BLUE),
            circle(50.0, 1e12 + 50.0, 1e12, RED),
            circle(-1e13, -1e13, 1e12, Color::BLACK),
        ],
    );
    let frame = rasterizer().rasterize(&scene, 1.0).unwrap();
    assert_eq!(px(&frame, 50, 25), [0, 0, 255, 255]);
    assert_eq!(px(&frame, 50, 75), [255, 0, 0, 255]);
    assert_eq!(px(&frame, 2, 90), [255, 0, 0, 255]);
    assert_eq!(px(&frame, 97, 10), [0, 0, 255, 255]);
}

#[test]
fn clip_flatten_bounds_line_count() {
    let view = Viewport::new(100, 100, 3.0);
    let huge = Circle::new((50.0, 1e15), 1e15 - 50.0).to_path(view.tolerance);
    let lines = view.clip_flatten(&huge, 1.0);
    assert!(lines.elements().len() < 5_000, "{}", lines.elements().len());
    assert!(
        lines
            .elements()
            .iter()
            .all(|el| !matches!(el, PathEl::CurveTo(..) | PathEl::QuadTo(..)))
    );
}

#[test]
fn clip_flatten_keeps_small_shapes_accurate() {
    let view = Viewport::new(40, 40, 1.0);
    let shape = Circle::new((20.0, 20.0), 10.0).to_path(view.tolerance);
    let flat = view.clip_flatten(&shape, 1.0);
    let bbox = flat.bounding_box();
    assert!((bbox.x0 - 10.0).abs() < 0.2 && (bbox.x1 - 30.0).abs() < 0.2);
    assert!((bbox.y0 - 10.0).abs() < 0.2 && (bbox.y1 - 30.0).abs() < 0.2);
    assert!(flat.elements().len() > 16);
}

fn text_scene(weight: FontWeight) -> Scene {
    ready_scene(
        240,
        60,
        Color::WHITE,
        vec![Drawable::Text(TextNode {
            text: "Hello".into(),
            left: 10.0,
            top: 5.0,
            font_size: 40.0,
            font_family: crate::scene::normalize::DEFAULT_FONT_FAMILY.into(),
            font_weight: weight,
            fill: Color::BLACK,
            text_align: TextAlign::Left,
            origin_x: OriginX::Left,
            origin_y: OriginY::Top,
            opacity: 1.0,
        })],
    )
}

fn ink(frame: &FrameRGBA) -> usize {
    frame.data.chunks_exact(4).filter(|p| p[0] < 128).count()
}

#[test]
fn bold_default_family_text_is_heavier() {
    let fonts = FontBook::shared();
    let (Some(regular), Some(bold)) = (
        fonts.lookup("Arial", FontWeight::NORMAL),
        fonts.lookup("Arial", FontWeight::BOLD),
    ) else {
        return;
    };
    if regular.id == bold.id {
        return;
    }
    let mut r = CpuRasterizer::new(fonts);
    let normal = r.rasterize(&text_scene(FontWeight::NORMAL), 1.0).unwrap();
    let heavy = r.rasterize(&text_scene(FontWeight::BOLD), 1.0).unwrap();
    assert!(ink(&normal) > 0);
    assert_ne!(normal, heavy);
    assert!(ink(&heavy) > ink(&normal), "{} vs {}", ink(&heavy), ink(&normal));
}
