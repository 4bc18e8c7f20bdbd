use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, OnceLock};

use usvg::fontdb;

use crate::assets::color::Color;
use crate::foundation::error::{CanvasError, CanvasResult};
use crate::spec::model::{FontWeight, TextAlign};

/// Font faces available to text layers, looked up by family name and weight.
///
/// A book starts from the system fonts (or nothing, see [`FontBook::empty`]) and can be extended
/// with font directories or in-memory font files. Lookups fall back from the requested family to
/// the generic sans-serif family and finally to any loaded text face. Generic families (`serif`,
/// `sans-serif`, ...) map to the first installed face from a list of common candidates.
#[derive(Clone, Debug)]
pub struct FontBook {
    db: Arc<fontdb::Database>,
}

impl Default for FontBook {
    fn default() -> Self {
        Self::system()
    }
}

impl FontBook {
    /// Book holding every font installed on the system.
    pub fn system() -> Self {
        let mut db = fontdb::Database::new();
        db.load_system_fonts();
        assign_generic_families(&mut db);
        tracing::debug!(faces = db.len(), "loaded system fonts");
        Self { db: Arc::new(db) }
    }

    /// Process-wide system font book, loaded on first use.
    pub fn shared() -> Self {
        static SHARED: OnceLock<FontBook> = OnceLock::new();
        SHARED.get_or_init(Self::system).clone()
    }

    /// Book without any faces. Text layers render nothing until fonts are added.
    pub fn empty() -> Self {
        Self {
            db: Arc::new(fontdb::Database::new()),
        }
    }

    /// Add every font file found (recursively) under `dir`.
    pub fn with_font_dir(mut self, dir: impl AsRef<Path>) -> Self {
        let db = Arc::make_mut(&mut self.db);
        db.load_fonts_dir(dir);
        assign_generic_families(db);
        self
    }

    /// Add a font file (TTF, OTF, TTC) held in memory.
    pub fn with_font_data(mut self, bytes: Vec<u8>) -> Self {
        let db = Arc::make_mut(&mut self.db);
        db.load_font_data(bytes);
        assign_generic_families(db);
        self
    }

    /// Number of loaded faces.
    pub fn len(&self) -> usize {
        self.db.len()
    }

    /// Return `true` when no face is loaded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn database(&self) -> Arc<fontdb::Database> {
        Arc::clone(&self.db)
    }

    /// Pick the face for `family` at `weight`, applying the fallback chain.
    pub(crate) fn lookup(&self, family: &str, weight: FontWeight) -> Option<FontFace> {
        let weight = fontdb::Weight(weight.0);
        let id = self
            .query(generic_or_named(family), weight)
            .or_else(|| {
                tracing::debug!(family, "font family not found, falling back to sans-serif");
                self.query(fontdb::Family::SansSerif, weight)
            })
            .or_else(|| self.any_text_face(weight))?;

        self.db.with_face_data(id, |data, index| FontFace {
            id,
            data: Arc::new(data.to_vec()),
            index,
        })
    }

    /// Closest weight from the first loaded family, preferring families meant for running text.
    fn any_text_face(&self, weight: fontdb::Weight) -> Option<fontdb::ID> {
        let mut families: Vec<&str> = Vec::new();
        for face in self.db.faces() {
            if let Some((name, _)) = face.families.first()
                && !families.contains(&name.as_str())
            {
                families.push(name.as_str());
            }
        }
        let (text, symbol): (Vec<&str>, Vec<&str>) =
            families.into_iter().partition(|name| !is_symbol_family(name));
        text.into_iter()
            .chain(symbol)
            .find_map(|name| self.query(fontdb::Family::Name(name), weight))
    }

    fn query(&self, family: fontdb::Family<'_>, weight: fontdb::Weight) -> Option<fontdb::ID> {
        self.db.query(&fontdb::Query {
            families: &[family],
            weight,
            stretch: fontdb::Stretch::Normal,
            style: fontdb::Style::Normal,
        })
    }
}

const SANS_SERIF_FAMILIES: &[&str] = &[
    "Arial",
    "Helvetica",
    "Helvetica Neue",
    "Liberation Sans",
    "Arimo",
    "DejaVu Sans",
    "Noto Sans",
    "FreeSans",
    "Roboto",
    "Verdana",
];
const SERIF_FAMILIES: &[&str] = &[
    "Times New Roman",
    "Times",
    "Liberation Serif",
    "Tinos",
    "DejaVu Serif",
    "Noto Serif",
    "FreeSerif",
    "Georgia",
];
const MONOSPACE_FAMILIES: &[&str] = &[
    "Courier New",
    "Courier",
    "Liberation Mono",
    "Cousine",
    "DejaVu Sans Mono",
    "Noto Sans Mono",
    "FreeMono",
    "Consolas",
];
const CURSIVE_FAMILIES: &[&str] = &["Comic Sans MS", "Apple Chancery", "URW Chancery L"];
const FANTASY_FAMILIES: &[&str] = &["Impact", "Papyrus", "Copperplate"];

/// Point each generic family at the first installed candidate. Generics without an installed
/// candidate keep fontdb's defaults.
fn assign_generic_families(db: &mut fontdb::Database) {
    let installed: HashMap<String, String> = db
        .faces()
        .flat_map(|face| face.families.iter())
        .map(|(name, _)| (name.to_ascii_lowercase(), name.clone()))
        .collect();
    let pick = |candidates: &[&str]| {
        candidates
            .iter()
            .find_map(|c| installed.get(&c.to_ascii_lowercase()).cloned())
    };

    if let Some(name) = pick(SANS_SERIF_FAMILIES) {
        db.set_sans_serif_family(name);
    }
    if let Some(name) = pick(SERIF_FAMILIES) {
        db.set_serif_family(name);
    }
    if let Some(name) = pick(MONOSPACE_FAMILIES) {
        db.set_monospace_family(name);
    }
    if let Some(name) = pick(CURSIVE_FAMILIES) {
        db.set_cursive_family(name);
    }
    if let Some(name) = pick(FANTASY_FAMILIES) {
        db.set_fantasy_family(name);
    }
}

/// Math, emoji and symbol fonts have no useful Latin coverage for ad copy.
fn is_symbol_family(name: &str) -> bool {
    let name = name.to_ascii_lowercase();
    ["math", "emoji", "symbol", "dingbat"]
        .iter()
        .any(|k| name.contains(k))
}

fn generic_or_named(family: &str) -> fontdb::Family<'_> {
    match family.trim().to_ascii_lowercase().as_str() {
        "serif" => fontdb::Family::Serif,
        "sans-serif" => fontdb::Family::SansSerif,
        "monospace" => fontdb::Family::Monospace,
        "cursive" => fontdb::Family::Cursive,
        "fantasy" => fontdb::Family::Fantasy,
        _ => fontdb::Family::Name(family.trim()),
    }
}

/// Raw bytes of one font face.
#[derive(Clone, Debug)]
pub(crate) struct FontFace {
    pub(crate) id: fontdb::ID,
    pub(crate) data: Arc<Vec<u8>>,
    pub(crate) index: u32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// RGBA8 brush color used by Parley text layout.
pub(crate) struct TextBrushRgba8 {
    pub(crate) r: u8,
    pub(crate) g: u8,
    pub(crate) b: u8,
    pub(crate) a: u8,
}

impl From<Color> for TextBrushRgba8 {
    fn from(c: Color) -> Self {
        Self {
            r: c.r,
            g: c.g,
            b: c.b,
            a: c.a,
        }
    }
}

/// Stateful helper for building Parley text layouts from font faces.
///
/// Each face is registered with Parley once; later layouts reuse the registered family name.
pub(crate) struct TextLayoutEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrushRgba8>,
    families: HashMap<fontdb::ID, String>,
}

impl Default for TextLayoutEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TextLayoutEngine {
    pub(crate) fn new() -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
            families: HashMap::new(),
        }
    }

    fn family_for(&mut self, face: &FontFace) -> CanvasResult<String> {
        if let Some(name) = self.families.get(&face.id) {
            return Ok(name.clone());
        }
        let families = self
            .font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(face.data.as_ref().clone()), None);
        let family_id = families
            .first()
            .map(|(id, _)| *id)
            .ok_or_else(|| CanvasError::export("no font families registered from font bytes"))?;
        let name = self
            .font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| CanvasError::export("registered font family has no name"))?
            .to_string();
        self.families.insert(face.id, name.clone());
        Ok(name)
    }

    /// Shape and lay out `text` (lines split on `\n`) with one style for the whole run.
    pub(crate) fn layout(
        &mut self,
        text: &str,
        face: &FontFace,
        size_px: f32,
        weight: FontWeight,
        align: TextAlign,
        brush: TextBrushRgba8,
    ) -> CanvasResult<parley::Layout<TextBrushRgba8>> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(CanvasError::export("text size must be finite and > 0"));
        }
        let family_name = self.family_for(face)?;

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(family_name)),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::FontWeight(
            parley::style::FontWeight::new(f32::from(weight.0)),
        ));
        builder.push_default(parley::style::StyleProperty::Brush(brush));

        let mut layout: parley::Layout<TextBrushRgba8> = builder.build(text);
        layout.break_all_lines(None);
        layout.align(
            None,
            match align {
                TextAlign::Left => parley::Alignment::Left,
                TextAlign::Center => parley::Alignment::Center,
                TextAlign::Right => parley::Alignment::Right,
                TextAlign::Justify => parley::Alignment::Justify,
            },
            parley::AlignmentOptions::default(),
        );
        Ok(layout)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/fonts.rs"]
mod tests;
