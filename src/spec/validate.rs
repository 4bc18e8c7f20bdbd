use crate::assets::color::Color;
use crate::foundation::core::Canvas;
use crate::foundation::error::CanvasResult;
use crate::spec::model::{
    CirclePrimitive, FontWeight, ImagePrimitive, OriginX, OriginY, Primitive, RectPrimitive,
    Specification, TextAlign, TextPrimitive,
};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// One step in a field path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathElem {
    /// Object member.
    Field(String),
    /// Array element.
    Index(usize),
}

/// Location of a value inside the input document, rendered as `$.objects[2].width`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FieldPath(Vec<PathElem>);

impl FieldPath {
    /// The document root (`$`).
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Extend the path with an object member.
    pub fn field(&self, name: &str) -> Self {
        let mut out = self.0.clone();
        out.push(PathElem::Field(name.to_owned()));
        Self(out)
    }

    /// Extend the path with an array index.
    pub fn index(&self, i: usize) -> Self {
        let mut out = self.0.clone();
        out.push(PathElem::Index(i));
        Self(out)
    }

    /// Path steps from the root.
    pub fn elems(&self) -> &[PathElem] {
        &self.0
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("$")?;
        for p in &self.0 {
            match p {
                PathElem::Field(name) => write!(f, ".{name}")?,
                PathElem::Index(i) => write!(f, "[{i}]")?,
            }
        }
        Ok(())
    }
}

/// A single violated field: where, what was expected and what was found.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldError {
    /// Location of the offending value.
    pub path: FieldPath,
    /// Expected type or constraint, e.g. `"number >= 0"`.
    pub expected: String,
    /// Short description of the value found, `None` when the field is missing.
    pub found: Option<String>,
}

impl FieldError {
    /// Error for a missing required field.
    pub fn new(path: FieldPath, expected: impl Into<String>) -> Self {
        Self {
            path,
            expected: expected.into(),
            found: None,
        }
    }

    fn found(path: FieldPath, expected: impl Into<String>, value: &Value) -> Self {
        Self {
            path,
            expected: expected.into(),
            found: Some(describe(value)),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.found {
            Some(found) => write!(f, "{}: expected {}, found {found}", self.path, self.expected),
            None => write!(f, "{}: expected {}, found nothing", self.path, self.expected),
        }
    }
}

/// Every violation found in a document, in document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationErrors {
    /// Individual violations.
    pub errors: Vec<FieldError>,
}

impl ValidationErrors {
    /// Number of violations.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Return `true` when no violation was recorded.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Iterate over violations.
    pub fn iter(&self) -> std::slice::Iter<'_, FieldError> {
        self.errors.iter()
    }

    /// Return `true` when some violation sits exactly at `path` (e.g. `"$.objects[0].left"`).
    pub fn has_path(&self, path: &str) -> bool {
        self.errors.iter().any(|e| e.path.to_string() == path)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, e) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{e}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

impl Specification {
    /// Validate an arbitrary JSON value and build a [`Specification`] from it.
    ///
    /// All violations are collected before returning; the error lists every offending path.
    /// Primitives with an unrecognized `type` are kept as [`Primitive::Unsupported`] so the
    /// rest of the document can still render.
    pub fn from_value(value: &Value) -> CanvasResult<Self> {
        let mut v = Validator::default();
        let spec = v.specification(value);
        match spec {
            Some(spec) if v.errors.is_empty() => Ok(spec),
            _ => Err(ValidationErrors { errors: v.errors }.into()),
        }
    }
}

#[derive(Clone, Copy)]
enum NumberRule {
    Any,
    NonNegative,
    Positive,
    Unit,
}

impl NumberRule {
    fn expected(self) -> &'static str {
        match self {
            Self::Any => "number",
            Self::NonNegative => "number >= 0",
            Self::Positive => "number > 0",
            Self::Unit => "number in [0, 1]",
        }
    }

    fn accepts(self, n: f64) -> bool {
        n.is_finite()
            && match self {
                Self::Any => true,
                Self::NonNegative => n >= 0.0,
                Self::Positive => n > 0.0,
                Self::Unit => (0.0..=1.0).contains(&n),
            }
    }
}

#[derive(Default)]
struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    fn specification(&mut self, value: &Value) -> Option<Specification> {
        let root = FieldPath::root();
        let Some(obj) = value.as_object() else {
            self.errors.push(FieldError::found(root, "object", value));
            return None;
        };

        let width = self.dimension(obj, &root, "width");
        let height = self.dimension(obj, &root, "height");
        let background = self.optional_color(obj, &root, "background");

        let objects_path = root.field("objects");
        let objects = match present(obj, "objects") {
            None => {
                self.errors.push(FieldError::new(objects_path, "array"));
                None
            }
            Some(Value::Array(items)) => Some(
                items
                    .iter()
                    .enumerate()
                    .filter_map(|(i, item)| self.primitive(item, &objects_path.index(i)))
                    .collect::<Vec<_>>(),
            ),
            Some(other) => {
                self.errors
                    .push(FieldError::found(objects_path, "array", other));
                None
            }
        };

        Some(Specification {
            canvas: Canvas {
                width: width?,
                height: height?,
            },
            background,
            objects: objects?,
        })
    }

    fn primitive(&mut self, value: &Value, path: &FieldPath) -> Option<Primitive> {
        let Some(obj) = value.as_object() else {
            self.errors
                .push(FieldError::found(path.clone(), "object", value));
            return None;
        };
        let kind = self.required_string(obj, path, "type")?;
        match kind.as_str() {
            "text" => self.text(obj, path).map(Primitive::Text),
            "rect" => self.rect(obj, path).map(Primitive::Rect),
            "circle" => self.circle(obj, path).map(Primitive::Circle),
            "image" => self.image(obj, path).map(Primitive::Image),
            _ => Some(Primitive::Unsupported { kind }),
        }
    }

    fn text(&mut self, obj: &Map<String, Value>, path: &FieldPath) -> Option<TextPrimitive> {
        let text = self.required_string(obj, path, "text");
        let left = self.required_number(obj, path, "left", NumberRule::Any);
        let top = self.required_number(obj, path, "top", NumberRule::Any);
        let font_size = self.optional_number(obj, path, "fontSize", NumberRule::Positive);
        let font_family = self.optional_nonempty_string(obj, path, "fontFamily");
        let font_weight = self.optional_font_weight(obj, path);
        let fill = self.optional_color(obj, path, "fill");
        let text_align =
            self.optional_keyword::<TextAlign>(obj, path, "textAlign", "left|center|right|justify");
        let origin_x = self.optional_keyword::<OriginX>(obj, path, "originX", "left|center|right");
        let origin_y =
            self.optional_keyword::<OriginY>(obj, path, "originY", "top|center|bottom|baseline");
        let opacity = self.optional_number(obj, path, "opacity", NumberRule::Unit);

        Some(TextPrimitive {
            text: text?,
            left: left?,
            top: top?,
            font_size,
            font_family,
            font_weight,
            fill,
            text_align,
            origin_x,
            origin_y,
            opacity,
        })
    }

    fn rect(&mut self, obj: &Map<String, Value>, path: &FieldPath) -> Option<RectPrimitive> {
        let left = self.required_number(obj, path, "left", NumberRule::Any);
        let top = self.required_number(obj, path, "top", NumberRule::Any);
        let width = self.required_number(obj, path, "width", NumberRule::NonNegative);
        let height = self.required_number(obj, path, "height", NumberRule::NonNegative);
        let fill = self.optional_color(obj, path, "fill");
        let stroke = self.optional_color(obj, path, "stroke");
        let stroke_width = self.optional_number(obj, path, "strokeWidth", NumberRule::NonNegative);
        let rx = self.optional_number(obj, path, "rx", NumberRule::NonNegative);
        let ry = self.optional_number(obj, path, "ry", NumberRule::NonNegative);
        let opacity = self.optional_number(obj, path, "opacity", NumberRule::Unit);

        Some(RectPrimitive {
            left: left?,
            top: top?,
            width: width?,
            height: height?,
            fill,
            stroke,
            stroke_width,
            rx,
            ry,
            opacity,
        })
    }

    fn circle(&mut self, obj: &Map<String, Value>, path: &FieldPath) -> Option<CirclePrimitive> {
        let left = self.required_number(obj, path, "left", NumberRule::Any);
        let top = self.required_number(obj, path, "top", NumberRule::Any);
        let radius = self.required_number(obj, path, "radius", NumberRule::NonNegative);
        let fill = self.optional_color(obj, path, "fill");
        let stroke = self.optional_color(obj, path, "stroke");
        let stroke_width = self.optional_number(obj, path, "strokeWidth", NumberRule::NonNegative);
        let opacity = self.optional_number(obj, path, "opacity", NumberRule::Unit);

        Some(CirclePrimitive {
            left: left?,
            top: top?,
            radius: radius?,
            fill,
            stroke,
            stroke_width,
            opacity,
        })
    }

    fn image(&mut self, obj: &Map<String, Value>, path: &FieldPath) -> Option<ImagePrimitive> {
        let left = self.required_number(obj, path, "left", NumberRule::Any);
        let top = self.required_number(obj, path, "top", NumberRule::Any);
        let width = self.required_number(obj, path, "width", NumberRule::NonNegative);
        let height = self.required_number(obj, path, "height", NumberRule::NonNegative);
        let src = self.required_nonempty_string(obj, path, "src");
        let opacity = self.optional_number(obj, path, "opacity", NumberRule::Unit);

        Some(ImagePrimitive {
            left: left?,
            top: top?,
            width: width?,
            height: height?,
            src: src?,
            opacity,
        })
    }

    fn dimension(&mut self, obj: &Map<String, Value>, path: &FieldPath, name: &str) -> Option<u32> {
        const EXPECTED: &str = "positive integer";
        let path = path.field(name);
        let Some(value) = present(obj, name) else {
            self.errors.push(FieldError::new(path, EXPECTED));
            return None;
        };
        let n = value.as_f64().filter(|n| {
            n.is_finite() && n.fract() == 0.0 && *n >= 1.0 && *n <= f64::from(u32::MAX)
        });
        match n {
            Some(n) => Some(n as u32),
            None => {
                self.errors.push(FieldError::found(path, EXPECTED, value));
                None
            }
        }
    }

    fn required_number(
        &mut self,
        obj: &Map<String, Value>,
        path: &FieldPath,
        name: &str,
        rule: NumberRule,
    ) -> Option<f64> {
        if present(obj, name).is_none() {
            self.errors
                .push(FieldError::new(path.field(name), rule.expected()));
            return None;
        }
        self.optional_number(obj, path, name, rule)
    }

    fn optional_number(
        &mut self,
        obj: &Map<String, Value>,
        path: &FieldPath,
        name: &str,
        rule: NumberRule,
    ) -> Option<f64> {
        let value = present(obj, name)?;
        match value.as_f64() {
            Some(n) if rule.accepts(n) => Some(n),
            _ => {
                self.errors
                    .push(FieldError::found(path.field(name), rule.expected(), value));
                None
            }
        }
    }

    fn required_string(
        &mut self,
        obj: &Map<String, Value>,
        path: &FieldPath,
        name: &str,
    ) -> Option<String> {
        match present(obj, name) {
            None => {
                self.errors.push(FieldError::new(path.field(name), "string"));
                None
            }
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => {
                self.errors
                    .push(FieldError::found(path.field(name), "string", other));
                None
            }
        }
    }

    fn required_nonempty_string(
        &mut self,
        obj: &Map<String, Value>,
        path: &FieldPath,
        name: &str,
    ) -> Option<String> {
        if present(obj, name).is_none() {
            self.errors
                .push(FieldError::new(path.field(name), "non-empty string"));
            return None;
        }
        self.optional_nonempty_string(obj, path, name)
    }

    fn optional_nonempty_string(
        &mut self,
        obj: &Map<String, Value>,
        path: &FieldPath,
        name: &str,
    ) -> Option<String> {
        let value = present(obj, name)?;
        match value.as_str().map(str::trim) {
            Some(s) if !s.is_empty() => Some(s.to_owned()),
            _ => {
                self.errors
                    .push(FieldError::found(path.field(name), "non-empty string", value));
                None
            }
        }
    }

    fn optional_color(
        &mut self,
        obj: &Map<String, Value>,
        path: &FieldPath,
        name: &str,
    ) -> Option<Color> {
        const EXPECTED: &str = "CSS color string";
        let value = present(obj, name)?;
        match value.as_str().map(Color::parse) {
            Some(Ok(c)) => Some(c),
            _ => {
                self.errors
                    .push(FieldError::found(path.field(name), EXPECTED, value));
                None
            }
        }
    }

    fn optional_keyword<T: FromStr>(
        &mut self,
        obj: &Map<String, Value>,
        path: &FieldPath,
        name: &str,
        expected: &str,
    ) -> Option<T> {
        let value = present(obj, name)?;
        match value.as_str().map(str::parse::<T>) {
            Some(Ok(k)) => Some(k),
            _ => {
                self.errors
                    .push(FieldError::found(path.field(name), expected, value));
                None
            }
        }
    }

    fn optional_font_weight(
        &mut self,
        obj: &Map<String, Value>,
        path: &FieldPath,
    ) -> Option<FontWeight> {
        const EXPECTED: &str = "normal|bold|bolder|lighter or weight in 1..=1000";
        let value = present(obj, "fontWeight")?;
        let weight = match value {
            Value::String(s) => FontWeight::parse(s),
            Value::Number(n) => n.as_f64().and_then(FontWeight::from_number),
            _ => None,
        };
        if weight.is_none() {
            self.errors
                .push(FieldError::found(path.field("fontWeight"), EXPECTED, value));
        }
        weight
    }
}

/// Look up a member, treating explicit `null` as absent.
fn present<'a>(obj: &'a Map<String, Value>, name: &str) -> Option<&'a Value> {
    obj.get(name).filter(|v| !v.is_null())
}

fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_owned(),
        Value::Bool(b) => format!("boolean {b}"),
        Value::Number(n) => format!("number {n}"),
        Value::String(s) if s.chars().count() > 32 => {
            let head: String = s.chars().take(32).collect();
            format!("string \"{head}...\"")
        }
        Value::String(s) => format!("string \"{s}\""),
        Value::Array(a) => format!("array of {}", a.len()),
        Value::Object(_) => "object".to_owned(),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/spec/validate.rs"]
mod tests;
