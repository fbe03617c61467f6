//! Drawable board shapes (arrows and circles).
//!
//! Shapes travel as a string holding a JSON array of
//! `{orig, dest?, brush}` objects. An empty list is the empty string, never `"[]"`.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::notation::is_square;

/// Brush colors understood by the board widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Brush {
    Green,
    Red,
    Blue,
    Yellow,
    PaleBlue,
    PaleGreen,
    PaleRed,
    PaleGrey,
}

/// A circle on `orig`, or an arrow from `orig` to `dest`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Shape {
    pub orig: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dest: Option<String>,
    pub brush: Brush,
}

impl Shape {
    pub fn circle(orig: impl Into<String>, brush: Brush) -> Self {
        Self {
            orig: orig.into(),
            dest: None,
            brush,
        }
    }

    pub fn arrow(orig: impl Into<String>, dest: impl Into<String>, brush: Brush) -> Self {
        Self {
            orig: orig.into(),
            dest: Some(dest.into()),
            brush,
        }
    }

    fn validate(&self) -> Result<()> {
        if !is_square(&self.orig) {
            return Err(CoreError::InvalidShapes(format!("bad origin square {:?}", self.orig)));
        }
        if let Some(dest) = &self.dest {
            if !is_square(dest) {
                return Err(CoreError::InvalidShapes(format!("bad destination square {dest:?}")));
            }
        }
        Ok(())
    }
}

/// Serialize shapes to their wire string.
pub fn serialize_shapes(shapes: &[Shape]) -> String {
    if shapes.is_empty() {
        return String::new();
    }
    // Shape holds only strings and a unit enum, so encoding cannot fail.
    serde_json::to_string(shapes).unwrap_or_default()
}

/// Parse a wire string into shapes. `None`, `""` and `"[]"` all yield no shapes.
pub fn parse_shapes(raw: Option<&str>) -> Result<Vec<Shape>> {
    let raw = match raw.map(str::trim) {
        None | Some("") => return Ok(Vec::new()),
        Some(raw) => raw,
    };

    let shapes: Vec<Shape> =
        serde_json::from_str(raw).map_err(|e| CoreError::InvalidShapes(e.to_string()))?;
    for shape in &shapes {
        shape.validate()?;
    }
    Ok(shapes)
}

/// Serde adapter storing `Vec<Shape>` as its wire string.
pub mod as_string {
    use super::{parse_shapes, serialize_shapes, Shape};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(shapes: &[Shape], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&serialize_shapes(shapes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Shape>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        parse_shapes(raw.as_deref()).map_err(serde::de::Error::custom)
    }
}
