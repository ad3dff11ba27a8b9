//! Style and layout markers attached to display string offsets

use serde::{Serialize, Serializer};
use std::rc::Rc;

use crate::font::FontHandle;
use crate::types::{Rgba, Vector};

/// Style channels tracked by markup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StyleKind {
    Font,
    Color,
    Scale,
}

impl StyleKind {
    pub const ALL: [StyleKind; 3] = [StyleKind::Font, StyleKind::Color, StyleKind::Scale];

    pub(crate) fn index(self) -> usize {
        match self {
            StyleKind::Font => 0,
            StyleKind::Color => 1,
            StyleKind::Scale => 2,
        }
    }
}

fn serialize_font<S: Serializer>(font: &FontHandle, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(font.name())
}

/// What happens at a marker's offset
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum MarkerData {
    Font(#[serde(serialize_with = "serialize_font")] FontHandle),
    Color(Rgba),
    Scale(Vector),
    /// Return the style kind to the text's own setting
    Default(StyleKind),
    /// Height of the line starting here
    LineHeight(f32),
}

impl MarkerData {
    /// Style channel affected, `None` for layout markers
    pub fn kind(&self) -> Option<StyleKind> {
        match self {
            MarkerData::Font(_) => Some(StyleKind::Font),
            MarkerData::Color(_) => Some(StyleKind::Color),
            MarkerData::Scale(_) => Some(StyleKind::Scale),
            MarkerData::Default(kind) => Some(*kind),
            MarkerData::LineHeight(_) => None,
        }
    }
}

impl PartialEq for MarkerData {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (MarkerData::Font(a), MarkerData::Font(b)) => Rc::ptr_eq(a, b),
            (MarkerData::Color(a), MarkerData::Color(b)) => a == b,
            (MarkerData::Scale(a), MarkerData::Scale(b)) => a == b,
            (MarkerData::Default(a), MarkerData::Default(b)) => a == b,
            (MarkerData::LineHeight(a), MarkerData::LineHeight(b)) => a.to_bits() == b.to_bits(),
            _ => false,
        }
    }
}

/// Event at a byte offset of the display string
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub offset: usize,
    #[serde(flatten)]
    pub data: MarkerData,
}

impl Marker {
    pub fn new(offset: usize, data: MarkerData) -> Self {
        Self { offset, data }
    }
}
