//! Typed view of the parts of a Google Docs document the renderer uses.
//!
//! Structural and paragraph elements are tagged unions encoded as objects
//! with a `startIndex`, an `endIndex`, and exactly one further key naming the
//! element kind. Kinds without a handler are kept as [`StructuralKind::Other`]
//! or [`ElementKind::Other`] so that decoding never loses content.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(default)]
    pub document_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub revision_id: Option<String>,
    #[serde(default)]
    pub body: Body,
    #[serde(default)]
    pub footnotes: HashMap<String, Footnote>,
}

impl Document {
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Body {
    #[serde(default)]
    pub content: Vec<StructuralElement>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Footnote {
    #[serde(default)]
    pub footnote_id: String,
    #[serde(default)]
    pub content: Vec<StructuralElement>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "Map<String, Value>")]
pub struct StructuralElement {
    pub start_index: Option<i64>,
    pub end_index: Option<i64>,
    pub kind: StructuralKind,
}

#[derive(Debug, Clone)]
pub enum StructuralKind {
    Paragraph(Paragraph),
    Other { kind: String, value: Value },
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paragraph {
    #[serde(default)]
    pub elements: Vec<ParagraphElement>,
    #[serde(default)]
    pub paragraph_style: ParagraphStyle,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParagraphStyle {
    pub named_style_type: Option<String>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "Map<String, Value>")]
pub struct ParagraphElement {
    pub start_index: Option<i64>,
    pub end_index: Option<i64>,
    pub kind: ElementKind,
}

#[derive(Debug, Clone)]
pub enum ElementKind {
    TextRun(TextRun),
    FootnoteReference(FootnoteReference),
    Other { kind: String, value: Value },
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextRun {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub text_style: TextStyle,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextStyle {
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub underline: Option<bool>,
    pub font_size: Option<Dimension>,
    pub weighted_font_family: Option<WeightedFontFamily>,
    pub link: Option<Link>,
}

impl TextStyle {
    pub fn font_family(&self) -> Option<&str> {
        self.weighted_font_family
            .as_ref()
            .and_then(|wff| wff.font_family.as_deref())
            .filter(|family| !family.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Dimension {
    pub magnitude: Option<f64>,
    pub unit: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightedFontFamily {
    pub font_family: Option<String>,
    pub weight: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Link {
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FootnoteReference {
    #[serde(default)]
    pub footnote_id: String,
    #[serde(default)]
    pub footnote_number: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ShapeError {
    #[error("unexpected keys in element: {keys:?}")]
    AmbiguousKind { keys: Vec<String> },
    #[error("invalid '{kind}' element: {source}")]
    Invalid {
        kind: String,
        #[source]
        source: serde_json::Error,
    },
}

struct Tagged {
    start_index: Option<i64>,
    end_index: Option<i64>,
    kind: String,
    value: Value,
}

/// Split an element object into its index range and its single kind key.
fn element_type(mut map: Map<String, Value>) -> Result<Tagged, ShapeError> {
    let start_index = map.remove("startIndex").and_then(|v| v.as_i64());
    let end_index = map.remove("endIndex").and_then(|v| v.as_i64());
    if map.len() != 1 {
        let mut keys: Vec<String> = map.keys().cloned().collect();
        keys.sort();
        return Err(ShapeError::AmbiguousKind { keys });
    }
    let Some((kind, value)) = map.into_iter().next() else {
        return Err(ShapeError::AmbiguousKind { keys: Vec::new() });
    };
    Ok(Tagged {
        start_index,
        end_index,
        kind,
        value,
    })
}

fn decode<T: serde::de::DeserializeOwned>(kind: &str, value: Value) -> Result<T, ShapeError> {
    serde_json::from_value(value).map_err(|source| ShapeError::Invalid {
        kind: kind.to_string(),
        source,
    })
}

impl TryFrom<Map<String, Value>> for StructuralElement {
    type Error = ShapeError;

    fn try_from(map: Map<String, Value>) -> Result<Self, Self::Error> {
        let tagged = element_type(map)?;
        let kind = match tagged.kind.as_str() {
            "paragraph" => StructuralKind::Paragraph(decode(&tagged.kind, tagged.value)?),
            _ => StructuralKind::Other {
                kind: tagged.kind,
                value: tagged.value,
            },
        };
        Ok(Self {
            start_index: tagged.start_index,
            end_index: tagged.end_index,
            kind,
        })
    }
}

impl TryFrom<Map<String, Value>> for ParagraphElement {
    type Error = ShapeError;

    fn try_from(map: Map<String, Value>) -> Result<Self, Self::Error> {
        let tagged = element_type(map)?;
        let kind = match tagged.kind.as_str() {
            "textRun" => ElementKind::TextRun(decode(&tagged.kind, tagged.value)?),
            "footnoteReference" => {
                ElementKind::FootnoteReference(decode(&tagged.kind, tagged.value)?)
            }
            _ => ElementKind::Other {
                kind: tagged.kind,
                value: tagged.value,
            },
        };
        Ok(Self {
            start_index: tagged.start_index,
            end_index: tagged.end_index,
            kind,
        })
    }
}
