//! Layered paragraph and text styles.
//!
//! Every style change met while walking a document pushes a layer; lookups
//! search from the top layer down, so inner styles override outer ones. The
//! base layer holds every permissible key as `null` and is never popped.

use serde_json::{Map, Value};

const PARAGRAPH_KEYS: &[&str] = &[
    "headingId",
    "namedStyleType",
    "alignment",
    "lineSpacing",
    "direction",
    "spacingMode",
    "spaceAbove",
    "spaceBelow",
    "borderBetween",
    "borderTop",
    "borderBottom",
    "borderLeft",
    "borderRight",
    "indentFirstLine",
    "indentStart",
    "indentEnd",
    "tabStops",
    "keepLinesTogether",
    "keepWithNext",
    "avoidWidowAndOrphan",
    "shading",
];

const TEXT_KEYS: &[&str] = &[
    "bold",
    "italic",
    "underline",
    "strikethrough",
    "smallCaps",
    "backgroundColor",
    "foregroundColor",
    "fontSize",
    "weightedFontFamily",
    "baselineOffset",
    "link",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleKind {
    Paragraph,
    Text,
}

impl StyleKind {
    pub fn keys(self) -> &'static [&'static str] {
        match self {
            StyleKind::Paragraph => PARAGRAPH_KEYS,
            StyleKind::Text => TEXT_KEYS,
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StyleError {
    #[error("key '{0}' not found")]
    UnknownKey(String),
    #[error("Impermissible key '{key}' for {kind:?} style")]
    Impermissible { kind: StyleKind, key: String },
}

#[derive(Debug, Clone)]
pub struct StyleStack {
    kind: StyleKind,
    layers: Vec<Map<String, Value>>,
}

impl StyleStack {
    pub fn new(kind: StyleKind) -> Self {
        let base = kind
            .keys()
            .iter()
            .map(|key| (key.to_string(), Value::Null))
            .collect();
        Self {
            kind,
            layers: vec![base],
        }
    }

    pub fn kind(&self) -> StyleKind {
        self.kind
    }

    pub fn depth(&self) -> usize {
        self.layers.len()
    }

    pub fn push(&mut self, layer: Map<String, Value>) {
        self.layers.push(layer);
    }

    /// Remove the top layer. The base layer stays, so this returns `None`
    /// once only it is left.
    pub fn pop(&mut self) -> Option<Map<String, Value>> {
        if self.layers.len() > 1 {
            self.layers.pop()
        } else {
            None
        }
    }

    pub fn get(&self, key: &str) -> Result<&Value, StyleError> {
        self.layers
            .iter()
            .rev()
            .find_map(|layer| layer.get(key))
            .ok_or_else(|| StyleError::UnknownKey(key.to_string()))
    }

    pub fn set(&mut self, key: &str, value: Value) -> Result<(), StyleError> {
        if !self.kind.keys().contains(&key) {
            return Err(StyleError::Impermissible {
                kind: self.kind,
                key: key.to_string(),
            });
        }
        if let Some(top) = self.layers.last_mut() {
            top.insert(key.to_string(), value);
        }
        Ok(())
    }

    /// Merge all layers into one map; upper layers win.
    pub fn flatten(&self) -> Map<String, Value> {
        let mut merged = Map::new();
        for layer in self.layers.iter().rev() {
            for (key, value) in layer {
                if !merged.contains_key(key) {
                    merged.insert(key.clone(), value.clone());
                }
            }
        }
        merged
    }

    /// Like [`StyleStack::flatten`], leaving out keys that resolve to `null`.
    pub fn effective(&self) -> Map<String, Value> {
        let mut merged = self.flatten();
        merged.retain(|_, value| !value.is_null());
        merged
    }
}
