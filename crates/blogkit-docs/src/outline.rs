//! Style-aware outline of a raw document.
//!
//! Walks the document JSON by part name, keeping paragraph and text styles on
//! [`StyleStack`]s, and records every text run with the styles in force.
//! Parts without a handler are skipped and logged at debug level with their
//! dotted ancestry.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::styles::{StyleKind, StyleStack};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StyledRun {
    pub text: String,
    pub text_style: Map<String, Value>,
    pub paragraph_style: Map<String, Value>,
}

/// Consecutive runs sharing a text style.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StyleGroup {
    pub text_style: Map<String, Value>,
    pub text: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Outline {
    pub title: Option<String>,
    pub document_id: Option<String>,
    pub runs: Vec<StyledRun>,
}

impl Outline {
    pub fn parse(document: &Value) -> Self {
        let mut walker = Walker::default();
        walker.part(document, "document", &mut Vec::new());
        walker.outline
    }

    pub fn style_groups(&self) -> Vec<StyleGroup> {
        let mut groups: Vec<StyleGroup> = Vec::new();
        for run in &self.runs {
            match groups.last_mut() {
                Some(group) if group.text_style == run.text_style => group.text.push_str(&run.text),
                _ => groups.push(StyleGroup {
                    text_style: run.text_style.clone(),
                    text: run.text.clone(),
                }),
            }
        }
        groups
    }
}

const DOCUMENT_PARTS: &[&str] = &[
    "title",
    "body",
    "footnotes",
    "documentStyle",
    "namedStyles",
    "revisionId",
    "suggestionsViewMode",
    "documentId",
];
const STRUCTURAL_PARTS: &[&str] = &["sectionBreak", "tableOfContents", "table", "paragraph"];
const PARAGRAPH_PARTS: &[&str] = &["paragraphStyle", "bullet", "elements"];
const ELEMENT_PARTS: &[&str] = &[
    "textRun",
    "autoText",
    "pageBreak",
    "columnBreak",
    "footnoteReference",
    "horizontalRule",
    "equation",
    "inlineObjectElement",
];

struct Walker {
    outline: Outline,
    paragraph_styles: StyleStack,
    text_styles: StyleStack,
}

impl Default for Walker {
    fn default() -> Self {
        Self {
            outline: Outline::default(),
            paragraph_styles: StyleStack::new(StyleKind::Paragraph),
            text_styles: StyleStack::new(StyleKind::Text),
        }
    }
}

impl Walker {
    fn parts(&mut self, value: &Value, names: &[&str], ancestors: &mut Vec<String>) {
        for name in names {
            if let Some(item) = value.get(*name) {
                self.part(item, name, ancestors);
            }
        }
    }

    fn part(&mut self, value: &Value, name: &str, ancestors: &mut Vec<String>) {
        match name {
            "document" => self.nested(value, name, DOCUMENT_PARTS, ancestors),
            "title" => self.outline.title = value.as_str().map(str::to_string),
            "documentId" => self.outline.document_id = value.as_str().map(str::to_string),
            "body" => self.nested(value, name, &["content"], ancestors),
            "content" => self.each(value, "structuralElement", ancestors),
            "structuralElement" => self.nested(value, name, STRUCTURAL_PARTS, ancestors),
            "footnotes" => {
                if let Some(footnotes) = value.as_object() {
                    ancestors.push(name.to_string());
                    for footnote in footnotes.values() {
                        self.nested(footnote, "footnote", &["content"], ancestors);
                    }
                    ancestors.pop();
                }
            }
            "paragraph" => {
                let style = value.get("paragraphStyle").and_then(Value::as_object);
                self.paragraph_styles.push(style.cloned().unwrap_or_default());
                self.nested(value, name, PARAGRAPH_PARTS, ancestors);
                self.paragraph_styles.pop();
            }
            "paragraphStyle" => {}
            "elements" => self.each(value, "paragraphElement", ancestors),
            "paragraphElement" => self.nested(value, name, ELEMENT_PARTS, ancestors),
            "textRun" => self.text_run(value),
            "sectionBreak" => tracing::trace!("section break"),
            _ => {
                let mut path = ancestors.join(".");
                path.push('.');
                path.push_str(name);
                tracing::debug!(path = %path, "unrecognised document part");
            }
        }
    }

    fn nested(&mut self, value: &Value, name: &str, parts: &[&str], ancestors: &mut Vec<String>) {
        ancestors.push(name.to_string());
        self.parts(value, parts, ancestors);
        ancestors.pop();
    }

    fn each(&mut self, value: &Value, item_name: &str, ancestors: &mut Vec<String>) {
        let Some(items) = value.as_array() else {
            return;
        };
        for item in items {
            self.part(item, item_name, ancestors);
        }
    }

    fn text_run(&mut self, value: &Value) {
        let style = value.get("textStyle").and_then(Value::as_object);
        self.text_styles.push(style.cloned().unwrap_or_default());
        self.outline.runs.push(StyledRun {
            text: value
                .get("content")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            text_style: self.text_styles.effective(),
            paragraph_style: self.paragraph_styles.effective(),
        });
        self.text_styles.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "documentId": "doc-1",
            "title": "Separation of concerns",
            "revisionId": "r1",
            "body": {"content": [
                {"endIndex": 1, "sectionBreak": {}},
                {"startIndex": 1, "endIndex": 20, "paragraph": {
                    "paragraphStyle": {"namedStyleType": "HEADING_1", "direction": "LEFT_TO_RIGHT"},
                    "elements": [
                        {"startIndex": 1, "endIndex": 10, "textRun": {"content": "Plain ", "textStyle": {}}},
                        {"startIndex": 10, "endIndex": 15, "textRun": {"content": "bold", "textStyle": {"bold": true}}},
                        {"startIndex": 15, "endIndex": 20, "textRun": {"content": " more", "textStyle": {"bold": true}}},
                        {"startIndex": 20, "endIndex": 21, "horizontalRule": {}}
                    ]
                }},
                {"startIndex": 21, "endIndex": 30, "table": {"rows": 1}}
            ]},
            "footnotes": {
                "kix.1": {"footnoteId": "kix.1", "content": [
                    {"paragraph": {"elements": [{"textRun": {"content": "note\n"}}]}}
                ]}
            }
        })
    }

    #[test]
    fn collects_title_id_and_runs() {
        let outline = Outline::parse(&sample());
        assert_eq!(outline.title.as_deref(), Some("Separation of concerns"));
        assert_eq!(outline.document_id.as_deref(), Some("doc-1"));
        let texts: Vec<_> = outline.runs.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, ["Plain ", "bold", " more", "note\n"]);
    }

    #[test]
    fn runs_carry_effective_styles() {
        let outline = Outline::parse(&sample());
        let heading = &outline.runs[1];
        assert_eq!(heading.paragraph_style["namedStyleType"], json!("HEADING_1"));
        assert_eq!(heading.text_style.get("bold"), Some(&json!(true)));
        assert!(outline.runs[0].text_style.is_empty());
        assert!(outline.runs[3].paragraph_style.is_empty());
    }

    #[test]
    fn groups_consecutive_runs_by_text_style() {
        let groups = Outline::parse(&sample()).style_groups();
        let texts: Vec<_> = groups.iter().map(|g| g.text.as_str()).collect();
        assert_eq!(texts, ["Plain ", "bold more", "note\n"]);
    }
}
