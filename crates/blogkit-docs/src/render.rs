//! Render a document into blog-post HTML.

use std::{collections::BTreeSet, fmt::Write as _};

use indexmap::IndexMap;
use serde::Serialize;

use crate::{
    classify::{self, DEFAULT_CODE_FONT, ParagraphKind},
    html::escape,
    model::{Document, ElementKind, Paragraph, StructuralElement, TextStyle},
    snippets::Snippet,
};

/// Weight the Docs editor reports for regular text.
const NORMAL_WEIGHT: u32 = 400;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderConfig {
    pub code_font: String,
    pub snippet_marker: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            code_font: DEFAULT_CODE_FONT.to_string(),
            snippet_marker: "# snippet ".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RenderedPost {
    pub title: String,
    pub html: String,
    pub series: Option<String>,
    pub snippets: Vec<Snippet>,
    pub fonts: BTreeSet<String>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RenderError {
    #[error("no chunk identifier found in snippet:\n{chunk}")]
    MissingSnippetId { chunk: String },
    #[error("snippet name '{name}' is not of the form <series>-<number>")]
    BadSnippetName { name: String },
    #[error("snippet {seq} appears in position {position}")]
    SnippetOutOfOrder { seq: u32, position: usize },
    #[error("multiple snippet series: {}", names.join(", "))]
    MultipleSeries { names: Vec<String> },
    #[error("footnote {number} refers to missing footnote '{id}'")]
    MissingFootnote { number: String, id: String },
}

/// Render `document` with the default configuration.
pub fn render_document(document: &Document) -> Result<RenderedPost, RenderError> {
    Renderer::new(&RenderConfig::default()).render(document)
}

pub struct Renderer<'a> {
    config: &'a RenderConfig,
    /// Footnote number to footnote id, in order of first reference.
    footnotes: IndexMap<String, String>,
    fonts: BTreeSet<String>,
    snippets: Vec<Snippet>,
    series: BTreeSet<String>,
}

impl<'a> Renderer<'a> {
    pub fn new(config: &'a RenderConfig) -> Self {
        Self {
            config,
            footnotes: IndexMap::new(),
            fonts: BTreeSet::new(),
            snippets: Vec::new(),
            series: BTreeSet::new(),
        }
    }

    pub fn render(mut self, document: &Document) -> Result<RenderedPost, RenderError> {
        let mut html = self.render_content(&document.body.content)?;

        if !self.footnotes.is_empty() {
            html.push_str("<h3>Footnotes</h3>\n<ol id=\"footnotes\">\n");
            // Footnote bodies may reference further footnotes.
            let mut idx = 0;
            while let Some((number, id)) = self.footnotes.get_index(idx) {
                let (number, id) = (number.clone(), id.clone());
                let Some(footnote) = document.footnotes.get(&id) else {
                    return Err(RenderError::MissingFootnote { number, id });
                };
                let body = self.render_content(&footnote.content)?;
                let _ = write!(html, "<li id=\"footnote-{number}\">\n{body}</li>\n");
                idx += 1;
            }
            html.push_str("</ol>\n");
        }

        if self.series.len() > 1 {
            return Err(RenderError::MultipleSeries {
                names: self.series.into_iter().collect(),
            });
        }
        tracing::debug!(
            title = %document.title,
            snippets = self.snippets.len(),
            footnotes = self.footnotes.len(),
            "document rendered"
        );
        Ok(RenderedPost {
            title: document.title.clone(),
            html,
            series: self.series.into_iter().next(),
            snippets: self.snippets,
            fonts: self.fonts,
        })
    }

    pub fn render_content(&mut self, content: &[StructuralElement]) -> Result<String, RenderError> {
        self.render_paragraphs(classify::paragraphs_from(content))
    }

    /// Render a paragraph stream. Runs of code paragraphs are gathered into a
    /// single chunk; blank paragraphs outside a chunk are dropped.
    pub fn render_paragraphs<'p>(
        &mut self,
        paragraphs: impl IntoIterator<Item = &'p Paragraph>,
    ) -> Result<String, RenderError> {
        let mut out = String::new();
        let mut chunk: Vec<&str> = Vec::new();
        for paragraph in paragraphs {
            match classify::paragraph_kind(paragraph, !chunk.is_empty(), &self.config.code_font) {
                ParagraphKind::Code(run) => chunk.push(&run.content),
                kind => {
                    if !chunk.is_empty() {
                        out.push_str(&self.render_chunk(&chunk)?);
                        chunk.clear();
                    }
                    if classify::is_blank(paragraph) {
                        continue;
                    }
                    out.push_str(&self.render_paragraph(kind, paragraph));
                }
            }
        }
        if !chunk.is_empty() {
            out.push_str(&self.render_chunk(&chunk)?);
        }
        Ok(out)
    }

    fn render_paragraph(&mut self, kind: ParagraphKind<'_>, paragraph: &Paragraph) -> String {
        let text = self.render_elements(paragraph);
        match kind {
            ParagraphKind::Title => format!("<h1 class=\"title\">{text}</h1>\n"),
            ParagraphKind::Subtitle => format!("<h2 class=\"subtitle\">{text}</h2>\n"),
            ParagraphKind::Heading(level) => {
                format!("<h{level} class=\"normal_text\">{text}</h{level}>\n")
            }
            ParagraphKind::NormalText => normal_text(&text),
            ParagraphKind::Other(style) => {
                tracing::warn!(style, "unknown paragraph style, rendering as normal text");
                normal_text(&text)
            }
            ParagraphKind::Code(_) => normal_text(&text),
        }
    }

    /// Text runs and footnote references of a paragraph, as inline HTML.
    fn render_elements(&mut self, paragraph: &Paragraph) -> String {
        let mut out = String::new();
        for element in &paragraph.elements {
            match &element.kind {
                ElementKind::TextRun(run) => {
                    let mut content = escape(&run.content).into_owned();
                    if let Some(url) = run.text_style.link.as_ref().and_then(|l| l.url.as_deref())
                    {
                        content = format!("<a href=\"{}\">{content}</a>", escape(url));
                    }
                    let style = self.span_style(&run.text_style);
                    if style.is_empty() {
                        out.push_str(&content);
                    } else {
                        let _ = write!(out, "<span style=\"{style}\">{content}</span>");
                    }
                }
                ElementKind::FootnoteReference(reference) => {
                    let number = &reference.footnote_number;
                    let _ = write!(out, "<a href=\"#footnote-{number}\">[{number}]</a>");
                    self.footnotes
                        .entry(number.clone())
                        .or_insert_with(|| reference.footnote_id.clone());
                }
                ElementKind::Other { kind, .. } => {
                    tracing::trace!(kind = %kind, "skipping paragraph element");
                }
            }
        }
        out
    }

    fn span_style(&mut self, style: &TextStyle) -> String {
        let mut parts: Vec<String> = Vec::new();
        let bold = style.bold.unwrap_or(false);
        if bold {
            parts.push("font-weight:bold".to_string());
        }
        if style.italic.unwrap_or(false) {
            parts.push("font-style:italic".to_string());
        }
        if let Some(size) = style.font_size.as_ref().and_then(|d| d.magnitude) {
            parts.push(format!("font-size:{size}pt"));
        }
        if let Some(wff) = &style.weighted_font_family {
            match wff.weight {
                Some(weight) if !bold && weight != NORMAL_WEIGHT => {
                    parts.push(format!("font-weight:{weight}"));
                }
                _ => {}
            }
        }
        if let Some(family) = style.font_family() {
            parts.push(format!("font-family:{}", escape(family)));
            self.fonts.insert(family.to_string());
        }
        parts.join("; ")
    }

    /// A chunk is a listing whose first line names the snippet it quotes.
    fn render_chunk(&mut self, chunk: &[&str]) -> Result<String, RenderError> {
        let joined = chunk.concat();
        let lines = split_lines(joined.trim());

        let marker = self.config.snippet_marker.as_str();
        let Some(name) = lines.first().and_then(|first| first.strip_prefix(marker)) else {
            return Err(RenderError::MissingSnippetId {
                chunk: lines.join("\n"),
            });
        };
        let name = name.trim();
        let (series, seq) = name
            .rsplit_once('-')
            .and_then(|(series, seq)| Some((series, seq.parse::<u32>().ok()?)))
            .filter(|(series, _)| !series.is_empty())
            .ok_or_else(|| RenderError::BadSnippetName {
                name: name.to_string(),
            })?;

        let position = self.snippets.len() + 1;
        if usize::try_from(seq).ok() != Some(position) {
            return Err(RenderError::SnippetOutOfOrder { seq, position });
        }
        self.series.insert(series.to_string());
        self.snippets.push(Snippet {
            name: name.to_string(),
            lines: lines[1..].iter().map(|line| line.to_string()).collect(),
        });

        let code: Vec<_> = lines.iter().map(|line| escape(line)).collect();
        Ok(format!("<pre>\n  <code>\n{}\n  </code>\n</pre>\n", code.join("\n")))
    }
}

/// Split on every line boundary a document can carry, including the
/// vertical tab Docs uses for a soft line break. `\r\n` counts once.
fn split_lines(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();
    while let Some((i, ch)) = chars.next() {
        if !is_line_break(ch) {
            continue;
        }
        lines.push(&text[start..i]);
        start = i + ch.len_utf8();
        if ch == '\r' {
            if let Some(&(j, '\n')) = chars.peek() {
                chars.next();
                start = j + 1;
            }
        }
    }
    if start < text.len() {
        lines.push(&text[start..]);
    }
    lines
}

fn is_line_break(ch: char) -> bool {
    matches!(
        ch,
        '\n' | '\r' | '\u{b}' | '\u{c}' | '\u{1c}'..='\u{1e}' | '\u{85}' | '\u{2028}' | '\u{2029}'
    )
}

fn normal_text(text: &str) -> String {
    format!("<p class=\"normal_text\">\n{text}\n</p>\n")
}
