//! Paragraph selection and classification.

use crate::model::{ElementKind, Paragraph, StructuralElement, StructuralKind, TextRun};

/// Font whose runs mark a paragraph as source code.
pub const DEFAULT_CODE_FONT: &str = "Consolas";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParagraphKind<'a> {
    /// A line of code; carries the paragraph's only text run.
    Code(&'a TextRun),
    NormalText,
    Title,
    Subtitle,
    Heading(u8),
    Other(&'a str),
}

/// The paragraphs among a sequence of structural elements.
pub fn paragraphs_from(content: &[StructuralElement]) -> impl Iterator<Item = &Paragraph> {
    content.iter().filter_map(|element| match &element.kind {
        StructuralKind::Paragraph(paragraph) => Some(paragraph),
        StructuralKind::Other { .. } => None,
    })
}

/// The paragraph's text run when it is the paragraph's only element.
pub fn single_text_run(paragraph: &Paragraph) -> Option<&TextRun> {
    match paragraph.elements.as_slice() {
        [only] => match &only.kind {
            ElementKind::TextRun(run) => Some(run),
            _ => None,
        },
        _ => None,
    }
}

/// A code paragraph is a single run set in the code font. Inside a chunk an
/// empty line also counts, so blank lines within a listing survive.
pub fn is_code(paragraph: &Paragraph, in_chunk: bool, code_font: &str) -> bool {
    single_text_run(paragraph).is_some_and(|run| {
        run.text_style.font_family() == Some(code_font) || (in_chunk && run.content == "\n")
    })
}

/// True for paragraphs that hold nothing but a newline.
pub fn is_blank(paragraph: &Paragraph) -> bool {
    single_text_run(paragraph).is_some_and(|run| run.content == "\n")
}

pub fn paragraph_kind<'a>(
    paragraph: &'a Paragraph,
    in_chunk: bool,
    code_font: &str,
) -> ParagraphKind<'a> {
    if let Some(run) = single_text_run(paragraph) {
        if is_code(paragraph, in_chunk, code_font) {
            return ParagraphKind::Code(run);
        }
    }
    named_style(
        paragraph
            .paragraph_style
            .named_style_type
            .as_deref()
            .unwrap_or("NORMAL_TEXT"),
    )
}

fn named_style(name: &str) -> ParagraphKind<'_> {
    match name {
        "NORMAL_TEXT" => ParagraphKind::NormalText,
        "TITLE" => ParagraphKind::Title,
        "SUBTITLE" => ParagraphKind::Subtitle,
        other => other
            .strip_prefix("HEADING_")
            .and_then(|level| level.parse::<u8>().ok())
            .filter(|level| (1..=6).contains(level))
            .map_or(ParagraphKind::Other(other), ParagraphKind::Heading),
    }
}
