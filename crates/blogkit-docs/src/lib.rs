//! Google Docs to blog-post tooling: document model, HTML rendering, snippet
//! handling and the local document store.

pub mod cache;
pub mod classify;
pub mod fetch;
pub mod html;
pub mod model;
pub mod outline;
pub mod render;
pub mod snippets;
pub mod store;
pub mod styles;

pub use cache::JsonCache;
pub use classify::{ParagraphKind, is_code, paragraph_kind, paragraphs_from};
pub use fetch::{DocsClient, DocsConfig, FetchError};
pub use model::{Document, ShapeError};
pub use outline::{Outline, StyleGroup, StyledRun};
pub use render::{RenderConfig, RenderError, RenderedPost, Renderer, render_document};
pub use snippets::{
    Snippet, SnippetError, SnippetMarkers, extract, extract_to_dir, reconcile, snippet_ranges,
    write_snippets,
};
pub use store::{DocError, DocRecord, DocStore, DocSummary, slugify};
pub use styles::{StyleError, StyleKind, StyleStack};
