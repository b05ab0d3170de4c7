use std::{io, sync::PoisonError};

use axum::{
    extract::{Path, State},
    response::Html,
};

use crate::{AppState, error::ApiError, layout};

pub async fn hello() -> &'static str {
    "Hello, World!"
}

/// A stored post, addressed by document id or slug.
pub async fn blog_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Html<String>, ApiError> {
    let record = {
        let docs = state.docs.lock().unwrap_or_else(PoisonError::into_inner);
        docs.load_by_key(&id)?
    };
    let Some(html) = record.html.as_deref() else {
        return Err(ApiError::not_found(format!("post '{id}' has not been rendered")));
    };
    let title = record.title.as_deref().unwrap_or(&record.document_id);
    Ok(Html(layout::post_page(
        &state.site_title,
        title,
        record.when_published.as_deref(),
        html,
    )))
}

/// A hand-written page from `<pages>/<name>.html`.
pub async fn static_page(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Html<String>, ApiError> {
    if !is_valid_segment(&name) || name.starts_with('.') {
        return Err(ApiError::bad_request(format!("invalid page name '{name}'")));
    }
    let path = state.pages_dir.join(format!("{name}.html"));
    match tokio::fs::read_to_string(&path).await {
        Ok(text) => Ok(Html(text)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            Err(ApiError::not_found(format!("page '{name}' not found")))
        }
        Err(err) => Err(ApiError::internal(format!("read {}: {err}", path.display()))),
    }
}

fn is_valid_segment(segment: &str) -> bool {
    !segment.is_empty() && segment.chars().all(is_url_safe_char)
}

fn is_url_safe_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '~' | '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segments() {
        assert!(is_valid_segment("about-us"));
        assert!(is_valid_segment("v1.2_x~"));
        assert!(!is_valid_segment(""));
        assert!(!is_valid_segment("a/b"));
        assert!(!is_valid_segment("a b"));
    }
}
