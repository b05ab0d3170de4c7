use std::sync::PoisonError;

use axum::{Json, Router, extract::State, response::IntoResponse, routing::get};

use crate::{AppState, error::ApiError};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/posts", get(posts))
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "ok": true,
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn posts(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let docs = state.docs.lock().unwrap_or_else(PoisonError::into_inner);
    let posts = docs.list()?;
    Ok(Json(posts))
}
