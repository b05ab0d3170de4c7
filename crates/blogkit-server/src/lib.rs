//! HTTP front end for published blog posts.

pub mod api;
pub mod error;
pub mod layout;
pub mod pages;

use std::{
    net::SocketAddr,
    path::PathBuf,
    sync::{Arc, Mutex},
};

use axum::{Router, routing::get};
use blogkit_docs::DocStore;
use tokio::{sync::broadcast, task::JoinHandle};
use tower_http::services::ServeDir;

pub use error::ApiError;

pub const DEFAULT_BIND: &str = "127.0.0.1:5000";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub docs_db: PathBuf,
    pub pages_dir: PathBuf,
    pub assets_dir: PathBuf,
    pub site_title: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 5000)),
            docs_db: PathBuf::from("docs.db"),
            pages_dir: PathBuf::from("web"),
            assets_dir: PathBuf::from("web/assets"),
            site_title: "blogkit".to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    #[error("serve {addr}: {source}")]
    Serve {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Docs(#[from] blogkit_docs::DocError),
}

#[derive(Clone)]
pub struct AppState {
    pub docs: Arc<Mutex<DocStore>>,
    pub pages_dir: Arc<PathBuf>,
    pub site_title: Arc<str>,
}

impl AppState {
    pub fn new(docs: DocStore, config: &ServerConfig) -> Self {
        Self {
            docs: Arc::new(Mutex::new(docs)),
            pages_dir: Arc::new(config.pages_dir.clone()),
            site_title: Arc::from(config.site_title.as_str()),
        }
    }
}

pub fn router(state: AppState, assets_dir: impl Into<PathBuf>) -> Router {
    Router::new()
        .route("/", get(pages::hello))
        .route("/blog/{id}", get(pages::blog_post))
        .route("/page/{name}", get(pages::static_page))
        .nest("/api", api::router())
        .nest_service("/assets", ServeDir::new(assets_dir.into()))
        .with_state(state)
}

/// Open the document store and serve until `shutdown_tx` fires.
pub async fn serve(
    config: ServerConfig,
    shutdown_tx: broadcast::Sender<()>,
) -> Result<(), ServerError> {
    let mut shutdown_rx = shutdown_tx.subscribe();
    let docs = DocStore::open(&config.docs_db)?;
    let app = router(AppState::new(docs, &config), config.assets_dir.clone());
    let addr = config.bind;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;
    tracing::info!("blog server listening on http://{}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.recv().await;
        })
        .await
        .map_err(|source| ServerError::Serve { addr, source })?;
    tracing::info!("blog server stopped");
    Ok(())
}

pub fn spawn_server(config: ServerConfig, shutdown_tx: broadcast::Sender<()>) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(err) = serve(config, shutdown_tx).await {
            tracing::error!("http server error: {err}");
        }
    })
}
