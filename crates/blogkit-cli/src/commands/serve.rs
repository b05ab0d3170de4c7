//! `blogkit serve`: run the blog web server until interrupted.

use std::{net::SocketAddr, path::PathBuf};

use anyhow::{Context, Result};
use blogkit_server::{DEFAULT_BIND, ServerConfig};
use clap::Args;
use tokio::sync::broadcast;

use crate::opts::GlobalOpts;

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Listen address (env: BLOGKIT_BIND)
    #[arg(long, env = "BLOGKIT_BIND", default_value = DEFAULT_BIND)]
    pub bind: SocketAddr,

    /// Directory of hand-written pages served under /page/<name>
    #[arg(long, env = "BLOGKIT_PAGES", default_value = "web")]
    pub pages: PathBuf,

    /// Directory served under /assets
    #[arg(long, env = "BLOGKIT_ASSETS", default_value = "web/assets")]
    pub assets: PathBuf,

    /// Site title used in page headers
    #[arg(long, default_value = "blogkit")]
    pub title: String,
}

pub async fn cmd_serve(opts: &GlobalOpts, args: &ServeArgs) -> Result<()> {
    let config = ServerConfig {
        bind: args.bind,
        docs_db: opts.docs_db.clone(),
        pages_dir: args.pages.clone(),
        assets_dir: args.assets.clone(),
        site_title: args.title.clone(),
    };
    let (shutdown_tx, _) = broadcast::channel(1);

    // Handle Ctrl-C and SIGTERM for graceful shutdown
    let signal_tx = shutdown_tx.clone();
    tokio::spawn(async move {
        #[cfg(unix)]
        let mut term =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()).ok();
        #[cfg(unix)]
        let terminated = async {
            match term.as_mut() {
                Some(t) => {
                    t.recv().await;
                }
                None => std::future::pending::<()>().await,
            }
        };
        #[cfg(not(unix))]
        let terminated = std::future::pending::<()>();
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Ctrl-C received, shutting down...");
            }
            _ = terminated => {
                tracing::info!("SIGTERM received, shutting down...");
            }
        }
        let _ = signal_tx.send(());
    });

    blogkit_server::serve(config, shutdown_tx)
        .await
        .context("blog server")
}
