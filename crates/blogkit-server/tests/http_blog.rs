use std::{fs, net::SocketAddr, path::Path, time::Duration};

use blogkit_docs::DocStore;
use blogkit_server::{AppState, ServerConfig, router};
use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::sync::broadcast;

fn seed(dir: &Path) -> ServerConfig {
    let config = ServerConfig {
        bind: SocketAddr::from(([127, 0, 0, 1], 0)),
        docs_db: dir.join("docs.db"),
        pages_dir: dir.join("web"),
        assets_dir: dir.join("web/assets"),
        site_title: "Test Blog".into(),
    };
    fs::create_dir_all(&config.assets_dir).expect("assets dir");
    fs::write(config.pages_dir.join("about.html"), "<h1>About</h1>").expect("page");
    fs::write(config.assets_dir.join("blog.css"), "body { margin: 0 }").expect("css");

    let mut docs = DocStore::open(&config.docs_db).expect("docs db");
    docs.save("doc-1", &json!({"title": "First Post", "body": {}}))
        .expect("save");
    docs.set_html("doc-1", "<p class=\"normal_text\">\nHi\n</p>\n", "First Post")
        .expect("html");
    docs.publish("doc-1").expect("publish");
    docs.save("doc-2", &json!({"title": "Unrendered", "body": {}}))
        .expect("save");
    config
}

async fn start(config: &ServerConfig) -> (SocketAddr, tokio::task::JoinHandle<()>) {
    let docs = DocStore::open(&config.docs_db).expect("docs db");
    let app = router(AppState::new(docs, config), config.assets_dir.clone());
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", 0))
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    let server = tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    (addr, server)
}

#[tokio::test]
async fn serves_root_posts_pages_and_assets() {
    let dir = TempDir::new().expect("tmp");
    let config = seed(dir.path());
    let (addr, server) = start(&config).await;

    let root = reqwest::get(format!("http://{addr}/")).await.expect("get /");
    assert_eq!(root.text().await.unwrap(), "Hello, World!");

    for key in ["doc-1", "first-post"] {
        let response = reqwest::get(format!("http://{addr}/blog/{key}"))
            .await
            .expect("get post");
        assert!(response.status().is_success(), "{key}");
        let body = response.text().await.unwrap();
        assert!(body.contains("<title>First Post | Test Blog</title>"));
        assert!(body.contains("<p class=\"normal_text\">\nHi\n</p>"));
        assert!(body.contains("Published "));
    }

    let page = reqwest::get(format!("http://{addr}/page/about"))
        .await
        .expect("get page");
    assert_eq!(page.text().await.unwrap(), "<h1>About</h1>");

    let css = reqwest::get(format!("http://{addr}/assets/blog.css"))
        .await
        .expect("get asset");
    assert!(css.status().is_success());
    assert_eq!(css.text().await.unwrap(), "body { margin: 0 }");

    server.abort();
    let _ = server.await;
}

#[tokio::test]
async fn missing_and_unrendered_posts_are_json_404s() {
    let dir = TempDir::new().expect("tmp");
    let config = seed(dir.path());
    let (addr, server) = start(&config).await;

    for path in ["/blog/nope", "/blog/doc-2", "/page/missing"] {
        let response = reqwest::get(format!("http://{addr}{path}"))
            .await
            .expect("get");
        assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND, "{path}");
        let body: Value = response.json().await.expect("json error");
        assert_eq!(body["code"], "not_found");
        assert!(body["message"].as_str().is_some());
    }

    let bad = reqwest::get(format!("http://{addr}/page/..hidden"))
        .await
        .expect("get");
    assert_eq!(bad.status(), reqwest::StatusCode::BAD_REQUEST);

    server.abort();
    let _ = server.await;
}

#[tokio::test]
async fn api_lists_posts_and_reports_health() {
    let dir = TempDir::new().expect("tmp");
    let config = seed(dir.path());
    let (addr, server) = start(&config).await;

    let health: Value = reqwest::get(format!("http://{addr}/api/health"))
        .await
        .expect("health")
        .json()
        .await
        .expect("json");
    assert_eq!(health["ok"], true);

    let posts: Value = reqwest::get(format!("http://{addr}/api/posts"))
        .await
        .expect("posts")
        .json()
        .await
        .expect("json");
    let posts = posts.as_array().expect("array");
    assert_eq!(posts.len(), 2);
    assert_eq!(posts[0]["document_id"], "doc-1");
    assert_eq!(posts[0]["slug"], "first-post");
    assert_eq!(posts[0]["status"], "published");
    assert_eq!(posts[1]["rendered"], false);

    server.abort();
    let _ = server.await;
}

#[tokio::test]
async fn serve_stops_on_shutdown_signal() {
    let dir = TempDir::new().expect("tmp");
    let config = seed(dir.path());
    let (shutdown_tx, _keep) = broadcast::channel::<()>(1);

    let mut handle = tokio::spawn(blogkit_server::serve(config, shutdown_tx.clone()));
    let joined = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let _ = shutdown_tx.send(());
            tokio::select! {
                joined = &mut handle => break joined,
                _ = tokio::time::sleep(Duration::from_millis(50)) => {}
            }
        }
    })
    .await
    .expect("server stopped in time");
    let result = joined.expect("join");
    assert!(result.is_ok(), "{result:?}");
}
