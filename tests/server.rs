//! Server wiring tests - static front end, CORS and shutdown

use axum::body::Body;
use axum::http::{Request, StatusCode};
use cadtrack::server::{Server, ServerConfig};
use cadtrack::store::{Collection, DocumentStore, MemoryStore, StoreError};
use std::sync::Arc;
use tower::ServiceExt;

fn config_with_static(dir: &std::path::Path) -> ServerConfig {
  let mut config = ServerConfig::default();
  config.server.host = "127.0.0.1".into();
  config.server.port = 0;
  config.static_files.dir = dir.to_str().unwrap().to_string();
  config
}

fn static_dir() -> tempfile::TempDir {
  let dir = tempfile::tempdir().unwrap();
  std::fs::write(dir.path().join("index.html"), "<h1>CAD Tracker</h1>").unwrap();
  std::fs::write(dir.path().join("app.js"), "console.log('ready');").unwrap();
  dir
}

async fn body_text(response: axum::response::Response) -> String {
  let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
    .await
    .unwrap();
  String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_root_serves_index_page() {
  let dir = static_dir();
  let server = Server::new(config_with_static(dir.path()), Arc::new(MemoryStore::new()));

  let response = server
    .app()
    .oneshot(Request::get("/").body(Body::empty()).unwrap())
    .await
    .unwrap();
  assert_eq!(response.status(), StatusCode::OK);
  assert_eq!(body_text(response).await, "<h1>CAD Tracker</h1>");
}

#[tokio::test]
async fn test_static_assets_are_served() {
  let dir = static_dir();
  let server = Server::new(config_with_static(dir.path()), Arc::new(MemoryStore::new()));

  let response = server
    .app()
    .oneshot(Request::get("/app.js").body(Body::empty()).unwrap())
    .await
    .unwrap();
  assert_eq!(response.status(), StatusCode::OK);
  assert!(body_text(response).await.contains("ready"));

  let response = server
    .app()
    .oneshot(Request::get("/missing.css").body(Body::empty()).unwrap())
    .await
    .unwrap();
  assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_api_routes_take_precedence_over_static() {
  let dir = static_dir();
  let server = Server::new(config_with_static(dir.path()), Arc::new(MemoryStore::new()));

  let response = server
    .app()
    .oneshot(Request::get("/api/projects").body(Body::empty()).unwrap())
    .await
    .unwrap();
  assert_eq!(response.status(), StatusCode::OK);
  assert_eq!(body_text(response).await, "[]");
}

#[tokio::test]
async fn test_permissive_cors_by_default() {
  let dir = static_dir();
  let server = Server::new(config_with_static(dir.path()), Arc::new(MemoryStore::new()));

  let response = server
    .app()
    .oneshot(
      Request::get("/api/customers")
        .header("origin", "http://example.com")
        .body(Body::empty())
        .unwrap(),
    )
    .await
    .unwrap();
  assert_eq!(response.status(), StatusCode::OK);
  assert_eq!(
    response
      .headers()
      .get("access-control-allow-origin")
      .unwrap(),
    "*"
  );
}

#[tokio::test]
async fn test_shutdown_closes_store() {
  let dir = static_dir();
  let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
  let server = Server::new(config_with_static(dir.path()), store.clone());

  server.run(async {}).await.unwrap();

  let err = store.list_all(Collection::Projects).await.unwrap_err();
  assert!(matches!(err, StoreError::Unavailable));
}

#[tokio::test]
async fn test_run_binds_hostname() {
  let dir = static_dir();
  let mut config = config_with_static(dir.path());
  config.server.host = "localhost".into();
  let server = Server::new(config, Arc::new(MemoryStore::new()));

  server.run(async {}).await.unwrap();
}

#[tokio::test]
async fn test_run_reports_unresolvable_host() {
  let dir = static_dir();
  let mut config = config_with_static(dir.path());
  config.server.host = "not a host".into();
  let server = Server::new(config, Arc::new(MemoryStore::new()));

  assert!(server.run(async {}).await.is_err());
}
