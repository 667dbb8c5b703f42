mod config;

use axum::Router;
use std::future::Future;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::api::{self, AppState};
use crate::store::DocumentStore;

pub use config::{
  ConfigError, LoggingSection, ServerConfig, ServerSection, StaticSection, StoreSection,
};

/// HTTP front of the service: API routes, the static front end, and the
/// store connection they share.
pub struct Server {
  config: ServerConfig,
  store: Arc<dyn DocumentStore>,
}

impl Server {
  pub fn new(config: ServerConfig, store: Arc<dyn DocumentStore>) -> Self {
    Self { config, store }
  }

  /// Full application router: API, static assets, CORS and request tracing.
  pub fn app(&self) -> Router {
    let static_dir = ServeDir::new(&self.config.static_files.dir);

    api::router(AppState::new(self.store.clone()))
      .route_service("/", ServeFile::new(self.config.index_file()))
      .fallback_service(static_dir)
      .layer(self.cors_layer())
      .layer(TraceLayer::new_for_http())
  }

  fn cors_layer(&self) -> CorsLayer {
    let origins = &self.config.server.cors_origins;
    if origins.is_empty() || origins.iter().any(|o| o == "*") {
      CorsLayer::permissive()
    } else {
      let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
      CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
    }
  }

  /// Serve until `shutdown` resolves, then release the store connection.
  pub async fn run<F>(self, shutdown: F) -> Result<(), anyhow::Error>
  where
    F: Future<Output = ()> + Send + 'static,
  {
    let addr = self.config.address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server running on http://{}", listener.local_addr()?);

    let served = axum::serve(listener, self.app().into_make_service())
      .with_graceful_shutdown(shutdown)
      .await;

    tracing::info!("Closing document store connection...");
    self.store.close().await?;
    served?;
    tracing::info!("Shutdown complete");
    Ok(())
  }
}
