//! HTTP surface: one handler per (method, resource) pair, each making a
//! single call into the document store.

mod error;
mod extract;
mod lists;
mod records;

use axum::{routing::get, Json, Router};
use chrono::{SecondsFormat, Utc};
use std::sync::Arc;

use crate::store::DocumentStore;

pub use error::ApiError;
pub use extract::JsonBody;
pub use lists::ListUpdate;
pub use records::{RecordKind, CREATED_AT, CUSTOMERS, PROJECTS, UPDATED_AT};

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
  pub store: Arc<dyn DocumentStore>,
}

impl AppState {
  pub fn new(store: Arc<dyn DocumentStore>) -> Self {
    Self { store }
  }
}

/// Current time as an RFC 3339 UTC string with millisecond precision.
pub fn timestamp() -> serde_json::Value {
  serde_json::Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// API routes with state applied. Static assets are mounted by the server.
pub fn router(state: AppState) -> Router {
  Router::new()
    .route("/health", get(health_check))
    .merge(records::routes(&PROJECTS))
    .merge(records::routes(&CUSTOMERS))
    .merge(lists::routes())
    .with_state(state)
}

async fn health_check() -> Json<serde_json::Value> {
  Json(serde_json::json!({ "status": "ok" }))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_timestamp_format() {
    let ts = timestamp();
    let s = ts.as_str().unwrap();
    assert!(s.ends_with('Z'));
    assert!(chrono::DateTime::parse_from_rfc3339(s).is_ok());
    // 2026-01-02T03:04:05.678Z
    assert_eq!(s.len(), 24);
  }
}
