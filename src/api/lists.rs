//! Reference lists (project managers, estimators, ...), one document per
//! `type`.

use axum::{
  extract::{Path, State},
  routing::get,
  Json, Router,
};
use serde::Deserialize;
use serde_json::Value;

use super::records::UPDATED_AT;
use super::{timestamp, ApiError, AppState, JsonBody};
use crate::store::{Collection, Fields};

const KEY_FIELD: &str = "type";
const ITEMS: &str = "items";

/// Body of `PUT /api/lists/{type}`. A missing or `null` `items` clears the list.
#[derive(Debug, Deserialize)]
pub struct ListUpdate {
  #[serde(default)]
  pub items: Option<Vec<Value>>,
}

pub fn routes() -> Router<AppState> {
  Router::new().route("/api/lists/{type}", get(get_list).put(update_list))
}

/// A list that was never written reads as empty.
async fn get_list(
  State(state): State<AppState>,
  Path(list_type): Path<String>,
) -> Result<Json<Vec<Value>>, ApiError> {
  let doc = state
    .store
    .find_by_key(Collection::Lists, KEY_FIELD, &list_type)
    .await
    .map_err(|e| ApiError::internal("Failed to fetch list", e))?;

  let items = doc
    .and_then(|d| d.get(ITEMS).and_then(Value::as_array).cloned())
    .unwrap_or_default();
  Ok(Json(items))
}

async fn update_list(
  State(state): State<AppState>,
  Path(list_type): Path<String>,
  JsonBody(update): JsonBody<ListUpdate>,
) -> Result<Json<Vec<Value>>, ApiError> {
  let submitted = update.items.unwrap_or_default();
  let mut fields = Fields::new();
  fields.insert(ITEMS.into(), Value::Array(submitted.clone()));
  fields.insert(UPDATED_AT.into(), timestamp());

  let doc = state
    .store
    .upsert_by_key(Collection::Lists, KEY_FIELD, &list_type, fields)
    .await
    .map_err(|e| ApiError::internal("Failed to update list", e))?;
  tracing::debug!("List '{}' now has {} items", list_type, submitted.len());

  let items = doc
    .get(ITEMS)
    .and_then(Value::as_array)
    .cloned()
    .unwrap_or(submitted);
  Ok(Json(items))
}
