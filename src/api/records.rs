//! Handlers for identifier-addressed records (projects and customers).

use axum::{
  extract::{Path, State},
  http::StatusCode,
  routing::get,
  Json, Router,
};
use serde_json::{json, Value};

use super::{timestamp, ApiError, AppState, JsonBody};
use crate::store::{parse_id, Collection, Document, Fields, ID_FIELD};

pub const CREATED_AT: &str = "createdAt";
pub const UPDATED_AT: &str = "updatedAt";

/// Describes one record resource: where it lives, how it is named in
/// messages, and its timestamp policy.
#[derive(Debug)]
pub struct RecordKind {
  pub collection: Collection,
  /// Lowercase singular, used in failure messages.
  pub noun: &'static str,
  /// Capitalised singular, used in not-found and delete messages.
  pub label: &'static str,
  /// Only projects re-stamp `updatedAt` when modified.
  pub stamps_updated_at: bool,
}

pub static PROJECTS: RecordKind = RecordKind {
  collection: Collection::Projects,
  noun: "project",
  label: "Project",
  stamps_updated_at: true,
};

pub static CUSTOMERS: RecordKind = RecordKind {
  collection: Collection::Customers,
  noun: "customer",
  label: "Customer",
  stamps_updated_at: false,
};

impl RecordKind {
  fn not_found(&self) -> ApiError {
    ApiError::NotFound(format!("{} not found", self.label))
  }
}

pub fn routes(kind: &'static RecordKind) -> Router<AppState> {
  let collection_path = format!("/api/{}", kind.collection);
  let item_path = format!("/api/{}/{{id}}", kind.collection);

  Router::new()
    .route(
      &collection_path,
      get(move |State(state): State<AppState>| list_records(kind, state)).post(
        move |State(state): State<AppState>, JsonBody(fields): JsonBody<Fields>| {
          create_record(kind, state, fields)
        },
      ),
    )
    .route(
      &item_path,
      get(move |State(state): State<AppState>, Path(id): Path<String>| {
        get_record(kind, state, id)
      })
      .put(
        move |State(state): State<AppState>,
              Path(id): Path<String>,
              JsonBody(fields): JsonBody<Fields>| { update_record(kind, state, id, fields) },
      )
      .delete(move |State(state): State<AppState>, Path(id): Path<String>| {
        delete_record(kind, state, id)
      }),
    )
}

async fn list_records(
  kind: &'static RecordKind,
  state: AppState,
) -> Result<Json<Vec<Document>>, ApiError> {
  let docs = state
    .store
    .list_all(kind.collection)
    .await
    .map_err(|e| ApiError::internal(format!("Failed to fetch {}", kind.collection), e))?;
  Ok(Json(docs))
}

async fn get_record(
  kind: &'static RecordKind,
  state: AppState,
  id: String,
) -> Result<Json<Document>, ApiError> {
  let id = parse_id(&id).map_err(|_| kind.not_found())?;
  let doc = state
    .store
    .get_by_id(kind.collection, id)
    .await
    .map_err(|e| ApiError::internal(format!("Failed to fetch {}", kind.noun), e))?;
  doc.map(Json).ok_or_else(|| kind.not_found())
}

async fn create_record(
  kind: &'static RecordKind,
  state: AppState,
  mut fields: Fields,
) -> Result<(StatusCode, Json<Document>), ApiError> {
  fields.remove(ID_FIELD);
  let now = timestamp();
  if kind.stamps_updated_at {
    fields.insert(UPDATED_AT.into(), now.clone());
  }
  fields.insert(CREATED_AT.into(), now);

  let doc = state
    .store
    .insert(kind.collection, fields)
    .await
    .map_err(|e| ApiError::internal(format!("Failed to create {}", kind.noun), e))?;
  tracing::info!("Created {} {}", kind.noun, doc.id);
  Ok((StatusCode::CREATED, Json(doc)))
}

async fn update_record(
  kind: &'static RecordKind,
  state: AppState,
  id: String,
  mut fields: Fields,
) -> Result<Json<Document>, ApiError> {
  let id = parse_id(&id).map_err(|_| kind.not_found())?;

  fields.remove(ID_FIELD);
  fields.remove(CREATED_AT);
  if kind.stamps_updated_at {
    fields.insert(UPDATED_AT.into(), timestamp());
  }

  let doc = state
    .store
    .update_by_id(kind.collection, id, fields)
    .await
    .map_err(|e| ApiError::internal(format!("Failed to update {}", kind.noun), e))?;
  doc.map(Json).ok_or_else(|| kind.not_found())
}

async fn delete_record(
  kind: &'static RecordKind,
  state: AppState,
  id: String,
) -> Result<Json<Value>, ApiError> {
  let id = parse_id(&id).map_err(|_| kind.not_found())?;
  let deleted = state
    .store
    .delete_by_id(kind.collection, id)
    .await
    .map_err(|e| ApiError::internal(format!("Failed to delete {}", kind.noun), e))?;
  if deleted == 0 {
    return Err(kind.not_found());
  }
  tracing::info!("Deleted {} {}", kind.noun, id);
  Ok(Json(
    json!({ "message": format!("{} deleted successfully", kind.label) }),
  ))
}
