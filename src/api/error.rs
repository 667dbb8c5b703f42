use axum::{
  extract::rejection::JsonRejection,
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};

use crate::store::StoreError;

/// Everything a handler can fail with. Internal failures carry the store
/// error for the log; clients only ever see `message`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
  #[error("{0}")]
  NotFound(String),
  #[error("{0}")]
  BadRequest(String),
  #[error("{message}: {source}")]
  Internal {
    message: String,
    #[source]
    source: StoreError,
  },
}

impl ApiError {
  pub fn internal(message: impl Into<String>, source: StoreError) -> Self {
    Self::Internal {
      message: message.into(),
      source,
    }
  }

  pub fn status(&self) -> StatusCode {
    match self {
      Self::NotFound(_) => StatusCode::NOT_FOUND,
      Self::BadRequest(_) => StatusCode::BAD_REQUEST,
      Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self {
    Self::BadRequest(format!("Invalid JSON body: {}", rejection.body_text()))
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    let msg = match self {
      Self::Internal { message, source } => {
        tracing::error!(error = %source, "{}", message);
        message
      }
      Self::NotFound(msg) | Self::BadRequest(msg) => msg,
    };
    (status, Json(serde_json::json!({ "error": msg }))).into_response()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_status_mapping() {
    assert_eq!(
      ApiError::NotFound("Project not found".into()).status(),
      StatusCode::NOT_FOUND
    );
    assert_eq!(
      ApiError::internal("Failed to fetch projects", StoreError::Unavailable).status(),
      StatusCode::INTERNAL_SERVER_ERROR
    );
  }

  #[test]
  fn test_internal_response_hides_source() {
    let err = ApiError::internal("Failed to fetch projects", StoreError::Unavailable);
    let response = err.into_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
  }
}
