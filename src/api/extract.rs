use axum::{
  extract::{FromRequest, Request},
  Json,
};
use serde::de::DeserializeOwned;

use super::ApiError;

/// `Json` with rejections reported in the API's `{ "error": ... }` shape.
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
  T: DeserializeOwned,
  S: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
    let Json(value) = Json::<T>::from_request(req, state).await?;
    Ok(Self(value))
  }
}
