//! Persistence gateway over the document store.
//!
//! Handlers talk to an `Arc<dyn DocumentStore>` and never to an engine
//! directly, so tests can swap the SQLite engine for [`MemoryStore`].

mod memory;
mod sqlite;
mod url;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use url::{StoreUrl, StoreUrlError};

/// Name of the identifier field in serialized documents.
pub const ID_FIELD: &str = "_id";

/// Client-supplied document fields.
pub type Fields = serde_json::Map<String, serde_json::Value>;

/// The named collections this service persists to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
  Projects,
  Customers,
  Lists,
}

impl Collection {
  pub const ALL: [Collection; 3] = [Self::Projects, Self::Customers, Self::Lists];

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Projects => "projects",
      Self::Customers => "customers",
      Self::Lists => "lists",
    }
  }
}

impl fmt::Display for Collection {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// A stored document: the store-assigned identifier plus whatever fields
/// the client and the handlers put on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
  #[serde(rename = "_id")]
  pub id: Uuid,
  #[serde(flatten)]
  pub fields: Fields,
}

impl Document {
  pub fn new(id: Uuid, mut fields: Fields) -> Self {
    fields.remove(ID_FIELD);
    Self { id, fields }
  }

  pub fn get(&self, field: &str) -> Option<&serde_json::Value> {
    self.fields.get(field)
  }

  /// `$set` semantics: listed fields are replaced, all others are kept.
  pub fn set_fields(&mut self, fields: Fields) {
    for (key, value) in fields {
      if key != ID_FIELD {
        self.fields.insert(key, value);
      }
    }
  }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
  #[error("document store is not connected")]
  Unavailable,
  #[error("invalid document identifier: {0}")]
  InvalidIdentifier(String),
  #[error("invalid key field: {0}")]
  InvalidKey(String),
  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
  #[error(transparent)]
  Backend(#[from] anyhow::Error),
}

/// Parse a path identifier into the store's identifier type.
pub fn parse_id(raw: &str) -> Result<Uuid, StoreError> {
  raw
    .parse()
    .map_err(|_| StoreError::InvalidIdentifier(raw.to_string()))
}

/// Key fields are spliced into a JSON path, so only plain identifiers pass.
pub(crate) fn validate_key_field(field: &str) -> Result<(), StoreError> {
  let mut chars = field.chars();
  let valid = match chars.next() {
    Some(first) if first.is_ascii_alphabetic() || first == '_' => {
      chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    }
    _ => false,
  };
  if valid {
    Ok(())
  } else {
    Err(StoreError::InvalidKey(field.to_string()))
  }
}

/// Collection-level CRUD over the document store.
///
/// Failures are returned as-is; mapping them onto HTTP semantics is the
/// router's job. Nothing here retries or caches.
#[async_trait]
pub trait DocumentStore: Send + Sync {
  /// Prepare storage. Safe to call more than once.
  async fn init_schema(&self) -> Result<(), StoreError>;

  /// Every document in the collection, in insertion order.
  async fn list_all(&self, collection: Collection) -> Result<Vec<Document>, StoreError>;

  async fn get_by_id(
    &self,
    collection: Collection,
    id: Uuid,
  ) -> Result<Option<Document>, StoreError>;

  /// Assign a fresh identifier and persist `fields` under it.
  async fn insert(&self, collection: Collection, fields: Fields) -> Result<Document, StoreError>;

  /// Set `fields` on the matching document and return it as stored.
  async fn update_by_id(
    &self,
    collection: Collection,
    id: Uuid,
    fields: Fields,
  ) -> Result<Option<Document>, StoreError>;

  /// Number of documents removed (0 or 1).
  async fn delete_by_id(&self, collection: Collection, id: Uuid) -> Result<u64, StoreError>;

  /// First document whose string field `key_field` equals `key_value`.
  async fn find_by_key(
    &self,
    collection: Collection,
    key_field: &str,
    key_value: &str,
  ) -> Result<Option<Document>, StoreError>;

  /// Set `fields` on the document whose `key_field` equals `key_value`,
  /// creating it when no such document exists.
  async fn upsert_by_key(
    &self,
    collection: Collection,
    key_field: &str,
    key_value: &str,
    fields: Fields,
  ) -> Result<Document, StoreError>;

  /// Release the connection. Later operations fail with
  /// [`StoreError::Unavailable`].
  async fn close(&self) -> Result<(), StoreError>;
}

/// Open the store named by `url` and prepare its schema.
pub async fn connect(url: &StoreUrl) -> Result<Arc<dyn DocumentStore>, StoreError> {
  let store: Arc<dyn DocumentStore> = match url {
    StoreUrl::Sqlite(path) => Arc::new(SqliteStore::open(path).await?),
    StoreUrl::SqliteMemory => Arc::new(SqliteStore::in_memory().await?),
    StoreUrl::Memory => Arc::new(MemoryStore::new()),
  };
  store.init_schema().await?;
  tracing::info!("Connected to document store at {}", url);
  Ok(store)
}
