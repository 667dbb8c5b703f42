use async_trait::async_trait;
use parking_lot::RwLock;
use rusqlite::{params, OptionalExtension};
use tokio_rusqlite::Connection;
use uuid::Uuid;

use super::{validate_key_field, Collection, Document, DocumentStore, Fields, StoreError};

const PRAGMAS: &str = r#"
PRAGMA journal_mode = WAL;
PRAGMA synchronous = NORMAL;
PRAGMA cache_size = -64000;
PRAGMA temp_store = MEMORY;
"#;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS documents (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    id TEXT NOT NULL UNIQUE,
    collection TEXT NOT NULL,
    data TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_documents_collection ON documents(collection, seq);
"#;

const FIND_BY_KEY: &str = "SELECT id, data FROM documents
WHERE collection = ?1 AND json_extract(data, ?2) = ?3
ORDER BY seq LIMIT 1";

/// SQLite-backed document store holding a single connection for the
/// process lifetime.
pub struct SqliteStore {
  conn: RwLock<Option<Connection>>,
}

impl SqliteStore {
  pub async fn open(path: &str) -> Result<Self, StoreError> {
    let conn = Connection::open(path).await?;
    conn
      .call(|conn| conn.execute_batch(PRAGMAS).map_err(|e| e.into()))
      .await?;
    Ok(Self::with_connection(conn))
  }

  pub async fn in_memory() -> Result<Self, StoreError> {
    let conn = Connection::open_in_memory().await?;
    Ok(Self::with_connection(conn))
  }

  fn with_connection(conn: Connection) -> Self {
    Self {
      conn: RwLock::new(Some(conn)),
    }
  }

  fn connection(&self) -> Result<Connection, StoreError> {
    self.conn.read().clone().ok_or(StoreError::Unavailable)
  }
}

impl From<tokio_rusqlite::Error> for StoreError {
  fn from(e: tokio_rusqlite::Error) -> Self {
    match e {
      tokio_rusqlite::Error::ConnectionClosed => StoreError::Unavailable,
      other => StoreError::Backend(anyhow::anyhow!("{}", other)),
    }
  }
}

fn key_path(key_field: &str) -> String {
  format!("$.{}", key_field)
}

fn decode_fields(data: &str) -> rusqlite::Result<Fields> {
  serde_json::from_str(data).map_err(|e| {
    rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
  })
}

fn encode_fields(fields: &Fields) -> rusqlite::Result<String> {
  serde_json::to_string(fields).map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
}

fn row_to_doc(row: &rusqlite::Row) -> rusqlite::Result<Document> {
  let id_str: String = row.get(0)?;
  let data_str: String = row.get(1)?;
  let id = id_str.parse().map_err(|e| {
    rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
  })?;
  Ok(Document::new(id, decode_fields(&data_str)?))
}

#[async_trait]
impl DocumentStore for SqliteStore {
  async fn init_schema(&self) -> Result<(), StoreError> {
    self
      .connection()?
      .call(|conn| conn.execute_batch(SCHEMA).map_err(|e| e.into()))
      .await?;
    tracing::info!("SQLite schema initialized");
    Ok(())
  }

  async fn list_all(&self, collection: Collection) -> Result<Vec<Document>, StoreError> {
    let col = collection.as_str();
    let docs = self
      .connection()?
      .call(move |conn| {
        let mut stmt = conn
          .prepare_cached("SELECT id, data FROM documents WHERE collection = ?1 ORDER BY seq")?;
        let docs = stmt
          .query_map(params![col], row_to_doc)?
          .collect::<Result<Vec<_>, _>>()?;
        Ok(docs)
      })
      .await?;
    Ok(docs)
  }

  async fn get_by_id(
    &self,
    collection: Collection,
    id: Uuid,
  ) -> Result<Option<Document>, StoreError> {
    let col = collection.as_str();
    let id_str = id.to_string();
    let doc = self
      .connection()?
      .call(move |conn| {
        let mut stmt = conn
          .prepare_cached("SELECT id, data FROM documents WHERE collection = ?1 AND id = ?2")?;
        Ok(stmt.query_row(params![col, id_str], row_to_doc).optional()?)
      })
      .await?;
    Ok(doc)
  }

  async fn insert(&self, collection: Collection, fields: Fields) -> Result<Document, StoreError> {
    let doc = Document::new(Uuid::new_v4(), fields);
    let data_str = serde_json::to_string(&doc.fields)?;
    let col = collection.as_str();
    let id_str = doc.id.to_string();

    self
      .connection()?
      .call(move |conn| {
        conn
          .execute(
            "INSERT INTO documents (id, collection, data) VALUES (?1, ?2, ?3)",
            params![id_str, col, data_str],
          )
          .map_err(|e| e.into())
      })
      .await?;

    Ok(doc)
  }

  async fn update_by_id(
    &self,
    collection: Collection,
    id: Uuid,
    fields: Fields,
  ) -> Result<Option<Document>, StoreError> {
    let col = collection.as_str();
    let id_str = id.to_string();

    let doc = self
      .connection()?
      .call(move |conn| {
        let tx = conn.transaction()?;
        let existing = tx
          .query_row(
            "SELECT id, data FROM documents WHERE collection = ?1 AND id = ?2",
            params![col, id_str],
            row_to_doc,
          )
          .optional()?;
        let Some(mut doc) = existing else {
          return Ok(None);
        };
        doc.set_fields(fields);
        tx.execute(
          "UPDATE documents SET data = ?1 WHERE collection = ?2 AND id = ?3",
          params![encode_fields(&doc.fields)?, col, id_str],
        )?;
        tx.commit()?;
        Ok(Some(doc))
      })
      .await?;
    Ok(doc)
  }

  async fn delete_by_id(&self, collection: Collection, id: Uuid) -> Result<u64, StoreError> {
    let col = collection.as_str();
    let id_str = id.to_string();
    let deleted = self
      .connection()?
      .call(move |conn| {
        conn
          .execute(
            "DELETE FROM documents WHERE collection = ?1 AND id = ?2",
            params![col, id_str],
          )
          .map_err(|e| e.into())
      })
      .await?;
    Ok(deleted as u64)
  }

  async fn find_by_key(
    &self,
    collection: Collection,
    key_field: &str,
    key_value: &str,
  ) -> Result<Option<Document>, StoreError> {
    validate_key_field(key_field)?;

    let col = collection.as_str();
    let path = key_path(key_field);
    let key_value = key_value.to_string();
    let doc = self
      .connection()?
      .call(move |conn| {
        Ok(
          conn
            .query_row(FIND_BY_KEY, params![col, path, key_value], row_to_doc)
            .optional()?,
        )
      })
      .await?;
    Ok(doc)
  }

  async fn upsert_by_key(
    &self,
    collection: Collection,
    key_field: &str,
    key_value: &str,
    fields: Fields,
  ) -> Result<Document, StoreError> {
    validate_key_field(key_field)?;

    let col = collection.as_str();
    let path = key_path(key_field);
    let key_field = key_field.to_string();
    let key_value = key_value.to_string();

    let doc = self
      .connection()?
      .call(move |conn| {
        let tx = conn.transaction()?;
        let existing = tx
          .query_row(FIND_BY_KEY, params![col, path, key_value], row_to_doc)
          .optional()?;

        let doc = match existing {
          Some(mut doc) => {
            doc.set_fields(fields);
            tx.execute(
              "UPDATE documents SET data = ?1 WHERE id = ?2",
              params![encode_fields(&doc.fields)?, doc.id.to_string()],
            )?;
            doc
          }
          None => {
            let mut initial = Fields::new();
            initial.insert(key_field, serde_json::Value::String(key_value));
            let mut doc = Document::new(Uuid::new_v4(), initial);
            doc.set_fields(fields);
            tx.execute(
              "INSERT INTO documents (id, collection, data) VALUES (?1, ?2, ?3)",
              params![doc.id.to_string(), col, encode_fields(&doc.fields)?],
            )?;
            doc
          }
        };
        tx.commit()?;
        Ok(doc)
      })
      .await?;
    Ok(doc)
  }

  async fn close(&self) -> Result<(), StoreError> {
    let conn = self.conn.write().take();
    if let Some(conn) = conn {
      conn.close().await?;
      tracing::info!("SQLite connection closed");
    }
    Ok(())
  }
}
