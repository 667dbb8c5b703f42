use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use uuid::Uuid;

use super::{validate_key_field, Collection, Document, DocumentStore, Fields, StoreError};

/// In-process document store. Nothing survives a restart; used by tests and
/// `memory://` runs.
#[derive(Default)]
pub struct MemoryStore {
  collections: RwLock<HashMap<Collection, Vec<Document>>>,
  closed: AtomicBool,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  fn ensure_open(&self) -> Result<(), StoreError> {
    if self.closed.load(Ordering::Acquire) {
      Err(StoreError::Unavailable)
    } else {
      Ok(())
    }
  }
}

fn has_key(doc: &Document, key_field: &str, key_value: &str) -> bool {
  doc.get(key_field).and_then(|v| v.as_str()) == Some(key_value)
}

#[async_trait]
impl DocumentStore for MemoryStore {
  async fn init_schema(&self) -> Result<(), StoreError> {
    self.ensure_open()?;
    let mut collections = self.collections.write();
    for collection in Collection::ALL {
      collections.entry(collection).or_default();
    }
    Ok(())
  }

  async fn list_all(&self, collection: Collection) -> Result<Vec<Document>, StoreError> {
    self.ensure_open()?;
    Ok(
      self
        .collections
        .read()
        .get(&collection)
        .cloned()
        .unwrap_or_default(),
    )
  }

  async fn get_by_id(
    &self,
    collection: Collection,
    id: Uuid,
  ) -> Result<Option<Document>, StoreError> {
    self.ensure_open()?;
    Ok(
      self
        .collections
        .read()
        .get(&collection)
        .and_then(|docs| docs.iter().find(|d| d.id == id).cloned()),
    )
  }

  async fn insert(&self, collection: Collection, fields: Fields) -> Result<Document, StoreError> {
    self.ensure_open()?;
    let doc = Document::new(Uuid::new_v4(), fields);
    self
      .collections
      .write()
      .entry(collection)
      .or_default()
      .push(doc.clone());
    Ok(doc)
  }

  async fn update_by_id(
    &self,
    collection: Collection,
    id: Uuid,
    fields: Fields,
  ) -> Result<Option<Document>, StoreError> {
    self.ensure_open()?;
    let mut collections = self.collections.write();
    let doc = collections
      .get_mut(&collection)
      .and_then(|docs| docs.iter_mut().find(|d| d.id == id));
    Ok(doc.map(|doc| {
      doc.set_fields(fields);
      doc.clone()
    }))
  }

  async fn delete_by_id(&self, collection: Collection, id: Uuid) -> Result<u64, StoreError> {
    self.ensure_open()?;
    let mut collections = self.collections.write();
    let Some(docs) = collections.get_mut(&collection) else {
      return Ok(0);
    };
    let before = docs.len();
    docs.retain(|d| d.id != id);
    Ok((before - docs.len()) as u64)
  }

  async fn find_by_key(
    &self,
    collection: Collection,
    key_field: &str,
    key_value: &str,
  ) -> Result<Option<Document>, StoreError> {
    self.ensure_open()?;
    validate_key_field(key_field)?;
    Ok(self.collections.read().get(&collection).and_then(|docs| {
      docs
        .iter()
        .find(|d| has_key(d, key_field, key_value))
        .cloned()
    }))
  }

  async fn upsert_by_key(
    &self,
    collection: Collection,
    key_field: &str,
    key_value: &str,
    fields: Fields,
  ) -> Result<Document, StoreError> {
    self.ensure_open()?;
    validate_key_field(key_field)?;

    let mut collections = self.collections.write();
    let docs = collections.entry(collection).or_default();
    let existing = docs
      .iter_mut()
      .find(|d| has_key(d, key_field, key_value));

    if let Some(doc) = existing {
      doc.set_fields(fields);
      return Ok(doc.clone());
    }

    let mut initial = Fields::new();
    initial.insert(
      key_field.to_string(),
      serde_json::Value::String(key_value.to_string()),
    );
    let mut doc = Document::new(Uuid::new_v4(), initial);
    doc.set_fields(fields);
    docs.push(doc.clone());
    Ok(doc)
  }

  async fn close(&self) -> Result<(), StoreError> {
    self.closed.store(true, Ordering::Release);
    Ok(())
  }
}
