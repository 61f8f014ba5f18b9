//! Host document access.
//!
//! The host stores the workflow as a JSON object in one field of the edited
//! entry: `{ "languageData": [ ...records ] }`. This module defines the store
//! seam plus two implementations: a JSON file (used by the binary) and an
//! in-memory store (used by tests and embedders).

use crate::lifecycle::LanguageCollection;
use crate::locales::LocaleCatalog;
use futures::future::BoxFuture;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use thiserror::Error;
use tracing::{debug, warn};

/// Failure talking to the host's field-value API.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Host rejected the write: {0}")]
    Rejected(String),
}

/// Persisted document shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalizationDocument {
    pub language_data: LanguageCollection,
}

impl LocalizationDocument {
    pub fn new(language_data: LanguageCollection) -> Self {
        Self { language_data }
    }

    /// Decode a raw field value.
    ///
    /// A missing field, a null value, a missing `languageData` key or a value
    /// that does not parse all mean "no prior data" and yield `None`.
    pub fn decode(value: Option<&Value>) -> Option<LanguageCollection> {
        let value = match value {
            Some(Value::Null) | None => {
                debug!("No stored localization document");
                return None;
            }
            Some(v) => v,
        };

        if value.get("languageData").map_or(true, Value::is_null) {
            debug!("Stored document has no languageData");
            return None;
        }

        match serde_json::from_value::<LocalizationDocument>(value.clone()) {
            Ok(doc) => Some(doc.language_data),
            Err(e) => {
                warn!("Ignoring malformed localization document: {}", e);
                None
            }
        }
    }

    pub fn to_value(&self) -> Result<Value, HostError> {
        Ok(serde_json::to_value(self)?)
    }
}

/// The host's field-value API for the workflow field of the current entry.
pub trait DocumentStore: Send + Sync {
    /// Read the raw field value. `Ok(None)` when the field was never set.
    fn read_field(&self) -> BoxFuture<'_, Result<Option<Value>, HostError>>;

    /// Replace the field value.
    fn write_field(&self, value: Value) -> BoxFuture<'_, Result<(), HostError>>;
}

/// Load the collection for a session: stored records merged with the host's
/// target locales.
pub async fn load_collection(
    store: &dyn DocumentStore,
    catalog: &LocaleCatalog,
) -> Result<LanguageCollection, HostError> {
    let raw = store.read_field().await?;
    let persisted = LocalizationDocument::decode(raw.as_ref()).map(LanguageCollection::into_records);
    Ok(LanguageCollection::seed(catalog, persisted))
}

/// Write a collection back to the host.
pub async fn save_collection(
    store: &dyn DocumentStore,
    collection: &LanguageCollection,
) -> Result<(), HostError> {
    let value = LocalizationDocument::new(collection.clone()).to_value()?;
    store.write_field(value).await
}

// ==================== File Store ====================

/// Entry fields kept in a JSON file, one key per field id.
pub struct FileDocumentStore {
    path: PathBuf,
    field_id: String,
    write_lock: tokio::sync::Mutex<()>,
}

impl FileDocumentStore {
    pub fn new(path: impl Into<PathBuf>, field_id: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            field_id: field_id.into(),
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    async fn read_fields(&self) -> Result<Map<String, Value>, HostError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_str::<Value>(&content) {
            Ok(Value::Object(fields)) => Ok(fields),
            Ok(_) | Err(_) => {
                warn!(
                    "Entry file {} is not a JSON object, treating it as empty",
                    self.path.display()
                );
                Ok(Map::new())
            }
        }
    }
}

impl DocumentStore for FileDocumentStore {
    fn read_field(&self) -> BoxFuture<'_, Result<Option<Value>, HostError>> {
        async move {
            let mut fields = self.read_fields().await?;
            Ok(fields.remove(&self.field_id))
        }
        .boxed()
    }

    fn write_field(&self, value: Value) -> BoxFuture<'_, Result<(), HostError>> {
        async move {
            let _guard = self.write_lock.lock().await;

            let mut fields = self.read_fields().await?;
            fields.insert(self.field_id.clone(), value);

            if let Some(parent) = self.path.parent() {
                if !parent.as_os_str().is_empty() {
                    tokio::fs::create_dir_all(parent).await?;
                }
            }

            let content = serde_json::to_vec_pretty(&Value::Object(fields))?;
            tokio::fs::write(&self.path, content).await?;
            Ok(())
        }
        .boxed()
    }
}

// ==================== Memory Store ====================

/// In-memory field value, with switches to simulate host behavior.
#[derive(Default)]
pub struct MemoryDocumentStore {
    value: Mutex<Option<Value>>,
    reject_writes: AtomicBool,
    writes: AtomicUsize,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(value: Value) -> Self {
        Self {
            value: Mutex::new(Some(value)),
            ..Self::default()
        }
    }

    /// Current field value.
    pub fn value(&self) -> Option<Value> {
        self.value
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Overwrite the field as if someone else saved the entry.
    pub fn set_value(&self, value: Option<Value>) {
        *self
            .value
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = value;
    }

    /// Make subsequent writes fail.
    pub fn set_reject_writes(&self, reject: bool) {
        self.reject_writes.store(reject, Ordering::SeqCst);
    }

    /// Number of successful writes.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn read_field(&self) -> BoxFuture<'_, Result<Option<Value>, HostError>> {
        async move { Ok(self.value()) }.boxed()
    }

    fn write_field(&self, value: Value) -> BoxFuture<'_, Result<(), HostError>> {
        async move {
            if self.reject_writes.load(Ordering::SeqCst) {
                return Err(HostError::Rejected("entry is read-only".to_string()));
            }
            self.set_value(Some(value));
            self.writes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
        .boxed()
    }
}
