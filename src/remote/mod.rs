//! Remote Store Module
//!
//! The document database the cache sits in front of. Only the operations the
//! client needs are modelled; the real backend is an external collaborator.

mod memory;
pub mod paths;
mod query;

pub use memory::MemoryDocumentStore;
pub use query::{Direction, Filter, Query, Source};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::StoreError;

/// Field map of a document.
pub type Fields = Map<String, Value>;

// == Document ==
/// A stored record: its id plus its fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

impl Document {
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    // == Decode ==
    /// Decodes the fields, with `id` injected, into a model.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, StoreError> {
        let mut object = self.fields.clone();
        object.insert("id".to_string(), Value::String(self.id.clone()));
        serde_json::from_value(Value::Object(object)).map_err(|e| StoreError::InvalidDocument {
            path: self.id.clone(),
            message: e.to_string(),
        })
    }
}

/// Decodes every document, failing on the first bad one.
pub fn decode_all<T: DeserializeOwned>(documents: &[Document]) -> Result<Vec<T>, StoreError> {
    documents.iter().map(Document::decode).collect()
}

/// Turns a JSON object literal into a field map. Non-objects yield no fields.
pub fn fields(value: Value) -> Fields {
    match value {
        Value::Object(map) => map,
        _ => Fields::new(),
    }
}

// == Patch ==
/// Field writes and counter deltas applied to one document in one step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Patch {
    pub set: Fields,
    pub increments: Vec<(String, i64)>,
}

impl Patch {
    /// Creates a patch that overwrites `set`.
    pub fn set(set: Fields) -> Self {
        Self {
            set,
            increments: Vec::new(),
        }
    }

    /// Also adds `delta` to the numeric `field` (missing counts as 0).
    pub fn increment(mut self, field: impl Into<String>, delta: i64) -> Self {
        self.increments.push((field.into(), delta));
        self
    }
}

// == Document Store Trait ==
/// Asynchronous access to the remote document store.
///
/// Paths are slash-separated: collections have an odd number of segments
/// (`posts`, `posts/p1/comments`), documents an even one (`posts/p1`).
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Runs `query` and returns matching documents in query order.
    async fn fetch_ordered(&self, query: &Query) -> Result<Vec<Document>, StoreError>;

    /// Reads one document, None when it does not exist.
    async fn get_document(&self, path: &str) -> Result<Option<Document>, StoreError>;

    /// Applies every write and delta of `patch` to an existing document
    /// atomically: either all of them land or none do.
    async fn apply_patch(&self, path: &str, patch: Patch) -> Result<(), StoreError>;

    /// Atomically adds `delta` to a numeric field (missing counts as 0).
    async fn increment_field(&self, path: &str, field: &str, delta: i64) -> Result<(), StoreError>;

    /// Creates a document with a generated id and returns the id.
    async fn add_document(&self, collection: &str, fields: Fields) -> Result<String, StoreError>;

    /// Deletes a document. Deleting a missing document succeeds.
    async fn delete_document(&self, path: &str) -> Result<(), StoreError>;
}
