//! In-Memory Document Store
//!
//! A complete [`DocumentStore`] held in process memory, with failure
//! injection and fetch counting so cache behaviour can be observed.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering as AtomicOrdering};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::StoreError;
use crate::remote::{Direction, Document, DocumentStore, Fields, Patch, Query};

// == Memory Document Store ==
/// Document store backed by nested maps.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    /// collection path -> document id -> fields
    collections: RwLock<HashMap<String, BTreeMap<String, Fields>>>,
    /// Error returned by every call while set
    failure: RwLock<Option<StoreError>>,
    /// Number of `fetch_ordered` calls that reached the data
    fetches: AtomicUsize,
    /// Id generator for `add_document`
    next_id: AtomicU64,
}

impl MemoryDocumentStore {
    // == Constructor ==
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the document at `path`.
    pub async fn insert(&self, path: &str, fields: Fields) -> Result<(), StoreError> {
        let (collection, id) = split_document_path(path)?;
        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), fields);
        Ok(())
    }

    // == Failure Injection ==
    /// Makes every following call fail with `error`, or restores service with None.
    pub async fn set_failure(&self, error: Option<StoreError>) {
        *self.failure.write().await = error;
    }

    /// Number of collection fetches served so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(AtomicOrdering::SeqCst)
    }

    async fn check_failure(&self) -> Result<(), StoreError> {
        match self.failure.read().await.as_ref() {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn fetch_ordered(&self, query: &Query) -> Result<Vec<Document>, StoreError> {
        self.check_failure().await?;
        self.fetches.fetch_add(1, AtomicOrdering::SeqCst);

        let collections = self.collections.read().await;
        let mut documents: Vec<Document> = collections
            .get(&query.collection)
            .map(|docs| {
                docs.iter()
                    .filter(|(_, fields)| {
                        query
                            .filters
                            .iter()
                            .all(|filter| filter.accepts(fields.get(filter.field())))
                    })
                    .map(|(id, fields)| Document::new(id.clone(), fields.clone()))
                    .collect()
            })
            .unwrap_or_default();

        if let Some((field, direction)) = &query.order_by {
            documents.sort_by(|a, b| {
                let ordering = compare_values(a.fields.get(field), b.fields.get(field))
                    .then_with(|| a.id.cmp(&b.id));
                match direction {
                    Direction::Ascending => ordering,
                    Direction::Descending => ordering.reverse(),
                }
            });
        }

        debug!(
            "Fetched {} documents from '{}' ({:?})",
            documents.len(),
            query.collection,
            query.source
        );
        Ok(documents)
    }

    async fn get_document(&self, path: &str) -> Result<Option<Document>, StoreError> {
        self.check_failure().await?;
        let (collection, id) = split_document_path(path)?;

        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|fields| Document::new(id, fields.clone())))
    }

    async fn apply_patch(&self, path: &str, patch: Patch) -> Result<(), StoreError> {
        self.check_failure().await?;
        let (collection, id) = split_document_path(path)?;

        let mut collections = self.collections.write().await;
        let fields = collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| StoreError::NotFound(path.to_string()))?;
        fields.extend(patch.set);
        for (field, delta) in patch.increments {
            let current = fields.get(&field).and_then(Value::as_i64).unwrap_or(0);
            fields.insert(field, Value::from(current + delta));
        }
        Ok(())
    }

    async fn increment_field(&self, path: &str, field: &str, delta: i64) -> Result<(), StoreError> {
        self.check_failure().await?;
        let (collection, id) = split_document_path(path)?;

        let mut collections = self.collections.write().await;
        let fields = collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| StoreError::NotFound(path.to_string()))?;

        let current = fields.get(field).and_then(Value::as_i64).unwrap_or(0);
        fields.insert(field.to_string(), Value::from(current + delta));
        Ok(())
    }

    async fn add_document(&self, collection: &str, fields: Fields) -> Result<String, StoreError> {
        self.check_failure().await?;
        if collection.split('/').count() % 2 == 0 {
            return Err(StoreError::InvalidDocument {
                path: collection.to_string(),
                message: "not a collection path".to_string(),
            });
        }

        let id = format!("doc{:06}", self.next_id.fetch_add(1, AtomicOrdering::SeqCst) + 1);
        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .insert(id.clone(), fields);
        Ok(id)
    }

    async fn delete_document(&self, path: &str) -> Result<(), StoreError> {
        self.check_failure().await?;
        let (collection, id) = split_document_path(path)?;

        if let Some(docs) = self.collections.write().await.get_mut(collection) {
            docs.remove(id);
        }
        Ok(())
    }
}

/// Splits `a/b/c/d` into (`a/b/c`, `d`).
fn split_document_path(path: &str) -> Result<(&str, &str), StoreError> {
    match path.rsplit_once('/') {
        Some((collection, id))
            if !collection.is_empty() && !id.is_empty() && path.split('/').count() % 2 == 0 =>
        {
            Ok((collection, id))
        }
        _ => Err(StoreError::InvalidDocument {
            path: path.to_string(),
            message: "not a document path".to_string(),
        }),
    }
}

/// Orders missing < null < bool < number < string; other types compare equal.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(value: Option<&Value>) -> u8 {
        match value {
            None => 0,
            Some(Value::Null) => 1,
            Some(Value::Bool(_)) => 2,
            Some(Value::Number(_)) => 3,
            Some(Value::String(_)) => 4,
            Some(_) => 5,
        }
    }

    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}
