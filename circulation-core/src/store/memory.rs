//! In-process document store
//!
//! Keeps one collection in insertion order and follows MongoDB's observable
//! behaviour for the calls the repository makes:
//! - generated `ObjectId`s, placed first in the stored document
//! - top-level equality filters, numbers compared by value across types
//! - `null` in a filter matches a missing field
//! - duplicate `_id` rejected, ordered bulk insert keeps the prefix
//! - a replacement may not change `_id`

use async_trait::async_trait;
use mongodb::bson::{doc, oid::ObjectId, Bson, Document};
use tokio::sync::RwLock;
use tracing::debug;

use super::DocumentStore;
use crate::config::DEFAULT_DATABASE;
use crate::error::{Result, StoreError};
use crate::record::ID_FIELD;

pub struct MemoryStore {
    database: String,
    documents: RwLock<Vec<Document>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(DEFAULT_DATABASE)
    }
}

impl MemoryStore {
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            documents: RwLock::new(Vec::new()),
        }
    }

    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }
}

/// Stored form of `document`: existing `_id` kept, otherwise a new ObjectId, always first.
fn with_id(document: Document) -> (Bson, Document) {
    let id = document
        .get(ID_FIELD)
        .cloned()
        .unwrap_or_else(|| Bson::ObjectId(ObjectId::new()));

    let mut stored = doc! { ID_FIELD: id.clone() };
    for (key, value) in document {
        if key != ID_FIELD {
            stored.insert(key, value);
        }
    }
    (id, stored)
}

fn insert_into(documents: &mut Vec<Document>, document: Document) -> Result<Bson> {
    let (id, stored) = with_id(document);
    if documents.iter().any(|existing| existing.get(ID_FIELD) == Some(&id)) {
        return Err(StoreError::duplicate(id.to_string()));
    }
    documents.push(stored);
    Ok(id)
}

fn matches(document: &Document, filter: &Document) -> bool {
    filter.iter().all(|(key, expected)| match document.get(key) {
        Some(actual) => values_equal(actual, expected),
        None => matches!(expected, Bson::Null),
    })
}

fn values_equal(actual: &Bson, expected: &Bson) -> bool {
    match (as_number(actual), as_number(expected)) {
        (Some(a), Some(b)) => a == b,
        _ => actual == expected,
    }
}

fn as_number(value: &Bson) -> Option<f64> {
    match value {
        Bson::Int32(n) => Some(f64::from(*n)),
        Bson::Int64(n) => Some(*n as f64),
        Bson::Double(n) => Some(*n),
        _ => None,
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert_many(&self, documents: Vec<Document>) -> Result<Vec<Bson>> {
        let mut stored = self.documents.write().await;
        let mut ids = Vec::with_capacity(documents.len());
        for document in documents {
            ids.push(insert_into(&mut stored, document)?);
        }
        debug!(count = ids.len(), "insert_many");
        Ok(ids)
    }

    async fn find(&self, filter: Document, limit: Option<i64>) -> Result<Vec<Document>> {
        let take = limit
            .filter(|limit| *limit != 0)
            .map(|limit| limit.unsigned_abs() as usize)
            .unwrap_or(usize::MAX);

        let documents = self.documents.read().await;
        Ok(documents
            .iter()
            .filter(|document| matches(document, &filter))
            .take(take)
            .cloned()
            .collect())
    }

    async fn find_one(&self, filter: Document) -> Result<Option<Document>> {
        let documents = self.documents.read().await;
        Ok(documents
            .iter()
            .find(|document| matches(document, &filter))
            .cloned())
    }

    async fn insert_one(&self, document: Document) -> Result<Bson> {
        let mut documents = self.documents.write().await;
        insert_into(&mut documents, document)
    }

    async fn find_one_and_replace(
        &self,
        filter: Document,
        replacement: Document,
    ) -> Result<Option<Document>> {
        let mut documents = self.documents.write().await;
        let Some(slot) = documents
            .iter_mut()
            .find(|document| matches(document, &filter))
        else {
            return Ok(None);
        };

        let id = slot.get(ID_FIELD).cloned().unwrap_or(Bson::Null);
        if let Some(new_id) = replacement.get(ID_FIELD) {
            if new_id != &id {
                return Err(StoreError::invalid_document(format!(
                    "replacement would change immutable field '{}' from {} to {}",
                    ID_FIELD, id, new_id
                )));
            }
        }

        let mut replaced = doc! { ID_FIELD: id };
        for (key, value) in replacement {
            if key != ID_FIELD {
                replaced.insert(key, value);
            }
        }
        Ok(Some(std::mem::replace(slot, replaced)))
    }

    async fn delete_one(&self, filter: Document) -> Result<u64> {
        let mut documents = self.documents.write().await;
        match documents.iter().position(|document| matches(document, &filter)) {
            Some(index) => {
                documents.remove(index);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn drop_database(&self) -> Result<()> {
        self.documents.write().await.clear();
        debug!(database = %self.database, "dropped in-memory database");
        Ok(())
    }

    async fn list_databases(&self) -> Result<Vec<String>> {
        // Like MongoDB, an empty database is not listed
        if self.documents.read().await.is_empty() {
            Ok(Vec::new())
        } else {
            Ok(vec![self.database.clone()])
        }
    }

    async fn close(&self) {}
}
