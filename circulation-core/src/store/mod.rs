//! Document store seam
//!
//! `DocumentStore` mirrors the handful of collection calls the repository
//! needs, one method per store round trip:
//! - `MongoStore` talks to a MongoDB deployment
//! - `MemoryStore` keeps documents in-process for tests and dry runs

pub mod connection;
pub mod memory;
pub mod mongo;

use async_trait::async_trait;
use mongodb::bson::{Bson, Document};

use crate::error::Result;

pub use connection::Connection;
pub use memory::MemoryStore;
pub use mongo::MongoStore;

/// Collection-level operations against the configured store
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert documents in order, returning their `_id`s in input order.
    ///
    /// Stops at the first failure; documents before it stay inserted.
    async fn insert_many(&self, documents: Vec<Document>) -> Result<Vec<Bson>>;

    /// Documents matching `filter`, in natural order, at most `limit` of them.
    async fn find(&self, filter: Document, limit: Option<i64>) -> Result<Vec<Document>>;

    async fn find_one(&self, filter: Document) -> Result<Option<Document>>;

    /// Insert one document, returning its `_id`
    async fn insert_one(&self, document: Document) -> Result<Bson>;

    /// Replace the first match, returning the document as it was before
    async fn find_one_and_replace(
        &self,
        filter: Document,
        replacement: Document,
    ) -> Result<Option<Document>>;

    /// Delete the first match, returning the number of documents removed
    async fn delete_one(&self, filter: Document) -> Result<u64>;

    async fn drop_database(&self) -> Result<()>;

    /// Names of the databases visible to this store
    async fn list_databases(&self) -> Result<Vec<String>>;

    /// Release held connections. Further calls may fail.
    async fn close(&self);
}
