//! Circulation record repository
//!
//! Each operation is one store round trip: the id string is parsed, the
//! filter and limit are normalised, and store errors pass through unchanged.
//! Lookups and deletes of a missing record are `None` / `false`, not errors.

use std::sync::Arc;

use tracing::debug;

use crate::config::StoreConfig;
use crate::error::Result;
use crate::record::{Filter, LoadResult, Record, RecordId};
use crate::store::{DocumentStore, MongoStore};

/// Repository over the newspaper collection
#[derive(Clone)]
pub struct CirculationRepo {
    store: Arc<dyn DocumentStore>,
}

impl CirculationRepo {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Connect a MongoDB-backed repository for `config`
    pub async fn connect(config: StoreConfig) -> Result<Self> {
        let store = MongoStore::connect(config).await?;
        Ok(Self::new(Arc::new(store)))
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Bulk-insert `records`.
    ///
    /// Records are inserted in order; on failure the records before the
    /// failing one stay inserted and the store error is returned.
    pub async fn load_data(&self, records: Vec<Record>) -> Result<LoadResult> {
        let ids = self
            .store
            .insert_many(records)
            .await?
            .into_iter()
            .map(RecordId::from)
            .collect::<Vec<_>>();

        debug!(inserted = ids.len(), "loaded records");
        Ok(LoadResult {
            inserted_count: ids.len(),
            ids,
        })
    }

    /// Records matching `filter`, at most `limit` of them.
    ///
    /// A missing or empty filter selects everything; a missing or
    /// non-positive limit means no limit.
    pub async fn get(&self, filter: Option<Filter>, limit: Option<i64>) -> Result<Vec<Record>> {
        let filter = filter.unwrap_or_default();
        let limit = limit.filter(|limit| *limit > 0);
        self.store.find(filter, limit).await
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Option<Record>> {
        let id: RecordId = id.parse()?;
        self.store.find_one(id.filter()).await
    }

    /// Insert one record, returning the identifier it was stored under
    pub async fn add(&self, record: Record) -> Result<RecordId> {
        let id = self.store.insert_one(record).await?;
        Ok(RecordId::from(id))
    }

    /// Replace the whole record with `record`, keeping its identifier.
    ///
    /// Fields missing from `record` are dropped. Returns the record as it was
    /// before replacement, or `None` when no record has this id.
    pub async fn update(&self, id: &str, record: Record) -> Result<Option<Record>> {
        let id: RecordId = id.parse()?;
        self.store.find_one_and_replace(id.filter(), record).await
    }

    /// Delete by id; `false` when nothing was removed
    pub async fn remove(&self, id: &str) -> Result<bool> {
        let id: RecordId = id.parse()?;
        Ok(self.store.delete_one(id.filter()).await? > 0)
    }

    pub async fn close(&self) {
        self.store.close().await;
    }
}
