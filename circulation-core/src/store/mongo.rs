//! MongoDB-backed document store

use std::future::Future;

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{Bson, Document};
use mongodb::Collection;
use tracing::{debug, info};

use super::{Connection, DocumentStore};
use crate::config::{ConnectionMode, StoreConfig};
use crate::error::Result;

/// Store for one configured collection.
///
/// `Pooled` mode connects once in [`MongoStore::connect`] and shares that
/// client until [`DocumentStore::close`]. `PerOperation` mode opens and
/// closes a client around every call.
pub struct MongoStore {
    config: StoreConfig,
    shared: Option<Connection>,
}

impl MongoStore {
    pub async fn connect(config: StoreConfig) -> Result<Self> {
        let shared = match config.connection_mode {
            ConnectionMode::Pooled => Some(Connection::open(&config).await?),
            ConnectionMode::PerOperation => None,
        };

        info!(
            database = %config.database,
            collection = %config.collection,
            mode = ?config.connection_mode,
            "MongoDB store ready"
        );
        Ok(Self { config, shared })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    async fn with_connection<T, F, Fut>(&self, op: F) -> Result<T>
    where
        F: FnOnce(Connection) -> Fut + Send,
        Fut: Future<Output = Result<T>> + Send,
        T: Send,
    {
        match &self.shared {
            Some(connection) => op(connection.clone()).await,
            None => Connection::scoped(&self.config, op).await,
        }
    }

    async fn with_collection<T, F, Fut>(&self, op: F) -> Result<T>
    where
        F: FnOnce(Collection<Document>) -> Fut + Send,
        Fut: Future<Output = Result<T>> + Send,
        T: Send,
    {
        let name = self.config.collection.clone();
        self.with_connection(move |connection| op(connection.collection(&name)))
            .await
    }
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn insert_many(&self, documents: Vec<Document>) -> Result<Vec<Bson>> {
        // The server rejects an empty batch; nothing to send
        if documents.is_empty() {
            return Ok(Vec::new());
        }

        debug!(count = documents.len(), "insert_many");
        self.with_collection(|collection| async move {
            let result = collection.insert_many(documents).await?;
            let mut ids: Vec<(usize, Bson)> = result.inserted_ids.into_iter().collect();
            ids.sort_by_key(|(index, _)| *index);
            Ok(ids.into_iter().map(|(_, id)| id).collect())
        })
        .await
    }

    async fn find(&self, filter: Document, limit: Option<i64>) -> Result<Vec<Document>> {
        debug!(?filter, ?limit, "find");
        self.with_collection(|collection| async move {
            let mut find = collection.find(filter);
            if let Some(limit) = limit {
                find = find.limit(limit);
            }
            let cursor = find.await?;
            let documents: Vec<Document> = cursor.try_collect().await?;
            Ok(documents)
        })
        .await
    }

    async fn find_one(&self, filter: Document) -> Result<Option<Document>> {
        debug!(?filter, "find_one");
        self.with_collection(|collection| async move { Ok(collection.find_one(filter).await?) })
            .await
    }

    async fn insert_one(&self, document: Document) -> Result<Bson> {
        debug!("insert_one");
        self.with_collection(|collection| async move {
            Ok(collection.insert_one(document).await?.inserted_id)
        })
        .await
    }

    async fn find_one_and_replace(
        &self,
        filter: Document,
        replacement: Document,
    ) -> Result<Option<Document>> {
        debug!(?filter, "find_one_and_replace");
        self.with_collection(|collection| async move {
            Ok(collection.find_one_and_replace(filter, replacement).await?)
        })
        .await
    }

    async fn delete_one(&self, filter: Document) -> Result<u64> {
        debug!(?filter, "delete_one");
        self.with_collection(|collection| async move {
            Ok(collection.delete_one(filter).await?.deleted_count)
        })
        .await
    }

    async fn drop_database(&self) -> Result<()> {
        info!(database = %self.config.database, "dropping database");
        self.with_connection(|connection| async move {
            connection.database().drop().await?;
            Ok(())
        })
        .await
    }

    async fn list_databases(&self) -> Result<Vec<String>> {
        self.with_connection(|connection| async move {
            Ok(connection.client().list_database_names().await?)
        })
        .await
    }

    async fn close(&self) {
        if let Some(connection) = &self.shared {
            connection.clone().close().await;
            info!("MongoDB store closed");
        }
    }
}
