//! Connection factory
//!
//! Opens a MongoDB client + database handle pair for the configured target
//! and tears it down again. The driver's `Client` is itself a pool, so a
//! long-lived `Connection` doubles as the process-wide pool.

use std::future::Future;

use mongodb::bson::{doc, Document};
use mongodb::options::ClientOptions;
use mongodb::{Client, Collection, Database};
use tracing::debug;

use crate::config::StoreConfig;
use crate::error::{Result, StoreError};

/// Client and database handle for one configured target
#[derive(Clone, Debug)]
pub struct Connection {
    client: Client,
    database: Database,
}

impl Connection {
    /// Connect and verify the target with a `ping`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Connection` if the URI does not parse, no server
    /// is selectable within the configured timeout, or authentication fails.
    pub async fn open(config: &StoreConfig) -> Result<Self> {
        let mut options = ClientOptions::parse(config.uri.as_str())
            .await
            .map_err(StoreError::connection)?;
        options.app_name = config.app_name.clone();
        options.max_pool_size = Some(config.max_pool_size);
        options.server_selection_timeout = Some(config.server_selection_timeout());

        let client = Client::with_options(options).map_err(StoreError::connection)?;
        let database = client.database(&config.database);

        // Client construction is lazy; ping so unreachable targets fail here
        if let Err(err) = database.run_command(doc! { "ping": 1 }).await {
            client.shutdown().await;
            return Err(StoreError::connection(err));
        }

        debug!(database = %config.database, "opened store connection");
        Ok(Self { client, database })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn collection(&self, name: &str) -> Collection<Document> {
        self.database.collection(name)
    }

    /// Shut the client down. Handles cloned from this connection stop working.
    pub async fn close(self) {
        let name = self.database.name().to_string();
        self.client.shutdown().await;
        debug!(database = %name, "closed store connection");
    }

    /// Open a connection, run `op` against it, and close it on every exit path.
    ///
    /// The operation's result is returned unchanged.
    pub async fn scoped<T, F, Fut>(config: &StoreConfig, op: F) -> Result<T>
    where
        F: FnOnce(Connection) -> Fut + Send,
        Fut: Future<Output = Result<T>> + Send,
        T: Send,
    {
        let connection = Self::open(config).await?;
        run_then_release(connection, op, Connection::close).await
    }
}

/// Run `op` on a clone of `conn`, then `release` it whatever `op` returned
async fn run_then_release<C, T, Op, OpFut, Release, ReleaseFut>(
    conn: C,
    op: Op,
    release: Release,
) -> Result<T>
where
    C: Clone,
    Op: FnOnce(C) -> OpFut,
    OpFut: Future<Output = Result<T>>,
    Release: FnOnce(C) -> ReleaseFut,
    ReleaseFut: Future<Output = ()>,
{
    let result = op(conn.clone()).await;
    release(conn).await;
    result
}
