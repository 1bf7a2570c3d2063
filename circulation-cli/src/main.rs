//! circulation - end-to-end driver for the circulation record store
//!
//! Loads the newspaper circulation dataset into MongoDB, runs every
//! repository operation with checks, then drops the database:
//! - failures are logged, not turned into a non-zero exit status
//! - teardown runs whether or not the scenario passed, and is still
//!   attempted when the initial connection fails

use std::path::PathBuf;

use anyhow::Result;
use circulation_core::{CirculationRepo, ConnectionMode, StoreConfig};
use clap::Parser;
use tracing::{error, info, warn};

mod dataset;
mod scenario;
mod tracing_setup;

use tracing_setup::TracingConfig;

#[derive(Parser, Debug)]
#[command(
    name = "circulation",
    author,
    version,
    about = "Exercise the newspaper circulation store against a live MongoDB",
    long_about = "Bulk-load the circulation dataset, run find/insert/replace/delete against it \
                  with checks, and drop the database afterwards. Connection settings come from \
                  ~/.circulation/config.toml, MONGODB_URI / CIRCULATION_DATABASE / \
                  CIRCULATION_COLLECTION, and the flags below, in increasing precedence."
)]
struct Cli {
    /// Store config file (default: ~/.circulation/config.toml when present)
    #[arg(long, value_name = "PATH", env = "CIRCULATION_CONFIG")]
    config: Option<PathBuf>,

    /// MongoDB connection string
    #[arg(long, value_name = "URI")]
    uri: Option<String>,

    /// Database to load into (dropped afterwards)
    #[arg(long, value_name = "NAME")]
    database: Option<String>,

    /// Collection holding the records
    #[arg(long, value_name = "NAME")]
    collection: Option<String>,

    /// JSON array of records to bulk-load (default: bundled circulation dataset)
    #[arg(long = "data", value_name = "PATH", env = "CIRCULATION_DATA")]
    data: Option<PathBuf>,

    /// Open and close a connection around every operation instead of sharing one
    #[arg(long)]
    per_operation: bool,

    /// Leave the database in place after the run
    #[arg(long)]
    keep_database: bool,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

impl Cli {
    fn store_config(&self) -> Result<StoreConfig> {
        let mut config = StoreConfig::load(self.config.as_deref())?;

        if let Some(uri) = &self.uri {
            config.uri = uri.clone();
        }
        if let Some(database) = &self.database {
            config.database = database.clone();
        }
        if let Some(collection) = &self.collection {
            config.collection = collection.clone();
        }
        if self.per_operation {
            config.connection_mode = ConnectionMode::PerOperation;
        }

        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    tracing_setup::init_tracing(&TracingConfig { debug: cli.debug }).ok();

    let config = cli.store_config()?;
    info!(
        "using database {:?}, collection {:?} ({:?})",
        config.database, config.collection, config.connection_mode
    );

    let repo = match CirculationRepo::connect(config.clone()).await {
        Ok(repo) => repo,
        Err(err) => {
            error!("{}", err);
            teardown_without_shared_connection(config, cli.keep_database).await;
            return Ok(());
        }
    };

    let outcome = match dataset::load(cli.data.as_deref()) {
        Ok(records) => scenario::run(&repo, records).await,
        Err(err) => Err(err),
    };
    match outcome {
        Ok(()) => info!("all checks passed"),
        Err(err) => error!("scenario failed: {:#}", err),
    }

    teardown(&repo, cli.keep_database).await;
    repo.close().await;
    Ok(())
}

/// Drop the database (unless kept) and log what remains on the server
async fn teardown(repo: &CirculationRepo, keep_database: bool) {
    let store = repo.store();

    if keep_database {
        info!("keeping database (--keep-database)");
    } else if let Err(err) = store.drop_database().await {
        error!("failed to drop database: {}", err);
    }

    match store.list_databases().await {
        Ok(names) => info!("databases on server: {}", names.join(", ")),
        Err(err) => warn!("failed to list databases: {}", err),
    }
}

/// Teardown after the shared connection could not be opened.
///
/// Each teardown step opens its own connection, so a store that became
/// reachable in the meantime is still cleaned up.
async fn teardown_without_shared_connection(config: StoreConfig, keep_database: bool) {
    let config = StoreConfig {
        connection_mode: ConnectionMode::PerOperation,
        ..config
    };
    match CirculationRepo::connect(config).await {
        Ok(repo) => {
            teardown(&repo, keep_database).await;
            repo.close().await;
        }
        Err(err) => warn!("skipping teardown: {}", err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use circulation_core::bson::doc;
    use circulation_core::MemoryStore;
    use std::sync::Arc;

    #[test]
    fn flags_override_config() {
        let cli = Cli::parse_from([
            "circulation",
            "--config",
            "/nonexistent/config.toml",
            "--per-operation",
        ]);
        // explicit config path must exist
        assert!(cli.store_config().is_err());

        let cli = Cli {
            config: None,
            uri: Some("mongodb://db.internal:27017".to_string()),
            database: Some("circulation_ci".to_string()),
            collection: None,
            data: None,
            per_operation: true,
            keep_database: false,
            debug: false,
        };
        let resolved = cli.store_config().unwrap();
        assert_eq!(resolved.uri, "mongodb://db.internal:27017");
        assert_eq!(resolved.database, "circulation_ci");
        assert_eq!(resolved.connection_mode, ConnectionMode::PerOperation);
    }

    #[tokio::test]
    async fn teardown_drops_unless_kept() {
        let store = Arc::new(MemoryStore::new("circulation"));
        let repo = CirculationRepo::new(store.clone());
        repo.add(doc! { "Newspaper": "A" }).await.unwrap();

        teardown(&repo, true).await;
        assert_eq!(store.len().await, 1);

        teardown(&repo, false).await;
        assert!(store.is_empty().await);
    }
}
