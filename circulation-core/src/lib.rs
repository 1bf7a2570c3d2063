pub mod config;
pub mod error;
pub mod record;
pub mod repo;
pub mod store;

pub use config::{ConnectionMode, StoreConfig};
pub use error::{Result, StoreError};
pub use record::{CirculationRecord, Filter, LoadResult, Record, RecordId, ID_FIELD};
pub use repo::CirculationRepo;
pub use store::{Connection, DocumentStore, MemoryStore, MongoStore};

/// Re-exported so callers build records and filters with the same `bson` version
pub use mongodb::bson;
