//! Record, identifier and filter types
//!
//! Records are schema-less BSON documents. `CirculationRecord` is an
//! optional typed view over the conventional circulation fields.

use std::fmt;
use std::str::FromStr;

use mongodb::bson::{self, doc, oid::ObjectId, Bson, Document};
use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};

/// One schema-less document in the collection
pub type Record = Document;

/// Field name to expected value; a record matches when every field is equal
pub type Filter = Document;

/// Field holding the store-assigned identifier
pub const ID_FIELD: &str = "_id";

/// Record identifier as assigned by the store.
///
/// Usually a generated `ObjectId`; a caller-supplied `_id` of any other BSON
/// type is carried as-is. Identifier strings parse only as `ObjectId`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(Bson);

impl RecordId {
    /// The `ObjectId`, when the store generated one
    pub fn object_id(&self) -> Option<ObjectId> {
        match &self.0 {
            Bson::ObjectId(oid) => Some(*oid),
            _ => None,
        }
    }

    pub fn as_bson(&self) -> &Bson {
        &self.0
    }

    /// Filter selecting exactly this record
    pub fn filter(&self) -> Filter {
        doc! { ID_FIELD: self.0.clone() }
    }

    /// Identifier of a stored record
    pub fn of(record: &Record) -> Option<Self> {
        record.get(ID_FIELD).cloned().map(Self)
    }
}

impl From<ObjectId> for RecordId {
    fn from(oid: ObjectId) -> Self {
        Self(Bson::ObjectId(oid))
    }
}

impl From<Bson> for RecordId {
    fn from(value: Bson) -> Self {
        Self(value)
    }
}

impl From<RecordId> for Bson {
    fn from(id: RecordId) -> Self {
        id.0
    }
}

impl FromStr for RecordId {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self> {
        ObjectId::parse_str(s)
            .map(Self::from)
            .map_err(|_| StoreError::invalid_identifier(s))
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Bson::ObjectId(oid) => f.write_str(&oid.to_hex()),
            Bson::String(s) => f.write_str(s),
            other => write!(f, "{}", other),
        }
    }
}

/// Outcome of a bulk load
#[derive(Debug, Clone, PartialEq)]
pub struct LoadResult {
    pub inserted_count: usize,
    /// Stored identifiers, in input order
    pub ids: Vec<RecordId>,
}

/// Typed view of one newspaper's circulation statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CirculationRecord {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,

    #[serde(rename = "Newspaper")]
    pub newspaper: String,

    #[serde(rename = "Daily Circulation, 2004")]
    pub daily_circulation_2004: i64,

    #[serde(rename = "Daily Circulation, 2013")]
    pub daily_circulation_2013: i64,

    /// Percent change
    #[serde(rename = "Change in Daily Circulation, 2004-2013")]
    pub change_2004_2013: i64,

    #[serde(rename = "Pulitzer Prize Winners and Finalists, 1990-2003")]
    pub pulitzers_1990_2003: i64,

    #[serde(rename = "Pulitzer Prize Winners and Finalists, 2004-2014")]
    pub pulitzers_2004_2014: i64,

    #[serde(rename = "Pulitzer Prize Winners and Finalists, 1990-2014")]
    pub pulitzers_1990_2014: i64,
}

impl CirculationRecord {
    pub fn to_record(&self) -> Result<Record> {
        Ok(bson::to_document(self)?)
    }

    pub fn from_record(record: &Record) -> Result<Self> {
        Ok(bson::from_document(record.clone())?)
    }
}
