//! Typed results of write operations.

use docstore_driver::UpdateOutcome;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Result of [`Client::insert_one`](crate::Client::insert_one).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsertOneResult {
    /// `_id` of the stored document
    pub inserted_id: Value,
}

/// Result of [`Client::insert_many`](crate::Client::insert_many).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InsertManyResult {
    /// `_id`s of the stored documents, in input order
    pub inserted_ids: Vec<Value>,
}

/// Result of [`Client::upsert`](crate::Client::upsert).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpsertResult {
    /// Documents matched by the filter
    pub matched_count: u64,
    /// Documents changed
    pub modified_count: u64,
    /// Documents inserted because nothing matched (0 or 1)
    pub upserted_count: u64,
    /// `_id` of the inserted document
    pub upserted_id: Option<Value>,
}

impl UpsertResult {
    /// True when the call inserted a new document.
    pub fn inserted(&self) -> bool {
        self.upserted_count > 0
    }
}

impl From<UpdateOutcome> for UpsertResult {
    fn from(outcome: UpdateOutcome) -> Self {
        Self {
            matched_count: outcome.matched_count,
            modified_count: outcome.modified_count,
            upserted_count: outcome.upserted_count,
            upserted_id: outcome.upserted_id,
        }
    }
}

/// Result of [`Client::delete`](crate::Client::delete).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteResult {
    /// Documents removed
    pub deleted_count: u64,
}
