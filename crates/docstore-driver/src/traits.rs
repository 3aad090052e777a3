//! Store and collection traits
//!
//! Defines what a driver must provide so the client can run operations
//! against it.

use crate::error::Result;
use crate::options::{
    DeleteOptions, FindOneOptions, FindOptions, InsertManyOptions, InsertOneOptions,
    UpdateOptions,
};
use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// A stored document: a JSON object keyed by field name
pub type Document = serde_json::Map<String, Value>;

/// Cursor over the documents matched by a multi-document read
///
/// Items arrive in store-return order.
pub type DocumentStream = BoxStream<'static, Result<Document>>;

/// Counts reported by an update
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateOutcome {
    /// Documents matched by the filter
    pub matched_count: u64,

    /// Documents actually changed
    pub modified_count: u64,

    /// Documents inserted because nothing matched
    pub upserted_count: u64,

    /// `_id` of the inserted document, if any
    pub upserted_id: Option<Value>,
}

/// CRUD primitives against a single collection
///
/// Filters and updates are opaque JSON values interpreted by the driver.
/// Option slices are passed through as the caller supplied them.
#[async_trait]
pub trait CollectionHandle: Send + Sync {
    /// Collection name
    fn name(&self) -> &str;

    /// Fetch the first matching document, or `DriverError::NoDocuments`
    async fn find_one(&self, filter: &Value, options: &[FindOneOptions]) -> Result<Document>;

    /// Open a cursor over all matching documents
    async fn find(&self, filter: &Value, options: &[FindOptions]) -> Result<DocumentStream>;

    /// Insert one document, returning its `_id`
    async fn insert_one(&self, document: Document, options: &[InsertOneOptions]) -> Result<Value>;

    /// Insert several documents, returning their `_id`s in input order
    async fn insert_many(
        &self,
        documents: Vec<Document>,
        options: &[InsertManyOptions],
    ) -> Result<Vec<Value>>;

    /// Update the first matching document
    async fn update_one(
        &self,
        filter: &Value,
        update: &Value,
        options: &[UpdateOptions],
    ) -> Result<UpdateOutcome>;

    /// Update every matching document
    async fn update_many(
        &self,
        filter: &Value,
        update: &Value,
        options: &[UpdateOptions],
    ) -> Result<UpdateOutcome>;

    /// Delete the first matching document, returning the number deleted
    async fn delete_one(&self, filter: &Value, options: &[DeleteOptions]) -> Result<u64>;

    /// Delete every matching document, returning the number deleted
    async fn delete_many(&self, filter: &Value, options: &[DeleteOptions]) -> Result<u64>;
}

/// A connected document store
///
/// Implementations are shared across concurrent calls and must do their own
/// internal synchronization.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Handle to `collection` in `database`
    fn collection(&self, database: &str, collection: &str) -> Arc<dyn CollectionHandle>;

    /// Close the underlying connection
    async fn disconnect(&self) -> Result<()>;
}
