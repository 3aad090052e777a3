//! Driver interface for document stores.
//!
//! This crate describes what the docstore client needs from a document store
//! driver, and nothing more: collection handles that accept a filter, update
//! or document plus pass-through option values, and that report either a
//! document, a cursor, or mutation counts.

#![deny(unsafe_code)]
#![warn(missing_docs)]
//! # Architecture
//!
//! - **[`DocumentStore`]**: hands out collection handles and owns the connection
//! - **[`CollectionHandle`]**: CRUD primitives against one collection
//! - **[`DriverError`]**: store failures, with distinguishable
//!   `NoDocuments` and `DuplicateKey` conditions
//! - **[`memory::MemoryStore`]**: in-process backend, useful for tests and
//!   local development
//!
//! # Usage
//!
//! ```rust
//! use docstore_driver::{DocumentStore, memory::MemoryStore};
//! use serde_json::json;
//!
//! # async fn example() -> docstore_driver::Result<()> {
//! let store = MemoryStore::new();
//! let users = store.collection("app", "users");
//!
//! let doc = json!({"_id": "42", "name": "Ada"});
//! users.insert_one(doc.as_object().cloned().unwrap_or_default(), &[]).await?;
//!
//! let found = users.find_one(&json!({"_id": "42"}), &[]).await?;
//! assert_eq!(found["name"], "Ada");
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod memory;
pub mod options;
pub mod traits;

// Re-export commonly used types
pub use error::{DriverError, Result};
pub use memory::MemoryStore;
pub use options::{
    DeleteOptions, FindOneOptions, FindOptions, InsertManyOptions, InsertOneOptions,
    UpdateOptions,
};
pub use traits::{CollectionHandle, Document, DocumentStore, DocumentStream, UpdateOutcome};
