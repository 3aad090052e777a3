//! # docstore
//!
//! Retrying, validated data access for document stores:
//! - Uniform CRUD operations: find one, find many, insert one, insert many,
//!   upsert and delete
//! - Parameter validation before any store call
//! - Bounded retries with a configurable list of retryable error substrings
//! - Per-call cancellation and deadlines via [`CallContext`]
//! - Deferred decoding of single documents and cursors via [`Decoder`]
//! - Stable error kinds ([`StoreError`]) for not-found, collisions, invalid
//!   parameters and exhausted retries
//!
//! The store itself is any implementation of
//! [`DocumentStore`](docstore_driver::DocumentStore); the in-memory
//! [`MemoryStore`](docstore_driver::MemoryStore) ships with the driver crate.
//!
//! ## Quick Start
//!
//! ```rust
//! use docstore::{CallContext, Client, FindManyParams, InsertManyParams, UpsertParams};
//! use docstore_driver::MemoryStore;
//! use serde::{Deserialize, Serialize};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! #[derive(Debug, Serialize, Deserialize)]
//! struct Guest {
//!     name: String,
//!     rsvp: bool,
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::builder()
//!     .store(Arc::new(MemoryStore::new()))
//!     .database("events")
//!     .retryable_errors(["connection reset"])
//!     .build()?;
//!
//! let ctx = CallContext::new();
//! let guests = [
//!     Guest { name: "Ada".into(), rsvp: false },
//!     Guest { name: "Grace".into(), rsvp: true },
//! ];
//! client
//!     .insert_many(&ctx, &guests, &InsertManyParams::new("guests"))
//!     .await?;
//!
//! let update = UpsertParams::new("guests", json!({"name": "Ada"})).generic(true);
//! client.upsert(&ctx, &json!({"rsvp": true}), &update).await?;
//!
//! let confirmed: Vec<Guest> = client
//!     .find_many(&ctx, &FindManyParams::new("guests", json!({"rsvp": true})))
//!     .await?
//!     .decode()
//!     .await?;
//! assert_eq!(confirmed.len(), 2);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// Re-export commonly used types
pub use client::{Client, ClientBuilder};
pub use config::ClientConfig;
pub use context::{CallContext, DEFAULT_CALL_TIMEOUT};
pub use decoder::{CursorDecoder, Decoder, DocumentDecoder};
pub use error::{ConfigError, Result, StoreError};
pub use params::{
    DeleteParams, FindManyParams, FindOneParams, InsertManyParams, InsertOneParams, Operation,
    UpsertParams,
};
pub use results::{DeleteResult, InsertManyResult, InsertOneResult, UpsertResult};

pub use docstore_core::{RetryInterval, RetryPolicy};
pub use docstore_driver::{
    DeleteOptions, DriverError, FindOneOptions, FindOptions, InsertManyOptions, InsertOneOptions,
    UpdateOptions,
};

// Module declarations
pub mod client;
pub mod config;
pub mod context;
pub mod decoder;
pub mod error;
pub mod observability;
pub mod params;
pub mod results;

#[cfg(feature = "trace")]
pub use observability::init_tracing;
