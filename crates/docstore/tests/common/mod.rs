//! Shared fixtures for the integration tests.

#![allow(dead_code)]

pub mod faulty_store;

use docstore::Client;
use faulty_store::FaultyStore;
use std::sync::Arc;

/// Database used by every fixture client
pub const DATABASE: &str = "kickback";

/// Client over `store` with the default retry settings
pub fn client(store: &FaultyStore) -> Client {
    Client::new(Arc::new(store.clone()), DATABASE).expect("valid client config")
}

/// Client over `store` that retries errors containing any of `patterns`
pub fn retrying_client(store: &FaultyStore, patterns: &[&str]) -> Client {
    Client::builder()
        .store(Arc::new(store.clone()))
        .database(DATABASE)
        .retryable_errors(patterns.iter().copied())
        .build()
        .expect("valid client config")
}
