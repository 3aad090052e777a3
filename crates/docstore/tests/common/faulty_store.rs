//! Fault-injecting store for testing retry and error handling
//!
//! Wraps a [`MemoryStore`] and lets a test script driver errors for the next
//! calls, make every call fail, or slow every call down. All collection calls
//! are counted so tests can assert how many attempts reached the store.

use async_trait::async_trait;
use docstore_driver::{
    CollectionHandle, DeleteOptions, Document, DocumentStore, DocumentStream, DriverError,
    FindOneOptions, FindOptions, InsertManyOptions, InsertOneOptions, MemoryStore, Result,
    UpdateOptions, UpdateOutcome,
};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
struct FaultState {
    /// Errors returned by the next calls, one per call
    scripted: Mutex<VecDeque<DriverError>>,

    /// Error returned once the script runs out
    sticky: Mutex<Option<DriverError>>,

    /// Delay applied before every call
    delay: Mutex<Option<Duration>>,

    /// Collection calls seen so far
    calls: AtomicU32,
}

impl FaultState {
    async fn before_call(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(err) = self.scripted.lock().unwrap().pop_front() {
            return Err(err);
        }
        match self.sticky.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// A store whose calls can be made to fail on demand
///
/// Clones share the same data, script and counters.
#[derive(Clone, Default)]
pub struct FaultyStore {
    memory: MemoryStore,
    state: Arc<FaultState>,
}

impl FaultyStore {
    /// Create a store that behaves like an empty [`MemoryStore`]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next calls with `errors`, in order
    pub fn fail_next(&self, errors: impl IntoIterator<Item = DriverError>) {
        self.state.scripted.lock().unwrap().extend(errors);
    }

    /// Fail every call with `error` once the script runs out
    pub fn fail_always(&self, error: DriverError) {
        *self.state.sticky.lock().unwrap() = Some(error);
    }

    /// Wait `delay` before every call
    pub fn delay_calls(&self, delay: Duration) {
        *self.state.delay.lock().unwrap() = Some(delay);
    }

    /// Number of collection calls made so far
    pub fn calls(&self) -> u32 {
        self.state.calls.load(Ordering::SeqCst)
    }

    /// Forget the call count
    pub fn reset_calls(&self) {
        self.state.calls.store(0, Ordering::SeqCst);
    }

    /// The backing in-memory store
    pub fn memory(&self) -> &MemoryStore {
        &self.memory
    }
}

#[async_trait]
impl DocumentStore for FaultyStore {
    fn collection(&self, database: &str, collection: &str) -> Arc<dyn CollectionHandle> {
        Arc::new(FaultyCollection {
            inner: self.memory.collection(database, collection),
            state: Arc::clone(&self.state),
        })
    }

    async fn disconnect(&self) -> Result<()> {
        self.memory.disconnect().await
    }
}

struct FaultyCollection {
    inner: Arc<dyn CollectionHandle>,
    state: Arc<FaultState>,
}

#[async_trait]
impl CollectionHandle for FaultyCollection {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn find_one(&self, filter: &Value, options: &[FindOneOptions]) -> Result<Document> {
        self.state.before_call().await?;
        self.inner.find_one(filter, options).await
    }

    async fn find(&self, filter: &Value, options: &[FindOptions]) -> Result<DocumentStream> {
        self.state.before_call().await?;
        self.inner.find(filter, options).await
    }

    async fn insert_one(&self, document: Document, options: &[InsertOneOptions]) -> Result<Value> {
        self.state.before_call().await?;
        self.inner.insert_one(document, options).await
    }

    async fn insert_many(
        &self,
        documents: Vec<Document>,
        options: &[InsertManyOptions],
    ) -> Result<Vec<Value>> {
        self.state.before_call().await?;
        self.inner.insert_many(documents, options).await
    }

    async fn update_one(
        &self,
        filter: &Value,
        update: &Value,
        options: &[UpdateOptions],
    ) -> Result<UpdateOutcome> {
        self.state.before_call().await?;
        self.inner.update_one(filter, update, options).await
    }

    async fn update_many(
        &self,
        filter: &Value,
        update: &Value,
        options: &[UpdateOptions],
    ) -> Result<UpdateOutcome> {
        self.state.before_call().await?;
        self.inner.update_many(filter, update, options).await
    }

    async fn delete_one(&self, filter: &Value, options: &[DeleteOptions]) -> Result<u64> {
        self.state.before_call().await?;
        self.inner.delete_one(filter, options).await
    }

    async fn delete_many(&self, filter: &Value, options: &[DeleteOptions]) -> Result<u64> {
        self.state.before_call().await?;
        self.inner.delete_many(filter, options).await
    }
}
