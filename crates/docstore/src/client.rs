//! Client façade over a document store
//!
//! Every operation follows the same path: validate the parameters, run the
//! store call through the client's [`RetryPolicy`] under the caller's
//! [`CallContext`], then translate driver failures into [`StoreError`] kinds.
//! Invalid parameters are rejected before the store is contacted.

use crate::config::ClientConfig;
use crate::context::CallContext;
use crate::decoder::Decoder;
use crate::error::{ConfigError, Result, StoreError};
use crate::observability::{OperationMetadata, OperationTimer};
use crate::params::{
    DeleteParams, FindManyParams, FindOneParams, InsertManyParams, InsertOneParams, Operation,
    UpsertParams,
};
use crate::results::{DeleteResult, InsertManyResult, InsertOneResult, UpsertResult};
use docstore_core::{RetryInterval, RetryPolicy};
use docstore_driver::{CollectionHandle, Document, DocumentStore, DriverError, UpdateOptions};
use serde::Serialize;
use serde_json::{Value, json};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{Instrument, debug, error, info_span};

/// Deadline for [`Client::close`].
const CLOSE_TIMEOUT: Duration = Duration::from_secs(10);

/// Handle over one store connection and one database.
///
/// Cloning is cheap and clones share the store handle. The client holds no
/// per-call state, so it can be used from many tasks at once.
///
/// # Example
///
/// ```rust
/// use docstore::{CallContext, Client, FindOneParams, InsertOneParams};
/// use docstore_driver::MemoryStore;
/// use serde::Deserialize;
/// use serde_json::json;
/// use std::sync::Arc;
///
/// #[derive(Deserialize)]
/// struct User {
///     name: String,
/// }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let client = Client::builder()
///     .store(Arc::new(MemoryStore::new()))
///     .database("app")
///     .build()?;
///
/// let ctx = CallContext::new();
/// client
///     .insert_one(&ctx, &json!({"_id": "u1", "name": "Ada"}), &InsertOneParams::new("users"))
///     .await?;
///
/// let user: User = client
///     .find_one(&ctx, &FindOneParams::new("users", json!({"_id": "u1"})))
///     .await?
///     .decode()
///     .await?;
/// assert_eq!(user.name, "Ada");
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    store: Arc<dyn DocumentStore>,
    config: ClientConfig,
    retry: RetryPolicy,
}

impl Client {
    /// Client for `database` with the default retry settings.
    pub fn new(
        store: Arc<dyn DocumentStore>,
        database: impl Into<String>,
    ) -> std::result::Result<Self, ConfigError> {
        Self::from_config(store, ClientConfig::new(database))
    }

    /// Create a new client builder for advanced configuration.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// Create a client from a configuration object.
    pub fn from_config(
        store: Arc<dyn DocumentStore>,
        config: ClientConfig,
    ) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        let retry = config.retry_policy();
        Ok(Self {
            inner: Arc::new(ClientInner {
                store,
                config,
                retry,
            }),
        })
    }

    /// Database every operation targets.
    pub fn database(&self) -> &str {
        &self.inner.config.database
    }

    /// Configuration the client was built from.
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Retry policy applied to every operation.
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.inner.retry
    }

    /// New call context using the configured call timeout.
    pub fn call_context(&self) -> CallContext {
        CallContext::with_timeout(self.inner.config.call_timeout)
    }

    /// Raw driver handle for `name` in the client's database.
    ///
    /// Calls made through the handle bypass validation and retries.
    pub fn collection(&self, name: &str) -> Arc<dyn CollectionHandle> {
        self.inner.store.collection(&self.inner.config.database, name)
    }

    /// Disconnect from the store.
    ///
    /// Runs under its own 10 second deadline. Failures are logged and
    /// returned; the client must not be used afterwards.
    pub async fn close(&self) -> Result<()> {
        let ctx = CallContext::with_timeout(CLOSE_TIMEOUT);
        let result = ctx
            .run(self.inner.store.disconnect())
            .await
            .and_then(|disconnected| disconnected.map_err(StoreError::from));

        match &result {
            Ok(()) => debug!(database = %self.database(), "Disconnected from document store"),
            Err(err) => error!(
                database = %self.database(),
                error = %err,
                "Failed to disconnect from document store"
            ),
        }
        result
    }

    /// Fetch the first document matching the filter.
    ///
    /// Fails with [`StoreError::NotFound`] when nothing matches.
    pub async fn find_one(&self, ctx: &CallContext, params: &FindOneParams) -> Result<Decoder> {
        let meta = OperationMetadata::new(Operation::FindOne, &params.collection);
        let filter = validated(&meta, params.validate())?;
        let collection = self.collection(&params.collection);
        let (collection, options) = (collection.as_ref(), params.additional_opts.as_slice());

        self.run(ctx, meta, || async move {
            collection
                .find_one(filter, options)
                .await
                .map(Decoder::document)
                .map_err(|err| match err {
                    DriverError::NoDocuments => StoreError::NotFound,
                    err => StoreError::Store(err),
                })
        })
        .await
    }

    /// Open a cursor over every document matching the filter.
    ///
    /// The returned decoder drains the cursor under `ctx`, so decode it
    /// before the context is dropped.
    pub async fn find_many(&self, ctx: &CallContext, params: &FindManyParams) -> Result<Decoder> {
        let meta = OperationMetadata::new(Operation::FindMany, &params.collection);
        let filter = validated(&meta, params.validate())?;
        let collection = self.collection(&params.collection);
        let (collection, options) = (collection.as_ref(), params.additional_opts.as_slice());

        let stream = self
            .run(ctx, meta, || async move {
                collection
                    .find(filter, options)
                    .await
                    .map_err(StoreError::from)
            })
            .await?;
        Ok(Decoder::cursor(stream, ctx.scope()))
    }

    /// Insert one document.
    ///
    /// Fails with [`StoreError::Collision`] when the document violates a
    /// unique index.
    pub async fn insert_one<D>(
        &self,
        ctx: &CallContext,
        document: &D,
        params: &InsertOneParams,
    ) -> Result<InsertOneResult>
    where
        D: Serialize + Sync,
    {
        let meta = OperationMetadata::new(Operation::InsertOne, &params.collection);
        validated(&meta, params.validate())?;
        let document = validated(&meta, to_document(document))?;
        let collection = self.collection(&params.collection);
        let (collection, document, options) = (
            collection.as_ref(),
            &document,
            params.additional_opts.as_slice(),
        );
        let name = params.collection.as_str();

        self.run(ctx, meta, || async move {
            collection
                .insert_one(document.clone(), options)
                .await
                .map(|inserted_id| InsertOneResult { inserted_id })
                .map_err(|err| insert_error(name, err))
        })
        .await
    }

    /// Insert several documents.
    ///
    /// Fails with [`StoreError::Collision`] when any document violates a
    /// unique index.
    pub async fn insert_many<D>(
        &self,
        ctx: &CallContext,
        documents: &[D],
        params: &InsertManyParams,
    ) -> Result<InsertManyResult>
    where
        D: Serialize + Sync,
    {
        let meta = OperationMetadata::new(Operation::InsertMany, &params.collection);
        validated(&meta, params.validate())?;
        let documents = validated(
            &meta,
            documents.iter().map(to_document).collect::<Result<Vec<_>>>(),
        )?;
        let collection = self.collection(&params.collection);
        let (collection, documents, options) = (
            collection.as_ref(),
            &documents,
            params.additional_opts.as_slice(),
        );
        let name = params.collection.as_str();

        self.run(ctx, meta, || async move {
            collection
                .insert_many(documents.clone(), options)
                .await
                .map(|inserted_ids| InsertManyResult { inserted_ids })
                .map_err(|err| insert_error(name, err))
        })
        .await
    }

    /// Update the first (or, with `multiple`, every) matching document,
    /// inserting one when nothing matches unless `upsert` is `Some(false)`.
    ///
    /// With `generic`, `update` is a plain field map applied as
    /// `{"$set": update}`; otherwise it is passed to the store as written.
    pub async fn upsert<U>(
        &self,
        ctx: &CallContext,
        update: &U,
        params: &UpsertParams,
    ) -> Result<UpsertResult>
    where
        U: Serialize + Sync,
    {
        let meta = OperationMetadata::new(Operation::Upsert, &params.collection);
        let filter = validated(&meta, params.validate())?;
        let update = validated(&meta, update_document(update, params.generic))?;

        let mut options = params.additional_opts.clone();
        options.push(UpdateOptions::new().upsert(params.upsert_enabled()));

        let collection = self.collection(&params.collection);
        let (collection, update, options) =
            (collection.as_ref(), &update, options.as_slice());
        let multiple = params.multiple;

        self.run(ctx, meta, || async move {
            let outcome = if multiple {
                collection.update_many(filter, update, options).await
            } else {
                collection.update_one(filter, update, options).await
            };
            outcome.map(UpsertResult::from).map_err(StoreError::from)
        })
        .await
    }

    /// Delete the first (or, with `multiple`, every) matching document.
    pub async fn delete(&self, ctx: &CallContext, params: &DeleteParams) -> Result<DeleteResult> {
        let meta = OperationMetadata::new(Operation::Delete, &params.collection);
        let filter = validated(&meta, params.validate())?;
        let collection = self.collection(&params.collection);
        let (collection, options) = (collection.as_ref(), params.additional_opts.as_slice());
        let multiple = params.multiple;

        self.run(ctx, meta, || async move {
            let deleted = if multiple {
                collection.delete_many(filter, options).await
            } else {
                collection.delete_one(filter, options).await
            };
            deleted
                .map(|deleted_count| DeleteResult { deleted_count })
                .map_err(StoreError::from)
        })
        .await
    }

    /// Run one operation's attempts through the retry policy under `ctx`.
    async fn run<T, F, Fut>(
        &self,
        ctx: &CallContext,
        meta: OperationMetadata,
        mut attempt: F,
    ) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let span = info_span!(
            "docstore_operation",
            operation = %meta.operation,
            collection = %meta.collection
        );

        async move {
            meta.log_start();
            let timer = OperationTimer::start();
            let mut attempts = 0u32;

            let outcome = ctx
                .run(self.inner.retry.execute(|| {
                    attempts += 1;
                    attempt()
                }))
                .await;
            let result = outcome.and_then(|retried| retried.map_err(StoreError::from));

            match &result {
                Ok(_) => meta.log_success(timer.elapsed(), attempts),
                Err(err) => meta.log_failure(timer.elapsed(), attempts, err),
            }
            result
        }
        .instrument(span)
        .await
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("database", &self.inner.config.database)
            .field("retry", &self.inner.retry)
            .finish_non_exhaustive()
    }
}

fn validated<T>(meta: &OperationMetadata, check: Result<T>) -> Result<T> {
    check.inspect_err(|err| meta.log_invalid(err))
}

fn insert_error(collection: &str, err: DriverError) -> StoreError {
    if err.is_duplicate_key() {
        StoreError::Collision {
            collection_name: collection.to_string(),
        }
    } else {
        StoreError::Store(err)
    }
}

fn to_document<D: Serialize>(value: &D) -> Result<Document> {
    match serde_json::to_value(value).map_err(|err| StoreError::Encode(err.to_string()))? {
        Value::Object(document) => Ok(document),
        other => Err(StoreError::Encode(format!(
            "documents must serialize to an object, got {other}"
        ))),
    }
}

fn update_document<U: Serialize>(update: &U, generic: bool) -> Result<Value> {
    let update = serde_json::to_value(update).map_err(|err| StoreError::Encode(err.to_string()))?;
    Ok(if generic { json!({ "$set": update }) } else { update })
}

/// Builder for creating a configured [`Client`].
#[derive(Default)]
pub struct ClientBuilder {
    store: Option<Arc<dyn DocumentStore>>,
    config: ClientConfig,
}

impl ClientBuilder {
    /// Set the document store.
    pub fn store(mut self, store: Arc<dyn DocumentStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the database name.
    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.config.database = database.into();
        self
    }

    /// Set the attempt budget per operation.
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.config.max_retries = max_retries;
        self
    }

    /// Set the substrings that make a store error retryable.
    pub fn retryable_errors<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config = self.config.with_retryable_errors(patterns);
        self
    }

    /// Set the deadline for [`Client::call_context`].
    pub fn call_timeout(mut self, timeout: Duration) -> Self {
        self.config.call_timeout = timeout;
        self
    }

    /// Set the delay policy between attempts.
    pub fn retry_interval(mut self, interval: RetryInterval) -> Self {
        self.config.retry_interval = interval;
        self
    }

    /// Wait between attempts instead of retrying immediately.
    pub fn sleep_between_attempts(mut self, enabled: bool) -> Self {
        self.config.sleep_between_attempts = enabled;
        self
    }

    /// Build the client with the configured options.
    pub fn build(self) -> std::result::Result<Client, ConfigError> {
        let store = self.store.ok_or(ConfigError::MissingStore)?;
        Client::from_config(store, self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use docstore_driver::MemoryStore;

    fn memory() -> Arc<dyn DocumentStore> {
        Arc::new(MemoryStore::new())
    }

    #[test]
    fn test_client_builder() {
        let client = Client::builder()
            .store(memory())
            .database("app")
            .max_retries(5)
            .retryable_errors(["connection reset"])
            .call_timeout(Duration::from_secs(30))
            .build()
            .unwrap();

        assert_eq!(client.database(), "app");
        assert_eq!(client.retry_policy().max_attempts(), 5);
        assert_eq!(client.config().call_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_builder_requires_store_and_database() {
        assert_matches!(
            Client::builder().database("app").build(),
            Err(ConfigError::MissingStore)
        );
        assert_matches!(
            Client::builder().store(memory()).build(),
            Err(ConfigError::MissingDatabase)
        );
    }

    #[test]
    fn test_client_defaults() {
        let client = Client::new(memory(), "app").unwrap();
        let policy = client.retry_policy();
        assert_eq!(policy.max_attempts(), 3);
        assert!(policy.classifier().is_empty());
        assert!(!policy.sleeps_between_attempts());
    }

    #[test]
    fn test_client_clone_shares_store() {
        let client1 = Client::new(memory(), "app").unwrap();
        let client2 = client1.clone();
        assert!(Arc::ptr_eq(&client1.inner, &client2.inner));
    }

    #[test]
    fn test_collection_accessor_targets_named_collection() {
        let client = Client::new(memory(), "app").unwrap();
        assert_eq!(client.collection("users").name(), "users");
    }

    #[test]
    fn test_generic_update_is_wrapped_in_set() {
        let wrapped = update_document(&json!({"name": "Ada"}), true).unwrap();
        assert_eq!(wrapped, json!({"$set": {"name": "Ada"}}));

        let raw = update_document(&json!({"$inc": {"visits": 1}}), false).unwrap();
        assert_eq!(raw, json!({"$inc": {"visits": 1}}));
    }

    #[test]
    fn test_non_object_document_is_encode_error() {
        assert_matches!(to_document(&42), Err(StoreError::Encode(_)));
        assert_matches!(to_document(&json!({"a": 1})), Ok(_));
    }

    #[tokio::test]
    async fn test_close_twice_reports_error() {
        let client = Client::new(memory(), "app").unwrap();
        assert!(client.close().await.is_ok());
        assert!(client.close().await.is_err());
    }
}
