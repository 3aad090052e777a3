//! In-memory document store
//!
//! Keeps every collection as a vector of documents behind an async lock.
//! Nothing is persisted. Meant for tests, examples and local development.
//!
//! # Behavior
//!
//! - `_id` is unique per collection; inserts without one get a UUID string
//! - filters and updates follow the subset documented in the `query` and
//!   `update` submodules
//! - option `comment`s are attached to the trace event of each call
//! - upserts seed the new document from the filter's equality fields
//! - after [`DocumentStore::disconnect`] every call fails with
//!   `DriverError::Disconnected`

mod query;
mod update;

use crate::error::{DriverError, Result};
use crate::options::{
    DeleteOptions, FindOneOptions, FindOptions, InsertManyOptions, InsertOneOptions,
    UpdateOptions,
};
use crate::traits::{CollectionHandle, Document, DocumentStore, DocumentStream, UpdateOutcome};
use async_trait::async_trait;
use futures::StreamExt;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use tracing::{debug, trace};
use update::Update;

type Namespaces = Arc<RwLock<HashMap<String, Vec<Document>>>>;

/// In-process document store
///
/// Cloning is cheap and clones share the same data.
///
/// # Example
///
/// ```rust
/// use docstore_driver::{DocumentStore, memory::MemoryStore};
/// use serde_json::json;
///
/// # async fn example() -> docstore_driver::Result<()> {
/// let store = MemoryStore::new();
/// let events = store.collection("app", "events");
///
/// let outcome = events
///     .update_one(
///         &json!({"kind": "signup"}),
///         &json!({"$inc": {"count": 1}}),
///         &[docstore_driver::UpdateOptions::new().upsert(true)],
///     )
///     .await?;
/// assert_eq!(outcome.upserted_count, 1);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    namespaces: Namespaces,
    disconnected: Arc<AtomicBool>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents currently stored in `database.collection`
    pub async fn count(&self, database: &str, collection: &str) -> usize {
        self.namespaces
            .read()
            .await
            .get(&namespace(database, collection))
            .map_or(0, Vec::len)
    }

    /// Whether `disconnect` has been called
    pub fn is_disconnected(&self) -> bool {
        self.disconnected.load(Ordering::SeqCst)
    }
}

fn namespace(database: &str, collection: &str) -> String {
    format!("{database}.{collection}")
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn collection(&self, database: &str, collection: &str) -> Arc<dyn CollectionHandle> {
        Arc::new(MemoryCollection {
            name: collection.to_string(),
            namespace: namespace(database, collection),
            namespaces: Arc::clone(&self.namespaces),
            disconnected: Arc::clone(&self.disconnected),
        })
    }

    async fn disconnect(&self) -> Result<()> {
        if self.disconnected.swap(true, Ordering::SeqCst) {
            return Err(DriverError::Disconnected);
        }
        debug!("memory store disconnected");
        Ok(())
    }
}

/// Handle to one collection of a [`MemoryStore`]
#[derive(Debug, Clone)]
pub struct MemoryCollection {
    name: String,
    namespace: String,
    namespaces: Namespaces,
    disconnected: Arc<AtomicBool>,
}

impl MemoryCollection {
    fn traced(&self, operation: &'static str, comment: Option<&str>) {
        trace!(namespace = %self.namespace, operation, comment, "memory operation");
    }

    fn ensure_connected(&self) -> Result<()> {
        if self.disconnected.load(Ordering::SeqCst) {
            Err(DriverError::Disconnected)
        } else {
            Ok(())
        }
    }

    fn duplicate(&self, id: &Value) -> DriverError {
        DriverError::DuplicateKey {
            namespace: self.namespace.clone(),
            index: "_id_".to_string(),
            key: format!("{{ _id: {id} }}"),
        }
    }

    async fn matching(&self, filter: &Value) -> Result<Vec<Document>> {
        let namespaces = self.namespaces.read().await;
        let mut found = Vec::new();
        for document in namespaces.get(&self.namespace).into_iter().flatten() {
            if query::matches(document, filter)? {
                found.push(document.clone());
            }
        }
        Ok(found)
    }

    /// Insert into `documents`, assigning `_id` when missing
    fn insert_into(&self, documents: &mut Vec<Document>, mut document: Document) -> Result<Value> {
        let id = document
            .entry("_id".to_string())
            .or_insert_with(|| Value::String(uuid::Uuid::new_v4().to_string()))
            .clone();
        if documents.iter().any(|d| d.get("_id") == Some(&id)) {
            return Err(self.duplicate(&id));
        }
        documents.push(document);
        Ok(id)
    }

    async fn update(
        &self,
        filter: &Value,
        update: &Value,
        options: &[UpdateOptions],
        multiple: bool,
    ) -> Result<UpdateOutcome> {
        self.ensure_connected()?;
        let parsed = Update::parse(update)?;
        let options = UpdateOptions::merged(options);
        let upsert = options.upsert.unwrap_or(false);

        let mut namespaces = self.namespaces.write().await;
        let documents = namespaces.entry(self.namespace.clone()).or_default();

        let mut outcome = UpdateOutcome::default();
        for document in documents.iter_mut() {
            if !query::matches(document, filter)? {
                continue;
            }
            outcome.matched_count += 1;
            let mut candidate = document.clone();
            if parsed.apply(&mut candidate)? {
                *document = candidate;
                outcome.modified_count += 1;
            }
            if !multiple {
                break;
            }
        }

        if outcome.matched_count == 0 && upsert {
            let mut seeded = query::equality_fields(filter);
            if let Update::Replacement(_) = parsed {
                let id = seeded.remove("_id");
                seeded = Document::new();
                if let Some(id) = id {
                    seeded.insert("_id".to_string(), id);
                }
            }
            parsed.apply(&mut seeded)?;
            let id = self.insert_into(documents, seeded)?;
            outcome.upserted_count = 1;
            outcome.upserted_id = Some(id);
        }

        trace!(
            namespace = %self.namespace,
            comment = options.comment.as_deref(),
            matched = outcome.matched_count,
            modified = outcome.modified_count,
            upserted = outcome.upserted_count,
            "memory update"
        );
        Ok(outcome)
    }

    async fn delete(
        &self,
        filter: &Value,
        options: &[DeleteOptions],
        multiple: bool,
    ) -> Result<u64> {
        self.ensure_connected()?;
        let operation = if multiple { "delete_many" } else { "delete_one" };
        self.traced(operation, DeleteOptions::merged(options).comment.as_deref());
        let mut namespaces = self.namespaces.write().await;
        let Some(documents) = namespaces.get_mut(&self.namespace) else {
            return Ok(0);
        };

        let mut deleted = 0;
        let mut index = 0;
        while index < documents.len() {
            if query::matches(&documents[index], filter)? {
                documents.remove(index);
                deleted += 1;
                if !multiple {
                    break;
                }
            } else {
                index += 1;
            }
        }
        Ok(deleted)
    }
}

#[async_trait]
impl CollectionHandle for MemoryCollection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn find_one(&self, filter: &Value, options: &[FindOneOptions]) -> Result<Document> {
        self.ensure_connected()?;
        let options = FindOneOptions::merged(options);
        self.traced("find_one", options.comment.as_deref());
        let mut found = self.matching(filter).await?;
        if let Some(sort) = &options.sort {
            query::sort_documents(&mut found, sort)?;
        }
        let skip = usize::try_from(options.skip.unwrap_or(0)).unwrap_or(usize::MAX);
        found.into_iter().nth(skip).ok_or(DriverError::NoDocuments)
    }

    async fn find(&self, filter: &Value, options: &[FindOptions]) -> Result<DocumentStream> {
        self.ensure_connected()?;
        let options = FindOptions::merged(options);
        self.traced("find", options.comment.as_deref());
        let mut found = self.matching(filter).await?;
        if let Some(sort) = &options.sort {
            query::sort_documents(&mut found, sort)?;
        }
        let skip = usize::try_from(options.skip.unwrap_or(0)).unwrap_or(usize::MAX);
        let limit = options
            .limit
            .filter(|l| *l > 0)
            .map_or(usize::MAX, |l| usize::try_from(l).unwrap_or(usize::MAX));
        let documents: Vec<Document> = found.into_iter().skip(skip).take(limit).collect();
        Ok(futures::stream::iter(documents.into_iter().map(Ok)).boxed())
    }

    async fn insert_one(&self, document: Document, options: &[InsertOneOptions]) -> Result<Value> {
        self.ensure_connected()?;
        self.traced("insert_one", InsertOneOptions::merged(options).comment.as_deref());
        let mut namespaces = self.namespaces.write().await;
        let documents = namespaces.entry(self.namespace.clone()).or_default();
        self.insert_into(documents, document)
    }

    async fn insert_many(
        &self,
        documents: Vec<Document>,
        options: &[InsertManyOptions],
    ) -> Result<Vec<Value>> {
        self.ensure_connected()?;
        let options = InsertManyOptions::merged(options);
        self.traced("insert_many", options.comment.as_deref());
        let ordered = options.ordered.unwrap_or(true);
        let mut namespaces = self.namespaces.write().await;
        let stored = namespaces.entry(self.namespace.clone()).or_default();

        let mut ids = Vec::with_capacity(documents.len());
        let mut first_error = None;
        for document in documents {
            match self.insert_into(stored, document) {
                Ok(id) => ids.push(id),
                Err(err) if ordered => return Err(err),
                Err(err) => {
                    first_error.get_or_insert(err);
                }
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(ids),
        }
    }

    async fn update_one(
        &self,
        filter: &Value,
        update: &Value,
        options: &[UpdateOptions],
    ) -> Result<UpdateOutcome> {
        self.update(filter, update, options, false).await
    }

    async fn update_many(
        &self,
        filter: &Value,
        update: &Value,
        options: &[UpdateOptions],
    ) -> Result<UpdateOutcome> {
        self.update(filter, update, options, true).await
    }

    async fn delete_one(&self, filter: &Value, options: &[DeleteOptions]) -> Result<u64> {
        self.delete(filter, options, false).await
    }

    async fn delete_many(&self, filter: &Value, options: &[DeleteOptions]) -> Result<u64> {
        self.delete(filter, options, true).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap_or_default()
    }

    async fn seeded() -> (MemoryStore, Arc<dyn CollectionHandle>) {
        let store = MemoryStore::new();
        let users = store.collection("app", "users");
        users
            .insert_many(
                vec![
                    doc(json!({"_id": "1", "name": "Ada", "age": 36})),
                    doc(json!({"_id": "2", "name": "Grace", "age": 85})),
                    doc(json!({"_id": "3", "name": "Alan", "age": 41})),
                ],
                &[],
            )
            .await
            .unwrap();
        (store, users)
    }

    #[tokio::test]
    async fn test_find_one_and_not_found() {
        let (_store, users) = seeded().await;

        let ada = users.find_one(&json!({"name": "Ada"}), &[]).await.unwrap();
        assert_eq!(ada["_id"], "1");

        let missing = users.find_one(&json!({"name": "Linus"}), &[]).await;
        assert_eq!(missing.unwrap_err(), DriverError::NoDocuments);
    }

    #[tokio::test]
    async fn test_find_preserves_insertion_order() {
        let (_store, users) = seeded().await;

        let docs: Vec<Document> = users
            .find(&json!({}), &[])
            .await
            .unwrap()
            .try_collect()
            .await
            .unwrap();
        let ids: Vec<_> = docs.iter().map(|d| d["_id"].clone()).collect();
        assert_eq!(ids, vec![json!("1"), json!("2"), json!("3")]);
    }

    #[tokio::test]
    async fn test_find_sort_skip_limit() {
        let (_store, users) = seeded().await;

        let opts = [FindOptions::new().sort(json!({"age": -1})).skip(1).limit(1)];
        let docs: Vec<Document> = users
            .find(&json!({}), &opts)
            .await
            .unwrap()
            .try_collect()
            .await
            .unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0]["name"], "Alan");
    }

    #[tokio::test]
    async fn test_insert_assigns_id_and_rejects_duplicates() {
        let (store, users) = seeded().await;

        let id = users.insert_one(doc(json!({"name": "Linus"})), &[]).await.unwrap();
        assert!(id.is_string());

        let err = users
            .insert_one(doc(json!({"_id": "1", "name": "Again"})), &[])
            .await
            .unwrap_err();
        assert!(err.is_duplicate_key());
        assert!(err.to_string().contains("app.users"));
        assert_eq!(store.count("app", "users").await, 4);
    }

    #[tokio::test]
    async fn test_unordered_insert_many_keeps_going() {
        let (store, users) = seeded().await;

        let result = users
            .insert_many(
                vec![
                    doc(json!({"_id": "1"})),
                    doc(json!({"_id": "9"})),
                ],
                &[InsertManyOptions::default().ordered(false)],
            )
            .await;
        assert!(result.unwrap_err().is_duplicate_key());
        assert_eq!(store.count("app", "users").await, 4);
    }

    #[tokio::test]
    async fn test_update_many_counts() {
        let (_store, users) = seeded().await;

        let outcome = users
            .update_many(
                &json!({"age": {"$gt": 40}}),
                &json!({"$set": {"senior": true}}),
                &[],
            )
            .await
            .unwrap();
        assert_eq!(outcome.matched_count, 2);
        assert_eq!(outcome.modified_count, 2);
        assert_eq!(outcome.upserted_count, 0);
    }

    #[tokio::test]
    async fn test_upsert_seeds_from_filter() {
        let (store, users) = seeded().await;

        let outcome = users
            .update_one(
                &json!({"name": "Linus"}),
                &json!({"$set": {"age": 54}}),
                &[UpdateOptions::new().upsert(true)],
            )
            .await
            .unwrap();
        assert_eq!(outcome.upserted_count, 1);
        let id = outcome.upserted_id.unwrap();

        let linus = users.find_one(&json!({"_id": id}), &[]).await.unwrap();
        assert_eq!(linus["name"], "Linus");
        assert_eq!(linus["age"], 54);
        assert_eq!(store.count("app", "users").await, 4);
    }

    #[tokio::test]
    async fn test_no_upsert_without_flag() {
        let (store, users) = seeded().await;

        let outcome = users
            .update_one(&json!({"name": "Linus"}), &json!({"$set": {"age": 54}}), &[])
            .await
            .unwrap();
        assert_eq!(outcome, UpdateOutcome::default());
        assert_eq!(store.count("app", "users").await, 3);
    }

    #[tokio::test]
    async fn test_delete_one_and_many() {
        let (store, users) = seeded().await;

        assert_eq!(users.delete_one(&json!({"age": {"$gt": 0}}), &[]).await.unwrap(), 1);
        assert_eq!(users.delete_many(&json!({}), &[]).await.unwrap(), 2);
        assert_eq!(store.count("app", "users").await, 0);
    }

    #[tokio::test]
    async fn test_calls_fail_after_disconnect() {
        let (store, users) = seeded().await;

        store.disconnect().await.unwrap();
        assert!(store.is_disconnected());
        assert_eq!(
            users.find_one(&json!({}), &[]).await.unwrap_err(),
            DriverError::Disconnected
        );
        assert_eq!(store.disconnect().await.unwrap_err(), DriverError::Disconnected);
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<std::sync::Mutex<Vec<u8>>>);

    impl CapturedLogs {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for CapturedLogs {
        type Writer = Self;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[tokio::test]
    async fn test_option_comments_reach_trace_events() {
        let logs = CapturedLogs::default();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .with_writer(logs.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let (_store, users) = seeded().await;
        users
            .insert_one(
                doc(json!({"name": "Linus"})),
                &[InsertOneOptions::new().comment("import batch 7")],
            )
            .await
            .unwrap();
        users
            .delete_many(&json!({"name": "Linus"}), &[DeleteOptions::new().comment("cleanup")])
            .await
            .unwrap();
        users
            .find_one(&json!({}), &[FindOneOptions::new().comment("dashboard")])
            .await
            .unwrap();

        let output = logs.contents();
        assert!(output.contains("import batch 7"), "{output}");
        assert!(output.contains("cleanup"), "{output}");
        assert!(output.contains("dashboard"), "{output}");
    }

    #[tokio::test]
    async fn test_find_one_sort_and_skip() {
        let (_store, users) = seeded().await;

        let opts = [FindOneOptions::new().sort(json!({"age": 1})).skip(1)];
        let second_youngest = users.find_one(&json!({}), &opts).await.unwrap();
        assert_eq!(second_youngest["name"], "Alan");
    }

    #[tokio::test]
    async fn test_databases_are_isolated() {
        let store = MemoryStore::new();
        store
            .collection("a", "users")
            .insert_one(doc(json!({"_id": 1})), &[])
            .await
            .unwrap();

        assert_eq!(store.count("a", "users").await, 1);
        assert_eq!(store.count("b", "users").await, 0);
    }
}
