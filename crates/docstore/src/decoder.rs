//! Result decoding for read operations.
//!
//! [`Client::find_one`](crate::Client::find_one) and
//! [`Client::find_many`](crate::Client::find_many) return a [`Decoder`]
//! instead of a typed value, so the caller picks the destination type at the
//! call site. A decoder is consumed by decoding, so it can only be used once.

use crate::context::CallScope;
use crate::error::{Result, StoreError};
use docstore_driver::{Document, DocumentStream};
use futures::StreamExt;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;

/// Handle over a fetched result, decoded on demand.
#[derive(Debug)]
pub enum Decoder {
    /// One document from a single-document read.
    Document(DocumentDecoder),
    /// A cursor from a multi-document read.
    Cursor(CursorDecoder),
}

impl Decoder {
    pub(crate) fn document(document: Document) -> Self {
        Self::Document(DocumentDecoder { document })
    }

    pub(crate) fn cursor(stream: DocumentStream, scope: CallScope) -> Self {
        Self::Cursor(CursorDecoder { stream, scope })
    }

    /// Decode into a new value of type `T`.
    ///
    /// A single document decodes into a struct or map; a cursor decodes into
    /// a sequence type such as `Vec<T>`, in the order the store returned the
    /// documents.
    pub async fn decode<T>(self) -> Result<T>
    where
        T: DeserializeOwned,
    {
        match self {
            Self::Document(decoder) => decoder.decode(),
            Self::Cursor(decoder) => decoder.decode().await,
        }
    }

    /// Decode into an existing destination, replacing its value.
    pub async fn decode_into<T>(self, destination: &mut T) -> Result<()>
    where
        T: DeserializeOwned,
    {
        *destination = self.decode().await?;
        Ok(())
    }

    /// True for a cursor-backed decoder.
    pub fn is_cursor(&self) -> bool {
        matches!(self, Self::Cursor(_))
    }
}

/// Decoder over a single fetched document.
#[derive(Debug, Clone)]
pub struct DocumentDecoder {
    document: Document,
}

impl DocumentDecoder {
    /// The raw document.
    pub fn raw(&self) -> &Document {
        &self.document
    }

    fn decode<T: DeserializeOwned>(self) -> Result<T> {
        Ok(serde_json::from_value(Value::Object(self.document))?)
    }
}

/// Decoder over an open cursor.
///
/// Decoding drains the whole cursor under the call context it was opened
/// with; cancelling or dropping that context stops the drain.
pub struct CursorDecoder {
    stream: DocumentStream,
    scope: CallScope,
}

impl CursorDecoder {
    /// Read every remaining document from the cursor.
    pub async fn drain(self) -> Result<Vec<Document>> {
        let Self { mut stream, scope } = self;
        scope
            .run(async move {
                let mut documents = Vec::new();
                while let Some(document) = stream.next().await {
                    documents.push(document?);
                }
                Ok::<_, StoreError>(documents)
            })
            .await?
    }

    async fn decode<T: DeserializeOwned>(self) -> Result<T> {
        let documents = self.drain().await?;
        let array = Value::Array(documents.into_iter().map(Value::Object).collect());
        Ok(serde_json::from_value(array)?)
    }
}

impl fmt::Debug for CursorDecoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CursorDecoder")
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::CallContext;
    use assert_matches::assert_matches;
    use docstore_driver::DriverError;
    use futures::stream;
    use pretty_assertions::assert_eq;
    use serde::Deserialize;
    use serde_json::json;
    use std::time::Duration;

    #[derive(Debug, Deserialize, PartialEq)]
    struct User {
        name: String,
        age: u32,
    }

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap_or_default()
    }

    fn cursor(ctx: &CallContext, items: Vec<docstore_driver::Result<Document>>) -> Decoder {
        Decoder::cursor(stream::iter(items).boxed(), ctx.scope())
    }

    #[tokio::test]
    async fn test_single_document_into_struct() {
        let decoder = Decoder::document(doc(json!({"_id": "1", "name": "Ada", "age": 36})));
        let user: User = decoder.decode().await.unwrap();
        assert_eq!(
            user,
            User {
                name: "Ada".to_string(),
                age: 36
            }
        );
    }

    #[tokio::test]
    async fn test_shape_mismatch_is_decode_error() {
        let decoder = Decoder::document(doc(json!({"name": "Ada", "age": "old"})));
        let result = decoder.decode::<User>().await;
        assert_matches!(result, Err(StoreError::Decode(_)));
    }

    #[tokio::test]
    async fn test_cursor_preserves_order() {
        let ctx = CallContext::new();
        let decoder = cursor(
            &ctx,
            vec![
                Ok(doc(json!({"name": "c", "age": 3}))),
                Ok(doc(json!({"name": "a", "age": 1}))),
                Ok(doc(json!({"name": "b", "age": 2}))),
            ],
        );

        let mut users: Vec<User> = Vec::new();
        decoder.decode_into(&mut users).await.unwrap();
        let names: Vec<_> = users.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, vec!["c", "a", "b"]);
    }

    #[tokio::test]
    async fn test_empty_cursor_gives_empty_sequence() {
        let ctx = CallContext::new();
        let users: Vec<User> = cursor(&ctx, Vec::new()).decode().await.unwrap();
        assert!(users.is_empty());
    }

    #[tokio::test]
    async fn test_cursor_read_error_passes_through() {
        let ctx = CallContext::new();
        let decoder = cursor(
            &ctx,
            vec![
                Ok(doc(json!({"name": "a", "age": 1}))),
                Err(DriverError::Connection("cursor killed".to_string())),
            ],
        );

        let result = decoder.decode::<Vec<User>>().await;
        assert_matches!(result, Err(StoreError::Store(DriverError::Connection(_))));
    }

    #[tokio::test]
    async fn test_cursor_stops_when_context_cancelled() {
        let ctx = CallContext::new();
        let decoder = Decoder::cursor(stream::pending().boxed(), ctx.scope());
        ctx.cancel();

        let result = decoder.decode::<Vec<User>>().await;
        assert_matches!(result, Err(StoreError::Cancelled));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cursor_stops_at_deadline() {
        let ctx = CallContext::with_timeout(Duration::from_millis(50));
        let decoder = Decoder::cursor(stream::pending().boxed(), ctx.scope());

        let result = decoder.decode::<Vec<User>>().await;
        assert_matches!(result, Err(StoreError::DeadlineExceeded));
    }
}
