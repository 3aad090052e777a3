//! Per-operation parameters.
//!
//! Each operation takes a parameter value naming the target collection, the
//! filter (for reads, updates and deletes), operation flags and a list of
//! driver options that are handed to the store untouched.
//!
//! Parameters are checked with `valid()` before any attempt is made. A filter
//! of `None` or JSON `null` is treated as missing; an empty object `{}` is a
//! valid filter that matches everything.

use crate::error::{Result, StoreError};
use docstore_driver::{
    DeleteOptions, FindOneOptions, FindOptions, InsertManyOptions, InsertOneOptions,
    UpdateOptions,
};
use serde_json::Value;
use std::fmt;

const EMPTY_COLLECTION: &str = "collection name is empty";
const MISSING_FILTER: &str = "filter is missing";

/// The six client operations, used in errors and log fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Single-document read
    FindOne,
    /// Multi-document read
    FindMany,
    /// Single-document insert
    InsertOne,
    /// Multi-document insert
    InsertMany,
    /// Update with insert-on-no-match
    Upsert,
    /// Delete
    Delete,
}

impl Operation {
    /// Name used in log fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FindOne => "find_one",
            Self::FindMany => "find_many",
            Self::InsertOne => "insert_one",
            Self::InsertMany => "insert_many",
            Self::Upsert => "upsert",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn check_collection(operation: Operation, collection: &str) -> Result<()> {
    if collection.is_empty() {
        return Err(StoreError::missing(operation, EMPTY_COLLECTION));
    }
    Ok(())
}

fn check_filter(operation: Operation, filter: Option<&Value>) -> Result<&Value> {
    match filter {
        Some(filter) if !filter.is_null() => Ok(filter),
        _ => Err(StoreError::missing(operation, MISSING_FILTER)),
    }
}

/// Parameters for [`Client::find_one`](crate::Client::find_one).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOneParams {
    /// Target collection
    pub collection: String,
    /// Query filter (required)
    pub filter: Option<Value>,
    /// Driver options passed through verbatim
    pub additional_opts: Vec<FindOneOptions>,
}

impl FindOneParams {
    /// Parameters for `collection` with the given filter.
    pub fn new(collection: impl Into<String>, filter: Value) -> Self {
        Self {
            collection: collection.into(),
            filter: Some(filter),
            additional_opts: Vec::new(),
        }
    }

    /// Append a driver option.
    pub fn with_option(mut self, option: FindOneOptions) -> Self {
        self.additional_opts.push(option);
        self
    }

    /// True when the collection is named and a filter is present.
    pub fn valid(&self) -> bool {
        self.validate().is_ok()
    }

    pub(crate) fn validate(&self) -> Result<&Value> {
        check_collection(Operation::FindOne, &self.collection)?;
        check_filter(Operation::FindOne, self.filter.as_ref())
    }
}

/// Parameters for [`Client::find_many`](crate::Client::find_many).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindManyParams {
    /// Target collection
    pub collection: String,
    /// Query filter (required)
    pub filter: Option<Value>,
    /// Driver options passed through verbatim
    pub additional_opts: Vec<FindOptions>,
}

impl FindManyParams {
    /// Parameters for `collection` with the given filter.
    pub fn new(collection: impl Into<String>, filter: Value) -> Self {
        Self {
            collection: collection.into(),
            filter: Some(filter),
            additional_opts: Vec::new(),
        }
    }

    /// Append a driver option.
    pub fn with_option(mut self, option: FindOptions) -> Self {
        self.additional_opts.push(option);
        self
    }

    /// True when the collection is named and a filter is present.
    pub fn valid(&self) -> bool {
        self.validate().is_ok()
    }

    pub(crate) fn validate(&self) -> Result<&Value> {
        check_collection(Operation::FindMany, &self.collection)?;
        check_filter(Operation::FindMany, self.filter.as_ref())
    }
}

/// Parameters for [`Client::insert_one`](crate::Client::insert_one).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InsertOneParams {
    /// Target collection
    pub collection: String,
    /// Driver options passed through verbatim
    pub additional_opts: Vec<InsertOneOptions>,
}

impl InsertOneParams {
    /// Parameters for `collection`.
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            additional_opts: Vec::new(),
        }
    }

    /// Append a driver option.
    pub fn with_option(mut self, option: InsertOneOptions) -> Self {
        self.additional_opts.push(option);
        self
    }

    /// True when the collection is named.
    pub fn valid(&self) -> bool {
        self.validate().is_ok()
    }

    pub(crate) fn validate(&self) -> Result<()> {
        check_collection(Operation::InsertOne, &self.collection)
    }
}

/// Parameters for [`Client::insert_many`](crate::Client::insert_many).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InsertManyParams {
    /// Target collection
    pub collection: String,
    /// Driver options passed through verbatim
    pub additional_opts: Vec<InsertManyOptions>,
}

impl InsertManyParams {
    /// Parameters for `collection`.
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            additional_opts: Vec::new(),
        }
    }

    /// Append a driver option.
    pub fn with_option(mut self, option: InsertManyOptions) -> Self {
        self.additional_opts.push(option);
        self
    }

    /// True when the collection is named.
    pub fn valid(&self) -> bool {
        self.validate().is_ok()
    }

    pub(crate) fn validate(&self) -> Result<()> {
        check_collection(Operation::InsertMany, &self.collection)
    }
}

/// Parameters for [`Client::upsert`](crate::Client::upsert).
///
/// Insert-on-no-match is on unless `upsert` is `Some(false)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpsertParams {
    /// Target collection
    pub collection: String,
    /// Selects the documents to update (required)
    pub filter: Option<Value>,
    /// Update every match instead of the first
    pub multiple: bool,
    /// Wrap the payload as `{"$set": payload}`
    pub generic: bool,
    /// Insert when nothing matches; `None` means yes
    pub upsert: Option<bool>,
    /// Driver options passed through verbatim
    pub additional_opts: Vec<UpdateOptions>,
}

impl UpsertParams {
    /// Parameters for `collection` with the given filter.
    pub fn new(collection: impl Into<String>, filter: Value) -> Self {
        Self {
            collection: collection.into(),
            filter: Some(filter),
            ..Default::default()
        }
    }

    /// Update every matching document.
    pub fn multiple(mut self, multiple: bool) -> Self {
        self.multiple = multiple;
        self
    }

    /// Treat the payload as a field map to `$set`.
    pub fn generic(mut self, generic: bool) -> Self {
        self.generic = generic;
        self
    }

    /// Override insert-on-no-match.
    pub fn upsert(mut self, upsert: bool) -> Self {
        self.upsert = Some(upsert);
        self
    }

    /// Append a driver option.
    pub fn with_option(mut self, option: UpdateOptions) -> Self {
        self.additional_opts.push(option);
        self
    }

    /// Effective insert-on-no-match flag.
    pub fn upsert_enabled(&self) -> bool {
        self.upsert.unwrap_or(true)
    }

    /// True when the collection is named and a filter is present.
    pub fn valid(&self) -> bool {
        self.validate().is_ok()
    }

    pub(crate) fn validate(&self) -> Result<&Value> {
        check_collection(Operation::Upsert, &self.collection)?;
        check_filter(Operation::Upsert, self.filter.as_ref())
    }
}

/// Parameters for [`Client::delete`](crate::Client::delete).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeleteParams {
    /// Target collection
    pub collection: String,
    /// Selects the documents to delete (required)
    pub filter: Option<Value>,
    /// Delete every match instead of the first
    pub multiple: bool,
    /// Driver options passed through verbatim
    pub additional_opts: Vec<DeleteOptions>,
}

impl DeleteParams {
    /// Parameters for `collection` with the given filter.
    pub fn new(collection: impl Into<String>, filter: Value) -> Self {
        Self {
            collection: collection.into(),
            filter: Some(filter),
            ..Default::default()
        }
    }

    /// Delete every matching document.
    pub fn multiple(mut self, multiple: bool) -> Self {
        self.multiple = multiple;
        self
    }

    /// Append a driver option.
    pub fn with_option(mut self, option: DeleteOptions) -> Self {
        self.additional_opts.push(option);
        self
    }

    /// True when the collection is named and a filter is present.
    pub fn valid(&self) -> bool {
        self.validate().is_ok()
    }

    pub(crate) fn validate(&self) -> Result<&Value> {
        check_collection(Operation::Delete, &self.collection)?;
        check_filter(Operation::Delete, self.filter.as_ref())
    }
}
