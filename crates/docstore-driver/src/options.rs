//! Driver-level option values.
//!
//! Callers attach any number of these to an operation; the client hands them
//! to the driver untouched. When several values of the same type are given,
//! fields set by later values override earlier ones (see `merged`).
//!
//! `comment` is an operator-facing label; backends attach it to the events
//! they log for the operation.

use serde::{Deserialize, Serialize};
use serde_json::Value;

macro_rules! merge_fields {
    ($target:ident, $source:ident, $($field:ident),+ $(,)?) => {
        $(
            if $source.$field.is_some() {
                $target.$field = $source.$field.clone();
            }
        )+
    };
}

macro_rules! comment_setter {
    ($($options:ty),+ $(,)?) => {
        $(
            impl $options {
                /// Attach a comment to the operation
                pub fn comment(mut self, comment: impl Into<String>) -> Self {
                    self.comment = Some(comment.into());
                    self
                }
            }
        )+
    };
}

/// Options for a single-document read
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FindOneOptions {
    /// Sort specification, `{"field": 1 | -1}`
    pub sort: Option<Value>,
    /// Number of matches to skip before picking one
    pub skip: Option<u64>,
    /// Free-form comment attached to the operation
    pub comment: Option<String>,
}

impl FindOneOptions {
    /// Create empty options
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the sort order
    pub fn sort(mut self, sort: Value) -> Self {
        self.sort = Some(sort);
        self
    }

    /// Set the number of matches to skip
    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    /// Combine a list of options, later values winning
    pub fn merged(options: &[Self]) -> Self {
        options.iter().fold(Self::default(), |mut acc, opt| {
            merge_fields!(acc, opt, sort, skip, comment);
            acc
        })
    }
}

/// Options for a multi-document read
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FindOptions {
    /// Sort specification, `{"field": 1 | -1}`
    pub sort: Option<Value>,
    /// Number of matches to skip
    pub skip: Option<u64>,
    /// Maximum number of documents to return, `0` meaning no limit
    pub limit: Option<u64>,
    /// Free-form comment attached to the operation
    pub comment: Option<String>,
}

impl FindOptions {
    /// Create empty options
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the sort order
    pub fn sort(mut self, sort: Value) -> Self {
        self.sort = Some(sort);
        self
    }

    /// Set the number of matches to skip
    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    /// Set the maximum number of documents
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Combine a list of options, later values winning
    pub fn merged(options: &[Self]) -> Self {
        options.iter().fold(Self::default(), |mut acc, opt| {
            merge_fields!(acc, opt, sort, skip, limit, comment);
            acc
        })
    }
}

/// Options for a single-document insert
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InsertOneOptions {
    /// Free-form comment attached to the operation
    pub comment: Option<String>,
}

impl InsertOneOptions {
    /// Create empty options
    pub fn new() -> Self {
        Self::default()
    }

    /// Combine a list of options, later values winning
    pub fn merged(options: &[Self]) -> Self {
        options.iter().fold(Self::default(), |mut acc, opt| {
            merge_fields!(acc, opt, comment);
            acc
        })
    }
}

/// Options for a multi-document insert
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InsertManyOptions {
    /// Stop at the first failing document (default `true`)
    pub ordered: Option<bool>,
    /// Free-form comment attached to the operation
    pub comment: Option<String>,
}

impl InsertManyOptions {
    /// Create empty options
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether the insert stops at the first failure
    pub fn ordered(mut self, ordered: bool) -> Self {
        self.ordered = Some(ordered);
        self
    }

    /// Combine a list of options, later values winning
    pub fn merged(options: &[Self]) -> Self {
        options.iter().fold(Self::default(), |mut acc, opt| {
            merge_fields!(acc, opt, ordered, comment);
            acc
        })
    }
}

/// Options for updates
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateOptions {
    /// Insert a document when nothing matches
    pub upsert: Option<bool>,
    /// Free-form comment attached to the operation
    pub comment: Option<String>,
}

impl UpdateOptions {
    /// Create empty options
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the upsert flag
    pub fn upsert(mut self, upsert: bool) -> Self {
        self.upsert = Some(upsert);
        self
    }

    /// Combine a list of options, later values winning
    pub fn merged(options: &[Self]) -> Self {
        options.iter().fold(Self::default(), |mut acc, opt| {
            merge_fields!(acc, opt, upsert, comment);
            acc
        })
    }
}

/// Options for deletes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeleteOptions {
    /// Free-form comment attached to the operation
    pub comment: Option<String>,
}

impl DeleteOptions {
    /// Create empty options
    pub fn new() -> Self {
        Self::default()
    }

    /// Combine a list of options, later values winning
    pub fn merged(options: &[Self]) -> Self {
        options.iter().fold(Self::default(), |mut acc, opt| {
            merge_fields!(acc, opt, comment);
            acc
        })
    }
}

comment_setter!(
    FindOneOptions,
    FindOptions,
    InsertOneOptions,
    InsertManyOptions,
    UpdateOptions,
    DeleteOptions,
);

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_later_options_win() {
        let merged = UpdateOptions::merged(&[
            UpdateOptions::new().upsert(false),
            UpdateOptions::new().comment("nightly job"),
            UpdateOptions::new().upsert(true),
        ]);

        assert_eq!(merged.upsert, Some(true));
        assert_eq!(merged.comment.as_deref(), Some("nightly job"));
    }

    #[test]
    fn test_unset_fields_do_not_override() {
        let merged = FindOptions::merged(&[
            FindOptions::new().limit(5).sort(json!({"age": -1})),
            FindOptions::new().skip(2),
        ]);

        assert_eq!(merged.limit, Some(5));
        assert_eq!(merged.skip, Some(2));
        assert_eq!(merged.sort, Some(json!({"age": -1})));
    }

    #[test]
    fn test_merge_of_nothing_is_default() {
        assert_eq!(FindOneOptions::merged(&[]), FindOneOptions::default());
        assert_eq!(DeleteOptions::merged(&[]), DeleteOptions::default());
    }
}
