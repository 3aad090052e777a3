//! Retry classification by error text.

use std::error::Error;

/// Decides whether a failure is transient by looking at its textual form.
///
/// The classifier holds a list of substrings; an error is retryable when its
/// `Display` output contains any of them. The default classifier is empty, so
/// nothing is retryable until patterns are configured.
///
/// Empty patterns are discarded on construction, since an empty substring
/// would match every error.
///
/// # Examples
///
/// ```rust
/// use docstore_core::RetryClassifier;
///
/// let classifier = RetryClassifier::new(["connection reset", "not primary"]);
/// let err = std::io::Error::other("connection reset by peer");
/// assert!(classifier.is_retryable(&err));
///
/// assert!(!RetryClassifier::default().is_retryable(&err));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetryClassifier {
    patterns: Vec<String>,
}

impl RetryClassifier {
    /// Create a classifier from a list of retryable substrings.
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            patterns: patterns
                .into_iter()
                .map(Into::into)
                .filter(|p: &String| !p.is_empty())
                .collect(),
        }
    }

    /// The configured substrings.
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// True when no pattern is configured.
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Check an error against the configured substrings.
    pub fn is_retryable(&self, error: &dyn Error) -> bool {
        if self.patterns.is_empty() {
            return false;
        }
        let text = error.to_string();
        self.patterns.iter().any(|p| text.contains(p.as_str()))
    }
}
