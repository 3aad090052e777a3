/// Declares how an error from a lower layer becomes an error of this layer.
///
/// The macro expands to a `From` implementation, so the `?` operator converts
/// at the boundary without a `map_err()` at every call site.
///
/// # Syntax
///
/// ```ignore
/// error_boundary!(SourceError => TargetError, |err_var| {
///     // conversion logic returning TargetError
/// });
/// ```
///
/// # Example
///
/// ```
/// use docstore_core::error_boundary;
///
/// #[derive(Debug, thiserror::Error)]
/// enum LayerError {
///     #[error("decode failed: {0}")]
///     Decode(String),
/// }
///
/// error_boundary!(std::num::ParseIntError => LayerError, |e| {
///     LayerError::Decode(e.to_string())
/// });
///
/// fn parse_count(raw: &str) -> Result<u64, LayerError> {
///     Ok(raw.parse::<u64>()?)
/// }
///
/// assert!(parse_count("seven").is_err());
/// ```
#[macro_export]
macro_rules! error_boundary {
    ($inner:ty => $outer:ty, |$err:ident| $body:expr) => {
        impl ::std::convert::From<$inner> for $outer {
            fn from($err: $inner) -> $outer {
                $body
            }
        }
    };
}
