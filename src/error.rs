//! Error types for cache-policy computation.

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced while preparing cache metadata.
///
/// The policy computation itself is infallible: absent metadata means "no
/// constraint contributed", never an error. Errors only arise at the
/// compilation boundary, when raw directive arguments are turned into
/// validated [`CacheHint`](crate::hint::CacheHint)s, and when publishing
/// artifacts into an execution context.
#[derive(Error, Debug)]
pub enum Error {
    /// A directive argument had the wrong shape or an out-of-range value
    #[error("invalid @cacheControl argument `{argument}`: {reason}")]
    InvalidDirective {
        /// Name of the offending argument
        argument: &'static str,
        /// What was wrong with it
        reason: String,
    },

    /// An unrecognized cache scope value
    #[error("unknown cache scope `{0}` (expected PUBLIC or PRIVATE)")]
    UnknownScope(String),

    /// Serialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
