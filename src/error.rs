//! Error types for github-pr-resource

use thiserror::Error;

/// Errors that can abort a check invocation
///
/// Every variant except [`InvalidVersionTimestamp`] is fatal: a check must
/// either return the complete, correctly ordered version list or fail. A
/// partial result would silently break the trigger's ordering guarantee.
///
/// [`InvalidVersionTimestamp`]: Error::InvalidVersionTimestamp
#[derive(Debug, Error)]
pub enum Error {
    /// A remote call returned a non-success status (other than 304)
    #[error("retrieval failed: {0}")]
    Retrieval(String),

    /// A response body did not parse into the expected shape
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The persistent HTTP cache could not be read or written
    #[error("cache error: {0}")]
    Cache(String),

    /// The last-known version carried an unparseable timestamp
    ///
    /// Callers downgrade this to an initial check (no gating) rather than
    /// aborting; see `check::run`.
    #[error("invalid version timestamp: {0}")]
    InvalidVersionTimestamp(String),
}

/// Result type alias using our Error
pub type Result<T> = std::result::Result<T, Error>;
