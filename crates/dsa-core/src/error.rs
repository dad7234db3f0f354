//! Error types for DSA operations

use thiserror::Error;

/// Result type alias for DSA operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while generating parameters, keys or signatures
///
/// A rejected signature is not an error: verification reports it as `false`.
#[derive(Debug, Error)]
pub enum Error {
    /// Parameter, key or signature generation ran out of its retry budget
    #[error("Generation failed: {0}")]
    Generation(String),

    /// Malformed signature bytes
    #[error("Decode error: {0}")]
    Decode(String),

    /// The secure random source could not produce output
    #[error("Random source failure: {0}")]
    RandomSource(String),

    /// Domain parameters violate a group invariant
    #[error("Invalid domain parameters: {0}")]
    InvalidParameters(String),

    /// Key value outside its valid range
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// A value does not fit the requested encoding
    #[error("Encoding error: {0}")]
    Encoding(String),
}

impl From<rand_core::Error> for Error {
    fn from(e: rand_core::Error) -> Self {
        Error::RandomSource(e.to_string())
    }
}
