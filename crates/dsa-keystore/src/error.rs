//! Keystore error types.

use thiserror::Error;

/// Key storage, protection and file signing errors.
#[derive(Debug, Error)]
pub enum KeystoreError {
    #[error(transparent)]
    Core(#[from] dsa_core::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid key material: {0}")]
    Format(String),

    #[error("wrong passphrase or corrupted key")]
    WrongPassphrase,

    #[error("private key is encrypted and no passphrase was given")]
    PassphraseRequired,

    #[error("key derivation error: {0}")]
    Kdf(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<der::Error> for KeystoreError {
    fn from(e: der::Error) -> Self {
        KeystoreError::Format(format!("malformed DER: {}", e))
    }
}

/// Result type for keystore operations.
pub type KeystoreResult<T> = std::result::Result<T, KeystoreError>;
