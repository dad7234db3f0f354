//! # DSA Core
//!
//! Digital Signature Algorithm primitives over a prime-order subgroup of
//! the integers mod p.
//!
//! This crate provides:
//! - Domain parameter generation (p, q, g)
//! - Keypair generation
//! - Hash-then-sign signing and verification (FIPS 186-3 style)
//! - Fixed-width and DER signature encodings
//!
//! Every operation is a pure function of its inputs plus an explicit
//! cryptographically secure random source. Nothing here touches files,
//! key serialization formats or passphrases.
//!
//! ## Example
//!
//! ```rust,ignore
//! use dsa_core::{DomainParameters, GenerationConfig, KeyPair, Signer, Verifier};
//! use rand::rngs::OsRng;
//!
//! let domain = Arc::new(DomainParameters::generate(&GenerationConfig::default(), &mut OsRng)?);
//! let pair = KeyPair::generate(&domain, &mut OsRng)?;
//!
//! let signature = Signer::new(pair.private).sign_message(b"abc", &mut OsRng)?;
//! assert!(Verifier::new(pair.public).verify_message(b"abc", &signature));
//! ```

pub mod arith;
pub mod codec;
pub mod config;
pub mod error;
pub mod hash;
pub mod keys;
pub mod params;
pub mod sign;
pub mod types;
pub mod verify;

#[cfg(test)]
mod testing;

pub use codec::SignatureEncoding;
pub use config::{DomainSize, GenerationConfig, SigningConfig};
pub use error::{Error, Result};
pub use hash::{
    hasher_by_name, Digest, DigestHasher, MessageHasher, Sha256Hasher, Sha3_256Hasher,
    Sha512Hasher,
};
pub use keys::{KeyPair, PrivateKey, PublicKey};
pub use params::DomainParameters;
pub use sign::{sign, sign_with_config, Signer};
pub use types::Signature;
pub use verify::{verify, verify_batch, Verifier};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
