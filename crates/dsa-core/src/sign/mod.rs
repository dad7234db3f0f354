//! Signature generation
//!
//! Hash-then-sign over a private key's domain. Nonces are drawn inside the
//! signing loop and never leave it.

mod dsa;
mod nonce;

pub use dsa::{sign, sign_with_config};

use crate::config::SigningConfig;
use crate::hash::{Digest, MessageHasher, Sha256Hasher};
use crate::{PrivateKey, PublicKey, Result, Signature};
use rand_core::{CryptoRng, RngCore};

/// Signs messages with one private key and one hash function
pub struct Signer {
    key: PrivateKey,
    hasher: Box<dyn MessageHasher>,
    config: SigningConfig,
}

impl Signer {
    /// Signer hashing with SHA-256
    pub fn new(key: PrivateKey) -> Self {
        Self {
            key,
            hasher: Box::new(Sha256Hasher::default()),
            config: SigningConfig::default(),
        }
    }

    /// Replace the hash function
    pub fn with_hasher(mut self, hasher: Box<dyn MessageHasher>) -> Self {
        self.hasher = hasher;
        self
    }

    /// Replace the retry budget
    pub fn with_config(mut self, config: SigningConfig) -> Self {
        self.config = config;
        self
    }

    /// Public half of the signing key
    pub fn public_key(&self) -> PublicKey {
        self.key.public_key()
    }

    /// Hash function in use
    pub fn hasher(&self) -> &dyn MessageHasher {
        self.hasher.as_ref()
    }

    /// Hash and sign an in-memory message
    pub fn sign_message<R>(&self, message: &[u8], rng: &mut R) -> Result<Signature>
    where
        R: RngCore + CryptoRng,
    {
        let digest = self.hasher.digest(message);
        self.sign_digest(&digest, rng)
    }

    /// Sign a digest produced by [`Signer::hasher`]
    pub fn sign_digest<R>(&self, digest: &Digest, rng: &mut R) -> Result<Signature>
    where
        R: RngCore + CryptoRng,
    {
        sign_with_config(&self.key, digest, &self.config, rng)
    }
}

impl std::fmt::Debug for Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signer")
            .field("key", &self.key)
            .field("hasher", &self.hasher.name())
            .finish()
    }
}
