//! Signature verification
//!
//! Verification never fails with an error: anything malformed, out of
//! range or simply wrong is reported as `false`.

use crate::arith::{bits_to_int, mod_inverse};
use crate::hash::{Digest, MessageHasher, Sha256Hasher};
use crate::{PublicKey, Signature};
use num_traits::Zero;
use tracing::debug;

/// Check `signature` over `digest` against `key`.
pub fn verify(key: &PublicKey, digest: &Digest, signature: &Signature) -> bool {
    let domain = key.domain();
    let (p, q, g) = (domain.p(), domain.q(), domain.g());
    let (r, s) = (signature.r(), signature.s());

    if r.is_zero() || r >= q || s.is_zero() || s >= q {
        debug!("Signature component outside [1, q-1]");
        return false;
    }

    let z = bits_to_int(digest.as_bytes(), q.bits());
    let Some(w) = mod_inverse(s, q) else {
        return false;
    };
    let u1 = (z * &w) % q;
    let u2 = (r * &w) % q;
    let v = ((g.modpow(&u1, p) * key.y().modpow(&u2, p)) % p) % q;

    v == *r
}

/// Verify independent (key, digest, signature) triples.
///
/// Runs on the rayon pool when the `multi-thread` feature is enabled.
pub fn verify_batch(items: &[(PublicKey, Digest, Signature)]) -> Vec<bool> {
    #[cfg(feature = "multi-thread")]
    {
        use rayon::prelude::*;
        items
            .par_iter()
            .map(|(key, digest, signature)| verify(key, digest, signature))
            .collect()
    }

    #[cfg(not(feature = "multi-thread"))]
    {
        items
            .iter()
            .map(|(key, digest, signature)| verify(key, digest, signature))
            .collect()
    }
}

/// Verifies messages against one public key and one hash function
pub struct Verifier {
    key: PublicKey,
    hasher: Box<dyn MessageHasher>,
}

impl Verifier {
    /// Verifier hashing with SHA-256
    pub fn new(key: PublicKey) -> Self {
        Self {
            key,
            hasher: Box::new(Sha256Hasher::default()),
        }
    }

    /// Replace the hash function
    pub fn with_hasher(mut self, hasher: Box<dyn MessageHasher>) -> Self {
        self.hasher = hasher;
        self
    }

    /// Key signatures are checked against
    pub fn public_key(&self) -> &PublicKey {
        &self.key
    }

    /// Hash function in use
    pub fn hasher(&self) -> &dyn MessageHasher {
        self.hasher.as_ref()
    }

    /// Hash `message` and check the signature
    pub fn verify_message(&self, message: &[u8], signature: &Signature) -> bool {
        verify(&self.key, &self.hasher.digest(message), signature)
    }

    /// Check the signature over a precomputed digest
    pub fn verify_digest(&self, digest: &Digest, signature: &Signature) -> bool {
        verify(&self.key, digest, signature)
    }
}
