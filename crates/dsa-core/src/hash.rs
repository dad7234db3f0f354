//! Message hashing
//!
//! The signature scheme only ever sees a fixed-length [`Digest`]. Which
//! one-way function produces it is pluggable through [`MessageHasher`];
//! any RustCrypto hash can be adapted with [`DigestHasher`].

use std::fmt;
use std::io::{self, Read};
use std::marker::PhantomData;

/// Fixed-length output of a hash function
#[derive(Clone, PartialEq, Eq)]
pub struct Digest(Vec<u8>);

impl Digest {
    /// Wrap digest bytes computed elsewhere
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Raw digest bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Length in bytes
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True for a zero-length digest
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Lowercase hex
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl AsRef<[u8]> for Digest {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self.to_hex())
    }
}

/// Reduces a message of any length to a [`Digest`]
pub trait MessageHasher: Send + Sync {
    /// Algorithm name, e.g. `SHA-256`
    fn name(&self) -> &'static str;

    /// Digest length in bytes
    fn output_len(&self) -> usize;

    /// Hash an in-memory message
    fn digest(&self, message: &[u8]) -> Digest;

    /// Hash everything `reader` yields
    fn digest_reader(&self, reader: &mut dyn Read) -> io::Result<Digest>;
}

/// Adapter from a RustCrypto [`digest::Digest`] implementation
pub struct DigestHasher<D> {
    name: &'static str,
    _hash: PhantomData<fn() -> D>,
}

impl<D> DigestHasher<D> {
    /// Adapter with a display name
    pub const fn named(name: &'static str) -> Self {
        Self {
            name,
            _hash: PhantomData,
        }
    }
}

impl<D> MessageHasher for DigestHasher<D>
where
    D: digest::Digest,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn output_len(&self) -> usize {
        <D as digest::Digest>::output_size()
    }

    fn digest(&self, message: &[u8]) -> Digest {
        Digest(D::digest(message).to_vec())
    }

    fn digest_reader(&self, reader: &mut dyn Read) -> io::Result<Digest> {
        let mut hasher = D::new();
        let mut buf = [0u8; 8192];
        loop {
            let n = match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            hasher.update(&buf[..n]);
        }
        Ok(Digest(hasher.finalize().to_vec()))
    }
}

/// SHA-256 (FIPS 180-4)
pub type Sha256Hasher = DigestHasher<sha2::Sha256>;
/// SHA-512 (FIPS 180-4)
pub type Sha512Hasher = DigestHasher<sha2::Sha512>;
/// SHA3-256 (FIPS 202)
pub type Sha3_256Hasher = DigestHasher<sha3::Sha3_256>;

impl Default for Sha256Hasher {
    fn default() -> Self {
        Self::named("SHA-256")
    }
}

impl Default for Sha512Hasher {
    fn default() -> Self {
        Self::named("SHA-512")
    }
}

impl Default for Sha3_256Hasher {
    fn default() -> Self {
        Self::named("SHA3-256")
    }
}

/// Look up a hasher by name (`sha256`, `sha512`, `sha3-256`; case and
/// dashes are ignored).
pub fn hasher_by_name(name: &str) -> Option<Box<dyn MessageHasher>> {
    let normalized: String = name
        .chars()
        .filter(|c| *c != '-' && *c != '_')
        .map(|c| c.to_ascii_lowercase())
        .collect();
    match normalized.as_str() {
        "sha256" => Some(Box::new(Sha256Hasher::default())),
        "sha512" => Some(Box::new(Sha512Hasher::default())),
        "sha3256" => Some(Box::new(Sha3_256Hasher::default())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_abc() {
        let digest = Sha256Hasher::default().digest(b"abc");
        assert_eq!(
            digest.to_hex(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(digest.len(), 32);
    }

    #[test]
    fn test_reader_matches_in_memory() {
        let hasher = Sha3_256Hasher::default();
        let message = vec![0x5au8; 20_000];
        let streamed = hasher.digest_reader(&mut message.as_slice()).unwrap();
        assert_eq!(streamed, hasher.digest(&message));
    }

    #[test]
    fn test_lookup() {
        assert_eq!(hasher_by_name("SHA-256").unwrap().output_len(), 32);
        assert_eq!(hasher_by_name("sha512").unwrap().output_len(), 64);
        assert_eq!(hasher_by_name("sha3_256").unwrap().name(), "SHA3-256");
        assert!(hasher_by_name("md5").is_none());
    }
}
