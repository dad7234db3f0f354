//! Private and public keys within a domain

use crate::arith::{random_in_range, to_fixed_be};
use crate::params::biguint_hex;
use crate::{DomainParameters, Error, Result};
use num_bigint::BigUint;
use num_traits::One;
use rand_core::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};
use std::fmt;
use std::sync::Arc;
use tracing::{info, instrument};
use zeroize::Zeroizing;

/// Secret exponent x with 0 < x < q
///
/// Stored as fixed-width big-endian bytes that are wiped on drop. Not
/// serializable; exporting the scalar goes through
/// [`PrivateKey::expose_secret_bytes`] and the caller protects it.
pub struct PrivateKey {
    domain: Arc<DomainParameters>,
    x: Zeroizing<Vec<u8>>,
}

impl PrivateKey {
    /// Wrap an existing secret, checking 0 < x < q.
    pub fn from_secret(domain: Arc<DomainParameters>, x: &BigUint) -> Result<Self> {
        if *x < BigUint::one() || x >= domain.q() {
            return Err(Error::InvalidKey("secret must satisfy 0 < x < q".into()));
        }
        let bytes = to_fixed_be(x, domain.q_byte_len())
            .ok_or_else(|| Error::InvalidKey("secret wider than q".into()))?;
        Ok(Self {
            domain,
            x: Zeroizing::new(bytes),
        })
    }

    /// Wrap a big-endian secret scalar.
    pub fn from_secret_bytes(domain: Arc<DomainParameters>, bytes: &[u8]) -> Result<Self> {
        let x = BigUint::from_bytes_be(bytes);
        Self::from_secret(domain, &x)
    }

    /// Domain this key belongs to
    pub fn domain(&self) -> &Arc<DomainParameters> {
        &self.domain
    }

    /// Fixed-width (q byte length) big-endian secret scalar.
    pub fn expose_secret_bytes(&self) -> &[u8] {
        &self.x
    }

    /// x as an integer for a single computation. Unlike the stored bytes the
    /// returned copy is not wiped when dropped.
    pub(crate) fn secret(&self) -> BigUint {
        BigUint::from_bytes_be(&self.x)
    }

    /// Derive the matching public key, y = g^x mod p.
    pub fn public_key(&self) -> PublicKey {
        let y = self.domain.g().modpow(&self.secret(), self.domain.p());
        PublicKey {
            domain: Arc::clone(&self.domain),
            y,
        }
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PrivateKey([REDACTED])")
    }
}

/// Public value y = g^x mod p
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PublicKeyRepr", into = "PublicKeyRepr")]
pub struct PublicKey {
    domain: Arc<DomainParameters>,
    y: BigUint,
}

impl PublicKey {
    /// Wrap a public value, checking 1 < y < p and y^q = 1 mod p.
    pub fn new(domain: Arc<DomainParameters>, y: BigUint) -> Result<Self> {
        let one = BigUint::one();
        if y <= one || y >= *domain.p() {
            return Err(Error::InvalidKey("public value must satisfy 1 < y < p".into()));
        }
        if y.modpow(domain.q(), domain.p()) != one {
            return Err(Error::InvalidKey("public value is not in the subgroup".into()));
        }
        Ok(Self { domain, y })
    }

    /// Domain this key belongs to
    pub fn domain(&self) -> &Arc<DomainParameters> {
        &self.domain
    }

    /// Public value y
    pub fn y(&self) -> &BigUint {
        &self.y
    }

    /// Short identifier: first 8 bytes of SHA-256 over the fixed-width y, hex.
    pub fn fingerprint(&self) -> String {
        let bytes = to_fixed_be(&self.y, self.domain.p_byte_len()).unwrap_or_default();
        let hash = Sha256::digest(&bytes);
        hex::encode(&hash[..8])
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.fingerprint())
    }
}

#[derive(Serialize, Deserialize)]
struct PublicKeyRepr {
    domain: DomainParameters,
    #[serde(with = "biguint_hex")]
    y: BigUint,
}

impl From<PublicKey> for PublicKeyRepr {
    fn from(key: PublicKey) -> Self {
        Self {
            domain: key.domain.as_ref().clone(),
            y: key.y,
        }
    }
}

impl TryFrom<PublicKeyRepr> for PublicKey {
    type Error = Error;

    fn try_from(repr: PublicKeyRepr) -> Result<Self> {
        PublicKey::new(Arc::new(repr.domain), repr.y)
    }
}

/// A private key together with its public key
pub struct KeyPair {
    /// Secret half
    pub private: PrivateKey,
    /// Shareable half
    pub public: PublicKey,
}

impl KeyPair {
    /// Generate a keypair in `domain` with x drawn uniformly from [1, q-1].
    ///
    /// A failing random source aborts generation with
    /// [`Error::RandomSource`].
    #[instrument(skip_all)]
    pub fn generate<R>(domain: &Arc<DomainParameters>, rng: &mut R) -> Result<Self>
    where
        R: RngCore + CryptoRng,
    {
        let x = random_in_range(&BigUint::one(), domain.q(), rng)?;
        let private = PrivateKey::from_secret(Arc::clone(domain), &x)?;
        let public = private.public_key();

        info!(fingerprint = %public.fingerprint(), "Keypair generated");

        Ok(Self { private, public })
    }

    /// Rebuild a keypair from its secret.
    pub fn from_private(private: PrivateKey) -> Self {
        let public = private.public_key();
        Self { private, public }
    }

    /// Split into (private, public)
    pub fn into_parts(self) -> (PrivateKey, PublicKey) {
        (self.private, self.public)
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public", &self.public)
            .finish()
    }
}
