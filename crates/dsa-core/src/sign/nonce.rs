//! Per-signature secret k

use crate::arith::{random_in_range, to_fixed_be};
use crate::{Error, Result};
use num_bigint::BigUint;
use num_traits::One;
use rand_core::{CryptoRng, RngCore};
use zeroize::Zeroizing;

/// Secret nonce k in [1, q-1]
///
/// Not `Clone`, and every signing routine takes it by value, so one nonce
/// yields at most one signature. The bytes are wiped when it is dropped.
pub(crate) struct Nonce {
    k: Zeroizing<Vec<u8>>,
}

impl Nonce {
    /// Draw a fresh nonce from the secure source.
    pub(crate) fn generate<R>(q: &BigUint, rng: &mut R) -> Result<Self>
    where
        R: RngCore + CryptoRng,
    {
        let k = random_in_range(&BigUint::one(), q, rng)?;
        Self::from_value(&k, q)
    }

    pub(crate) fn from_value(k: &BigUint, q: &BigUint) -> Result<Self> {
        let width = crate::arith::byte_len(q);
        let bytes = to_fixed_be(k, width)
            .ok_or_else(|| Error::InvalidKey("nonce wider than q".into()))?;
        Ok(Self {
            k: Zeroizing::new(bytes),
        })
    }

    /// k as an integer. The returned copy is not wiped when dropped.
    pub(crate) fn value(&self) -> BigUint {
        BigUint::from_bytes_be(&self.k)
    }
}
