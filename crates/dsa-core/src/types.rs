//! Core value types

use num_bigint::BigUint;
use std::fmt;

/// DSA signature (r, s)
///
/// Carries no reference to the message or key; range checks against q
/// happen when the signature is verified or decoded.
#[derive(Clone, PartialEq, Eq)]
pub struct Signature {
    r: BigUint,
    s: BigUint,
}

impl Signature {
    /// Create a new signature
    pub fn new(r: BigUint, s: BigUint) -> Self {
        Self { r, s }
    }

    /// R component
    pub fn r(&self) -> &BigUint {
        &self.r
    }

    /// S component
    pub fn s(&self) -> &BigUint {
        &self.s
    }

    /// Split into (r, s)
    pub fn into_components(self) -> (BigUint, BigUint) {
        (self.r, self.s)
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signature")
            .field("r", &self.r.to_str_radix(16))
            .field("s", &self.s.to_str_radix(16))
            .finish()
    }
}
