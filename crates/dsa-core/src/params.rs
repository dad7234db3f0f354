//! Domain parameters (p, q, g) and their generation

use crate::arith::{is_probable_prime, random_bits, random_in_range};
use crate::config::{DomainSize, GenerationConfig};
use crate::{Error, Result};
use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::{One, Zero};
use rand_core::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// The group a keypair and its signatures live in
///
/// `p` is prime, `q` is a prime dividing `p - 1`, and `g` generates the
/// subgroup of order `q` in the multiplicative group mod `p`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ParametersRepr", into = "ParametersRepr")]
pub struct DomainParameters {
    p: BigUint,
    q: BigUint,
    g: BigUint,
}

impl DomainParameters {
    /// Build from raw values, checking every invariant that does not need
    /// a primality test. Use [`DomainParameters::validate`] for the rest.
    pub fn new(p: BigUint, q: BigUint, g: BigUint) -> Result<Self> {
        let one = BigUint::one();

        if q <= one || q.is_even() {
            return Err(Error::InvalidParameters("q must be an odd integer > 1".into()));
        }
        if p <= q {
            return Err(Error::InvalidParameters("p must be larger than q".into()));
        }
        if !((&p - &one) % &q).is_zero() {
            return Err(Error::InvalidParameters("q does not divide p - 1".into()));
        }
        if g <= one || g >= p {
            return Err(Error::InvalidParameters("g must satisfy 1 < g < p".into()));
        }
        if g.modpow(&q, &p) != one {
            return Err(Error::InvalidParameters("g does not have order q".into()));
        }

        Ok(Self { p, q, g })
    }

    /// Check that p and q are probable primes.
    pub fn validate<R>(&self, rounds: usize, rng: &mut R) -> Result<()>
    where
        R: RngCore + CryptoRng,
    {
        if !is_probable_prime(&self.q, rounds, rng)? {
            return Err(Error::InvalidParameters("q is not prime".into()));
        }
        if !is_probable_prime(&self.p, rounds, rng)? {
            return Err(Error::InvalidParameters("p is not prime".into()));
        }
        Ok(())
    }

    /// Generate a fresh domain of the configured size.
    ///
    /// Fails with [`Error::Generation`] once every retry budget in `config`
    /// is spent.
    #[instrument(skip(config, rng), fields(p_bits = config.size.p_bits, q_bits = config.size.q_bits))]
    pub fn generate<R>(config: &GenerationConfig, rng: &mut R) -> Result<Self>
    where
        R: RngCore + CryptoRng,
    {
        config.check()?;
        info!("Generating domain parameters");

        for attempt in 1..=config.max_q_attempts {
            let Some(q) = generate_prime(config.size.q_bits, config.miller_rabin_rounds, rng)?
            else {
                debug!(attempt, "No subgroup prime found");
                continue;
            };

            let Some(p) = search_modulus(&q, config, rng)? else {
                debug!(attempt, "No modulus found for subgroup prime");
                continue;
            };

            let g = derive_generator(&p, &q, config.max_generator_attempts, rng)?;
            info!(attempt, "Domain parameters generated");
            return Ok(Self { p, q, g });
        }

        Err(Error::Generation(format!(
            "no {}/{}-bit domain found after {} subgroup primes",
            config.size.p_bits, config.size.q_bits, config.max_q_attempts
        )))
    }

    /// Prime modulus
    pub fn p(&self) -> &BigUint {
        &self.p
    }

    /// Prime subgroup order
    pub fn q(&self) -> &BigUint {
        &self.q
    }

    /// Subgroup generator
    pub fn g(&self) -> &BigUint {
        &self.g
    }

    /// Actual bit lengths of p and q
    pub fn size(&self) -> DomainSize {
        DomainSize {
            p_bits: self.p.bits(),
            q_bits: self.q.bits(),
        }
    }

    /// Width in bytes of one signature component
    pub fn q_byte_len(&self) -> usize {
        crate::arith::byte_len(&self.q)
    }

    /// Width in bytes of a group element
    pub fn p_byte_len(&self) -> usize {
        crate::arith::byte_len(&self.p)
    }
}

impl std::fmt::Debug for DomainParameters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let size = self.size();
        f.debug_struct("DomainParameters")
            .field("p_bits", &size.p_bits)
            .field("q_bits", &size.q_bits)
            .finish()
    }
}

/// Random probable prime of exactly `bits` bits.
fn generate_prime<R>(bits: u64, rounds: usize, rng: &mut R) -> Result<Option<BigUint>>
where
    R: RngCore + CryptoRng,
{
    let budget = 20 * bits as usize;
    for _ in 0..budget {
        let candidate = random_bits(bits, rng)? | BigUint::one();
        if is_probable_prime(&candidate, rounds, rng)? {
            return Ok(Some(candidate));
        }
    }
    Ok(None)
}

/// Look for a prime p = k*q + 1 of the configured length.
fn search_modulus<R>(q: &BigUint, config: &GenerationConfig, rng: &mut R) -> Result<Option<BigUint>>
where
    R: RngCore + CryptoRng,
{
    let p_bits = config.size.p_bits;
    let one = BigUint::one();
    let k_low = (&one << (p_bits - 1)) / q + &one;
    let k_high = ((&one << p_bits) - &one) / q;
    if k_low >= k_high {
        return Ok(None);
    }

    let trials = config.p_trials();
    for _ in 0..trials {
        let mut k = random_in_range(&k_low, &k_high, rng)?;
        // p must be odd, so k must be even
        if k.is_odd() {
            k += 1u32;
        }
        let p = &k * q + &one;
        if p.bits() != p_bits {
            continue;
        }
        if is_probable_prime(&p, config.miller_rabin_rounds, rng)? {
            debug!(trials, "Found prime modulus");
            return Ok(Some(p));
        }
    }
    Ok(None)
}

/// g = h^((p-1)/q) mod p for random h in [2, p-2], retried while g = 1.
fn derive_generator<R>(p: &BigUint, q: &BigUint, attempts: usize, rng: &mut R) -> Result<BigUint>
where
    R: RngCore + CryptoRng,
{
    let one = BigUint::one();
    let exponent = (p - &one) / q;
    let low = BigUint::from(2u32);
    let high = p - &one;

    for _ in 0..attempts {
        let h = random_in_range(&low, &high, rng)?;
        let g = h.modpow(&exponent, p);
        if g != one {
            return Ok(g);
        }
    }

    Err(Error::Generation(format!(
        "no generator found after {} attempts",
        attempts
    )))
}

/// Serialized form: lowercase hex without prefix
#[derive(Serialize, Deserialize)]
struct ParametersRepr {
    #[serde(with = "crate::params::biguint_hex")]
    p: BigUint,
    #[serde(with = "crate::params::biguint_hex")]
    q: BigUint,
    #[serde(with = "crate::params::biguint_hex")]
    g: BigUint,
}

impl From<DomainParameters> for ParametersRepr {
    fn from(params: DomainParameters) -> Self {
        Self {
            p: params.p,
            q: params.q,
            g: params.g,
        }
    }
}

impl TryFrom<ParametersRepr> for DomainParameters {
    type Error = Error;

    fn try_from(repr: ParametersRepr) -> Result<Self> {
        DomainParameters::new(repr.p, repr.q, repr.g)
    }
}

pub(crate) mod biguint_hex {
    use num_bigint::BigUint;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &BigUint, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_str_radix(16))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<BigUint, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        BigUint::parse_bytes(text.as_bytes(), 16)
            .ok_or_else(|| serde::de::Error::custom("Invalid hex integer"))
    }
}
