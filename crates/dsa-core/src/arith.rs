//! Big-integer helpers
//!
//! Thin layer over `num-bigint` providing the number-theoretic operations
//! the rest of the crate needs: modular inverse, probabilistic primality,
//! uniform sampling from the secure random source, and the fixed-width
//! conversions used by the signature codec.

use crate::{Error, Result};
use num_bigint::{BigInt, BigUint};
use num_integer::Integer;
use num_traits::{One, Zero};
use rand_core::{CryptoRng, RngCore};

/// Default number of Miller-Rabin rounds (false positive rate below 2^-128)
pub const DEFAULT_MILLER_RABIN_ROUNDS: usize = 64;

/// Fewest rounds domain generation accepts (false positive rate below 2^-100)
pub const MIN_MILLER_RABIN_ROUNDS: usize = 50;

/// Rejected draws tolerated by [`random_below`] before giving up.
/// Each draw is rejected with probability below 1/2.
const MAX_REJECTIONS: usize = 128;

/// Primes below 1000, used for trial division ahead of Miller-Rabin
const SMALL_PRIMES: [u32; 168] = [
    2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59,
    61, 67, 71, 73, 79, 83, 89, 97, 101, 103, 107, 109, 113, 127, 131, 137,
    139, 149, 151, 157, 163, 167, 173, 179, 181, 191, 193, 197, 199, 211, 223, 227,
    229, 233, 239, 241, 251, 257, 263, 269, 271, 277, 281, 283, 293, 307, 311, 313,
    317, 331, 337, 347, 349, 353, 359, 367, 373, 379, 383, 389, 397, 401, 409, 419,
    421, 431, 433, 439, 443, 449, 457, 461, 463, 467, 479, 487, 491, 499, 503, 509,
    521, 523, 541, 547, 557, 563, 569, 571, 577, 587, 593, 599, 601, 607, 613, 617,
    619, 631, 641, 643, 647, 653, 659, 661, 673, 677, 683, 691, 701, 709, 719, 727,
    733, 739, 743, 751, 757, 761, 769, 773, 787, 797, 809, 811, 821, 823, 827, 829,
    839, 853, 857, 859, 863, 877, 881, 883, 887, 907, 911, 919, 929, 937, 941, 947,
    953, 967, 971, 977, 983, 991, 997,
];

/// Compute `a^-1 mod m` with the extended Euclidean algorithm.
///
/// Returns `None` when `m <= 1` or when `a` and `m` are not coprime.
pub fn mod_inverse(a: &BigUint, m: &BigUint) -> Option<BigUint> {
    if *m <= BigUint::one() {
        return None;
    }

    let modulus = BigInt::from(m.clone());
    let (mut old_r, mut r) = (BigInt::from(a % m), modulus.clone());
    let (mut old_s, mut s) = (BigInt::one(), BigInt::zero());

    while !r.is_zero() {
        let quotient = &old_r / &r;
        let next_r = &old_r - &quotient * &r;
        old_r = std::mem::replace(&mut r, next_r);
        let next_s = &old_s - &quotient * &s;
        old_s = std::mem::replace(&mut s, next_s);
    }

    if !old_r.is_one() {
        return None;
    }
    old_s.mod_floor(&modulus).to_biguint()
}

/// Probabilistic primality test.
///
/// Trial division by the primes below 1000, then `rounds` Miller-Rabin
/// rounds with bases drawn uniformly from `[2, n-2]`.
pub fn is_probable_prime<R>(n: &BigUint, rounds: usize, rng: &mut R) -> Result<bool>
where
    R: RngCore + CryptoRng,
{
    if *n < BigUint::from(2u32) {
        return Ok(false);
    }

    for &p in SMALL_PRIMES.iter() {
        if *n == BigUint::from(p) {
            return Ok(true);
        }
        if (n % p).is_zero() {
            return Ok(false);
        }
    }

    let one = BigUint::one();
    let n_minus_one = n - &one;
    let mut d = n_minus_one.clone();
    let mut s = 0u32;
    while d.is_even() {
        d >>= 1u32;
        s += 1;
    }

    let two = BigUint::from(2u32);
    'witness: for _ in 0..rounds {
        let a = random_in_range(&two, &n_minus_one, rng)?;
        let mut x = a.modpow(&d, n);
        if x == one || x == n_minus_one {
            continue;
        }
        for _ in 1..s {
            x = (&x * &x) % n;
            if x == n_minus_one {
                continue 'witness;
            }
        }
        return Ok(false);
    }

    Ok(true)
}

/// Draw `bits` uniformly random bits.
fn random_raw<R>(bits: u64, rng: &mut R) -> Result<BigUint>
where
    R: RngCore + CryptoRng,
{
    let len = bits.div_ceil(8) as usize;
    let mut buf = vec![0u8; len];
    rng.try_fill_bytes(&mut buf)?;
    let excess = (len as u64 * 8 - bits) as u32;
    if let Some(top) = buf.first_mut() {
        *top &= 0xffu8 >> excess;
    }
    Ok(BigUint::from_bytes_be(&buf))
}

/// Uniform integer in `[0, bound)` by rejection sampling.
pub fn random_below<R>(bound: &BigUint, rng: &mut R) -> Result<BigUint>
where
    R: RngCore + CryptoRng,
{
    if bound.is_zero() {
        return Err(Error::InvalidParameters("empty sampling range".into()));
    }

    let bits = bound.bits();
    for _ in 0..MAX_REJECTIONS {
        let candidate = random_raw(bits, rng)?;
        if candidate < *bound {
            return Ok(candidate);
        }
    }

    Err(Error::Generation(format!(
        "no value below bound after {} draws",
        MAX_REJECTIONS
    )))
}

/// Uniform integer in `[low, high)`.
pub fn random_in_range<R>(low: &BigUint, high: &BigUint, rng: &mut R) -> Result<BigUint>
where
    R: RngCore + CryptoRng,
{
    if high <= low {
        return Err(Error::InvalidParameters("empty sampling range".into()));
    }
    Ok(low + random_below(&(high - low), rng)?)
}

/// Random integer of exactly `bits` bits (top bit set).
pub fn random_bits<R>(bits: u64, rng: &mut R) -> Result<BigUint>
where
    R: RngCore + CryptoRng,
{
    if bits == 0 {
        return Err(Error::InvalidParameters("bit length must be positive".into()));
    }
    let top = BigUint::one() << (bits - 1);
    Ok(random_raw(bits, rng)? | top)
}

/// Interpret a digest as an integer, keeping its leftmost `qbits` bits.
///
/// When the digest is wider than `qbits` the trailing bits are dropped;
/// narrower digests are used whole.
pub fn bits_to_int(digest: &[u8], qbits: u64) -> BigUint {
    let z = BigUint::from_bytes_be(digest);
    let dbits = digest.len() as u64 * 8;
    if dbits > qbits {
        z >> (dbits - qbits)
    } else {
        z
    }
}

/// Number of bytes needed to hold `n`.
pub fn byte_len(n: &BigUint) -> usize {
    n.bits().div_ceil(8) as usize
}

/// Big-endian encoding of `n`, left padded with zeros to `len` bytes.
///
/// Returns `None` if `n` does not fit.
pub fn to_fixed_be(n: &BigUint, len: usize) -> Option<Vec<u8>> {
    let bytes = if n.is_zero() { Vec::new() } else { n.to_bytes_be() };
    if bytes.len() > len {
        return None;
    }
    let mut out = vec![0u8; len - bytes.len()];
    out.extend_from_slice(&bytes);
    Some(out)
}
