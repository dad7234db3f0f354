//! Signature generation

use super::nonce::Nonce;
use crate::arith::{bits_to_int, mod_inverse};
use crate::config::SigningConfig;
use crate::hash::Digest;
use crate::{Error, PrivateKey, Result, Signature};
use num_bigint::BigUint;
use num_traits::Zero;
use rand_core::{CryptoRng, RngCore};
use tracing::{debug, instrument};

/// Sign a digest with the default retry budget.
pub fn sign<R>(key: &PrivateKey, digest: &Digest, rng: &mut R) -> Result<Signature>
where
    R: RngCore + CryptoRng,
{
    sign_with_config(key, digest, &SigningConfig::default(), rng)
}

/// Sign a digest (FIPS 186-3).
///
/// The digest is reduced to its leftmost bit-length(q) bits. Every attempt
/// draws a fresh nonce; attempts ending in r = 0 or s = 0 are discarded,
/// and after `config.max_attempts` of them signing fails with
/// [`Error::Generation`].
#[instrument(skip_all, fields(digest_len = digest.len()))]
pub fn sign_with_config<R>(
    key: &PrivateKey,
    digest: &Digest,
    config: &SigningConfig,
    rng: &mut R,
) -> Result<Signature>
where
    R: RngCore + CryptoRng,
{
    let q = key.domain().q();
    let z = bits_to_int(digest.as_bytes(), q.bits());

    for attempt in 1..=config.max_attempts {
        let nonce = Nonce::generate(q, rng)?;
        match sign_with_nonce(key, &z, nonce) {
            Some(signature) => return Ok(signature),
            None => debug!(attempt, "Degenerate nonce, drawing a new one"),
        }
    }

    Err(Error::Generation(format!(
        "no valid signature after {} nonces",
        config.max_attempts
    )))
}

/// One signing attempt. Consumes the nonce whatever the outcome.
pub(crate) fn sign_with_nonce(key: &PrivateKey, z: &BigUint, nonce: Nonce) -> Option<Signature> {
    let domain = key.domain();
    let (p, q, g) = (domain.p(), domain.q(), domain.g());

    // Plain BigUint copies of k and x are not wiped, so none outlives this call
    let (r, k_inv) = {
        let k = nonce.value();
        drop(nonce);
        let r = g.modpow(&k, p) % q;
        if r.is_zero() {
            return None;
        }
        let k_inv = mod_inverse(&k, q)?;
        (r, k_inv)
    };
    let s = (k_inv * (z + key.secret() * &r)) % q;
    if s.is_zero() {
        return None;
    }

    Some(Signature::new(r, s))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixture_256_64, fixture_512_160, tiny_domain};
    use crate::verify::verify;
    use crate::{KeyPair, MessageHasher, Sha256Hasher};
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn hex(s: &str) -> BigUint {
        BigUint::parse_bytes(s.as_bytes(), 16).unwrap()
    }

    #[test]
    fn test_known_answer_tiny_domain() {
        // p = 23, q = 11, g = 4, x = 7, k = 3; digest 0x50 truncates to z = 5
        let domain = tiny_domain();
        let key = PrivateKey::from_secret(domain.clone(), &BigUint::from(7u32)).unwrap();
        let z = bits_to_int(&[0x50], domain.q().bits());
        assert_eq!(z, BigUint::from(5u32));

        let nonce = Nonce::from_value(&BigUint::from(3u32), domain.q()).unwrap();
        let signature = sign_with_nonce(&key, &z, nonce).unwrap();
        assert_eq!(*signature.r(), BigUint::from(7u32));
        assert_eq!(*signature.s(), BigUint::from(7u32));

        let digest = Digest::from_bytes(vec![0x50]);
        assert!(verify(&key.public_key(), &digest, &signature));
    }

    #[test]
    fn test_degenerate_s_discards_nonce() {
        // x = 1, k = 1 gives r = 4; z = 7 makes z + x*r a multiple of q
        let domain = tiny_domain();
        let key = PrivateKey::from_secret(domain.clone(), &BigUint::from(1u32)).unwrap();
        let one = BigUint::from(1u32);

        let nonce = Nonce::from_value(&one, domain.q()).unwrap();
        assert!(sign_with_nonce(&key, &BigUint::from(7u32), nonce).is_none());

        let nonce = Nonce::from_value(&one, domain.q()).unwrap();
        let signature = sign_with_nonce(&key, &BigUint::from(8u32), nonce).unwrap();
        assert_eq!(*signature.r(), BigUint::from(4u32));
        assert_eq!(*signature.s(), one);
    }

    #[test]
    fn test_known_answer_sha256_truncated() {
        // SHA-256("abc") is wider than the 160-bit q, so only its leftmost
        // 160 bits enter the signature.
        let domain = fixture_512_160();
        let key = PrivateKey::from_secret(domain.clone(), &BigUint::from(7u32)).unwrap();
        let digest = Sha256Hasher::default().digest(b"abc");
        let z = bits_to_int(digest.as_bytes(), domain.q().bits());

        let k = hex("1d2c3b4a5968778695a4b3c2d1e0f0e1d2c3b4a5");
        let nonce = Nonce::from_value(&k, domain.q()).unwrap();
        let signature = sign_with_nonce(&key, &z, nonce).unwrap();

        assert_eq!(*signature.r(), hex("4fc825e12e206f684dc4592f67d26e6eb0269645"));
        assert_eq!(*signature.s(), hex("4cb4baaa2ef81906ae4cd6dce34d392896fe7bdf"));
        assert!(verify(&key.public_key(), &digest, &signature));
    }

    #[test]
    fn test_known_answer_64_bit_q() {
        let domain = fixture_256_64();
        let key = PrivateKey::from_secret(domain.clone(), &BigUint::from(7u32)).unwrap();
        let digest = Sha256Hasher::default().digest(b"abc");
        let z = bits_to_int(digest.as_bytes(), domain.q().bits());

        let nonce = Nonce::from_value(&hex("1234567"), domain.q()).unwrap();
        let signature = sign_with_nonce(&key, &z, nonce).unwrap();

        assert_eq!(*signature.r(), hex("42d49f7da4ef0e8b"));
        assert_eq!(*signature.s(), hex("8575a1ed6531bf9e"));
    }

    #[test]
    fn test_signatures_use_fresh_nonces() {
        let domain = fixture_512_160();
        let mut rng = ChaCha20Rng::seed_from_u64(21);
        let pair = KeyPair::generate(&domain, &mut rng).unwrap();
        let digest = Sha256Hasher::default().digest(b"same message");

        let first = sign(&pair.private, &digest, &mut rng).unwrap();
        let second = sign(&pair.private, &digest, &mut rng).unwrap();

        assert_ne!(first.r(), second.r());
        assert_ne!(first, second);
        assert!(verify(&pair.public, &digest, &first));
        assert!(verify(&pair.public, &digest, &second));
    }

    #[test]
    fn test_zero_attempt_budget_fails() {
        let domain = fixture_256_64();
        let mut rng = ChaCha20Rng::seed_from_u64(22);
        let pair = KeyPair::generate(&domain, &mut rng).unwrap();
        let digest = Sha256Hasher::default().digest(b"m");
        let config = SigningConfig { max_attempts: 0 };

        assert!(matches!(
            sign_with_config(&pair.private, &digest, &config, &mut rng),
            Err(Error::Generation(_))
        ));
    }

    #[test]
    fn test_tiny_domain_signs_every_digest() {
        // With q = 11, r = 0 and s = 0 happen often; the retry loop has to
        // absorb them.
        let domain = tiny_domain();
        let mut rng = ChaCha20Rng::seed_from_u64(23);
        let pair = KeyPair::generate(&domain, &mut rng).unwrap();

        for byte in 0u8..=255 {
            let digest = Digest::from_bytes(vec![byte]);
            let signature = sign(&pair.private, &digest, &mut rng).unwrap();
            assert!(verify(&pair.public, &digest, &signature));
        }
    }
}
