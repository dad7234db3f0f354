use dsa_core::{
    codec, sign, verify, DomainParameters, Error, KeyPair, MessageHasher, PrivateKey,
    Sha256Hasher, Signature,
};
use num_bigint::BigUint;
use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use rand_core::{CryptoRng, RngCore};
use std::sync::Arc;

fn hex(s: &str) -> BigUint {
    BigUint::parse_bytes(s.as_bytes(), 16).unwrap()
}

fn domain() -> Arc<DomainParameters> {
    Arc::new(
        DomainParameters::new(
            hex("9c9b49a474a7c6f24dbc59021a6e3e96e653b18ebdf9483a9ab0b2f9ebf9ee31"),
            hex("e0602d4036e2c01f"),
            hex("205fe8e04e61dde920e80922646e98150657b4bde5ae2b75388958f35b72a825"),
        )
        .unwrap(),
    )
}

/// Random source that always fails
struct DeadRng;

impl RngCore for DeadRng {
    fn next_u32(&mut self) -> u32 {
        panic!("infallible draw from a dead source")
    }

    fn next_u64(&mut self) -> u64 {
        panic!("infallible draw from a dead source")
    }

    fn fill_bytes(&mut self, _dest: &mut [u8]) {
        panic!("infallible draw from a dead source")
    }

    fn try_fill_bytes(&mut self, _dest: &mut [u8]) -> Result<(), rand::Error> {
        Err(rand::Error::new("entropy source unavailable"))
    }
}

impl CryptoRng for DeadRng {}

#[test]
fn random_source_failure_is_surfaced() {
    let domain = domain();
    assert!(matches!(
        KeyPair::generate(&domain, &mut DeadRng),
        Err(Error::RandomSource(_))
    ));

    let key = PrivateKey::from_secret(domain, &BigUint::from(7u32)).unwrap();
    let digest = Sha256Hasher::default().digest(b"abc");
    assert!(matches!(
        sign(&key, &digest, &mut DeadRng),
        Err(Error::RandomSource(_))
    ));
}

#[test]
fn concurrent_signing_and_verification() {
    let domain = domain();
    let mut rng = ChaCha20Rng::seed_from_u64(100);
    let pair = Arc::new(KeyPair::generate(&domain, &mut rng).unwrap());
    let hasher = Sha256Hasher::default();

    std::thread::scope(|scope| {
        for worker in 0..4u64 {
            let pair = Arc::clone(&pair);
            let hasher = &hasher;
            scope.spawn(move || {
                let mut rng = ChaCha20Rng::seed_from_u64(1_000 + worker);
                for i in 0..25u64 {
                    let digest = hasher.digest(&[worker.to_be_bytes(), i.to_be_bytes()].concat());
                    let signature = sign(&pair.private, &digest, &mut rng).unwrap();
                    assert!(verify(&pair.public, &digest, &signature));
                }
            });
        }
    });
}

fn flip_bit(bytes: &mut [u8], bit: usize) {
    let bit = bit % (bytes.len() * 8);
    bytes[bit / 8] ^= 1 << (bit % 8);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn sign_then_verify_accepts(message in proptest::collection::vec(any::<u8>(), 0..256), seed in any::<u64>()) {
        let domain = domain();
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let pair = KeyPair::generate(&domain, &mut rng).unwrap();
        let digest = Sha256Hasher::default().digest(&message);

        let signature = sign(&pair.private, &digest, &mut rng).unwrap();
        prop_assert!(verify(&pair.public, &digest, &signature));
    }

    #[test]
    fn flipped_message_bit_rejects(message in proptest::collection::vec(any::<u8>(), 1..128), bit in any::<usize>(), seed in any::<u64>()) {
        let domain = domain();
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let pair = KeyPair::generate(&domain, &mut rng).unwrap();
        let hasher = Sha256Hasher::default();
        let signature = sign(&pair.private, &hasher.digest(&message), &mut rng).unwrap();

        let mut tampered = message.clone();
        flip_bit(&mut tampered, bit);
        prop_assert!(!verify(&pair.public, &hasher.digest(&tampered), &signature));
    }

    #[test]
    fn flipped_signature_bit_rejects(bit in any::<usize>(), seed in any::<u64>()) {
        let domain = domain();
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let pair = KeyPair::generate(&domain, &mut rng).unwrap();
        let digest = Sha256Hasher::default().digest(b"tamper me");
        let signature = sign(&pair.private, &digest, &mut rng).unwrap();

        let mut bytes = codec::encode(&signature, &domain).unwrap();
        flip_bit(&mut bytes, bit);
        // Either the codec refuses the bytes or the verifier refuses the signature
        if let Ok(tampered) = codec::decode(&bytes, &domain) {
            prop_assert!(!verify(&pair.public, &digest, &tampered));
        }
    }

    #[test]
    fn other_public_key_rejects(seed in any::<u64>()) {
        let domain = domain();
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let signer = KeyPair::generate(&domain, &mut rng).unwrap();
        let other = KeyPair::generate(&domain, &mut rng).unwrap();
        prop_assume!(signer.public != other.public);

        let digest = Sha256Hasher::default().digest(b"who signed this");
        let signature = sign(&signer.private, &digest, &mut rng).unwrap();
        prop_assert!(!verify(&other.public, &digest, &signature));
    }

    #[test]
    fn arbitrary_components_never_panic(r in proptest::collection::vec(any::<u8>(), 0..12), s in proptest::collection::vec(any::<u8>(), 0..12)) {
        let domain = domain();
        let mut rng = ChaCha20Rng::seed_from_u64(7);
        let pair = KeyPair::generate(&domain, &mut rng).unwrap();
        let digest = Sha256Hasher::default().digest(b"noise");
        let signature = Signature::new(BigUint::from_bytes_be(&r), BigUint::from_bytes_be(&s));

        // Random (r, s) pairs are valid with negligible probability
        prop_assert!(!verify(&pair.public, &digest, &signature));
    }
}
