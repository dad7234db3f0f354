//! Signature encodings
//!
//! The canonical wire format is `r || s`, each component big-endian and
//! zero-padded to the byte length of q. ASN.1 DER is offered for
//! interoperability with tools that expect `SEQUENCE { INTEGER, INTEGER }`.

use crate::arith::to_fixed_be;
use crate::{DomainParameters, Error, Result, Signature};
use der::asn1::UintRef;
use der::{Decode, Encode, Sequence};
use num_bigint::BigUint;
use num_traits::Zero;
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Sequence)]
struct DerSignature<'a> {
    r: UintRef<'a>,
    s: UintRef<'a>,
}

/// Byte format of an encoded signature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignatureEncoding {
    /// Fixed-width `r || s`
    #[default]
    Binary,
    /// DER `SEQUENCE { INTEGER r, INTEGER s }`
    Der,
}

impl fmt::Display for SignatureEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignatureEncoding::Binary => write!(f, "binary"),
            SignatureEncoding::Der => write!(f, "der"),
        }
    }
}

impl FromStr for SignatureEncoding {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "binary" | "raw" => Ok(SignatureEncoding::Binary),
            "der" => Ok(SignatureEncoding::Der),
            other => Err(Error::Decode(format!("Unknown signature encoding: {}", other))),
        }
    }
}

/// Encode as fixed-width `r || s`.
pub fn encode(signature: &Signature, domain: &DomainParameters) -> Result<Vec<u8>> {
    let width = domain.q_byte_len();
    let mut out = Vec::with_capacity(2 * width);
    for component in [signature.r(), signature.s()] {
        let bytes = to_fixed_be(component, width).ok_or_else(|| {
            Error::Encoding(format!("Signature component wider than {} bytes", width))
        })?;
        out.extend_from_slice(&bytes);
    }
    Ok(out)
}

/// Decode fixed-width `r || s`, rejecting wrong lengths and components
/// outside [1, q-1].
pub fn decode(bytes: &[u8], domain: &DomainParameters) -> Result<Signature> {
    let width = domain.q_byte_len();
    if bytes.len() != 2 * width {
        return Err(Error::Decode(format!(
            "Expected {} bytes, got {}",
            2 * width,
            bytes.len()
        )));
    }

    let (r_bytes, s_bytes) = bytes.split_at(width);
    let r = check_component(BigUint::from_bytes_be(r_bytes), domain, "r")?;
    let s = check_component(BigUint::from_bytes_be(s_bytes), domain, "s")?;
    Ok(Signature::new(r, s))
}

/// Hex text of the fixed-width encoding
pub fn encode_hex(signature: &Signature, domain: &DomainParameters) -> Result<String> {
    Ok(hex::encode(encode(signature, domain)?))
}

/// Parse hex text of the fixed-width encoding
pub fn decode_hex(text: &str, domain: &DomainParameters) -> Result<Signature> {
    let bytes = hex::decode(text.trim()).map_err(|e| Error::Decode(format!("Invalid hex: {}", e)))?;
    decode(&bytes, domain)
}

/// DER `SEQUENCE { INTEGER r, INTEGER s }`
pub fn encode_der(signature: &Signature) -> Result<Vec<u8>> {
    let r = signature.r().to_bytes_be();
    let s = signature.s().to_bytes_be();
    DerSignature {
        r: UintRef::new(&r).map_err(der_encoding)?,
        s: UintRef::new(&s).map_err(der_encoding)?,
    }
    .to_der()
    .map_err(der_encoding)
}

/// Strict DER decoding: minimal lengths, minimal non-negative integers and
/// no trailing data.
pub fn decode_der(bytes: &[u8], domain: &DomainParameters) -> Result<Signature> {
    let der = DerSignature::from_der(bytes)
        .map_err(|e| Error::Decode(format!("Invalid DER signature: {}", e)))?;
    let r = check_component(BigUint::from_bytes_be(der.r.as_bytes()), domain, "r")?;
    let s = check_component(BigUint::from_bytes_be(der.s.as_bytes()), domain, "s")?;
    Ok(Signature::new(r, s))
}

/// Encode with the selected format
pub fn encode_as(
    signature: &Signature,
    domain: &DomainParameters,
    encoding: SignatureEncoding,
) -> Result<Vec<u8>> {
    match encoding {
        SignatureEncoding::Binary => encode(signature, domain),
        SignatureEncoding::Der => encode_der(signature),
    }
}

/// Decode with the selected format
pub fn decode_as(
    bytes: &[u8],
    domain: &DomainParameters,
    encoding: SignatureEncoding,
) -> Result<Signature> {
    match encoding {
        SignatureEncoding::Binary => decode(bytes, domain),
        SignatureEncoding::Der => decode_der(bytes, domain),
    }
}

fn check_component(value: BigUint, domain: &DomainParameters, name: &str) -> Result<BigUint> {
    if value.is_zero() {
        return Err(Error::Decode(format!("{} is zero", name)));
    }
    if value >= *domain.q() {
        return Err(Error::Decode(format!("{} is not below q", name)));
    }
    Ok(value)
}

fn der_encoding(e: der::Error) -> Error {
    Error::Encoding(format!("DER encoding failed: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixture_256_64, fixture_512_160, tiny_domain};
    use crate::{sign, KeyPair, MessageHasher, Sha256Hasher};
    use num_traits::One;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn hex_int(s: &str) -> BigUint {
        BigUint::parse_bytes(s.as_bytes(), 16).unwrap()
    }

    fn sample() -> Signature {
        Signature::new(
            hex_int("42d49f7da4ef0e8b"),
            hex_int("8575a1ed6531bf9e"),
        )
    }

    #[test]
    fn test_fixed_width_vector() {
        let domain = fixture_256_64();
        let encoded = encode(&sample(), &domain).unwrap();
        assert_eq!(hex::encode(&encoded), "42d49f7da4ef0e8b8575a1ed6531bf9e");
        assert_eq!(decode(&encoded, &domain).unwrap(), sample());
    }

    #[test]
    fn test_short_components_are_padded() {
        let domain = fixture_512_160();
        let signature = Signature::new(BigUint::one(), BigUint::from(0x0102u32));
        let encoded = encode(&signature, &domain).unwrap();

        assert_eq!(encoded.len(), 40);
        assert_eq!(encoded[19], 0x01);
        assert!(encoded[..19].iter().all(|b| *b == 0));
        assert_eq!(&encoded[38..], &[0x01, 0x02]);
        assert_eq!(decode(&encoded, &domain).unwrap(), signature);
    }

    #[test]
    fn test_encode_rejects_oversized_component() {
        let domain = tiny_domain();
        let signature = Signature::new(BigUint::from(300u32), BigUint::one());
        assert!(matches!(encode(&signature, &domain), Err(Error::Encoding(_))));
    }

    #[test]
    fn test_decode_rejects_malformed() {
        let domain = fixture_256_64();
        let good = encode(&sample(), &domain).unwrap();
        let q = to_fixed_be(domain.q(), 8).unwrap();

        assert!(decode(&good[..15], &domain).is_err());
        assert!(decode(&[good.clone(), vec![0]].concat(), &domain).is_err());
        assert!(decode(&[], &domain).is_err());

        let zero_r = [vec![0u8; 8], good[8..].to_vec()].concat();
        assert!(matches!(decode(&zero_r, &domain), Err(Error::Decode(_))));
        let zero_s = [good[..8].to_vec(), vec![0u8; 8]].concat();
        assert!(decode(&zero_s, &domain).is_err());
        let big_r = [q.clone(), good[8..].to_vec()].concat();
        assert!(decode(&big_r, &domain).is_err());
        let big_s = [good[..8].to_vec(), vec![0xff; 8]].concat();
        assert!(decode(&big_s, &domain).is_err());
    }

    #[test]
    fn test_reencoding_is_stable() {
        let domain = fixture_512_160();
        let mut rng = ChaCha20Rng::seed_from_u64(41);
        let pair = KeyPair::generate(&domain, &mut rng).unwrap();
        let digest = Sha256Hasher::default().digest(b"stable");

        for _ in 0..10 {
            let signature = sign(&pair.private, &digest, &mut rng).unwrap();
            let first = encode(&signature, &domain).unwrap();
            let second = encode(&decode(&first, &domain).unwrap(), &domain).unwrap();
            let third = encode(&decode(&second, &domain).unwrap(), &domain).unwrap();
            assert_eq!(first, second);
            assert_eq!(second, third);
        }
    }

    #[test]
    fn test_hex_form() {
        let domain = fixture_256_64();
        let text = encode_hex(&sample(), &domain).unwrap();
        assert_eq!(text, "42d49f7da4ef0e8b8575a1ed6531bf9e");
        assert_eq!(decode_hex(&format!(" {}\n", text), &domain).unwrap(), sample());
        assert!(decode_hex("zz", &domain).is_err());
    }

    #[test]
    fn test_der_vector() {
        let domain = fixture_256_64();
        let der = encode_der(&sample()).unwrap();
        // s has its top bit set and gains a leading zero
        assert_eq!(
            hex::encode(&der),
            "3015020842d49f7da4ef0e8b0209008575a1ed6531bf9e"
        );
        assert_eq!(decode_der(&der, &domain).unwrap(), sample());
        let encoded = encode_as(&sample(), &domain, SignatureEncoding::Der).unwrap();
        assert_eq!(
            decode_as(&encoded, &domain, SignatureEncoding::Der).unwrap(),
            sample()
        );
    }

    #[test]
    fn test_der_rejects_non_canonical() {
        let domain = fixture_256_64();
        let der = encode_der(&sample()).unwrap();

        let mut trailing = der.clone();
        trailing.push(0);
        assert!(decode_der(&trailing, &domain).is_err());

        // r with a redundant leading zero
        let padded = hex::decode("301602090042d49f7da4ef0e8b0209008575a1ed6531bf9e").unwrap();
        assert!(decode_der(&padded, &domain).is_err());

        // s without its sign-protecting zero reads as negative
        let negative = hex::decode("3014020842d49f7da4ef0e8b02088575a1ed6531bf9e").unwrap();
        assert!(decode_der(&negative, &domain).is_err());

        // long-form length for a short sequence
        let long_len = hex::decode("308115020842d49f7da4ef0e8b0209008575a1ed6531bf9e").unwrap();
        assert!(decode_der(&long_len, &domain).is_err());

        assert!(decode_der(&der[..der.len() - 1], &domain).is_err());
        assert!(decode_der(&[], &domain).is_err());
    }

    #[test]
    fn test_der_long_length() {
        // 801-bit components push the sequence past 127 bytes
        let big = (BigUint::one() << 800u32) + BigUint::one();
        let signature = Signature::new(big.clone(), big.clone());
        let der = encode_der(&signature).unwrap();
        assert_eq!(der[0], 0x30);
        assert_eq!(der[1], 0x81);

        let parsed = DerSignature::from_der(&der).unwrap();
        assert_eq!(BigUint::from_bytes_be(parsed.r.as_bytes()), big);
        assert_eq!(BigUint::from_bytes_be(parsed.s.as_bytes()), big);
    }

    #[test]
    fn test_der_matches_generated_signatures() {
        let domain = fixture_512_160();
        let mut rng = ChaCha20Rng::seed_from_u64(42);
        let pair = KeyPair::generate(&domain, &mut rng).unwrap();
        let digest = Sha256Hasher::default().digest(b"der");

        for _ in 0..10 {
            let signature = sign(&pair.private, &digest, &mut rng).unwrap();
            let der = encode_der(&signature).unwrap();
            assert_eq!(usize::from(der[1]) + 2, der.len());
            assert_eq!(decode_der(&der, &domain).unwrap(), signature);
        }

        // Components outside [1, q-1] are rejected after parsing
        let zero = encode_der(&Signature::new(BigUint::zero(), BigUint::one())).unwrap();
        assert!(matches!(decode_der(&zero, &domain), Err(Error::Decode(_))));
        let wide = encode_der(&Signature::new(domain.q().clone(), BigUint::one())).unwrap();
        assert!(decode_der(&wide, &domain).is_err());
    }

    #[test]
    fn test_encoding_names() {
        assert_eq!("DER".parse::<SignatureEncoding>().unwrap(), SignatureEncoding::Der);
        assert_eq!("binary".parse::<SignatureEncoding>().unwrap(), SignatureEncoding::Binary);
        assert!("pem".parse::<SignatureEncoding>().is_err());
        assert_eq!(SignatureEncoding::default().to_string(), "binary");
    }
}
