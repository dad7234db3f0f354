//! PEM text encoding of domain parameters and keys
//!
//! Documents use the layouts OpenSSL reads and writes. `DSA PARAMETERS`
//! holds a DER `Dss-Parms`, `PUBLIC KEY` a SubjectPublicKeyInfo and
//! `PRIVATE KEY` an unencrypted PKCS#8 `PrivateKeyInfo`, all under the
//! `id-dsa` algorithm identifier. Passphrase-protected keys use a DER
//! envelope of their own under `ENCRYPTED DSA PRIVATE KEY`: the
//! SubjectPublicKeyInfo, the KDF costs and the sealed secret scalar.

use crate::error::{KeystoreError, KeystoreResult};
use crate::protect::{KdfParams, SealedSecret, SecretProtector};
use base64::{engine::general_purpose::STANDARD, Engine};
use der::asn1::{AnyRef, BitStringRef, OctetStringRef, UintRef};
use der::{Decode, Encode, Sequence};
use dsa_core::arith::DEFAULT_MILLER_RABIN_ROUNDS;
use dsa_core::{DomainParameters, PrivateKey, PublicKey};
use num_bigint::BigUint;
use pkcs8::PrivateKeyInfo;
use rand::rngs::OsRng;
use spki::{AlgorithmIdentifierRef, ObjectIdentifier, SubjectPublicKeyInfoRef};
use std::sync::Arc;
use tracing::debug;
use zeroize::Zeroizing;

pub const LABEL_PARAMETERS: &str = "DSA PARAMETERS";
pub const LABEL_PUBLIC_KEY: &str = "PUBLIC KEY";
pub const LABEL_PRIVATE_KEY: &str = "PRIVATE KEY";
pub const LABEL_ENCRYPTED_PRIVATE_KEY: &str = "ENCRYPTED DSA PRIVATE KEY";

/// `id-dsa` (RFC 3279)
pub const DSA_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10040.4.1");

/// `Dss-Parms ::= SEQUENCE { p INTEGER, q INTEGER, g INTEGER }`
#[derive(Clone, Copy, Debug, Eq, PartialEq, Sequence)]
struct DssParms<'a> {
    p: UintRef<'a>,
    q: UintRef<'a>,
    g: UintRef<'a>,
}

#[derive(Clone, Debug, Sequence)]
struct SealedKey<'a> {
    public_key: SubjectPublicKeyInfoRef<'a>,
    m_cost: u32,
    t_cost: u32,
    p_cost: u32,
    salt: OctetStringRef<'a>,
    nonce: OctetStringRef<'a>,
    ciphertext: OctetStringRef<'a>,
}

const LINE_WIDTH: usize = 64;

/// Wrap `body` in BEGIN/END lines under `label`.
pub fn armor(label: &str, body: &[u8]) -> String {
    let encoded = STANDARD.encode(body);
    let mut out = format!("-----BEGIN {}-----\n", label);
    for chunk in encoded.as_bytes().chunks(LINE_WIDTH) {
        // base64 output is ASCII
        out.push_str(&String::from_utf8_lossy(chunk));
        out.push('\n');
    }
    out.push_str(&format!("-----END {}-----\n", label));
    out
}

/// Split an armored document into its label and decoded body.
pub fn unarmor(text: &str) -> KeystoreResult<(String, Vec<u8>)> {
    let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty());

    let label = lines
        .next()
        .and_then(|l| l.strip_prefix("-----BEGIN "))
        .and_then(|l| l.strip_suffix("-----"))
        .ok_or_else(|| format_err("missing BEGIN line"))?
        .to_string();
    let end = format!("-----END {}-----", label);

    let mut encoded = String::new();
    let mut closed = false;
    for line in lines.by_ref() {
        if line == end {
            closed = true;
            break;
        }
        encoded.push_str(line);
    }
    if !closed {
        return Err(format_err("missing END line"));
    }
    if lines.next().is_some() {
        return Err(format_err("trailing data after END line"));
    }

    let body = STANDARD
        .decode(encoded.as_bytes())
        .map_err(|e| format_err(&format!("invalid base64: {}", e)))?;
    Ok((label, body))
}

/// Label of an armored document without decoding its body.
pub fn peek_label(text: &str) -> KeystoreResult<String> {
    unarmor(text).map(|(label, _)| label)
}

pub fn encode_parameters(domain: &DomainParameters) -> KeystoreResult<String> {
    Ok(armor(LABEL_PARAMETERS, &parameters_der(domain)?))
}

/// Decode a parameters document. Imported domains must pass the same
/// primality checks generated ones do.
pub fn decode_parameters(text: &str) -> KeystoreResult<DomainParameters> {
    let bytes = open_document(text, LABEL_PARAMETERS)?;
    let domain = domain_from_parms(DssParms::from_der(&bytes)?)?;
    domain.validate(DEFAULT_MILLER_RABIN_ROUNDS, &mut OsRng)?;
    Ok(domain)
}

pub fn encode_public_key(key: &PublicKey) -> KeystoreResult<String> {
    Ok(armor(LABEL_PUBLIC_KEY, &public_key_der(key.domain(), key.y())?))
}

pub fn decode_public_key(text: &str) -> KeystoreResult<PublicKey> {
    let bytes = open_document(text, LABEL_PUBLIC_KEY)?;
    public_from_spki(&SubjectPublicKeyInfoRef::from_der(&bytes)?)
}

/// Encode a private key. With a protector the secret scalar is sealed and
/// the public key is authenticated alongside it; without one the key is
/// written as plain PKCS#8.
pub fn encode_private_key(
    key: &PrivateKey,
    protector: Option<&dyn SecretProtector>,
) -> KeystoreResult<String> {
    match protector {
        Some(protector) => {
            let public = key.public_key();
            let spki = public_key_der(public.domain(), public.y())?;
            let sealed = protector.seal(key.expose_secret_bytes(), &spki)?;
            let envelope = sealed_key_der(&spki, &sealed)?;
            debug!(fingerprint = %public.fingerprint(), "Private key sealed");
            Ok(armor(LABEL_ENCRYPTED_PRIVATE_KEY, &envelope))
        }
        None => {
            let parms = parameters_der(key.domain())?;
            let x = Zeroizing::new(UintRef::new(key.expose_secret_bytes())?.to_der()?);
            let info = PrivateKeyInfo::new(dsa_algorithm(&parms)?, &x);
            let der = Zeroizing::new(info.to_der()?);
            Ok(armor(LABEL_PRIVATE_KEY, &der))
        }
    }
}

/// Decode a private key, opening it with `protector` when it is sealed.
pub fn decode_private_key(
    text: &str,
    protector: Option<&dyn SecretProtector>,
) -> KeystoreResult<PrivateKey> {
    let (label, bytes) = unarmor(text)?;
    let bytes = Zeroizing::new(bytes);

    match label.as_str() {
        LABEL_PRIVATE_KEY => plain_private_key(&bytes),
        LABEL_ENCRYPTED_PRIVATE_KEY => {
            let envelope = SealedKey::from_der(&bytes)?;
            let public = public_from_spki(&envelope.public_key)?;
            let protector = protector.ok_or(KeystoreError::PassphraseRequired)?;

            let sealed = SealedSecret {
                kdf: KdfParams {
                    m_cost: envelope.m_cost,
                    t_cost: envelope.t_cost,
                    p_cost: envelope.p_cost,
                },
                salt: envelope.salt.as_bytes().to_vec(),
                nonce: envelope.nonce.as_bytes().to_vec(),
                ciphertext: envelope.ciphertext.as_bytes().to_vec(),
            };
            let x = protector.open(&sealed, &envelope.public_key.to_der()?)?;
            let key = PrivateKey::from_secret_bytes(public.domain().clone(), &x)?;

            if key.public_key() != public {
                return Err(format_err("public value does not match secret"));
            }
            Ok(key)
        }
        other => Err(format_err(&format!("unexpected label {}", other))),
    }
}

/// Whether an armored private key needs a passphrase to open
pub fn is_encrypted(text: &str) -> KeystoreResult<bool> {
    Ok(peek_label(text)? == LABEL_ENCRYPTED_PRIVATE_KEY)
}

/// Public key held by, or derivable from, a key document. Sealed secrets
/// are left unopened.
pub fn public_part(text: &str) -> KeystoreResult<PublicKey> {
    let (label, bytes) = unarmor(text)?;
    match label.as_str() {
        LABEL_PUBLIC_KEY => public_from_spki(&SubjectPublicKeyInfoRef::from_der(&bytes)?),
        LABEL_PRIVATE_KEY => Ok(plain_private_key(&Zeroizing::new(bytes))?.public_key()),
        LABEL_ENCRYPTED_PRIVATE_KEY => public_from_spki(&SealedKey::from_der(&bytes)?.public_key),
        other => Err(format_err(&format!("{} holds no public key", other))),
    }
}

fn plain_private_key(bytes: &[u8]) -> KeystoreResult<PrivateKey> {
    let info = PrivateKeyInfo::from_der(bytes)?;
    let domain = Arc::new(domain_from_algorithm(&info.algorithm)?);
    let x = UintRef::from_der(info.private_key)?;
    Ok(PrivateKey::from_secret_bytes(domain, x.as_bytes())?)
}

fn parameters_der(domain: &DomainParameters) -> KeystoreResult<Vec<u8>> {
    let p = domain.p().to_bytes_be();
    let q = domain.q().to_bytes_be();
    let g = domain.g().to_bytes_be();
    let parms = DssParms {
        p: UintRef::new(&p)?,
        q: UintRef::new(&q)?,
        g: UintRef::new(&g)?,
    };
    Ok(parms.to_der()?)
}

fn dsa_algorithm(parms: &[u8]) -> KeystoreResult<AlgorithmIdentifierRef<'_>> {
    Ok(AlgorithmIdentifierRef {
        oid: DSA_OID,
        parameters: Some(AnyRef::from_der(parms)?),
    })
}

/// SubjectPublicKeyInfo whose key is the DER INTEGER `y`
fn public_key_der(domain: &DomainParameters, y: &BigUint) -> KeystoreResult<Vec<u8>> {
    let parms = parameters_der(domain)?;
    let y = y.to_bytes_be();
    let y = UintRef::new(&y)?.to_der()?;
    let info = SubjectPublicKeyInfoRef {
        algorithm: dsa_algorithm(&parms)?,
        subject_public_key: BitStringRef::from_bytes(&y)?,
    };
    Ok(info.to_der()?)
}

fn sealed_key_der(spki: &[u8], sealed: &SealedSecret) -> KeystoreResult<Vec<u8>> {
    let envelope = SealedKey {
        public_key: SubjectPublicKeyInfoRef::from_der(spki)?,
        m_cost: sealed.kdf.m_cost,
        t_cost: sealed.kdf.t_cost,
        p_cost: sealed.kdf.p_cost,
        salt: OctetStringRef::new(&sealed.salt)?,
        nonce: OctetStringRef::new(&sealed.nonce)?,
        ciphertext: OctetStringRef::new(&sealed.ciphertext)?,
    };
    Ok(envelope.to_der()?)
}

fn public_from_spki(info: &SubjectPublicKeyInfoRef<'_>) -> KeystoreResult<PublicKey> {
    let domain = Arc::new(domain_from_algorithm(&info.algorithm)?);
    let y = info
        .subject_public_key
        .as_bytes()
        .ok_or_else(|| format_err("public key bit string is not octet aligned"))?;
    let y = UintRef::from_der(y)?;
    Ok(PublicKey::new(domain, uint(y))?)
}

fn domain_from_algorithm(
    algorithm: &AlgorithmIdentifierRef<'_>,
) -> KeystoreResult<DomainParameters> {
    if algorithm.oid != DSA_OID {
        return Err(format_err(&format!("unsupported algorithm {}", algorithm.oid)));
    }
    let parms = algorithm
        .parameters
        .ok_or_else(|| format_err("missing DSA parameters"))?
        .decode_as::<DssParms<'_>>()?;
    domain_from_parms(parms)
}

fn domain_from_parms(parms: DssParms<'_>) -> KeystoreResult<DomainParameters> {
    Ok(DomainParameters::new(
        uint(parms.p),
        uint(parms.q),
        uint(parms.g),
    )?)
}

fn uint(value: UintRef<'_>) -> BigUint {
    BigUint::from_bytes_be(value.as_bytes())
}

fn open_document(text: &str, expected: &str) -> KeystoreResult<Vec<u8>> {
    let (label, bytes) = unarmor(text)?;
    if label != expected {
        return Err(format_err(&format!(
            "expected {} but found {}",
            expected, label
        )));
    }
    Ok(bytes)
}

fn format_err(message: &str) -> KeystoreError {
    KeystoreError::Format(message.to_string())
}
