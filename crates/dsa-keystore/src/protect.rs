//! Passphrase protection of secret scalars
//!
//! A [`SecretProtector`] turns a secret into a [`SealedSecret`] record and
//! back. [`PassphraseProtector`] derives a 256-bit key with Argon2id and
//! encrypts under ChaCha20-Poly1305, binding the caller's associated data
//! (the public half of the key) into the tag.

use crate::error::{KeystoreError, KeystoreResult};
use argon2::{Algorithm, Argon2, Params, Version};
use chacha20poly1305::aead::{Aead, KeyInit, Payload};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use zeroize::Zeroizing;

pub const SALT_LEN: usize = 16;
pub const NONCE_LEN: usize = 12;
pub const KEY_LEN: usize = 32;

/// Upper bound on the memory cost accepted from a stored record (KiB)
const MAX_M_COST: u32 = 1 << 22;

/// Argon2id cost parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    /// Memory in KiB
    pub m_cost: u32,
    /// Iterations
    pub t_cost: u32,
    /// Lanes
    pub p_cost: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            m_cost: Params::DEFAULT_M_COST,
            t_cost: Params::DEFAULT_T_COST,
            p_cost: Params::DEFAULT_P_COST,
        }
    }
}

impl KdfParams {
    fn argon2(&self) -> KeystoreResult<Argon2<'static>> {
        if self.m_cost > MAX_M_COST {
            return Err(KeystoreError::Kdf(format!(
                "memory cost {} KiB exceeds limit",
                self.m_cost
            )));
        }
        let params = Params::new(self.m_cost, self.t_cost, self.p_cost, Some(KEY_LEN))
            .map_err(|e| KeystoreError::Kdf(e.to_string()))?;
        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

/// Encrypted secret together with everything needed to open it except the
/// passphrase
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedSecret {
    pub kdf: KdfParams,
    pub salt: Vec<u8>,
    pub nonce: Vec<u8>,
    pub ciphertext: Vec<u8>,
}

/// Seals and opens secret key material
pub trait SecretProtector: Send + Sync {
    /// Encrypt `secret`, authenticating `aad` with it
    fn seal(&self, secret: &[u8], aad: &[u8]) -> KeystoreResult<SealedSecret>;

    /// Decrypt a sealed record produced with the same `aad`
    fn open(&self, sealed: &SealedSecret, aad: &[u8]) -> KeystoreResult<Zeroizing<Vec<u8>>>;
}

/// Argon2id + ChaCha20-Poly1305 protector keyed by a passphrase
pub struct PassphraseProtector {
    passphrase: Zeroizing<String>,
    params: KdfParams,
}

impl PassphraseProtector {
    pub fn new(passphrase: &str) -> Self {
        Self {
            passphrase: Zeroizing::new(passphrase.to_string()),
            params: KdfParams::default(),
        }
    }

    /// Cost parameters used for sealing. Opening always uses the
    /// parameters stored in the record.
    pub fn with_params(mut self, params: KdfParams) -> Self {
        self.params = params;
        self
    }

    pub fn params(&self) -> &KdfParams {
        &self.params
    }

    fn derive_key(&self, kdf: &KdfParams, salt: &[u8]) -> KeystoreResult<Zeroizing<[u8; KEY_LEN]>> {
        let mut key = Zeroizing::new([0u8; KEY_LEN]);
        kdf.argon2()?
            .hash_password_into(self.passphrase.as_bytes(), salt, &mut *key)
            .map_err(|e| KeystoreError::Kdf(e.to_string()))?;
        Ok(key)
    }
}

impl SecretProtector for PassphraseProtector {
    #[instrument(skip_all, fields(m_cost = self.params.m_cost))]
    fn seal(&self, secret: &[u8], aad: &[u8]) -> KeystoreResult<SealedSecret> {
        let mut salt = vec![0u8; SALT_LEN];
        let mut nonce = vec![0u8; NONCE_LEN];
        OsRng
            .try_fill_bytes(&mut salt)
            .and_then(|_| OsRng.try_fill_bytes(&mut nonce))
            .map_err(dsa_core::Error::from)?;

        let key = self.derive_key(&self.params, &salt)?;
        let cipher = ChaCha20Poly1305::new(Key::from_slice(&key[..]));
        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&nonce), Payload { msg: secret, aad })
            .map_err(|_| KeystoreError::Format("encryption failed".into()))?;

        Ok(SealedSecret {
            kdf: self.params,
            salt,
            nonce,
            ciphertext,
        })
    }

    fn open(&self, sealed: &SealedSecret, aad: &[u8]) -> KeystoreResult<Zeroizing<Vec<u8>>> {
        if sealed.salt.len() != SALT_LEN || sealed.nonce.len() != NONCE_LEN {
            return Err(KeystoreError::Format("bad salt or nonce length".into()));
        }

        let key = self.derive_key(&sealed.kdf, &sealed.salt)?;
        let cipher = ChaCha20Poly1305::new(Key::from_slice(&key[..]));
        cipher
            .decrypt(
                Nonce::from_slice(&sealed.nonce),
                Payload {
                    msg: &sealed.ciphertext,
                    aad,
                },
            )
            .map(Zeroizing::new)
            .map_err(|_| KeystoreError::WrongPassphrase)
    }
}

impl std::fmt::Debug for PassphraseProtector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PassphraseProtector")
            .field("passphrase", &"[REDACTED]")
            .field("params", &self.params)
            .finish()
    }
}
