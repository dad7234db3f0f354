//! Text-in, text-out signing workflow
//!
//! Keys travel as armored text, signatures as hex. Private keys are sealed
//! with a passphrase when one is given.

use crate::armor;
use crate::error::{KeystoreError, KeystoreResult};
use crate::protect::{KdfParams, PassphraseProtector};
use crate::source::{FileSource, MessageSource};
use dsa_core::{
    codec, hasher_by_name, sign_with_config, verify, Digest, DomainParameters, GenerationConfig,
    KeyPair, MessageHasher, PrivateKey, Sha256Hasher, SignatureEncoding, SigningConfig,
};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Serializable toolkit settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolkitConfig {
    pub generation: GenerationConfig,
    pub signing: SigningConfig,
    /// Hash function name, see [`hasher_by_name`]
    pub hash: String,
    /// `binary` or `der`
    pub encoding: String,
    pub kdf: KdfParams,
}

impl Default for ToolkitConfig {
    fn default() -> Self {
        Self {
            generation: GenerationConfig::default(),
            signing: SigningConfig::default(),
            hash: "SHA-256".to_string(),
            encoding: SignatureEncoding::default().to_string(),
            kdf: KdfParams::default(),
        }
    }
}

impl ToolkitConfig {
    pub fn from_json(text: &str) -> KeystoreResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> KeystoreResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }
}

/// Key generation, signing and verification over armored keys
pub struct Toolkit {
    generation: GenerationConfig,
    signing: SigningConfig,
    hasher: Box<dyn MessageHasher>,
    encoding: SignatureEncoding,
    kdf: KdfParams,
    source: Box<dyn MessageSource>,
}

impl Default for Toolkit {
    fn default() -> Self {
        Self::new()
    }
}

impl Toolkit {
    /// SHA-256, fixed-width signatures, default sizes and KDF costs
    pub fn new() -> Self {
        Self {
            generation: GenerationConfig::default(),
            signing: SigningConfig::default(),
            hasher: Box::new(Sha256Hasher::default()),
            encoding: SignatureEncoding::Binary,
            kdf: KdfParams::default(),
            source: Box::new(FileSource::new()),
        }
    }

    pub fn from_config(config: &ToolkitConfig) -> KeystoreResult<Self> {
        let hasher = hasher_by_name(&config.hash).ok_or_else(|| {
            dsa_core::Error::InvalidParameters(format!("unknown hash function {}", config.hash))
        })?;
        let encoding = config.encoding.parse::<SignatureEncoding>()?;
        Ok(Self::new()
            .with_generation_config(config.generation.clone())
            .with_signing_config(config.signing.clone())
            .with_hasher(hasher)
            .with_encoding(encoding)
            .with_kdf_params(config.kdf))
    }

    pub fn with_generation_config(mut self, config: GenerationConfig) -> Self {
        self.generation = config;
        self
    }

    pub fn with_signing_config(mut self, config: SigningConfig) -> Self {
        self.signing = config;
        self
    }

    pub fn with_hasher(mut self, hasher: Box<dyn MessageHasher>) -> Self {
        self.hasher = hasher;
        self
    }

    pub fn with_encoding(mut self, encoding: SignatureEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn with_kdf_params(mut self, kdf: KdfParams) -> Self {
        self.kdf = kdf;
        self
    }

    /// Replace where `sign_file`/`verify_signature_file` read from
    pub fn with_source(mut self, source: Box<dyn MessageSource>) -> Self {
        self.source = source;
        self
    }

    pub fn generation_config(&self) -> &GenerationConfig {
        &self.generation
    }

    pub fn hasher(&self) -> &dyn MessageHasher {
        self.hasher.as_ref()
    }

    pub fn encoding(&self) -> SignatureEncoding {
        self.encoding
    }

    /// Fresh domain parameters at the configured size
    pub fn generate_domain(&self) -> KeystoreResult<Arc<DomainParameters>> {
        Ok(Arc::new(DomainParameters::generate(
            &self.generation,
            &mut OsRng,
        )?))
    }

    /// Generate fresh domain parameters and a keypair in them.
    ///
    /// Returns `(public_pem, private_pem)`. The private key is sealed when
    /// a non-empty passphrase is given.
    pub fn generate_keypair(&self, passphrase: Option<&str>) -> KeystoreResult<(String, String)> {
        let domain = self.generate_domain()?;
        self.generate_keypair_in(&domain, passphrase)
    }

    /// Generate a keypair in existing domain parameters.
    #[instrument(skip_all, fields(p_bits = domain.p().bits(), protected = passphrase_of(passphrase).is_some()))]
    pub fn generate_keypair_in(
        &self,
        domain: &Arc<DomainParameters>,
        passphrase: Option<&str>,
    ) -> KeystoreResult<(String, String)> {
        let pair = KeyPair::generate(domain, &mut OsRng)?;
        let public_pem = armor::encode_public_key(&pair.public)?;
        let private_pem = match passphrase_of(passphrase) {
            Some(passphrase) => {
                let protector = self.protector(passphrase);
                armor::encode_private_key(&pair.private, Some(&protector))?
            }
            None => armor::encode_private_key(&pair.private, None)?,
        };

        info!(fingerprint = %pair.public.fingerprint(), "Keypair exported");
        Ok((public_pem, private_pem))
    }

    /// Decode an armored private key, opening it with `passphrase` if sealed.
    pub fn load_private_key(
        &self,
        private_pem: &str,
        passphrase: Option<&str>,
    ) -> KeystoreResult<PrivateKey> {
        match passphrase_of(passphrase) {
            Some(passphrase) => {
                let protector = self.protector(passphrase);
                armor::decode_private_key(private_pem, Some(&protector))
            }
            None => armor::decode_private_key(private_pem, None),
        }
    }

    /// Sign `message`, returning the signature as hex.
    #[instrument(skip_all, fields(len = message.len()))]
    pub fn sign_message(
        &self,
        message: &[u8],
        private_pem: &str,
        passphrase: Option<&str>,
    ) -> KeystoreResult<String> {
        let key = self.load_private_key(private_pem, passphrase)?;
        self.sign_digest(&key, &self.hasher.digest(message))
    }

    /// Sign the contents of a file, streaming it through the hasher.
    #[instrument(skip(self, private_pem, passphrase))]
    pub fn sign_file(
        &self,
        identifier: &str,
        private_pem: &str,
        passphrase: Option<&str>,
    ) -> KeystoreResult<String> {
        let key = self.load_private_key(private_pem, passphrase)?;
        let digest = self.digest_source(identifier)?;
        self.sign_digest(&key, &digest)
    }

    /// Check a hex signature over `message`. Anything malformed counts as
    /// a rejection.
    pub fn verify_signature(&self, message: &[u8], signature_hex: &str, public_pem: &str) -> bool {
        self.verify_digest(&self.hasher.digest(message), signature_hex, public_pem)
    }

    /// Check a hex signature over a file. I/O errors are returned; bad keys
    /// or signatures are a rejection.
    #[instrument(skip(self, signature_hex, public_pem))]
    pub fn verify_signature_file(
        &self,
        identifier: &str,
        signature_hex: &str,
        public_pem: &str,
    ) -> KeystoreResult<bool> {
        let digest = self.digest_source(identifier)?;
        Ok(self.verify_digest(&digest, signature_hex, public_pem))
    }

    fn protector(&self, passphrase: &str) -> PassphraseProtector {
        PassphraseProtector::new(passphrase).with_params(self.kdf)
    }

    fn digest_source(&self, identifier: &str) -> KeystoreResult<Digest> {
        let mut reader = self.source.open(identifier)?;
        Ok(self.hasher.digest_reader(&mut *reader)?)
    }

    fn sign_digest(&self, key: &PrivateKey, digest: &Digest) -> KeystoreResult<String> {
        let signature = sign_with_config(key, digest, &self.signing, &mut OsRng)?;
        let bytes = codec::encode_as(&signature, key.domain(), self.encoding)?;
        debug!(hash = self.hasher.name(), encoding = %self.encoding, "Signed");
        Ok(hex::encode(bytes))
    }

    fn verify_digest(&self, digest: &Digest, signature_hex: &str, public_pem: &str) -> bool {
        let key = match armor::decode_public_key(public_pem) {
            Ok(key) => key,
            Err(e) => {
                warn!("Rejecting signature, unusable public key: {}", e);
                return false;
            }
        };
        let signature = hex::decode(signature_hex.trim())
            .map_err(|e| KeystoreError::Format(e.to_string()))
            .and_then(|bytes| {
                codec::decode_as(&bytes, key.domain(), self.encoding).map_err(KeystoreError::from)
            });
        match signature {
            Ok(signature) => verify(&key, digest, &signature),
            Err(e) => {
                debug!("Rejecting malformed signature: {}", e);
                false
            }
        }
    }
}

impl std::fmt::Debug for Toolkit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Toolkit")
            .field("size", &self.generation.size)
            .field("hash", &self.hasher.name())
            .field("encoding", &self.encoding)
            .finish()
    }
}

/// An empty passphrase means no protection.
fn passphrase_of(passphrase: Option<&str>) -> Option<&str> {
    passphrase.filter(|p| !p.is_empty())
}
