//! # DSA Keystore
//!
//! Everything around the core signature scheme that touches the outside
//! world:
//! - PEM documents for domain parameters (Dss-Parms), public keys (SPKI) and
//!   private keys (PKCS#8, or a passphrase-sealed envelope)
//! - Passphrase protection of private keys (Argon2id + ChaCha20-Poly1305)
//! - Message sources for signing files
//! - A [`Toolkit`] exposing the text-in, text-out workflow
//!
//! ## Example
//!
//! ```rust,ignore
//! use dsa_keystore::Toolkit;
//!
//! let toolkit = Toolkit::new();
//! let (public_pem, private_pem) = toolkit.generate_keypair(Some("passphrase"))?;
//! let signature = toolkit.sign_message(b"hello", &private_pem, Some("passphrase"))?;
//! assert!(toolkit.verify_signature(b"hello", &signature, &public_pem));
//! ```

pub mod armor;
pub mod error;
pub mod protect;
pub mod source;
pub mod toolkit;

pub use error::{KeystoreError, KeystoreResult};
pub use protect::{KdfParams, PassphraseProtector, SealedSecret, SecretProtector};
pub use source::{FileSource, MessageSource};
pub use toolkit::{Toolkit, ToolkitConfig};
