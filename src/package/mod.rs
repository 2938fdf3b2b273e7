//! Encrypted container packaging for fabrication upload.
//!
//! One random AES-128 key and 16-byte nonce are drawn per run and shared by
//! both layers. Each document is encrypted with AES-GCM; the key and nonce
//! are sealed with RSA-OAEP (SHA-256) under the vendor public key.
//!
//! # Container layout
//!
//! ```text
//! ┌──────────────┬────────────────┬────────────┬─────────────┐
//! │ sealed key   │ sealed nonce   │ ciphertext │ GCM tag     │
//! │ (RSA block)  │ (RSA block)    │ (= doc len)│ (16 bytes)  │
//! └──────────────┴────────────────┴────────────┴─────────────┘
//! ```

mod key;

pub use key::VENDOR_PUBLIC_KEY_PEM;

use aes_gcm::aead::consts::U16;
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::aes::Aes128;
use aes_gcm::{AesGcm, Nonce};
use rand::RngCore;
use rand::rngs::OsRng;
use rsa::pkcs8::DecodePublicKey;
use rsa::{Oaep, RsaPublicKey};
use sha2::Sha256;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// AES-128-GCM with a 16-byte nonce.
type SilkCipher = AesGcm<Aes128, U16>;

pub const KEY_LEN: usize = 16;
pub const NONCE_LEN: usize = 16;
pub const TAG_LEN: usize = 16;

#[derive(Debug, Error)]
pub enum PackageError {
    #[error("failed to read public key `{0}`")]
    KeyIo(PathBuf, #[source] std::io::Error),

    #[error("invalid public key: {0}")]
    PublicKey(String),

    #[error("RSA encryption failed")]
    Rsa(#[from] rsa::Error),

    #[error("AES-GCM encryption failed")]
    Cipher,
}

/// Parse a PEM (SubjectPublicKeyInfo) RSA public key.
pub fn parse_public_key(pem: &str) -> Result<RsaPublicKey, PackageError> {
    RsaPublicKey::from_public_key_pem(pem.trim()).map_err(|e| PackageError::PublicKey(e.to_string()))
}

/// Load the public key from `path`, or the embedded vendor key.
pub fn load_public_key(path: Option<&Path>) -> Result<RsaPublicKey, PackageError> {
    match path {
        Some(path) => {
            let pem = fs::read_to_string(path).map_err(|e| PackageError::KeyIo(path.to_path_buf(), e))?;
            parse_public_key(&pem)
        }
        None => parse_public_key(VENDOR_PUBLIC_KEY_PEM),
    }
}

/// Symmetric key material for one run.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionKey {
    pub key: [u8; KEY_LEN],
    pub nonce: [u8; NONCE_LEN],
}

impl SessionKey {
    pub fn generate() -> Self {
        let mut key = [0u8; KEY_LEN];
        let mut nonce = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut key);
        OsRng.fill_bytes(&mut nonce);
        Self { key, nonce }
    }
}

/// Seals documents into vendor containers.
pub struct Packager {
    session: SessionKey,
    sealed_key: Vec<u8>,
    sealed_nonce: Vec<u8>,
}

impl Packager {
    /// Create a packager with a freshly generated session key.
    pub fn new(public_key: &RsaPublicKey) -> Result<Self, PackageError> {
        Self::with_session(public_key, SessionKey::generate())
    }

    /// Create a packager for a given session key.
    ///
    /// Key and nonce are sealed once here and reused by every container.
    pub fn with_session(public_key: &RsaPublicKey, session: SessionKey) -> Result<Self, PackageError> {
        let mut rng = OsRng;
        let sealed_key = public_key.encrypt(&mut rng, Oaep::new::<Sha256>(), &session.key)?;
        let sealed_nonce = public_key.encrypt(&mut rng, Oaep::new::<Sha256>(), &session.nonce)?;
        Ok(Self {
            session,
            sealed_key,
            sealed_nonce,
        })
    }

    /// Build the container bytes for one serialized document.
    pub fn seal(&self, document: &[u8]) -> Result<Vec<u8>, PackageError> {
        let cipher = SilkCipher::new_from_slice(&self.session.key).map_err(|_| PackageError::Cipher)?;
        // The aead output is ciphertext followed by the tag.
        let encrypted = cipher
            .encrypt(Nonce::<U16>::from_slice(&self.session.nonce), document)
            .map_err(|_| PackageError::Cipher)?;

        let header = self.sealed_key.len() + self.sealed_nonce.len();
        let mut container = Vec::with_capacity(header + document.len() + TAG_LEN);
        container.extend_from_slice(&self.sealed_key);
        container.extend_from_slice(&self.sealed_nonce);
        container.extend_from_slice(&encrypted);
        Ok(container)
    }
}
