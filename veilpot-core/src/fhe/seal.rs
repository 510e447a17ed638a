//! Ciphertext sealing for the reference coprocessor.
//!
//! Plaintexts are sealed with ChaCha20Poly1305 under a key derived from the
//! coprocessor passphrase. The ciphertext type tag is bound as associated
//! data so a sealed `euint8` cannot be reopened as an `euint32`.

use super::handle::{FheType, Handle};
use crate::error::{Result, VeilError};
use chacha20poly1305::{
    aead::{Aead, AeadCore, KeyInit, Payload},
    ChaCha20Poly1305, Key, Nonce,
};
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};

const KDF_SALT: &[u8] = b"veilpot/coprocessor/v1";
const NONCE_SIZE: usize = 12;

/// Key material held by the coprocessor: the sealing key and the input
/// verifier secret.
pub struct SealKey {
    cipher_key: Key,
    verifier: [u8; 32],
}

/// A sealed plaintext as it sits in the ciphertext table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedValue {
    pub fhe_type: FheType,
    pub nonce: Vec<u8>,
    pub ciphertext: Vec<u8>,
}

impl SealKey {
    /// Derive both secrets from a passphrase using PBKDF2-SHA256
    pub fn derive(passphrase: &str, iterations: u32) -> Result<Self> {
        use pbkdf2::pbkdf2_hmac;

        if passphrase.is_empty() {
            return Err(VeilError::config("Coprocessor passphrase cannot be empty"));
        }
        if iterations == 0 {
            return Err(VeilError::config("KDF iterations must be greater than 0"));
        }

        let mut okm = [0u8; 64];
        pbkdf2_hmac::<Sha256>(passphrase.as_bytes(), KDF_SALT, iterations, &mut okm);

        let mut verifier = [0u8; 32];
        verifier.copy_from_slice(&okm[32..]);

        Ok(Self {
            cipher_key: *Key::from_slice(&okm[..32]),
            verifier,
        })
    }

    pub fn verifier(&self) -> &[u8; 32] {
        &self.verifier
    }

    pub fn seal(&self, fhe_type: FheType, raw: u32) -> Result<SealedValue> {
        let nonce = ChaCha20Poly1305::generate_nonce(&mut OsRng);
        let cipher = ChaCha20Poly1305::new(&self.cipher_key);
        let plaintext = (raw & fhe_type.mask()).to_le_bytes();

        let ciphertext = cipher
            .encrypt(
                &nonce,
                Payload {
                    msg: &plaintext,
                    aad: &[fhe_type.tag()],
                },
            )
            .map_err(|e| VeilError::crypto(format!("Sealing failed: {}", e)))?;

        Ok(SealedValue {
            fhe_type,
            nonce: nonce.to_vec(),
            ciphertext,
        })
    }

    pub fn open(&self, sealed: &SealedValue) -> Result<u32> {
        if sealed.nonce.len() != NONCE_SIZE {
            return Err(VeilError::crypto("Sealed value has a malformed nonce"));
        }

        let cipher = ChaCha20Poly1305::new(&self.cipher_key);
        let plaintext = cipher
            .decrypt(
                Nonce::from_slice(&sealed.nonce),
                Payload {
                    msg: &sealed.ciphertext,
                    aad: &[sealed.fhe_type.tag()],
                },
            )
            .map_err(|e| VeilError::crypto(format!("Opening failed: {}", e)))?;

        let bytes: [u8; 4] = plaintext
            .as_slice()
            .try_into()
            .map_err(|_| VeilError::crypto("Sealed plaintext has wrong width"))?;
        Ok(u32::from_le_bytes(bytes) & sealed.fhe_type.mask())
    }
}

impl std::fmt::Debug for SealKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SealKey").finish_non_exhaustive()
    }
}

impl SealedValue {
    /// Content address of the sealed value.
    pub fn handle(&self) -> Handle {
        let mut hasher = Sha256::new();
        hasher.update([self.fhe_type.tag()]);
        hasher.update(&self.nonce);
        hasher.update(&self.ciphertext);

        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&hasher.finalize());
        Handle::from_bytes(bytes)
    }
}

/// Compare two tags without an early exit.
pub(crate) fn tags_match(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
