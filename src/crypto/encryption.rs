//! XChaCha20-Poly1305 authenticated encryption.
//!
//! The nonce is kept apart from the ciphertext: the vault record and each
//! credential record store it in its own column.  Callers must use a
//! fresh `generate_nonce` for every `seal`.

use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{Key, XChaCha20Poly1305, XNonce};
use rand::RngCore;
use zeroize::Zeroizing;

use super::kdf::KEY_LEN;
use crate::errors::{KoshError, Result};

/// Size of the XChaCha20-Poly1305 nonce in bytes.
pub const NONCE_LEN: usize = 24;

/// Size of the Poly1305 authentication tag appended to every ciphertext.
pub const TAG_LEN: usize = 16;

/// Generate a fresh random 24-byte nonce.
pub fn generate_nonce() -> [u8; NONCE_LEN] {
    let mut nonce = [0u8; NONCE_LEN];
    rand::rng().fill_bytes(&mut nonce);
    nonce
}

/// Encrypt and authenticate `plaintext` under `key` and `nonce`.
pub fn seal(key: &[u8; KEY_LEN], nonce: &[u8; NONCE_LEN], plaintext: &[u8]) -> Result<Vec<u8>> {
    let cipher = XChaCha20Poly1305::new(Key::from_slice(key));

    cipher
        .encrypt(XNonce::from_slice(nonce), plaintext)
        .map_err(|e| KoshError::EncryptionFailed(format!("encryption error: {e}")))
}

/// Verify and decrypt `ciphertext`.
///
/// The nonce length is checked before any cryptographic work.  A tag
/// mismatch yields `DecryptionFailed` and no plaintext at all.
pub fn open(key: &[u8; KEY_LEN], nonce: &[u8], ciphertext: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
    if nonce.len() != NONCE_LEN {
        return Err(KoshError::InvalidLength {
            field: "nonce",
            expected: NONCE_LEN,
            actual: nonce.len(),
        });
    }

    let cipher = XChaCha20Poly1305::new(Key::from_slice(key));

    let plaintext = cipher
        .decrypt(XNonce::from_slice(nonce), ciphertext)
        .map_err(|_| KoshError::DecryptionFailed)?;

    Ok(Zeroizing::new(plaintext))
}
