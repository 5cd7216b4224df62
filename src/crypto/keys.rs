//! X25519 key pairs and shared-key derivation.
//!
//! The vault owns one long-term key pair; every credential gets a fresh
//! ephemeral key pair at encryption time.  The raw Diffie-Hellman output
//! is not uniformly random, so it is always hashed with SHA-256 before
//! being used as a cipher key.

use rand::RngCore;
use sha2::digest::generic_array::GenericArray;
use sha2::{Digest, Sha256};
use x25519_dalek::{PublicKey, StaticSecret};
use zeroize::{Zeroize, Zeroizing};

use super::kdf::KEY_LEN;
use crate::errors::{KoshError, Result};

/// Length of an X25519 public or private key in bytes.
pub const X25519_KEY_LEN: usize = 32;

/// A freshly generated X25519 key pair.
///
/// The secret half zeroizes itself when dropped.
pub struct KeyPair {
    pub secret: StaticSecret,
    pub public: PublicKey,
}

/// Generate a key pair from 32 bytes of CSPRNG output.
pub fn generate_key_pair() -> KeyPair {
    let mut bytes = [0u8; X25519_KEY_LEN];
    rand::rng().fill_bytes(&mut bytes);
    let secret = StaticSecret::from(bytes);
    bytes.zeroize();

    let public = PublicKey::from(&secret);
    KeyPair { secret, public }
}

/// Hash the X25519 shared point between `secret` and `peer` into a
/// 32-byte symmetric key.
///
/// The shared point itself is zeroized when it goes out of scope here.
pub fn derive_shared_key(secret: &StaticSecret, peer: &PublicKey) -> Zeroizing<[u8; KEY_LEN]> {
    let shared = secret.diffie_hellman(peer);

    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    Sha256::new_with_prefix(shared.as_bytes())
        .finalize_into(GenericArray::from_mut_slice(key.as_mut_slice()));
    key
}

/// The unlocked vault private key.
///
/// Only ever lives for the duration of one operation; the inner secret is
/// zeroized on drop.
pub struct VaultPrivateKey {
    secret: StaticSecret,
}

impl VaultPrivateKey {
    /// Rebuild the key from decrypted bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let mut raw: [u8; X25519_KEY_LEN] =
            bytes.try_into().map_err(|_| KoshError::InvalidLength {
                field: "private key",
                expected: X25519_KEY_LEN,
                actual: bytes.len(),
            })?;
        let secret = StaticSecret::from(raw);
        raw.zeroize();
        Ok(Self { secret })
    }

    /// The public key matching this private key.
    pub fn public_key(&self) -> [u8; X25519_KEY_LEN] {
        PublicKey::from(&self.secret).to_bytes()
    }

    /// Hashed shared key with a peer public key.
    pub fn shared_key(&self, peer: &[u8; X25519_KEY_LEN]) -> Zeroizing<[u8; KEY_LEN]> {
        derive_shared_key(&self.secret, &PublicKey::from(*peer))
    }
}

impl std::fmt::Debug for VaultPrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultPrivateKey")
            .field("secret", &"[REDACTED]")
            .finish()
    }
}
