//! Cryptographic primitives for kosh.
//!
//! This module provides:
//! - XChaCha20-Poly1305 seal and open (`encryption`)
//! - Argon2id password-based key derivation (`kdf`)
//! - X25519 key pairs and hashed shared keys (`keys`)

pub mod encryption;
pub mod kdf;
pub mod keys;

// Re-export the most commonly used items so callers can write:
//   use crate::crypto::{seal, open, derive_key, ...};
pub use encryption::{generate_nonce, open, seal, NONCE_LEN, TAG_LEN};
pub use kdf::{derive_key, generate_salt, Argon2Params, KEY_LEN, SALT_LEN};
pub use keys::{derive_shared_key, generate_key_pair, KeyPair, VaultPrivateKey, X25519_KEY_LEN};
