//! Persisted vault and credential records.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::secret::{SealedSecret, SecretBytes};
use crate::crypto::{Argon2Params, NONCE_LEN, SALT_LEN, X25519_KEY_LEN};
use crate::errors::Result;

/// The singleton vault row: everything needed to unlock the vault
/// private key with the master password.
#[derive(Debug, Clone)]
pub struct VaultRecord {
    /// Argon2id salt, generated once at `init`.
    pub salt: SecretBytes,

    /// Long-term X25519 public key; credentials are encrypted to it.
    pub public_key: SecretBytes,

    /// The vault private key sealed under the password-derived key.
    pub encrypted_private_key: SecretBytes,

    /// Nonce used to seal `encrypted_private_key`.
    pub private_key_nonce: SecretBytes,

    /// KDF cost the unlock key was derived with.
    pub kdf: Argon2Params,

    pub created_at: DateTime<Utc>,
}

impl VaultRecord {
    pub fn salt(&self) -> Result<[u8; SALT_LEN]> {
        self.salt.to_array("salt")
    }

    pub fn public_key(&self) -> Result<[u8; X25519_KEY_LEN]> {
        self.public_key.to_array("public key")
    }

    pub fn private_key_nonce(&self) -> Result<[u8; NONCE_LEN]> {
        self.private_key_nonce.to_array("nonce")
    }
}

/// One stored credential.
#[derive(Debug, Clone)]
pub struct CredentialRecord {
    pub id: i64,
    pub label: String,
    pub user: String,
    pub sealed: SealedSecret,

    /// Number of successful retrievals (subject to baseline resets).
    pub access_count: i64,

    /// Last successful retrieval, `None` if never retrieved.
    pub accessed_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CredentialRecord {
    pub fn summary(&self) -> CredentialSummary {
        CredentialSummary {
            id: self.id,
            label: self.label.clone(),
            user: self.user.clone(),
            access_count: self.access_count,
            created_at: self.created_at,
            updated_at: self.updated_at,
            accessed_at: self.accessed_at,
        }
    }
}

/// Lightweight metadata about a credential (no ciphertext).
///
/// Returned by `Kosh::list` so callers can display credentials without
/// touching any secret material.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CredentialSummary {
    pub id: i64,
    pub label: String,
    pub user: String,
    pub access_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub accessed_at: Option<DateTime<Utc>>,
}
