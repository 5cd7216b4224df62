//! The envelope scheme protecting the vault and every credential.
//!
//! Two layers:
//!
//! 1. **Vault key.**  An X25519 key pair is generated at `init`.  Its
//!    private half is sealed with XChaCha20-Poly1305 under a key derived
//!    from the master password (Argon2id).  There is no separate password
//!    hash: the AEAD tag on the sealed private key is the only password
//!    check.
//!
//! 2. **Credentials.**  Each secret is encrypted ECIES-style: a fresh
//!    ephemeral key pair, X25519 against the vault public key, SHA-256 of
//!    the shared point as the cipher key.  Only the ephemeral *public* key
//!    is stored.  Decrypting needs the vault private key, so adding a
//!    credential never needs the password, but reading one always does.
//!
//! ```text
//! password ──Argon2id(salt)──▶ unlock key ──open──▶ vault private key
//!                                                        │
//!                        ephemeral public key ──X25519───┘
//!                                                        │
//!                                                 SHA-256 ──open──▶ secret
//! ```

use chrono::Utc;
use tracing::debug;
use x25519_dalek::PublicKey;
use zeroize::Zeroizing;

use super::record::VaultRecord;
use super::secret::SealedSecret;
use crate::crypto::{
    derive_key, derive_shared_key, generate_key_pair, generate_nonce, generate_salt, open, seal,
    Argon2Params, VaultPrivateKey, NONCE_LEN, X25519_KEY_LEN,
};
use crate::errors::{KoshError, Result};

/// Create the vault key material for a new vault.
///
/// Nothing is persisted here; the caller stores the returned record.
pub fn init_vault(password: &[u8], params: &Argon2Params) -> Result<VaultRecord> {
    if password.is_empty() {
        return Err(KoshError::EmptyField("master password"));
    }

    let salt = generate_salt();
    let unlock_key = derive_key(password, &salt, params)?;

    let pair = generate_key_pair();
    let private_bytes = Zeroizing::new(pair.secret.to_bytes());

    let nonce = generate_nonce();
    let encrypted_private_key = seal(&unlock_key, &nonce, private_bytes.as_slice())?;

    debug!("vault key pair generated and sealed");

    Ok(VaultRecord {
        salt: salt.into(),
        public_key: pair.public.to_bytes().into(),
        encrypted_private_key: encrypted_private_key.into(),
        private_key_nonce: nonce.into(),
        kdf: *params,
        created_at: Utc::now(),
    })
}

/// Recover the vault private key with the master password.
///
/// A failed tag check on the sealed private key means the password is
/// wrong and is reported as `IncorrectPassword`.
pub fn unlock_vault(record: &VaultRecord, password: &[u8]) -> Result<VaultPrivateKey> {
    let salt = record.salt()?;
    let nonce = record.private_key_nonce()?;
    let expected_public = record.public_key()?;

    let unlock_key = derive_key(password, &salt, &record.kdf)?;

    let private_bytes = open(
        &unlock_key,
        &nonce,
        record.encrypted_private_key.as_bytes(),
    )
    .map_err(|e| match e {
        KoshError::DecryptionFailed => KoshError::IncorrectPassword,
        other => other,
    })?;

    let private_key = VaultPrivateKey::from_slice(&private_bytes)?;
    if private_key.public_key() != expected_public {
        return Err(KoshError::CorruptRecord(
            "vault private key does not match the stored public key".into(),
        ));
    }

    Ok(private_key)
}

/// Encrypt one credential secret to the vault public key.
pub fn encrypt_credential(
    vault_public_key: &[u8; X25519_KEY_LEN],
    secret: &[u8],
) -> Result<SealedSecret> {
    let ephemeral = generate_key_pair();
    let key = derive_shared_key(&ephemeral.secret, &PublicKey::from(*vault_public_key));
    let ephemeral_public = ephemeral.public.to_bytes();
    // The ephemeral secret must not outlive the shared key computation.
    drop(ephemeral);

    let nonce = generate_nonce();
    let ciphertext = seal(&key, &nonce, secret)?;

    Ok(SealedSecret {
        ephemeral_public_key: ephemeral_public.into(),
        ciphertext: ciphertext.into(),
        nonce: nonce.into(),
    })
}

/// Decrypt one credential secret with the unlocked vault private key.
///
/// An authentication failure here means the stored credential was
/// modified; it is never retried with another key.
pub fn decrypt_credential(
    private_key: &VaultPrivateKey,
    sealed: &SealedSecret,
) -> Result<Zeroizing<Vec<u8>>> {
    let nonce: [u8; NONCE_LEN] = sealed.nonce.to_array("nonce")?;
    let ephemeral: [u8; X25519_KEY_LEN] =
        sealed.ephemeral_public_key.to_array("ephemeral public key")?;

    let key = private_key.shared_key(&ephemeral);
    open(&key, &nonce, sealed.ciphertext.as_bytes())
}

