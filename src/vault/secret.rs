//! Typed binary values stored in the vault.
//!
//! Every binary column (salt, keys, nonces, ciphertexts) is a
//! `SecretBytes`.  In memory it is raw bytes; it only becomes base64 text
//! at the SQLite boundary, through the `ToSql`/`FromSql` impls below.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::errors::{KoshError, Result};

/// Raw bytes with a fixed textual encoding at the persistence boundary.
#[derive(Clone, PartialEq, Eq, Default, Zeroize, ZeroizeOnDrop)]
pub struct SecretBytes(Vec<u8>);

impl SecretBytes {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Copy into a fixed-size array, failing if the length is wrong.
    ///
    /// `field` names the value in the resulting error.
    pub fn to_array<const N: usize>(&self, field: &'static str) -> Result<[u8; N]> {
        self.0
            .as_slice()
            .try_into()
            .map_err(|_| KoshError::InvalidLength {
                field,
                expected: N,
                actual: self.0.len(),
            })
    }

    /// Standard base64 text, as persisted.
    pub fn to_base64(&self) -> String {
        BASE64.encode(&self.0)
    }

    pub fn from_base64(text: &str) -> Result<Self> {
        BASE64
            .decode(text)
            .map(Self)
            .map_err(|e| KoshError::CorruptRecord(format!("invalid base64: {e}")))
    }
}

impl From<Vec<u8>> for SecretBytes {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl<const N: usize> From<[u8; N]> for SecretBytes {
    fn from(bytes: [u8; N]) -> Self {
        Self(bytes.to_vec())
    }
}

impl std::fmt::Debug for SecretBytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SecretBytes({} bytes)", self.0.len())
    }
}

impl ToSql for SecretBytes {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.to_base64()))
    }
}

impl FromSql for SecretBytes {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let text = value.as_str()?;
        BASE64
            .decode(text)
            .map(Self)
            .map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

/// The three values that protect one credential secret.
///
/// Produced by `envelope::encrypt_credential`, persisted alongside the
/// label and user, consumed by `envelope::decrypt_credential`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedSecret {
    /// Public half of the one-shot key pair generated for this credential.
    pub ephemeral_public_key: SecretBytes,
    /// XChaCha20-Poly1305 ciphertext including the tag.
    pub ciphertext: SecretBytes,
    /// Nonce used for `ciphertext`.
    pub nonce: SecretBytes,
}
