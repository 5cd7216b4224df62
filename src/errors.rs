use std::path::PathBuf;
use thiserror::Error;

/// All errors that can occur in kosh.
#[derive(Debug, Error)]
pub enum KoshError {
    // --- Authentication ---
    #[error("Master password is incorrect")]
    IncorrectPassword,

    #[error("Decryption failed — credential data is corrupted or was tampered with")]
    DecryptionFailed,

    // --- Validation ---
    #[error("Invalid {field} length: expected {expected} bytes, got {actual}")]
    InvalidLength {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("{0} cannot be empty")]
    EmptyField(&'static str),

    #[error("Password mismatch — passwords do not match")]
    PasswordMismatch,

    #[error("Password must be at least {0} characters")]
    WeakPassword(usize),

    #[error("Key derivation failed: {0}")]
    KeyDerivationFailed(String),

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Config file error: {0}")]
    ConfigError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // --- Not found ---
    #[error("Vault is not initialized — run `kosh init` first")]
    VaultNotInitialized,

    #[error("No credential found for {0}")]
    CredentialNotFound(String),

    // --- Already exists ---
    #[error("Vault already exists at {0}")]
    VaultAlreadyExists(PathBuf),

    #[error("Credential '{label}' ({user}) already exists")]
    CredentialExists { label: String, user: String },

    // --- Storage ---
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt record: {0}")]
    CorruptRecord(String),

    #[error("Prompt failed: {0}")]
    Prompt(String),

    #[error("Clipboard error: {0}")]
    Clipboard(String),

    #[error("Audit error: {0}")]
    AuditError(String),
}

/// Coarse classification of a [`KoshError`].
///
/// Callers branch on the kind rather than on individual variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// AEAD tag mismatch: wrong master password or tampered credential.
    Authentication,
    /// Malformed input caught before any cryptographic operation.
    Validation,
    /// No vault, or no credential for the requested label/user.
    NotFound,
    /// The thing being created is already there. Benign.
    AlreadyExists,
    /// I/O, database, or corrupted persisted data.
    Storage,
}

impl KoshError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::IncorrectPassword | Self::DecryptionFailed => ErrorKind::Authentication,

            Self::InvalidLength { .. }
            | Self::EmptyField(_)
            | Self::PasswordMismatch
            | Self::WeakPassword(_)
            | Self::KeyDerivationFailed(_)
            | Self::EncryptionFailed(_)
            | Self::ConfigError(_)
            | Self::InvalidInput(_) => ErrorKind::Validation,

            Self::VaultNotInitialized | Self::CredentialNotFound(_) => ErrorKind::NotFound,

            Self::VaultAlreadyExists(_) | Self::CredentialExists { .. } => {
                ErrorKind::AlreadyExists
            }

            Self::Database(_)
            | Self::Io(_)
            | Self::CorruptRecord(_)
            | Self::Prompt(_)
            | Self::Clipboard(_)
            | Self::AuditError(_) => ErrorKind::Storage,
        }
    }

    /// Process exit code for this error.
    ///
    /// `AlreadyExists` is a no-op and exits cleanly.
    pub fn exit_code(&self) -> i32 {
        match self.kind() {
            ErrorKind::AlreadyExists => 0,
            ErrorKind::Authentication => 126,
            _ => 1,
        }
    }
}

/// Convenience type alias for kosh results.
pub type Result<T> = std::result::Result<T, KoshError>;
