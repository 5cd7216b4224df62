//! Vault module: the envelope scheme and credential storage.
//!
//! This module provides:
//! - `SecretBytes` and `SealedSecret` binary value types (`secret`)
//! - Persisted `VaultRecord` / `CredentialRecord` types (`record`)
//! - Vault and credential encryption (`envelope`)
//! - The `VaultRepository` trait and its SQLite implementation (`store`)
//! - The `Kosh` service used by the CLI (`service`)

pub mod envelope;
pub mod record;
pub mod secret;
pub mod service;
pub mod store;

// Re-export the most commonly used items.
pub use envelope::{decrypt_credential, encrypt_credential, init_vault, unlock_vault};
pub use record::{CredentialRecord, CredentialSummary, VaultRecord};
pub use secret::{SealedSecret, SecretBytes};
pub use service::{Kosh, SearchHit};
pub use store::{SqliteStore, VaultRepository};

/// File name of the credential database inside the data directory.
pub const DB_FILE_NAME: &str = "kosh.db";
