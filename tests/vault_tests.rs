//! Integration tests for the kosh vault module.

use chrono::Utc;
use kosh::audit::{AuditLog, NoAudit};
use kosh::config::Settings;
use kosh::crypto::Argon2Params;
use kosh::errors::{ErrorKind, KoshError};
use kosh::vault::{
    decrypt_credential, encrypt_credential, init_vault, unlock_vault, Kosh, SecretBytes,
    SqliteStore, VaultRepository,
};
use tempfile::TempDir;

fn fast_params() -> Argon2Params {
    Argon2Params {
        memory_kib: 8_192,
        iterations: 1,
        parallelism: 1,
    }
}

fn fast_settings() -> Settings {
    Settings {
        argon2_memory_kib: 8_192,
        argon2_iterations: 1,
        argon2_parallelism: 1,
        ..Settings::default()
    }
}

fn service() -> Kosh<SqliteStore, NoAudit> {
    Kosh::new(SqliteStore::open_in_memory().unwrap(), NoAudit, &fast_settings())
}

// ---------------------------------------------------------------------------
// Envelope scheme
// ---------------------------------------------------------------------------

#[test]
fn init_then_unlock_recovers_public_key() {
    let record = init_vault(b"correct-horse", &fast_params()).unwrap();
    let key = unlock_vault(&record, b"correct-horse").unwrap();
    assert_eq!(key.public_key(), record.public_key().unwrap());
}

#[test]
fn unlock_with_wrong_password_is_incorrect_password() {
    let record = init_vault(b"correct-horse", &fast_params()).unwrap();
    let err = unlock_vault(&record, b"battery-staple").unwrap_err();
    assert!(matches!(err, KoshError::IncorrectPassword));
    assert_eq!(err.kind(), ErrorKind::Authentication);
}

#[test]
fn init_rejects_empty_password() {
    assert!(matches!(
        init_vault(b"", &fast_params()),
        Err(KoshError::EmptyField(_))
    ));
}

#[test]
fn credential_roundtrip_through_envelope() {
    let record = init_vault(b"correct-horse", &fast_params()).unwrap();
    let sealed = encrypt_credential(&record.public_key().unwrap(), b"s3cr3t").unwrap();

    assert_eq!(sealed.ephemeral_public_key.len(), 32);
    assert_eq!(sealed.nonce.len(), 24);

    let key = unlock_vault(&record, b"correct-horse").unwrap();
    let secret = decrypt_credential(&key, &sealed).unwrap();
    assert_eq!(secret.as_slice(), b"s3cr3t");
}

#[test]
fn same_secret_encrypts_differently_each_time() {
    let record = init_vault(b"correct-horse", &fast_params()).unwrap();
    let public = record.public_key().unwrap();
    let a = encrypt_credential(&public, b"s3cr3t").unwrap();
    let b = encrypt_credential(&public, b"s3cr3t").unwrap();
    assert_ne!(a.ephemeral_public_key, b.ephemeral_public_key);
    assert_ne!(a.ciphertext, b.ciphertext);
}

#[test]
fn tampered_credential_is_decryption_failure() {
    let record = init_vault(b"correct-horse", &fast_params()).unwrap();
    let mut sealed = encrypt_credential(&record.public_key().unwrap(), b"s3cr3t").unwrap();

    let mut bytes = sealed.ciphertext.as_bytes().to_vec();
    bytes[0] ^= 0x80;
    sealed.ciphertext = SecretBytes::new(bytes);

    let key = unlock_vault(&record, b"correct-horse").unwrap();
    let err = decrypt_credential(&key, &sealed).unwrap_err();
    assert!(matches!(err, KoshError::DecryptionFailed));
}

#[test]
fn wrong_nonce_length_is_rejected_before_decryption() {
    let record = init_vault(b"correct-horse", &fast_params()).unwrap();
    let mut sealed = encrypt_credential(&record.public_key().unwrap(), b"s3cr3t").unwrap();
    sealed.nonce = SecretBytes::new(vec![0u8; 12]);

    let key = unlock_vault(&record, b"correct-horse").unwrap();
    let err = decrypt_credential(&key, &sealed).unwrap_err();
    assert!(matches!(err, KoshError::InvalidLength { field: "nonce", .. }));
}

#[test]
fn swapped_public_key_is_corrupt_record() {
    let mut record = init_vault(b"correct-horse", &fast_params()).unwrap();
    let other = init_vault(b"correct-horse", &fast_params()).unwrap();
    record.public_key = other.public_key.clone();

    let err = unlock_vault(&record, b"correct-horse").unwrap_err();
    assert!(matches!(err, KoshError::CorruptRecord(_)));
    assert_eq!(err.kind(), ErrorKind::Storage);
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

#[test]
fn vault_record_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("kosh.db");

    let record = init_vault(b"correct-horse", &fast_params()).unwrap();
    {
        let store = SqliteStore::open(&path).unwrap();
        store.put_vault_record(&record).unwrap();
    }

    let store = SqliteStore::open(&path).unwrap();
    let loaded = store.vault_record().unwrap();
    assert_eq!(loaded.salt, record.salt);
    assert_eq!(loaded.public_key, record.public_key);
    assert_eq!(loaded.kdf, fast_params());
    assert!(unlock_vault(&loaded, b"correct-horse").is_ok());
}

#[test]
fn second_vault_record_is_refused() {
    let store = SqliteStore::open_in_memory().unwrap();
    let first = init_vault(b"correct-horse", &fast_params()).unwrap();
    let second = init_vault(b"other-password", &fast_params()).unwrap();

    store.put_vault_record(&first).unwrap();
    let err = store.put_vault_record(&second).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadyExists);

    // The original vault is untouched.
    let loaded = store.vault_record().unwrap();
    assert!(unlock_vault(&loaded, b"correct-horse").is_ok());
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

#[test]
fn end_to_end_add_get_search() {
    let kosh = service();
    kosh.init(b"correct-horse").unwrap();

    kosh.add("github", "alice", b"s3cr3t", false).unwrap();

    let secret = kosh.get("github", "alice", b"correct-horse").unwrap();
    assert_eq!(secret.as_slice(), b"s3cr3t");

    let hits = kosh.search("git", "", Utc::now()).unwrap();
    assert_eq!(hits[0].record.label, "github");
    assert_eq!(hits[0].record.access_count, 1);

    let revealed = kosh.reveal(&hits[0], b"correct-horse").unwrap();
    assert_eq!(revealed.as_slice(), b"s3cr3t");

    let summary = &kosh.list("", "").unwrap()[0];
    assert_eq!(summary.access_count, 2);
    assert!(summary.accessed_at.is_some());
}

#[test]
fn get_with_wrong_password_returns_no_secret() {
    let kosh = service();
    kosh.init(b"correct-horse").unwrap();
    kosh.add("github", "alice", b"s3cr3t", false).unwrap();

    let err = kosh.get("github", "alice", b"wrong-horse").unwrap_err();
    assert!(matches!(err, KoshError::IncorrectPassword));

    // A failed attempt is not an access.
    assert_eq!(kosh.list("", "").unwrap()[0].access_count, 0);
}

#[test]
fn init_twice_keeps_first_vault() {
    let kosh = service();
    kosh.init(b"correct-horse").unwrap();

    let err = kosh.init(b"another-password").unwrap_err();
    assert!(matches!(err, KoshError::VaultAlreadyExists(_)));
    assert_eq!(err.exit_code(), 0);

    assert!(kosh.unlock(b"correct-horse").is_ok());
}

#[test]
fn add_collision_requires_overwrite() {
    let kosh = service();
    kosh.init(b"correct-horse").unwrap();
    let id = kosh.add("github", "alice", b"old", false).unwrap();

    let err = kosh.add("github", "alice", b"new", false).unwrap_err();
    assert!(matches!(err, KoshError::CredentialExists { .. }));

    let id2 = kosh.add("github", "alice", b"new", true).unwrap();
    assert_eq!(id, id2);
    assert_eq!(
        kosh.get("github", "alice", b"correct-horse").unwrap().as_slice(),
        b"new"
    );
}

#[test]
fn same_label_different_users_are_distinct() {
    let kosh = service();
    kosh.init(b"correct-horse").unwrap();
    kosh.add("github", "alice", b"a-secret", false).unwrap();
    kosh.add("github", "bob", b"b-secret", false).unwrap();

    assert_eq!(
        kosh.get("github", "bob", b"correct-horse").unwrap().as_slice(),
        b"b-secret"
    );
}

#[test]
fn delete_removes_credential() {
    let kosh = service();
    kosh.init(b"correct-horse").unwrap();
    kosh.add("github", "alice", b"s3cr3t", false).unwrap();

    kosh.delete("github", "alice").unwrap();
    let err = kosh.get("github", "alice", b"correct-horse").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(kosh.delete("github", "alice").is_err());
}

#[test]
fn list_filters_by_substring_ignoring_case() {
    let kosh = service();
    kosh.init(b"correct-horse").unwrap();
    kosh.add("GitHub", "alice", b"1", false).unwrap();
    kosh.add("gitlab", "Bob", b"2", false).unwrap();
    kosh.add("mail", "alice", b"3", false).unwrap();

    let labels: Vec<String> = kosh
        .list("git", "")
        .unwrap()
        .into_iter()
        .map(|s| s.label)
        .collect();
    assert_eq!(labels, vec!["GitHub", "gitlab"]);

    let by_user = kosh.list("", "bob").unwrap();
    assert_eq!(by_user.len(), 1);
    assert_eq!(by_user[0].label, "gitlab");
}

#[test]
fn get_on_uninitialized_vault_is_not_found() {
    let kosh = service();
    let err = kosh.get("github", "alice", b"correct-horse").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn operations_are_audited() {
    let dir = TempDir::new().unwrap();
    let audit = AuditLog::open(dir.path());
    let kosh = Kosh::new(SqliteStore::open_in_memory().unwrap(), audit, &fast_settings());

    kosh.init(b"correct-horse").unwrap();
    kosh.add("github", "alice", b"s3cr3t", false).unwrap();
    kosh.get("github", "alice", b"correct-horse").unwrap();
    kosh.delete("github", "alice").unwrap();

    let log = AuditLog::open(dir.path()).unwrap();
    let ops: Vec<String> = log
        .query(10, None, None)
        .unwrap()
        .into_iter()
        .map(|e| e.operation)
        .collect();
    assert_eq!(ops, vec!["delete", "get", "add", "init"]);
}
