//! The `Kosh` service: every vault operation the CLI performs.
//!
//! The service owns a repository and an audit sink, both injected, so the
//! same code runs against the on-disk store and an in-memory one in tests.
//! It never prompts or prints; secrets come in and go out as bytes.

use chrono::{DateTime, Utc};
use tracing::{debug, info};
use zeroize::Zeroizing;

use super::envelope::{decrypt_credential, encrypt_credential, init_vault, unlock_vault};
use super::record::{CredentialRecord, CredentialSummary};
use super::store::VaultRepository;
use crate::audit::AuditSink;
use crate::config::Settings;
use crate::crypto::{Argon2Params, VaultPrivateKey};
use crate::errors::{KoshError, Result};
use crate::search;

/// One search result, detached from the record list it was ranked from.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub record: CredentialRecord,
    pub score: f64,
}

pub struct Kosh<R, A> {
    repo: R,
    audit: A,
    kdf: Argon2Params,
    min_score: f64,
    reset_threshold: i64,
}

impl<R: VaultRepository, A: AuditSink> Kosh<R, A> {
    pub fn new(repo: R, audit: A, settings: &Settings) -> Self {
        Self {
            repo,
            audit,
            kdf: settings.argon2_params(),
            min_score: settings.min_score,
            reset_threshold: settings.access_count_reset_threshold,
        }
    }

    // ------------------------------------------------------------------
    // Vault
    // ------------------------------------------------------------------

    pub fn is_initialized(&self) -> Result<bool> {
        self.repo.vault_exists()
    }

    /// Create the vault.  An existing vault is left untouched and
    /// reported as `VaultAlreadyExists`.
    pub fn init(&self, password: &[u8]) -> Result<()> {
        if self.repo.vault_exists()? {
            return Err(KoshError::VaultAlreadyExists(
                self.repo.location().to_path_buf(),
            ));
        }

        let record = init_vault(password, &self.kdf)?;
        self.repo.put_vault_record(&record)?;

        info!(
            memory_kib = self.kdf.memory_kib,
            iterations = self.kdf.iterations,
            parallelism = self.kdf.parallelism,
            "vault initialized"
        );
        let cost = format!(
            "argon2id m={} t={} p={}",
            self.kdf.memory_kib, self.kdf.iterations, self.kdf.parallelism
        );
        self.audit.record("init", None, None, Some(&cost));
        Ok(())
    }

    /// Check the master password and return the unlocked private key.
    pub fn unlock(&self, password: &[u8]) -> Result<VaultPrivateKey> {
        let record = self.repo.vault_record()?;
        unlock_vault(&record, password)
    }

    // ------------------------------------------------------------------
    // Credentials
    // ------------------------------------------------------------------

    pub fn credential_exists(&self, label: &str, user: &str) -> Result<bool> {
        match self.repo.credential(label, user) {
            Ok(_) => Ok(true),
            Err(KoshError::CredentialNotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Encrypt `secret` to the vault public key and store it under
    /// `(label, user)`.
    ///
    /// Only the public key is used, so no password is needed.  An existing
    /// credential is replaced only when `overwrite` is set.
    pub fn add(&self, label: &str, user: &str, secret: &[u8], overwrite: bool) -> Result<i64> {
        validate_key(label, user)?;
        if secret.is_empty() {
            return Err(KoshError::EmptyField("secret"));
        }

        let exists = self.credential_exists(label, user)?;
        if exists && !overwrite {
            return Err(KoshError::CredentialExists {
                label: label.to_string(),
                user: user.to_string(),
            });
        }

        let public_key = self.repo.vault_record()?.public_key()?;
        let sealed = encrypt_credential(&public_key, secret)?;
        let id = self.repo.put_credential(label, user, &sealed)?;

        let op = if exists { "update" } else { "add" };
        debug!(id, label, user, op, "credential stored");
        self.audit.record(op, Some(label), Some(user), None);
        Ok(id)
    }

    /// Decrypt the credential stored under `(label, user)` and count the
    /// access.
    pub fn get(&self, label: &str, user: &str, password: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        let record = self.repo.credential(label, user)?;
        let private_key = self.unlock(password)?;
        let secret = decrypt_credential(&private_key, &record.sealed)?;

        self.record_access(&record, Utc::now())?;
        self.audit.record("get", Some(label), Some(user), None);
        Ok(secret)
    }

    /// Rank every stored credential against the query.
    ///
    /// Nothing is decrypted; pass a hit to [`Kosh::reveal`] for that.
    pub fn search(
        &self,
        query_label: &str,
        query_user: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<SearchHit>> {
        let records = self.repo.list_credentials()?;
        let hits = search::rank(query_label, query_user, &records, self.min_score, now)
            .into_iter()
            .map(|ranked| SearchHit {
                record: ranked.record.clone(),
                score: ranked.score,
            })
            .collect();
        Ok(hits)
    }

    /// Decrypt a search hit and count the access.  The audit entry keeps
    /// the score the hit was chosen with.
    pub fn reveal(&self, hit: &SearchHit, password: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        let record = &hit.record;
        let private_key = self.unlock(password)?;
        let secret = decrypt_credential(&private_key, &record.sealed)?;

        self.record_access(record, Utc::now())?;
        let score = format!("score {:.3}", hit.score);
        self.audit
            .record("search", Some(&record.label), Some(&record.user), Some(&score));
        Ok(secret)
    }

    pub fn delete(&self, label: &str, user: &str) -> Result<()> {
        let record = self.repo.credential(label, user)?;
        self.repo.delete_credential(record.id)?;

        debug!(id = record.id, label, user, "credential deleted");
        self.audit.record("delete", Some(label), Some(user), None);
        Ok(())
    }

    /// Summaries of every credential whose label and user contain the
    /// given filters, ignoring case.  Empty filters match everything.
    pub fn list(&self, label_filter: &str, user_filter: &str) -> Result<Vec<CredentialSummary>> {
        let label_filter = label_filter.to_lowercase();
        let user_filter = user_filter.to_lowercase();

        Ok(self
            .repo
            .list_credentials()?
            .iter()
            .filter(|c| c.label.to_lowercase().contains(&label_filter))
            .filter(|c| c.user.to_lowercase().contains(&user_filter))
            .map(CredentialRecord::summary)
            .collect())
    }

    fn record_access(&self, record: &CredentialRecord, at: DateTime<Utc>) -> Result<()> {
        let count = self.repo.bump_access(record.id, 1, at)?;
        debug!(id = record.id, access_count = count, "access recorded");

        if self.reset_threshold > 0 && count > self.reset_threshold {
            let rows = self.repo.reset_access_baseline(self.reset_threshold)?;
            info!(by = self.reset_threshold, rows, "access counts rebased");
        }
        Ok(())
    }
}

fn validate_key(label: &str, user: &str) -> Result<()> {
    if label.trim().is_empty() {
        return Err(KoshError::EmptyField("label"));
    }
    if user.trim().is_empty() {
        return Err(KoshError::EmptyField("user"));
    }
    Ok(())
}
