//! Persistence for the vault row and credential rows.
//!
//! `VaultRepository` is the seam the rest of the crate talks to;
//! `SqliteStore` is the on-disk implementation at `<data_dir>/kosh.db`.
//! Binary columns hold standard base64 text (see `SecretBytes`), and
//! timestamps are RFC 3339 strings.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::debug;

use super::record::{CredentialRecord, VaultRecord};
use super::secret::SealedSecret;
use crate::crypto::Argon2Params;
use crate::errors::{KoshError, Result};

/// Storage operations needed by the envelope scheme and the search engine.
pub trait VaultRepository {
    /// Where the vault lives, for messages.
    fn location(&self) -> &Path;

    /// `true` once `init` has stored the vault row.
    fn vault_exists(&self) -> Result<bool>;

    /// The vault row, or `VaultNotInitialized`.
    fn vault_record(&self) -> Result<VaultRecord>;

    /// Store the vault row.  Fails with `VaultAlreadyExists` if one is
    /// already present; the existing row is never replaced.
    fn put_vault_record(&self, record: &VaultRecord) -> Result<()>;

    /// Look up a credential by its `(label, user)` key.
    fn credential(&self, label: &str, user: &str) -> Result<CredentialRecord>;

    /// Insert or overwrite the credential keyed by `(label, user)` and
    /// return its id.  Access statistics survive an overwrite.
    fn put_credential(&self, label: &str, user: &str, sealed: &SealedSecret) -> Result<i64>;

    fn list_credentials(&self) -> Result<Vec<CredentialRecord>>;

    fn delete_credential(&self, id: i64) -> Result<()>;

    /// Add `delta` to the access count, stamp `accessed_at`, and return
    /// the new count.
    fn bump_access(&self, id: i64, delta: i64, at: DateTime<Utc>) -> Result<i64>;

    /// Subtract `by` from every access count, clamping at zero.  Returns
    /// the number of rows touched.
    fn reset_access_baseline(&self, by: i64) -> Result<usize>;
}

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS vault (
    id              INTEGER PRIMARY KEY CHECK (id = 1),
    public_key      TEXT NOT NULL,
    secret          TEXT NOT NULL,
    nonce           TEXT NOT NULL,
    salt            TEXT NOT NULL,
    kdf_memory_kib  INTEGER NOT NULL,
    kdf_iterations  INTEGER NOT NULL,
    kdf_parallelism INTEGER NOT NULL,
    created_at      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS credentials (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    label        TEXT NOT NULL,
    user         TEXT NOT NULL,
    access_count INTEGER NOT NULL DEFAULT 0,
    secret       TEXT NOT NULL,
    ephemeral    TEXT NOT NULL,
    nonce        TEXT NOT NULL,
    created_at   TEXT NOT NULL,
    updated_at   TEXT NOT NULL,
    accessed_at  TEXT,
    UNIQUE (label, user)
);
";

const CREDENTIAL_COLUMNS: &str =
    "id, label, user, secret, ephemeral, nonce, access_count, accessed_at, created_at, updated_at";

/// SQLite-backed vault storage.
pub struct SqliteStore {
    conn: Connection,
    path: PathBuf,
}

impl SqliteStore {
    /// Open (or create) the database at `path`, creating the parent
    /// directory and the schema if needed.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
                // Owner-only data directory.
                #[cfg(unix)]
                {
                    use std::os::unix::fs::PermissionsExt;
                    fs::set_permissions(parent, fs::Permissions::from_mode(0o700))?;
                }
            }
        }

        let conn = Connection::open(path)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
        }

        Self::with_connection(conn, path.to_path_buf())
    }

    /// A throwaway in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?, PathBuf::from(":memory:"))
    }

    fn with_connection(conn: Connection, path: PathBuf) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        debug!(path = %path.display(), "opened credential store");
        Ok(Self { conn, path })
    }
}

impl VaultRepository for SqliteStore {
    fn location(&self) -> &Path {
        &self.path
    }

    fn vault_exists(&self) -> Result<bool> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM vault", [], |row| row.get(0))?;
        Ok(count > 0)
    }

    fn vault_record(&self) -> Result<VaultRecord> {
        self.conn
            .query_row(
                "SELECT public_key, secret, nonce, salt,
                        kdf_memory_kib, kdf_iterations, kdf_parallelism, created_at
                 FROM vault WHERE id = 1",
                [],
                |row| {
                    Ok(VaultRecord {
                        public_key: row.get(0)?,
                        encrypted_private_key: row.get(1)?,
                        private_key_nonce: row.get(2)?,
                        salt: row.get(3)?,
                        kdf: Argon2Params {
                            memory_kib: row.get(4)?,
                            iterations: row.get(5)?,
                            parallelism: row.get(6)?,
                        },
                        created_at: timestamp(row, 7)?,
                    })
                },
            )
            .optional()?
            .ok_or(KoshError::VaultNotInitialized)
    }

    fn put_vault_record(&self, record: &VaultRecord) -> Result<()> {
        if self.vault_exists()? {
            return Err(KoshError::VaultAlreadyExists(self.path.clone()));
        }

        self.conn.execute(
            "INSERT INTO vault (id, public_key, secret, nonce, salt,
                                kdf_memory_kib, kdf_iterations, kdf_parallelism, created_at)
             VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                record.public_key,
                record.encrypted_private_key,
                record.private_key_nonce,
                record.salt,
                record.kdf.memory_kib,
                record.kdf.iterations,
                record.kdf.parallelism,
                record.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn credential(&self, label: &str, user: &str) -> Result<CredentialRecord> {
        let sql = format!("SELECT {CREDENTIAL_COLUMNS} FROM credentials WHERE label = ?1 AND user = ?2");
        self.conn
            .query_row(&sql, params![label, user], credential_from_row)
            .optional()?
            .ok_or_else(|| KoshError::CredentialNotFound(format!("'{label}' ({user})")))
    }

    fn put_credential(&self, label: &str, user: &str, sealed: &SealedSecret) -> Result<i64> {
        let now = Utc::now().to_rfc3339();
        let id = self.conn.query_row(
            "INSERT INTO credentials (label, user, secret, ephemeral, nonce, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
             ON CONFLICT (label, user) DO UPDATE SET
                 secret = excluded.secret,
                 ephemeral = excluded.ephemeral,
                 nonce = excluded.nonce,
                 updated_at = excluded.updated_at
             RETURNING id",
            params![
                label,
                user,
                sealed.ciphertext,
                sealed.ephemeral_public_key,
                sealed.nonce,
                now,
            ],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    fn list_credentials(&self) -> Result<Vec<CredentialRecord>> {
        let sql = format!("SELECT {CREDENTIAL_COLUMNS} FROM credentials ORDER BY label, user");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], credential_from_row)?;

        let mut credentials = Vec::new();
        for row in rows {
            credentials.push(row?);
        }
        Ok(credentials)
    }

    fn delete_credential(&self, id: i64) -> Result<()> {
        let affected = self
            .conn
            .execute("DELETE FROM credentials WHERE id = ?1", params![id])?;
        if affected == 0 {
            return Err(KoshError::CredentialNotFound(format!("id {id}")));
        }
        Ok(())
    }

    fn bump_access(&self, id: i64, delta: i64, at: DateTime<Utc>) -> Result<i64> {
        self.conn
            .query_row(
                "UPDATE credentials
                 SET access_count = access_count + ?1, accessed_at = ?2
                 WHERE id = ?3
                 RETURNING access_count",
                params![delta, at.to_rfc3339(), id],
                |row| row.get(0),
            )
            .optional()?
            .ok_or_else(|| KoshError::CredentialNotFound(format!("id {id}")))
    }

    fn reset_access_baseline(&self, by: i64) -> Result<usize> {
        let affected = self.conn.execute(
            "UPDATE credentials SET access_count = MAX(access_count - ?1, 0)
             WHERE access_count > 0",
            params![by],
        )?;
        Ok(affected)
    }
}

fn credential_from_row(row: &Row<'_>) -> rusqlite::Result<CredentialRecord> {
    let accessed_at = match row.get::<_, Option<String>>(7)? {
        Some(text) => Some(parse_timestamp(&text, 7)?),
        None => None,
    };

    Ok(CredentialRecord {
        id: row.get(0)?,
        label: row.get(1)?,
        user: row.get(2)?,
        sealed: SealedSecret {
            ciphertext: row.get(3)?,
            ephemeral_public_key: row.get(4)?,
            nonce: row.get(5)?,
        },
        access_count: row.get(6)?,
        accessed_at,
        created_at: timestamp(row, 8)?,
        updated_at: timestamp(row, 9)?,
    })
}

fn timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let text: String = row.get(idx)?;
    parse_timestamp(&text, idx)
}

fn parse_timestamp(text: &str, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
