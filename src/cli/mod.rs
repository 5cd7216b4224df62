//! CLI module: Clap argument parser, prompts, output helpers, and command
//! implementations.

pub mod clipboard;
pub mod commands;
pub mod output;

use std::io::{IsTerminal, Read};
use std::path::{Path, PathBuf};

use clap::Parser;
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use crate::audit::AuditLog;
use crate::config::{resolve_data_dir, Settings};
use crate::errors::{KoshError, Result};
use crate::vault::{Kosh, SqliteStore, DB_FILE_NAME};

/// Environment variable holding the master password for scripted use.
pub const PASSWORD_ENV: &str = "KOSH_PASSWORD";

/// Minimum password length to prevent trivially weak passwords.
const MIN_PASSWORD_LEN: usize = 8;

/// Largest secret accepted on piped stdin.
const MAX_SECRET_LEN: usize = 64 * 1024;

/// kosh: a local, encrypted password manager.
#[derive(Parser)]
#[command(name = "kosh", about = "Local encrypted password manager", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Data directory (default: $KOSH_HOME or ~/.kosh)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Create the vault and choose a master password
    Init,

    /// Store a credential (prompts for the secret, or reads it from stdin)
    Add {
        /// Label, e.g. a site or service name
        label: String,
        /// User name or account for this credential
        user: String,
        /// Overwrite an existing credential without asking
        #[arg(short, long)]
        force: bool,
    },

    /// Decrypt a credential and copy it to the clipboard
    Get {
        label: String,
        user: String,
        /// Print the secret to stdout instead of copying it
        #[arg(short, long)]
        print: bool,
    },

    /// Fuzzy search credentials and copy the best match
    Search {
        /// Approximate label
        label: String,
        /// Approximate user (optional)
        user: Option<String>,
        /// Print the secret to stdout instead of copying it
        #[arg(short, long)]
        print: bool,
        /// Only show the ranked matches; nothing is decrypted
        #[arg(long, conflicts_with = "print")]
        show: bool,
    },

    /// List stored credentials (no password needed)
    List {
        /// Only labels containing this text
        #[arg(long)]
        label: Option<String>,
        /// Only users containing this text
        #[arg(long)]
        user: Option<String>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Delete a credential
    Delete {
        label: String,
        user: String,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// View the audit log of vault operations
    Audit {
        /// Number of entries to show
        #[arg(long, default_value_t = 50)]
        last: usize,
        /// Only entries newer than this age (e.g. 30m, 24h, 7d, 2w)
        #[arg(long)]
        since: Option<String>,
        /// Only entries for one operation (init, add, update, get, search, delete)
        #[arg(long)]
        op: Option<String>,
    },

    /// Generate shell completion scripts
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// The service as every command uses it.
pub type Service = Kosh<SqliteStore, Option<AuditLog>>;

/// Everything a command needs: where the data lives, the settings loaded
/// from there, and the service wired to the on-disk store.
pub struct Context {
    pub data_dir: PathBuf,
    pub settings: Settings,
    pub kosh: Service,
}

impl Context {
    pub fn open(cli: &Cli) -> Result<Self> {
        let data_dir = data_dir(cli)?;
        let settings = Settings::load(&data_dir)?;

        let store = SqliteStore::open(&data_dir.join(DB_FILE_NAME))?;
        let audit = if settings.audit {
            AuditLog::open(&data_dir)
        } else {
            None
        };

        let kosh = Kosh::new(store, audit, &settings);
        Ok(Self {
            data_dir,
            settings,
            kosh,
        })
    }
}

/// Resolve the data directory from `--data-dir`, `KOSH_HOME`, or `~/.kosh`.
pub fn data_dir(cli: &Cli) -> Result<PathBuf> {
    resolve_data_dir(cli.data_dir.as_deref())
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// Get the master password, trying in order:
/// 1. `KOSH_PASSWORD` env var (scripts)
/// 2. Interactive prompt
///
/// Returns `Zeroizing<String>` so the password is wiped from memory on drop.
pub fn prompt_password() -> Result<Zeroizing<String>> {
    if let Some(pw) = password_from_env() {
        return Ok(pw);
    }

    let pw = dialoguer::Password::new()
        .with_prompt("Master password")
        .interact()
        .map_err(|e| KoshError::Prompt(format!("password prompt: {e}")))?;
    Ok(Zeroizing::new(pw))
}

/// Prompt for a new master password with confirmation (used during `init`).
///
/// Also respects `KOSH_PASSWORD`.  Enforces a minimum length; a
/// confirmation that differs aborts with `PasswordMismatch`.
pub fn prompt_new_password() -> Result<Zeroizing<String>> {
    if let Some(pw) = password_from_env() {
        check_strength(&pw)?;
        return Ok(pw);
    }

    let password = loop {
        let password = Zeroizing::new(
            dialoguer::Password::new()
                .with_prompt("Choose master password")
                .interact()
                .map_err(|e| KoshError::Prompt(format!("password prompt: {e}")))?,
        );

        if check_strength(&password).is_err() {
            output::warning(&format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters. Try again."
            ));
            continue;
        }
        break password;
    };

    let confirmation = Zeroizing::new(
        dialoguer::Password::new()
            .with_prompt("Confirm master password")
            .interact()
            .map_err(|e| KoshError::Prompt(format!("password prompt: {e}")))?,
    );

    if !passwords_match(&password, &confirmation) {
        return Err(KoshError::PasswordMismatch);
    }

    Ok(password)
}

/// Read a credential secret.
///
/// Piped stdin is taken as-is, minus trailing line breaks; on a terminal
/// the secret is typed twice without echo.
pub fn read_secret() -> Result<Zeroizing<String>> {
    let stdin = std::io::stdin();
    if !stdin.is_terminal() {
        return read_piped_secret(stdin.lock());
    }

    let secret = dialoguer::Password::new()
        .with_prompt("Secret")
        .with_confirmation("Confirm secret", "Secrets do not match, try again")
        .interact()
        .map_err(|e| KoshError::Prompt(format!("secret prompt: {e}")))?;
    Ok(Zeroizing::new(secret))
}

/// Read at most `MAX_SECRET_LEN` bytes into a buffer sized up front, so
/// the secret is never copied by a reallocation.
fn read_piped_secret(reader: impl Read) -> Result<Zeroizing<String>> {
    let cap = MAX_SECRET_LEN + 1;
    let mut buf = Zeroizing::new(Vec::with_capacity(cap));
    reader.take(cap as u64).read_to_end(&mut buf)?;
    if buf.len() > MAX_SECRET_LEN {
        return Err(KoshError::InvalidInput(format!(
            "secret is longer than {MAX_SECRET_LEN} bytes"
        )));
    }

    let trimmed_len = buf.len()
        - buf
            .iter()
            .rev()
            .take_while(|&&b| b == b'\n' || b == b'\r')
            .count();
    buf.truncate(trimmed_len);
    if buf.is_empty() {
        return Err(KoshError::EmptyField("secret"));
    }

    match String::from_utf8(std::mem::take(&mut *buf)) {
        Ok(text) => Ok(Zeroizing::new(text)),
        Err(e) => {
            drop(Zeroizing::new(e.into_bytes()));
            Err(KoshError::InvalidInput("secret is not valid UTF-8".into()))
        }
    }
}

/// Ask a yes/no question.  Without a terminal the answer is `false`.
pub fn confirm(prompt: &str) -> Result<bool> {
    if !std::io::stdin().is_terminal() {
        return Ok(false);
    }

    dialoguer::Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .map_err(|e| KoshError::Prompt(format!("confirm prompt: {e}")))
}

fn password_from_env() -> Option<Zeroizing<String>> {
    std::env::var(PASSWORD_ENV)
        .ok()
        .filter(|pw| !pw.is_empty())
        .map(Zeroizing::new)
}

fn check_strength(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(KoshError::WeakPassword(MIN_PASSWORD_LEN));
    }
    Ok(())
}

fn passwords_match(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Path shown to the user for the credential database.
pub fn db_path(data_dir: &Path) -> PathBuf {
    data_dir.join(DB_FILE_NAME)
}
