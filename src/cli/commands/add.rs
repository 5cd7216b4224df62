//! `kosh add`: store a credential.
//!
//! Usage:
//!   kosh add github alice                 # secret typed twice, no echo
//!   printf 's3cr3t' | kosh add github alice
//!   kosh add github alice --force         # overwrite without asking

use crate::cli::output;
use crate::cli::{confirm, prompt_password, read_secret, Cli, Context};
use crate::errors::{KoshError, Result};

/// Execute the `add` command.
pub fn execute(cli: &Cli, label: &str, user: &str, force: bool) -> Result<()> {
    let ctx = Context::open(cli)?;

    // Verify the master password before touching any credential.
    let password = prompt_password()?;
    ctx.kosh.unlock(password.as_bytes())?;

    let exists = ctx.kosh.credential_exists(label, user)?;
    if exists && !force && !confirm(&format!("Credential '{label}' ({user}) exists. Overwrite?"))? {
        output::tip("Pass --force to overwrite without a prompt.");
        return Err(KoshError::CredentialExists {
            label: label.to_string(),
            user: user.to_string(),
        });
    }

    let secret = read_secret()?;
    ctx.kosh.add(label, user, secret.as_bytes(), exists)?;

    if exists {
        output::success(&format!("Updated credential '{label}' ({user})"));
    } else {
        output::success(&format!("Added credential '{label}' ({user})"));
    }

    Ok(())
}
