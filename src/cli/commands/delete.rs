//! `kosh delete`: remove a credential from the vault.

use crate::cli::output;
use crate::cli::{confirm, prompt_password, Cli, Context};
use crate::errors::{KoshError, Result};

/// Execute the `delete` command.
pub fn execute(cli: &Cli, label: &str, user: &str, force: bool) -> Result<()> {
    let ctx = Context::open(cli)?;

    // Fail on an unknown credential before asking for anything.
    if !ctx.kosh.credential_exists(label, user)? {
        return Err(KoshError::CredentialNotFound(format!("'{label}' ({user})")));
    }

    let password = prompt_password()?;
    ctx.kosh.unlock(password.as_bytes())?;

    // Unless --force is set, ask for confirmation before deleting.
    if !force && !confirm(&format!("Delete credential '{label}' ({user})?"))? {
        output::info("Cancelled.");
        return Ok(());
    }

    ctx.kosh.delete(label, user)?;
    output::success(&format!("Deleted credential '{label}' ({user})"));

    Ok(())
}
