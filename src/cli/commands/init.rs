//! `kosh init`: create the vault and set the master password.

use crate::cli::output;
use crate::cli::{db_path, prompt_new_password, Cli, Context};
use crate::errors::{KoshError, Result};

/// Execute the `init` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let ctx = Context::open(cli)?;

    // 1. Refuse before prompting if a vault is already there.
    if ctx.kosh.is_initialized()? {
        output::tip("Use `kosh add <label> <user>` to store credentials in the existing vault.");
        return Err(KoshError::VaultAlreadyExists(db_path(&ctx.data_dir)));
    }

    // 2. Prompt for a new password (with confirmation).
    let password = prompt_new_password()?;

    // 3. Derive, generate and seal; one row is written at the end.
    ctx.kosh.init(password.as_bytes())?;

    output::success(&format!("Vault created in {}", ctx.data_dir.display()));
    output::tip("Run `kosh add <label> <user>` to store a credential.");
    output::tip("Run `kosh search <label>` to find one later.");

    Ok(())
}
