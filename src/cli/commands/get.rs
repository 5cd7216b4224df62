//! `kosh get`: decrypt a credential by its exact label and user.

use crate::cli::clipboard;
use crate::cli::{prompt_password, Cli, Context};
use crate::errors::Result;

/// Execute the `get` command.
pub fn execute(cli: &Cli, label: &str, user: &str, print: bool) -> Result<()> {
    let ctx = Context::open(cli)?;

    let password = prompt_password()?;
    let secret = ctx.kosh.get(label, user, password.as_bytes())?;

    clipboard::deliver(&secret, print, &ctx.settings)
}
