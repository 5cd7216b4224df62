//! `kosh list`: show stored credentials without decrypting anything.

use crate::cli::output;
use crate::cli::{Cli, Context};
use crate::errors::{KoshError, Result};

/// Execute the `list` command.
pub fn execute(cli: &Cli, label: Option<&str>, user: Option<&str>, json: bool) -> Result<()> {
    let ctx = Context::open(cli)?;

    let credentials = ctx
        .kosh
        .list(label.unwrap_or(""), user.unwrap_or(""))?;

    if json {
        let text = serde_json::to_string_pretty(&credentials)
            .map_err(|e| KoshError::InvalidInput(format!("JSON encoding failed: {e}")))?;
        println!("{text}");
        return Ok(());
    }

    if !credentials.is_empty() {
        output::info(&format!("{} credential(s)", credentials.len()));
    }
    output::print_credentials_table(&credentials);

    Ok(())
}
