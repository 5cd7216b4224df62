//! `kosh search`: fuzzy-find a credential and retrieve the best match.
//!
//! Usage:
//!   kosh search git               # best match by label
//!   kosh search git ali           # label and user
//!   kosh search git --show        # ranked table, nothing decrypted

use chrono::Utc;

use crate::cli::{clipboard, output};
use crate::cli::{prompt_password, Cli, Context};
use crate::errors::Result;

/// Execute the `search` command.
pub fn execute(cli: &Cli, label: &str, user: Option<&str>, print: bool, show: bool) -> Result<()> {
    let ctx = Context::open(cli)?;

    let hits = ctx.kosh.search(label, user.unwrap_or(""), Utc::now())?;

    let Some(best) = hits.first() else {
        output::warning("No suitable match found.");
        output::tip("Run `kosh list` to see stored credentials.");
        return Ok(());
    };

    if show {
        output::info(&format!("{} match(es)", hits.len()));
        output::print_ranked_table(&hits);
        return Ok(());
    }

    output::info(&format!(
        "Found '{}' ({})",
        best.record.label, best.record.user
    ));

    let password = prompt_password()?;
    let secret = ctx.kosh.reveal(best, password.as_bytes())?;

    clipboard::deliver(&secret, print, &ctx.settings)
}
