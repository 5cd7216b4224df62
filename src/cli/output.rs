//! Colored terminal output helpers.
//!
//! All user-facing output goes through these functions so we get
//! consistent styling across every command.

use chrono::{DateTime, Utc};
use comfy_table::{ContentArrangement, Table};
use console::style;

use crate::audit::AuditEntry;
use crate::vault::{CredentialSummary, SearchHit};

/// Print a green success message: "check_mark {msg}"
pub fn success(msg: &str) {
    println!("{} {}", style("\u{2713}").green().bold(), msg);
}

/// Print a red error message: "x_mark {msg}"
pub fn error(msg: &str) {
    eprintln!("{} {}", style("\u{2717}").red().bold(), msg);
}

/// Print a yellow warning: "warning_sign {msg}"
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("\u{26a0}").yellow().bold(), msg);
}

/// Print a blue info message: "info_sign {msg}"
pub fn info(msg: &str) {
    println!("{} {}", style("\u{2139}").blue().bold(), msg);
}

/// Print a dim tip/hint: "arrow {msg}"
pub fn tip(msg: &str) {
    println!("{} {}", style("\u{2192}").dim(), style(msg).dim());
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S").to_string()
}

fn last_used(at: Option<DateTime<Utc>>) -> String {
    at.map_or_else(|| "never".to_string(), timestamp)
}

/// Print a table of credential metadata.
pub fn print_credentials_table(credentials: &[CredentialSummary]) {
    if credentials.is_empty() {
        info("No credentials found.");
        tip("Run `kosh add <label> <user>` to store one.");
        return;
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["ID", "Label", "User", "Uses", "Last used", "Updated"]);

    for c in credentials {
        table.add_row(vec![
            c.id.to_string(),
            c.label.clone(),
            c.user.clone(),
            c.access_count.to_string(),
            last_used(c.accessed_at),
            timestamp(c.updated_at),
        ]);
    }

    println!("{table}");
}

/// Print search hits, best first, with their scores.
pub fn print_ranked_table(hits: &[SearchHit]) {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["#", "Label", "User", "Score", "Uses", "Last used"]);

    for (i, hit) in hits.iter().enumerate() {
        table.add_row(vec![
            (i + 1).to_string(),
            hit.record.label.clone(),
            hit.record.user.clone(),
            format!("{:.3}", hit.score),
            hit.record.access_count.to_string(),
            last_used(hit.record.accessed_at),
        ]);
    }

    println!("{table}");
}

/// Print audit entries, newest first.
pub fn print_audit_table(entries: &[AuditEntry]) {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["When", "Operation", "Label", "User", "Details"]);

    let dash = |field: &Option<String>| field.as_deref().unwrap_or("-").to_string();
    for entry in entries {
        let op = entry.operation.as_str();
        let op = match op {
            "init" | "add" => style(op).green(),
            "update" => style(op).yellow(),
            "delete" => style(op).red(),
            "get" | "search" => style(op).cyan(),
            _ => style(op),
        };
        table.add_row(vec![
            timestamp(entry.timestamp),
            op.to_string(),
            dash(&entry.label),
            dash(&entry.user),
            dash(&entry.details),
        ]);
    }

    println!("{table}");
}
