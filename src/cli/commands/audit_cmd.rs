//! `kosh audit`: show recent vault activity.
//!
//! ```text
//! kosh audit                    # newest 50 entries
//! kosh audit --last 20 --op get
//! kosh audit --since 2w
//! ```

use chrono::{DateTime, Duration, Utc};

use crate::audit::AuditLog;
use crate::cli::{data_dir, output, Cli};
use crate::errors::{KoshError, Result};

pub fn execute(cli: &Cli, last: usize, since: Option<&str>, op: Option<&str>) -> Result<()> {
    let dir = data_dir(cli)?;
    let cutoff = since.map(|s| parse_since(s, Utc::now())).transpose()?;

    if !AuditLog::db_path(&dir).exists() {
        output::info("The audit log is empty.");
        return Ok(());
    }

    let log = AuditLog::open(&dir)
        .ok_or_else(|| KoshError::AuditError("could not open audit.db".into()))?;

    let entries = log.query(last, cutoff, op)?;

    if entries.is_empty() {
        output::info("No matching audit entries.");
    } else {
        output::print_audit_table(&entries);
    }
    Ok(())
}

/// Turn a relative age such as `90s`, `30m`, `24h`, `7d` or `2w` into the
/// instant that far before `now`.
fn parse_since(input: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
    let input = input.trim();
    let invalid = || {
        KoshError::InvalidInput(format!(
            "invalid duration '{input}': expected a number followed by s, m, h, d or w"
        ))
    };

    let split = input.len().checked_sub(1).ok_or_else(invalid)?;
    if !input.is_char_boundary(split) {
        return Err(invalid());
    }
    let (amount, unit) = input.split_at(split);
    let amount: i64 = amount.parse().map_err(|_| invalid())?;
    if amount < 0 {
        return Err(invalid());
    }

    let age = match unit {
        "s" => Duration::try_seconds(amount),
        "m" => Duration::try_minutes(amount),
        "h" => Duration::try_hours(amount),
        "d" => Duration::try_days(amount),
        "w" => Duration::try_weeks(amount),
        _ => None,
    }
    .ok_or_else(invalid)?;

    now.checked_sub_signed(age).ok_or_else(invalid)
}
