//! System clipboard access.
//!
//! On Linux the clipboard is served by the process that set it: X11 and
//! Wayland hand the contents out on request, and they are gone once the
//! owner exits. There kosh stays alive for `clipboard_timeout_secs`, or
//! until another program takes the clipboard over.

use std::time::Duration;

use arboard::Clipboard;

use crate::config::Settings;
use crate::errors::{KoshError, Result};

/// Put `secret` on the system clipboard as text, serving it for up to
/// `hold` where the platform needs an owner.
pub fn copy_text(secret: &[u8], hold: Duration) -> Result<()> {
    let text = std::str::from_utf8(secret)
        .map_err(|_| KoshError::Clipboard("secret is not valid UTF-8".into()))?;

    let mut clipboard = Clipboard::new().map_err(|e| KoshError::Clipboard(e.to_string()))?;
    set_text(&mut clipboard, text, hold).map_err(|e| KoshError::Clipboard(e.to_string()))
}

#[cfg(target_os = "linux")]
fn set_text(
    clipboard: &mut Clipboard,
    text: &str,
    hold: Duration,
) -> std::result::Result<(), arboard::Error> {
    use arboard::SetExtLinux;

    if hold.is_zero() {
        return clipboard.set_text(text);
    }
    clipboard
        .set()
        .wait_until(std::time::Instant::now() + hold)
        .text(text)
}

#[cfg(not(target_os = "linux"))]
fn set_text(
    clipboard: &mut Clipboard,
    text: &str,
    _hold: Duration,
) -> std::result::Result<(), arboard::Error> {
    clipboard.set_text(text)
}

/// How long a copy keeps kosh running, if at all.
fn hold_time(settings: &Settings) -> Option<Duration> {
    if cfg!(target_os = "linux") && settings.clipboard_timeout_secs > 0 {
        Some(Duration::from_secs(settings.clipboard_timeout_secs))
    } else {
        None
    }
}

/// Hand a decrypted secret to the user: stdout when `print` is set or the
/// clipboard is disabled, otherwise the clipboard.
///
/// A clipboard failure is only a warning.
pub fn deliver(secret: &[u8], print: bool, settings: &Settings) -> Result<()> {
    if print || !settings.clipboard {
        use std::io::Write;

        let mut stdout = std::io::stdout().lock();
        stdout.write_all(secret)?;
        stdout.write_all(b"\n")?;
        stdout.flush()?;
        return Ok(());
    }

    let hold = hold_time(settings);
    if let Some(hold) = hold {
        super::output::info(&format!(
            "Serving the secret on the clipboard for {}s, or until something else is copied.",
            hold.as_secs()
        ));
    }

    match copy_text(secret, hold.unwrap_or(Duration::ZERO)) {
        Ok(()) if hold.is_some() => super::output::success("Clipboard released"),
        Ok(()) => super::output::success("Copied secret to clipboard"),
        Err(e) => {
            super::output::warning(&e.to_string());
            super::output::tip("Re-run with --print to write the secret to stdout.");
        }
    }
    Ok(())
}
