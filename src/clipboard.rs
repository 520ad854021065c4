//! Clipboard output for transcriptions.
//!
//! Pipes text into the first available clipboard tool: pbcopy on macOS, wl-copy on
//! Wayland, xclip on X11.

use std::io::Write;
use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;

#[cfg(target_os = "macos")]
const CLIPBOARD_TOOLS: &[(&str, &[&str])] = &[("pbcopy", &[])];

#[cfg(not(target_os = "macos"))]
const CLIPBOARD_TOOLS: &[(&str, &[&str])] = &[
    ("wl-copy", &["--type", "text/plain", "--trim-newline"]),
    ("xclip", &["-selection", "clipboard", "-in", "-quiet"]),
];

fn pipe_to(tool: &str, args: &[&str], text: &str) -> bool {
    let Ok(mut child) = Command::new(tool).args(args).stdin(Stdio::piped()).spawn() else {
        tracing::debug!("{tool} not found or not executable");
        return false;
    };
    let Some(mut stdin) = child.stdin.take() else {
        return false;
    };
    match write!(stdin, "{text}") {
        Ok(()) => {
            drop(stdin);
            // Give the tool a moment to take ownership of the selection.
            thread::sleep(Duration::from_millis(100));
            tracing::debug!("Transcription copied to clipboard via {tool}");
            true
        }
        Err(e) => {
            tracing::warn!("Failed to write to {tool} stdin: {e}");
            false
        }
    }
}

/// Copies text to the system clipboard.
///
/// A missing clipboard tool is logged, not returned as an error, so a finished
/// transcription is never lost to clipboard trouble.
pub fn copy_to_clipboard(text: &str) -> anyhow::Result<()> {
    if CLIPBOARD_TOOLS
        .iter()
        .any(|(tool, args)| pipe_to(tool, args, text))
    {
        return Ok(());
    }

    let names: Vec<&str> = CLIPBOARD_TOOLS.iter().map(|(tool, _)| *tool).collect();
    tracing::warn!("No clipboard tool available ({} not found)", names.join(" or "));
    Ok(())
}
