//! Transcribe a single audio reference.
//!
//! The reference is an asset path served by the SiYuan kernel (`/assets/memo.m4a`) or,
//! with `--local`, a file on disk. `--root` resolves references against a directory,
//! typically a workspace's `data/` folder, without going through the kernel. Output goes
//! to stdout unless a file or the clipboard is requested.

use std::path::PathBuf;

use anyhow::anyhow;

use crate::clipboard::copy_to_clipboard;
use crate::config::NotescribeConfig;
use crate::host::{AudioSource, LocalFiles};
use crate::transcription::{self, TranscriptionError};

/// Sends the text to the requested destination: file > clipboard > stdout.
pub(crate) fn deliver(
    text: &str,
    clipboard: bool,
    output_file: Option<&PathBuf>,
) -> anyhow::Result<()> {
    if let Some(path) = output_file {
        std::fs::write(path, text)
            .map_err(|e| anyhow!("Failed to write to file '{}': {e}", path.display()))?;
        tracing::debug!("Transcribed text written to file: {}", path.display());
    } else if clipboard {
        if let Err(e) = copy_to_clipboard(text) {
            tracing::warn!("Failed to copy to clipboard: {e}");
        }
    } else {
        println!("{text}");
        tracing::debug!("Transcribed text printed to stdout");
    }
    Ok(())
}

/// Handles `notescribe transcribe <REFERENCE>`.
///
/// # Errors
/// - If the configuration cannot be loaded
/// - If the transcription fails (missing key, unreadable audio, unsupported format,
///   API error)
/// - If the output file cannot be written
pub async fn handle_transcribe(
    reference: String,
    local: bool,
    root: Option<PathBuf>,
    clipboard: bool,
    output_file: Option<PathBuf>,
) -> anyhow::Result<()> {
    tracing::info!("=== notescribe Transcribe Command ===");

    let config = NotescribeConfig::load().map_err(|e| {
        tracing::error!("Failed to load configuration: {e}");
        anyhow!("Configuration error: {e}")
    })?;
    let options = config.transcription_options();

    let local = local || root.is_some();
    let local_files;
    let kernel;
    let source: &dyn AudioSource = if local {
        local_files = match root {
            Some(root) => LocalFiles::with_root(root),
            None => LocalFiles::new(),
        };
        &local_files
    } else {
        kernel = config.kernel_client();
        &kernel
    };

    tracing::info!(
        "Transcribing {} ({})",
        reference,
        if local { "local file" } else { "kernel asset" }
    );

    let text = transcription::transcribe(source, &reference, &options)
        .await
        .map_err(|e| match e {
            TranscriptionError::MissingCredential => {
                anyhow!("No API key configured. Please run 'notescribe auth'")
            }
            other => {
                tracing::error!("Transcription failed: {other}");
                anyhow!("Transcription failed: {other}")
            }
        })?;

    deliver(text.trim(), clipboard, output_file.as_ref())
}
