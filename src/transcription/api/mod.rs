//! Transcription request pipeline.
//!
//! `transcribe` runs one attempt end to end: credential check, byte retrieval through
//! the host's [`AudioSource`], filename and format resolution, then a single multipart
//! upload to an OpenAI-compatible `/audio/transcriptions` endpoint.

mod openai;

use std::fmt;

use super::error::TranscriptionError;
use super::format::resolve_file;
use crate::host::AudioSource;

pub use openai::{transcription_endpoint, DEFAULT_MODEL};

/// Per-call transcription settings.
#[derive(Clone, Default)]
pub struct TranscriptionOptions {
    /// Bearer credential for the transcription API
    pub api_key: String,
    /// ISO-639-1 language hint, omitted from the request when empty
    pub language: Option<String>,
    /// API root; defaults to the OpenAI API
    pub base_url: Option<String>,
    /// Model name; defaults to `whisper-1`
    pub model: Option<String>,
}

impl TranscriptionOptions {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }
}

impl fmt::Debug for TranscriptionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TranscriptionOptions")
            .field("api_key", &"[REDACTED]")
            .field("language", &self.language)
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

/// Transcribes the audio behind `reference`.
///
/// # Errors
/// - `MissingCredential` if the API key is empty or only whitespace (nothing is fetched)
/// - `AudioLoadFailure` if the source has no bytes for the reference
/// - `UnsupportedFormat` if the resolved extension is not accepted (nothing is sent)
/// - `Network` if the request cannot be delivered
/// - `TranscriptionApiError` if the API answers with an error status
pub async fn transcribe(
    source: &dyn AudioSource,
    reference: &str,
    options: &TranscriptionOptions,
) -> Result<String, TranscriptionError> {
    if options.api_key.trim().is_empty() {
        return Err(TranscriptionError::MissingCredential);
    }

    let blob = match source.fetch(reference).await {
        Ok(Some(blob)) => blob,
        Ok(None) => {
            return Err(TranscriptionError::AudioLoadFailure(reference.to_string()));
        }
        Err(e) => {
            tracing::error!("Audio retrieval for {} failed: {}", reference, e);
            return Err(TranscriptionError::AudioLoadFailure(format!(
                "{reference}: {e}"
            )));
        }
    };

    let file = resolve_file(reference, blob)?;

    tracing::debug!(
        "Transcribing {}: filename={} content_type={:?} size={} bytes",
        reference,
        file.filename,
        file.content_type,
        file.bytes.len()
    );

    openai::transcribe(file, options).await
}
