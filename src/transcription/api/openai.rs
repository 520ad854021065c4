//! OpenAI-compatible `/audio/transcriptions` client.
//!
//! Handles endpoint normalization, the multipart body and response decoding. Works with
//! any server that mimics the OpenAI API shape (self-hosted Whisper servers, proxies).

use serde::Deserialize;

use super::TranscriptionOptions;
use crate::transcription::error::TranscriptionError;
use crate::transcription::format::ResolvedFile;

/// API root used when no base URL is configured.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "whisper-1";

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: Option<String>,
}

/// Normalizes a configured API root so it ends in exactly one `/v1`.
///
/// `https://host/` and `https://host/v1/` both become `https://host/v1`; an empty value
/// selects [`DEFAULT_BASE_URL`].
pub fn normalize_base_url(base_url: Option<&str>) -> String {
    let trimmed = base_url.unwrap_or_default().trim();
    if trimmed.is_empty() {
        return DEFAULT_BASE_URL.to_string();
    }

    let without_slash = trimmed.trim_end_matches('/');
    if without_slash.ends_with("/v1") {
        without_slash.to_string()
    } else {
        format!("{without_slash}/v1")
    }
}

pub fn transcription_endpoint(base_url: Option<&str>) -> String {
    format!("{}/audio/transcriptions", normalize_base_url(base_url))
}

fn trimmed(value: Option<&String>) -> Option<&str> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty())
}

fn build_form(
    file: ResolvedFile,
    options: &TranscriptionOptions,
) -> Result<(reqwest::multipart::Form, Vec<String>), TranscriptionError> {
    let model = trimmed(options.model.as_ref()).unwrap_or(DEFAULT_MODEL);
    let ResolvedFile {
        bytes,
        filename,
        content_type,
        ..
    } = file;

    // Probe the declared type on an empty part so an invalid one can be dropped
    // without losing the audio bytes.
    let mime = content_type
        .as_deref()
        .map(str::trim)
        .filter(|ct| !ct.is_empty())
        .filter(|ct| match reqwest::multipart::Part::text("").mime_str(ct) {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!("Ignoring invalid content type {:?}: {}", ct, e);
                false
            }
        });

    let mut file_part = reqwest::multipart::Part::bytes(bytes).file_name(filename.clone());
    if let Some(mime) = mime {
        file_part = file_part.mime_str(mime).map_err(|e| {
            TranscriptionError::AudioLoadFailure(format!(
                "Failed to create file part for upload: {e}"
            ))
        })?;
    }

    let mut form = reqwest::multipart::Form::new()
        .part("file", file_part)
        .text("model", model.to_string());
    let mut params = vec![format!("file={filename}"), format!("model={model}")];

    if let Some(language) = trimmed(options.language.as_ref()) {
        form = form.text("language", language.to_string());
        params.push(format!("language={language}"));
    }

    Ok((form, params))
}

/// Uploads a resolved file and returns the transcribed text.
pub(super) async fn transcribe(
    file: ResolvedFile,
    options: &TranscriptionOptions,
) -> Result<String, TranscriptionError> {
    let url = transcription_endpoint(options.base_url.as_deref());
    let (form, params) = build_form(file, options)?;

    tracing::debug!(
        "Transcription API Call:\n  URL: {}\n  Method: POST\n  Headers:\n    Authorization: Bearer <redacted>\n    Content-Type: multipart/form-data\n  Body parameters: {}",
        url,
        params.join("\n    ")
    );

    let client = reqwest::Client::new();
    let response = client
        .post(&url)
        .bearer_auth(&options.api_key)
        .multipart(form)
        .send()
        .await
        .map_err(|e| {
            let message = if e.is_connect() {
                format!("Failed to connect to transcription API at {url}. Check your internet connection.")
            } else if e.is_timeout() {
                "Request to the transcription API timed out.".to_string()
            } else if e.is_builder() {
                format!("Failed to build transcription request: {e}. Check the configured base URL.")
            } else {
                format!("Transcription network error: {e}")
            };
            TranscriptionError::Network(message)
        })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.bytes().await.unwrap_or_default();
        let message = serde_json::from_slice::<ApiErrorBody>(&body)
            .ok()
            .and_then(|b| b.error)
            .and_then(|e| e.message)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| {
                format!(
                    "API error: {}",
                    status.canonical_reason().unwrap_or(status.as_str())
                )
            });
        tracing::error!("Transcription API returned {}: {}", status, message);
        return Err(TranscriptionError::TranscriptionApiError(message));
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| TranscriptionError::Network(format!("Failed to read response: {e}")))?;
    let parsed: TranscriptionResponse = serde_json::from_slice(&body)
        .map_err(|e| TranscriptionError::InvalidResponse(e.to_string()))?;
    let text = parsed.text.unwrap_or_default();

    tracing::debug!(
        "Transcription API Response:\n  Status: {}\n  Transcription length: {} characters",
        status,
        text.len()
    );

    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_default() {
        assert_eq!(normalize_base_url(None), DEFAULT_BASE_URL);
        assert_eq!(normalize_base_url(Some("")), DEFAULT_BASE_URL);
        assert_eq!(normalize_base_url(Some("   ")), DEFAULT_BASE_URL);
    }

    #[test]
    fn test_normalize_appends_single_v1() {
        let cases = [
            ("https://api.example.com", "https://api.example.com/v1"),
            ("https://api.example.com/", "https://api.example.com/v1"),
            ("https://api.example.com///", "https://api.example.com/v1"),
            ("https://api.example.com/v1", "https://api.example.com/v1"),
            ("https://api.example.com/v1/", "https://api.example.com/v1"),
            ("  http://localhost:8000/v1//  ", "http://localhost:8000/v1"),
            ("http://proxy/openai", "http://proxy/openai/v1"),
        ];
        for (input, expected) in cases {
            let normalized = normalize_base_url(Some(input));
            assert_eq!(normalized, expected, "input {input:?}");
            assert!(normalized.ends_with("/v1"));
            assert!(!normalized.ends_with("/v1/v1"));
        }
    }

    #[test]
    fn test_transcription_endpoint() {
        assert_eq!(
            transcription_endpoint(None),
            "https://api.openai.com/v1/audio/transcriptions"
        );
        assert_eq!(
            transcription_endpoint(Some("http://localhost:8000/")),
            "http://localhost:8000/v1/audio/transcriptions"
        );
    }

    #[test]
    fn test_build_form_params() {
        let file = ResolvedFile {
            bytes: vec![0; 4],
            filename: "note1.wav".to_string(),
            extension: "wav".to_string(),
            content_type: Some("audio/wav".to_string()),
        };
        let options = TranscriptionOptions {
            model: Some("   ".to_string()),
            language: Some("".to_string()),
            ..TranscriptionOptions::new("sk")
        };

        let (_, params) = build_form(file, &options).unwrap();
        assert_eq!(params, vec!["file=note1.wav", "model=whisper-1"]);
    }
}
