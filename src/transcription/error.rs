use super::format::ALLOWED_EXTENSIONS;

/// Failure kinds of a single transcription attempt. All of them are terminal.
#[derive(Debug, thiserror::Error)]
pub enum TranscriptionError {
    #[error("OpenAI API key is required")]
    MissingCredential,
    #[error("Failed to load audio file: {0}")]
    AudioLoadFailure(String),
    #[error("Unsupported audio format \".{extension}\". Supported: {}", allowed_list())]
    UnsupportedFormat { extension: String, allowed: Vec<&'static str> },
    #[error("{0}")]
    TranscriptionApiError(String),
    #[error("Audio file not found in block")]
    NotFound,
    #[error("{0}")]
    Network(String),
    #[error("Failed to parse transcription response: {0}")]
    InvalidResponse(String),
}

impl TranscriptionError {
    pub(crate) fn unsupported(extension: &str) -> Self {
        TranscriptionError::UnsupportedFormat {
            extension: extension.to_string(),
            allowed: ALLOWED_EXTENSIONS.to_vec(),
        }
    }

    /// Short message for host notifications.
    pub fn user_message(&self) -> String {
        match self {
            TranscriptionError::MissingCredential => {
                "OpenAI API key is required. Run 'notescribe auth' to set it.".to_string()
            }
            TranscriptionError::NotFound => "Audio file not found".to_string(),
            other => other.to_string(),
        }
    }
}

fn allowed_list() -> String {
    ALLOWED_EXTENSIONS.join(", ")
}
