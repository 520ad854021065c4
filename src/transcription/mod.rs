//! Speech-to-text transcription of host audio.
//!
//! Resolves an audio reference to an uploadable file with an accepted extension and sends
//! it to an OpenAI-compatible transcription endpoint.

pub mod api;
pub mod error;
pub mod format;

pub use api::{transcribe, TranscriptionOptions};
pub use error::TranscriptionError;
