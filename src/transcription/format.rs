//! Filename and audio format resolution.
//!
//! The transcription endpoint detects the audio format from the uploaded filename, so
//! every upload needs a name with an extension it accepts. References coming from the
//! host often lack one (`/assets/clip`); the extension is then inferred from the
//! declared content type.

use std::sync::OnceLock;

use regex::Regex;

use super::error::TranscriptionError;
use crate::host::AudioBlob;

/// Extensions accepted by the transcription endpoint.
pub const ALLOWED_EXTENSIONS: [&str; 10] = [
    "flac", "m4a", "mp3", "mp4", "mpeg", "mpga", "oga", "ogg", "wav", "webm",
];

/// Extension used when neither the name nor the content type tells the format.
pub const DEFAULT_EXTENSION: &str = "wav";

const DEFAULT_BASENAME: &str = "audio";

/// Content-type substrings mapped to extensions. Earlier entries win.
const MIME_EXTENSIONS: &[(&[&str], &str)] = &[
    (&["wav"], "wav"),
    (&["webm"], "webm"),
    (&["ogg", "oga"], "ogg"),
    // Matched before `mp4a`, so `audio/mp4a-latm` resolves to mp4.
    (&["mp4"], "mp4"),
    (&["mpeg"], "mp3"),
    (&["mp3"], "mp3"),
    (&["flac"], "flac"),
    (&["m4a", "mp4a"], "m4a"),
];

/// Audio payload ready for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFile {
    pub bytes: Vec<u8>,
    pub filename: String,
    /// Lowercase, always one of [`ALLOWED_EXTENSIONS`].
    pub extension: String,
    pub content_type: Option<String>,
}

/// Infers an extension from a content type such as `audio/mpeg`.
pub fn guess_ext_from_mime(mime: Option<&str>) -> Option<&'static str> {
    let mime = mime?.to_lowercase();
    MIME_EXTENSIONS
        .iter()
        .find(|(needles, _)| needles.iter().any(|needle| mime.contains(needle)))
        .map(|(_, ext)| *ext)
}

/// Final path segment of a reference, ignoring any query or fragment.
pub fn basename(reference: &str) -> &str {
    let clean = reference.split('?').next().unwrap_or_default();
    let clean = clean.split('#').next().unwrap_or_default();
    match clean.rsplit('/').next() {
        Some(segment) if !segment.is_empty() => segment,
        _ => DEFAULT_BASENAME,
    }
}

fn has_extension(name: &str) -> bool {
    static EXTENSION: OnceLock<Option<Regex>> = OnceLock::new();
    EXTENSION
        .get_or_init(|| Regex::new(r"(?i)\.[a-z0-9]{1,5}$").ok())
        .as_ref()
        .is_some_and(|re| re.is_match(name))
}

/// Upload filename for `reference`: its base name, with an extension inferred from
/// `content_type` when it has none.
pub fn ensure_filename(reference: &str, content_type: Option<&str>) -> String {
    let base = basename(reference);
    if has_extension(base) {
        return base.to_string();
    }

    let ext = guess_ext_from_mime(content_type).unwrap_or_else(|| {
        tracing::warn!(
            "Could not infer audio format from content type {:?}, assuming {}",
            content_type,
            DEFAULT_EXTENSION
        );
        DEFAULT_EXTENSION
    });
    format!("{base}.{ext}")
}

/// Lowercase extension of `filename`, checked against [`ALLOWED_EXTENSIONS`].
pub fn validate_extension(filename: &str) -> Result<String, TranscriptionError> {
    let extension = filename
        .rsplit('.')
        .next()
        .unwrap_or_default()
        .to_lowercase();
    if ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        Ok(extension)
    } else {
        Err(TranscriptionError::unsupported(&extension))
    }
}

/// Names and validates a fetched blob.
pub fn resolve_file(reference: &str, blob: AudioBlob) -> Result<ResolvedFile, TranscriptionError> {
    let filename = ensure_filename(reference, blob.content_type.as_deref());
    let extension = validate_extension(&filename)?;
    Ok(ResolvedFile {
        bytes: blob.bytes,
        filename,
        extension,
        content_type: blob.content_type,
    })
}
