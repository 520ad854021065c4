//! Host collaborators consumed by the transcription pipeline.
//!
//! The note-taking application owns the document model, asset storage and notification
//! display. This module exposes those as narrow traits so the locator and the
//! transcription client can be driven by the SiYuan kernel HTTP API (`KernelClient`),
//! by local files (`LocalFiles`), or by test doubles.

pub mod kernel;
pub mod local;

use async_trait::async_trait;
use serde::Deserialize;

pub use kernel::KernelClient;
pub use local::LocalFiles;

/// Errors raised by host collaborators.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("kernel request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("kernel returned error {code}: {msg}")]
    Api { code: i64, msg: String },
    #[error("unexpected kernel response: {0}")]
    Decode(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid block id: {0}")]
    InvalidBlockId(String),
}

/// Raw audio payload returned by an [`AudioSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioBlob {
    pub bytes: Vec<u8>,
    /// Declared content type, e.g. `audio/wav`. Absent when the source cannot tell.
    pub content_type: Option<String>,
}

/// Block metadata used to target insertions.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BlockInfo {
    pub id: String,
    #[serde(default)]
    pub parent_id: String,
    #[serde(default)]
    pub root_id: String,
}

impl BlockInfo {
    /// Parent to insert siblings under: the direct parent, or the document root for
    /// top-level blocks.
    pub fn insertion_parent(&self) -> Option<&str> {
        [self.parent_id.as_str(), self.root_id.as_str()]
            .into_iter()
            .find(|id| !id.is_empty())
    }
}

/// Notification severity shown by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Error,
}

/// Resolves an audio reference to bytes.
#[async_trait]
pub trait AudioSource: Send + Sync {
    /// Returns `Ok(None)` when the reference does not resolve to a file.
    async fn fetch(&self, path: &str) -> Result<Option<AudioBlob>, HostError>;
}

/// Read and write access to the host's document blocks.
#[async_trait]
pub trait BlockStore: Send + Sync {
    /// Rendered DOM of a block, as the editor shows it.
    async fn block_dom(&self, id: &str) -> Result<String, HostError>;

    /// Raw kramdown source of a block.
    async fn block_kramdown(&self, id: &str) -> Result<String, HostError>;

    async fn block_info(&self, id: &str) -> Result<Option<BlockInfo>, HostError>;

    /// Inserts `content` as a new block of `kind` (e.g. `markdown`).
    async fn insert_block(
        &self,
        kind: &str,
        content: &str,
        next_id: Option<&str>,
        previous_id: Option<&str>,
        parent_id: Option<&str>,
    ) -> Result<(), HostError>;
}

/// User-visible notifications.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, message: &str, severity: Severity) -> Result<(), HostError>;
}
