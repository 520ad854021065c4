//! Transcribe an audio block in place.
//!
//! Reads the block from the kernel, locates its audio, transcribes it and inserts the text
//! as a new block right after the audio block. Progress and failures are pushed to the
//! SiYuan UI as notifications; the text is also printed to stdout.

use anyhow::anyhow;

use crate::config::NotescribeConfig;
use crate::host::{AudioSource, BlockStore, HostError, Notifier, Severity};
use crate::locator::{locate_with_fallback, BlockElement};
use crate::transcription::{transcribe, TranscriptionError, TranscriptionOptions};

/// Where the transcription ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    /// Inserted after the audio block under this parent.
    Inserted { parent_id: Option<String> },
    /// Insertion failed, the text was pushed as a notification instead.
    Notified,
    /// Insertion was not requested.
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockTranscription {
    pub reference: String,
    pub text: String,
    pub placement: Placement,
}

/// Best-effort notification; a failed push is only logged.
async fn notify(notifier: &dyn Notifier, message: &str, severity: Severity) {
    if let Err(e) = notifier.notify(message, severity).await {
        tracing::warn!("Failed to push notification {:?}: {}", message, e);
    }
}

/// Inserts `text` after `block_id`, falling back to a notification carrying the text.
async fn place_after<H>(host: &H, block_id: &str, text: &str) -> Placement
where
    H: BlockStore + Notifier,
{
    let inserted = async {
        let info = host
            .block_info(block_id)
            .await?
            .ok_or_else(|| HostError::Decode(format!("block {block_id} not found")))?;
        let parent_id = info.insertion_parent().map(str::to_string);
        host.insert_block("markdown", text, None, Some(block_id), parent_id.as_deref())
            .await?;
        Ok::<_, HostError>(parent_id)
    }
    .await;

    match inserted {
        Ok(parent_id) => {
            tracing::info!("Transcription inserted after block {}", block_id);
            notify(host, "Transcription inserted", Severity::Info).await;
            Placement::Inserted { parent_id }
        }
        Err(e) => {
            tracing::warn!("Failed to insert transcription after {}: {}", block_id, e);
            notify(host, text, Severity::Info).await;
            Placement::Notified
        }
    }
}

/// Runs the whole block flow against `host`.
///
/// # Errors
/// - `TranscriptionError::MissingCredential` before anything is read
/// - If the block cannot be read or is not an audio block
/// - `TranscriptionError::NotFound` if no audio reference can be resolved
/// - Any transcription failure
pub async fn transcribe_block<H>(
    host: &H,
    block_id: &str,
    options: &TranscriptionOptions,
    insert: bool,
) -> anyhow::Result<BlockTranscription>
where
    H: AudioSource + BlockStore + Notifier,
{
    if options.api_key.trim().is_empty() {
        let err = TranscriptionError::MissingCredential;
        notify(host, &err.user_message(), Severity::Error).await;
        return Err(err.into());
    }

    let dom = match host.block_dom(block_id).await {
        Ok(dom) => dom,
        Err(e) => {
            notify(host, &format!("Failed to read block: {e}"), Severity::Error).await;
            return Err(anyhow!("Failed to read block {block_id}: {e}"));
        }
    };

    let mut element = BlockElement::from_dom(&dom);
    if element.node_id().is_none() {
        element = element.with_attribute("data-node-id", block_id);
    }

    if !element.is_media_block() {
        notify(host, "Select an audio block to transcribe.", Severity::Info).await;
        return Err(anyhow!("Block {block_id} is not an audio block"));
    }

    let Some(reference) = locate_with_fallback(&element, host).await else {
        let err = TranscriptionError::NotFound;
        notify(host, &err.user_message(), Severity::Error).await;
        return Err(err.into());
    };

    tracing::info!("Transcribing block {} ({})", block_id, reference);
    notify(host, "Transcribing...", Severity::Info).await;

    let text = match transcribe(host, &reference, options).await {
        Ok(text) => text,
        Err(e) => {
            tracing::error!("Transcription of block {} failed: {}", block_id, e);
            notify(
                host,
                &format!("Transcription failed: {}", e.user_message()),
                Severity::Error,
            )
            .await;
            return Err(e.into());
        }
    };

    let placement = if insert {
        place_after(host, block_id, &text).await
    } else {
        Placement::Skipped
    };

    Ok(BlockTranscription {
        reference,
        text,
        placement,
    })
}

/// Handles `notescribe block <ID>`.
pub async fn handle_block(block_id: String, no_insert: bool) -> anyhow::Result<()> {
    tracing::info!("=== notescribe Block Command ===");

    let config = NotescribeConfig::load().map_err(|e| {
        tracing::error!("Failed to load configuration: {e}");
        anyhow!("Configuration error: {e}")
    })?;
    let kernel = config.kernel_client();
    let options = config.transcription_options();

    let result = transcribe_block(&kernel, block_id.trim(), &options, !no_insert)
        .await
        .map_err(|e| {
            if matches!(
                e.downcast_ref::<TranscriptionError>(),
                Some(TranscriptionError::MissingCredential)
            ) {
                anyhow!("No API key configured. Please run 'notescribe auth'")
            } else {
                e
            }
        })?;

    if let Placement::Notified = result.placement {
        eprintln!("Could not insert the transcription into the document.");
    }
    println!("{}", result.text);
    Ok(())
}
