//! Resolve the audio reference of a block without transcribing it.
//!
//! Handy for checking what `block` would upload. Works against the kernel (by block id)
//! or offline against a saved block DOM.

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::anyhow;

use crate::config::NotescribeConfig;
use crate::host::BlockStore;
use crate::locator::{locate, locate_with_fallback, BlockElement};

fn read_dom(path: &Path) -> anyhow::Result<String> {
    if path.as_os_str() == "-" {
        let mut dom = String::new();
        std::io::stdin().read_to_string(&mut dom)?;
        return Ok(dom);
    }
    std::fs::read_to_string(path)
        .map_err(|e| anyhow!("Failed to read DOM file '{}': {e}", path.display()))
}

/// Handles `notescribe locate`.
///
/// # Errors
/// - If neither a block id nor a DOM file is given
/// - If the block or the DOM file cannot be read
/// - If no audio reference can be resolved
pub async fn handle_locate(block_id: Option<String>, dom: Option<PathBuf>) -> anyhow::Result<()> {
    let reference = match (block_id, dom) {
        (_, Some(path)) => {
            let element = BlockElement::from_dom(&read_dom(&path)?);
            locate(&element)
        }
        (Some(block_id), None) => {
            let config = NotescribeConfig::load()?;
            let kernel = config.kernel_client();
            let block_id = block_id.trim();
            let dom = kernel
                .block_dom(block_id)
                .await
                .map_err(|e| anyhow!("Failed to read block {block_id}: {e}"))?;
            let mut element = BlockElement::from_dom(&dom);
            if element.node_id().is_none() {
                element = element.with_attribute("data-node-id", block_id);
            }
            locate_with_fallback(&element, &kernel).await
        }
        (None, None) => return Err(anyhow!("Pass a block id or --dom <FILE>")),
    };

    let reference = reference.ok_or_else(|| anyhow!("Audio file not found"))?;
    tracing::info!("Located audio reference {}", reference);
    println!("{reference}");
    Ok(())
}
