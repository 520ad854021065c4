//! Audio locator: recovers the audio reference behind an audio block.
//!
//! Heuristics run in a fixed order and the first match wins:
//! 1. the embedded `<audio>` source (an inline `data:` URL ends the search)
//! 2. `data-src` / `data-url` attributes on the block
//! 3. a markdown `![label](target)` link in the block's visible text
//!
//! [`locate_with_fallback`] adds a last step that asks the host for the block's raw
//! kramdown and searches that instead.

mod element;

use std::sync::OnceLock;

use regex::Regex;

use crate::host::BlockStore;

pub use element::BlockElement;

/// Resolver over a block element; `None` hands over to the next one.
type Resolver = fn(&BlockElement) -> Option<String>;

const RESOLVERS: &[(&str, Resolver)] = &[
    ("media source", from_media_source),
    ("data attribute", from_data_attributes),
    ("markdown link", from_markdown_text),
];

pub(crate) fn cached_regex(
    cell: &'static OnceLock<Option<Regex>>,
    pattern: &str,
) -> Option<&'static Regex> {
    cell.get_or_init(|| Regex::new(pattern).ok()).as_ref()
}

fn markdown_link_regex() -> Option<&'static Regex> {
    static MARKDOWN_LINK: OnceLock<Option<Regex>> = OnceLock::new();
    cached_regex(&MARKDOWN_LINK, r"!\[.*?\]\((.*?)\)")
}

fn is_data_url(src: &str) -> bool {
    src.get(..5)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("data:"))
}

/// Prefixes asset-relative paths (`assets/x.wav`) with `/`. Inline `data:` URLs are
/// never a reference.
fn normalize_asset_path(path: &str) -> Option<String> {
    if is_data_url(path) {
        None
    } else if path.starts_with("assets/") {
        Some(format!("/{path}"))
    } else {
        Some(path.to_string())
    }
}

/// Reference for a media element source.
///
/// Absolute URLs yield their path component as is. Otherwise only server-relative
/// (`/…`) and asset-relative (`assets/…`) sources are accepted.
fn media_source_reference(src: &str) -> Option<String> {
    if src.is_empty() || is_data_url(src) {
        return None;
    }
    match reqwest::Url::parse(src) {
        Ok(url) => Some(url.path().to_string()),
        Err(_) if src.starts_with("assets/") => Some(format!("/{src}")),
        Err(_) if src.starts_with('/') => Some(src.to_string()),
        Err(_) => None,
    }
}

/// Target of the first `![label](target)` link in `text`.
fn markdown_target(text: &str) -> Option<String> {
    let caps = markdown_link_regex()?.captures(text)?;
    caps.get(1)
        .map(|m| m.as_str())
        .filter(|target| !target.is_empty())
        .and_then(normalize_asset_path)
}

fn from_media_source(element: &BlockElement) -> Option<String> {
    element.audio_src().and_then(media_source_reference)
}

fn from_data_attributes(element: &BlockElement) -> Option<String> {
    ["data-src", "data-url"]
        .into_iter()
        .filter_map(|name| element.attribute(name))
        .find(|value| !value.is_empty())
        .and_then(normalize_asset_path)
}

fn from_markdown_text(element: &BlockElement) -> Option<String> {
    markdown_target(element.text_content())
}

/// Resolves the audio reference of `element` without touching the host.
pub fn locate(element: &BlockElement) -> Option<String> {
    if element.audio_src().is_some_and(is_data_url) {
        tracing::debug!("Audio source is an inline data URL, which cannot be transcribed");
        return None;
    }

    RESOLVERS.iter().find_map(|(name, resolver)| {
        let reference = resolver(element)?;
        tracing::debug!("Audio reference {} resolved from {}", reference, name);
        Some(reference)
    })
}

/// Resolves a reference from a block's raw kramdown source.
///
/// Tries the markdown link pattern first, then an `<audio src=…>` tag, which is how
/// audio blocks are usually stored.
pub fn locate_in_kramdown(kramdown: &str) -> Option<String> {
    markdown_target(kramdown).or_else(|| {
        BlockElement::from_dom(kramdown)
            .audio_src()
            .and_then(media_source_reference)
    })
}

/// [`locate`], falling back to the block's kramdown fetched from `store`.
pub async fn locate_with_fallback(
    element: &BlockElement,
    store: &dyn BlockStore,
) -> Option<String> {
    if let Some(reference) = locate(element) {
        return Some(reference);
    }

    let id = element.node_id()?;
    tracing::debug!("Element heuristics failed, reading kramdown of block {}", id);
    match store.block_kramdown(id).await {
        Ok(kramdown) => {
            let reference = locate_in_kramdown(&kramdown);
            if let Some(reference) = &reference {
                tracing::debug!("Audio reference {} resolved from kramdown", reference);
            }
            reference
        }
        Err(e) => {
            tracing::warn!("Failed to read kramdown for block {}: {}", id, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::host::{BlockInfo, HostError};

    struct KramdownStore {
        kramdown: Result<String, ()>,
        reads: AtomicUsize,
    }

    impl KramdownStore {
        fn returning(kramdown: &str) -> Self {
            Self {
                kramdown: Ok(kramdown.to_string()),
                reads: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                kramdown: Err(()),
                reads: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl BlockStore for KramdownStore {
        async fn block_dom(&self, _id: &str) -> Result<String, HostError> {
            Err(HostError::Decode("unused".to_string()))
        }

        async fn block_kramdown(&self, _id: &str) -> Result<String, HostError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.kramdown
                .clone()
                .map_err(|_| HostError::Api {
                    code: -1,
                    msg: "block not found".to_string(),
                })
        }

        async fn block_info(&self, _id: &str) -> Result<Option<BlockInfo>, HostError> {
            Ok(None)
        }

        async fn insert_block(
            &self,
            _kind: &str,
            _content: &str,
            _next_id: Option<&str>,
            _previous_id: Option<&str>,
            _parent_id: Option<&str>,
        ) -> Result<(), HostError> {
            Ok(())
        }
    }

    #[test]
    fn test_data_url_source_is_not_found() {
        let element = BlockElement::default()
            .with_audio_src("data:audio/wav;base64,UklGRg==")
            .with_attribute("data-src", "assets/x.wav")
            .with_text("![x](assets/y.wav)");
        assert_eq!(locate(&element), None);

        let upper = BlockElement::default().with_audio_src("DATA:audio/wav;base64,AA==");
        assert_eq!(locate(&upper), None);
    }

    #[test]
    fn test_data_url_attribute_is_not_found() {
        let element = BlockElement::default()
            .with_attribute("data-src", "data:audio/wav;base64,UklGRg==");
        assert_eq!(locate(&element), None);
    }

    #[test]
    fn test_data_url_markdown_link_is_not_found() {
        let element = BlockElement::default().with_text("![clip](data:audio/wav;base64,UklGRg==)");
        assert_eq!(locate(&element), None);
        assert_eq!(
            locate_in_kramdown("![clip](Data:audio/wav;base64,UklGRg==)\n{: id=\"x\"}"),
            None
        );
    }

    #[tokio::test]
    async fn test_fallback_ignores_data_url_in_kramdown() {
        let store = KramdownStore::returning("![k](data:audio/wav;base64,UklGRg==)");
        let element =
            BlockElement::default().with_attribute("data-node-id", "20240101120000-abc1234");

        assert_eq!(locate_with_fallback(&element, &store).await, None);
        assert_eq!(store.reads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_absolute_source_yields_path() {
        let element = BlockElement::default()
            .with_audio_src("http://127.0.0.1:6806/assets/rec%20one.wav?t=1");
        assert_eq!(locate(&element).as_deref(), Some("/assets/rec%20one.wav"));
    }

    #[test]
    fn test_relative_sources() {
        let asset = BlockElement::default().with_audio_src("assets/x.wav");
        assert_eq!(locate(&asset).as_deref(), Some("/assets/x.wav"));

        let rooted = BlockElement::default().with_audio_src("/assets/x.wav");
        assert_eq!(locate(&rooted).as_deref(), Some("/assets/x.wav"));
    }

    #[test]
    fn test_unusable_source_falls_through_to_attributes() {
        let element = BlockElement::default()
            .with_audio_src("x.wav")
            .with_attribute("data-url", "assets/y.wav");
        assert_eq!(locate(&element).as_deref(), Some("/assets/y.wav"));
    }

    #[test]
    fn test_data_attribute_asset_path() {
        let element = BlockElement::default().with_attribute("data-src", "assets/x.wav");
        assert_eq!(locate(&element).as_deref(), Some("/assets/x.wav"));

        let other = BlockElement::default().with_attribute("data-url", "https://cdn/x.mp3");
        assert_eq!(locate(&other).as_deref(), Some("https://cdn/x.mp3"));
    }

    #[test]
    fn test_data_src_preferred_over_data_url() {
        let element = BlockElement::default()
            .with_attribute("data-url", "assets/b.wav")
            .with_attribute("data-src", "assets/a.wav");
        assert_eq!(locate(&element).as_deref(), Some("/assets/a.wav"));

        let empty_src = BlockElement::default()
            .with_attribute("data-src", "")
            .with_attribute("data-url", "assets/b.wav");
        assert_eq!(locate(&empty_src).as_deref(), Some("/assets/b.wav"));
    }

    #[test]
    fn test_markdown_link_in_text() {
        let element = BlockElement::default().with_text("see ![memo](assets/memo.m4a) and ![b](c)");
        assert_eq!(locate(&element).as_deref(), Some("/assets/memo.m4a"));

        let empty_target = BlockElement::default().with_text("![memo]()");
        assert_eq!(locate(&empty_target), None);
    }

    #[test]
    fn test_resolver_order() {
        let element = BlockElement::default()
            .with_audio_src("/assets/from-media.wav")
            .with_attribute("data-src", "assets/from-attr.wav")
            .with_text("![t](assets/from-text.wav)");
        assert_eq!(locate(&element).as_deref(), Some("/assets/from-media.wav"));

        let element = BlockElement::default()
            .with_attribute("data-src", "assets/from-attr.wav")
            .with_text("![t](assets/from-text.wav)");
        assert_eq!(locate(&element).as_deref(), Some("/assets/from-attr.wav"));
    }

    #[test]
    fn test_nothing_found() {
        assert_eq!(locate(&BlockElement::default().with_text("just words")), None);
    }

    #[test]
    fn test_locate_in_kramdown() {
        assert_eq!(
            locate_in_kramdown("![rec](assets/rec.wav)\n{: id=\"20240101120000-abc1234\"}")
                .as_deref(),
            Some("/assets/rec.wav")
        );
        assert_eq!(
            locate_in_kramdown(
                "<audio controls=\"controls\" src=\"assets/rec.webm\"></audio>\n{: id=\"20240101120000-abc1234\"}"
            )
            .as_deref(),
            Some("/assets/rec.webm")
        );
        assert_eq!(locate_in_kramdown("plain paragraph"), None);
    }

    #[tokio::test]
    async fn test_fallback_not_used_when_element_resolves() {
        let store = KramdownStore::returning("![k](assets/k.wav)");
        let element = BlockElement::default()
            .with_attribute("data-node-id", "20240101120000-abc1234")
            .with_audio_src("assets/a.wav");

        let reference = locate_with_fallback(&element, &store).await;
        assert_eq!(reference.as_deref(), Some("/assets/a.wav"));
        assert_eq!(store.reads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_fallback_reads_kramdown() {
        let store = KramdownStore::returning("![k](assets/k.wav)");
        let element =
            BlockElement::default().with_attribute("data-node-id", "20240101120000-abc1234");

        let reference = locate_with_fallback(&element, &store).await;
        assert_eq!(reference.as_deref(), Some("/assets/k.wav"));
        assert_eq!(store.reads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fallback_without_node_id_or_on_error() {
        let store = KramdownStore::returning("![k](assets/k.wav)");
        assert_eq!(locate_with_fallback(&BlockElement::default(), &store).await, None);
        assert_eq!(store.reads.load(Ordering::SeqCst), 0);

        let failing = KramdownStore::failing();
        let element =
            BlockElement::default().with_attribute("data-node-id", "20240101120000-abc1234");
        assert_eq!(locate_with_fallback(&element, &failing).await, None);
    }
}
