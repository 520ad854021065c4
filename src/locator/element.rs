//! Block element model built from the editor's rendered DOM.
//!
//! Only what the locator needs is kept: the root element's attributes, the embedded
//! `<audio>` source, whether any media element is present and the visible text.

use std::sync::OnceLock;

use regex::Regex;

use super::cached_regex;

/// Block types the editor renders as playable media.
const MEDIA_BLOCK_TYPES: [&str; 5] = ["NodeAudio", "NodeVideo", "av", "audio", "video"];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockElement {
    attributes: Vec<(String, String)>,
    audio_src: Option<String>,
    has_audio: bool,
    has_video: bool,
    text: String,
}

fn tag_regex() -> Option<&'static Regex> {
    static TAG: OnceLock<Option<Regex>> = OnceLock::new();
    cached_regex(&TAG, r"<([a-zA-Z][a-zA-Z0-9-]*)([^>]*)>")
}

fn attribute_regex() -> Option<&'static Regex> {
    static ATTRIBUTE: OnceLock<Option<Regex>> = OnceLock::new();
    cached_regex(
        &ATTRIBUTE,
        r#"([a-zA-Z_:][-a-zA-Z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#,
    )
}

fn markup_regex() -> Option<&'static Regex> {
    static MARKUP: OnceLock<Option<Regex>> = OnceLock::new();
    cached_regex(&MARKUP, r"<[^>]*>")
}

fn parse_attributes(raw: &str) -> Vec<(String, String)> {
    let Some(re) = attribute_regex() else {
        return Vec::new();
    };
    re.captures_iter(raw)
        .map(|caps| {
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map(|m| decode_entities(m.as_str()))
                .unwrap_or_default();
            (caps[1].to_ascii_lowercase(), value)
        })
        .collect()
}

fn find_attribute<'a>(attributes: &'a [(String, String)], name: &str) -> Option<&'a str> {
    attributes
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// Decodes the handful of entities the editor emits in attributes and text.
pub(crate) fn decode_entities(value: &str) -> String {
    value
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&nbsp;", "\u{a0}")
        .replace("&amp;", "&")
}

impl BlockElement {
    /// Builds an element from a block's HTML.
    ///
    /// The first tag is taken as the block root. The audio source is the `src` of the
    /// first `<audio>`, or of the first `<source>` following it.
    pub fn from_dom(html: &str) -> Self {
        let mut element = BlockElement::default();

        if let Some(tags) = tag_regex() {
            let mut inside_audio = false;
            for (index, caps) in tags.captures_iter(html).enumerate() {
                let name = caps[1].to_ascii_lowercase();
                let raw_attributes = caps.get(2).map(|m| m.as_str()).unwrap_or_default();

                if index == 0 {
                    element.attributes = parse_attributes(raw_attributes);
                }

                match name.as_str() {
                    "audio" if !element.has_audio => {
                        element.has_audio = true;
                        inside_audio = true;
                        element.audio_src = find_attribute(&parse_attributes(raw_attributes), "src")
                            .filter(|src| !src.is_empty())
                            .map(str::to_string);
                    }
                    "source" if inside_audio && element.audio_src.is_none() => {
                        element.audio_src = find_attribute(&parse_attributes(raw_attributes), "src")
                            .filter(|src| !src.is_empty())
                            .map(str::to_string);
                    }
                    "video" => element.has_video = true,
                    _ => {}
                }
            }
        }

        let stripped = match markup_regex() {
            Some(re) => re.replace_all(html, "").into_owned(),
            None => html.to_string(),
        };
        element.text = decode_entities(&stripped);

        element
    }

    pub fn with_attribute(mut self, name: &str, value: &str) -> Self {
        self.attributes
            .push((name.to_ascii_lowercase(), value.to_string()));
        self
    }

    #[cfg(test)]
    pub fn with_audio_src(mut self, src: &str) -> Self {
        self.has_audio = true;
        self.audio_src = Some(src.to_string());
        self
    }

    #[cfg(test)]
    pub fn with_text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        find_attribute(&self.attributes, name)
    }

    /// Block id (`data-node-id`).
    pub fn node_id(&self) -> Option<&str> {
        self.attribute("data-node-id").filter(|id| !id.is_empty())
    }

    pub fn block_type(&self) -> Option<&str> {
        self.attribute("data-type")
    }

    pub fn audio_src(&self) -> Option<&str> {
        self.audio_src.as_deref()
    }

    #[cfg(test)]
    pub fn has_audio(&self) -> bool {
        self.has_audio
    }

    pub fn text_content(&self) -> &str {
        &self.text
    }

    /// True for audio/video blocks, the only ones transcription is offered for.
    pub fn is_media_block(&self) -> bool {
        self.has_audio
            || self.has_video
            || self
                .block_type()
                .is_some_and(|t| MEDIA_BLOCK_TYPES.contains(&t))
    }
}
