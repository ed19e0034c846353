//! Cascading metadata extraction.
//!
//! Each field has an ordered [`SelectorChain`]. For every selector only the
//! first matching element is consulted; its value is, in order of
//! precedence:
//!
//! - `href` when the element is a `<link>` carrying one
//! - the `content` attribute when present
//! - the trimmed text content
//!
//! The first selector yielding a non-empty trimmed value wins. The image is
//! resolved against the page URL and an empty `site` falls back to `title`.

use crate::document::{HtmlDocument, Node};
use crate::resolve::resolve_url;
use scraper::Selector;
use unfurl_common::{ExtractedData, Result, UnfurlError};
use unfurl_config::SelectorSettings;

/// Compiled, priority-ordered selectors for one field.
#[derive(Debug, Clone)]
pub struct SelectorChain {
    field: &'static str,
    entries: Vec<(String, Selector)>,
}

impl SelectorChain {
    /// Compile `selectors`; an unparsable expression is a configuration error.
    pub fn compile<S: AsRef<str>>(field: &'static str, selectors: &[S]) -> Result<Self> {
        let entries = selectors
            .iter()
            .map(|raw| {
                let raw = raw.as_ref();
                Selector::parse(raw)
                    .map(|sel| (raw.to_string(), sel))
                    .map_err(|e| {
                        UnfurlError::Config(format!("selectors.{field}: invalid selector {raw:?}: {e:?}"))
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { field, entries })
    }

    /// Run the chain against `doc`; empty string when nothing yields a value.
    pub fn first_value(&self, doc: &HtmlDocument) -> String {
        for (raw, selector) in &self.entries {
            let Some(node) = doc.query(selector) else {
                continue;
            };
            let value = node_value(&node);
            let value = value.trim();
            if !value.is_empty() {
                tracing::trace!(target: "unfurl.extract", field = self.field, selector = %raw, "matched");
                return value.to_string();
            }
        }
        String::new()
    }
}

fn node_value(node: &Node<'_>) -> String {
    if node.is_link_element() {
        if let Some(href) = node.attribute("href") {
            return href.to_string();
        }
    }
    if let Some(content) = node.attribute("content") {
        return content.to_string();
    }
    node.text()
}

#[derive(Debug, Clone)]
pub struct MetadataExtractor {
    title: SelectorChain,
    description: SelectorChain,
    image: SelectorChain,
    site: SelectorChain,
}

impl MetadataExtractor {
    pub fn from_config(settings: &SelectorSettings) -> Result<Self> {
        Ok(Self {
            title: SelectorChain::compile("title", &settings.title)?,
            description: SelectorChain::compile("description", &settings.description)?,
            image: SelectorChain::compile("image", &settings.image)?,
            site: SelectorChain::compile("site", &settings.site)?,
        })
    }

    /// Built-in chains.
    pub fn with_defaults() -> Result<Self> {
        Self::from_config(&SelectorSettings::default())
    }

    /// Extract preview metadata from `markup` fetched from `base_url`.
    ///
    /// Fails only when the markup cannot be parsed; missing signals are
    /// empty strings.
    pub fn extract(&self, markup: &str, base_url: &str) -> Result<ExtractedData> {
        let doc = HtmlDocument::parse(markup)?;

        let title = self.title.first_value(&doc);
        let description = self.description.first_value(&doc);
        let image = resolve_url(base_url, &self.image.first_value(&doc));
        let mut site = self.site.first_value(&doc);
        if site.is_empty() {
            site = title.clone();
        }

        Ok(ExtractedData {
            title,
            description,
            image,
            site,
        })
    }
}
