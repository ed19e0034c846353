//! Queryable HTML document backed by `scraper`.

use scraper::{ElementRef, Html, Selector};
use unfurl_common::{Result, UnfurlError};

pub struct HtmlDocument {
    html: Html,
}

impl HtmlDocument {
    /// Parse `markup` into a document.
    ///
    /// The html5ever parser recovers from any malformed markup, so the only
    /// input rejected here is one carrying NUL bytes, which is never a
    /// legitimate text document.
    pub fn parse(markup: &str) -> Result<Self> {
        if let Some(pos) = markup.find('\0') {
            return Err(UnfurlError::Parse(format!("NUL byte at offset {pos}")));
        }
        Ok(Self {
            html: Html::parse_document(markup),
        })
    }

    /// First element matching `selector`, in document order.
    pub fn query(&self, selector: &Selector) -> Option<Node<'_>> {
        self.html.select(selector).next().map(Node)
    }
}

/// A matched element.
#[derive(Clone, Copy)]
pub struct Node<'a>(ElementRef<'a>);

impl<'a> Node<'a> {
    pub fn attribute(&self, name: &str) -> Option<&'a str> {
        self.0.value().attr(name)
    }

    /// Concatenated descendant text, untrimmed.
    pub fn text(&self) -> String {
        self.0.text().collect()
    }

    pub fn is_link_element(&self) -> bool {
        self.0.value().name().eq_ignore_ascii_case("link")
    }
}
