//! Link extraction
//!
//! Collects the anchors of a content root: resolved, deduplicated by
//! absolute URL and classified relative to the page host.

use crate::dom::text::{truncate_chars, visible_text};
use crate::dom::{parse_selector, Document};
use crate::error::Result;
use scraper::ElementRef;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, instrument};
use url::Url;

/// Type of link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkType {
    /// Internal link (same host)
    Internal,
    /// External link (different host)
    External,
    /// Anchor link (same page)
    Anchor,
    /// mailto: link
    Email,
    /// tel: link
    Phone,
    /// Other/unknown
    Other,
}

/// An extracted link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedLink {
    /// Absolute URL
    pub url: String,
    /// Link text, at most [`LinkExtractor::MAX_TEXT_CHARS`] characters
    pub text: String,
    /// Classification relative to the page
    pub link_type: LinkType,
}

/// Link extraction functionality
pub struct LinkExtractor;

impl LinkExtractor {
    /// At most this many links are kept
    pub const MAX_LINKS: usize = 20;

    /// Link text is cut to this many characters
    pub const MAX_TEXT_CHARS: usize = 100;

    /// Links under `root` with non-empty text and a non-`javascript:` target
    #[instrument(skip(doc, root))]
    pub fn extract(doc: &Document, root: ElementRef<'_>) -> Result<Vec<ExtractedLink>> {
        let selector = parse_selector("a[href]")?;
        let mut seen = HashSet::new();
        let mut links = Vec::new();

        for el in root.select(&selector) {
            let Some(href) = el.value().attr("href") else {
                continue;
            };
            if is_javascript(href) {
                continue;
            }
            let Some(url) = doc.resolve(href) else {
                continue;
            };
            if url.scheme() == "javascript" {
                continue;
            }
            let text = visible_text(el).replace('\n', " ");
            if text.is_empty() || !seen.insert(url.to_string()) {
                continue;
            }

            links.push(ExtractedLink {
                link_type: Self::classify(doc.base_url(), &url),
                url: url.into(),
                text: truncate_chars(&text, Self::MAX_TEXT_CHARS),
            });
            if links.len() == Self::MAX_LINKS {
                break;
            }
        }

        debug!("Extracted {} links", links.len());
        Ok(links)
    }

    /// Classify a resolved URL relative to the page location
    pub fn classify(base: Option<&Url>, url: &Url) -> LinkType {
        match url.scheme() {
            "mailto" => return LinkType::Email,
            "tel" => return LinkType::Phone,
            "http" | "https" => {}
            _ => return LinkType::Other,
        }
        let Some(base) = base else {
            return LinkType::External;
        };
        if url.host_str() != base.host_str() {
            return LinkType::External;
        }
        let same_document = url.path() == base.path() && url.query() == base.query();
        if same_document && url.fragment().is_some() {
            LinkType::Anchor
        } else {
            LinkType::Internal
        }
    }
}

fn is_javascript(href: &str) -> bool {
    href.trim_start()
        .get(..11)
        .is_some_and(|p| p.eq_ignore_ascii_case("javascript:"))
}
