//! Main content extraction
//!
//! Locates the main content of an arbitrary page and turns it into a
//! [`ContentBlock`]: normalized text, cleaned markup, heading outline and
//! links.

use super::density::DensityScorer;
use super::links::{ExtractedLink, LinkExtractor};
use crate::dom::text::{clean_inner_html, truncate_chars, visible_len, visible_text};
use crate::dom::{parse_selector, Document};
use crate::error::Result;
use scraper::ElementRef;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// Plain text is cut to this many characters
pub const MAX_TEXT_CHARS: usize = 15_000;

/// Cleaned markup is cut to this many characters
pub const MAX_HTML_CHARS: usize = 50_000;

/// A selector match shorter than this defers to density scoring
pub const MIN_SELECTOR_TEXT: usize = 200;

/// Common main-content containers, in priority order
pub const MAIN_SELECTORS: &[&str] = &[
    "article",
    "[role=\"main\"]",
    "main",
    ".content",
    ".post-content",
    ".article-content",
    ".entry-content",
    "#content",
    "#main-content",
    ".post",
    ".article",
];

/// A heading inside the main content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    /// 1 through 6
    pub level: u8,
    /// Heading text
    pub text: String,
}

/// How the content root was chosen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ContentOrigin {
    /// A known main-content selector matched
    Selector {
        /// The winning selector
        selector: String,
    },
    /// Chosen by density scoring
    Density,
    /// Nothing better than `<body>`
    Body,
}

/// Extracted main content of a page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentBlock {
    /// Normalized plain text, at most [`MAX_TEXT_CHARS`] characters
    pub text: String,
    /// Cleaned inner markup, at most [`MAX_HTML_CHARS`] characters
    pub html: String,
    /// Headings in document order
    pub headings: Vec<Heading>,
    /// Links in document order, deduplicated, at most [`LinkExtractor::MAX_LINKS`]
    pub links: Vec<ExtractedLink>,
    /// Words in the full text, counted before truncation
    pub word_count: usize,
    /// Characters in the full text, counted before truncation
    pub char_count: usize,
    /// Whether `text` was cut
    pub truncated: bool,
    /// How the content root was chosen
    pub origin: ContentOrigin,
}

/// Content extraction functionality
pub struct ContentExtractor;

impl ContentExtractor {
    /// Extract the main content of a document
    #[instrument(skip(doc))]
    pub fn extract(doc: &Document) -> Result<ContentBlock> {
        info!("Extracting main content");

        let (root, origin) = Self::find_main_content(doc)?;
        let full_text = visible_text(root);
        let word_count = full_text.split_whitespace().count();
        let char_count = full_text.chars().count();
        let truncated = char_count > MAX_TEXT_CHARS;
        let text = truncate_chars(&full_text, MAX_TEXT_CHARS);
        let html = truncate_chars(&clean_inner_html(root), MAX_HTML_CHARS);
        let headings = Self::headings(root)?;
        let links = LinkExtractor::extract(doc, root)?;

        debug!(
            "Extracted {} words, {} chars, {} headings, {} links, origin={:?}",
            word_count,
            char_count,
            headings.len(),
            links.len(),
            origin
        );

        Ok(ContentBlock {
            text,
            html,
            headings,
            links,
            word_count,
            char_count,
            truncated,
            origin,
        })
    }

    /// Pick the content root: best selector match, then density, then body
    pub fn find_main_content(doc: &Document) -> Result<(ElementRef<'_>, ContentOrigin)> {
        let mut best: Option<(ElementRef<'_>, &str, usize)> = None;
        for &selector in MAIN_SELECTORS {
            let Some(el) = doc.select_first(selector)? else {
                continue;
            };
            let len = visible_len(el);
            if best.map_or(true, |(_, _, best_len)| len > best_len) {
                best = Some((el, selector, len));
            }
        }

        if let Some((el, selector, len)) = best {
            if len >= MIN_SELECTOR_TEXT {
                return Ok((
                    el,
                    ContentOrigin::Selector {
                        selector: selector.to_string(),
                    },
                ));
            }
            debug!("Best selector {} has only {} chars", selector, len);
        }

        if let Some(candidate) = DensityScorer::best_candidate(doc)? {
            return Ok((candidate.element, ContentOrigin::Density));
        }

        Ok((doc.body(), ContentOrigin::Body))
    }

    /// Non-empty headings in document order
    pub fn headings(root: ElementRef<'_>) -> Result<Vec<Heading>> {
        let selector = parse_selector("h1, h2, h3, h4, h5, h6")?;
        let headings = root
            .select(&selector)
            .filter_map(|el| {
                let level = el.value().name().strip_prefix('h')?.parse::<u8>().ok()?;
                let text = visible_text(el).replace('\n', " ");
                (!text.is_empty()).then_some(Heading { level, text })
            })
            .collect();
        Ok(headings)
    }
}
