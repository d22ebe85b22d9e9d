//! Parsed page snapshots
//!
//! A [`DocumentSnapshot`] is the serialized state of a page at one instant.
//! Snapshots taken from a live tab carry layout stamps (see [`layout`]) so
//! that geometry and visibility survive serialization. [`Document`] parses a
//! snapshot with `scraper` and offers the traversal helpers every extractor
//! shares.

pub mod layout;
pub mod target;
pub mod text;

pub use layout::{is_rendered, is_visible, Layout, HIDDEN_ATTR};
pub use target::ElementTarget;

use crate::error::{ExtractionError, Result};
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use url::Url;

/// Browser viewport dimensions in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Viewport width
    pub width: f64,
    /// Viewport height
    pub height: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1920.0,
            height: 1080.0,
        }
    }
}

/// Serialized page state handed from a driver to the extractors
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSnapshot {
    /// Location of the page when the snapshot was taken
    pub url: String,
    /// Full `documentElement` markup
    pub html: String,
    /// Viewport at snapshot time
    #[serde(default)]
    pub viewport: Viewport,
}

impl DocumentSnapshot {
    /// Create a snapshot from raw markup with the default viewport
    pub fn new<U: Into<String>, H: Into<String>>(url: U, html: H) -> Self {
        Self {
            url: url.into(),
            html: html.into(),
            viewport: Viewport::default(),
        }
    }

    /// Hostname of the snapshot URL, lowercased
    pub fn hostname(&self) -> Option<String> {
        Url::parse(&self.url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_ascii_lowercase))
    }

    /// Parse the markup
    pub fn parse(&self) -> Document {
        Document::parse(self)
    }
}

/// A parsed snapshot
pub struct Document {
    html: Html,
    base_url: Option<Url>,
    viewport: Viewport,
}

impl Document {
    /// Parse a snapshot
    pub fn parse(snapshot: &DocumentSnapshot) -> Self {
        Self {
            html: Html::parse_document(&snapshot.html),
            base_url: Url::parse(&snapshot.url).ok(),
            viewport: snapshot.viewport,
        }
    }

    /// Parse markup directly, without a known location
    pub fn from_html(html: &str) -> Self {
        Self {
            html: Html::parse_document(html),
            base_url: None,
            viewport: Viewport::default(),
        }
    }

    /// The underlying scraper tree
    pub fn html(&self) -> &Html {
        &self.html
    }

    /// Page location, used as the base for relative URLs
    pub fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }

    /// Viewport at snapshot time
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// The `<body>` element, or the root element for fragments without one
    pub fn body(&self) -> ElementRef<'_> {
        let body = parse_selector("body")
            .ok()
            .and_then(|sel| self.html.select(&sel).next());
        body.unwrap_or_else(|| self.html.root_element())
    }

    /// First element matching `selector` in document order
    pub fn select_first(&self, selector: &str) -> Result<Option<ElementRef<'_>>> {
        let sel = parse_selector(selector)?;
        Ok(self.html.select(&sel).next())
    }

    /// Number of elements matching `selector`
    pub fn count(&self, selector: &str) -> Result<usize> {
        let sel = parse_selector(selector)?;
        Ok(self.html.select(&sel).count())
    }

    /// Resolve an href or src against the page location.
    ///
    /// Absolute inputs (including `data:` and `javascript:`) parse on their
    /// own; relative ones need a base URL.
    pub fn resolve(&self, href: &str) -> Option<Url> {
        let href = href.trim();
        if href.is_empty() {
            return None;
        }
        match &self.base_url {
            Some(base) => base.join(href).ok(),
            None => Url::parse(href).ok(),
        }
    }
}

/// Parse a CSS selector, mapping failures into [`ExtractionError::InvalidSelector`]
pub fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector)
        .map_err(|e| ExtractionError::InvalidSelector(format!("{selector}: {e}")).into())
}

/// Elements matching `selector` inside `scope`, excluding `scope` itself
pub fn select_within<'a>(scope: ElementRef<'a>, selector: &str) -> Result<Vec<ElementRef<'a>>> {
    let sel = parse_selector(selector)?;
    Ok(scope.select(&sel).collect())
}

/// First element matching `selector` inside `scope`
pub fn first_within<'a>(scope: ElementRef<'a>, selector: &str) -> Result<Option<ElementRef<'a>>> {
    let sel = parse_selector(selector)?;
    Ok(scope.select(&sel).next())
}

/// Nearest ancestor element with the given tag name
pub fn closest<'a>(element: ElementRef<'a>, tag: &str) -> Option<ElementRef<'a>> {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == tag)
}

/// Parent element, if the parent node is an element
pub fn parent_element(element: ElementRef<'_>) -> Option<ElementRef<'_>> {
    element.parent().and_then(ElementRef::wrap)
}

/// Next sibling that is an element
pub fn next_element_sibling(element: ElementRef<'_>) -> Option<ElementRef<'_>> {
    element.next_siblings().find_map(ElementRef::wrap)
}
