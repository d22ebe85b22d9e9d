//! Selector fallback chains
//!
//! Platforms rename their CSS classes often. Every field is therefore read
//! through an ordered list of probes; the first probe whose selector matches
//! and yields a non-empty value wins.

use crate::dom::text::visible_text;
use crate::dom::{first_within, parse_selector};
use crate::error::Result;
use scraper::{ElementRef, Selector};

/// How a probe reads its matched element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Read {
    /// Visible text
    Text,
    /// An attribute value
    Attr(&'static str),
}

/// One (selector, reader) candidate
#[derive(Debug, Clone, Copy)]
pub struct Probe {
    /// CSS selector tried inside the scope
    pub selector: &'static str,
    /// What to take from the first match
    pub read: Read,
}

impl Probe {
    /// Visible text of the first match
    pub const fn text(selector: &'static str) -> Self {
        Self {
            selector,
            read: Read::Text,
        }
    }

    /// Attribute of the first match
    pub const fn attr(selector: &'static str, name: &'static str) -> Self {
        Self {
            selector,
            read: Read::Attr(name),
        }
    }

    fn read(&self, el: ElementRef<'_>) -> Option<String> {
        let value = match self.read {
            Read::Text => visible_text(el),
            Read::Attr(name) => el.value().attr(name)?.trim().to_string(),
        };
        (!value.is_empty()).then_some(value)
    }
}

/// First non-empty value produced by `probes` inside `scope`
pub fn first_value(scope: ElementRef<'_>, probes: &[Probe]) -> Result<Option<String>> {
    for probe in probes {
        if let Some(el) = first_within(scope, probe.selector)? {
            if let Some(value) = probe.read(el) {
                return Ok(Some(value));
            }
        }
    }
    Ok(None)
}

/// Like [`first_value`], but ignores matches nested inside an element
/// matching one of `nested` below `scope`.
pub fn first_value_outside(
    scope: ElementRef<'_>,
    probes: &[Probe],
    nested: &[&str],
) -> Result<Option<String>> {
    let nested = nested
        .iter()
        .map(|s| parse_selector(s))
        .collect::<Result<Vec<Selector>>>()?;
    for probe in probes {
        let sel = parse_selector(probe.selector)?;
        let own = scope.select(&sel).find(|el| !is_nested(scope, *el, &nested));
        if let Some(value) = own.and_then(|el| probe.read(el)) {
            return Ok(Some(value));
        }
    }
    Ok(None)
}

fn is_nested(scope: ElementRef<'_>, el: ElementRef<'_>, nested: &[Selector]) -> bool {
    std::iter::once(el)
        .chain(el.ancestors().filter_map(ElementRef::wrap))
        .take_while(|a| a.id() != scope.id())
        .any(|a| nested.iter().any(|sel| sel.matches(&a)))
}

/// First selector in `selectors` matching anything inside `scope`
pub fn first_matching<'a>(
    scope: ElementRef<'a>,
    selectors: &[&'static str],
) -> Result<Option<(&'static str, ElementRef<'a>)>> {
    for &selector in selectors {
        if let Some(el) = first_within(scope, selector)? {
            return Ok(Some((selector, el)));
        }
    }
    Ok(None)
}
