//! Addressing elements across snapshots
//!
//! A snapshot is a copy, so an element found in it cannot be handed back to
//! the live page. [`ElementTarget`] names an element by selector and match
//! index instead; the same address resolves in a parsed [`Document`] and, via
//! [`ElementTarget::js_expression`], in the tab the snapshot came from.

use crate::dom::{parent_element, parse_selector, Document};
use crate::error::Result;
use scraper::ElementRef;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable address of an element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum ElementTarget {
    /// The `index`-th match of `selector` in document order
    Selector {
        /// CSS selector
        selector: String,
        /// Position among all matches
        index: usize,
    },
    /// Parent element of another target
    ParentOf {
        /// Child target
        child: Box<ElementTarget>,
    },
}

impl ElementTarget {
    /// The `index`-th match of `selector`
    pub fn nth<S: Into<String>>(selector: S, index: usize) -> Self {
        Self::Selector {
            selector: selector.into(),
            index,
        }
    }

    /// The parent of this target
    pub fn parent(self) -> Self {
        Self::ParentOf {
            child: Box::new(self),
        }
    }

    /// Find the addressed element in a parsed snapshot
    pub fn resolve<'a>(&self, doc: &'a Document) -> Result<Option<ElementRef<'a>>> {
        match self {
            Self::Selector { selector, index } => {
                let sel = parse_selector(selector)?;
                Ok(doc.html().select(&sel).nth(*index))
            }
            Self::ParentOf { child } => Ok(child.resolve(doc)?.and_then(parent_element)),
        }
    }

    /// JavaScript expression evaluating to the element, or `undefined`/`null`
    pub fn js_expression(&self) -> String {
        match self {
            Self::Selector { selector, index } => {
                let quoted = serde_json::to_string(selector).unwrap_or_else(|_| "\"\"".into());
                format!("document.querySelectorAll({quoted})[{index}]")
            }
            Self::ParentOf { child } => format!("{}?.parentElement", child.js_expression()),
        }
    }
}

impl fmt::Display for ElementTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Selector { selector, index } => write!(f, "{selector}[{index}]"),
            Self::ParentOf { child } => write!(f, "parent({child})"),
        }
    }
}
