//! Page structure fingerprint

use crate::dom::Document;
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Document-wide element counts, independent of the extracted content
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageStructureStats {
    /// An `<article>` exists
    pub has_article: bool,
    /// A `<main>` exists
    pub has_main: bool,
    /// `h1`..`h6`
    pub heading_count: usize,
    /// `p`
    pub paragraph_count: usize,
    /// `img`
    pub image_count: usize,
    /// `a`
    pub link_count: usize,
    /// `video`
    pub video_count: usize,
    /// `table`
    pub table_count: usize,
    /// `ul` and `ol`
    pub list_count: usize,
}

impl PageStructureStats {
    /// Count elements across the whole document
    pub fn analyze(doc: &Document) -> Result<Self> {
        Ok(Self {
            has_article: doc.count("article")? > 0,
            has_main: doc.count("main")? > 0,
            heading_count: doc.count("h1, h2, h3, h4, h5, h6")?,
            paragraph_count: doc.count("p")?,
            image_count: doc.count("img")?,
            link_count: doc.count("a")?,
            video_count: doc.count("video")?,
            table_count: doc.count("table")?,
            list_count: doc.count("ul, ol")?,
        })
    }
}
