//! Page metadata extraction
//!
//! Builds the [`PageInfo`] snapshot from `<title>`, `<meta>` tags and the
//! favicon link.

use crate::dom::text::visible_text;
use crate::dom::{parse_selector, Document};
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, instrument};

/// Basic facts about the page, taken once per extraction
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    /// Page URL
    pub url: String,
    /// `<title>` text
    pub title: String,
    /// Meta description, falling back to og:description
    pub description: String,
    /// Meta keywords, as written
    pub keywords: String,
    /// Meta author
    pub author: String,
    /// article:published_time, falling back to publishdate
    pub publish_date: String,
    /// og:site_name
    pub site_name: String,
    /// Absolute favicon URL
    pub favicon: String,
    /// When the extraction ran
    pub extraction_timestamp: DateTime<Utc>,
}

/// Metadata extraction functionality
pub struct MetadataExtractor;

impl MetadataExtractor {
    /// Extract the page info of a document
    #[instrument(skip(doc))]
    pub fn extract(doc: &Document, url: &str) -> Result<PageInfo> {
        let meta = Self::meta_tags(doc)?;
        let get = |names: &[&str]| {
            names
                .iter()
                .find_map(|n| meta.get(*n).filter(|v| !v.is_empty()))
                .cloned()
                .unwrap_or_default()
        };

        let title = doc
            .select_first("title")?
            .map(visible_text)
            .unwrap_or_default();

        let info = PageInfo {
            url: url.to_string(),
            title,
            description: get(&["description", "og:description"]),
            keywords: get(&["keywords"]),
            author: get(&["author"]),
            publish_date: get(&["article:published_time", "publishdate"]),
            site_name: get(&["og:site_name"]),
            favicon: Self::favicon(doc)?,
            extraction_timestamp: Utc::now(),
        };

        debug!("Extracted page info: title={:?}", info.title);
        Ok(info)
    }

    /// All `<meta>` contents keyed by `name` or `property`; the first tag wins
    pub fn meta_tags(doc: &Document) -> Result<HashMap<String, String>> {
        let selector = parse_selector("meta")?;
        let mut tags = HashMap::new();
        for el in doc.html().select(&selector) {
            let el = el.value();
            let Some(name) = el.attr("name").or_else(|| el.attr("property")) else {
                continue;
            };
            let Some(content) = el.attr("content") else {
                continue;
            };
            tags.entry(name.to_string())
                .or_insert_with(|| content.trim().to_string());
        }
        Ok(tags)
    }

    fn favicon(doc: &Document) -> Result<String> {
        let href = doc
            .select_first(r#"link[rel="icon"], link[rel="shortcut icon"]"#)?
            .and_then(|el| el.value().attr("href"))
            .and_then(|href| doc.resolve(href))
            .map(String::from)
            .unwrap_or_default();
        Ok(href)
    }
}
