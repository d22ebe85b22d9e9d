//! Generic page extraction
//!
//! This module turns an arbitrary page into a structured summary: page
//! metadata, main content located by selectors or text density, ranked
//! images and a structure fingerprint.

pub mod content;
pub mod density;
pub mod images;
pub mod links;
pub mod metadata;
pub mod structure;

pub use content::{ContentBlock, ContentExtractor, ContentOrigin, Heading};
pub use density::{DensityMetrics, DensityScorer};
pub use images::{ImageDescriptor, ImageExtractor};
pub use links::{ExtractedLink, LinkExtractor, LinkType};
pub use metadata::{MetadataExtractor, PageInfo};
pub use structure::PageStructureStats;

use crate::dom::Document;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Content and images of a generic page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenericContent {
    /// Main content
    pub content: ContentBlock,
    /// Ranked images
    pub images: Vec<ImageDescriptor>,
}

/// Generic extraction entry point
pub struct GenericExtractor;

impl GenericExtractor {
    /// Main content plus images
    #[instrument(skip(doc))]
    pub fn extract(doc: &Document) -> Result<GenericContent> {
        Ok(GenericContent {
            content: ContentExtractor::extract(doc)?,
            images: ImageExtractor::extract(doc)?,
        })
    }
}
