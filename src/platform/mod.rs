//! Platform-specific extraction
//!
//! Some sites publish posts with a fixed anatomy (title, author, counters,
//! media, a comment thread) that the generic extractor would flatten into
//! text. Those sites are recognized by hostname and read field by field.

pub mod chain;
pub mod comments;
pub mod loader;
pub mod numbers;
pub mod xiaohongshu;

pub use chain::{first_value, Probe};
pub use comments::{Comment, CommentAccumulator, CommentAuthor, CommentParser, Reply};
pub use loader::{CancelFlag, CommentLoader, LoadOutcome, LoadReport, LoaderConfig, StopReason};
pub use numbers::parse_number;
pub use xiaohongshu::{
    EngagementStats, MediaImage, MediaVideo, PlatformPost, PostAuthor, PostMedia,
    XiaohongshuExtractor,
};

use crate::browser::PageDriver;
use crate::dom::DocumentSnapshot;
use crate::error::{ExtractionError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, instrument};
use url::Url;

/// Host fragments that identify Xiaohongshu
const XIAOHONGSHU_HOSTS: &[&str] = &["xiaohongshu.com", "xhslink.com"];

/// Which extraction path a page takes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Any page without a dedicated extractor
    #[default]
    Generic,
    /// Xiaohongshu (RED) notes
    Xiaohongshu,
}

impl Platform {
    /// Classify a hostname by substring match
    pub fn detect(host: &str) -> Self {
        let host = host.to_ascii_lowercase();
        if XIAOHONGSHU_HOSTS.iter().any(|h| host.contains(h)) {
            Self::Xiaohongshu
        } else {
            Self::Generic
        }
    }

    /// Classify a URL; unparseable URLs are generic
    pub fn from_url(url: &str) -> Self {
        Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(Self::detect))
            .unwrap_or_default()
    }

    /// Lowercase tag used in serialized results
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Generic => "generic",
            Self::Xiaohongshu => "xiaohongshu",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dispatches to the extractor of a detected platform
pub struct PlatformExtractor;

impl PlatformExtractor {
    /// Extract a post from `snapshot`.
    ///
    /// Comments come from the snapshot itself, or from a [`CommentLoader`]
    /// run against `driver` when `auto_load_comments` is set. Both paths use
    /// the same comment parser.
    #[instrument(skip(driver, snapshot, loader, cancel))]
    pub async fn extract<D: PageDriver>(
        driver: &D,
        snapshot: &DocumentSnapshot,
        platform: Platform,
        auto_load_comments: bool,
        loader: &LoaderConfig,
        cancel: Option<&CancelFlag>,
    ) -> Result<PlatformPost> {
        let mut post = match platform {
            Platform::Xiaohongshu => XiaohongshuExtractor::extract(&snapshot.parse())?,
            Platform::Generic => {
                return Err(ExtractionError::ExtractionFailed(
                    "generic pages have no platform extractor".into(),
                )
                .into())
            }
        };

        if auto_load_comments {
            let outcome = CommentLoader::new(loader.clone()).run(driver, cancel).await;
            info!(
                "Loaded {} comments ({} from the first snapshot)",
                outcome.comments.len(),
                post.comments.len()
            );
            if !outcome.comments.is_empty() || post.comments.is_empty() {
                post.comments = outcome.comments;
            }
            post.comment_loading = Some(outcome.report);
        }

        Ok(post)
    }
}
