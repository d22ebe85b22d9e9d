//! Extraction entry point
//!
//! [`Orchestrator::extract`] snapshots the page, picks the generic or the
//! platform path from the hostname and wraps the outcome in an
//! [`ExtractionResult`]. Errors never escape: they become a failure envelope
//! carrying the error message.

use crate::browser::PageDriver;
use crate::error::Result;
use crate::extraction::{
    ContentBlock, GenericContent, GenericExtractor, ImageDescriptor, MetadataExtractor, PageInfo,
    PageStructureStats,
};
use crate::platform::{CancelFlag, LoaderConfig, Platform, PlatformExtractor, PlatformPost};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

/// Per-call extraction options
#[derive(Debug, Clone, Default)]
pub struct ExtractOptions {
    /// Drive the comment loader on platform pages (default: false)
    pub auto_load_comments: bool,
    /// Loader settings used when `auto_load_comments` is set
    pub loader: LoaderConfig,
}

impl ExtractOptions {
    /// Create a new options builder
    pub fn builder() -> ExtractOptionsBuilder {
        ExtractOptionsBuilder::default()
    }
}

/// Builder for ExtractOptions
#[derive(Default)]
pub struct ExtractOptionsBuilder {
    options: ExtractOptions,
}

impl ExtractOptionsBuilder {
    /// Enable/disable incremental comment loading
    pub fn auto_load_comments(mut self, enabled: bool) -> Self {
        self.options.auto_load_comments = enabled;
        self
    }

    /// Set the loader settings
    pub fn loader(mut self, loader: LoaderConfig) -> Self {
        self.options.loader = loader;
        self
    }

    /// Build the options
    pub fn build(self) -> ExtractOptions {
        self.options
    }
}

/// What a successful extraction produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ExtractionPayload {
    /// Any page without a dedicated extractor
    #[serde(rename_all = "camelCase")]
    Generic {
        /// Page metadata
        page_info: PageInfo,
        /// Main content
        content: ContentBlock,
        /// Ranked images
        images: Vec<ImageDescriptor>,
        /// Element counts
        structure: PageStructureStats,
    },
    /// A post on a recognized platform
    #[serde(rename_all = "camelCase")]
    Platform {
        /// Page metadata
        page_info: PageInfo,
        /// Which platform
        platform: Platform,
        /// Structured post
        post: PlatformPost,
        /// Element counts
        structure: PageStructureStats,
    },
}

impl ExtractionPayload {
    /// Page metadata of either variant
    pub fn page_info(&self) -> &PageInfo {
        match self {
            Self::Generic { page_info, .. } | Self::Platform { page_info, .. } => page_info,
        }
    }
}

/// Outcome of one extraction call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "Envelope", try_from = "Envelope")]
pub enum ExtractionResult {
    /// Extraction succeeded
    Success(ExtractionPayload),
    /// Extraction failed; the message is meant for display
    Failure {
        /// Human-readable cause
        error_message: String,
    },
}

impl ExtractionResult {
    /// Whether extraction succeeded
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// The payload of a successful extraction
    pub fn payload(&self) -> Option<&ExtractionPayload> {
        match self {
            Self::Success(payload) => Some(payload),
            Self::Failure { .. } => None,
        }
    }

    /// The message of a failed extraction
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Success(_) => None,
            Self::Failure { error_message } => Some(error_message),
        }
    }
}

/// Wire shape: `{"ok":true,"payload":{..}}` or `{"ok":false,"errorMessage":".."}`
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Envelope {
    ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    payload: Option<ExtractionPayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error_message: Option<String>,
}

impl From<ExtractionResult> for Envelope {
    fn from(result: ExtractionResult) -> Self {
        match result {
            ExtractionResult::Success(payload) => Self {
                ok: true,
                payload: Some(payload),
                error_message: None,
            },
            ExtractionResult::Failure { error_message } => Self {
                ok: false,
                payload: None,
                error_message: Some(error_message),
            },
        }
    }
}

impl TryFrom<Envelope> for ExtractionResult {
    type Error = String;

    fn try_from(envelope: Envelope) -> std::result::Result<Self, Self::Error> {
        match (envelope.ok, envelope.payload) {
            (true, Some(payload)) => Ok(Self::Success(payload)),
            (true, None) => Err("successful result without payload".into()),
            (false, _) => Ok(Self::Failure {
                error_message: envelope.error_message.unwrap_or_default(),
            }),
        }
    }
}

/// Extraction entry point
pub struct Orchestrator;

impl Orchestrator {
    /// Extract the page behind `driver`. Never fails; see [`ExtractionResult`].
    #[instrument(skip(driver, options, cancel))]
    pub async fn extract<D: PageDriver>(
        driver: &D,
        options: &ExtractOptions,
        cancel: Option<&CancelFlag>,
    ) -> ExtractionResult {
        match Self::try_extract(driver, options, cancel).await {
            Ok(payload) => ExtractionResult::Success(payload),
            Err(e) => {
                error!("Extraction failed: {}", e);
                ExtractionResult::Failure {
                    error_message: e.to_string(),
                }
            }
        }
    }

    async fn try_extract<D: PageDriver>(
        driver: &D,
        options: &ExtractOptions,
        cancel: Option<&CancelFlag>,
    ) -> Result<ExtractionPayload> {
        let snapshot = driver.snapshot().await?;
        let platform = snapshot
            .hostname()
            .map(|host| Platform::detect(&host))
            .unwrap_or_default();
        info!("Extracting {} as {}", snapshot.url, platform);

        let doc = snapshot.parse();
        let page_info = MetadataExtractor::extract(&doc, &snapshot.url)?;
        let structure = PageStructureStats::analyze(&doc)?;

        if platform == Platform::Generic {
            let GenericContent { content, images } = GenericExtractor::extract(&doc)?;
            return Ok(ExtractionPayload::Generic {
                page_info,
                content,
                images,
                structure,
            });
        }
        drop(doc);

        let post = PlatformExtractor::extract(
            driver,
            &snapshot,
            platform,
            options.auto_load_comments,
            &options.loader,
            cancel,
        )
        .await?;

        Ok(ExtractionPayload::Platform {
            page_info,
            platform,
            post,
            structure,
        })
    }
}
