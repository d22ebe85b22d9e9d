//! pagelens - page content extraction for LLM analysis
//!
//! This crate reads a web page, locates what matters on it and packages the
//! result for a chat model.
//!
//! # Features
//!
//! - **Generic extraction**: main content by selectors or text density,
//!   metadata, headings, links and ranked images
//! - **Platform extraction**: structured posts (title, author, counters,
//!   media, comments) for recognized sites
//! - **Comment loading**: scroll/click cycles that reveal lazily loaded
//!   comment threads, with de-duplication and stall detection
//! - **Browser automation**: live pages through ChromiumOxide (CDP)
//!
//! # Architecture
//!
//! ```text
//! PageDriver ──snapshot──▶ Orchestrator ──▶ Platform::detect
//!  (tab|html)                  │                 │
//!      ▲                       ▼                 ▼
//!      │               GenericExtractor   PlatformExtractor
//!      │                                         │
//!      └──────scroll / click───────────── CommentLoader
//!                              │
//!                              ▼
//!                      ExtractionResult ──▶ PromptBuilder ──▶ ChatClient
//! ```
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use pagelens::browser::StaticPage;
//! use pagelens::orchestrator::{ExtractOptions, Orchestrator};
//!
//! #[tokio::main]
//! async fn main() {
//!     let page = StaticPage::new("https://example.com/post", "<article>...</article>");
//!     let result = Orchestrator::extract(&page, &ExtractOptions::default(), None).await;
//!     println!("{}", serde_json::to_string_pretty(&result).unwrap());
//! }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod browser;
pub mod chat;
pub mod dom;
pub mod error;
pub mod extraction;
pub mod orchestrator;
pub mod platform;
pub mod prompt;

// Re-exports for convenience
pub use browser::{BrowserController, PageDriver, StaticPage};
pub use dom::{Document, DocumentSnapshot, ElementTarget};
pub use error::{Error, Result};
pub use extraction::{ContentExtractor, DensityScorer, GenericExtractor, ImageExtractor, MetadataExtractor};
pub use orchestrator::{ExtractOptions, ExtractionPayload, ExtractionResult, Orchestrator};
pub use platform::{CancelFlag, CommentLoader, LoaderConfig, Platform, PlatformExtractor};
pub use prompt::PromptBuilder;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
