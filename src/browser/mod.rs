//! Browser automation module
//!
//! Chromium lifecycle and navigation through chromiumoxide, plus the
//! [`PageDriver`] seam the extractors work against.

pub mod controller;
pub mod driver;
pub mod navigation;

pub use controller::{BrowserConfig, BrowserConfigBuilder, BrowserController, PageHandle};
pub use driver::{PageDriver, StaticPage};
pub use navigation::{NavigationOptions, NavigationResult, PageNavigator, WaitUntil};
