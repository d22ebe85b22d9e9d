//! Browser lifecycle management
//!
//! Launches Chromium, opens tabs for extraction and shuts everything down.

use crate::error::{BrowserError, Error, Result};
use chromiumoxide::browser::{Browser, BrowserConfig as CdpBrowserConfig};
use chromiumoxide::Page;
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

/// Configuration for browser launch
#[derive(Debug, Clone)]
pub struct BrowserConfig {
    /// Run without a window (default: true)
    pub headless: bool,
    /// Window width (default: 1920)
    pub width: u32,
    /// Window height (default: 1080)
    pub height: u32,
    /// Chromium sandbox (default: true)
    pub sandbox: bool,
    /// User agent override
    pub user_agent: Option<String>,
    /// Navigation timeout in milliseconds (default: 30000)
    pub timeout_ms: u64,
    /// Chrome/Chromium executable (None = auto-detect)
    pub chrome_path: Option<String>,
    /// Additional Chrome arguments
    pub extra_args: Vec<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            width: 1920,
            height: 1080,
            sandbox: true,
            user_agent: None,
            timeout_ms: 30000,
            chrome_path: None,
            extra_args: Vec::new(),
        }
    }
}

impl BrowserConfig {
    /// Create a new config builder
    pub fn builder() -> BrowserConfigBuilder {
        BrowserConfigBuilder::default()
    }
}

/// Builder for BrowserConfig
#[derive(Default)]
pub struct BrowserConfigBuilder {
    config: BrowserConfig,
}

impl BrowserConfigBuilder {
    /// Set headless mode
    pub fn headless(mut self, headless: bool) -> Self {
        self.config.headless = headless;
        self
    }

    /// Set window dimensions
    pub fn viewport(mut self, width: u32, height: u32) -> Self {
        self.config.width = width;
        self.config.height = height;
        self
    }

    /// Enable/disable sandbox
    pub fn sandbox(mut self, sandbox: bool) -> Self {
        self.config.sandbox = sandbox;
        self
    }

    /// Set user agent
    pub fn user_agent<S: Into<String>>(mut self, ua: S) -> Self {
        self.config.user_agent = Some(ua.into());
        self
    }

    /// Set navigation timeout
    pub fn timeout_ms(mut self, ms: u64) -> Self {
        self.config.timeout_ms = ms;
        self
    }

    /// Set Chrome path
    pub fn chrome_path<S: Into<String>>(mut self, path: S) -> Self {
        self.config.chrome_path = Some(path.into());
        self
    }

    /// Add extra Chrome argument
    pub fn arg<S: Into<String>>(mut self, arg: S) -> Self {
        self.config.extra_args.push(arg.into());
        self
    }

    /// Build the config
    pub fn build(self) -> BrowserConfig {
        self.config
    }
}

/// Handle to an open browser tab
#[derive(Clone)]
pub struct PageHandle {
    pub(crate) page: Page,
    pub(crate) url: Arc<RwLock<String>>,
}

impl PageHandle {
    /// Get the underlying chromiumoxide Page
    pub fn inner(&self) -> &Page {
        &self.page
    }

    /// Last known URL of the tab
    pub async fn url(&self) -> String {
        self.url.read().await.clone()
    }

    pub(crate) async fn set_url(&self, url: String) {
        *self.url.write().await = url;
    }
}

/// Owns the browser process and its event loop
pub struct BrowserController {
    browser: Browser,
    handler: JoinHandle<()>,
    config: BrowserConfig,
}

impl BrowserController {
    /// Launch with default config
    #[instrument]
    pub async fn new() -> Result<Self> {
        Self::with_config(BrowserConfig::default()).await
    }

    /// Launch with custom config
    #[instrument(skip(config))]
    pub async fn with_config(config: BrowserConfig) -> Result<Self> {
        info!("Launching browser: headless={}", config.headless);

        let mut builder = CdpBrowserConfig::builder().viewport(
            chromiumoxide::handler::viewport::Viewport {
                width: config.width,
                height: config.height,
                device_scale_factor: None,
                emulating_mobile: false,
                is_landscape: true,
                has_touch: false,
            },
        );

        if !config.headless {
            builder = builder.with_head();
        }
        if !config.sandbox {
            builder = builder.arg("--no-sandbox");
        }
        if let Some(ref path) = config.chrome_path {
            builder = builder.chrome_executable(path);
        }
        if let Some(ref ua) = config.user_agent {
            builder = builder.arg(format!("--user-agent={ua}"));
        }
        for arg in &config.extra_args {
            builder = builder.arg(arg);
        }

        let cdp_config = builder
            .build()
            .map_err(|e| BrowserError::ConfigError(e.to_string()))?;

        let (browser, mut handler) = Browser::launch(cdp_config)
            .await
            .map_err(|e| BrowserError::LaunchFailed(e.to_string()))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    warn!("Browser handler event error");
                    break;
                }
            }
            debug!("Browser handler finished");
        });

        info!("Browser launched");

        Ok(Self {
            browser,
            handler: handler_task,
            config,
        })
    }

    /// Open a blank tab
    #[instrument(skip(self))]
    pub async fn new_page(&self) -> Result<PageHandle> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| BrowserError::PageCreationFailed(e.to_string()))?;

        debug!("Created new page");
        Ok(PageHandle {
            page,
            url: Arc::new(RwLock::new("about:blank".to_string())),
        })
    }

    /// Open a tab on `url` and wait until it is ready.
    ///
    /// With `wait_for`, also wait for that selector to match, which gives
    /// script-rendered pages time to build their content.
    #[instrument(skip(self))]
    pub async fn navigate(&self, url: &str, wait_for: Option<&str>) -> Result<PageHandle> {
        let page = self.new_page().await?;
        let options = super::navigation::NavigationOptions {
            timeout_ms: self.config.timeout_ms,
            ..Default::default()
        };
        super::navigation::PageNavigator::goto(&page, url, Some(options)).await?;

        if let Some(selector) = wait_for {
            super::navigation::PageNavigator::wait_for_selector(
                &page,
                selector,
                self.config.timeout_ms,
            )
            .await?;
        }
        Ok(page)
    }

    /// Get the browser configuration
    pub fn config(&self) -> &BrowserConfig {
        &self.config
    }

    /// Close the browser
    #[instrument(skip(self))]
    pub async fn close(mut self) -> Result<()> {
        info!("Closing browser");

        self.browser
            .close()
            .await
            .map_err(|e| Error::cdp(e.to_string()))?;

        let _ = tokio::time::timeout(Duration::from_secs(5), self.handler).await;

        info!("Browser closed");
        Ok(())
    }
}
