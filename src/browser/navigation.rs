//! Page navigation
//!
//! URL navigation with retries, readiness waits and a short human-like
//! settle period so lazy content starts loading before the first snapshot.

use crate::browser::PageHandle;
use crate::error::{Error, NavigationError, Result};
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Nudge the scroll position, then restore it
const SETTLE_SCRIPTS: &[&str] = &[
    "window.scrollTo({ top: Math.random() * 100 + 50, behavior: 'smooth' })",
    "window.scrollTo({ top: 0, behavior: 'instant' })",
];

/// Options for page navigation
#[derive(Debug, Clone)]
pub struct NavigationOptions {
    /// Timeout in milliseconds (default: 30000)
    pub timeout_ms: u64,
    /// Readiness condition (default: NetworkIdle)
    pub wait_until: WaitUntil,
    /// Number of retry attempts (default: 2)
    pub retries: u32,
    /// Delay between retries in ms (default: 1000)
    pub retry_delay_ms: u64,
    /// Pause and nudge the scroll position after load (default: true)
    pub human_like: bool,
}

impl Default for NavigationOptions {
    fn default() -> Self {
        Self {
            timeout_ms: 30000,
            wait_until: WaitUntil::NetworkIdle,
            retries: 2,
            retry_delay_ms: 1000,
            human_like: true,
        }
    }
}

/// Condition to wait for after navigation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitUntil {
    /// `load` event
    Load,
    /// `DOMContentLoaded` event
    DomContentLoaded,
    /// `load` plus a short quiet period
    NetworkIdle,
}

impl WaitUntil {
    fn script(self) -> &'static str {
        match self {
            Self::Load => {
                r#"
                    new Promise(resolve => {
                        if (document.readyState === 'complete') {
                            resolve(true);
                        } else {
                            window.addEventListener('load', () => resolve(true));
                        }
                    })
                "#
            }
            Self::DomContentLoaded => {
                r#"
                    new Promise(resolve => {
                        if (document.readyState !== 'loading') {
                            resolve(true);
                        } else {
                            document.addEventListener('DOMContentLoaded', () => resolve(true));
                        }
                    })
                "#
            }
            Self::NetworkIdle => {
                r#"
                    new Promise(resolve => {
                        if (document.readyState === 'complete') {
                            setTimeout(() => resolve(true), 500);
                        } else {
                            window.addEventListener('load', () => {
                                setTimeout(() => resolve(true), 500);
                            });
                        }
                    })
                "#
            }
        }
    }
}

/// Result of a navigation
#[derive(Debug)]
pub struct NavigationResult {
    /// Final URL after any redirects
    pub final_url: String,
    /// Page title
    pub title: Option<String>,
    /// Navigation duration in milliseconds
    pub duration_ms: u64,
}

/// Page navigator
pub struct PageNavigator;

impl PageNavigator {
    /// Check that `url` is absolute and uses a scheme a tab can load
    pub fn validate(url: &str) -> Result<Url> {
        let parsed = Url::parse(url).map_err(|e| NavigationError::InvalidUrl(format!("{url}: {e}")))?;
        match parsed.scheme() {
            "http" | "https" | "file" => Ok(parsed),
            other => Err(NavigationError::InvalidUrl(format!(
                "unsupported scheme {other:?}: {url}"
            ))
            .into()),
        }
    }

    /// Navigate to a URL
    #[instrument(skip(page))]
    pub async fn goto(
        page: &PageHandle,
        url: &str,
        options: Option<NavigationOptions>,
    ) -> Result<NavigationResult> {
        let opts = options.unwrap_or_default();
        let start = Instant::now();
        Self::validate(url)?;

        info!("Navigating to: {}", url);

        let mut last_error = None;
        for attempt in 0..=opts.retries {
            if attempt > 0 {
                warn!("Navigation retry attempt {} of {}", attempt, opts.retries);
                tokio::time::sleep(Duration::from_millis(opts.retry_delay_ms)).await;
            }

            match Self::navigate_once(&page.page, url, &opts).await {
                Ok((final_url, title)) => {
                    page.set_url(final_url.clone()).await;

                    if opts.human_like {
                        Self::settle(&page.page).await;
                    }

                    return Ok(NavigationResult {
                        final_url,
                        title,
                        duration_ms: start.elapsed().as_millis() as u64,
                    });
                }
                Err(e) => {
                    warn!("Navigation attempt {} failed: {}", attempt + 1, e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            NavigationError::LoadFailed("Navigation failed after all retries".to_string()).into()
        }))
    }

    async fn navigate_once(
        page: &chromiumoxide::Page,
        url: &str,
        opts: &NavigationOptions,
    ) -> Result<(String, Option<String>)> {
        let timeout = Duration::from_millis(opts.timeout_ms);

        tokio::time::timeout(timeout, page.goto(url))
            .await
            .map_err(|_| NavigationError::Timeout(opts.timeout_ms))?
            .map_err(|e| NavigationError::LoadFailed(e.to_string()))?;

        tokio::time::timeout(timeout, page.evaluate(opts.wait_until.script()))
            .await
            .map_err(|_| NavigationError::Timeout(opts.timeout_ms))?
            .map_err(|e| Error::cdp(e.to_string()))?;

        let final_url = page
            .url()
            .await
            .map_err(|e| Error::cdp(e.to_string()))?
            .unwrap_or_else(|| url.to_string());

        let title = page
            .evaluate("document.title")
            .await
            .ok()
            .and_then(|v| v.into_value::<String>().ok());

        debug!("Navigation complete: {} -> {}", url, final_url);
        Ok((final_url, title))
    }

    /// Random pause and a small scroll so lazy loaders fire, then back to
    /// the top so stamped offsets match an unscrolled page
    async fn settle(page: &chromiumoxide::Page) {
        let delay = rand::random::<u64>() % 500 + 200;
        tokio::time::sleep(Duration::from_millis(delay)).await;

        for (step, script) in SETTLE_SCRIPTS.iter().enumerate() {
            if let Err(e) = page.evaluate(*script).await {
                debug!("Settle step {} failed: {}", step, e);
            }
            tokio::time::sleep(Duration::from_millis(200)).await;
        }
    }

    /// Wait until `selector` matches something
    #[instrument(skip(page))]
    pub async fn wait_for_selector(
        page: &PageHandle,
        selector: &str,
        timeout_ms: u64,
    ) -> Result<()> {
        let quoted = serde_json::to_string(selector)?;
        let script = format!(
            r#"
                new Promise((resolve, reject) => {{
                    const timeout = {timeout_ms};
                    const start = Date.now();

                    function check() {{
                        if (document.querySelector({quoted})) {{
                            resolve(true);
                        }} else if (Date.now() - start > timeout) {{
                            reject(new Error('Timeout waiting for selector'));
                        }} else {{
                            requestAnimationFrame(check);
                        }}
                    }}
                    check();
                }})
            "#
        );

        let timeout = Duration::from_millis(timeout_ms + 1000);
        tokio::time::timeout(timeout, page.page.evaluate(script.as_str()))
            .await
            .map_err(|_| NavigationError::Timeout(timeout_ms))?
            .map_err(|e| Error::cdp(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========================================================================
    // NavigationOptions Tests
    // ========================================================================

    #[test]
    fn test_navigation_options_default() {
        let opts = NavigationOptions::default();
        assert_eq!(opts.timeout_ms, 30000);
        assert_eq!(opts.retries, 2);
        assert!(opts.human_like);
        assert_eq!(opts.wait_until, WaitUntil::NetworkIdle);
    }

    #[test]
    fn test_settle_ends_at_top() {
        assert_eq!(SETTLE_SCRIPTS.len(), 2);
        assert!(SETTLE_SCRIPTS[0].contains("Math.random()"));
        assert!(SETTLE_SCRIPTS
            .last()
            .is_some_and(|script| script.contains("top: 0")));
    }

    #[test]
    fn test_wait_scripts_differ() {
        assert_ne!(WaitUntil::Load.script(), WaitUntil::DomContentLoaded.script());
        assert!(WaitUntil::NetworkIdle.script().contains("setTimeout"));
    }

    // ========================================================================
    // URL Validation Tests
    // ========================================================================

    #[test]
    fn test_validate_accepts_loadable_schemes() {
        assert!(PageNavigator::validate("https://www.xiaohongshu.com/explore/1").is_ok());
        assert!(PageNavigator::validate("http://example.com?foo=bar#x").is_ok());
        assert!(PageNavigator::validate("file:///tmp/page.html").is_ok());
    }

    #[test]
    fn test_validate_rejects_relative_and_other_schemes() {
        assert!(matches!(
            PageNavigator::validate("example.com"),
            Err(Error::Navigation(NavigationError::InvalidUrl(_)))
        ));
        assert!(PageNavigator::validate("ftp://example.com").is_err());
        assert!(PageNavigator::validate("").is_err());
    }
}
