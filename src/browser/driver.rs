//! Page interaction seam
//!
//! Extractors never touch a live tab directly. They ask a [`PageDriver`] for
//! serialized snapshots and address elements with [`ElementTarget`]s. A
//! chromiumoxide tab and a fixed HTML document both implement the trait.

use crate::browser::PageHandle;
use crate::dom::{DocumentSnapshot, ElementTarget};
use crate::error::{ExtractionError, Result};
use tracing::{debug, instrument};

/// Operations the extraction pipeline needs from a page
#[allow(async_fn_in_trait)]
pub trait PageDriver {
    /// Serialize the current page, layout stamps included
    async fn snapshot(&self) -> Result<DocumentSnapshot>;

    /// Scroll the window, and `target` when given, to the bottom
    async fn scroll_to_bottom(&self, target: Option<&ElementTarget>) -> Result<()>;

    /// Click an element
    async fn click(&self, target: &ElementTarget) -> Result<()>;
}

/// A fixed document. Scrolling and clicking change nothing.
#[derive(Debug, Clone)]
pub struct StaticPage {
    snapshot: DocumentSnapshot,
}

impl StaticPage {
    /// Wrap markup served from `url`
    pub fn new<U: Into<String>, H: Into<String>>(url: U, html: H) -> Self {
        Self {
            snapshot: DocumentSnapshot::new(url, html),
        }
    }

    /// Wrap an existing snapshot
    pub fn from_snapshot(snapshot: DocumentSnapshot) -> Self {
        Self { snapshot }
    }
}

impl PageDriver for StaticPage {
    async fn snapshot(&self) -> Result<DocumentSnapshot> {
        Ok(self.snapshot.clone())
    }

    async fn scroll_to_bottom(&self, _target: Option<&ElementTarget>) -> Result<()> {
        Ok(())
    }

    async fn click(&self, target: &ElementTarget) -> Result<()> {
        debug!("Ignoring click on static page: {}", target);
        Ok(())
    }
}

/// Stamps layout into `data-pl-*` attributes, serializes, then removes the stamps
const SNAPSHOT_SCRIPT: &str = r#"
    (() => {
        const prefix = 'data-pl-';
        const keys = ['hidden', 'natural-w', 'natural-h', 'w', 'h', 'top'];
        const stamped = [];
        const root = document.body || document.documentElement;
        for (const el of root.querySelectorAll('*')) {
            const style = getComputedStyle(el);
            const rect = el.getBoundingClientRect();
            const empty = rect.width === 0 && rect.height === 0
                && style.display !== 'contents' && el.tagName !== 'BR';
            const hidden = style.display === 'none'
                || style.visibility === 'hidden'
                || style.opacity === '0'
                || empty;
            let touched = false;
            if (hidden) {
                el.setAttribute(prefix + 'hidden', '1');
                touched = true;
            }
            if (el.tagName === 'IMG') {
                if (el.naturalWidth) {
                    el.setAttribute(prefix + 'natural-w', el.naturalWidth);
                    el.setAttribute(prefix + 'natural-h', el.naturalHeight);
                }
                el.setAttribute(prefix + 'w', Math.round(rect.width));
                el.setAttribute(prefix + 'h', Math.round(rect.height));
                el.setAttribute(prefix + 'top', Math.round(rect.top));
                touched = true;
            }
            if (touched) stamped.push(el);
        }
        const html = document.documentElement.outerHTML;
        for (const el of stamped) {
            for (const key of keys) el.removeAttribute(prefix + key);
        }
        return {
            url: location.href,
            html,
            viewport: { width: window.innerWidth, height: window.innerHeight },
        };
    })()
"#;

impl PageDriver for PageHandle {
    #[instrument(skip(self))]
    async fn snapshot(&self) -> Result<DocumentSnapshot> {
        let snapshot: DocumentSnapshot = self
            .page
            .evaluate(SNAPSHOT_SCRIPT)
            .await
            .map_err(|e| ExtractionError::JsExecutionFailed(e.to_string()))?
            .into_value()
            .map_err(|e| ExtractionError::ParsingFailed(e.to_string()))?;

        self.set_url(snapshot.url.clone()).await;
        debug!("Snapshot of {} ({} bytes)", snapshot.url, snapshot.html.len());
        Ok(snapshot)
    }

    #[instrument(skip(self))]
    async fn scroll_to_bottom(&self, target: Option<&ElementTarget>) -> Result<()> {
        let element = target.map_or_else(|| "null".to_string(), ElementTarget::js_expression);
        let script = format!(
            r#"
                ((el) => {{
                    if (el) el.scrollTop = el.scrollHeight;
                    window.scrollTo(0, document.documentElement.scrollHeight);
                    return true;
                }})({element})
            "#
        );

        self.page
            .evaluate(script.as_str())
            .await
            .map_err(|e| ExtractionError::JsExecutionFailed(e.to_string()))?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn click(&self, target: &ElementTarget) -> Result<()> {
        let script = format!(
            r#"
                ((el) => {{
                    if (!el) return false;
                    el.click();
                    return true;
                }})({})
            "#,
            target.js_expression()
        );

        let clicked: bool = self
            .page
            .evaluate(script.as_str())
            .await
            .map_err(|e| ExtractionError::JsExecutionFailed(e.to_string()))?
            .into_value()
            .map_err(|e| ExtractionError::ParsingFailed(e.to_string()))?;

        if !clicked {
            return Err(ExtractionError::ElementNotFound(target.to_string()).into());
        }
        Ok(())
    }
}
