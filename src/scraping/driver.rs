//! Browser automation seam.
//!
//! Controllers never touch chromiumoxide directly: they talk to a
//! [`PageDriver`], read DOM snapshots through `html()`, and address live
//! elements by [`ElementTarget`] (selector + document-order ordinal). The
//! ordinal is computed on the snapshot and resolved in the page with
//! `querySelectorAll`, which walks the DOM in the same order.

use super::browser_manager::wait_until_stable;
use crate::core::error::{Result, ScoutError};
use async_trait::async_trait;
use chromiumoxide::Page;
use std::fmt;
use std::time::{Duration, Instant};
use tracing::debug;

/// Quiet period treated as "network idle" after a navigation.
const NETWORK_QUIET_MS: u64 = 500;

/// The `index`-th element matching `selector`, in document order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementTarget {
    pub selector: String,
    pub index: usize,
}

impl ElementTarget {
    pub fn new(selector: impl Into<String>, index: usize) -> Self {
        Self {
            selector: selector.into(),
            index,
        }
    }

    /// JS expression resolving to the live element (or `undefined`).
    fn js_lookup(&self) -> String {
        // serde_json quoting yields a valid JS string literal.
        let quoted = serde_json::to_string(&self.selector).unwrap_or_else(|_| "\"\"".to_string());
        format!("document.querySelectorAll({quoted})[{}]", self.index)
    }
}

impl fmt::Display for ElementTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.selector, self.index)
    }
}

/// Capabilities the harvesting core consumes from a browsing context.
///
/// One driver is owned by exactly one running stage at a time; callers
/// serialize access through ordinary sequential control flow.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Navigate and wait for the load to settle, failing after `timeout`.
    async fn goto(&self, url: &str, timeout: Duration) -> Result<()>;

    /// Serialized DOM of the current page.
    async fn html(&self) -> Result<String>;

    /// Evaluate a JS expression in the page and return its JSON value.
    async fn evaluate(&self, script: &str) -> Result<serde_json::Value>;

    async fn scroll_into_view(&self, target: &ElementTarget) -> Result<()>;

    async fn click(&self, target: &ElementTarget) -> Result<()>;

    async fn current_url(&self) -> Option<String>;
}

/// [`PageDriver`] over a chromiumoxide tab.
pub struct CdpDriver {
    page: Page,
}

impl CdpDriver {
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    async fn act_on(&self, target: &ElementTarget, action: &str) -> Result<()> {
        let script = format!(
            "(() => {{ const el = {}; if (!el) return false; {action}; return true; }})()",
            target.js_lookup()
        );
        let found = self.evaluate(&script).await?;
        if found.as_bool().unwrap_or(false) {
            Ok(())
        } else {
            Err(ScoutError::ElementNotFound {
                selector: target.selector.clone(),
                index: target.index,
            })
        }
    }
}

#[async_trait]
impl PageDriver for CdpDriver {
    async fn goto(&self, url: &str, timeout: Duration) -> Result<()> {
        let started = Instant::now();
        match tokio::time::timeout(timeout, self.page.goto(url)).await {
            Ok(Ok(_)) => {
                // Load fired; give XHR-rendered listings the rest of the budget to go idle.
                let remaining = timeout.saturating_sub(started.elapsed());
                wait_until_stable(&self.page, NETWORK_QUIET_MS, remaining.as_millis() as u64).await;
                Ok(())
            }
            Ok(Err(e)) => Err(ScoutError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            }),
            Err(_) => Err(ScoutError::Timeout {
                what: format!("navigation to {url}"),
                after: timeout,
            }),
        }
    }

    async fn html(&self) -> Result<String> {
        self.page
            .content()
            .await
            .map_err(|e| ScoutError::Browser(format!("failed to get page content: {e}")))
    }

    async fn evaluate(&self, script: &str) -> Result<serde_json::Value> {
        let result = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| ScoutError::Browser(format!("evaluate failed: {e}")))?;
        Ok(result
            .into_value::<serde_json::Value>()
            .unwrap_or(serde_json::Value::Null))
    }

    async fn scroll_into_view(&self, target: &ElementTarget) -> Result<()> {
        debug!("scroll into view: {}", target);
        self.act_on(target, "el.scrollIntoView({ behavior: 'smooth', block: 'center' })")
            .await
    }

    async fn click(&self, target: &ElementTarget) -> Result<()> {
        debug!("click: {}", target);
        self.act_on(target, "el.click()").await
    }

    async fn current_url(&self) -> Option<String> {
        self.page.url().await.ok().flatten()
    }
}
