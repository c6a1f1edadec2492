//! Native browser management using `chromiumoxide`.
//!
//! This module is the single owner of:
//! * Finding a usable browser executable (Chrome → Chromium → Brave, cross-platform).
//! * Building the launch config (viewport, headless flag, CI-friendly flags).
//! * `BrowserSession`: one browser process plus its CDP handler task.
//! * `wait_until_stable`: networkidle-style settle after navigation.
//!
//! Harvesting stages never see this module; they receive a `CdpDriver`.

use super::driver::CdpDriver;
use crate::core::error::{Result, ScoutError};
use chromiumoxide::browser::BrowserConfig;
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::{Browser, Page};
use futures::StreamExt;
use std::path::Path;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

pub const VIEWPORT_WIDTH: u32 = 1920;
pub const VIEWPORT_HEIGHT: u32 = 1080;

// ── Browser executable discovery ─────────────────────────────────────────────

/// Find a usable Chromium-family browser executable.
///
/// Resolution order:
/// 1. `explicit` (config file or `CHROME_EXECUTABLE`), when it exists.
/// 2. PATH scan.
/// 3. OS-specific well-known install paths.
pub fn find_chrome_executable(explicit: Option<&str>) -> Option<String> {
    if let Some(p) = explicit.filter(|p| Path::new(p).exists()) {
        return Some(p.to_string());
    }

    if let Ok(path_var) = std::env::var("PATH") {
        let candidates = [
            "google-chrome",
            "chromium",
            "chromium-browser",
            "chrome",
            "brave-browser",
            "brave",
        ];
        for dir in std::env::split_paths(&path_var) {
            for exe in candidates {
                let full = dir.join(exe);
                if full.exists() {
                    return Some(full.to_string_lossy().to_string());
                }
            }
        }
    }

    #[cfg(target_os = "macos")]
    {
        let candidates = [
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            "/Applications/Chromium.app/Contents/MacOS/Chromium",
            "/Applications/Brave Browser.app/Contents/MacOS/Brave Browser",
        ];
        for c in candidates {
            if Path::new(c).exists() {
                return Some(c.to_string());
            }
        }
    }

    #[cfg(target_os = "linux")]
    {
        let candidates = [
            "/usr/bin/google-chrome",
            "/usr/bin/chromium",
            "/usr/bin/chromium-browser",
            "/usr/local/bin/chromium",
            "/usr/bin/brave-browser",
        ];
        for c in candidates {
            if Path::new(c).exists() {
                return Some(c.to_string());
            }
        }
    }

    #[cfg(target_os = "windows")]
    {
        let candidates = [
            r"C:\Program Files\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files\BraveSoftware\Brave-Browser\Application\brave.exe",
            r"C:\Program Files (x86)\Microsoft\Edge\Application\msedge.exe",
        ];
        for c in candidates {
            if Path::new(c).exists() {
                return Some(c.to_string());
            }
        }
    }

    None
}

// ── Launch config ────────────────────────────────────────────────────────────

/// Build a `BrowserConfig` with a fixed desktop viewport.
///
/// `--no-sandbox` / `--disable-dev-shm-usage` keep the browser usable in
/// containers and CI runners.
pub fn build_config(exe: &str, headless: bool, width: u32, height: u32) -> Result<BrowserConfig> {
    let mut builder = BrowserConfig::builder()
        .chrome_executable(exe)
        .viewport(Viewport {
            width,
            height,
            device_scale_factor: Some(1.0),
            emulating_mobile: false,
            is_landscape: true,
            has_touch: false,
        })
        .window_size(width, height)
        .arg("--disable-gpu")
        .arg("--no-sandbox")
        .arg("--disable-setuid-sandbox")
        .arg("--disable-dev-shm-usage")
        .arg("--disable-extensions")
        .arg("--no-first-run")
        .arg("--no-default-browser-check")
        .arg("--mute-audio");

    if !headless {
        builder = builder.with_head();
    }

    builder
        .build()
        .map_err(|e| ScoutError::Browser(format!("failed to build browser config: {e}")))
}

// ── Session ──────────────────────────────────────────────────────────────────

/// A launched browser and the task pumping its CDP event stream.
pub struct BrowserSession {
    browser: Browser,
    handler: JoinHandle<()>,
}

impl BrowserSession {
    pub async fn launch(explicit_exe: Option<&str>, headless: bool) -> Result<Self> {
        let exe = find_chrome_executable(explicit_exe).ok_or(ScoutError::BrowserUnavailable)?;
        info!("launching browser ({}, headless={})", exe, headless);

        let config = build_config(&exe, headless, VIEWPORT_WIDTH, VIEWPORT_HEIGHT)?;
        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| ScoutError::Browser(format!("failed to launch ({exe}): {e}")))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    error!("CDP handler error: {}", e);
                }
            }
        });

        Ok(Self { browser, handler })
    }

    /// Open a blank tab wrapped as a driver.
    pub async fn open_driver(&self) -> Result<CdpDriver> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| ScoutError::Browser(format!("failed to open tab: {e}")))?;
        Ok(CdpDriver::new(page))
    }

    pub async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            warn!("browser close error (non-fatal): {}", e);
        }
        self.handler.abort();
    }
}

// ── Smart wait / networkidle ────────────────────────────────────────────────

/// Wait until the page network goes idle (no new resource entries for `quiet_ms`
/// consecutive ms) or until `timeout_ms` has elapsed.
///
/// Polls `performance.getEntriesByType("resource").length` every 250 ms and
/// only counts quiet time once `document.readyState` is `complete`.
pub async fn wait_until_stable(page: &Page, quiet_ms: u64, timeout_ms: u64) {
    let poll = Duration::from_millis(250);
    let start = Instant::now();
    let mut last_count: u64 = 0;
    let mut stable_since = Instant::now();

    loop {
        if start.elapsed() >= Duration::from_millis(timeout_ms) {
            info!("wait_until_stable: timeout after {}ms", timeout_ms);
            break;
        }

        let count: u64 = page
            .evaluate("performance.getEntriesByType('resource').length")
            .await
            .ok()
            .and_then(|v| v.into_value::<serde_json::Value>().ok())
            .and_then(|j| j.as_u64())
            .unwrap_or(0);

        let ready_complete: bool = page
            .evaluate("document.readyState")
            .await
            .ok()
            .and_then(|v| v.into_value::<serde_json::Value>().ok())
            .and_then(|j| j.as_str().map(|s| s == "complete"))
            .unwrap_or(false);

        if !ready_complete || count != last_count {
            last_count = count;
            stable_since = Instant::now();
        } else if stable_since.elapsed() >= Duration::from_millis(quiet_ms) {
            break;
        }

        tokio::time::sleep(poll).await;
    }
}
