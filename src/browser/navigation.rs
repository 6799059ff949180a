//! Page navigation
//!
//! Gets the target page loaded and settled before a capture session
//! starts: URL validation, navigation with retries, and a readiness wait
//! for pages that keep fetching after the load event.

use crate::browser::PageHandle;
use crate::error::{Error, NavigationError, Result};
use std::time::{Duration, Instant};
use tokio::time::{sleep, timeout};
use tracing::{debug, info, instrument, warn};

const MAX_URL_LEN: usize = 2048;

/// Options for page navigation.
#[derive(Debug, Clone)]
pub struct NavigationOptions {
    /// Timeout per attempt, in milliseconds
    pub timeout_ms: u64,
    /// Readiness condition to wait for after navigating
    pub wait_until: WaitUntil,
    /// Retries after a failed attempt
    pub retries: u32,
    /// Pause between retries, in milliseconds
    pub retry_delay_ms: u64,
}

impl Default for NavigationOptions {
    fn default() -> Self {
        Self {
            timeout_ms: 30000,
            wait_until: WaitUntil::NetworkIdle,
            retries: 3,
            retry_delay_ms: 1000,
        }
    }
}

/// Readiness condition to wait for after navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitUntil {
    /// The load event has fired
    Load,
    /// DOMContentLoaded has fired
    DomContentLoaded,
    /// The load event plus a short quiet period for late resources
    NetworkIdle,
}

impl WaitUntil {
    /// Promise that resolves once the page satisfies the condition.
    ///
    /// NetworkIdle does not monitor the network; a grace period after load
    /// stands in for it, which catches most late-loading resources.
    fn readiness_script(self) -> &'static str {
        match self {
            WaitUntil::Load => {
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
            WaitUntil::DomContentLoaded => {
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
            WaitUntil::NetworkIdle => {
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

/// Outcome of a completed navigation.
#[derive(Debug)]
pub struct NavigationResult {
    /// URL the browser ended up at, after redirects
    pub final_url: String,
    /// Page title, if the page has a non-empty one (feeds the filename)
    pub title: Option<String>,
    /// Wall-clock time the navigation took, in milliseconds
    pub duration_ms: u64,
}

/// URL validation for CLI and API input.
pub struct UrlValidator;

impl UrlValidator {
    /// Check that `url` is something the browser can be pointed at.
    pub fn validate(url: &str) -> std::result::Result<(), String> {
        if url.is_empty() {
            return Err("URL cannot be empty".to_string());
        }
        if url.len() > MAX_URL_LEN {
            return Err(format!(
                "URL exceeds maximum length of {MAX_URL_LEN} characters"
            ));
        }

        let parsed = url::Url::parse(url).map_err(|e| format!("URL failed to parse: {e}"))?;
        match parsed.scheme() {
            "http" | "https" | "file" => Ok(()),
            other => Err(format!(
                "unsupported URL scheme '{other}': expected http, https or file"
            )),
        }
    }
}

/// Navigates a page and waits until it is ready to capture.
pub struct PageNavigator;

impl PageNavigator {
    /// Navigate `page` to `url`, retrying failed attempts, and wait for
    /// the configured readiness condition.
    #[instrument(skip(page, options))]
    pub async fn goto(
        page: &PageHandle,
        url: &str,
        options: Option<NavigationOptions>,
    ) -> Result<NavigationResult> {
        let opts = options.unwrap_or_default();
        UrlValidator::validate(url).map_err(NavigationError::InvalidUrl)?;

        let started = Instant::now();
        info!("Navigating to {url}");

        let mut attempt = 0;
        loop {
            match Self::attempt(page.inner(), url, &opts).await {
                Ok((final_url, title)) => {
                    page.set_url(final_url.clone()).await;
                    return Ok(NavigationResult {
                        final_url,
                        title,
                        duration_ms: started.elapsed().as_millis() as u64,
                    });
                }
                Err(e) if attempt < opts.retries => {
                    attempt += 1;
                    warn!("Navigation attempt {attempt} failed, retrying: {e}");
                    sleep(Duration::from_millis(opts.retry_delay_ms)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// One navigation attempt: load, wait for readiness, read back URL and
    /// title.
    async fn attempt(
        page: &chromiumoxide::Page,
        url: &str,
        opts: &NavigationOptions,
    ) -> Result<(String, Option<String>)> {
        let per_step = Duration::from_millis(opts.timeout_ms);

        timeout(per_step, page.goto(url))
            .await
            .map_err(|_| NavigationError::Timeout(opts.timeout_ms))?
            .map_err(|e| NavigationError::LoadFailed(e.to_string()))?;

        timeout(per_step, page.evaluate(opts.wait_until.readiness_script()))
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
            .and_then(|v| v.into_value::<String>().ok())
            .filter(|t| !t.is_empty());

        debug!("Loaded {final_url}");
        Ok((final_url, title))
    }
}
