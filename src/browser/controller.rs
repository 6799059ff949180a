//! Browser lifecycle
//!
//! Launches and tears down the browser process the capture pipeline runs
//! against, and hands out page handles. The sequencer never sees these
//! types; it reaches the live page through
//! [`crate::capture::CapturePage`], which [`PageHandle`] implements.

use crate::error::{BrowserError, Error, Result};
use chromiumoxide::browser::{Browser, BrowserConfig as CdpBrowserConfig};
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::Page;
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

/// Launch settings for the browser process.
#[derive(Debug, Clone)]
pub struct BrowserConfig {
    /// Run without a visible window
    pub headless: bool,
    /// Viewport width in CSS pixels
    pub width: u32,
    /// Viewport height in CSS pixels
    pub height: u32,
    /// Device scale factor for the viewport. Tiles come out at this
    /// density and the compositor places them in the matching device-pixel
    /// space. `None` keeps the platform default.
    pub device_scale_factor: Option<f64>,
    /// Keep the Chrome sandbox enabled
    pub sandbox: bool,
    /// Navigation timeout in milliseconds
    pub timeout_ms: u64,
    /// Explicit Chrome/Chromium executable; `None` auto-detects
    pub chrome_path: Option<String>,
    /// Extra arguments appended to the Chrome command line
    pub extra_args: Vec<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            width: 1280,
            height: 1024,
            device_scale_factor: None,
            sandbox: true,
            timeout_ms: 30000,
            chrome_path: None,
            extra_args: Vec::new(),
        }
    }
}

impl BrowserConfig {
    /// Start building a config from the defaults.
    pub fn builder() -> BrowserConfigBuilder {
        BrowserConfigBuilder::default()
    }
}

/// Builder for [`BrowserConfig`].
#[derive(Default)]
pub struct BrowserConfigBuilder {
    config: BrowserConfig,
}

impl BrowserConfigBuilder {
    /// Run without a visible window.
    pub fn headless(mut self, headless: bool) -> Self {
        self.config.headless = headless;
        self
    }

    /// Viewport dimensions in CSS pixels.
    pub fn viewport(mut self, width: u32, height: u32) -> Self {
        self.config.width = width;
        self.config.height = height;
        self
    }

    /// Device scale factor for the viewport.
    pub fn device_scale_factor(mut self, factor: f64) -> Self {
        self.config.device_scale_factor = Some(factor);
        self
    }

    /// Keep the Chrome sandbox enabled.
    pub fn sandbox(mut self, sandbox: bool) -> Self {
        self.config.sandbox = sandbox;
        self
    }

    /// Navigation timeout in milliseconds.
    pub fn timeout_ms(mut self, ms: u64) -> Self {
        self.config.timeout_ms = ms;
        self
    }

    /// Explicit Chrome/Chromium executable path.
    pub fn chrome_path<S: Into<String>>(mut self, path: S) -> Self {
        self.config.chrome_path = Some(path.into());
        self
    }

    /// Append one Chrome command-line argument.
    pub fn arg<S: Into<String>>(mut self, arg: S) -> Self {
        self.config.extra_args.push(arg.into());
        self
    }

    /// Finish building.
    pub fn build(self) -> BrowserConfig {
        self.config
    }
}

/// Handle to one open browser tab.
#[derive(Clone)]
pub struct PageHandle {
    pub(crate) page: Page,
    pub(crate) url: Arc<RwLock<String>>,
}

impl PageHandle {
    /// The underlying CDP page.
    pub fn inner(&self) -> &Page {
        &self.page
    }

    /// URL the tab currently points at.
    pub async fn url(&self) -> String {
        self.url.read().await.clone()
    }

    pub(crate) async fn set_url(&self, url: String) {
        *self.url.write().await = url;
    }
}

/// Owns the browser process and its CDP event loop.
pub struct BrowserController {
    browser: Browser,
    event_loop: JoinHandle<()>,
    config: BrowserConfig,
}

impl BrowserController {
    /// Launch a browser with default settings.
    pub async fn new() -> Result<Self> {
        Self::with_config(BrowserConfig::default()).await
    }

    /// Launch a browser with the given settings.
    #[instrument(skip(config))]
    pub async fn with_config(config: BrowserConfig) -> Result<Self> {
        let cdp_config = Self::cdp_config(&config)?;

        info!("Launching browser (headless: {})", config.headless);
        let (browser, mut events) = Browser::launch(cdp_config)
            .await
            .map_err(|e| BrowserError::LaunchFailed(e.to_string()))?;

        // The event stream must be drained for the whole browser lifetime
        // or CDP calls stall.
        let event_loop = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                if event.is_err() {
                    warn!("Browser event stream error");
                    break;
                }
            }
            debug!("Browser event stream closed");
        });

        Ok(Self {
            browser,
            event_loop,
            config,
        })
    }

    /// Translate our settings into a chromiumoxide launch config.
    fn cdp_config(config: &BrowserConfig) -> Result<CdpBrowserConfig> {
        let mut builder = CdpBrowserConfig::builder().viewport(Viewport {
            width: config.width,
            height: config.height,
            device_scale_factor: config.device_scale_factor,
            emulating_mobile: false,
            is_landscape: true,
            has_touch: false,
        });

        if !config.headless {
            builder = builder.with_head();
        }
        if !config.sandbox {
            builder = builder.arg("--no-sandbox");
        }
        if let Some(path) = &config.chrome_path {
            builder = builder.chrome_executable(path);
        }
        for arg in &config.extra_args {
            builder = builder.arg(arg);
        }

        builder
            .build()
            .map_err(|e| BrowserError::ConfigError(e).into())
    }

    /// Open a blank tab.
    #[instrument(skip(self))]
    pub async fn new_page(&self) -> Result<PageHandle> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| BrowserError::PageCreationFailed(e.to_string()))?;

        debug!("Opened new tab");
        Ok(PageHandle {
            page,
            url: Arc::new(RwLock::new(String::from("about:blank"))),
        })
    }

    /// Open a tab and navigate it to `url`.
    pub async fn navigate(&self, url: &str) -> Result<PageHandle> {
        let page = self.new_page().await?;
        super::navigation::PageNavigator::goto(&page, url, None).await?;
        Ok(page)
    }

    /// The launch settings this browser runs with.
    pub fn config(&self) -> &BrowserConfig {
        &self.config
    }

    /// Shut the browser down and wait for its event loop to drain.
    #[instrument(skip(self))]
    pub async fn close(mut self) -> Result<()> {
        self.browser
            .close()
            .await
            .map_err(|e| Error::cdp(e.to_string()))?;

        if tokio::time::timeout(Duration::from_secs(5), self.event_loop)
            .await
            .is_err()
        {
            warn!("Browser event loop did not drain within 5s");
        }

        info!("Browser closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = BrowserConfig::default();
        assert!(config.headless);
        assert!(config.sandbox);
        assert_eq!((config.width, config.height), (1280, 1024));
        assert!(config.device_scale_factor.is_none());
        assert!(config.chrome_path.is_none());
        assert_eq!(config.timeout_ms, 30000);
        assert!(config.extra_args.is_empty());
    }

    #[test]
    fn test_config_builder_sets_every_field() {
        let config = BrowserConfig::builder()
            .headless(false)
            .viewport(1920, 1080)
            .device_scale_factor(2.0)
            .sandbox(false)
            .timeout_ms(60000)
            .chrome_path("/opt/chrome")
            .arg("--disable-gpu")
            .build();

        assert!(!config.headless);
        assert!(!config.sandbox);
        assert_eq!((config.width, config.height), (1920, 1080));
        assert_eq!(config.device_scale_factor, Some(2.0));
        assert_eq!(config.timeout_ms, 60000);
        assert_eq!(config.chrome_path.as_deref(), Some("/opt/chrome"));
        assert_eq!(config.extra_args, vec!["--disable-gpu"]);
    }
}
