//! Scrollshot CLI
//!
//! Captures a full scrollable page as a stitched PNG or PDF.

use anyhow::Context;
use clap::{Parser, ValueEnum};
use scrollshot::browser::{
    BrowserConfig, BrowserController, NavigationOptions, PageNavigator, UrlValidator,
};
use scrollshot::capture::{CaptureSequencer, SequencerConfig};
use scrollshot::export::DirectorySink;
use scrollshot::pipeline::{OutputFormat, ScreenshotPipeline};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Scrollshot full-page capture
#[derive(Parser, Debug)]
#[command(name = "scrollshot")]
#[command(version)]
#[command(about = "Capture a full scrollable page as one stitched PNG or PDF")]
struct Args {
    /// Page URL to capture
    url: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "png")]
    format: Format,

    /// Directory the Screenshots/ folder is created under
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Viewport width in CSS pixels
    #[arg(long, default_value_t = 1280)]
    width: u32,

    /// Viewport height in CSS pixels
    #[arg(long, default_value_t = 1024)]
    height: u32,

    /// Device scale factor (default: platform)
    #[arg(long)]
    device_scale_factor: Option<f64>,

    /// Nominal vertical overlap between tiles, in CSS pixels
    #[arg(long, default_value_t = 100.0)]
    overlap: f64,

    /// Settle delay after each scroll, in milliseconds
    #[arg(long, default_value_t = 600)]
    settle_ms: u64,

    /// Settle delay before the first tile, in milliseconds
    #[arg(long, default_value_t = 800)]
    initial_settle_ms: u64,

    /// Path to Chrome/Chromium executable
    #[arg(long)]
    chrome_path: Option<String>,

    /// Run with a visible browser window
    #[arg(long)]
    no_headless: bool,

    /// Disable the Chrome sandbox
    #[arg(long)]
    no_sandbox: bool,

    /// Navigation timeout in milliseconds
    #[arg(long, default_value_t = 30000)]
    timeout_ms: u64,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    /// Lossless PNG
    Png,
    /// Single-page PDF
    Pdf,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Png => OutputFormat::Png,
            Format::Pdf => OutputFormat::Pdf,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let filter = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    UrlValidator::validate(&args.url).map_err(|e| anyhow::anyhow!(e))?;

    let mut config = BrowserConfig::builder()
        .headless(!args.no_headless)
        .viewport(args.width, args.height)
        .sandbox(!args.no_sandbox)
        .timeout_ms(args.timeout_ms);
    if let Some(factor) = args.device_scale_factor {
        config = config.device_scale_factor(factor);
    }
    if let Some(ref path) = args.chrome_path {
        config = config.chrome_path(path.clone());
    }

    let browser = BrowserController::with_config(config.build())
        .await
        .context("Launching browser")?;

    let outcome = run_capture(&browser, &args).await;

    if let Err(e) = browser.close().await {
        tracing::warn!("Browser close failed: {e}");
    }

    let saved = outcome?;
    println!("Screenshot saved successfully: {}", saved.display());
    Ok(())
}

async fn run_capture(browser: &BrowserController, args: &Args) -> anyhow::Result<PathBuf> {
    let page = browser.new_page().await?;
    let navigation = PageNavigator::goto(
        &page,
        &args.url,
        Some(NavigationOptions {
            timeout_ms: args.timeout_ms,
            ..Default::default()
        }),
    )
    .await
    .with_context(|| format!("Navigating to {}", args.url))?;
    let title = navigation.title.unwrap_or_default();

    let sequencer = CaptureSequencer::with_config(SequencerConfig {
        overlap: args.overlap,
        initial_settle: Duration::from_millis(args.initial_settle_ms),
        scroll_settle: Duration::from_millis(args.settle_ms),
    });
    let pipeline = ScreenshotPipeline::new(
        sequencer,
        Arc::new(DirectorySink::new(args.output_dir.clone())),
    )
    .with_observer(Arc::new(|stage| eprintln!("{stage}")));

    pipeline
        .capture(&page, &title, args.format.into())
        .await
        .with_context(|| format!("Capturing {}", args.url))
}
