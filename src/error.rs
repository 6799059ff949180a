//! Error types
//!
//! One `thiserror` hierarchy covering every stage of a capture. Each layer
//! returns its own sub-error; they roll up into [`Error`] at the crate
//! boundary.

use thiserror::Error;

/// Top-level error for all scrollshot operations
#[derive(Error, Debug)]
pub enum Error {
    /// Browser-related errors
    #[error("Browser error: {0}")]
    Browser(#[from] BrowserError),

    /// Navigation errors
    #[error("Navigation error: {0}")]
    Navigation(#[from] NavigationError),

    /// Capture sequencing errors
    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),

    /// Tile compositing errors
    #[error("Stitch error: {0}")]
    Stitch(#[from] StitchError),

    /// Export errors (PNG, PDF, file delivery)
    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// ChromiumOxide errors
    #[error("CDP error: {0}")]
    Cdp(String),

    /// Generic error with message
    #[error("{0}")]
    Generic(String),
}

/// Browser lifecycle and control errors
#[derive(Error, Debug)]
pub enum BrowserError {
    /// Failed to launch browser
    #[error("Failed to launch browser: {0}")]
    LaunchFailed(String),

    /// Browser configuration error
    #[error("Invalid browser configuration: {0}")]
    ConfigError(String),

    /// Failed to create new page/tab
    #[error("Failed to create page: {0}")]
    PageCreationFailed(String),
}

/// Navigation errors
#[derive(Error, Debug)]
pub enum NavigationError {
    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Navigation timeout
    #[error("Navigation timed out after {0}ms")]
    Timeout(u64),

    /// Page load failed
    #[error("Page load failed: {0}")]
    LoadFailed(String),
}

/// Capture sequencing errors
#[derive(Error, Debug)]
pub enum CaptureError {
    /// The viewport screenshot primitive failed for one tile
    #[error("Tile capture failed at offset {offset}: {reason}")]
    TileFailed {
        /// Requested scroll offset of the failed tile (CSS px)
        offset: f64,
        /// Underlying failure reason
        reason: String,
    },

    /// Page geometry failed validation
    #[error("Invalid page geometry: {0}")]
    InvalidGeometry(String),

    /// Reading or mutating page scroll state failed
    #[error("Scroll operation failed: {0}")]
    ScrollFailed(String),

    /// DOM introspection (fixed-element sweep, scrollbar styling) failed
    #[error("Page script failed: {0}")]
    ScriptFailed(String),

    /// A capture session is already running
    #[error("A capture session is already in progress")]
    SessionInProgress,
}

/// Tile compositing errors
#[derive(Error, Debug)]
pub enum StitchError {
    /// A tile's image bytes could not be decoded
    #[error("Failed to decode tile {index}: {reason}")]
    DecodeFailed {
        /// Sequence index of the undecodable tile
        index: usize,
        /// Underlying decode error
        reason: String,
    },

    /// The tile sequence violates the session schema
    #[error("Invalid capture session: {0}")]
    InvalidSession(String),

    /// The destination canvas dimensions are unusable
    #[error("Invalid canvas dimensions: {0}")]
    InvalidCanvas(String),
}

/// Export errors (encoding and delivery)
#[derive(Error, Debug)]
pub enum ExportError {
    /// PNG encoding failed
    #[error("PNG encoding failed: {0}")]
    PngEncodeFailed(String),

    /// PDF generation failed
    #[error("PDF generation failed: {0}")]
    PdfEncodeFailed(String),

    /// Saving the output file failed
    #[error("Failed to save output: {0}")]
    SaveFailed(String),
}

/// Result type alias for Scrollshot operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a generic error from a string
    pub fn generic<S: Into<String>>(msg: S) -> Self {
        Error::Generic(msg.into())
    }

    /// Create a CDP error from a string
    pub fn cdp<S: Into<String>>(msg: S) -> Self {
        Error::Cdp(msg.into())
    }
}

/// Convert chromiumoxide errors
impl From<chromiumoxide::error::CdpError> for Error {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        Error::Cdp(err.to_string())
    }
}
