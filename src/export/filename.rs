//! Output filename derivation
//!
//! Filenames are built from the page title, which can contain anything a
//! web author dreams up, so the title is sanitized down to a safe charset
//! before it gets near a filesystem.

use chrono::{DateTime, Utc};
use std::path::PathBuf;

/// Substituted when sanitization leaves nothing usable.
pub const FALLBACK_NAME: &str = "screenshot";

/// Subdirectory all outputs are delivered under.
pub const SCREENSHOTS_DIR: &str = "Screenshots";

const MAX_NAME_LEN: usize = 50;

/// Reduce a page title to a filesystem-safe name.
///
/// Characters outside `[A-Za-z0-9 _-]` become underscores, whitespace runs
/// collapse to a single underscore, underscore runs collapse, edge
/// underscores are trimmed, and the result is capped at 50 characters.
/// An empty or all-whitespace title yields [`FALLBACK_NAME`].
pub fn sanitize_title(title: &str) -> String {
    if title.trim().is_empty() {
        return FALLBACK_NAME.to_string();
    }

    let mut out = String::with_capacity(title.len());
    let mut pending_separator = false;
    for c in title.chars() {
        let c = if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
            c
        } else {
            // Both disallowed characters and whitespace map to '_'; runs of
            // either collapse into one separator.
            '_'
        };
        if c == '_' {
            pending_separator = true;
        } else {
            if pending_separator && !out.is_empty() {
                out.push('_');
            }
            pending_separator = false;
            out.push(c);
        }
    }

    let capped: String = out.chars().take(MAX_NAME_LEN).collect();
    let trimmed = capped.trim_matches('_');
    if trimmed.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        trimmed.to_string()
    }
}

/// ISO-8601 timestamp at seconds precision, with `:` and `.` replaced so it
/// is path-safe on every platform.
pub fn timestamp_slug(now: DateTime<Utc>) -> String {
    now.format("%Y-%m-%dT%H-%M-%S").to_string()
}

/// Relative delivery path: `Screenshots/<title>_<timestamp>.<ext>`.
pub fn suggested_path(title: &str, now: DateTime<Utc>, extension: &str) -> PathBuf {
    PathBuf::from(SCREENSHOTS_DIR).join(format!(
        "{}_{}.{}",
        sanitize_title(title),
        timestamp_slug(now),
        extension
    ))
}
