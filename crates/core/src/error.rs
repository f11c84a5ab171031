//! Error types for mdyoink operations.
//!
//! [`YoinkError`] covers the failures that can happen *inside* the library:
//! bad URLs, bad selectors, HTTP trouble, storage I/O. Failures that reach the
//! extraction boundary are reported as data instead (see
//! [`ExtractionResult::error`](crate::ExtractionResult::error),
//! [`TranscriptFailure`](crate::TranscriptFailure) and
//! [`SelectorReport`](crate::SelectorReport)), so callers never need to match
//! on this type to learn why a page yielded no content.
//!
//! # Example
//!
//! ```rust
//! use mdyoink_core::{Document, YoinkError};
//!
//! let doc = Document::parse("<p>hi</p>").unwrap();
//! assert!(matches!(doc.select("[[nope"), Err(YoinkError::InvalidSelector(_))));
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for mdyoink operations.
#[derive(Error, Debug)]
pub enum YoinkError {
    /// HTTP request errors from reqwest.
    ///
    /// Wraps network errors, DNS failures, TLS problems and body decoding.
    #[cfg(feature = "fetch")]
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("HTTP status {status}")]
    HttpStatus { status: u16 },

    /// Request timeout.
    #[error("Request timed out after {timeout} seconds")]
    Timeout { timeout: u64 },

    /// Invalid URL provided.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// A CSS selector could not be parsed.
    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    /// HTML parsing errors.
    #[error("Failed to parse HTML: {0}")]
    HtmlParseError(String),

    /// Timed-text (caption XML) could not be parsed.
    #[error("Failed to parse timed text: {0}")]
    TimedTextError(String),

    /// The HTML to Markdown capability failed on its input.
    #[error("Markdown conversion failed: {0}")]
    MarkdownError(String),

    /// File not found.
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// Storage or file I/O errors.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored JSON that does not fit the expected shape.
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Settings or selector-map problems that are not plain JSON errors.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type alias for YoinkError.
pub type Result<T> = std::result::Result<T, YoinkError>;
