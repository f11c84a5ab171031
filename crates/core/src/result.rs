//! Values passed between pipeline stages.
//!
//! [`ExtractionResult`] serializes with the camelCase keys a browser host
//! expects (`siteName`, `hasSelection`, `isYouTube`, ...) and omits every
//! field that is unset.

use serde::{Deserialize, Serialize};

/// One caption cue of a video transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    /// Start offset in seconds.
    pub start: f64,
    /// Duration in seconds.
    pub dur: f64,
    /// Decoded, trimmed, never empty.
    pub text: String,
}

impl TranscriptSegment {
    pub fn new(start: f64, dur: f64, text: impl Into<String>) -> Self {
        Self { start, dur, text: text.into() }
    }
}

/// The outcome of one extraction request.
///
/// Exactly one of `html`, `markdown` or `segments` carries the content.
/// When `error` is set only `title` and `channel` are meaningful.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub markdown: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub byline: String,
    #[serde(default)]
    pub site_name: String,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub published_time: String,
    /// Character count of the extracted content.
    #[serde(default)]
    pub length: usize,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub has_selection: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selection: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub used_selector: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selector_failed: Option<bool>,
    #[serde(rename = "isYouTube", skip_serializing_if = "Option::is_none")]
    pub is_youtube: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segments: Option<Vec<TranscriptSegment>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExtractionResult {
    /// A failed result carrying only the error message.
    pub fn failure(error: impl Into<String>) -> Self {
        Self { error: Some(error.into()), ..Default::default() }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn is_transcript(&self) -> bool {
        self.is_youtube == Some(true)
    }

    /// Replaces the HTML content with its Markdown form.
    pub fn set_markdown(&mut self, markdown: String) {
        self.markdown = Some(markdown);
        self.html = None;
    }
}
