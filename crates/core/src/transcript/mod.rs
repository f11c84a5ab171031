//! Video-page transcript extraction.
//!
//! For video pages the "content" is the caption track rather than the DOM.
//! Extraction runs in two steps:
//!
//! 1. [`TranscriptExtractor::prepare`] reads the embedded player response,
//!    takes the title and channel from it and picks a caption track.
//! 2. [`TranscriptExtractor::extract`] fetches that track through a
//!    [`TranscriptFetcher`] and parses the timed text into segments.
//!
//! Every failure comes back as a [`TranscriptFailure`]. A failure with a
//! title is partial: the page was understood but offers no caption track.
//! Failures while loading a chosen track carry no title, so the page is
//! extracted as an ordinary document instead.
//!
//! # Example
//!
//! ```rust
//! use mdyoink_core::Document;
//! use mdyoink_core::transcript::TranscriptExtractor;
//!
//! let html = r#"<html><head><title>Clip - YouTube</title></head><body>
//!     <script>var ytInitialPlayerResponse = {"videoDetails": {"author": "Chan"}};</script>
//! </body></html>"#;
//!
//! let doc = Document::parse(html).unwrap();
//! let failure = TranscriptExtractor::default().prepare(&doc).unwrap_err();
//! assert_eq!(failure.error, "No transcript available for this video");
//! assert_eq!(failure.title.as_deref(), Some("Clip"));
//! assert_eq!(failure.channel.as_deref(), Some("Chan"));
//! ```

pub mod player;
pub mod timedtext;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use crate::parse::Document;
use crate::result::{ExtractionResult, TranscriptSegment};
use crate::{Result, YoinkError};

pub use player::{PlayerDataNotFound, PlayerResponseSource, ScriptAssignment};
pub use timedtext::{decode_entities, parse_timed_text};

pub const NO_VIDEO_DATA: &str = "Could not find video data on this page";
pub const NO_TRANSCRIPT: &str = "No transcript available for this video";
pub const FETCH_FAILED: &str = "Failed to fetch transcript";
pub const EMPTY_TRANSCRIPT: &str = "Transcript was empty";

/// Retrieves the body of a caption-track URL.
#[async_trait]
pub trait TranscriptFetcher: Send + Sync {
    /// Returns the response body.
    ///
    /// A non-success status must be reported as [`YoinkError::HttpStatus`].
    async fn fetch_text(&self, url: &str) -> Result<String>;
}

/// A transcript that could not be produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptFailure {
    pub error: String,
    pub title: Option<String>,
    pub channel: Option<String>,
}

impl TranscriptFailure {
    fn bare(error: impl Into<String>) -> Self {
        Self { error: error.into(), title: None, channel: None }
    }

    fn with_meta(error: impl Into<String>, meta: &VideoMeta) -> Self {
        Self { error: error.into(), title: Some(meta.title.clone()), channel: Some(meta.channel.clone()) }
    }

    /// Nothing about the video was learned; the page should be extracted
    /// as an ordinary document instead.
    pub fn is_complete_failure(&self) -> bool {
        self.title.is_none()
    }
}

impl From<TranscriptFailure> for ExtractionResult {
    fn from(failure: TranscriptFailure) -> Self {
        Self {
            error: Some(failure.error),
            title: failure.title.unwrap_or_default(),
            channel: failure.channel,
            is_youtube: Some(true),
            ..Default::default()
        }
    }
}

/// A successfully extracted transcript.
#[derive(Debug, Clone, PartialEq)]
pub struct Transcript {
    pub title: String,
    pub channel: String,
    pub segments: Vec<TranscriptSegment>,
}

impl From<Transcript> for ExtractionResult {
    fn from(transcript: Transcript) -> Self {
        Self {
            title: transcript.title,
            channel: Some(transcript.channel),
            segments: Some(transcript.segments),
            is_youtube: Some(true),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct VideoMeta {
    title: String,
    channel: String,
}

/// The caption track chosen for a video, ready to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionRequest {
    pub title: String,
    pub channel: String,
    pub language: String,
    pub url: String,
}

/// Extracts transcripts from video pages.
#[derive(Clone)]
pub struct TranscriptExtractor {
    source: Arc<dyn PlayerResponseSource>,
    fetcher: Option<Arc<dyn TranscriptFetcher>>,
}

impl Default for TranscriptExtractor {
    fn default() -> Self {
        Self { source: Arc::new(ScriptAssignment::default()), fetcher: None }
    }
}

impl TranscriptExtractor {
    pub fn new(fetcher: Arc<dyn TranscriptFetcher>) -> Self {
        Self { fetcher: Some(fetcher), ..Default::default() }
    }

    pub fn with_source(mut self, source: Arc<dyn PlayerResponseSource>) -> Self {
        self.source = source;
        self
    }

    pub fn with_fetcher(mut self, fetcher: Arc<dyn TranscriptFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Reads the page and chooses a caption track, without any I/O.
    pub fn prepare(&self, doc: &Document) -> std::result::Result<CaptionRequest, TranscriptFailure> {
        let player = self.source.locate(doc).map_err(|_| TranscriptFailure::bare(NO_VIDEO_DATA))?;
        let meta = video_meta(&player, doc);

        let tracks = player
            .pointer("/captions/playerCaptionsTracklistRenderer/captionTracks")
            .and_then(Value::as_array)
            .filter(|tracks| !tracks.is_empty())
            .ok_or_else(|| TranscriptFailure::with_meta(NO_TRANSCRIPT, &meta))?;

        let track = choose_track(tracks).ok_or_else(|| TranscriptFailure::with_meta(NO_TRANSCRIPT, &meta))?;
        let url = track
            .get("baseUrl")
            .and_then(Value::as_str)
            .filter(|url| !url.is_empty())
            .ok_or_else(|| TranscriptFailure::with_meta(NO_TRANSCRIPT, &meta))?;
        let language = track.get("languageCode").and_then(Value::as_str).unwrap_or_default();

        debug!(language, title = %meta.title, "caption track chosen");
        Ok(CaptionRequest { title: meta.title, channel: meta.channel, language: language.to_string(), url: url.to_string() })
    }

    /// Fetches and parses a prepared caption track.
    pub async fn complete(&self, request: CaptionRequest) -> std::result::Result<Transcript, TranscriptFailure> {
        let Some(fetcher) = &self.fetcher else {
            return Err(TranscriptFailure::bare("Failed to load transcript: no fetcher configured"));
        };

        let body = fetcher.fetch_text(&request.url).await.map_err(|e| {
            warn!(error = %e, "caption fetch failed");
            match e {
                YoinkError::HttpStatus { .. } => TranscriptFailure::bare(FETCH_FAILED),
                other => TranscriptFailure::bare(format!("Failed to load transcript: {other}")),
            }
        })?;

        // Unparseable timed text yields no segments at all.
        let segments = parse_timed_text(&body).unwrap_or_else(|e| {
            warn!(error = %e, "caption track is not timed text");
            Vec::new()
        });
        if segments.is_empty() {
            return Err(TranscriptFailure::bare(EMPTY_TRANSCRIPT));
        }

        Ok(Transcript { title: request.title, channel: request.channel, segments })
    }

    /// Runs both steps.
    pub async fn extract(&self, doc: &Document) -> std::result::Result<Transcript, TranscriptFailure> {
        let request = self.prepare(doc)?;
        self.complete(request).await
    }
}

fn video_meta(player: &Value, doc: &Document) -> VideoMeta {
    let details = player.get("videoDetails");
    let title = details
        .and_then(|d| d.get("title"))
        .and_then(Value::as_str)
        .filter(|title| !title.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| page_title(doc));
    let channel = details
        .and_then(|d| d.get("author"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    VideoMeta { title, channel }
}

fn page_title(doc: &Document) -> String {
    let title = doc.title().unwrap_or_default();
    title.strip_suffix(" - YouTube").unwrap_or(&title).to_string()
}

/// English if there is any, else the first track.
fn choose_track(tracks: &[Value]) -> Option<&Value> {
    tracks
        .iter()
        .find(|track| {
            track
                .get("languageCode")
                .and_then(Value::as_str)
                .is_some_and(|code| code == "en" || code.starts_with("en"))
        })
        .or_else(|| tracks.first())
}
