//! Transcript rendering.
//!
//! Whether timestamps are shown and whether the body is laid out as lines
//! both depend on the output mode the transcript is headed for: `obsidian`
//! timestamps and `auto` layout only switch on in obsidian mode.

use std::sync::LazyLock;

use regex::Regex;

use crate::result::TranscriptSegment;
use crate::settings::{OutputMode, TimestampDisplay, TranscriptLayout, YoutubeSettings};

static SENTENCE_GAP_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"([.!?])\s+").unwrap());

/// What is known about the video being rendered.
#[derive(Debug, Clone, Copy)]
pub struct VideoInfo<'a> {
    pub title: &'a str,
    pub url: &'a str,
    pub channel: Option<&'a str>,
}

/// Renders a transcript as Markdown.
///
/// ```text
/// ## <title>
///
/// Source: <url>
/// Channel: <channel>
///
/// ### Transcript
///
/// <body>
/// ```
pub fn format_youtube_transcript(
    video: &VideoInfo<'_>, segments: &[TranscriptSegment], settings: &YoutubeSettings, mode: OutputMode,
) -> String {
    let obsidian = mode == OutputMode::Obsidian;
    let show_timestamps = match settings.timestamps {
        TimestampDisplay::Always => true,
        TimestampDisplay::Obsidian => obsidian,
        TimestampDisplay::Never => false,
    };
    let timestamped = match settings.format {
        TranscriptLayout::Timestamped => true,
        TranscriptLayout::Auto => obsidian,
        TranscriptLayout::Paragraphs => false,
    };

    let body = if show_timestamps && timestamped {
        segments
            .iter()
            .map(|s| format!("[{}] {}", timestamp(s.start), s.text))
            .collect::<Vec<_>>()
            .join("\n")
    } else {
        let joined = segments.iter().map(|s| s.text.as_str()).collect::<Vec<_>>().join(" ");
        SENTENCE_GAP_RE.replace_all(&joined, "${1} ").into_owned()
    };

    let mut markdown = format!("## {}\n\nSource: {}\n", video.title, video.url);
    if let Some(channel) = video.channel.filter(|c| !c.is_empty()) {
        markdown.push_str(&format!("Channel: {channel}\n"));
    }
    markdown.push_str("\n### Transcript\n\n");
    markdown.push_str(&body);
    markdown
}

/// `m:ss`, minutes unpadded.
fn timestamp(start: f64) -> String {
    let total = if start.is_finite() && start > 0.0 { start.floor() as u64 } else { 0 };
    format!("{}:{:02}", total / 60, total % 60)
}
