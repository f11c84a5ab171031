//! Turning an extraction result into the text that gets delivered.
//!
//! [`process`] renders transcripts, applies the output mode and the
//! strip-links override. The rest are small helpers a host needs around
//! delivery: download filenames, the token budget, the append-mode clip
//! stack and link/image snippets.

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::formatters::transcript::{VideoInfo, format_youtube_transcript};
use crate::modes::{PageMeta, apply_mode_at, estimate_tokens, slugify_filename, strip_links};
use crate::result::ExtractionResult;
use crate::settings::{OutputMode, Settings};

/// Ready-to-deliver Markdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Delivery {
    pub markdown: String,
    pub title: String,
}

/// Outcome of [`process`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Processed {
    Delivery(Delivery),
    /// The extraction had failed; nothing to deliver.
    Undeliverable { error: String },
}

/// Renders a result for delivery in the given mode.
///
/// `strip_links` overrides the mode's own link handling when set: forcing it
/// on strips links after a mode that keeps them, forcing it off re-runs llm
/// mode with link stripping disabled.
pub fn process(
    result: &ExtractionResult, mode: OutputMode, settings: &Settings, strip_links_override: Option<bool>,
    now: &DateTime<Local>,
) -> Processed {
    if let Some(error) = &result.error {
        return Processed::Undeliverable { error: error.clone() };
    }

    let markdown = match (&result.segments, result.is_transcript()) {
        (Some(segments), true) if !segments.is_empty() => {
            let video = VideoInfo { title: &result.title, url: &result.url, channel: result.channel.as_deref() };
            format_youtube_transcript(&video, segments, &settings.youtube, mode)
        }
        (_, true) => {
            let title = if result.title.is_empty() { "this video" } else { &result.title };
            format!("No transcript available for \"{title}\".")
        }
        _ => result.markdown.clone().unwrap_or_default(),
    };

    let meta = PageMeta {
        title: &result.title,
        url: &result.url,
        domain: &result.domain,
        selection: if result.has_selection { result.selection.as_deref().unwrap_or_default() } else { "" },
    };

    let mode_strips = mode == OutputMode::Llm && settings.llm.strip_links;
    let should_strip = strip_links_override.unwrap_or(mode_strips);

    let markdown = if should_strip && !mode_strips {
        strip_links(&apply_mode_at(mode, &markdown, &meta, settings, now))
    } else if !should_strip && mode_strips {
        let mut relaxed = settings.clone();
        relaxed.llm.strip_links = false;
        apply_mode_at(mode, &markdown, &meta, &relaxed, now)
    } else {
        apply_mode_at(mode, &markdown, &meta, settings, now)
    };

    Processed::Delivery(Delivery { markdown, title: result.title.clone() })
}

/// The `.md` filename for a download.
pub fn download_filename(title: &str, settings: &Settings) -> String {
    let title = if title.is_empty() { "untitled" } else { title };
    slugify_filename(&settings.downloads.filename_template.replace("{title}", title))
}

/// Context window sizes by model label.
pub const MODEL_CONTEXTS: &[(&str, usize)] = &[
    ("Claude 200k", 200_000),
    ("GPT-4 128k", 128_000),
    ("GPT-4o 128k", 128_000),
    ("Gemini 1M", 1_000_000),
    ("Llama 10M", 10_000_000),
];

const DEFAULT_CONTEXT: usize = 200_000;

pub fn context_window(model: &str) -> usize {
    MODEL_CONTEXTS
        .iter()
        .find(|(name, _)| *name == model)
        .map_or(DEFAULT_CONTEXT, |(_, size)| *size)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetLevel {
    Ok,
    Warn,
    High,
}

/// How much of a model's context a text would take.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TokenBudget {
    pub tokens: usize,
    pub context: usize,
    pub percentage: f64,
    pub level: BudgetLevel,
}

pub fn token_budget(text: &str, model: &str) -> TokenBudget {
    let tokens = estimate_tokens(text);
    let context = context_window(model);
    let percentage = tokens as f64 / context as f64 * 100.0;
    let level = if percentage > 75.0 {
        BudgetLevel::High
    } else if percentage > 25.0 {
        BudgetLevel::Warn
    } else {
        BudgetLevel::Ok
    };
    TokenBudget { tokens, context, percentage, level }
}

/// Clips gathered in append mode.
#[derive(Debug, Clone, Default)]
pub struct ClipStack {
    clips: Vec<String>,
}

impl ClipStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a clip and returns the combined text.
    pub fn push(&mut self, clip: impl Into<String>) -> String {
        self.clips.push(clip.into());
        self.combined()
    }

    pub fn combined(&self) -> String {
        self.clips.join("\n\n---\n\n")
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    pub fn clear(&mut self) {
        self.clips.clear();
    }
}

/// `[text](url)`; the text defaults to the URL.
pub fn link_markdown(text: Option<&str>, url: &str) -> String {
    let text = text.filter(|t| !t.is_empty()).unwrap_or(url);
    format!("[{}]({})", escape_markdown_text(text), escape_markdown_url(url))
}

pub fn image_markdown(url: &str) -> String {
    format!("![image]({})", escape_markdown_url(url))
}

fn escape_markdown_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '[' | ']' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn escape_markdown_url(url: &str) -> String {
    url.replace('(', "%28").replace(')', "%29")
}
