pub mod deliver;
pub mod error;
#[cfg(feature = "fetch")]
pub mod fetch;
pub mod formatters;
pub mod modes;
pub mod page;
pub mod parse;
pub mod pipeline;
pub mod readability;
pub mod result;
pub mod select;
pub mod settings;
pub mod shadow;
pub mod transcript;

pub use deliver::{BudgetLevel, ClipStack, Delivery, Processed, TokenBudget, download_filename, process, token_budget};
pub use deliver::{image_markdown, link_markdown};
pub use error::{Result, YoinkError};
#[cfg(feature = "fetch")]
pub use fetch::{FetchConfig, HttpFetcher, fetch_file, fetch_stdin, fetch_url};
pub use formatters::{MarkdownConverter, MarkdownOptions, format_youtube_transcript, html_to_markdown};
pub use modes::{PageMeta, apply_mode, apply_mode_at, estimate_tokens, slugify_filename, strip_images, strip_links};
pub use page::{Page, Selection, is_youtube_url};
pub use parse::{Document, Element};
pub use pipeline::{ExtractRequest, Extraction, Pipeline, PipelineBuilder};
pub use readability::{ReadabilityEngine, ReadableArticle};
#[cfg(feature = "readability")]
pub use readability::SmoothieEngine;
pub use result::{ExtractionResult, TranscriptSegment};
pub use select::{Advisory, ContentSource, Scope, SelectConfig, SelectorReport, plan_source, select, test_selector};
pub use settings::{DomainSelectorMap, OutputMode, Settings, SettingsStore, deep_merge};
pub use shadow::flatten;
pub use transcript::{TranscriptExtractor, TranscriptFailure, TranscriptFetcher};
