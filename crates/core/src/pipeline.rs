//! The extraction entry point.
//!
//! A [`Pipeline`] holds the optional capabilities (readability, Markdown
//! conversion, transcript fetching), resolved once when it is built, and runs
//! one request at a time against a [`Page`]. It keeps no state between
//! requests.
//!
//! # Example
//!
//! ```rust
//! use mdyoink_core::{Document, ExtractRequest, Page, Pipeline};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let html = "<html><head><title>Test Page</title></head><body><p>Hello</p></body></html>";
//! let page = Page::new(Document::parse(html).unwrap(), "https://example.com/test");
//!
//! let result = Pipeline::new().extract(&page, &ExtractRequest::markdown()).await;
//! assert!(result.markdown.unwrap().contains("Hello"));
//! # }
//! ```

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::formatters::markdown::{MarkdownConverter, MarkdownOptions, html_to_markdown};
use crate::page::Page;
use crate::readability::ReadabilityEngine;
use crate::result::ExtractionResult;
use crate::select::{Scope, SelectConfig, SelectorReport, select, test_selector};
use crate::transcript::TranscriptExtractor;

/// One extraction request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExtractRequest {
    /// Convert the content to Markdown before returning it.
    pub return_markdown: bool,
    #[serde(alias = "turndownOptions")]
    pub markdown: MarkdownOptions,
    pub domain_selector: Option<String>,
    /// Only resolve this selector and report on it.
    pub test_selector: Option<String>,
    #[serde(deserialize_with = "scope_or_auto")]
    pub scope: Scope,
}

impl ExtractRequest {
    /// A request for Markdown with default options.
    pub fn markdown() -> Self {
        Self { return_markdown: true, ..Default::default() }
    }

    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_domain_selector(mut self, selector: impl Into<String>) -> Self {
        self.domain_selector = Some(selector.into());
        self
    }

    pub fn with_markdown_options(mut self, options: MarkdownOptions) -> Self {
        self.markdown = options;
        self
    }
}

/// `null` or an unknown scope string means auto.
fn scope_or_auto<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<Scope, D::Error> {
    let scope: Option<String> = Option::deserialize(deserializer)?;
    Ok(scope.and_then(|s| s.parse().ok()).unwrap_or_default())
}

/// What a request produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    Content(Box<ExtractionResult>),
    SelectorTest(SelectorReport),
}

/// The configured extraction pipeline.
pub struct Pipeline {
    readability: Option<Box<dyn ReadabilityEngine>>,
    converter: Option<Box<dyn MarkdownConverter>>,
    transcripts: Option<TranscriptExtractor>,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Pipeline {
    /// A pipeline with every capability the enabled features provide.
    pub fn new() -> Self {
        PipelineBuilder::default().build()
    }

    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    /// A pipeline with no capabilities at all.
    pub fn bare() -> Self {
        Self { readability: None, converter: None, transcripts: None }
    }

    pub fn has_converter(&self) -> bool {
        self.converter.is_some()
    }

    /// Runs a request, honouring `test_selector`.
    pub async fn run(&self, page: &Page, request: &ExtractRequest) -> Extraction {
        if let Some(selector) = request.test_selector.as_deref() {
            return Extraction::SelectorTest(self.test_selector(page, selector));
        }
        Extraction::Content(Box::new(self.extract(page, request).await))
    }

    /// Reports what a selector resolves to on the page.
    pub fn test_selector(&self, page: &Page, selector: &str) -> SelectorReport {
        let report = test_selector(&page.document, selector);
        debug!(selector, matched = report.matched(), "selector tested");
        report
    }

    /// Extracts the page's content. `test_selector` is ignored here; see
    /// [`Pipeline::run`].
    pub async fn extract(&self, page: &Page, request: &ExtractRequest) -> ExtractionResult {
        let url = page.url.clone();
        let domain = page.domain();

        if page.is_youtube()
            && let Some(transcripts) = &self.transcripts
        {
            match transcripts.extract(&page.document).await {
                Ok(transcript) => {
                    info!(segments = transcript.segments.len(), "transcript extracted");
                    return ExtractionResult { url, domain, ..transcript.into() };
                }
                Err(failure) if failure.is_complete_failure() => {
                    warn!(error = %failure.error, "no transcript, extracting as a page");
                }
                Err(failure) => {
                    warn!(error = %failure.error, "transcript unavailable");
                    return ExtractionResult { url, domain, ..failure.into() };
                }
            }
        }

        let config = SelectConfig { scope: request.scope, domain_selector: request.domain_selector.clone() };
        let mut result = select(page, &config, self.readability.as_deref());

        if result.title.is_empty() {
            result.title = page.document.title().unwrap_or_default();
        }
        result.url = url;
        result.domain = domain;

        if request.return_markdown
            && let Some(html) = result.html.as_deref()
            && let Some(markdown) = html_to_markdown(html, &request.markdown, self.converter.as_deref())
        {
            result.set_markdown(markdown);
        }

        result
    }
}

/// Builder for [`Pipeline`].
///
/// Starts from the feature defaults; each capability can be replaced or
/// switched off.
pub struct PipelineBuilder {
    readability: Option<Box<dyn ReadabilityEngine>>,
    converter: Option<Box<dyn MarkdownConverter>>,
    transcripts: Option<TranscriptExtractor>,
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self { readability: default_readability(), converter: default_converter(), transcripts: default_transcripts() }
    }
}

impl PipelineBuilder {
    pub fn readability(mut self, engine: impl ReadabilityEngine + 'static) -> Self {
        self.readability = Some(Box::new(engine));
        self
    }

    pub fn without_readability(mut self) -> Self {
        self.readability = None;
        self
    }

    pub fn converter(mut self, converter: impl MarkdownConverter + 'static) -> Self {
        self.converter = Some(Box::new(converter));
        self
    }

    pub fn without_converter(mut self) -> Self {
        self.converter = None;
        self
    }

    pub fn transcripts(mut self, extractor: TranscriptExtractor) -> Self {
        self.transcripts = Some(extractor);
        self
    }

    pub fn without_transcripts(mut self) -> Self {
        self.transcripts = None;
        self
    }

    pub fn build(self) -> Pipeline {
        Pipeline { readability: self.readability, converter: self.converter, transcripts: self.transcripts }
    }
}

#[cfg(feature = "readability")]
fn default_readability() -> Option<Box<dyn ReadabilityEngine>> {
    Some(Box::new(crate::readability::SmoothieEngine))
}

#[cfg(not(feature = "readability"))]
fn default_readability() -> Option<Box<dyn ReadabilityEngine>> {
    None
}

#[cfg(feature = "markdown")]
fn default_converter() -> Option<Box<dyn MarkdownConverter>> {
    Some(Box::new(crate::formatters::markdown::HtmdConverter::new()))
}

#[cfg(not(feature = "markdown"))]
fn default_converter() -> Option<Box<dyn MarkdownConverter>> {
    None
}

#[cfg(feature = "fetch")]
fn default_transcripts() -> Option<TranscriptExtractor> {
    Some(TranscriptExtractor::new(std::sync::Arc::new(crate::fetch::HttpFetcher::default())))
}

#[cfg(not(feature = "fetch"))]
fn default_transcripts() -> Option<TranscriptExtractor> {
    Some(TranscriptExtractor::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::Document;
    use crate::readability::ReadableArticle;

    struct BodyEngine;

    impl ReadabilityEngine for BodyEngine {
        fn parse(&self, _html: &str, _url: Option<&str>) -> crate::Result<Option<ReadableArticle>> {
            Ok(Some(ReadableArticle { content: "<p>Engine</p>".into(), length: 6, ..Default::default() }))
        }
    }

    fn page() -> Page {
        let html = "<html><head><title>Doc Title</title></head><body><p>Hello</p></body></html>";
        Page::new(Document::parse(html).unwrap(), "https://example.com/a")
    }

    #[tokio::test]
    async fn test_title_falls_back_and_url_attached() {
        let pipeline = Pipeline::builder().readability(BodyEngine).without_converter().build();
        let result = pipeline.extract(&page(), &ExtractRequest::default()).await;

        assert_eq!(result.title, "Doc Title");
        assert_eq!(result.url, "https://example.com/a");
        assert_eq!(result.domain, "example.com");
        assert_eq!(result.html.as_deref(), Some("<p>Engine</p>"));
    }

    #[tokio::test]
    async fn test_markdown_requested_without_converter_keeps_html() {
        let pipeline = Pipeline::bare();
        let result = pipeline.extract(&page(), &ExtractRequest::markdown()).await;
        assert!(result.markdown.is_none());
        assert!(result.html.unwrap().contains("<p>Hello</p>"));
    }

    #[tokio::test]
    async fn test_run_with_test_selector() {
        let request = ExtractRequest { test_selector: Some("p".into()), ..Default::default() };
        let extraction = Pipeline::bare().run(&page(), &request).await;
        assert_eq!(extraction, Extraction::SelectorTest(SelectorReport::Matched { tag_name: "P".into(), text_length: 5 }));
    }

    #[tokio::test]
    async fn test_video_page_without_data_extracts_as_page() {
        let page = Page::new(page().document, "https://www.youtube.com/watch?v=abc");
        let pipeline = Pipeline::builder().without_readability().without_converter().build();
        let result = pipeline.extract(&page, &ExtractRequest::default()).await;

        assert!(result.error.is_none());
        assert!(result.is_youtube.is_none());
        assert!(result.html.unwrap().contains("Hello"));
    }

    struct StaticFetcher(Option<&'static str>);

    #[async_trait::async_trait]
    impl crate::transcript::TranscriptFetcher for StaticFetcher {
        async fn fetch_text(&self, _url: &str) -> crate::Result<String> {
            self.0.map(str::to_string).ok_or(crate::YoinkError::HttpStatus { status: 404 })
        }
    }

    async fn extract_video_page(fetcher: StaticFetcher) -> ExtractionResult {
        let html = r#"<html><head><title>Clip - YouTube</title></head><body><p>Watch page text</p>
            <script>var ytInitialPlayerResponse = {"videoDetails": {"title": "Clip"}, "captions": {"playerCaptionsTracklistRenderer": {"captionTracks": [{"languageCode": "en", "baseUrl": "https://t/en"}]}}};</script>
            </body></html>"#;
        let page = Page::new(Document::parse(html).unwrap(), "https://www.youtube.com/watch?v=abc");
        let pipeline = Pipeline::builder()
            .without_readability()
            .without_converter()
            .transcripts(TranscriptExtractor::new(std::sync::Arc::new(fetcher)))
            .build();
        pipeline.extract(&page, &ExtractRequest::default()).await
    }

    #[tokio::test]
    async fn test_caption_fetch_error_extracts_as_page() {
        let result = extract_video_page(StaticFetcher(None)).await;
        assert!(result.error.is_none());
        assert!(result.html.unwrap().contains("Watch page text"));
    }

    #[tokio::test]
    async fn test_empty_caption_body_extracts_as_page() {
        let result = extract_video_page(StaticFetcher(Some(""))).await;
        assert!(result.error.is_none());
        assert!(result.segments.is_none());
        assert!(result.html.unwrap().contains("Watch page text"));
    }

    #[test]
    fn test_request_deserializes_host_shape() {
        let request: ExtractRequest = serde_json::from_value(serde_json::json!({
            "returnMarkdown": true,
            "turndownOptions": {"headingStyle": "setext"},
            "domainSelector": "#main",
            "testSelector": null,
            "scope": null
        }))
        .unwrap();

        assert!(request.return_markdown);
        assert_eq!(request.domain_selector.as_deref(), Some("#main"));
        assert_eq!(request.scope, Scope::Auto);
        assert_eq!(request.markdown.heading_style, crate::formatters::markdown::HeadingStyle::Setext);
    }
}
