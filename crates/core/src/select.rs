//! Content selection.
//!
//! Picks the fragment of a page that counts as "the content". The priority
//! order is:
//!
//! 1. `fullpage` scope: the flattened body, no heuristic.
//! 2. `selection` scope: the selection, or the heuristic with an advisory
//!    when there is none.
//! 3. Auto scope: a selection wins over everything else.
//! 4. A saved domain selector, falling back to the heuristic (with an
//!    advisory) when it is invalid or matches nothing.
//! 5. The readability heuristic, falling back to the body when it finds
//!    nothing.
//!
//! [`plan_source`] makes the decision without touching the DOM; [`select`]
//! carries it out.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::page::Page;
use crate::parse::{Document, Element};
use crate::readability::ReadabilityEngine;
use crate::result::ExtractionResult;
use crate::shadow::{flatten, inner_html_with_shadows, light_text_len, shadow_root_html};
use crate::{Result, YoinkError};

/// Which part of the page the user asked for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// No explicit scope: selection, then domain selector, then heuristic.
    #[default]
    Auto,
    /// Main article; an active selection is ignored.
    Article,
    /// The whole flattened body.
    #[serde(rename = "fullpage")]
    FullPage,
    /// The active selection.
    Selection,
}

impl std::str::FromStr for Scope {
    type Err = YoinkError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "" | "auto" => Ok(Self::Auto),
            "article" => Ok(Self::Article),
            "fullpage" | "full-page" | "page" => Ok(Self::FullPage),
            "selection" => Ok(Self::Selection),
            other => Err(YoinkError::ConfigError(format!("unknown scope: {other}"))),
        }
    }
}

/// Where the content will come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentSource {
    Selection,
    DomainSelector(String),
    Heuristic,
    FullPage,
}

/// Warnings raised while choosing a source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Advisory {
    /// The requested source was unavailable and a fallback was used.
    pub selector_failed: bool,
}

/// Decides the content source from the request alone.
///
/// The returned advisory covers the "requested but unavailable" case of the
/// `selection` scope; selector mismatches are only known once the selector
/// runs and are reported by [`select`].
pub fn plan_source(scope: Scope, has_selection: bool, domain_selector: Option<&str>) -> (ContentSource, Advisory) {
    let domain_selector = domain_selector.map(str::trim).filter(|s| !s.is_empty());

    match scope {
        Scope::FullPage => (ContentSource::FullPage, Advisory::default()),
        Scope::Selection if has_selection => (ContentSource::Selection, Advisory::default()),
        Scope::Selection => (ContentSource::Heuristic, Advisory { selector_failed: true }),
        Scope::Auto if has_selection => (ContentSource::Selection, Advisory::default()),
        Scope::Auto | Scope::Article => match domain_selector {
            Some(selector) => (ContentSource::DomainSelector(selector.to_string()), Advisory::default()),
            None => (ContentSource::Heuristic, Advisory::default()),
        },
    }
}

/// Selection parameters for one request.
#[derive(Debug, Clone, Default)]
pub struct SelectConfig {
    pub scope: Scope,
    pub domain_selector: Option<String>,
}

/// Runs the content-selection policy over a page.
///
/// The result's `title` is left as the source produced it; callers fill in
/// the document title when it is empty.
pub fn select(page: &Page, config: &SelectConfig, engine: Option<&dyn ReadabilityEngine>) -> ExtractionResult {
    let selection = page.selection();
    let (source, advisory) = plan_source(config.scope, selection.is_some(), config.domain_selector.as_deref());
    debug!(?source, scope = ?config.scope, "content source planned");

    let mut result = match source {
        ContentSource::FullPage => full_page(&page.document),
        ContentSource::Selection => match selection {
            Some(selection) => ExtractionResult {
                length: selection.html.chars().count(),
                html: Some(selection.html.clone()),
                selection: Some(selection.text.clone()),
                ..Default::default()
            },
            None => heuristic(&page.document, &page.url, engine),
        },
        ContentSource::DomainSelector(selector) => match domain_selector(&page.document, &selector) {
            Some(result) => result,
            None => {
                warn!(selector = %selector, "domain selector failed, using heuristic");
                ExtractionResult { selector_failed: Some(true), ..heuristic(&page.document, &page.url, engine) }
            }
        },
        ContentSource::Heuristic => {
            if advisory.selector_failed {
                warn!("selection requested but none is active, using heuristic");
            }
            heuristic(&page.document, &page.url, engine)
        }
    };

    if advisory.selector_failed {
        result.selector_failed = Some(true);
    }
    result.has_selection = selection.is_some();
    result
}

fn full_page(doc: &Document) -> ExtractionResult {
    let flat = flatten_or_clone(doc);
    let (html, length) = body_content(&flat);
    ExtractionResult { html: Some(html), title: doc.title().unwrap_or_default(), length, ..Default::default() }
}

/// Resolves a saved selector. `None` means it was invalid or matched nothing.
fn domain_selector(doc: &Document, selector: &str) -> Option<ExtractionResult> {
    let element = match doc.query_selector(selector) {
        Ok(Some(element)) => element,
        Ok(None) => return None,
        Err(e) => {
            debug!(error = %e, "domain selector did not parse");
            return None;
        }
    };

    let html = shadow_root_html(&element).unwrap_or_else(|| inner_html_with_shadows(&element));
    Some(ExtractionResult {
        html: Some(html),
        length: light_text_len(&element),
        used_selector: Some(true),
        ..Default::default()
    })
}

fn heuristic(doc: &Document, url: &str, engine: Option<&dyn ReadabilityEngine>) -> ExtractionResult {
    let flat = flatten_or_clone(doc);

    if let Some(engine) = engine {
        let url = (!url.is_empty()).then_some(url);
        match engine.parse(&flat.as_string(), url) {
            Ok(Some(article)) if !article.content.trim().is_empty() => {
                return ExtractionResult {
                    html: Some(article.content),
                    title: if article.title.is_empty() { doc.title().unwrap_or_default() } else { article.title },
                    byline: article.byline,
                    site_name: article.site_name,
                    excerpt: article.excerpt,
                    published_time: article.published_time,
                    length: article.length,
                    ..Default::default()
                };
            }
            Ok(_) => warn!("readability found no content, using page body"),
            Err(e) => warn!(error = %e, "readability failed, using page body"),
        }
    }

    let (html, length) = body_content(&flat);
    ExtractionResult { html: Some(html), length, ..Default::default() }
}

fn flatten_or_clone(doc: &Document) -> Document {
    flatten(doc).unwrap_or_else(|e| {
        warn!(error = %e, "shadow flattening failed");
        doc.clone()
    })
}

fn body_content(doc: &Document) -> (String, usize) {
    doc.body()
        .map(|body| (body.inner_html(), light_text_len(&body)))
        .unwrap_or_default()
}

/// Outcome of trying a selector from the interactive picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectorReport {
    Matched { tag_name: String, text_length: usize },
    NoMatch,
    Invalid { error: String },
}

impl SelectorReport {
    pub fn matched(&self) -> bool {
        matches!(self, Self::Matched { .. })
    }
}

impl Serialize for SelectorReport {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("matched", &self.matched())?;
        match self {
            Self::Matched { tag_name, text_length } => {
                map.serialize_entry("tagName", tag_name)?;
                map.serialize_entry("textLength", text_length)?;
            }
            Self::NoMatch => {}
            Self::Invalid { error } => map.serialize_entry("error", error)?,
        }
        map.end()
    }
}

/// Resolves a selector without extracting anything.
///
/// `tag_name` is reported upper-case, like `Element.tagName` in an HTML
/// document.
pub fn test_selector(doc: &Document, selector: &str) -> SelectorReport {
    match doc.query_selector(selector) {
        Ok(Some(element)) => report_match(&element),
        Ok(None) => SelectorReport::NoMatch,
        Err(_) => SelectorReport::Invalid { error: "Invalid selector syntax".to_string() },
    }
}

fn report_match(element: &Element<'_>) -> SelectorReport {
    SelectorReport::Matched { tag_name: element.tag_name().to_uppercase(), text_length: light_text_len(element) }
}
