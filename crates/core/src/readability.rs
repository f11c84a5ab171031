//! The readability capability.
//!
//! Main-content detection is a black box to the pipeline: something that
//! takes a full document and hands back a best-effort article fragment. The
//! [`ReadabilityEngine`] trait is that seam. [`SmoothieEngine`], backed by
//! `dom_smoothie`, is the default when the `readability` feature is on.
//!
//! An engine may return `Ok(None)` when it finds nothing worth keeping; the
//! content selector treats that the same as an error and falls back to the
//! page body.

use crate::Result;

/// A main-content fragment with the metadata the engine found alongside it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReadableArticle {
    pub content: String,
    pub title: String,
    pub byline: String,
    pub site_name: String,
    pub excerpt: String,
    pub published_time: String,
    /// Length of the article's text in characters.
    pub length: usize,
}

/// Produces a best-effort main-content fragment from a full document.
pub trait ReadabilityEngine: Send + Sync {
    fn parse(&self, html: &str, url: Option<&str>) -> Result<Option<ReadableArticle>>;
}

/// [`ReadabilityEngine`] backed by `dom_smoothie`.
#[cfg(feature = "readability")]
#[derive(Debug, Clone, Copy, Default)]
pub struct SmoothieEngine;

#[cfg(feature = "readability")]
impl ReadabilityEngine for SmoothieEngine {
    fn parse(&self, html: &str, url: Option<&str>) -> Result<Option<ReadableArticle>> {
        use crate::YoinkError;
        use dom_smoothie::Readability;

        let mut reader = Readability::new(html.to_string(), url.filter(|u| !u.is_empty()), None)
            .map_err(|e| YoinkError::HtmlParseError(format!("{e:?}")))?;
        let article = reader.parse().map_err(|e| YoinkError::HtmlParseError(format!("{e:?}")))?;

        let content = article.content.to_string();
        if content.trim().is_empty() {
            return Ok(None);
        }

        Ok(Some(ReadableArticle {
            length: article.text_content.chars().count(),
            content,
            title: article.title.to_string(),
            byline: article.byline.unwrap_or_default(),
            site_name: article.site_name.unwrap_or_default(),
            excerpt: article.excerpt.unwrap_or_default(),
            published_time: article.published_time.unwrap_or_default(),
        }))
    }
}
