//! The page a pipeline run works on.
//!
//! A [`Page`] is a document snapshot plus what the host knew about it when
//! the request was made: its URL and the user's text selection, if any.

use url::Url;

use crate::parse::Document;

/// A user text selection captured by the host.
///
/// `html` is the serialized clone of the selected range, `text` its plain
/// string form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub html: String,
    pub text: String,
}

impl Selection {
    pub fn new(html: impl Into<String>, text: impl Into<String>) -> Self {
        Self { html: html.into(), text: text.into() }
    }

    /// A selection whose HTML is blank selects nothing.
    pub fn is_collapsed(&self) -> bool {
        self.html.trim().is_empty()
    }
}

/// A parsed page with its URL and optional selection.
#[derive(Clone)]
pub struct Page {
    pub document: Document,
    pub url: String,
    pub selection: Option<Selection>,
}

impl Page {
    pub fn new(document: Document, url: impl Into<String>) -> Self {
        Self { document, url: url.into(), selection: None }
    }

    /// Attaches a selection; collapsed selections are discarded.
    pub fn with_selection(mut self, selection: Selection) -> Self {
        self.selection = (!selection.is_collapsed()).then_some(selection);
        self
    }

    /// The active, non-collapsed selection.
    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref().filter(|s| !s.is_collapsed())
    }

    /// Host name of the page URL, or an empty string when there is none.
    pub fn domain(&self) -> String {
        domain_of(&self.url)
    }

    pub fn is_youtube(&self) -> bool {
        is_youtube_url(&self.url)
    }
}

/// Host name of a URL, or an empty string when it cannot be parsed.
pub fn domain_of(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_default()
}

/// Whether a URL points at a YouTube video page.
///
/// `youtu.be/<id>` short links, and `/watch`, `/shorts/…` and `/embed/…`
/// paths on any `youtube.com` host.
pub fn is_youtube_url(url: &str) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    let Some(host) = parsed.host_str() else {
        return false;
    };
    let path = parsed.path();

    if host == "youtu.be" || host == "www.youtu.be" {
        return path.len() > 1;
    }

    host.contains("youtube.com")
        && (path == "/watch" || path.starts_with("/shorts/") || path.starts_with("/embed/"))
}
