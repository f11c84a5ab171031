//! HTML parsing and DOM queries.
//!
//! [`Document`] is the page snapshot every stage works on. It wraps a
//! `scraper::Html` tree and answers the handful of questions the pipeline
//! asks of a page: its title, its `<head>` and `<body>`, and which element a
//! CSS selector resolves to.
//!
//! Template contents (including declarative shadow roots) are ordinary
//! children in the parsed tree, but a browser's `querySelector` never looks
//! inside them. [`Document::query_selector`] honours that.
//!
//! # Example
//!
//! ```rust
//! use mdyoink_core::Document;
//!
//! let html = r#"
//!     <html>
//!         <head><title>Title</title></head>
//!         <body><p class="content">Paragraph</p></body>
//!     </html>
//! "#;
//!
//! let doc = Document::parse(html).unwrap();
//! assert_eq!(doc.title(), Some("Title".to_string()));
//! let first = doc.query_selector("p.content").unwrap().unwrap();
//! assert_eq!(first.text(), "Paragraph");
//! ```

use scraper::{ElementRef, Html, Node, Selector};

use crate::{Result, YoinkError};

/// A parsed HTML document.
///
/// Cloning a document is a deep structural clone of its tree.
#[derive(Clone)]
pub struct Document {
    html: Html,
}

impl Document {
    /// Parses a full HTML document.
    ///
    /// html5ever recovers from any markup, so this never fails in practice;
    /// it returns `Result` to keep the door open for stricter inputs.
    pub fn parse(html: &str) -> Result<Self> {
        Ok(Self { html: Html::parse_document(html) })
    }

    /// Gets the underlying `scraper::Html` tree.
    pub fn html(&self) -> &Html {
        &self.html
    }

    /// Serializes the entire document.
    pub fn as_string(&self) -> String {
        self.html.html()
    }

    /// Selects every element matching a CSS selector, in document order.
    ///
    /// # Errors
    ///
    /// Returns [`YoinkError::InvalidSelector`] if the selector cannot be parsed.
    pub fn select(&'_ self, selector: &str) -> Result<Vec<Element<'_>>> {
        let sel = parse_selector(selector)?;
        Ok(self.html.select(&sel).map(|el| Element { element: el }).collect())
    }

    /// Resolves a selector to its first match outside any `<template>`.
    ///
    /// Mirrors `document.querySelector`: `Ok(None)` for no match, an error
    /// for selector syntax problems.
    pub fn query_selector(&'_ self, selector: &str) -> Result<Option<Element<'_>>> {
        let sel = parse_selector(selector)?;
        Ok(self
            .html
            .select(&sel)
            .find(|el| !is_inside_template(*el))
            .map(|el| Element { element: el }))
    }

    /// Gets the document title the way `document.title` reports it:
    /// whitespace collapsed and trimmed.
    pub fn title(&self) -> Option<String> {
        let selector = Selector::parse("title").ok()?;
        self.html
            .select(&selector)
            .next()
            .map(|el| collapse_whitespace(&el.text().collect::<String>()))
    }

    /// Gets the `<head>` element.
    pub fn head(&'_ self) -> Option<Element<'_>> {
        self.first_element("head")
    }

    /// Gets the `<body>` element.
    pub fn body(&'_ self) -> Option<Element<'_>> {
        self.first_element("body")
    }

    /// Gets the concatenated text of every text node in the document.
    pub fn text_content(&self) -> String {
        self.html.root_element().text().collect()
    }

    fn first_element(&'_ self, tag: &str) -> Option<Element<'_>> {
        let selector = Selector::parse(tag).ok()?;
        self.html.select(&selector).next().map(|el| Element { element: el })
    }
}

/// A single element of a [`Document`].
///
/// # Example
///
/// ```rust
/// use mdyoink_core::Document;
///
/// let html = r#"<a href="https://example.com">Link text</a>"#;
/// let doc = Document::parse(html).unwrap();
/// let link = &doc.select("a").unwrap()[0];
///
/// assert_eq!(link.text(), "Link text");
/// assert_eq!(link.attr("href"), Some("https://example.com"));
/// ```
#[derive(Clone, Copy, Debug)]
pub struct Element<'a> {
    element: ElementRef<'a>,
}

impl<'a> Element<'a> {
    /// Gets the inner HTML of this element (light DOM only).
    pub fn inner_html(&self) -> String {
        self.element.inner_html()
    }

    /// Gets the outer HTML of this element (light DOM only).
    pub fn outer_html(&self) -> String {
        self.element.html()
    }

    /// Gets the text of every descendant text node, template contents included.
    pub fn text(&self) -> String {
        self.element.text().collect()
    }

    /// Gets the value of an attribute.
    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.element.value().attr(name)
    }

    /// Gets the lowercase tag name (e.g., "div", "a", "span").
    pub fn tag_name(&self) -> String {
        self.element.value().name().to_lowercase()
    }

    /// Selects descendant elements using a CSS selector.
    ///
    /// # Errors
    ///
    /// Returns [`YoinkError::InvalidSelector`] if the selector is invalid.
    pub fn select(&self, selector: &str) -> Result<Vec<Element<'a>>> {
        let sel = parse_selector(selector)?;
        Ok(self.element.select(&sel).map(|el| Element { element: el }).collect())
    }

    /// Gets the wrapped `scraper` element.
    pub fn element_ref(&self) -> ElementRef<'a> {
        self.element
    }
}

impl<'a> From<ElementRef<'a>> for Element<'a> {
    fn from(element: ElementRef<'a>) -> Self {
        Self { element }
    }
}

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| YoinkError::InvalidSelector(format!("{selector}: {e}")))
}

/// Whether an element lives inside template contents, which selector
/// matching in a browser never reaches.
pub(crate) fn is_inside_template(element: ElementRef<'_>) -> bool {
    element
        .ancestors()
        .any(|node| matches!(node.value(), Node::Element(el) if el.name() == "template"))
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
