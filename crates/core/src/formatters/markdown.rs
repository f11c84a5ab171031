//! HTML to Markdown conversion.
//!
//! Conversion itself is a capability behind [`MarkdownConverter`];
//! [`HtmdConverter`] is the htmd-backed default. Before the converter runs,
//! images are removed when the options exclude them and the optional
//! [`GfmExtension`] rewrites strikethrough and task-list markup into its
//! Markdown form.

use lol_html::html_content::ContentType;
use lol_html::{HtmlRewriter, Settings, element};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{Result, YoinkError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeadingStyle {
    Setext,
    #[default]
    #[serde(other)]
    Atx,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodeBlockStyle {
    Indented,
    #[default]
    #[serde(other)]
    Fenced,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkStyle {
    Referenced,
    #[default]
    #[serde(other)]
    Inlined,
}

/// Stylistic options for the conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MarkdownOptions {
    pub heading_style: HeadingStyle,
    /// `*` selects asterisks; anything else selects dashes.
    pub bullet_list_marker: String,
    pub code_block_style: CodeBlockStyle,
    pub link_style: LinkStyle,
    pub include_images: bool,
}

impl Default for MarkdownOptions {
    fn default() -> Self {
        Self {
            heading_style: HeadingStyle::Atx,
            bullet_list_marker: "-".to_string(),
            code_block_style: CodeBlockStyle::Fenced,
            link_style: LinkStyle::Inlined,
            include_images: true,
        }
    }
}

/// Converts an HTML fragment to Markdown.
pub trait MarkdownConverter: Send + Sync {
    fn convert(&self, html: &str, options: &MarkdownOptions) -> Result<String>;
}

/// Converts with the capability if there is one.
///
/// `None` when no converter is available or the conversion failed; the
/// caller keeps the HTML in that case.
pub fn html_to_markdown(
    html: &str, options: &MarkdownOptions, converter: Option<&dyn MarkdownConverter>,
) -> Option<String> {
    let converter = converter?;
    let html = if options.include_images { html.to_string() } else { remove_images(html) };

    match converter.convert(&html, options) {
        Ok(markdown) => Some(markdown),
        Err(e) => {
            warn!(error = %e, "markdown conversion failed");
            None
        }
    }
}

/// Table, strikethrough and task-list support.
///
/// htmd renders tables itself; strikethrough and task-list checkboxes are
/// rewritten to their Markdown text before conversion.
#[derive(Debug, Clone, Copy, Default)]
pub struct GfmExtension;

impl GfmExtension {
    pub fn apply(&self, html: &str) -> String {
        rewrite(
            html,
            Settings {
                element_content_handlers: vec![
                    element!("del, s, strike", |el| {
                        el.before("~~", ContentType::Text);
                        el.after("~~", ContentType::Text);
                        el.remove_and_keep_content();
                        Ok(())
                    }),
                    element!(r#"input[type="checkbox"]"#, |el| {
                        let mark = if el.has_attribute("checked") { "[x] " } else { "[ ] " };
                        el.replace(mark, ContentType::Text);
                        Ok(())
                    }),
                ],
                ..Default::default()
            },
        )
    }
}

/// [`MarkdownConverter`] backed by htmd.
#[cfg(feature = "markdown")]
#[derive(Debug, Clone)]
pub struct HtmdConverter {
    gfm: Option<GfmExtension>,
}

#[cfg(feature = "markdown")]
impl Default for HtmdConverter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "markdown")]
impl HtmdConverter {
    /// A converter with the GFM extension.
    pub fn new() -> Self {
        Self { gfm: Some(GfmExtension) }
    }

    /// A converter without any extension.
    pub fn plain() -> Self {
        Self { gfm: None }
    }

    fn htmd_options(options: &MarkdownOptions) -> htmd::options::Options {
        use htmd::options::{BulletListMarker, CodeBlockStyle as Code, HeadingStyle as Heading, HrStyle, LinkStyle as Link};

        htmd::options::Options {
            heading_style: match options.heading_style {
                HeadingStyle::Atx => Heading::Atx,
                HeadingStyle::Setext => Heading::Setex,
            },
            bullet_list_marker: if options.bullet_list_marker.trim() == "*" {
                BulletListMarker::Asterisk
            } else {
                BulletListMarker::Dash
            },
            code_block_style: match options.code_block_style {
                CodeBlockStyle::Fenced => Code::Fenced,
                CodeBlockStyle::Indented => Code::Indented,
            },
            link_style: match options.link_style {
                LinkStyle::Inlined => Link::Inlined,
                LinkStyle::Referenced => Link::Referenced,
            },
            hr_style: HrStyle::Dashes,
            ..Default::default()
        }
    }
}

#[cfg(feature = "markdown")]
impl MarkdownConverter for HtmdConverter {
    fn convert(&self, html: &str, options: &MarkdownOptions) -> Result<String> {
        let html = match &self.gfm {
            Some(gfm) => gfm.apply(html),
            None => html.to_string(),
        };

        htmd::HtmlToMarkdown::builder()
            .options(Self::htmd_options(options))
            .build()
            .convert(&html)
            .map_err(|e| YoinkError::MarkdownError(e.to_string()))
    }
}

/// Removes every `<img>` element.
pub fn remove_images(html: &str) -> String {
    rewrite(
        html,
        Settings {
            element_content_handlers: vec![element!("img", |el| {
                el.remove();
                Ok(())
            })],
            ..Default::default()
        },
    )
}

/// Runs lol_html handlers over a fragment, returning the input unchanged if
/// the rewriter rejects it.
fn rewrite(html: &str, settings: Settings<'_, '_>) -> String {
    let mut output = Vec::new();
    let mut rewriter = HtmlRewriter::new(settings, |c: &[u8]| output.extend_from_slice(c));

    if rewriter.write(html.as_bytes()).is_err() || rewriter.end().is_err() {
        return html.to_string();
    }

    String::from_utf8(output).unwrap_or_else(|e| {
        warn!(error = %YoinkError::HtmlParseError(e.to_string()), "rewritten html was not utf-8");
        html.to_string()
    })
}
