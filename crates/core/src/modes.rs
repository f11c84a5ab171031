//! Output-mode post-processing.
//!
//! Pure string transforms applied to converted Markdown. Each mode is a
//! function of its inputs only, so applying a mode twice with the same
//! inputs gives the same text.

use std::sync::LazyLock;

use chrono::{DateTime, Local};
use regex::{Captures, Regex};

use crate::settings::{DEFAULT_FRONT_MATTER, OutputMode, Settings};

static IMAGE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"!\[[^\]]*\]\([^)]+\)").unwrap());
static INLINE_LINK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\([^)]+\)").unwrap());
static AUTOLINK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<https?://[^>]+>").unwrap());
static REFERENCE_DEF_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)\[[^\]]+\]:[ \t]+.*$").unwrap());
static BLANK_RUN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());
static DATE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{date(?::([^}]+))?\}").unwrap());
static FILENAME_DISALLOWED_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9\s-]").unwrap());
static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static HYPHEN_RUN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-+").unwrap());

/// Page facts available to templates.
#[derive(Debug, Clone, Copy, Default)]
pub struct PageMeta<'a> {
    pub title: &'a str,
    pub url: &'a str,
    pub domain: &'a str,
    /// Only set when the content came from a selection.
    pub selection: &'a str,
}

/// Removes `![alt](src)` images.
pub fn strip_images(markdown: &str) -> String {
    IMAGE_RE.replace_all(markdown, "").into_owned()
}

/// Unwraps `[text](url)` to `text` and removes autolinks and
/// reference-style definitions.
pub fn strip_links(markdown: &str) -> String {
    let result = INLINE_LINK_RE.replace_all(markdown, "${1}");
    let result = AUTOLINK_RE.replace_all(&result, "");
    REFERENCE_DEF_RE.replace_all(&result, "").into_owned()
}

/// Formats the current local time for a `{date:FORMAT}` placeholder.
///
/// `YYYY-MM-DD` and `YYYY-MM-DDTHH:mm:ss` are understood; anything else
/// gives the plain date.
pub fn format_date(format: Option<&str>, now: &DateTime<Local>) -> String {
    match format {
        Some("YYYY-MM-DDTHH:mm:ss") => now.format("%Y-%m-%dT%H:%M:%S").to_string(),
        _ => now.format("%Y-%m-%d").to_string(),
    }
}

/// Applies a mode using the current local time.
pub fn apply_mode(mode: OutputMode, markdown: &str, meta: &PageMeta<'_>, settings: &Settings) -> String {
    apply_mode_at(mode, markdown, meta, settings, &Local::now())
}

/// Applies a mode with an explicit clock for `{date}` placeholders.
pub fn apply_mode_at(
    mode: OutputMode, markdown: &str, meta: &PageMeta<'_>, settings: &Settings, now: &DateTime<Local>,
) -> String {
    match mode {
        OutputMode::Llm => apply_llm(markdown, meta, settings),
        OutputMode::Obsidian => apply_obsidian(markdown, meta, settings, now),
        OutputMode::Raw => markdown.trim().to_string(),
    }
}

fn apply_llm(markdown: &str, meta: &PageMeta<'_>, settings: &Settings) -> String {
    let llm = &settings.llm;
    let mut result = markdown.to_string();

    if llm.strip_images {
        result = strip_images(&result);
    }
    if llm.strip_links {
        result = strip_links(&result);
    }
    let result = BLANK_RUN_RE.replace_all(&result, "\n\n");

    if llm.source_line_format.is_empty() {
        return result.into_owned();
    }

    let source = llm
        .source_line_format
        .replace("{url}", meta.url)
        .replace("{title}", meta.title)
        .replace("{domain}", meta.domain);
    format!("{source}\n\n{}", result.trim())
}

fn apply_obsidian(markdown: &str, meta: &PageMeta<'_>, settings: &Settings, now: &DateTime<Local>) -> String {
    let template = match settings.obsidian.front_matter_template.as_str() {
        "" => DEFAULT_FRONT_MATTER,
        template => template,
    };
    let title = if meta.title.is_empty() { "Untitled" } else { meta.title };

    let front_matter = template
        .replace("{title}", title)
        .replace("{url}", meta.url)
        .replace("{domain}", meta.domain)
        .replace("{selection}", meta.selection);
    let front_matter = DATE_RE.replace_all(&front_matter, |caps: &Captures<'_>| {
        format_date(caps.get(1).map(|m| m.as_str()), now)
    });

    format!("{front_matter}\n\n{}", markdown.trim())
}

/// Rough token count: a quarter of the character count, rounded up.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(4)
}

/// Turns a title into a safe `.md` filename.
pub fn slugify_filename(title: &str) -> String {
    let slug = title.to_lowercase();
    let slug = FILENAME_DISALLOWED_RE.replace_all(&slug, "");
    let slug = WHITESPACE_RE.replace_all(&slug, "-");
    let slug = HYPHEN_RUN_RE.replace_all(&slug, "-");
    let slug = slug.strip_prefix('-').unwrap_or(&slug);
    let slug = slug.strip_suffix('-').unwrap_or(slug);
    let slug: String = slug.chars().take(100).collect();

    if slug.is_empty() { "untitled.md".to_string() } else { format!("{slug}.md") }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    fn meta() -> PageMeta<'static> {
        PageMeta { title: "A Title", url: "https://example.com/a", domain: "example.com", selection: "" }
    }

    fn fixed_now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 5, 7, 8, 9).unwrap()
    }

    #[test]
    fn test_strip_links() {
        assert_eq!(strip_links("[a](http://x) and [b]: http://y"), "a and ");
        assert_eq!(strip_links("see <https://example.com> now"), "see  now");
        assert_eq!(strip_links("text\n[1]: https://ref\nmore"), "text\n\nmore");
    }

    #[test]
    fn test_strip_images() {
        assert_eq!(strip_images("![alt](http://x.png) text"), " text");
        assert_eq!(strip_images("![](a.png)"), "");
    }

    #[rstest]
    #[case("", 0)]
    #[case("abcd", 1)]
    #[case("abcde", 2)]
    #[case("héllo", 2)]
    fn test_estimate_tokens(#[case] text: &str, #[case] expected: usize) {
        assert_eq!(estimate_tokens(text), expected);
    }

    #[rstest]
    #[case("Hello, World! 2024", "hello-world-2024.md")]
    #[case("", "untitled.md")]
    #[case("!!!", "untitled.md")]
    #[case("  -Leading and trailing-  ", "leading-and-trailing.md")]
    #[case("a -- b", "a-b.md")]
    fn test_slugify_filename(#[case] title: &str, #[case] expected: &str) {
        assert_eq!(slugify_filename(title), expected);
    }

    #[test]
    fn test_slugify_truncates() {
        let slug = slugify_filename(&"a".repeat(150));
        assert_eq!(slug.len(), 103);
    }

    #[test]
    fn test_llm_mode() {
        let md = "# Hi\n\n![img](a.png)\n\n\n\n[link](http://x) text";
        let out = apply_mode(OutputMode::Llm, md, &meta(), &Settings::default());
        assert_eq!(out, "Source: https://example.com/a\n\n# Hi\n\nlink text");
    }

    #[test]
    fn test_llm_mode_without_source_line() {
        let mut settings = Settings::default();
        settings.llm.source_line_format.clear();
        settings.llm.strip_links = false;
        let out = apply_mode(OutputMode::Llm, "[a](b)\n", &meta(), &settings);
        assert_eq!(out, "[a](b)\n");
    }

    #[test]
    fn test_obsidian_mode() {
        let out = apply_mode_at(OutputMode::Obsidian, "\nBody\n", &meta(), &Settings::default(), &fixed_now());
        assert_eq!(out, "---\ntitle: A Title\nurl: https://example.com/a\ndate: 2024-03-05\n---\n\nBody");
    }

    #[test]
    fn test_obsidian_template_placeholders() {
        let mut settings = Settings::default();
        settings.obsidian.front_matter_template =
            "{title}|{domain}|{selection}|{date}|{date:YYYY-MM-DDTHH:mm:ss}|{date:DD/MM}".to_string();
        let meta = PageMeta { title: "", selection: "picked", ..meta() };
        let out = apply_mode_at(OutputMode::Obsidian, "x", &meta, &settings, &fixed_now());
        assert_eq!(out, "Untitled|example.com|picked|2024-03-05|2024-03-05T07:08:09|2024-03-05\n\nx");
    }

    #[test]
    fn test_empty_template_uses_default() {
        let mut settings = Settings::default();
        settings.obsidian.front_matter_template.clear();
        let out = apply_mode_at(OutputMode::Obsidian, "x", &meta(), &settings, &fixed_now());
        assert!(out.starts_with("---\ntitle: A Title\n"));
    }

    #[test]
    fn test_raw_mode_is_idempotent() {
        let settings = Settings::default();
        let once = apply_mode(OutputMode::Raw, "\n\n  body  \n", &meta(), &settings);
        let twice = apply_mode(OutputMode::Raw, &once, &meta(), &settings);
        assert_eq!(once, "body");
        assert_eq!(once, twice);
    }
}
