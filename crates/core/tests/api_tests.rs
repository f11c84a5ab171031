//! Library API integration tests
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Local, TimeZone};
use mdyoink_core::*;
use tempfile::TempDir;

fn get_fixture_path(name: &str) -> String {
    format!("../../tests/fixtures/{}", name)
}

fn fixture(name: &str) -> String {
    std::fs::read_to_string(get_fixture_path(name)).unwrap()
}

fn article_page() -> Page {
    Page::new(Document::parse(&fixture("article.html")).unwrap(), "https://crumb.example.com/notes/sourdough")
}

fn delivered(processed: Processed) -> Delivery {
    match processed {
        Processed::Delivery(delivery) => delivery,
        Processed::Undeliverable { error } => panic!("undeliverable: {error}"),
    }
}

/// Serves the caption fixture for every URL.
struct FixtureFetcher;

#[async_trait]
impl TranscriptFetcher for FixtureFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String> {
        assert!(url.contains("lang=en"), "expected the English track, got {url}");
        Ok(fixture("captions.xml"))
    }
}

#[tokio::test]
async fn test_llm_end_to_end() {
    let html = "<html><head><title>Test Page</title></head><body><p>Hello</p></body></html>";
    let page = Page::new(Document::parse(html).unwrap(), "https://example.com/test");

    let result = Pipeline::new().extract(&page, &ExtractRequest::markdown()).await;
    assert!(result.html.is_none());

    let delivery = delivered(process(&result, OutputMode::Llm, &Settings::default(), None, &Local::now()));
    assert!(delivery.markdown.starts_with("Source: https://example.com/test\n\n"));
    assert!(delivery.markdown.contains("Hello"));
    assert!(!delivery.markdown.contains("---"));
}

#[tokio::test]
async fn test_article_fixture_to_markdown() {
    let result = Pipeline::new().extract(&article_page(), &ExtractRequest::markdown()).await;

    assert!(result.error.is_none());
    assert_eq!(result.domain, "crumb.example.com");
    assert!(result.title.contains("Sourdough"));
    assert!(result.length > 0);

    let markdown = result.markdown.unwrap();
    assert!(markdown.contains("Hydration changes everything"));
    assert!(markdown.contains("Bulk fermentation"));
}

#[tokio::test]
async fn test_domain_selector_match() {
    let request = ExtractRequest::default().with_domain_selector("#main");
    let result = Pipeline::bare().extract(&article_page(), &request).await;

    assert_eq!(result.used_selector, Some(true));
    assert!(result.selector_failed.is_none());
    let html = result.html.unwrap();
    assert!(html.contains("Bulk fermentation"));
    assert!(!html.contains("Subscribe to the newsletter"));
}

#[tokio::test]
async fn test_domain_selector_miss_falls_back() {
    let request = ExtractRequest::default().with_domain_selector(".does-not-exist");
    let result = Pipeline::bare().extract(&article_page(), &request).await;

    assert_eq!(result.selector_failed, Some(true));
    assert!(result.used_selector.is_none());
    assert!(result.html.unwrap().contains("Bulk fermentation"));
}

#[tokio::test]
async fn test_selection_scope_without_selection_matches_heuristic() {
    let pipeline = Pipeline::builder().without_converter().build();

    let heuristic = pipeline.extract(&article_page(), &ExtractRequest::default()).await;
    let requested = pipeline
        .extract(&article_page(), &ExtractRequest::default().with_scope(Scope::Selection))
        .await;

    assert_eq!(requested.selector_failed, Some(true));
    assert!(!requested.has_selection);
    assert_eq!(requested.html, heuristic.html);
}

#[tokio::test]
async fn test_selection_wins_in_auto_scope() {
    let fragment = fixture("selection.html");
    let page = article_page().with_selection(Selection::new(fragment.trim(), "Only this part was selected."));
    let request = ExtractRequest::default().with_domain_selector("#main");

    let result = Pipeline::bare().extract(&page, &request).await;
    assert!(result.has_selection);
    assert_eq!(result.selection.as_deref(), Some("Only this part was selected."));
    assert_eq!(result.html.as_deref(), Some(fragment.trim()));
    assert_eq!(result.length, fragment.trim().len());
    assert!(result.used_selector.is_none());
}

#[tokio::test]
async fn test_article_scope_overrides_selection() {
    let page = article_page().with_selection(Selection::new("<p>picked</p>", "picked"));
    let request = ExtractRequest::default().with_scope(Scope::Article).with_domain_selector("#main");

    let result = Pipeline::bare().extract(&page, &request).await;
    assert!(result.has_selection);
    assert_eq!(result.used_selector, Some(true));
    assert!(!result.html.unwrap().contains("picked"));
}

#[tokio::test]
async fn test_fullpage_scope_keeps_everything() {
    let request = ExtractRequest::default().with_scope(Scope::FullPage);
    let result = Pipeline::new().extract(&article_page(), &request).await;

    assert_eq!(result.title, "Field Notes on Sourdough");
    let html = result.html.unwrap_or_default();
    let markdown = result.markdown.unwrap_or(html);
    assert!(markdown.contains("Subscribe to the newsletter"));
    assert!(markdown.contains("Copyright Crumb Journal"));
}

#[test]
fn test_selector_report_serializes_for_the_picker() {
    let page = article_page();
    let pipeline = Pipeline::bare();

    let matched = serde_json::to_value(pipeline.test_selector(&page, "article h2")).unwrap();
    assert_eq!(matched, serde_json::json!({"matched": true, "tagName": "H2", "textLength": 17}));

    let missing = serde_json::to_value(pipeline.test_selector(&page, "table")).unwrap();
    assert_eq!(missing, serde_json::json!({"matched": false}));

    let invalid = serde_json::to_value(pipeline.test_selector(&page, "div[")).unwrap();
    assert_eq!(invalid["matched"], false);
    assert_eq!(invalid["error"], "Invalid selector syntax");
}

#[test]
fn test_flatten_without_shadow_roots_is_a_clone() {
    let doc = Document::parse(&fixture("article.html")).unwrap();
    let flat = flatten(&doc).unwrap();
    assert_eq!(flat.as_string(), doc.as_string());
}

#[test]
fn test_flatten_projects_slots() {
    let doc = Document::parse(&fixture("shadow_components.html")).unwrap();
    let flat = flatten(&doc).unwrap();

    assert_eq!(flat.title().as_deref(), Some("Component Gallery"));
    let body = flat.body().unwrap().inner_html();
    assert!(body.contains("Cast iron skillet"));
    assert!(body.contains("Pre-seasoned and oven safe."));
    assert!(body.contains("Price on request"));
    assert!(!body.contains("Untitled product"));
    assert!(!body.contains("No description"));

    assert!(body.contains("Light fallback text"));
    assert!(!body.contains("Hidden internals"));
    assert!(!body.contains("<template"));
}

#[tokio::test]
async fn test_domain_selector_on_shadow_host() {
    let page = Page::new(Document::parse(&fixture("shadow_components.html")).unwrap(), "https://shop.example.com/");
    let request = ExtractRequest::default().with_domain_selector("#card");

    let result = Pipeline::bare().extract(&page, &request).await;
    assert_eq!(result.used_selector, Some(true));
    let html = result.html.unwrap();
    assert!(html.trim_start().starts_with("<div class=\"card\">"));
    assert!(html.contains("Cast iron skillet"));
}

#[tokio::test]
async fn test_video_transcript_end_to_end() {
    let page = Page::new(Document::parse(&fixture("video.html")).unwrap(), "https://www.youtube.com/watch?v=abc123");
    let pipeline = Pipeline::builder()
        .transcripts(TranscriptExtractor::new(Arc::new(FixtureFetcher)))
        .build();

    let result = pipeline.extract(&page, &ExtractRequest::markdown()).await;
    assert_eq!(result.is_youtube, Some(true));
    assert_eq!(result.title, "Knife Skills 101");
    assert_eq!(result.channel.as_deref(), Some("Kitchen Basics"));
    assert_eq!(result.domain, "www.youtube.com");

    let segments = result.segments.clone().unwrap();
    assert_eq!(segments.len(), 3);
    assert_eq!(segments[1].text, "Tuck your fingers & curl them.");
    assert_eq!(segments[2].text, "Rock the blade forward.");

    let now = Local.with_ymd_and_hms(2025, 6, 1, 9, 30, 0).unwrap();
    let obsidian = delivered(process(&result, OutputMode::Obsidian, &Settings::default(), None, &now));
    assert!(obsidian.markdown.starts_with("---\ntitle: Knife Skills 101\n"));
    assert!(obsidian.markdown.contains("date: 2025-06-01"));
    assert!(obsidian.markdown.contains("Channel: Kitchen Basics"));
    assert!(obsidian.markdown.contains("[0:00] Hold the knife like this.\n[0:03] Tuck your fingers"));
    assert!(obsidian.markdown.ends_with("[1:06] Rock the blade forward."));

    let llm = delivered(process(&result, OutputMode::Llm, &Settings::default(), None, &now));
    assert!(llm.markdown.ends_with("Hold the knife like this. Tuck your fingers & curl them. Rock the blade forward."));
}

#[tokio::test]
async fn test_video_page_without_fetcher_extracts_as_page() {
    let page = Page::new(Document::parse(&fixture("video.html")).unwrap(), "https://youtu.be/abc123");
    let pipeline = Pipeline::builder()
        .without_readability()
        .transcripts(TranscriptExtractor::default())
        .build();

    let result = pipeline.extract(&page, &ExtractRequest::markdown()).await;
    assert!(result.error.is_none());
    assert!(result.segments.is_none());
    assert!(result.title.starts_with("Knife Skills 101"));
    assert!(result.html.as_deref().unwrap().contains("claw grip"));

    let delivery = delivered(process(&result, OutputMode::Raw, &Settings::default(), None, &Local::now()));
    assert!(delivery.markdown.contains("Learn the claw grip and the rocking cut."));
}

#[tokio::test]
async fn test_video_page_without_tracks_is_partial_failure() {
    let html = fixture("video.html").replace("captionTracks", "translationLanguages");
    let page = Page::new(Document::parse(&html).unwrap(), "https://youtu.be/abc123");
    let pipeline = Pipeline::builder().transcripts(TranscriptExtractor::new(Arc::new(FixtureFetcher))).build();

    let result = pipeline.extract(&page, &ExtractRequest::default()).await;
    assert_eq!(result.title, "Knife Skills 101");
    assert_eq!(result.error.as_deref(), Some("No transcript available for this video"));
    assert!(matches!(
        process(&result, OutputMode::Llm, &Settings::default(), None, &Local::now()),
        Processed::Undeliverable { .. }
    ));
}

#[tokio::test]
async fn test_stored_selector_drives_extraction() {
    let tmp = TempDir::new().unwrap();
    let store = SettingsStore::new(tmp.path());
    assert_eq!(store.import_selectors(r##"{"crumb.example.com": "article.post"}"##).unwrap(), 1);

    let page = article_page();
    let selector = store.selector_for(&page.domain()).unwrap().unwrap();
    let result = Pipeline::bare()
        .extract(&page, &ExtractRequest::default().with_domain_selector(selector))
        .await;

    assert_eq!(result.used_selector, Some(true));
    assert!(!result.html.unwrap().contains("Archive"));
}

#[test]
fn test_settings_store_survives_partial_stored_shape() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(
        tmp.path().join("storage.json"),
        r#"{"settings": {"outputMode": "obsidian", "llm": {"stripLinks": false}}}"#,
    )
    .unwrap();

    let settings = SettingsStore::new(tmp.path()).load_settings().unwrap();
    assert_eq!(settings.output_mode, OutputMode::Obsidian);
    assert!(!settings.llm.strip_links);
    assert!(settings.llm.strip_images);
    assert_eq!(settings.llm.source_line_format, "Source: {url}");
}

#[tokio::test]
async fn test_request_from_host_json() {
    let request: ExtractRequest = serde_json::from_str(
        r##"{"returnMarkdown": false, "scope": "fullpage", "domainSelector": null, "testSelector": null}"##,
    )
    .unwrap();

    let result = Pipeline::bare().extract(&article_page(), &request).await;
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["hasSelection"], false);
    assert_eq!(json["domain"], "crumb.example.com");
    assert!(json.get("markdown").is_none());
    assert!(json["html"].as_str().unwrap().contains("Crumb Journal"));
}
