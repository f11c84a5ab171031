//! CLI integration tests
use predicates::prelude::*;
use tempfile::TempDir;

fn cmd(settings: &TempDir) -> assert_cmd::Command {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("mdyoink");
    cmd.arg("--settings-dir").arg(settings.path());
    cmd
}

fn get_fixture_path(name: &str) -> String {
    format!("../../tests/fixtures/{}", name)
}

#[test]
fn test_cli_file_input_llm_mode() {
    let settings = TempDir::new().unwrap();
    cmd(&settings)
        .args(["--url", "https://crumb.example.com/notes/sourdough"])
        .arg(get_fixture_path("article.html"))
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Source: https://crumb.example.com/notes/sourdough\n\n"))
        .stdout(predicate::str::contains("Hydration changes everything"))
        .stdout(predicate::str::contains("](https://example.com/hydration)").not());
}

#[test]
fn test_cli_stdin_input() {
    let settings = TempDir::new().unwrap();
    let html = std::fs::read_to_string(get_fixture_path("article.html")).unwrap();
    cmd(&settings)
        .args(["--mode", "raw", "-"])
        .write_stdin(html)
        .assert()
        .success()
        .stdout(predicate::str::contains("Bulk fermentation"));
}

#[test]
fn test_cli_obsidian_mode() {
    let settings = TempDir::new().unwrap();
    cmd(&settings)
        .args(["--mode", "obsidian", "--url", "https://crumb.example.com/notes/sourdough"])
        .arg(get_fixture_path("article.html"))
        .assert()
        .success()
        .stdout(predicate::str::starts_with("---\ntitle: "))
        .stdout(predicate::str::contains("url: https://crumb.example.com/notes/sourdough"));
}

#[test]
fn test_cli_keep_links_in_llm_mode() {
    let settings = TempDir::new().unwrap();
    cmd(&settings)
        .args(["--keep-links", "--selector", "#main"])
        .arg(get_fixture_path("article.html"))
        .assert()
        .success()
        .stdout(predicate::str::contains("https://example.com/hydration"));
}

#[test]
fn test_cli_strip_links_conflicts_with_keep_links() {
    let settings = TempDir::new().unwrap();
    cmd(&settings)
        .args(["--strip-links", "--keep-links"])
        .arg(get_fixture_path("article.html"))
        .assert()
        .failure();
}

#[test]
fn test_cli_json_output() {
    let settings = TempDir::new().unwrap();
    let output = cmd(&settings)
        .args(["--json", "--selector", "article.post", "--url", "https://crumb.example.com/a"])
        .arg(get_fixture_path("article.html"))
        .output()
        .unwrap();

    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["usedSelector"], true);
    assert_eq!(json["domain"], "crumb.example.com");
    assert!(json["markdown"].as_str().unwrap().contains("Bulk fermentation"));
    assert!(json.get("html").is_none());
}

#[test]
fn test_cli_test_selector() {
    let settings = TempDir::new().unwrap();
    cmd(&settings)
        .args(["--test-selector", "article h1"])
        .arg(get_fixture_path("article.html"))
        .assert()
        .success()
        .stdout(predicate::str::contains("\"tagName\": \"H1\""));

    cmd(&settings)
        .args(["--test-selector", "div["])
        .arg(get_fixture_path("article.html"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Invalid selector syntax"));
}

#[test]
fn test_cli_selection_file() {
    let settings = TempDir::new().unwrap();
    cmd(&settings)
        .args(["--mode", "raw", "--selection", &get_fixture_path("selection.html")])
        .arg(get_fixture_path("article.html"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Only **this** part was selected."))
        .stdout(predicate::str::contains("Bulk fermentation").not());
}

#[test]
fn test_cli_selection_scope_without_selection_warns() {
    let settings = TempDir::new().unwrap();
    cmd(&settings)
        .args(["--scope", "selection"])
        .arg(get_fixture_path("article.html"))
        .assert()
        .success()
        .stderr(predicate::str::contains("Selector unavailable"));
}

#[test]
fn test_cli_invalid_scope() {
    let settings = TempDir::new().unwrap();
    cmd(&settings)
        .args(["--scope", "everything"])
        .arg(get_fixture_path("article.html"))
        .assert()
        .failure();
}

#[test]
fn test_cli_output_file() {
    let settings = TempDir::new().unwrap();
    let tmp = TempDir::new().unwrap();
    let output = tmp.path().join("output.md");

    cmd(&settings)
        .args(["-o", output.to_str().unwrap()])
        .arg(get_fixture_path("article.html"))
        .assert()
        .success();

    assert!(std::fs::read_to_string(&output).unwrap().contains("Bulk fermentation"));
}

#[test]
fn test_cli_download_dir_uses_title() {
    let settings = TempDir::new().unwrap();
    let downloads = TempDir::new().unwrap();

    cmd(&settings)
        .args(["--scope", "fullpage", "--download-dir", downloads.path().to_str().unwrap()])
        .arg(get_fixture_path("article.html"))
        .assert()
        .success();

    assert!(downloads.path().join("field-notes-on-sourdough.md").exists());
}

#[test]
fn test_cli_selectors_round_trip() {
    let settings = TempDir::new().unwrap();
    let import = settings.path().join("import.json");
    std::fs::write(&import, r#"{"crumb.example.com": "article.post"}"#).unwrap();

    cmd(&settings)
        .args(["--import-selectors", import.to_str().unwrap()])
        .assert()
        .success()
        .stderr(predicate::str::contains("Imported 1 selector(s)"));

    cmd(&settings)
        .arg("--export-selectors")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"crumb.example.com\": \"article.post\""));

    let output = cmd(&settings)
        .args(["--json", "--url", "https://crumb.example.com/notes"])
        .arg(get_fixture_path("article.html"))
        .output()
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["usedSelector"], true);
}

#[test]
fn test_cli_save_selector() {
    let settings = TempDir::new().unwrap();
    cmd(&settings)
        .args(["--save-selector", "--selector", "#main", "--url", "https://crumb.example.com/x"])
        .arg(get_fixture_path("article.html"))
        .assert()
        .success();

    let stored = std::fs::read_to_string(settings.path().join("storage.json")).unwrap();
    assert!(stored.contains("\"crumb.example.com\": \"#main\""));
}

#[test]
fn test_cli_saved_settings_choose_mode() {
    let settings = TempDir::new().unwrap();
    std::fs::write(
        settings.path().join("storage.json"),
        r#"{"settings": {"outputMode": "raw"}}"#,
    )
    .unwrap();

    cmd(&settings)
        .arg(get_fixture_path("article.html"))
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Source:").not());
}

#[test]
fn test_cli_wrong_typed_setting_keeps_default() {
    let settings = TempDir::new().unwrap();
    std::fs::write(
        settings.path().join("storage.json"),
        r#"{"settings": {"llm": {"stripLinks": "yes"}}}"#,
    )
    .unwrap();

    cmd(&settings)
        .args(["--url", "https://crumb.example.com/notes/sourdough"])
        .arg(get_fixture_path("article.html"))
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Source: https://crumb.example.com/notes/sourdough"))
        .stdout(predicate::str::contains("](https://example.com/hydration)").not());
}

#[test]
fn test_cli_tokens_report() {
    let settings = TempDir::new().unwrap();
    cmd(&settings)
        .arg("--tokens")
        .arg(get_fixture_path("article.html"))
        .assert()
        .success()
        .stderr(predicate::str::contains("Tokens:"))
        .stderr(predicate::str::contains("Claude 200k"));
}

#[test]
fn test_cli_missing_file() {
    let settings = TempDir::new().unwrap();
    cmd(&settings)
        .arg("nonexistent_file.html")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read file"));
}

#[test]
fn test_cli_requires_input() {
    let settings = TempDir::new().unwrap();
    cmd(&settings).assert().failure();
}
