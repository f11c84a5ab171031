mod echo;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, bail};
use clap::Parser;
use mdyoink_core::{
    Document, ExtractRequest, Extraction, FetchConfig, HttpFetcher, OutputMode, Page, Pipeline, Processed, Scope,
    Selection, SettingsStore, TranscriptExtractor, download_filename, fetch_file, fetch_stdin, fetch_url, process,
    token_budget,
};
use owo_colors::OwoColorize;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use url::Url;

use crate::echo::{
    format_size, print_banner, print_extraction_details, print_info, print_step, print_success, print_timing,
    print_token_budget, print_warning,
};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Yoink a web page, a selection or a video transcript into Markdown
#[derive(Parser, Debug)]
#[command(name = "mdyoink")]
#[command(version)]
#[command(about = "Yoink web pages into LLM- or Obsidian-ready Markdown", long_about = None)]
struct Args {
    /// URL to fetch, local HTML file, or "-" for stdin
    #[arg(value_name = "INPUT", required_unless_present_any = ["import_selectors", "export_selectors"])]
    input: Option<String>,

    /// Page URL to report when the page is read from a file or stdin
    #[arg(long, value_name = "URL")]
    url: Option<String>,

    /// What to extract (auto, article, fullpage, selection)
    #[arg(long, default_value = "auto", value_name = "SCOPE")]
    scope: Scope,

    /// CSS selector for the content, overriding the one saved for the domain
    #[arg(long, value_name = "CSS")]
    selector: Option<String>,

    /// Only report what a CSS selector matches
    #[arg(long, value_name = "CSS")]
    test_selector: Option<String>,

    /// HTML fragment to treat as the active selection
    #[arg(long, value_name = "FILE")]
    selection: Option<PathBuf>,

    /// Output mode (llm, obsidian, raw); defaults to the saved setting
    #[arg(short, long, value_name = "MODE")]
    mode: Option<String>,

    /// Strip links regardless of the mode
    #[arg(long, conflicts_with = "keep_links")]
    strip_links: bool,

    /// Keep links regardless of the mode
    #[arg(long)]
    keep_links: bool,

    /// Output file (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Save into this directory under a name built from the page title
    #[arg(long, value_name = "DIR", conflicts_with = "output")]
    download_dir: Option<PathBuf>,

    /// Directory holding storage.json (default: the user config directory)
    #[arg(long, value_name = "DIR")]
    settings_dir: Option<PathBuf>,

    /// HTTP timeout in seconds
    #[arg(long, default_value = "30", value_name = "SECS")]
    timeout: u64,

    /// Custom User-Agent for HTTP requests
    #[arg(long, value_name = "UA")]
    user_agent: Option<String>,

    /// Print the extraction result as JSON instead of delivering Markdown
    #[arg(long)]
    json: bool,

    /// Report the estimated token count
    #[arg(long)]
    tokens: bool,

    /// Merge domain selectors from a JSON file
    #[arg(long, value_name = "FILE")]
    import_selectors: Option<PathBuf>,

    /// Print the saved domain selectors as JSON
    #[arg(long)]
    export_selectors: bool,

    /// Save --selector as the domain selector for the page's domain
    #[arg(long, requires = "selector")]
    save_selector: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn fetch_config(&self) -> FetchConfig {
        let mut config = FetchConfig { timeout: self.timeout, ..Default::default() };
        if let Some(user_agent) = &self.user_agent {
            config.user_agent = user_agent.clone();
        }
        config
    }

    fn strip_links_override(&self) -> Option<bool> {
        match (self.strip_links, self.keep_links) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }
}

fn init_logging(verbose: bool) {
    let rust_log = std::env::var("RUST_LOG").ok();
    if verbose || rust_log.is_some() {
        let filter = match rust_log.as_deref() {
            Some(env) if verbose && !env.is_empty() => EnvFilter::new(format!("{env},mdyoink_core=debug")),
            _ if verbose => EnvFilter::new("mdyoink_core=debug"),
            _ => EnvFilter::from_default_env(),
        };
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr))
            .with(filter)
            .init();
    }
}

fn is_http(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// The URL the page is reported under: `--url`, the fetched URL, or a
/// `file://` URL for local files.
fn page_url(args: &Args, input: &str) -> String {
    if let Some(url) = &args.url {
        return url.clone();
    }
    if is_http(input) {
        return input.to_string();
    }
    if input == "-" {
        return String::new();
    }
    fs::canonicalize(input)
        .ok()
        .and_then(|path| Url::from_file_path(path).ok())
        .map(String::from)
        .unwrap_or_default()
}

fn read_selection(path: &Path) -> anyhow::Result<Selection> {
    let html = fs::read_to_string(path).with_context(|| format!("Failed to read selection: {}", path.display()))?;
    let text = Document::parse(&html)
        .context("Failed to parse selection HTML")?
        .text_content()
        .trim()
        .to_string();
    Ok(Selection::new(html.trim(), text))
}

async fn read_input(args: &Args, input: &str) -> anyhow::Result<String> {
    if input == "-" {
        if args.verbose {
            print_step(1, 4, "Reading from stdin");
        }
        fetch_stdin().context("Failed to read from stdin")
    } else if is_http(input) {
        if args.verbose {
            print_step(1, 4, &format!("Fetching from {}", input.bright_white().underline()));
        }
        fetch_url(input, &args.fetch_config()).await.context("Failed to fetch URL")
    } else {
        if args.verbose {
            print_step(1, 4, &format!("Reading from file {}", input.bright_white()));
        }
        fetch_file(input).with_context(|| format!("Failed to read file: {}", input))
    }
}

fn manage_selectors(args: &Args, store: &SettingsStore) -> anyhow::Result<()> {
    if let Some(path) = &args.import_selectors {
        let json = fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path.display()))?;
        let count = store.import_selectors(&json).context("Failed to import selectors")?;
        print_success(&format!("Imported {} selector(s) into {}", count, store.path().display()));
    }
    if args.export_selectors {
        println!("{}", store.export_selectors().context("Failed to export selectors")?);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    if args.verbose {
        print_banner();
        print_info("Debug logging enabled");
        eprintln!();
    }

    let store = match &args.settings_dir {
        Some(dir) => SettingsStore::new(dir),
        None => SettingsStore::open_default().context("Failed to locate the settings directory")?,
    };

    manage_selectors(&args, &store)?;
    let Some(input) = args.input.as_deref() else {
        return Ok(());
    };

    let settings = store.load_settings().context("Failed to load settings")?;

    let started = Instant::now();
    let html = read_input(&args, input).await?;
    let read_time = started.elapsed();

    if args.verbose {
        eprintln!("  {} {}", "Size:".dimmed(), format_size(html.len()).bright_white());
        eprintln!();
        print_step(2, 4, "Parsing HTML document");
    }

    let document = Document::parse(&html).context("Failed to parse HTML")?;
    let mut page = Page::new(document, page_url(&args, input));
    if let Some(path) = &args.selection {
        page = page.with_selection(read_selection(path)?);
    }
    let domain = page.domain();

    if args.save_selector
        && let Some(selector) = &args.selector
    {
        if domain.is_empty() {
            print_warning("No domain to save the selector for; pass --url");
        } else {
            store.set_selector(&domain, selector).context("Failed to save selector")?;
            print_success(&format!("Saved selector {} for {}", selector.bright_white(), domain.bright_white()));
        }
    }

    let domain_selector = match &args.selector {
        Some(selector) => Some(selector.clone()),
        None if domain.is_empty() => None,
        None => store.selector_for(&domain).context("Failed to read domain selectors")?,
    };

    let request = ExtractRequest {
        return_markdown: true,
        markdown: settings.markdown.clone(),
        domain_selector,
        test_selector: args.test_selector.clone(),
        scope: args.scope,
    };

    let pipeline = Pipeline::builder()
        .transcripts(TranscriptExtractor::new(Arc::new(HttpFetcher::new(args.fetch_config()))))
        .build();

    if args.verbose {
        print_step(3, 4, "Extracting content");
    }

    let started = Instant::now();
    let result = match pipeline.run(&page, &request).await {
        Extraction::SelectorTest(report) => {
            println!("{}", serde_json::to_string_pretty(&report).context("Failed to serialize report")?);
            return Ok(());
        }
        Extraction::Content(result) => *result,
    };
    let extract_time = started.elapsed();

    if args.verbose {
        print_extraction_details(&result);
        print_timing("Read", read_time);
        print_timing("Extract", extract_time);
        eprintln!();
    }

    if result.selector_failed == Some(true) {
        print_warning("Selector unavailable, used the readability heuristic instead");
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result).context("Failed to serialize result")?);
        return Ok(());
    }

    let mode = args.mode.as_deref().map_or(settings.output_mode, OutputMode::parse_lenient);
    let delivery = match process(&result, mode, &settings, args.strip_links_override(), &chrono::Local::now()) {
        Processed::Delivery(delivery) => delivery,
        Processed::Undeliverable { error } => bail!("Extraction failed: {}", error),
    };

    if args.verbose {
        print_step(4, 4, &format!("Delivering as {}", mode.as_str().bright_white()));
    }

    if args.tokens || (args.verbose && settings.token_counter.show) {
        let budget = token_budget(&delivery.markdown, &settings.token_counter.model);
        print_token_budget(&settings.token_counter.model, &budget);
    }

    let target = match (&args.output, &args.download_dir) {
        (Some(path), _) => Some(path.clone()),
        (None, Some(dir)) => Some(dir.join(download_filename(&delivery.title, &settings))),
        (None, None) => None,
    };

    match target {
        Some(path) => {
            fs::write(&path, &delivery.markdown)
                .with_context(|| format!("Failed to write to file: {}", path.display()))?;
            print_success(&format!("Output written to {}", path.display().bright_white()));
        }
        None => println!("{}", delivery.markdown),
    }

    Ok(())
}
