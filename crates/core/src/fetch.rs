//! Content fetching from URLs, files, and stdin.
//!
//! Page input for offline hosts, plus [`HttpFetcher`], the network-backed
//! [`TranscriptFetcher`] used for caption tracks.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;
use url::Url;

use crate::transcript::TranscriptFetcher;
use crate::{Result, YoinkError};

/// HTTP client configuration.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Request timeout in seconds.
    pub timeout: u64,
    /// Custom User-Agent string.
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: 30,
            user_agent: "Mozilla/5.0 (compatible; mdyoink/0.3; +https://github.com/mdyoink/mdyoink)".to_string(),
        }
    }
}

impl FetchConfig {
    fn client(&self) -> Result<Client> {
        Client::builder()
            .timeout(Duration::from_secs(self.timeout))
            .user_agent(&self.user_agent)
            .build()
            .map_err(YoinkError::HttpError)
    }

    fn map_send_error(&self, e: reqwest::Error) -> YoinkError {
        if e.is_timeout() { YoinkError::Timeout { timeout: self.timeout } } else { YoinkError::HttpError(e) }
    }
}

/// Fetches a page over HTTP.
///
/// Follows redirects and sends browser-like `Accept` headers. Unlike caption
/// fetching, a non-success status still returns the body: error pages are
/// pages too.
pub async fn fetch_url(url: &str, config: &FetchConfig) -> Result<String> {
    let parsed_url = parse_http_url(url)?;
    let client = config.client()?;

    let response = client
        .get(parsed_url)
        .header("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8")
        .header("Accept-Language", "en-US,en;q=0.9")
        .send()
        .await
        .map_err(|e| config.map_send_error(e))?;

    debug!(status = response.status().as_u16(), url, "fetched page");
    Ok(response.text().await?)
}

fn parse_http_url(url: &str) -> Result<Url> {
    let parsed = Url::parse(url).map_err(|e| YoinkError::InvalidUrl(e.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(YoinkError::InvalidUrl(format!("unsupported scheme: {other}"))),
    }
}

/// Reads HTML content from a local file.
pub fn fetch_file(path: &str) -> Result<String> {
    let path_buf = PathBuf::from(path);

    if !path_buf.exists() {
        Err(YoinkError::FileNotFound(path_buf))
    } else {
        fs::read_to_string(&path_buf).map_err(YoinkError::from)
    }
}

/// Reads HTML content from standard input until EOF.
pub fn fetch_stdin() -> Result<String> {
    use std::io::{self, Read};

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;

    Ok(buffer)
}

/// Caption-track fetcher over reqwest.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    config: FetchConfig,
}

impl HttpFetcher {
    pub fn new(config: FetchConfig) -> Self {
        Self { config }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new(FetchConfig::default())
    }
}

#[async_trait]
impl TranscriptFetcher for HttpFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String> {
        let parsed_url = parse_http_url(url)?;
        let client = self.config.client()?;

        let response = client.get(parsed_url).send().await.map_err(|e| self.config.map_send_error(e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(YoinkError::HttpStatus { status: status.as_u16() });
        }

        Ok(response.text().await?)
    }
}
