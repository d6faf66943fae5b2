//! Turning a request's `text` or `url` into a plain-text payload.

use regex::Regex;
use reqwest::header::USER_AGENT;
use reqwest::Client;
use std::sync::LazyLock;
use std::time::Duration;
use url::Url;

use crate::{Error, GatewayConfig, ProcessingRequest, ResolvedContent};

/// Hard cap on characters of page text passed downstream.
pub const MAX_CONTENT_CHARS: usize = 8000;

/// Appended to page text cut at [`MAX_CONTENT_CHARS`].
pub const TRUNCATION_MARKER: &str = "... [Content truncated]";

/// Sites commonly refuse default HTTP client signatures.
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

static SCRIPT_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script[^>]*>.*?</script>").expect("valid script pattern"));
static STYLE_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<style[^>]*>.*?</style>").expect("valid style pattern"));
static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid tag pattern"));
static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace pattern"));

/// Resolves requests into [`ResolvedContent`], fetching pages when needed.
#[derive(Debug, Clone)]
pub struct ContentResolver {
    client: Client,
    fetch_timeout: Duration,
}

impl ContentResolver {
    pub fn new(fetch_timeout: Duration) -> Result<Self, Error> {
        let client = Client::builder()
            .build()
            .map_err(|e| Error::config(format!("failed to build fetch client: {e}")))?;

        Ok(Self {
            client,
            fetch_timeout,
        })
    }

    pub fn from_config(config: &GatewayConfig) -> Result<Self, Error> {
        Self::new(config.fetch_timeout)
    }

    /// Produce the content to process. A non-empty `url` wins over `text`.
    pub async fn resolve(&self, request: &ProcessingRequest) -> Result<ResolvedContent, Error> {
        if let Some(raw_url) = request.url.as_deref().filter(|u| !u.is_empty()) {
            let body = self.fetch_page_text(raw_url).await?;
            if body.is_empty() {
                return Err(Error::invalid_input(format!(
                    "No extractable text found at URL '{raw_url}'"
                )));
            }
            return Ok(ResolvedContent::from_url(raw_url, body));
        }

        if let Some(text) = request.text.as_deref().filter(|t| !t.is_empty()) {
            return Ok(ResolvedContent::from_text(text));
        }

        Err(Error::invalid_input(
            "Either 'text' or 'url' must be provided for processing.",
        ))
    }

    /// Fetch a page and reduce it to sanitized, length-capped text.
    pub async fn fetch_page_text(&self, raw_url: &str) -> Result<String, Error> {
        let url = normalize_url(raw_url)?;
        tracing::debug!(%url, "fetching page content");

        let fetch_failed = |status: Option<u16>, message: String| Error::FetchFailed {
            url: url.to_string(),
            status,
            message,
        };

        let response = self
            .client
            .get(url.clone())
            .header(USER_AGENT, BROWSER_USER_AGENT)
            .timeout(self.fetch_timeout)
            .send()
            .await
            .map_err(|e| fetch_failed(None, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(%url, %status, "page fetch returned non-success status");
            return Err(fetch_failed(Some(status.as_u16()), status.to_string()));
        }

        let html = response
            .text()
            .await
            .map_err(|e| fetch_failed(Some(status.as_u16()), e.to_string()))?;

        let text = truncate_content(&sanitize_html(&html));
        tracing::debug!(%url, html_bytes = html.len(), text_chars = text.chars().count(), "page content extracted");

        Ok(text)
    }
}

/// Validate a caller-supplied URL, defaulting to `https://` when it has no
/// scheme at all.
pub fn normalize_url(raw: &str) -> Result<Url, Error> {
    let raw = raw.trim();
    let candidate = if has_scheme(raw) {
        raw.to_string()
    } else {
        format!("https://{raw}")
    };

    let url = Url::parse(&candidate)
        .map_err(|e| Error::invalid_input(format!("Invalid URL format '{raw}': {e}")))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(Error::invalid_input(format!(
            "Invalid URL format '{raw}': unsupported scheme '{}'",
            url.scheme()
        )));
    }

    if url.host_str().is_none_or(str::is_empty) {
        return Err(Error::invalid_input(format!(
            "Invalid URL format '{raw}': missing host"
        )));
    }

    Ok(url)
}

/// A `://` only marks a scheme when no path, query or fragment starts before it.
fn has_scheme(raw: &str) -> bool {
    raw.find("://")
        .is_some_and(|at| !raw[..at].contains(['/', '?', '#']))
}

/// Reduce HTML to its visible text.
///
/// Script and style blocks go first, then every remaining tag. Removal
/// repeats until nothing changes, so markup that only forms once inner tags
/// are gone is removed too and the result is stable under reapplication.
pub fn sanitize_html(html: &str) -> String {
    let mut text = html.to_string();

    loop {
        let stripped = {
            let without_scripts = SCRIPT_BLOCK.replace_all(&text, "");
            let without_styles = STYLE_BLOCK.replace_all(&without_scripts, "");
            TAG.replace_all(&without_styles, "").into_owned()
        };

        if stripped == text {
            break;
        }
        text = stripped;
    }

    WHITESPACE.replace_all(&text, " ").trim().to_string()
}

/// Cap text at [`MAX_CONTENT_CHARS`] characters, marking the cut.
pub fn truncate_content(text: &str) -> String {
    match text.char_indices().nth(MAX_CONTENT_CHARS) {
        Some((cut, _)) => format!("{}{TRUNCATION_MARKER}", &text[..cut]),
        None => text.to_string(),
    }
}
