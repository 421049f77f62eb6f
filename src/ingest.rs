//! Document ingestion: announcement text from a file, stdin, inline text or a URL.

use std::path::{Path, PathBuf};
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use tokio::io::AsyncReadExt;
use tracing::{debug, info};

/// Script and style blocks, contents included
static SCRIPT_OR_STYLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<(script|style|noscript)\b[^>]*>.*?</(script|style|noscript)\s*>")
        .expect("invalid SCRIPT_OR_STYLE regex")
});

static HTML_COMMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<!--.*?-->").expect("invalid HTML_COMMENT regex"));

/// Tags that end a line of text
static BLOCK_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<\s*(br|/p|/div|/li|/h[1-6]|/tr|/section|/article)\b[^>]*>")
        .expect("invalid BLOCK_TAG regex")
});

static ANY_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<[^>]*>").expect("invalid ANY_TAG regex"));

static NUMERIC_ENTITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&#(x[0-9a-fA-F]+|[0-9]+);").expect("invalid NUMERIC_ENTITY regex")
});

static INLINE_SPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[ \t\x0B\f\r]+").expect("invalid INLINE_SPACE regex"));

static BLANK_LINES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n\s*\n+").expect("invalid BLANK_LINES regex"));

/// Why no text could be obtained from a source
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct IngestionError(pub String);

impl IngestionError {
    fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Where the announcement text comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentSource {
    /// A text file; `-` reads stdin
    File(PathBuf),
    Text(String),
    Url(String),
}

impl DocumentSource {
    /// Short label for logs and session slugs
    pub fn label(&self) -> String {
        match self {
            DocumentSource::File(path) => path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "stdin".to_string()),
            DocumentSource::Text(text) => text.lines().next().unwrap_or_default().to_string(),
            DocumentSource::Url(url) => url.clone(),
        }
    }
}

/// Fetches and extracts document text
pub struct DocumentLoader {
    http: reqwest::Client,
}

impl DocumentLoader {
    pub fn new(timeout: Duration) -> Result<Self, IngestionError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("grant-forge/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| IngestionError::new(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { http })
    }

    /// Extracted, non-empty text for `source`.
    pub async fn load(&self, source: &DocumentSource) -> Result<String, IngestionError> {
        let text = match source {
            DocumentSource::File(path) => read_file(path).await?,
            DocumentSource::Text(text) => text.clone(),
            DocumentSource::Url(url) => self.fetch_url(url).await?,
        };

        let text = text.trim().to_string();
        if text.is_empty() {
            return Err(IngestionError::new(
                "Could not extract any text from the provided source.",
            ));
        }

        info!(source = %source.label(), chars = text.len(), "Document ingested");
        Ok(text)
    }

    async fn fetch_url(&self, url: &str) -> Result<String, IngestionError> {
        let parsed = reqwest::Url::parse(url)
            .map_err(|e| IngestionError::new(format!("Invalid URL '{}': {}", url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(IngestionError::new(format!(
                "Unsupported URL scheme '{}'. Use http or https.",
                parsed.scheme()
            )));
        }

        debug!(url = %parsed, "Fetching document");
        let response = self
            .http
            .get(parsed)
            .send()
            .await
            .map_err(|e| IngestionError::new(format!("Failed to fetch URL: {}", e.without_url())))?;

        let status = response.status();
        if status == reqwest::StatusCode::FORBIDDEN {
            return Err(IngestionError::new(
                "Failed to fetch URL (403 Forbidden). The website may be blocking automated access. Try copying and pasting the text instead.",
            ));
        }
        if !status.is_success() {
            return Err(IngestionError::new(format!(
                "Failed to fetch URL. Status: {}",
                status.as_u16()
            )));
        }

        let is_html = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_none_or(|ct| ct.contains("html"));

        let body = response
            .text()
            .await
            .map_err(|e| IngestionError::new(format!("Failed to read response body: {}", e)))?;

        Ok(if is_html { html_to_text(&body) } else { body })
    }
}

async fn read_file(path: &Path) -> Result<String, IngestionError> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        tokio::io::stdin()
            .read_to_string(&mut text)
            .await
            .map_err(|e| IngestionError::new(format!("Failed to read stdin: {}", e)))?;
        return Ok(text);
    }

    let is_pdf = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
    if is_pdf {
        return Err(IngestionError::new(
            "PDF files are not supported. Export the document as plain text (.txt or .md) and try again.",
        ));
    }

    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| IngestionError::new(format!("Failed to read {:?}: {}", path, e)))?;
    String::from_utf8(bytes)
        .map_err(|_| IngestionError::new(format!("{:?} is not a UTF-8 text file.", path)))
}

/// Visible text of an HTML page: scripts and styles dropped, tags stripped,
/// common entities decoded, whitespace normalized.
pub fn html_to_text(html: &str) -> String {
    let text = SCRIPT_OR_STYLE.replace_all(html, " ");
    let text = HTML_COMMENT.replace_all(&text, " ");
    let text = BLOCK_TAG.replace_all(&text, "\n");
    let text = ANY_TAG.replace_all(&text, " ");
    let text = decode_entities(&text);

    let text = INLINE_SPACE.replace_all(&text, " ");
    let text = BLANK_LINES.replace_all(&text, "\n\n");
    text.lines()
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

fn decode_entities(text: &str) -> String {
    let numeric = NUMERIC_ENTITY.replace_all(text, |caps: &regex::Captures| {
        let code = &caps[1];
        let value = match code.strip_prefix('x') {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => code.parse().ok(),
        };
        value
            .and_then(char::from_u32)
            .map(String::from)
            .unwrap_or_default()
    });

    // &amp; last so "&amp;lt;" decodes to "&lt;"
    numeric
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&rsquo;", "'")
        .replace("&lsquo;", "'")
        .replace("&rdquo;", "\"")
        .replace("&ldquo;", "\"")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&amp;", "&")
}
