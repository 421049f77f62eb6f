//! Markdown subset to HTML for the rich-text export.
//!
//! Only what drafted proposals use: `#`/`##`/`###` headings, `**bold**`,
//! `*italic*` and `* ` bullet lines. Text is escaped before any markup is
//! produced, so model output can never inject tags.

use once_cell::sync::Lazy;
use regex::Regex;

static H1: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^# (.*)$").expect("invalid H1 regex"));
static H2: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^## (.*)$").expect("invalid H2 regex"));
static H3: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^### (.*)$").expect("invalid H3 regex"));
static BOLD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\*\*(.*?)\*\*").expect("invalid BOLD regex"));
static BULLET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]*\* (.*)$").expect("invalid BULLET regex"));
static ITALIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*(.*?)\*").expect("invalid ITALIC regex"));

/// Escape the five HTML-significant characters.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Convert proposal markdown to an HTML fragment.
pub fn markdown_to_html(markdown: &str) -> String {
    if markdown.is_empty() {
        return String::new();
    }

    let html = escape_html(&markdown.replace("\r\n", "\n"));
    let html = H1.replace_all(&html, "<h1>$1</h1>");
    let html = H2.replace_all(&html, "<h2>$1</h2>");
    let html = H3.replace_all(&html, "<h3>$1</h3>");
    let html = BOLD.replace_all(&html, "<strong>$1</strong>");
    // Bullets before italics, or "* a *b*" would open an <em> at the marker
    let html = BULLET.replace_all(&html, "<li>$1</li>");
    let html = ITALIC.replace_all(&html, "<em>$1</em>");
    html.replace('\n', "<br />")
}

/// Standalone HTML page wrapping [`markdown_to_html`].
pub fn html_document(title: &str, markdown: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\" />\n<title>{}</title>\n</head>\n<body>\n{}\n</body>\n</html>\n",
        escape_html(title),
        markdown_to_html(markdown)
    )
}
