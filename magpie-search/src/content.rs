//! HTML content extraction and summarisation.
//!
//! Backs the page-summary and page-content endpoints: fetch a page, strip
//! boilerplate elements, pull the readable text out of the main content
//! area, and optionally condense it to a short extractive summary.

use scraper::{ElementRef, Html, Selector};

use crate::error::{Result, SearchError};
use crate::types::PageContent;

/// Default maximum characters returned from extracted content.
pub const DEFAULT_MAX_CHARS: usize = 100_000;

/// Paragraph budget for extractive summaries.
const SUMMARY_PARAGRAPHS: usize = 5;
/// Hard cap on summary length, in characters (ellipsis included).
const SUMMARY_MAX_CHARS: usize = 1000;
/// Below this length the summary is padded with heading text.
const SUMMARY_MIN_CHARS: usize = 200;

/// Elements whose content never belongs in extracted text.
const BOILERPLATE_TAGS: &[&str] = &[
    "script", "style", "nav", "footer", "header", "aside", "noscript", "svg", "iframe",
];

/// A short extractive page summary.
#[derive(Debug, Clone, PartialEq)]
pub struct PageSummary {
    /// Page title from `<title>`, if present.
    pub title: Option<String>,
    /// First paragraphs of the main content, length-capped; may be empty
    /// for pages with no paragraph text at all.
    pub summary: String,
}

/// Fetch a page over HTTP and return its body.
///
/// # Errors
///
/// Returns [`SearchError::Http`] on transport failure or a non-success
/// status.
pub async fn fetch_html(client: &reqwest::Client, url: &str) -> Result<String> {
    tracing::trace!(url, "fetching page");
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| SearchError::Http(format!("page fetch failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(SearchError::Http(format!("page fetch returned {status}")));
    }

    response
        .text()
        .await
        .map_err(|e| SearchError::Http(format!("page body read failed: {e}")))
}

/// Extract readable text content from raw HTML.
///
/// Strips boilerplate, finds the main content area, collapses whitespace
/// and caps the text at [`DEFAULT_MAX_CHARS`].
///
/// # Errors
///
/// Returns [`SearchError::Parse`] if no extractable content is found.
pub fn extract_content(html: &str) -> Result<PageContent> {
    extract_content_with_limit(html, DEFAULT_MAX_CHARS)
}

/// Same as [`extract_content`] with a custom character limit.
///
/// # Errors
///
/// Returns [`SearchError::Parse`] if no extractable content is found.
pub fn extract_content_with_limit(html: &str, max_chars: usize) -> Result<PageContent> {
    let cleaned = remove_boilerplate(html);
    let document = Html::parse_document(&cleaned);

    let title = extract_title(&document);
    let text = collapse_whitespace(&extract_main_text(&document));
    if text.is_empty() {
        return Err(SearchError::Parse("no extractable content found".into()));
    }

    let (clipped, truncated) = clip_text(&text, max_chars);
    let word_count = clipped.split_whitespace().count();
    let text = if truncated {
        format!("{clipped}\n\n[Content truncated]")
    } else {
        clipped
    };

    Ok(PageContent {
        title,
        text,
        word_count,
        truncated,
    })
}

/// Condense a page into a short extractive summary.
///
/// Joins the first few paragraphs of the main content area (falling back
/// to all paragraphs), caps the result at [`SUMMARY_MAX_CHARS`], and pads
/// thin summaries with `h1`–`h3` heading text. Total: a page without any
/// paragraph or heading text yields an empty summary, not an error.
#[must_use]
pub fn summarize(html: &str) -> PageSummary {
    let cleaned = remove_boilerplate(html);
    let document = Html::parse_document(&cleaned);

    let title = extract_title(&document);
    let paragraphs = collect_paragraphs(&document);

    let mut summary = collapse_whitespace(
        &paragraphs
            .iter()
            .take(SUMMARY_PARAGRAPHS)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" "),
    );

    if summary.chars().count() > SUMMARY_MAX_CHARS {
        summary = summary.chars().take(SUMMARY_MAX_CHARS - 3).collect();
        summary.push_str("...");
    }

    if summary.chars().count() < SUMMARY_MIN_CHARS {
        if let Ok(selector) = Selector::parse("h1, h2, h3") {
            let mut parts = non_empty_texts(document.select(&selector));
            if !parts.is_empty() {
                parts.push(summary);
                summary = parts.join(" ").trim().to_owned();
            }
        }
    }

    PageSummary { title, summary }
}

/// Extract the page title from the `<title>` element.
fn extract_title(document: &Html) -> Option<String> {
    let selector = Selector::parse("title").ok()?;
    let title = document
        .select(&selector)
        .next()?
        .text()
        .collect::<String>();
    let trimmed = title.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

/// Extract text from the main content area of the document.
///
/// Tries content-specific selectors in priority order, falling back to
/// `<body>`.
fn extract_main_text(document: &Html) -> String {
    for selector_str in ["article", "main", "[role=\"main\"]", "body"] {
        let Ok(selector) = Selector::parse(selector_str) else {
            continue;
        };
        if let Some(element) = document.select(&selector).next() {
            let text: String = element.text().collect::<Vec<_>>().join(" ");
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                return trimmed.to_owned();
            }
        }
    }
    String::new()
}

/// Collect trimmed, non-empty paragraph texts, scoped to the first main
/// content container that yields anything, else the whole document.
fn collect_paragraphs(document: &Html) -> Vec<String> {
    let Ok(paragraph) = Selector::parse("p") else {
        return Vec::new();
    };

    for container in ["main", "article", "#content", ".content"] {
        let Ok(selector) = Selector::parse(container) else {
            continue;
        };
        if let Some(element) = document.select(&selector).next() {
            let texts = non_empty_texts(element.select(&paragraph));
            if !texts.is_empty() {
                return texts;
            }
        }
    }

    non_empty_texts(document.select(&paragraph))
}

fn non_empty_texts<'a>(elements: impl Iterator<Item = ElementRef<'a>>) -> Vec<String> {
    elements
        .map(|el| el.text().collect::<String>().trim().to_owned())
        .filter(|text| !text.is_empty())
        .collect()
}

/// Remove boilerplate elements and their content before parsing.
fn remove_boilerplate(html: &str) -> String {
    let mut result = html.to_owned();
    for tag in BOILERPLATE_TAGS {
        result = remove_element(&result, tag);
    }
    result
}

/// Remove all instances of one HTML element, content included.
fn remove_element(html: &str, tag: &str) -> String {
    let lower = html.to_lowercase();
    let open = format!("<{tag}");
    let close = format!("</{tag}>");

    let mut out = String::with_capacity(html.len());
    let mut pos = 0;

    while let Some(offset) = lower[pos..].find(&open) {
        let start = pos + offset;
        let name_end = start + open.len();

        // "<nav" must not swallow "<navigate ...>".
        let boundary = lower.as_bytes().get(name_end).copied();
        let is_element = matches!(
            boundary,
            None | Some(b' ' | b'>' | b'/' | b'\n' | b'\r' | b'\t')
        );
        if !is_element {
            out.push_str(&html[pos..name_end]);
            pos = name_end;
            continue;
        }

        out.push_str(&html[pos..start]);
        pos = match lower[start..].find(&close) {
            Some(close_offset) => start + close_offset + close.len(),
            // Unclosed element: drop just the opening tag.
            None => match lower[start..].find('>') {
                Some(gt) => start + gt + 1,
                None => html.len(),
            },
        };
    }

    out.push_str(&html[pos..]);
    out
}

/// Collapse runs of spaces to one and runs of 3+ newlines to 2.
fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;
    let mut newlines: u32 = 0;

    for ch in text.chars() {
        match ch {
            '\n' | '\r' => {
                newlines += 1;
                pending_space = false;
                if newlines <= 2 {
                    out.push('\n');
                }
            }
            c if c.is_whitespace() => {
                newlines = 0;
                if !pending_space {
                    out.push(' ');
                    pending_space = true;
                }
            }
            c => {
                newlines = 0;
                pending_space = false;
                out.push(c);
            }
        }
    }

    out.lines()
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_owned()
}

/// Cut text at the limit on a char boundary; returns whether a cut happened.
fn clip_text(text: &str, max_chars: usize) -> (String, bool) {
    if text.len() <= max_chars {
        return (text.to_owned(), false);
    }
    let mut end = max_chars;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    (text[..end].to_owned(), true)
}
