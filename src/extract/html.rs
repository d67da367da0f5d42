//! HTML page loading: title, plain-text content, and URL reconstruction.
use std::fs;
use std::path::Path;

use scraper::{ElementRef, Html, Selector};

use super::{DocType, ExtractError};

/// One documentation page read from disk, before structured extraction.
#[derive(Debug, Clone)]
pub struct PageSource {
    pub url: String,
    pub title: String,
    /// Plain text of the main content region, scripts and styles removed.
    pub text: String,
    pub html: String,
    pub doc_type: DocType,
    /// Code snippets found in `<pre>` and `<code>` blocks, in source order.
    pub code_blocks: Vec<String>,
}

/// Read and parse one HTML file from the documentation tree.
///
/// Fails only when the page has neither an `<h1>` nor a `<title>` element;
/// every other missing field degrades to a best-effort value.
pub fn read_page(docs_root: &Path, path: &Path) -> Result<PageSource, ExtractError> {
    let html = fs::read_to_string(path)?;
    let doc_type = DocType::classify(path.strip_prefix(docs_root).unwrap_or(path));

    let document = Html::parse_document(&html);

    let title = page_title(&document).ok_or(ExtractError::MissingTitle)?;
    let text = content_text(&document);
    let code_blocks = code_blocks(&document);
    let url = page_url(docs_root, path);

    Ok(PageSource {
        url,
        title,
        text,
        html,
        doc_type,
        code_blocks,
    })
}

/// Title from the first `<h1>`, falling back to `<title>`.
pub(crate) fn page_title(document: &Html) -> Option<String> {
    let h1 = Selector::parse("h1").expect("valid selector");
    let title = Selector::parse("title").expect("valid selector");

    document
        .select(&h1)
        .chain(document.select(&title))
        .map(element_text)
        .find(|t| !t.is_empty())
}

/// Plain text of the main content region.
///
/// Prefers the documentation content div, then `<main>`, then `<body>`.
pub(crate) fn content_text(document: &Html) -> String {
    let candidates = Selector::parse("div.content, div.main-content, main, body")
        .expect("valid selector");

    match document.select(&candidates).next() {
        Some(el) => element_text(el),
        None => String::new(),
    }
}

/// Code snippets from `<pre>` blocks plus `<code>` elements that stand on
/// their own. A `<code>` nested inside a `<pre>` is already covered by the
/// enclosing block and is not collected twice. Fragments shorter than 10
/// characters are inline identifier mentions, not examples.
pub(crate) fn code_blocks(document: &Html) -> Vec<String> {
    let pre = Selector::parse("pre").expect("valid selector");
    let code = Selector::parse("code").expect("valid selector");

    let mut blocks = Vec::new();
    for el in document.select(&pre) {
        push_snippet(&mut blocks, el);
    }
    for el in document.select(&code) {
        let inside_pre = el
            .ancestors()
            .filter_map(ElementRef::wrap)
            .any(|a| a.value().name() == "pre");
        if !inside_pre {
            push_snippet(&mut blocks, el);
        }
    }
    blocks
}

fn push_snippet(blocks: &mut Vec<String>, el: ElementRef<'_>) {
    let snippet = el.text().collect::<String>().trim().to_string();
    if snippet.len() >= 10 {
        blocks.push(snippet);
    }
}

/// Collect text nodes below an element, skipping script and style subtrees.
fn element_text(el: ElementRef<'_>) -> String {
    let mut parts = Vec::new();
    collect_text(el, &mut parts);
    parts.join("\n")
}

fn collect_text(el: ElementRef<'_>, out: &mut Vec<String>) {
    for child in el.children() {
        if let Some(child_el) = ElementRef::wrap(child) {
            let name = child_el.value().name();
            if name == "script" || name == "style" {
                continue;
            }
            collect_text(child_el, out);
        } else if let Some(text) = child.value().as_text() {
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                out.push(trimmed.to_string());
            }
        }
    }
}

/// Reconstruct a stable page URL from the file's location in the tree.
fn page_url(docs_root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(docs_root).unwrap_or(path);
    let posix: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    format!("file:///{}", posix.join("/"))
}
