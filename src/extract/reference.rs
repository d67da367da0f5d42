//! Structured extraction from Script Reference pages.
//!
//! Turns one API reference page into a class record with its methods,
//! properties, and constructors. Parsing is tolerant: a field that cannot
//! be located yields `None`, and a malformed member signature skips that
//! member only.
use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use super::html::PageSource;
use super::signature::parse_signature;

/// A class extracted from one Script Reference page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedClass {
    pub name: String,
    pub namespace: Option<String>,
    pub description: Option<String>,
    /// Bare parent class name. Weak reference: the target may not be indexed.
    pub inherits_from: Option<String>,
    pub is_static: bool,
    pub methods: Vec<ExtractedMethod>,
    pub properties: Vec<ExtractedProperty>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedMethod {
    pub name: String,
    /// `None` for constructors.
    pub return_type: Option<String>,
    pub is_static: bool,
    pub description: Option<String>,
    pub signature: String,
    pub parameters: Vec<ExtractedParameter>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedParameter {
    pub name: String,
    pub param_type: Option<String>,
    pub description: Option<String>,
    pub position: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedProperty {
    pub name: String,
    pub property_type: Option<String>,
    pub is_static: bool,
    pub description: Option<String>,
}

static CLASS_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\w+(?:\.\w+)*)").expect("valid regex"));
static INHERITS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)inherits\s+from:?\s*([A-Za-z_][A-Za-z0-9_.]*)").expect("valid regex")
});
static METHODS_HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(public|static)\s+methods?$").expect("valid regex"));
static PROPERTIES_HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(public|static)\s+properties$").expect("valid regex"));
static CTOR_HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^constructors?$").expect("valid regex"));

/// Extract the structured class record from a Script Reference page.
///
/// Returns `None` when the title does not carry a class name. Member
/// tables that are missing or empty produce empty vectors, never errors.
#[must_use]
pub fn extract_class(page: &PageSource) -> Option<ExtractedClass> {
    let caps = CLASS_NAME_RE.captures(page.title.trim())?;
    let full_name = caps.get(1)?.as_str();

    let (namespace, name) = match full_name.rsplit_once('.') {
        Some((ns, cls)) => (Some(ns.to_string()), cls.to_string()),
        None => (None, full_name.to_string()),
    };

    let document = Html::parse_document(&page.html);

    let description = class_description(&document);
    let inherits_from = inherits_from(&document);
    let is_static = page.title.to_lowercase().contains("static")
        || description
            .as_deref()
            .is_some_and(|d| d.to_lowercase().contains("static class"));

    let mut methods = member_methods(&document, &METHODS_HEADING_RE, false);
    methods.extend(member_methods(&document, &CTOR_HEADING_RE, true));
    let properties = member_properties(&document);

    Some(ExtractedClass {
        name,
        namespace,
        description,
        inherits_from,
        is_static,
        methods,
        properties,
    })
}

fn class_description(document: &Html) -> Option<String> {
    let selector = Selector::parse("div.description, div.subsection").expect("valid selector");
    document
        .select(&selector)
        .map(flat_text)
        .find(|t| !t.is_empty())
}

/// Resolve the "Inherits from" label to a bare parent class name.
///
/// Prefers the first anchor inside the labelled element; falls back to a
/// regex over the element text. No existence check is performed.
fn inherits_from(document: &Html) -> Option<String> {
    let blocks = Selector::parse("p, div").expect("valid selector");
    let anchor = Selector::parse("a").expect("valid selector");

    // Innermost labelled element wins: ancestors wrapping the whole page
    // also contain the label text, but precede it in document order.
    let block = document
        .select(&blocks)
        .filter(|b| flat_text(*b).to_lowercase().contains("inherits from"))
        .last()?;

    if let Some(link) = block.select(&anchor).next() {
        let name = flat_text(link);
        if !name.is_empty() {
            return Some(name);
        }
    }
    INHERITS_RE
        .captures(&flat_text(block))
        .map(|caps| caps[1].to_string())
}

fn member_methods(document: &Html, heading_re: &Regex, constructors: bool) -> Vec<ExtractedMethod> {
    let mut methods = Vec::new();

    for (heading_text, table) in member_tables(document, heading_re) {
        let section_static = heading_text.to_lowercase().contains("static");

        for (signature_text, description) in table_rows(table) {
            let parsed = match parse_signature(&signature_text) {
                Ok(p) => p,
                Err(e) => {
                    tracing::warn!("Skipping method entry: {e}");
                    continue;
                }
            };

            let parameters = parsed
                .parameters
                .into_iter()
                .enumerate()
                .map(|(position, (name, param_type))| ExtractedParameter {
                    name,
                    param_type,
                    description: None,
                    position,
                })
                .collect();

            methods.push(ExtractedMethod {
                name: parsed.name,
                return_type: if constructors { None } else { parsed.return_type },
                is_static: section_static || parsed.is_static,
                description,
                signature: signature_text,
                parameters,
            });
        }
    }

    methods
}

fn member_properties(document: &Html) -> Vec<ExtractedProperty> {
    let mut properties = Vec::new();

    for (heading_text, table) in member_tables(document, &PROPERTIES_HEADING_RE) {
        let section_static = heading_text.to_lowercase().contains("static");

        for (signature_text, description) in table_rows(table) {
            let parsed = match parse_signature(&signature_text) {
                Ok(p) => p,
                Err(e) => {
                    tracing::warn!("Skipping property entry: {e}");
                    continue;
                }
            };

            properties.push(ExtractedProperty {
                name: parsed.name,
                property_type: parsed.return_type,
                is_static: section_static || parsed.is_static,
                description,
            });
        }
    }

    properties
}

/// Headings matching `heading_re` paired with the first table that follows.
fn member_tables<'a>(
    document: &'a Html,
    heading_re: &Regex,
) -> Vec<(String, ElementRef<'a>)> {
    let headings = Selector::parse("h2, h3").expect("valid selector");

    document
        .select(&headings)
        .filter_map(|h| {
            let text = flat_text(h);
            if !heading_re.is_match(&text) {
                return None;
            }
            following_table(h).map(|table| (text, table))
        })
        .collect()
}

/// First `<table>` sibling after a heading.
fn following_table(heading: ElementRef<'_>) -> Option<ElementRef<'_>> {
    heading
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "table")
}

/// (signature, description) pairs from a member table, source order preserved.
fn table_rows(table: ElementRef<'_>) -> Vec<(String, Option<String>)> {
    let tr = Selector::parse("tr").expect("valid selector");
    let td = Selector::parse("td").expect("valid selector");

    let mut rows = Vec::new();
    for row in table.select(&tr) {
        let cells: Vec<ElementRef<'_>> = row.select(&td).collect();
        // Header rows use <th> and yield no <td> cells
        if cells.is_empty() {
            continue;
        }
        let signature = flat_text(cells[0]);
        if signature.is_empty() {
            continue;
        }
        let description = cells
            .get(1)
            .map(|c| flat_text(*c))
            .filter(|d| !d.is_empty());
        rows.push((signature, description));
    }
    rows
}

/// Joined, whitespace-normalized text of an element.
fn flat_text(el: ElementRef<'_>) -> String {
    el.text()
        .flat_map(|t| t.split_whitespace())
        .collect::<Vec<_>>()
        .join(" ")
}
