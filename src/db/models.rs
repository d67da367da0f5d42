//! Row types returned by the documentation store.
use serde::Serialize;

/// A documentation page as stored, without its chunks.
#[derive(Debug, Clone, Serialize)]
pub struct Page {
    pub id: i64,
    pub url: String,
    pub title: String,
    pub doc_type: String,
    pub content: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Input chunk for insertion, borrowed from the extraction pipeline.
#[derive(Debug, Clone, Copy)]
pub struct ChunkInput<'a> {
    pub position: usize,
    pub content: &'a str,
}

/// Class row joined with its page URL, used in listings.
#[derive(Debug, Clone, Serialize)]
pub struct ClassSummary {
    pub id: i64,
    pub name: String,
    pub namespace: Option<String>,
    pub description: Option<String>,
    pub inherits_from: Option<String>,
    pub is_static: bool,
    pub page_url: String,
}

/// Full class record with its members.
#[derive(Debug, Clone, Serialize)]
pub struct ClassDetail {
    #[serde(flatten)]
    pub summary: ClassSummary,
    pub methods: Vec<MethodRecord>,
    pub properties: Vec<PropertyRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MethodRecord {
    pub id: i64,
    pub name: String,
    pub return_type: Option<String>,
    pub is_static: bool,
    pub description: Option<String>,
    pub signature: String,
    /// Set when the row comes from a cross-class search.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    pub parameters: Vec<ParameterRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ParameterRecord {
    pub name: String,
    pub param_type: Option<String>,
    pub description: Option<String>,
    pub position: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct PropertyRecord {
    pub id: i64,
    pub name: String,
    pub property_type: Option<String>,
    pub is_static: bool,
    pub description: Option<String>,
}

/// Row counts across the store.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct StoreStats {
    pub pages: usize,
    pub manual_pages: usize,
    pub script_reference_pages: usize,
    pub chunks: usize,
    pub classes: usize,
    pub methods: usize,
    pub properties: usize,
}
