//! MCP tool handlers.
//!
//! Implements 9 tools over the documentation store:
//! 1. search_docs            – vector similarity search over page chunks
//! 2. query_api_structure    – keyword search over classes and methods
//! 3. get_page               – fetch one page by URL
//! 4. get_full_documents     – semantic search returning whole pages
//! 5. get_related_documents  – class record, inheritance chain, neighbors
//! 6. get_method_signatures  – signatures for a class or one method name
//! 7. extract_code_examples  – code snippets from matching pages
//! 8. search_by_use_case     – goal-oriented search tuned by experience level
//! 9. get_stats              – store row counts and embedding setup

use crate::extract::DocType;
use crate::mcp::server::McpContext;
use rmcp::handler::server::ServerHandler;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::{ErrorData as McpError, handler::server::tool::ToolRouter, model::*, tool, tool_router};
use schemars::JsonSchema;
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Arc;

// ── Parameter structs ────────────────────────────────────────────────

#[derive(Deserialize, JsonSchema)]
struct SearchDocsParams {
    /// Search query (natural language)
    query: String,
    /// Max results (default: 5)
    top_k: Option<usize>,
    /// Restrict to a section: manual | script_reference (all if omitted)
    doc_type: Option<String>,
}

#[derive(Deserialize, JsonSchema)]
struct ApiStructureParams {
    /// Class or method name fragment to search for
    query: String,
    /// What to search: classes | methods | both (default: both)
    kind: Option<String>,
    /// Max results per kind (default: 10)
    limit: Option<usize>,
}

#[derive(Deserialize, JsonSchema)]
struct GetPageParams {
    /// Page URL as returned by search_docs (file:///...)
    url: String,
}

#[derive(Deserialize, JsonSchema)]
struct FullDocumentsParams {
    /// Search query (natural language)
    query: String,
    /// Max pages to return (default: 3)
    limit: Option<usize>,
}

#[derive(Deserialize, JsonSchema)]
struct RelatedDocumentsParams {
    /// Class name or free-text topic to start from
    query: String,
}

#[derive(Deserialize, JsonSchema)]
struct MethodSignaturesParams {
    /// Class name (all classes if omitted, then method_name is required)
    class_name: Option<String>,
    /// Restrict to one method by name
    method_name: Option<String>,
    /// Also list the class properties (default: false)
    include_properties: Option<bool>,
    /// Only static members (default: false)
    static_only: Option<bool>,
}

#[derive(Deserialize, JsonSchema)]
struct ExtractCodeParams {
    /// Search query (natural language)
    query: String,
    /// Filter snippets: csharp | javascript | any (default: any)
    language: Option<String>,
    /// Max snippets to return (default: 5, capped at 10)
    max_examples: Option<usize>,
    /// Restrict to a section: manual | script_reference (all if omitted)
    doc_type: Option<String>,
}

#[derive(Deserialize, JsonSchema)]
struct UseCaseParams {
    /// Goal to accomplish, e.g. "make an object jump"
    use_case: String,
    /// beginner | intermediate | advanced (default: intermediate)
    experience_level: Option<String>,
    /// Max pages to return (default: 3, capped at 5)
    max_results: Option<usize>,
    /// Only return pages that carry code snippets (default: true)
    prefer_code: Option<bool>,
}

// ── Response helpers ─────────────────────────────────────────────────

fn json_result(value: serde_json::Value) -> Result<CallToolResult, McpError> {
    Ok(CallToolResult::success(vec![Content::text(
        serde_json::to_string_pretty(&value).unwrap_or_default(),
    )]))
}

fn error_result(msg: &str) -> Result<CallToolResult, McpError> {
    Ok(CallToolResult::error(vec![Content::text(msg.to_string())]))
}

fn parse_doc_type(raw: &str) -> Option<DocType> {
    DocType::parse(raw)
}

fn method_json(m: &crate::db::models::MethodRecord) -> serde_json::Value {
    let mut obj = serde_json::json!({
        "name": m.name,
        "signature": m.signature,
        "return_type": m.return_type,
        "is_static": m.is_static,
        "is_constructor": m.return_type.is_none(),
        "description": m.description,
        "parameters": m.parameters,
    });
    if let Some(class_name) = &m.class_name {
        obj["class_name"] = serde_json::json!(class_name);
        obj["namespace"] = serde_json::json!(m.namespace);
    }
    obj
}

// Unity snippets are C# or legacy UnityScript; keyword presence is enough
// to tell them apart.
fn snippet_matches_language(code: &str, language: &str) -> bool {
    match language {
        "csharp" => ["void", "class", "public", "private"]
            .iter()
            .any(|kw| code.contains(kw)),
        "javascript" => ["var", "function", "let", "const"]
            .iter()
            .any(|kw| code.contains(kw)),
        _ => true,
    }
}

// ── Tool implementations ─────────────────────────────────────────────

#[derive(Clone)]
pub struct AppTools {
    pub ctx: McpContext,
    pub tool_router: ToolRouter<Self>,
}

impl ServerHandler for AppTools {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            instructions: Some(
                "Search and inspect the indexed Unity documentation. Start with \
                 search_docs for prose questions or query_api_structure for class \
                 and method names, then drill down with get_page, \
                 get_method_signatures or get_related_documents."
                    .to_string(),
            ),
            ..Default::default()
        }
    }
}

#[tool_router]
impl AppTools {
    pub fn new(ctx: McpContext) -> Self {
        Self {
            ctx,
            tool_router: Self::tool_router(),
        }
    }

    /// Embed a query off the async runtime. The embedder may block on HTTP,
    /// which is not allowed on a runtime worker thread.
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, McpError> {
        let embedder = Arc::clone(&self.ctx.embedder);
        let text = text.to_string();
        tokio::task::spawn_blocking(move || embedder.embed(&text))
            .await
            .map_err(|e| McpError::internal_error(format!("embedding task panicked: {e}"), None))?
            .map_err(|e| McpError::internal_error(format!("embedding failed: {e}"), None))
    }

    // ── Tool 1: search_docs ─────────────────────────────────────────

    #[tool(
        description = "Natural language vector search over the indexed Unity documentation. Optionally restricted to the manual or the script reference."
    )]
    async fn search_docs(
        &self,
        params: Parameters<SearchDocsParams>,
    ) -> Result<CallToolResult, McpError> {
        let p = params.0;
        if p.query.is_empty() {
            return error_result("query is required");
        }

        let top_k = p.top_k.unwrap_or(self.ctx.config.search_top_k);

        let doc_type = match p.doc_type.as_deref() {
            None | Some("") => None,
            Some(raw) => match parse_doc_type(raw) {
                Some(dt) => Some(dt),
                None => {
                    return error_result(&format!(
                        "unknown doc_type: {raw} (expected manual or script_reference)"
                    ));
                }
            },
        };

        let query_vector = self.embed_query(&p.query).await?;

        let db = self.ctx.db.lock().await;
        let results = db
            .search(&query_vector, top_k, doc_type)
            .map_err(|e| McpError::internal_error(format!("search failed: {e}"), None))?;

        let results_json: Vec<serde_json::Value> = results
            .iter()
            .map(|r| {
                serde_json::json!({
                    "url": r.url,
                    "title": r.title,
                    "doc_type": r.doc_type,
                    "content": r.content,
                    "similarity": r.similarity,
                    "position": r.position,
                })
            })
            .collect();

        json_result(serde_json::json!({ "results": results_json }))
    }

    // ── Tool 2: query_api_structure ─────────────────────────────────

    #[tool(
        description = "Keyword search over the extracted API structure. Finds classes and methods whose name or description matches the query."
    )]
    async fn query_api_structure(
        &self,
        params: Parameters<ApiStructureParams>,
    ) -> Result<CallToolResult, McpError> {
        let p = params.0;
        if p.query.is_empty() {
            return error_result("query is required");
        }

        let kind = p.kind.as_deref().unwrap_or("both");
        if !matches!(kind, "classes" | "methods" | "both") {
            return error_result(&format!(
                "unknown kind: {kind} (expected classes, methods or both)"
            ));
        }
        let limit = p.limit.unwrap_or(10);

        let db = self.ctx.db.lock().await;
        let mut response = serde_json::Map::new();

        if kind != "methods" {
            let classes = db
                .search_classes(&p.query, limit)
                .map_err(|e| McpError::internal_error(format!("class search failed: {e}"), None))?;
            response.insert("classes".to_string(), serde_json::json!(classes));
        }

        if kind != "classes" {
            let methods = db
                .search_methods(&p.query, limit)
                .map_err(|e| {
                    McpError::internal_error(format!("method search failed: {e}"), None)
                })?;
            response.insert("methods".to_string(), serde_json::json!(methods));
        }

        json_result(serde_json::Value::Object(response))
    }

    // ── Tool 3: get_page ────────────────────────────────────────────

    #[tool(description = "Fetch the full text of one documentation page by its URL.")]
    async fn get_page(
        &self,
        params: Parameters<GetPageParams>,
    ) -> Result<CallToolResult, McpError> {
        let url = &params.0.url;
        if url.is_empty() {
            return error_result("url is required");
        }

        let db = self.ctx.db.lock().await;
        let page = db
            .get_page_by_url(url)
            .map_err(|e| McpError::internal_error(format!("lookup failed: {e}"), None))?;

        match page {
            Some(page) => json_result(serde_json::json!(page)),
            None => error_result(&format!("page not found: {url}")),
        }
    }

    // ── Tool 4: get_full_documents ──────────────────────────────────

    #[tool(
        description = "Semantic search returning whole pages instead of chunks. Use when a search_docs preview is not enough context."
    )]
    async fn get_full_documents(
        &self,
        params: Parameters<FullDocumentsParams>,
    ) -> Result<CallToolResult, McpError> {
        let p = params.0;
        if p.query.is_empty() {
            return error_result("query is required");
        }
        let limit = p.limit.unwrap_or(3);

        let query_vector = self.embed_query(&p.query).await?;

        let db = self.ctx.db.lock().await;
        // Oversample chunk hits since several may share one page
        let hits = db
            .search(&query_vector, limit * 4, None)
            .map_err(|e| McpError::internal_error(format!("search failed: {e}"), None))?;

        let mut seen = HashSet::new();
        let mut pages = Vec::new();
        for hit in hits {
            if !seen.insert(hit.page_id) {
                continue;
            }
            if let Some(page) = db
                .get_page(hit.page_id)
                .map_err(|e| McpError::internal_error(format!("lookup failed: {e}"), None))?
            {
                pages.push(page);
            }
            if pages.len() >= limit {
                break;
            }
        }

        json_result(serde_json::json!({ "documents": pages }))
    }

    // ── Tool 5: get_related_documents ───────────────────────────────

    #[tool(
        description = "Documents related to a class or topic: the class record, its inheritance chain, and semantically close pages."
    )]
    async fn get_related_documents(
        &self,
        params: Parameters<RelatedDocumentsParams>,
    ) -> Result<CallToolResult, McpError> {
        let query = &params.0.query;
        if query.is_empty() {
            return error_result("query is required");
        }

        let query_vector = self.embed_query(query).await?;

        let db = self.ctx.db.lock().await;

        let start = db
            .get_class(query)
            .map_err(|e| McpError::internal_error(format!("lookup failed: {e}"), None))?;

        let mut chain = Vec::new();
        if let Some(start) = &start {
            let mut visited: HashSet<String> = HashSet::new();
            visited.insert(start.summary.name.to_lowercase());

            // Parent names are stored unvalidated, so any link may dead-end
            let mut next = start.summary.inherits_from.clone();
            while let Some(parent_name) = next {
                if !visited.insert(parent_name.to_lowercase()) {
                    break;
                }
                let parent = db
                    .get_class(&parent_name)
                    .map_err(|e| McpError::internal_error(format!("lookup failed: {e}"), None))?;
                match parent {
                    Some(parent) => {
                        next = parent.summary.inherits_from.clone();
                        chain.push(serde_json::json!({
                            "name": parent.summary.name,
                            "namespace": parent.summary.namespace,
                            "description": parent.summary.description,
                            "page_url": parent.summary.page_url,
                            "indexed": true,
                        }));
                    }
                    None => {
                        chain.push(serde_json::json!({
                            "name": parent_name,
                            "indexed": false,
                        }));
                        next = None;
                    }
                }
            }
        }

        // Semantic neighbors, skipping the class's own page
        let own_url = start.as_ref().map(|c| c.summary.page_url.clone());
        let hits = db
            .search(&query_vector, self.ctx.config.search_top_k + 1, None)
            .map_err(|e| McpError::internal_error(format!("search failed: {e}"), None))?;

        let mut seen = HashSet::new();
        let related: Vec<serde_json::Value> = hits
            .iter()
            .filter(|r| own_url.as_deref() != Some(r.url.as_str()))
            .filter(|r| seen.insert(r.page_id))
            .take(self.ctx.config.search_top_k)
            .map(|r| {
                serde_json::json!({
                    "url": r.url,
                    "title": r.title,
                    "doc_type": r.doc_type,
                    "similarity": r.similarity,
                })
            })
            .collect();

        if start.is_none() && related.is_empty() {
            return error_result(&format!("nothing related found for: {query}"));
        }

        json_result(serde_json::json!({
            "class": start,
            "inheritance_chain": chain,
            "related_pages": related,
        }))
    }

    // ── Tool 6: get_method_signatures ───────────────────────────────

    #[tool(
        description = "Method signatures for a class, or for one method name across all classes. Optionally include properties or keep static members only."
    )]
    async fn get_method_signatures(
        &self,
        params: Parameters<MethodSignaturesParams>,
    ) -> Result<CallToolResult, McpError> {
        let p = params.0;
        let method_filter = p.method_name.as_deref().filter(|n| !n.is_empty());
        let static_only = p.static_only.unwrap_or(false);

        let db = self.ctx.db.lock().await;

        let Some(class_name) = p.class_name.as_deref().filter(|n| !n.is_empty()) else {
            // Cross-class lookup needs a method name to pivot on
            let Some(method_name) = method_filter else {
                return error_result("class_name or method_name is required");
            };
            let methods = db
                .search_methods(method_name, 50)
                .map_err(|e| {
                    McpError::internal_error(format!("method search failed: {e}"), None)
                })?;
            let methods: Vec<serde_json::Value> = methods
                .iter()
                .filter(|m| m.name.eq_ignore_ascii_case(method_name))
                .filter(|m| !static_only || m.is_static)
                .map(method_json)
                .collect();
            if methods.is_empty() {
                return error_result(&format!("method not found: {method_name}"));
            }
            return json_result(serde_json::json!({ "methods": methods }));
        };

        let Some(detail) = db
            .get_class(class_name)
            .map_err(|e| McpError::internal_error(format!("lookup failed: {e}"), None))?
        else {
            return error_result(&format!("class not found: {class_name}"));
        };

        let methods: Vec<serde_json::Value> = detail
            .methods
            .iter()
            .filter(|m| method_filter.is_none_or(|name| m.name.eq_ignore_ascii_case(name)))
            .filter(|m| !static_only || m.is_static)
            .map(method_json)
            .collect();

        if methods.is_empty() {
            if let Some(name) = method_filter {
                return error_result(&format!(
                    "method not found: {}.{}",
                    detail.summary.name, name
                ));
            }
        }

        let mut response = serde_json::json!({
            "class": detail.summary.name,
            "namespace": detail.summary.namespace,
            "methods": methods,
        });
        if p.include_properties.unwrap_or(false) {
            let properties: Vec<&crate::db::models::PropertyRecord> = detail
                .properties
                .iter()
                .filter(|prop| !static_only || prop.is_static)
                .collect();
            response["properties"] = serde_json::json!(properties);
        }

        json_result(response)
    }

    // ── Tool 7: extract_code_examples ───────────────────────────────

    #[tool(
        description = "Code snippets pulled from documentation pages matching a query. Optionally filtered by language or section."
    )]
    async fn extract_code_examples(
        &self,
        params: Parameters<ExtractCodeParams>,
    ) -> Result<CallToolResult, McpError> {
        let p = params.0;
        if p.query.is_empty() {
            return error_result("query is required");
        }
        let language = p.language.as_deref().unwrap_or("any");
        if !matches!(language, "any" | "csharp" | "javascript") {
            return error_result(&format!(
                "unknown language: {language} (expected csharp, javascript or any)"
            ));
        }
        let max_examples = p.max_examples.unwrap_or(5).min(10);
        let doc_type = match p.doc_type.as_deref() {
            None | Some("") => None,
            Some(raw) => match parse_doc_type(raw) {
                Some(dt) => Some(dt),
                None => {
                    return error_result(&format!(
                        "unknown doc_type: {raw} (expected manual or script_reference)"
                    ));
                }
            },
        };

        let query_vector = self.embed_query(&p.query).await?;

        let db = self.ctx.db.lock().await;
        // Oversample pages; not every hit carries code
        let hits = db
            .search(&query_vector, max_examples * 3, doc_type)
            .map_err(|e| McpError::internal_error(format!("search failed: {e}"), None))?;

        let mut seen = HashSet::new();
        let mut examples = Vec::new();
        'pages: for hit in hits {
            if !seen.insert(hit.page_id) {
                continue;
            }
            let snippets = db
                .code_for_page(hit.page_id)
                .map_err(|e| McpError::internal_error(format!("lookup failed: {e}"), None))?;
            for code in snippets {
                if !snippet_matches_language(&code, language) {
                    continue;
                }
                examples.push(serde_json::json!({
                    "code": code,
                    "source": hit.title,
                    "url": hit.url,
                    "doc_type": hit.doc_type,
                }));
                if examples.len() >= max_examples {
                    break 'pages;
                }
            }
        }

        if examples.is_empty() {
            return error_result(&format!("no code examples found for: {}", p.query));
        }
        json_result(serde_json::json!({ "examples": examples }))
    }

    // ── Tool 8: search_by_use_case ──────────────────────────────────

    #[tool(
        description = "Find documentation for a concrete goal. The query is rephrased for the caller's experience level, and pages with code are preferred."
    )]
    async fn search_by_use_case(
        &self,
        params: Parameters<UseCaseParams>,
    ) -> Result<CallToolResult, McpError> {
        let p = params.0;
        if p.use_case.is_empty() {
            return error_result("use_case is required");
        }
        let level = p.experience_level.as_deref().unwrap_or("intermediate");
        let enhanced = match level {
            "beginner" => format!("{} tutorial basics getting started simple example", p.use_case),
            "intermediate" => format!("{} implementation best practices example", p.use_case),
            "advanced" => format!("{} advanced optimization performance architecture", p.use_case),
            other => {
                return error_result(&format!(
                    "unknown experience_level: {other} (expected beginner, intermediate or advanced)"
                ));
            }
        };
        let max_results = p.max_results.unwrap_or(3).min(5);
        let prefer_code = p.prefer_code.unwrap_or(true);
        // Beginners get more surrounding context in the snippet
        let snippet_len = if level == "beginner" { 500 } else { 300 };

        let query_vector = self.embed_query(&enhanced).await?;

        let db = self.ctx.db.lock().await;
        let hits = db
            .search(&query_vector, max_results * 2, None)
            .map_err(|e| McpError::internal_error(format!("search failed: {e}"), None))?;

        let mut seen = HashSet::new();
        let mut solutions = Vec::new();
        for hit in hits {
            if solutions.len() >= max_results {
                break;
            }
            if !seen.insert(hit.page_id) {
                continue;
            }
            let Some(page) = db
                .get_page(hit.page_id)
                .map_err(|e| McpError::internal_error(format!("lookup failed: {e}"), None))?
            else {
                continue;
            };
            let has_code = !db
                .code_for_page(hit.page_id)
                .map_err(|e| McpError::internal_error(format!("lookup failed: {e}"), None))?
                .is_empty();
            if prefer_code && !has_code {
                continue;
            }
            let snippet: String = page.content.chars().take(snippet_len).collect();
            solutions.push(serde_json::json!({
                "title": page.title,
                "url": page.url,
                "doc_type": page.doc_type,
                "snippet": snippet,
                "has_code": has_code,
                "similarity": hit.similarity,
            }));
        }

        if solutions.is_empty() {
            return error_result(&format!(
                "no documentation found for use case: {}",
                p.use_case
            ));
        }
        json_result(serde_json::json!({ "solutions": solutions }))
    }

    // ── Tool 9: get_stats ───────────────────────────────────────────

    #[tool(description = "Report store row counts and the embedding setup in use.")]
    async fn get_stats(&self) -> Result<CallToolResult, McpError> {
        let db = self.ctx.db.lock().await;
        let stats = db
            .stats()
            .map_err(|e| McpError::internal_error(format!("stats failed: {e}"), None))?;

        json_result(serde_json::json!({
            "store": stats,
            "embedding": {
                "model": self.ctx.config.embedding.model,
                "dimensions": self.ctx.embedder.dimensions(),
            },
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::db::Db;
    use crate::embedder::Embedder;
    use crate::embedder::mock::MockEmbedder;
    use crate::embedder::ollama::OllamaEmbedder;
    use crate::extract::reference::{ExtractedClass, ExtractedMethod, ExtractedParameter};
    use tokio::sync::Mutex as TokioMutex;

    fn text_of(result: &CallToolResult) -> String {
        result
            .content
            .iter()
            .filter_map(|c| c.as_text().map(|t| t.text.clone()))
            .collect()
    }

    fn parsed(result: &CallToolResult) -> serde_json::Value {
        serde_json::from_str(&text_of(result)).unwrap()
    }

    async fn tools_with_fixture() -> AppTools {
        let mut config = Config::default();
        config.embedding.dimensions = 32;

        let mut db = Db::open_in_memory(32).unwrap();
        let embedder = MockEmbedder::new(32);

        let page_id = db
            .upsert_page(
                "file:///ScriptReference/Rigidbody.html",
                "Rigidbody",
                "script_reference",
                "Rigidbody controls position through physics.",
                &[crate::db::models::ChunkInput {
                    position: 0,
                    content: "Rigidbody controls position through physics.",
                }],
                &[embedder
                    .embed("Rigidbody controls position through physics.")
                    .unwrap()],
            )
            .unwrap();
        db.replace_page_class(
            page_id,
            &ExtractedClass {
                name: "Rigidbody".to_string(),
                namespace: Some("UnityEngine".to_string()),
                inherits_from: Some("Component".to_string()),
                methods: vec![ExtractedMethod {
                    name: "AddForce".to_string(),
                    return_type: Some("void".to_string()),
                    is_static: false,
                    description: None,
                    signature: "void AddForce(Vector3 force)".to_string(),
                    parameters: vec![ExtractedParameter {
                        name: "force".to_string(),
                        param_type: Some("Vector3".to_string()),
                        description: None,
                        position: 0,
                    }],
                }],
                ..Default::default()
            },
        )
        .unwrap();
        db.replace_page_code(
            page_id,
            &["public void Launch() { rb.AddForce(Vector3.up); }".to_string()],
        )
        .unwrap();

        let ctx = McpContext {
            db: Arc::new(TokioMutex::new(db)),
            config: Arc::new(config),
            embedder: Arc::new(embedder),
        };
        AppTools::new(ctx)
    }

    #[tokio::test]
    async fn test_search_docs_returns_hit() {
        let tools = tools_with_fixture().await;
        let result = tools
            .search_docs(Parameters(SearchDocsParams {
                query: "physics".to_string(),
                top_k: Some(3),
                doc_type: None,
            }))
            .await
            .unwrap();

        let value = parsed(&result);
        let results = value["results"].as_array().unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0]["title"], "Rigidbody");
    }

    #[tokio::test]
    async fn test_search_docs_rejects_bad_doc_type() {
        let tools = tools_with_fixture().await;
        let result = tools
            .search_docs(Parameters(SearchDocsParams {
                query: "physics".to_string(),
                top_k: None,
                doc_type: Some("tutorials".to_string()),
            }))
            .await
            .unwrap();
        assert_eq!(result.is_error, Some(true));
    }

    #[tokio::test]
    async fn test_query_api_structure() {
        let tools = tools_with_fixture().await;
        let result = tools
            .query_api_structure(Parameters(ApiStructureParams {
                query: "AddForce".to_string(),
                kind: None,
                limit: None,
            }))
            .await
            .unwrap();

        let value = parsed(&result);
        assert!(value["classes"].as_array().unwrap().is_empty());
        let methods = value["methods"].as_array().unwrap();
        assert_eq!(methods.len(), 1);
        assert_eq!(methods[0]["class_name"], "Rigidbody");
    }

    #[tokio::test]
    async fn test_get_page_by_url() {
        let tools = tools_with_fixture().await;
        let result = tools
            .get_page(Parameters(GetPageParams {
                url: "file:///ScriptReference/Rigidbody.html".to_string(),
            }))
            .await
            .unwrap();
        let value = parsed(&result);
        assert_eq!(value["title"], "Rigidbody");

        let missing = tools
            .get_page(Parameters(GetPageParams {
                url: "file:///nope.html".to_string(),
            }))
            .await
            .unwrap();
        assert_eq!(missing.is_error, Some(true));
    }

    #[tokio::test]
    async fn test_get_related_documents_unindexed_parent() {
        let tools = tools_with_fixture().await;
        let result = tools
            .get_related_documents(Parameters(RelatedDocumentsParams {
                query: "Rigidbody".to_string(),
            }))
            .await
            .unwrap();

        let value = parsed(&result);
        let chain = value["inheritance_chain"].as_array().unwrap();
        assert_eq!(chain.len(), 1);
        assert_eq!(chain[0]["name"], "Component");
        assert_eq!(chain[0]["indexed"], false);
        // The class's own page never shows up among the neighbors
        assert!(value["related_pages"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_related_documents_topic() {
        let tools = tools_with_fixture().await;
        let result = tools
            .get_related_documents(Parameters(RelatedDocumentsParams {
                query: "physics movement".to_string(),
            }))
            .await
            .unwrap();

        let value = parsed(&result);
        assert!(value["class"].is_null());
        let related = value["related_pages"].as_array().unwrap();
        assert_eq!(related.len(), 1);
        assert_eq!(related[0]["title"], "Rigidbody");
    }

    #[tokio::test]
    async fn test_get_method_signatures_for_class() {
        let tools = tools_with_fixture().await;
        let result = tools
            .get_method_signatures(Parameters(MethodSignaturesParams {
                class_name: Some("Rigidbody".to_string()),
                method_name: Some("addforce".to_string()),
                include_properties: None,
                static_only: None,
            }))
            .await
            .unwrap();

        let value = parsed(&result);
        let methods = value["methods"].as_array().unwrap();
        assert_eq!(methods.len(), 1);
        assert_eq!(methods[0]["signature"], "void AddForce(Vector3 force)");
        assert_eq!(methods[0]["is_constructor"], false);
        assert!(value.get("properties").is_none());
    }

    #[tokio::test]
    async fn test_get_method_signatures_across_classes() {
        let tools = tools_with_fixture().await;
        let result = tools
            .get_method_signatures(Parameters(MethodSignaturesParams {
                class_name: None,
                method_name: Some("AddForce".to_string()),
                include_properties: None,
                static_only: None,
            }))
            .await
            .unwrap();

        let value = parsed(&result);
        let methods = value["methods"].as_array().unwrap();
        assert_eq!(methods.len(), 1);
        assert_eq!(methods[0]["class_name"], "Rigidbody");
    }

    #[tokio::test]
    async fn test_get_method_signatures_static_only_filters() {
        let tools = tools_with_fixture().await;
        let result = tools
            .get_method_signatures(Parameters(MethodSignaturesParams {
                class_name: Some("Rigidbody".to_string()),
                method_name: None,
                include_properties: None,
                static_only: Some(true),
            }))
            .await
            .unwrap();

        let value = parsed(&result);
        assert!(value["methods"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_full_documents_returns_whole_pages() {
        let tools = tools_with_fixture().await;
        let result = tools
            .get_full_documents(Parameters(FullDocumentsParams {
                query: "physics".to_string(),
                limit: None,
            }))
            .await
            .unwrap();

        let value = parsed(&result);
        let documents = value["documents"].as_array().unwrap();
        assert_eq!(documents.len(), 1);
        assert_eq!(
            documents[0]["content"],
            "Rigidbody controls position through physics."
        );
    }

    #[tokio::test]
    async fn test_extract_code_examples() {
        let tools = tools_with_fixture().await;
        let result = tools
            .extract_code_examples(Parameters(ExtractCodeParams {
                query: "physics".to_string(),
                language: Some("csharp".to_string()),
                max_examples: None,
                doc_type: None,
            }))
            .await
            .unwrap();

        let value = parsed(&result);
        let examples = value["examples"].as_array().unwrap();
        assert_eq!(examples.len(), 1);
        assert!(examples[0]["code"].as_str().unwrap().contains("AddForce"));
        assert_eq!(examples[0]["source"], "Rigidbody");
    }

    #[tokio::test]
    async fn test_extract_code_examples_language_mismatch() {
        let tools = tools_with_fixture().await;
        // The only stored snippet is C#, so a JavaScript filter finds nothing
        let result = tools
            .extract_code_examples(Parameters(ExtractCodeParams {
                query: "physics".to_string(),
                language: Some("javascript".to_string()),
                max_examples: None,
                doc_type: None,
            }))
            .await
            .unwrap();
        assert_eq!(result.is_error, Some(true));
    }

    #[tokio::test]
    async fn test_search_by_use_case() {
        let tools = tools_with_fixture().await;
        let result = tools
            .search_by_use_case(Parameters(UseCaseParams {
                use_case: "apply force to a rigidbody".to_string(),
                experience_level: None,
                max_results: None,
                prefer_code: None,
            }))
            .await
            .unwrap();

        let value = parsed(&result);
        let solutions = value["solutions"].as_array().unwrap();
        assert_eq!(solutions.len(), 1);
        assert_eq!(solutions[0]["title"], "Rigidbody");
        assert_eq!(solutions[0]["has_code"], true);
    }

    #[tokio::test]
    async fn test_search_by_use_case_rejects_bad_level() {
        let tools = tools_with_fixture().await;
        let result = tools
            .search_by_use_case(Parameters(UseCaseParams {
                use_case: "jumping".to_string(),
                experience_level: Some("wizard".to_string()),
                max_results: None,
                prefer_code: None,
            }))
            .await
            .unwrap();
        assert_eq!(result.is_error, Some(true));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_search_docs_unreachable_backend_is_an_error() {
        let mut config = Config::default();
        config.embedding.dimensions = 8;
        let db = Db::open_in_memory(8).unwrap();
        // Nothing listens on port 9; the handler must report this, not panic
        let ctx = McpContext {
            db: Arc::new(TokioMutex::new(db)),
            config: Arc::new(config),
            embedder: Arc::new(OllamaEmbedder::new(
                "http://127.0.0.1:9".to_string(),
                "nomic-embed-text".to_string(),
                8,
            )),
        };
        let tools = AppTools::new(ctx);

        let result = tools
            .search_docs(Parameters(SearchDocsParams {
                query: "physics".to_string(),
                top_k: None,
                doc_type: None,
            }))
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_get_stats() {
        let tools = tools_with_fixture().await;
        let result = tools.get_stats().await.unwrap();
        let value = parsed(&result);
        assert_eq!(value["store"]["pages"], 1);
        assert_eq!(value["store"]["classes"], 1);
        assert_eq!(value["embedding"]["dimensions"], 32);
    }
}
