use crate::db::models::ChunkInput;
use crate::db::Db;
use crate::embedder::Embedder;
use crate::extract::chunk::split_into_chunks;
use crate::extract::html::read_page;
use crate::extract::reference::extract_class;
use crate::extract::DocType;
use anyhow::Context;
use ignore::WalkBuilder;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex as TokioMutex;
use tracing::{info, warn};

/// Counters reported after one indexing run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct IndexSummary {
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
    pub classes: usize,
    pub chunks: usize,
}

pub struct Indexer {
    pub db: Arc<TokioMutex<Db>>,
    pub embedder: Arc<dyn Embedder>,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Indexer {
    pub fn new(
        db: Arc<TokioMutex<Db>>,
        embedder: Arc<dyn Embedder>,
        chunk_size: usize,
        chunk_overlap: usize,
    ) -> Self {
        Self {
            db,
            embedder,
            chunk_size,
            chunk_overlap,
        }
    }

    /// Navigation pages carry no documentation content.
    fn is_navigation_page(path: &Path) -> bool {
        matches!(
            path.file_name().and_then(|n| n.to_str()),
            Some("index.html") | Some("search.html")
        )
    }

    /// Index every HTML page under `docs_root`.
    ///
    /// A failing page is logged and counted, never aborts the run. When
    /// `doc_type` is set, pages of the other section are skipped. When
    /// `max_pages` is set, the run stops after that many pages have been
    /// attempted.
    pub async fn index_tree<P: AsRef<Path>>(
        &mut self,
        docs_root: P,
        doc_type: Option<DocType>,
        max_pages: Option<usize>,
    ) -> anyhow::Result<IndexSummary> {
        let docs_root = docs_root.as_ref();
        anyhow::ensure!(
            docs_root.is_dir(),
            "documentation root not found: {}",
            docs_root.display()
        );

        let mut summary = IndexSummary::default();

        let walker = WalkBuilder::new(docs_root).hidden(false).build();

        for entry in walker.into_iter().filter_map(|e| e.ok()) {
            let path = entry.path();
            if path.is_dir() {
                continue;
            }
            if path.extension().and_then(|s| s.to_str()) != Some("html") {
                continue;
            }
            if Self::is_navigation_page(path) {
                summary.skipped += 1;
                continue;
            }

            if let Some(limit) = max_pages {
                if summary.processed + summary.failed >= limit {
                    info!("Reached page limit of {limit}, stopping walk");
                    break;
                }
            }

            let page = match read_page(docs_root, path) {
                Ok(page) => page,
                Err(e) => {
                    warn!("Skipping {}: {e}", path.display());
                    summary.failed += 1;
                    continue;
                }
            };

            if doc_type.is_some_and(|dt| dt != page.doc_type) {
                summary.skipped += 1;
                continue;
            }

            match self.index_page(&page).await {
                Ok((chunk_count, has_class)) => {
                    summary.processed += 1;
                    summary.chunks += chunk_count;
                    if has_class {
                        summary.classes += 1;
                    }
                }
                Err(e) => {
                    warn!("Failed to index {}: {e}", page.url);
                    summary.failed += 1;
                }
            }
        }

        info!(
            "Indexing finished: {} pages, {} chunks, {} classes, {} skipped, {} failed",
            summary.processed, summary.chunks, summary.classes, summary.skipped, summary.failed
        );
        Ok(summary)
    }

    /// Store one page: chunks, vectors, and structured records when the
    /// page is an API reference with a parseable class.
    async fn index_page(
        &mut self,
        page: &crate::extract::html::PageSource,
    ) -> anyhow::Result<(usize, bool)> {
        let pieces = split_into_chunks(&page.text, self.chunk_size, self.chunk_overlap);

        // The embedder may block on HTTP, so it must not run on the runtime
        let embedder = Arc::clone(&self.embedder);
        let texts = pieces.clone();
        let vectors = tokio::task::spawn_blocking(move || {
            let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
            embedder.embed_batch(&refs)
        })
        .await
        .context("embedding task panicked")??;

        let db_chunks: Vec<ChunkInput<'_>> = pieces
            .iter()
            .enumerate()
            .map(|(position, content)| ChunkInput { position, content })
            .collect();

        let class = if page.doc_type == DocType::ScriptReference {
            extract_class(page)
        } else {
            None
        };
        let has_class = class.is_some();

        {
            let mut db_guard = self.db.lock().await;
            let page_id = db_guard.upsert_page(
                &page.url,
                &page.title,
                page.doc_type.as_str(),
                &page.text,
                &db_chunks,
                &vectors,
            )?;
            db_guard.replace_page_code(page_id, &page.code_blocks)?;
            match &class {
                Some(class) => {
                    db_guard.replace_page_class(page_id, class)?;
                }
                None => db_guard.clear_page_class(page_id)?,
            }
        }

        Ok((pieces.len(), has_class))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedder::mock::MockEmbedder;
    use crate::embedder::ollama::OllamaEmbedder;
    use std::fs;
    use tempfile::TempDir;

    fn write_page(dir: &Path, rel: &str, body: &str) {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, body).unwrap();
    }

    fn fixture_tree() -> TempDir {
        let dir = TempDir::new().unwrap();
        write_page(
            dir.path(),
            "Manual/PhysicsOverview.html",
            "<html><head><title>Physics overview</title></head><body><h1>Physics overview</h1><p>Physics in the engine.</p></body></html>",
        );
        write_page(
            dir.path(),
            "ScriptReference/Rigidbody.html",
            r#"<html><body>
<h1>Rigidbody</h1>
<p>Inherits from: <a href="Component.html">Component</a></p>
<div class="description">Physics-driven object control.</div>
<pre>void FixedUpdate() { rb.AddForce(Vector3.up); }</pre>
<h2>Public Methods</h2>
<table><tr><td>void AddForce(Vector3 force)</td><td>Adds a force.</td></tr></table>
</body></html>"#,
        );
        write_page(dir.path(), "Manual/index.html", "<html><body>nav</body></html>");
        write_page(
            dir.path(),
            "Manual/Broken.html",
            "<html><body><p>No heading here.</p></body></html>",
        );
        dir
    }

    async fn run_indexer(
        doc_type: Option<DocType>,
        max_pages: Option<usize>,
    ) -> (IndexSummary, Arc<TokioMutex<Db>>) {
        let dir = fixture_tree();
        let db = Arc::new(TokioMutex::new(Db::open_in_memory(32).unwrap()));
        let embedder: Arc<dyn Embedder> = Arc::new(MockEmbedder::new(32));
        let mut indexer = Indexer::new(Arc::clone(&db), embedder, 200, 20);
        let summary = indexer
            .index_tree(dir.path(), doc_type, max_pages)
            .await
            .unwrap();
        (summary, db)
    }

    #[tokio::test]
    async fn test_index_tree_counts() {
        let (summary, db) = run_indexer(None, None).await;

        assert_eq!(summary.processed, 2);
        assert_eq!(summary.classes, 1);
        assert_eq!(summary.failed, 1); // page without a title
        assert_eq!(summary.skipped, 1); // index.html
        assert!(summary.chunks >= 2);

        let db = db.lock().await;
        let stats = db.stats().unwrap();
        assert_eq!(stats.pages, 2);
        assert_eq!(stats.classes, 1);

        let detail = db.get_class("Rigidbody").unwrap().unwrap();
        assert_eq!(detail.summary.inherits_from.as_deref(), Some("Component"));
        assert_eq!(detail.methods.len(), 1);

        let page = db
            .get_page_by_url("file:///ScriptReference/Rigidbody.html")
            .unwrap()
            .unwrap();
        let snippets = db.code_for_page(page.id).unwrap();
        assert_eq!(snippets.len(), 1);
        assert!(snippets[0].contains("AddForce"));
    }

    #[tokio::test]
    async fn test_doc_type_filter() {
        let (summary, db) = run_indexer(Some(DocType::Manual), None).await;

        assert_eq!(summary.processed, 1);
        assert_eq!(summary.classes, 0);

        let db = db.lock().await;
        assert!(db.get_class("Rigidbody").unwrap().is_none());
    }

    #[tokio::test]
    async fn test_max_pages_limit() {
        let (summary, _db) = run_indexer(None, Some(1)).await;
        assert_eq!(summary.processed + summary.failed, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_index_tree_survives_unreachable_backend() {
        let dir = fixture_tree();
        let db = Arc::new(TokioMutex::new(Db::open_in_memory(8).unwrap()));
        // Nothing listens on port 9, so every embedding request errors out
        let embedder: Arc<dyn Embedder> = Arc::new(OllamaEmbedder::new(
            "http://127.0.0.1:9".to_string(),
            "nomic-embed-text".to_string(),
            8,
        ));
        let mut indexer = Indexer::new(Arc::clone(&db), embedder, 200, 20);

        let summary = indexer.index_tree(dir.path(), None, None).await.unwrap();
        assert_eq!(summary.processed, 0);
        assert_eq!(summary.failed, 3); // two embeddable pages plus the broken one

        let db = db.lock().await;
        assert_eq!(db.stats().unwrap().pages, 0);
    }

    #[tokio::test]
    async fn test_reindex_is_idempotent() {
        let dir = fixture_tree();
        let db = Arc::new(TokioMutex::new(Db::open_in_memory(32).unwrap()));
        let embedder: Arc<dyn Embedder> = Arc::new(MockEmbedder::new(32));
        let mut indexer = Indexer::new(Arc::clone(&db), embedder, 200, 20);

        indexer.index_tree(dir.path(), None, None).await.unwrap();
        indexer.index_tree(dir.path(), None, None).await.unwrap();

        let db = db.lock().await;
        let stats = db.stats().unwrap();
        assert_eq!(stats.pages, 2);
        assert_eq!(stats.classes, 1);
        assert_eq!(stats.methods, 1);
    }
}
