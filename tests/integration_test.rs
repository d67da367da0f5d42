/// End-to-end tests over a fixture documentation tree: index it,
/// search it, and read back the structured API records.
use std::fs;
use std::sync::Arc;

use tempfile::tempdir;
use tokio::sync::Mutex as TokioMutex;

use unidocs::config::Config;
use unidocs::db::Db;
use unidocs::embedder::Embedder;
use unidocs::embedder::mock::MockEmbedder;
use unidocs::extract::DocType;
use unidocs::indexer::Indexer;

const RIGIDBODY_HTML: &str = r#"<html><body>
<h1>Rigidbody</h1>
<p class="cl">Inherits from: <a href="Component.html">Component</a></p>
<div class="description">Control of an object's position through physics simulation.</div>
<pre><code>public class Launcher : MonoBehaviour {
    void FixedUpdate() { GetComponent&lt;Rigidbody&gt;().AddForce(Vector3.up); }
}</code></pre>
<h2>Public Methods</h2>
<table>
  <tr><th>Method</th><th>Description</th></tr>
  <tr><td>void AddForce(Vector3 force)</td><td>Adds a force to the Rigidbody.</td></tr>
  <tr><td>void Sleep()</td><td>Forces a rigidbody to sleep.</td></tr>
</table>
<h2>Public Properties</h2>
<table>
  <tr><td>Vector3 velocity</td><td>The velocity vector of the rigidbody.</td></tr>
</table>
<h2>Constructors</h2>
<table>
  <tr><td>Rigidbody()</td><td>Creates a new rigidbody.</td></tr>
</table>
</body></html>"#;

const MANUAL_HTML: &str = r#"<html><head><title>Physics overview</title></head><body>
<h1>Physics overview</h1>
<p>The engine ships a built-in physics system that moves rigidbodies through
forces, gravity and collisions.</p>
</body></html>"#;

fn build_fixture_tree() -> tempfile::TempDir {
    let temp = tempdir().unwrap();
    let root = temp.path();

    fs::create_dir_all(root.join("ScriptReference")).unwrap();
    fs::create_dir_all(root.join("Manual")).unwrap();

    fs::write(root.join("ScriptReference/Rigidbody.html"), RIGIDBODY_HTML).unwrap();
    fs::write(root.join("Manual/PhysicsOverview.html"), MANUAL_HTML).unwrap();
    // Navigation pages must be skipped
    fs::write(root.join("Manual/index.html"), "<html><body>nav</body></html>").unwrap();
    fs::write(
        root.join("Manual/search.html"),
        "<html><body>search</body></html>",
    )
    .unwrap();
    // A broken page must not abort the run
    fs::write(
        root.join("Manual/Broken.html"),
        "<html><body><p>no heading</p></body></html>",
    )
    .unwrap();

    temp
}

/// Full pipeline: fixture tree → index → search → structured lookups
#[tokio::test]
async fn test_full_pipeline() {
    let temp = build_fixture_tree();

    let db = Arc::new(TokioMutex::new(Db::open_in_memory(64).unwrap()));
    let embedder = MockEmbedder::new(64);

    let mut indexer = Indexer::new(Arc::clone(&db), Arc::new(MockEmbedder::new(64)), 400, 40);
    let summary = indexer.index_tree(temp.path(), None, None).await.unwrap();

    assert_eq!(summary.processed, 2, "two real pages should be indexed");
    assert_eq!(summary.skipped, 2, "index.html and search.html are skipped");
    assert_eq!(summary.failed, 1, "the page without a title fails alone");
    assert_eq!(summary.classes, 1);
    assert!(summary.chunks >= 2);

    let db_guard = db.lock().await;

    // Pages are keyed by file URL relative to the tree root
    let page = db_guard
        .get_page_by_url("file:///ScriptReference/Rigidbody.html")
        .unwrap()
        .expect("Rigidbody page should be stored");
    assert_eq!(page.doc_type, "script_reference");
    assert_eq!(page.title, "Rigidbody");

    // Code blocks on the page are stored alongside it
    let snippets = db_guard.code_for_page(page.id).unwrap();
    assert_eq!(snippets.len(), 1);
    assert!(snippets[0].contains("AddForce"));

    // Vector search finds the content and reports bounded similarity
    let query_vec = embedder.embed("physics simulation").unwrap();
    let results = db_guard.search(&query_vec, 5, None).unwrap();
    assert!(!results.is_empty(), "search should return results");
    for r in &results {
        assert!(!r.url.is_empty());
        assert!(!r.content.is_empty());
        assert!(
            r.similarity >= -1.0 && r.similarity <= 1.0,
            "similarity should be in [-1, 1]"
        );
    }

    // Section filter excludes the manual
    let api_only = db_guard
        .search(&query_vec, 5, Some(DocType::ScriptReference))
        .unwrap();
    assert!(api_only.iter().all(|r| r.doc_type == "script_reference"));

    // Structured extraction round-trip
    let detail = db_guard
        .get_class("Rigidbody")
        .unwrap()
        .expect("class should be stored");
    assert_eq!(detail.summary.inherits_from.as_deref(), Some("Component"));
    assert!(!detail.summary.is_static);
    assert_eq!(detail.methods.len(), 3, "two methods plus a constructor");
    assert_eq!(detail.properties.len(), 1);

    let ctor = detail
        .methods
        .iter()
        .find(|m| m.return_type.is_none())
        .expect("constructor should be stored without a return type");
    assert_eq!(ctor.name, "Rigidbody");

    let add_force = detail
        .methods
        .iter()
        .find(|m| m.name == "AddForce")
        .unwrap();
    assert_eq!(add_force.parameters.len(), 1);
    assert_eq!(add_force.parameters[0].param_type.as_deref(), Some("Vector3"));
    assert_eq!(add_force.parameters[0].position, 0);
}

/// Re-indexing the same tree must replace rows, not duplicate them.
#[tokio::test]
async fn test_reindex_replaces_everything() {
    let temp = build_fixture_tree();

    let db = Arc::new(TokioMutex::new(Db::open_in_memory(64).unwrap()));
    let mut indexer = Indexer::new(Arc::clone(&db), Arc::new(MockEmbedder::new(64)), 400, 40);

    indexer.index_tree(temp.path(), None, None).await.unwrap();
    let first = db.lock().await.stats().unwrap();

    indexer.index_tree(temp.path(), None, None).await.unwrap();
    let second = db.lock().await.stats().unwrap();

    assert_eq!(first.pages, second.pages);
    assert_eq!(first.chunks, second.chunks);
    assert_eq!(first.classes, second.classes);
    assert_eq!(first.methods, second.methods);
    assert_eq!(first.properties, second.properties);
}

/// Test config defaults and validation
#[test]
fn test_config_defaults_and_validation() {
    let config = Config::default();

    assert_eq!(config.chunk_size, 1000);
    assert_eq!(config.chunk_overlap, 100);
    assert_eq!(config.search_top_k, 5);
    assert_eq!(config.embedding.dimensions, 768);
    assert!(config.validate().is_ok());

    let mut bad = Config::default();
    bad.chunk_size = 0;
    assert!(bad.validate().is_err());
}

/// Persisted store survives close and reopen.
#[test]
fn test_store_reopen() {
    let temp = tempdir().unwrap();
    let db_path = temp.path().join("docs.db");

    {
        let mut db = Db::open(&db_path, 8).unwrap();
        db.upsert_page(
            "file:///Manual/Audio.html",
            "Audio",
            "manual",
            "audio mixing",
            &[unidocs::db::models::ChunkInput {
                position: 0,
                content: "audio mixing",
            }],
            &[vec![1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]],
        )
        .unwrap();
    }

    let db = Db::open(&db_path, 8).unwrap();
    let page = db.get_page_by_url("file:///Manual/Audio.html").unwrap();
    assert!(page.is_some());
    assert_eq!(db.stats().unwrap().pages, 1);
}
