use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tokio::sync::Mutex as TokioMutex;
use tracing_subscriber::EnvFilter;

use unidocs::config::Config;
use unidocs::db::Db;
use unidocs::downloader::DocsDownloader;
use unidocs::embedder;
use unidocs::extract::DocType;
use unidocs::indexer::Indexer;
use unidocs::mcp::server::{McpContext, McpServer};

#[derive(Parser)]
#[command(name = "unidocs", version, about = "Unity documentation MCP server")]
struct Cli {
    /// Path to the configuration file
    #[arg(long, default_value = "")]
    config: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve MCP tools over stdio (default)
    Serve,
    /// Index a local documentation tree into the store
    Index {
        /// Documentation root to index; defaults to the downloaded tree
        #[arg(long)]
        docs_dir: Option<PathBuf>,
        /// Section to index: manual | script_reference | both
        #[arg(long, default_value = "both")]
        doc_type: String,
        /// Stop after this many pages
        #[arg(long)]
        max_pages: Option<usize>,
        /// Skip the documentation version check
        #[arg(long)]
        no_version_check: bool,
    },
    /// Download and extract the offline documentation archive
    Download {
        /// Re-download even if the installed version is current
        #[arg(long)]
        force: bool,
    },
    /// Delete the store and downloaded documentation for a fresh start
    Reset,
}

#[tokio::main]
async fn main() -> Result<()> {
    // MCP owns stdout, so all diagnostics go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = Config::load(&cli.config)?;
    config.validate().context("invalid configuration")?;
    let config = Arc::new(config);

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::Index {
            docs_dir,
            doc_type,
            max_pages,
            no_version_check,
        } => index(config, docs_dir, &doc_type, max_pages, no_version_check).await,
        Command::Download { force } => {
            // Blocking HTTP must run off the async runtime
            let config = Arc::clone(&config);
            tokio::task::spawn_blocking(move || download(&config, force))
                .await
                .context("download task panicked")?
        }
        Command::Reset => reset(&config),
    }
}

async fn serve(config: Arc<Config>) -> Result<()> {
    let db = Db::open(&config.db_path, config.embedding.dimensions)
        .context("Failed to open database")?;
    let db = Arc::new(TokioMutex::new(db));

    let embedder = embedder::from_config(&config);

    let ctx = McpContext {
        db,
        config: config.clone(),
        embedder,
    };
    McpServer::new(ctx).start().await
}

async fn index(
    config: Arc<Config>,
    docs_dir: Option<PathBuf>,
    doc_type: &str,
    max_pages: Option<usize>,
    no_version_check: bool,
) -> Result<()> {
    let doc_type = match doc_type {
        "both" | "" => None,
        other => match DocType::parse(other) {
            Some(dt) => Some(dt),
            None => bail!("unknown doc_type: {other} (expected manual, script_reference or both)"),
        },
    };

    let docs_root = match docs_dir {
        Some(dir) => dir,
        None => {
            // The downloader's HTTP client blocks, so keep it off the runtime
            let check = !no_version_check && config.is_update_check_enabled();
            let data_dir = config.data_dir.clone();
            tokio::task::spawn_blocking(move || {
                let downloader = DocsDownloader::new(&data_dir);
                if check && downloader.update_available() {
                    eprintln!("[INFO] A newer documentation release is available; run `unidocs download` to fetch it.");
                }
                downloader.docs_root()
            })
            .await
            .context("version check task panicked")??
        }
    };

    let db = Db::open(&config.db_path, config.embedding.dimensions)
        .context("Failed to open database")?;
    let db = Arc::new(TokioMutex::new(db));
    let embedder = embedder::from_config(&config);

    let mut indexer = Indexer::new(db, embedder, config.chunk_size, config.chunk_overlap);
    let summary = indexer.index_tree(&docs_root, doc_type, max_pages).await?;

    eprintln!(
        "[INFO] Indexed {} pages ({} chunks, {} classes), {} skipped, {} failed",
        summary.processed, summary.chunks, summary.classes, summary.skipped, summary.failed
    );
    Ok(())
}

fn download(config: &Config, force: bool) -> Result<()> {
    let downloader = DocsDownloader::new(&config.data_dir);
    let docs_root = downloader.download_and_extract(force)?;
    eprintln!("[INFO] Documentation ready at {}", docs_root.display());
    Ok(())
}

fn reset(config: &Config) -> Result<()> {
    let db_path = std::path::Path::new(&config.db_path);
    if db_path.exists() {
        std::fs::remove_file(db_path)
            .with_context(|| format!("failed to delete {}", db_path.display()))?;
        eprintln!("[INFO] Deleted {}", db_path.display());
    } else {
        eprintln!("[INFO] Nothing to reset: {} does not exist", db_path.display());
    }

    let download_dir = config.download_dir();
    if download_dir.exists() {
        std::fs::remove_dir_all(&download_dir)
            .with_context(|| format!("failed to delete {}", download_dir.display()))?;
        eprintln!("[INFO] Deleted {}", download_dir.display());
    }

    eprintln!("[INFO] Run `unidocs download` and `unidocs index` to rebuild");
    Ok(())
}
