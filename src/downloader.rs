/// Offline documentation download and version tracking.
///
/// Fetches the official offline documentation archive, extracts it under
/// the data directory, and records the installed version in a marker file
/// so later runs can detect newer releases.
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use regex::Regex;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

const OFFLINE_DOCS_PAGE: &str = "https://docs.unity3d.com/Manual/OfflineDocumentation.html";
const ARCHIVE_FILENAME: &str = "UnityDocumentation.zip";
const MARKER_FILENAME: &str = "version.json";

// Used when the offline documentation page cannot be scraped
const FALLBACK_VERSION: &str = "2022.3";
const FALLBACK_URL: &str =
    "https://cloudmedia-docs.unity3d.com/docscloudstorage/en/2022.3/UnityDocumentation.zip";

/// The installed-documentation marker, stored as `version.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionMarker {
    pub version: String,
    pub url: String,
    pub downloaded_at: DateTime<Utc>,
}

/// An available documentation release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocsRelease {
    pub version: String,
    pub url: String,
}

pub struct DocsDownloader {
    data_dir: PathBuf,
    client: reqwest::blocking::Client,
}

impl DocsDownloader {
    pub fn new<P: Into<PathBuf>>(data_dir: P) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(600))
            .user_agent(concat!("unidocs/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();
        Self {
            data_dir: data_dir.into(),
            client,
        }
    }

    fn marker_path(&self) -> PathBuf {
        self.data_dir.join(MARKER_FILENAME)
    }

    fn extract_dir(&self) -> PathBuf {
        self.data_dir.join("unity_documentation")
    }

    /// Version recorded by the last successful download, if any.
    pub fn installed_version(&self) -> Option<String> {
        let data = fs::read_to_string(self.marker_path()).ok()?;
        let marker: VersionMarker = serde_json::from_str(&data).ok()?;
        Some(marker.version)
    }

    /// Scrape the offline documentation page for the current archive link.
    ///
    /// Falls back to a known release when the page cannot be reached or
    /// no archive link is found.
    pub fn latest_release(&self) -> DocsRelease {
        match self.scrape_release() {
            Ok(release) => release,
            Err(e) => {
                warn!("Could not determine latest documentation release: {e}");
                DocsRelease {
                    version: FALLBACK_VERSION.to_string(),
                    url: FALLBACK_URL.to_string(),
                }
            }
        }
    }

    fn scrape_release(&self) -> Result<DocsRelease> {
        let resp = self
            .client
            .get(OFFLINE_DOCS_PAGE)
            .send()
            .context("offline documentation page request failed")?;
        if !resp.status().is_success() {
            bail!("offline documentation page returned {}", resp.status());
        }
        let body = resp.text().context("failed to read page body")?;

        let document = Html::parse_document(&body);
        let selector =
            Selector::parse(r#"a[href*="UnityDocumentation.zip"]"#).expect("valid selector");
        let href = document
            .select(&selector)
            .filter_map(|a| a.value().attr("href"))
            .next()
            .context("no archive link on offline documentation page")?;

        let url = if href.starts_with("http") {
            href.to_string()
        } else {
            format!("https://docs.unity3d.com{href}")
        };

        Ok(DocsRelease {
            version: version_from_url(&url).unwrap_or_else(|| FALLBACK_VERSION.to_string()),
            url,
        })
    }

    /// Whether a newer release than the installed one is available.
    pub fn update_available(&self) -> bool {
        match self.installed_version() {
            Some(installed) => {
                let latest = self.latest_release();
                if latest.version != installed {
                    info!(
                        "Documentation update available: {} -> {}",
                        installed, latest.version
                    );
                    true
                } else {
                    debug!("Documentation is up to date ({installed})");
                    false
                }
            }
            None => true,
        }
    }

    /// Download and extract the documentation archive.
    ///
    /// Skips the download when the installed version already matches the
    /// latest release, unless `force` is set. Returns the extracted
    /// documentation root.
    pub fn download_and_extract(&self, force: bool) -> Result<PathBuf> {
        let release = self.latest_release();

        if !force && self.installed_version().as_deref() == Some(release.version.as_str()) {
            info!("Documentation {} already installed", release.version);
            return self.docs_root();
        }

        fs::create_dir_all(&self.data_dir).with_context(|| {
            format!("failed to create data directory: {}", self.data_dir.display())
        })?;

        let archive_path = self.data_dir.join(ARCHIVE_FILENAME);
        eprintln!("[INFO] Downloading documentation {} ...", release.version);
        self.download_archive(&release.url, &archive_path)?;

        info!("Extracting {}", archive_path.display());
        let extract_dir = self.extract_dir();
        if extract_dir.exists() {
            fs::remove_dir_all(&extract_dir).context("failed to remove previous extraction")?;
        }
        extract_archive(&archive_path, &extract_dir)?;
        let _ = fs::remove_file(&archive_path);

        let marker = VersionMarker {
            version: release.version.clone(),
            url: release.url.clone(),
            downloaded_at: Utc::now(),
        };
        fs::write(
            self.marker_path(),
            serde_json::to_string_pretty(&marker).context("failed to serialize marker")?,
        )
        .context("failed to write version marker")?;

        info!("Documentation {} installed", release.version);
        self.docs_root()
    }

    fn download_archive(&self, url: &str, dest: &Path) -> Result<()> {
        let resp = self
            .client
            .get(url)
            .send()
            .with_context(|| format!("HTTP request failed: {url}"))?;
        if !resp.status().is_success() {
            bail!("bad status: {} for {url}", resp.status());
        }

        let total = resp.content_length().unwrap_or(0);
        let pb = if total > 0 {
            let pb = ProgressBar::new(total);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("  {bar:40.cyan/blue} {percent}% ({bytes}/{total_bytes}) {msg}")
                    .expect("valid template")
                    .progress_chars("█▓░"),
            );
            pb
        } else {
            ProgressBar::new_spinner()
        };

        let mut file = fs::File::create(dest)
            .with_context(|| format!("failed to create file: {}", dest.display()))?;
        let mut reader = pb.wrap_read(resp);
        std::io::copy(&mut reader, &mut file).context("failed to write archive")?;
        pb.finish_and_clear();
        Ok(())
    }

    /// Root of the extracted documentation tree, the directory holding
    /// the `Manual` and `ScriptReference` sections.
    pub fn docs_root(&self) -> Result<PathBuf> {
        let base = self.extract_dir();
        find_docs_root(&base).with_context(|| {
            format!(
                "no documentation sections found under {}; run the download first",
                base.display()
            )
        })
    }

    pub fn manual_path(&self) -> Result<PathBuf> {
        Ok(self.docs_root()?.join("Manual"))
    }

    pub fn script_reference_path(&self) -> Result<PathBuf> {
        Ok(self.docs_root()?.join("ScriptReference"))
    }
}

/// Archive layouts differ between releases; try the known nestings in turn.
fn find_docs_root(base: &Path) -> Option<PathBuf> {
    let candidates = [
        base.to_path_buf(),
        base.join("Documentation"),
        base.join("Documentation").join("en"),
        base.join("en"),
    ];
    candidates.into_iter().find(|dir| {
        dir.join("Manual").is_dir() || dir.join("ScriptReference").is_dir()
    })
}

fn version_from_url(url: &str) -> Option<String> {
    use std::sync::LazyLock;
    static RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"/(\d+\.\d+)/").expect("valid regex"));
    RE.captures(url).map(|caps| caps[1].to_string())
}

fn extract_archive(archive_path: &Path, dest: &Path) -> Result<()> {
    let file = fs::File::open(archive_path)
        .with_context(|| format!("failed to open archive: {}", archive_path.display()))?;
    let mut archive = zip::ZipArchive::new(file).context("invalid zip archive")?;

    fs::create_dir_all(dest)
        .with_context(|| format!("failed to create directory: {}", dest.display()))?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).context("failed to read zip entry")?;
        // enclosed_name rejects entries escaping the destination
        let Some(rel) = entry.enclosed_name() else {
            warn!("Skipping unsafe zip entry: {}", entry.name());
            continue;
        };
        let out_path = dest.join(rel);

        if entry.is_dir() {
            fs::create_dir_all(&out_path)?;
            continue;
        }
        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out_file = fs::File::create(&out_path)
            .with_context(|| format!("failed to create file: {}", out_path.display()))?;
        std::io::copy(&mut entry, &mut out_file)
            .with_context(|| format!("failed to extract: {}", out_path.display()))?;
    }

    Ok(())
}
