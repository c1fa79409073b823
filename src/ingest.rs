//! Index building: walk the data root, extract pages, chunk, embed, store.
//!
//! ```text
//! data/
//! ├── company/   → category "company"
//! ├── customer/  → category "customer"
//! ├── service/   → category "service"
//! └── other.pdf  → category "unknown"
//! ```
//!
//! PDFs are split per page (page numbers stored 0-based). Plain-text files
//! (`.txt`, `.md`) are indexed as a single unpaged source. Each run rebuilds
//! the index from scratch; files that cannot be read are skipped with a
//! warning.

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

use lumidesk_core::chunk::chunk_text;
use lumidesk_core::models::ItemMetadata;
use lumidesk_core::{Category, EmbeddingProvider};

use crate::config::Config;
use crate::embedding::{create_provider, embed_batched};
use crate::store::{IndexMeta, IndexedChunk, SqliteStore};
use crate::{db, migrate};

const PDF_EXTENSION: &str = "pdf";
const TEXT_EXTENSIONS: &[&str] = &["txt", "md"];

/// Counters printed after `desk index`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexStats {
    pub files: usize,
    pub skipped: usize,
    pub pages: usize,
    pub chunks: usize,
    pub embedded: usize,
}

/// One page (or whole text file) of extracted text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// 0-based page number; `None` for unpaged sources.
    pub number: Option<u32>,
    pub text: String,
}

/// `desk index`: open the database and rebuild with the configured
/// embedding provider, if any.
pub async fn run_index(config: &Config) -> Result<IndexStats> {
    let pool = db::connect(config).await?;
    migrate::apply(&pool).await?;
    let store = SqliteStore::new(pool);

    let embedder = if config.embedding.is_enabled() {
        Some(create_provider(&config.embedding)?)
    } else {
        None
    };

    let stats = build_index(config, &store, embedder.as_deref()).await?;
    store.pool().close().await;
    Ok(stats)
}

/// Rebuild the index from `config.data.root`.
///
/// # Errors
///
/// Fails when the data root is missing, when it contains no supported
/// files, or when embedding or storage fails. Unreadable individual files
/// are counted in [`IndexStats::skipped`] instead.
pub async fn build_index(
    config: &Config,
    store: &SqliteStore,
    embedder: Option<&dyn EmbeddingProvider>,
) -> Result<IndexStats> {
    let root = &config.data.root;
    let files = discover(root)?;
    if files.is_empty() {
        bail!(
            "No PDF or text files found under {}",
            root.display()
        );
    }

    let prefix = source_prefix(root)?;
    let mut stats = IndexStats {
        files: files.len(),
        ..IndexStats::default()
    };
    let mut indexed = Vec::new();

    for path in &files {
        let pages = match extract_pages(path) {
            Ok(pages) => pages,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping unreadable file");
                stats.skipped += 1;
                continue;
            }
        };

        let source = source_for(&prefix, root, path);
        let category = Category::from_source_path(&source);

        for page in pages {
            stats.pages += 1;
            for chunk in chunk_text(
                &page.text,
                config.chunking.chunk_chars,
                config.chunking.overlap_chars,
            ) {
                indexed.push(IndexedChunk {
                    chunk,
                    metadata: ItemMetadata {
                        source: source.clone(),
                        page: page.number,
                        category,
                    },
                    embedding: None,
                });
            }
        }
    }
    stats.chunks = indexed.len();

    let meta = match embedder {
        Some(embedder) => {
            let texts: Vec<String> = indexed.iter().map(|c| c.chunk.text.clone()).collect();
            let vectors = embed_batched(embedder, &texts, config.embedding.batch_size)
                .await
                .context("Failed to embed chunks")?;
            for (item, vector) in indexed.iter_mut().zip(vectors) {
                item.embedding = Some(vector);
            }
            stats.embedded = indexed.len();
            IndexMeta {
                embedding_model: Some(embedder.model_name().to_string()),
                dims: Some(embedder.dims()),
                built_at: Some(chrono::Utc::now().to_rfc3339()),
            }
        }
        None => IndexMeta {
            embedding_model: None,
            dims: None,
            built_at: Some(chrono::Utc::now().to_rfc3339()),
        },
    };

    store.rebuild(&indexed, &meta).await?;

    info!(
        files = stats.files,
        skipped = stats.skipped,
        pages = stats.pages,
        chunks = stats.chunks,
        embedded = stats.embedded,
        "index rebuilt"
    );
    Ok(stats)
}

/// Supported files under `root`, sorted by path.
pub fn discover(root: &Path) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        bail!("Data root does not exist or is not a directory: {}", root.display());
    }

    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(e) => Some(e),
            Err(err) => {
                warn!(error = %err, "skipping unreadable directory entry");
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| is_supported(p))
        .collect();
    files.sort();
    Ok(files)
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

fn is_supported(path: &Path) -> bool {
    match extension(path) {
        Some(ext) => ext == PDF_EXTENSION || TEXT_EXTENSIONS.contains(&ext.as_str()),
        None => false,
    }
}

/// Extract text per page. Blank pages are dropped.
pub fn extract_pages(path: &Path) -> Result<Vec<Page>> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;

    let pages = if extension(path).as_deref() == Some(PDF_EXTENSION) {
        pdf_extract::extract_text_from_mem_by_pages(&bytes)
            .map_err(|e| anyhow::anyhow!("PDF extraction failed: {}", e))?
            .into_iter()
            .enumerate()
            .map(|(i, text)| Page {
                number: u32::try_from(i).ok(),
                text,
            })
            .collect::<Vec<_>>()
    } else {
        let text = String::from_utf8(bytes)
            .with_context(|| format!("{} is not valid UTF-8", path.display()))?;
        vec![Page { number: None, text }]
    };

    Ok(pages
        .into_iter()
        .filter(|p| !p.text.trim().is_empty())
        .collect())
}

/// Name of the data root directory, used as the first segment of every source.
fn source_prefix(root: &Path) -> Result<String> {
    let canonical = root
        .canonicalize()
        .with_context(|| format!("Failed to resolve data root {}", root.display()))?;
    Ok(canonical
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default())
}

/// `path` relative to the data root's parent, with `/` separators.
fn source_for(prefix: &str, root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    let rel = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/");
    if prefix.is_empty() {
        rel
    } else {
        format!("{}/{}", prefix, rel)
    }
}
