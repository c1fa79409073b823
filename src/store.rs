//! SQLite-backed chunk index and [`Retriever`] implementation.
//!
//! [`SqliteStore`] owns the write side: a full rebuild replaces every chunk
//! in one transaction and records what the index was built with.
//! [`SqliteRetriever`] reads it back. With an embedding provider it ranks
//! by cosine distance against stored vectors (brute force); without one it
//! ranks by keyword-overlap distance. Either way scores are lower-is-better.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use lumidesk_core::chunk::Chunk;
use lumidesk_core::embedding::{blob_to_vec, cosine_distance, vec_to_blob};
use lumidesk_core::retriever::memory::keyword_distance;
use lumidesk_core::{Category, EmbeddingProvider, Retriever, RetrievedItem};
use lumidesk_core::models::ItemMetadata;

use crate::config::Config;
use crate::embedding::{create_provider, embed_query};
use crate::{db, migrate};

/// A chunk with its provenance and optional vector, ready to insert.
#[derive(Debug, Clone)]
pub struct IndexedChunk {
    pub chunk: Chunk,
    pub metadata: ItemMetadata,
    pub embedding: Option<Vec<f32>>,
}

/// What the current index was built with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexMeta {
    pub embedding_model: Option<String>,
    pub dims: Option<usize>,
    pub built_at: Option<String>,
}

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Replace the whole index with `chunks` in a single transaction.
    pub async fn rebuild(&self, chunks: &[IndexedChunk], meta: &IndexMeta) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM chunks").execute(&mut *tx).await?;
        sqlx::query("DELETE FROM index_meta")
            .execute(&mut *tx)
            .await?;

        for item in chunks {
            let blob = item.embedding.as_deref().map(vec_to_blob);
            sqlx::query(
                r#"
                INSERT INTO chunks (id, source, page, category, chunk_index, text, hash, embedding)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&item.chunk.id)
            .bind(&item.metadata.source)
            .bind(item.metadata.page.map(i64::from))
            .bind(item.metadata.category.as_str())
            .bind(item.chunk.chunk_index as i64)
            .bind(&item.chunk.text)
            .bind(&item.chunk.hash)
            .bind(blob)
            .execute(&mut *tx)
            .await?;
        }

        let entries = [
            ("embedding_model", meta.embedding_model.clone()),
            ("dims", meta.dims.map(|d| d.to_string())),
            ("built_at", meta.built_at.clone()),
        ];
        for (key, value) in entries {
            if let Some(value) = value {
                sqlx::query("INSERT INTO index_meta (key, value) VALUES (?, ?)")
                    .bind(key)
                    .bind(value)
                    .execute(&mut *tx)
                    .await?;
            }
        }

        tx.commit().await?;
        Ok(())
    }

    pub async fn meta(&self) -> Result<IndexMeta> {
        let rows = sqlx::query("SELECT key, value FROM index_meta")
            .fetch_all(&self.pool)
            .await?;

        let mut meta = IndexMeta::default();
        for row in rows {
            let key: String = row.get("key");
            let value: String = row.get("value");
            match key.as_str() {
                "embedding_model" => meta.embedding_model = Some(value),
                "dims" => meta.dims = value.parse().ok(),
                "built_at" => meta.built_at = Some(value),
                _ => {}
            }
        }
        Ok(meta)
    }

    pub async fn count_chunks(&self) -> Result<i64> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chunks")
            .fetch_one(&self.pool)
            .await?;
        Ok(n)
    }

    async fn load(&self, filter: Option<Category>) -> Result<Vec<StoredRow>> {
        let rows = match filter {
            Some(category) => {
                sqlx::query(
                    "SELECT text, source, page, category, embedding FROM chunks WHERE category = ?",
                )
                .bind(category.as_str())
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query("SELECT text, source, page, category, embedding FROM chunks")
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        rows.into_iter()
            .map(|row| {
                let page: Option<i64> = row.get("page");
                let category: String = row.get("category");
                let embedding: Option<Vec<u8>> = row.get("embedding");
                Ok(StoredRow {
                    text: row.get("text"),
                    metadata: ItemMetadata {
                        source: row.get("source"),
                        page: page.and_then(|p| u32::try_from(p).ok()),
                        category: category.parse().unwrap_or_default(),
                    },
                    embedding: embedding.map(|b| blob_to_vec(&b)),
                })
            })
            .collect()
    }
}

struct StoredRow {
    text: String,
    metadata: ItemMetadata,
    embedding: Option<Vec<f32>>,
}

/// [`Retriever`] over the SQLite chunk index.
pub struct SqliteRetriever {
    store: SqliteStore,
    embedder: Option<Box<dyn EmbeddingProvider>>,
}

impl SqliteRetriever {
    /// Keyword-overlap retrieval; no embedding calls.
    pub fn keyword(store: SqliteStore) -> Self {
        Self {
            store,
            embedder: None,
        }
    }

    /// Vector retrieval with `embedder`.
    ///
    /// Fails when the index was built with a different embedding model or
    /// without embeddings, since stored vectors would not be comparable.
    pub async fn vector(store: SqliteStore, embedder: Box<dyn EmbeddingProvider>) -> Result<Self> {
        let meta = store.meta().await.context("Failed to read index metadata")?;
        match meta.embedding_model.as_deref() {
            Some(model) if model == embedder.model_name() => {}
            Some(model) => bail!(
                "Index was built with embedding model '{}' but '{}' is configured. Run `desk index` again.",
                model,
                embedder.model_name()
            ),
            None => bail!("Index was built without embeddings. Run `desk index` with an embedding provider configured."),
        }
        Ok(Self {
            store,
            embedder: Some(embedder),
        })
    }
}

/// Open the configured index for reading.
///
/// Vector retrieval when `[embedding]` is enabled, keyword otherwise.
pub async fn open_retriever(config: &Config) -> Result<SqliteRetriever> {
    let pool = db::connect(config).await?;
    migrate::apply(&pool).await?;
    let store = SqliteStore::new(pool);

    if config.embedding.is_enabled() {
        let embedder = create_provider(&config.embedding)?;
        SqliteRetriever::vector(store, embedder).await
    } else {
        Ok(SqliteRetriever::keyword(store))
    }
}

#[async_trait]
impl Retriever for SqliteRetriever {
    async fn search(
        &self,
        query: &str,
        k: usize,
        filter: Option<Category>,
    ) -> Result<Vec<RetrievedItem>> {
        let rows = self.store.load(filter).await?;

        let mut hits: Vec<RetrievedItem> = match &self.embedder {
            Some(embedder) => {
                let query_vec = embed_query(embedder.as_ref(), query).await?;
                rows.into_iter()
                    .filter_map(|row| {
                        let vec = row.embedding?;
                        Some(RetrievedItem {
                            score: cosine_distance(&query_vec, &vec),
                            text: row.text,
                            metadata: row.metadata,
                        })
                    })
                    .collect()
            }
            None => rows
                .into_iter()
                .filter_map(|row| {
                    let score = keyword_distance(query, &row.text)?;
                    Some(RetrievedItem {
                        score,
                        text: row.text,
                        metadata: row.metadata,
                    })
                })
                .collect(),
        };

        hits.sort_by(|a, b| a.score.total_cmp(&b.score));
        hits.truncate(k);

        tracing::debug!(
            mode = if self.embedder.is_some() { "vector" } else { "keyword" },
            hits = hits.len(),
            "sqlite search"
        );
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumidesk_core::chunk::chunk_text;

    struct AxisEmbedder;

    #[async_trait]
    impl EmbeddingProvider for AxisEmbedder {
        fn model_name(&self) -> &str {
            "axis"
        }
        fn dims(&self) -> usize {
            2
        }
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts
                .iter()
                .map(|t| {
                    if t.contains("返金") {
                        vec![1.0, 0.0]
                    } else {
                        vec![0.0, 1.0]
                    }
                })
                .collect())
        }
    }

    async fn store_in(dir: &tempfile::TempDir) -> SqliteStore {
        let pool = db::connect_path(&dir.path().join("desk.sqlite")).await.unwrap();
        migrate::apply(&pool).await.unwrap();
        SqliteStore::new(pool)
    }

    fn indexed(text: &str, source: &str, page: u32, embedding: Option<Vec<f32>>) -> IndexedChunk {
        IndexedChunk {
            chunk: chunk_text(text, 500, 100).remove(0),
            metadata: ItemMetadata {
                source: source.to_string(),
                page: Some(page),
                category: Category::from_source_path(source),
            },
            embedding,
        }
    }

    #[tokio::test]
    async fn rebuild_replaces_everything() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir).await;

        store
            .rebuild(
                &[indexed("old text", "data/service/a.pdf", 0, None)],
                &IndexMeta::default(),
            )
            .await
            .unwrap();
        store
            .rebuild(
                &[
                    indexed("返金は14日以内", "data/service/refund.pdf", 0, None),
                    indexed("本社は東京", "data/company/about.pdf", 2, None),
                ],
                &IndexMeta {
                    built_at: Some("2026-01-01T00:00:00Z".to_string()),
                    ..IndexMeta::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(store.count_chunks().await.unwrap(), 2);
        let meta = store.meta().await.unwrap();
        assert_eq!(meta.embedding_model, None);
        assert_eq!(meta.built_at.as_deref(), Some("2026-01-01T00:00:00Z"));
    }

    #[tokio::test]
    async fn keyword_search_filters_and_ranks() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir).await;
        store
            .rebuild(
                &[
                    indexed("返金は14日以内に申請してください", "data/service/refund.pdf", 3, None),
                    indexed("会社概要と返金方針", "data/company/about.pdf", 0, None),
                    indexed("ログイン手順", "data/service/login.pdf", 1, None),
                ],
                &IndexMeta::default(),
            )
            .await
            .unwrap();

        let retriever = SqliteRetriever::keyword(store);
        let hits = retriever.search("返金", 5, None).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|h| h.score == 0.0));

        let hits = retriever
            .search("返金", 5, Some(Category::Service))
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].metadata.source, "data/service/refund.pdf");
        assert_eq!(hits[0].metadata.page, Some(3));
        assert_eq!(hits[0].metadata.category, Category::Service);
    }

    #[tokio::test]
    async fn vector_search_orders_by_distance() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir).await;
        store
            .rebuild(
                &[
                    indexed("ログイン手順", "data/service/login.pdf", 0, Some(vec![0.0, 1.0])),
                    indexed("返金条件", "data/service/refund.pdf", 0, Some(vec![1.0, 0.1])),
                ],
                &IndexMeta {
                    embedding_model: Some("axis".to_string()),
                    dims: Some(2),
                    built_at: None,
                },
            )
            .await
            .unwrap();

        let retriever = SqliteRetriever::vector(store, Box::new(AxisEmbedder))
            .await
            .unwrap();
        let hits = retriever.search("返金したい", 2, None).await.unwrap();
        assert_eq!(hits[0].metadata.source, "data/service/refund.pdf");
        assert!(hits[0].score < hits[1].score);
        assert!(hits[0].score < 0.01);
    }

    #[tokio::test]
    async fn vector_mode_rejects_model_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir).await;
        store
            .rebuild(
                &[indexed("x", "data/a.pdf", 0, None)],
                &IndexMeta::default(),
            )
            .await
            .unwrap();
        let err = SqliteRetriever::vector(store, Box::new(AxisEmbedder))
            .await
            .err()
            .unwrap();
        assert!(err.to_string().contains("without embeddings"));
    }
}
