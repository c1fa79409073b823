//! Similarity search abstraction.
//!
//! The [`Retriever`] trait is the only way the core reaches the document
//! index. It is treated as an opaque nearest-neighbour service: given a
//! query, an optional category filter, and a result count, it returns up to
//! `k` items ordered best-first.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{Category, RetrievedItem};

/// Nearest-neighbour search over indexed chunks.
///
/// # Contract
///
/// - At most `k` items are returned.
/// - Items are ordered best-first (ascending score for distance backends).
/// - When `filter` is `Some`, only items whose metadata category equals the
///   filter are returned.
/// - Failures are returned as errors; the core never retries them.
#[async_trait]
pub trait Retriever: Send + Sync {
    async fn search(
        &self,
        query: &str,
        k: usize,
        filter: Option<Category>,
    ) -> Result<Vec<RetrievedItem>>;
}

#[async_trait]
impl<R: Retriever + ?Sized> Retriever for &R {
    async fn search(
        &self,
        query: &str,
        k: usize,
        filter: Option<Category>,
    ) -> Result<Vec<RetrievedItem>> {
        (**self).search(query, k, filter).await
    }
}

#[async_trait]
impl<R: Retriever + ?Sized> Retriever for Box<R> {
    async fn search(
        &self,
        query: &str,
        k: usize,
        filter: Option<Category>,
    ) -> Result<Vec<RetrievedItem>> {
        (**self).search(query, k, filter).await
    }
}
