//! In-memory [`Retriever`] implementation for tests and offline setups.
//!
//! Items live in a `Vec` behind `std::sync::RwLock`. Scoring is keyword
//! overlap expressed as a distance (see [`keyword_distance`]), so the
//! results follow the same lower-is-better convention as vector backends.

use std::sync::RwLock;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::models::{Category, ItemMetadata, RetrievedItem};

use super::Retriever;

struct StoredItem {
    text: String,
    metadata: ItemMetadata,
}

/// Keyword-overlap retriever held entirely in memory.
pub struct InMemoryRetriever {
    items: RwLock<Vec<StoredItem>>,
}

impl InMemoryRetriever {
    pub fn new() -> Self {
        Self {
            items: RwLock::new(Vec::new()),
        }
    }

    /// Add one chunk of text with its metadata.
    pub fn insert(&self, text: impl Into<String>, metadata: ItemMetadata) -> Result<()> {
        let mut items = self
            .items
            .write()
            .map_err(|_| anyhow!("in-memory retriever lock poisoned"))?;
        items.push(StoredItem {
            text: text.into(),
            metadata,
        });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.items.read().map(|items| items.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryRetriever {
    fn default() -> Self {
        Self::new()
    }
}

/// Keyword-overlap distance between a query and a chunk of text.
///
/// Terms are the query's whitespace-separated tokens, lowercased; an
/// unsegmented query (for example Japanese) is a single term. Returns
/// `1 - matched / total`, or `None` when no term occurs in the text.
pub fn keyword_distance(query: &str, text: &str) -> Option<f64> {
    let query_lower = query.to_lowercase();
    let terms: Vec<&str> = query_lower.split_whitespace().collect();
    if terms.is_empty() {
        return None;
    }
    let text_lower = text.to_lowercase();
    let matched = terms.iter().filter(|t| text_lower.contains(*t)).count();
    if matched == 0 {
        return None;
    }
    Some(1.0 - matched as f64 / terms.len() as f64)
}

#[async_trait]
impl Retriever for InMemoryRetriever {
    async fn search(
        &self,
        query: &str,
        k: usize,
        filter: Option<Category>,
    ) -> Result<Vec<RetrievedItem>> {
        let items = self
            .items
            .read()
            .map_err(|_| anyhow!("in-memory retriever lock poisoned"))?;

        let mut hits: Vec<RetrievedItem> = items
            .iter()
            .filter(|item| filter.map_or(true, |c| item.metadata.category == c))
            .filter_map(|item| {
                keyword_distance(query, &item.text).map(|score| RetrievedItem {
                    text: item.text.clone(),
                    metadata: item.metadata.clone(),
                    score,
                })
            })
            .collect();

        hits.sort_by(|a, b| {
            a.score
                .partial_cmp(&b.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(k);
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(source: &str, category: Category) -> ItemMetadata {
        ItemMetadata {
            source: source.to_string(),
            page: Some(0),
            category,
        }
    }

    #[test]
    fn distance_all_terms_is_zero() {
        assert_eq!(keyword_distance("refund policy", "Our refund policy is simple"), Some(0.0));
    }

    #[test]
    fn distance_partial_match() {
        let d = keyword_distance("refund window days", "refund within 14 days").unwrap();
        assert!((d - (1.0 - 2.0 / 3.0)).abs() < 1e-9);
    }

    #[test]
    fn distance_no_match_is_none() {
        assert_eq!(keyword_distance("invoice", "cancellation terms"), None);
        assert_eq!(keyword_distance("   ", "anything"), None);
    }

    #[test]
    fn distance_unsegmented_query() {
        assert_eq!(keyword_distance("解約", "解約は月末に有効になります"), Some(0.0));
    }

    #[tokio::test]
    async fn search_orders_best_first_and_truncates() {
        let r = InMemoryRetriever::new();
        r.insert("refund only", meta("data/service/a.pdf", Category::Service))
            .unwrap();
        r.insert("refund policy details", meta("data/service/b.pdf", Category::Service))
            .unwrap();
        r.insert("unrelated", meta("data/company/c.pdf", Category::Company))
            .unwrap();

        let hits = r.search("refund policy", 5, None).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].metadata.source, "data/service/b.pdf");
        assert!(hits[0].score <= hits[1].score);

        let hits = r.search("refund policy", 1, None).await.unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[tokio::test]
    async fn search_applies_category_filter() {
        let r = InMemoryRetriever::new();
        r.insert("contact support", meta("data/service/a.pdf", Category::Service))
            .unwrap();
        r.insert("contact the office", meta("data/company/b.pdf", Category::Company))
            .unwrap();

        let hits = r.search("contact", 5, Some(Category::Company)).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].metadata.category, Category::Company);
    }
}
