use anyhow::Result;
use lumidesk_core::{Category, DeskError, Retriever};

use crate::config::Config;
use crate::render::render_hits;
use crate::store::open_retriever;

/// `desk search`: print raw ranked hits without calling the chat model.
pub async fn run_search(
    config: &Config,
    query: &str,
    category: Option<Category>,
    k: Option<usize>,
) -> Result<()> {
    if query.trim().is_empty() {
        return Err(DeskError::EmptyQuery.into());
    }

    let retriever = open_retriever(config).await?;
    let k = k.unwrap_or(config.retrieval.top_k).max(1);
    let hits = retriever
        .search(query, k, category.and_then(Category::as_filter))
        .await?;

    print!("{}", render_hits(&hits, config.retrieval.quote_max_chars));
    Ok(())
}
