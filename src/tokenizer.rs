//! Token estimation for the context compressor.
//!
//! With the `hf-tokenizer` feature, `[tokenizer] path` points at a
//! HuggingFace `tokenizer.json` whose encoding length is used as the token
//! count. Without it (or without a path) the compressor's `chars / 2`
//! heuristic applies.

use anyhow::Result;
use lumidesk_core::TokenEstimator;

use crate::config::TokenizerConfig;

#[cfg(feature = "hf-tokenizer")]
pub struct HfTokenEstimator {
    tokenizer: tokenizers::Tokenizer,
}

#[cfg(feature = "hf-tokenizer")]
impl HfTokenEstimator {
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let tokenizer = tokenizers::Tokenizer::from_file(path).map_err(|e| {
            anyhow::anyhow!("Failed to load tokenizer {}: {}", path.display(), e)
        })?;
        Ok(Self { tokenizer })
    }
}

#[cfg(feature = "hf-tokenizer")]
impl TokenEstimator for HfTokenEstimator {
    fn estimate(&self, text: &str) -> Result<usize> {
        let encoding = self
            .tokenizer
            .encode(text, false)
            .map_err(|e| anyhow::anyhow!("Tokenization failed: {}", e))?;
        Ok(encoding.len())
    }
}

/// Build the configured estimator, or `None` to use the heuristic.
#[cfg(feature = "hf-tokenizer")]
pub fn load_estimator(config: &TokenizerConfig) -> Result<Option<Box<dyn TokenEstimator>>> {
    match &config.path {
        Some(path) => Ok(Some(Box::new(HfTokenEstimator::from_file(path)?))),
        None => Ok(None),
    }
}

/// Build the configured estimator, or `None` to use the heuristic.
#[cfg(not(feature = "hf-tokenizer"))]
pub fn load_estimator(config: &TokenizerConfig) -> Result<Option<Box<dyn TokenEstimator>>> {
    if let Some(path) = &config.path {
        tracing::warn!(
            path = %path.display(),
            "tokenizer.path ignored: built without the hf-tokenizer feature"
        );
    }
    Ok(None)
}
