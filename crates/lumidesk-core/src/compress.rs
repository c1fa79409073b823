//! Context compression.
//!
//! Long contexts are reduced to a bulleted digest of question-relevant facts
//! with a single completion call. Short contexts pass through untouched and
//! cost nothing: the threshold is a hard cutoff on estimated tokens.

use tracing::{debug, warn};

use crate::completion::CompletionService;
use crate::error::DeskError;
use crate::models::Message;
use crate::prompts;

/// Estimates how many model tokens a text occupies.
pub trait TokenEstimator: Send + Sync {
    fn estimate(&self, text: &str) -> anyhow::Result<usize>;
}

/// Conservative fallback estimate: one token per two characters.
pub struct CharHeuristic;

impl TokenEstimator for CharHeuristic {
    fn estimate(&self, text: &str) -> anyhow::Result<usize> {
        Ok(char_heuristic(text))
    }
}

fn char_heuristic(text: &str) -> usize {
    text.chars().count() / 2
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressConfig {
    /// Contexts estimated at or below this many tokens are left unchanged.
    pub threshold_tokens: usize,
    /// Output budget stated in the compression instruction.
    pub target_tokens: usize,
}

impl Default for CompressConfig {
    fn default() -> Self {
        Self {
            threshold_tokens: 1500,
            target_tokens: 300,
        }
    }
}

/// Estimate tokens with `estimator`, falling back to the character
/// heuristic when it is absent or fails.
pub fn estimate_tokens(text: &str, estimator: Option<&dyn TokenEstimator>) -> usize {
    match estimator {
        Some(e) => match e.estimate(text) {
            Ok(n) => n,
            Err(err) => {
                warn!(error = %err, "token estimation failed, using chars/2");
                char_heuristic(text)
            }
        },
        None => char_heuristic(text),
    }
}

/// Whether `context` exceeds the compression threshold.
pub fn needs_compression(
    context: &str,
    config: &CompressConfig,
    estimator: Option<&dyn TokenEstimator>,
) -> bool {
    let tokens = estimate_tokens(context, estimator);
    let needed = tokens > config.threshold_tokens;
    debug!(
        tokens,
        threshold = config.threshold_tokens,
        needed,
        "compression check"
    );
    needed
}

/// Issue exactly one completion call that digests `context` for `question`.
pub async fn compress<C: CompletionService + ?Sized>(
    completion: &C,
    context: &str,
    question: &str,
    config: &CompressConfig,
) -> Result<String, DeskError> {
    let messages = [
        Message::system(prompts::COMPRESS_SYSTEM_PROMPT),
        Message::user(prompts::compress_prompt(
            context,
            question,
            config.target_tokens,
        )),
    ];
    completion
        .complete(&messages)
        .await
        .map_err(DeskError::Completion)
}

/// Return `context` unchanged when it is short enough, otherwise the digest
/// produced by one completion call.
///
/// # Errors
///
/// [`DeskError::Completion`] when the compression call fails. Estimation
/// failures never surface; they degrade to the character heuristic.
pub async fn maybe_compress<C: CompletionService + ?Sized>(
    completion: &C,
    context: &str,
    question: &str,
    config: &CompressConfig,
    estimator: Option<&dyn TokenEstimator>,
) -> Result<String, DeskError> {
    if needs_compression(context, config, estimator) {
        compress(completion, context, question, config).await
    } else {
        Ok(context.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::testing::ScriptedCompletion;
    use anyhow::anyhow;

    struct FailingEstimator;

    impl TokenEstimator for FailingEstimator {
        fn estimate(&self, _text: &str) -> anyhow::Result<usize> {
            Err(anyhow!("tokenizer not loaded"))
        }
    }

    struct FixedEstimator(usize);

    impl TokenEstimator for FixedEstimator {
        fn estimate(&self, _text: &str) -> anyhow::Result<usize> {
            Ok(self.0)
        }
    }

    #[tokio::test]
    async fn short_context_makes_no_call() {
        let llm = ScriptedCompletion::new(["digest"]);
        let context = "解約は月末に有効になります。\n\n---\n\nrefund within 14 days";
        let out = maybe_compress(&llm, context, "解約", &CompressConfig::default(), None)
            .await
            .unwrap();
        assert_eq!(out.as_bytes(), context.as_bytes());
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn long_context_makes_exactly_one_call() {
        let llm = ScriptedCompletion::new(["- digest"]);
        let context = "x".repeat(3002);
        let out = maybe_compress(&llm, &context, "q", &CompressConfig::default(), None)
            .await
            .unwrap();
        assert_eq!(out, "- digest");
        assert_eq!(llm.call_count(), 1);
        let sent = &llm.calls()[0];
        assert!(sent[1].content.contains(&context));
        assert!(sent[1].content.contains("約300トークン"));
    }

    #[tokio::test]
    async fn threshold_is_inclusive() {
        let llm = ScriptedCompletion::new(["digest"]);
        let cfg = CompressConfig {
            threshold_tokens: 10,
            target_tokens: 5,
        };
        let est = FixedEstimator(10);
        let out = maybe_compress(&llm, "ctx", "q", &cfg, Some(&est)).await.unwrap();
        assert_eq!(out, "ctx");
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn compression_failure_propagates() {
        let llm = ScriptedCompletion::new(Vec::<String>::new()).with_failure_at(0, "HTTP 500");
        let context = "y".repeat(4000);
        let err = maybe_compress(&llm, &context, "q", &CompressConfig::default(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, DeskError::Completion(_)));
    }

    #[test]
    fn estimator_failure_falls_back_to_chars() {
        assert_eq!(estimate_tokens("abcdef", Some(&FailingEstimator)), 3);
        assert_eq!(estimate_tokens("解約返金", None), 2);
        assert_eq!(estimate_tokens("abc", Some(&FixedEstimator(42))), 42);
    }
}
