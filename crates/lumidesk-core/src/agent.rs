//! The answer agent: compress, draft, then refine a fixed number of rounds.
//!
//! The run is a linear plan computed before the first call:
//!
//! ```text
//! [Compress]? ─▶ Draft ─▶ Refine 1 ─▶ … ─▶ Refine N
//! ```
//!
//! Every step is exactly one completion call, announced to the progress
//! reporter immediately before it is issued. Calls are strictly sequential
//! because each refine round consumes the previous answer. Any failed call
//! aborts the whole run; there is no partial answer and no retry.

use std::time::Instant;

use tracing::debug;

use crate::completion::CompletionService;
use crate::compress::{self, CompressConfig, TokenEstimator};
use crate::error::DeskError;
use crate::models::Message;
use crate::progress::{ProgressEvent, ProgressReporter};
use crate::prompts;

#[derive(Debug, Clone, Copy, Default)]
pub struct AgentConfig {
    /// Number of refine rounds after the draft.
    pub rounds: usize,
    pub compress: CompressConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Compress,
    Draft,
    Refine { round: usize, of: usize },
}

impl Step {
    fn label(&self) -> String {
        match self {
            Step::Compress => prompts::COMPRESS_LABEL.to_string(),
            Step::Draft => prompts::DRAFT_LABEL.to_string(),
            Step::Refine { round, of } => prompts::refine_label(*round, *of),
        }
    }
}

fn plan(compress: bool, rounds: usize) -> Vec<Step> {
    let mut steps = Vec::with_capacity(rounds + 2);
    if compress {
        steps.push(Step::Compress);
    }
    steps.push(Step::Draft);
    steps.extend((1..=rounds).map(|round| Step::Refine { round, of: rounds }));
    steps
}

/// Runs the answer pipeline against a [`CompletionService`].
pub struct AnswerAgent<C> {
    completion: C,
    config: AgentConfig,
    estimator: Option<Box<dyn TokenEstimator>>,
}

impl<C: CompletionService> AnswerAgent<C> {
    pub fn new(completion: C, config: AgentConfig) -> Self {
        Self {
            completion,
            config,
            estimator: None,
        }
    }

    /// Use `estimator` instead of the character heuristic for the
    /// compression decision.
    pub fn with_estimator(mut self, estimator: Box<dyn TokenEstimator>) -> Self {
        self.estimator = Some(estimator);
        self
    }

    /// Produce an answer for `question` grounded in `context`.
    ///
    /// Issues `compress? + 1 + rounds` completion calls in order and
    /// returns the output of the last one.
    ///
    /// # Errors
    ///
    /// - [`DeskError::EmptyQuery`] when `question` is blank (no call is made).
    /// - [`DeskError::Completion`] from the first failed call.
    pub async fn answer(
        &self,
        question: &str,
        context: &str,
        progress: Option<&dyn ProgressReporter>,
    ) -> Result<String, DeskError> {
        if question.trim().is_empty() {
            return Err(DeskError::EmptyQuery);
        }

        let estimator = self.estimator.as_deref();
        let steps = plan(
            compress::needs_compression(context, &self.config.compress, estimator),
            self.config.rounds,
        );
        let total = steps.len();

        // Borrowed until compression replaces it; the caller's context is never touched.
        let mut working: std::borrow::Cow<'_, str> = context.into();
        let mut answer = String::new();

        for (i, step) in steps.iter().enumerate() {
            if let Some(reporter) = progress {
                reporter.report(&ProgressEvent {
                    label: step.label(),
                    step: i + 1,
                    total,
                });
            }

            let started = Instant::now();
            match step {
                Step::Compress => {
                    let digest =
                        compress::compress(&self.completion, &working, question, &self.config.compress)
                            .await?;
                    working = digest.into();
                }
                Step::Draft => {
                    answer = self.draft(question, &working).await?;
                }
                Step::Refine { .. } => {
                    answer = self.refine(question, &answer).await?;
                }
            }
            debug!(
                step = i + 1,
                total,
                kind = ?step,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "agent step complete"
            );
        }

        Ok(answer)
    }

    /// Single draft call with the full context: no compression, no refine
    /// rounds, no progress. Used when agent mode is off.
    pub async fn answer_direct(&self, question: &str, context: &str) -> Result<String, DeskError> {
        if question.trim().is_empty() {
            return Err(DeskError::EmptyQuery);
        }
        self.draft(question, context).await
    }

    async fn draft(&self, question: &str, context: &str) -> Result<String, DeskError> {
        let messages = [
            Message::system(prompts::SYSTEM_PROMPT),
            Message::user(prompts::draft_prompt(context, question)),
        ];
        self.call(&messages).await
    }

    async fn refine(&self, question: &str, answer: &str) -> Result<String, DeskError> {
        let messages = [
            Message::system(prompts::SYSTEM_PROMPT),
            Message::user(prompts::refine_prompt(question, answer)),
        ];
        self.call(&messages).await
    }

    async fn call(&self, messages: &[Message]) -> Result<String, DeskError> {
        self.completion
            .complete(messages)
            .await
            .map_err(DeskError::Completion)
    }
}

/// Run the agent once with default compression settings.
pub async fn answer<C: CompletionService + ?Sized>(
    completion: &C,
    question: &str,
    context: &str,
    rounds: usize,
    progress: Option<&dyn ProgressReporter>,
) -> Result<String, DeskError> {
    let agent = AnswerAgent::new(
        completion,
        AgentConfig {
            rounds,
            ..AgentConfig::default()
        },
    );
    agent.answer(question, context, progress).await
}
