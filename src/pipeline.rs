//! One user turn, end to end.
//!
//! ```text
//! question
//!   ├─ rewrite_query_for_search ─┐
//!   └─ guess_category ───────────┴─▶ assemble ─▶ WeakMatchPolicy
//!                                                   │
//!          NoContext ◀──────────────────────────────┤
//!          WeakMatch ◀──────────────────────────────┤
//!          Generate ─▶ AnswerAgent (agent mode) or one direct draft
//! ```
//!
//! Contact guidance is attached only when the question asks about a
//! support-heavy topic.

use anyhow::Result;
use serde::Serialize;
use tracing::debug;

use lumidesk_core::assemble::assemble;
use lumidesk_core::{
    extract_contacts, guess_category, rewrite_query_for_search, wants_contact_guidance,
    AnswerAgent, AssembleOptions, Category, Citation, CompletionService, ContactInfo, DeskError,
    Disposition, ProgressReporter, Retriever, WeakMatchPolicy,
};

use crate::config::Config;
use crate::llm::create_completion;
use crate::store::{open_retriever, SqliteRetriever};
use crate::tokenizer::load_estimator;

/// Everything the presentation layer needs for one turn.
#[derive(Debug, Clone, Serialize)]
pub struct TurnOutcome {
    pub question: String,
    pub search_query: String,
    pub category: Category,
    pub disposition: Disposition,
    pub answer: String,
    pub citations: Vec<Citation>,
    pub contacts: Vec<ContactInfo>,
    pub best_score: Option<f64>,
}

/// Retrieval settings applied to every turn.
#[derive(Debug, Clone, Copy)]
pub struct TurnSettings {
    pub top_k: usize,
    pub assemble: AssembleOptions,
    pub policy: WeakMatchPolicy,
}

/// Wires a retriever and an answer agent into the per-turn pipeline.
pub struct Desk<R, C> {
    retriever: R,
    agent: AnswerAgent<C>,
    settings: TurnSettings,
}

impl<R: Retriever, C: CompletionService> Desk<R, C> {
    pub fn new(retriever: R, agent: AnswerAgent<C>, settings: TurnSettings) -> Self {
        Self {
            retriever,
            agent,
            settings,
        }
    }

    /// Answer `question`.
    ///
    /// With `agent_mode` the full compress/draft/refine run is used and
    /// `progress` receives its steps; otherwise a single draft call is made
    /// and `progress` is not used.
    ///
    /// # Errors
    ///
    /// Any [`DeskError`] from retrieval or completion; the turn produces no
    /// partial outcome.
    pub async fn run_turn(
        &self,
        question: &str,
        agent_mode: bool,
        progress: Option<&dyn ProgressReporter>,
    ) -> Result<TurnOutcome, DeskError> {
        if question.trim().is_empty() {
            return Err(DeskError::EmptyQuery);
        }

        let search_query = rewrite_query_for_search(question);
        let category = guess_category(question);

        let result = assemble(
            &self.retriever,
            &search_query,
            self.settings.top_k,
            category,
            self.settings.assemble,
        )
        .await?;

        let disposition = self.settings.policy.decide(&result);
        debug!(
            search_query = %search_query,
            category = category.as_str(),
            best_score = ?result.best_score,
            disposition = ?disposition,
            "turn routed"
        );

        let (answer, citations) = match disposition {
            Disposition::NoContext => (String::new(), Vec::new()),
            Disposition::WeakMatch => (String::new(), result.citations),
            Disposition::Generate => {
                let answer = if agent_mode {
                    self.agent.answer(question, &result.context, progress).await?
                } else {
                    self.agent.answer_direct(question, &result.context).await?
                };
                (answer, result.citations)
            }
        };
        let answer = match disposition.canned_reply() {
            Some(reply) => reply.to_string(),
            None => answer,
        };

        let contacts = if wants_contact_guidance(question) {
            extract_contacts(&citations)
        } else {
            Vec::new()
        };

        Ok(TurnOutcome {
            question: question.to_string(),
            search_query,
            category,
            disposition,
            answer,
            citations,
            contacts,
            best_score: result.best_score,
        })
    }
}

impl TurnSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            top_k: config.retrieval.top_k,
            assemble: config.retrieval.assemble_options(),
            policy: config.retrieval.policy(),
        }
    }
}

/// The desk the CLI runs: SQLite index plus the configured chat model.
pub type ConfiguredDesk = Desk<SqliteRetriever, Box<dyn CompletionService>>;

/// Build a [`ConfiguredDesk`] from `config`, with `rounds` overriding
/// `[agent] rounds` when given.
pub async fn open_desk(config: &Config, rounds: Option<usize>) -> Result<ConfiguredDesk> {
    let retriever = open_retriever(config).await?;
    let completion = create_completion(&config.llm)?;

    let mut agent = AnswerAgent::new(completion, config.agent.agent_config(rounds));
    if let Some(estimator) = load_estimator(&config.tokenizer)? {
        agent = agent.with_estimator(estimator);
    }

    Ok(Desk::new(retriever, agent, TurnSettings::from_config(config)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use lumidesk_core::models::ItemMetadata;
    use lumidesk_core::policy::{CLARIFICATION_MENU, NOT_FOUND_MESSAGE};
    use lumidesk_core::retriever::memory::InMemoryRetriever;
    use lumidesk_core::{AgentConfig, Message, ProgressEvent, ScoreType};
    use std::sync::Mutex;

    struct Recorded {
        replies: Mutex<Vec<String>>,
        calls: Mutex<usize>,
    }

    impl Recorded {
        fn new(replies: &[&str]) -> Self {
            Self {
                replies: Mutex::new(replies.iter().rev().map(|s| s.to_string()).collect()),
                calls: Mutex::new(0),
            }
        }
        fn calls(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl CompletionService for Recorded {
        async fn complete(&self, _messages: &[Message]) -> Result<String> {
            *self.calls.lock().unwrap() += 1;
            self.replies
                .lock()
                .unwrap()
                .pop()
                .ok_or_else(|| anyhow!("no reply"))
        }
    }

    fn settings(threshold: f64) -> TurnSettings {
        TurnSettings {
            top_k: 5,
            assemble: AssembleOptions::default(),
            policy: WeakMatchPolicy::new(threshold, ScoreType::Distance),
        }
    }

    fn corpus() -> InMemoryRetriever {
        let r = InMemoryRetriever::new();
        r.insert(
            "返金 は購入から14日以内に申請できます。連絡先: support@example.com",
            ItemMetadata {
                source: "data/service/refund.pdf".to_string(),
                page: Some(0),
                category: Category::Service,
            },
        )
        .unwrap();
        r.insert(
            "本社 所在地 は東京都です。",
            ItemMetadata {
                source: "data/company/about.pdf".to_string(),
                page: Some(1),
                category: Category::Company,
            },
        )
        .unwrap();
        r
    }

    #[tokio::test]
    async fn no_context_returns_not_found_without_calls() {
        let llm = Recorded::new(&["unused"]);
        let desk = Desk::new(
            InMemoryRetriever::new(),
            AnswerAgent::new(&llm, AgentConfig::default()),
            settings(0.25),
        );
        let out = desk.run_turn("解約したい", true, None).await.unwrap();
        assert_eq!(out.disposition, Disposition::NoContext);
        assert_eq!(out.answer, NOT_FOUND_MESSAGE);
        assert!(out.citations.is_empty());
        assert_eq!(llm.calls(), 0);
    }

    #[tokio::test]
    async fn weak_match_returns_menu_without_calls() {
        let llm = Recorded::new(&["unused"]);
        // Threshold below any achievable keyword distance for a partial match.
        let desk = Desk::new(
            corpus(),
            AnswerAgent::new(&llm, AgentConfig::default()),
            settings(-1.0),
        );
        let out = desk.run_turn("返金について教えて", true, None).await.unwrap();
        assert_eq!(out.disposition, Disposition::WeakMatch);
        assert_eq!(out.answer, CLARIFICATION_MENU);
        assert_eq!(llm.calls(), 0);
    }

    #[tokio::test]
    async fn generate_uses_agent_and_attaches_contacts() {
        let llm = Recorded::new(&["draft", "refined"]);
        let desk = Desk::new(
            corpus(),
            AnswerAgent::new(
                &llm,
                AgentConfig {
                    rounds: 1,
                    ..AgentConfig::default()
                },
            ),
            settings(0.25),
        );
        let steps = Mutex::new(Vec::new());
        let reporter = |e: &ProgressEvent| steps.lock().unwrap().push((e.step, e.total));

        let out = desk
            .run_turn("返金について教えて", true, Some(&reporter))
            .await
            .unwrap();

        assert_eq!(out.search_query, "返金");
        assert_eq!(out.category, Category::Service);
        assert_eq!(out.disposition, Disposition::Generate);
        assert_eq!(out.answer, "refined");
        assert_eq!(out.citations.len(), 1);
        assert_eq!(out.citations[0].page, Some(1));
        assert_eq!(out.contacts.len(), 1);
        assert_eq!(out.contacts[0].value, "support@example.com");
        assert_eq!(out.contacts[0].source, "refund.pdf");
        assert_eq!(*steps.lock().unwrap(), vec![(1, 2), (2, 2)]);
    }

    #[tokio::test]
    async fn direct_mode_single_call() {
        let llm = Recorded::new(&["direct"]);
        let desk = Desk::new(
            corpus(),
            AnswerAgent::new(
                &llm,
                AgentConfig {
                    rounds: 3,
                    ..AgentConfig::default()
                },
            ),
            settings(0.25),
        );
        let out = desk.run_turn("返金について", false, None).await.unwrap();
        assert_eq!(out.answer, "direct");
        assert_eq!(llm.calls(), 1);
    }

    #[tokio::test]
    async fn contacts_withheld_for_unrelated_question() {
        let llm = Recorded::new(&["draft"]);
        let r = corpus();
        r.insert(
            "所在地 の問い合わせ先 office@example.com",
            ItemMetadata {
                source: "data/company/office.pdf".to_string(),
                page: None,
                category: Category::Company,
            },
        )
        .unwrap();
        let desk = Desk::new(r, AnswerAgent::new(&llm, AgentConfig::default()), settings(0.25));
        let out = desk.run_turn("所在地", true, None).await.unwrap();
        assert_eq!(out.disposition, Disposition::Generate);
        assert!(out.contacts.is_empty());
    }

    #[tokio::test]
    async fn completion_failure_is_fatal() {
        let llm = Recorded::new(&[]);
        let desk = Desk::new(corpus(), AnswerAgent::new(&llm, AgentConfig::default()), settings(0.25));
        let err = desk.run_turn("返金", true, None).await.unwrap_err();
        assert!(matches!(err, DeskError::Completion(_)));
    }

    #[tokio::test]
    async fn blank_question_rejected() {
        let llm = Recorded::new(&[]);
        let desk = Desk::new(corpus(), AnswerAgent::new(&llm, AgentConfig::default()), settings(0.25));
        assert!(matches!(
            desk.run_turn("  ", true, None).await.unwrap_err(),
            DeskError::EmptyQuery
        ));
    }
}
