//! # LumiDesk Core
//!
//! I/O-free logic for LumiDesk: the data model, query preprocessing,
//! context assembly, the weak-match policy, context compression, and the
//! iterative answer agent.
//!
//! This crate contains no tokio runtime, sqlx, HTTP client, or filesystem
//! I/O. The two external services the pipeline talks to are reached only
//! through the [`Retriever`](retriever::Retriever) and
//! [`CompletionService`](completion::CompletionService) traits, which the
//! application crate implements.
//!
//! ## Pipeline
//!
//! ```text
//! question ──▶ rewrite + guess category ──▶ assemble ──▶ policy
//!                                                          │
//!                           ┌──────────────────────────────┤
//!                           ▼                              ▼
//!                  not-found / clarify            compress ─▶ draft ─▶ refine × N
//! ```

pub mod agent;
pub mod assemble;
pub mod chunk;
pub mod completion;
pub mod compress;
pub mod contacts;
pub mod embedding;
pub mod error;
pub mod history;
pub mod models;
pub mod policy;
pub mod progress;
pub mod prompts;
pub mod query;
pub mod retriever;

pub use agent::{answer, AgentConfig, AnswerAgent};
pub use assemble::{assemble, AssembleOptions};
pub use chunk::{chunk_text, Chunk};
pub use completion::CompletionService;
pub use compress::{maybe_compress, CompressConfig, TokenEstimator};
pub use contacts::{extract_contacts, wants_contact_guidance};
pub use embedding::EmbeddingProvider;
pub use error::DeskError;
pub use history::ConversationHistory;
pub use models::{Category, Citation, ContactInfo, Message, RetrievalResult, RetrievedItem, Role};
pub use policy::{Disposition, ScoreType, WeakMatchPolicy};
pub use progress::{NoProgress, ProgressEvent, ProgressReporter};
pub use query::{guess_category, rewrite_query_for_search};
pub use retriever::Retriever;
