//! Error taxonomy for a single user turn.
//!
//! Weak matches and empty contexts are business outcomes, not errors; see
//! [`Disposition`](crate::policy::Disposition).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeskError {
    /// The search string was empty or whitespace-only.
    #[error("query must not be empty")]
    EmptyQuery,

    /// A caller passed an argument outside the operation's contract.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The retriever failed. Fatal for the turn.
    #[error("retrieval failed: {0:#}")]
    Retrieval(#[source] anyhow::Error),

    /// A completion call failed. Fatal for the turn; no partial answer is kept.
    #[error("completion failed: {0:#}")]
    Completion(#[source] anyhow::Error),
}
