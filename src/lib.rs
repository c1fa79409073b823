//! # LumiDesk
//!
//! A command-line customer-support desk that answers questions from a
//! folder of PDF and text documents.
//!
//! Documents under `data/` are extracted page by page, chunked, optionally
//! embedded, and stored in SQLite. Each question is rewritten into a search
//! query, matched against the index, and routed by the weak-match policy:
//! nothing found, ask the user to clarify, or generate a cited answer with
//! the iterative answer agent.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌─────────────┐   ┌──────────┐
//! │  data/*.pdf │──▶│ Chunk+Embed │──▶│  SQLite  │
//! │  *.txt *.md │   │   (index)   │   │  chunks  │
//! └─────────────┘   └─────────────┘   └────┬─────┘
//!                                          │
//!                                          ▼
//!                 ┌──────────┐       ┌──────────┐
//!                 │   CLI    │◀──────│  Desk    │──▶ chat model
//!                 │  (desk)  │       │ pipeline │
//!                 └──────────┘       └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! desk init                         # create database
//! desk index                        # rebuild the index from data/
//! desk search "返金"                 # raw ranked hits
//! desk ask "返金の条件を教えて"         # one cited answer
//! desk chat                         # interactive session
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |
//! | [`ingest`] | Page extraction and index rebuild |
//! | [`store`] | SQLite index and retriever |
//! | [`embedding`] | Embedding providers |
//! | [`llm`] | Chat completion providers |
//! | [`pipeline`] | One question, end to end |
//! | [`render`] | Terminal output |
//! | [`chat`] | Interactive session |

pub mod ask;
pub mod chat;
pub mod config;
pub mod db;
pub mod embedding;
pub mod ingest;
pub mod llm;
pub mod migrate;
pub mod pipeline;
pub mod progress;
pub mod render;
pub mod search;
pub mod store;
pub mod tokenizer;
