//! # LumiDesk CLI (`desk`)
//!
//! ## Usage
//!
//! ```bash
//! desk --config ./config/desk.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `desk init` | Create the SQLite database and run schema migrations |
//! | `desk index` | Rebuild the chunk index from the data root |
//! | `desk search "<query>"` | Print raw ranked hits (no LLM call) |
//! | `desk ask "<question>"` | Answer one question with citations |
//! | `desk chat` | Interactive session on stdin |
//!
//! Diagnostics go to stderr; set `RUST_LOG` or pass `--verbose`.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use lumidesk::ask::{run_ask, AskOptions};
use lumidesk::chat::run_chat;
use lumidesk::config::load_config;
use lumidesk::ingest::run_index;
use lumidesk::migrate::run_migrations;
use lumidesk::pipeline::open_desk;
use lumidesk::progress::ProgressMode;
use lumidesk::search::run_search;
use lumidesk_core::{Category, ConversationHistory};

/// LumiDesk: a customer-support desk that answers from your documents.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/desk.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "desk",
    about = "LumiDesk: cited customer-support answers from a folder of documents",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/desk.toml")]
    config: PathBuf,

    /// Enable debug logging for LumiDesk on stderr.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Idempotent; running it multiple times is safe.
    Init,

    /// Rebuild the index from the documents under `[data] root`.
    ///
    /// Every run replaces the whole index.
    Index,

    /// Show raw ranked retrieval hits without calling the chat model.
    Search {
        query: String,

        /// Restrict hits to one category (company, customer, service).
        #[arg(long)]
        category: Option<Category>,

        /// Number of hits (defaults to `[retrieval] top_k`).
        #[arg(long)]
        k: Option<usize>,
    },

    /// Answer a single question.
    Ask {
        question: String,

        /// Skip compression and refinement; make one draft call.
        #[arg(long)]
        no_agent: bool,

        /// Refinement rounds (overrides `[agent] rounds`).
        #[arg(long)]
        rounds: Option<usize>,

        /// Print the outcome as JSON.
        #[arg(long)]
        json: bool,

        /// Progress output on stderr. Defaults to `human` on a TTY.
        #[arg(long, value_enum)]
        progress: Option<ProgressMode>,
    },

    /// Interactive session: one question per line on stdin.
    ///
    /// `/history` shows the session, `/clear` empties it, `/quit` ends it.
    Chat {
        #[arg(long)]
        no_agent: bool,

        #[arg(long)]
        rounds: Option<usize>,

        #[arg(long, value_enum)]
        progress: Option<ProgressMode>,
    },
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("lumidesk=debug,lumidesk_core=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let cfg = load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Index => {
            let stats = run_index(&cfg).await?;
            println!("index rebuilt");
            println!("  files: {}", stats.files);
            println!("  skipped: {}", stats.skipped);
            println!("  pages: {}", stats.pages);
            println!("  chunks: {}", stats.chunks);
            println!("  embedded: {}", stats.embedded);
        }
        Commands::Search { query, category, k } => {
            run_search(&cfg, &query, category, k).await?;
        }
        Commands::Ask {
            question,
            no_agent,
            rounds,
            json,
            progress,
        } => {
            let opts = AskOptions {
                no_agent,
                rounds,
                json,
                progress: progress.unwrap_or_else(ProgressMode::default_for_tty),
            };
            run_ask(&cfg, &question, opts).await?;
        }
        Commands::Chat {
            no_agent,
            rounds,
            progress,
        } => {
            let desk = open_desk(&cfg, rounds).await?;
            let agent_mode = cfg.agent.enabled && !no_agent;
            let reporter = progress
                .unwrap_or_else(ProgressMode::default_for_tty)
                .reporter();
            let history = ConversationHistory::new(cfg.session.max_messages);

            let stdin = std::io::stdin();
            let mut stdout = std::io::stdout();
            run_chat(
                &desk,
                agent_mode,
                reporter.as_ref(),
                history,
                stdin.lock(),
                &mut stdout,
            )
            .await?;
        }
    }

    Ok(())
}
