//! `desk ask`: one question, one answer.

use anyhow::Result;

use crate::config::Config;
use crate::pipeline::open_desk;
use crate::progress::ProgressMode;
use crate::render::render_outcome;

pub struct AskOptions {
    pub no_agent: bool,
    pub rounds: Option<usize>,
    pub json: bool,
    pub progress: ProgressMode,
}

pub async fn run_ask(config: &Config, question: &str, opts: AskOptions) -> Result<()> {
    let desk = open_desk(config, opts.rounds).await?;
    let agent_mode = config.agent.enabled && !opts.no_agent;
    let reporter = opts.progress.reporter();

    let outcome = desk
        .run_turn(question, agent_mode, Some(reporter.as_ref()))
        .await?;

    if opts.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print!("{}", render_outcome(&outcome));
    }
    Ok(())
}
