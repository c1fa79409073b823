//! Interactive chat session for `desk chat`.
//!
//! Reads one question per line, runs a turn, prints the rendered outcome,
//! and keeps a bounded [`ConversationHistory`]. Turns are independent: the
//! history is shown on request but is not sent to the model.
//!
//! Commands: `/history`, `/clear`, `/quit` (or `/exit`, or EOF).

use anyhow::Result;
use std::io::{BufRead, Write};

use lumidesk_core::{CompletionService, ConversationHistory, ProgressReporter, Retriever};

use crate::pipeline::Desk;
use crate::render::render_outcome;

enum Input<'a> {
    Quit,
    History,
    Clear,
    Question(&'a str),
    Blank,
}

fn classify(line: &str) -> Input<'_> {
    match line.trim() {
        "" => Input::Blank,
        "/quit" | "/exit" => Input::Quit,
        "/history" => Input::History,
        "/clear" => Input::Clear,
        q => Input::Question(q),
    }
}

/// Run the session until `/quit` or end of input.
///
/// A failed turn prints an error line and is not recorded in the history.
pub async fn run_chat<R, C, I, W>(
    desk: &Desk<R, C>,
    agent_mode: bool,
    progress: &dyn ProgressReporter,
    mut history: ConversationHistory,
    input: I,
    output: &mut W,
) -> Result<ConversationHistory>
where
    R: Retriever,
    C: CompletionService,
    I: BufRead,
    W: Write,
{
    for line in input.lines() {
        let line = line?;
        match classify(&line) {
            Input::Blank => continue,
            Input::Quit => break,
            Input::History => {
                if history.is_empty() {
                    writeln!(output, "(no history)")?;
                }
                for message in history.iter() {
                    writeln!(output, "[{}] {}", message.role.as_str(), message.content)?;
                }
            }
            Input::Clear => {
                history.clear();
                writeln!(output, "(history cleared)")?;
            }
            Input::Question(question) => {
                match desk.run_turn(question, agent_mode, Some(progress)).await {
                    Ok(outcome) => {
                        write!(output, "{}", render_outcome(&outcome))?;
                        history.push_user(question);
                        history.push_assistant(outcome.answer);
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "turn failed");
                        writeln!(output, "error: {}", e)?;
                    }
                }
                writeln!(output)?;
            }
        }
        output.flush()?;
    }
    Ok(history)
}
