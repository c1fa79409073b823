//! Agent progress reporting on the terminal.
//!
//! Reports each completion step of `desk ask` / `desk chat` so users see
//! what the agent is doing while a slow call is in flight. Progress is
//! emitted on **stderr** so stdout stays parseable for scripts.

use std::io::Write;

use lumidesk_core::progress::NoProgress;
use lumidesk_core::{ProgressEvent, ProgressReporter};

/// Human-friendly progress on stderr: `[2/3] 回答案を作成中...`.
pub struct StderrProgress;

impl ProgressReporter for StderrProgress {
    fn report(&self, event: &ProgressEvent) {
        let line = format_human(event);
        let mut err = std::io::stderr().lock();
        let _ = err.write_all(line.as_bytes());
        let _ = err.flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl ProgressReporter for JsonProgress {
    fn report(&self, event: &ProgressEvent) {
        let obj = serde_json::json!({
            "event": "progress",
            "label": event.label,
            "step": event.step,
            "total": event.total,
        });
        if let Ok(line) = serde_json::to_string(&obj) {
            let mut err = std::io::stderr().lock();
            let _ = writeln!(err, "{}", line);
            let _ = err.flush();
        }
    }
}

fn format_human(event: &ProgressEvent) -> String {
    format!("[{}/{}] {}\n", event.step, event.total, event.label)
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    pub fn reporter(&self) -> Box<dyn ProgressReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}
