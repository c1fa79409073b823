//! Progress reporting contract for the answer agent.
//!
//! The agent announces each completion call just before issuing it. Step
//! numbers start at 1, increase by one, and never exceed `total`, which is
//! fixed for the whole run before the first event fires.

use serde::Serialize;

/// A single progress event for one agent run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ProgressEvent {
    /// Human-readable description of the step about to run.
    pub label: String,
    /// 1-based step index.
    pub step: usize,
    /// Number of steps scheduled for this run.
    pub total: usize,
}

/// Receives agent progress. Implementations must not block for long; they
/// run inline between completion calls.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: &ProgressEvent);
}

impl<F> ProgressReporter for F
where
    F: Fn(&ProgressEvent) + Send + Sync,
{
    fn report(&self, event: &ProgressEvent) {
        self(event)
    }
}

/// No-op reporter.
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn report(&self, _event: &ProgressEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn closures_are_reporters() {
        let seen = Mutex::new(Vec::new());
        let reporter = |e: &ProgressEvent| seen.lock().unwrap().push(e.step);
        reporter.report(&ProgressEvent {
            label: "draft".into(),
            step: 1,
            total: 1,
        });
        assert_eq!(*seen.lock().unwrap(), vec![1]);
    }
}
