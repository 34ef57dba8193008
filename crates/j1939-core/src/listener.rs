//! Result reporting sink

use std::sync::Arc;

use parking_lot::Mutex;

use crate::outcome::{Outcome, Severity};

/// Receives everything a run reports.
///
/// Steps execute on one worker, so a listener only ever sees one writer at a
/// time; implementations still need to be `Send + Sync` to cross into the
/// scheduler task.
pub trait ResultsListener: Send + Sync {
    /// Record a verdict
    fn add_outcome(&self, part: u8, step: u8, severity: Severity, message: &str);

    /// Append one line to the human-readable result log
    fn on_result(&self, line: &str);

    /// Progress note for the step at `step_index` of `total_steps`
    fn on_progress(&self, step_index: usize, total_steps: usize, note: &str);
}

impl<T: ResultsListener + ?Sized> ResultsListener for Arc<T> {
    fn add_outcome(&self, part: u8, step: u8, severity: Severity, message: &str) {
        (**self).add_outcome(part, step, severity, message)
    }

    fn on_result(&self, line: &str) {
        (**self).on_result(line)
    }

    fn on_progress(&self, step_index: usize, total_steps: usize, note: &str) {
        (**self).on_progress(step_index, total_steps, note)
    }
}

/// Anything a [`CollectingListener`] recorded, in arrival order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListenerEvent {
    Outcome(Outcome),
    Result(String),
    Progress {
        step_index: usize,
        total_steps: usize,
        note: String,
    },
}

/// Listener that keeps every event in memory
#[derive(Debug, Default)]
pub struct CollectingListener {
    events: Mutex<Vec<ListenerEvent>>,
}

impl CollectingListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ListenerEvent> {
        self.events.lock().clone()
    }

    pub fn outcomes(&self) -> Vec<Outcome> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                ListenerEvent::Outcome(o) => Some(o.clone()),
                _ => None,
            })
            .collect()
    }

    /// Messages of all outcomes with the given severity
    pub fn messages(&self, severity: Severity) -> Vec<String> {
        self.outcomes()
            .into_iter()
            .filter(|o| o.severity == severity)
            .map(|o| o.message)
            .collect()
    }

    pub fn results(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                ListenerEvent::Result(line) => Some(line.clone()),
                _ => None,
            })
            .collect()
    }

    /// Progress notes, without their step counters
    pub fn progress(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                ListenerEvent::Progress { note, .. } => Some(note.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl ResultsListener for CollectingListener {
    fn add_outcome(&self, part: u8, step: u8, severity: Severity, message: &str) {
        self.events
            .lock()
            .push(ListenerEvent::Outcome(Outcome::new(part, step, severity, message)));
    }

    fn on_result(&self, line: &str) {
        self.events.lock().push(ListenerEvent::Result(line.to_string()));
    }

    fn on_progress(&self, step_index: usize, total_steps: usize, note: &str) {
        self.events.lock().push(ListenerEvent::Progress {
            step_index,
            total_steps,
            note: note.to_string(),
        });
    }
}
