//! Suggestion session state: the single held suggestion and usage counters.
//!
//! One `SessionState` lives for the whole process, owned by the composition
//! root and shared by `Arc` with whatever handles feedback and prediction.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use log::debug;
use serde::Serialize;

/// Snapshot of the session counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SessionStats {
    pub displayed: u64,
    pub accepted: u64,
    pub executed: u64,
    /// Outcome of the most recently executed command line, if any.
    pub last_execution_succeeded: Option<bool>,
}

#[derive(Debug, Default)]
pub struct SessionState {
    suggestion: Mutex<Option<String>>,
    last_execution: Mutex<Option<bool>>,
    displayed: AtomicU64,
    accepted: AtomicU64,
    executed: AtomicU64,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold `text` as the current suggestion, replacing any earlier one.
    pub fn produce_suggestion(&self, text: String) {
        debug!("holding suggestion: {text}");
        *lock(&self.suggestion) = Some(text);
    }

    /// The held suggestion, if any. Does not clear it.
    pub fn request_suggestion(&self) -> Option<String> {
        lock(&self.suggestion).clone()
    }

    /// Whether a suggestion is currently held.
    pub fn is_holding(&self) -> bool {
        lock(&self.suggestion).is_some()
    }

    pub fn on_displayed(&self) {
        self.displayed.fetch_add(1, Ordering::Relaxed);
    }

    /// Acceptance only fills the edit line; the suggestion stays held until submission.
    pub fn on_accepted(&self) {
        self.accepted.fetch_add(1, Ordering::Relaxed);
    }

    /// Any submitted command line discards the held suggestion.
    pub fn on_command_line_submitted(&self) {
        if lock(&self.suggestion).take().is_some() {
            debug!("suggestion cleared on submission");
        }
    }

    pub fn on_command_line_executed(&self, success: bool) {
        self.executed.fetch_add(1, Ordering::Relaxed);
        *lock(&self.last_execution) = Some(success);
    }

    pub fn stats(&self) -> SessionStats {
        SessionStats {
            displayed: self.displayed.load(Ordering::Relaxed),
            accepted: self.accepted.load(Ordering::Relaxed),
            executed: self.executed.load(Ordering::Relaxed),
            last_execution_succeeded: *lock(&self.last_execution),
        }
    }
}

/// The guarded values stay consistent even if a holder panicked, so poisoning is ignored.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
