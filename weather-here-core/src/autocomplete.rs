//! Suggestions for the manual city field.
//!
//! [`Autocomplete`] holds the visible list and decides when a lookup is needed;
//! [`Debouncer`] runs the lookups, waiting for typing to pause and dropping any
//! request superseded by a newer keystroke. Every request carries a sequence
//! number and only the newest one may replace the list.

use std::time::Duration;
use tokio::sync::mpsc;

use crate::{geocoding::GeocodingClient, model::CitySuggestion};

/// Shortest input that triggers a lookup.
pub const MIN_QUERY_CHARS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestRequest {
    pub seq: u64,
    pub query: String,
}

#[derive(Debug, Clone, Default)]
pub struct Autocomplete {
    seq: u64,
    pending: Option<u64>,
    suggestions: Vec<CitySuggestion>,
}

impl Autocomplete {
    pub fn suggestions(&self) -> &[CitySuggestion] {
        &self.suggestions
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Record a keystroke. Returns the lookup to run, or `None` when the input is too
    /// short, in which case the list is already cleared.
    pub fn on_input(&mut self, value: &str) -> Option<SuggestRequest> {
        self.seq += 1;

        let query = value.trim();
        if query.chars().count() < MIN_QUERY_CHARS {
            self.pending = None;
            self.suggestions.clear();
            return None;
        }

        self.pending = Some(self.seq);
        Some(SuggestRequest {
            seq: self.seq,
            query: query.to_string(),
        })
    }

    /// Apply lookup results. Returns `false` when `seq` has been superseded.
    pub fn accept(&mut self, seq: u64, suggestions: Vec<CitySuggestion>) -> bool {
        if self.pending != Some(seq) {
            tracing::debug!(seq, latest = self.seq, "discarding stale suggestions");
            return false;
        }

        self.pending = None;
        self.suggestions = suggestions;
        true
    }

    /// Take the suggestion at `index` and clear the list.
    pub fn select(&mut self, index: usize) -> Option<CitySuggestion> {
        let chosen = self.suggestions.get(index).cloned()?;
        self.clear();
        Some(chosen)
    }

    pub fn clear(&mut self) {
        self.seq += 1;
        self.pending = None;
        self.suggestions.clear();
    }
}

#[derive(Debug)]
enum DebounceMsg {
    Request(SuggestRequest),
    Cancel,
}

/// Handle to the background lookup task. Dropping it stops the task.
#[derive(Debug, Clone)]
pub struct Debouncer {
    tx: mpsc::UnboundedSender<DebounceMsg>,
}

impl Debouncer {
    /// Spawn the lookup task on the current tokio runtime. `deliver` receives the
    /// results of every lookup that completes without being superseded.
    pub fn spawn<F>(geocoding: GeocodingClient, quiet: Duration, deliver: F) -> Self
    where
        F: Fn(u64, Vec<CitySuggestion>) + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run(rx, geocoding, quiet, deliver));
        Self { tx }
    }

    pub fn request(&self, request: SuggestRequest) {
        let _ = self.tx.send(DebounceMsg::Request(request));
    }

    /// Drop any waiting or in-flight lookup.
    pub fn cancel(&self) {
        let _ = self.tx.send(DebounceMsg::Cancel);
    }
}

async fn run<F>(
    mut rx: mpsc::UnboundedReceiver<DebounceMsg>,
    geocoding: GeocodingClient,
    quiet: Duration,
    deliver: F,
) where
    F: Fn(u64, Vec<CitySuggestion>) + Send + 'static,
{
    let mut next: Option<SuggestRequest> = None;

    loop {
        let mut request = match next.take() {
            Some(r) => r,
            None => match rx.recv().await {
                Some(DebounceMsg::Request(r)) => r,
                Some(DebounceMsg::Cancel) => continue,
                None => return,
            },
        };

        // Quiet window: restart on every newer keystroke.
        let mut cancelled = false;
        loop {
            tokio::select! {
                msg = rx.recv() => match msg {
                    Some(DebounceMsg::Request(newer)) => request = newer,
                    Some(DebounceMsg::Cancel) => {
                        cancelled = true;
                        break;
                    }
                    None => return,
                },
                _ = tokio::time::sleep(quiet) => break,
            }
        }
        if cancelled {
            continue;
        }

        tracing::debug!(seq = request.seq, query = %request.query, "looking up suggestions");

        // A newer message drops the in-flight lookup.
        tokio::select! {
            suggestions = geocoding.suggest(&request.query) => deliver(request.seq, suggestions),
            msg = rx.recv() => match msg {
                Some(DebounceMsg::Request(newer)) => next = Some(newer),
                Some(DebounceMsg::Cancel) => {}
                None => return,
            },
        }
    }
}
