//! Journal filtering and the debounced search coordinator.
//!
//! As the operator types identity fields, the workflow emits a [`LogFilter`]
//! per keystroke. Applying every one would thrash the journal view, so the
//! [`SearchCoordinator`] debounces: each new filter restarts a short delay
//! and cancels the previous one. Cancellation is race-free, a superseded
//! filter can never land after a newer one has been submitted.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::model::{Crossing, Identity};

/// A prefix filter over the crossing journal.
///
/// Empty fields match everything. Comparison is case-insensitive; the
/// journal's display name is split back into last/first/patronymic parts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogFilter {
    /// Last-name prefix.
    pub last_name: String,
    /// First-name prefix.
    pub first_name: String,
    /// Patronymic prefix.
    pub patronymic: String,
    /// Citizenship prefix.
    pub citizenship: String,
    /// Document-number prefix.
    pub document: String,
}

fn prefix_matches(prefix: &str, value: &str) -> bool {
    prefix.is_empty() || value.to_uppercase().starts_with(&prefix.to_uppercase())
}

impl LogFilter {
    /// Build a filter from the identity fields currently on the form.
    #[must_use]
    pub fn from_identity(identity: &Identity) -> Self {
        Self {
            last_name: identity.last_name.clone(),
            first_name: identity.first_name.clone(),
            patronymic: identity.patronymic.clone().unwrap_or_default(),
            citizenship: identity.citizenship.clone().unwrap_or_default(),
            document: identity.document.clone().unwrap_or_default(),
        }
    }

    /// Whether every field is empty (matches all rows).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.last_name.is_empty()
            && self.first_name.is_empty()
            && self.patronymic.is_empty()
            && self.citizenship.is_empty()
            && self.document.is_empty()
    }

    /// Test a journal row against the filter.
    #[must_use]
    pub fn matches(&self, crossing: &Crossing) -> bool {
        let mut parts = crossing.full_name.splitn(3, ' ');
        let last = parts.next().unwrap_or("");
        let first = parts.next().unwrap_or("");
        let patronymic = parts.next().unwrap_or("");

        prefix_matches(&self.last_name, last)
            && prefix_matches(&self.first_name, first)
            && prefix_matches(&self.patronymic, patronymic)
            && prefix_matches(
                &self.citizenship,
                crossing.citizenship.as_deref().unwrap_or(""),
            )
            && prefix_matches(&self.document, &crossing.person_document)
    }

    /// Filter a journal slice, keeping order.
    #[must_use]
    pub fn apply(&self, rows: &[Crossing]) -> Vec<Crossing> {
        rows.iter().filter(|c| self.matches(c)).cloned().collect()
    }
}

/// Consumer of debounced filter updates.
pub trait FilterSink: Send + Sync + 'static {
    /// Apply the given filter to the journal view.
    fn apply_filter(&self, filter: LogFilter);
}

/// Debounces filter updates so only the newest one takes effect.
///
/// Each submission aborts the previously scheduled delay and bumps a
/// generation counter. The delayed task re-checks the counter under the
/// same lock before applying, so a task that lost the race (aborted or
/// merely stale) can never overwrite a newer filter.
pub struct SearchCoordinator<S: FilterSink> {
    sink: Arc<S>,
    delay: Duration,
    generation: Arc<Mutex<u64>>,
    pending: Option<JoinHandle<()>>,
}

impl<S: FilterSink> std::fmt::Debug for SearchCoordinator<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchCoordinator")
            .field("delay", &self.delay)
            .field("pending", &self.pending.is_some())
            .finish_non_exhaustive()
    }
}

impl<S: FilterSink> SearchCoordinator<S> {
    /// Create a coordinator delivering to the given sink after `delay`.
    pub fn new(sink: Arc<S>, delay: Duration) -> Self {
        Self {
            sink,
            delay,
            generation: Arc::new(Mutex::new(0)),
            pending: None,
        }
    }

    /// Submit a filter, superseding any filter still waiting out its delay.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if the generation lock is poisoned.
    pub fn submit(&mut self, filter: LogFilter) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }

        let my_generation = {
            let mut generation = self.generation.lock().expect("generation lock poisoned");
            *generation += 1;
            *generation
        };

        let sink = Arc::clone(&self.sink);
        let generation = Arc::clone(&self.generation);
        let delay = self.delay;

        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let current = generation.lock().expect("generation lock poisoned");
            // Abort may have lost the race with the sleep; the generation
            // check is what guarantees stale filters never apply.
            if *current == my_generation {
                debug!("Applying journal filter");
                sink.apply_filter(filter);
            }
        }));
    }

    /// Drain a filter-event channel, debouncing each event.
    ///
    /// Returns when the sending side is dropped.
    pub async fn drive(&mut self, mut events: mpsc::UnboundedReceiver<LogFilter>) {
        while let Some(filter) = events.recv().await {
            self.submit(filter);
        }
    }
}

impl<S: FilterSink> Drop for SearchCoordinator<S> {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}
