//! Results of sync calls.

use serde::Serialize;
use unison_core::EventId;
use unison_unification::UnifiedOutput;

use crate::error::SyncFailure;

/// A successfully synced resource.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Synced<R> {
    pub object: UnifiedOutput<R>,
    /// Whether this call created the canonical object.
    pub created: bool,
    /// Audit event recorded for the call, when it could be stored.
    pub event_id: Option<EventId>,
}

/// Outcome of one element of a batch, in input position.
#[derive(Debug)]
pub struct ElementOutcome<R> {
    pub index: usize,
    pub result: Result<Synced<R>, SyncFailure>,
}

impl<R> ElementOutcome<R> {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Summary of a batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Successful elements that created a new canonical object.
    pub created: usize,
}

impl BatchSummary {
    /// Add an element outcome to the summary.
    pub fn add<R>(&mut self, outcome: &ElementOutcome<R>) {
        self.total += 1;
        match &outcome.result {
            Ok(synced) => {
                self.succeeded += 1;
                if synced.created {
                    self.created += 1;
                }
            }
            Err(_) => self.failed += 1,
        }
    }
}

/// Per-element outcomes of `add_many`, in input order.
#[derive(Debug)]
pub struct BatchOutcome<R> {
    pub results: Vec<ElementOutcome<R>>,
    pub summary: BatchSummary,
}

impl<R> BatchOutcome<R> {
    #[must_use]
    pub fn from_results(results: Vec<ElementOutcome<R>>) -> Self {
        let mut summary = BatchSummary::default();
        for outcome in &results {
            summary.add(outcome);
        }
        Self { results, summary }
    }

    /// Failed elements with their input position.
    pub fn failures(&self) -> impl Iterator<Item = (usize, &SyncFailure)> {
        self.results
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.index, e)))
    }
}
