//! Outcome persistence hook.
//!
//! When a match finishes, the session hands its terminal snapshot to an
//! [`OutcomeStore`] exactly once. The store is fire-and-forget from the
//! core's perspective: the game-over broadcast to players proceeds whether
//! or not the write lands, so history is at-least-once, best-effort.

use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

use fourline_protocol::{MatchId, PlayerId};

use crate::BackendError;

/// The terminal snapshot of a finished match, as handed to persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutcomeRecord {
    /// Which match finished.
    pub match_id: MatchId,
    /// The winning player, or `None` for a draw.
    pub winner: Option<PlayerId>,
    /// Point value: 3 for a win, 1 per player for a draw.
    pub score: u32,
    /// Every player that held a seat, in seat order.
    pub participants: Vec<PlayerId>,
    /// How long the match was in play (zero if it never started).
    pub duration: Duration,
}

/// Records final match outcomes.
///
/// Implementations must not assume exactly-once delivery — an upstream
/// retry layer could hand them the same record twice.
pub trait OutcomeStore: Send + Sync + 'static {
    /// Persists one outcome record.
    ///
    /// # Errors
    /// Returns [`BackendError::Unavailable`] if the write cannot be
    /// completed. Callers log and move on; they never retry in-process.
    fn record(
        &self,
        outcome: OutcomeRecord,
    ) -> impl std::future::Future<Output = Result<(), BackendError>> + Send;
}

/// An outcome record plus when the store received it.
#[derive(Debug, Clone)]
pub struct StoredOutcome {
    /// The record as handed to [`OutcomeStore::record`].
    pub record: OutcomeRecord,
    /// Wall-clock receipt time, stamped by the store.
    pub recorded_at: SystemTime,
}

/// An in-memory [`OutcomeStore`] for development and tests.
///
/// Clones share the same underlying list, so a test can keep a clone and
/// assert on what the server wrote.
#[derive(Debug, Clone, Default)]
pub struct MemoryOutcomeStore {
    records: Arc<Mutex<Vec<StoredOutcome>>>,
}

impl MemoryOutcomeStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of everything recorded so far.
    pub fn records(&self) -> Vec<StoredOutcome> {
        self.records.lock().expect("store mutex poisoned").clone()
    }

    /// Returns the number of records written.
    pub fn len(&self) -> usize {
        self.records.lock().expect("store mutex poisoned").len()
    }

    /// Returns `true` if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl OutcomeStore for MemoryOutcomeStore {
    async fn record(&self, outcome: OutcomeRecord) -> Result<(), BackendError> {
        tracing::debug!(match_id = %outcome.match_id, "outcome recorded");
        let mut records = self.records.lock().expect("store mutex poisoned");
        records.push(StoredOutcome {
            record: outcome,
            recorded_at: SystemTime::now(),
        });
        Ok(())
    }
}
