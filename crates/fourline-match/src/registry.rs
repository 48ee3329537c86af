//! Match registry: creates, tracks, and evicts matches by id.

use std::collections::HashMap;

use fourline_backend::OutcomeStore;
use fourline_protocol::MatchId;

use crate::actor::spawn_match;
use crate::{MatchHandle, MatchSummary};

/// Default command channel size for match actors.
const DEFAULT_CHANNEL_SIZE: usize = 64;

/// Maps opaque match ids to running match actors.
///
/// The registry is not thread-safe by itself — the gateway owns it behind
/// a single async mutex, so `get_or_create` is atomic with respect to
/// concurrent first-joiners of the same unseen id (there is no
/// check-then-create window for another task to slip through).
pub struct MatchRegistry<S: OutcomeStore + Clone> {
    /// Live matches, keyed by id. At most one handle per id.
    matches: HashMap<MatchId, MatchHandle>,

    /// Ids in insertion order, for listing. Eviction removes entries, so
    /// positions are not stable across removals.
    order: Vec<MatchId>,

    /// Cloned into each spawned actor for outcome persistence.
    store: S,
}

impl<S: OutcomeStore + Clone> MatchRegistry<S> {
    /// Creates an empty registry.
    pub fn new(store: S) -> Self {
        Self {
            matches: HashMap::new(),
            order: Vec::new(),
            store,
        }
    }

    /// Returns the match under `match_id`, creating a pending one if the
    /// id is unknown.
    ///
    /// A handle whose actor has already exited counts as absent: the
    /// stale entry is dropped and a fresh pending match takes its place.
    /// That covers matches that ended with no connection left to evict
    /// them.
    pub fn get_or_create(&mut self, match_id: &MatchId) -> MatchHandle {
        let stale = match self.matches.get(match_id) {
            Some(handle) if !handle.is_closed() => return handle.clone(),
            Some(_) => true,
            None => false,
        };
        if stale {
            tracing::debug!(%match_id, "pruning dead match handle");
            self.remove(match_id);
        }

        let handle = spawn_match(match_id.clone(), self.store.clone(), DEFAULT_CHANNEL_SIZE);
        self.matches.insert(match_id.clone(), handle.clone());
        self.order.push(match_id.clone());
        tracing::info!(%match_id, "match created");
        handle
    }

    /// Looks up a match without creating it.
    pub fn get(&self, match_id: &MatchId) -> Option<MatchHandle> {
        self.matches.get(match_id).cloned()
    }

    /// Evicts a match. Idempotent: removing an absent id is a no-op.
    pub fn remove(&mut self, match_id: &MatchId) {
        if self.matches.remove(match_id).is_some() {
            self.order.retain(|id| id != match_id);
            tracing::info!(%match_id, "match evicted");
        }
    }

    /// Returns handles to all matches, in insertion order.
    pub fn list(&self) -> Vec<MatchHandle> {
        self.order
            .iter()
            .filter_map(|id| self.matches.get(id).cloned())
            .collect()
    }

    /// Queries each match actor for its summary, in insertion order.
    /// Matches that fail to respond (already shutting down) are skipped.
    pub async fn summaries(&self) -> Vec<MatchSummary> {
        let mut summaries = Vec::with_capacity(self.matches.len());
        for handle in self.list() {
            if let Ok(summary) = handle.summary().await {
                summaries.push(summary);
            }
        }
        summaries
    }

    /// Returns the number of registered matches.
    pub fn len(&self) -> usize {
        self.matches.len()
    }

    /// Returns `true` if no matches are registered.
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}
