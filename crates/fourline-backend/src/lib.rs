//! Collaborator seams for the Fourline match server.
//!
//! The match core consumes two adjacent services without implementing
//! either:
//!
//! 1. **Identity** — resolving an opaque player id to a display name
//!    ([`IdentityResolver`] trait)
//! 2. **Persistence** — recording the final outcome of a finished match
//!    ([`OutcomeStore`] trait)
//!
//! In production these are backed by the accounts API and its database;
//! that plumbing lives outside this repository. Here we define the traits
//! the core is generic over, plus in-memory implementations for
//! development and tests.
//!
//! Both collaborators are best-effort from the core's perspective: a
//! failed lookup or write is logged by the caller and never blocks or
//! rolls back in-memory match state.

mod error;
mod identity;
mod outcome;

pub use error::BackendError;
pub use identity::{IdentityFromId, IdentityResolver, StaticDirectory};
pub use outcome::{MemoryOutcomeStore, OutcomeRecord, OutcomeStore, StoredOutcome};
