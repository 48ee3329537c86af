//! Identity resolution hook.
//!
//! Fourline doesn't own user accounts — the accounts service does. This
//! module defines the [`IdentityResolver`] trait: one async method that
//! takes a player id and returns a display name. The gateway calls it when
//! a player joins; production wires in an HTTP client, development and
//! tests use the implementations below.

use std::collections::HashMap;

use fourline_protocol::PlayerId;

use crate::BackendError;

/// Resolves an opaque player id to a human-readable display name.
///
/// `Send + Sync + 'static` because the resolver is shared across every
/// connection handler task and lives as long as the server.
pub trait IdentityResolver: Send + Sync + 'static {
    /// Looks up the display name for a player.
    ///
    /// # Errors
    /// - [`BackendError::NotFound`] — the id is unknown to the service
    /// - [`BackendError::Unavailable`] — the service could not be reached
    fn resolve(
        &self,
        player: &PlayerId,
    ) -> impl std::future::Future<Output = Result<String, BackendError>> + Send;
}

/// A resolver that uses the raw id as the display name.
///
/// For development: every id resolves, no service required.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityFromId;

impl IdentityResolver for IdentityFromId {
    async fn resolve(&self, player: &PlayerId) -> Result<String, BackendError> {
        Ok(player.as_str().to_string())
    }
}

/// A resolver backed by a fixed in-memory directory.
///
/// Seeded once at construction; ids outside the directory return
/// [`BackendError::NotFound`]. Used by tests that care about the
/// not-found path.
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    names: HashMap<PlayerId, String>,
}

impl StaticDirectory {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entry, builder-style.
    pub fn with(mut self, player: impl Into<PlayerId>, name: impl Into<String>) -> Self {
        self.names.insert(player.into(), name.into());
        self
    }
}

impl IdentityResolver for StaticDirectory {
    async fn resolve(&self, player: &PlayerId) -> Result<String, BackendError> {
        self.names
            .get(player)
            .cloned()
            .ok_or_else(|| BackendError::NotFound(player.clone()))
    }
}
