//! `Server` builder and accept loop.
//!
//! This is the entry point for running a Fourline match server. It ties
//! the layers together: transport → protocol → gateway → match core.

use std::sync::Arc;

use fourline_backend::{IdentityResolver, OutcomeStore};
use fourline_match::MatchRegistry;
use fourline_protocol::JsonCodec;
use fourline_transport::{Transport, WebSocketTransport};
use tokio::sync::Mutex;

use crate::gateway::handle_connection;
use crate::ServerError;

/// Shared server state passed to each connection handler task.
///
/// Wrapped in `Arc` so it can be cheaply cloned across tasks. The
/// registry sits behind a single async mutex: one lock acquisition covers
/// the whole get-or-create, which is what makes match creation atomic
/// under concurrent first-joiners. Handlers hold the lock only for map
/// operations, never across network I/O.
pub(crate) struct ServerState<I: IdentityResolver, S: OutcomeStore + Clone> {
    pub(crate) registry: Mutex<MatchRegistry<S>>,
    pub(crate) identity: I,
    pub(crate) codec: JsonCodec,
}

/// Builder for configuring and starting a Fourline server.
///
/// # Example
///
/// ```rust,ignore
/// let server = ServerBuilder::new()
///     .bind("0.0.0.0:3000")
///     .build(my_identity_client, my_history_client)
///     .await?;
/// server.run().await
/// ```
pub struct ServerBuilder {
    bind_addr: String,
}

impl ServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:3000".to_string(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Binds the transport and assembles the server with the given
    /// collaborators.
    pub async fn build<I, S>(self, identity: I, store: S) -> Result<Server<I, S>, ServerError>
    where
        I: IdentityResolver,
        S: OutcomeStore + Clone,
    {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let state = Arc::new(ServerState {
            registry: Mutex::new(MatchRegistry::new(store)),
            identity,
            codec: JsonCodec,
        });

        Ok(Server { transport, state })
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running Fourline match server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct Server<I: IdentityResolver, S: OutcomeStore + Clone> {
    transport: WebSocketTransport,
    state: Arc<ServerState<I, S>>,
}

impl<I, S> Server<I, S>
where
    I: IdentityResolver,
    S: OutcomeStore + Clone,
{
    /// Creates a new builder.
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the server accept loop.
    ///
    /// Accepts incoming connections and spawns a handler task for each.
    /// A handler that errors takes down its own connection only; the
    /// loop runs until the process is terminated.
    pub async fn run(mut self) -> Result<(), ServerError> {
        tracing::info!("fourline match server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
