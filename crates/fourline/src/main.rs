//! Fourline server binary.
//!
//! Development bootstrap: identity resolves to the raw player id and
//! outcomes land in memory. A production deployment supplies real
//! collaborator clients instead.

use fourline::prelude::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let bind = std::env::var("FOURLINE_BIND").unwrap_or_else(|_| "127.0.0.1:3000".to_string());

    let server = ServerBuilder::new()
        .bind(&bind)
        .build(IdentityFromId, MemoryOutcomeStore::new())
        .await?;

    tracing::info!(%bind, "fourline listening");
    server.run().await?;
    Ok(())
}
