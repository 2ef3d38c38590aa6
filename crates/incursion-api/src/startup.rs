//! Background startup for embedding the API in the server binary.
//!
//! [`spawn_api`] binds eagerly, so a port conflict is reported to the
//! caller instead of only to the log, then serves on a background task.
//!
//! ```rust,ignore
//! let (addr, handle) = spawn_api(&ServerConfig::default(), state, shutdown).await?;
//! // ... run the scheduler ...
//! handle.await?;
//! ```

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::server::{ServerConfig, ServerError, bind, start_server};
use crate::state::AppState;

/// Errors that can occur when spawning the API server.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// The server failed to bind.
    #[error("server start error: {0}")]
    Server(#[from] ServerError),
}

/// Bind `config` and serve the API on a background Tokio task.
///
/// Returns the bound address (useful with port `0`) and the task handle.
/// The task ends once `shutdown` resolves and in-flight requests finish.
///
/// # Errors
///
/// Returns [`StartupError::Server`] if the address cannot be bound.
pub async fn spawn_api<S>(
    config: &ServerConfig,
    state: Arc<AppState>,
    shutdown: S,
) -> Result<(SocketAddr, JoinHandle<()>), StartupError>
where
    S: Future<Output = ()> + Send + 'static,
{
    let listener = bind(config).await?;
    let addr = listener
        .local_addr()
        .map_err(|e| ServerError::Bind(format!("listener address: {e}")))?;

    let handle = tokio::spawn(async move {
        if let Err(e) = start_server(listener, state, shutdown).await {
            tracing::error!(error = %e, "Read API exited with error");
        }
    });

    tracing::info!(%addr, "Read API spawned on background task");
    Ok((addr, handle))
}
