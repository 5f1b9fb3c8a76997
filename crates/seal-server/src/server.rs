use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::handler::AppState;
use crate::router::build_router;

/// Seal Chain ingestion server.
pub struct SealServer {
    config: ServerConfig,
}

impl SealServer {
    pub fn new(config: ServerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Serve requests until the listener fails.
    pub async fn serve(self, state: AppState) -> ServerResult<()> {
        let app = build_router(state);
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        tracing::info!("Seal server listening on {}", self.config.bind_addr);
        axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))
    }
}
