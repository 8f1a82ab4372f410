//! Serve command handler.

use crate::http::{build_router, AppState};
use clap::Args;
use rag_core::{config::AppConfig, AppResult};
use std::sync::Arc;

/// Run the HTTP API
#[derive(Args, Debug)]
pub struct ServeCommand {
    /// Address to bind (overrides RAG_BIND and the config file)
    #[arg(short, long)]
    pub bind: Option<String>,
}

impl ServeCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let composer = super::build_composer(config)?;
        tracing::info!("Document store backend: {}", composer.store().backend_name());
        let app = build_router(AppState::new(Arc::new(composer)));

        let bind = self.bind.as_deref().unwrap_or(&config.bind);
        let listener = tokio::net::TcpListener::bind(bind).await?;
        tracing::info!("Listening on http://{}", listener.local_addr()?);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
