//! HTTP server startup.
//!
//! [`build_service`] wires the database, providers and config into a
//! [`Kindred`]; [`serve`] binds the router and runs until ctrl-c.

use anyhow::{Context, Result};
use std::sync::Arc;

use crate::api;
use crate::config::KindredConfig;
use crate::db;
use crate::providers;
use crate::service::Kindred;

/// Shared setup: open the DB, create providers, wrap config.
pub fn build_service(config: KindredConfig) -> Result<Kindred> {
    let db_path = config.resolved_db_path();
    let conn = db::open_database(&db_path)?;
    tracing::info!(db = %db_path.display(), "database ready");

    let completion = providers::create_completion_provider(&config.completion)?;
    tracing::info!(provider = completion.name(), model = %config.completion.model, "completion provider ready");

    let search = providers::create_search_provider(&config.search)?;
    if search.is_some() {
        tracing::info!("web search enabled");
    }

    if config.server.admin_token.as_deref().is_none_or(str::is_empty) {
        tracing::warn!("no admin token configured, admin endpoints will reject every call");
    }

    Ok(Kindred::new(db::shared(conn), completion, search, Arc::new(config)))
}

/// Start the HTTP API.
pub async fn serve(config: KindredConfig) -> Result<()> {
    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!(addr = %bind_addr, "starting Kindred server");

    let kindred = Arc::new(build_service(config)?);
    let router = api::router(kindred);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    tracing::info!(addr = %bind_addr, "listening at http://{bind_addr}");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
            tracing::info!("shutting down server");
        })
        .await?;

    Ok(())
}
