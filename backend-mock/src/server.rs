/// Axum HTTP server setup and routing

use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers::*;
use crate::store::MockBackend;

pub fn create_router(backend: Arc<MockBackend>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Session
        .route("/authenticate", post(authenticate))
        // Pledges and accounts
        .route("/list-all-pledges", get(list_all_pledges))
        .route("/pledge/:pledge_id", get(get_pledge))
        .route("/account/:account_id", get(get_account))
        // Approvals
        .route("/list-pending-requests", get(list_pending_requests))
        .route("/get-pledge-challenge/:pledge_id", get(get_pledge_challenge))
        .route("/approve-pledge/:pledge_id", post(approve_pledge))
        // Settlements
        .route("/estimate-fees", post(estimate_fees))
        .route("/create-settlement", post(create_settlement))
        // Shared state
        .with_state(backend)
        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub async fn run_server(backend: Arc<MockBackend>, host: String, port: u16) -> anyhow::Result<()> {
    let app = create_router(backend);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    log::info!("🚀 Custody backend mock listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Serve `backend` on an ephemeral local port in the background
///
/// Returns the bound address; the server lives as long as the runtime.
pub async fn spawn(backend: Arc<MockBackend>) -> anyhow::Result<SocketAddr> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let app = create_router(backend);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            log::error!("Mock backend stopped: {}", e);
        }
    });

    log::debug!("Mock backend listening on http://{}", addr);
    Ok(addr)
}
