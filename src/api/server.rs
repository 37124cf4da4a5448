use axum::{
    http::HeaderValue,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use super::handlers;
use crate::config::DashboardConfig;
use crate::manager::DashboardManager;

/// Build the CORS layer from `ALLOWED_ORIGINS`
///
/// Unset or empty allows any origin (local development).
fn cors_layer() -> CorsLayer {
    match std::env::var("ALLOWED_ORIGINS") {
        Ok(origins) if !origins.trim().is_empty() => {
            log::info!("CORS configured for origins: {}", origins);
            let origin_list: Vec<HeaderValue> = origins
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .filter_map(|s| match s.parse() {
                    Ok(origin) => Some(origin),
                    Err(_) => {
                        log::warn!("Ignoring invalid CORS origin: {}", s);
                        None
                    }
                })
                .collect();
            CorsLayer::new()
                .allow_origin(origin_list)
                .allow_methods(Any)
                .allow_headers(Any)
        }
        _ => {
            log::warn!("CORS: Allowing all origins (development mode). Set ALLOWED_ORIGINS env var for production.");
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        }
    }
}

pub fn create_router(manager: Arc<DashboardManager>) -> Router {
    Router::new()
        .route("/api/health", get(handlers::health_handler))
        // Pledge board
        .route("/api/pledges", get(handlers::list_pledges_handler))
        // Pending requests
        .route("/api/pending", get(handlers::list_pending_handler))
        .route(
            "/api/pending/challenge/:pledge_id",
            get(handlers::challenge_handler),
        )
        .route("/api/approve/:target_id", post(handlers::approve_handler))
        // Settlements
        .route(
            "/api/settlements/outbound",
            post(handlers::prepare_outbound_handler),
        )
        .route(
            "/api/settlements/inbound",
            post(handlers::prepare_inbound_handler),
        )
        .route(
            "/api/settlements/:settlement_id",
            delete(handlers::discard_settlement_handler),
        )
        .route(
            "/api/settlements/:settlement_id/confirm",
            post(handlers::confirm_settlement_handler),
        )
        // Dashboard
        .route("/api/refresh", post(handlers::refresh_handler))
        .route(
            "/api/settings/credentials",
            get(handlers::get_credentials_handler).post(handlers::save_credentials_handler),
        )
        .layer(cors_layer())
        .with_state(manager)
}

pub async fn start_server(config: DashboardConfig) -> anyhow::Result<()> {
    let addr = config.bind_address.clone();
    let manager = Arc::new(DashboardManager::with_config(config)?);

    match manager.stored_credentials() {
        Ok(credentials) if credentials.has_api_key() => {
            log::info!("Using stored API user {:?}", credentials.api_user)
        }
        Ok(_) => log::warn!("No API credentials saved yet; set them via /api/settings/credentials"),
        Err(e) => log::warn!("Could not read stored credentials: {}", e),
    }

    let app = create_router(manager);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    log::info!("Operator console listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Handle graceful shutdown signals (Ctrl+C, SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                log::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            log::info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            log::info!("Received SIGTERM signal");
        },
    }

    log::info!("Shutdown signal received, exiting gracefully...");
}
