use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use uuid::Uuid;

use crate::notifier::ErrorNotifier;
use crate::relay::{AlertRouter, RelayOutcome};

/// Shared application state
pub struct AppState {
    router: AlertRouter,
    notifier: ErrorNotifier,
}

impl AppState {
    pub fn new(router: AlertRouter, notifier: ErrorNotifier) -> Self {
        Self { router, notifier }
    }
}

#[derive(Debug, Deserialize)]
struct RelayQuery {
    key: Option<String>,
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health).post(relay_alert))
        .route("/", post(relay_alert))
        .route("/{*path}", post(relay_alert))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Serve until Ctrl-C.
pub async fn serve(state: Arc<AppState>, bind: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind to {}", bind))?;

    info!("Listening on {}", bind);

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await
        .context("Server error")?;

    Ok(())
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn relay_alert(
    State(state): State<Arc<AppState>>,
    query: Result<Query<RelayQuery>, QueryRejection>,
    body: Bytes,
) -> Response {
    let request_id = Uuid::new_v4().to_string();
    // An unreadable query carries no key.
    let key = query.ok().and_then(|Query(q)| q.key);

    match state.router.handle(key.as_deref(), &body).await {
        Ok(RelayOutcome::Delivered { destinations }) => {
            info!(
                request_id = %request_id,
                "Alert delivered to {}",
                destinations.join(", ")
            );
            (StatusCode::OK, "ok").into_response()
        }
        Ok(RelayOutcome::NoRoute) => StatusCode::NO_CONTENT.into_response(),
        Ok(RelayOutcome::Unauthorized) => {
            (StatusCode::UNAUTHORIZED, "Unauthorized").into_response()
        }
        Err(e) => {
            error!(request_id = %request_id, "Error relaying alert: {:#}", e);
            state.notifier.notify(&e, &request_id).await;
            (StatusCode::INTERNAL_SERVER_ERROR, format!("{:#}", e)).into_response()
        }
    }
}
