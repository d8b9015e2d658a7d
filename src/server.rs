use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::{scan::Scanner, types::ScanRange};

#[derive(Clone)]
pub struct AppState {
    scanner: Arc<Scanner>,
    range: ScanRange,
}

impl AppState {
    pub fn new(scanner: Scanner, range: ScanRange) -> Self {
        Self {
            scanner: Arc::new(scanner),
            range,
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

/// API routes, without binding a listener.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/health", get(get_health))
        .route("/scan", post(post_scan))
        .with_state(state);

    Router::new()
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
}

pub async fn spawn_server(bind: &str, state: AppState) -> Result<()> {
    let app = router(state);
    info!("serving scan API on http://{}", bind);
    axum::serve(tokio::net::TcpListener::bind(bind).await?, app).await?;
    Ok(())
}

async fn get_health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

/// Run one scan over the configured range. The request body is ignored.
async fn post_scan(State(app): State<AppState>) -> impl IntoResponse {
    match app.scanner.run_scan(&app.range).await {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(e) => {
            error!("scan error: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}
