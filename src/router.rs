use crate::watch::{WatchManager, WatchSummary};
use axum::{Router, extract::State, response::Json, routing::get};
use serde::Serialize;
use tower_http::trace::TraceLayer;

#[derive(Serialize)]
struct HealthCheck {
    message: String,
}

pub fn new_router(watches: WatchManager) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/watches", get(watches_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(watches)
}

async fn watches_handler(State(watches): State<WatchManager>) -> Json<Vec<WatchSummary>> {
    Json(watches.summaries().await)
}

async fn healthz() -> Json<HealthCheck> {
    Json(HealthCheck {
        message: "ok".into(),
    })
}
