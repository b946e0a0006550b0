//! Development control plane: serves a fixed desired-state payload and prints the status
//! documents posted back to it.

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use serde_json::{Value, json};
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::status::StatusDocument;

#[derive(Clone)]
pub struct StubState {
    payload: Arc<RwLock<Value>>,
    received: Arc<RwLock<Vec<StatusDocument>>>,
}

impl Default for StubState {
    fn default() -> Self {
        Self::with_payload(sample_payload())
    }
}

impl StubState {
    pub fn with_payload(payload: Value) -> Self {
        Self {
            payload: Arc::new(RwLock::new(payload)),
            received: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub async fn set_payload(&self, payload: Value) {
        *self.payload.write().await = payload;
    }

    pub async fn received(&self) -> Vec<StatusDocument> {
        self.received.read().await.clone()
    }
}

pub fn stub_router(state: StubState) -> Router {
    Router::new()
        .route("/api/crontabs", get(crontabs))
        .route("/api/status", post(status))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn crontabs(State(state): State<StubState>) -> Json<Value> {
    Json(state.payload.read().await.clone())
}

async fn status(State(state): State<StubState>, body: Bytes) -> StatusCode {
    let document: StatusDocument = match serde_json::from_slice(&body) {
        Ok(document) => document,
        Err(err) => {
            warn!(error = %err, "error decoding status");
            return StatusCode::BAD_REQUEST;
        }
    };
    match serde_json::to_string_pretty(&document) {
        Ok(pretty) => info!("status received\n{pretty}"),
        Err(err) => warn!(error = %err, "failed to render status"),
    }
    state.received.write().await.push(document);
    StatusCode::OK
}

/// One CronTab to upsert, one CronTab marked for deletion and a core Secret.
pub fn sample_payload() -> Value {
    json!({
        "kind": "",
        "page": "1",
        "size": "3",
        "total": "3",
        "items": [
            {
                "apiVersion": "stable.example.com/v1",
                "kind": "CronTab",
                "metadata": {
                    "name": "my-new-cron-object",
                    "namespace": "test",
                    "annotations": {"status": "spec.cronSpec"}
                },
                "spec": {
                    "cronSpec": "* * * * */10",
                    "image": "my-awesome-cron-image"
                }
            },
            {
                "apiVersion": "stable.example.com/v1",
                "kind": "CronTab",
                "metadata": {
                    "deletionTimestamp": "2018-08-24T17:15:39Z",
                    "name": "my-old-cron-object",
                    "namespace": "test"
                },
                "spec": {
                    "cronSpec": "* * * * */5",
                    "image": "my-awesome-cron-image",
                    "secretRef": "mysecret"
                }
            },
            {
                "apiVersion": "v1",
                "data": {
                    "password": "cGFzc3dvcmQ=",
                    "username": "dXNlci1uYW1l"
                },
                "kind": "Secret",
                "metadata": {"name": "mysecret", "namespace": "test"},
                "type": "Opaque"
            }
        ]
    })
}
