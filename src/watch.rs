use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, Utc};
use futures::StreamExt;
use serde::Serialize;
use tokio::{sync::Mutex, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::{
    control_plane::StatusSink,
    error::ArmError,
    resource::{DesiredResource, ResourceIdentity},
    status::{self, StatusPathSet},
    store::{EventStream, ResourceStore},
};

struct WatchRegistration {
    paths: StatusPathSet,
    armed_at: DateTime<Utc>,
    task: JoinHandle<()>,
}

type Registry = Arc<Mutex<HashMap<ResourceIdentity, WatchRegistration>>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArmOutcome {
    NoStatusContract,
    AlreadyArmed,
    Armed,
}

#[derive(Debug, Clone, Serialize)]
pub struct WatchSummary {
    pub identity: ResourceIdentity,
    pub paths: StatusPathSet,
    pub armed_at: DateTime<Utc>,
}

/// Keeps at most one status watch per resource type alive.
///
/// The registry is shared between the tick-driven arming path and the watch tasks,
/// which drop their own entry when the store closes the stream. The lock is held across
/// the watch-open call so two arms of the same type can never both open a stream.
#[derive(Clone)]
pub struct WatchManager {
    store: Arc<dyn ResourceStore>,
    sink: Arc<dyn StatusSink>,
    registry: Registry,
    shutdown: CancellationToken,
}

impl WatchManager {
    pub fn new(
        store: Arc<dyn ResourceStore>,
        sink: Arc<dyn StatusSink>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            store,
            sink,
            registry: Arc::new(Mutex::new(HashMap::new())),
            shutdown,
        }
    }

    /// Starts the status watch for `item`'s type if it declares status paths and no watch
    /// for the type is running. The path set is taken from this item and kept for the
    /// lifetime of the watch.
    pub async fn arm(&self, item: &DesiredResource) -> Result<ArmOutcome, ArmError> {
        let Some(paths) = item.status_paths().filter(|paths| !paths.is_empty()) else {
            return Ok(ArmOutcome::NoStatusContract);
        };
        let identity = item.identity.clone();

        let mut registry = self.registry.lock().await;
        if registry.contains_key(&identity) {
            debug!(%identity, "watch already armed");
            return Ok(ArmOutcome::AlreadyArmed);
        }

        info!(%identity, "starting watch");
        let stream = self
            .store
            .watch(&item.api_resource)
            .await
            .map_err(|source| ArmError {
                identity: identity.clone(),
                source,
            })?;

        let task = tokio::spawn(stream_status(
            identity.clone(),
            paths.clone(),
            stream,
            self.sink.clone(),
            self.registry.clone(),
            self.shutdown.clone(),
        ));
        registry.insert(
            identity,
            WatchRegistration {
                paths,
                armed_at: Utc::now(),
                task,
            },
        );
        Ok(ArmOutcome::Armed)
    }

    pub async fn is_armed(&self, identity: &ResourceIdentity) -> bool {
        self.registry.lock().await.contains_key(identity)
    }

    pub async fn summaries(&self) -> Vec<WatchSummary> {
        let registry = self.registry.lock().await;
        let mut summaries: Vec<WatchSummary> = registry
            .iter()
            .map(|(identity, registration)| WatchSummary {
                identity: identity.clone(),
                paths: registration.paths.clone(),
                armed_at: registration.armed_at,
            })
            .collect();
        summaries.sort_by(|a, b| a.identity.cmp(&b.identity));
        summaries
    }

    /// Waits for every watch task to finish. Call after cancelling the shutdown token.
    pub async fn join(&self) {
        let tasks: Vec<JoinHandle<()>> = self
            .registry
            .lock()
            .await
            .drain()
            .map(|(_, registration)| registration.task)
            .collect();
        for task in tasks {
            if let Err(err) = task.await {
                error!(error = %err, "watch task failed");
            }
        }
    }
}

async fn stream_status(
    identity: ResourceIdentity,
    paths: StatusPathSet,
    mut stream: EventStream,
    sink: Arc<dyn StatusSink>,
    registry: Registry,
    shutdown: CancellationToken,
) {
    info!(%identity, "watch started, waiting for events...");
    loop {
        let event = tokio::select! {
            _ = shutdown.cancelled() => {
                info!(%identity, "watch stopping on shutdown");
                break;
            }
            event = stream.next() => event,
        };
        match event {
            Some(Ok(event)) => {
                let document = status::extract(event.object(), &paths);
                debug!(%identity, fields = document.len(), "delivering status");
                if let Err(err) = sink.deliver(&document).await {
                    warn!(%identity, error = %err, "dropping status update");
                }
            }
            Some(Err(err)) => error!(%identity, error = %err, "error from watch stream"),
            None => {
                info!(%identity, "watch stream closed");
                break;
            }
        }
    }
    registry.lock().await.remove(&identity);
}
