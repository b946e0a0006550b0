use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::{
    control_plane::ControlPlaneClient,
    error::FetchError,
    reconciler::{Outcome, Reconciler},
};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TickSummary {
    pub items: usize,
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    pub abandoned: usize,
}

impl TickSummary {
    fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Created => self.created += 1,
            Outcome::Updated => self.updated += 1,
            Outcome::Deleted => self.deleted += 1,
            Outcome::Abandoned(_) => self.abandoned += 1,
        }
    }
}

/// Timer-driven fetch and reconcile loop.
pub struct Syncer {
    control_plane: ControlPlaneClient,
    reconciler: Reconciler,
    interval: Duration,
}

impl Syncer {
    pub fn new(
        control_plane: ControlPlaneClient,
        reconciler: Reconciler,
        interval: Duration,
    ) -> Self {
        Self {
            control_plane,
            reconciler,
            interval,
        }
    }

    /// Fetches the desired state and reconciles it item by item, in payload order.
    pub async fn tick(&self) -> Result<TickSummary, FetchError> {
        let items = self.control_plane.fetch().await?.into_desired();
        let mut summary = TickSummary {
            items: items.len(),
            ..Default::default()
        };
        for item in items {
            let outcome = self.reconciler.reconcile(item).await;
            summary.record(&outcome);
        }
        info!(
            items = summary.items,
            created = summary.created,
            updated = summary.updated,
            deleted = summary.deleted,
            abandoned = summary.abandoned,
            "tick complete"
        );
        Ok(summary)
    }

    /// Ticks every interval until `shutdown` fires. The first tick happens one interval
    /// after start; a slow tick delays the next one instead of bunching ticks up.
    pub async fn run(self, shutdown: CancellationToken) {
        let mut ticker = tokio::time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(interval = ?self.interval, "sync loop started");

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {}
            }
            if let Err(err) = self.tick().await {
                error!(error = %err, "skipping tick");
            }
        }
        info!("sync loop stopped");
    }
}
