use std::sync::Arc;

use tracing::{info, warn};

use crate::{
    error::{ApplyError, ReconcileError, StoreError},
    namespace::ensure_namespace,
    resource::DesiredResource,
    store::ResourceStore,
    watch::WatchManager,
};

#[derive(Debug)]
pub enum Outcome {
    Created,
    Updated,
    Deleted,
    Abandoned(ReconcileError),
}

/// Applies desired items to the store one at a time.
///
/// Upserts are blind: the desired document fully replaces the live one and is never
/// diffed against it. A failed update is not retried; the next tick starts over.
#[derive(Clone)]
pub struct Reconciler {
    store: Arc<dyn ResourceStore>,
    watches: WatchManager,
}

impl Reconciler {
    pub fn new(store: Arc<dyn ResourceStore>, watches: WatchManager) -> Self {
        Self { store, watches }
    }

    pub fn watches(&self) -> &WatchManager {
        &self.watches
    }

    pub async fn reconcile(&self, mut item: DesiredResource) -> Outcome {
        let identity = item.identity.clone();
        let name = item.name();
        let namespace = item.namespace();

        if let Some(ns) = namespace.as_deref()
            && let Err(err) = ensure_namespace(self.store.as_ref(), ns).await
        {
            warn!(%identity, %name, error = %err, "abandoning item");
            return Outcome::Abandoned(err.into());
        }

        // Ownership and finalizers stay with whoever owns the kind.
        if item.is_deleted() {
            info!(
                %identity,
                namespace = namespace.as_deref().unwrap_or_default(),
                %name,
                "deleting resource"
            );
            return match self.delete(&item).await {
                Ok(()) => Outcome::Deleted,
                Err(err) => {
                    warn!(%identity, %name, error = %err, "abandoning item");
                    Outcome::Abandoned(err.into())
                }
            };
        }

        info!(
            %identity,
            namespace = namespace.as_deref().unwrap_or_default(),
            %name,
            "createUpdate resource"
        );
        let outcome = match self.upsert(&mut item).await {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(%identity, %name, error = %err, "abandoning item");
                Outcome::Abandoned(err.into())
            }
        };

        if let Err(err) = self.watches.arm(&item).await {
            warn!(%identity, error = %err, "failed to arm status watch");
        }
        outcome
    }

    async fn delete(&self, item: &DesiredResource) -> Result<(), ApplyError> {
        let name = item.name();
        match self
            .store
            .delete(&item.api_resource, item.namespace().as_deref(), &name)
            .await
        {
            Ok(()) => Ok(()),
            Err(StoreError::NotFound) => {
                info!(identity = %item.identity, %name, "resource already gone");
                Ok(())
            }
            Err(source) => Err(ApplyError::Delete { name, source }),
        }
    }

    async fn upsert(&self, item: &mut DesiredResource) -> Result<Outcome, ApplyError> {
        let name = item.name();
        let namespace = item.namespace();
        let ar = item.api_resource.clone();

        match self
            .store
            .create(&ar, namespace.as_deref(), &item.object)
            .await
        {
            Ok(_) => return Ok(Outcome::Created),
            Err(StoreError::AlreadyExists) => {
                info!(identity = %item.identity, %name, "resource exists, updating");
            }
            Err(source) => return Err(ApplyError::Create { name, source }),
        }

        let live = self
            .store
            .get(&ar, namespace.as_deref(), &name)
            .await
            .map_err(|source| ApplyError::Get {
                name: name.clone(),
                source,
            })?;
        item.object.metadata.resource_version = live.metadata.resource_version;

        self.store
            .replace(&ar, namespace.as_deref(), &item.object)
            .await
            .map_err(|source| ApplyError::Update { name, source })?;
        Ok(Outcome::Updated)
    }
}
