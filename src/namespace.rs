use tracing::debug;

use crate::{
    error::{EnsureError, StoreError},
    store::ResourceStore,
};

/// Creates `namespace` unless it already exists. An empty name is a no-op.
pub async fn ensure_namespace(
    store: &dyn ResourceStore,
    namespace: &str,
) -> Result<(), EnsureError> {
    if namespace.is_empty() {
        return Ok(());
    }
    match store.create_namespace(namespace).await {
        Ok(()) => {
            debug!(%namespace, "namespace created");
            Ok(())
        }
        Err(StoreError::AlreadyExists) => Ok(()),
        Err(source) => Err(EnsureError {
            namespace: namespace.to_string(),
            source,
        }),
    }
}
