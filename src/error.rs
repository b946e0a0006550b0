use crate::resource::ResourceIdentity;

/// Classified response from the resource store.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("resource already exists")]
    AlreadyExists,
    #[error("resource not found")]
    NotFound,
    #[error("resource version conflict")]
    Conflict,
    #[error("kube api error: {0}")]
    Kube(#[source] kube::Error),
}

impl From<kube::Error> for StoreError {
    fn from(err: kube::Error) -> Self {
        match &err {
            kube::Error::Api(ae) if ae.code == 404 => StoreError::NotFound,
            kube::Error::Api(ae) if ae.code == 409 && ae.reason == "AlreadyExists" => {
                StoreError::AlreadyExists
            }
            kube::Error::Api(ae) if ae.code == 409 => StoreError::Conflict,
            _ => StoreError::Kube(err),
        }
    }
}

/// A desired document that cannot be reconciled at all.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ResourceError {
    #[error("document has no apiVersion/kind")]
    MissingTypeMeta,
    #[error("document of kind {0} has no metadata.name")]
    MissingName(String),
    #[error("document has an empty kind")]
    EmptyKind,
    #[error("document cannot be decoded: {0}")]
    Decode(String),
}

/// Configuration that loads but cannot drive the service.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("CPSYNC_INTERVAL_SECS must be at least 1")]
    ZeroInterval,
}

#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    #[error("error getting control plane payload to sync: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("control plane answered with status {0}")]
    Status(reqwest::StatusCode),
    #[error("error decoding payload: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(thiserror::Error, Debug)]
#[error("failed to create namespace {namespace}: {source}")]
pub struct EnsureError {
    pub namespace: String,
    #[source]
    pub source: StoreError,
}

#[derive(thiserror::Error, Debug)]
pub enum ApplyError {
    #[error("failed to create {name}: {source}")]
    Create {
        name: String,
        #[source]
        source: StoreError,
    },
    #[error("failed to get current object {name}: {source}")]
    Get {
        name: String,
        #[source]
        source: StoreError,
    },
    #[error("failed to update object {name}: {source}")]
    Update {
        name: String,
        #[source]
        source: StoreError,
    },
    #[error("failed to delete {name}: {source}")]
    Delete {
        name: String,
        #[source]
        source: StoreError,
    },
}

/// Why a desired item was abandoned for the current tick.
#[derive(thiserror::Error, Debug)]
pub enum ReconcileError {
    #[error(transparent)]
    Ensure(#[from] EnsureError),
    #[error(transparent)]
    Apply(#[from] ApplyError),
}

#[derive(thiserror::Error, Debug)]
#[error("error watching resource {identity}: {source}")]
pub struct ArmError {
    pub identity: ResourceIdentity,
    #[source]
    pub source: StoreError,
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("field {segment} of path {path} not found")]
    Missing { path: String, segment: String },
    #[error("field {segment} of path {path} is not an object")]
    NotAnObject { path: String, segment: String },
}

#[derive(thiserror::Error, Debug)]
pub enum DeliveryError {
    #[error("failed to post status: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("status endpoint answered with {0}")]
    Status(reqwest::StatusCode),
}
