use kube::{
    ResourceExt,
    api::{DynamicObject, TypeMeta},
    discovery::ApiResource,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::{error::ResourceError, status::StatusPathSet};

/// Annotation through which a desired document opts into status propagation.
pub const STATUS_ANNOTATION: &str = "status";

/// Type-level key of a resource: `(group, version, plural)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ResourceIdentity {
    pub group: String,
    pub version: String,
    pub plural: String,
}

impl ResourceIdentity {
    /// Splits `apiVersion` into group and version and pluralises the kind the naive way
    /// (`CronTab` -> `crontabs`). Core resources have an empty group.
    pub fn from_type_meta(types: &TypeMeta) -> Result<Self, ResourceError> {
        if types.kind.is_empty() {
            return Err(ResourceError::EmptyKind);
        }
        let (group, version) = match types.api_version.split_once('/') {
            Some((group, version)) => (group.to_string(), version.to_string()),
            None => (String::new(), types.api_version.clone()),
        };
        Ok(Self {
            group,
            version,
            plural: format!("{}s", types.kind.to_lowercase()),
        })
    }

    pub fn api_version(&self) -> String {
        if self.group.is_empty() {
            self.version.clone()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }

    pub fn to_api_resource(&self, kind: &str) -> ApiResource {
        ApiResource {
            group: self.group.clone(),
            version: self.version.clone(),
            api_version: self.api_version(),
            kind: kind.to_string(),
            plural: self.plural.clone(),
        }
    }
}

impl From<&ApiResource> for ResourceIdentity {
    fn from(ar: &ApiResource) -> Self {
        Self {
            group: ar.group.clone(),
            version: ar.version.clone(),
            plural: ar.plural.clone(),
        }
    }
}

impl std::fmt::Display for ResourceIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.api_version(), self.plural)
    }
}

/// One item of the desired state, validated to carry a name and type information.
///
/// Everything besides type and metadata is held verbatim in `object.data` and is
/// authoritative over the live object when applied.
#[derive(Debug, Clone)]
pub struct DesiredResource {
    pub identity: ResourceIdentity,
    pub api_resource: ApiResource,
    pub object: DynamicObject,
}

impl DesiredResource {
    pub fn name(&self) -> String {
        self.object.name_any()
    }

    /// `None` for cluster-scoped documents.
    pub fn namespace(&self) -> Option<String> {
        self.object.namespace().filter(|ns| !ns.is_empty())
    }

    pub fn is_deleted(&self) -> bool {
        self.object.metadata.deletion_timestamp.is_some()
    }

    /// Paths declared in the status annotation, if the document carries one.
    pub fn status_paths(&self) -> Option<StatusPathSet> {
        self.object
            .annotations()
            .get(STATUS_ANNOTATION)
            .map(|raw| StatusPathSet::parse(raw))
    }

    /// Decodes one raw payload item. A blank or null `metadata.deletionTimestamp` means the
    /// item is not being deleted.
    pub fn from_value(mut item: Value) -> Result<Self, ResourceError> {
        if let Some(metadata) = item.get_mut("metadata").and_then(Value::as_object_mut) {
            let blank = metadata
                .get("deletionTimestamp")
                .is_some_and(|ts| ts.is_null() || ts.as_str() == Some(""));
            if blank {
                metadata.remove("deletionTimestamp");
            }
        }
        let object: DynamicObject =
            serde_json::from_value(item).map_err(|err| ResourceError::Decode(err.to_string()))?;
        Self::try_from(object)
    }
}

impl TryFrom<DynamicObject> for DesiredResource {
    type Error = ResourceError;

    fn try_from(object: DynamicObject) -> Result<Self, Self::Error> {
        let types = object
            .types
            .as_ref()
            .ok_or(ResourceError::MissingTypeMeta)?;
        let identity = ResourceIdentity::from_type_meta(types)?;
        if object.metadata.name.as_deref().unwrap_or_default().is_empty() {
            return Err(ResourceError::MissingName(types.kind.clone()));
        }
        let api_resource = identity.to_api_resource(&types.kind);
        Ok(Self {
            identity,
            api_resource,
            object,
        })
    }
}

/// Wire envelope of one poll response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncPayload {
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub page: String,
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub total: String,
    /// Raw documents; each one is decoded on its own so a bad item cannot sink the rest.
    #[serde(default)]
    pub items: Vec<Value>,
}

impl SyncPayload {
    /// Validated items in payload order. Invalid documents are logged and dropped.
    pub fn into_desired(self) -> Vec<DesiredResource> {
        self.items
            .into_iter()
            .enumerate()
            .filter_map(|(index, item)| match DesiredResource::from_value(item) {
                Ok(desired) => Some(desired),
                Err(err) => {
                    warn!(index, error = %err, "skipping invalid desired document");
                    None
                }
            })
            .collect()
    }
}
