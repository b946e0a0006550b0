use kube::api::DynamicObject;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{error, warn};

use crate::error::ExtractionError;

/// Flat `path -> value` document delivered to the status endpoint.
pub type StatusDocument = Map<String, Value>;

/// Dot-separated field paths parsed from a comma-separated status annotation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusPathSet(Vec<String>);

impl StatusPathSet {
    pub fn parse(raw: &str) -> Self {
        Self(
            raw.split(',')
                .map(str::trim)
                .filter(|path| !path.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    pub fn paths(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Looks up a single dot-separated path in a generic field tree.
pub fn lookup(root: &Value, path: &str) -> Result<Value, ExtractionError> {
    let mut current = root;
    for segment in path.split('.') {
        let fields = current
            .as_object()
            .ok_or_else(|| ExtractionError::NotAnObject {
                path: path.to_string(),
                segment: segment.to_string(),
            })?;
        current = fields
            .get(segment)
            .ok_or_else(|| ExtractionError::Missing {
                path: path.to_string(),
                segment: segment.to_string(),
            })?;
    }
    Ok(current.clone())
}

/// Builds the status document for `root`. Paths that fail to resolve are logged and left out.
pub fn extract_value(root: &Value, paths: &StatusPathSet) -> StatusDocument {
    let mut document = StatusDocument::new();
    for path in paths.paths() {
        match lookup(root, path) {
            Ok(value) => {
                document.insert(path.clone(), value);
            }
            Err(err) => warn!(error = %err, "watch error getting status field value"),
        }
    }
    document
}

pub fn extract(object: &DynamicObject, paths: &StatusPathSet) -> StatusDocument {
    match serde_json::to_value(object) {
        Ok(root) => extract_value(&root, paths),
        Err(err) => {
            error!(error = %err, "watch failed to convert object");
            StatusDocument::new()
        }
    }
}
