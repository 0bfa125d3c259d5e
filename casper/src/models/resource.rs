//! Normalized server resources

use ghost_models::JobStatus;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::CasperError;

/// Protocol bookkeeping fields removed before resources reach callers
pub const INTERNAL_FIELDS: &[&str] = &["_links", "_version", "_latest_version"];

/// Remove internal fields from every object nested in `value`
pub fn strip_internal_fields(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for field in INTERNAL_FIELDS {
                map.remove(*field);
            }
            for nested in map.values_mut() {
                strip_internal_fields(nested);
            }
        }
        Value::Array(items) => {
            for item in items {
                strip_internal_fields(item);
            }
        }
        _ => {}
    }
}

/// An application, deployment or job as returned by the API, minus
/// internal fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Resource(Map<String, Value>);

impl Resource {
    /// Normalize a decoded body. Anything but a JSON object is rejected.
    pub fn from_value(mut value: Value) -> Result<Self, CasperError> {
        strip_internal_fields(&mut value);
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(CasperError::Malformed(format!(
                "expected an object, got {}",
                other
            ))),
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.str_field("_id")
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Follow a path of object keys, e.g. `["app_id", "name"]` on an
    /// embedded application
    pub fn lookup(&self, path: &[&str]) -> Option<&Value> {
        let (first, rest) = path.split_first()?;
        rest.iter()
            .try_fold(self.0.get(*first)?, |value, key| value.get(*key))
    }

    pub fn lookup_str(&self, path: &[&str]) -> Option<&str> {
        self.lookup(path).and_then(Value::as_str)
    }

    /// Job status, for job resources
    pub fn job_status(&self) -> Result<JobStatus, CasperError> {
        let status = self.str_field("status").ok_or_else(|| {
            CasperError::Malformed(format!("job {} has no status", self.id().unwrap_or("?")))
        })?;
        status
            .parse()
            .map_err(|e: ghost_models::UnknownValue| CasperError::Malformed(e.to_string()))
    }
}
