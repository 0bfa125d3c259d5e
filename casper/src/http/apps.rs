//! Applications collection

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use crate::errors::CasperError;
use crate::http::resource::{exact, non_empty, regex, ResourceClient, ResourceFilter, ResourceKind};

static SLUG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9\-_]*$").expect("static pattern")
});

/// Environment and role names are lowercase slugs
pub(crate) fn validate_slug(field: &str, value: Option<&str>) -> Result<(), CasperError> {
    match value {
        Some(value) if !SLUG.is_match(value) => Err(CasperError::Validation(format!(
            "{} is not a valid value for {}",
            value, field
        ))),
        _ => Ok(()),
    }
}

/// Marker for the `/apps/` collection
pub struct Apps;

impl ResourceKind for Apps {
    const PATH: &'static str = "/apps/";
    const NOUN: &'static str = "applications";
    const DEFAULT_SORT: &'static str = "-_updated";
    type Filter = AppFilter;
}

/// Application listing filters
#[derive(Debug, Clone, Default)]
pub struct AppFilter {
    /// Regex on the application name
    pub name: Option<String>,
    pub env: Option<String>,
    pub role: Option<String>,
}

impl ResourceFilter for AppFilter {
    fn to_where(&self) -> Result<Option<Map<String, Value>>, CasperError> {
        validate_slug("env", self.env.as_deref())?;
        validate_slug("role", self.role.as_deref())?;

        let mut clause = Map::new();
        regex(&mut clause, "name", self.name.as_deref());
        exact(&mut clause, "env", self.env.as_deref());
        exact(&mut clause, "role", self.role.as_deref());
        Ok(non_empty(clause))
    }
}

impl ResourceClient<Apps> {
    /// Names of the modules an application declares, in declaration order
    pub async fn module_names(&self, app_id: &str) -> Result<Vec<String>, CasperError> {
        let app = self.retrieve(app_id).await?;
        let modules = app
            .get("modules")
            .and_then(Value::as_array)
            .ok_or_else(|| CasperError::Decode {
                url: self.http().url(&format!("{}{}", Apps::PATH, app_id)),
                reason: "application has no module list".to_string(),
            })?;

        modules
            .iter()
            .map(|module| {
                module
                    .get("name")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .ok_or_else(|| CasperError::Decode {
                        url: self.http().url(&format!("{}{}", Apps::PATH, app_id)),
                        reason: "module without a name".to_string(),
                    })
            })
            .collect()
    }
}
