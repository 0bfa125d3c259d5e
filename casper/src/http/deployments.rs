//! Deployments collection

use serde_json::{Map, Value};

use crate::errors::CasperError;
use crate::http::resource::{exact, non_empty, ResourceFilter, ResourceKind};

/// Marker for the `/deployments/` collection
pub struct Deployments;

impl ResourceKind for Deployments {
    const PATH: &'static str = "/deployments/";
    const NOUN: &'static str = "deployments";
    const DEFAULT_SORT: &'static str = "-timestamp";
    const EMBEDDED: Option<&'static str> = Some(r#"{"app_id":1,"job_id":1}"#);
    type Filter = DeploymentFilter;
}

/// Deployment listing filters, all exact matches
#[derive(Debug, Clone, Default)]
pub struct DeploymentFilter {
    pub app_id: Option<String>,
    pub module: Option<String>,
    pub revision: Option<String>,
}

impl ResourceFilter for DeploymentFilter {
    fn to_where(&self) -> Result<Option<Map<String, Value>>, CasperError> {
        let mut clause = Map::new();
        exact(&mut clause, "app_id", self.app_id.as_deref());
        exact(&mut clause, "module", self.module.as_deref());
        exact(&mut clause, "revision", self.revision.as_deref());
        Ok(non_empty(clause))
    }
}
