//! Jobs collection

use ghost_models::{JobCommand, JobPayload, JobStatus};
use serde_json::{Map, Value};
use tracing::debug;

use crate::errors::CasperError;
use crate::http::apps::validate_slug;
use crate::http::resource::{
    at_url, exact, non_empty, regex, ResourceClient, ResourceFilter, ResourceKind,
};

/// Marker for the `/jobs/` collection
pub struct Jobs;

impl ResourceKind for Jobs {
    const PATH: &'static str = "/jobs/";
    const NOUN: &'static str = "jobs";
    const DEFAULT_SORT: &'static str = "-_updated";
    const EMBEDDED: Option<&'static str> = Some(r#"{"app_id":1}"#);
    type Filter = JobFilter;
}

/// Job listing filters.
///
/// `application`, `env` and `role` apply to the owning application and are
/// expressed against the embedded `app_id` document.
#[derive(Debug, Clone, Default)]
pub struct JobFilter {
    /// Regex on the application name
    pub application: Option<String>,
    pub env: Option<String>,
    pub role: Option<String>,
    pub command: Option<JobCommand>,
    pub status: Option<JobStatus>,
    pub user: Option<String>,
}

impl ResourceFilter for JobFilter {
    fn to_where(&self) -> Result<Option<Map<String, Value>>, CasperError> {
        validate_slug("env", self.env.as_deref())?;
        validate_slug("role", self.role.as_deref())?;

        let mut clause = Map::new();
        regex(&mut clause, "app_id.name", self.application.as_deref());
        exact(&mut clause, "app_id.env", self.env.as_deref());
        exact(&mut clause, "app_id.role", self.role.as_deref());
        exact(&mut clause, "command", self.command.as_ref().map(JobCommand::as_str));
        exact(&mut clause, "status", self.status.as_ref().map(JobStatus::as_str));
        exact(&mut clause, "user", self.user.as_deref());
        Ok(non_empty(clause))
    }
}

impl ResourceClient<Jobs> {
    /// Current status of a job, straight from the server
    pub async fn status(&self, job_id: &str) -> Result<JobStatus, CasperError> {
        let status = self
            .retrieve(job_id)
            .await?
            .job_status()
            .map_err(at_url(self.http().url(&format!("{}{}", Jobs::PATH, job_id))))?;
        debug!("Job {} is {}", job_id, status);
        Ok(status)
    }

    /// Complete log of a job as plain text
    pub async fn fetch_log(&self, job_id: &str) -> Result<String, CasperError> {
        self.http()
            .get_text(&format!("{}{}/logs", Jobs::PATH, job_id))
            .await
    }

    /// Submit a job and return its id
    pub async fn submit(&self, payload: &JobPayload) -> Result<String, CasperError> {
        debug!("Submitting {} job for application {}", payload.command, payload.app_id);
        self.create(payload).await
    }
}
