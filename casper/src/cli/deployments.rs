//! Deployment commands

use clap::Subcommand;
use serde_json::Value;
use tabled::Tabled;

use crate::cli::context::Context;
use crate::cli::output;
use crate::errors::CasperError;
use crate::http::{DeploymentFilter, Deployments, ListQuery, ResourceKind};
use crate::models::Resource;
use crate::utils::format_timestamp;

/// Deployment subcommands
#[derive(Subcommand)]
pub enum DeploymentCommands {
    /// List the deployments
    Ls {
        /// Number of deployments to fetch (defaults to the profile page size)
        #[arg(long)]
        nb: Option<u32>,

        /// Page to fetch
        #[arg(long, default_value_t = 1)]
        page: u32,

        /// Filter by application ID
        #[arg(long)]
        app_id: Option<String>,

        /// Filter by module name
        #[arg(long)]
        module: Option<String>,

        /// Filter by revision
        #[arg(long)]
        revision: Option<String>,
    },

    /// Show the details of a deployment
    Show {
        /// Deployment ID
        deployment_id: String,
    },
}

/// Table row for deployment display
#[derive(Debug, Tabled)]
pub struct DeploymentRow {
    #[tabled(rename = "ID")]
    pub id: String,
    #[tabled(rename = "Job ID")]
    pub job_id: String,
    #[tabled(rename = "Application name")]
    pub app_name: String,
    #[tabled(rename = "Module")]
    pub module: String,
    #[tabled(rename = "Commit")]
    pub commit: String,
    #[tabled(rename = "User")]
    pub user: String,
    #[tabled(rename = "Date")]
    pub date: String,
}

impl From<&Resource> for DeploymentRow {
    fn from(deployment: &Resource) -> Self {
        let text = |path: &[&str]| deployment.lookup_str(path).unwrap_or_default().to_string();
        let date = deployment
            .get("timestamp")
            .and_then(Value::as_f64)
            .and_then(|ts| format_timestamp(ts as i64))
            .unwrap_or_default();

        Self {
            id: deployment.id().unwrap_or_default().to_string(),
            job_id: text(&["job_id", "_id"]),
            app_name: text(&["app_id", "name"]),
            module: text(&["module"]),
            commit: text(&["commit"]),
            user: text(&["job_id", "user"]),
            date,
        }
    }
}

/// Execute a deployment command
pub async fn execute(command: DeploymentCommands, ctx: &Context) -> Result<(), CasperError> {
    match command {
        DeploymentCommands::Ls {
            nb,
            page,
            app_id,
            module,
            revision,
        } => {
            let query = ListQuery::new(nb.unwrap_or(ctx.settings.page_size), page);
            let filter = DeploymentFilter {
                app_id,
                module,
                revision,
            };
            let deployments = ctx.deployments.list(&query, &filter).await?;
            let rows: Vec<DeploymentRow> =
                deployments.items.iter().map(DeploymentRow::from).collect();
            output::print_page(&deployments, Deployments::NOUN, rows, ctx.output)
        }

        DeploymentCommands::Show { deployment_id } => {
            let deployment = ctx.deployments.retrieve(&deployment_id).await?;
            output::print_single(&deployment, ctx.output)
        }
    }
}
