//! Job commands

use std::path::{Path, PathBuf};

use clap::Subcommand;
use ghost_models::{JobCommand, JobStatus};
use tabled::Tabled;
use tracing::debug;

use crate::cli::context::Context;
use crate::cli::output;
use crate::errors::CasperError;
use crate::http::{JobFilter, Jobs, ListQuery, ResourceKind};
use crate::joblog::TeeSink;
use crate::models::Resource;

/// Job subcommands
#[derive(Subcommand)]
pub enum JobCommands {
    /// List the jobs
    Ls {
        /// Number of jobs to fetch (defaults to the profile page size)
        #[arg(long)]
        nb: Option<u32>,

        /// Page to fetch
        #[arg(long, default_value_t = 1)]
        page: u32,

        /// Filter by application name (regex usage possible)
        #[arg(long)]
        application: Option<String>,

        /// Filter by application environment
        #[arg(long)]
        env: Option<String>,

        /// Filter by application role
        #[arg(long)]
        role: Option<String>,

        /// Filter by job command
        #[arg(long)]
        command: Option<JobCommand>,

        /// Filter by job status
        #[arg(long)]
        status: Option<JobStatus>,

        /// Filter by job user
        #[arg(long)]
        user: Option<String>,
    },

    /// Show the details of a job
    Show {
        /// Job ID
        job_id: String,
    },

    /// Show the logs of a job, following them while it runs
    Log {
        /// Job ID
        job_id: String,

        /// Also write the log to this file
        #[arg(long)]
        output_file: Option<PathBuf>,

        /// Wait for a job that has not started yet
        #[arg(long)]
        wait: bool,
    },
}

/// Table row for job display
#[derive(Debug, Tabled)]
pub struct JobRow {
    #[tabled(rename = "ID")]
    pub id: String,
    #[tabled(rename = "Application name")]
    pub app_name: String,
    #[tabled(rename = "Command")]
    pub command: String,
    #[tabled(rename = "Status")]
    pub status: String,
    #[tabled(rename = "User")]
    pub user: String,
    #[tabled(rename = "Date")]
    pub date: String,
}

impl From<&Resource> for JobRow {
    fn from(job: &Resource) -> Self {
        let text = |path: &[&str]| job.lookup_str(path).unwrap_or_default().to_string();
        Self {
            id: job.id().unwrap_or_default().to_string(),
            app_name: text(&["app_id", "name"]),
            command: text(&["command"]),
            status: text(&["status"]),
            user: text(&["user"]),
            date: text(&["_created"]),
        }
    }
}

/// Stream the log of `job_id` to stdout, and to `output_file` when given
pub(crate) async fn follow_log(
    ctx: &Context,
    job_id: &str,
    output_file: Option<&Path>,
    wait: bool,
) -> Result<(), CasperError> {
    let mut sink = TeeSink::stdout(output_file, ctx.no_color)?;
    let report = ctx.log_streamer(wait).follow(job_id, &mut sink).await?;
    debug!("Log of job {} done: {:?}", job_id, report);
    Ok(())
}

/// Execute a job command
pub async fn execute(command: JobCommands, ctx: &Context) -> Result<(), CasperError> {
    match command {
        JobCommands::Ls {
            nb,
            page,
            application,
            env,
            role,
            command,
            status,
            user,
        } => {
            let query = ListQuery::new(nb.unwrap_or(ctx.settings.page_size), page);
            let filter = JobFilter {
                application,
                env,
                role,
                command,
                status,
                user,
            };
            let jobs = ctx.jobs.list(&query, &filter).await?;
            let rows: Vec<JobRow> = jobs.items.iter().map(JobRow::from).collect();
            output::print_page(&jobs, Jobs::NOUN, rows, ctx.output)
        }

        JobCommands::Show { job_id } => {
            let job = ctx.jobs.retrieve(&job_id).await?;
            output::print_single(&job, ctx.output)
        }

        JobCommands::Log {
            job_id,
            output_file,
            wait,
        } => follow_log(ctx, &job_id, output_file.as_deref(), wait).await,
    }
}
