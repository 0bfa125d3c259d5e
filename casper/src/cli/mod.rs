//! Command line interface

pub mod apps;
pub mod context;
pub mod deployments;
pub mod jobs;
pub mod output;
pub mod submit;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::errors::CasperError;
use crate::logs::{LogLevel, LogOptions};
use crate::settings::DEFAULT_PROFILE;
use crate::utils::version_info;

pub use context::{Context, DialoguerPrompt, Prompt};
pub use output::OutputFormat;

/// Casper CLI application
#[derive(Parser)]
#[command(name = "casper")]
#[command(about = "Command line client for Cloud Deploy", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Flags shared by every command
#[derive(Args)]
pub struct GlobalArgs {
    /// More verbose output (debug logs)
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: LogLevel,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Profile name to use from the config file
    #[arg(long, global = true, default_value = DEFAULT_PROFILE)]
    pub profile: String,

    /// Location of the config file (defaults to ./.casper then ~/.casper)
    #[arg(long, global = true)]
    pub config_file: Option<PathBuf>,

    /// Cloud Deploy endpoint
    #[arg(long, global = true, env = "CASPER_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Cloud Deploy username
    #[arg(long, global = true, env = "CASPER_USERNAME")]
    pub username: Option<String>,

    /// Cloud Deploy password
    #[arg(long, global = true, env = "CASPER_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    pub output: OutputFormat,

    /// Strip colors from job logs
    #[arg(long, global = true)]
    pub no_color: bool,
}

impl GlobalArgs {
    pub fn log_options(&self) -> LogOptions {
        LogOptions {
            log_level: if self.verbose {
                LogLevel::Debug
            } else {
                self.log_level
            },
            json_format: self.log_json,
        }
    }
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Manage applications
    App {
        #[command(subcommand)]
        command: apps::AppCommands,
    },

    /// Manage jobs
    Job {
        #[command(subcommand)]
        command: jobs::JobCommands,
    },

    /// Manage deployments
    Deployment {
        #[command(subcommand)]
        command: deployments::DeploymentCommands,
    },

    #[command(flatten)]
    Submit(submit::SubmitCommands),

    /// Show version information
    Version,
}

/// Run a parsed command line
pub async fn run(cli: Cli) -> Result<(), CasperError> {
    let Cli { global, command } = cli;

    if let Commands::Version = command {
        return output::print_version(&version_info(), global.output);
    }

    let ctx = Context::resolve(&global, &DialoguerPrompt)?;
    match command {
        Commands::App { command } => apps::execute(command, &ctx).await,
        Commands::Job { command } => jobs::execute(command, &ctx).await,
        Commands::Deployment { command } => deployments::execute(command, &ctx).await,
        Commands::Submit(command) => submit::execute(command, &ctx).await,
        Commands::Version => output::print_version(&version_info(), ctx.output),
    }
}
