//! Job submission commands

use std::path::PathBuf;

use clap::{Args, Subcommand};
use ghost_models::{
    DeploymentStrategy, SafeDeploymentStrategy, ScriptExecutionStrategy, SwapStrategy,
};
use tracing::info;

use crate::cli::context::Context;
use crate::cli::jobs::follow_log;
use crate::commands::{
    BuildImage, CommandKind, CreateInstance, Deploy, ExecuteScript, JobRequest, ModuleLookup,
    ModuleSelection, PrepareBlueGreen, RecreateInstances, Redeploy, ScriptParams, SwapBlueGreen,
};
use crate::errors::CasperError;
use crate::settings::Settings;

/// Follow-up shared by every submission
#[derive(Args, Debug, Clone, Copy)]
pub struct FollowArgs {
    /// Follow the log of the created job
    #[arg(long)]
    pub log: bool,
}

/// Job submission commands
#[derive(Subcommand)]
pub enum SubmitCommands {
    /// Create a "deploy" job
    #[command(name = "deploy")]
    Deploy {
        /// Application ID
        app_id: String,

        /// Module(s) to deploy, as `name` or `name:revision`
        #[arg(short = 'm', long = "module")]
        modules: Vec<String>,

        /// Deploy every module of the application
        #[arg(long)]
        all_modules: bool,

        /// Deployment strategy (default serial)
        #[arg(long)]
        strategy: Option<DeploymentStrategy>,

        /// Safe deployment strategy (default none)
        #[arg(long)]
        safe_deploy_strategy: Option<SafeDeploymentStrategy>,

        #[command(flatten)]
        follow: FollowArgs,
    },

    /// Create a "redeploy" job
    #[command(name = "redeploy")]
    Redeploy {
        /// Application ID
        app_id: String,

        /// Previous deployment to redeploy
        deployment_id: String,

        /// Deployment strategy (default serial)
        #[arg(long)]
        strategy: Option<DeploymentStrategy>,

        /// Safe deployment strategy (default none)
        #[arg(long)]
        safe_deploy_strategy: Option<SafeDeploymentStrategy>,

        #[command(flatten)]
        follow: FollowArgs,
    },

    /// Create an "executescript" job
    #[command(name = "executescript")]
    ExecuteScript {
        /// Application ID
        app_id: String,

        /// Script to execute
        script_file: PathBuf,

        /// Script execution strategy
        #[arg(long, default_value = "serial")]
        strategy: ScriptExecutionStrategy,

        /// Safe deployment strategy (defaults to the profile setting, 1by1)
        #[arg(long)]
        safe_deploy_strategy: Option<SafeDeploymentStrategy>,

        /// Instance IP, for the single strategy
        #[arg(long)]
        instance_ip: Option<String>,

        /// Run the script from this module's working directory
        #[arg(long)]
        module_context: Option<String>,

        #[command(flatten)]
        follow: FollowArgs,
    },

    /// Create a "buildimage" job
    #[command(name = "buildimage")]
    BuildImage {
        /// Application ID
        app_id: String,

        /// Force instance type for the build
        #[arg(long)]
        instance_type: Option<String>,

        /// Force skipping the provisioner bootstrap (true or false)
        #[arg(long)]
        skip_bootstrap: Option<bool>,

        #[command(flatten)]
        follow: FollowArgs,
    },

    /// Create a "createinstance" job
    #[command(name = "createinstance")]
    CreateInstance {
        /// Application ID
        app_id: String,

        /// Force instance subnet id
        #[arg(long)]
        subnet_id: Option<String>,

        /// Force private IP address, requires --subnet-id
        #[arg(long)]
        private_ip_address: Option<String>,

        #[command(flatten)]
        follow: FollowArgs,
    },

    /// Create a "destroyallinstances" job
    #[command(name = "destroyallinstances")]
    DestroyAllInstances {
        /// Application ID
        app_id: String,

        #[command(flatten)]
        follow: FollowArgs,
    },

    /// Create a "recreateinstances" job
    #[command(name = "recreateinstances")]
    RecreateInstances {
        /// Application ID
        app_id: String,

        /// Rolling update strategy
        #[arg(long)]
        rolling_update_strategy: Option<String>,

        #[command(flatten)]
        follow: FollowArgs,
    },

    /// Create a "updatelifecyclehooks" job
    #[command(name = "updatelifecyclehooks")]
    UpdateLifecycleHooks {
        /// Application ID
        app_id: String,

        #[command(flatten)]
        follow: FollowArgs,
    },

    /// Create a "updateautoscaling" job
    #[command(name = "updateautoscaling")]
    UpdateAutoscaling {
        /// Application ID
        app_id: String,

        #[command(flatten)]
        follow: FollowArgs,
    },

    /// Create a "preparebluegreen" job
    #[command(name = "preparebluegreen")]
    PrepareBlueGreen {
        /// Application ID
        app_id: String,

        /// Copy the online AMI to the offline application (true or false)
        #[arg(long)]
        copy_ami: Option<bool>,

        #[command(flatten)]
        follow: FollowArgs,
    },

    /// Create a "swapbluegreen" job
    #[command(name = "swapbluegreen")]
    SwapBlueGreen {
        /// Application ID
        app_id: String,

        /// Swap strategy (isolated or overlap)
        #[arg(long)]
        strategy: Option<SwapStrategy>,

        #[command(flatten)]
        follow: FollowArgs,
    },

    /// Create a "purgebluegreen" job
    #[command(name = "purgebluegreen")]
    PurgeBlueGreen {
        /// Application ID
        app_id: String,

        #[command(flatten)]
        follow: FollowArgs,
    },
}

impl SubmitCommands {
    pub fn follow(&self) -> FollowArgs {
        match self {
            SubmitCommands::Deploy { follow, .. }
            | SubmitCommands::Redeploy { follow, .. }
            | SubmitCommands::ExecuteScript { follow, .. }
            | SubmitCommands::BuildImage { follow, .. }
            | SubmitCommands::CreateInstance { follow, .. }
            | SubmitCommands::DestroyAllInstances { follow, .. }
            | SubmitCommands::RecreateInstances { follow, .. }
            | SubmitCommands::UpdateLifecycleHooks { follow, .. }
            | SubmitCommands::UpdateAutoscaling { follow, .. }
            | SubmitCommands::PrepareBlueGreen { follow, .. }
            | SubmitCommands::SwapBlueGreen { follow, .. }
            | SubmitCommands::PurgeBlueGreen { follow, .. } => *follow,
        }
    }
}

/// Validate a submission and turn it into a job request. Only
/// `deploy --all-modules` reaches the network, through `lookup`.
pub async fn build_request(
    command: SubmitCommands,
    lookup: &(dyn ModuleLookup + Sync),
    settings: &Settings,
) -> Result<JobRequest, CasperError> {
    let request = match command {
        SubmitCommands::Deploy {
            app_id,
            modules,
            all_modules,
            strategy,
            safe_deploy_strategy,
            ..
        } => {
            let selection = ModuleSelection::from_flags(&modules, all_modules)?;
            let modules = selection.resolve(&app_id, lookup).await?;
            let deploy = Deploy::new(modules, strategy.unwrap_or_default(), safe_deploy_strategy)?;
            JobRequest::new(app_id, CommandKind::Deploy(deploy))
        }

        SubmitCommands::Redeploy {
            app_id,
            deployment_id,
            strategy,
            safe_deploy_strategy,
            ..
        } => {
            let redeploy = Redeploy::new(
                deployment_id,
                strategy.unwrap_or_default(),
                safe_deploy_strategy,
            )?;
            JobRequest::new(app_id, CommandKind::Redeploy(redeploy))
        }

        SubmitCommands::ExecuteScript {
            app_id,
            script_file,
            strategy,
            safe_deploy_strategy,
            instance_ip,
            module_context,
            ..
        } => {
            let script = tokio::fs::read_to_string(&script_file).await?;
            let params = ScriptParams {
                script,
                strategy,
                safe_strategy: safe_deploy_strategy,
                instance_ip,
                module_context,
            };
            let execute = ExecuteScript::new(params, settings.script_safe_strategy)?;
            JobRequest::new(app_id, CommandKind::ExecuteScript(execute))
        }

        SubmitCommands::BuildImage {
            app_id,
            instance_type,
            skip_bootstrap,
            ..
        } => JobRequest::new(
            app_id,
            CommandKind::BuildImage(BuildImage {
                instance_type,
                skip_bootstrap,
            }),
        ),

        SubmitCommands::CreateInstance {
            app_id,
            subnet_id,
            private_ip_address,
            ..
        } => JobRequest::new(
            app_id,
            CommandKind::CreateInstance(CreateInstance::new(subnet_id, private_ip_address)?),
        ),

        SubmitCommands::DestroyAllInstances { app_id, .. } => {
            JobRequest::new(app_id, CommandKind::DestroyAllInstances)
        }

        SubmitCommands::RecreateInstances {
            app_id,
            rolling_update_strategy,
            ..
        } => JobRequest::new(
            app_id,
            CommandKind::RecreateInstances(RecreateInstances {
                rolling_update_strategy,
            }),
        ),

        SubmitCommands::UpdateLifecycleHooks { app_id, .. } => {
            JobRequest::new(app_id, CommandKind::UpdateLifecycleHooks)
        }

        SubmitCommands::UpdateAutoscaling { app_id, .. } => {
            JobRequest::new(app_id, CommandKind::UpdateAutoscaling)
        }

        SubmitCommands::PrepareBlueGreen {
            app_id, copy_ami, ..
        } => JobRequest::new(
            app_id,
            CommandKind::PrepareBlueGreen(PrepareBlueGreen { copy_ami }),
        ),

        SubmitCommands::SwapBlueGreen {
            app_id, strategy, ..
        } => JobRequest::new(app_id, CommandKind::SwapBlueGreen(SwapBlueGreen { strategy })),

        SubmitCommands::PurgeBlueGreen { app_id, .. } => {
            JobRequest::new(app_id, CommandKind::PurgeBlueGreen)
        }
    };
    Ok(request)
}

/// Submit a job, then follow its log when asked
pub async fn execute(command: SubmitCommands, ctx: &Context) -> Result<(), CasperError> {
    let follow = command.follow();
    let request = build_request(command, &ctx.apps, &ctx.settings).await?;

    let payload = request.encode();
    info!(
        "Creating {} job for application {}",
        payload.command, payload.app_id
    );
    let job_id = ctx.jobs.submit(&payload).await?;
    println!("Job creation OK - ID : {}", job_id);

    if follow.log {
        follow_log(ctx, &job_id, None, true).await?;
    }
    Ok(())
}
