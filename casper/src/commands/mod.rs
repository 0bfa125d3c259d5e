//! Job commands
//!
//! A [`JobRequest`] is the typed form of a job submission. The positional
//! `options` array the server expects only exists in [`JobPayload`], built
//! by [`JobRequest::encode`] and read back by [`JobRequest::decode`].

pub mod bluegreen;
pub mod deploy;
pub mod instances;
pub mod script;

use ghost_models::{JobCommand, JobPayload};

use crate::errors::CasperError;

pub use bluegreen::{PrepareBlueGreen, SwapBlueGreen};
pub use deploy::{Deploy, ModuleLookup, ModuleSelection, Redeploy};
pub use instances::{BuildImage, CreateInstance, RecreateInstances};
pub use script::{ExecuteScript, ScriptParams, ScriptTarget};

/// Typed parameters of each job command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandKind {
    Deploy(Deploy),
    Redeploy(Redeploy),
    ExecuteScript(ExecuteScript),
    BuildImage(BuildImage),
    CreateInstance(CreateInstance),
    DestroyAllInstances,
    RecreateInstances(RecreateInstances),
    UpdateLifecycleHooks,
    UpdateAutoscaling,
    PrepareBlueGreen(PrepareBlueGreen),
    SwapBlueGreen(SwapBlueGreen),
    PurgeBlueGreen,
}

impl CommandKind {
    pub fn command(&self) -> JobCommand {
        match self {
            CommandKind::Deploy(_) => JobCommand::Deploy,
            CommandKind::Redeploy(_) => JobCommand::Redeploy,
            CommandKind::ExecuteScript(_) => JobCommand::ExecuteScript,
            CommandKind::BuildImage(_) => JobCommand::BuildImage,
            CommandKind::CreateInstance(_) => JobCommand::CreateInstance,
            CommandKind::DestroyAllInstances => JobCommand::DestroyAllInstances,
            CommandKind::RecreateInstances(_) => JobCommand::RecreateInstances,
            CommandKind::UpdateLifecycleHooks => JobCommand::UpdateLifecycleHooks,
            CommandKind::UpdateAutoscaling => JobCommand::UpdateAutoscaling,
            CommandKind::PrepareBlueGreen(_) => JobCommand::PrepareBlueGreen,
            CommandKind::SwapBlueGreen(_) => JobCommand::SwapBlueGreen,
            CommandKind::PurgeBlueGreen => JobCommand::PurgeBlueGreen,
        }
    }
}

/// A command aimed at one application
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRequest {
    pub app_id: String,
    pub kind: CommandKind,
}

impl JobRequest {
    pub fn new(app_id: impl Into<String>, kind: CommandKind) -> Self {
        Self {
            app_id: app_id.into(),
            kind,
        }
    }

    /// Build the payload posted to the jobs collection
    pub fn encode(&self) -> JobPayload {
        let mut payload = JobPayload::new(self.kind.command(), self.app_id.clone());
        match &self.kind {
            CommandKind::Deploy(params) => params.encode(&mut payload),
            CommandKind::Redeploy(params) => params.encode(&mut payload),
            CommandKind::ExecuteScript(params) => params.encode(&mut payload),
            CommandKind::BuildImage(params) => params.encode(&mut payload),
            CommandKind::CreateInstance(params) => params.encode(&mut payload),
            CommandKind::RecreateInstances(params) => params.encode(&mut payload),
            CommandKind::PrepareBlueGreen(params) => params.encode(&mut payload),
            CommandKind::SwapBlueGreen(params) => params.encode(&mut payload),
            CommandKind::DestroyAllInstances
            | CommandKind::UpdateLifecycleHooks
            | CommandKind::UpdateAutoscaling
            | CommandKind::PurgeBlueGreen => {}
        }
        payload
    }

    /// Recover the typed request from a payload, validating it the same way
    /// construction does
    pub fn decode(payload: &JobPayload) -> Result<Self, CasperError> {
        let kind = match payload.command {
            JobCommand::Deploy => CommandKind::Deploy(Deploy::decode(payload)?),
            JobCommand::Redeploy => CommandKind::Redeploy(Redeploy::decode(payload)?),
            JobCommand::ExecuteScript => CommandKind::ExecuteScript(ExecuteScript::decode(payload)?),
            JobCommand::BuildImage => CommandKind::BuildImage(BuildImage::decode(payload)?),
            JobCommand::CreateInstance => {
                CommandKind::CreateInstance(CreateInstance::decode(payload)?)
            }
            JobCommand::RecreateInstances => {
                CommandKind::RecreateInstances(RecreateInstances::decode(payload)?)
            }
            JobCommand::PrepareBlueGreen => {
                CommandKind::PrepareBlueGreen(PrepareBlueGreen::decode(payload)?)
            }
            JobCommand::SwapBlueGreen => CommandKind::SwapBlueGreen(SwapBlueGreen::decode(payload)?),
            JobCommand::DestroyAllInstances => {
                OptionsReader::new(payload).finish()?;
                CommandKind::DestroyAllInstances
            }
            JobCommand::UpdateLifecycleHooks => {
                OptionsReader::new(payload).finish()?;
                CommandKind::UpdateLifecycleHooks
            }
            JobCommand::UpdateAutoscaling => {
                OptionsReader::new(payload).finish()?;
                CommandKind::UpdateAutoscaling
            }
            JobCommand::PurgeBlueGreen => {
                OptionsReader::new(payload).finish()?;
                CommandKind::PurgeBlueGreen
            }
        };

        if payload.app_id.is_empty() {
            return Err(CasperError::Validation("job has no application id".to_string()));
        }
        if payload.command != JobCommand::Deploy && !payload.modules.is_empty() {
            return Err(CasperError::Validation(format!(
                "{} jobs do not take modules",
                payload.command
            )));
        }
        if payload.command != JobCommand::BuildImage && payload.instance_type.is_some() {
            return Err(CasperError::Validation(format!(
                "{} jobs do not take an instance type",
                payload.command
            )));
        }

        Ok(Self {
            app_id: payload.app_id.clone(),
            kind,
        })
    }
}

/// Sequential reader over a payload's positional options
pub(crate) struct OptionsReader<'a> {
    command: JobCommand,
    options: std::slice::Iter<'a, String>,
}

impl<'a> OptionsReader<'a> {
    pub(crate) fn new(payload: &'a JobPayload) -> Self {
        Self {
            command: payload.command,
            options: payload.options.iter(),
        }
    }

    pub(crate) fn invalid(&self, reason: impl std::fmt::Display) -> CasperError {
        CasperError::Validation(format!("invalid {} options: {}", self.command, reason))
    }

    pub(crate) fn optional(&mut self) -> Option<&'a str> {
        self.options.next().map(String::as_str)
    }

    pub(crate) fn required(&mut self, name: &str) -> Result<&'a str, CasperError> {
        self.optional()
            .ok_or_else(|| self.invalid(format!("missing {}", name)))
    }

    pub(crate) fn parse<T>(&mut self, name: &str) -> Result<Option<T>, CasperError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        match self.optional() {
            Some(raw) => raw
                .parse()
                .map(Some)
                .map_err(|e| self.invalid(format!("{}: {}", name, e))),
            None => Ok(None),
        }
    }

    pub(crate) fn flag(&mut self, name: &str) -> Result<Option<bool>, CasperError> {
        match self.optional() {
            Some("true") => Ok(Some(true)),
            Some("false") => Ok(Some(false)),
            Some(other) => Err(self.invalid(format!("{} must be true or false, got {}", name, other))),
            None => Ok(None),
        }
    }

    /// Fail if options are left over
    pub(crate) fn finish(mut self) -> Result<(), CasperError> {
        match self.optional() {
            Some(extra) => Err(self.invalid(format!("unexpected option {}", extra))),
            None => Ok(()),
        }
    }
}

pub(crate) fn flag_option(value: bool) -> String {
    if value { "true" } else { "false" }.to_string()
}
