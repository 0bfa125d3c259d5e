//! Deploy and redeploy commands

use async_trait::async_trait;
use ghost_models::{DeploymentStrategy, JobPayload, ModuleRef, SafeDeploymentStrategy};
use tracing::debug;

use crate::commands::OptionsReader;
use crate::errors::CasperError;
use crate::http::{Apps, ResourceClient};

/// Source of an application's module names
#[async_trait]
pub trait ModuleLookup {
    async fn module_names(&self, app_id: &str) -> Result<Vec<String>, CasperError>;
}

#[async_trait]
impl ModuleLookup for ResourceClient<Apps> {
    async fn module_names(&self, app_id: &str) -> Result<Vec<String>, CasperError> {
        ResourceClient::<Apps>::module_names(self, app_id).await
    }
}

/// Which modules a deploy targets
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleSelection {
    /// `name` or `name:revision` references
    Explicit(Vec<ModuleRef>),
    /// Every module of the application, at HEAD
    All,
}

impl ModuleSelection {
    /// Exactly one of an explicit module list and the all-modules flag
    pub fn from_flags(modules: &[String], all_modules: bool) -> Result<Self, CasperError> {
        match (modules.is_empty(), all_modules) {
            (true, false) => Err(CasperError::Validation(
                "You must have one (and only one) from --module and --all-modules parameters"
                    .to_string(),
            )),
            (false, true) => Err(CasperError::Validation(
                "You must have only one from --module and --all-modules parameters".to_string(),
            )),
            (true, true) => Ok(ModuleSelection::All),
            (false, false) => modules
                .iter()
                .map(|m| m.parse::<ModuleRef>().map_err(CasperError::from))
                .collect::<Result<Vec<_>, _>>()
                .map(ModuleSelection::Explicit),
        }
    }

    /// Turn the selection into module references. Only `All` performs a
    /// lookup.
    pub async fn resolve(
        self,
        app_id: &str,
        lookup: &(dyn ModuleLookup + Sync),
    ) -> Result<Vec<ModuleRef>, CasperError> {
        match self {
            ModuleSelection::Explicit(modules) => Ok(modules),
            ModuleSelection::All => {
                let names = lookup.module_names(app_id).await?;
                debug!("Resolved all modules of {}: {:?}", app_id, names);
                Ok(names.into_iter().map(ModuleRef::new).collect())
            }
        }
    }
}

/// Deploy one or more modules
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deploy {
    modules: Vec<ModuleRef>,
    pub strategy: DeploymentStrategy,
    pub safe_strategy: Option<SafeDeploymentStrategy>,
}

impl Deploy {
    pub fn new(
        modules: Vec<ModuleRef>,
        strategy: DeploymentStrategy,
        safe_strategy: Option<SafeDeploymentStrategy>,
    ) -> Result<Self, CasperError> {
        if modules.is_empty() {
            return Err(CasperError::Validation(
                "a deploy needs at least one module".to_string(),
            ));
        }
        Ok(Self {
            modules,
            strategy,
            safe_strategy,
        })
    }

    pub fn modules(&self) -> &[ModuleRef] {
        &self.modules
    }

    pub(crate) fn encode(&self, payload: &mut JobPayload) {
        payload.modules = self.modules.clone();
        payload.options.push(self.strategy.to_string());
        if let Some(safe) = self.safe_strategy {
            payload.options.push(safe.to_string());
        }
    }

    pub(crate) fn decode(payload: &JobPayload) -> Result<Self, CasperError> {
        let mut reader = OptionsReader::new(payload);
        let strategy: DeploymentStrategy = reader.parse("strategy")?.unwrap_or_default();
        let safe_strategy: Option<SafeDeploymentStrategy> = reader.parse("safe deployment strategy")?;
        reader.finish()?;
        Self::new(payload.modules.clone(), strategy, safe_strategy)
    }
}

/// Redeploy a previous deployment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redeploy {
    deployment_id: String,
    pub strategy: DeploymentStrategy,
    pub safe_strategy: Option<SafeDeploymentStrategy>,
}

impl Redeploy {
    pub fn new(
        deployment_id: impl Into<String>,
        strategy: DeploymentStrategy,
        safe_strategy: Option<SafeDeploymentStrategy>,
    ) -> Result<Self, CasperError> {
        let deployment_id = deployment_id.into();
        if deployment_id.is_empty() {
            return Err(CasperError::Validation(
                "a redeploy needs a deployment id".to_string(),
            ));
        }
        Ok(Self {
            deployment_id,
            strategy,
            safe_strategy,
        })
    }

    pub fn deployment_id(&self) -> &str {
        &self.deployment_id
    }

    pub(crate) fn encode(&self, payload: &mut JobPayload) {
        payload.options.push(self.deployment_id.clone());
        payload.options.push(self.strategy.to_string());
        if let Some(safe) = self.safe_strategy {
            payload.options.push(safe.to_string());
        }
    }

    pub(crate) fn decode(payload: &JobPayload) -> Result<Self, CasperError> {
        let mut reader = OptionsReader::new(payload);
        let deployment_id = reader.required("deployment id")?;
        let strategy: DeploymentStrategy = reader.parse("strategy")?.unwrap_or_default();
        let safe_strategy: Option<SafeDeploymentStrategy> = reader.parse("safe deployment strategy")?;
        reader.finish()?;
        Self::new(deployment_id, strategy, safe_strategy)
    }
}
