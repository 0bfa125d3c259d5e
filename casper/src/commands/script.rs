//! Script execution command

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use ghost_models::{JobPayload, SafeDeploymentStrategy, ScriptExecutionStrategy};

use crate::commands::OptionsReader;
use crate::errors::CasperError;

/// Parameters as given on the command line, before validation
#[derive(Debug, Clone, Default)]
pub struct ScriptParams {
    pub script: String,
    pub strategy: ScriptExecutionStrategy,
    pub safe_strategy: Option<SafeDeploymentStrategy>,
    pub instance_ip: Option<String>,
    pub module_context: Option<String>,
}

/// Where a script runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptTarget {
    /// One instance, addressed by its IP
    Single { instance_ip: String },
    /// Every instance, `serial` or `parallel`, bounded by a safe strategy
    Fleet {
        strategy: ScriptExecutionStrategy,
        safe_strategy: SafeDeploymentStrategy,
    },
}

/// Run a shell script on an application's instances
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecuteScript {
    script: String,
    module_context: Option<String>,
    target: ScriptTarget,
}

impl ExecuteScript {
    /// Validate `params`. `default_safe` applies to fleet executions that
    /// name no safe strategy.
    pub fn new(
        params: ScriptParams,
        default_safe: Option<SafeDeploymentStrategy>,
    ) -> Result<Self, CasperError> {
        if params.script.trim().is_empty() {
            return Err(CasperError::Validation("the script is empty".to_string()));
        }

        let target = match params.strategy {
            ScriptExecutionStrategy::Single => match params.instance_ip {
                Some(ip) if !ip.is_empty() => ScriptTarget::Single { instance_ip: ip },
                _ => {
                    return Err(CasperError::Validation(
                        "the single strategy needs an instance IP (--instance-ip)".to_string(),
                    ))
                }
            },
            strategy => {
                if params.instance_ip.is_some() {
                    return Err(CasperError::Validation(format!(
                        "an instance IP only applies to the single strategy, not {}",
                        strategy
                    )));
                }
                let safe_strategy = params.safe_strategy.or(default_safe).ok_or_else(|| {
                    CasperError::Validation(format!(
                        "the {} strategy needs a safe deployment strategy",
                        strategy
                    ))
                })?;
                ScriptTarget::Fleet {
                    strategy,
                    safe_strategy,
                }
            }
        };

        Ok(Self {
            script: normalize_newlines(&params.script),
            module_context: params.module_context.filter(|m| !m.is_empty()),
            target,
        })
    }

    /// Script content with `\n` line endings
    pub fn script(&self) -> &str {
        &self.script
    }

    pub fn module_context(&self) -> Option<&str> {
        self.module_context.as_deref()
    }

    pub fn target(&self) -> &ScriptTarget {
        &self.target
    }

    pub(crate) fn encode(&self, payload: &mut JobPayload) {
        payload.options.push(BASE64.encode(self.script.as_bytes()));
        payload
            .options
            .push(self.module_context.clone().unwrap_or_default());
        match &self.target {
            ScriptTarget::Single { instance_ip } => {
                payload.options.push(ScriptExecutionStrategy::Single.to_string());
                payload.options.push(instance_ip.clone());
            }
            ScriptTarget::Fleet {
                strategy,
                safe_strategy,
            } => {
                payload.options.push(strategy.to_string());
                payload.options.push(safe_strategy.to_string());
            }
        }
    }

    pub(crate) fn decode(payload: &JobPayload) -> Result<Self, CasperError> {
        let mut reader = OptionsReader::new(payload);
        let encoded = reader.required("script")?;
        let bytes = BASE64
            .decode(encoded)
            .map_err(|e| reader.invalid(format!("script is not base64: {}", e)))?;
        let script = String::from_utf8(bytes)
            .map_err(|e| reader.invalid(format!("script is not UTF-8: {}", e)))?;
        let module_context = reader.required("module context")?;
        let strategy: ScriptExecutionStrategy = reader
            .parse("script execution strategy")?
            .ok_or_else(|| reader.invalid("missing script execution strategy"))?;

        let mut params = ScriptParams {
            script,
            strategy,
            module_context: Some(module_context.to_string()),
            ..ScriptParams::default()
        };
        if strategy == ScriptExecutionStrategy::Single {
            params.instance_ip = Some(reader.required("instance IP")?.to_string());
        } else {
            params.safe_strategy = reader.parse("safe deployment strategy")?;
        }
        reader.finish()?;

        Self::new(params, None)
    }
}

fn normalize_newlines(script: &str) -> String {
    script.replace("\r\n", "\n").replace('\r', "\n")
}
