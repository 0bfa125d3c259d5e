//! Job models

use serde::{Deserialize, Serialize};

use super::{wire_enum, ModuleRef};

wire_enum! {
    /// Job lifecycle status as reported by the server
    JobStatus, "job status" {
        Init => "init",
        Started => "started",
        Done => "done",
        Failed => "failed",
        Aborted => "aborted",
        Cancelled => "cancelled",
    }
}

impl JobStatus {
    /// No further transition happens from a terminal status
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStatus::Init | JobStatus::Started)
    }
}

wire_enum! {
    /// Operation kinds accepted by the jobs collection
    JobCommand, "job command" {
        Deploy => "deploy",
        Redeploy => "redeploy",
        ExecuteScript => "executescript",
        BuildImage => "buildimage",
        CreateInstance => "createinstance",
        DestroyAllInstances => "destroyallinstances",
        RecreateInstances => "recreateinstances",
        UpdateLifecycleHooks => "updatelifecyclehooks",
        UpdateAutoscaling => "updateautoscaling",
        PrepareBlueGreen => "preparebluegreen",
        SwapBlueGreen => "swapbluegreen",
        PurgeBlueGreen => "purgebluegreen",
    }
}

/// Body posted to the jobs collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobPayload {
    pub command: JobCommand,

    pub app_id: String,

    /// Positional arguments, layout depends on `command`
    #[serde(default)]
    pub options: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub modules: Vec<ModuleRef>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_type: Option<String>,
}

impl JobPayload {
    pub fn new(command: JobCommand, app_id: impl Into<String>) -> Self {
        Self {
            command,
            app_id: app_id.into(),
            options: Vec::new(),
            modules: Vec::new(),
            instance_type: None,
        }
    }
}
