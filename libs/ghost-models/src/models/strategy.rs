//! Strategy vocabularies carried in job options

use super::wire_enum;

wire_enum! {
    /// How a deployment is rolled out across instances
    DeploymentStrategy, "deployment strategy" {
        Serial => "serial",
        Parallel => "parallel",
    }
}

impl Default for DeploymentStrategy {
    fn default() -> Self {
        DeploymentStrategy::Serial
    }
}

wire_enum! {
    /// Server-side policy bounding how many instances are touched at once
    SafeDeploymentStrategy, "safe deployment strategy" {
        OneByOne => "1by1",
        OneThird => "1/3",
        Quarter => "25%",
        Half => "50%",
    }
}

wire_enum! {
    /// How a script is executed across the application's instances
    ScriptExecutionStrategy, "script execution strategy" {
        Serial => "serial",
        Parallel => "parallel",
        /// Run on one instance, addressed by IP
        Single => "single",
    }
}

impl Default for ScriptExecutionStrategy {
    fn default() -> Self {
        ScriptExecutionStrategy::Serial
    }
}

wire_enum! {
    /// Blue/green swap behaviour
    SwapStrategy, "swap strategy" {
        Isolated => "isolated",
        Overlap => "overlap",
    }
}
