//! Job command encoding tests

use std::io::Write;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use casper::cli::submit::build_request;
use casper::cli::{Cli, Commands};
use casper::commands::{
    BuildImage, CommandKind, CreateInstance, Deploy, ExecuteScript, JobRequest, ModuleLookup,
    PrepareBlueGreen, RecreateInstances, Redeploy, ScriptParams, ScriptTarget, SwapBlueGreen,
};
use casper::errors::CasperError;
use casper::settings::Settings;
use clap::Parser;
use ghost_models::{
    DeploymentStrategy, JobCommand, JobPayload, ModuleRef, SafeDeploymentStrategy,
    ScriptExecutionStrategy, SwapStrategy,
};

/// Module lookup answering from a fixed list and counting calls
struct FixedModules {
    names: Vec<&'static str>,
    calls: std::sync::atomic::AtomicUsize,
}

impl FixedModules {
    fn new(names: Vec<&'static str>) -> Self {
        Self {
            names,
            calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[async_trait]
impl ModuleLookup for FixedModules {
    async fn module_names(&self, _app_id: &str) -> Result<Vec<String>, CasperError> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Ok(self.names.iter().map(|s| s.to_string()).collect())
    }
}

async fn request_from_args(
    args: &[&str],
    lookup: &FixedModules,
) -> Result<JobRequest, CasperError> {
    let cli = Cli::try_parse_from(args).unwrap();
    match cli.command {
        Commands::Submit(command) => build_request(command, lookup, &Settings::default()).await,
        _ => panic!("not a submission: {:?}", args),
    }
}

fn every_request() -> Vec<JobRequest> {
    let script = ExecuteScript::new(
        ScriptParams {
            script: "#!/bin/sh\r\necho ok\r\n".to_string(),
            strategy: ScriptExecutionStrategy::Parallel,
            safe_strategy: Some(SafeDeploymentStrategy::OneThird),
            instance_ip: None,
            module_context: Some("api".to_string()),
        },
        None,
    )
    .unwrap();
    let single = ExecuteScript::new(
        ScriptParams {
            script: "uptime".to_string(),
            strategy: ScriptExecutionStrategy::Single,
            instance_ip: Some("10.0.0.12".to_string()),
            ..Default::default()
        },
        Some(SafeDeploymentStrategy::OneByOne),
    )
    .unwrap();

    vec![
        JobRequest::new(
            "a1",
            CommandKind::Deploy(
                Deploy::new(
                    vec![ModuleRef::with_rev("api", "v1.2"), ModuleRef::new("worker")],
                    DeploymentStrategy::Parallel,
                    Some(SafeDeploymentStrategy::Half),
                )
                .unwrap(),
            ),
        ),
        JobRequest::new(
            "a1",
            CommandKind::Redeploy(
                Redeploy::new("d9", DeploymentStrategy::Serial, None).unwrap(),
            ),
        ),
        JobRequest::new("a1", CommandKind::ExecuteScript(script)),
        JobRequest::new("a1", CommandKind::ExecuteScript(single)),
        JobRequest::new(
            "a1",
            CommandKind::BuildImage(BuildImage {
                instance_type: Some("t3.medium".to_string()),
                skip_bootstrap: Some(true),
            }),
        ),
        JobRequest::new("a1", CommandKind::BuildImage(BuildImage::default())),
        JobRequest::new(
            "a1",
            CommandKind::CreateInstance(
                CreateInstance::new(Some("subnet-1".to_string()), Some("10.0.1.5".to_string()))
                    .unwrap(),
            ),
        ),
        JobRequest::new("a1", CommandKind::DestroyAllInstances),
        JobRequest::new(
            "a1",
            CommandKind::RecreateInstances(RecreateInstances {
                rolling_update_strategy: Some("1/3".to_string()),
            }),
        ),
        JobRequest::new("a1", CommandKind::UpdateLifecycleHooks),
        JobRequest::new("a1", CommandKind::UpdateAutoscaling),
        JobRequest::new(
            "a1",
            CommandKind::PrepareBlueGreen(PrepareBlueGreen {
                copy_ami: Some(false),
            }),
        ),
        JobRequest::new(
            "a1",
            CommandKind::SwapBlueGreen(SwapBlueGreen {
                strategy: Some(SwapStrategy::Overlap),
            }),
        ),
        JobRequest::new("a1", CommandKind::PurgeBlueGreen),
    ]
}

#[test]
fn test_decode_recovers_every_command() {
    for request in every_request() {
        let payload = request.encode();
        assert_eq!(payload.command, request.kind.command());
        assert_eq!(JobRequest::decode(&payload).unwrap(), request);
    }
}

#[test]
fn test_payload_survives_json() {
    for request in every_request() {
        let json = serde_json::to_string(&request.encode()).unwrap();
        let payload: JobPayload = serde_json::from_str(&json).unwrap();
        assert_eq!(JobRequest::decode(&payload).unwrap(), request);
    }
}

#[test]
fn test_wire_layouts() {
    let requests = every_request();
    let options: Vec<Vec<String>> = requests.iter().map(|r| r.encode().options).collect();

    assert_eq!(options[0], vec!["parallel", "50%"]);
    assert_eq!(options[1], vec!["d9", "serial"]);
    assert_eq!(
        options[2],
        vec![
            BASE64.encode("#!/bin/sh\necho ok\n"),
            "api".to_string(),
            "parallel".to_string(),
            "1/3".to_string()
        ]
    );
    assert_eq!(
        options[3],
        vec![BASE64.encode("uptime"), String::new(), "single".to_string(), "10.0.0.12".to_string()]
    );
    assert_eq!(options[4], vec!["true"]);
    assert!(options[5].is_empty());
    assert_eq!(options[6], vec!["subnet-1", "10.0.1.5"]);
    assert!(options[7].is_empty());
    assert_eq!(options[8], vec!["1/3"]);
    assert_eq!(options[11], vec!["false"]);
    assert_eq!(options[12], vec!["overlap"]);

    let build = requests[4].encode();
    assert_eq!(build.instance_type.as_deref(), Some("t3.medium"));
    assert!(build.modules.is_empty());
}

#[test]
fn test_deploy_modules_keep_order() {
    let payload = every_request()[0].encode();
    let json = serde_json::to_value(&payload).unwrap();
    assert_eq!(
        json["modules"],
        serde_json::json!([{"name": "api", "rev": "v1.2"}, {"name": "worker"}])
    );
    assert!(json.get("instance_type").is_none());
}

#[test]
fn test_decode_rejects_malformed_payloads() {
    let mut payload = JobPayload::new(JobCommand::Redeploy, "a1");
    assert!(matches!(
        JobRequest::decode(&payload),
        Err(CasperError::Validation(_))
    ));

    payload.options = vec!["d1".to_string(), "sideways".to_string()];
    assert!(JobRequest::decode(&payload).is_err());

    let mut payload = JobPayload::new(JobCommand::PurgeBlueGreen, "a1");
    payload.options = vec!["extra".to_string()];
    assert!(JobRequest::decode(&payload).is_err());

    let mut payload = JobPayload::new(JobCommand::Deploy, "a1");
    payload.options = vec!["serial".to_string()];
    assert!(JobRequest::decode(&payload).is_err(), "deploy without modules");

    let mut payload = JobPayload::new(JobCommand::BuildImage, "a1");
    payload.options = vec!["maybe".to_string()];
    assert!(JobRequest::decode(&payload).is_err());

    let mut payload = JobPayload::new(JobCommand::CreateInstance, "");
    payload.options = vec!["subnet-1".to_string()];
    assert!(JobRequest::decode(&payload).is_err(), "empty app id");

    let mut payload = JobPayload::new(JobCommand::UpdateAutoscaling, "a1");
    payload.modules = vec![ModuleRef::new("api")];
    assert!(JobRequest::decode(&payload).is_err(), "modules on a non-deploy job");
}

#[tokio::test]
async fn test_deploy_from_command_line() {
    let lookup = FixedModules::new(vec![]);
    let request = request_from_args(
        &[
            "casper",
            "deploy",
            "a1",
            "-m",
            "api:v2",
            "--module",
            "front",
            "--strategy",
            "parallel",
            "--safe-deploy-strategy",
            "1by1",
        ],
        &lookup,
    )
    .await
    .unwrap();

    let payload = request.encode();
    assert_eq!(payload.modules, vec![ModuleRef::with_rev("api", "v2"), ModuleRef::new("front")]);
    assert_eq!(payload.options, vec!["parallel", "1by1"]);
    assert_eq!(lookup.calls(), 0);
}

#[tokio::test]
async fn test_deploy_all_modules_looks_up_application() {
    let lookup = FixedModules::new(vec!["front", "worker"]);
    let request = request_from_args(&["casper", "deploy", "a1", "--all-modules"], &lookup)
        .await
        .unwrap();

    assert_eq!(lookup.calls(), 1);
    let payload = request.encode();
    assert_eq!(payload.modules, vec![ModuleRef::new("front"), ModuleRef::new("worker")]);
    assert_eq!(payload.options, vec!["serial"]);
}

#[tokio::test]
async fn test_deploy_module_flags_conflict() {
    let lookup = FixedModules::new(vec!["front"]);

    let neither = request_from_args(&["casper", "deploy", "a1"], &lookup).await;
    assert!(matches!(neither, Err(CasperError::Validation(_))));

    let both =
        request_from_args(&["casper", "deploy", "a1", "-m", "api", "--all-modules"], &lookup).await;
    assert!(matches!(both, Err(CasperError::Validation(_))));

    let empty_name = request_from_args(&["casper", "deploy", "a1", "-m", ":v1"], &lookup).await;
    assert!(matches!(empty_name, Err(CasperError::Validation(_))));

    assert_eq!(lookup.calls(), 0);
}

#[tokio::test]
async fn test_executescript_from_command_line() {
    let lookup = FixedModules::new(vec![]);
    let mut script = tempfile::NamedTempFile::new().unwrap();
    script.write_all(b"echo one\r\necho two\r\n").unwrap();
    let path = script.path().to_str().unwrap().to_string();

    // fleet execution picks up the default safe strategy
    let request = request_from_args(&["casper", "executescript", "a1", &path], &lookup)
        .await
        .unwrap();
    match &request.kind {
        CommandKind::ExecuteScript(execute) => {
            assert_eq!(execute.script(), "echo one\necho two\n");
            assert_eq!(
                execute.target(),
                &ScriptTarget::Fleet {
                    strategy: ScriptExecutionStrategy::Serial,
                    safe_strategy: SafeDeploymentStrategy::OneByOne,
                }
            );
        }
        other => panic!("unexpected command {:?}", other),
    }

    let single_without_ip = request_from_args(
        &["casper", "executescript", "a1", &path, "--strategy", "single"],
        &lookup,
    )
    .await;
    assert!(matches!(single_without_ip, Err(CasperError::Validation(_))));

    let single = request_from_args(
        &[
            "casper",
            "executescript",
            "a1",
            &path,
            "--strategy",
            "single",
            "--instance-ip",
            "10.0.0.7",
        ],
        &lookup,
    )
    .await
    .unwrap();
    assert_eq!(single.encode().options[2..], ["single", "10.0.0.7"]);
}

#[test]
fn test_createinstance_ip_needs_subnet() {
    let lookup = FixedModules::new(vec![]);
    let result = tokio_test::block_on(request_from_args(
        &["casper", "createinstance", "a1", "--private-ip-address", "10.0.0.3"],
        &lookup,
    ));
    assert!(matches!(result, Err(CasperError::Validation(_))));
    assert_eq!(lookup.calls(), 0);
}

#[tokio::test]
async fn test_boolean_and_enum_options_from_command_line() {
    let lookup = FixedModules::new(vec![]);

    let build = request_from_args(
        &["casper", "buildimage", "a1", "--skip-bootstrap", "false", "--instance-type", "t3.large"],
        &lookup,
    )
    .await
    .unwrap()
    .encode();
    assert_eq!(build.options, vec!["false"]);
    assert_eq!(build.instance_type.as_deref(), Some("t3.large"));

    let swap = request_from_args(&["casper", "swapbluegreen", "a1", "--strategy", "isolated"], &lookup)
        .await
        .unwrap()
        .encode();
    assert_eq!(swap.command, JobCommand::SwapBlueGreen);
    assert_eq!(swap.options, vec!["isolated"]);

    let purge = request_from_args(&["casper", "purgebluegreen", "a1", "--log"], &lookup)
        .await
        .unwrap()
        .encode();
    assert!(purge.options.is_empty());

    assert!(Cli::try_parse_from(["casper", "swapbluegreen", "a1", "--strategy", "sideways"]).is_err());
}
