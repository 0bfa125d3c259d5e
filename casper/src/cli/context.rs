//! Per-invocation context
//!
//! Credentials come from, in order: command line flags or their
//! environment variables, the selected settings profile, then an
//! interactive prompt.

use std::sync::Arc;

use secrecy::SecretString;
use tracing::debug;

use crate::cli::output::OutputFormat;
use crate::cli::GlobalArgs;
use crate::errors::CasperError;
use crate::http::client::Options;
use crate::http::{Apps, Credentials, Deployments, HttpClient, Jobs, ResourceClient};
use crate::joblog::{JobLogStreamer, SocketIoChannel, StreamOptions};
use crate::settings::{load_profile, Profile, Settings};

/// Asks the user for missing credentials
pub trait Prompt {
    fn text(&self, label: &str) -> Result<String, CasperError>;

    /// Input is not echoed
    fn secret(&self, label: &str) -> Result<SecretString, CasperError>;
}

/// Terminal prompts
pub struct DialoguerPrompt;

impl Prompt for DialoguerPrompt {
    fn text(&self, label: &str) -> Result<String, CasperError> {
        dialoguer::Input::<String>::new()
            .with_prompt(label)
            .interact_text()
            .map_err(|e| CasperError::Config(format!("failed to read {}: {}", label, e)))
    }

    fn secret(&self, label: &str) -> Result<SecretString, CasperError> {
        dialoguer::Password::new()
            .with_prompt(label)
            .interact()
            .map(SecretString::from)
            .map_err(|e| CasperError::Config(format!("failed to read {}: {}", label, e)))
    }
}

/// Merge flag, profile and prompted values into credentials
pub fn resolve_credentials(
    global: &GlobalArgs,
    profile: Profile,
    prompt: &dyn Prompt,
) -> Result<Credentials, CasperError> {
    let endpoint = match global.endpoint.clone().or(profile.endpoint) {
        Some(endpoint) => endpoint,
        None => prompt.text("Cloud deploy endpoint")?,
    };
    if endpoint.trim().is_empty() {
        return Err(CasperError::Config("the Cloud Deploy endpoint is empty".to_string()));
    }

    let username = match global.username.clone().or(profile.username) {
        Some(username) => username,
        None => prompt.text("Cloud deploy username")?,
    };

    let password = match global.password.clone().map(SecretString::from).or(profile.password) {
        Some(password) => password,
        None => prompt.secret("Cloud deploy password")?,
    };

    debug!("Using Cloud Deploy endpoint {} as {}", endpoint, username);
    Ok(Credentials::from_secret(endpoint, username, password))
}

/// Clients and settings shared by every command
pub struct Context {
    pub settings: Settings,
    pub output: OutputFormat,

    /// Strip ANSI colors from streamed logs
    pub no_color: bool,

    http: Arc<HttpClient>,
    pub apps: ResourceClient<Apps>,
    pub jobs: ResourceClient<Jobs>,
    pub deployments: ResourceClient<Deployments>,
}

impl Context {
    pub fn new(
        credentials: Credentials,
        settings: Settings,
        output: OutputFormat,
        no_color: bool,
    ) -> Result<Self, CasperError> {
        let http = Arc::new(HttpClient::new(credentials, &Options::default())?);
        Ok(Self {
            settings,
            output,
            no_color,
            apps: ResourceClient::new(http.clone()),
            jobs: ResourceClient::new(http.clone()),
            deployments: ResourceClient::new(http.clone()),
            http,
        })
    }

    /// Read the settings profile and credentials for this invocation
    pub fn resolve(global: &GlobalArgs, prompt: &dyn Prompt) -> Result<Self, CasperError> {
        let profile = load_profile(global.config_file.as_deref(), &global.profile)?
            .unwrap_or_default();
        let settings = Settings::from_profile(&profile)?;
        debug!("Settings: {:?}", settings);

        let credentials = resolve_credentials(global, profile, prompt)?;
        Self::new(credentials, settings, global.output, global.no_color)
    }

    /// Streamer for job logs, waiting for `init` jobs when `wait` is set
    pub fn log_streamer(&self, wait: bool) -> JobLogStreamer<ResourceClient<Jobs>, SocketIoChannel> {
        JobLogStreamer::new(
            self.jobs.clone(),
            SocketIoChannel::new(self.http.clone()),
            StreamOptions::from_settings(&self.settings, wait),
        )
    }
}
