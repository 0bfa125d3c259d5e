//! Settings file management
//!
//! The settings file is TOML with one table per profile:
//!
//! ```toml
//! [default]
//! endpoint = "https://cloud-deploy.example.com"
//! username = "deployer"
//! password = "secret"
//! stream_unavailable = "fail"
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use ghost_models::SafeDeploymentStrategy;
use secrecy::SecretString;
use serde::{Deserialize, Deserializer};
use tracing::{debug, warn};

use crate::errors::CasperError;

/// Name of the settings file looked up in the working and home directories
pub const SETTINGS_FILE_NAME: &str = ".casper";

pub const DEFAULT_PROFILE: &str = "default";

/// What the log streamer does when the push endpoint cannot be reached
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamUnavailablePolicy {
    /// Fail with `StreamUnavailable`
    #[default]
    Fail,
    /// Fetch whatever the REST log endpoint has instead
    Fetch,
}

/// One profile table of the settings file. Every field is optional.
#[derive(Default, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub endpoint: Option<String>,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default, deserialize_with = "secret_string")]
    pub password: Option<SecretString>,

    #[serde(default)]
    pub page_size: Option<u32>,

    #[serde(default)]
    pub poll_interval_secs: Option<u64>,

    #[serde(default)]
    pub stream_unavailable: Option<StreamUnavailablePolicy>,

    #[serde(default, deserialize_with = "safe_strategy")]
    pub safe_deploy_strategy: Option<SafeDeploymentStrategy>,
}

fn secret_string<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.map(SecretString::from))
}

fn safe_strategy<'de, D>(deserializer: D) -> Result<Option<SafeDeploymentStrategy>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)?
        .map(|s| s.parse().map_err(serde::de::Error::custom))
        .transpose()
}

/// Client-side behaviour settings, resolved once at startup
#[derive(Debug, Clone)]
pub struct Settings {
    /// Default page size for listings
    pub page_size: u32,

    /// Job status poll interval used while waiting and streaming
    pub poll_interval: Duration,

    pub stream_unavailable: StreamUnavailablePolicy,

    /// Safe deployment strategy applied to multi-instance scripts
    pub script_safe_strategy: Option<SafeDeploymentStrategy>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            page_size: 10,
            poll_interval: Duration::from_secs(3),
            stream_unavailable: StreamUnavailablePolicy::default(),
            script_safe_strategy: Some(SafeDeploymentStrategy::OneByOne),
        }
    }
}

impl Settings {
    /// Overlay the values a profile defines on top of the defaults
    pub fn from_profile(profile: &Profile) -> Result<Self, CasperError> {
        if profile.poll_interval_secs == Some(0) {
            return Err(CasperError::Config(
                "poll_interval_secs must be at least 1".to_string(),
            ));
        }
        if profile.page_size == Some(0) {
            return Err(CasperError::Config("page_size must be at least 1".to_string()));
        }

        let defaults = Self::default();
        Ok(Self {
            page_size: profile.page_size.unwrap_or(defaults.page_size),
            poll_interval: profile
                .poll_interval_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.poll_interval),
            stream_unavailable: profile
                .stream_unavailable
                .unwrap_or(defaults.stream_unavailable),
            script_safe_strategy: profile
                .safe_deploy_strategy
                .or(defaults.script_safe_strategy),
        })
    }
}

/// Candidate settings files, most specific first
pub fn settings_file_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        candidates.push(cwd.join(SETTINGS_FILE_NAME));
    }
    if let Some(home) = dirs::home_dir() {
        candidates.push(home.join(SETTINGS_FILE_NAME));
    }
    candidates
}

/// Parse every profile of a settings file
pub fn parse_profiles(content: &str) -> Result<HashMap<String, Profile>, CasperError> {
    toml::from_str(content).map_err(|e| CasperError::Config(e.to_string()))
}

/// Load `profile` from an explicit file, or from the first candidate that
/// exists. A missing file or profile is reported and yields `None`.
pub fn load_profile(explicit: Option<&Path>, profile: &str) -> Result<Option<Profile>, CasperError> {
    let path = match explicit {
        Some(path) => {
            if !path.exists() {
                return Err(CasperError::Config(format!(
                    "config file {} does not exist",
                    path.display()
                )));
            }
            path.to_path_buf()
        }
        None => match settings_file_candidates().into_iter().find(|p| p.exists()) {
            Some(path) => path,
            None => {
                warn!("No valid config files found, Cloud Deploy credentials info will be prompted");
                return Ok(None);
            }
        },
    };

    debug!("Reading settings from {}", path.display());
    let content = std::fs::read_to_string(&path)?;
    let mut profiles: HashMap<String, Profile> = toml::from_str(&content)
        .map_err(|e| CasperError::Config(format!("{}: {}", path.display(), e)))?;

    match profiles.remove(profile) {
        Some(found) => Ok(Some(found)),
        None => {
            warn!("No section \"{}\" found in configuration", profile);
            Ok(None)
        }
    }
}
