//! Error types for the Cloud Deploy client

use thiserror::Error;

/// Main error type for casper
#[derive(Error, Debug)]
pub enum CasperError {
    /// The host could not be reached
    #[error("Error while sending request to {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status
    #[error("Error while calling Cloud Deploy : [{status}] {body}")]
    Api { status: u16, body: String },

    /// The server answered 2xx with a body that is not the expected data
    #[error("Error while reading response from {url}: {reason}")]
    Decode { url: String, reason: String },

    /// A resource document is not shaped as expected. Clients report it
    /// as `Decode` with the URL it came from.
    #[error("Malformed resource: {0}")]
    Malformed(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("The job {0} has not started yet.")]
    NotStarted(String),

    #[error("Websocket server is unavailable: {0}")]
    StreamUnavailable(String),

    /// The log channel failed or the server sent an error frame
    #[error("Log stream error: {0}")]
    Stream(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl CasperError {
    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CasperError::Validation(_) => 2,
            _ => 1,
        }
    }
}

impl From<ghost_models::UnknownValue> for CasperError {
    fn from(err: ghost_models::UnknownValue) -> Self {
        CasperError::Validation(err.to_string())
    }
}
