//! HTTP client implementation

use std::time::Duration;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::{header, Client, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, error};

use crate::errors::CasperError;

/// Endpoint and Basic auth credentials for Cloud Deploy
#[derive(Debug)]
pub struct Credentials {
    pub endpoint: String,
    pub username: String,
    pub password: SecretString,
}

impl Credentials {
    pub fn new(
        endpoint: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            username: username.into(),
            password: SecretString::from(password.into()),
        }
    }

    pub fn from_secret(
        endpoint: impl Into<String>,
        username: impl Into<String>,
        password: SecretString,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            username: username.into(),
            password,
        }
    }
}

/// Timeouts applied to every request
#[derive(Debug, Clone)]
pub struct Options {
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// HTTP client for the Cloud Deploy API
pub struct HttpClient {
    client: Client,
    base_url: String,
    credentials: Credentials,
}

impl HttpClient {
    /// Create a new HTTP client
    pub fn new(credentials: Credentials, options: &Options) -> Result<Self, CasperError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        headers.insert(header::ACCEPT, header::HeaderValue::from_static("text/plain"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(options.request_timeout)
            .connect_timeout(options.connect_timeout)
            .build()
            .map_err(|e| CasperError::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: credentials.endpoint.trim_end_matches('/').to_string(),
            credentials,
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Value of the `Authorization` header, for connections reqwest does not make
    pub fn basic_auth_header(&self) -> String {
        let raw = format!(
            "{}:{}",
            self.credentials.username,
            self.credentials.password.expose_secret()
        );
        format!("Basic {}", BASE64.encode(raw))
    }

    fn authed(&self, request: RequestBuilder) -> RequestBuilder {
        request.basic_auth(
            &self.credentials.username,
            Some(self.credentials.password.expose_secret()),
        )
    }

    async fn send(&self, request: RequestBuilder, url: &str) -> Result<Response, CasperError> {
        let response = self
            .authed(request)
            .send()
            .await
            .map_err(|source| CasperError::Transport {
                url: url.to_string(),
                source,
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("HTTP request to {} failed: {} - {}", url, status, body);
            return Err(CasperError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response)
    }

    async fn read_text(response: Response, url: &str) -> Result<String, CasperError> {
        response.text().await.map_err(|e| CasperError::Decode {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }

    fn decode<T: DeserializeOwned>(body: &str, url: &str) -> Result<T, CasperError> {
        serde_json::from_str(body).map_err(|e| CasperError::Decode {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }

    /// Make a GET request and decode the JSON body
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, CasperError> {
        let url = self.url(path);
        debug!("GET {} {:?}", url, query);

        let response = self.send(self.client.get(&url).query(query), &url).await?;
        let body = Self::read_text(response, &url).await?;
        Self::decode(&body, &url)
    }

    /// Make a GET request and return the body as text
    pub async fn get_text(&self, path: &str) -> Result<String, CasperError> {
        let url = self.url(path);
        debug!("GET {} (text)", url);

        let response = self.send(self.client.get(&url), &url).await?;
        Self::read_text(response, &url).await
    }

    /// Make a POST request with a JSON body
    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, CasperError> {
        let url = self.url(path);
        debug!("POST {}", url);

        let response = self.send(self.client.post(&url).json(body), &url).await?;
        let text = Self::read_text(response, &url).await?;
        Self::decode(&text, &url)
    }

    /// Whether `path` answers GET with a success status.
    ///
    /// Unreachable hosts still fail with `Transport`.
    pub async fn probe(&self, path: &str) -> Result<bool, CasperError> {
        let url = self.url(path);
        debug!("GET {} (probe)", url);

        let response = self
            .authed(self.client.get(&url))
            .send()
            .await
            .map_err(|source| CasperError::Transport {
                url: url.clone(),
                source,
            })?;

        debug!("Probe {} answered {}", url, response.status());
        Ok(response.status().is_success())
    }
}
