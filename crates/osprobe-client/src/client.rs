// SPDX-License-Identifier: GPL-3.0-or-later

use crate::engine::SearchEngine;
use crate::error::{ProbeError, Result};
use crate::models::{ClusterHealth, IndexCreationResult, IndexSpec, MinimumStatus, RawResponse};
use async_trait::async_trait;
use reqwest::{Client, Method};
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use tracing::{debug, trace, warn};
use url::Url;

const DEFAULT_BASE_URL: &str = "http://localhost:9200";
/// Every index except the hidden system ones.
const HEALTH_TARGET: &str = "*,-.*";
const ALREADY_EXISTS_TYPE: &str = "resource_already_exists_exception";
const KEEP_ALIVE: Duration = Duration::from_secs(3600);
const USER_AGENT: &str = concat!("osprobe/", env!("CARGO_PKG_VERSION"));

#[derive(Clone)]
struct Credentials {
    username: String,
    password: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}

/// OpenSearch REST client covering the handful of calls the probe makes.
#[derive(Debug, Clone)]
pub struct OpenSearchClient {
    client: Client,
    base_url: String,
    credentials: Option<Credentials>,
    request_timeout: Duration,
}

impl OpenSearchClient {
    /// Create a client for `http://localhost:9200` with default settings.
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    /// Create a client builder for custom configuration.
    pub fn builder() -> OpenSearchClientBuilder {
        OpenSearchClientBuilder::default()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> Result<Url> {
        Url::parse(&format!("{}/{}", self.base_url, path.trim_start_matches('/')))
            .map_err(|e| ProbeError::InvalidConfig(e.to_string()))
    }

    async fn send(
        &self,
        method: Method,
        url: Url,
        body: Option<&Value>,
        timeout: Duration,
    ) -> Result<RawResponse> {
        trace!(target: "opensearch", "{} {}", method, url);

        let mut request = self.client.request(method, url).timeout(timeout);
        if let Some(credentials) = &self.credentials {
            request = request.basic_auth(&credentials.username, credentials.password.as_ref());
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        debug!(target: "opensearch", "response status: {}", status);

        let body = response.text().await?;
        trace!(target: "opensearch", "response body: {}", body);

        Ok(RawResponse {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl SearchEngine for OpenSearchClient {
    async fn health(
        &self,
        wait_for: MinimumStatus,
        wait_timeout: Duration,
    ) -> Result<ClusterHealth> {
        let mut url = self.url(&format!("_cluster/health/{}", HEALTH_TARGET))?;
        url.query_pairs_mut()
            .append_pair("wait_for_status", wait_for.as_str())
            .append_pair("timeout", &format!("{}ms", wait_timeout.as_millis()));

        let response = self
            .send(Method::GET, url, None, self.request_timeout + wait_timeout)
            .await?;

        match response.status {
            // 408 means the server-side wait expired; the body still carries the status.
            200 | 408 => response.json(),
            502..=504 => Err(ProbeError::Unreachable(format!(
                "cluster not serving requests yet: {} - {}",
                response.status, response.body
            ))),
            status => Err(ProbeError::Api {
                status,
                body: response.body,
            }),
        }
    }

    async fn create_index(&self, spec: &IndexSpec) -> Result<IndexCreationResult> {
        let url = self.url(spec.name())?;
        let body = spec.request_body();
        let response = self
            .send(Method::PUT, url, Some(&body), self.request_timeout)
            .await?;

        if response.is_success() {
            return response.json();
        }

        if response.status == 400 && error_type(&response.body).as_deref() == Some(ALREADY_EXISTS_TYPE)
        {
            return Err(ProbeError::AlreadyExists(spec.name().to_string()));
        }

        Err(ProbeError::Api {
            status: response.status,
            body: response.body,
        })
    }

    async fn raw_request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<RawResponse> {
        let url = self.url(path)?;
        self.send(method, url, body, self.request_timeout).await
    }
}

/// `error.type` of an OpenSearch error envelope, if the body is one.
fn error_type(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value
        .pointer("/error/type")
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Builder for configuring an OpenSearch client.
#[derive(Debug)]
pub struct OpenSearchClientBuilder {
    base_url: String,
    credentials: Option<Credentials>,
    connect_timeout: Duration,
    request_timeout: Duration,
    trust_all_certificates: bool,
}

impl Default for OpenSearchClientBuilder {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            credentials: None,
            connect_timeout: Duration::from_secs(60),
            request_timeout: Duration::from_secs(60),
            trust_all_certificates: false,
        }
    }
}

impl OpenSearchClientBuilder {
    /// Set the cluster base URL, e.g. `https://localhost:9200`.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Send HTTP basic credentials with every request.
    pub fn credentials(mut self, username: impl Into<String>, password: Option<String>) -> Self {
        self.credentials = Some(Credentials {
            username: username.into(),
            password,
        });
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Per-request read timeout. Health queries add their server-side wait on top.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Accept any server certificate and hostname.
    pub fn trust_all_certificates(mut self, trust: bool) -> Self {
        self.trust_all_certificates = trust;
        self
    }

    /// Build the OpenSearch client.
    pub fn build(self) -> Result<OpenSearchClient> {
        let base_url = self.base_url.trim_end_matches('/').to_string();
        Url::parse(&base_url)
            .map_err(|e| ProbeError::InvalidConfig(format!("base URL {base_url:?}: {e}")))?;

        let mut builder = Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(self.connect_timeout)
            .pool_idle_timeout(KEEP_ALIVE);

        if self.trust_all_certificates {
            warn!(target: "opensearch", "certificate verification disabled for {}", base_url);
            builder = builder.danger_accept_invalid_certs(true);
        }

        Ok(OpenSearchClient {
            client: builder.build()?,
            base_url,
            credentials: self.credentials,
            request_timeout: self.request_timeout,
        })
    }
}
