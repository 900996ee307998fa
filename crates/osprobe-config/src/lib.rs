// SPDX-License-Identifier: GPL-3.0-or-later
use std::fmt;
use std::path::Path;
use std::time::Duration;

use anyhow::{ensure, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use osprobe_client::MinimumStatus;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Environment variables set by the container harness, mapped onto `connection.*`.
const CONTAINER_ENV_KEYS: &[&str] = &["host", "port", "scheme", "username", "password"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    Http,
    Https,
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scheme::Http => f.write_str("http"),
            Scheme::Https => f.write_str("https"),
        }
    }
}

/// Where and how to reach the OpenSearch node under test.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    pub host: String,
    pub port: u16,
    pub scheme: Scheme,
    pub username: Option<String>,
    pub password: Option<String>,
    pub connect_timeout_ms: u64,
    pub socket_timeout_ms: u64,
    /// Skip certificate and hostname verification. Only meant for throwaway
    /// containers with self-signed certificates.
    pub trust_all_certificates: bool,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 9200,
            scheme: Scheme::Http,
            username: None,
            password: None,
            connect_timeout_ms: 60_000,
            socket_timeout_ms: 60_000,
            trust_all_certificates: false,
        }
    }
}

impl ProbeConfig {
    pub fn base_url(&self) -> String {
        format!("{}://{}:{}", self.scheme, self.host, self.port)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn socket_timeout(&self) -> Duration {
        Duration::from_millis(self.socket_timeout_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthConfig {
    pub minimum_status: MinimumStatus,
    pub timeout_ms: u64,
    pub poll_interval_ms: u64,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            minimum_status: MinimumStatus::Green,
            timeout_ms: 60_000,
            poll_interval_ms: 1_000,
        }
    }
}

impl HealthConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// A zero interval would poll without pause; a zero timeout never polls.
    pub fn validate(&self) -> Result<()> {
        ensure!(self.timeout_ms > 0, "health.timeout_ms must be greater than zero");
        ensure!(
            self.poll_interval_ms > 0,
            "health.poll_interval_ms must be greater than zero"
        );
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    pub name: String,
    pub shards: u32,
    pub replicas: u32,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            name: "container_test".to_string(),
            shards: 1,
            replicas: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    pub log_level: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    pub connection: ProbeConfig,
    pub health: HealthConfig,
    pub index: IndexConfig,
    pub telemetry: TelemetryConfig,
}

/// Load configuration from defaults, an optional TOML file, the container
/// variables (`OPENSEARCH_HOST`, `OPENSEARCH_PORT`, ...) and finally
/// `OSPROBE_`-prefixed overrides.
pub fn load(config_path: Option<&Path>) -> Result<AppConfig> {
    let mut figment = Figment::from(Serialized::defaults(AppConfig::default()));

    if let Some(path) = config_path {
        figment = figment.merge(Toml::file(path));
    }

    figment = figment
        .merge(
            Env::prefixed("OPENSEARCH_")
                .only(CONTAINER_ENV_KEYS)
                .map(|key| format!("connection.{}", key.as_str()).into()),
        )
        .merge(Env::prefixed("OSPROBE_").split("__"));

    let config: AppConfig = figment.extract()?;
    config.health.validate()?;
    info!(
        target: "config",
        "configuration loaded, target {}",
        config.connection.base_url()
    );
    if config.connection.trust_all_certificates {
        warn!(target: "config", "trust_all_certificates is enabled, TLS verification is off");
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_defaults_are_secure_and_local() {
        let config = AppConfig::default();
        assert_eq!(config.connection.base_url(), "http://localhost:9200");
        assert!(!config.connection.trust_all_certificates);
        assert!(config.connection.username.is_none());
        assert_eq!(config.health.minimum_status, MinimumStatus::Green);
        assert_eq!(config.index.name, "container_test");
        assert_eq!(config.index.shards, 1);
        assert_eq!(config.index.replicas, 0);
    }

    #[test]
    fn test_toml_file_overrides_defaults() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "probe.toml",
                r#"
                [connection]
                host = "search.internal"
                scheme = "https"
                username = "admin"
                password = "admin"

                [health]
                minimum_status = "yellow"
                poll_interval_ms = 250
                "#,
            )?;

            let config = load(Some(Path::new("probe.toml"))).map_err(|e| e.to_string())?;
            assert_eq!(config.connection.base_url(), "https://search.internal:9200");
            assert_eq!(config.connection.username.as_deref(), Some("admin"));
            assert_eq!(config.health.minimum_status, MinimumStatus::Yellow);
            assert_eq!(config.health.poll_interval(), Duration::from_millis(250));
            assert_eq!(config.health.timeout_ms, 60_000);
            Ok(())
        });
    }

    #[test]
    fn test_container_env_maps_onto_connection() {
        Jail::expect_with(|jail| {
            jail.set_env("OPENSEARCH_HOST", "opensearch");
            jail.set_env("OPENSEARCH_PORT", "9201");
            jail.set_env("OPENSEARCH_SCHEME", "https");
            jail.set_env("OPENSEARCH_JAVA_OPTS", "-Xmx512m");

            let config = load(None).map_err(|e| e.to_string())?;
            assert_eq!(config.connection.base_url(), "https://opensearch:9201");
            Ok(())
        });
    }

    #[test]
    fn test_prefixed_env_wins_over_container_env() {
        Jail::expect_with(|jail| {
            jail.set_env("OPENSEARCH_HOST", "opensearch");
            jail.set_env("OSPROBE_CONNECTION__HOST", "override");
            jail.set_env("OSPROBE_CONNECTION__TRUST_ALL_CERTIFICATES", "true");
            jail.set_env("OSPROBE_INDEX__NAME", "probe_index");

            let config = load(None).map_err(|e| e.to_string())?;
            assert_eq!(config.connection.host, "override");
            assert!(config.connection.trust_all_certificates);
            assert_eq!(config.index.name, "probe_index");
            Ok(())
        });
    }

    #[test]
    fn test_zero_poll_interval_is_rejected() {
        Jail::expect_with(|jail| {
            jail.set_env("OSPROBE_HEALTH__POLL_INTERVAL_MS", "0");
            let err = load(None).unwrap_err();
            assert!(err.to_string().contains("poll_interval_ms"));
            Ok(())
        });
    }

    #[test]
    fn test_zero_timeout_is_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file("probe.toml", "[health]\ntimeout_ms = 0\n")?;
            let err = load(Some(Path::new("probe.toml"))).unwrap_err();
            assert!(err.to_string().contains("timeout_ms"));
            Ok(())
        });
    }

    #[test]
    fn test_unknown_minimum_status_is_rejected() {
        Jail::expect_with(|jail| {
            jail.set_env("OSPROBE_HEALTH__MINIMUM_STATUS", "red");
            assert!(load(None).is_err());
            Ok(())
        });
    }
}
