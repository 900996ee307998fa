// SPDX-License-Identifier: GPL-3.0-or-later

use std::fmt;
use std::time::Duration;

use osprobe_client::{
    ClusterHealth, IndexCreationResult, IndexSpec, OpenSearchClient, ProbeError, SearchEngine,
};
use osprobe_config::{AppConfig, ProbeConfig};
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, error, info};

use crate::health::{wait_for_healthy, HealthPolicy};
use crate::provision::{self, container_index_spec};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbePhase {
    Start,
    WaitingHealth,
    Provisioning,
    Done,
    Failed,
}

impl fmt::Display for ProbePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProbePhase::Start => "start",
            ProbePhase::WaitingHealth => "waiting for cluster health",
            ProbePhase::Provisioning => "provisioning index",
            ProbePhase::Done => "done",
            ProbePhase::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// A failed probe run: the phase it stopped in and why.
#[derive(Debug, Error)]
#[error("probe failed while {phase}: {source}")]
pub struct ProbeFailure {
    pub phase: ProbePhase,
    #[source]
    pub source: ProbeError,
}

#[derive(Debug, Clone)]
pub struct ProbeReport {
    pub health: ClusterHealth,
    pub index: IndexCreationResult,
    pub elapsed: Duration,
}

/// Build an OpenSearch client from connection settings.
pub fn connect(config: &ProbeConfig) -> osprobe_client::Result<OpenSearchClient> {
    let mut builder = OpenSearchClient::builder()
        .base_url(config.base_url())
        .connect_timeout(config.connect_timeout())
        .request_timeout(config.socket_timeout())
        .trust_all_certificates(config.trust_all_certificates);

    if let Some(username) = &config.username {
        builder = builder.credentials(username.clone(), config.password.clone());
    }

    builder.build()
}

/// One wait-for-healthy-then-provision run. Owns its engine, which is dropped
/// together with the probe however the run ends.
pub struct Probe<E> {
    engine: E,
    policy: HealthPolicy,
    index: IndexSpec,
    phase: ProbePhase,
}

impl Probe<OpenSearchClient> {
    pub fn from_config(config: &AppConfig) -> osprobe_client::Result<Self> {
        let index = container_index_spec(&config.index)?;
        let engine = connect(&config.connection)?;
        Ok(Self::new(engine, HealthPolicy::from(&config.health), index))
    }
}

impl<E: SearchEngine> Probe<E> {
    pub fn new(engine: E, policy: HealthPolicy, index: IndexSpec) -> Self {
        Self {
            engine,
            policy,
            index,
            phase: ProbePhase::Start,
        }
    }

    pub fn phase(&self) -> ProbePhase {
        self.phase
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub async fn run(mut self) -> Result<ProbeReport, ProbeFailure> {
        let started = Instant::now();

        self.transition(ProbePhase::WaitingHealth);
        let health = match wait_for_healthy(&self.engine, &self.policy).await {
            Ok(health) => health,
            Err(source) => return Err(self.fail(source)),
        };

        self.transition(ProbePhase::Provisioning);
        let index = match provision::create_index(&self.engine, &self.index).await {
            Ok(index) => index,
            Err(source) => return Err(self.fail(source)),
        };

        self.transition(ProbePhase::Done);
        let elapsed = started.elapsed();
        info!(target: "probe", ?elapsed, index = self.index.name(), "probe passed");

        Ok(ProbeReport {
            health,
            index,
            elapsed,
        })
    }

    fn transition(&mut self, next: ProbePhase) {
        debug!(target: "probe", from = %self.phase, to = %next, "probe phase change");
        self.phase = next;
    }

    fn fail(&mut self, source: ProbeError) -> ProbeFailure {
        let phase = self.phase;
        self.transition(ProbePhase::Failed);
        error!(target: "probe", %phase, error = %source, "probe failed");
        ProbeFailure { phase, source }
    }
}

impl<E> Drop for Probe<E> {
    fn drop(&mut self) {
        debug!(target: "probe", phase = %self.phase, "closing search engine connection");
    }
}
