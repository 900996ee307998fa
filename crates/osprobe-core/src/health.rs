// SPDX-License-Identifier: GPL-3.0-or-later

use std::time::Duration;

use osprobe_client::{ClusterHealth, HealthStatus, MinimumStatus, ProbeError, Result, SearchEngine};
use osprobe_config::HealthConfig;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, info, warn};

/// How long, how often and for what status the waiter polls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthPolicy {
    pub minimum_status: MinimumStatus,
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl HealthPolicy {
    pub fn new(minimum_status: MinimumStatus, timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            minimum_status,
            timeout,
            poll_interval,
        }
    }

    /// Both durations must be non-zero; a zero interval would poll without pause.
    pub fn validate(&self) -> Result<()> {
        if self.timeout.is_zero() {
            return Err(ProbeError::InvalidConfig(
                "health timeout must be greater than zero".to_string(),
            ));
        }
        if self.poll_interval.is_zero() {
            return Err(ProbeError::InvalidConfig(
                "health poll interval must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Upper bound on the health queries one wait can issue.
    pub fn max_attempts(&self) -> u128 {
        self.timeout.as_millis() / self.poll_interval.as_millis().max(1) + 1
    }
}

impl From<&HealthConfig> for HealthPolicy {
    fn from(config: &HealthConfig) -> Self {
        Self::new(
            config.minimum_status,
            config.timeout(),
            config.poll_interval(),
        )
    }
}

/// Poll cluster health until it reaches `policy.minimum_status`.
///
/// Transport failures and below-threshold answers are retried until the
/// deadline; any other error is returned at once. When the deadline passes the
/// result is `Timeout` if the cluster ever answered, `Unreachable` otherwise.
/// A single query is cut off when the deadline passes.
pub async fn wait_for_healthy<E>(engine: &E, policy: &HealthPolicy) -> Result<ClusterHealth>
where
    E: SearchEngine + ?Sized,
{
    policy.validate()?;

    let started = Instant::now();
    let deadline = started + policy.timeout;
    let mut attempts: u32 = 0;
    let mut last_status: Option<HealthStatus> = None;
    let mut last_error: Option<ProbeError> = None;

    loop {
        attempts += 1;
        let remaining = deadline.saturating_duration_since(Instant::now());
        let server_wait = policy.poll_interval.min(remaining);
        let answer = timeout(remaining, engine.health(policy.minimum_status, server_wait))
            .await
            .unwrap_or_else(|_| {
                Err(ProbeError::Unreachable(format!(
                    "health query still pending at the deadline after {remaining:?}"
                )))
            });

        match answer {
            Ok(health) if policy.minimum_status.is_met_by(health.status) => {
                info!(
                    target: "probe",
                    attempts,
                    status = %health.status,
                    elapsed = ?started.elapsed(),
                    "cluster health reached {}",
                    policy.minimum_status
                );
                return Ok(health);
            }
            Ok(health) => {
                debug!(
                    target: "probe",
                    attempts,
                    status = %health.status,
                    "cluster health below {}",
                    policy.minimum_status
                );
                last_status = Some(health.status);
            }
            Err(err) if err.is_transient() => {
                debug!(target: "probe", attempts, error = %err, "health query failed, retrying");
                last_error = Some(err);
            }
            Err(err) => return Err(err),
        }

        if Instant::now() + policy.poll_interval > deadline {
            break;
        }
        sleep(policy.poll_interval).await;
    }

    let elapsed = started.elapsed();
    warn!(target: "probe", attempts, ?elapsed, "gave up waiting for cluster health");

    match last_status {
        Some(last) => Err(ProbeError::Timeout {
            required: policy.minimum_status,
            last,
            elapsed,
        }),
        None => Err(ProbeError::Unreachable(format!(
            "no answer after {attempts} attempts in {elapsed:?}: {}",
            last_error.map(|e| e.to_string()).unwrap_or_default()
        ))),
    }
}
