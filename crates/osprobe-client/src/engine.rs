// SPDX-License-Identifier: GPL-3.0-or-later

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;

use crate::error::Result;
use crate::models::{ClusterHealth, IndexCreationResult, IndexSpec, MinimumStatus, RawResponse};

/// The operations the probe needs from a search-engine cluster.
#[async_trait]
pub trait SearchEngine: Send + Sync {
    /// Query cluster health, letting the server wait up to `wait_timeout` for
    /// `wait_for` before it answers with whatever status it has.
    async fn health(&self, wait_for: MinimumStatus, wait_timeout: Duration)
        -> Result<ClusterHealth>;

    /// Issue a single create-index request. The flags are returned as reported;
    /// judging them is up to the caller.
    async fn create_index(&self, spec: &IndexSpec) -> Result<IndexCreationResult>;

    /// Arbitrary REST call relative to the cluster base URL.
    async fn raw_request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<RawResponse>;
}
