// SPDX-License-Identifier: GPL-3.0-or-later

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use osprobe_client::{
    ClusterHealth, HealthStatus, IndexCreationResult, IndexSpec, Method, MinimumStatus,
    ProbeError, RawResponse, Result, SearchEngine,
};

/// One scripted answer to a health query.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Reply {
    Status(HealthStatus),
    Refused,
    Malformed,
    /// Answers green, but only after the given delay.
    Hang(Duration),
}

/// In-memory engine replaying a health script. The last reply repeats once the
/// script runs out.
pub(crate) struct ScriptedEngine {
    replies: Mutex<VecDeque<Reply>>,
    creation: Mutex<Option<IndexCreationResult>>,
    health_calls: AtomicU32,
    create_calls: AtomicU32,
}

impl ScriptedEngine {
    pub(crate) fn new(replies: impl IntoIterator<Item = Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            creation: Mutex::new(Some(IndexCreationResult {
                acknowledged: true,
                shards_acknowledged: true,
                index: None,
            })),
            health_calls: AtomicU32::new(0),
            create_calls: AtomicU32::new(0),
        }
    }

    pub(crate) fn with_creation(self, acknowledged: bool, shards_acknowledged: bool) -> Self {
        *self.creation.lock().unwrap() = Some(IndexCreationResult {
            acknowledged,
            shards_acknowledged,
            index: None,
        });
        self
    }

    pub(crate) fn health_calls(&self) -> u32 {
        self.health_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn create_calls(&self) -> u32 {
        self.create_calls.load(Ordering::SeqCst)
    }

    fn next_reply(&self) -> Reply {
        let mut replies = self.replies.lock().unwrap();
        if replies.len() > 1 {
            replies.pop_front().unwrap()
        } else {
            *replies.front().expect("health script is empty")
        }
    }
}

#[async_trait]
impl SearchEngine for ScriptedEngine {
    async fn health(
        &self,
        _wait_for: MinimumStatus,
        _wait_timeout: Duration,
    ) -> Result<ClusterHealth> {
        self.health_calls.fetch_add(1, Ordering::SeqCst);
        let status = match self.next_reply() {
            Reply::Status(status) => status,
            Reply::Hang(delay) => {
                tokio::time::sleep(delay).await;
                HealthStatus::Green
            }
            Reply::Refused => {
                return Err(ProbeError::Unreachable("connection refused".to_string()))
            }
            Reply::Malformed => {
                return Err(ProbeError::MalformedResponse {
                    reason: "missing field `status`".to_string(),
                    body: "{}".to_string(),
                })
            }
        };

        Ok(ClusterHealth {
            status,
            cluster_name: None,
            timed_out: false,
            number_of_nodes: None,
            number_of_data_nodes: None,
            active_primary_shards: None,
            active_shards: None,
            unassigned_shards: None,
        })
    }

    async fn create_index(&self, spec: &IndexSpec) -> Result<IndexCreationResult> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        // The first call consumes the scripted result; later calls collide.
        self.creation
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| ProbeError::AlreadyExists(spec.name().to_string()))
    }

    async fn raw_request(
        &self,
        _method: Method,
        path: &str,
        _body: Option<&serde_json::Value>,
    ) -> Result<RawResponse> {
        Ok(RawResponse {
            status: 404,
            body: format!("no route for {path}"),
        })
    }
}
