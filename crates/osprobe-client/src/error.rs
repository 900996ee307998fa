// SPDX-License-Identifier: GPL-3.0-or-later

use std::time::Duration;

use thiserror::Error;

use crate::models::{HealthStatus, MinimumStatus};

pub type Result<T> = std::result::Result<T, ProbeError>;

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("OpenSearch unreachable: {0}")]
    Unreachable(String),

    #[error("Malformed response from OpenSearch: {reason}; body: {body}")]
    MalformedResponse { reason: String, body: String },

    #[error(
        "Index {index} was not acknowledged \
         (acknowledged: {acknowledged}, shards_acknowledged: {shards_acknowledged})"
    )]
    NotAcknowledged {
        index: String,
        acknowledged: bool,
        shards_acknowledged: bool,
    },

    #[error("Index already exists: {0}")]
    AlreadyExists(String),

    #[error("Cluster health did not reach {required} within {elapsed:?} (last status: {last})")]
    Timeout {
        required: MinimumStatus,
        last: HealthStatus,
        elapsed: Duration,
    },

    #[error("API error: {status} - {body}")]
    Api { status: u16, body: String },

    #[error("Invalid index spec: {0}")]
    InvalidIndexSpec(String),

    #[error("Invalid client configuration: {0}")]
    InvalidConfig(String),
}

impl ProbeError {
    /// Whether the health waiter may try again before its deadline.
    pub fn is_transient(&self) -> bool {
        matches!(self, ProbeError::Unreachable(_))
    }

    pub(crate) fn malformed(reason: impl ToString, body: &str) -> Self {
        ProbeError::MalformedResponse {
            reason: reason.to_string(),
            body: body.to_string(),
        }
    }
}

impl From<reqwest::Error> for ProbeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() {
            ProbeError::InvalidConfig(err.to_string())
        } else {
            ProbeError::Unreachable(err.to_string())
        }
    }
}
