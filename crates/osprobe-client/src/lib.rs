// SPDX-License-Identifier: GPL-3.0-or-later

//! OpenSearch client for the readiness probe.
//!
//! This crate provides the error taxonomy, the wire models and a small REST
//! client for the calls the probe makes: cluster health, index creation and
//! raw requests. The [`SearchEngine`] trait is the seam the probe is written
//! against.

pub mod client;
pub mod engine;
pub mod error;
pub mod models;

pub use client::{OpenSearchClient, OpenSearchClientBuilder};
pub use engine::SearchEngine;
pub use error::{ProbeError, Result};
pub use models::{
    ClusterHealth, FieldMapping, HealthStatus, IndexCreationResult, IndexSpec, IndexSpecBuilder,
    MinimumStatus, RawResponse,
};
pub use reqwest::Method;
