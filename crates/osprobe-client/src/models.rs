// SPDX-License-Identifier: GPL-3.0-or-later

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{ProbeError, Result};

/// Aggregate cluster readiness, ordered `Red < Yellow < Green`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum HealthStatus {
    Red,
    Yellow,
    Green,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Red => "red",
            HealthStatus::Yellow => "yellow",
            HealthStatus::Green => "green",
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HealthStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("green") {
            Ok(HealthStatus::Green)
        } else if s.eq_ignore_ascii_case("yellow") {
            Ok(HealthStatus::Yellow)
        } else if s.eq_ignore_ascii_case("red") {
            Ok(HealthStatus::Red)
        } else {
            Err(format!("unknown cluster health status {s:?}"))
        }
    }
}

impl TryFrom<String> for HealthStatus {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

/// The lowest health status a probe accepts. Red is never acceptable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MinimumStatus {
    Yellow,
    Green,
}

impl MinimumStatus {
    pub fn as_health_status(&self) -> HealthStatus {
        match self {
            MinimumStatus::Yellow => HealthStatus::Yellow,
            MinimumStatus::Green => HealthStatus::Green,
        }
    }

    pub fn is_met_by(&self, status: HealthStatus) -> bool {
        status >= self.as_health_status()
    }

    /// Value for the `wait_for_status` query parameter.
    pub fn as_str(&self) -> &'static str {
        self.as_health_status().as_str()
    }
}

impl fmt::Display for MinimumStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MinimumStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.parse::<HealthStatus>()? {
            HealthStatus::Green => Ok(MinimumStatus::Green),
            HealthStatus::Yellow => Ok(MinimumStatus::Yellow),
            HealthStatus::Red => Err("red is not an acceptable minimum status".to_string()),
        }
    }
}

/// Snapshot returned by `GET /_cluster/health`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClusterHealth {
    pub status: HealthStatus,
    #[serde(default)]
    pub cluster_name: Option<String>,
    /// Set when the server-side `wait_for_status` expired before the status was reached.
    #[serde(default)]
    pub timed_out: bool,
    #[serde(default)]
    pub number_of_nodes: Option<u32>,
    #[serde(default)]
    pub number_of_data_nodes: Option<u32>,
    #[serde(default)]
    pub active_primary_shards: Option<u32>,
    #[serde(default)]
    pub active_shards: Option<u32>,
    #[serde(default)]
    pub unassigned_shards: Option<u32>,
}

/// Field-type descriptor inside `mappings.properties`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldMapping {
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store: Option<bool>,
    /// Multi-fields indexing the same value a second way.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, FieldMapping>,
}

impl FieldMapping {
    pub fn new(field_type: impl Into<String>) -> Self {
        Self {
            field_type: field_type.into(),
            store: None,
            fields: BTreeMap::new(),
        }
    }

    pub fn text() -> Self {
        Self::new("text")
    }

    pub fn keyword() -> Self {
        Self::new("keyword")
    }

    pub fn store(mut self, store: bool) -> Self {
        self.store = Some(store);
        self
    }

    pub fn subfield(mut self, name: impl Into<String>, mapping: FieldMapping) -> Self {
        self.fields.insert(name.into(), mapping);
        self
    }
}

/// A validated index definition. Built once through [`IndexSpec::builder`]
/// and read-only afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexSpec {
    name: String,
    shard_count: u32,
    replica_count: u32,
    field_mappings: BTreeMap<String, FieldMapping>,
}

impl IndexSpec {
    pub fn builder(name: impl Into<String>) -> IndexSpecBuilder {
        IndexSpecBuilder {
            name: name.into(),
            shard_count: 1,
            replica_count: 0,
            field_mappings: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn shard_count(&self) -> u32 {
        self.shard_count
    }

    pub fn replica_count(&self) -> u32 {
        self.replica_count
    }

    pub fn field_mappings(&self) -> &BTreeMap<String, FieldMapping> {
        &self.field_mappings
    }

    /// Body for `PUT /<index>`.
    pub fn request_body(&self) -> Value {
        json!({
            "settings": {
                "number_of_shards": self.shard_count,
                "number_of_replicas": self.replica_count,
            },
            "mappings": {
                "properties": self.field_mappings,
            },
        })
    }
}

#[derive(Debug, Clone)]
pub struct IndexSpecBuilder {
    name: String,
    shard_count: u32,
    replica_count: u32,
    field_mappings: BTreeMap<String, FieldMapping>,
}

impl IndexSpecBuilder {
    pub fn shards(mut self, shard_count: u32) -> Self {
        self.shard_count = shard_count;
        self
    }

    pub fn replicas(mut self, replica_count: u32) -> Self {
        self.replica_count = replica_count;
        self
    }

    pub fn field(mut self, name: impl Into<String>, mapping: FieldMapping) -> Self {
        self.field_mappings.insert(name.into(), mapping);
        self
    }

    pub fn build(self) -> Result<IndexSpec> {
        validate_index_name(&self.name)?;
        if self.shard_count == 0 {
            return Err(ProbeError::InvalidIndexSpec(format!(
                "index {} needs at least one shard",
                self.name
            )));
        }

        Ok(IndexSpec {
            name: self.name,
            shard_count: self.shard_count,
            replica_count: self.replica_count,
            field_mappings: self.field_mappings,
        })
    }
}

const FORBIDDEN_NAME_CHARS: &[char] = &['\\', '/', '*', '?', '"', '<', '>', '|', ',', '#', ' ', ':'];

fn validate_index_name(name: &str) -> Result<()> {
    let invalid = |reason: &str| -> Result<()> {
        Err(ProbeError::InvalidIndexSpec(format!("{name:?}: {reason}")))
    };

    if name.is_empty() {
        return invalid("name is empty");
    }
    if name.len() > 255 {
        return invalid("name is longer than 255 bytes");
    }
    if name == "." || name == ".." {
        return invalid("name cannot be . or ..");
    }
    if name.starts_with(['-', '_', '+']) {
        return invalid("name cannot start with -, _ or +");
    }
    if name.chars().any(|c| c.is_uppercase()) {
        return invalid("name must be lowercase");
    }
    if let Some(c) = name.chars().find(|c| FORBIDDEN_NAME_CHARS.contains(c)) {
        return invalid(&format!("name contains forbidden character {c:?}"));
    }
    Ok(())
}

/// Response of `PUT /<index>`. Neither flag has a default: a body that lacks
/// one of them is malformed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexCreationResult {
    pub acknowledged: bool,
    pub shards_acknowledged: bool,
    #[serde(default)]
    pub index: Option<String>,
}

impl IndexCreationResult {
    pub fn is_complete(&self) -> bool {
        self.acknowledged && self.shards_acknowledged
    }
}

/// Status and body of an arbitrary REST call.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.body).map_err(|e| ProbeError::malformed(e, &self.body))
    }
}
