// SPDX-License-Identifier: GPL-3.0-or-later

use osprobe_client::{
    FieldMapping, IndexCreationResult, IndexSpec, ProbeError, Result, SearchEngine,
};
use osprobe_config::IndexConfig;
use tracing::{info, warn};

/// The index the container check provisions: a `message` text field with an
/// unstored `message.text` sub-field.
pub fn container_index_spec(config: &IndexConfig) -> Result<IndexSpec> {
    IndexSpec::builder(config.name.as_str())
        .shards(config.shards)
        .replicas(config.replicas)
        .field(
            "message",
            FieldMapping::text().subfield("text", FieldMapping::text().store(false)),
        )
        .build()
}

/// Create `spec` with a single request and insist on full acknowledgment.
///
/// Never retried: a repeat against the same name fails with `AlreadyExists`.
pub async fn create_index<E>(engine: &E, spec: &IndexSpec) -> Result<IndexCreationResult>
where
    E: SearchEngine + ?Sized,
{
    info!(
        target: "probe",
        index = spec.name(),
        shards = spec.shard_count(),
        replicas = spec.replica_count(),
        "creating index"
    );

    let result = engine.create_index(spec).await?;

    if !result.is_complete() {
        warn!(
            target: "probe",
            index = spec.name(),
            acknowledged = result.acknowledged,
            shards_acknowledged = result.shards_acknowledged,
            "index creation not fully acknowledged"
        );
        return Err(ProbeError::NotAcknowledged {
            index: spec.name().to_string(),
            acknowledged: result.acknowledged,
            shards_acknowledged: result.shards_acknowledged,
        });
    }

    info!(target: "probe", index = spec.name(), "index created and acknowledged");
    Ok(result)
}
