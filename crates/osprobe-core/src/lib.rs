// SPDX-License-Identifier: GPL-3.0-or-later

//! Wait-for-healthy-then-provision probe for an OpenSearch cluster.
//!
//! The probe polls cluster health until it reaches a minimum status within a
//! time budget, then creates one index and requires the creation to be fully
//! acknowledged. Each run is independent and owns its connection.

pub mod health;
pub mod probe;
pub mod provision;
#[cfg(test)]
mod testing;

pub use health::{wait_for_healthy, HealthPolicy};
pub use probe::{connect, Probe, ProbeFailure, ProbePhase, ProbeReport};
pub use provision::{container_index_spec, create_index};
