//! Checks against a live OpenSearch container.
//!
//! Configure the target with `OPENSEARCH_HOST`, `OPENSEARCH_PORT`,
//! `OPENSEARCH_SCHEME`, `OPENSEARCH_USERNAME` and `OPENSEARCH_PASSWORD`
//! (or the `OSPROBE_` overrides), then run with `cargo test -- --ignored`.

use osprobe_client::{Method, ProbeError, SearchEngine};
use osprobe_core::{connect, container_index_spec, create_index, Probe};

#[tokio::test]
#[ignore]
async fn test_index_creation() {
    // Requires live OpenSearch instance
    let mut config = osprobe_config::load(None).unwrap();
    config.index.name = format!("container_test_{}", std::process::id());
    let index = config.index.name.clone();

    let report = Probe::from_config(&config).unwrap().run().await.unwrap();
    assert!(report.index.acknowledged, "Index response was not acknowledged");
    assert!(report.index.shards_acknowledged, "All shards were not copied");

    let client = connect(&config.connection).unwrap();
    let settings = client
        .raw_request(Method::GET, &format!("{index}/_settings"), None)
        .await
        .unwrap();
    assert!(settings.is_success(), "settings lookup failed: {}", settings.body);
    let settings: serde_json::Value = settings.json().unwrap();
    let index_settings = &settings[index.as_str()]["settings"]["index"];
    assert_eq!(index_settings["number_of_shards"], "1");
    assert_eq!(index_settings["number_of_replicas"], "0");

    let spec = container_index_spec(&config.index).unwrap();
    let again = create_index(&client, &spec).await.unwrap_err();
    assert!(matches!(again, ProbeError::AlreadyExists(_)));

    let deleted = client
        .raw_request(Method::DELETE, &index, None)
        .await
        .unwrap();
    assert!(deleted.is_success(), "cleanup failed: {}", deleted.body);
}
