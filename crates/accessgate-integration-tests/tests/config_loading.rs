//! Pipelines assembled from files on disk.

use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;

use accessgate_config::{load_policy, load_settings_with_env};
use accessgate_core::{DecisionStatus, ManualClock};
use accessgate_runtime::Pipeline;
use accessgate_test::{MockExtractor, engineering, inbound_from, sample_policy, sample_policy_file};
use serde_json::json;
use tempfile::NamedTempFile;

const TEXT: &str = "read access to the logs bucket";

fn extractor() -> Arc<MockExtractor> {
    Arc::new(MockExtractor::new().with_response(
        TEXT,
        json!([{
            "action_type": "ACCESS_REQUEST",
            "target_system": "aws",
            "target_resource": "logs",
            "requested_action": "read",
            "confidence": 0.8
        }]),
    ))
}

#[tokio::test]
async fn test_policy_file_matches_fixture() {
    let file = sample_policy_file();
    let loaded = load_policy(file.path()).unwrap();
    let fixture = sample_policy();
    assert_eq!(
        loaded.services.keys().collect::<Vec<_>>(),
        fixture.services.keys().collect::<Vec<_>>()
    );
    assert_eq!(loaded.roles.len(), fixture.roles.len());
}

#[tokio::test]
async fn test_settings_file_threshold_is_honored() {
    let mut settings_file = NamedTempFile::new().unwrap();
    writeln!(settings_file, "[pipeline]\nconfidence_threshold = 0.85").unwrap();

    let policy = load_policy(sample_policy_file().path()).unwrap();
    let settings = load_settings_with_env(Some(settings_file.path()), &HashMap::new()).unwrap();
    let pipeline = Pipeline::new(&settings, policy, extractor(), Arc::new(ManualClock::epoch()))
        .unwrap();

    let out = pipeline
        .process_batch(vec![inbound_from("r1", &engineering(), TEXT)])
        .await;
    assert_eq!(
        out[0].sub_decisions[0].decision.status(),
        DecisionStatus::ClarificationNeeded
    );
}

#[tokio::test]
async fn test_file_wins_over_environment() {
    let mut settings_file = NamedTempFile::new().unwrap();
    writeln!(settings_file, "[pipeline]\nconfidence_threshold = 0.75").unwrap();
    let env = HashMap::from([(
        "ACCESSGATE_CONFIDENCE_THRESHOLD".to_owned(),
        "0.95".to_owned(),
    )]);

    let settings = load_settings_with_env(Some(settings_file.path()), &env).unwrap();
    assert!((settings.pipeline.confidence_threshold - 0.75).abs() < f64::EPSILON);

    let pipeline = Pipeline::new(
        &settings,
        sample_policy(),
        extractor(),
        Arc::new(ManualClock::epoch()),
    )
    .unwrap();
    let out = pipeline
        .process_batch(vec![inbound_from("r1", &engineering(), TEXT)])
        .await;
    assert_eq!(
        out[0].sub_decisions[0].decision.status(),
        DecisionStatus::Approved
    );
}
