//! Rolling hardware budget across requests.

mod common;

use accessgate_approval::SpendingStatus;
use accessgate_config::{BoundarySetting, Settings};
use accessgate_core::DecisionStatus;
use accessgate_test::{MockExtractor, intern};
use chrono::Duration;
use common::{PipelineHarness, only};
use serde_json::json;

const LAPTOP: &str = "I need a MacBook Air";
const MONITOR: &str = "I need a 4K monitor";

fn scripted() -> MockExtractor {
    MockExtractor::new()
        .with_response(
            LAPTOP,
            json!([{"action_type": "HARDWARE_REQUEST", "target_resource": "MacBook Air", "confidence": 0.9}]),
        )
        .with_response(
            MONITOR,
            json!([{"action_type": "HARDWARE_REQUEST", "target_resource": "4K monitor", "confidence": 0.9}]),
        )
}

#[tokio::test]
async fn test_spend_inside_window_counts() {
    let h = PipelineHarness::new(scripted());
    let user = intern();
    let laptop = h.submit("r1", &user, LAPTOP).await;
    assert_eq!(only(&laptop).status(), DecisionStatus::Approved);

    h.clock.advance(Duration::days(89));
    let monitor = h.submit("r2", &user, MONITOR).await;
    assert_eq!(only(&monitor).status(), DecisionStatus::Denied);
}

#[tokio::test]
async fn test_spend_at_exact_window_age_follows_boundary() {
    let h = PipelineHarness::new(scripted());
    let user = intern();
    h.submit("r1", &user, LAPTOP).await;

    h.clock.advance(Duration::days(90));
    let at_limit = h.submit("r2", &user, MONITOR).await;
    assert_eq!(only(&at_limit).status(), DecisionStatus::Denied);

    let mut settings = Settings::default();
    settings.expiry.boundary = BoundarySetting::Exclusive;
    let h = PipelineHarness::with_settings(scripted(), &settings);
    h.submit("r1", &user, LAPTOP).await;

    h.clock.advance(Duration::days(90));
    let at_limit = h.submit("r2", &user, MONITOR).await;
    assert_eq!(only(&at_limit).status(), DecisionStatus::Approved);
}

#[tokio::test]
async fn test_spend_older_than_window_is_dropped() {
    let h = PipelineHarness::new(scripted());
    let user = intern();
    h.submit("r1", &user, LAPTOP).await;

    h.clock.advance(Duration::days(90) + Duration::seconds(1));
    let monitor = h.submit("r2", &user, MONITOR).await;
    assert_eq!(only(&monitor).status(), DecisionStatus::Approved);

    let records = h.pipeline.spending().records_for(&user.email);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].request_id, "r2");
    assert_eq!(records[0].status, SpendingStatus::Approved);
}

#[tokio::test]
async fn test_shorter_window_from_settings() {
    let mut settings = Settings::default();
    settings.spending.window_days = 7;
    let h = PipelineHarness::with_settings(scripted(), &settings);
    let user = intern();
    h.submit("r1", &user, LAPTOP).await;

    h.clock.advance(Duration::days(8));
    let monitor = h.submit("r2", &user, MONITOR).await;
    assert_eq!(only(&monitor).status(), DecisionStatus::Approved);
}
