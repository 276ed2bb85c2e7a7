//! Shared harness for end-to-end pipeline tests.

use std::sync::Arc;

use accessgate_config::Settings;
use accessgate_core::{Decision, Identity, ManualClock, MultiDecision};
use accessgate_runtime::Pipeline;
use accessgate_test::{MockExtractor, init_test_logging, inbound_from, sample_policy};

/// A pipeline over the sample policy with a manual clock and a scripted
/// extractor.
#[allow(dead_code)]
pub struct PipelineHarness {
    /// The pipeline under test.
    pub pipeline: Pipeline,
    /// Advance this to move time.
    pub clock: Arc<ManualClock>,
    /// The scripted extractor (shared with the pipeline).
    pub extractor: Arc<MockExtractor>,
}

#[allow(dead_code)]
impl PipelineHarness {
    /// Build with default settings.
    pub fn new(extractor: MockExtractor) -> Self {
        Self::with_settings(extractor, &Settings::default())
    }

    /// Build with explicit settings.
    pub fn with_settings(extractor: MockExtractor, settings: &Settings) -> Self {
        init_test_logging();
        let clock = Arc::new(ManualClock::epoch());
        let extractor = Arc::new(extractor);
        let pipeline = Pipeline::new(
            settings,
            sample_policy(),
            extractor.clone(),
            clock.clone(),
        )
        .expect("pipeline assembles");
        Self {
            pipeline,
            clock,
            extractor,
        }
    }

    /// Submit one request through the batch entry point.
    pub async fn submit(&self, id: &str, who: &Identity, text: &str) -> MultiDecision {
        let mut out = self
            .pipeline
            .process_batch(vec![inbound_from(id, who, text)])
            .await;
        assert_eq!(out.len(), 1, "one output per input");
        out.remove(0)
    }
}

/// The only decision of a single-intent response.
#[allow(dead_code)]
pub fn only(decision: &MultiDecision) -> &Decision {
    assert_eq!(decision.sub_decisions.len(), 1, "expected one sub-decision");
    &decision.sub_decisions[0].decision
}
