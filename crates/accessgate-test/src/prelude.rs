//! Prelude module - commonly used test utilities.
//!
//! Use `use accessgate_test::prelude::*;` to import all essential helpers.

pub use crate::{
    ExtractionCall, FailingExtractor, MockExtractor, SAMPLE_POLICY_JSON, engineering, finance,
    inbound_from, init_test_logging, intern, it_admin, request_from, sample_policy,
    sample_policy_file,
};
