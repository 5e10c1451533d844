//! Integration test suite for the cgx workspace.
//!
//! Run with: `cargo test -p cgx --test integration`

// Shared test utilities (single declaration for all integration tests)
#[path = "support.rs"]
mod support;

#[path = "pipeline_tests.rs"]
mod pipeline_tests;

#[path = "analysis_tests.rs"]
mod analysis_tests;

#[path = "swarm_tests.rs"]
mod swarm_tests;
