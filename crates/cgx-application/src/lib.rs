//! Application layer for the Code Graph Explorer.
//!
//! Use-cases over the domain ports: project identity resolution, incremental
//! change detection, the chunked parse pipeline (worker pool, streaming
//! import, coordinator), the impact / dead-code / traversal engines, swarm
//! task decomposition and the worker protocol, and the embedding batcher.

pub mod analysis;
pub mod change_detection;
pub mod identity;
pub mod parse;
pub mod semantic;
pub mod swarm;

#[cfg(test)]
pub(crate) mod testing;

pub use analysis::{DeadCodeEngine, ImpactEngine, TraversalEngine};
pub use change_detection::{ChangeDetector, ChangeDetectorConfig, ChangeSet};
pub use parse::{ParseCoordinator, ParseCoordinatorConfig, ParseRequest};
pub use semantic::{BatcherConfig, EmbeddingBatcher};
