//! Port traits for external collaborators.
//!
//! The AST parser, the production graph driver, and the embedding client are
//! out of scope for this workspace; they are reached exclusively through the
//! traits defined here. In-memory adapters live in `cgx-infrastructure`.

pub mod embedding;
pub mod graph_store;
pub mod jobs;
pub mod parser;
pub mod swarm;

pub use embedding::{Embedding, EmbeddingProvider};
pub use graph_store::{ConnectionRecord, DeadCodeCandidate, DependentRecord, GraphStore};
pub use jobs::{JobCounts, JobManager};
pub use parser::{AstParser, AstParserFactory, ChunkParseOutput, ParserOptions};
pub use swarm::{BoardCounts, ExecutionReport, PheromoneStore, SensedPheromone, TaskBoard, TaskExecutor};
