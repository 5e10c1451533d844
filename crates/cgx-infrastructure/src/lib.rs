//! Infrastructure layer for the Code Graph Explorer.
//!
//! Configuration loading, tracing bootstrap, and the in-memory adapters
//! behind the domain ports: job manager (with its TTL sweeper), pheromone
//! store, task board, and graph store.

pub mod config;
pub mod graph;
pub mod jobs;
pub mod logging;
pub mod swarm;

pub use config::{AppConfig, ConfigLoader};
pub use graph::InMemoryGraphStore;
pub use jobs::{InMemoryJobManager, JobSweeper};
pub use logging::init_tracing;
pub use swarm::{InMemoryPheromoneStore, InMemoryTaskBoard};
