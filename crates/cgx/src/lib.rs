//! Code Graph Explorer.
//!
//! Ingests a source project through an external AST parser, persists a typed
//! code graph through a graph-store port, and exposes impact, dead-code and
//! traversal analysis plus a pheromone-based swarm coordination substrate.
//!
//! This facade re-exports the layered crates:
//! - [`cgx_domain`] — entities, typed ids, error taxonomy, ports
//! - [`cgx_application`] — parse pipeline, analysis engines, swarm logic
//! - [`cgx_infrastructure`] — config, logging, in-memory adapters

pub use cgx_application as application;
pub use cgx_domain as domain;
pub use cgx_infrastructure as infrastructure;

/// Commonly used types, one import away.
pub mod prelude {
    pub use cgx_application::analysis::{
        DeadCodeEngine, DeadCodeOptions, ImpactEngine, ImpactTarget, RiskLevel, TraversalEngine,
        TraversalOptions,
    };
    pub use cgx_application::change_detection::{ChangeDetector, ChangeDetectorConfig};
    pub use cgx_application::identity::resolve_project_input;
    pub use cgx_application::parse::{ParseCoordinator, ParseCoordinatorConfig, ParseRequest};
    pub use cgx_application::semantic::{BatcherConfig, EmbeddingBatcher};
    pub use cgx_application::swarm::{SwarmWorker, SwarmWorkerConfig, decompose};
    pub use cgx_domain::entities::{
        CodeEdge, CodeNode, ParseJob, ParseJobStatus, Pheromone, PheromoneKind, Project,
        ProjectStatus, SwarmTask, TaskKind, TaskPriority, TaskStatus,
    };
    pub use cgx_domain::error::{Error, Result};
    pub use cgx_domain::ports::graph_store::GraphStore;
    pub use cgx_domain::ports::jobs::JobManager;
    pub use cgx_domain::ports::swarm::{PheromoneStore, TaskBoard, TaskExecutor};
    pub use cgx_domain::value_objects::{AgentId, JobId, NodeId, ProjectId, SwarmId, TaskId};
    pub use cgx_infrastructure::{
        AppConfig, ConfigLoader, InMemoryGraphStore, InMemoryJobManager, InMemoryPheromoneStore,
        InMemoryTaskBoard, JobSweeper,
    };
}
