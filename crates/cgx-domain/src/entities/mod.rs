//! Domain entities.

pub mod graph;
pub mod job;
pub mod project;
pub mod swarm;

pub use graph::{CodeEdge, CodeNode, DeferredEdge, EdgeDirection, IndexedFile};
pub use job::{ParseJob, ParseJobStatus, ParseOutcome, ParsePhase, ParseProgress};
pub use project::{Project, ProjectStatus};
pub use swarm::{Pheromone, PheromoneKind, SwarmTask, TaskKind, TaskPriority, TaskStatus};
