//! Value objects: strong-typed identifiers and small immutable types.

mod ids;

pub use ids::{AgentId, JobId, NodeId, ProjectId, SwarmId, TaskId};
