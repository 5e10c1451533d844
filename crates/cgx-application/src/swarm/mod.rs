//! Swarm coordination: task decomposition and the worker protocol.

mod decompose;
mod worker;

pub use decompose::{
    Complexity, DecompositionResult, NodeImpactInfo, decompose, parallelizable_tasks,
};
pub use worker::{CycleOutcome, RunSummary, SwarmWorker, SwarmWorkerConfig};
