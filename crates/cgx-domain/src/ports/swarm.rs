//! Swarm coordination ports: pheromone store, task board, task executor.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entities::{Pheromone, PheromoneKind, SwarmTask};
use crate::error::Result;
use crate::value_objects::{AgentId, NodeId, TaskId};

/// A pheromone as returned by `sense`, with its decayed intensity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensedPheromone {
    /// The stored signal
    pub pheromone: Pheromone,
    /// Intensity after decay at sense time
    pub current_intensity: f64,
}

/// Blackboard of time-decayed coordination signals over graph nodes.
///
/// All operations are atomic per (agent, node, kind). Depositing a workflow
/// kind removes any other workflow-kind signal for the same (agent, node);
/// flag kinds compose freely.
#[async_trait]
pub trait PheromoneStore: Send + Sync {
    /// Write a signal, applying workflow-kind mutual exclusion.
    async fn deposit(&self, pheromone: Pheromone) -> Result<()>;

    /// Read current signals on a node whose decayed intensity is above the
    /// negligibility threshold. `kinds` filters to the given kinds;
    /// `exclude_agent` drops the calling agent's own signals.
    async fn sense(
        &self,
        node: &NodeId,
        kinds: Option<&[PheromoneKind]>,
        exclude_agent: Option<&AgentId>,
    ) -> Result<Vec<SensedPheromone>>;

    /// Remove one signal explicitly.
    async fn remove(&self, node: &NodeId, agent: &AgentId, kind: PheromoneKind) -> Result<()>;

    /// Drop signals whose intensity has decayed below the threshold.
    /// Returns the number removed.
    async fn evaporate(&self) -> Result<usize>;
}

/// Counts of tasks by board state, for drained-swarm detection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BoardCounts {
    /// Unclaimed tasks
    pub available: usize,
    /// Claimed but not started
    pub claimed: usize,
    /// Running tasks
    pub in_progress: usize,
    /// Blocked tasks
    pub blocked: usize,
    /// Tasks awaiting review
    pub needs_review: usize,
    /// Finished tasks
    pub completed: usize,
    /// Terminally failed tasks
    pub failed: usize,
    /// Withdrawn tasks
    pub cancelled: usize,
}

impl BoardCounts {
    /// A swarm is drained when nothing is available and nothing is running.
    #[must_use]
    pub fn is_drained(&self) -> bool {
        self.available == 0 && self.in_progress == 0
    }
}

/// Shared task board a swarm coordinates through.
#[async_trait]
pub trait TaskBoard: Send + Sync {
    /// Publish decomposed tasks onto the board.
    async fn publish(&self, tasks: Vec<SwarmTask>) -> Result<()>;

    /// Tasks currently claimable, highest priority first.
    async fn available(&self) -> Result<Vec<SwarmTask>>;

    /// Atomically claim a task for an agent.
    ///
    /// # Errors
    ///
    /// Fails when the task is unknown or no longer available.
    async fn claim(&self, task: &TaskId, agent: &AgentId) -> Result<SwarmTask>;

    /// Transition a claimed task to in-progress.
    async fn start(&self, task: &TaskId) -> Result<()>;

    /// Mark a task completed.
    async fn complete(&self, task: &TaskId) -> Result<()>;

    /// Mark a task failed. Retryable failures return the task to the board;
    /// non-retryable ones are terminal.
    async fn fail(&self, task: &TaskId, reason: &str, retryable: bool) -> Result<()>;

    /// Fetch one task.
    async fn get(&self, task: &TaskId) -> Result<Option<SwarmTask>>;

    /// Counts by board state.
    async fn counts(&self) -> Result<BoardCounts>;
}

/// What a completed task execution produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionReport {
    /// Human-readable summary of what was done
    pub summary: String,
    /// Optional structured detail from the tooling
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<Value>,
}

/// External tooling a swarm worker delegates actual code work to.
#[async_trait]
pub trait TaskExecutor: Send + Sync {
    /// Execute one task to completion.
    ///
    /// # Errors
    ///
    /// Any error is treated as a retryable task failure by the worker
    /// protocol.
    async fn execute(&self, task: &SwarmTask) -> Result<ExecutionReport>;
}
