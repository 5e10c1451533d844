//! Swarm worker protocol.
//!
//! A worker cycles sense → claim → execute → complete, coordinating with its
//! peers purely through pheromones and the task board. Tasks carrying other
//! agents' `Modifying`/`Claiming` markers are skipped; failures return the
//! task to the board behind a short-lived `Blocked` signal so retries can
//! happen once it decays.

use std::sync::Arc;
use std::time::Duration;

use cgx_domain::constants::swarm as swarm_constants;
use cgx_domain::entities::{Pheromone, PheromoneKind, SwarmTask};
use cgx_domain::error::Result;
use cgx_domain::ports::swarm::{PheromoneStore, TaskBoard, TaskExecutor};
use cgx_domain::value_objects::{AgentId, NodeId, SwarmId, TaskId};
use serde_json::json;
use tracing::{debug, info, warn};

/// Worker tuning.
#[derive(Debug, Clone)]
pub struct SwarmWorkerConfig {
    /// Idle wait between cycles when nothing is claimable
    pub monitor_interval: Duration,
}

impl Default for SwarmWorkerConfig {
    fn default() -> Self {
        Self {
            monitor_interval: Duration::from_millis(swarm_constants::MONITOR_INTERVAL_MS),
        }
    }
}

/// Outcome of one worker cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// A task was claimed, executed and completed
    Executed(TaskId),
    /// A task was attempted and failed (returned to the board, retryable)
    Failed(TaskId),
    /// Nothing claimable this cycle; the board is not drained
    Idle,
    /// The board is drained: nothing available, nothing in progress
    Drained,
}

/// Totals from a full worker run.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunSummary {
    /// Tasks completed
    pub executed: usize,
    /// Task attempts that failed
    pub failed: usize,
}

/// One swarm agent following the sense/claim/execute/complete contract.
pub struct SwarmWorker {
    agent_id: AgentId,
    swarm_id: SwarmId,
    pheromones: Arc<dyn PheromoneStore>,
    board: Arc<dyn TaskBoard>,
    executor: Arc<dyn TaskExecutor>,
    config: SwarmWorkerConfig,
}

impl SwarmWorker {
    /// Create a worker.
    #[must_use]
    pub fn new(
        agent_id: AgentId,
        swarm_id: SwarmId,
        pheromones: Arc<dyn PheromoneStore>,
        board: Arc<dyn TaskBoard>,
        executor: Arc<dyn TaskExecutor>,
        config: SwarmWorkerConfig,
    ) -> Self {
        Self {
            agent_id,
            swarm_id,
            pheromones,
            board,
            executor,
            config,
        }
    }

    fn pheromone(&self, node: &NodeId, kind: PheromoneKind, task: &TaskId) -> Pheromone {
        Pheromone {
            node_id: node.clone(),
            agent_id: self.agent_id.clone(),
            swarm_id: self.swarm_id.clone(),
            kind,
            created_at_ms: chrono::Utc::now().timestamp_millis(),
            intensity: 1.0,
            data: Some(json!({ "task": task.as_str() })),
        }
    }

    /// Is any OTHER agent claiming or modifying one of the task's nodes?
    async fn is_contested(&self, task: &SwarmTask) -> Result<bool> {
        for node in &task.node_ids {
            let markers = self
                .pheromones
                .sense(
                    node,
                    Some(&[PheromoneKind::Modifying, PheromoneKind::Claiming]),
                    Some(&self.agent_id),
                )
                .await?;
            if !markers.is_empty() {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Run one sense → claim → execute → complete cycle.
    ///
    /// # Errors
    ///
    /// Fails on pheromone-store or board errors. Task execution failures are
    /// NOT errors; they surface as [`CycleOutcome::Failed`].
    pub async fn run_cycle(&self) -> Result<CycleOutcome> {
        let available = self.board.available().await?;

        let mut candidate = None;
        for task in available {
            if self.is_contested(&task).await? {
                debug!(agent = %self.agent_id, task = %task.id, "Skipping contested task");
                continue;
            }
            candidate = Some(task);
            break;
        }

        let Some(task) = candidate else {
            let counts = self.board.counts().await?;
            if counts.is_drained() {
                return Ok(CycleOutcome::Drained);
            }
            return Ok(CycleOutcome::Idle);
        };

        // Claim first; a racing peer losing the claim just moves on.
        let task = match self.board.claim(&task.id, &self.agent_id).await {
            Ok(claimed) => claimed,
            Err(e) => {
                debug!(agent = %self.agent_id, error = %e, "Claim lost; retrying next cycle");
                return Ok(CycleOutcome::Idle);
            }
        };

        if let Some(first_node) = task.node_ids.first() {
            self.pheromones
                .deposit(self.pheromone(first_node, PheromoneKind::Modifying, &task.id))
                .await?;
        }
        self.board.start(&task.id).await?;
        info!(agent = %self.agent_id, task = %task.id, "Task started");

        match self.executor.execute(&task).await {
            Ok(report) => {
                self.board.complete(&task.id).await?;
                if let Some(first_node) = task.node_ids.first() {
                    self.pheromones
                        .deposit(self.pheromone(first_node, PheromoneKind::Completed, &task.id))
                        .await?;
                }
                info!(agent = %self.agent_id, task = %task.id, summary = %report.summary, "Task completed");
                Ok(CycleOutcome::Executed(task.id))
            }
            Err(e) => {
                warn!(agent = %self.agent_id, task = %task.id, error = %e, "Task failed; returning to board");
                self.board.fail(&task.id, &e.to_string(), true).await?;
                if let Some(first_node) = task.node_ids.first() {
                    // Blocked decays in 5 minutes, letting a retry happen
                    self.pheromones
                        .deposit(self.pheromone(first_node, PheromoneKind::Blocked, &task.id))
                        .await?;
                }
                Ok(CycleOutcome::Failed(task.id))
            }
        }
    }

    /// Cycle until the swarm is drained.
    ///
    /// # Errors
    ///
    /// Propagates board and pheromone-store errors.
    pub async fn run(&self) -> Result<RunSummary> {
        let mut summary = RunSummary::default();
        loop {
            match self.run_cycle().await? {
                CycleOutcome::Executed(_) => summary.executed += 1,
                CycleOutcome::Failed(_) => summary.failed += 1,
                CycleOutcome::Idle => {
                    tokio::time::sleep(self.config.monitor_interval).await;
                }
                CycleOutcome::Drained => {
                    info!(agent = %self.agent_id, executed = summary.executed, failed = summary.failed, "Swarm drained; exiting");
                    return Ok(summary);
                }
            }
        }
    }
}
