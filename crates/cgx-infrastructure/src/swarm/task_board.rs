//! In-memory swarm task board.

use async_trait::async_trait;
use cgx_domain::entities::{SwarmTask, TaskStatus};
use cgx_domain::error::{Error, Result};
use cgx_domain::ports::swarm::{BoardCounts, TaskBoard};
use cgx_domain::value_objects::{AgentId, TaskId};
use dashmap::DashMap;
use tracing::{debug, warn};

/// In-memory [`TaskBoard`] implementation.
///
/// The per-task `DashMap` entry lock makes claims atomic: two agents racing
/// for the same task serialise on the entry, and the loser gets a typed
/// claim-conflict error.
#[derive(Default)]
pub struct InMemoryTaskBoard {
    tasks: DashMap<TaskId, SwarmTask>,
}

impl InMemoryTaskBoard {
    /// Create an empty board.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn transition(&self, task: &TaskId, from: TaskStatus, to: TaskStatus) -> Result<()> {
        let mut entry = self
            .tasks
            .get_mut(task)
            .ok_or_else(|| Error::not_found(task.to_string()))?;
        if entry.status != from {
            return Err(Error::invalid_argument(format!(
                "Task {task} is {:?}, expected {from:?}",
                entry.status
            )));
        }
        entry.status = to;
        Ok(())
    }
}

#[async_trait]
impl TaskBoard for InMemoryTaskBoard {
    async fn publish(&self, tasks: Vec<SwarmTask>) -> Result<()> {
        for task in tasks {
            self.tasks.insert(task.id.clone(), task);
        }
        Ok(())
    }

    async fn available(&self) -> Result<Vec<SwarmTask>> {
        let mut available: Vec<SwarmTask> = self
            .tasks
            .iter()
            .filter(|entry| entry.status == TaskStatus::Available)
            .map(|entry| entry.clone())
            .collect();
        // Highest priority first; id as a stable tiebreaker
        available.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then_with(|| a.id.as_str().cmp(b.id.as_str()))
        });
        Ok(available)
    }

    async fn claim(&self, task: &TaskId, agent: &AgentId) -> Result<SwarmTask> {
        let mut entry = self
            .tasks
            .get_mut(task)
            .ok_or_else(|| Error::not_found(task.to_string()))?;
        if entry.status != TaskStatus::Available {
            return Err(Error::invalid_argument(format!(
                "Task {task} already {:?}",
                entry.status
            )));
        }
        entry.status = TaskStatus::Claimed;
        debug!(task = %task, agent = %agent, "Task claimed");
        Ok(entry.clone())
    }

    async fn start(&self, task: &TaskId) -> Result<()> {
        self.transition(task, TaskStatus::Claimed, TaskStatus::InProgress)
    }

    async fn complete(&self, task: &TaskId) -> Result<()> {
        self.transition(task, TaskStatus::InProgress, TaskStatus::Completed)
    }

    async fn fail(&self, task: &TaskId, reason: &str, retryable: bool) -> Result<()> {
        let mut entry = self
            .tasks
            .get_mut(task)
            .ok_or_else(|| Error::not_found(task.to_string()))?;
        if retryable {
            // Back on the board; the failing agent's Blocked pheromone keeps
            // it from re-claiming immediately.
            warn!(task = %task, reason, "Task failed, returned to board");
            entry.status = TaskStatus::Available;
        } else {
            warn!(task = %task, reason, "Task failed terminally");
            entry.status = TaskStatus::Failed;
        }
        Ok(())
    }

    async fn get(&self, task: &TaskId) -> Result<Option<SwarmTask>> {
        Ok(self.tasks.get(task).map(|entry| entry.clone()))
    }

    async fn counts(&self) -> Result<BoardCounts> {
        let mut counts = BoardCounts::default();
        for entry in &self.tasks {
            match entry.status {
                TaskStatus::Available => counts.available += 1,
                TaskStatus::Claimed => counts.claimed += 1,
                TaskStatus::InProgress => counts.in_progress += 1,
                TaskStatus::Blocked => counts.blocked += 1,
                TaskStatus::NeedsReview => counts.needs_review += 1,
                TaskStatus::Completed => counts.completed += 1,
                TaskStatus::Failed => counts.failed += 1,
                TaskStatus::Cancelled => counts.cancelled += 1,
            }
        }
        Ok(counts)
    }
}
