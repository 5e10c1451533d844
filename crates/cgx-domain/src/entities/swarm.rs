//! Swarm coordination entities: pheromones and tasks.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::value_objects::{AgentId, NodeId, SwarmId, TaskId};

/// Kind of coordination signal an agent leaves on a graph node.
///
/// Workflow kinds describe what an agent is doing to a node and are mutually
/// exclusive per (agent, node); flag kinds coexist with a workflow kind and
/// with each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PheromoneKind {
    /// Agent is reading the node's neighbourhood
    Exploring,
    /// Agent is editing code behind the node
    Modifying,
    /// Agent reserved the node for upcoming work
    Claiming,
    /// Agent finished work on the node
    Completed,
    /// Persistent caution marker
    Warning,
    /// Agent hit an obstacle; short-lived so retries can happen
    Blocked,
    /// Suggested change awaiting pickup
    Proposal,
    /// Work awaiting a reviewer
    NeedsReview,
    /// Long-lived session context attached to the node
    SessionContext,
}

impl PheromoneKind {
    /// Decay half-life in milliseconds. `None` means the signal never decays.
    #[must_use]
    pub fn half_life_ms(self) -> Option<i64> {
        match self {
            Self::Exploring => Some(2 * 60 * 1000),
            Self::Modifying => Some(10 * 60 * 1000),
            Self::Claiming => Some(60 * 60 * 1000),
            Self::Completed => Some(24 * 60 * 60 * 1000),
            Self::Warning => None,
            Self::Blocked => Some(5 * 60 * 1000),
            Self::Proposal => Some(60 * 60 * 1000),
            Self::NeedsReview => Some(30 * 60 * 1000),
            Self::SessionContext => Some(8 * 60 * 60 * 1000),
        }
    }

    /// Workflow kinds are mutually exclusive per (agent, node).
    #[must_use]
    pub fn is_workflow(self) -> bool {
        matches!(
            self,
            Self::Exploring | Self::Modifying | Self::Claiming | Self::Completed | Self::Blocked
        )
    }
}

/// A time-decayed coordination signal attached to (agent, graph node).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pheromone {
    /// Graph node the signal is attached to
    pub node_id: NodeId,
    /// Agent that deposited the signal
    pub agent_id: AgentId,
    /// Swarm cohort the agent belongs to
    pub swarm_id: SwarmId,
    /// Signal kind
    pub kind: PheromoneKind,
    /// Deposit time (Unix epoch milliseconds)
    pub created_at_ms: i64,
    /// Intensity at deposit time
    pub intensity: f64,
    /// Free-form payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl Pheromone {
    /// Intensity after exponential decay at `now_ms`:
    /// `stored · 0.5^((now − created) / halfLife)`. Kinds without a half-life
    /// never decay.
    #[must_use]
    pub fn intensity_at(&self, now_ms: i64) -> f64 {
        match self.kind.half_life_ms() {
            None => self.intensity,
            Some(half_life) => {
                let elapsed = (now_ms - self.created_at_ms).max(0) as f64;
                self.intensity * 0.5f64.powf(elapsed / half_life as f64)
            }
        }
    }
}

/// What kind of work a swarm task performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    /// Build new behaviour
    Implement,
    /// Restructure without changing behaviour
    Refactor,
    /// Correct a defect
    Fix,
    /// Add or extend tests
    Test,
    /// Review existing work
    Review,
    /// Write documentation
    Document,
    /// Gather information before deciding
    Investigate,
    /// Produce a plan
    Plan,
}

/// Scheduling priority of a swarm task.
///
/// Variants are ordered; comparisons follow the numeric score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    /// Someday/maybe
    Backlog,
    /// Low urgency
    Low,
    /// Default urgency
    Normal,
    /// Elevated urgency
    High,
    /// Drop everything
    Critical,
}

impl TaskPriority {
    /// Numeric score used for ordering on the task board.
    #[must_use]
    pub fn score(self) -> u8 {
        match self {
            Self::Backlog => 0,
            Self::Low => 25,
            Self::Normal => 50,
            Self::High => 75,
            Self::Critical => 100,
        }
    }

    /// Raise the priority by `steps` levels, never exceeding `cap`.
    #[must_use]
    pub fn bumped(self, steps: u8, cap: Self) -> Self {
        let order = [Self::Backlog, Self::Low, Self::Normal, Self::High, Self::Critical];
        let current = order.iter().position(|p| *p == self).unwrap_or(0);
        let target = (current + steps as usize).min(order.len() - 1);
        order[target].min(cap).max(self)
    }
}

/// Lifecycle status of a swarm task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// On the board, unclaimed
    Available,
    /// Reserved by an agent, not yet started
    Claimed,
    /// An agent is executing it
    InProgress,
    /// Cannot proceed until something else changes
    Blocked,
    /// Finished, awaiting review
    NeedsReview,
    /// Done
    Completed,
    /// Terminally failed
    Failed,
    /// Withdrawn
    Cancelled,
}

/// An atomic unit of swarm work over a set of graph nodes in one file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwarmTask {
    /// Task identifier (`task_<timeBase36>_<random6>`)
    pub id: TaskId,
    /// Short imperative title
    pub title: String,
    /// Full description of the work
    pub description: String,
    /// Kind of work
    pub kind: TaskKind,
    /// Scheduling priority
    pub priority: TaskPriority,
    /// Graph nodes the task touches
    pub node_ids: Vec<NodeId>,
    /// File the nodes belong to
    pub file_path: String,
    /// Tasks that must complete before this one starts (acyclic)
    pub dependencies: Vec<TaskId>,
    /// Lifecycle status
    pub status: TaskStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workflow_kinds_are_exactly_the_five_states() {
        let workflow = [
            PheromoneKind::Exploring,
            PheromoneKind::Claiming,
            PheromoneKind::Modifying,
            PheromoneKind::Completed,
            PheromoneKind::Blocked,
        ];
        let flags = [
            PheromoneKind::Warning,
            PheromoneKind::Proposal,
            PheromoneKind::NeedsReview,
            PheromoneKind::SessionContext,
        ];
        assert!(workflow.iter().all(|k| k.is_workflow()));
        assert!(flags.iter().all(|k| !k.is_workflow()));
    }

    #[test]
    fn intensity_halves_after_one_half_life() {
        let pheromone = Pheromone {
            node_id: NodeId::from("n1"),
            agent_id: AgentId::from("a1"),
            swarm_id: SwarmId::from("s1"),
            kind: PheromoneKind::Modifying,
            created_at_ms: 0,
            intensity: 1.0,
            data: None,
        };
        let half_life = PheromoneKind::Modifying.half_life_ms().expect("decays");
        let decayed = pheromone.intensity_at(half_life);
        assert!((decayed - 0.5).abs() < 1e-9);
        let two_lives = pheromone.intensity_at(2 * half_life);
        assert!((two_lives - 0.25).abs() < 1e-9);
    }

    #[test]
    fn warning_never_decays() {
        let pheromone = Pheromone {
            node_id: NodeId::from("n1"),
            agent_id: AgentId::from("a1"),
            swarm_id: SwarmId::from("s1"),
            kind: PheromoneKind::Warning,
            created_at_ms: 0,
            intensity: 0.8,
            data: None,
        };
        assert!((pheromone.intensity_at(365 * 24 * 60 * 60 * 1000) - 0.8).abs() < f64::EPSILON);
    }

    #[test]
    fn priority_bumps_respect_caps() {
        assert_eq!(TaskPriority::Normal.bumped(2, TaskPriority::Critical), TaskPriority::Critical);
        assert_eq!(TaskPriority::Normal.bumped(1, TaskPriority::High), TaskPriority::High);
        assert_eq!(TaskPriority::High.bumped(1, TaskPriority::High), TaskPriority::High);
        // A bump never lowers an already-higher priority
        assert_eq!(TaskPriority::Critical.bumped(1, TaskPriority::High), TaskPriority::Critical);
        assert_eq!(TaskPriority::Backlog.bumped(2, TaskPriority::Critical), TaskPriority::Normal);
    }

    #[test]
    fn priority_scores_match_board_ordering() {
        assert!(TaskPriority::Critical > TaskPriority::High);
        assert_eq!(TaskPriority::Critical.score(), 100);
        assert_eq!(TaskPriority::Backlog.score(), 0);
    }
}
