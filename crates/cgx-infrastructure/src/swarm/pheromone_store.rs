//! In-memory pheromone blackboard.
//!
//! Signals are keyed by graph node. The per-node `DashMap` entry lock makes
//! every operation atomic per (agent, node, kind): a deposit and a sense on
//! the same node serialise, while different nodes proceed concurrently.

use async_trait::async_trait;
use cgx_domain::entities::{Pheromone, PheromoneKind};
use cgx_domain::error::Result;
use cgx_domain::ports::swarm::{PheromoneStore, SensedPheromone};
use cgx_domain::value_objects::{AgentId, NodeId};
use dashmap::DashMap;
use tracing::trace;

/// In-memory [`PheromoneStore`] implementation.
pub struct InMemoryPheromoneStore {
    signals: DashMap<NodeId, Vec<Pheromone>>,
    epsilon: f64,
}

impl InMemoryPheromoneStore {
    /// Create a store with the given negligibility threshold.
    #[must_use]
    pub fn new(epsilon: f64) -> Self {
        Self {
            signals: DashMap::new(),
            epsilon,
        }
    }

    fn now_ms() -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

impl Default for InMemoryPheromoneStore {
    fn default() -> Self {
        Self::new(cgx_domain::constants::swarm::PHEROMONE_EPSILON)
    }
}

#[async_trait]
impl PheromoneStore for InMemoryPheromoneStore {
    async fn deposit(&self, pheromone: Pheromone) -> Result<()> {
        let mut entry = self.signals.entry(pheromone.node_id.clone()).or_default();

        if pheromone.kind.is_workflow() {
            // Workflow states are mutually exclusive per (agent, node):
            // writing one removes any other workflow signal for the pair.
            entry.retain(|existing| {
                !(existing.agent_id == pheromone.agent_id && existing.kind.is_workflow())
            });
        } else {
            entry.retain(|existing| {
                !(existing.agent_id == pheromone.agent_id && existing.kind == pheromone.kind)
            });
        }

        trace!(
            node = %pheromone.node_id,
            agent = %pheromone.agent_id,
            kind = ?pheromone.kind,
            "Pheromone deposited"
        );
        entry.push(pheromone);
        Ok(())
    }

    async fn sense(
        &self,
        node: &NodeId,
        kinds: Option<&[PheromoneKind]>,
        exclude_agent: Option<&AgentId>,
    ) -> Result<Vec<SensedPheromone>> {
        let now = Self::now_ms();
        let Some(entry) = self.signals.get(node) else {
            return Ok(Vec::new());
        };

        let sensed = entry
            .iter()
            .filter(|p| kinds.is_none_or(|ks| ks.contains(&p.kind)))
            .filter(|p| exclude_agent.is_none_or(|agent| &p.agent_id != agent))
            .filter_map(|p| {
                let current_intensity = p.intensity_at(now);
                (current_intensity > self.epsilon).then(|| SensedPheromone {
                    pheromone: p.clone(),
                    current_intensity,
                })
            })
            .collect();
        Ok(sensed)
    }

    async fn remove(&self, node: &NodeId, agent: &AgentId, kind: PheromoneKind) -> Result<()> {
        if let Some(mut entry) = self.signals.get_mut(node) {
            entry.retain(|p| !(&p.agent_id == agent && p.kind == kind));
        }
        Ok(())
    }

    async fn evaporate(&self) -> Result<usize> {
        let now = Self::now_ms();
        let epsilon = self.epsilon;
        let mut removed = 0usize;
        self.signals.retain(|_, pheromones| {
            let before = pheromones.len();
            pheromones.retain(|p| p.intensity_at(now) > epsilon);
            removed += before - pheromones.len();
            !pheromones.is_empty()
        });
        Ok(removed)
    }
}
