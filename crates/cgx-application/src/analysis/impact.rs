//! Impact analysis engine.
//!
//! Answers "what breaks if I modify this?" with a weighted risk score over
//! direct and transitive dependents. Relationship weights reflect contract
//! strength: inheritance is a hard contract, callers are usually looser.

use std::collections::{HashMap, HashSet};

use cgx_domain::constants::impact as impact_constants;
use cgx_domain::error::{Error, Result};
use cgx_domain::ports::graph_store::{DependentRecord, GraphStore};
use cgx_domain::value_objects::{NodeId, ProjectId};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Risk bucket derived from the bounded score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    /// Score below 0.25
    Low,
    /// Score in [0.25, 0.5)
    Medium,
    /// Score in [0.5, 0.75)
    High,
    /// Score of 0.75 and above
    Critical,
}

impl RiskLevel {
    /// Bucket a bounded score.
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score >= 0.75 {
            Self::Critical
        } else if score >= 0.5 {
            Self::High
        } else if score >= 0.25 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

/// Caller-supplied weight overrides, merged over the defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FrameworkWeights {
    /// Relationship-type weight overrides
    #[serde(default)]
    pub relationship_weights: HashMap<String, f64>,
    /// High-risk relationship set override
    #[serde(default)]
    pub high_risk_relationships: Option<Vec<String>>,
}

/// What to analyse: one node, or every analysable entity in a file.
#[derive(Debug, Clone)]
pub enum ImpactTarget {
    /// A single graph node
    Node(NodeId),
    /// All Class/Function/Interface entities in one file
    File {
        /// Owning project
        project: ProjectId,
        /// Root-relative file path
        path: String,
    },
}

/// One direct dependent with its resolved weight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightedDependent {
    /// Dependent node id
    pub node_id: NodeId,
    /// Dependent name
    pub name: String,
    /// Dependent core type
    pub core_type: String,
    /// Relationship toward the target
    pub relationship_type: String,
    /// Resolved weight of that relationship
    pub weight: f64,
}

/// Full analysis result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImpactAnalysis {
    /// Description of the analysed target
    pub target: String,
    /// Direct dependents, deduplicated by node id
    pub direct_dependents: Vec<WeightedDependent>,
    /// Count of transitive dependents beyond the direct set
    pub transitive_count: usize,
    /// Bounded risk score
    pub score: f64,
    /// Risk bucket
    pub level: RiskLevel,
    /// Up to ten formatted high-weight dependency paths
    pub critical_paths: Vec<String>,
}

/// Pure risk-score computation over pre-resolved inputs. Bounded to [0, 1]
/// and monotonic non-decreasing in both dependent counts.
#[must_use]
pub fn compute_risk_score(
    direct: &[WeightedDependent],
    transitive_count: usize,
    high_risk: &HashSet<String>,
) -> f64 {
    let direct_count = direct.len() as f64;
    let fan_out = (((direct_count + 1.0).log10()) / 2.0).min(0.3);

    let avg_weight = if direct.is_empty() {
        0.0
    } else {
        direct.iter().map(|d| d.weight).sum::<f64>() / direct_count
    };

    let high_risk_hits = direct
        .iter()
        .filter(|d| high_risk.contains(&d.relationship_type))
        .count() as f64;
    let denominator = high_risk.len().max(3) as f64;
    let severity = (high_risk_hits / denominator).min(1.0);

    let depth = (((transitive_count as f64 + 1.0).log10()) / 3.0).min(0.2);

    (fan_out + avg_weight * 0.3 + severity * 0.2 + depth).min(1.0)
}

/// Impact analysis over one graph store.
pub struct ImpactEngine {
    weights: HashMap<String, f64>,
    high_risk: HashSet<String>,
    max_depth: u32,
}

impl ImpactEngine {
    /// Build an engine, merging caller weight overrides over the defaults.
    #[must_use]
    pub fn new(max_depth: u32, framework: Option<&FrameworkWeights>) -> Self {
        let mut weights: HashMap<String, f64> = impact_constants::RELATIONSHIP_WEIGHTS
            .iter()
            .map(|(rel, weight)| ((*rel).to_owned(), *weight))
            .collect();
        let mut high_risk: HashSet<String> = impact_constants::HIGH_RISK_RELATIONSHIPS
            .iter()
            .map(|rel| (*rel).to_owned())
            .collect();
        if let Some(framework) = framework {
            for (rel, weight) in &framework.relationship_weights {
                weights.insert(rel.clone(), *weight);
            }
            if let Some(overridden) = &framework.high_risk_relationships {
                high_risk = overridden.iter().cloned().collect();
            }
        }
        Self {
            weights,
            high_risk,
            max_depth: max_depth.max(1),
        }
    }

    fn weight_of(&self, relationship: &str) -> f64 {
        self.weights
            .get(relationship)
            .copied()
            .unwrap_or(impact_constants::UNKNOWN_RELATIONSHIP_WEIGHT)
    }

    fn weigh(&self, record: &DependentRecord) -> WeightedDependent {
        WeightedDependent {
            node_id: record.node_id.clone(),
            name: record.name.clone(),
            core_type: record.core_type.clone(),
            relationship_type: record.relationship_type.clone(),
            weight: self.weight_of(&record.relationship_type),
        }
    }

    /// Analyse a node or a whole file.
    ///
    /// # Errors
    ///
    /// Fails with a not-found error when the target node does not exist or
    /// the file contains no analysable entities.
    pub async fn analyze(
        &self,
        store: &dyn GraphStore,
        target: &ImpactTarget,
    ) -> Result<ImpactAnalysis> {
        match target {
            ImpactTarget::Node(node_id) => self.analyze_nodes(store, node_id.to_string(), vec![node_id.clone()]).await,
            ImpactTarget::File { project, path } => {
                let entities: Vec<NodeId> = store
                    .nodes_in_file(project, path)
                    .await?
                    .into_iter()
                    .filter(|node| {
                        matches!(node.core_type.as_str(), "Class" | "Function" | "Interface")
                    })
                    .map(|node| node.id)
                    .collect();
                if entities.is_empty() {
                    return Err(Error::not_found(format!(
                        "no analysable entities in {path}"
                    )));
                }
                self.analyze_nodes(store, path.clone(), entities).await
            }
        }
    }

    /// Shared core for node- and file-mode analysis. Dependents are
    /// deduplicated by id, retaining the maximum weight per duplicate;
    /// transitive dependents are unioned across entities and exclude the
    /// direct set.
    async fn analyze_nodes(
        &self,
        store: &dyn GraphStore,
        target_label: String,
        entities: Vec<NodeId>,
    ) -> Result<ImpactAnalysis> {
        let mut direct_by_id: HashMap<NodeId, WeightedDependent> = HashMap::new();
        let mut critical_paths: Vec<(f64, String)> = Vec::new();

        for entity in &entities {
            let Some(target_node) = store.get_node(entity).await? else {
                if entities.len() == 1 {
                    return Err(Error::not_found(format!("node {entity}")));
                }
                continue;
            };
            for record in store.direct_dependents(entity).await? {
                let weighted = self.weigh(&record);
                if weighted.weight >= impact_constants::CRITICAL_PATH_WEIGHT {
                    critical_paths.push((
                        weighted.weight,
                        format!(
                            "{} ({}) -[{}]-> {} ({})",
                            weighted.name,
                            weighted.core_type,
                            weighted.relationship_type,
                            target_node.name,
                            target_node.core_type
                        ),
                    ));
                }
                direct_by_id
                    .entry(weighted.node_id.clone())
                    .and_modify(|existing| {
                        if weighted.weight > existing.weight {
                            *existing = weighted.clone();
                        }
                    })
                    .or_insert(weighted);
            }
        }

        let entity_set: HashSet<&NodeId> = entities.iter().collect();
        let direct_ids: HashSet<NodeId> = direct_by_id.keys().cloned().collect();
        let mut transitive_ids: HashSet<NodeId> = HashSet::new();
        for entity in &entities {
            for record in store.transitive_dependents(entity, self.max_depth).await? {
                if !direct_ids.contains(&record.node_id) && !entity_set.contains(&record.node_id) {
                    transitive_ids.insert(record.node_id);
                }
            }
        }

        let mut direct: Vec<WeightedDependent> = direct_by_id.into_values().collect();
        direct.sort_by(|a, b| {
            b.weight
                .partial_cmp(&a.weight)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.node_id.as_str().cmp(b.node_id.as_str()))
        });

        let score = compute_risk_score(&direct, transitive_ids.len(), &self.high_risk);
        let level = RiskLevel::from_score(score);
        debug!(target = %target_label, score, ?level, direct = direct.len(), transitive = transitive_ids.len(), "Impact analysed");

        critical_paths.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        let critical_paths = critical_paths
            .into_iter()
            .take(impact_constants::MAX_CRITICAL_PATHS)
            .map(|(_, path)| path)
            .collect();

        Ok(ImpactAnalysis {
            target: target_label,
            direct_dependents: direct,
            transitive_count: transitive_ids.len(),
            score,
            level,
            critical_paths,
        })
    }
}
