//! Task decomposition.
//!
//! Turns a high-level work description plus the affected nodes into
//! dependency-ordered atomic tasks: one task per file, impact-adjusted
//! priorities, a dependency DAG derived from impact blast radii, and a
//! topological execution order.

use std::collections::{BTreeMap, HashMap, HashSet};

use cgx_domain::entities::{CodeNode, SwarmTask, TaskKind, TaskPriority, TaskStatus};
use cgx_domain::value_objects::{NodeId, TaskId};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::analysis::RiskLevel;

/// Keyword → task-kind table; first match wins.
const KIND_PATTERNS: &[(&str, TaskKind)] = &[
    ("rename", TaskKind::Refactor),
    ("document", TaskKind::Document),
    ("migrate", TaskKind::Refactor),
    ("deprecate", TaskKind::Refactor),
    ("fix", TaskKind::Fix),
    ("test", TaskKind::Test),
];

/// Per-node impact summary consumed by decomposition (produced by the
/// impact engine).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeImpactInfo {
    /// Risk level of modifying the node
    pub risk: RiskLevel,
    /// Files that depend on the node
    pub affected_files: Vec<String>,
}

/// Overall effort estimate for a decomposition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    /// Few tasks, no elevated impact
    Low,
    /// Several tasks or elevated impact
    Medium,
    /// Many tasks, critical impact, or deep dependency fan-in
    High,
}

/// Everything `decompose` produces.
#[derive(Debug, Clone)]
pub struct DecompositionResult {
    /// The atomic tasks, in file order
    pub tasks: Vec<SwarmTask>,
    /// Dependency-respecting execution order
    pub execution_order: Vec<TaskId>,
    /// Tasks with no dependencies (can start immediately, in parallel)
    pub parallelizable: Vec<TaskId>,
    /// Tasks that must wait on others
    pub sequential: Vec<TaskId>,
    /// Effort estimate
    pub estimated_complexity: Complexity,
}

/// Infer the task kind from the description by keyword match.
fn infer_kind(description: &str) -> TaskKind {
    let lowered = description.to_lowercase();
    KIND_PATTERNS
        .iter()
        .find(|(keyword, _)| lowered.contains(keyword))
        .map_or(TaskKind::Implement, |(_, kind)| *kind)
}

/// Decompose `description` over `affected_nodes` into dependency-ordered
/// atomic tasks, one per file.
#[must_use]
pub fn decompose(
    description: &str,
    affected_nodes: &[CodeNode],
    impact: &HashMap<NodeId, NodeImpactInfo>,
    base_priority: TaskPriority,
) -> DecompositionResult {
    let kind = infer_kind(description);

    // Group nodes by file; BTreeMap keeps task creation deterministic.
    let mut by_file: BTreeMap<String, Vec<&CodeNode>> = BTreeMap::new();
    for node in affected_nodes {
        by_file.entry(node.file_path.clone()).or_default().push(node);
    }

    let mut tasks: Vec<SwarmTask> = Vec::with_capacity(by_file.len());
    for (file_path, nodes) in by_file {
        let impact_level = nodes
            .iter()
            .filter_map(|node| impact.get(&node.id))
            .map(|info| info.risk)
            .max()
            .unwrap_or(RiskLevel::Low);

        let priority = match impact_level {
            RiskLevel::Critical => base_priority.bumped(2, TaskPriority::Critical),
            RiskLevel::High => base_priority.bumped(1, TaskPriority::High),
            RiskLevel::Medium | RiskLevel::Low => base_priority,
        };

        tasks.push(SwarmTask {
            id: TaskId::generate(),
            title: format!("{description} — {file_path}"),
            description: description.to_owned(),
            kind,
            priority,
            node_ids: nodes.iter().map(|node| node.id.clone()).collect(),
            file_path,
            dependencies: Vec::new(),
            status: TaskStatus::Available,
        });
    }

    // Task T depends on task U iff some node in T has U's file in its
    // impact blast radius.
    let file_to_task: HashMap<&str, &TaskId> = tasks
        .iter()
        .map(|task| (task.file_path.as_str(), &task.id))
        .collect();
    let mut dependencies: Vec<Vec<TaskId>> = vec![Vec::new(); tasks.len()];
    for (index, task) in tasks.iter().enumerate() {
        let mut wanted: HashSet<TaskId> = HashSet::new();
        for node_id in &task.node_ids {
            if let Some(info) = impact.get(node_id) {
                for affected in &info.affected_files {
                    if let Some(other) = file_to_task.get(affected.as_str()) {
                        if **other != task.id {
                            wanted.insert((*other).clone());
                        }
                    }
                }
            }
        }
        let mut ordered: Vec<TaskId> = wanted.into_iter().collect();
        ordered.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        dependencies[index] = ordered;
    }
    for (task, deps) in tasks.iter_mut().zip(dependencies) {
        task.dependencies = deps;
    }

    let execution_order = topological_order(&tasks);

    let (parallelizable, sequential): (Vec<TaskId>, Vec<TaskId>) = {
        let mut parallel = Vec::new();
        let mut serial = Vec::new();
        for task in &tasks {
            if task.dependencies.is_empty() {
                parallel.push(task.id.clone());
            } else {
                serial.push(task.id.clone());
            }
        }
        (parallel, serial)
    };

    let estimated_complexity = estimate_complexity(&tasks);

    DecompositionResult {
        tasks,
        execution_order,
        parallelizable,
        sequential,
        estimated_complexity,
    }
}

/// DFS topological sort, dependencies first. Cycles are broken by visiting
/// each task once and continuing: the tasks in a cycle may run in either
/// order, which is logged and tolerated.
fn topological_order(tasks: &[SwarmTask]) -> Vec<TaskId> {
    let index_of: HashMap<&TaskId, usize> =
        tasks.iter().enumerate().map(|(i, t)| (&t.id, i)).collect();
    let mut visited = vec![false; tasks.len()];
    let mut in_stack = vec![false; tasks.len()];
    let mut order: Vec<TaskId> = Vec::with_capacity(tasks.len());

    fn visit(
        index: usize,
        tasks: &[SwarmTask],
        index_of: &HashMap<&TaskId, usize>,
        visited: &mut [bool],
        in_stack: &mut [bool],
        order: &mut Vec<TaskId>,
    ) {
        if visited[index] {
            return;
        }
        visited[index] = true;
        in_stack[index] = true;
        for dependency in &tasks[index].dependencies {
            if let Some(&dep_index) = index_of.get(dependency) {
                if in_stack[dep_index] {
                    warn!(
                        task = %tasks[index].id,
                        dependency = %dependency,
                        "Dependency cycle detected; continuing with partial order"
                    );
                    continue;
                }
                visit(dep_index, tasks, index_of, visited, in_stack, order);
            }
        }
        in_stack[index] = false;
        order.push(tasks[index].id.clone());
    }

    for index in 0..tasks.len() {
        visit(index, tasks, &index_of, &mut visited, &mut in_stack, &mut order);
    }
    order
}

fn estimate_complexity(tasks: &[SwarmTask]) -> Complexity {
    let critical = tasks
        .iter()
        .filter(|t| t.priority == TaskPriority::Critical)
        .count();
    let high = tasks
        .iter()
        .filter(|t| t.priority == TaskPriority::High)
        .count();
    let max_fan_in = tasks.iter().map(|t| t.dependencies.len()).max().unwrap_or(0);

    if tasks.len() > 10 || critical > 2 || max_fan_in > 3 {
        Complexity::High
    } else if tasks.len() > 3 || high > 0 || critical > 0 || max_fan_in > 1 {
        Complexity::Medium
    } else {
        Complexity::Low
    }
}

/// Tasks not yet completed whose every dependency is in `completed`.
#[must_use]
pub fn parallelizable_tasks(all: &[SwarmTask], completed: &HashSet<TaskId>) -> Vec<SwarmTask> {
    all.iter()
        .filter(|task| !completed.contains(&task.id))
        .filter(|task| task.dependencies.iter().all(|dep| completed.contains(dep)))
        .cloned()
        .collect()
}
