//! Swarm coordination end-to-end: decompose, publish, drain with two
//! workers.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use cgx::prelude::*;
use cgx_application::analysis::RiskLevel;
use cgx_application::swarm::NodeImpactInfo;
use cgx_domain::entities::CodeNode;
use cgx_domain::ports::swarm::ExecutionReport;

struct RecordingExecutor {
    executed: AtomicUsize,
}

#[async_trait]
impl TaskExecutor for RecordingExecutor {
    async fn execute(&self, task: &SwarmTask) -> cgx::domain::Result<ExecutionReport> {
        self.executed.fetch_add(1, Ordering::SeqCst);
        Ok(ExecutionReport {
            summary: format!("patched {}", task.file_path),
            detail: None,
        })
    }
}

fn node(id: &str, file: &str) -> CodeNode {
    CodeNode {
        id: NodeId::from(id),
        name: id.to_owned(),
        labels: Vec::new(),
        core_type: "Function".to_owned(),
        semantic_type: None,
        file_path: file.to_owned(),
        line_number: None,
        source_code: None,
        visibility: None,
        is_exported: true,
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn decomposed_work_is_drained_by_a_two_agent_swarm() {
    let nodes = vec![
        node("auth", "src/auth.ts"),
        node("session", "src/session.ts"),
        node("tokens", "src/tokens.ts"),
    ];
    let impacts: HashMap<NodeId, NodeImpactInfo> = [(
        NodeId::from("auth"),
        NodeImpactInfo {
            risk: RiskLevel::High,
            affected_files: vec![],
        },
    )]
    .into_iter()
    .collect();

    let decomposition =
        cgx_application::swarm::decompose("Fix the token refresh bug", &nodes, &impacts, TaskPriority::Normal);
    assert_eq!(decomposition.tasks.len(), 3);
    assert!(
        decomposition
            .tasks
            .iter()
            .all(|task| task.kind == TaskKind::Fix)
    );
    assert_eq!(decomposition.parallelizable.len(), 3, "no dependencies here");

    let pheromones = Arc::new(InMemoryPheromoneStore::default());
    let board = Arc::new(InMemoryTaskBoard::new());
    board
        .publish(decomposition.tasks.clone())
        .await
        .expect("publish");

    let executor = Arc::new(RecordingExecutor {
        executed: AtomicUsize::new(0),
    });

    let worker = |name: &str| {
        SwarmWorker::new(
            AgentId::from(name),
            SwarmId::from("swarm-integration"),
            Arc::clone(&pheromones) as Arc<dyn PheromoneStore>,
            Arc::clone(&board) as Arc<dyn TaskBoard>,
            Arc::clone(&executor) as Arc<dyn TaskExecutor>,
            SwarmWorkerConfig {
                monitor_interval: std::time::Duration::from_millis(5),
            },
        )
    };
    let first = worker("agent-1");
    let second = worker("agent-2");

    let (summary_one, summary_two) = tokio::join!(first.run(), second.run());
    let summary_one = summary_one.expect("agent-1");
    let summary_two = summary_two.expect("agent-2");

    assert_eq!(summary_one.executed + summary_two.executed, 3);
    assert_eq!(executor.executed.load(Ordering::SeqCst), 3);

    let counts = board.counts().await.expect("counts");
    assert!(counts.is_drained());
    assert_eq!(counts.completed, 3);

    // Every task's first node carries a completed marker from whoever ran it
    for task in &decomposition.tasks {
        let sensed = pheromones
            .sense(&task.node_ids[0], Some(&[PheromoneKind::Completed]), None)
            .await
            .expect("sense");
        assert_eq!(sensed.len(), 1, "task {} left no marker", task.id);
    }
}

#[tokio::test]
async fn workers_respect_dependency_order_via_the_board() {
    // session depends on auth (auth's impact reaches session's file)
    let nodes = vec![node("auth", "src/auth.ts"), node("session", "src/session.ts")];
    let impacts: HashMap<NodeId, NodeImpactInfo> = [(
        NodeId::from("session"),
        NodeImpactInfo {
            risk: RiskLevel::Low,
            affected_files: vec!["src/auth.ts".to_owned()],
        },
    )]
    .into_iter()
    .collect();

    let decomposition =
        cgx_application::swarm::decompose("Implement refresh", &nodes, &impacts, TaskPriority::Normal);
    let auth_task = decomposition
        .tasks
        .iter()
        .find(|t| t.file_path == "src/auth.ts")
        .expect("auth task");
    let session_task = decomposition
        .tasks
        .iter()
        .find(|t| t.file_path == "src/session.ts")
        .expect("session task");
    assert_eq!(session_task.dependencies, vec![auth_task.id.clone()]);

    // The execution order is a valid schedule
    let auth_pos = decomposition
        .execution_order
        .iter()
        .position(|id| *id == auth_task.id)
        .expect("auth in order");
    let session_pos = decomposition
        .execution_order
        .iter()
        .position(|id| *id == session_task.id)
        .expect("session in order");
    assert!(auth_pos < session_pos);
}
