//! Analysis engines over a freshly parsed graph.

use std::sync::Arc;

use cgx::prelude::*;
use cgx_application::analysis::{Confidence, TraversalOptions as Traversal};
use cgx_application::parse::ProgressUpdate;

use crate::support::{SyntheticParserFactory, sample_project};

async fn parsed_fixture() -> (Arc<InMemoryGraphStore>, ProjectId, crate::support::Fixture) {
    let fixture = sample_project();
    let store = Arc::new(InMemoryGraphStore::new());
    let coordinator = ParseCoordinator::new(
        Arc::clone(&store) as Arc<dyn GraphStore>,
        Arc::new(SyntheticParserFactory),
        ParseCoordinatorConfig::default(),
    );
    let quiet: Arc<dyn Fn(ProgressUpdate) + Send + Sync> = Arc::new(|_| {});
    coordinator
        .parse_project(
            &ParseRequest {
                project_root: fixture.root.clone(),
                project_name: Some("sample".to_owned()),
                project_type: None,
                ts_config_path: None,
            },
            quiet,
        )
        .await
        .expect("parse");
    let project_id = ProjectId::from_root_path(&fixture.root);
    (store, project_id, fixture)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn impact_analysis_sees_the_parsed_dependents() {
    let (store, project_id, _fixture) = parsed_fixture().await;
    let engine = ImpactEngine::new(3, None);

    let analysis = engine
        .analyze(
            store.as_ref(),
            &ImpactTarget::Node(NodeId::new(format!("{project_id}:service"))),
        )
        .await
        .expect("analysis");

    assert_eq!(analysis.direct_dependents.len(), 1);
    assert_eq!(analysis.direct_dependents[0].name, "api");
    assert_eq!(analysis.direct_dependents[0].relationship_type, "CALLS");
    // One 0.75-weight caller: 0.15 fan-out + 0.225 severity ≈ 0.38
    assert!(analysis.score > 0.0);
    assert_eq!(analysis.level, RiskLevel::Medium);
    assert!(
        analysis.critical_paths[0].contains("api (Function) -[CALLS]-> service (Function)"),
        "got {:?}",
        analysis.critical_paths
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn file_mode_impact_aggregates_the_file_entities() {
    let (store, project_id, _fixture) = parsed_fixture().await;
    let engine = ImpactEngine::new(3, None);

    let analysis = engine
        .analyze(
            store.as_ref(),
            &ImpactTarget::File {
                project: project_id,
                path: "src/util.ts".to_owned(),
            },
        )
        .await
        .expect("analysis");
    assert_eq!(analysis.direct_dependents.len(), 1);
    assert_eq!(analysis.direct_dependents[0].name, "service");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn dead_code_flags_the_orphan_with_high_confidence() {
    let (store, project_id, _fixture) = parsed_fixture().await;
    let engine = DeadCodeEngine::new();

    let report = engine
        .detect(store.as_ref(), &project_id, &DeadCodeOptions::default())
        .await
        .expect("report");

    let items = report.items.as_ref().expect("items");
    let orphan = items
        .iter()
        .find(|item| item.name == "orphan")
        .expect("orphan flagged");
    assert_eq!(orphan.confidence, Confidence::High);
    assert!(orphan.reason.contains("never imported"));

    // api has no importers either, but service and util are referenced
    assert!(!items.iter().any(|item| item.name == "util"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn traversal_walks_the_call_and_import_chain() {
    let (store, project_id, _fixture) = parsed_fixture().await;
    let engine = TraversalEngine;

    let report = engine
        .traverse_from_node(
            store.as_ref(),
            &NodeId::new(format!("{project_id}:api")),
            &Traversal::default(),
        )
        .await
        .expect("traverse");

    // api -> service (CALLS) -> util (IMPORTS)
    assert_eq!(report.total_connections, 2);
    assert_eq!(report.max_depth_reached, 2);
    assert_eq!(report.layers[0].groups[0].chain, "CALLS");
    assert_eq!(report.layers[1].groups[0].chain, "CALLS -> IMPORTS");
    assert!(report.rendered.contains("Summary: 2 connections"));
}
