//! End-to-end parse pipeline tests over the in-memory graph store.

use std::sync::Arc;

use cgx::prelude::*;
use cgx_application::parse::ProgressUpdate;
use cgx_domain::entities::ParsePhase;

use crate::support::{SyntheticParserFactory, sample_project, write};

fn coordinator(
    store: &Arc<InMemoryGraphStore>,
    config: ParseCoordinatorConfig,
) -> ParseCoordinator {
    ParseCoordinator::new(
        Arc::clone(store) as Arc<dyn GraphStore>,
        Arc::new(SyntheticParserFactory),
        config,
    )
}

fn request(fixture: &crate::support::Fixture) -> ParseRequest {
    ParseRequest {
        project_root: fixture.root.clone(),
        project_name: Some("sample".to_owned()),
        project_type: None,
        ts_config_path: None,
    }
}

fn quiet() -> Arc<dyn Fn(ProgressUpdate) + Send + Sync> {
    Arc::new(|_update| {})
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn full_parse_builds_the_graph_and_resolves_deferred_edges() {
    let fixture = sample_project();
    let store = Arc::new(InMemoryGraphStore::new());
    let coordinator = coordinator(&store, ParseCoordinatorConfig::default());

    let outcome = coordinator
        .parse_project(&request(&fixture), quiet())
        .await
        .expect("parse");
    assert_eq!(outcome.files_processed, 4);
    assert_eq!(outcome.nodes_imported, 4);
    // One CALLS edge plus one deferred IMPORTS edge resolved post-chunks
    assert_eq!(outcome.edges_imported, 2);

    let project_id = ProjectId::from_root_path(&fixture.root);
    let project = store
        .get_project(&project_id)
        .await
        .expect("get")
        .expect("present");
    assert_eq!(project.status, ProjectStatus::Complete);
    assert_eq!(project.node_count, 4);
    assert_eq!(project.edge_count, 2);

    // The deferred service -> util IMPORTS edge must exist in the store
    let service = NodeId::new(format!("{project_id}:service"));
    let util_dependents = store
        .direct_dependents(&NodeId::new(format!("{project_id}:util")))
        .await
        .expect("query");
    assert_eq!(util_dependents.len(), 1);
    assert_eq!(util_dependents[0].node_id, service);
    assert_eq!(util_dependents[0].relationship_type, "IMPORTS");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn pool_and_streaming_paths_build_identical_graphs() {
    let fixture = sample_project();
    let project_id = ProjectId::from_root_path(&fixture.root);

    let streaming_store = Arc::new(InMemoryGraphStore::new());
    coordinator(
        &streaming_store,
        ParseCoordinatorConfig {
            parallel_threshold: 100,
            ..Default::default()
        },
    )
    .parse_project(&request(&fixture), quiet())
    .await
    .expect("streaming parse");

    let pooled_store = Arc::new(InMemoryGraphStore::new());
    coordinator(
        &pooled_store,
        ParseCoordinatorConfig {
            parallel_threshold: 1,
            chunk_size: 1,
            worker_count: Some(2),
            ..Default::default()
        },
    )
    .parse_project(&request(&fixture), quiet())
    .await
    .expect("pooled parse");

    let mut streaming_types = streaming_store
        .discover_relationship_types(&project_id)
        .await
        .expect("types");
    let mut pooled_types = pooled_store
        .discover_relationship_types(&project_id)
        .await
        .expect("types");
    streaming_types.sort();
    pooled_types.sort();
    assert_eq!(streaming_types, pooled_types);

    let streaming_project = streaming_store.get_project(&project_id).await.expect("get").expect("p");
    let pooled_project = pooled_store.get_project(&project_id).await.expect("get").expect("p");
    assert_eq!(streaming_project.node_count, pooled_project.node_count);
    assert_eq!(streaming_project.edge_count, pooled_project.edge_count);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn refresh_after_no_changes_parses_nothing() {
    let fixture = sample_project();
    let store = Arc::new(InMemoryGraphStore::new());
    let coordinator = coordinator(&store, ParseCoordinatorConfig::default());

    coordinator
        .parse_project(&request(&fixture), quiet())
        .await
        .expect("initial parse");
    let outcome = coordinator
        .refresh_project(&request(&fixture), quiet())
        .await
        .expect("refresh");

    assert_eq!(outcome.files_processed, 0, "unchanged files never reparse");
    assert_eq!(outcome.nodes_imported, 0);

    let project = store
        .get_project(&ProjectId::from_root_path(&fixture.root))
        .await
        .expect("get")
        .expect("present");
    assert_eq!(project.status, ProjectStatus::Complete);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn refresh_picks_up_new_files() {
    let fixture = sample_project();
    let store = Arc::new(InMemoryGraphStore::new());
    let coordinator = coordinator(&store, ParseCoordinatorConfig::default());
    coordinator
        .parse_project(&request(&fixture), quiet())
        .await
        .expect("initial parse");

    write(&fixture.root, "src/extra.ts", "calls:api\n");
    let outcome = coordinator
        .refresh_project(&request(&fixture), quiet())
        .await
        .expect("refresh");
    assert_eq!(outcome.files_processed, 1);

    let project_id = ProjectId::from_root_path(&fixture.root);
    let extra = store
        .get_node(&NodeId::new(format!("{project_id}:extra")))
        .await
        .expect("query");
    assert!(extra.is_some(), "new file's node lands in the store");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn a_parse_job_tracks_the_pipeline_to_completion() {
    let fixture = sample_project();
    let store = Arc::new(InMemoryGraphStore::new());
    let jobs: Arc<InMemoryJobManager> = Arc::new(InMemoryJobManager::new(10));
    let coordinator = coordinator(&store, ParseCoordinatorConfig::default());

    let project_id = ProjectId::from_root_path(&fixture.root);
    let job = jobs
        .create_job(project_id, &fixture.root.to_string_lossy())
        .expect("create job");
    jobs.start_job(&job.id).expect("start");

    let job_id = job.id.clone();
    let tracker = Arc::clone(&jobs);
    let progress: Arc<dyn Fn(ProgressUpdate) + Send + Sync> = Arc::new(move |update| {
        if let Some(mut tracked) = tracker.get_job(&job_id) {
            tracked.progress.phase = update.phase;
            tracked.progress.files_processed = update.current;
            tracked.progress.files_total = update.total;
            let _ = tracker.update_progress(&job_id, tracked.progress);
        }
    });

    let outcome = coordinator
        .parse_project(&request(&fixture), progress)
        .await
        .expect("parse");
    jobs.complete_job(&job.id, outcome).expect("complete");

    let finished = jobs.get_job(&job.id).expect("job");
    assert_eq!(finished.status, ParseJobStatus::Completed);
    assert_eq!(finished.progress.phase, ParsePhase::Complete);
    assert_eq!(finished.result.expect("result").files_processed, 4);
}
