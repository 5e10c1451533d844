//! Parse coordinator.
//!
//! Orchestrates the full pipeline: project lifecycle in the store, file
//! discovery, chunking, the worker-pool or streaming path, pipelined import,
//! and the post-chunk resolution steps. The coordinator owns the merge
//! parser; workers hold no shared state and everything they emit is merged
//! here.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use cgx_domain::constants::parse as parse_constants;
use cgx_domain::entities::{ParseOutcome, ParsePhase, Project, ProjectStatus};
use cgx_domain::error::Result;
use cgx_domain::ports::graph_store::GraphStore;
use cgx_domain::ports::parser::{AstParser, AstParserFactory, ParserOptions};
use cgx_domain::utils::path::{canonicalize, root_relative};
use cgx_domain::value_objects::ProjectId;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::change_detection::{ChangeDetector, ChangeDetectorConfig, ChangeSet, snapshot_file};
use super::pool::{PoolConfig, WorkerPool};
use super::scratch::ScratchFile;
use super::streaming::stream_import;
use super::chunk_files;

/// Coordinator tuning.
#[derive(Debug, Clone)]
pub struct ParseCoordinatorConfig {
    /// Files per chunk
    pub chunk_size: usize,
    /// Minimum file count for the worker-pool path
    pub parallel_threshold: usize,
    /// Worker count override for the pool
    pub worker_count: Option<usize>,
    /// Worker shutdown join timeout
    pub join_timeout: Duration,
    /// Directory for pipelined-import scratch files
    pub scratch_dir: PathBuf,
    /// File-selection settings for change detection
    pub detector: ChangeDetectorConfig,
}

impl Default for ParseCoordinatorConfig {
    fn default() -> Self {
        Self {
            chunk_size: parse_constants::CHUNK_SIZE,
            parallel_threshold: parse_constants::PARALLEL_THRESHOLD,
            worker_count: None,
            join_timeout: Duration::from_secs(parse_constants::WORKER_JOIN_TIMEOUT_SECS),
            scratch_dir: std::env::temp_dir(),
            detector: ChangeDetectorConfig::default(),
        }
    }
}

/// One parse request.
#[derive(Debug, Clone)]
pub struct ParseRequest {
    /// Project root directory
    pub project_root: PathBuf,
    /// Friendly name override (defaults to the directory basename)
    pub project_name: Option<String>,
    /// Framework type, when known (loads framework schemas)
    pub project_type: Option<String>,
    /// Compiler-config path handed to the parser
    pub ts_config_path: Option<PathBuf>,
}

/// Progress emitted at every phase transition and chunk completion.
#[derive(Debug, Clone)]
pub struct ProgressUpdate {
    /// Pipeline phase
    pub phase: ParsePhase,
    /// Units done within the phase
    pub current: u64,
    /// Units total within the phase (0 when unknown)
    pub total: u64,
    /// Human-readable detail
    pub details: String,
}

/// Progress callback shared across the pipeline.
pub type ProgressFn = Arc<dyn Fn(ProgressUpdate) + Send + Sync>;

#[derive(Default)]
struct ImportCounters {
    files: AtomicU64,
    nodes: AtomicU64,
    edges: AtomicU64,
}

impl ImportCounters {
    fn record(&self, files: u64, nodes: u64, edges: u64) {
        self.files.fetch_add(files, Ordering::Relaxed);
        self.nodes.fetch_add(nodes, Ordering::Relaxed);
        self.edges.fetch_add(edges, Ordering::Relaxed);
    }

    fn add_edges(&self, edges: u64) {
        self.edges.fetch_add(edges, Ordering::Relaxed);
    }

    fn snapshot(&self) -> (u64, u64, u64) {
        (
            self.files.load(Ordering::Relaxed),
            self.nodes.load(Ordering::Relaxed),
            self.edges.load(Ordering::Relaxed),
        )
    }
}

/// Orchestrates parse operations against one store and parser factory.
pub struct ParseCoordinator {
    store: Arc<dyn GraphStore>,
    factory: Arc<dyn AstParserFactory>,
    config: ParseCoordinatorConfig,
}

impl ParseCoordinator {
    /// Create a coordinator.
    #[must_use]
    pub fn new(
        store: Arc<dyn GraphStore>,
        factory: Arc<dyn AstParserFactory>,
        config: ParseCoordinatorConfig,
    ) -> Self {
        Self {
            store,
            factory,
            config,
        }
    }

    /// Full parse: clears existing graph data for the project, then parses
    /// every source file the parser discovers.
    ///
    /// # Errors
    ///
    /// Any failure updates the project status to `Failed` before
    /// propagating.
    pub async fn parse_project(
        &self,
        request: &ParseRequest,
        progress: ProgressFn,
    ) -> Result<ParseOutcome> {
        self.run(request, progress, true).await
    }

    /// Incremental refresh: re-parses only files whose (mtime, size, hash)
    /// changed, drops subgraphs of deleted files, and leaves unchanged
    /// files untouched.
    ///
    /// # Errors
    ///
    /// Any failure updates the project status to `Failed` before
    /// propagating.
    pub async fn refresh_project(
        &self,
        request: &ParseRequest,
        progress: ProgressFn,
    ) -> Result<ParseOutcome> {
        self.run(request, progress, false).await
    }

    async fn run(
        &self,
        request: &ParseRequest,
        progress: ProgressFn,
        full: bool,
    ) -> Result<ParseOutcome> {
        let started = Instant::now();
        let canonical_root = canonicalize(&request.project_root)?;
        let project_id = ProjectId::from_root_path(&canonical_root);
        let name = request.project_name.clone().unwrap_or_else(|| {
            canonical_root
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| project_id.to_string())
        });

        let parsing_record = Project::parsing(
            project_id.clone(),
            name.clone(),
            canonical_root.to_string_lossy().into_owned(),
        );
        if full {
            self.store.clear_project(&project_id).await?;
            self.store.upsert_project(&parsing_record).await?;
        } else {
            // Refresh keeps the existing record (and its counts); only the
            // status flips to parsing. A never-parsed project is created.
            match self
                .store
                .update_project_status(&project_id, ProjectStatus::Parsing, None, None)
                .await
            {
                Ok(()) => {}
                Err(e) if e.is_not_found() => {
                    self.store.upsert_project(&parsing_record).await?;
                }
                Err(e) => return Err(e),
            }
        }
        info!(project = %project_id, name, full, "Parse started");

        match self
            .run_pipeline(request, &canonical_root, &project_id, &progress, full)
            .await
        {
            Ok(mut outcome) => {
                outcome.duration_ms = started.elapsed().as_millis() as u64;
                self.store
                    .update_project_status(
                        &project_id,
                        ProjectStatus::Complete,
                        full.then_some(outcome.nodes_imported),
                        full.then_some(outcome.edges_imported),
                    )
                    .await?;
                progress(ProgressUpdate {
                    phase: ParsePhase::Complete,
                    current: outcome.files_processed,
                    total: outcome.files_processed,
                    details: format!(
                        "{} nodes, {} edges in {}ms",
                        outcome.nodes_imported, outcome.edges_imported, outcome.duration_ms
                    ),
                });
                info!(project = %project_id, nodes = outcome.nodes_imported, edges = outcome.edges_imported, "Parse complete");
                Ok(outcome)
            }
            Err(e) => {
                // The failed status must land before the error propagates;
                // a secondary store failure is logged, not surfaced.
                if let Err(status_err) = self
                    .store
                    .update_project_status(&project_id, ProjectStatus::Failed, None, None)
                    .await
                {
                    error!(project = %project_id, error = %status_err, "Failed to record failed parse status");
                }
                error!(project = %project_id, error = %e, "Parse failed");
                Err(e)
            }
        }
    }

    async fn run_pipeline(
        &self,
        request: &ParseRequest,
        canonical_root: &Path,
        project_id: &ProjectId,
        progress: &ProgressFn,
        full: bool,
    ) -> Result<ParseOutcome> {
        progress(ProgressUpdate {
            phase: ParsePhase::Discovery,
            current: 0,
            total: 0,
            details: "discovering source files".to_owned(),
        });

        let options = ParserOptions {
            workspace_path: canonical_root.to_path_buf(),
            ts_config_path: request.ts_config_path.clone(),
            project_type: request.project_type.clone(),
            project_id: project_id.clone(),
            lazy_load: true,
        };
        let merge_parser: Arc<Mutex<Box<dyn AstParser>>> =
            Arc::new(Mutex::new(self.factory.create(&options)?));
        if let Some(project_type) = &request.project_type {
            merge_parser.lock().await.load_framework_schemas(project_type)?;
        }

        let (files, snapshots) = if full {
            self.discover_full(canonical_root, &merge_parser).await?
        } else {
            self.discover_incremental(canonical_root, project_id, &merge_parser)
                .await?
        };
        let total_files = files.len() as u64;
        progress(ProgressUpdate {
            phase: ParsePhase::Discovery,
            current: total_files,
            total: total_files,
            details: format!("{total_files} files to parse"),
        });

        let counters = Arc::new(ImportCounters::default());
        if !files.is_empty() {
            let chunks = chunk_files(files, self.config.chunk_size);
            progress(ProgressUpdate {
                phase: ParsePhase::Parsing,
                current: 0,
                total: chunks.len() as u64,
                details: format!("{} chunks", chunks.len()),
            });

            if total_files >= self.config.parallel_threshold as u64 {
                self.pooled_import(chunks, &options, &merge_parser, project_id, progress, &counters)
                    .await?;
            } else {
                let mut parser = merge_parser.lock().await;
                let totals = stream_import(
                    self.store.as_ref(),
                    parser.as_mut(),
                    project_id,
                    chunks,
                    |done, total| {
                        progress(ProgressUpdate {
                            phase: ParsePhase::Importing,
                            current: done,
                            total,
                            details: format!("chunk {done}/{total}"),
                        });
                    },
                )
                .await?;
                counters.record(totals.files_processed, totals.nodes_imported, totals.edges_imported);
            }

            // Deferred edges resolve strictly after every chunk has
            // completed and every per-chunk import callback has settled.
            // The streaming path resolves internally; the pooled path
            // resolves here.
            if total_files >= self.config.parallel_threshold as u64 {
                progress(ProgressUpdate {
                    phase: ParsePhase::Resolving,
                    current: 0,
                    total: 0,
                    details: "resolving deferred edges".to_owned(),
                });
                let (resolved, enhancements) = {
                    let mut parser = merge_parser.lock().await;
                    (parser.resolve_deferred_edges()?, parser.apply_edge_enhancements()?)
                };
                if !resolved.is_empty() {
                    counters.add_edges(self.store.import_edges(project_id, &resolved).await?);
                }
                if !enhancements.is_empty() {
                    counters.add_edges(self.store.import_edges(project_id, &enhancements).await?);
                }
            }
        }

        if !snapshots.is_empty() {
            self.store.upsert_indexed_files(project_id, &snapshots).await?;
        }

        let (files_processed, nodes_imported, edges_imported) = counters.snapshot();
        Ok(ParseOutcome {
            files_processed,
            nodes_imported,
            edges_imported,
            duration_ms: 0,
        })
    }

    /// Full-parse discovery: the parser enumerates the project's source
    /// files, and a snapshot is captured per file for future incremental
    /// runs.
    async fn discover_full(
        &self,
        canonical_root: &Path,
        merge_parser: &Arc<Mutex<Box<dyn AstParser>>>,
    ) -> Result<(Vec<PathBuf>, Vec<cgx_domain::entities::IndexedFile>)> {
        let files = merge_parser.lock().await.discover_source_files()?;
        let mut snapshots = Vec::with_capacity(files.len());
        for file in &files {
            match snapshot_file(canonical_root, file) {
                Ok(snapshot) => snapshots.push(snapshot),
                Err(e) => warn!(file = %file.display(), error = %e, "Skipping snapshot"),
            }
        }
        Ok((files, snapshots))
    }

    /// Incremental discovery: diff against indexed snapshots, drop the
    /// subgraphs of deleted and changed files, and seed the merge parser
    /// with existing nodes so cross-file references into unchanged files
    /// still resolve.
    async fn discover_incremental(
        &self,
        canonical_root: &Path,
        project_id: &ProjectId,
        merge_parser: &Arc<Mutex<Box<dyn AstParser>>>,
    ) -> Result<(Vec<PathBuf>, Vec<cgx_domain::entities::IndexedFile>)> {
        let detector = ChangeDetector::new(self.config.detector.clone())?;
        let ChangeSet {
            files_to_reparse,
            files_to_delete,
            snapshots,
            unchanged,
        } = detector
            .detect(canonical_root, project_id, self.store.as_ref())
            .await?;
        info!(
            reparse = files_to_reparse.len(),
            delete = files_to_delete.len(),
            unchanged,
            "Incremental change set"
        );

        let mut doomed = files_to_delete;
        for file in &files_to_reparse {
            if let Ok(relative) = root_relative(file, canonical_root) {
                doomed.push(relative);
            }
        }
        if !doomed.is_empty() {
            self.store.delete_file_subgraphs(project_id, &doomed).await?;
        }

        let existing = self
            .store
            .existing_nodes_for_edge_detection(project_id)
            .await?;
        if !existing.is_empty() {
            merge_parser.lock().await.add_parsed_nodes(&existing)?;
        }

        Ok((files_to_reparse, snapshots))
    }

    async fn pooled_import(
        &self,
        chunks: Vec<Vec<PathBuf>>,
        options: &ParserOptions,
        merge_parser: &Arc<Mutex<Box<dyn AstParser>>>,
        project_id: &ProjectId,
        progress: &ProgressFn,
        counters: &Arc<ImportCounters>,
    ) -> Result<()> {
        let pool = WorkerPool::new(
            Arc::clone(&self.factory),
            options.clone(),
            PoolConfig {
                worker_count: self.config.worker_count,
                join_timeout: self.config.join_timeout,
            },
        );

        let store = Arc::clone(&self.store);
        let scratch_dir = self.config.scratch_dir.clone();
        let project = project_id.clone();
        let parser = Arc::clone(merge_parser);
        let counters = Arc::clone(counters);
        let progress = Arc::clone(progress);

        pool.process_chunks(chunks, move |completion| {
            let store = Arc::clone(&store);
            let parser = Arc::clone(&parser);
            let counters = Arc::clone(&counters);
            let progress = Arc::clone(&progress);
            let project = project.clone();
            let scratch_dir = scratch_dir.clone();
            async move {
                // Spill, import from the spill, and let the guard remove the
                // file on every path.
                let scratch = ScratchFile::spill(
                    &scratch_dir,
                    parse_constants::TEMP_FILE_PREFIX,
                    &completion.output,
                )?;
                let payload = scratch.load()?;

                let nodes = store.import_nodes(&project, &payload.nodes).await?;
                let edges = store.import_edges(&project, &payload.edges).await?;
                {
                    let mut parser = parser.lock().await;
                    parser.add_parsed_nodes(&payload.nodes)?;
                    parser.merge_shared_context(&payload.shared_context)?;
                    parser.merge_deferred_edges(payload.deferred_edges)?;
                }
                counters.record(payload.files_processed, nodes, edges);
                progress(ProgressUpdate {
                    phase: ParsePhase::Importing,
                    current: completion.stats.chunks_completed as u64,
                    total: completion.stats.chunks_total as u64,
                    details: format!("chunk {}", completion.chunk_index),
                });
                Ok(())
            }
        })
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FailingParserFactory, ScriptedParserFactory};
    use cgx_domain::entities::ParseJobStatus;
    use cgx_infrastructure::{InMemoryGraphStore, InMemoryJobManager};
    use cgx_domain::ports::jobs::JobManager;

    fn write(dir: &Path, relative: &str, content: &str) -> PathBuf {
        let path = dir.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("mkdir");
        }
        std::fs::write(&path, content).expect("write");
        path
    }

    fn no_progress() -> ProgressFn {
        Arc::new(|_update| {})
    }

    struct Fixture {
        _dir: tempfile::TempDir,
        root: PathBuf,
        files: Vec<PathBuf>,
    }

    fn three_file_project() -> Fixture {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = std::fs::canonicalize(dir.path()).expect("canonical");
        let files = vec![
            write(&root, "src/api.ts", "export const api = 1;\n"),
            write(&root, "src/shared.ts", "export const shared = 2;\n"),
            write(&root, "src/util.ts", "export const util = 3;\n"),
        ];
        Fixture {
            _dir: dir,
            root,
            files,
        }
    }

    fn request(root: &Path) -> ParseRequest {
        ParseRequest {
            project_root: root.to_path_buf(),
            project_name: Some("fixture".to_owned()),
            project_type: None,
            ts_config_path: None,
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn full_parse_streams_small_projects_to_completion() {
        let fixture = three_file_project();
        let store = Arc::new(InMemoryGraphStore::new());
        let coordinator = ParseCoordinator::new(
            Arc::clone(&store) as Arc<dyn GraphStore>,
            Arc::new(ScriptedParserFactory::discovering(fixture.files.clone())),
            ParseCoordinatorConfig {
                chunk_size: 2,
                parallel_threshold: 100,
                ..Default::default()
            },
        );

        let outcome = coordinator
            .parse_project(&request(&fixture.root), no_progress())
            .await
            .expect("parse");
        assert_eq!(outcome.files_processed, 3);
        assert_eq!(outcome.nodes_imported, 3);

        let project_id = ProjectId::from_root_path(&fixture.root);
        let project = store
            .get_project(&project_id)
            .await
            .expect("get")
            .expect("present");
        assert_eq!(project.status, ProjectStatus::Complete);
        assert_eq!(project.node_count, 3);

        let snapshots = store.indexed_files(&project_id).await.expect("snapshots");
        assert_eq!(snapshots.len(), 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn full_parse_uses_the_pool_above_the_threshold() {
        let fixture = three_file_project();
        let store = Arc::new(InMemoryGraphStore::new());
        let coordinator = ParseCoordinator::new(
            Arc::clone(&store) as Arc<dyn GraphStore>,
            Arc::new(ScriptedParserFactory::discovering(fixture.files.clone())),
            ParseCoordinatorConfig {
                chunk_size: 1,
                parallel_threshold: 2,
                worker_count: Some(2),
                ..Default::default()
            },
        );

        let phases = Arc::new(std::sync::Mutex::new(Vec::new()));
        let seen = Arc::clone(&phases);
        let progress: ProgressFn = Arc::new(move |update: ProgressUpdate| {
            seen.lock().unwrap_or_else(|e| e.into_inner()).push(update.phase);
        });

        let outcome = coordinator
            .parse_project(&request(&fixture.root), progress)
            .await
            .expect("parse");
        assert_eq!(outcome.files_processed, 3);
        assert_eq!(outcome.nodes_imported, 3);
        // 3 chunk edges + 3 deferred IMPORTS resolved against shared.ts
        assert_eq!(outcome.edges_imported, 6);

        let recorded = phases.lock().unwrap_or_else(|e| e.into_inner());
        assert!(recorded.contains(&ParsePhase::Discovery));
        assert!(recorded.contains(&ParsePhase::Importing));
        assert!(recorded.contains(&ParsePhase::Resolving));
        assert_eq!(recorded.last(), Some(&ParsePhase::Complete));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn refresh_reparses_only_changed_files_and_drops_deleted() {
        let fixture = three_file_project();
        let store = Arc::new(InMemoryGraphStore::new());
        let coordinator = ParseCoordinator::new(
            Arc::clone(&store) as Arc<dyn GraphStore>,
            Arc::new(ScriptedParserFactory::discovering(fixture.files.clone())),
            ParseCoordinatorConfig {
                chunk_size: 2,
                parallel_threshold: 100,
                ..Default::default()
            },
        );
        coordinator
            .parse_project(&request(&fixture.root), no_progress())
            .await
            .expect("initial parse");

        // One file changes, one disappears
        write(&fixture.root, "src/api.ts", "export const api = 99;\n");
        std::fs::remove_file(fixture.root.join("src/util.ts")).expect("remove");

        let outcome = coordinator
            .refresh_project(&request(&fixture.root), no_progress())
            .await
            .expect("refresh");
        assert_eq!(outcome.files_processed, 1, "only the changed file reparses");

        let project_id = ProjectId::from_root_path(&fixture.root);
        let remaining = store
            .nodes_in_file(&project_id, "src/util.ts")
            .await
            .expect("query");
        assert!(remaining.is_empty(), "deleted file subgraph must be gone");
        let kept = store
            .nodes_in_file(&project_id, "src/shared.ts")
            .await
            .expect("query");
        assert!(!kept.is_empty(), "unchanged file subgraph survives");

        let snapshots = store.indexed_files(&project_id).await.expect("snapshots");
        assert_eq!(snapshots.len(), 2, "snapshot for the deleted file is dropped");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn parse_failure_marks_the_project_failed() {
        let fixture = three_file_project();
        let store = Arc::new(InMemoryGraphStore::new());
        let mut factory = FailingParserFactory::failing_on("shared.ts");
        factory.discover(fixture.files.clone());
        let coordinator = ParseCoordinator::new(
            Arc::clone(&store) as Arc<dyn GraphStore>,
            Arc::new(factory),
            ParseCoordinatorConfig {
                chunk_size: 1,
                parallel_threshold: 100,
                ..Default::default()
            },
        );

        let err = coordinator
            .parse_project(&request(&fixture.root), no_progress())
            .await
            .expect_err("must fail");
        assert!(err.to_string().contains("scripted failure"));

        let project = store
            .get_project(&ProjectId::from_root_path(&fixture.root))
            .await
            .expect("get")
            .expect("present");
        assert_eq!(project.status, ProjectStatus::Failed);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn progress_can_drive_a_parse_job() {
        let fixture = three_file_project();
        let store = Arc::new(InMemoryGraphStore::new());
        let jobs = Arc::new(InMemoryJobManager::new(10));
        let coordinator = ParseCoordinator::new(
            Arc::clone(&store) as Arc<dyn GraphStore>,
            Arc::new(ScriptedParserFactory::discovering(fixture.files.clone())),
            ParseCoordinatorConfig::default(),
        );

        let project_id = ProjectId::from_root_path(&fixture.root);
        let job = jobs
            .create_job(project_id, &fixture.root.to_string_lossy())
            .expect("create job");
        jobs.start_job(&job.id).expect("start");

        let job_id = job.id.clone();
        let jobs_for_progress = Arc::clone(&jobs);
        let progress: ProgressFn = Arc::new(move |update: ProgressUpdate| {
            if let Some(mut tracked) = jobs_for_progress.get_job(&job_id) {
                tracked.progress.phase = update.phase;
                tracked.progress.files_processed = update.current;
                let _ = jobs_for_progress.update_progress(&job_id, tracked.progress);
            }
        });

        let outcome = coordinator
            .parse_project(&request(&fixture.root), progress)
            .await
            .expect("parse");
        jobs.complete_job(&job.id, outcome).expect("complete");

        let finished = jobs.get_job(&job.id).expect("job");
        assert_eq!(finished.status, ParseJobStatus::Completed);
        assert_eq!(finished.progress.phase, ParsePhase::Complete);
    }
}
