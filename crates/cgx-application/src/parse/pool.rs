//! Parallel worker pool with pipelined completion callbacks.
//!
//! Pull-based dispatch: each worker signals `Ready`, the pool dequeues the
//! next chunk in FIFO order and sends it. Results complete out of order; the
//! pool forwards each completion to an asynchronous callback and resolves
//! only after every callback has settled. A worker error rejects the whole
//! operation and initiates shutdown.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};

use cgx_domain::constants::parse;
use cgx_domain::error::{Error, Result};
use cgx_domain::ports::parser::{AstParserFactory, ChunkParseOutput, ParserOptions};
use tracing::{debug, warn};

use super::messages::{WorkerCommand, WorkerEvent};
use super::worker::WorkerHandle;

/// Pool sizing and shutdown settings.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Worker count override; `None` sizes from available CPUs
    pub worker_count: Option<usize>,
    /// How long to wait for workers to exit after `Terminate`
    pub join_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            worker_count: None,
            join_timeout: Duration::from_secs(parse::WORKER_JOIN_TIMEOUT_SECS),
        }
    }
}

/// Progress snapshot attached to each completion.
#[derive(Debug, Clone, Copy)]
pub struct ChunkStats {
    /// Chunks completed so far, including this one
    pub chunks_completed: usize,
    /// Total chunks submitted
    pub chunks_total: usize,
}

/// One completed chunk, handed to the pipelined-import callback.
#[derive(Debug)]
pub struct ChunkCompletion {
    /// Index of the completed chunk
    pub chunk_index: usize,
    /// Everything the worker produced for this chunk
    pub output: ChunkParseOutput,
    /// Progress at completion time
    pub stats: ChunkStats,
}

/// Accumulated totals across all chunks.
#[derive(Debug, Clone, Copy, Default)]
pub struct PoolTotals {
    /// Chunks completed
    pub chunks_completed: usize,
    /// Files parsed
    pub files_processed: u64,
    /// Nodes emitted by workers
    pub nodes_emitted: u64,
    /// Edges emitted by workers
    pub edges_emitted: u64,
}

impl PoolTotals {
    fn accumulate(&mut self, output: &ChunkParseOutput) {
        self.chunks_completed += 1;
        self.files_processed += output.files_processed;
        self.nodes_emitted += output.nodes.len() as u64;
        self.edges_emitted += output.edges.len() as u64;
    }
}

/// Ready/dispatch scheduler over chunk-worker threads.
pub struct WorkerPool {
    factory: Arc<dyn AstParserFactory>,
    options: ParserOptions,
    config: PoolConfig,
}

impl WorkerPool {
    /// Create a pool. Workers are spawned per `process_chunks` call.
    #[must_use]
    pub fn new(
        factory: Arc<dyn AstParserFactory>,
        options: ParserOptions,
        config: PoolConfig,
    ) -> Self {
        Self {
            factory,
            options,
            config,
        }
    }

    /// Pool sizing rule: `min(chunk_count, ⌊0.75·CPU⌋)`, floor 1, unless the
    /// caller overrides.
    #[must_use]
    pub fn pool_size(chunk_count: usize, worker_count_override: Option<usize>) -> usize {
        let sized = worker_count_override.unwrap_or_else(|| {
            let cpus = std::thread::available_parallelism().map_or(1, |n| n.get());
            ((cpus as f64 * parse::POOL_CPU_FRACTION) as usize).max(1)
        });
        sized.min(chunk_count).max(1)
    }

    /// Parse all chunks, invoking `on_chunk_complete` for each completion.
    ///
    /// Callbacks run on the caller's task in arrival order (not dispatch
    /// order) and each is awaited before the next completion is consumed;
    /// this method resolves only after every callback has settled and every
    /// worker has been shut down.
    ///
    /// # Errors
    ///
    /// Fails when a worker cannot be spawned, a worker reports an error, or
    /// a callback fails. Any failure rejects the whole operation.
    pub async fn process_chunks<F, Fut>(
        &self,
        chunks: Vec<Vec<PathBuf>>,
        mut on_chunk_complete: F,
    ) -> Result<PoolTotals>
    where
        F: FnMut(ChunkCompletion) -> Fut,
        Fut: Future<Output = Result<()>>,
    {
        if chunks.is_empty() {
            return Ok(PoolTotals::default());
        }

        let worker_count = Self::pool_size(chunks.len(), self.config.worker_count);
        debug!(workers = worker_count, chunks = chunks.len(), "Starting worker pool");

        let (event_tx, event_rx) = std::sync::mpsc::channel();
        let mut workers = Vec::with_capacity(worker_count);
        for id in 0..worker_count {
            match WorkerHandle::spawn(id, self.factory.as_ref(), &self.options, event_tx.clone()) {
                Ok(worker) => workers.push(worker),
                Err(e) => {
                    shutdown_workers(workers, self.config.join_timeout);
                    return Err(e);
                }
            }
        }
        drop(event_tx);

        let (completion_tx, mut completion_rx) =
            tokio::sync::mpsc::channel::<ChunkCompletion>(worker_count);
        let join_timeout = self.config.join_timeout;
        let scheduler = tokio::task::spawn_blocking(move || {
            run_scheduler(workers, chunks, &event_rx, &completion_tx, join_timeout)
        });

        let mut totals = PoolTotals::default();
        let mut callback_error: Option<Error> = None;
        while let Some(completion) = completion_rx.recv().await {
            totals.accumulate(&completion.output);
            if let Err(e) = on_chunk_complete(completion).await {
                callback_error = Some(e);
                break;
            }
        }
        // Dropping the receiver tells the scheduler to abort outstanding work
        drop(completion_rx);

        let scheduler_result = scheduler
            .await
            .map_err(|e| Error::internal(format!("Pool scheduler panicked: {e}")))?;

        if let Some(e) = callback_error {
            return Err(e);
        }
        scheduler_result?;
        Ok(totals)
    }
}

/// Scheduler loop: runs on a blocking thread, owns the workers, forwards
/// completions to the async side.
fn run_scheduler(
    workers: Vec<WorkerHandle>,
    chunks: Vec<Vec<PathBuf>>,
    events: &Receiver<WorkerEvent>,
    completions: &tokio::sync::mpsc::Sender<ChunkCompletion>,
    join_timeout: Duration,
) -> Result<()> {
    let total = chunks.len();
    let mut queue: VecDeque<(usize, Vec<PathBuf>)> = chunks.into_iter().enumerate().collect();
    let mut reported = vec![false; total];
    let mut completed = 0usize;
    let mut failure: Option<Error> = None;

    while completed < total {
        let event = match events.recv() {
            Ok(event) => event,
            Err(_) => {
                failure = Some(Error::worker("All workers exited before completing the queue"));
                break;
            }
        };
        match event {
            WorkerEvent::Ready { worker_id } => {
                if let Some((index, files)) = queue.pop_front() {
                    let command = WorkerCommand::Chunk { index, files };
                    if workers[worker_id].commands.send(command).is_err() {
                        failure = Some(Error::worker(format!(
                            "Worker {worker_id} dropped its command channel"
                        )));
                        break;
                    }
                }
            }
            WorkerEvent::Result {
                worker_id,
                chunk_index,
                output,
            } => {
                // A chunk index is reported at most once
                if reported[chunk_index] {
                    warn!(worker = worker_id, chunk = chunk_index, "Duplicate chunk result ignored");
                    continue;
                }
                reported[chunk_index] = true;
                completed += 1;
                let completion = ChunkCompletion {
                    chunk_index,
                    output: *output,
                    stats: ChunkStats {
                        chunks_completed: completed,
                        chunks_total: total,
                    },
                };
                if completions.blocking_send(completion).is_err() {
                    // Consumer stopped (callback failed); abort the rest
                    failure = Some(Error::worker("Chunk consumer stopped accepting results"));
                    break;
                }
            }
            WorkerEvent::Error {
                worker_id,
                chunk_index,
                message,
            } => {
                failure = Some(Error::worker(match chunk_index {
                    Some(index) => format!("Worker {worker_id} failed on chunk {index}: {message}"),
                    None => format!("Worker {worker_id} failed: {message}"),
                }));
                break;
            }
        }
    }

    shutdown_workers(workers, join_timeout);
    match failure {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// Cooperative shutdown: send `Terminate`, wait up to `join_timeout` for all
/// threads, then detach stragglers.
fn shutdown_workers(workers: Vec<WorkerHandle>, join_timeout: Duration) {
    for worker in &workers {
        let _ = worker.commands.send(WorkerCommand::Terminate);
    }
    let deadline = Instant::now() + join_timeout;
    for worker in workers {
        while !worker.thread.is_finished() && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(20));
        }
        if worker.thread.is_finished() {
            let _ = worker.thread.join();
        } else {
            warn!(worker = worker.id, "Worker did not exit within the join timeout; detaching");
        }
    }
}
