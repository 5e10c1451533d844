//! Chunk worker thread.
//!
//! Each worker is an OS thread owning exactly one parser instance configured
//! for lazy loading: it never touches files outside the chunk it receives,
//! and it emits symbolic deferred edges instead of resolving cross-file
//! references. Per-chunk parser state is cleared before every chunk.

use std::sync::mpsc::{Receiver, Sender};
use std::thread::JoinHandle;

use cgx_domain::error::Result;
use cgx_domain::ports::parser::{AstParser, AstParserFactory, ParserOptions};
use tracing::{debug, trace};

use super::messages::{WorkerCommand, WorkerEvent};

/// Handle to a spawned worker thread.
pub struct WorkerHandle {
    /// Worker index within the pool
    pub id: usize,
    /// Command channel into the worker
    pub commands: Sender<WorkerCommand>,
    /// Join handle of the worker thread
    pub thread: JoinHandle<()>,
}

impl WorkerHandle {
    /// Spawn a worker thread with its own parser instance.
    ///
    /// The parser is created on the caller's thread (factory access stays
    /// single-threaded) and moved into the worker.
    ///
    /// # Errors
    ///
    /// Fails when the parser factory cannot build an instance.
    pub fn spawn(
        id: usize,
        factory: &dyn AstParserFactory,
        options: &ParserOptions,
        events: Sender<WorkerEvent>,
    ) -> Result<Self> {
        let parser = factory.create(options)?;
        let (commands, command_rx) = std::sync::mpsc::channel();
        let thread = std::thread::Builder::new()
            .name(format!("cgx-parse-worker-{id}"))
            .spawn(move || run_worker(id, parser, &command_rx, &events))
            .map_err(|e| cgx_domain::Error::worker(format!("Failed to spawn worker {id}: {e}")))?;
        Ok(Self {
            id,
            commands,
            thread,
        })
    }
}

fn run_worker(
    id: usize,
    mut parser: Box<dyn AstParser>,
    commands: &Receiver<WorkerCommand>,
    events: &Sender<WorkerEvent>,
) {
    debug!(worker = id, "Parse worker started");
    if events.send(WorkerEvent::Ready { worker_id: id }).is_err() {
        return;
    }

    loop {
        let command = match commands.recv() {
            Ok(command) => command,
            // Pool dropped the channel: treat as terminate
            Err(_) => break,
        };

        match command {
            WorkerCommand::Chunk { index, files } => {
                trace!(worker = id, chunk = index, files = files.len(), "Parsing chunk");
                parser.clear_parsed_data();
                let event = match parser.parse_chunk(&files, true) {
                    Ok(output) => WorkerEvent::Result {
                        worker_id: id,
                        chunk_index: index,
                        output: Box::new(output),
                    },
                    Err(e) => WorkerEvent::Error {
                        worker_id: id,
                        chunk_index: Some(index),
                        message: e.to_string(),
                    },
                };
                let failed = matches!(event, WorkerEvent::Error { .. });
                if events.send(event).is_err() {
                    break;
                }
                if failed {
                    // The pool is about to reject the operation; wait for
                    // Terminate rather than accepting more chunks.
                    continue;
                }
                if events.send(WorkerEvent::Ready { worker_id: id }).is_err() {
                    break;
                }
            }
            WorkerCommand::Terminate => break,
        }
    }
    debug!(worker = id, "Parse worker stopped");
}
