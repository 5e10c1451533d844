//! Typed messages between the worker pool and its workers.
//!
//! Workers hold no shared memory; these enums are the entire seam. The pool
//! sends [`WorkerCommand`]s, workers answer with [`WorkerEvent`]s, and every
//! handler matches exhaustively.

use std::path::PathBuf;

use cgx_domain::ports::parser::ChunkParseOutput;

/// Commands the pool sends to a worker.
#[derive(Debug)]
pub enum WorkerCommand {
    /// Parse this chunk
    Chunk {
        /// Position of the chunk in the dispatch queue
        index: usize,
        /// Files to parse
        files: Vec<PathBuf>,
    },
    /// Flush and exit cleanly
    Terminate,
}

/// Events a worker sends to the pool.
#[derive(Debug)]
pub enum WorkerEvent {
    /// The worker is idle and can accept a chunk
    Ready {
        /// Sending worker
        worker_id: usize,
    },
    /// A chunk was parsed successfully
    Result {
        /// Sending worker
        worker_id: usize,
        /// Index of the completed chunk
        chunk_index: usize,
        /// Everything the chunk produced
        output: Box<ChunkParseOutput>,
    },
    /// The worker failed; the whole operation must be rejected
    Error {
        /// Sending worker
        worker_id: usize,
        /// Chunk in flight when the failure happened, when known
        chunk_index: Option<usize>,
        /// Failure description
        message: String,
    },
}
