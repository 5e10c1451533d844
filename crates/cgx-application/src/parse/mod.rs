//! Chunked parse pipeline: workers, pool, streaming import, coordinator.

mod coordinator;
mod messages;
mod pool;
mod scratch;
mod streaming;
mod worker;

pub use coordinator::{
    ParseCoordinator, ParseCoordinatorConfig, ParseRequest, ProgressFn, ProgressUpdate,
};
pub use messages::{WorkerCommand, WorkerEvent};
pub use pool::{ChunkCompletion, ChunkStats, PoolConfig, PoolTotals, WorkerPool};
pub use scratch::ScratchFile;
pub use streaming::{stream_import, StreamTotals};
pub use worker::WorkerHandle;

use std::path::PathBuf;

/// Partition files into chunks of at most `chunk_size`, preserving order.
#[must_use]
pub fn chunk_files(files: Vec<PathBuf>, chunk_size: usize) -> Vec<Vec<PathBuf>> {
    if files.is_empty() {
        return Vec::new();
    }
    let chunk_size = chunk_size.max(1);
    files
        .chunks(chunk_size)
        .map(<[PathBuf]>::to_vec)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunking_preserves_order_and_covers_all_files() {
        let files: Vec<PathBuf> = (0..7).map(|i| PathBuf::from(format!("f{i}.ts"))).collect();
        let chunks = chunk_files(files.clone(), 3);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), 3);
        assert_eq!(chunks[2].len(), 1);
        let flattened: Vec<PathBuf> = chunks.into_iter().flatten().collect();
        assert_eq!(flattened, files);
    }

    #[test]
    fn empty_input_yields_no_chunks() {
        assert!(chunk_files(Vec::new(), 10).is_empty());
    }
}
