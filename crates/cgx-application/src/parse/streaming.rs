//! Streaming import: the sequential fallback for small projects.
//!
//! Chunks are parsed and imported one at a time on the calling task, with
//! deferred-edge resolution skipped per chunk. Nodes accumulate on the
//! parser as chunks complete; after the last chunk the deferred edges are
//! resolved and framework edge enhancements applied, and both result sets
//! imported.

use std::path::PathBuf;

use cgx_domain::error::Result;
use cgx_domain::ports::graph_store::GraphStore;
use cgx_domain::ports::parser::AstParser;
use cgx_domain::value_objects::ProjectId;
use tracing::debug;

/// Totals accumulated by one streaming run.
#[derive(Debug, Clone, Copy, Default)]
pub struct StreamTotals {
    /// Chunks imported
    pub chunks: u64,
    /// Files parsed
    pub files_processed: u64,
    /// Nodes imported
    pub nodes_imported: u64,
    /// Edges imported (chunk edges, resolved deferred edges, enhancements)
    pub edges_imported: u64,
}

/// Parse and import `chunks` sequentially.
///
/// # Errors
///
/// Any chunk parse or store failure aborts the run; partial imports stay in
/// the store and the caller is responsible for the project's failed status.
pub async fn stream_import(
    store: &dyn GraphStore,
    parser: &mut dyn AstParser,
    project: &ProjectId,
    chunks: Vec<Vec<PathBuf>>,
    mut on_chunk_imported: impl FnMut(u64, u64),
) -> Result<StreamTotals> {
    let total_chunks = chunks.len() as u64;
    let mut totals = StreamTotals::default();

    for (index, files) in chunks.into_iter().enumerate() {
        let output = parser.parse_chunk(&files, true)?;

        totals.nodes_imported += store.import_nodes(project, &output.nodes).await?;
        totals.edges_imported += store.import_edges(project, &output.edges).await?;
        totals.files_processed += output.files_processed;
        totals.chunks += 1;

        parser.add_parsed_nodes(&output.nodes)?;
        parser.merge_shared_context(&output.shared_context)?;
        parser.merge_deferred_edges(output.deferred_edges)?;

        debug!(chunk = index, files = output.files_processed, "Chunk imported");
        on_chunk_imported(totals.chunks, total_chunks);
    }

    let resolved = parser.resolve_deferred_edges()?;
    if !resolved.is_empty() {
        totals.edges_imported += store.import_edges(project, &resolved).await?;
    }
    let enhancements = parser.apply_edge_enhancements()?;
    if !enhancements.is_empty() {
        totals.edges_imported += store.import_edges(project, &enhancements).await?;
    }

    Ok(totals)
}
