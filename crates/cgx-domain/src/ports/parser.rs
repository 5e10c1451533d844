//! AST parser port.
//!
//! The parser itself (grammar handling, symbol tables, framework schemas) is
//! an external collaborator. Parsing is CPU-bound and parser state is not
//! shareable across threads, so the trait is synchronous: each worker thread
//! owns exactly one instance created through [`AstParserFactory`], and the
//! coordinator owns one more for cross-chunk merging and deferred-edge
//! resolution.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entities::{CodeEdge, CodeNode, DeferredEdge};
use crate::error::Result;
use crate::value_objects::ProjectId;

/// Construction options for a parser instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParserOptions {
    /// Absolute workspace root the parser may read under
    pub workspace_path: PathBuf,
    /// Optional compiler-config path (e.g. a tsconfig)
    pub ts_config_path: Option<PathBuf>,
    /// Project framework type, when known (loads framework schemas)
    pub project_type: Option<String>,
    /// Owning project id stamped onto emitted nodes
    pub project_id: ProjectId,
    /// Lazy loading: the parser must never touch files outside the chunk it
    /// is handed
    pub lazy_load: bool,
}

/// Everything one `parse_chunk` invocation produced.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChunkParseOutput {
    /// Nodes extracted from the chunk's files
    pub nodes: Vec<CodeNode>,
    /// Edges fully resolved within the chunk
    pub edges: Vec<CodeEdge>,
    /// Number of files actually parsed
    pub files_processed: u64,
    /// Serialised shared-context increment (symbol tables etc.) for the
    /// coordinator to merge across chunks
    pub shared_context: Value,
    /// Cross-file references left symbolic for post-chunk resolution
    pub deferred_edges: Vec<DeferredEdge>,
}

/// One parser instance. Not thread-safe; owned by a single worker or by the
/// coordinator.
pub trait AstParser: Send {
    /// Enumerate the source files the parser considers part of the project.
    ///
    /// # Errors
    ///
    /// Fails when the workspace root cannot be read.
    fn discover_source_files(&mut self) -> Result<Vec<PathBuf>>;

    /// Parse a batch of files. With `skip_deferred_resolution` the parser
    /// emits symbolic deferred edges instead of resolving cross-file
    /// references.
    ///
    /// # Errors
    ///
    /// Fails on unreadable files or grammar-level errors the parser cannot
    /// recover from.
    fn parse_chunk(
        &mut self,
        files: &[PathBuf],
        skip_deferred_resolution: bool,
    ) -> Result<ChunkParseOutput>;

    /// Register nodes parsed elsewhere (earlier chunks, or the existing
    /// graph) so deferred-edge resolution can see them.
    ///
    /// # Errors
    ///
    /// Fails when a node record is structurally invalid.
    fn add_parsed_nodes(&mut self, nodes: &[CodeNode]) -> Result<()>;

    /// Merge a worker's serialised shared-context increment.
    ///
    /// # Errors
    ///
    /// Fails when the payload cannot be deserialised.
    fn merge_shared_context(&mut self, context: &Value) -> Result<()>;

    /// Merge deferred edges emitted by a worker.
    ///
    /// # Errors
    ///
    /// Fails when an edge references an unknown source node.
    fn merge_deferred_edges(&mut self, edges: Vec<DeferredEdge>) -> Result<()>;

    /// Resolve all accumulated deferred edges against the merged node set.
    /// Unresolvable references are dropped, not errors.
    ///
    /// # Errors
    ///
    /// Fails only on internal parser corruption.
    fn resolve_deferred_edges(&mut self) -> Result<Vec<CodeEdge>>;

    /// Apply framework-specific edge enhancements (decorator wiring etc.)
    /// over the merged graph.
    ///
    /// # Errors
    ///
    /// Fails only on internal parser corruption.
    fn apply_edge_enhancements(&mut self) -> Result<Vec<CodeEdge>>;

    /// Load framework schemas for the given project type.
    ///
    /// # Errors
    ///
    /// Fails when the schema set is unknown.
    fn load_framework_schemas(&mut self, project_type: &str) -> Result<()>;

    /// Drop all per-instance parsed state.
    fn clear_parsed_data(&mut self);

    /// The project id this instance was created for.
    fn project_id(&self) -> &ProjectId;
}

/// Creates parser instances; one per worker thread plus one for the
/// coordinator.
pub trait AstParserFactory: Send + Sync {
    /// Build a parser configured with `options`.
    ///
    /// # Errors
    ///
    /// Fails when the workspace path is unusable or schemas cannot load.
    fn create(&self, options: &ParserOptions) -> Result<Box<dyn AstParser>>;
}
