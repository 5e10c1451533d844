//! Graph store port.
//!
//! The production driver speaks a parameterised query language against a
//! property-graph database; this trait names each query the core invokes.
//! Implementations normalise driver count values (native integers or
//! big-integer objects) via [`crate::utils::counts::normalize_count`] before
//! they cross this boundary.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::entities::{CodeEdge, CodeNode, IndexedFile, Project, ProjectStatus};
use crate::error::Result;
use crate::value_objects::{NodeId, ProjectId};

/// One node that depends on the analysis target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependentRecord {
    /// Dependent node id
    pub node_id: NodeId,
    /// Dependent node name
    pub name: String,
    /// Dependent node core type
    pub core_type: String,
    /// Relationship type of the (last) hop toward the target
    pub relationship_type: String,
    /// Hop distance from the target (1 for direct dependents)
    pub depth: u32,
}

/// One node reached during graph exploration, with the path that got there.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionRecord {
    /// Reached node id
    pub node_id: NodeId,
    /// Reached node name
    pub name: String,
    /// Reached node core type
    pub core_type: String,
    /// File owning the reached node
    pub file_path: String,
    /// BFS depth from the start node
    pub depth: u32,
    /// Relationship types along the path, in traversal order
    pub relationship_chain: Vec<String>,
}

/// A node flagged by one of the dead-code queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeadCodeCandidate {
    /// The flagged node
    pub node: CodeNode,
    /// Query-provided reason (e.g. "exported but never imported")
    pub reason: String,
}

/// Named-query surface of the property-graph store.
#[async_trait]
pub trait GraphStore: Send + Sync {
    // ── Project lifecycle ────────────────────────────────────────────

    /// CLEAR_PROJECT: delete all graph data owned by a project.
    async fn clear_project(&self, project: &ProjectId) -> Result<()>;

    /// UPSERT_PROJECT: create or replace the project node.
    async fn upsert_project(&self, project: &Project) -> Result<()>;

    /// UPDATE_PROJECT_STATUS: transition status, optionally with final counts.
    async fn update_project_status(
        &self,
        project: &ProjectId,
        status: ProjectStatus,
        node_count: Option<u64>,
        edge_count: Option<u64>,
    ) -> Result<()>;

    /// GET_PROJECT: fetch one project by id.
    async fn get_project(&self, project: &ProjectId) -> Result<Option<Project>>;

    /// LIST_PROJECTS: all known projects.
    async fn list_projects(&self) -> Result<Vec<Project>>;

    /// Look a project up by friendly name or stored root path.
    async fn find_project(&self, name_or_path: &str) -> Result<Option<Project>>;

    // ── Source-file tracking ─────────────────────────────────────────

    /// GET_SOURCE_FILE_TRACKING_INFO: indexed-file snapshots for a project.
    async fn indexed_files(&self, project: &ProjectId) -> Result<Vec<IndexedFile>>;

    /// Persist indexed-file snapshots after a successful parse.
    async fn upsert_indexed_files(&self, project: &ProjectId, files: &[IndexedFile]) -> Result<()>;

    /// DELETE_SOURCE_FILE_SUBGRAPHS: drop nodes/edges owned by the given
    /// files. Returns the number of nodes removed.
    async fn delete_file_subgraphs(&self, project: &ProjectId, file_paths: &[String])
    -> Result<u64>;

    // ── Import ───────────────────────────────────────────────────────

    /// Bulk-import nodes. Returns the number written.
    async fn import_nodes(&self, project: &ProjectId, nodes: &[CodeNode]) -> Result<u64>;

    /// Bulk-import edges. Returns the number written.
    async fn import_edges(&self, project: &ProjectId, edges: &[CodeEdge]) -> Result<u64>;

    // ── Node lookups ─────────────────────────────────────────────────

    /// GET_NODE_BY_ID.
    async fn get_node(&self, node: &NodeId) -> Result<Option<CodeNode>>;

    /// All nodes owned by one file (file-mode impact analysis).
    async fn nodes_in_file(&self, project: &ProjectId, file_path: &str) -> Result<Vec<CodeNode>>;

    /// GET_EXISTING_NODES_FOR_EDGE_DETECTION: nodes an incremental parse
    /// must know about to resolve cross-file references into unchanged files.
    async fn existing_nodes_for_edge_detection(&self, project: &ProjectId)
    -> Result<Vec<CodeNode>>;

    // ── Impact & traversal queries ───────────────────────────────────

    /// GET_NODE_IMPACT: direct dependents with their relationship types.
    async fn direct_dependents(&self, node: &NodeId) -> Result<Vec<DependentRecord>>;

    /// GET_TRANSITIVE_DEPENDENTS(maxDepth): dependents reachable in
    /// `2..=max_depth` hops.
    async fn transitive_dependents(
        &self,
        node: &NodeId,
        max_depth: u32,
    ) -> Result<Vec<DependentRecord>>;

    /// EXPLORE_ALL_CONNECTIONS(maxDepth): every node reachable from the
    /// start within `max_depth` hops, with depth and relationship chain.
    async fn explore_connections(
        &self,
        node: &NodeId,
        max_depth: u32,
    ) -> Result<Vec<ConnectionRecord>>;

    // ── Dead-code queries ────────────────────────────────────────────

    /// FIND_UNREFERENCED_EXPORTS.
    async fn find_unreferenced_exports(&self, project: &ProjectId)
    -> Result<Vec<DeadCodeCandidate>>;

    /// FIND_UNCALLED_PRIVATE_METHODS.
    async fn find_uncalled_private_methods(
        &self,
        project: &ProjectId,
    ) -> Result<Vec<DeadCodeCandidate>>;

    /// FIND_UNREFERENCED_INTERFACES.
    async fn find_unreferenced_interfaces(
        &self,
        project: &ProjectId,
    ) -> Result<Vec<DeadCodeCandidate>>;

    /// GET_FRAMEWORK_ENTRY_POINTS: nodes a framework invokes without an
    /// explicit import.
    async fn framework_entry_points(&self, project: &ProjectId)
    -> Result<Vec<DeadCodeCandidate>>;

    /// GET_PROJECT_SEMANTIC_TYPES: semantic types present in this project.
    async fn project_semantic_types(&self, project: &ProjectId) -> Result<Vec<String>>;

    // ── Schema discovery ─────────────────────────────────────────────

    /// DISCOVER_NODE_TYPES: distinct core types present in the project.
    async fn discover_node_types(&self, project: &ProjectId) -> Result<Vec<String>>;

    /// DISCOVER_RELATIONSHIP_TYPES: distinct relationship types present.
    async fn discover_relationship_types(&self, project: &ProjectId) -> Result<Vec<String>>;
}
