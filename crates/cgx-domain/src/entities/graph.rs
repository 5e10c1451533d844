//! Graph entities: nodes, edges, deferred edges, indexed-file snapshots.
//!
//! Ownership forms a tree per project: Project → Files → Nodes → Edges.
//! References between nodes are pure identifiers, never pointers.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::utils::hash::sha256_hex;
use crate::value_objects::NodeId;

/// Direction of a relationship as stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EdgeDirection {
    /// Source points at target
    Outgoing,
    /// Target points at source
    Incoming,
    /// Undirected association
    Bidirectional,
}

/// A code entity extracted from one source file.
///
/// A node belongs to exactly one project and one file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeNode {
    /// Unique node identifier
    pub id: NodeId,
    /// Declared name of the entity
    pub name: String,
    /// Store labels (e.g. `Class`, `Exported`)
    pub labels: Vec<String>,
    /// Syntactic category (`Class`, `Function`, `Interface`, …)
    pub core_type: String,
    /// Project-defined category beyond the core type (e.g. `Controller`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semantic_type: Option<String>,
    /// Root-relative path of the owning file
    pub file_path: String,
    /// 1-based line of the declaration, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_number: Option<u32>,
    /// Extracted source text, when retained
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_code: Option<String>,
    /// Declared visibility (`public`, `private`, `protected`), when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<String>,
    /// Whether the entity is exported from its module
    pub is_exported: bool,
}

/// A resolved relationship between two nodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeEdge {
    /// Deterministic identifier derived from (source, type, target)
    pub id: String,
    /// Relationship type (`CALLS`, `EXTENDS`, …)
    pub relationship_type: String,
    /// Stored direction
    pub direction: EdgeDirection,
    /// Source node id
    pub source_node_id: NodeId,
    /// Target node id
    pub target_node_id: NodeId,
    /// Free-form properties bag
    #[serde(default)]
    pub properties: HashMap<String, Value>,
    /// Creation timestamp (Unix epoch milliseconds)
    pub created_at: i64,
    /// Extraction confidence in `[0, 1]`
    pub confidence: f64,
    /// Extraction source tag (`ast`, `decorator`, …)
    pub source: String,
}

impl CodeEdge {
    /// Deterministic edge id: the same (source, type, target) triple always
    /// produces the same id, so re-imports are idempotent.
    #[must_use]
    pub fn deterministic_id(source: &NodeId, relationship_type: &str, target: &NodeId) -> String {
        let digest = sha256_hex(
            format!("{}|{relationship_type}|{}", source.as_str(), target.as_str()).as_bytes(),
        );
        format!("edge_{}", &digest[..16])
    }

    /// Build an outgoing AST-sourced edge with full confidence.
    #[must_use]
    pub fn ast(source: NodeId, relationship_type: impl Into<String>, target: NodeId) -> Self {
        let relationship_type = relationship_type.into();
        Self {
            id: Self::deterministic_id(&source, &relationship_type, &target),
            relationship_type,
            direction: EdgeDirection::Outgoing,
            source_node_id: source,
            target_node_id: target,
            properties: HashMap::new(),
            created_at: chrono::Utc::now().timestamp_millis(),
            confidence: 1.0,
            source: "ast".to_owned(),
        }
    }
}

/// An edge whose target is still a symbolic reference.
///
/// Emitted by chunk workers for cross-file references; resolved by the
/// coordinator strictly after every chunk has completed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeferredEdge {
    /// Source node id (already resolved within the emitting chunk)
    pub source_node_id: NodeId,
    /// Relationship type the resolved edge will carry
    pub relationship_type: String,
    /// Symbolic reference to the target (import specifier, qualified name)
    pub target_symbol: String,
    /// Properties to copy onto the resolved edge
    #[serde(default)]
    pub properties: HashMap<String, Value>,
}

/// Snapshot of a file's identity at index time, used for change detection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexedFile {
    /// Root-relative file path
    pub file_path: String,
    /// Modification time (Unix epoch milliseconds)
    pub mtime_ms: i64,
    /// File size in bytes
    pub size: u64,
    /// Hex-encoded SHA-256 of the content
    pub content_hash: String,
}

impl IndexedFile {
    /// A file is unchanged iff ALL of mtime, size, and content hash match.
    #[must_use]
    pub fn is_unchanged(&self, mtime_ms: i64, size: u64, content_hash: &str) -> bool {
        self.mtime_ms == mtime_ms && self.size == size && self.content_hash == content_hash
    }
}
