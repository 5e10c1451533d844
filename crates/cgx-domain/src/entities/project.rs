//! Project entity.

use serde::{Deserialize, Serialize};

use crate::value_objects::ProjectId;

/// Lifecycle status of an indexed project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    /// A parse is currently rebuilding this project's graph
    Parsing,
    /// The graph reflects the last successful parse
    Complete,
    /// The last parse aborted; graph contents are unreliable
    Failed,
}

/// A source project tracked in the graph store.
///
/// Identity is a pure function of the absolute root path (see
/// [`ProjectId::from_root_path`]), so re-registering the same directory can
/// never create a second project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    /// Deterministic identifier (`proj_<12hex>`)
    pub id: ProjectId,
    /// Friendly name, from the package manifest or the directory basename
    pub name: String,
    /// Absolute root path
    pub root_path: String,
    /// Current lifecycle status
    pub status: ProjectStatus,
    /// Number of graph nodes owned by this project
    pub node_count: u64,
    /// Number of graph edges owned by this project
    pub edge_count: u64,
    /// Last status transition (Unix epoch milliseconds)
    pub updated_at: i64,
}

impl Project {
    /// Create a project record in `Parsing` state, as upserted at the start
    /// of a parse.
    #[must_use]
    pub fn parsing(id: ProjectId, name: impl Into<String>, root_path: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            root_path: root_path.into(),
            status: ProjectStatus::Parsing,
            node_count: 0,
            edge_count: 0,
            updated_at: chrono::Utc::now().timestamp_millis(),
        }
    }
}
