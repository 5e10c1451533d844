//! Graph traversal engine.
//!
//! Bounded BFS from a start node, grouping reachable nodes by depth and by
//! the relationship chain that reached them, with per-group truncation and a
//! human-readable layered report.

use std::collections::{BTreeMap, HashSet};
use std::fmt::Write as _;

use cgx_domain::error::{Error, Result};
use cgx_domain::ports::graph_store::{ConnectionRecord, GraphStore};
use cgx_domain::value_objects::NodeId;
use serde::{Deserialize, Serialize};

/// Hard ceiling on traversal depth.
const MAX_TRAVERSAL_DEPTH: u32 = 10;

/// Traversal options.
#[derive(Debug, Clone)]
pub struct TraversalOptions {
    /// BFS depth bound (clamped to 10)
    pub max_depth: u32,
    /// Maximum nodes shown per (depth, chain) group
    pub limit: usize,
    /// Include the start node's details in the report header
    pub include_start_details: bool,
    /// Report title override
    pub title: Option<String>,
}

impl Default for TraversalOptions {
    fn default() -> Self {
        Self {
            max_depth: 3,
            limit: 25,
            include_start_details: false,
            title: None,
        }
    }
}

/// One node within a chain group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraversedNode {
    /// Node id
    pub node_id: NodeId,
    /// Node name
    pub name: String,
    /// Core type
    pub core_type: String,
    /// Owning file
    pub file_path: String,
}

/// Nodes that share a relationship chain at one depth.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainGroup {
    /// Relationship chain, e.g. `CALLS -> IMPORTS`
    pub chain: String,
    /// Nodes shown (truncated to the limit)
    pub nodes: Vec<TraversedNode>,
    /// Total nodes in this group before truncation
    pub total: usize,
}

/// All groups at one BFS depth.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepthLayer {
    /// BFS depth (1-based)
    pub depth: u32,
    /// Chain groups, ordered by chain string
    pub groups: Vec<ChainGroup>,
}

/// Traversal result: layers plus a rendered report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraversalReport {
    /// Start node id
    pub start: NodeId,
    /// Layered, grouped connections
    pub layers: Vec<DepthLayer>,
    /// Total reachable connections
    pub total_connections: usize,
    /// Deepest layer reached
    pub max_depth_reached: u32,
    /// Distinct files among reached nodes
    pub distinct_files: usize,
    /// Human-readable layered report
    pub rendered: String,
}

/// Traversal over one graph store.
#[derive(Debug, Default)]
pub struct TraversalEngine;

impl TraversalEngine {
    /// Explore everything reachable from `start`.
    ///
    /// # Errors
    ///
    /// Fails with a not-found error when the start node does not exist.
    pub async fn traverse_from_node(
        &self,
        store: &dyn GraphStore,
        start: &NodeId,
        options: &TraversalOptions,
    ) -> Result<TraversalReport> {
        let start_node = store
            .get_node(start)
            .await?
            .ok_or_else(|| Error::not_found(format!("node {start}")))?;

        let max_depth = options.max_depth.clamp(1, MAX_TRAVERSAL_DEPTH);
        let connections = store.explore_connections(start, max_depth).await?;

        let total_connections = connections.len();
        let max_depth_reached = connections.iter().map(|c| c.depth).max().unwrap_or(0);
        let distinct_files: HashSet<&str> = connections
            .iter()
            .map(|c| c.file_path.as_str())
            .collect();
        let distinct_files = distinct_files.len();

        // depth → chain → nodes, in deterministic order
        let mut grouped: BTreeMap<u32, BTreeMap<String, Vec<ConnectionRecord>>> = BTreeMap::new();
        for connection in connections {
            grouped
                .entry(connection.depth)
                .or_default()
                .entry(connection.relationship_chain.join(" -> "))
                .or_default()
                .push(connection);
        }

        let layers: Vec<DepthLayer> = grouped
            .into_iter()
            .map(|(depth, chains)| DepthLayer {
                depth,
                groups: chains
                    .into_iter()
                    .map(|(chain, mut records)| {
                        records.sort_by(|a, b| a.name.cmp(&b.name));
                        let total = records.len();
                        let nodes = records
                            .into_iter()
                            .take(options.limit)
                            .map(|record| TraversedNode {
                                node_id: record.node_id,
                                name: record.name,
                                core_type: record.core_type,
                                file_path: record.file_path,
                            })
                            .collect();
                        ChainGroup {
                            chain,
                            nodes,
                            total,
                        }
                    })
                    .collect(),
            })
            .collect();

        let rendered = render(
            options,
            &start_node.name,
            &start_node.core_type,
            &start_node.file_path,
            &layers,
            total_connections,
            max_depth_reached,
            distinct_files,
        );

        Ok(TraversalReport {
            start: start.clone(),
            layers,
            total_connections,
            max_depth_reached,
            distinct_files,
            rendered,
        })
    }
}

#[allow(clippy::too_many_arguments)]
fn render(
    options: &TraversalOptions,
    start_name: &str,
    start_type: &str,
    start_file: &str,
    layers: &[DepthLayer],
    total_connections: usize,
    max_depth_reached: u32,
    distinct_files: usize,
) -> String {
    let mut out = String::new();
    let title = options
        .title
        .clone()
        .unwrap_or_else(|| format!("Connections from {start_name}"));
    let _ = writeln!(out, "# {title}");
    if options.include_start_details {
        let _ = writeln!(out, "Start: {start_name} ({start_type}) in {start_file}");
    }
    for layer in layers {
        let _ = writeln!(out, "\n## Depth {}", layer.depth);
        for group in &layer.groups {
            let _ = writeln!(out, "  via {}:", group.chain);
            for node in &group.nodes {
                let _ = writeln!(out, "    - {} ({}) [{}]", node.name, node.core_type, node.file_path);
            }
            if group.total > group.nodes.len() {
                let _ = writeln!(out, "    … and {} more", group.total - group.nodes.len());
            }
        }
    }
    let _ = writeln!(
        out,
        "\nSummary: {total_connections} connections, max depth {max_depth_reached}, {distinct_files} files"
    );
    out
}
