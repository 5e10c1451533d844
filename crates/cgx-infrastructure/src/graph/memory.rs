//! In-memory graph store.
//!
//! Implements every named query of the [`GraphStore`] port over `DashMap`s.
//! This is the development and test backend; production drivers live outside
//! this workspace. Query complexity is linear in the project size, which is
//! fine at the scales this adapter serves.

use std::collections::{HashMap, HashSet, VecDeque};

use async_trait::async_trait;
use cgx_domain::entities::{CodeEdge, CodeNode, IndexedFile, Project, ProjectStatus};
use cgx_domain::error::{Error, Result};
use cgx_domain::ports::graph_store::{ConnectionRecord, DeadCodeCandidate, DependentRecord, GraphStore};
use cgx_domain::utils::counts::normalize_count;
use cgx_domain::value_objects::{NodeId, ProjectId};
use dashmap::DashMap;
use serde_json::Value;

struct StoredProject {
    record: Project,
    // Counts are held in driver form (native number or big-integer object)
    // and normalised on every read, as a real driver adapter would.
    raw_node_count: Value,
    raw_edge_count: Value,
}

#[derive(Clone)]
struct OwnedNode {
    project: ProjectId,
    node: CodeNode,
}

#[derive(Clone)]
struct OwnedEdge {
    project: ProjectId,
    edge: CodeEdge,
}

/// In-memory [`GraphStore`] implementation.
#[derive(Default)]
pub struct InMemoryGraphStore {
    projects: DashMap<ProjectId, StoredProject>,
    nodes: DashMap<NodeId, OwnedNode>,
    edges: DashMap<String, OwnedEdge>,
    indexed: DashMap<ProjectId, HashMap<String, IndexedFile>>,
}

impl InMemoryGraphStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            projects: DashMap::new(),
            nodes: DashMap::new(),
            edges: DashMap::new(),
            indexed: DashMap::new(),
        }
    }

    /// Record project counts in raw driver form. Drivers surface counts as
    /// native integers or big-integer objects; both are accepted here and
    /// normalised on read.
    pub fn record_raw_counts(
        &self,
        project: &ProjectId,
        node_count: Value,
        edge_count: Value,
    ) -> Result<()> {
        let mut stored = self
            .projects
            .get_mut(project)
            .ok_or_else(|| Error::not_found(project.to_string()))?;
        stored.raw_node_count = node_count;
        stored.raw_edge_count = edge_count;
        Ok(())
    }

    fn materialize(stored: &StoredProject) -> Project {
        let mut record = stored.record.clone();
        record.node_count = normalize_count(&stored.raw_node_count);
        record.edge_count = normalize_count(&stored.raw_edge_count);
        record
    }

    /// Inbound adjacency: target → [(source, relationship_type)].
    fn inbound_adjacency(&self) -> HashMap<NodeId, Vec<(NodeId, String)>> {
        let mut adjacency: HashMap<NodeId, Vec<(NodeId, String)>> = HashMap::new();
        for entry in &self.edges {
            adjacency
                .entry(entry.edge.target_node_id.clone())
                .or_default()
                .push((
                    entry.edge.source_node_id.clone(),
                    entry.edge.relationship_type.clone(),
                ));
        }
        adjacency
    }

    /// Undirected adjacency: node → [(neighbour, relationship_type)].
    fn undirected_adjacency(&self) -> HashMap<NodeId, Vec<(NodeId, String)>> {
        let mut adjacency: HashMap<NodeId, Vec<(NodeId, String)>> = HashMap::new();
        for entry in &self.edges {
            let rel = entry.edge.relationship_type.clone();
            adjacency
                .entry(entry.edge.source_node_id.clone())
                .or_default()
                .push((entry.edge.target_node_id.clone(), rel.clone()));
            adjacency
                .entry(entry.edge.target_node_id.clone())
                .or_default()
                .push((entry.edge.source_node_id.clone(), rel));
        }
        adjacency
    }

    fn dependent_record(&self, node_id: &NodeId, relationship: &str, depth: u32) -> DependentRecord {
        let (name, core_type) = self
            .nodes
            .get(node_id)
            .map(|owned| (owned.node.name.clone(), owned.node.core_type.clone()))
            .unwrap_or_default();
        DependentRecord {
            node_id: node_id.clone(),
            name,
            core_type,
            relationship_type: relationship.to_owned(),
            depth,
        }
    }

    fn has_inbound_of_type(
        adjacency: &HashMap<NodeId, Vec<(NodeId, String)>>,
        node: &NodeId,
        relationship: Option<&str>,
    ) -> bool {
        adjacency.get(node).is_some_and(|inbound| {
            inbound
                .iter()
                .any(|(_, rel)| relationship.is_none_or(|wanted| rel == wanted))
        })
    }

    fn project_nodes(&self, project: &ProjectId) -> Vec<CodeNode> {
        self.nodes
            .iter()
            .filter(|entry| &entry.project == project)
            .map(|entry| entry.node.clone())
            .collect()
    }
}

#[async_trait]
impl GraphStore for InMemoryGraphStore {
    async fn clear_project(&self, project: &ProjectId) -> Result<()> {
        self.nodes.retain(|_, owned| &owned.project != project);
        self.edges.retain(|_, owned| &owned.project != project);
        self.indexed.remove(project);
        if let Some(mut stored) = self.projects.get_mut(project) {
            stored.raw_node_count = Value::from(0u64);
            stored.raw_edge_count = Value::from(0u64);
        }
        Ok(())
    }

    async fn upsert_project(&self, project: &Project) -> Result<()> {
        self.projects.insert(
            project.id.clone(),
            StoredProject {
                record: project.clone(),
                raw_node_count: Value::from(project.node_count),
                raw_edge_count: Value::from(project.edge_count),
            },
        );
        Ok(())
    }

    async fn update_project_status(
        &self,
        project: &ProjectId,
        status: ProjectStatus,
        node_count: Option<u64>,
        edge_count: Option<u64>,
    ) -> Result<()> {
        let mut stored = self
            .projects
            .get_mut(project)
            .ok_or_else(|| Error::not_found(project.to_string()))?;
        stored.record.status = status;
        stored.record.updated_at = chrono::Utc::now().timestamp_millis();
        if let Some(nodes) = node_count {
            stored.raw_node_count = Value::from(nodes);
        }
        if let Some(edges) = edge_count {
            stored.raw_edge_count = Value::from(edges);
        }
        Ok(())
    }

    async fn get_project(&self, project: &ProjectId) -> Result<Option<Project>> {
        Ok(self.projects.get(project).map(|stored| Self::materialize(&stored)))
    }

    async fn list_projects(&self) -> Result<Vec<Project>> {
        let mut projects: Vec<Project> = self
            .projects
            .iter()
            .map(|stored| Self::materialize(&stored))
            .collect();
        projects.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(projects)
    }

    async fn find_project(&self, name_or_path: &str) -> Result<Option<Project>> {
        Ok(self
            .projects
            .iter()
            .find(|stored| {
                stored.record.name == name_or_path || stored.record.root_path == name_or_path
            })
            .map(|stored| Self::materialize(&stored)))
    }

    async fn indexed_files(&self, project: &ProjectId) -> Result<Vec<IndexedFile>> {
        Ok(self
            .indexed
            .get(project)
            .map(|files| files.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn upsert_indexed_files(&self, project: &ProjectId, files: &[IndexedFile]) -> Result<()> {
        let mut entry = self.indexed.entry(project.clone()).or_default();
        for file in files {
            entry.insert(file.file_path.clone(), file.clone());
        }
        Ok(())
    }

    async fn delete_file_subgraphs(
        &self,
        project: &ProjectId,
        file_paths: &[String],
    ) -> Result<u64> {
        let paths: HashSet<&str> = file_paths.iter().map(String::as_str).collect();
        let mut removed_nodes: HashSet<NodeId> = HashSet::new();

        self.nodes.retain(|id, owned| {
            let doomed = &owned.project == project && paths.contains(owned.node.file_path.as_str());
            if doomed {
                removed_nodes.insert(id.clone());
            }
            !doomed
        });
        self.edges.retain(|_, owned| {
            !(removed_nodes.contains(&owned.edge.source_node_id)
                || removed_nodes.contains(&owned.edge.target_node_id))
        });
        if let Some(mut entry) = self.indexed.get_mut(project) {
            entry.retain(|path, _| !paths.contains(path.as_str()));
        }
        Ok(removed_nodes.len() as u64)
    }

    async fn import_nodes(&self, project: &ProjectId, nodes: &[CodeNode]) -> Result<u64> {
        for node in nodes {
            self.nodes.insert(
                node.id.clone(),
                OwnedNode {
                    project: project.clone(),
                    node: node.clone(),
                },
            );
        }
        Ok(nodes.len() as u64)
    }

    async fn import_edges(&self, project: &ProjectId, edges: &[CodeEdge]) -> Result<u64> {
        for edge in edges {
            self.edges.insert(
                edge.id.clone(),
                OwnedEdge {
                    project: project.clone(),
                    edge: edge.clone(),
                },
            );
        }
        Ok(edges.len() as u64)
    }

    async fn get_node(&self, node: &NodeId) -> Result<Option<CodeNode>> {
        Ok(self.nodes.get(node).map(|owned| owned.node.clone()))
    }

    async fn nodes_in_file(&self, project: &ProjectId, file_path: &str) -> Result<Vec<CodeNode>> {
        Ok(self
            .nodes
            .iter()
            .filter(|entry| &entry.project == project && entry.node.file_path == file_path)
            .map(|entry| entry.node.clone())
            .collect())
    }

    async fn existing_nodes_for_edge_detection(
        &self,
        project: &ProjectId,
    ) -> Result<Vec<CodeNode>> {
        Ok(self.project_nodes(project))
    }

    async fn direct_dependents(&self, node: &NodeId) -> Result<Vec<DependentRecord>> {
        let adjacency = self.inbound_adjacency();
        Ok(adjacency
            .get(node)
            .map(|inbound| {
                inbound
                    .iter()
                    .map(|(source, rel)| self.dependent_record(source, rel, 1))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn transitive_dependents(
        &self,
        node: &NodeId,
        max_depth: u32,
    ) -> Result<Vec<DependentRecord>> {
        let adjacency = self.inbound_adjacency();
        let mut visited: HashSet<NodeId> = HashSet::from([node.clone()]);
        let mut queue: VecDeque<(NodeId, u32)> = VecDeque::from([(node.clone(), 0)]);
        let mut records = Vec::new();

        while let Some((current, depth)) = queue.pop_front() {
            if depth >= max_depth {
                continue;
            }
            if let Some(inbound) = adjacency.get(&current) {
                for (source, rel) in inbound {
                    if visited.insert(source.clone()) {
                        records.push(self.dependent_record(source, rel, depth + 1));
                        queue.push_back((source.clone(), depth + 1));
                    }
                }
            }
        }
        Ok(records)
    }

    async fn explore_connections(
        &self,
        node: &NodeId,
        max_depth: u32,
    ) -> Result<Vec<ConnectionRecord>> {
        let adjacency = self.undirected_adjacency();
        let mut visited: HashSet<NodeId> = HashSet::from([node.clone()]);
        let mut queue: VecDeque<(NodeId, u32, Vec<String>)> =
            VecDeque::from([(node.clone(), 0, Vec::new())]);
        let mut records = Vec::new();

        while let Some((current, depth, chain)) = queue.pop_front() {
            if depth >= max_depth {
                continue;
            }
            if let Some(neighbours) = adjacency.get(&current) {
                for (neighbour, rel) in neighbours {
                    if visited.insert(neighbour.clone()) {
                        let mut next_chain = chain.clone();
                        next_chain.push(rel.clone());
                        if let Some(owned) = self.nodes.get(neighbour) {
                            records.push(ConnectionRecord {
                                node_id: neighbour.clone(),
                                name: owned.node.name.clone(),
                                core_type: owned.node.core_type.clone(),
                                file_path: owned.node.file_path.clone(),
                                depth: depth + 1,
                                relationship_chain: next_chain.clone(),
                            });
                        }
                        queue.push_back((neighbour.clone(), depth + 1, next_chain));
                    }
                }
            }
        }
        Ok(records)
    }

    async fn find_unreferenced_exports(
        &self,
        project: &ProjectId,
    ) -> Result<Vec<DeadCodeCandidate>> {
        let adjacency = self.inbound_adjacency();
        Ok(self
            .project_nodes(project)
            .into_iter()
            .filter(|node| {
                node.is_exported
                    && !Self::has_inbound_of_type(&adjacency, &node.id, Some("IMPORTS"))
            })
            .map(|node| DeadCodeCandidate {
                node,
                reason: "exported but never imported".to_owned(),
            })
            .collect())
    }

    async fn find_uncalled_private_methods(
        &self,
        project: &ProjectId,
    ) -> Result<Vec<DeadCodeCandidate>> {
        let adjacency = self.inbound_adjacency();
        Ok(self
            .project_nodes(project)
            .into_iter()
            .filter(|node| {
                node.visibility.as_deref() == Some("private")
                    && !Self::has_inbound_of_type(&adjacency, &node.id, Some("CALLS"))
            })
            .map(|node| DeadCodeCandidate {
                node,
                reason: "private method with no internal callers".to_owned(),
            })
            .collect())
    }

    async fn find_unreferenced_interfaces(
        &self,
        project: &ProjectId,
    ) -> Result<Vec<DeadCodeCandidate>> {
        let adjacency = self.inbound_adjacency();
        Ok(self
            .project_nodes(project)
            .into_iter()
            .filter(|node| {
                node.core_type == "Interface"
                    && !Self::has_inbound_of_type(&adjacency, &node.id, None)
            })
            .map(|node| DeadCodeCandidate {
                node,
                reason: "interface never referenced".to_owned(),
            })
            .collect())
    }

    async fn framework_entry_points(
        &self,
        project: &ProjectId,
    ) -> Result<Vec<DeadCodeCandidate>> {
        Ok(self
            .project_nodes(project)
            .into_iter()
            .filter(|node| node.semantic_type.is_some())
            .map(|node| {
                let semantic = node.semantic_type.clone().unwrap_or_default();
                DeadCodeCandidate {
                    node,
                    reason: format!("framework entry point ({semantic})"),
                }
            })
            .collect())
    }

    async fn project_semantic_types(&self, project: &ProjectId) -> Result<Vec<String>> {
        let mut types: Vec<String> = self
            .project_nodes(project)
            .into_iter()
            .filter_map(|node| node.semantic_type)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        types.sort();
        Ok(types)
    }

    async fn discover_node_types(&self, project: &ProjectId) -> Result<Vec<String>> {
        let mut types: Vec<String> = self
            .project_nodes(project)
            .into_iter()
            .map(|node| node.core_type)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        types.sort();
        Ok(types)
    }

    async fn discover_relationship_types(&self, project: &ProjectId) -> Result<Vec<String>> {
        let mut types: Vec<String> = self
            .edges
            .iter()
            .filter(|entry| &entry.project == project)
            .map(|entry| entry.edge.relationship_type.clone())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        types.sort();
        Ok(types)
    }
}
