//! Shared test doubles for the parse pipeline.

use std::path::{Path, PathBuf};
use std::time::Duration;

use cgx_domain::entities::{CodeEdge, CodeNode, DeferredEdge};
use cgx_domain::error::{Error, Result};
use cgx_domain::ports::parser::{AstParser, AstParserFactory, ChunkParseOutput, ParserOptions};
use cgx_domain::value_objects::{NodeId, ProjectId};
use serde_json::json;

pub fn parser_options(root: &str) -> ParserOptions {
    ParserOptions {
        workspace_path: PathBuf::from(root),
        ts_config_path: None,
        project_type: None,
        project_id: ProjectId::from_root_path(Path::new(root)),
        lazy_load: true,
    }
}

pub fn node_for_file(project: &ProjectId, workspace: &Path, file: &Path) -> CodeNode {
    let file_path = file
        .strip_prefix(workspace)
        .unwrap_or(file)
        .to_string_lossy()
        .replace('\\', "/");
    let name = file
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "anonymous".to_owned());
    CodeNode {
        id: NodeId::new(format!("{project}:{file_path}")),
        name,
        labels: vec!["Function".to_owned()],
        core_type: "Function".to_owned(),
        semantic_type: None,
        file_path,
        line_number: Some(1),
        source_code: None,
        visibility: Some("public".to_owned()),
        is_exported: true,
    }
}

/// Scripted parser: one node, one edge, and one deferred edge per file, with
/// an optional artificial delay per chunk.
pub struct ScriptedParser {
    project_id: ProjectId,
    workspace_path: PathBuf,
    delay: Duration,
    fail_on: Option<String>,
    discovered: Vec<PathBuf>,
    known_nodes: Vec<CodeNode>,
    deferred: Vec<DeferredEdge>,
}

impl ScriptedParser {
    fn emit(&self, files: &[PathBuf]) -> ChunkParseOutput {
        let nodes: Vec<CodeNode> = files
            .iter()
            .map(|file| node_for_file(&self.project_id, &self.workspace_path, file))
            .collect();
        let edges: Vec<CodeEdge> = nodes
            .iter()
            .map(|node| CodeEdge::ast(node.id.clone(), "CALLS", NodeId::new("node:shared")))
            .collect();
        let deferred_edges: Vec<DeferredEdge> = nodes
            .iter()
            .map(|node| DeferredEdge {
                source_node_id: node.id.clone(),
                relationship_type: "IMPORTS".to_owned(),
                target_symbol: "shared".to_owned(),
                properties: Default::default(),
            })
            .collect();
        ChunkParseOutput {
            files_processed: files.len() as u64,
            shared_context: json!({ "symbols": nodes.len() }),
            nodes,
            edges,
            deferred_edges,
        }
    }
}

impl AstParser for ScriptedParser {
    fn discover_source_files(&mut self) -> Result<Vec<PathBuf>> {
        Ok(self.discovered.clone())
    }

    fn parse_chunk(
        &mut self,
        files: &[PathBuf],
        _skip_deferred_resolution: bool,
    ) -> Result<ChunkParseOutput> {
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        if let Some(marker) = &self.fail_on {
            if files.iter().any(|f| f.to_string_lossy().contains(marker.as_str())) {
                return Err(Error::internal(format!("scripted failure on {marker}")));
            }
        }
        Ok(self.emit(files))
    }

    fn add_parsed_nodes(&mut self, nodes: &[CodeNode]) -> Result<()> {
        self.known_nodes.extend_from_slice(nodes);
        Ok(())
    }

    fn merge_shared_context(&mut self, _context: &serde_json::Value) -> Result<()> {
        Ok(())
    }

    fn merge_deferred_edges(&mut self, edges: Vec<DeferredEdge>) -> Result<()> {
        self.deferred.extend(edges);
        Ok(())
    }

    fn resolve_deferred_edges(&mut self) -> Result<Vec<CodeEdge>> {
        // Resolve every deferred edge against the first known node whose
        // name matches the symbol; unresolvable references drop.
        let resolved = self
            .deferred
            .drain(..)
            .filter_map(|deferred| {
                self.known_nodes
                    .iter()
                    .find(|node| node.name == deferred.target_symbol)
                    .map(|target| {
                        CodeEdge::ast(
                            deferred.source_node_id.clone(),
                            deferred.relationship_type.clone(),
                            target.id.clone(),
                        )
                    })
            })
            .collect();
        Ok(resolved)
    }

    fn apply_edge_enhancements(&mut self) -> Result<Vec<CodeEdge>> {
        Ok(Vec::new())
    }

    fn load_framework_schemas(&mut self, _project_type: &str) -> Result<()> {
        Ok(())
    }

    fn clear_parsed_data(&mut self) {}

    fn project_id(&self) -> &ProjectId {
        &self.project_id
    }
}

/// Factory for [`ScriptedParser`] instances.
pub struct ScriptedParserFactory {
    delay: Duration,
    fail_on: Option<String>,
    discovered: Vec<PathBuf>,
}

impl ScriptedParserFactory {
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            fail_on: None,
            discovered: Vec::new(),
        }
    }

    pub fn discovering(files: Vec<PathBuf>) -> Self {
        Self {
            delay: Duration::ZERO,
            fail_on: None,
            discovered: files,
        }
    }
}

impl AstParserFactory for ScriptedParserFactory {
    fn create(&self, options: &ParserOptions) -> Result<Box<dyn AstParser>> {
        Ok(Box::new(ScriptedParser {
            project_id: options.project_id.clone(),
            workspace_path: options.workspace_path.clone(),
            delay: self.delay,
            fail_on: self.fail_on.clone(),
            discovered: self.discovered.clone(),
            known_nodes: Vec::new(),
            deferred: Vec::new(),
        }))
    }
}

/// Factory whose parsers fail on chunks containing a marker path.
pub struct FailingParserFactory {
    marker: String,
    discovered: Vec<PathBuf>,
}

impl FailingParserFactory {
    pub fn failing_on(marker: &str) -> Self {
        Self {
            marker: marker.to_owned(),
            discovered: Vec::new(),
        }
    }

    pub fn discover(&mut self, files: Vec<PathBuf>) {
        self.discovered = files;
    }
}

impl AstParserFactory for FailingParserFactory {
    fn create(&self, options: &ParserOptions) -> Result<Box<dyn AstParser>> {
        Ok(Box::new(ScriptedParser {
            project_id: options.project_id.clone(),
            workspace_path: options.workspace_path.clone(),
            delay: Duration::ZERO,
            fail_on: Some(self.marker.clone()),
            discovered: self.discovered.clone(),
            known_nodes: Vec::new(),
            deferred: Vec::new(),
        }))
    }
}
