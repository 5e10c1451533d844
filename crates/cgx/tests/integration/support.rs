//! Shared fixtures: a synthetic AST parser over real files, and a seeded
//! project tree.

use std::path::{Path, PathBuf};

use cgx::domain::entities::{CodeEdge, CodeNode, DeferredEdge};
use cgx::domain::error::{Error, Result};
use cgx::domain::ports::parser::{AstParser, AstParserFactory, ChunkParseOutput, ParserOptions};
use cgx::domain::value_objects::{NodeId, ProjectId};
use serde_json::json;

/// A synthetic parser: every file yields one exported function node named
/// after its stem, a `CALLS` edge toward the symbol named on its first line
/// (when present, as `calls:<name>`), and a deferred `IMPORTS` edge toward
/// the symbol named as `imports:<name>`.
pub struct SyntheticParser {
    project_id: ProjectId,
    workspace_path: PathBuf,
    known_nodes: Vec<CodeNode>,
    deferred: Vec<DeferredEdge>,
}

impl SyntheticParser {
    fn relative(&self, file: &Path) -> String {
        file.strip_prefix(&self.workspace_path)
            .unwrap_or(file)
            .to_string_lossy()
            .replace('\\', "/")
    }

    fn node_id(&self, stem: &str) -> NodeId {
        NodeId::new(format!("{}:{stem}", self.project_id))
    }
}

impl AstParser for SyntheticParser {
    fn discover_source_files(&mut self) -> Result<Vec<PathBuf>> {
        let mut files: Vec<PathBuf> = walk(&self.workspace_path)?;
        files.sort();
        Ok(files)
    }

    fn parse_chunk(
        &mut self,
        files: &[PathBuf],
        _skip_deferred_resolution: bool,
    ) -> Result<ChunkParseOutput> {
        let mut output = ChunkParseOutput {
            shared_context: json!({ "files": files.len() }),
            ..Default::default()
        };
        for file in files {
            let stem = file
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .ok_or_else(|| Error::invalid_argument(format!("no stem: {}", file.display())))?;
            let content = std::fs::read_to_string(file)
                .map_err(|e| Error::io_with_source(format!("read {}", file.display()), e))?;

            let node = CodeNode {
                id: self.node_id(&stem),
                name: stem.clone(),
                labels: vec!["Function".to_owned()],
                core_type: "Function".to_owned(),
                semantic_type: None,
                file_path: self.relative(file),
                line_number: Some(1),
                source_code: Some(content.clone()),
                visibility: Some("public".to_owned()),
                is_exported: true,
            };

            for line in content.lines() {
                if let Some(callee) = line.trim().strip_prefix("calls:") {
                    output.edges.push(CodeEdge::ast(
                        node.id.clone(),
                        "CALLS",
                        self.node_id(callee.trim()),
                    ));
                }
                if let Some(symbol) = line.trim().strip_prefix("imports:") {
                    output.deferred_edges.push(DeferredEdge {
                        source_node_id: node.id.clone(),
                        relationship_type: "IMPORTS".to_owned(),
                        target_symbol: symbol.trim().to_owned(),
                        properties: Default::default(),
                    });
                }
            }
            output.nodes.push(node);
            output.files_processed += 1;
        }
        Ok(output)
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

fn walk(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let entries = std::fs::read_dir(root)
        .map_err(|e| Error::io_with_source(format!("read_dir {}", root.display()), e))?;
    for entry in entries {
        let entry = entry.map_err(|e| Error::io_with_source("read_dir entry", e))?;
        let path = entry.path();
        if path.is_dir() {
            files.extend(walk(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "ts") {
            files.push(path);
        }
    }
    Ok(files)
}

/// Factory for [`SyntheticParser`] instances.
pub struct SyntheticParserFactory;

impl AstParserFactory for SyntheticParserFactory {
    fn create(&self, options: &ParserOptions) -> Result<Box<dyn AstParser>> {
        Ok(Box::new(SyntheticParser {
            project_id: options.project_id.clone(),
            workspace_path: options.workspace_path.clone(),
            known_nodes: Vec::new(),
            deferred: Vec::new(),
        }))
    }
}

/// Write a fixture file, creating parent directories.
pub fn write(root: &Path, relative: &str, content: &str) -> PathBuf {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("mkdir");
    }
    std::fs::write(&path, content).expect("write fixture");
    path
}

/// A small project: `api` calls `service`, `service` imports `util`,
/// `orphan` references nothing and nothing references it.
pub struct Fixture {
    /// Keeps the temp directory alive for the fixture's lifetime
    pub _dir: tempfile::TempDir,
    pub root: PathBuf,
}

pub fn sample_project() -> Fixture {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = std::fs::canonicalize(dir.path()).expect("canonical");
    write(&root, "src/api.ts", "calls:service\n");
    write(&root, "src/service.ts", "imports:util\n");
    write(&root, "src/util.ts", "export {}\n");
    write(&root, "src/orphan.ts", "export {}\n");
    Fixture { _dir: dir, root }
}
