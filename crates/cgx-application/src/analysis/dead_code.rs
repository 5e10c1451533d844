//! Dead-code detection engine.
//!
//! Runs the store's unreferenced-export, uncalled-private-method and
//! unreferenced-interface queries in parallel, excludes framework entry
//! points, classifies what remains by confidence and category, and
//! aggregates a risk verdict.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use cgx_domain::constants::dead_code as dead_code_constants;
use cgx_domain::error::{Error, Result};
use cgx_domain::ports::graph_store::{DeadCodeCandidate, GraphStore};
use cgx_domain::value_objects::{NodeId, ProjectId};
use globset::{Glob, GlobSet, GlobSetBuilder};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::impact::RiskLevel;

static UI_COMPONENT_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(components/ui|ui/components)/").expect("static pattern"));

static LIBRARY_PACKAGE_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(^|/)packages/[^/]+/").expect("static pattern"));

/// How certain the engine is that an item is dead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Confidence {
    /// Weak signal (unreferenced interfaces and similar)
    Low,
    /// Private with no internal callers
    Medium,
    /// Exported but never imported
    High,
}

/// Path-derived category of a dead-code item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeadCodeCategory {
    /// Export from a workspace package (may be consumed externally)
    LibraryExport,
    /// UI component file (framework may reference it by convention)
    UiComponent,
    /// Plain internal code with no references
    InternalUnused,
}

/// Which detection query flagged an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeadCodeKind {
    /// Exported symbol nothing imports
    UnreferencedExport,
    /// Private method nothing calls
    UncalledPrivateMethod,
    /// Interface nothing references
    UnreferencedInterface,
}

/// Query options.
#[derive(Debug, Clone)]
pub struct DeadCodeOptions {
    /// Glob patterns excluding file paths from the result
    pub exclude_patterns: Vec<String>,
    /// Semantic types to exclude
    pub exclude_semantic_types: Vec<String>,
    /// Core types to exclude
    pub exclude_core_types: Vec<String>,
    /// Minimum confidence to include
    pub min_confidence: Confidence,
    /// Category filter (`None` = all)
    pub category: Option<DeadCodeCategory>,
    /// Page size
    pub limit: usize,
    /// Page offset
    pub offset: usize,
    /// Omit the per-item list and pagination fields
    pub summary_only: bool,
    /// Return the excluded entry points as an audit list
    pub include_entry_points: bool,
}

impl Default for DeadCodeOptions {
    fn default() -> Self {
        Self {
            exclude_patterns: Vec::new(),
            exclude_semantic_types: Vec::new(),
            exclude_core_types: Vec::new(),
            min_confidence: Confidence::Low,
            category: None,
            limit: 50,
            offset: 0,
            summary_only: false,
            include_entry_points: false,
        }
    }
}

/// One surviving dead-code finding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeadCodeItem {
    /// Flagged node id
    pub node_id: NodeId,
    /// Symbol name
    pub name: String,
    /// Core type
    pub core_type: String,
    /// Semantic type, when assigned
    pub semantic_type: Option<String>,
    /// Owning file
    pub file_path: String,
    /// Declaration line, when known
    pub line_number: Option<u32>,
    /// Detection query that flagged it
    pub kind: DeadCodeKind,
    /// Query-provided reason
    pub reason: String,
    /// Confidence tier
    pub confidence: Confidence,
    /// Path-derived category
    pub category: DeadCodeCategory,
}

/// An entry point excluded from the findings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryPointAudit {
    /// Node id
    pub node_id: NodeId,
    /// Symbol name
    pub name: String,
    /// Owning file
    pub file_path: String,
    /// Why it is treated as an entry point
    pub reason: String,
}

/// Aggregated report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeadCodeReport {
    /// Risk verdict from the aggregate counts
    pub risk: RiskLevel,
    /// Total findings after filtering (before pagination)
    pub total: usize,
    /// Counts by confidence tier
    pub by_confidence: HashMap<Confidence, usize>,
    /// Counts by category
    pub by_category: HashMap<DeadCodeCategory, usize>,
    /// Counts by detection kind
    pub by_kind: HashMap<DeadCodeKind, usize>,
    /// Top files by dead-code density (file, findings)
    pub top_files: Vec<(String, usize)>,
    /// Findings page (`None` with `summary_only`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<DeadCodeItem>>,
    /// Pagination echo (`None` with `summary_only`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<(usize, usize)>,
    /// Excluded entry points, when requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_points: Option<Vec<EntryPointAudit>>,
}

/// Dead-code detection over one graph store.
#[derive(Default)]
pub struct DeadCodeEngine {
    entry_point_globs: Vec<String>,
}

impl DeadCodeEngine {
    /// Engine with the default framework entry-point file patterns.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entry_point_globs: dead_code_constants::ENTRY_POINT_FILE_GLOBS
                .iter()
                .map(|g| (*g).to_owned())
                .collect(),
        }
    }

    fn compile(globs: &[String]) -> Result<GlobSet> {
        let mut builder = GlobSetBuilder::new();
        for pattern in globs {
            builder.add(
                Glob::new(pattern)
                    .map_err(|e| Error::invalid_argument(format!("Invalid glob '{pattern}': {e}")))?,
            );
        }
        builder
            .build()
            .map_err(|e| Error::invalid_argument(format!("Failed to build glob set: {e}")))
    }

    /// Run the full detection pipeline.
    ///
    /// # Errors
    ///
    /// Fails on store errors or malformed exclude globs.
    pub async fn detect(
        &self,
        store: &dyn GraphStore,
        project: &ProjectId,
        options: &DeadCodeOptions,
    ) -> Result<DeadCodeReport> {
        let exclude = Self::compile(&options.exclude_patterns)?;
        let entry_globs = Self::compile(&self.entry_point_globs)?;

        // The four queries are independent; run them concurrently.
        let (exports, privates, interfaces, entry_points) = tokio::try_join!(
            store.find_unreferenced_exports(project),
            store.find_uncalled_private_methods(project),
            store.find_unreferenced_interfaces(project),
            store.framework_entry_points(project),
        )?;
        let semantic_types: HashSet<String> =
            store.project_semantic_types(project).await?.into_iter().collect();

        let mut entry_ids: HashSet<NodeId> = HashSet::new();
        let mut entry_audit: Vec<EntryPointAudit> = Vec::new();
        for candidate in entry_points {
            entry_ids.insert(candidate.node.id.clone());
            entry_audit.push(EntryPointAudit {
                node_id: candidate.node.id,
                name: candidate.node.name,
                file_path: candidate.node.file_path,
                reason: candidate.reason,
            });
        }

        let mut items: HashMap<NodeId, DeadCodeItem> = HashMap::new();
        for (kind, candidates) in [
            (DeadCodeKind::UnreferencedExport, exports),
            (DeadCodeKind::UncalledPrivateMethod, privates),
            (DeadCodeKind::UnreferencedInterface, interfaces),
        ] {
            for candidate in candidates {
                if self.is_entry_point(&candidate, &entry_ids, &entry_globs, &semantic_types, &mut entry_audit)
                {
                    continue;
                }
                let item = classify(kind, candidate);
                items
                    .entry(item.node_id.clone())
                    .and_modify(|existing| {
                        if item.confidence > existing.confidence {
                            *existing = item.clone();
                        }
                    })
                    .or_insert(item);
            }
        }

        let mut findings: Vec<DeadCodeItem> = items
            .into_values()
            .filter(|item| !exclude.is_match(item.file_path.as_str()))
            .filter(|item| {
                item.semantic_type
                    .as_ref()
                    .is_none_or(|semantic| !options.exclude_semantic_types.contains(semantic))
            })
            .filter(|item| !options.exclude_core_types.contains(&item.core_type))
            .filter(|item| item.confidence >= options.min_confidence)
            .filter(|item| options.category.is_none_or(|category| item.category == category))
            .collect();
        findings.sort_by(|a, b| {
            b.confidence
                .cmp(&a.confidence)
                .then_with(|| a.file_path.cmp(&b.file_path))
                .then_with(|| a.name.cmp(&b.name))
        });

        let report = self.aggregate(findings, options, entry_audit);
        debug!(project = %project, total = report.total, risk = ?report.risk, "Dead-code detection complete");
        Ok(report)
    }

    fn is_entry_point(
        &self,
        candidate: &DeadCodeCandidate,
        entry_ids: &HashSet<NodeId>,
        entry_globs: &GlobSet,
        semantic_types: &HashSet<String>,
        entry_audit: &mut Vec<EntryPointAudit>,
    ) -> bool {
        if entry_ids.contains(&candidate.node.id) {
            return true;
        }
        let by_semantic = candidate
            .node
            .semantic_type
            .as_ref()
            .is_some_and(|semantic| semantic_types.contains(semantic));
        let by_path = entry_globs.is_match(candidate.node.file_path.as_str());
        if by_semantic || by_path {
            entry_audit.push(EntryPointAudit {
                node_id: candidate.node.id.clone(),
                name: candidate.node.name.clone(),
                file_path: candidate.node.file_path.clone(),
                reason: if by_semantic {
                    "project semantic type".to_owned()
                } else {
                    "entry-point file pattern".to_owned()
                },
            });
            return true;
        }
        false
    }

    fn aggregate(
        &self,
        findings: Vec<DeadCodeItem>,
        options: &DeadCodeOptions,
        entry_audit: Vec<EntryPointAudit>,
    ) -> DeadCodeReport {
        let total = findings.len();
        let mut by_confidence: HashMap<Confidence, usize> = HashMap::new();
        let mut by_category: HashMap<DeadCodeCategory, usize> = HashMap::new();
        let mut by_kind: HashMap<DeadCodeKind, usize> = HashMap::new();
        let mut per_file: HashMap<String, usize> = HashMap::new();
        for item in &findings {
            *by_confidence.entry(item.confidence).or_default() += 1;
            *by_category.entry(item.category).or_default() += 1;
            *by_kind.entry(item.kind).or_default() += 1;
            *per_file.entry(item.file_path.clone()).or_default() += 1;
        }

        let mut top_files: Vec<(String, usize)> = per_file.into_iter().collect();
        top_files.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        top_files.truncate(dead_code_constants::TOP_FILES_LIMIT);

        let high = by_confidence.get(&Confidence::High).copied().unwrap_or(0);
        let risk = if high >= 20 || total >= 50 {
            RiskLevel::Critical
        } else if high >= 10 || total >= 25 {
            RiskLevel::High
        } else if high >= 5 || total >= 10 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        };

        let (items, page) = if options.summary_only {
            (None, None)
        } else {
            let page_items: Vec<DeadCodeItem> = findings
                .into_iter()
                .skip(options.offset)
                .take(options.limit)
                .collect();
            (Some(page_items), Some((options.limit, options.offset)))
        };

        DeadCodeReport {
            risk,
            total,
            by_confidence,
            by_category,
            by_kind,
            top_files,
            items,
            page,
            entry_points: options.include_entry_points.then_some(entry_audit),
        }
    }
}

/// Confidence: HIGH = exported but never imported; MEDIUM = private with no
/// internal callers; LOW = everything else.
fn confidence_for(kind: DeadCodeKind, candidate: &DeadCodeCandidate) -> Confidence {
    if candidate.node.is_exported && candidate.reason.contains("never imported") {
        Confidence::High
    } else if kind == DeadCodeKind::UncalledPrivateMethod {
        Confidence::Medium
    } else {
        Confidence::Low
    }
}

/// Category by file path: UI components by directory convention and
/// extension, library exports by workspace-package layout, everything else
/// internal.
fn categorize(file_path: &str) -> DeadCodeCategory {
    let extension = file_path.rsplit('.').next().unwrap_or_default();
    if UI_COMPONENT_PATH.is_match(file_path) && matches!(extension, "tsx" | "jsx" | "vue") {
        DeadCodeCategory::UiComponent
    } else if LIBRARY_PACKAGE_PATH.is_match(file_path) {
        DeadCodeCategory::LibraryExport
    } else {
        DeadCodeCategory::InternalUnused
    }
}

fn classify(kind: DeadCodeKind, candidate: DeadCodeCandidate) -> DeadCodeItem {
    let confidence = confidence_for(kind, &candidate);
    let category = categorize(&candidate.node.file_path);
    DeadCodeItem {
        node_id: candidate.node.id,
        name: candidate.node.name,
        core_type: candidate.node.core_type,
        semantic_type: candidate.node.semantic_type,
        file_path: candidate.node.file_path,
        line_number: candidate.node.line_number,
        kind,
        reason: candidate.reason,
        confidence,
        category,
    }
}
