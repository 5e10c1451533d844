//! Incremental change detection.
//!
//! Diffs the on-disk tree against the indexed-file snapshots in the store.
//! A file is unchanged iff ALL of (mtime, size, content hash) match its
//! snapshot; anything else is reparsed. Files whose canonical path escapes
//! the project root after symlink resolution are dropped with a warning.

use std::collections::{HashMap, HashSet};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use cgx_domain::constants::discovery;
use cgx_domain::entities::IndexedFile;
use cgx_domain::error::{Error, Result};
use cgx_domain::ports::graph_store::GraphStore;
use cgx_domain::utils::hash::file_sha256;
use cgx_domain::utils::path::{canonicalize, is_descendant_of, root_relative};
use cgx_domain::value_objects::ProjectId;
use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// File-selection settings for the detector.
#[derive(Debug, Clone)]
pub struct ChangeDetectorConfig {
    /// Globs selecting candidate source files
    pub source_globs: Vec<String>,
    /// Directory names whose subtrees are skipped entirely
    pub skip_dirs: Vec<String>,
    /// File patterns excluded inside included subtrees
    pub excluded_file_globs: Vec<String>,
}

impl Default for ChangeDetectorConfig {
    fn default() -> Self {
        Self {
            source_globs: discovery::SOURCE_GLOBS.iter().map(|s| (*s).to_owned()).collect(),
            skip_dirs: discovery::SKIP_DIRS.iter().map(|s| (*s).to_owned()).collect(),
            excluded_file_globs: discovery::EXCLUDED_FILE_GLOBS
                .iter()
                .map(|s| (*s).to_owned())
                .collect(),
        }
    }
}

/// Result of one detection pass.
#[derive(Debug, Default)]
pub struct ChangeSet {
    /// Absolute canonical paths of files that must be (re)parsed
    pub files_to_reparse: Vec<PathBuf>,
    /// Root-relative paths of previously-indexed files no longer on disk
    pub files_to_delete: Vec<String>,
    /// Current on-disk identity of every surviving candidate file, for
    /// snapshot persistence after a successful parse
    pub snapshots: Vec<IndexedFile>,
    /// Number of candidates that matched their snapshot exactly
    pub unchanged: usize,
}

/// Capture the current on-disk identity of one file as an [`IndexedFile`]
/// snapshot. The file is canonicalised first; a path outside the root is a
/// security error.
///
/// # Errors
///
/// Fails on unreadable files or on symlink escape.
pub fn snapshot_file(canonical_root: &Path, file: &Path) -> Result<IndexedFile> {
    let canonical = canonicalize(file)?;
    if !is_descendant_of(&canonical, canonical_root) {
        return Err(Error::security(format!(
            "{} resolves outside the project root",
            file.display()
        )));
    }
    let metadata = std::fs::metadata(&canonical)
        .map_err(|e| Error::io_with_source(format!("Failed to stat {}", canonical.display()), e))?;
    let mtime_ms = metadata
        .modified()
        .ok()
        .and_then(|mtime| mtime.duration_since(UNIX_EPOCH).ok())
        .map_or(0, |elapsed| elapsed.as_millis() as i64);
    Ok(IndexedFile {
        file_path: root_relative(&canonical, canonical_root)?,
        mtime_ms,
        size: metadata.len(),
        content_hash: file_sha256(&canonical)?,
    })
}

/// Change detector over one project root.
pub struct ChangeDetector {
    config: ChangeDetectorConfig,
    include: GlobSet,
    exclude: GlobSet,
}

impl ChangeDetector {
    /// Build a detector, compiling the configured glob sets.
    ///
    /// # Errors
    ///
    /// Fails when a configured glob is malformed.
    pub fn new(config: ChangeDetectorConfig) -> Result<Self> {
        let include = Self::compile(&config.source_globs)?;
        let exclude = Self::compile(&config.excluded_file_globs)?;
        Ok(Self {
            config,
            include,
            exclude,
        })
    }

    fn compile(globs: &[String]) -> Result<GlobSet> {
        let mut builder = GlobSetBuilder::new();
        for pattern in globs {
            let glob = Glob::new(pattern)
                .map_err(|e| Error::config(format!("Invalid glob '{pattern}': {e}")))?;
            builder.add(glob);
        }
        builder
            .build()
            .map_err(|e| Error::config(format!("Failed to build glob set: {e}")))
    }

    /// Diff the tree under `project_root` against the snapshots indexed for
    /// `project_id`.
    ///
    /// # Errors
    ///
    /// Fails when the root cannot be canonicalised or the store is
    /// unreachable. Per-file stat errors never fail the pass: `ENOENT`
    /// drops the file silently, `EACCES` classifies it conservatively as
    /// reparse.
    pub async fn detect(
        &self,
        project_root: &Path,
        project_id: &ProjectId,
        store: &dyn GraphStore,
    ) -> Result<ChangeSet> {
        let canonical_root = canonicalize(project_root)?;
        let indexed: HashMap<String, IndexedFile> = store
            .indexed_files(project_id)
            .await?
            .into_iter()
            .map(|file| (file.file_path.clone(), file))
            .collect();

        let mut change_set = ChangeSet::default();
        let mut seen: HashSet<String> = HashSet::new();

        let skip_dirs = &self.config.skip_dirs;
        let walker = WalkDir::new(&canonical_root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|entry| {
                !(entry.file_type().is_dir()
                    && entry
                        .file_name()
                        .to_str()
                        .is_some_and(|name| skip_dirs.iter().any(|skip| skip == name)))
            });

        for entry_result in walker {
            let entry = match entry_result {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(root = %canonical_root.display(), error = %e, "Failed to read directory entry");
                    continue;
                }
            };
            if entry.file_type().is_dir() {
                continue;
            }

            let walk_relative = match entry.path().strip_prefix(&canonical_root) {
                Ok(relative) => relative,
                Err(_) => continue,
            };
            if !self.include.is_match(walk_relative) || self.exclude.is_match(walk_relative) {
                continue;
            }

            self.classify(entry.path(), &canonical_root, &indexed, &mut change_set, &mut seen);
        }

        for (indexed_path, _) in &indexed {
            if !seen.contains(indexed_path) {
                change_set.files_to_delete.push(indexed_path.clone());
            }
        }
        change_set.files_to_delete.sort();

        debug!(
            reparse = change_set.files_to_reparse.len(),
            delete = change_set.files_to_delete.len(),
            unchanged = change_set.unchanged,
            "Change detection complete"
        );
        Ok(change_set)
    }

    /// Classify one candidate file. Symlinks are resolved first; a file
    /// whose real path is outside the root is dropped (symlink-escape
    /// protection).
    fn classify(
        &self,
        walk_path: &Path,
        canonical_root: &Path,
        indexed: &HashMap<String, IndexedFile>,
        change_set: &mut ChangeSet,
        seen: &mut HashSet<String>,
    ) {
        let canonical = match std::fs::canonicalize(walk_path) {
            Ok(canonical) => canonical,
            Err(e) => return Self::record_stat_error(walk_path, &e, change_set),
        };
        if !is_descendant_of(&canonical, canonical_root) {
            warn!(
                file = %walk_path.display(),
                target = %canonical.display(),
                "Dropping file: symlink escapes project root"
            );
            return;
        }

        let metadata = match std::fs::metadata(&canonical) {
            Ok(metadata) => metadata,
            Err(e) => return Self::record_stat_error(walk_path, &e, change_set),
        };
        if !metadata.is_file() {
            return;
        }
        let mtime_ms = metadata
            .modified()
            .ok()
            .and_then(|mtime| mtime.duration_since(UNIX_EPOCH).ok())
            .map_or(0, |elapsed| elapsed.as_millis() as i64);
        let size = metadata.len();

        let content_hash = match file_sha256(&canonical) {
            Ok(hash) => hash,
            Err(e) => {
                // Conservative: a file we cannot hash gets reparsed
                warn!(file = %canonical.display(), error = %e, "Failed to hash file; reparsing");
                change_set.files_to_reparse.push(canonical);
                return;
            }
        };

        let Ok(relative) = root_relative(&canonical, canonical_root) else {
            return;
        };
        seen.insert(relative.clone());

        let snapshot = IndexedFile {
            file_path: relative.clone(),
            mtime_ms,
            size,
            content_hash: content_hash.clone(),
        };
        change_set.snapshots.push(snapshot);

        match indexed.get(&relative) {
            Some(existing) if existing.is_unchanged(mtime_ms, size, &content_hash) => {
                change_set.unchanged += 1;
            }
            _ => change_set.files_to_reparse.push(canonical),
        }
    }

    fn record_stat_error(walk_path: &Path, error: &std::io::Error, change_set: &mut ChangeSet) {
        match error.kind() {
            // Deleted between enumerate and stat: silently drop
            ErrorKind::NotFound => {}
            ErrorKind::PermissionDenied => {
                warn!(file = %walk_path.display(), "Permission denied; classifying as reparse");
                change_set.files_to_reparse.push(walk_path.to_path_buf());
            }
            _ => {
                warn!(file = %walk_path.display(), error = %error, "Stat failed; classifying as reparse");
                change_set.files_to_reparse.push(walk_path.to_path_buf());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgx_infrastructure::InMemoryGraphStore;

    fn write(dir: &Path, relative: &str, content: &str) -> PathBuf {
        let path = dir.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("mkdir");
        }
        std::fs::write(&path, content).expect("write");
        path
    }

    fn detector() -> ChangeDetector {
        ChangeDetector::new(ChangeDetectorConfig::default()).expect("valid default globs")
    }

    async fn snapshot_of(dir: &Path, relative: &str) -> IndexedFile {
        let path = dir.join(relative);
        let metadata = std::fs::metadata(&path).expect("stat");
        IndexedFile {
            file_path: relative.to_owned(),
            mtime_ms: metadata
                .modified()
                .expect("mtime")
                .duration_since(UNIX_EPOCH)
                .expect("epoch")
                .as_millis() as i64,
            size: metadata.len(),
            content_hash: file_sha256(&path).expect("hash"),
        }
    }

    #[tokio::test]
    async fn first_scan_reparses_everything() {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = std::fs::canonicalize(dir.path()).expect("canonical");
        write(&root, "src/api.ts", "export const a = 1;\n");
        write(&root, "src/util.ts", "export const b = 2;\n");
        write(&root, "readme.md", "# not source\n");

        let store = InMemoryGraphStore::new();
        let project_id = ProjectId::from_root_path(&root);
        let changes = detector()
            .detect(&root, &project_id, &store)
            .await
            .expect("detect");

        assert_eq!(changes.files_to_reparse.len(), 2);
        assert!(changes.files_to_delete.is_empty());
        assert_eq!(changes.snapshots.len(), 2);
    }

    #[tokio::test]
    async fn matching_snapshot_short_circuits_to_unchanged() {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = std::fs::canonicalize(dir.path()).expect("canonical");
        write(&root, "src/api.ts", "export const a = 1;\n");

        let store = InMemoryGraphStore::new();
        let project_id = ProjectId::from_root_path(&root);
        let snapshot = snapshot_of(&root, "src/api.ts").await;
        store
            .upsert_indexed_files(&project_id, &[snapshot])
            .await
            .expect("upsert");

        let changes = detector()
            .detect(&root, &project_id, &store)
            .await
            .expect("detect");
        assert!(changes.files_to_reparse.is_empty());
        assert!(changes.files_to_delete.is_empty());
        assert_eq!(changes.unchanged, 1);
    }

    #[tokio::test]
    async fn content_change_forces_reparse() {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = std::fs::canonicalize(dir.path()).expect("canonical");
        write(&root, "src/api.ts", "export const a = 1;\n");

        let store = InMemoryGraphStore::new();
        let project_id = ProjectId::from_root_path(&root);
        let mut snapshot = snapshot_of(&root, "src/api.ts").await;
        snapshot.content_hash = "0".repeat(64);
        store
            .upsert_indexed_files(&project_id, &[snapshot])
            .await
            .expect("upsert");

        let changes = detector()
            .detect(&root, &project_id, &store)
            .await
            .expect("detect");
        assert_eq!(changes.files_to_reparse.len(), 1);
        assert_eq!(changes.unchanged, 0);
    }

    #[tokio::test]
    async fn missing_indexed_files_are_marked_for_deletion() {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = std::fs::canonicalize(dir.path()).expect("canonical");

        let store = InMemoryGraphStore::new();
        let project_id = ProjectId::from_root_path(&root);
        store
            .upsert_indexed_files(
                &project_id,
                &[IndexedFile {
                    file_path: "src/removed.ts".to_owned(),
                    mtime_ms: 1,
                    size: 1,
                    content_hash: "aa".to_owned(),
                }],
            )
            .await
            .expect("upsert");

        let changes = detector()
            .detect(&root, &project_id, &store)
            .await
            .expect("detect");
        assert_eq!(changes.files_to_delete, vec!["src/removed.ts".to_owned()]);
    }

    #[tokio::test]
    async fn excluded_dirs_and_patterns_are_skipped() {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = std::fs::canonicalize(dir.path()).expect("canonical");
        write(&root, "node_modules/lib/index.ts", "export {};\n");
        write(&root, "dist/out.ts", "export {};\n");
        write(&root, "src/api.spec.ts", "it('works', () => {});\n");
        write(&root, "src/types.d.ts", "declare const x: number;\n");
        write(&root, "src/api.ts", "export const a = 1;\n");

        let store = InMemoryGraphStore::new();
        let project_id = ProjectId::from_root_path(&root);
        let changes = detector()
            .detect(&root, &project_id, &store)
            .await
            .expect("detect");
        assert_eq!(changes.files_to_reparse.len(), 1);
        assert!(
            changes.files_to_reparse[0].ends_with("src/api.ts"),
            "only the real source file survives"
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn symlink_escaping_the_root_is_dropped() {
        let outside = tempfile::tempdir().expect("tempdir");
        let secret = write(outside.path(), "secret.ts", "export const leak = true;\n");

        let dir = tempfile::tempdir().expect("tempdir");
        let root = std::fs::canonicalize(dir.path()).expect("canonical");
        std::fs::create_dir_all(root.join("src")).expect("mkdir");
        std::os::unix::fs::symlink(&secret, root.join("src/link.ts")).expect("symlink");
        write(&root, "src/api.ts", "export const a = 1;\n");

        let store = InMemoryGraphStore::new();
        let project_id = ProjectId::from_root_path(&root);
        let changes = detector()
            .detect(&root, &project_id, &store)
            .await
            .expect("detect");

        assert_eq!(changes.files_to_reparse.len(), 1);
        assert!(changes.files_to_reparse[0].ends_with("src/api.ts"));
    }
}
