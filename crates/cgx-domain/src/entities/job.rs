//! Parse job entity and progress reporting types.

use serde::{Deserialize, Serialize};

use crate::value_objects::{JobId, ProjectId};

/// Lifecycle status of a background parse job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseJobStatus {
    /// Job created but not yet started
    Pending,
    /// Job is executing
    Running,
    /// Job finished successfully
    Completed,
    /// Job terminated with an error
    Failed,
}

impl ParseJobStatus {
    /// Returns `true` if the job can no longer change state. Terminal jobs
    /// are eligible for TTL-based eviction.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Phase of the parse pipeline a job is currently in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParsePhase {
    /// Waiting to start
    Pending,
    /// Enumerating source files
    Discovery,
    /// Chunk workers are parsing
    Parsing,
    /// Chunk results are being imported
    Importing,
    /// Deferred edges and enhancements are being resolved
    Resolving,
    /// All work finished
    Complete,
}

/// Fine-grained progress of a running parse.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseProgress {
    /// Current pipeline phase
    pub phase: ParsePhase,
    /// Total files in scope for this parse
    pub files_total: u64,
    /// Files fully parsed so far
    pub files_processed: u64,
    /// Nodes imported into the store so far
    pub nodes_imported: u64,
    /// Edges imported into the store so far
    pub edges_imported: u64,
    /// Index of the chunk most recently completed
    pub current_chunk: u64,
    /// Total number of chunks
    pub total_chunks: u64,
}

impl Default for ParseProgress {
    fn default() -> Self {
        Self {
            phase: ParsePhase::Pending,
            files_total: 0,
            files_processed: 0,
            nodes_imported: 0,
            edges_imported: 0,
            current_chunk: 0,
            total_chunks: 0,
        }
    }
}

/// Final counts attached to a completed parse job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseOutcome {
    /// Files parsed
    pub files_processed: u64,
    /// Nodes imported
    pub nodes_imported: u64,
    /// Edges imported
    pub edges_imported: u64,
    /// Wall-clock duration in milliseconds
    pub duration_ms: u64,
}

/// A tracked background parse operation.
///
/// Jobs are in-memory only; a process restart loses them by design.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseJob {
    /// Job identifier (`job_<16hex>`)
    pub id: JobId,
    /// Current lifecycle status
    pub status: ParseJobStatus,
    /// Project the parse targets
    pub project_id: ProjectId,
    /// Absolute project root path
    pub project_path: String,
    /// Live progress
    pub progress: ParseProgress,
    /// Final counts (populated on completion)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<ParseOutcome>,
    /// Failure message (populated on failure)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Creation timestamp (Unix epoch milliseconds)
    pub created_at: i64,
    /// Last update timestamp (Unix epoch milliseconds)
    pub updated_at: i64,
}

impl ParseJob {
    /// Create a job in `Pending` status.
    #[must_use]
    pub fn new(project_id: ProjectId, project_path: impl Into<String>) -> Self {
        let now = chrono::Utc::now().timestamp_millis();
        Self {
            id: JobId::generate(),
            status: ParseJobStatus::Pending,
            project_id,
            project_path: project_path.into(),
            progress: ParseProgress::default(),
            result: None,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns `true` if the job reached a terminal state.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
