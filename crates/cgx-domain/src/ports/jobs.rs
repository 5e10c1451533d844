//! Job manager port.
//!
//! Tracks background parse jobs in a bounded in-process map. Jobs are lost
//! on restart by design; the graph store remains the source of truth for
//! project state.

use serde::{Deserialize, Serialize};

use crate::entities::{ParseJob, ParseJobStatus, ParseOutcome, ParseProgress};
use crate::error::Result;
use crate::value_objects::{JobId, ProjectId};

/// Summary counts of jobs grouped by status.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobCounts {
    /// Jobs waiting to start
    pub pending: usize,
    /// Jobs currently executing
    pub running: usize,
    /// Jobs that finished successfully
    pub completed: usize,
    /// Jobs that terminated with an error
    pub failed: usize,
}

/// Interface for managing the lifecycle of background parse jobs.
///
/// Implementations enforce the capacity invariant: `create_job` succeeds iff,
/// after evicting ALL terminal jobs, the map still has room.
pub trait JobManager: Send + Sync {
    /// Create a job in `Pending` status.
    ///
    /// # Errors
    ///
    /// Fails with [`crate::error::Error::JobCapacity`] when the map is full
    /// even after terminal-job cleanup.
    fn create_job(&self, project_id: ProjectId, project_path: &str) -> Result<ParseJob>;

    /// Mark a pending job as running.
    ///
    /// # Errors
    ///
    /// Fails when the job is unknown.
    fn start_job(&self, job_id: &JobId) -> Result<()>;

    /// Replace the progress of a running job.
    ///
    /// # Errors
    ///
    /// Fails when the job is unknown.
    fn update_progress(&self, job_id: &JobId, progress: ParseProgress) -> Result<()>;

    /// Mark a job completed with its final counts.
    ///
    /// # Errors
    ///
    /// Fails when the job is unknown.
    fn complete_job(&self, job_id: &JobId, outcome: ParseOutcome) -> Result<()>;

    /// Mark a job failed with an error message.
    ///
    /// # Errors
    ///
    /// Fails when the job is unknown.
    fn fail_job(&self, job_id: &JobId, error: &str) -> Result<()>;

    /// Fetch one job by id.
    fn get_job(&self, job_id: &JobId) -> Option<ParseJob>;

    /// List jobs, optionally filtered by status, newest first.
    fn list_jobs(&self, status: Option<ParseJobStatus>) -> Vec<ParseJob>;

    /// Remove terminal jobs older than `max_age_ms`. Returns the number
    /// removed.
    fn cleanup_old_jobs(&self, max_age_ms: i64) -> usize;

    /// Counts of jobs grouped by status.
    fn job_counts(&self) -> JobCounts;
}
