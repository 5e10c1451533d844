//! In-memory job manager.
//!
//! A process-wide map of parse jobs behind an `RwLock`. Capacity is bounded:
//! when full, ALL terminal jobs are evicted regardless of age before a new
//! job is admitted; if the map is still full, creation fails.

use std::collections::HashMap;
use std::sync::RwLock;

use cgx_domain::entities::{ParseJob, ParseJobStatus, ParseOutcome, ParseProgress};
use cgx_domain::error::{Error, Result};
use cgx_domain::ports::jobs::{JobCounts, JobManager};
use cgx_domain::value_objects::{JobId, ProjectId};
use tracing::debug;

/// Bounded in-memory [`JobManager`] implementation.
pub struct InMemoryJobManager {
    jobs: RwLock<HashMap<JobId, ParseJob>>,
    max_jobs: usize,
}

impl InMemoryJobManager {
    /// Create a manager tracking at most `max_jobs` jobs.
    #[must_use]
    pub fn new(max_jobs: usize) -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
            max_jobs,
        }
    }

    fn with_job<T>(
        &self,
        job_id: &JobId,
        mutate: impl FnOnce(&mut ParseJob) -> T,
    ) -> Result<T> {
        let mut jobs = self.jobs.write().unwrap_or_else(|e| e.into_inner());
        let job = jobs
            .get_mut(job_id)
            .ok_or_else(|| Error::not_found(job_id.to_string()))?;
        let value = mutate(job);
        job.updated_at = chrono::Utc::now().timestamp_millis();
        Ok(value)
    }
}

impl JobManager for InMemoryJobManager {
    fn create_job(&self, project_id: ProjectId, project_path: &str) -> Result<ParseJob> {
        let mut jobs = self.jobs.write().unwrap_or_else(|e| e.into_inner());

        if jobs.len() >= self.max_jobs {
            let before = jobs.len();
            jobs.retain(|_, job| !job.is_terminal());
            debug!(evicted = before - jobs.len(), "Evicted terminal jobs at capacity");
        }
        if jobs.len() >= self.max_jobs {
            return Err(Error::JobCapacity {
                max_jobs: self.max_jobs,
            });
        }

        let job = ParseJob::new(project_id, project_path);
        jobs.insert(job.id.clone(), job.clone());
        Ok(job)
    }

    fn start_job(&self, job_id: &JobId) -> Result<()> {
        self.with_job(job_id, |job| {
            job.status = ParseJobStatus::Running;
        })
    }

    fn update_progress(&self, job_id: &JobId, progress: ParseProgress) -> Result<()> {
        self.with_job(job_id, |job| {
            job.progress = progress;
        })
    }

    fn complete_job(&self, job_id: &JobId, outcome: ParseOutcome) -> Result<()> {
        self.with_job(job_id, |job| {
            job.status = ParseJobStatus::Completed;
            job.result = Some(outcome);
        })
    }

    fn fail_job(&self, job_id: &JobId, error: &str) -> Result<()> {
        self.with_job(job_id, |job| {
            job.status = ParseJobStatus::Failed;
            job.error = Some(error.to_owned());
        })
    }

    fn get_job(&self, job_id: &JobId) -> Option<ParseJob> {
        let jobs = self.jobs.read().unwrap_or_else(|e| e.into_inner());
        jobs.get(job_id).cloned()
    }

    fn list_jobs(&self, status: Option<ParseJobStatus>) -> Vec<ParseJob> {
        let jobs = self.jobs.read().unwrap_or_else(|e| e.into_inner());
        let mut listed: Vec<ParseJob> = jobs
            .values()
            .filter(|job| status.is_none_or(|s| job.status == s))
            .cloned()
            .collect();
        listed.sort_by_key(|job| std::cmp::Reverse(job.created_at));
        listed
    }

    fn cleanup_old_jobs(&self, max_age_ms: i64) -> usize {
        let cutoff = chrono::Utc::now().timestamp_millis() - max_age_ms;
        let mut jobs = self.jobs.write().unwrap_or_else(|e| e.into_inner());
        let before = jobs.len();
        jobs.retain(|_, job| !(job.is_terminal() && job.updated_at < cutoff));
        before - jobs.len()
    }

    fn job_counts(&self) -> JobCounts {
        let jobs = self.jobs.read().unwrap_or_else(|e| e.into_inner());
        let mut counts = JobCounts::default();
        for job in jobs.values() {
            match job.status {
                ParseJobStatus::Pending => counts.pending += 1,
                ParseJobStatus::Running => counts.running += 1,
                ParseJobStatus::Completed => counts.completed += 1,
                ParseJobStatus::Failed => counts.failed += 1,
            }
        }
        counts
    }
}
