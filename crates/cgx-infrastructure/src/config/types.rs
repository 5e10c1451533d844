//! Application configuration types.
//!
//! Every section is optional in the YAML; missing fields fall back to the
//! defaults in `cgx_domain::constants`.

use cgx_domain::constants::{discovery, embedding, jobs, parse, swarm, timeouts};
use cgx_domain::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Parse pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseSettings {
    /// Files per chunk handed to one worker invocation
    pub chunk_size: usize,
    /// Minimum file count before the parallel worker pool is engaged
    pub parallel_threshold: usize,
    /// Worker count override; `None` sizes the pool from available CPUs
    pub worker_count: Option<usize>,
    /// Seconds to wait for workers to exit on shutdown
    pub worker_join_timeout_secs: u64,
    /// Globs selecting candidate source files
    pub source_globs: Vec<String>,
    /// Directory names whose subtrees are never parsed
    pub skip_dirs: Vec<String>,
    /// File patterns excluded inside included subtrees
    pub excluded_file_globs: Vec<String>,
}

impl Default for ParseSettings {
    fn default() -> Self {
        Self {
            chunk_size: parse::CHUNK_SIZE,
            parallel_threshold: parse::PARALLEL_THRESHOLD,
            worker_count: None,
            worker_join_timeout_secs: parse::WORKER_JOIN_TIMEOUT_SECS,
            source_globs: discovery::SOURCE_GLOBS.iter().map(|s| (*s).to_owned()).collect(),
            skip_dirs: discovery::SKIP_DIRS.iter().map(|s| (*s).to_owned()).collect(),
            excluded_file_globs: discovery::EXCLUDED_FILE_GLOBS
                .iter()
                .map(|s| (*s).to_owned())
                .collect(),
        }
    }
}

/// Job manager settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JobSettings {
    /// Maximum number of jobs tracked at once
    pub max_jobs: usize,
    /// Age in milliseconds after which terminal jobs are evicted
    pub job_ttl_ms: i64,
    /// Interval between background sweeper passes
    pub sweep_interval_secs: u64,
}

impl Default for JobSettings {
    fn default() -> Self {
        Self {
            max_jobs: jobs::MAX_JOBS,
            job_ttl_ms: jobs::JOB_TTL_MS,
            sweep_interval_secs: jobs::SWEEP_INTERVAL_SECS,
        }
    }
}

/// Swarm coordination settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SwarmSettings {
    /// Intensity below which a decayed pheromone is no longer sensed
    pub pheromone_epsilon: f64,
    /// Minimum affected-node count before workers run in parallel
    pub min_nodes_for_parallel: usize,
    /// Delay between spawning consecutive agents (milliseconds)
    pub agent_spawn_delay_ms: u64,
    /// Orchestrator monitor poll interval (milliseconds)
    pub monitor_interval_ms: u64,
}

impl Default for SwarmSettings {
    fn default() -> Self {
        Self {
            pheromone_epsilon: swarm::PHEROMONE_EPSILON,
            min_nodes_for_parallel: swarm::MIN_NODES_FOR_PARALLEL,
            agent_spawn_delay_ms: swarm::AGENT_SPAWN_DELAY_MS,
            monitor_interval_ms: swarm::MONITOR_INTERVAL_MS,
        }
    }
}

/// Collaborator timeouts (seconds).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutSettings {
    /// Graph store query timeout
    pub store_query_secs: u64,
    /// Graph store connection timeout
    pub store_connect_secs: u64,
    /// Embedding request timeout
    pub embedding_secs: u64,
    /// LLM-assistant request timeout
    pub llm_assistant_secs: u64,
    /// Whole-task timeout for one swarm worker
    pub swarm_worker_secs: u64,
}

impl Default for TimeoutSettings {
    fn default() -> Self {
        Self {
            store_query_secs: timeouts::STORE_QUERY_SECS,
            store_connect_secs: timeouts::STORE_CONNECT_SECS,
            embedding_secs: timeouts::EMBEDDING_SECS,
            llm_assistant_secs: timeouts::LLM_ASSISTANT_SECS,
            swarm_worker_secs: timeouts::SWARM_WORKER_SECS,
        }
    }
}

/// Embedding batcher settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Texts per upstream batch request
    pub batch_size: usize,
    /// Pause between consecutive batches (milliseconds)
    pub inter_batch_delay_ms: u64,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            batch_size: embedding::BATCH_SIZE,
            inter_batch_delay_ms: embedding::INTER_BATCH_DELAY_MS,
        }
    }
}

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Parse pipeline settings
    pub parse: ParseSettings,
    /// Job manager settings
    pub jobs: JobSettings,
    /// Swarm coordination settings
    pub swarm: SwarmSettings,
    /// Collaborator timeouts
    pub timeouts: TimeoutSettings,
    /// Embedding batcher settings
    pub embedding: EmbeddingSettings,
}

impl AppConfig {
    /// Validate cross-field constraints.
    ///
    /// # Errors
    ///
    /// Returns a configuration error naming the offending key.
    pub fn validate(&self) -> Result<()> {
        if self.parse.chunk_size == 0 {
            return Err(Error::ConfigInvalid {
                key: "parse.chunk_size".to_owned(),
                message: "must be at least 1".to_owned(),
            });
        }
        if self.parse.parallel_threshold == 0 {
            return Err(Error::ConfigInvalid {
                key: "parse.parallel_threshold".to_owned(),
                message: "must be at least 1".to_owned(),
            });
        }
        if self.jobs.max_jobs == 0 {
            return Err(Error::ConfigInvalid {
                key: "jobs.max_jobs".to_owned(),
                message: "must be at least 1".to_owned(),
            });
        }
        if !(0.0..1.0).contains(&self.swarm.pheromone_epsilon) {
            return Err(Error::ConfigInvalid {
                key: "swarm.pheromone_epsilon".to_owned(),
                message: "must be in [0, 1)".to_owned(),
            });
        }
        if self.embedding.batch_size == 0 {
            return Err(Error::ConfigInvalid {
                key: "embedding.batch_size".to_owned(),
                message: "must be at least 1".to_owned(),
            });
        }
        Ok(())
    }
}
