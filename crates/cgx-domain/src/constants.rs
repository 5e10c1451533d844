//! Workspace-wide constants and tunable defaults.
//!
//! Values here are the defaults merged under caller- or config-supplied
//! overrides; nothing reads them directly at runtime except the config layer
//! and the engines that document them.

/// File discovery defaults for change detection and parsing.
pub mod discovery {
    /// Globs selecting candidate source files under the project root.
    pub const SOURCE_GLOBS: &[&str] = &[
        "**/*.ts",
        "**/*.tsx",
        "**/*.js",
        "**/*.jsx",
        "**/*.mjs",
        "**/*.cjs",
    ];

    /// Directory names whose subtrees are never considered for parsing.
    pub const SKIP_DIRS: &[&str] = &["node_modules", "dist", "build", "coverage"];

    /// File patterns excluded even inside included subtrees.
    pub const EXCLUDED_FILE_GLOBS: &[&str] = &["**/*.d.ts", "**/*.spec.ts", "**/*.test.ts"];
}

/// Impact engine defaults.
pub mod impact {
    /// Relationship weights answering "what breaks if I modify this?".
    /// Inheritance is a hard contract; callers are usually looser.
    pub const RELATIONSHIP_WEIGHTS: &[(&str, f64)] = &[
        ("EXTENDS", 0.95),
        ("IMPLEMENTS", 0.95),
        ("CALLS", 0.75),
        ("HAS_MEMBER", 0.65),
        ("TYPED_AS", 0.60),
        ("IMPORTS", 0.50),
        ("EXPORTS", 0.50),
        ("DECORATED_WITH", 0.40),
        ("CONTAINS", 0.30),
        ("HAS_PARAMETER", 0.30),
    ];

    /// Weight assumed for a relationship type absent from the weight map.
    pub const UNKNOWN_RELATIONSHIP_WEIGHT: f64 = 0.5;

    /// Relationship types counted as high-risk hits in the risk score.
    pub const HIGH_RISK_RELATIONSHIPS: &[&str] = &["EXTENDS", "IMPLEMENTS"];

    /// Minimum edge weight for inclusion in the critical-path list.
    pub const CRITICAL_PATH_WEIGHT: f64 = 0.6;

    /// Maximum number of critical paths reported per analysis.
    pub const MAX_CRITICAL_PATHS: usize = 10;
}

/// Dead-code engine defaults.
pub mod dead_code {
    /// File patterns treated as framework entry points in addition to the
    /// project's own semantic types.
    pub const ENTRY_POINT_FILE_GLOBS: &[&str] = &[
        "**/main.ts",
        "**/index.ts",
        "**/app.ts",
        "**/server.ts",
        "**/routes/**",
        "**/*.routes.ts",
        "**/pages/**",
    ];

    /// Size of the files-by-density leaderboard in the summary.
    pub const TOP_FILES_LIMIT: usize = 20;
}

/// Parse pipeline defaults.
pub mod parse {
    /// Files per chunk handed to one worker invocation.
    pub const CHUNK_SIZE: usize = 20;

    /// Minimum file count before the parallel worker pool is engaged.
    pub const PARALLEL_THRESHOLD: usize = 100;

    /// Fraction of available CPUs granted to the worker pool.
    pub const POOL_CPU_FRACTION: f64 = 0.75;

    /// Seconds to wait for a worker to exit after `Terminate` before the
    /// pool stops waiting and detaches it.
    pub const WORKER_JOIN_TIMEOUT_SECS: u64 = 15;

    /// Prefix for pipelined-import temp files
    /// (`<prefix>-<epochMs>-<16hex>.json`).
    pub const TEMP_FILE_PREFIX: &str = "cgx-chunk";
}

/// Job manager defaults.
pub mod jobs {
    /// Maximum number of jobs tracked at once.
    pub const MAX_JOBS: usize = 100;

    /// Age after which terminal jobs become eligible for eviction.
    pub const JOB_TTL_MS: i64 = 60 * 60 * 1000;

    /// Interval between background sweeper passes.
    pub const SWEEP_INTERVAL_SECS: u64 = 5 * 60;
}

/// Swarm coordination defaults.
pub mod swarm {
    /// Intensity below which a decayed pheromone is no longer sensed.
    pub const PHEROMONE_EPSILON: f64 = 0.01;

    /// Minimum affected-node count before a swarm runs workers in parallel.
    pub const MIN_NODES_FOR_PARALLEL: usize = 3;

    /// Delay between spawning consecutive swarm agents.
    pub const AGENT_SPAWN_DELAY_MS: u64 = 500;

    /// Orchestrator monitor poll interval.
    pub const MONITOR_INTERVAL_MS: u64 = 1000;
}

/// Collaborator timeout defaults (seconds unless noted).
pub mod timeouts {
    /// Graph store query timeout.
    pub const STORE_QUERY_SECS: u64 = 30;

    /// Graph store connection timeout.
    pub const STORE_CONNECT_SECS: u64 = 10;

    /// Embedding request timeout.
    pub const EMBEDDING_SECS: u64 = 60;

    /// LLM-assistant request timeout.
    pub const LLM_ASSISTANT_SECS: u64 = 120;

    /// Whole-task timeout for one swarm worker.
    pub const SWARM_WORKER_SECS: u64 = 30 * 60;
}

/// Embedding batcher defaults.
pub mod embedding {
    /// Texts per upstream batch request.
    pub const BATCH_SIZE: usize = 100;

    /// Pause between consecutive batches.
    pub const INTER_BATCH_DELAY_MS: u64 = 500;
}
