//! Strong-typed identifiers.
//!
//! Ids here are deterministic, format-specified strings rather than UUIDs:
//! a project id is a pure function of its root path, a job id is
//! `job_<16hex>`, a task id is `task_<timeBase36>_<random6>`. The formats are
//! part of the persisted data model and validated on the way in.

use std::fmt;
use std::path::Path;
use std::sync::LazyLock;

use rand::Rng;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::utils::hash::sha256_hex;

static PROJECT_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^proj_[0-9a-f]{12}$").expect("static pattern"));

static JOB_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^job_[0-9a-f]{16}$").expect("static pattern"));

const TASK_SUFFIX_CHARSET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

fn to_base36(mut value: u64) -> String {
    if value == 0 {
        return "0".to_owned();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(TASK_SUFFIX_CHARSET[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8(digits).unwrap_or_default()
}

macro_rules! string_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap a raw identifier string.
            #[must_use]
            pub fn new<S: Into<String>>(raw: S) -> Self {
                Self(raw.into())
            }

            /// Borrow the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(raw: &str) -> Self {
                Self(raw.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(raw: String) -> Self {
                Self(raw)
            }
        }
    };
}

string_id!(NodeId, "Identifier of a graph node");
string_id!(AgentId, "Identifier of a swarm agent");
string_id!(SwarmId, "Identifier of a swarm cohort");

/// Deterministic project identifier: `proj_` + first 12 hex chars of the
/// SHA-256 of the absolute root path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(String);

impl ProjectId {
    /// Derive the id from an absolute project root path. Pure: the same path
    /// always yields the same id.
    #[must_use]
    pub fn from_root_path(root: &Path) -> Self {
        let digest = sha256_hex(root.to_string_lossy().as_bytes());
        Self(format!("proj_{}", &digest[..12]))
    }

    /// Returns `true` when `raw` matches `proj_<12hex>`.
    #[must_use]
    pub fn is_valid(raw: &str) -> bool {
        PROJECT_ID_RE.is_match(raw)
    }

    /// Parse and validate a raw project id.
    ///
    /// # Errors
    ///
    /// Returns an invalid-argument error when the format does not match.
    pub fn parse(raw: &str) -> Result<Self> {
        if Self::is_valid(raw) {
            Ok(Self(raw.to_owned()))
        } else {
            Err(Error::invalid_argument(format!(
                "Invalid project id '{raw}': expected proj_<12 hex chars>"
            )))
        }
    }

    /// Borrow the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Background job identifier: `job_<16hex>`, randomly generated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Generate a fresh random job id.
    #[must_use]
    pub fn generate() -> Self {
        let value: u64 = rand::rng().random();
        Self(format!("job_{value:016x}"))
    }

    /// Returns `true` when `raw` matches `job_<16hex>`.
    #[must_use]
    pub fn is_valid(raw: &str) -> bool {
        JOB_ID_RE.is_match(raw)
    }

    /// Parse and validate a raw job id.
    ///
    /// # Errors
    ///
    /// Returns an invalid-argument error when the format does not match.
    pub fn parse(raw: &str) -> Result<Self> {
        if Self::is_valid(raw) {
            Ok(Self(raw.to_owned()))
        } else {
            Err(Error::invalid_argument(format!(
                "Invalid job id '{raw}': expected job_<16 hex chars>"
            )))
        }
    }

    /// Borrow the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Swarm task identifier: `task_<timeBase36>_<random6>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Generate a fresh task id from the current epoch milliseconds and a
    /// random 6-character suffix.
    #[must_use]
    pub fn generate() -> Self {
        let now_ms = chrono::Utc::now().timestamp_millis().max(0) as u64;
        let mut rng = rand::rng();
        let suffix: String = (0..6)
            .map(|_| {
                let idx = rng.random_range(0..TASK_SUFFIX_CHARSET.len());
                TASK_SUFFIX_CHARSET[idx] as char
            })
            .collect();
        Self(format!("task_{}_{suffix}", to_base36(now_ms)))
    }

    /// Wrap a raw task id.
    #[must_use]
    pub fn new<S: Into<String>>(raw: S) -> Self {
        Self(raw.into())
    }

    /// Borrow the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
