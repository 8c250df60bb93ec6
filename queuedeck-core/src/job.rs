//! Job and status types shared by queue backends and the panel

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::QueueError;

/// Lifecycle state of a job
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Active,
    Completed,
    Delayed,
    Failed,
    Paused,
    Waiting,
}

impl JobStatus {
    /// The six statuses reported by the panel, in reporting order
    pub const ALL: [JobStatus; 6] = [
        JobStatus::Active,
        JobStatus::Completed,
        JobStatus::Delayed,
        JobStatus::Failed,
        JobStatus::Paused,
        JobStatus::Waiting,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Delayed => "delayed",
            Self::Failed => "failed",
            Self::Paused => "paused",
            Self::Waiting => "waiting",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = QueueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            "delayed" => Ok(Self::Delayed),
            "failed" => Ok(Self::Failed),
            "paused" => Ok(Self::Paused),
            // `wait` is the store-level name of the waiting list
            "waiting" | "wait" => Ok(Self::Waiting),
            other => Err(QueueError::InvalidStatus(other.to_string())),
        }
    }
}

/// Which job types a listing should return
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StatusFilter {
    /// Let the queue library pick its default types
    #[default]
    Default,
    /// Explicit type names, passed to the library verbatim
    Types(Vec<String>),
}

impl StatusFilter {
    /// Every known status
    pub fn all() -> Self {
        Self::Types(JobStatus::ALL.iter().map(|s| s.as_str().to_string()).collect())
    }
}

/// Number of jobs per status
pub type JobCounts = BTreeMap<JobStatus, u64>;

/// Options a job was created with
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempts: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,

    /// Library-specific options the panel does not interpret
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Plain record of a job as reported by the queue library
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobJson {
    pub id: String,
    pub name: String,
    pub data: serde_json::Value,
    pub opts: JobOptions,
    pub progress: serde_json::Value,
    /// Creation time, milliseconds since the epoch
    pub timestamp: i64,
    pub processed_on: Option<i64>,
    pub finished_on: Option<i64>,
    pub attempts_made: u32,
    pub failed_reason: Option<String>,
    pub stacktrace: Vec<String>,
    pub returnvalue: serde_json::Value,
}
