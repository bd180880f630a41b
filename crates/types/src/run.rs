use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Lifecycle status of a run as reported by the platform.
///
/// Only `READY` and `RUNNING` are considered in progress; every other value,
/// including ones this client does not know about, ends polling.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RunStatus {
    Ready,
    Running,
    Succeeded,
    Failed,
    TimingOut,
    TimedOut,
    Aborting,
    Aborted,
    Other(String),
}

impl RunStatus {
    pub fn as_str(&self) -> &str {
        match self {
            RunStatus::Ready => "READY",
            RunStatus::Running => "RUNNING",
            RunStatus::Succeeded => "SUCCEEDED",
            RunStatus::Failed => "FAILED",
            RunStatus::TimingOut => "TIMING-OUT",
            RunStatus::TimedOut => "TIMED-OUT",
            RunStatus::Aborting => "ABORTING",
            RunStatus::Aborted => "ABORTED",
            RunStatus::Other(other) => other,
        }
    }

    /// True while the platform still owes us a final status.
    pub fn is_in_progress(&self) -> bool {
        matches!(self, RunStatus::Ready | RunStatus::Running)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RunStatus::Succeeded)
    }
}

impl FromStr for RunStatus {
    type Err = std::convert::Infallible;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Ok(match value {
            "READY" => RunStatus::Ready,
            "RUNNING" => RunStatus::Running,
            "SUCCEEDED" => RunStatus::Succeeded,
            "FAILED" => RunStatus::Failed,
            "TIMING-OUT" => RunStatus::TimingOut,
            "TIMED-OUT" => RunStatus::TimedOut,
            "ABORTING" => RunStatus::Aborting,
            "ABORTED" => RunStatus::Aborted,
            other => RunStatus::Other(other.to_string()),
        })
    }
}

impl From<String> for RunStatus {
    fn from(value: String) -> Self {
        match value.parse() {
            Ok(status) => status,
            Err(never) => match never {},
        }
    }
}

impl From<RunStatus> for String {
    fn from(value: RunStatus) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resource usage counters attached to every run snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RunStats {
    pub input_body_len: u64,
    pub restart_count: u64,
    pub resurrect_count: u64,
    pub mem_avg_bytes: f64,
    pub mem_max_bytes: f64,
    pub mem_current_bytes: f64,
    pub cpu_avg_usage: f64,
    pub cpu_max_usage: f64,
    pub cpu_current_usage: f64,
    pub net_rx_bytes: u64,
    pub net_tx_bytes: u64,
    pub duration_millis: u64,
    pub run_time_secs: f64,
    pub metamorph: u64,
    pub compute_units: f64,
}

impl RunStats {
    /// Run duration rendered as `1h 2m 3s`, `2m 3s` or `3s`.
    pub fn duration_label(&self) -> String {
        format_duration_millis(self.duration_millis)
    }

    /// Peak memory in whole mebibytes.
    pub fn peak_memory_mib(&self) -> u64 {
        (self.mem_max_bytes / 1024.0 / 1024.0).round().max(0.0) as u64
    }

    pub fn cpu_avg_percent(&self) -> f64 {
        self.cpu_avg_usage
    }
}

/// Formats a millisecond duration using the largest non-zero unit first.
pub fn format_duration_millis(duration_millis: u64) -> String {
    let seconds = duration_millis / 1000;
    let minutes = seconds / 60;
    let hours = minutes / 60;
    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes % 60, seconds % 60)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds % 60)
    } else {
        format!("{}s", seconds)
    }
}

/// Snapshot of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    pub id: String,
    pub status: RunStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub stats: RunStats,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
