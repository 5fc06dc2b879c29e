//! Result payloads produced by the monitor and digest passes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One delivered alert: the task name and the owner it went to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertRecord {
    pub task: String,
    pub user: String,
}

/// Running counters for a monitor pass, built fresh per invocation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RiskReport {
    pub checked: u32,
    pub alerts_sent: u32,
    pub alerts: Vec<AlertRecord>,
}

/// Result of a digest pass: how many digests went out and to whom.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DigestReport {
    pub status: String,
    pub digest_sent: u32,
    pub owners: Vec<String>,
}

/// A pass either completes with a report or fails with an error payload.
///
/// Failures serialize as `{error, detail}` or `{error, raw}` objects inside a
/// 200 response; only handler-level faults become HTTP errors.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum PassOutcome<T> {
    Completed(T),
    Failed(PassFailure),
}

impl<T> PassOutcome<T> {
    pub fn report(&self) -> Option<&T> {
        match self {
            PassOutcome::Completed(report) => Some(report),
            PassOutcome::Failed(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&PassFailure> {
        match self {
            PassOutcome::Completed(_) => None,
            PassOutcome::Failed(failure) => Some(failure),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PassFailure {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<Value>,
}

impl PassFailure {
    pub fn fetch_failed(detail: impl Into<String>) -> Self {
        PassFailure {
            error: "Fetch failed".to_string(),
            detail: Some(detail.into()),
            raw: None,
        }
    }

    pub fn invalid_task_format(raw: Value) -> Self {
        PassFailure {
            error: "Invalid task format".to_string(),
            detail: None,
            raw: Some(raw),
        }
    }
}
