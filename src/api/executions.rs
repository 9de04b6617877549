use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{extract_page, ApiClient, Page};
use crate::error::Result;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    Pending,
    Running,
    Passed,
    Failed,
    Cancelled,
    Error,
    #[serde(other)]
    #[value(skip)]
    Unknown,
}

impl ExecutionStatus {
    /// A run in this state will not change any more.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ExecutionStatus::Passed
                | ExecutionStatus::Failed
                | ExecutionStatus::Cancelled
                | ExecutionStatus::Error
        )
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExecutionStatus::Pending => "pending",
            ExecutionStatus::Running => "running",
            ExecutionStatus::Passed => "passed",
            ExecutionStatus::Failed => "failed",
            ExecutionStatus::Cancelled => "cancelled",
            ExecutionStatus::Error => "error",
            ExecutionStatus::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TestExecution {
    pub id: u64,
    #[serde(default)]
    pub test_case_id: Option<u64>,
    #[serde(default)]
    pub project_id: Option<u64>,
    pub status: ExecutionStatus,
    #[serde(default)]
    pub result: Option<Map<String, Value>>,
    #[serde(default)]
    pub logs: Option<String>,
    #[serde(default)]
    pub config: Option<Map<String, Value>>,
    #[serde(default)]
    pub environment: Option<String>,
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(default)]
    pub finished_at: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TestExecutionCreate {
    pub test_case_id: u64,
    pub project_id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
}

/// Logs arrive either as one text blob or as a list of lines.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
enum LogBody {
    Text(String),
    Lines(Vec<String>),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExecutionLogs {
    #[serde(default)]
    pub execution_id: Option<u64>,
    #[serde(default)]
    logs: Option<LogBody>,
    #[serde(default)]
    pub status: Option<ExecutionStatus>,
}

impl ExecutionLogs {
    pub fn lines(&self) -> Vec<&str> {
        match &self.logs {
            Some(LogBody::Text(text)) => text.lines().collect(),
            Some(LogBody::Lines(lines)) => lines.iter().map(String::as_str).collect(),
            None => Vec::new(),
        }
    }

    pub fn text(&self) -> String {
        self.lines().join("\n")
    }
}

/// Filters for `GET /test-executions`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExecutionQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_case_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ExecutionStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
}

#[derive(Serialize)]
struct BatchDelete<'a> {
    execution_ids: &'a [u64],
}

impl ApiClient {
    pub async fn list_executions(&self, query: &ExecutionQuery) -> Result<Page<TestExecution>> {
        let value: Value = self.get_with_query("/test-executions", query).await?;
        extract_page(value, "executions")
    }

    pub async fn get_execution(&self, id: u64) -> Result<TestExecution> {
        self.get(&format!("/test-executions/{}", id)).await
    }

    pub async fn create_execution(&self, data: &TestExecutionCreate) -> Result<TestExecution> {
        self.post("/test-executions", data).await
    }

    pub async fn execution_logs(&self, id: u64) -> Result<ExecutionLogs> {
        self.get(&format!("/test-executions/{}/logs", id)).await
    }

    pub async fn delete_execution(&self, id: u64) -> Result<()> {
        self.delete(&format!("/test-executions/{}", id)).await
    }

    pub async fn batch_delete_executions(&self, ids: &[u64]) -> Result<()> {
        self.delete_with_body("/test-executions/batch", &BatchDelete { execution_ids: ids })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_terminal_statuses() {
        assert!(!ExecutionStatus::Pending.is_terminal());
        assert!(!ExecutionStatus::Running.is_terminal());
        assert!(ExecutionStatus::Passed.is_terminal());
        assert!(ExecutionStatus::Failed.is_terminal());
        assert!(ExecutionStatus::Cancelled.is_terminal());
        assert!(ExecutionStatus::Error.is_terminal());
        assert!(!ExecutionStatus::Unknown.is_terminal());
    }

    #[test]
    fn test_logs_as_text() {
        let logs: ExecutionLogs = serde_json::from_value(json!({
            "execution_id": 4,
            "logs": "start\nstep 1 ok\ndone",
            "status": "passed"
        }))
        .unwrap();
        assert_eq!(logs.lines(), vec!["start", "step 1 ok", "done"]);
        assert_eq!(logs.status, Some(ExecutionStatus::Passed));
    }

    #[test]
    fn test_logs_as_lines() {
        let logs: ExecutionLogs =
            serde_json::from_value(json!({"logs": ["a", "b"]})).unwrap();
        assert_eq!(logs.text(), "a\nb");
    }

    #[test]
    fn test_missing_logs() {
        let logs: ExecutionLogs = serde_json::from_value(json!({"logs": null})).unwrap();
        assert!(logs.lines().is_empty());
    }

    #[test]
    fn test_unknown_status() {
        let exec: TestExecution =
            serde_json::from_value(json!({"id": 1, "status": "queued"})).unwrap();
        assert_eq!(exec.status, ExecutionStatus::Unknown);
    }
}
