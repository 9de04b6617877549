use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ApiClient;
use crate::error::Result;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ReportCounts {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub passed: u64,
    #[serde(default)]
    pub failed: u64,
    #[serde(default)]
    pub skipped: u64,
}

impl ReportCounts {
    /// Passed share in percent, `None` when nothing ran.
    pub fn pass_rate(&self) -> Option<f64> {
        if self.total == 0 {
            None
        } else {
            Some(self.passed as f64 * 100.0 / self.total as f64)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportSummary {
    pub id: u64,
    #[serde(default)]
    pub execution_id: Option<u64>,
    #[serde(default)]
    pub project_id: Option<u64>,
    #[serde(default)]
    pub test_case_id: Option<u64>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub summary: Option<ReportCounts>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportDetail {
    #[serde(flatten)]
    pub summary: ReportSummary,
    #[serde(default)]
    pub test_case_name: Option<String>,
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(default)]
    pub finished_at: Option<String>,
    #[serde(default)]
    pub environment: Option<String>,
    /// Request/response/assertion detail; shape varies by test type.
    #[serde(default)]
    pub result: Option<Value>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Html,
    Json,
    Doc,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Html => "html",
            ExportFormat::Json => "json",
            ExportFormat::Doc => "doc",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

#[derive(Debug, Deserialize)]
struct ExportResponse {
    content: Value,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ReportQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
}

#[derive(Serialize)]
struct FormatParam {
    format: ExportFormat,
}

#[derive(Serialize)]
struct BatchDelete<'a> {
    report_ids: &'a [u64],
}

impl ApiClient {
    pub async fn list_reports(&self, query: &ReportQuery) -> Result<Vec<ReportSummary>> {
        self.get_list("/reports", "reports", query).await
    }

    pub async fn get_report(&self, id: u64) -> Result<ReportDetail> {
        self.get(&format!("/reports/{}", id)).await
    }

    /// Export a report; JSON exports that come back structured are pretty-printed.
    pub async fn export_report(&self, id: u64, format: ExportFormat) -> Result<String> {
        let response: ExportResponse = self
            .get_with_query(&format!("/reports/{}/export", id), &FormatParam { format })
            .await?;
        Ok(match response.content {
            Value::String(s) => s,
            other => serde_json::to_string_pretty(&other)?,
        })
    }

    pub async fn delete_report(&self, id: u64) -> Result<()> {
        self.delete(&format!("/reports/{}", id)).await
    }

    pub async fn batch_delete_reports(&self, ids: &[u64]) -> Result<()> {
        self.delete_with_body("/reports/batch", &BatchDelete { report_ids: ids })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pass_rate() {
        let counts = ReportCounts {
            total: 8,
            passed: 6,
            failed: 2,
            skipped: 0,
        };
        assert_eq!(counts.pass_rate(), Some(75.0));
        assert_eq!(ReportCounts::default().pass_rate(), None);
    }

    #[test]
    fn test_detail_flattens_summary() {
        let detail: ReportDetail = serde_json::from_value(json!({
            "id": 12,
            "execution_id": 30,
            "project_id": 1,
            "status": "passed",
            "summary": {"total": 3, "passed": 3, "failed": 0, "skipped": 0},
            "test_case_name": "login works",
            "result": {"assertions": []}
        }))
        .unwrap();
        assert_eq!(detail.summary.id, 12);
        assert_eq!(detail.summary.summary.unwrap().passed, 3);
        assert_eq!(detail.test_case_name.as_deref(), Some("login works"));
    }
}
