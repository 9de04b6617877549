use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::ApiClient;
use crate::error::Result;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TestPlan {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub project_id: Option<u64>,
    #[serde(default)]
    pub test_case_ids: Option<Vec<u64>>,
    #[serde(default)]
    pub config: Option<Map<String, Value>>,
    #[serde(default)]
    pub schedule: Option<Value>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TestPlanCreate {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub project_id: u64,
    pub test_case_ids: Vec<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<Map<String, Value>>,
}

/// Reply of `POST /test-plans/{id}/execute`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExecuteResponse {
    pub execution_id: u64,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Default, Serialize)]
struct ProjectFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    project_id: Option<u64>,
}

impl ApiClient {
    pub async fn list_test_plans(&self, project_id: Option<u64>) -> Result<Vec<TestPlan>> {
        self.get_list("/test-plans", "test_plans", &ProjectFilter { project_id })
            .await
    }

    pub async fn get_test_plan(&self, id: u64) -> Result<TestPlan> {
        self.get(&format!("/test-plans/{}", id)).await
    }

    pub async fn create_test_plan(&self, data: &TestPlanCreate) -> Result<TestPlan> {
        self.post("/test-plans", data).await
    }

    pub async fn delete_test_plan(&self, id: u64) -> Result<()> {
        self.delete(&format!("/test-plans/{}", id)).await
    }

    pub async fn execute_test_plan(&self, id: u64) -> Result<ExecuteResponse> {
        self.post_empty(&format!("/test-plans/{}/execute", id), &())
            .await
    }
}
