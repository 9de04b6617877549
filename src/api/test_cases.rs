use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::ApiClient;
use crate::error::Result;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TestType {
    Ui,
    Api,
    Performance,
    Mobile,
    Security,
    Compatibility,
    /// Any type this client does not know about yet.
    #[serde(other)]
    #[value(skip)]
    Other,
}

impl fmt::Display for TestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TestType::Ui => "ui",
            TestType::Api => "api",
            TestType::Performance => "performance",
            TestType::Mobile => "mobile",
            TestType::Security => "security",
            TestType::Compatibility => "compatibility",
            TestType::Other => "other",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TestCase {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub project_id: u64,
    pub test_type: TestType,
    #[serde(default)]
    pub steps: Option<Vec<Map<String, Value>>>,
    #[serde(default)]
    pub config: Option<Map<String, Value>>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub module: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created_by: Option<u64>,
    #[serde(default)]
    pub owner_id: Option<u64>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TestCaseCreate {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub project_id: u64,
    pub test_type: TestType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub steps: Option<Vec<Map<String, Value>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct TestCaseUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_type: Option<TestType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Filters for `GET /test-cases`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TestCaseQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_type: Option<TestType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
}

impl ApiClient {
    pub async fn list_test_cases(&self, query: &TestCaseQuery) -> Result<Vec<TestCase>> {
        self.get_list("/test-cases", "test_cases", query).await
    }

    pub async fn get_test_case(&self, id: u64) -> Result<TestCase> {
        self.get(&format!("/test-cases/{}", id)).await
    }

    pub async fn create_test_case(&self, data: &TestCaseCreate) -> Result<TestCase> {
        self.post("/test-cases", data).await
    }

    pub async fn update_test_case(&self, id: u64, data: &TestCaseUpdate) -> Result<TestCase> {
        self.put(&format!("/test-cases/{}", id), data).await
    }

    pub async fn delete_test_case(&self, id: u64) -> Result<()> {
        self.delete(&format!("/test-cases/{}", id)).await
    }
}
