use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::ApiClient;
use crate::error::Result;

/// One data-driven iteration: request overrides plus the assertions to run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TestDataItem {
    #[serde(default)]
    pub request: Map<String, Value>,
    #[serde(default)]
    pub assertions: Vec<Map<String, Value>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TestDataConfig {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub project_id: Option<u64>,
    #[serde(default)]
    pub data: Vec<TestDataItem>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TestDataConfigListItem {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub project_id: Option<u64>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub data_count: u64,
    #[serde(default)]
    pub associated_case_count: u64,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TestDataConfigCreate {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<u64>,
    pub data: Vec<TestDataItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

/// A test case currently bound to a test data config.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UsageInfo {
    pub test_case_id: u64,
    pub test_case_name: String,
    #[serde(default)]
    pub project_id: Option<u64>,
    #[serde(default)]
    pub project_name: Option<String>,
    #[serde(default)]
    pub associated_at: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct TestDataQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

#[derive(Serialize)]
struct Association {
    test_data_config_id: u64,
}

impl ApiClient {
    pub async fn list_test_data_configs(
        &self,
        query: &TestDataQuery,
    ) -> Result<Vec<TestDataConfigListItem>> {
        self.get_list("/test-data-configs", "test_data_configs", query)
            .await
    }

    pub async fn get_test_data_config(&self, id: u64) -> Result<TestDataConfig> {
        self.get(&format!("/test-data-configs/{}", id)).await
    }

    pub async fn create_test_data_config(
        &self,
        data: &TestDataConfigCreate,
    ) -> Result<TestDataConfig> {
        self.post("/test-data-configs", data).await
    }

    pub async fn delete_test_data_config(&self, id: u64) -> Result<()> {
        self.delete(&format!("/test-data-configs/{}", id)).await
    }

    pub async fn test_data_usage(&self, id: u64) -> Result<Vec<UsageInfo>> {
        self.get_list(&format!("/test-data-configs/{}/usage", id), "usage", &())
            .await
    }

    pub async fn associate_test_data(&self, test_case_id: u64, config_id: u64) -> Result<()> {
        let _: Value = self
            .post(
                &format!("/test-cases/{}/test-data-configs", test_case_id),
                &Association {
                    test_data_config_id: config_id,
                },
            )
            .await?;
        Ok(())
    }

    pub async fn disassociate_test_data(&self, test_case_id: u64, config_id: u64) -> Result<()> {
        self.delete(&format!(
            "/test-cases/{}/test-data-configs/{}",
            test_case_id, config_id
        ))
        .await
    }

    pub async fn test_case_data_configs(&self, test_case_id: u64) -> Result<Vec<TestDataConfig>> {
        self.get_list(
            &format!("/test-cases/{}/test-data-configs", test_case_id),
            "test_data_configs",
            &(),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_config_with_items() {
        let config: TestDataConfig = serde_json::from_value(json!({
            "id": 5,
            "name": "login matrix",
            "data": [
                {"request": {"body": {"user": "a"}}, "assertions": [{"type": "status_code", "expected": 200}]},
                {"request": {"body": {"user": "b"}}, "assertions": []}
            ]
        }))
        .unwrap();
        assert_eq!(config.data.len(), 2);
        assert_eq!(config.data[0].assertions.len(), 1);
    }

    #[test]
    fn test_list_item_defaults_counts() {
        let item: TestDataConfigListItem =
            serde_json::from_value(json!({"id": 1, "name": "empty"})).unwrap();
        assert_eq!(item.data_count, 0);
        assert!(!item.is_active);
    }
}
