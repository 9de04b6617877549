use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::ApiClient;
use crate::error::Result;

/// The three resources living under `/data-drivers`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataDriverKind {
    Source,
    Template,
    Generator,
}

impl DataDriverKind {
    pub fn path(self) -> &'static str {
        match self {
            DataDriverKind::Source => "/data-drivers/data-sources",
            DataDriverKind::Template => "/data-drivers/data-templates",
            DataDriverKind::Generator => "/data-drivers/data-generators",
        }
    }

    fn list_key(self) -> &'static str {
        match self {
            DataDriverKind::Source => "data_sources",
            DataDriverKind::Template => "data_templates",
            DataDriverKind::Generator => "data_generators",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DataDriverKind::Source => "data source",
            DataDriverKind::Template => "data template",
            DataDriverKind::Generator => "data generator",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DataSource {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub project_id: Option<u64>,
    #[serde(default)]
    pub config: Option<Map<String, Value>>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DataTemplate {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub data_source_id: u64,
    #[serde(default)]
    pub project_id: Option<u64>,
    #[serde(default)]
    pub mapping: Option<Map<String, Value>>,
    #[serde(default)]
    pub filters: Option<Map<String, Value>>,
    #[serde(default)]
    pub loop_strategy: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DataGenerator {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub project_id: Option<u64>,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub config: Option<Map<String, Value>>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Body for creating any data-driver resource; fields that do not apply to
/// the target kind are left unset.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DataDriverCreate {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_source_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mapping: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loop_strategy: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DataDriverQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<u64>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_source_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

impl ApiClient {
    pub async fn list_data_drivers<T: DeserializeOwned>(
        &self,
        kind: DataDriverKind,
        query: &DataDriverQuery,
    ) -> Result<Vec<T>> {
        self.get_list(kind.path(), kind.list_key(), query).await
    }

    pub async fn get_data_driver<T: DeserializeOwned>(
        &self,
        kind: DataDriverKind,
        id: u64,
    ) -> Result<T> {
        self.get(&format!("{}/{}", kind.path(), id)).await
    }

    pub async fn create_data_driver<T: DeserializeOwned>(
        &self,
        kind: DataDriverKind,
        data: &DataDriverCreate,
    ) -> Result<T> {
        self.post(kind.path(), data).await
    }

    pub async fn delete_data_driver(&self, kind: DataDriverKind, id: u64) -> Result<()> {
        self.delete(&format!("{}/{}", kind.path(), id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_template_requires_source() {
        let result: std::result::Result<DataTemplate, _> =
            serde_json::from_value(json!({"id": 1, "name": "users"}));
        assert!(result.is_err());

        let template: DataTemplate = serde_json::from_value(json!({
            "id": 1,
            "name": "users",
            "data_source_id": 4,
            "loop_strategy": "sequential"
        }))
        .unwrap();
        assert_eq!(template.data_source_id, 4);
    }

    #[test]
    fn test_create_body_for_source() {
        let body = DataDriverCreate {
            name: "accounts.csv".into(),
            kind: Some("csv".into()),
            project_id: Some(2),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"name": "accounts.csv", "type": "csv", "project_id": 2})
        );
    }
}
