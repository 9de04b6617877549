use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::ApiClient;
use crate::error::Result;

/// Assertion types the backend understands.
pub const ASSERTION_TYPES: &[&str] = &[
    "status_code",
    "response_body",
    "response_headers",
    "response_time",
    "database",
    "script",
    "combined",
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssertionLibrary {
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
    pub example: Option<String>,
    #[serde(default)]
    pub is_public: Option<bool>,
    #[serde(default)]
    pub usage_count: Option<u64>,
    #[serde(default)]
    pub created_by: Option<u64>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssertionLibraryCreate {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_public: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AssertionLibraryQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<u64>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_public: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
}

impl ApiClient {
    pub async fn list_assertion_libraries(
        &self,
        query: &AssertionLibraryQuery,
    ) -> Result<Vec<AssertionLibrary>> {
        self.get_list("/assertion-libraries", "assertion_libraries", query)
            .await
    }

    pub async fn get_assertion_library(&self, id: u64) -> Result<AssertionLibrary> {
        self.get(&format!("/assertion-libraries/{}", id)).await
    }

    pub async fn create_assertion_library(
        &self,
        data: &AssertionLibraryCreate,
    ) -> Result<AssertionLibrary> {
        self.post("/assertion-libraries", data).await
    }

    pub async fn update_assertion_library(
        &self,
        id: u64,
        data: &AssertionLibraryCreate,
    ) -> Result<AssertionLibrary> {
        self.put(&format!("/assertion-libraries/{}", id), data).await
    }

    pub async fn delete_assertion_library(&self, id: u64) -> Result<()> {
        self.delete(&format!("/assertion-libraries/{}", id)).await
    }

    /// Record one use of the library; the reply carries the new usage count.
    pub async fn use_assertion_library(&self, id: u64) -> Result<AssertionLibrary> {
        self.post_empty(&format!("/assertion-libraries/{}/use", id), &())
            .await
    }
}
