use serde::{Deserialize, Serialize};

use super::ApiClient;
use crate::error::Result;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Project {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub owner_id: Option<u64>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectCreate {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ProjectUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ProjectUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none()
    }
}

impl ApiClient {
    pub async fn list_projects(&self) -> Result<Vec<Project>> {
        self.get_list("/projects", "projects", &()).await
    }

    pub async fn get_project(&self, id: u64) -> Result<Project> {
        self.get(&format!("/projects/{}", id)).await
    }

    pub async fn create_project(&self, data: &ProjectCreate) -> Result<Project> {
        self.post("/projects", data).await
    }

    pub async fn update_project(&self, id: u64, data: &ProjectUpdate) -> Result<Project> {
        self.put(&format!("/projects/{}", id), data).await
    }

    pub async fn delete_project(&self, id: u64) -> Result<()> {
        self.delete(&format!("/projects/{}", id)).await
    }
}
