use serde::{Deserialize, Serialize};

use super::ApiClient;
use crate::error::Result;

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserResponse {
    #[serde(default)]
    pub id: Option<u64>,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub is_superuser: Option<bool>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

impl ApiClient {
    pub async fn login(&self, data: &LoginRequest) -> Result<TokenResponse> {
        self.post("/auth/login/json", data).await
    }

    pub async fn register(&self, data: &RegisterRequest) -> Result<UserResponse> {
        self.post("/auth/register", data).await
    }

    pub async fn current_user(&self) -> Result<UserResponse> {
        self.get("/auth/me").await
    }

    pub async fn refresh_token(&self, refresh_token: &str) -> Result<TokenResponse> {
        self.post("/auth/refresh", &RefreshRequest { refresh_token })
            .await
    }

    pub async fn logout(&self) -> Result<()> {
        let _: serde_json::Value = self.post_empty("/auth/logout", &()).await?;
        Ok(())
    }
}
