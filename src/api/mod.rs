pub mod assertions;
pub mod auth;
pub mod data_drivers;
pub mod executions;
pub mod projects;
pub mod reports;
pub mod reviews;
pub mod test_cases;
pub mod test_data;
pub mod test_plans;

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::Config;
use crate::error::{QgError, Result};

pub use assertions::{AssertionLibrary, AssertionLibraryCreate, AssertionLibraryQuery};
pub use auth::{LoginRequest, RegisterRequest, TokenResponse, UserResponse};
pub use data_drivers::{
    DataDriverCreate, DataDriverKind, DataDriverQuery, DataGenerator, DataSource, DataTemplate,
};
pub use executions::{
    ExecutionLogs, ExecutionQuery, ExecutionStatus, TestExecution, TestExecutionCreate,
};
pub use projects::{Project, ProjectCreate, ProjectUpdate};
pub use reports::{ExportFormat, ReportCounts, ReportDetail, ReportQuery, ReportSummary};
pub use reviews::{
    ReviewComment, ReviewCommentCreate, ReviewQuery, ReviewStatus, TestCaseReview,
    TestCaseReviewCreate, TestCaseReviewUpdate,
};
pub use test_cases::{TestCase, TestCaseCreate, TestCaseQuery, TestCaseUpdate, TestType};
pub use test_data::{
    TestDataConfig, TestDataConfigCreate, TestDataConfigListItem, TestDataItem, TestDataQuery,
    UsageInfo,
};
pub use test_plans::{ExecuteResponse, TestPlan, TestPlanCreate};

/// Thin async client over the QualityGuard REST API.
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

/// Paginated list as returned by `/test-executions`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub skip: u64,
    pub limit: u64,
}

impl ApiClient {
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("qg/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| QgError::Other(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.is_empty()),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            &config.api.url,
            config.api.token.clone(),
            Duration::from_secs(config.api.timeout_secs),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(%method, %url, "api request");
        let mut req = self.client.request(method, url);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        req
    }

    /// Map a response to its decoded body, or to a `QgError` for non-2xx.
    async fn into_result<T: DeserializeOwned>(path: &str, response: Response) -> Result<T> {
        let status = response.status();
        tracing::debug!(status = status.as_u16(), path, "api response");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(QgError::from_status(status.as_u16(), &body, path));
        }

        let text = response.text().await?;
        // DELETE endpoints often reply with an empty body
        let text = if text.trim().is_empty() { "null" } else { text.as_str() };
        Ok(serde_json::from_str(text)?)
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.request(Method::GET, path).send().await?;
        Self::into_result(path, response).await
    }

    pub async fn get_with_query<T, Q>(&self, path: &str, query: &Q) -> Result<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let response = self.request(Method::GET, path).query(query).send().await?;
        Self::into_result(path, response).await
    }

    pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let response = self.request(Method::POST, path).json(body).send().await?;
        Self::into_result(path, response).await
    }

    /// POST with no body and optional query parameters.
    pub async fn post_empty<T, Q>(&self, path: &str, query: &Q) -> Result<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let response = self.request(Method::POST, path).query(query).send().await?;
        Self::into_result(path, response).await
    }

    pub async fn put<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let response = self.request(Method::PUT, path).json(body).send().await?;
        Self::into_result(path, response).await
    }

    pub async fn delete(&self, path: &str) -> Result<()> {
        let response = self.request(Method::DELETE, path).send().await?;
        let _: Value = Self::into_result(path, response).await?;
        Ok(())
    }

    pub async fn delete_with_body<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<()> {
        let response = self.request(Method::DELETE, path).json(body).send().await?;
        let _: Value = Self::into_result(path, response).await?;
        Ok(())
    }

    /// GET a list endpoint and normalise whatever envelope it uses.
    pub async fn get_list<T, Q>(&self, path: &str, key: &str, query: &Q) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let value: Value = self.get_with_query(path, query).await?;
        extract_list(value, key)
    }
}

/// Decode a list from any of the shapes the backend uses: a bare array,
/// `{ <key>: [...] }`, or a paginated `{ items: [...] }`. Anything else is
/// treated as an empty list.
pub fn extract_list<T: DeserializeOwned>(value: Value, key: &str) -> Result<Vec<T>> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove(key) {
            Some(Value::Array(items)) => items,
            _ => match map.remove("items") {
                Some(Value::Array(items)) => items,
                _ => {
                    tracing::warn!(key, "unrecognised list response shape");
                    Vec::new()
                }
            },
        },
        _ => Vec::new(),
    };

    items
        .into_iter()
        .map(|item| serde_json::from_value(item).map_err(QgError::from))
        .collect()
}

/// Decode a paginated list, synthesising pagination for legacy shapes.
pub fn extract_page<T: DeserializeOwned>(value: Value, key: &str) -> Result<Page<T>> {
    let paginated = value.get("items").map(Value::is_array).unwrap_or(false)
        && value.get("total").map(Value::is_number).unwrap_or(false);

    if paginated {
        let skip = value.get("skip").and_then(Value::as_u64).unwrap_or(0);
        let limit = value.get("limit").and_then(Value::as_u64).unwrap_or(100);
        let total = value.get("total").and_then(Value::as_u64).unwrap_or(0);
        let items = extract_list(value, "items")?;
        return Ok(Page {
            items,
            total,
            skip,
            limit,
        });
    }

    let items: Vec<T> = extract_list(value, key)?;
    let len = items.len() as u64;
    Ok(Page {
        items,
        total: len,
        skip: 0,
        limit: len,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Item {
        id: u64,
    }

    #[test]
    fn test_extract_list_bare_array() {
        let items: Vec<Item> = extract_list(json!([{"id": 1}, {"id": 2}]), "projects").unwrap();
        assert_eq!(items, vec![Item { id: 1 }, Item { id: 2 }]);
    }

    #[test]
    fn test_extract_list_keyed_envelope() {
        let items: Vec<Item> = extract_list(json!({"projects": [{"id": 7}]}), "projects").unwrap();
        assert_eq!(items, vec![Item { id: 7 }]);
    }

    #[test]
    fn test_extract_list_items_envelope() {
        let items: Vec<Item> =
            extract_list(json!({"items": [{"id": 3}], "total": 1}), "test_cases").unwrap();
        assert_eq!(items, vec![Item { id: 3 }]);
    }

    #[test]
    fn test_extract_list_unknown_shape_is_empty() {
        let items: Vec<Item> = extract_list(json!({"data": "nope"}), "projects").unwrap();
        assert!(items.is_empty());
        let items: Vec<Item> = extract_list(Value::Null, "projects").unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn test_extract_list_bad_item_is_error() {
        let result: Result<Vec<Item>> = extract_list(json!([{"id": "x"}]), "projects");
        assert!(matches!(result, Err(QgError::Json(_))));
    }

    #[test]
    fn test_extract_page_paginated() {
        let page: Page<Item> = extract_page(
            json!({"items": [{"id": 1}], "total": 40, "skip": 20, "limit": 10}),
            "executions",
        )
        .unwrap();
        assert_eq!(page.total, 40);
        assert_eq!(page.skip, 20);
        assert_eq!(page.limit, 10);
        assert_eq!(page.items.len(), 1);
    }

    #[test]
    fn test_extract_page_legacy_shapes() {
        let page: Page<Item> =
            extract_page(json!({"executions": [{"id": 1}, {"id": 2}]}), "executions").unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.limit, 2);

        let page: Page<Item> = extract_page(json!([{"id": 5}]), "executions").unwrap();
        assert_eq!(page.items, vec![Item { id: 5 }]);
        assert_eq!(page.skip, 0);
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client =
            ApiClient::new("http://localhost:8000/api/v1/", None, Duration::from_secs(5)).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8000/api/v1");
        assert!(!client.has_token());
    }

    #[test]
    fn test_empty_token_is_ignored() {
        let client = ApiClient::new(
            "http://localhost:8000/api/v1",
            Some(String::new()),
            Duration::from_secs(5),
        )
        .unwrap();
        assert!(!client.has_token());
    }
}
