//! Moving test cases in and out of QualityGuard: curl commands, Postman
//! collections and OpenAPI documents in; Postman collections and HTML out.

pub mod curl;
pub mod html;
pub mod openapi;
pub mod postman;

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::api::{TestCase, TestCaseCreate, TestType};
use crate::assertions::Assertion;

/// Default per-request timeout written into imported cases, in seconds.
pub const DEFAULT_CASE_TIMEOUT: u64 = 30;

/// An API test case before it is attached to a project.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CaseDraft {
    pub name: String,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub method: String,
    /// Request path, or the full URL when the source had no base URL concept.
    pub path: String,
    pub headers: BTreeMap<String, String>,
    pub params: Map<String, Value>,
    pub body: Option<Value>,
    pub assertions: Vec<Assertion>,
    pub timeout: u64,
}

impl CaseDraft {
    pub fn new(method: &str, path: &str) -> Self {
        let method = method.to_ascii_uppercase();
        Self {
            name: format!("{} {}", method, path),
            description: None,
            tags: Vec::new(),
            method,
            path: path.to_string(),
            headers: BTreeMap::new(),
            params: Map::new(),
            body: None,
            assertions: Vec::new(),
            timeout: DEFAULT_CASE_TIMEOUT,
        }
    }

    fn step(&self) -> Map<String, Value> {
        let mut step = Map::new();
        step.insert("method".into(), json!(self.method));
        step.insert("path".into(), json!(self.path));
        step.insert("headers".into(), json!(self.headers));
        step.insert("params".into(), Value::Object(self.params.clone()));
        step.insert("body".into(), self.body.clone().unwrap_or(Value::Null));
        step
    }

    fn config(&self) -> Map<String, Value> {
        let mut config = Map::new();
        if !self.assertions.is_empty() {
            config.insert("assertions".into(), json!(self.assertions));
        }
        config.insert("timeout".into(), json!(self.timeout));
        config
    }

    /// Request body for `POST /test-cases`.
    pub fn to_create(&self, project_id: u64) -> TestCaseCreate {
        TestCaseCreate {
            name: self.name.clone(),
            description: self.description.clone(),
            project_id,
            test_type: TestType::Api,
            steps: Some(vec![self.step()]),
            config: Some(self.config()),
            tags: if self.tags.is_empty() {
                None
            } else {
                Some(self.tags.clone())
            },
        }
    }

    /// Rebuild a draft from a stored API test case; `None` for non-API cases.
    pub fn from_test_case(case: &TestCase) -> Option<Self> {
        if case.test_type != TestType::Api {
            return None;
        }

        let step = case
            .steps
            .as_ref()
            .and_then(|steps| steps.first())
            .cloned()
            .unwrap_or_default();
        let text = |key: &str| step.get(key).and_then(Value::as_str).map(str::to_string);

        let method = text("method").unwrap_or_else(|| "GET".to_string());
        let path = text("path").or_else(|| text("url")).unwrap_or_default();

        let mut draft = CaseDraft::new(&method, &path);
        draft.name = case.name.clone();
        draft.description = case.description.clone();
        draft.tags = case.tags.clone().unwrap_or_default();

        if let Some(Value::Object(headers)) = step.get("headers") {
            draft.headers = headers
                .iter()
                .map(|(k, v)| {
                    let v = match v {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    };
                    (k.clone(), v)
                })
                .collect();
        }
        if let Some(Value::Object(params)) = step.get("params") {
            draft.params = params.clone();
        }
        draft.body = step.get("body").filter(|b| !b.is_null()).cloned();

        if let Some(config) = &case.config {
            if let Some(Value::Array(items)) = config.get("assertions") {
                draft.assertions = items
                    .iter()
                    .filter_map(|a| serde_json::from_value(a.clone()).ok())
                    .collect();
            }
            if let Some(timeout) = config.get("timeout").and_then(Value::as_u64) {
                draft.timeout = timeout;
            }
        }

        Some(draft)
    }
}

/// Stringify a JSON scalar the way it would appear in a query string or form.
pub(crate) fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_create_shape() {
        let mut draft = CaseDraft::new("post", "/users");
        draft.body = Some(json!({"name": "bob"}));
        draft.assertions.push(Assertion::StatusCode { expected: 201 });

        let create = draft.to_create(7);
        assert_eq!(create.project_id, 7);
        assert_eq!(create.test_type, TestType::Api);
        assert_eq!(create.name, "POST /users");

        let step = &create.steps.as_ref().unwrap()[0];
        assert_eq!(step["method"], json!("POST"));
        assert_eq!(step["body"], json!({"name": "bob"}));

        let config = create.config.unwrap();
        assert_eq!(config["timeout"], json!(30));
        assert_eq!(
            config["assertions"],
            json!([{"type": "status_code", "expected": 201}])
        );
        assert!(create.tags.is_none());
    }

    #[test]
    fn test_no_assertions_key_when_empty() {
        let config = CaseDraft::new("GET", "/health").to_create(1).config.unwrap();
        assert!(!config.contains_key("assertions"));
    }

    #[test]
    fn test_round_trip_through_test_case() {
        let mut draft = CaseDraft::new("PUT", "/items/1");
        draft.headers.insert("X-Trace".into(), "1".into());
        draft.params.insert("dry".into(), json!("true"));
        draft.assertions.push(Assertion::StatusCode { expected: 200 });
        draft.timeout = 10;
        let create = draft.to_create(3);

        let case = TestCase {
            id: 9,
            name: create.name.clone(),
            description: None,
            project_id: 3,
            test_type: TestType::Api,
            steps: create.steps.clone(),
            config: create.config.clone(),
            tags: None,
            module: None,
            status: None,
            created_by: None,
            owner_id: None,
            created_at: None,
            updated_at: None,
        };
        assert_eq!(CaseDraft::from_test_case(&case), Some(draft));
    }

    #[test]
    fn test_ui_case_not_exported() {
        let case = TestCase {
            id: 1,
            name: "click".into(),
            description: None,
            project_id: 1,
            test_type: TestType::Ui,
            steps: None,
            config: None,
            tags: None,
            module: None,
            status: None,
            created_by: None,
            owner_id: None,
            created_at: None,
            updated_at: None,
        };
        assert!(CaseDraft::from_test_case(&case).is_none());
    }
}
