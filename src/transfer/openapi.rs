use serde_json::{Map, Value};

use super::{scalar_text, CaseDraft};
use crate::assertions::Assertion;
use crate::error::{QgError, Result};

const METHODS: &[&str] = &["get", "post", "put", "delete", "patch", "head", "options"];

/// `$ref` chains deeper than this generate an empty object.
const MAX_SCHEMA_DEPTH: usize = 6;

/// One draft per operation of an OpenAPI 3 or Swagger 2 document.
pub fn parse_spec(doc: &Value) -> Result<Vec<CaseDraft>> {
    let paths = doc
        .get("paths")
        .and_then(Value::as_object)
        .ok_or_else(|| QgError::ImportError("not an OpenAPI document: missing 'paths'".into()))?;
    let base_path = doc
        .get("basePath")
        .and_then(Value::as_str)
        .unwrap_or("")
        .trim_end_matches('/');

    let mut drafts = Vec::new();
    for (path, item) in paths {
        let shared: Vec<Value> = item
            .get("parameters")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        for method in METHODS {
            let Some(op) = item.get(*method) else {
                continue;
            };
            drafts.push(operation_draft(doc, &format!("{}{}", base_path, path), method, op, &shared));
        }
    }
    tracing::debug!(count = drafts.len(), "parsed openapi document");
    Ok(drafts)
}

fn operation_draft(doc: &Value, path: &str, method: &str, op: &Value, shared: &[Value]) -> CaseDraft {
    let mut draft = CaseDraft::new(method, path);
    if let Some(name) = op
        .get("summary")
        .or_else(|| op.get("operationId"))
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
    {
        draft.name = name.to_string();
    }
    draft.description = op
        .get("description")
        .and_then(Value::as_str)
        .map(str::to_string);
    draft.tags = op
        .get("tags")
        .and_then(Value::as_array)
        .map(|tags| tags.iter().filter_map(Value::as_str).map(str::to_string).collect())
        .unwrap_or_default();
    draft
        .headers
        .insert("Content-Type".to_string(), "application/json".to_string());

    let own = op.get("parameters").and_then(Value::as_array);
    for param in shared.iter().chain(own.into_iter().flatten()) {
        let param = resolve(doc, param, 0);
        let Some(name) = param.get("name").and_then(Value::as_str) else {
            continue;
        };
        match param.get("in").and_then(Value::as_str) {
            Some("query") | Some("path") => {
                draft.params.insert(name.to_string(), param_example(param));
            }
            Some("header") => {
                draft
                    .headers
                    .insert(name.to_string(), scalar_text(&param_example(param)));
            }
            Some("body") => {
                if let Some(schema) = param.get("schema") {
                    draft.body = Some(example_from_schema(doc, schema, 0));
                }
            }
            _ => {}
        }
    }

    if let Some(schema) = op.pointer("/requestBody/content/application~1json/schema") {
        draft.body = Some(example_from_schema(doc, schema, 0));
    }

    let success = op
        .get("responses")
        .and_then(Value::as_object)
        .and_then(|r| r.keys().find(|code| code.starts_with('2')))
        .and_then(|code| code.parse().ok());
    if let Some(expected) = success {
        draft.assertions.push(Assertion::StatusCode { expected });
    }

    draft
}

fn param_example(param: &Value) -> Value {
    param
        .get("example")
        .or_else(|| param.get("default"))
        .or_else(|| param.pointer("/schema/example"))
        .or_else(|| param.pointer("/schema/default"))
        .cloned()
        .unwrap_or_else(|| Value::String(String::new()))
}

/// Follow a local `$ref` (`#/components/...` or `#/definitions/...`).
fn resolve<'a>(doc: &'a Value, value: &'a Value, depth: usize) -> &'a Value {
    match value.get("$ref").and_then(Value::as_str) {
        Some(reference) if depth < MAX_SCHEMA_DEPTH => match reference.strip_prefix('#') {
            Some(pointer) => match doc.pointer(pointer) {
                Some(target) => resolve(doc, target, depth + 1),
                None => value,
            },
            None => value,
        },
        _ => value,
    }
}

/// Example value for a schema: explicit example or default, otherwise a
/// zero value of the declared type with object properties filled in.
pub fn example_from_schema(doc: &Value, schema: &Value, depth: usize) -> Value {
    if depth > MAX_SCHEMA_DEPTH {
        return Value::Object(Map::new());
    }
    let schema = resolve(doc, schema, depth);
    if let Some(example) = schema.get("example").or_else(|| schema.get("default")) {
        return example.clone();
    }
    if let Some(first) = schema
        .get("enum")
        .and_then(Value::as_array)
        .and_then(|values| values.first())
    {
        return first.clone();
    }
    if let Some(first) = schema
        .get("allOf")
        .or_else(|| schema.get("oneOf"))
        .or_else(|| schema.get("anyOf"))
        .and_then(Value::as_array)
        .and_then(|variants| variants.first())
    {
        return example_from_schema(doc, first, depth + 1);
    }

    let kind = schema.get("type").and_then(Value::as_str);
    match kind {
        Some("string") => Value::String(String::new()),
        Some("integer") | Some("number") => Value::from(0),
        Some("boolean") => Value::Bool(false),
        Some("array") => match schema.get("items") {
            Some(items) if depth < MAX_SCHEMA_DEPTH => {
                Value::Array(vec![example_from_schema(doc, items, depth + 1)])
            }
            _ => Value::Array(Vec::new()),
        },
        Some("object") | None => {
            let mut example = Map::new();
            if let Some(props) = schema.get("properties").and_then(Value::as_object) {
                for (key, prop) in props {
                    example.insert(key.clone(), example_from_schema(doc, prop, depth + 1));
                }
            }
            Value::Object(example)
        }
        Some(_) => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn petstore() -> Value {
        json!({
            "openapi": "3.0.0",
            "paths": {
                "/pets": {
                    "get": {
                        "summary": "List pets",
                        "tags": ["pets"],
                        "parameters": [
                            { "name": "limit", "in": "query", "schema": { "type": "integer", "default": 20 } },
                            { "name": "X-Request-Id", "in": "header", "example": "abc" }
                        ],
                        "responses": { "200": { "description": "ok" } }
                    },
                    "post": {
                        "operationId": "createPet",
                        "requestBody": {
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/NewPet" }
                                }
                            }
                        },
                        "responses": { "201": {}, "400": {} }
                    }
                },
                "/pets/{id}": {
                    "parameters": [{ "name": "id", "in": "path", "example": 7 }],
                    "delete": { "responses": { "204": {} } }
                }
            },
            "components": {
                "schemas": {
                    "NewPet": {
                        "type": "object",
                        "properties": {
                            "name": { "type": "string", "example": "Rex" },
                            "age": { "type": "integer" },
                            "vaccinated": { "type": "boolean" },
                            "tags": { "type": "array", "items": { "type": "string" } },
                            "owner": { "$ref": "#/components/schemas/Owner" }
                        }
                    },
                    "Owner": {
                        "type": "object",
                        "properties": { "email": { "type": "string" } }
                    }
                }
            }
        })
    }

    #[test]
    fn test_operations_become_drafts() {
        let drafts = parse_spec(&petstore()).unwrap();
        assert_eq!(drafts.len(), 3);

        let list = drafts.iter().find(|d| d.name == "List pets").unwrap();
        assert_eq!(list.method, "GET");
        assert_eq!(list.params.get("limit"), Some(&json!(20)));
        assert_eq!(list.headers.get("X-Request-Id").map(String::as_str), Some("abc"));
        assert_eq!(list.tags, vec!["pets".to_string()]);
        assert_eq!(list.assertions, vec![Assertion::StatusCode { expected: 200 }]);

        let delete = drafts.iter().find(|d| d.method == "DELETE").unwrap();
        assert_eq!(delete.name, "DELETE /pets/{id}");
        assert_eq!(delete.params.get("id"), Some(&json!(7)));
        assert_eq!(delete.assertions, vec![Assertion::StatusCode { expected: 204 }]);
    }

    #[test]
    fn test_request_body_from_schema() {
        let drafts = parse_spec(&petstore()).unwrap();
        let create = drafts.iter().find(|d| d.name == "createPet").unwrap();
        assert_eq!(
            create.body,
            Some(json!({
                "name": "Rex",
                "age": 0,
                "vaccinated": false,
                "tags": [""],
                "owner": { "email": "" }
            }))
        );
        assert_eq!(create.assertions, vec![Assertion::StatusCode { expected: 201 }]);
    }

    #[test]
    fn test_swagger2_base_path_and_body_param() {
        let doc = json!({
            "swagger": "2.0",
            "basePath": "/api/",
            "paths": {
                "/login": {
                    "post": {
                        "parameters": [{
                            "name": "creds", "in": "body",
                            "schema": { "$ref": "#/definitions/Creds" }
                        }],
                        "responses": { "200": {} }
                    }
                }
            },
            "definitions": {
                "Creds": { "properties": { "user": { "type": "string", "example": "bob" } } }
            }
        });
        let drafts = parse_spec(&doc).unwrap();
        assert_eq!(drafts[0].path, "/api/login");
        assert_eq!(drafts[0].body, Some(json!({"user": "bob"})));
    }

    #[test]
    fn test_self_referencing_schema_terminates() {
        let doc = json!({
            "components": { "schemas": { "Node": {
                "type": "object",
                "properties": { "next": { "$ref": "#/components/schemas/Node" } }
            } } }
        });
        let example = example_from_schema(&doc, &json!({"$ref": "#/components/schemas/Node"}), 0);
        assert!(example.is_object());
    }

    #[test]
    fn test_missing_paths() {
        assert!(parse_spec(&json!({"openapi": "3.0.0"})).is_err());
    }
}
