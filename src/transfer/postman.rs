use reqwest::Url;
use serde_json::{json, Map, Value};

use super::{scalar_text, CaseDraft};
use crate::assertions::Assertion;
use crate::error::{QgError, Result};

const SCHEMA_V21: &str = "https://schema.getpostman.com/json/collection/v2.1.0/collection.json";

/// Read every request in a Postman v2.x collection, walking folders.
pub fn parse_collection(collection: &Value) -> Result<Vec<CaseDraft>> {
    let items = collection
        .get("item")
        .and_then(Value::as_array)
        .ok_or_else(|| QgError::ImportError("not a Postman collection: missing 'item' array".into()))?;

    let mut drafts = Vec::new();
    walk(items, None, &mut drafts);
    tracing::debug!(count = drafts.len(), "parsed postman collection");
    Ok(drafts)
}

fn walk(items: &[Value], folder: Option<&str>, out: &mut Vec<CaseDraft>) {
    for item in items {
        let name = item.get("name").and_then(Value::as_str);
        if let Some(children) = item.get("item").and_then(Value::as_array) {
            walk(children, name.or(folder), out);
        } else if let Some(request) = item.get("request") {
            out.push(request_to_draft(item, request, name, folder));
        }
    }
}

fn request_to_draft(item: &Value, request: &Value, name: Option<&str>, folder: Option<&str>) -> CaseDraft {
    // a request may be just a URL string
    let (method, url) = match request {
        Value::String(url) => ("GET".to_string(), Value::String(url.clone())),
        _ => (
            request
                .get("method")
                .and_then(Value::as_str)
                .unwrap_or("GET")
                .to_string(),
            request.get("url").cloned().unwrap_or(Value::Null),
        ),
    };

    let (path, params) = split_url(&url);
    let mut draft = CaseDraft::new(&method, &path);
    if let Some(name) = name {
        draft.name = name.to_string();
    }

    let description = item
        .get("description")
        .or_else(|| request.get("description"))
        .and_then(description_text);
    draft.description = description.or_else(|| folder.map(|f| format!("From folder: {}", f)));
    if let Some(folder) = folder {
        draft.tags.push(folder.to_string());
    }
    draft.params = params;

    if let Some(headers) = request.get("header").and_then(Value::as_array) {
        for header in headers {
            if header.get("disabled").and_then(Value::as_bool) == Some(true) {
                continue;
            }
            if let (Some(k), Some(v)) = (
                header.get("key").and_then(Value::as_str),
                header.get("value").and_then(Value::as_str),
            ) {
                draft.headers.insert(k.to_string(), v.to_string());
            }
        }
    }

    draft.body = request.get("body").and_then(body_value);
    draft.assertions = test_script_assertions(item);
    draft
}

/// Descriptions are either plain strings or `{content, type}` objects.
fn description_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Object(map) => map
            .get("content")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
        _ => None,
    }
}

fn split_url(url: &Value) -> (String, Map<String, Value>) {
    let mut params = Map::new();
    match url {
        Value::String(raw) => (path_and_query(raw, &mut params), params),
        Value::Object(map) => {
            if let Some(query) = map.get("query").and_then(Value::as_array) {
                for q in query {
                    if q.get("disabled").and_then(Value::as_bool) == Some(true) {
                        continue;
                    }
                    if let Some(k) = q.get("key").and_then(Value::as_str) {
                        let v = q.get("value").map(scalar_text).unwrap_or_default();
                        params.insert(k.to_string(), Value::String(v));
                    }
                }
            }
            let path = match map.get("path") {
                Some(Value::Array(parts)) => {
                    let joined: Vec<String> = parts.iter().map(scalar_text).collect();
                    format!("/{}", joined.join("/"))
                }
                Some(Value::String(p)) => format!("/{}", p.trim_start_matches('/')),
                _ => {
                    let raw = map.get("raw").and_then(Value::as_str).unwrap_or("/");
                    let mut ignored = Map::new();
                    path_and_query(raw, &mut ignored)
                }
            };
            (path, params)
        }
        _ => ("/".to_string(), params),
    }
}

/// Path of a raw URL; falls back to the text itself for `{{base}}/x` templates.
fn path_and_query(raw: &str, params: &mut Map<String, Value>) -> String {
    match Url::parse(raw) {
        Ok(url) => {
            for (k, v) in url.query_pairs() {
                params.insert(k.into_owned(), Value::String(v.into_owned()));
            }
            url.path().to_string()
        }
        Err(_) => {
            let (path, query) = raw.split_once('?').unwrap_or((raw, ""));
            for pair in query.split('&').filter(|p| !p.is_empty()) {
                let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
                params.insert(k.to_string(), Value::String(v.to_string()));
            }
            path.to_string()
        }
    }
}

fn body_value(body: &Value) -> Option<Value> {
    match body.get("mode").and_then(Value::as_str)? {
        "raw" => {
            let raw = body.get("raw").and_then(Value::as_str)?;
            if raw.trim().is_empty() {
                return None;
            }
            Some(serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string())))
        }
        mode @ ("urlencoded" | "formdata") => {
            let mut form = Map::new();
            for field in body.get(mode).and_then(Value::as_array).into_iter().flatten() {
                if field.get("disabled").and_then(Value::as_bool) == Some(true) {
                    continue;
                }
                if let Some(k) = field.get("key").and_then(Value::as_str) {
                    let v = field.get("value").map(scalar_text).unwrap_or_default();
                    form.insert(k.to_string(), Value::String(v));
                }
            }
            Some(Value::Object(form))
        }
        "graphql" => body.get("graphql").cloned(),
        _ => None,
    }
}

/// Pick up `pm.response.to.have.status(N)` checks from test scripts. Scripts
/// that inspect the JSON body are kept whole as script assertions.
fn test_script_assertions(item: &Value) -> Vec<Assertion> {
    let mut assertions = Vec::new();
    let events = item.get("event").and_then(Value::as_array);
    for event in events.into_iter().flatten() {
        if event.get("listen").and_then(Value::as_str) != Some("test") {
            continue;
        }
        let lines: Vec<&str> = event
            .pointer("/script/exec")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(Value::as_str)
            .collect();
        for line in &lines {
            if let Some(rest) = line.split("to.have.status(").nth(1) {
                let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
                if let Ok(expected) = digits.parse() {
                    let assertion = Assertion::StatusCode { expected };
                    if !assertions.contains(&assertion) {
                        assertions.push(assertion);
                    }
                }
            }
        }
        let script = lines.join("\n");
        if script.contains("pm.response.json()") {
            assertions.push(Assertion::Script { script });
        }
    }
    assertions
}

/// Build a Postman v2.1 collection. Request URLs use a `{{baseUrl}}`
/// variable unless the case already stores an absolute URL.
pub fn to_collection(name: &str, drafts: &[CaseDraft]) -> Value {
    let items: Vec<Value> = drafts.iter().map(draft_item).collect();
    json!({
        "info": {
            "name": name,
            "schema": SCHEMA_V21,
        },
        "item": items,
        "variable": [
            { "key": "baseUrl", "value": "" }
        ],
    })
}

fn draft_item(draft: &CaseDraft) -> Value {
    let absolute = draft.path.starts_with("http://") || draft.path.starts_with("https://");
    let base = if absolute {
        draft.path.clone()
    } else {
        format!("{{{{baseUrl}}}}{}", draft.path)
    };

    let query: Vec<Value> = draft
        .params
        .iter()
        .map(|(k, v)| json!({ "key": k, "value": scalar_text(v) }))
        .collect();
    let raw = if query.is_empty() {
        base
    } else {
        let qs: Vec<String> = draft
            .params
            .iter()
            .map(|(k, v)| format!("{}={}", k, scalar_text(v)))
            .collect();
        format!("{}?{}", base, qs.join("&"))
    };

    let headers: Vec<Value> = draft
        .headers
        .iter()
        .map(|(k, v)| json!({ "key": k, "value": v }))
        .collect();

    let mut request = json!({
        "method": draft.method,
        "header": headers,
        "url": { "raw": raw, "query": query },
    });
    if let Some(body) = &draft.body {
        let raw = match body {
            Value::String(s) => s.clone(),
            other => serde_json::to_string_pretty(other).unwrap_or_default(),
        };
        request["body"] = json!({
            "mode": "raw",
            "raw": raw,
            "options": { "raw": { "language": if body.is_string() { "text" } else { "json" } } },
        });
    }
    if let Some(description) = &draft.description {
        request["description"] = json!(description);
    }

    let mut item = json!({ "name": draft.name, "request": request });
    let checks: Vec<String> = draft
        .assertions
        .iter()
        .filter_map(|a| match a {
            Assertion::StatusCode { expected } => Some(format!(
                "pm.test(\"status is {0}\", function () {{ pm.response.to.have.status({0}); }});",
                expected
            )),
            _ => None,
        })
        .collect();
    if !checks.is_empty() {
        item["event"] = json!([{
            "listen": "test",
            "script": { "type": "text/javascript", "exec": checks },
        }]);
    }
    item
}
