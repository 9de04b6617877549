//! JSON helpers for request and assertion editing.
//!
//! Besides validating user-supplied JSON arguments, this module can suggest
//! JSON-path assertions from a response body: paste the response, optionally
//! point at the fields you care about, and get assertion configs back. The
//! matching is heuristic and makes no promise beyond "best effort".

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{QgError, Result};

/// Without a fragment, at most this many leaves become assertions.
pub const MAX_INFERRED: usize = 50;

/// Assertion config as the execution engine consumes it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Assertion {
    StatusCode {
        expected: u16,
    },
    JsonPath {
        path: String,
        #[serde(default = "default_operator")]
        operator: String,
        expected: Value,
    },
    Contains {
        expected: String,
    },
    Script {
        script: String,
    },
}

fn default_operator() -> String {
    "equals".to_string()
}

impl Assertion {
    pub fn json_path(path: impl Into<String>, expected: Value) -> Self {
        Assertion::JsonPath {
            path: path.into(),
            operator: default_operator(),
            expected,
        }
    }
}

impl fmt::Display for Assertion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Assertion::StatusCode { expected } => write!(f, "status == {}", expected),
            Assertion::JsonPath {
                path,
                operator,
                expected,
            } => write!(f, "{} {} {}", path, operator, expected),
            Assertion::Contains { expected } => write!(f, "body contains {:?}", expected),
            Assertion::Script { .. } => write!(f, "script"),
        }
    }
}

/// Parse a JSON command-line argument; `@path` reads the JSON from a file.
pub fn parse_json_arg(flag: &str, raw: &str) -> Result<Value> {
    let text = match raw.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|e| QgError::InvalidInput(format!("--{}: cannot read {}: {}", flag, path, e)))?,
        None => raw.to_string(),
    };
    serde_json::from_str(&text)
        .map_err(|e| QgError::InvalidInput(format!("--{} is not valid JSON: {}", flag, e)))
}

pub fn parse_json_object(flag: &str, raw: &str) -> Result<Map<String, Value>> {
    match parse_json_arg(flag, raw)? {
        Value::Object(map) => Ok(map),
        other => Err(QgError::InvalidInput(format!(
            "--{} must be a JSON object, got {}",
            flag,
            type_name(&other)
        ))),
    }
}

pub fn parse_json_array(flag: &str, raw: &str) -> Result<Vec<Value>> {
    match parse_json_arg(flag, raw)? {
        Value::Array(items) => Ok(items),
        other => Err(QgError::InvalidInput(format!(
            "--{} must be a JSON array, got {}",
            flag,
            type_name(&other)
        ))),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Key(String),
    Index(usize),
}

/// A scalar found somewhere inside a JSON document.
#[derive(Debug, Clone, PartialEq)]
struct Leaf {
    segments: Vec<Segment>,
    value: Value,
}

impl Leaf {
    fn path(&self) -> String {
        render_path(&self.segments)
    }
}

fn is_identifier(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn render_path(segments: &[Segment]) -> String {
    let mut out = String::from("$");
    for segment in segments {
        match segment {
            Segment::Key(k) if is_identifier(k) => {
                out.push('.');
                out.push_str(k);
            }
            Segment::Key(k) => {
                out.push_str("['");
                out.push_str(&k.replace('\'', "\\'"));
                out.push_str("']");
            }
            Segment::Index(i) => out.push_str(&format!("[{}]", i)),
        }
    }
    out
}

/// Collect scalar leaves in traversal order. Empty containers count as leaves.
fn flatten(value: &Value) -> Vec<Leaf> {
    let mut leaves = Vec::new();
    let mut stack = Vec::new();
    walk(value, &mut stack, &mut leaves);
    leaves
}

fn walk(value: &Value, stack: &mut Vec<Segment>, out: &mut Vec<Leaf>) {
    match value {
        Value::Object(map) if !map.is_empty() => {
            for (k, v) in map {
                stack.push(Segment::Key(k.clone()));
                walk(v, stack, out);
                stack.pop();
            }
        }
        Value::Array(items) if !items.is_empty() => {
            for (i, v) in items.iter().enumerate() {
                stack.push(Segment::Index(i));
                walk(v, stack, out);
                stack.pop();
            }
        }
        _ => out.push(Leaf {
            segments: stack.clone(),
            value: value.clone(),
        }),
    }
}

/// One thing the user pointed at: a (possibly nested) key and maybe a value.
#[derive(Debug, Clone, PartialEq)]
struct Wanted {
    segments: Vec<Segment>,
    expected: Option<Value>,
}

fn parse_fragment(fragment: &str) -> Vec<Wanted> {
    let trimmed = fragment.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    // A pasted object, or object members pasted without the braces
    let as_object = serde_json::from_str::<Value>(trimmed)
        .ok()
        .filter(Value::is_object)
        .or_else(|| {
            serde_json::from_str::<Value>(&format!("{{{}}}", trimmed.trim_end_matches(',')))
                .ok()
                .filter(Value::is_object)
        });

    if let Some(value) = as_object {
        return flatten(&value)
            .into_iter()
            .map(|leaf| Wanted {
                segments: leaf.segments,
                expected: Some(leaf.value),
            })
            .collect();
    }

    trimmed
        .lines()
        .filter_map(|line| {
            let line = line.trim().trim_end_matches(',');
            if line.is_empty() {
                return None;
            }
            let (key, value) = match line.find(|c: char| c == ':' || c == '=') {
                Some(pos) => (&line[..pos], Some(line[pos + 1..].trim())),
                None => (line, None),
            };
            let key = key.trim().trim_matches('"').trim_matches('\'');
            if key.is_empty() {
                return None;
            }
            let segments = parse_path(key);
            let expected = value.filter(|v| !v.is_empty()).map(|v| {
                serde_json::from_str(v).unwrap_or_else(|_| {
                    Value::String(v.trim_matches('"').trim_matches('\'').to_string())
                })
            });
            Some(Wanted { segments, expected })
        })
        .collect()
}

fn segment(text: String) -> Segment {
    match text.parse::<usize>() {
        Ok(i) => Segment::Index(i),
        Err(_) => Segment::Key(text),
    }
}

fn push_name(name: &mut String, segments: &mut Vec<Segment>) {
    if !name.is_empty() {
        segments.push(segment(std::mem::take(name)));
    }
}

/// Read back a path in the notation [`render_path`] prints: `a.b`, `$.a[0].b`,
/// `$.meta['request-id']`.
fn parse_path(path: &str) -> Vec<Segment> {
    let path = match path.strip_prefix('$') {
        Some(rest) if rest.is_empty() || rest.starts_with(['.', '[']) => rest,
        _ => path,
    };
    let mut segments = Vec::new();
    let mut name = String::new();
    let mut chars = path.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '.' => push_name(&mut name, &mut segments),
            '[' => {
                push_name(&mut name, &mut segments);
                match chars.peek().copied() {
                    Some(quote @ ('\'' | '"')) => {
                        chars.next();
                        let mut key = String::new();
                        while let Some(ch) = chars.next() {
                            match ch {
                                '\\' => key.extend(chars.next()),
                                ch if ch == quote => break,
                                ch => key.push(ch),
                            }
                        }
                        for ch in chars.by_ref() {
                            if ch == ']' {
                                break;
                            }
                        }
                        segments.push(Segment::Key(key));
                    }
                    _ => {
                        let mut inner = String::new();
                        for ch in chars.by_ref() {
                            if ch == ']' {
                                break;
                            }
                            inner.push(ch);
                        }
                        let inner = inner.trim();
                        if !inner.is_empty() {
                            segments.push(segment(inner.to_string()));
                        }
                    }
                }
            }
            c => name.push(c),
        }
    }
    push_name(&mut name, &mut segments);
    segments
}

fn loosely_equal(a: &Value, b: &Value) -> bool {
    if a == b {
        return true;
    }
    let text = |v: &Value| match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    text(a) == text(b)
}

/// Suggest assertions for a response body.
///
/// Without a fragment every scalar leaf (up to [`MAX_INFERRED`]) is asserted
/// as-is. With a fragment only the named fields are asserted: each is matched
/// against response paths ending in the same keys, preferring a leaf that
/// already holds the expected value, then the shallowest one. Fields that
/// match nothing are skipped.
pub fn infer_assertions(
    response: &Value,
    fragment: Option<&str>,
    status: Option<u16>,
) -> Vec<Assertion> {
    let mut assertions = Vec::new();
    if let Some(code) = status {
        assertions.push(Assertion::StatusCode { expected: code });
    }

    let leaves = flatten(response);

    let wanted = match fragment {
        Some(f) if !f.trim().is_empty() => parse_fragment(f),
        _ => {
            assertions.extend(
                leaves
                    .iter()
                    .filter(|l| !l.segments.is_empty())
                    .take(MAX_INFERRED)
                    .map(|l| Assertion::json_path(l.path(), l.value.clone())),
            );
            return assertions;
        }
    };

    let mut seen: Vec<String> = Vec::new();
    for want in wanted {
        if want.segments.is_empty() {
            continue;
        }
        let candidates: Vec<&Leaf> = leaves
            .iter()
            .filter(|l| l.segments.ends_with(&want.segments))
            .collect();

        let chosen = want
            .expected
            .as_ref()
            .and_then(|exp| {
                candidates
                    .iter()
                    .filter(|l| loosely_equal(&l.value, exp))
                    .min_by_key(|l| l.segments.len())
            })
            .or_else(|| candidates.iter().min_by_key(|l| l.segments.len()));

        let Some(leaf) = chosen else {
            tracing::debug!(key = %render_path(&want.segments), "no match in response");
            continue;
        };

        let path = leaf.path();
        if seen.contains(&path) {
            continue;
        }
        seen.push(path.clone());

        let expected = want.expected.unwrap_or_else(|| leaf.value.clone());
        assertions.push(Assertion::json_path(path, expected));
    }

    assertions
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn paths(assertions: &[Assertion]) -> Vec<String> {
        assertions
            .iter()
            .filter_map(|a| match a {
                Assertion::JsonPath { path, .. } => Some(path.clone()),
                _ => None,
            })
            .collect()
    }

    fn sample() -> Value {
        json!({
            "code": 0,
            "data": {
                "user": {"id": 42, "name": "alice", "roles": ["admin", "qa"]},
                "token": "abc",
                "items": [{"id": 1, "sku": "A-1"}, {"id": 2, "sku": "B-2"}]
            },
            "meta": {"request-id": "r-9", "empty": {}}
        })
    }

    #[test]
    fn test_flatten_paths() {
        let all = infer_assertions(&sample(), None, None);
        let p = paths(&all);
        assert!(p.contains(&"$.code".to_string()));
        assert!(p.contains(&"$.data.user.roles[1]".to_string()));
        assert!(p.contains(&"$.data.items[0].sku".to_string()));
        assert!(p.contains(&"$.meta['request-id']".to_string()));
        assert!(p.contains(&"$.meta.empty".to_string()));
    }

    #[test]
    fn test_status_comes_first() {
        let all = infer_assertions(&json!({"ok": true}), None, Some(201));
        assert_eq!(all[0], Assertion::StatusCode { expected: 201 });
        assert_eq!(all[1], Assertion::json_path("$.ok", json!(true)));
    }

    #[test]
    fn test_cap_without_fragment() {
        let big: Vec<Value> = (0..80).map(|i| json!(i)).collect();
        let all = infer_assertions(&Value::Array(big), None, None);
        assert_eq!(all.len(), MAX_INFERRED);
    }

    #[test]
    fn test_fragment_object_prefers_matching_value() {
        let all = infer_assertions(&sample(), Some(r#"{"id": 2}"#), None);
        assert_eq!(all, vec![Assertion::json_path("$.data.items[1].id", json!(2))]);
    }

    #[test]
    fn test_fragment_shallowest_when_value_differs() {
        let all = infer_assertions(&sample(), Some(r#"{"id": 99}"#), None);
        assert_eq!(all, vec![Assertion::json_path("$.data.user.id", json!(99))]);
    }

    #[test]
    fn test_fragment_members_without_braces() {
        let all = infer_assertions(&sample(), Some(r#""token": "abc", "name": "alice""#), None);
        assert_eq!(
            paths(&all),
            vec!["$.data.user.name".to_string(), "$.data.token".to_string()]
        );
    }

    #[test]
    fn test_fragment_lines() {
        let fragment = "code: 0\nuser.name = alice\nsku\n";
        let all = infer_assertions(&sample(), Some(fragment), None);
        assert_eq!(
            all,
            vec![
                Assertion::json_path("$.code", json!(0)),
                Assertion::json_path("$.data.user.name", json!("alice")),
                Assertion::json_path("$.data.items[0].sku", json!("A-1")),
            ]
        );
    }

    #[test]
    fn test_fragment_lines_with_printed_paths() {
        let fragment = "$.data.items[1].sku: B-2\n$.meta['request-id'] = r-9\n$.data.user.roles[0]\n";
        let all = infer_assertions(&sample(), Some(fragment), None);
        assert_eq!(
            all,
            vec![
                Assertion::json_path("$.data.items[1].sku", json!("B-2")),
                Assertion::json_path("$.meta['request-id']", json!("r-9")),
                Assertion::json_path("$.data.user.roles[0]", json!("admin")),
            ]
        );
    }

    #[test]
    fn test_parse_path_round_trips_rendered_paths() {
        assert_eq!(parse_path("$ref"), vec![Segment::Key("$ref".into())]);
        assert_eq!(parse_path("$[2].a"), vec![Segment::Index(2), Segment::Key("a".into())]);
        assert_eq!(
            parse_path("$.data.items[0].sku"),
            vec![
                Segment::Key("data".into()),
                Segment::Key("items".into()),
                Segment::Index(0),
                Segment::Key("sku".into()),
            ]
        );
        let quoted = vec![Segment::Key("meta".into()), Segment::Key("a.b'c".into())];
        assert_eq!(parse_path(&render_path(&quoted)), quoted);
    }

    #[test]
    fn test_fragment_nested_object() {
        let all = infer_assertions(&sample(), Some(r#"{"user": {"name": "alice"}}"#), None);
        assert_eq!(all, vec![Assertion::json_path("$.data.user.name", json!("alice"))]);
    }

    #[test]
    fn test_unknown_keys_skipped() {
        let all = infer_assertions(&sample(), Some("missing: 1"), Some(200));
        assert_eq!(all, vec![Assertion::StatusCode { expected: 200 }]);
    }

    #[test]
    fn test_loose_number_match() {
        let all = infer_assertions(&json!({"count": 5}), Some("count: \"5\""), None);
        assert_eq!(all, vec![Assertion::json_path("$.count", json!("5"))]);
    }

    #[test]
    fn test_assertion_wire_format() {
        let value = serde_json::to_value(Assertion::json_path("$.a", json!(1))).unwrap();
        assert_eq!(
            value,
            json!({"type": "json_path", "path": "$.a", "operator": "equals", "expected": 1})
        );
        let status: Assertion =
            serde_json::from_value(json!({"type": "status_code", "expected": 200})).unwrap();
        assert_eq!(status, Assertion::StatusCode { expected: 200 });
    }

    #[test]
    fn test_parse_json_arg_errors_name_flag() {
        let err = parse_json_object("config", "[1, 2]").unwrap_err();
        assert!(err.to_string().contains("--config must be a JSON object"));
        let err = parse_json_arg("body", "{oops").unwrap_err();
        assert!(err.to_string().contains("--body is not valid JSON"));
    }

    #[test]
    fn test_parse_json_arg_from_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("cfg.json");
        std::fs::write(&path, r#"{"timeout": 30}"#).unwrap();
        let map = parse_json_object("config", &format!("@{}", path.display())).unwrap();
        assert_eq!(map["timeout"], json!(30));
    }
}
