use std::collections::BTreeMap;

use reqwest::Url;
use serde_json::{Map, Value};

use super::CaseDraft;
use crate::error::{QgError, Result};

/// Request pieces recovered from a `curl` command line.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedCurl {
    pub method: String,
    /// URL without query string or fragment.
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub params: BTreeMap<String, String>,
    pub body: Option<Value>,
}

impl ParsedCurl {
    pub fn into_draft(self) -> CaseDraft {
        let label = Url::parse(&self.url)
            .map(|u| u.path().to_string())
            .unwrap_or_else(|_| self.url.clone());
        let mut draft = CaseDraft::new(&self.method, &self.url);
        draft.name = format!("{} {}", draft.method, label);
        draft.headers = self.headers;
        draft.params = self
            .params
            .into_iter()
            .map(|(k, v)| (k, Value::String(v)))
            .collect();
        draft.body = self.body;
        draft
    }
}

/// Options whose argument has no bearing on the request we store.
const SKIPPED_WITH_VALUE: &[&str] = &[
    "-u", "--user", "-o", "--output", "--output-dir", "-m", "--max-time",
    "--connect-timeout", "-x", "--proxy", "-U", "--proxy-user", "--proxy-header",
    "--preproxy", "--socks4", "--socks4a", "--socks5", "--socks5-hostname", "--noproxy",
    "--cacert", "--capath", "-E", "--cert", "--cert-type", "--key", "--key-type", "--pass",
    "--ciphers", "--crlfile", "--pinnedpubkey", "--tls-max", "--tlsuser", "--tlspassword",
    "-w", "--write-out", "-F", "--form", "--form-string", "-T", "--upload-file",
    "-c", "--cookie-jar", "-r", "--range", "-K", "--config", "-D", "--dump-header",
    "--retry", "--retry-delay", "--retry-max-time", "--resolve", "--connect-to",
    "--interface", "--local-port", "--limit-rate", "--max-filesize", "--max-redirs",
    "-Y", "--speed-limit", "-y", "--speed-time", "-z", "--time-cond", "--unix-socket",
    "--abstract-unix-socket", "--trace", "--trace-ascii", "--stderr", "--oauth2-bearer",
    "--aws-sigv4", "--netrc-file", "--login-options", "--sasl-authzid", "--service-name",
    "--dns-servers", "--dns-interface", "--dns-ipv4-addr", "--dns-ipv6-addr",
    "--expect100-timeout", "--happy-eyeballs-timeout-ms", "--keepalive-time",
    "--mail-from", "--mail-rcpt", "--mail-auth", "-Q", "--quote", "-P", "--ftp-port",
    "--etag-save", "--etag-compare", "--create-file-mode", "--variable", "--url-query",
    "-C", "--continue-at", "--random-file", "--egd-file", "--hostpubmd5", "--pubkey",
];

/// Parse a single `curl` invocation, as copied from browser dev tools.
pub fn parse_curl(command: &str) -> Result<ParsedCurl> {
    let tokens = tokenize(command)?;
    let mut iter = tokens.into_iter().peekable();

    match iter.next() {
        Some(first) if first == "curl" => {}
        _ => {
            return Err(QgError::ImportError(
                "input is not a curl command".to_string(),
            ))
        }
    }

    let mut method: Option<String> = None;
    let mut url: Option<String> = None;
    let mut headers = BTreeMap::new();
    let mut long_data: Vec<String> = Vec::new();
    let mut short_data: Vec<String> = Vec::new();

    while let Some(token) = iter.next() {
        let mut value_of = |flag: &str| {
            iter.next().ok_or_else(|| {
                QgError::ImportError(format!("curl option {} is missing its value", flag))
            })
        };

        match token.as_str() {
            "-X" | "--request" => method = Some(value_of(&token)?.to_ascii_uppercase()),
            "-H" | "--header" => {
                let raw = value_of(&token)?;
                if let Some((name, value)) = raw.split_once(':') {
                    headers.insert(name.trim().to_string(), value.trim().to_string());
                }
            }
            "--data" | "--data-raw" | "--data-binary" | "--data-ascii" | "--data-urlencode" => {
                long_data.push(value_of(&token)?)
            }
            "-d" => short_data.push(value_of(&token)?),
            "--json" => {
                long_data.push(value_of(&token)?);
                headers
                    .entry("Content-Type".to_string())
                    .or_insert_with(|| "application/json".to_string());
            }
            "-A" | "--user-agent" => {
                headers.insert("User-Agent".to_string(), value_of(&token)?);
            }
            "-b" | "--cookie" => {
                headers.insert("Cookie".to_string(), value_of(&token)?);
            }
            "-e" | "--referer" => {
                headers.insert("Referer".to_string(), value_of(&token)?);
            }
            "--url" => url = Some(value_of(&token)?),
            t if SKIPPED_WITH_VALUE.contains(&t) => {
                value_of(&token)?;
            }
            t if t.starts_with("-X") && t.len() > 2 => method = Some(t[2..].to_ascii_uppercase()),
            t if t.starts_with('-') => {}
            t => {
                if url.is_none() {
                    url = Some(t.to_string());
                }
            }
        }
    }

    let full_url = url.ok_or_else(|| QgError::ImportError("curl command has no URL".to_string()))?;
    if !(full_url.starts_with("http://") || full_url.starts_with("https://")) {
        return Err(QgError::ImportError(format!(
            "unsupported URL '{}' (expected http:// or https://)",
            full_url
        )));
    }

    let mut params = BTreeMap::new();
    if let Ok(parsed) = Url::parse(&full_url) {
        for (k, v) in parsed.query_pairs() {
            params.insert(k.into_owned(), v.into_owned());
        }
    }
    let base = full_url
        .split(['?', '#'])
        .next()
        .unwrap_or(full_url.as_str())
        .to_string();

    let data = if long_data.is_empty() {
        short_data
    } else {
        long_data
    };
    let body = if data.is_empty() {
        None
    } else {
        let content_type = headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case("content-type"))
            .map(|(_, v)| v.to_ascii_lowercase())
            .unwrap_or_default();
        let (body, form) = decode_body(&data, &content_type);
        if form && content_type.is_empty() {
            headers.insert(
                "Content-Type".to_string(),
                "application/x-www-form-urlencoded".to_string(),
            );
        }
        Some(body)
    };

    let method = match method {
        Some(m) => m,
        None if body.is_some() => "POST".to_string(),
        None => "GET".to_string(),
    };

    Ok(ParsedCurl {
        method,
        url: base,
        headers,
        params,
        body,
    })
}

/// Decode the collected data values. Several values always merge into a form
/// object; a single one is JSON when it parses, a form when it holds `k=v`,
/// and plain text otherwise. The flag is set when the body is a form.
fn decode_body(data: &[String], content_type: &str) -> (Value, bool) {
    let urlencoded = content_type.contains("x-www-form-urlencoded");

    if let [raw] = data {
        if let Ok(value) = serde_json::from_str::<Value>(raw) {
            return (value, false);
        }
        let form = form_pairs(raw, urlencoded);
        if form.is_empty() {
            return (Value::String(raw.clone()), false);
        }
        return (Value::Object(form), true);
    }

    let mut form = Map::new();
    for raw in data {
        form.extend(form_pairs(raw, urlencoded));
    }
    if form.is_empty() {
        return (Value::String(data.join("&")), false);
    }
    (Value::Object(form), true)
}

/// Split `a=1&b=2` into fields, cutting each pair at its first `=`.
/// Values are percent-decoded only for url-encoded bodies.
fn form_pairs(raw: &str, urlencoded: bool) -> Map<String, Value> {
    let mut form = Map::new();
    for piece in raw.split('&') {
        let Some((key, value)) = piece.split_once('=') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        let (key, value) = if urlencoded {
            (percent_decode(key), percent_decode(value))
        } else {
            (key.to_string(), value.trim().to_string())
        };
        form.insert(key, Value::String(value));
    }
    form
}

fn percent_decode(text: &str) -> String {
    let query = format!("v={}", text.replace('#', "%23").replace('&', "%26"));
    Url::parse(&format!("http://form.invalid/?{}", query))
        .ok()
        .and_then(|u| u.query_pairs().next().map(|(_, v)| v.into_owned()))
        .unwrap_or_else(|| text.to_string())
}

/// Shell-style word splitting: quotes, backslash escapes and line continuations.
fn tokenize(input: &str) -> Result<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\'' => {
                in_token = true;
                loop {
                    match chars.next() {
                        Some('\'') => break,
                        Some(ch) => current.push(ch),
                        None => return Err(unterminated('\'')),
                    }
                }
            }
            '"' => {
                in_token = true;
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some(ch @ ('"' | '\\' | '$' | '`')) => current.push(ch),
                            Some('\n') => {}
                            Some(ch) => {
                                current.push('\\');
                                current.push(ch);
                            }
                            None => return Err(unterminated('"')),
                        },
                        Some(ch) => current.push(ch),
                        None => return Err(unterminated('"')),
                    }
                }
            }
            '\\' => match chars.next() {
                Some('\n') | Some('\r') => {
                    if chars.peek() == Some(&'\n') {
                        chars.next();
                    }
                }
                Some(ch) => {
                    in_token = true;
                    current.push(ch);
                }
                None => {}
            },
            c if c.is_whitespace() => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            c => {
                in_token = true;
                current.push(c);
            }
        }
    }
    if in_token {
        tokens.push(current);
    }
    Ok(tokens)
}

fn unterminated(quote: char) -> QgError {
    QgError::ImportError(format!("unterminated {} quote in curl command", quote))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_simple_get() {
        let parsed = parse_curl("curl https://api.example.com/users?page=2&size=10").unwrap();
        assert_eq!(parsed.method, "GET");
        assert_eq!(parsed.url, "https://api.example.com/users");
        assert_eq!(parsed.params.get("page").map(String::as_str), Some("2"));
        assert_eq!(parsed.params.len(), 2);
        assert!(parsed.body.is_none());
    }

    #[test]
    fn test_devtools_copy_with_continuations() {
        let cmd = "curl 'https://api.example.com/login' \\\n  -H 'Content-Type: application/json' \\\n  -H 'Authorization: Bearer abc' \\\n  --data-raw '{\"user\":\"bob\",\"pw\":\"x\"}' \\\n  --compressed";
        let parsed = parse_curl(cmd).unwrap();
        assert_eq!(parsed.method, "POST");
        assert_eq!(
            parsed.headers.get("Authorization").map(String::as_str),
            Some("Bearer abc")
        );
        assert_eq!(parsed.body, Some(json!({"user": "bob", "pw": "x"})));
    }

    #[test]
    fn test_explicit_method_wins() {
        let parsed =
            parse_curl("curl -X put -d '{\"a\":1}' https://api.example.com/items/1").unwrap();
        assert_eq!(parsed.method, "PUT");
        assert_eq!(parsed.body, Some(json!({"a": 1})));
    }

    #[test]
    fn test_form_body() {
        let parsed = parse_curl(
            "curl -H 'Content-Type: application/x-www-form-urlencoded' -d 'name=a%20b&age=3' https://x.io/f",
        )
        .unwrap();
        assert_eq!(parsed.body, Some(json!({"name": "a b", "age": "3"})));
    }

    #[test]
    fn test_form_content_type_defaulted() {
        let parsed = parse_curl("curl -d 'a=1' -d 'b=2' https://x.io/f").unwrap();
        assert_eq!(parsed.body, Some(json!({"a": "1", "b": "2"})));
        assert_eq!(
            parsed.headers.get("Content-Type").map(String::as_str),
            Some("application/x-www-form-urlencoded")
        );
    }

    #[test]
    fn test_plain_text_body_kept() {
        let parsed = parse_curl("curl -H 'Content-Type: text/plain' -d 'hello world' https://x.io").unwrap();
        assert_eq!(parsed.body, Some(json!("hello world")));
    }

    #[test]
    fn test_long_data_preferred_over_short() {
        let parsed =
            parse_curl("curl -d 'ignored=1' --data '{\"kept\":true}' https://x.io/p").unwrap();
        assert_eq!(parsed.body, Some(json!({"kept": true})));
    }

    #[test]
    fn test_double_quoted_escapes() {
        let parsed =
            parse_curl(r#"curl -H "X-Note: say \"hi\"" "https://x.io/a""#).unwrap();
        assert_eq!(
            parsed.headers.get("X-Note").map(String::as_str),
            Some("say \"hi\"")
        );
    }

    #[test]
    fn test_form_value_with_spaces() {
        let parsed = parse_curl("curl -d 'name=John Smith' https://x.io/f").unwrap();
        assert_eq!(parsed.method, "POST");
        assert_eq!(parsed.body, Some(json!({"name": "John Smith"})));
        assert_eq!(
            parsed.headers.get("Content-Type").map(String::as_str),
            Some("application/x-www-form-urlencoded")
        );
    }

    #[test]
    fn test_multiple_values_merge_whatever_the_content_type() {
        let parsed = parse_curl(
            "curl -H 'Content-Type: application/json' -d a=1 -d 'b=x=y' https://x.io/f",
        )
        .unwrap();
        assert_eq!(parsed.body, Some(json!({"a": "1", "b": "x=y"})));
        assert_eq!(
            parsed.headers.get("Content-Type").map(String::as_str),
            Some("application/json")
        );
    }

    #[test]
    fn test_json_scalars_kept_as_json() {
        let parsed = parse_curl("curl -d 123 https://x.io/n").unwrap();
        assert_eq!(parsed.body, Some(json!(123)));
        let parsed = parse_curl("curl --data true https://x.io/n").unwrap();
        assert_eq!(parsed.body, Some(json!(true)));
        assert!(!parsed.headers.contains_key("Content-Type"));
    }

    #[test]
    fn test_value_flags_before_url_are_skipped() {
        let parsed = parse_curl("curl -F 'file=@x.txt' https://x.io/upload").unwrap();
        assert_eq!(parsed.url, "https://x.io/upload");

        let parsed = parse_curl(
            "curl --retry 3 -c jar.txt -r 0-99 --resolve x.io:443:1.2.3.4 -E cert.pem https://x.io/r",
        )
        .unwrap();
        assert_eq!(parsed.url, "https://x.io/r");
        assert_eq!(parsed.method, "GET");
    }

    #[test]
    fn test_json_flag_sets_content_type() {
        let parsed = parse_curl("curl --json '{\"q\":1}' https://x.io/search").unwrap();
        assert_eq!(parsed.method, "POST");
        assert_eq!(parsed.body, Some(json!({"q": 1})));
        assert_eq!(
            parsed.headers.get("Content-Type").map(String::as_str),
            Some("application/json")
        );
    }

    #[test]
    fn test_agent_cookie_referer_headers() {
        let parsed = parse_curl(
            "curl -A 'qg-test/1.0' -b 'sid=abc' -e https://ref.io/ --url https://x.io/me",
        )
        .unwrap();
        assert_eq!(parsed.url, "https://x.io/me");
        assert_eq!(
            parsed.headers.get("User-Agent").map(String::as_str),
            Some("qg-test/1.0")
        );
        assert_eq!(parsed.headers.get("Cookie").map(String::as_str), Some("sid=abc"));
        assert_eq!(
            parsed.headers.get("Referer").map(String::as_str),
            Some("https://ref.io/")
        );
    }

    #[test]
    fn test_errors() {
        assert!(parse_curl("wget https://x.io").is_err());
        assert!(parse_curl("curl -H 'A: b'").is_err());
        assert!(parse_curl("curl 'https://x.io").is_err());
        assert!(parse_curl("curl ftp://x.io/file").is_err());
    }

    #[test]
    fn test_into_draft_names_by_path() {
        let draft = parse_curl("curl -X DELETE https://api.example.com/v1/items/4?force=1")
            .unwrap()
            .into_draft();
        assert_eq!(draft.name, "DELETE /v1/items/4");
        assert_eq!(draft.path, "https://api.example.com/v1/items/4");
        assert_eq!(draft.params.get("force"), Some(&json!("1")));
    }
}
