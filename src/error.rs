use thiserror::Error;

#[derive(Error, Debug)]
pub enum QgError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("Authentication failed, check your token (run 'qg auth login')")]
    Unauthorized,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Import failed: {0}")]
    ImportError(String),

    #[error("Execution {id} finished with status '{status}'")]
    ExecutionFailed { id: u64, status: String },

    #[error("Timed out after {secs}s waiting for execution {id}")]
    WaitTimeout { id: u64, secs: u64 },

    #[error("Prompt failed: {0}")]
    PromptError(String),

    #[error("{0}")]
    Other(String),
}

impl QgError {
    /// Build an error from a non-2xx response status and its body text.
    ///
    /// The backend is FastAPI, so `detail` is either a string or a list of
    /// validation errors each carrying a `msg`.
    pub fn from_status(status: u16, body: &str, path: &str) -> Self {
        match status {
            401 => return QgError::Unauthorized,
            404 => return QgError::NotFound(path.to_string()),
            _ => {}
        }

        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| detail_message(&v))
            .unwrap_or_else(|| {
                let trimmed = body.trim();
                if trimmed.is_empty() {
                    "empty response body".to_string()
                } else {
                    trimmed.to_string()
                }
            });

        QgError::ApiError { status, message }
    }
}

fn detail_message(value: &serde_json::Value) -> Option<String> {
    let detail = value.get("detail").or_else(|| value.get("message"))?;
    match detail {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Array(items) => {
            let msgs: Vec<String> = items
                .iter()
                .filter_map(|item| {
                    let msg = item.get("msg")?.as_str()?;
                    let loc = item
                        .get("loc")
                        .and_then(|l| l.as_array())
                        .map(|parts| {
                            parts
                                .iter()
                                .map(|p| match p {
                                    serde_json::Value::String(s) => s.clone(),
                                    other => other.to_string(),
                                })
                                .collect::<Vec<_>>()
                                .join(".")
                        });
                    Some(match loc {
                        Some(loc) if !loc.is_empty() => format!("{}: {}", loc, msg),
                        _ => msg.to_string(),
                    })
                })
                .collect();
            if msgs.is_empty() {
                None
            } else {
                Some(msgs.join("; "))
            }
        }
        other => Some(other.to_string()),
    }
}

pub type Result<T> = std::result::Result<T, QgError>;
