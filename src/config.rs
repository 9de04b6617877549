use std::fs;
use std::path::{Path, PathBuf};

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::error::{QgError, Result};

pub const DEFAULT_API_URL: &str = "http://localhost:8000/api/v1";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Keys accepted by `qg config set`.
pub const SETTABLE_KEYS: &[&str] = &[
    "api.url",
    "api.token",
    "api.timeout_secs",
    "output.json",
    "output.color",
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiConfig {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_API_URL.to_string(),
            token: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutputConfig {
    pub json: bool,
    pub color: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            json: false,
            color: true,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl Config {
    /// Path of the user config file: `~/.qualityguard/config.toml`.
    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| QgError::ConfigError("Could not determine home directory".into()))?;
        Ok(home.join(".qualityguard").join("config.toml"))
    }

    /// Load defaults, then the user config file, then environment overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        Self::figment(path)
            .extract()
            .map_err(|e| QgError::ConfigError(e.to_string()))
    }

    /// Load only what is persisted on disk, ignoring the environment.
    ///
    /// Used by commands that rewrite the file so env overrides never leak into it.
    pub fn load_file(path: &Path) -> Result<Self> {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .extract()
            .map_err(|e| QgError::ConfigError(e.to_string()))
    }

    fn figment(path: &Path) -> Figment {
        // QG_API_URL / QG_TOKEN / QG_TIMEOUT are the short names users already
        // export; QG_<SECTION>__<KEY> reaches everything else.
        let shorthand = Env::raw()
            .only(&["QG_API_URL", "QG_TOKEN", "QG_TIMEOUT"])
            .map(|key| {
                match key.as_str().to_ascii_lowercase().as_str() {
                    "qg_api_url" => "api.url",
                    "qg_token" => "api.token",
                    _ => "api.timeout_secs",
                }
                .into()
            });

        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .merge(
                Env::prefixed("QG_")
                    .ignore(&["API_URL", "TOKEN", "TIMEOUT"])
                    .split("__"),
            )
            .merge(shorthand)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| QgError::ConfigError(format!("Failed to serialize config: {}", e)))?;
        fs::write(path, content)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
        }

        tracing::debug!(path = %path.display(), "config saved");
        Ok(())
    }

    /// Apply one `key = value` assignment from `qg config set`.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "api.url" => {
                let url = value.trim().trim_end_matches('/');
                if !(url.starts_with("http://") || url.starts_with("https://")) {
                    return Err(QgError::InvalidInput(format!(
                        "api.url must start with http:// or https:// (got '{}')",
                        value
                    )));
                }
                self.api.url = url.to_string();
            }
            "api.token" => {
                self.api.token = if value.is_empty() {
                    None
                } else {
                    Some(value.to_string())
                };
            }
            "api.timeout_secs" => {
                self.api.timeout_secs = value.parse().map_err(|_| {
                    QgError::InvalidInput(format!("api.timeout_secs must be a number (got '{}')", value))
                })?;
            }
            "output.json" => self.output.json = parse_bool(key, value)?,
            "output.color" => self.output.color = parse_bool(key, value)?,
            other => {
                return Err(QgError::InvalidInput(format!(
                    "Unknown config key '{}'. Valid keys: {}",
                    other,
                    SETTABLE_KEYS.join(", ")
                )))
            }
        }
        Ok(())
    }

    /// Token with everything but the last four characters hidden.
    pub fn masked_token(&self) -> Option<String> {
        self.api.token.as_deref().map(mask_token)
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(QgError::InvalidInput(format!(
            "{} must be true or false (got '{}')",
            key, value
        ))),
    }
}

pub fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}", "*".repeat(chars.len() - 4), tail)
}
