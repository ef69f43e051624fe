use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::JiraError;

#[derive(Debug, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub jira: JiraConfig,
    pub bulk: Option<BulkConfig>,
}

/// Jira connection settings as written in the config file. Every field may
/// also come from the environment, so nothing is mandatory until
/// [`JiraConfig::resolve`].
#[derive(Debug, Deserialize, Default, Clone)]
pub struct JiraConfig {
    pub base_url: Option<String>,
    /// Atlassian site name, used when `base_url` is absent.
    pub domain: Option<String>,
    pub email: Option<String>,
    pub api_token: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct BulkConfig {
    pub page_size: Option<u32>,
}

/// Validated connection settings handed to the HTTP client.
#[derive(Debug, Clone)]
pub struct JiraCredentials {
    pub base_url: String,
    pub email: String,
    pub api_token: String,
}

impl JiraConfig {
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("JIRA_BASE_URL") {
            self.base_url = Some(v);
        }
        if let Some(v) = lookup("JIRA_EMAIL") {
            self.email = Some(v);
        }
        // VINIT_API_TOKEN is the name older .env files use for the token.
        if let Some(v) = lookup("JIRA_API_TOKEN").or_else(|| lookup("VINIT_API_TOKEN")) {
            self.api_token = Some(v);
        }
    }

    pub fn resolve(&self) -> Result<JiraCredentials, JiraError> {
        let base_url = match (non_empty(&self.base_url), non_empty(&self.domain)) {
            (Some(url), _) => url.trim_end_matches('/').to_string(),
            (None, Some(domain)) => format!("https://{domain}.atlassian.net"),
            (None, None) => return Err(missing("base_url (or JIRA_BASE_URL)")),
        };
        let email = non_empty(&self.email).ok_or_else(|| missing("email (or JIRA_EMAIL)"))?;
        let api_token =
            non_empty(&self.api_token).ok_or_else(|| missing("api_token (or JIRA_API_TOKEN)"))?;

        Ok(JiraCredentials {
            base_url,
            email: email.to_string(),
            api_token: api_token.to_string(),
        })
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn missing(key: &str) -> JiraError {
    JiraError::Config(format!("missing Jira setting: {key}"))
}

fn config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".jira-ops")
        .join("config.toml")
}

/// Load configuration from `.env`, the config file, and the environment, in
/// increasing order of precedence.
pub fn load_config(explicit_path: Option<&Path>) -> Result<AppConfig> {
    load_env_file(Path::new(".env"))?;

    let mut config = match explicit_path {
        Some(path) => {
            if !path.exists() {
                bail!("Config file {} does not exist", path.display());
            }
            load_config_from(path)?
        }
        None => load_config_from(&config_path())?,
    };
    config.jira.apply_env();
    Ok(config)
}

/// Export the variables of a dotenv file. A missing file is not an error.
fn load_env_file(path: &Path) -> Result<()> {
    match dotenvy::from_path(path) {
        Ok(()) => Ok(()),
        Err(e) if e.not_found() => Ok(()),
        Err(e) => Err(e).with_context(|| format!("Failed to load {}", path.display())),
    }
}

pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config from {}", path.display()))?;
    let config: AppConfig = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(config)
}
