use crate::domain::ports::ConfigProvider;
use crate::utils::error::{LeadsError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const ENV_BASE_URL: &str = "LEADS_API_URL";
pub const ENV_API_KEY: &str = "LEADS_API_KEY";
pub const ENV_TIMEOUT_SECONDS: &str = "LEADS_API_TIMEOUT_SECONDS";
pub const ENV_CONFIG_FILE: &str = "LEADS_API_CONFIG";

/// Endpoint and credentials for the leads API.
#[derive(Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub api_key: String,
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

// The key is a bearer credential; keep it out of logs.
impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"***")
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    api: ApiConfig,
}

impl ApiConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            timeout_seconds: None,
        }
    }

    pub fn with_timeout_seconds(mut self, seconds: u64) -> Self {
        self.timeout_seconds = Some(seconds);
        self
    }

    /// `LEADS_API_CONFIG` names a TOML file when set; otherwise the
    /// `LEADS_API_*` environment variables are used.
    pub fn load() -> Result<Self> {
        let config = match std::env::var(ENV_CONFIG_FILE) {
            Ok(path) => {
                tracing::debug!("Loading API config from {}", path);
                Self::from_file(path)?
            }
            Err(_) => Self::from_env()?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = validation::validate_required_field(ENV_BASE_URL, &lookup(ENV_BASE_URL))?
            .clone();
        let api_key = validation::validate_required_field(ENV_API_KEY, &lookup(ENV_API_KEY))?
            .clone();

        let timeout_seconds = match lookup(ENV_TIMEOUT_SECONDS) {
            Some(raw) => Some(raw.trim().parse::<u64>().map_err(|e| {
                LeadsError::InvalidConfigValue {
                    field: ENV_TIMEOUT_SECONDS.to_string(),
                    value: raw.clone(),
                    reason: e.to_string(),
                }
            })?),
            None => None,
        };

        Ok(Self {
            base_url,
            api_key,
            timeout_seconds,
        })
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(LeadsError::Io)?;
        Self::from_toml_str(&content)
    }

    /// Parses an `[api]` table after expanding `${VAR}` placeholders.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        let file: ConfigFile =
            toml::from_str(&processed_content).map_err(|e| LeadsError::ConfigParse {
                message: format!("TOML parsing error: {}", e),
            })?;
        Ok(file.api)
    }

    /// Unset variables are left as the literal `${NAME}`.
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| LeadsError::ConfigParse {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }
}

impl ConfigProvider for ApiConfig {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn api_key(&self) -> &str {
        &self.api_key
    }

    fn timeout_seconds(&self) -> Option<u64> {
        self.timeout_seconds
    }
}

impl Validate for ApiConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_url("base_url", &self.base_url)?;
        validation::validate_non_empty_string("api_key", &self.api_key)?;
        if let Some(timeout) = self.timeout_seconds {
            validation::validate_positive_number("timeout_seconds", timeout, 1)?;
        }
        Ok(())
    }
}
