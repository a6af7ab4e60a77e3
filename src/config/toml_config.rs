use crate::core::deploy::PollSettings;
use crate::utils::error::{Result, WorkflowError};
use crate::utils::validation::{validate_path, validate_positive_number, validate_url, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";
pub const DEFAULT_STATE_DIR: &str = ".cloud-workflow";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkflowConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub deploy: DeployConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_state_dir")]
    pub state_dir: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeployConfig {
    pub poll_interval_ms: Option<u64>,
    pub error_backoff_ms: Option<u64>,
    pub max_poll_attempts: Option<u32>,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_state_dir() -> String {
    DEFAULT_STATE_DIR.to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: None,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            state_dir: default_state_dir(),
        }
    }
}

impl WorkflowConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(WorkflowError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| WorkflowError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${API_BASE_URL})，找不到的保留原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| WorkflowError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 命令列參數優先於檔案內容
    pub fn with_overrides(mut self, api_base: Option<String>, state_dir: Option<String>) -> Self {
        if let Some(api_base) = api_base {
            self.api.base_url = api_base;
        }
        if let Some(state_dir) = state_dir {
            self.storage.state_dir = state_dir;
        }
        self
    }

    pub fn validate_config(&self) -> Result<()> {
        validate_url("api.base_url", &self.api.base_url)?;
        validate_path("storage.state_dir", &self.storage.state_dir)?;

        if let Some(timeout) = self.api.timeout_seconds {
            validate_positive_number("api.timeout_seconds", timeout, 1)?;
        }
        if let Some(interval) = self.deploy.poll_interval_ms {
            validate_positive_number("deploy.poll_interval_ms", interval, 1)?;
        }
        if let Some(backoff) = self.deploy.error_backoff_ms {
            validate_positive_number("deploy.error_backoff_ms", backoff, 1)?;
        }
        if let Some(attempts) = self.deploy.max_poll_attempts {
            validate_positive_number("deploy.max_poll_attempts", u64::from(attempts), 1)?;
        }

        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_seconds.unwrap_or(30))
    }

    pub fn poll_settings(&self) -> PollSettings {
        let defaults = PollSettings::default();
        PollSettings {
            interval: self
                .deploy
                .poll_interval_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.interval),
            error_backoff: self
                .deploy
                .error_backoff_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.error_backoff),
            max_attempts: self.deploy.max_poll_attempts.unwrap_or(defaults.max_attempts),
        }
    }
}

impl Validate for WorkflowConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
