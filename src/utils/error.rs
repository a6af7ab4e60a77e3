use thiserror::Error;

#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Failed to parse configuration ({field}): {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Backend rejected request to {endpoint}: {message}")]
    BackendError { endpoint: String, message: String },

    #[error("Session expired: {message}")]
    SessionExpired { message: String },

    #[error("Workflow error: {message}")]
    StateError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Configuration,
    Validation,
    Authentication,
    Backend,
    Storage,
    Workflow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl WorkflowError {
    pub fn state(message: impl Into<String>) -> Self {
        Self::StateError {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ApiError(_) => ErrorCategory::Network,
            Self::IoError(_) | Self::SerializationError(_) => ErrorCategory::Storage,
            Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::ConfigValidationError { .. } => ErrorCategory::Configuration,
            Self::ValidationError { .. } => ErrorCategory::Validation,
            Self::BackendError { .. } => ErrorCategory::Backend,
            Self::SessionExpired { .. } => ErrorCategory::Authentication,
            Self::StateError { .. } => ErrorCategory::Workflow,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Validation
            | ErrorCategory::Workflow
            | ErrorCategory::Network
            | ErrorCategory::Backend => ErrorSeverity::Medium,
            ErrorCategory::Configuration | ErrorCategory::Authentication => ErrorSeverity::High,
            ErrorCategory::Storage => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Network => "Check that the backend API is reachable and try again",
            ErrorCategory::Configuration => "Review the configuration file and command-line flags",
            ErrorCategory::Validation => "Complete the required fields and try again",
            ErrorCategory::Authentication => "Log in again to refresh the session token",
            ErrorCategory::Backend => "Inspect the backend message; the request was not applied",
            ErrorCategory::Storage => "Check permissions of the state directory",
            ErrorCategory::Workflow => "Run `status` to see the current step of the workflow",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::ApiError(e) if e.is_timeout() => "The backend did not answer in time".to_string(),
            Self::ApiError(e) if e.is_connect() => "Could not connect to the backend".to_string(),
            Self::SessionExpired { .. } => "Session expired. Please log in again.".to_string(),
            Self::BackendError { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

impl ErrorSeverity {
    /// 根據錯誤嚴重程度決定退出碼
    pub fn exit_code(self) -> i32 {
        match self {
            Self::Low => 0,
            Self::Medium => 2,
            Self::High => 1,
            Self::Critical => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, WorkflowError>;
