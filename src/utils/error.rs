use crate::domain::capacity::Tier;
use crate::domain::model::PortId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Task cancelled")]
    Cancelled,

    #[error("Port {port_id} has no free {tier} slot")]
    StorageFull { port_id: PortId, tier: Tier },

    #[error("Port registry is empty, no destination available")]
    EmptyRegistry,

    #[error("Unknown port: {port_id}")]
    UnknownPort { port_id: PortId },

    #[error("Background task failed: {0}")]
    TaskFailed(#[from] tokio::task::JoinError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Lifecycle,
    Placement,
    World,
    System,
    Configuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl SimError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            SimError::Cancelled => ErrorCategory::Lifecycle,
            SimError::StorageFull { .. } => ErrorCategory::Placement,
            SimError::EmptyRegistry | SimError::UnknownPort { .. } => ErrorCategory::World,
            SimError::TaskFailed(_) | SimError::IoError(_) | SimError::SerializationError(_) => {
                ErrorCategory::System
            }
            SimError::ConfigValidationError { .. }
            | SimError::InvalidConfigValueError { .. }
            | SimError::MissingConfigError { .. } => ErrorCategory::Configuration,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 取消與滿港都在本地恢復
            SimError::Cancelled | SimError::StorageFull { .. } => ErrorSeverity::Low,
            SimError::ConfigValidationError { .. }
            | SimError::InvalidConfigValueError { .. }
            | SimError::MissingConfigError { .. } => ErrorSeverity::Medium,
            SimError::EmptyRegistry | SimError::UnknownPort { .. } => ErrorSeverity::High,
            SimError::TaskFailed(_) | SimError::IoError(_) | SimError::SerializationError(_) => {
                ErrorSeverity::Critical
            }
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, SimError::Cancelled)
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            SimError::Cancelled => "No action needed, the simulation was stopped".to_string(),
            SimError::StorageFull { .. } => {
                "The ship is redirected automatically; raise storage slots to reduce redirects"
                    .to_string()
            }
            SimError::EmptyRegistry => "Configure at least one port (--ports 1 or more)".to_string(),
            SimError::UnknownPort { port_id } => {
                format!("Port {} was never registered; check the bootstrap order", port_id)
            }
            SimError::TaskFailed(_) => "Re-run with --verbose to see the failing task".to_string(),
            SimError::IoError(_) => "Check that the configuration file exists and is readable".to_string(),
            SimError::SerializationError(_) => "Report this as a bug".to_string(),
            SimError::ConfigValidationError { field, .. }
            | SimError::InvalidConfigValueError { field, .. }
            | SimError::MissingConfigError { field } => {
                format!("Fix the '{}' setting in the CLI arguments or TOML file", field)
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::System => format!("System failure: {}", self),
            _ => self.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SimError>;
