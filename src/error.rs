use serde_json::Value;
use thiserror::Error;

/// Result type alias for guard operations.
pub type Result<T> = std::result::Result<T, GuardError>;

/// Errors that can occur when running a guarded call.
#[derive(Error, Debug)]
pub enum GuardError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Could not connect to the API service at {api_base}. Details: {cause}")]
    Connectivity { api_base: String, cause: String },

    #[error("API request failed: {status} - {body}")]
    RemoteRejection { status: u16, body: String },

    #[error("Argument '{prompt_arg}' not found in function call")]
    ArgumentMissing { prompt_arg: String },

    #[error("Input prompt was blocked by Guard '{guard_name}'. Summary: {summaries}")]
    GuardRejection { guard_name: String, summaries: Value },
}

impl GuardError {
    pub(crate) fn connectivity(api_base: &str, cause: impl std::fmt::Display) -> Self {
        GuardError::Connectivity {
            api_base: api_base.to_string(),
            cause: cause.to_string(),
        }
    }

    /// Whether the remote guard explicitly marked the content invalid.
    pub fn is_guard_rejection(&self) -> bool {
        matches!(self, GuardError::GuardRejection { .. })
    }

    /// Validation summaries reported by the guard, if this is a rejection.
    pub fn summaries(&self) -> Option<&Value> {
        match self {
            GuardError::GuardRejection { summaries, .. } => Some(summaries),
            _ => None,
        }
    }
}
