use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::env;

use crate::error::{GuardError, Result};

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "SOTERIA_API_KEY";
/// Environment variable holding the API base URL.
pub const API_BASE_ENV: &str = "SOTERIA_API_BASE";

/// Free-form metadata sent alongside a prompt.
pub type Metadata = Map<String, Value>;

/// Configuration for reaching the guard service.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GuardConfig {
    pub api_key: String,
    pub api_base: String,
}

impl GuardConfig {
    /// Create a configuration from an API key and base URL.
    pub fn new(api_key: impl Into<String>, api_base: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_base: api_base.into(),
        }
    }

    /// Build a configuration from `SOTERIA_API_KEY` and `SOTERIA_API_BASE`.
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(require_env(API_KEY_ENV)?, require_env(API_BASE_ENV)?))
    }

    /// Set the API key sent as `X-API-Key`.
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = api_key.into();
        self
    }

    /// Set the base URL of the guard service.
    pub fn api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Only presence is checked, never format.
    pub fn validate(&self) -> Result<()> {
        if self.api_key.is_empty() || self.api_base.is_empty() {
            return Err(not_configured());
        }
        Ok(())
    }

    /// URL of the `/process` endpoint.
    ///
    /// `api_base` is used verbatim, so a trailing slash yields `//process`.
    pub fn process_url(&self) -> String {
        format!("{}/process", self.api_base)
    }
}

pub(crate) fn not_configured() -> GuardError {
    GuardError::Configuration(
        "SDK not configured. Please run soteria::configure(api_key, api_base) first.".to_string(),
    )
}

fn require_env(key: &str) -> Result<String> {
    env::var(key).map_err(|_| {
        GuardError::Configuration(format!("environment variable {} is not set", key))
    })
}

/// Request body for `POST /process`.
#[derive(Debug, Clone, Serialize)]
pub struct GuardRequest {
    pub prompt: Value,
    pub guard_name: String,
    pub metadata: Metadata,
}

/// Verdict returned by the guard service.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GuardOutcome {
    #[serde(default, deserialize_with = "truthy")]
    pub is_valid: bool,
    #[serde(default)]
    pub processed_prompt: Value,
    #[serde(default)]
    pub validation_summaries: Value,
    /// Keys the SDK does not interpret.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl GuardOutcome {
    /// The rewritten prompt as a string, when the service returned one.
    pub fn processed_str(&self) -> Option<&str> {
        self.processed_prompt.as_str()
    }
}

// The service is not held to a strict schema: any falsy JSON value reads as invalid.
fn truthy<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Null => false,
        Value::Bool(b) => b,
        Value::Number(n) => n.as_f64().map_or(false, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    })
}
