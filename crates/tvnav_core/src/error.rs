use serde::Serialize;
use thiserror::Error;

/// Unified error type for tvnav operations
#[derive(Debug, Error)]
pub enum NavError {
    // Config errors
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Config serialize error: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // Selector errors
    #[error("Invalid selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },

    // Persistence errors
    #[error("Storage error: {0}")]
    Storage(String),

    // Host environment errors (DOM bindings, event wiring)
    #[error("Host error: {0}")]
    Host(String),
}

/// Result type alias for tvnav operations
pub type Result<T> = std::result::Result<T, NavError>;

/// A serializable representation of NavError for the JS boundary
#[derive(Debug, Clone, Serialize)]
pub struct SerializableError {
    /// Error kind/variant name
    pub kind: String,
    /// Human-readable error message
    pub message: String,
    /// Offending selector (if applicable)
    pub selector: Option<String>,
}

impl From<&NavError> for SerializableError {
    fn from(err: &NavError) -> Self {
        let kind = match err {
            NavError::ConfigParse(_) => "ConfigParse",
            NavError::ConfigSerialize(_) => "ConfigSerialize",
            NavError::InvalidConfig(_) => "InvalidConfig",
            NavError::InvalidSelector { .. } => "InvalidSelector",
            NavError::Storage(_) => "Storage",
            NavError::Host(_) => "Host",
        }
        .to_string();

        let selector = match err {
            NavError::InvalidSelector { selector, .. } => Some(selector.clone()),
            _ => None,
        };

        Self {
            kind,
            message: err.to_string(),
            selector,
        }
    }
}

impl From<NavError> for SerializableError {
    fn from(err: NavError) -> Self {
        SerializableError::from(&err)
    }
}

impl NavError {
    /// Convert to a serializable representation for the JS boundary
    pub fn to_serializable(&self) -> SerializableError {
        SerializableError::from(self)
    }

    pub(crate) fn invalid_selector(selector: &str, reason: impl Into<String>) -> Self {
        NavError::InvalidSelector {
            selector: selector.to_string(),
            reason: reason.into(),
        }
    }
}
