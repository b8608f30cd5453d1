//! Error type shared by the core crate.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WizardError {
    #[error("request to {path} failed: {message}")]
    Network { path: String, message: String },

    #[error("{path} returned HTTP {status}")]
    Status { path: String, status: u16 },

    #[error("unexpected response from {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),

    #[error("the {0} image cannot be renamed or deleted")]
    SentinelImage(String),

    #[error("malformed json in {field}: {source}")]
    MalformedJson {
        field: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{0}")]
    Rejected(String),

    #[error("invalid field pattern: {0}")]
    Pattern(#[from] regex::Error),
}

pub type Result<T> = std::result::Result<T, WizardError>;

impl WizardError {
    pub fn network(path: &str, message: impl Into<String>) -> Self {
        Self::Network {
            path: path.to_string(),
            message: message.into(),
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected(message.into())
    }
}
