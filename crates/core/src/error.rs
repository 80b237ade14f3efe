use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::ErrorDetail;

#[derive(Error, Debug)]
pub enum ResourceError {
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Cloud(#[from] CloudError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("Authentication failed: {0}")]
    Auth(String),
    #[error("Invalid resource id: {0}")]
    InvalidResourceId(String),
    #[error("Playback error: {0}")]
    Playback(String),
    #[error("File system error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ResourceError {
    /// Returns the service fault, if this error is one.
    pub fn as_cloud_error(&self) -> Option<&CloudError> {
        match self {
            ResourceError::Cloud(err) => Some(err),
            _ => None,
        }
    }
}

pub type Result<T, E = ResourceError> = std::result::Result<T, E>;

/// A fault reported by the Resource Management service.
#[derive(Debug, Clone, PartialEq, Error)]
pub struct CloudError {
    pub status: u16,
    pub code: String,
    pub message: String,
    pub target: Option<String>,
    pub details: Vec<ErrorDetail>,
}

impl fmt::Display for CloudError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

#[derive(Deserialize, Serialize, Debug)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

impl CloudError {
    pub fn new(status: u16, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            code: code.into(),
            message: message.into(),
            target: None,
            details: Vec::new(),
        }
    }

    pub(crate) fn from_detail(status: u16, detail: ErrorDetail) -> Self {
        Self {
            status,
            code: detail.code.unwrap_or_else(|| status_code_name(status)),
            message: detail.message.unwrap_or_default(),
            target: detail.target,
            details: detail.details,
        }
    }

    /// Builds a fault from an error response body.
    ///
    /// The service wraps faults as `{"error": {"code": ..., "message": ...}}`. Some
    /// endpoints (and proxies in front of them) return a bare detail object or plain
    /// text instead, so those are accepted too.
    pub fn from_response(status: u16, body: &str) -> Self {
        if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(body) {
            return Self::from_detail(status, envelope.error);
        }
        if let Ok(detail) = serde_json::from_str::<ErrorDetail>(body) {
            if detail.code.is_some() || detail.message.is_some() {
                return Self::from_detail(status, detail);
            }
        }

        let message = if body.trim().is_empty() {
            format!("Operation returned an invalid status code '{}'", reason(status))
        } else {
            body.trim().to_string()
        };
        Self::new(status, status_code_name(status), message)
    }
}

fn reason(status: u16) -> String {
    reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("Unknown")
        .to_string()
}

fn status_code_name(status: u16) -> String {
    reason(status).replace(' ', "")
}
