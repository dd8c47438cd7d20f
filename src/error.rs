use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::models::ProviderId;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Prompt error: {0}")]
    Prompt(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of a failed generation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Authentication,
    Timeout,
    RateLimit,
    Server,
    Policy,
    Unknown,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::Authentication => "authentication",
            ErrorCode::Timeout => "timeout",
            ErrorCode::RateLimit => "rate_limit",
            ErrorCode::Server => "server",
            ErrorCode::Policy => "policy",
            ErrorCode::Unknown => "unknown",
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorCode::Timeout | ErrorCode::RateLimit | ErrorCode::Server
        )
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure reported by a provider's `generate_image`.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{code}: {message}")]
pub struct GenerationError {
    pub code: ErrorCode,
    pub message: String,
    pub retryable: bool,
}

impl GenerationError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            retryable: code.is_retryable(),
        }
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Authentication, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Timeout, message)
    }

    pub fn rate_limit(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::RateLimit, message)
    }

    pub fn server(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Server, message)
    }

    pub fn policy(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Policy, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unknown, message)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouterErrorKind {
    Policy,
    Technical,
}

/// Terminal failure of `GenerationRouter::generate`.
///
/// Policy violations carry a distinct message prefix so callers that only see
/// the rendered string can still tell them apart from infrastructure failures.
#[derive(Debug, Clone, Error)]
pub enum RouterError {
    #[error("Content policy violation: {reason}")]
    PolicyViolation {
        provider: ProviderId,
        reason: String,
        matched_terms: Vec<String>,
    },
    #[error("Generation failed: {0}")]
    Generation(#[from] GenerationError),
}

impl RouterError {
    pub fn kind(&self) -> RouterErrorKind {
        match self {
            RouterError::PolicyViolation { .. } => RouterErrorKind::Policy,
            RouterError::Generation(_) => RouterErrorKind::Technical,
        }
    }

    pub fn is_policy_violation(&self) -> bool {
        self.kind() == RouterErrorKind::Policy
    }
}
