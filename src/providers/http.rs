use reqwest::StatusCode;

use super::policy::mentions_policy;
use crate::error::GenerationError;

/// Maps a non-success HTTP response to a generation error.
pub fn classify_status(provider: &str, status: StatusCode, body: &str) -> GenerationError {
    let message = if body.trim().is_empty() {
        format!("{} returned {}", provider, status)
    } else {
        format!("{} returned {}: {}", provider, status, body.trim())
    };

    match status.as_u16() {
        401 | 403 => GenerationError::authentication(message),
        408 | 504 => GenerationError::timeout(message),
        429 => GenerationError::rate_limit(message),
        400 | 422 if mentions_policy(body) => GenerationError::policy(message),
        500..=599 => GenerationError::server(message),
        _ => GenerationError::unknown(message),
    }
}

pub fn classify_transport(provider: &str, err: &reqwest::Error) -> GenerationError {
    if err.is_timeout() {
        GenerationError::timeout(format!("{} request timed out: {}", provider, err))
    } else if err.is_connect() {
        GenerationError::server(format!("{} unreachable: {}", provider, err))
    } else {
        GenerationError::unknown(format!("{} request failed: {}", provider, err))
    }
}
