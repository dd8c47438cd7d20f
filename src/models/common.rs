use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier of an image provider, e.g. `"bedrock-titan"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProviderId(String);

impl ProviderId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ProviderId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Static, non-network description of what a provider can do.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderCapabilities {
    pub max_width: u32,
    pub max_height: u32,
    pub supports_inpainting: bool,
    /// Estimated cost per generated image, in USD.
    pub cost_per_image: f64,
    pub requires_auth: bool,
}

/// Outcome of a prompt policy check. Computed per request, never cached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub allowed: bool,
    pub reason: Option<String>,
    pub matched_terms: Vec<String>,
}

impl ValidationResult {
    pub fn allowed() -> Self {
        Self {
            allowed: true,
            reason: None,
            matched_terms: Vec::new(),
        }
    }

    pub fn rejected(reason: impl Into<String>, matched_terms: Vec<String>) -> Self {
        Self {
            allowed: false,
            reason: Some(reason.into()),
            matched_terms,
        }
    }
}
