use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::common::ProviderId;
use crate::prompt::PromptPair;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AspectRatio {
    Square,
    Portrait,
    Landscape,
    Tall,
    Wide,
}

impl AspectRatio {
    /// Width and height proportions.
    pub fn proportions(&self) -> (u32, u32) {
        match self {
            AspectRatio::Square => (1, 1),
            AspectRatio::Portrait => (2, 3),
            AspectRatio::Landscape => (3, 2),
            AspectRatio::Tall => (9, 16),
            AspectRatio::Wide => (16, 9),
        }
    }
}

/// Requested output size: exact pixels or an aspect ratio the provider
/// resolves against its own supported resolutions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimensions {
    Exact { width: u32, height: u32 },
    Aspect(AspectRatio),
}

impl Default for Dimensions {
    fn default() -> Self {
        Dimensions::Aspect(AspectRatio::Square)
    }
}

impl Dimensions {
    /// Width divided by height.
    pub fn ratio(&self) -> f64 {
        let (w, h) = match self {
            Dimensions::Exact { width, height } => (*width, *height),
            Dimensions::Aspect(aspect) => aspect.proportions(),
        };
        if h == 0 {
            return 1.0;
        }
        f64::from(w) / f64::from(h)
    }

    /// Pixel size with the longer edge at most `long_edge`. Exact sizes are
    /// scaled down proportionally only when they exceed it.
    pub fn pixels(&self, long_edge: u32) -> (u32, u32) {
        match self {
            Dimensions::Exact { width, height } => {
                let longest = (*width).max(*height);
                if longest <= long_edge || longest == 0 {
                    (*width, *height)
                } else {
                    let scale = f64::from(long_edge) / f64::from(longest);
                    (
                        (f64::from(*width) * scale).round() as u32,
                        (f64::from(*height) * scale).round() as u32,
                    )
                }
            }
            Dimensions::Aspect(aspect) => {
                let (w, h) = aspect.proportions();
                if w >= h {
                    (long_edge, (f64::from(long_edge) * f64::from(h) / f64::from(w)).round() as u32)
                } else {
                    ((f64::from(long_edge) * f64::from(w) / f64::from(h)).round() as u32, long_edge)
                }
            }
        }
    }
}

/// Input to the router. Immutable once built; providers only borrow it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    prompt: String,
    negative_prompt: Option<String>,
    dimensions: Dimensions,
    metadata: HashMap<String, serde_json::Value>,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            negative_prompt: None,
            dimensions: Dimensions::default(),
            metadata: HashMap::new(),
        }
    }

    pub fn from_prompts(prompts: PromptPair, dimensions: Dimensions) -> Self {
        Self::new(prompts.positive)
            .with_negative_prompt(prompts.negative)
            .with_dimensions(dimensions)
    }

    pub fn with_negative_prompt(mut self, negative_prompt: impl Into<String>) -> Self {
        let negative_prompt = negative_prompt.into();
        self.negative_prompt = if negative_prompt.trim().is_empty() {
            None
        } else {
            Some(negative_prompt)
        };
        self
    }

    pub fn with_dimensions(mut self, dimensions: Dimensions) -> Self {
        self.dimensions = dimensions;
        self
    }

    pub fn with_metadata(mut self, key: &str, value: serde_json::Value) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn negative_prompt(&self) -> Option<&str> {
        self.negative_prompt.as_deref()
    }

    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    pub fn metadata(&self) -> &HashMap<String, serde_json::Value> {
        &self.metadata
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultMetadata {
    /// The prompt as actually sent after provider-side shaping.
    pub prompt: String,
    pub seed: Option<u64>,
    pub model: Option<String>,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResult {
    /// URL or `data:` URI of the generated image.
    pub image_url: String,
    /// Provider that actually produced the image (the fallback provider when
    /// fallback happened).
    pub provider: ProviderId,
    pub metadata: ResultMetadata,
    pub cost: f64,
}
