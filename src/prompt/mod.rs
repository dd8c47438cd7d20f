//! Deterministic rendering of [`GenerationSettings`] into model-ready prompts.
//!
//! The builder is pure: the same settings always produce the same pair of
//! strings. Unknown option values fall back to passthrough or defaults, so the
//! default builder never fails. Visual-detail tags without a registered rule
//! are skipped silently unless the builder runs in strict mode.

pub mod catalog;
pub mod negative;
pub mod positive;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::GenerationSettings;

pub use negative::{build_negative, dedupe_terms, fit_negative};
pub use positive::build_positive;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptPair {
    pub positive: String,
    pub negative: String,
}

/// True when the image should be framed on the soles, either through an
/// explicit sole tag or a sole-oriented camera angle.
pub fn is_sole_focus(settings: &GenerationSettings) -> bool {
    if settings.has_detail(catalog::DETAIL_FLAT_SOLES)
        || settings.has_detail(catalog::DETAIL_WRINKLED_SOLES)
    {
        return true;
    }
    let angle = settings.angle.to_lowercase();
    angle.contains("sole") || angle.contains("sohle")
}

pub fn build_prompts(settings: &GenerationSettings) -> PromptPair {
    PromptPair {
        positive: build_positive(settings),
        negative: build_negative(settings),
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PromptBuilder {
    strict: bool,
}

impl PromptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects visual-detail tags that have neither a prompt rule nor a
    /// feature toggle behind them.
    pub fn strict() -> Self {
        Self { strict: true }
    }

    pub fn build(&self, settings: &GenerationSettings) -> Result<PromptPair> {
        if self.strict {
            if let Some(tag) = settings
                .visual_details
                .iter()
                .find(|tag| !catalog::is_known_detail(tag))
            {
                return Err(Error::Prompt(format!("unknown visual detail '{}'", tag)));
            }
        }
        Ok(build_prompts(settings))
    }
}
