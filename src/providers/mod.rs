pub mod bedrock;
pub mod http;
pub mod policy;
pub mod pollinations;
pub mod stability;

use async_trait::async_trait;

use crate::{
    error::GenerationError,
    models::{
        Dimensions, GenerationRequest, GenerationResult, ProviderCapabilities, ProviderId,
        ValidationResult,
    },
};

pub use bedrock::BedrockProvider;
pub use pollinations::PollinationsProvider;
pub use stability::StabilityProvider;

/// Capability set every image backend implements.
///
/// The router only talks to this trait. Request shaping (resolution snapping,
/// prompt augmentation, response parsing) stays inside each implementation.
#[async_trait]
pub trait ImageProvider: Send + Sync {
    fn id(&self) -> &ProviderId;

    /// Checks the prompt against this provider's forbidden-term list. Must not
    /// mutate provider state.
    async fn validate_prompt(&self, prompt: &str) -> ValidationResult;

    async fn generate_image(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResult, GenerationError>;

    /// Static description; never touches the network.
    fn capabilities(&self) -> ProviderCapabilities;
}

/// Picks the supported size whose aspect ratio is closest to the requested one.
/// Ties resolve to the earlier table entry.
pub(crate) fn nearest_supported_size(dimensions: Dimensions, table: &[(u32, u32)]) -> (u32, u32) {
    let target = dimensions.ratio().ln();
    table
        .iter()
        .copied()
        .fold(None, |best: Option<((u32, u32), f64)>, (w, h)| {
            let distance = (f64::from(w) / f64::from(h)).ln() - target;
            let distance = distance.abs();
            match best {
                Some((_, best_distance)) if best_distance <= distance => best,
                _ => Some(((w, h), distance)),
            }
        })
        .map(|(size, _)| size)
        .unwrap_or((1024, 1024))
}

/// Cuts `text` to at most `limit` characters, preferring to end on a whole
/// comma-separated segment.
pub(crate) fn truncate_prompt(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let cut: String = text.chars().take(limit).collect();
    match cut.rfind(',') {
        Some(idx) if idx > 0 => cut[..idx].trim_end().to_string(),
        _ => cut.trim_end().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AspectRatio;

    const TABLE: &[(u32, u32)] = &[(1024, 1024), (832, 1216), (1216, 832), (768, 1344)];

    #[test]
    fn snaps_to_closest_ratio() {
        assert_eq!(
            nearest_supported_size(Dimensions::Aspect(AspectRatio::Square), TABLE),
            (1024, 1024)
        );
        assert_eq!(
            nearest_supported_size(Dimensions::Aspect(AspectRatio::Portrait), TABLE),
            (832, 1216)
        );
        assert_eq!(
            nearest_supported_size(Dimensions::Aspect(AspectRatio::Tall), TABLE),
            (768, 1344)
        );
        assert_eq!(
            nearest_supported_size(Dimensions::Exact { width: 1500, height: 1000 }, TABLE),
            (1216, 832)
        );
    }

    #[test]
    fn truncation_prefers_segment_boundary() {
        assert_eq!(truncate_prompt("a, b, c", 20), "a, b, c");
        assert_eq!(truncate_prompt("alpha, beta, gamma", 14), "alpha, beta");
        assert_eq!(truncate_prompt("abcdefgh", 4), "abcd");
    }
}
