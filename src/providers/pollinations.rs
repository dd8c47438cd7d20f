use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use super::{http, policy, ImageProvider};
use crate::{
    config::PollinationsConfig,
    error::GenerationError,
    models::{
        Dimensions, GenerationRequest, GenerationResult, ProviderCapabilities, ProviderId,
        ResultMetadata, ValidationResult,
    },
};

pub const PROVIDER_ID: &str = "pollinations";
const DEFAULT_BASE_URL: &str = "https://image.pollinations.ai";
const DEFAULT_MODEL: &str = "flux";
const MAX_EDGE: u32 = 1024;
const MIN_EDGE: u32 = 256;
const SIZE_STEP: u32 = 64;

/// Free, always-available default provider. The image reference is a
/// deterministic URL; fetching it once makes the service render and cache it.
pub struct PollinationsProvider {
    id: ProviderId,
    client: Client,
    base_url: String,
    model: String,
}

impl PollinationsProvider {
    pub fn new(config: PollinationsConfig) -> Self {
        Self {
            id: ProviderId::from(PROVIDER_ID),
            client: Client::new(),
            base_url: config
                .base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: config.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        }
    }

    /// Snaps to multiples of 64 between 256 and 1024 pixels per edge.
    pub(crate) fn snap_dimensions(dimensions: Dimensions) -> (u32, u32) {
        let (width, height) = dimensions.pixels(MAX_EDGE);
        let snap = |edge: u32| {
            let rounded = ((edge + SIZE_STEP / 2) / SIZE_STEP) * SIZE_STEP;
            rounded.clamp(MIN_EDGE, MAX_EDGE)
        };
        (snap(width), snap(height))
    }

    pub(crate) fn image_url(
        &self,
        prompt: &str,
        width: u32,
        height: u32,
        seed: u32,
    ) -> Result<Url, GenerationError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| GenerationError::unknown(format!("Invalid Pollinations base URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| GenerationError::unknown("Pollinations base URL cannot carry a path"))?
            .pop_if_empty()
            .push("prompt")
            .push(prompt);
        url.query_pairs_mut()
            .append_pair("width", &width.to_string())
            .append_pair("height", &height.to_string())
            .append_pair("seed", &seed.to_string())
            .append_pair("model", &self.model)
            .append_pair("nologo", "true");
        Ok(url)
    }
}

#[async_trait]
impl ImageProvider for PollinationsProvider {
    fn id(&self) -> &ProviderId {
        &self.id
    }

    async fn validate_prompt(&self, prompt: &str) -> ValidationResult {
        policy::check_prompt(prompt, &[])
    }

    async fn generate_image(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResult, GenerationError> {
        let (width, height) = Self::snap_dimensions(request.dimensions());
        let seed = rand::random::<u32>();
        // No negative prompt support; the positive prompt is sent as is.
        let url = self.image_url(request.prompt(), width, height, seed)?;

        log::info!("Requesting image from Pollinations ({}x{})", width, height);

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| http::classify_transport(PROVIDER_ID, &e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(http::classify_status(PROVIDER_ID, status, &body));
        }

        let is_image = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("image/"));
        if !is_image {
            return Err(GenerationError::unknown(
                "Pollinations did not return an image",
            ));
        }

        Ok(GenerationResult {
            image_url: url.to_string(),
            provider: self.id.clone(),
            metadata: ResultMetadata {
                prompt: request.prompt().to_string(),
                seed: Some(u64::from(seed)),
                model: Some(self.model.clone()),
                width,
                height,
            },
            cost: 0.0,
        })
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            max_width: MAX_EDGE,
            max_height: MAX_EDGE,
            supports_inpainting: false,
            cost_per_image: 0.0,
            requires_auth: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AspectRatio;

    #[test]
    fn dimensions_snap_to_grid() {
        assert_eq!(
            PollinationsProvider::snap_dimensions(Dimensions::Aspect(AspectRatio::Square)),
            (1024, 1024)
        );
        assert_eq!(
            PollinationsProvider::snap_dimensions(Dimensions::Aspect(AspectRatio::Wide)),
            (1024, 576)
        );
        assert_eq!(
            PollinationsProvider::snap_dimensions(Dimensions::Exact { width: 100, height: 700 }),
            (256, 704)
        );
    }

    #[test]
    fn url_encodes_prompt_and_parameters() {
        let provider = PollinationsProvider::new(PollinationsConfig::new());
        let url = provider
            .image_url("pair of feet, 50/50 light", 1024, 768, 5)
            .unwrap();
        let text = url.as_str();
        assert!(text.starts_with("https://image.pollinations.ai/prompt/pair%20of%20feet,%2050%2F50%20light?"));
        assert!(text.contains("width=1024"));
        assert!(text.contains("height=768"));
        assert!(text.contains("seed=5"));
        assert!(text.contains("model=flux"));
    }

    #[test]
    fn free_tier_capabilities() {
        let caps = PollinationsProvider::new(PollinationsConfig::new()).capabilities();
        assert_eq!(caps.cost_per_image, 0.0);
        assert!(!caps.requires_auth);
        assert!(!caps.supports_inpainting);
    }
}
