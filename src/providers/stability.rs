use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{http, nearest_supported_size, policy, truncate_prompt, ImageProvider};
use crate::{
    config::StabilityConfig,
    error::GenerationError,
    prompt::fit_negative,
    models::{
        GenerationRequest, GenerationResult, ProviderCapabilities, ProviderId, ResultMetadata,
        ValidationResult,
    },
};

pub const PROVIDER_ID: &str = "stability";
const DEFAULT_BASE_URL: &str = "https://api.stability.ai";
const DEFAULT_ENGINE: &str = "stable-diffusion-xl-1024-v1-0";
const MAX_TEXT_CHARS: usize = 2000;
const COST_PER_IMAGE: f64 = 0.004;
const EXTRA_FORBIDDEN: &[&str] = &["deepfake"];

/// SDXL only renders these sizes.
const SDXL_SIZES: &[(u32, u32)] = &[
    (1024, 1024),
    (1152, 896),
    (896, 1152),
    (1216, 832),
    (832, 1216),
    (1344, 768),
    (768, 1344),
    (1536, 640),
    (640, 1536),
];

#[derive(Debug, Deserialize)]
struct Artifact {
    base64: String,
    seed: Option<u64>,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TextToImageResponse {
    #[serde(default)]
    artifacts: Vec<Artifact>,
}

/// Third-party provider using the Stability AI REST API.
pub struct StabilityProvider {
    id: ProviderId,
    client: Client,
    api_key: Option<String>,
    base_url: String,
    engine: String,
}

impl StabilityProvider {
    pub fn new(config: StabilityConfig) -> Self {
        Self {
            id: ProviderId::from(PROVIDER_ID),
            client: Client::new(),
            api_key: config.api_key.filter(|k| !k.trim().is_empty()),
            base_url: config
                .base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            engine: config.engine.unwrap_or_else(|| DEFAULT_ENGINE.to_string()),
        }
    }

    fn build_payload(request: &GenerationRequest, width: u32, height: u32, seed: u32) -> (Value, String) {
        let text = truncate_prompt(request.prompt(), MAX_TEXT_CHARS);
        let mut text_prompts = vec![json!({ "text": text, "weight": 1.0 })];
        if let Some(negative) = request.negative_prompt() {
            text_prompts.push(json!({
                "text": fit_negative(negative, MAX_TEXT_CHARS),
                "weight": -1.0
            }));
        }

        let payload = json!({
            "text_prompts": text_prompts,
            "cfg_scale": 7,
            "width": width,
            "height": height,
            "samples": 1,
            "steps": 30,
            "seed": seed
        });
        (payload, text)
    }

    fn parse_response(body: &str) -> Result<(String, Option<u64>), GenerationError> {
        let response: TextToImageResponse = serde_json::from_str(body)
            .map_err(|e| GenerationError::unknown(format!("Invalid Stability response: {}", e)))?;

        let artifact = response
            .artifacts
            .into_iter()
            .next()
            .ok_or_else(|| GenerationError::unknown("Stability returned no artifacts"))?;

        if artifact.finish_reason.as_deref() == Some("CONTENT_FILTERED") {
            return Err(GenerationError::policy(
                "Stability content filter rejected the image",
            ));
        }

        let bytes = STANDARD
            .decode(artifact.base64.as_bytes())
            .map_err(|e| GenerationError::unknown(format!("Invalid image payload: {}", e)))?;
        if bytes.is_empty() {
            return Err(GenerationError::unknown("Stability returned an empty image"));
        }

        Ok((
            format!("data:image/png;base64,{}", artifact.base64),
            artifact.seed,
        ))
    }
}

#[async_trait]
impl ImageProvider for StabilityProvider {
    fn id(&self) -> &ProviderId {
        &self.id
    }

    async fn validate_prompt(&self, prompt: &str) -> ValidationResult {
        policy::check_prompt(prompt, EXTRA_FORBIDDEN)
    }

    async fn generate_image(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResult, GenerationError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| GenerationError::authentication("Stability API key is not configured"))?;

        let (width, height) = nearest_supported_size(request.dimensions(), SDXL_SIZES);
        let seed = rand::random::<u32>();
        let (payload, effective_prompt) = Self::build_payload(request, width, height, seed);

        log::info!(
            "Generating image with engine: {} ({}x{})",
            self.engine,
            width,
            height
        );

        let response = self
            .client
            .post(format!(
                "{}/v1/generation/{}/text-to-image",
                self.base_url, self.engine
            ))
            .bearer_auth(api_key)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| http::classify_transport(PROVIDER_ID, &e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| http::classify_transport(PROVIDER_ID, &e))?;

        if !status.is_success() {
            log::warn!("Stability request failed with {}", status);
            return Err(http::classify_status(PROVIDER_ID, status, &body));
        }

        let (image_url, returned_seed) = Self::parse_response(&body)?;

        Ok(GenerationResult {
            image_url,
            provider: self.id.clone(),
            metadata: ResultMetadata {
                prompt: effective_prompt,
                seed: returned_seed.or(Some(u64::from(seed))),
                model: Some(self.engine.clone()),
                width,
                height,
            },
            cost: COST_PER_IMAGE,
        })
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            max_width: 1536,
            max_height: 1536,
            supports_inpainting: false,
            cost_per_image: COST_PER_IMAGE,
            requires_auth: true,
        }
    }
}
