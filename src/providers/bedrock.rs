use async_trait::async_trait;
use aws_sdk_bedrockruntime::{
    error::{ProvideErrorMetadata, SdkError},
    primitives::Blob,
    Client,
};
use serde::Deserialize;
use serde_json::json;

use super::{nearest_supported_size, policy, truncate_prompt, ImageProvider};
use crate::{
    config::BedrockConfig,
    prompt::fit_negative,
    error::GenerationError,
    models::{
        GenerationRequest, GenerationResult, ProviderCapabilities, ProviderId, ResultMetadata,
        ValidationResult,
    },
};

pub const PROVIDER_ID: &str = "bedrock-titan";
const DEFAULT_MODEL: &str = "amazon.titan-image-generator-v1";
const DEFAULT_REGION: &str = "us-east-1";
const MAX_TEXT_CHARS: usize = 512;
const MAX_SEED: u32 = 2_147_483_646;
const COST_PER_IMAGE: f64 = 0.01;
const EXTRA_FORBIDDEN: &[&str] = &["celebrity", "real person"];

/// Resolutions Titan accepts for text-to-image.
const TITAN_SIZES: &[(u32, u32)] = &[
    (1024, 1024),
    (768, 1152),
    (1152, 768),
    (896, 1152),
    (1152, 896),
    (768, 1280),
    (1280, 768),
    (768, 1408),
    (1408, 768),
    (640, 1408),
    (1408, 640),
];

#[derive(Deserialize)]
struct TitanImageResponse {
    #[serde(default)]
    images: Vec<String>,
    error: Option<String>,
}

/// Premium provider backed by Amazon Titan Image Generator on Bedrock.
pub struct BedrockProvider {
    id: ProviderId,
    client: Client,
    model_id: String,
}

impl BedrockProvider {
    pub async fn new(config: BedrockConfig) -> Self {
        let region = config
            .region
            .clone()
            .unwrap_or_else(|| DEFAULT_REGION.to_string());

        let aws_config = if let (Some(access_key), Some(secret_key)) =
            (&config.access_key, &config.secret_key)
        {
            aws_config::from_env()
                .credentials_provider(aws_sdk_bedrockruntime::config::Credentials::new(
                    access_key,
                    secret_key,
                    None,
                    None,
                    "solegen-bedrock",
                ))
                .region(aws_sdk_bedrockruntime::config::Region::new(region))
                .load()
                .await
        } else {
            aws_config::from_env()
                .region(aws_sdk_bedrockruntime::config::Region::new(region))
                .load()
                .await
        };

        Self::with_client(
            Client::new(&aws_config),
            config.model_id.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        )
    }

    pub fn with_client(client: Client, model_id: impl Into<String>) -> Self {
        Self {
            id: ProviderId::from(PROVIDER_ID),
            client,
            model_id: model_id.into(),
        }
    }

    fn build_payload(
        request: &GenerationRequest,
        width: u32,
        height: u32,
        seed: u32,
    ) -> (serde_json::Value, String) {
        let text = truncate_prompt(request.prompt(), MAX_TEXT_CHARS);
        let mut text_params = json!({ "text": text });
        // Titan rejects negative text shorter than three characters.
        if let Some(negative) = request.negative_prompt() {
            let negative = fit_negative(negative, MAX_TEXT_CHARS);
            if negative.chars().count() >= 3 {
                text_params["negativeText"] = json!(negative);
            }
        }

        let payload = json!({
            "taskType": "TEXT_IMAGE",
            "textToImageParams": text_params,
            "imageGenerationConfig": {
                "numberOfImages": 1,
                "quality": "standard",
                "cfgScale": 8.0,
                "width": width,
                "height": height,
                "seed": seed
            }
        });
        (payload, text)
    }
}

/// Maps a Bedrock service error code and message to a generation error.
pub(crate) fn classify_service_error(code: Option<&str>, message: Option<&str>) -> GenerationError {
    let code = code.unwrap_or("unknown");
    let text = format!("Bedrock {}: {}", code, message.unwrap_or("no message"));

    match code {
        "ThrottlingException" | "ServiceQuotaExceededException" => {
            GenerationError::rate_limit(text)
        }
        "AccessDeniedException" | "UnrecognizedClientException" | "ExpiredTokenException" => {
            GenerationError::authentication(text)
        }
        "ModelTimeoutException" => GenerationError::timeout(text),
        "InternalServerException"
        | "ServiceUnavailableException"
        | "ModelNotReadyException"
        | "ModelErrorException" => GenerationError::server(text),
        _ if policy::mentions_policy(message.unwrap_or_default()) => GenerationError::policy(text),
        _ => GenerationError::unknown(text),
    }
}

#[async_trait]
impl ImageProvider for BedrockProvider {
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
        let (width, height) = nearest_supported_size(request.dimensions(), TITAN_SIZES);
        let seed = rand::random::<u32>() % (MAX_SEED + 1);
        let (payload, effective_prompt) = Self::build_payload(request, width, height, seed);

        let request_json = serde_json::to_string(&payload)
            .map_err(|e| GenerationError::unknown(format!("Serialization error: {}", e)))?;

        log::info!(
            "Generating image with model: {} ({}x{})",
            self.model_id,
            width,
            height
        );

        let response = self
            .client
            .invoke_model()
            .model_id(&self.model_id)
            .content_type("application/json")
            .accept("application/json")
            .body(Blob::new(request_json.into_bytes()))
            .send()
            .await
            .map_err(|e| {
                log::error!("Bedrock image generation error details: {:?}", e);

                if let Some(service_error) = e.as_service_error() {
                    classify_service_error(service_error.code(), service_error.message())
                } else if matches!(e, SdkError::TimeoutError(_)) {
                    GenerationError::timeout(format!("Bedrock request timed out: {}", e))
                } else if format!("{:?}", e).to_lowercase().contains("credential") {
                    GenerationError::authentication(format!("AWS credentials unavailable: {}", e))
                } else {
                    GenerationError::server(format!("Bedrock transport error: {}", e))
                }
            })?;

        let response_bytes = response.body.into_inner();
        let titan_response: TitanImageResponse = serde_json::from_slice(&response_bytes)
            .map_err(|e| GenerationError::unknown(format!("Invalid Titan response: {}", e)))?;

        if let Some(error) = titan_response.error.filter(|e| !e.is_empty()) {
            return Err(if policy::mentions_policy(&error) {
                GenerationError::policy(error)
            } else {
                GenerationError::unknown(error)
            });
        }

        let image = titan_response
            .images
            .into_iter()
            .next()
            .ok_or_else(|| GenerationError::unknown("No images generated"))?;

        Ok(GenerationResult {
            image_url: format!("data:image/png;base64,{}", image),
            provider: self.id.clone(),
            metadata: ResultMetadata {
                prompt: effective_prompt,
                seed: Some(u64::from(seed)),
                model: Some(self.model_id.clone()),
                width,
                height,
            },
            cost: COST_PER_IMAGE,
        })
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            max_width: 1408,
            max_height: 1408,
            supports_inpainting: true,
            cost_per_image: COST_PER_IMAGE,
            requires_auth: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::models::{AspectRatio, Dimensions, GenerationSettings, Intensity, Side, TattooOptions};
    use crate::prompt::build_prompts;

    #[test]
    fn service_errors_are_classified() {
        let cases = [
            ("ThrottlingException", "Too many requests", ErrorCode::RateLimit),
            ("AccessDeniedException", "no access", ErrorCode::Authentication),
            ("ModelTimeoutException", "slow", ErrorCode::Timeout),
            ("ServiceUnavailableException", "down", ErrorCode::Server),
            (
                "ValidationException",
                "This request has been blocked by our content filters.",
                ErrorCode::Policy,
            ),
            ("ValidationException", "width is invalid", ErrorCode::Unknown),
        ];
        for (code, message, expected) in cases {
            assert_eq!(classify_service_error(Some(code), Some(message)).code, expected);
        }
        assert_eq!(classify_service_error(None, None).code, ErrorCode::Unknown);
    }

    #[test]
    fn payload_truncates_and_keeps_negative_text() {
        let long_prompt = vec!["soft natural daylight"; 40].join(", ");
        let request = GenerationRequest::new(long_prompt)
            .with_negative_prompt("blurry, lowres")
            .with_dimensions(Dimensions::Aspect(AspectRatio::Portrait));
        let (payload, text) = BedrockProvider::build_payload(&request, 768, 1152, 42);

        assert!(text.chars().count() <= MAX_TEXT_CHARS);
        assert!(text.ends_with("daylight"));
        assert_eq!(payload["taskType"], "TEXT_IMAGE");
        assert_eq!(payload["textToImageParams"]["negativeText"], "blurry, lowres");
        assert_eq!(payload["imageGenerationConfig"]["width"], 768);
        assert_eq!(payload["imageGenerationConfig"]["seed"], 42);
    }

    #[test]
    fn short_negative_text_is_omitted() {
        let request = GenerationRequest::new("feet").with_negative_prompt("x");
        let (payload, _) = BedrockProvider::build_payload(&request, 1024, 1024, 1);
        assert!(payload["textToImageParams"].get("negativeText").is_none());
    }

    #[test]
    fn built_negative_keeps_required_exclusions_within_titan_limit() {
        let mut settings = GenerationSettings::new()
            .with_side(Side::Left)
            .with_detail("Tätowiert");
        settings.tattoos = Some(TattooOptions {
            enabled: true,
            motif: "floral".into(),
            placement: vec!["ankle".into()],
            intensity: Intensity::Light,
        });
        let prompts = build_prompts(&settings);
        assert!(prompts.negative.chars().count() > MAX_TEXT_CHARS);

        let request =
            GenerationRequest::from_prompts(prompts, Dimensions::Aspect(AspectRatio::Portrait));
        let (payload, _) = BedrockProvider::build_payload(&request, 768, 1152, 7);
        let negative = payload["textToImageParams"]["negativeText"]
            .as_str()
            .unwrap()
            .to_string();
        let terms: Vec<&str> = negative.split(", ").collect();

        assert!(negative.chars().count() <= MAX_TEXT_CHARS);
        for term in [
            "child",
            "underage",
            "two feet",
            "jewelry",
            "tied feet",
            "nail polish",
            "shoes",
            "footwear",
            "hands",
            "other person",
        ] {
            assert!(terms.contains(&term), "negative text lost {term}");
        }
        assert!(!terms.contains(&"tattoos"));
    }

    #[test]
    fn access_denied_mentioning_iam_policy_is_authentication() {
        let error = classify_service_error(
            Some("AccessDeniedException"),
            Some("User: arn:aws:iam::123456789012:user/ci is not authorized because no identity-based policy allows the bedrock:InvokeModel action"),
        );
        assert_eq!(error.code, ErrorCode::Authentication);
    }

    #[test]
    fn portrait_snaps_to_titan_size() {
        assert_eq!(
            nearest_supported_size(Dimensions::Aspect(AspectRatio::Portrait), TITAN_SIZES),
            (768, 1152)
        );
    }
}
